use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::deploy::role::{EXECUTION_ROLE_NAME, ROLE_LOOKUP_REGION};
use crate::deploy::{DeploySettings, RetryPolicy, DEFAULT_REGION};
use crate::external::RequestScope;

/// Name of the optional configuration file, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "stepf-deploy.toml";

/// Prefix of the environment variables overriding the configuration
pub const ENV_PREFIX: &str = "STEPF_DEPLOY";

/// Main configuration structure for stepf-deploy
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StepfDeployConfig {
    /// AWS CLI settings
    pub aws: AwsConfig,
    /// Deployment behaviour
    pub deploy: DeployConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Path or name of the `aws` executable
    pub cli_path: String,
    /// Credential profile used when the stage has no mapping
    pub profile: Option<String>,
    /// Stage name to credential profile
    pub stage_profiles: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Region for the state machine ARN when --region is not given
    pub default_region: String,
    /// Region embedded in the looked-up execution role name
    pub role_lookup_region: String,
    /// Name of the execution role created when none is found
    pub role_name: String,
    pub create_retry: CreateRetryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CreateRetryConfig {
    /// Total creation attempts while the old state machine is being deleted
    pub max_attempts: u32,
    pub delay_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level directive, overridden by RUST_LOG
    pub log_level: String,
    /// Emit JSON log lines instead of the compact format
    pub json_logs: bool,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            cli_path: "aws".to_string(),
            profile: None,
            stage_profiles: HashMap::new(),
        }
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            default_region: DEFAULT_REGION.to_string(),
            role_lookup_region: ROLE_LOOKUP_REGION.to_string(),
            role_name: EXECUTION_ROLE_NAME.to_string(),
            create_retry: CreateRetryConfig::default(),
        }
    }
}

impl Default for CreateRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_seconds: 5,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

impl StepfDeployConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (stepf-deploy.toml)
    /// 3. Environment variables (STEPF_DEPLOY__SECTION__KEY)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`load`](Self::load) with the configuration file looked up in `dir`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        let file = dir.join(CONFIG_FILE_NAME);
        if file.exists() {
            builder = builder.add_source(File::from(file));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load .env file if it exists, reporting whether one was found
    pub fn load_env_file() -> Result<bool> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Pipeline settings derived from the `deploy` section
    pub fn deploy_settings(&self) -> DeploySettings {
        DeploySettings {
            default_region: self.deploy.default_region.clone(),
            role_lookup_region: self.deploy.role_lookup_region.clone(),
            role_name: self.deploy.role_name.clone(),
            create_retry: RetryPolicy::new(
                self.deploy.create_retry.max_attempts,
                Duration::from_secs(self.deploy.create_retry.delay_seconds),
            ),
        }
    }

    /// Region and profile for AWS requests of one invocation. Requests go to
    /// the same region the target ARN is built for.
    pub fn request_scope(&self, stage: Option<&str>, region: Option<&str>) -> RequestScope {
        let profile = stage
            .and_then(|stage| self.aws.stage_profiles.get(stage))
            .or(self.aws.profile.as_ref())
            .cloned();

        RequestScope {
            region: Some(region.unwrap_or(self.deploy.default_region.as_str()).to_string()),
            profile,
        }
    }
}
