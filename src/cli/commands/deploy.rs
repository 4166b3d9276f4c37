use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::commands::Command;
use crate::config::StepfDeployConfig;
use crate::deploy::{DeploymentOrchestrator, InvocationContext};
use crate::external::{AwsCliClient, AwsOperations, ProcessCommandExecutor};

pub struct DeployCommand {
    pub context: InvocationContext,
    pub project_root: PathBuf,
    config: StepfDeployConfig,
    aws: Option<Arc<dyn AwsOperations>>,
}

impl DeployCommand {
    pub fn new(context: InvocationContext, project_root: PathBuf, config: StepfDeployConfig) -> Self {
        Self {
            context,
            project_root,
            config,
            aws: None,
        }
    }

    /// Use `aws` instead of the `aws` CLI client built from configuration
    pub fn with_aws(mut self, aws: Arc<dyn AwsOperations>) -> Self {
        self.aws = Some(aws);
        self
    }

    fn aws_client(&self) -> Arc<dyn AwsOperations> {
        if let Some(aws) = &self.aws {
            return aws.clone();
        }

        let scope = self
            .config
            .request_scope(self.context.stage.as_deref(), self.context.region.as_deref());
        Arc::new(AwsCliClient::new(
            Arc::new(ProcessCommandExecutor),
            self.config.aws.cli_path.clone(),
            scope,
        ))
    }
}

impl Command for DeployCommand {
    async fn execute(&self) -> Result<()> {
        println!("🚀 Start Deploy Step Functions: {}", self.context.statemachine);
        if let Some(stage) = &self.context.stage {
            println!("   Stage: {stage}");
        }

        let orchestrator = DeploymentOrchestrator::new(self.aws_client(), self.config.deploy_settings())
            .with_project_root(Some(self.project_root.clone()));

        match orchestrator.deploy(&self.context).await {
            Ok(report) => {
                println!("✅ State machine deployed");
                println!("  🔗 ARN: {}", report.state_machine_arn);
                if report.role_created {
                    println!("  🆕 Created execution role: {}", report.role_arn);
                } else {
                    println!("  👤 Execution role: {}", report.role_arn);
                }
                if report.create_attempts > 1 {
                    println!(
                        "  🔁 Created after {} attempts (previous version was still being deleted)",
                        report.create_attempts
                    );
                }
                Ok(())
            }
            Err(e) => {
                println!("❌ Deployment failed: {e}");
                let hints = e.hints();
                if !hints.is_empty() {
                    println!();
                    println!("🔧 QUICK FIXES:");
                    for hint in hints {
                        println!("   → {hint}");
                    }
                }
                Err(e.into())
            }
        }
    }
}
