// stepf-deploy library - Step Functions deployment from serverless.yml
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod deploy;
pub mod external;
pub mod telemetry;

// Re-export key types for easy access
pub use config::StepfDeployConfig;
pub use deploy::{
    DeployError, DeploySettings, DeploymentOrchestrator, DeploymentReport, InvocationContext,
};
pub use external::{AwsCliClient, AwsError, AwsOperations};
pub use telemetry::{create_deployment_span, generate_correlation_id, init_telemetry};
