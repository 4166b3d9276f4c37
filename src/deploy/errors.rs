use thiserror::Error;

use super::definitions::DefinitionError;
use crate::external::AwsError;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Definitions(#[from] DefinitionError),
    #[error("state machine \"{name}\" does not exist")]
    StateMachineNotFound { name: String },
    #[error(transparent)]
    Aws(#[from] AwsError),
    #[error("state machine \"{name}\" could not be created after {attempts} attempts: {source}")]
    RetriesExhausted {
        name: String,
        attempts: u32,
        #[source]
        source: AwsError,
    },
}

impl DeployError {
    /// Short remediation hints shown by the CLI under the error message
    pub fn hints(&self) -> Vec<String> {
        match self {
            DeployError::Definitions(DefinitionError::Read { .. }) => vec![
                "Run the command from the project root or pass --path".to_string(),
                "The project needs a serverless.yml or serverless.yaml".to_string(),
            ],
            DeployError::Definitions(_) => {
                vec!["Check the YAML syntax of the project file".to_string()]
            }
            DeployError::StateMachineNotFound { name } => vec![
                format!("Add a \"{name}\" entry under stepFunctions in serverless.yml"),
                "Names are case-sensitive".to_string(),
            ],
            DeployError::Aws(AwsError::Command { .. }) => vec![
                "Install the AWS CLI: https://aws.amazon.com/cli/".to_string(),
                "Or point aws.cli_path at it (STEPF_DEPLOY__AWS__CLI_PATH)".to_string(),
            ],
            DeployError::Aws(_) => vec![
                "Check credentials: aws sts get-caller-identity".to_string(),
                "Verify the region and profile for this stage".to_string(),
            ],
            DeployError::RetriesExhausted { .. } => vec![
                "The previous state machine is still being deleted".to_string(),
                "Wait a minute and deploy again".to_string(),
            ],
        }
    }
}
