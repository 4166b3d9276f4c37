//! AWS CLI abstractions
//!
//! Provides the [`AwsOperations`] seam over the four remote services a
//! deployment talks to (STS, IAM, Step Functions), and a real implementation
//! that drives the `aws` command line tool.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use thiserror::Error;
use tracing::debug;

use super::command::{CommandError, CommandExecutor, CommandOutput};

/// Matches the error line the AWS CLI prints on stderr, e.g.
/// `An error occurred (NoSuchEntity) when calling the GetRole operation: ...`
static CLI_ERROR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)An error occurred \(([^)]+)\) when calling the (\w+) operation(?: \([^)]*\))?: (.*)",
    )
    .expect("CLI error pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: String,
    pub arn: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub arn: String,
}

#[derive(Debug, Error)]
pub enum AwsError {
    #[error("IAM role not found: {name}")]
    RoleNotFound { name: String },
    #[error("{operation} failed ({code}): {message}")]
    Service {
        code: String,
        operation: String,
        message: String,
    },
    #[error("aws CLI exited with status {status_code}: {stderr}")]
    CommandFailed { status_code: i32, stderr: String },
    #[error("Invalid response from aws CLI: {message}")]
    InvalidResponse { message: String },
    #[error("Command execution error: {source}")]
    Command {
        #[from]
        source: CommandError,
    },
}

/// Remote operations needed to deploy a state machine.
#[async_trait]
pub trait AwsOperations: Send + Sync {
    /// STS `GetCallerIdentity`
    async fn get_caller_identity(&self) -> Result<CallerIdentity, AwsError>;

    /// IAM `GetRole`; fails with [`AwsError::RoleNotFound`] when absent
    async fn get_role(&self, name: &str) -> Result<Role, AwsError>;

    /// IAM `CreateRole`
    async fn create_role(&self, trust_policy_document: &str, name: &str) -> Result<Role, AwsError>;

    /// Step Functions `DeleteStateMachine`
    async fn delete_state_machine(&self, arn: &str) -> Result<(), AwsError>;

    /// Step Functions `CreateStateMachine`
    async fn create_state_machine(
        &self,
        definition: &str,
        name: &str,
        role_arn: &str,
    ) -> Result<(), AwsError>;
}

/// Region and credential profile applied to every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestScope {
    pub region: Option<String>,
    pub profile: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CallerIdentityResponse {
    account: String,
    arn: Option<String>,
    user_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RoleResponse {
    role: RoleBody,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RoleBody {
    role_name: String,
    arn: String,
}

impl From<RoleResponse> for Role {
    fn from(response: RoleResponse) -> Self {
        Role {
            name: response.role.role_name,
            arn: response.role.arn,
        }
    }
}

/// Real implementation on top of the `aws` command line tool
pub struct AwsCliClient {
    executor: Arc<dyn CommandExecutor>,
    program: String,
    scope: RequestScope,
}

impl AwsCliClient {
    pub fn new(executor: Arc<dyn CommandExecutor>, program: impl Into<String>, scope: RequestScope) -> Self {
        Self {
            executor,
            program: program.into(),
            scope,
        }
    }

    fn build_args(&self, service: &str, operation: &str, params: &[(&str, &str)]) -> Vec<String> {
        let mut args = vec![service.to_string(), operation.to_string()];
        for (flag, value) in params {
            args.push(format!("--{flag}"));
            args.push((*value).to_string());
        }
        args.push("--output".to_string());
        args.push("json".to_string());
        if let Some(region) = &self.scope.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        if let Some(profile) = &self.scope.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args
    }

    async fn execute_aws_command(
        &self,
        service: &str,
        operation: &str,
        params: &[(&str, &str)],
    ) -> Result<String, AwsError> {
        let args = self.build_args(service, operation, params);
        debug!(service, operation, region = ?self.scope.region, "Invoking aws CLI");

        let output = self.executor.execute(&self.program, &args).await?;
        if !output.success() {
            return Err(Self::classify_aws_error(&output));
        }

        Ok(output.stdout)
    }

    fn classify_aws_error(output: &CommandOutput) -> AwsError {
        match CLI_ERROR_PATTERN.captures(&output.stderr) {
            Some(captures) => AwsError::Service {
                code: captures[1].to_string(),
                operation: captures[2].to_string(),
                message: captures[3].trim().to_string(),
            },
            None => AwsError::CommandFailed {
                status_code: output.status_code,
                stderr: output.stderr.trim().to_string(),
            },
        }
    }

    fn parse_json<T: for<'de> Deserialize<'de>>(operation: &str, stdout: &str) -> Result<T, AwsError> {
        serde_json::from_str(stdout).map_err(|e| AwsError::InvalidResponse {
            message: format!("Failed to parse {operation} JSON: {e}"),
        })
    }
}

#[async_trait]
impl AwsOperations for AwsCliClient {
    async fn get_caller_identity(&self) -> Result<CallerIdentity, AwsError> {
        let output = self.execute_aws_command("sts", "get-caller-identity", &[]).await?;
        let response: CallerIdentityResponse = Self::parse_json("GetCallerIdentity", &output)?;

        Ok(CallerIdentity {
            account: response.account,
            arn: response.arn,
            user_id: response.user_id,
        })
    }

    async fn get_role(&self, name: &str) -> Result<Role, AwsError> {
        let output = match self
            .execute_aws_command("iam", "get-role", &[("role-name", name)])
            .await
        {
            Ok(output) => output,
            Err(AwsError::Service { code, .. }) if code == "NoSuchEntity" => {
                return Err(AwsError::RoleNotFound {
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(e),
        };

        let response: RoleResponse = Self::parse_json("GetRole", &output)?;
        Ok(response.into())
    }

    async fn create_role(&self, trust_policy_document: &str, name: &str) -> Result<Role, AwsError> {
        let output = self
            .execute_aws_command(
                "iam",
                "create-role",
                &[
                    ("role-name", name),
                    ("assume-role-policy-document", trust_policy_document),
                ],
            )
            .await?;

        let response: RoleResponse = Self::parse_json("CreateRole", &output)?;
        Ok(response.into())
    }

    async fn delete_state_machine(&self, arn: &str) -> Result<(), AwsError> {
        self.execute_aws_command(
            "stepfunctions",
            "delete-state-machine",
            &[("state-machine-arn", arn)],
        )
        .await?;
        Ok(())
    }

    async fn create_state_machine(
        &self,
        definition: &str,
        name: &str,
        role_arn: &str,
    ) -> Result<(), AwsError> {
        self.execute_aws_command(
            "stepfunctions",
            "create-state-machine",
            &[("name", name), ("definition", definition), ("role-arn", role_arn)],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // Scripted executor keyed by the full command line
    struct MockCommandExecutor {
        responses: HashMap<String, Result<CommandOutput, CommandError>>,
    }

    impl MockCommandExecutor {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
            }
        }

        fn expect_command(
            mut self,
            program: &str,
            args: &[&str],
            response: Result<CommandOutput, CommandError>,
        ) -> Self {
            let key = format!("{} {}", program, args.join(" "));
            self.responses.insert(key, response);
            self
        }
    }

    #[async_trait]
    impl CommandExecutor for MockCommandExecutor {
        async fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
            let key = format!("{} {}", program, args.join(" "));
            self.responses
                .get(&key)
                .cloned()
                .unwrap_or(Err(CommandError::CommandNotFound {
                    command: program.to_string(),
                }))
        }
    }

    fn ok(stdout: &str) -> Result<CommandOutput, CommandError> {
        Ok(CommandOutput {
            status_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        })
    }

    fn failed(stderr: &str) -> Result<CommandOutput, CommandError> {
        Ok(CommandOutput {
            status_code: 254,
            stdout: String::new(),
            stderr: stderr.to_string(),
        })
    }

    fn client(executor: MockCommandExecutor, scope: RequestScope) -> AwsCliClient {
        AwsCliClient::new(Arc::new(executor), "aws", scope)
    }

    #[tokio::test]
    async fn test_get_caller_identity_parses_account() {
        let executor = MockCommandExecutor::new().expect_command(
            "aws",
            &["sts", "get-caller-identity", "--output", "json"],
            ok(r#"{"UserId":"AIDAEXAMPLE","Account":"123456789012","Arn":"arn:aws:iam::123456789012:user/dev"}"#),
        );

        let identity = client(executor, RequestScope::default())
            .get_caller_identity()
            .await
            .unwrap();

        assert_eq!(identity.account, "123456789012");
        assert_eq!(identity.user_id.as_deref(), Some("AIDAEXAMPLE"));
    }

    #[tokio::test]
    async fn test_scope_is_appended_to_every_request() {
        let executor = MockCommandExecutor::new().expect_command(
            "aws",
            &[
                "sts",
                "get-caller-identity",
                "--output",
                "json",
                "--region",
                "eu-west-1",
                "--profile",
                "prod",
            ],
            ok(r#"{"Account":"42"}"#),
        );
        let scope = RequestScope {
            region: Some("eu-west-1".to_string()),
            profile: Some("prod".to_string()),
        };

        let identity = client(executor, scope).get_caller_identity().await.unwrap();
        assert_eq!(identity.account, "42");
    }

    #[tokio::test]
    async fn test_configured_scope_without_region_sends_default_region() {
        let arn = "arn:aws:states:us-east-1:1234:stateMachine:OrderFlow";
        let executor = MockCommandExecutor::new().expect_command(
            "aws",
            &[
                "stepfunctions",
                "delete-state-machine",
                "--state-machine-arn",
                arn,
                "--output",
                "json",
                "--region",
                "us-east-1",
            ],
            ok("{}"),
        );
        let scope = crate::config::StepfDeployConfig::default().request_scope(None, None);

        client(executor, scope).delete_state_machine(arn).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_role_not_found_is_distinguished() {
        let executor = MockCommandExecutor::new().expect_command(
            "aws",
            &["iam", "get-role", "--role-name", "StatesExecutionRole-us-east-1", "--output", "json"],
            failed(
                "\nAn error occurred (NoSuchEntity) when calling the GetRole operation: \
                 The role with name StatesExecutionRole-us-east-1 cannot be found.\n",
            ),
        );

        let result = client(executor, RequestScope::default())
            .get_role("StatesExecutionRole-us-east-1")
            .await;

        assert!(matches!(result, Err(AwsError::RoleNotFound { ref name }) if name == "StatesExecutionRole-us-east-1"));
    }

    #[tokio::test]
    async fn test_get_role_access_denied_is_service_error() {
        let executor = MockCommandExecutor::new().expect_command(
            "aws",
            &["iam", "get-role", "--role-name", "r", "--output", "json"],
            failed("An error occurred (AccessDenied) when calling the GetRole operation: not authorized"),
        );

        let err = client(executor, RequestScope::default())
            .get_role("r")
            .await
            .unwrap_err();

        match err {
            AwsError::Service { code, operation, message } => {
                assert_eq!(code, "AccessDenied");
                assert_eq!(operation, "GetRole");
                assert_eq!(message, "not authorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_role_returns_new_arn() {
        let executor = MockCommandExecutor::new().expect_command(
            "aws",
            &[
                "iam",
                "create-role",
                "--role-name",
                "serverless-step-functions-executerole",
                "--assume-role-policy-document",
                "{}",
                "--output",
                "json",
            ],
            ok(r#"{"Role":{"RoleName":"serverless-step-functions-executerole","Arn":"arn:aws:iam::1:role/serverless-step-functions-executerole"}}"#),
        );

        let role = client(executor, RequestScope::default())
            .create_role("{}", "serverless-step-functions-executerole")
            .await
            .unwrap();

        assert_eq!(role.arn, "arn:aws:iam::1:role/serverless-step-functions-executerole");
    }

    #[tokio::test]
    async fn test_create_state_machine_being_deleted_keeps_message() {
        let executor = MockCommandExecutor::new().expect_command(
            "aws",
            &[
                "stepfunctions",
                "create-state-machine",
                "--name",
                "OrderFlow",
                "--definition",
                "{}",
                "--role-arn",
                "arn:role",
                "--output",
                "json",
            ],
            failed(
                "An error occurred (StateMachineDeleting) when calling the CreateStateMachine \
                 operation: State Machine is being deleted: 'arn:aws:states:us-east-1:1:stateMachine:OrderFlow'",
            ),
        );

        let err = client(executor, RequestScope::default())
            .create_state_machine("{}", "OrderFlow", "arn:role")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("State Machine is being deleted"));
    }

    #[tokio::test]
    async fn test_unrecognised_stderr_is_command_failure() {
        let executor = MockCommandExecutor::new().expect_command(
            "aws",
            &["stepfunctions", "delete-state-machine", "--state-machine-arn", "arn:x", "--output", "json"],
            failed("Unable to locate credentials"),
        );

        let err = client(executor, RequestScope::default())
            .delete_state_machine("arn:x")
            .await
            .unwrap_err();

        assert!(matches!(err, AwsError::CommandFailed { status_code: 254, .. }));
    }

    #[tokio::test]
    async fn test_missing_cli_surfaces_command_error() {
        let err = client(MockCommandExecutor::new(), RequestScope::default())
            .get_caller_identity()
            .await
            .unwrap_err();

        assert!(matches!(err, AwsError::Command { source: CommandError::CommandNotFound { .. } }));
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_response() {
        let executor = MockCommandExecutor::new().expect_command(
            "aws",
            &["sts", "get-caller-identity", "--output", "json"],
            ok("not json"),
        );

        let err = client(executor, RequestScope::default())
            .get_caller_identity()
            .await
            .unwrap_err();

        assert!(matches!(err, AwsError::InvalidResponse { .. }));
    }
}
