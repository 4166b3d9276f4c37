//! Deployment sequencing.
//!
//! A deployment is a fixed chain of steps where each step consumes the
//! values produced by the previous ones:
//!
//! 1. load definitions from the project file
//! 2. resolve the target ARN from the caller's account
//! 3. extract and serialize the requested definition
//! 4. look up the execution role, creating it when it does not exist
//! 5. delete any state machine already deployed at the target ARN
//! 6. create the state machine, retrying while the old one is still deleting

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

use super::context::{state_machine_arn, InvocationContext, DEFAULT_REGION};
use super::definitions::{load_definitions, CompiledDefinition, WorkflowDefinitions};
use super::errors::DeployError;
use super::retry::{is_state_machine_deleting, RetryFailure, RetryPolicy};
use super::role::{
    role_lookup_name, ExecutionRole, EXECUTION_ROLE_NAME, EXECUTION_ROLE_TRUST_POLICY,
    ROLE_LOOKUP_REGION,
};
use crate::external::{AwsError, AwsOperations};
use crate::telemetry::{create_deployment_span, generate_correlation_id};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySettings {
    /// Region for the target ARN when the invocation has none
    pub default_region: String,
    /// Region embedded in the looked-up role name
    pub role_lookup_region: String,
    /// Name given to a newly created execution role
    pub role_name: String,
    pub create_retry: RetryPolicy,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            default_region: DEFAULT_REGION.to_string(),
            role_lookup_region: ROLE_LOOKUP_REGION.to_string(),
            role_name: EXECUTION_ROLE_NAME.to_string(),
            create_retry: RetryPolicy::default(),
        }
    }
}

/// What a successful deployment did
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    pub state_machine_arn: String,
    pub role_arn: String,
    pub role_created: bool,
    pub create_attempts: u32,
    pub deployed_at: DateTime<Utc>,
}

pub struct DeploymentOrchestrator {
    aws: Arc<dyn AwsOperations>,
    settings: DeploySettings,
    project_root: Option<PathBuf>,
}

impl DeploymentOrchestrator {
    pub fn new(aws: Arc<dyn AwsOperations>, settings: DeploySettings) -> Self {
        Self {
            aws,
            settings,
            project_root: None,
        }
    }

    pub fn with_project_root(mut self, project_root: Option<PathBuf>) -> Self {
        self.project_root = project_root;
        self
    }

    /// Run the whole pipeline for `ctx`
    pub async fn deploy(&self, ctx: &InvocationContext) -> Result<DeploymentReport, DeployError> {
        let correlation_id = generate_correlation_id();
        let span = create_deployment_span(
            &ctx.statemachine,
            ctx.stage.as_deref(),
            ctx.region.as_deref(),
            &correlation_id,
        );

        async {
            info!("Starting state machine deployment");

            let definitions = self.load_definitions()?;
            let arn = self.resolve_target_arn(ctx).await?;
            let definition = self.extract_definition(definitions.as_ref(), &ctx.statemachine)?;
            let role = self.resolve_execution_role().await?;
            let create_attempts = self.replace_state_machine(&arn, &definition, &role).await?;

            info!(arn = %arn, create_attempts, "State machine deployed");
            Ok::<_, DeployError>(DeploymentReport {
                state_machine_arn: arn,
                role_arn: role.arn,
                role_created: role.created,
                create_attempts,
                deployed_at: Utc::now(),
            })
        }
        .instrument(span)
        .await
    }

    /// Step 1: read the `stepFunctions` section of the project file
    pub fn load_definitions(&self) -> Result<Option<WorkflowDefinitions>, DeployError> {
        Ok(load_definitions(self.project_root.as_deref())?)
    }

    /// Step 2
    pub async fn resolve_target_arn(&self, ctx: &InvocationContext) -> Result<String, DeployError> {
        let identity = self.aws.get_caller_identity().await?;
        let region = ctx.region_or(&self.settings.default_region);
        let arn = state_machine_arn(region, &identity.account, &ctx.statemachine);

        debug!(account = %identity.account, arn = %arn, "Resolved target ARN");
        Ok(arn)
    }

    /// Step 3: a missing definition is fatal, including when no definitions
    /// were loaded at all
    pub fn extract_definition(
        &self,
        definitions: Option<&WorkflowDefinitions>,
        name: &str,
    ) -> Result<CompiledDefinition, DeployError> {
        let document = definitions
            .and_then(|definitions| definitions.get(name))
            .ok_or_else(|| DeployError::StateMachineNotFound {
                name: name.to_string(),
            })?;

        Ok(CompiledDefinition::compile(name, document)?)
    }

    /// Step 4
    pub async fn resolve_execution_role(&self) -> Result<ExecutionRole, DeployError> {
        let lookup_name = role_lookup_name(&self.settings.role_lookup_region);

        match self.aws.get_role(&lookup_name).await {
            Ok(role) => {
                debug!(role_arn = %role.arn, "Using existing execution role");
                Ok(ExecutionRole {
                    arn: role.arn,
                    created: false,
                })
            }
            Err(AwsError::RoleNotFound { .. }) => {
                info!(
                    lookup = %lookup_name,
                    role_name = %self.settings.role_name,
                    "Execution role not found, creating it"
                );
                let role = self
                    .aws
                    .create_role(EXECUTION_ROLE_TRUST_POLICY, &self.settings.role_name)
                    .await?;
                Ok(ExecutionRole {
                    arn: role.arn,
                    created: true,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Step 5: any error aborts, not-found included
    pub async fn delete_state_machine(&self, arn: &str) -> Result<(), DeployError> {
        self.aws.delete_state_machine(arn).await?;
        debug!(arn, "Deleted existing state machine");
        Ok(())
    }

    /// Step 6. Returns how many attempts creation took.
    pub async fn create_state_machine(
        &self,
        definition: &CompiledDefinition,
        role: &ExecutionRole,
    ) -> Result<u32, DeployError> {
        let aws = &self.aws;
        let outcome = self
            .settings
            .create_retry
            .execute_with_retry(
                || aws.create_state_machine(&definition.definition, &definition.name, &role.arn),
                is_state_machine_deleting,
            )
            .await;

        match outcome {
            Ok(attempted) => Ok(attempted.attempts),
            Err(RetryFailure::NonRetryable { error, .. }) => Err(error.into()),
            Err(RetryFailure::Exhausted { attempts, error }) => {
                warn!(name = %definition.name, attempts, "Gave up creating state machine");
                Err(DeployError::RetriesExhausted {
                    name: definition.name.clone(),
                    attempts,
                    source: error,
                })
            }
        }
    }

    /// Steps 5 and 6 alone, for callers that already hold a definition and role
    pub async fn replace_state_machine(
        &self,
        arn: &str,
        definition: &CompiledDefinition,
        role: &ExecutionRole,
    ) -> Result<u32, DeployError> {
        self.delete_state_machine(arn).await?;
        self.create_state_machine(definition, role).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{AwsCall, RecordingAwsOperations};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn orchestrator(fake: Arc<RecordingAwsOperations>) -> DeploymentOrchestrator {
        DeploymentOrchestrator::new(fake, DeploySettings::default())
    }

    #[test]
    fn test_extract_without_definitions_is_not_found() {
        let orchestrator = orchestrator(Arc::new(RecordingAwsOperations::new()));

        let err = orchestrator.extract_definition(None, "OrderFlow").unwrap_err();
        assert_eq!(err.to_string(), "state machine \"OrderFlow\" does not exist");
    }

    #[test]
    fn test_extract_serializes_selected_definition() {
        let orchestrator = orchestrator(Arc::new(RecordingAwsOperations::new()));
        let mut map = BTreeMap::new();
        map.insert("A".to_string(), json!({"StartAt": "X"}));
        map.insert("B".to_string(), json!({"StartAt": "Y"}));
        let definitions = WorkflowDefinitions::new(map);

        let compiled = orchestrator.extract_definition(Some(&definitions), "B").unwrap();
        assert_eq!(compiled.definition, r#"{"StartAt":"Y"}"#);
    }

    #[tokio::test]
    async fn test_replace_deletes_before_creating() {
        let fake = Arc::new(RecordingAwsOperations::new());
        let orchestrator = orchestrator(fake.clone());
        let definition = CompiledDefinition {
            name: "Flow".to_string(),
            definition: "{}".to_string(),
        };
        let role = ExecutionRole {
            arn: "arn:role".to_string(),
            created: false,
        };

        let attempts = orchestrator
            .replace_state_machine("arn:sm", &definition, &role)
            .await
            .unwrap();

        assert_eq!(attempts, 1);
        assert_eq!(
            fake.calls(),
            vec![
                AwsCall::DeleteStateMachine {
                    arn: "arn:sm".to_string()
                },
                AwsCall::CreateStateMachine {
                    definition: "{}".to_string(),
                    name: "Flow".to_string(),
                    role_arn: "arn:role".to_string(),
                },
            ]
        );
    }
}
