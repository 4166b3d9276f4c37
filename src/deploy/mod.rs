pub mod context;
pub mod definitions;
pub mod errors;
pub mod orchestrator;
pub mod retry;
pub mod role;

pub use context::{state_machine_arn, InvocationContext, DEFAULT_REGION};
pub use definitions::{load_definitions, CompiledDefinition, DefinitionError, WorkflowDefinitions};
pub use errors::DeployError;
pub use orchestrator::{DeploySettings, DeploymentOrchestrator, DeploymentReport};
pub use retry::{is_state_machine_deleting, RetryPolicy};
pub use role::{ExecutionRole, EXECUTION_ROLE_NAME, EXECUTION_ROLE_TRUST_POLICY};
