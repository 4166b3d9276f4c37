/// Region used for the target ARN when the invocation does not name one
pub const DEFAULT_REGION: &str = "us-east-1";

const ARN_PARTITION: &str = "aws";

/// What the caller asked to deploy. Immutable for the whole invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub statemachine: String,
    pub stage: Option<String>,
    pub region: Option<String>,
}

impl InvocationContext {
    pub fn new(statemachine: impl Into<String>) -> Self {
        Self {
            statemachine: statemachine.into(),
            stage: None,
            region: None,
        }
    }

    pub fn with_stage(mut self, stage: Option<String>) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    /// The invocation region, or `default_region` when unset
    pub fn region_or<'a>(&'a self, default_region: &'a str) -> &'a str {
        self.region.as_deref().unwrap_or(default_region)
    }
}

/// Compose `arn:aws:states:<region>:<account>:stateMachine:<name>`.
///
/// The name is used verbatim; nothing is escaped or validated.
pub fn state_machine_arn(region: &str, account: &str, name: &str) -> String {
    format!("arn:{ARN_PARTITION}:states:{region}:{account}:stateMachine:{name}")
}
