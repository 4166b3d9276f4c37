// Recording fake for AWS operations - no side effects

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::aws::{AwsError, AwsOperations, CallerIdentity, Role};

pub const FAKE_ACCOUNT: &str = "123456789012";
pub const FAKE_EXISTING_ROLE_ARN: &str =
    "arn:aws:iam::123456789012:role/service-role/StatesExecutionRole-us-east-1";
pub const FAKE_CREATED_ROLE_ARN: &str =
    "arn:aws:iam::123456789012:role/serverless-step-functions-executerole";

/// One remote call as observed by [`RecordingAwsOperations`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwsCall {
    GetCallerIdentity,
    GetRole {
        name: String,
    },
    CreateRole {
        trust_policy_document: String,
        name: String,
    },
    DeleteStateMachine {
        arn: String,
    },
    CreateStateMachine {
        definition: String,
        name: String,
        role_arn: String,
    },
}

/// Fake that records every call and answers from per-operation queues.
///
/// An empty queue means the operation succeeds with a canned response.
#[derive(Debug)]
pub struct RecordingAwsOperations {
    account: String,
    calls: Mutex<Vec<AwsCall>>,
    caller_identity_errors: Mutex<VecDeque<AwsError>>,
    get_role_errors: Mutex<VecDeque<AwsError>>,
    create_role_errors: Mutex<VecDeque<AwsError>>,
    delete_errors: Mutex<VecDeque<AwsError>>,
    create_state_machine_errors: Mutex<VecDeque<AwsError>>,
}

impl Default for RecordingAwsOperations {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingAwsOperations {
    pub fn new() -> Self {
        Self {
            account: FAKE_ACCOUNT.to_string(),
            calls: Mutex::new(Vec::new()),
            caller_identity_errors: Mutex::new(VecDeque::new()),
            get_role_errors: Mutex::new(VecDeque::new()),
            create_role_errors: Mutex::new(VecDeque::new()),
            delete_errors: Mutex::new(VecDeque::new()),
            create_state_machine_errors: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_account(mut self, account: &str) -> Self {
        self.account = account.to_string();
        self
    }

    pub fn fail_caller_identity(self, error: AwsError) -> Self {
        push(&self.caller_identity_errors, error);
        self
    }

    pub fn role_missing(self, name: &str) -> Self {
        self.fail_get_role(AwsError::RoleNotFound {
            name: name.to_string(),
        })
    }

    pub fn fail_get_role(self, error: AwsError) -> Self {
        push(&self.get_role_errors, error);
        self
    }

    pub fn fail_create_role(self, error: AwsError) -> Self {
        push(&self.create_role_errors, error);
        self
    }

    pub fn fail_delete(self, error: AwsError) -> Self {
        push(&self.delete_errors, error);
        self
    }

    /// Queue a failure for the next `create_state_machine` call
    pub fn fail_create_state_machine(self, error: AwsError) -> Self {
        push(&self.create_state_machine_errors, error);
        self
    }

    pub fn calls(&self) -> Vec<AwsCall> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }

    pub fn count_calls(&self, predicate: impl Fn(&AwsCall) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, call: AwsCall) {
        self.calls.lock().expect("mock call log poisoned").push(call);
    }
}

fn push(queue: &Mutex<VecDeque<AwsError>>, error: AwsError) {
    queue.lock().expect("mock queue poisoned").push_back(error);
}

fn pop(queue: &Mutex<VecDeque<AwsError>>) -> Result<(), AwsError> {
    match queue.lock().expect("mock queue poisoned").pop_front() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[async_trait]
impl AwsOperations for RecordingAwsOperations {
    async fn get_caller_identity(&self) -> Result<CallerIdentity, AwsError> {
        self.record(AwsCall::GetCallerIdentity);
        pop(&self.caller_identity_errors)?;
        Ok(CallerIdentity {
            account: self.account.clone(),
            arn: Some(format!("arn:aws:iam::{}:user/deployer", self.account)),
            user_id: None,
        })
    }

    async fn get_role(&self, name: &str) -> Result<Role, AwsError> {
        self.record(AwsCall::GetRole {
            name: name.to_string(),
        });
        pop(&self.get_role_errors)?;
        Ok(Role {
            name: name.to_string(),
            arn: FAKE_EXISTING_ROLE_ARN.to_string(),
        })
    }

    async fn create_role(&self, trust_policy_document: &str, name: &str) -> Result<Role, AwsError> {
        self.record(AwsCall::CreateRole {
            trust_policy_document: trust_policy_document.to_string(),
            name: name.to_string(),
        });
        pop(&self.create_role_errors)?;
        Ok(Role {
            name: name.to_string(),
            arn: FAKE_CREATED_ROLE_ARN.to_string(),
        })
    }

    async fn delete_state_machine(&self, arn: &str) -> Result<(), AwsError> {
        self.record(AwsCall::DeleteStateMachine {
            arn: arn.to_string(),
        });
        pop(&self.delete_errors)
    }

    async fn create_state_machine(
        &self,
        definition: &str,
        name: &str,
        role_arn: &str,
    ) -> Result<(), AwsError> {
        self.record(AwsCall::CreateStateMachine {
            definition: definition.to_string(),
            name: name.to_string(),
            role_arn: role_arn.to_string(),
        });
        pop(&self.create_state_machine_errors)
    }
}
