//! Execution role naming and the trust document used when one is created.

/// Name of the role created when the lookup finds nothing
pub const EXECUTION_ROLE_NAME: &str = "serverless-step-functions-executerole";

/// Region baked into the looked-up role name, independent of the target region
pub const ROLE_LOOKUP_REGION: &str = "us-east-1";

/// Assume-role document attached to a newly created execution role.
///
/// Grants `lambda:InvokeFunction` on every resource. It is a trust document
/// only; no permissions policy is attached alongside it.
pub const EXECUTION_ROLE_TRUST_POLICY: &str = r#"{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Effect": "Allow",
      "Action": [
        "lambda:InvokeFunction"
      ],
      "Resource": "*"
    }
  ]
}"#;

/// Name of the role looked up before falling back to creation
pub fn role_lookup_name(lookup_region: &str) -> String {
    format!("StatesExecutionRole-{lookup_region}")
}

/// The role a state machine will be bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRole {
    pub arn: String,
    /// `true` when this invocation had to create the role
    pub created: bool,
}
