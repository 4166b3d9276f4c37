//! External tool abstractions
//!
//! Trait-based seams over the `aws` command line tool, so the deployment
//! pipeline can be exercised without touching a real account.

pub mod aws;
pub mod command;
pub mod mocks;

pub use aws::{AwsCliClient, AwsError, AwsOperations, CallerIdentity, RequestScope, Role};
pub use command::{CommandError, CommandExecutor, CommandOutput, ProcessCommandExecutor};
pub use mocks::{AwsCall, RecordingAwsOperations};
