/// Test fixtures: throwaway serverless projects on disk
use std::path::Path;
use tempfile::TempDir;

#[allow(dead_code)]
pub const ORDER_FLOW_PROJECT: &str = r#"
service: orders

provider:
  name: aws
  runtime: nodejs18.x

functions:
  charge:
    handler: handler.charge

stepFunctions:
  OrderFlow:
    Comment: Charge then ship
    StartAt: Charge
    States:
      Charge:
        Type: Task
        Resource: arn:aws:lambda:us-east-1:1234:function:orders-dev-charge
        Next: Ship
      Ship:
        Type: Pass
        End: true
  Refunds:
    StartAt: Done
    States:
      Done:
        Type: Succeed
"#;

/// A project directory holding `content` under `file_name`
#[allow(dead_code)]
pub fn project_with(file_name: &str, content: &str) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp project dir");
    write_file(dir.path(), file_name, content);
    dir
}

/// A project directory with the OrderFlow and Refunds state machines
#[allow(dead_code)]
pub fn order_flow_project() -> TempDir {
    project_with("serverless.yml", ORDER_FLOW_PROJECT)
}

fn write_file(dir: &Path, file_name: &str, content: &str) {
    std::fs::write(dir.join(file_name), content).expect("Failed to write project file");
}
