use anyhow::Result;

pub mod deploy;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

pub async fn show_how_to_deploy() -> Result<()> {
    println!("🪜 stepf-deploy - Step Functions deployment");
    println!();
    println!("To deploy a state machine:");
    println!("  🚀 stepf-deploy deploy --statemachine <NAME>");
    println!("  🌍 stepf-deploy deploy --sm <NAME> --stage prod --region eu-west-1");
    println!();
    println!("State machines are read from the stepFunctions section of serverless.yml.");
    println!("💡 Run 'stepf-deploy deploy --help' for all options.");
    Ok(())
}
