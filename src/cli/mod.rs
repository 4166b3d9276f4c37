use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "stepf-deploy")]
#[command(about = "Deploy AWS Step Functions state machines from serverless.yml")]
#[command(long_about = "stepf-deploy replaces a single state machine defined under stepFunctions in \
                       serverless.yml: it resolves your account, ensures an execution role exists, \
                       deletes the previously deployed state machine and creates it again.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy one state machine, replacing any existing one with the same name
    Deploy {
        /// Name of the state machine under stepFunctions
        #[arg(short = 'm', long, visible_alias = "sm", help = "Name of the State Machine")]
        statemachine: String,
        /// Deployment stage
        #[arg(short = 's', long, help = "Stage used to pick the AWS credential profile")]
        stage: Option<String>,
        /// Target region
        #[arg(short = 'r', long, help = "Region to deploy to (defaults to us-east-1)")]
        region: Option<String>,
        /// Project root holding serverless.yml
        #[arg(short = 'p', long, default_value = ".", help = "Directory containing serverless.yml")]
        path: PathBuf,
    },
}
