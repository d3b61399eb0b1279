use crate::demo::{run_conditions, run_demo, run_import, ConditionsArgs, DemoArgs, ImportArgs};
use crate::server;
use academia::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Academia",
    about = "Serve and explore correlativity and eligibility checks for teacher-training records",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the outcome codes accepted by a space format
    Conditions(ConditionsArgs),
    /// Check a curriculum CSV by loading it into a scratch store
    Import(ImportArgs),
    /// Seed a sample program and walk one student through it
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Curriculum CSV to load before accepting requests
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Conditions(args) => {
            run_conditions(args);
            Ok(())
        }
        Command::Import(args) => run_import(args),
        Command::Demo(args) => run_demo(args),
    }
}
