use crate::demo::{run_scan_demo, ScanDemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use labelwise::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Labelwise",
    about = "Resolve product barcodes and evaluate ingredient safety from the command line",
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
    /// Run an offline scan demo against seeded in-memory stores
    Scan(ScanDemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Scan(args) => run_scan_demo(args).await,
    }
}
