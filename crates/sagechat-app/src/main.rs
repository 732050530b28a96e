use anyhow::Result;
use clap::Parser;

use sagechat::{
    export_history, init_tracing, list_histories, run_repl_mode, run_web_server, Cli, Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.default_log_level());

    match &cli.command {
        Commands::Serve(args) => run_web_server(args).await,
        Commands::Chat(args) => run_repl_mode(args).await,
        Commands::List(args) => list_histories(args),
        Commands::Export(args) => export_history(args),
    }
}
