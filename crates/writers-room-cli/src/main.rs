//! Writers' Room CLI entry point.
//!
//! Binary name: `wroom`
//!
//! Parses CLI arguments, installs tracing, then dispatches to the command
//! handler.

mod cli;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use writers_room_infra::filesystem::resolve_config_dir;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = writers_room_observe::log_filter(cli.verbose, cli.quiet);
    writers_room_observe::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(shell, &mut cmd, "wroom", &mut std::io::stdout());
            Ok(())
        }

        Commands::Report { transcripts } => {
            cli::report::report(&transcripts, cli.json).await
        }

        Commands::Run(args) => {
            let config_dir = cli.config_dir.unwrap_or_else(resolve_config_dir);
            cli::run::run(&config_dir, args, cli.json, cli.quiet).await
        }
    };

    writers_room_observe::shutdown_tracing();
    result
}
