mod cli;
mod commands;
mod config;
mod error;
mod output;
mod state;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use redirectctl_core::Reconciler;

use crate::cli::{Cli, Command, LogFormat};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let mut cli = Cli::parse();

    init_tracing(cli.global.verbose, cli.global.log_format);

    // Unreadable config is reported by the command that needs it.
    if let Ok(cfg) = config::load_config_from(&config::effective_config_path(&cli.global)) {
        config::apply_display_defaults(&mut cli.global, &cfg.defaults);
    }

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, format: LogFormat) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Offline commands never need credentials
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "redirectctl", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let graph_config = config::resolve_graph_config(&cli.global)?;
            let cancel = CancellationToken::new();
            let reconciler = Reconciler::new(&graph_config)?.with_cancellation(cancel.clone());

            // First Ctrl-C cancels in-flight requests; the reconciler
            // surfaces it as an interruption.
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, cancelling");
                    cancel.cancel();
                }
            });

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &reconciler, &cli.global).await
        }
    }
}
