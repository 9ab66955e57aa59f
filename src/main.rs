use std::io;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use vmconsole::cli::{Cli, Command};
use vmconsole::stream::WebSocketClient;
use vmconsole::{describe_error, open_session, Console, ConsoleError, Interrupts, SessionOutcome};

fn main() {
    let cli = Cli::parse();
    let vmi = match &cli.command {
        Command::Console(args) => Some(args.vmi.as_str()),
    };
    vmconsole::logging::init_tracing(vmi);

    // wss connections need a process-wide TLS crypto provider.
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("TLS crypto provider already installed");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(run(cli));

    // Relay tasks that lost the race may still be blocked on stdin; don't wait for them.
    runtime.shutdown_background();

    match result {
        Ok(outcome) => {
            tracing::info!("Session finished: {:?}", outcome);
            std::process::exit(0);
        }
        Err(err) => {
            if let Some(console_err) = err.downcast_ref::<ConsoleError>() {
                describe_error(console_err, &mut io::stderr());
            }
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<SessionOutcome> {
    let config = cli.load_config().map_err(ConsoleError::from)?;

    match &cli.command {
        Command::Console(args) => {
            let target = args.target(cli.namespace(&config));
            let timeout_minutes = args.timeout_minutes(&config);
            let server = config.server_url().map_err(ConsoleError::from)?;
            let client = Arc::new(WebSocketClient::new(server, config.cluster.token.clone()));
            let console = Console::stdio(Interrupts::from_os());

            let outcome = open_session(client, console, target, timeout_minutes).await?;
            Ok(outcome)
        }
    }
}
