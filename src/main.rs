//! Adhan - plays the call to prayer at each prayer time
//!
//! The `daemon` subcommand runs the scheduler in the foreground; every
//! other subcommand talks to a running daemon over its Unix socket.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use adhan::cli::{Cli, Commands, Display, HomeArgs, IpcClient};
use adhan::config::AdhanConfig;
use adhan::daemon;
use adhan::types::date_key;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        // No command provided, show help
        Cli::command().print_help()?;
        return Ok(());
    };

    if let Commands::Completions { shell } = command {
        generate_completions(shell);
        return Ok(());
    }

    let config_path = cli.config.unwrap_or_else(AdhanConfig::default_path);
    let config = AdhanConfig::load(&config_path)?;
    let client = IpcClient::from_config(&config);

    match command {
        Commands::Daemon => daemon::run(&config).await?,
        Commands::Load(args) => {
            let response = client.load(&args.city, &args.country).await?;
            Display::show_load(&response);
        }
        Commands::Show { date } => {
            let response = client.show(date).await?;
            Display::show_day(&response);
        }
        Commands::Status => {
            let response = client.status().await?;
            Display::show_status(&response);
        }
        Commands::Stop => {
            let response = client.stop().await?;
            Display::show_message(&response);
        }
        Commands::SetTime(args) => {
            let date = args
                .date
                .unwrap_or_else(|| date_key(chrono::Local::now().date_naive()));
            let response = client.set_time(date, args.prayer, args.time).await?;
            Display::show_message(&response);
        }
        Commands::SetAdhan(args) => {
            // The daemon may run from another working directory
            let path = std::path::absolute(&args.path)
                .with_context(|| format!("Invalid path {}", args.path.display()))?;
            let response = client.set_adhan(args.prayer, path).await?;
            Display::show_message(&response);
        }
        Commands::List => {
            let response = client.list().await?;
            Display::show_list(&response);
        }
        Commands::Delete { filename } => {
            let response = client.delete(filename).await?;
            Display::show_message(&response);
        }
        Commands::Home(HomeArgs {
            city: Some(city),
            country: Some(country),
        }) => {
            let response = client.set_home(&city, &country).await?;
            Display::show_message(&response);
        }
        Commands::Home(_) => {
            let response = client.get_home().await?;
            Display::show_home(&response);
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
