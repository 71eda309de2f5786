use color_eyre::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

use nanglobus::auth::{self, ConsolePrompt};
use nanglobus::cli::{parse_args, usage, CliAction};
use nanglobus::config::Config;
use nanglobus::transfer::{TransferApiClient, TransferDriver, TransferError};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    let action = match parse_args(std::env::args()) {
        Ok(action) => action,
        Err(message) => {
            eprintln!("{message}\n\n{}", usage());
            std::process::exit(2);
        }
    };

    let args = match action {
        CliAction::ShowHelp => {
            println!("{}", usage());
            return Ok(());
        }
        CliAction::ShowVersion => {
            println!("nanglobus {VERSION}");
            return Ok(());
        }
        CliAction::Run(args) => args,
    };

    color_eyre::install()?;
    init_logging(&args.log_level);

    let config = Config::load(&args.config)?;

    // One runtime for the whole process; the interactive login blocks on it
    // and the transfer loop runs under it.
    let runtime = tokio::runtime::Runtime::new()?;

    let authorizer = auth::connect(&runtime, &config, &ConsolePrompt)?;
    let client = TransferApiClient::new(authorizer);
    let mut driver = TransferDriver::new(client, &config);

    let outcome = runtime.block_on(async {
        driver.activate_endpoints().await?;
        driver.run().await
    });

    // The loop only ever comes back with an error; decide how to report it.
    if let Err(err) = outcome {
        match &err {
            TransferError::RefreshTokenExpired { .. } => eprintln!("{err}"),
            _ => error!(error = %err, "transfer loop failed"),
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize the fmt subscriber from the `--loglevel` flag.
fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_new(level.to_ascii_lowercase()).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
