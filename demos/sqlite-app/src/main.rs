//! Sample application embedding the sqlshift command line.
//!
//! ```text
//! DATABASE_URL=sqlite:app.sqlite3 cargo run -p sqlite-app -- migrate
//! cargo run -p sqlite-app -- list
//! cargo run -p sqlite-app -- rollback --step 2
//! ```

mod migrations;

use std::process::ExitCode;

use sqlshift::{Config, Migrator};
use sqlshift_cli::{connect, logging, Cli, CliArgs, CliConfig};

const CLI_NAME: &str = "sqlite-app";

fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    if let Err(e) = logging::init("info") {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    // Parse args first so --help works without a database
    let args = CliArgs::parse_named(CLI_NAME);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    let ctx = args.context();
    let driver = connect(&args.database_url)?;

    let mut migrator = Migrator::new(Config::new(driver))?;
    migrator.register(migrations::all())?;

    let mut cli = Cli::new(
        migrator,
        CliConfig {
            cli_name: CLI_NAME.to_string(),
        },
    );
    cli.run(&ctx, args.command)
}
