//! Command-line front end for a [`Migrator`].
//!
//! Applications build their migrator (driver plus registered migrations) and hand it
//! to [`Cli`], which maps each subcommand onto one migrator operation:
//!
//! ```text
//! list                     Show every migration and whether it has run
//! migrate [-f|--fresh]     Apply pending migrations (after dropping all tables with --fresh)
//! rollback [-s|--step N]   Unapply the last N migrations (default 1)
//! reset                    Unapply every migration, then migrate again
//! clean                    Drop every table
//! create <name>            Write a new migration file
//! ```
//!
//! ```ignore
//! use sqlshift::{Config, Migrator};
//! use sqlshift_cli::{connect, Cli, CliArgs, CliConfig, DEFAULT_CLI_NAME};
//!
//! let args = CliArgs::parse_named(DEFAULT_CLI_NAME);
//! let migrator = Migrator::new(Config::new(connect(&args.database_url)?))?;
//! let ctx = args.context();
//! Cli::new(migrator, CliConfig::default()).run(&ctx, args.command)?;
//! ```

use std::ffi::OsString;
use std::io::{self, Write};
use std::time::Duration;

use anyhow::Context as _;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use sqlshift::{Context, Migrator};

mod connect;
pub use connect::connect;

pub mod logging;

/// Binary name shown in usage output when none is configured.
pub const DEFAULT_CLI_NAME: &str = "migration";

/// Database used when neither `--database-url` nor `DATABASE_URL` is set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:migrations.sqlite3";

#[derive(Parser, Debug)]
#[command(about = "Run and manage database migrations", long_about = None)]
pub struct CliArgs {
    /// Database to migrate (sqlite:<path>, mysql://..., postgres://...)
    #[arg(
        long,
        global = true,
        env = "DATABASE_URL",
        default_value = DEFAULT_DATABASE_URL,
        hide_env_values = true
    )]
    pub database_url: String,

    /// Give up after this many seconds; the migration in progress still completes
    #[arg(long, global = true, env = "SQLSHIFT_TIMEOUT", value_name = "SECONDS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

impl CliArgs {
    /// Parse `args` (including the program name), showing `cli_name` in usage output.
    pub fn try_parse_named<I, T>(cli_name: &str, args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = CliArgs::command()
            .bin_name(cli_name)
            .try_get_matches_from(args)?;
        CliArgs::from_arg_matches(&matches)
    }

    /// Parse the process arguments. `--help`, `--version` and usage errors print and
    /// exit the process, as clap does.
    pub fn parse_named(cli_name: &str) -> Self {
        match Self::try_parse_named(cli_name, std::env::args_os()) {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    /// A cancellation context honouring `--timeout`.
    pub fn context(&self) -> Context {
        self.context_from(&Context::background())
    }

    /// Derive from `parent`, adding `--timeout` if given. The earlier deadline wins and
    /// cancelling `parent` still cancels the result.
    pub fn context_from(&self, parent: &Context) -> Context {
        match self.timeout {
            Some(secs) => parent.with_timeout(Duration::from_secs(secs)),
            None => parent.clone(),
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show every registered migration and whether it has been executed
    List,
    /// Apply all pending migrations
    Migrate {
        /// Drop every table first, then apply all migrations
        #[arg(short, long)]
        fresh: bool,
    },
    /// Unapply the most recently executed migrations
    Rollback {
        /// Number of migrations to unapply
        #[arg(short, long, default_value_t = 1, value_parser = parse_step)]
        step: usize,
    },
    /// Unapply every executed migration, then apply them all again
    Reset,
    /// Drop every table in the database
    Clean,
    /// Create a new migration file
    Create {
        /// Description of the migration, e.g. "create users table"
        name: String,
    },
}

impl Commands {
    fn label(&self) -> &'static str {
        match self {
            Commands::List => "list",
            Commands::Migrate { .. } => "migrate",
            Commands::Rollback { .. } => "rollback",
            Commands::Reset => "reset",
            Commands::Clean => "clean",
            Commands::Create { .. } => "create",
        }
    }
}

fn parse_step(value: &str) -> Result<usize, String> {
    let step: usize = value
        .parse()
        .map_err(|_| format!("'{}' is not a whole number", value))?;
    if step < 1 {
        return Err("step must be at least 1".to_string());
    }
    Ok(step)
}

#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Name shown in usage output. Empty selects [`DEFAULT_CLI_NAME`].
    pub cli_name: String,
}

#[derive(Debug)]
pub struct Cli {
    migrator: Migrator,
    cli_name: String,
}

impl Cli {
    pub fn new(migrator: Migrator, config: CliConfig) -> Self {
        let cli_name = if config.cli_name.is_empty() {
            DEFAULT_CLI_NAME.to_string()
        } else {
            config.cli_name
        };
        Self { migrator, cli_name }
    }

    pub fn cli_name(&self) -> &str {
        &self.cli_name
    }

    pub fn migrator(&mut self) -> &mut Migrator {
        &mut self.migrator
    }

    /// Parse `args` (including the program name) as this CLI's command line.
    pub fn parse_args<I, T>(&self, args: I) -> Result<CliArgs, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        CliArgs::try_parse_named(&self.cli_name, args)
    }

    /// Parse the process arguments and run the selected command.
    pub fn execute(&mut self, ctx: &Context) -> anyhow::Result<()> {
        let args = CliArgs::parse_named(&self.cli_name);
        self.run_args(ctx, args)
    }

    /// Run the command in already parsed `args` under `ctx`, limited by `--timeout`.
    pub fn run_args(&mut self, ctx: &Context, args: CliArgs) -> anyhow::Result<()> {
        let ctx = args.context_from(ctx);
        self.run(&ctx, args.command)
    }

    /// Run one command, printing its output to stdout.
    pub fn run(&mut self, ctx: &Context, command: Commands) -> anyhow::Result<()> {
        let stdout = io::stdout();
        self.run_to(ctx, command, &mut stdout.lock())
    }

    /// Run one command, writing its output to `out`. Errors are logged before they are returned.
    pub fn run_to<W: Write>(
        &mut self,
        ctx: &Context,
        command: Commands,
        out: &mut W,
    ) -> anyhow::Result<()> {
        let label = command.label();
        tracing::debug!(command = label, "Running command");

        let result = self.dispatch(ctx, command, out);
        if let Err(ref e) = result {
            tracing::error!(command = label, error = %format!("{:#}", e), "Command failed");
        }
        result
    }

    fn dispatch<W: Write>(
        &mut self,
        ctx: &Context,
        command: Commands,
        out: &mut W,
    ) -> anyhow::Result<()> {
        match command {
            Commands::List => {
                let list = self.migrator.list(ctx).context("failed to list migrations")?;
                write!(out, "{}", list)?;
            }
            Commands::Migrate { fresh: true } => {
                self.migrator.fresh(ctx).context("fresh migration failed")?;
                writeln!(out, "Database rebuilt from scratch")?;
            }
            Commands::Migrate { fresh: false } => {
                self.migrator.migrate(ctx).context("migration failed")?;
                writeln!(out, "Migrations applied")?;
            }
            Commands::Rollback { step } => {
                self.migrator
                    .rollback(ctx, step)
                    .context("rollback failed")?;
                writeln!(out, "Rolled back up to {} migration(s)", step)?;
            }
            Commands::Reset => {
                self.migrator.reset(ctx).context("reset failed")?;
                writeln!(out, "Migrations reset")?;
            }
            Commands::Clean => {
                self.migrator.clean(ctx).context("clean failed")?;
                writeln!(out, "Database cleaned")?;
            }
            Commands::Create { name } => {
                let path = self
                    .migrator
                    .create(&name)
                    .with_context(|| format!("failed to create migration '{}'", name))?;
                writeln!(out, "Created {}", path.display())?;
            }
        }
        Ok(())
    }
}
