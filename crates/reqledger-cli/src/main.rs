#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use reqledger_core::ErrorCode;
use reqledger_core::config::{DB_PATH_ENV, LedgerConfig, load_config, resolve_config};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "reqledger: append-only versioned ledger for hotel service requests",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Ledger database path (overrides REQLEDGER_DB and reqledger.toml).
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Give up on the command after this many milliseconds.
    #[arg(long, global = true, value_name = "MS")]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Create or migrate the ledger database",
        after_help = "EXAMPLES:\n    reqledger init\n    reqledger --db /var/lib/reqledger/requests.db init"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        about = "Create a request (version 1)",
        after_help = "EXAMPLES:\n    reqledger create --hotel-id H1 --name Towels --request-type one-time --status pending --priority high\n\n    reqledger create --payload '{\"hotel_id\":\"H1\",\"name\":\"Towels\",\"request_type\":\"one-time\",\"status\":\"pending\",\"priority\":\"high\"}'"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        about = "Append a new version from a partial update",
        after_help = "EXAMPLES:\n    reqledger update <ID> --status completed\n\n    reqledger update <ID> --payload '{\"notes\":null}'\n\n    reqledger update <ID> --clear room_id"
    )]
    Update(cmd::update::UpdateArgs),

    #[command(
        about = "Show the latest or a historical version of a request",
        after_help = "EXAMPLES:\n    reqledger show <ID>\n    reqledger show <ID> --version 1 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        about = "List the latest version of each request",
        after_help = "EXAMPLES:\n    reqledger list --status pending\n    reqledger list --hotel-id H1 --limit 50 --after <ID>"
    )]
    List(cmd::list::ListArgs),

    #[command(about = "Show every version of a request, oldest first")]
    History(cmd::history::HistoryArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("REQLEDGER_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "reqledger=debug,info"
        } else {
            "reqledger=info,warn"
        })
    });

    let format = env::var("REQLEDGER_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_settings(cli: &Cli, root: &Path) -> anyhow::Result<LedgerConfig> {
    let config = match load_config(root) {
        Ok(config) => config,
        Err(err) => {
            render_error(
                cli.output_mode(),
                &CliError::new(format!("{err:#}"), ErrorCode::ConfigParseError),
            )?;
            return Err(err);
        }
    };
    Ok(resolve_config(
        config,
        root,
        cli.db.clone(),
        env::var(DB_PATH_ENV).ok(),
    ))
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let ctx = cmd::Context {
        config: load_settings(&cli, &project_root)?,
        output: cli.output_mode(),
        timeout: cli.timeout_ms.map(Duration::from_millis),
    };

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, &ctx),
        Commands::Create(ref args) => cmd::create::run_create(args, &ctx),
        Commands::Update(ref args) => cmd::update::run_update(args, &ctx),
        Commands::Show(ref args) => cmd::show::run_show(args, &ctx),
        Commands::List(ref args) => cmd::list::run_list(args, &ctx),
        Commands::History(ref args) => cmd::history::run_history(args, &ctx),
    }
}
