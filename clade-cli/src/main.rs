use clap::Parser;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "clade",
    version,
    about = "Normalize biodiversity checklists into a clean taxonomic graph"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Classify an error into a documented exit code.
///
/// Exit codes:
///   0 — success
///   1 — general/unknown error
///   2 — configuration error
///   3 — source files missing or unreadable
///   4 — database error
///   5 — normalization failed
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}");
    let lower = msg.to_lowercase();

    if lower.contains("config") {
        2 // config error
    } else if lower.contains("cannot resolve path")
        || lower.contains("no core data file")
        || lower.contains("usable header")
        || lower.contains("source")
    {
        3 // source error
    } else if lower.contains("database")
        || lower.contains("sqlite")
        || lower.contains("payload")
        || lower.contains("corrupt row")
    {
        4 // database error
    } else if lower.contains("not unique")
        || lower.contains("required data missing")
        || lower.contains("interrupted")
        || lower.contains("normalization")
    {
        5 // normalization error
    } else {
        1 // general error
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    match commands::run(cli.command) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}
