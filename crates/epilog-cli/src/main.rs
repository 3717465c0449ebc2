use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use commands::{clear, import};
use history_import_core::ImportOrder;
use history_import_models::SourceKind;
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "epilog")]
#[command(about = "Epilog - Replay your viewing history into your Serializd diary")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Also write logs to this file (rotated daily)
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import viewing history from a source into the diary
    #[command(long_about = "Read per-episode viewing history from a Netflix \
ViewingActivity.csv export, a Plex SQLite database, or a hand-authored CSV, and \
replay it as diary entries with the original watch dates. Safe to re-run: \
episodes already logged on the same day are skipped.")]
    Import {
        /// Where the history comes from
        #[arg(value_enum)]
        source: SourceArg,

        /// Path to the export file or database
        path: PathBuf,

        /// Preview the full report without writing anything
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,

        /// Only import viewings from this profile
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,

        /// Shows to exclude (comma-separated, repeatable)
        #[arg(long, value_name = "SHOWS", value_delimiter = ',')]
        exclude: Vec<String>,

        /// File with shows to exclude, one per line ('#' for comments)
        #[arg(long, value_name = "PATH")]
        exclude_file: Option<PathBuf>,

        /// Import order: oldest first or newest first
        #[arg(long, value_enum, value_name = "ORDER")]
        order: Option<OrderArg>,

        /// Tag added to every imported entry (default: per-source tag)
        #[arg(long, value_name = "TAG")]
        tag: Option<String>,

        /// Days within which repeat viewings collapse into the latest one
        #[arg(long, value_name = "DAYS")]
        dedup_window: Option<i64>,

        /// File mapping show titles to TMDB ids, one 'Title:id' per line
        #[arg(long, value_name = "PATH")]
        id_map: Option<PathBuf>,

        /// Pause between remote writes, in milliseconds
        #[arg(long, value_name = "MS")]
        write_delay_ms: Option<u64>,
    },
    /// Remove previously imported diary entries
    #[command(long_about = "Delete diary entries on the tracking service, either \
every entry carrying a given tag (e.g. #netfliximport) or all entries. Also \
clears locally stored credentials with --credentials.")]
    Clear {
        /// Delete only entries carrying this tag
        #[arg(long, value_name = "TAG")]
        tag: Option<String>,

        /// Delete ALL diary entries
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "tag")]
        all: bool,

        /// Clear stored credentials (session token, passwords)
        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long, action = ArgAction::SetTrue)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    Netflix,
    Plex,
    Csv,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Netflix => SourceKind::Netflix,
            SourceArg::Plex => SourceKind::Plex,
            SourceArg::Csv => SourceKind::Csv,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    Oldest,
    Newest,
}

impl From<OrderArg> for ImportOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Oldest => ImportOrder::Oldest,
            OrderArg::Newest => ImportOrder::Newest,
        }
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.quiet, cli.log_file.clone())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Import {
            source,
            path,
            dry_run,
            profile,
            exclude,
            exclude_file,
            order,
            tag,
            dedup_window,
            id_map,
            write_delay_ms,
        } => {
            let args = import::ImportArgs {
                source: source.into(),
                path,
                dry_run,
                profile,
                exclude,
                exclude_file,
                order: order.map(Into::into),
                tag,
                dedup_window,
                id_map,
                write_delay_ms,
            };
            import::run_import(args, &output).await
        }
        Commands::Clear {
            tag,
            all,
            credentials,
            yes,
        } => clear::run_clear(tag, all, credentials, yes, &output).await,
    }
}
