use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    list_cheats, resolve_title, scan_mods, CheatsArgs, ResolveArgs, ScanArgs,
};
use miette::Result;

mod commands;
mod errors;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan mod search roots and report what was found
    Scan {
        /// Mod search roots (contents roots, patch roots, or parents of either)
        #[arg(required = true)]
        roots: Vec<String>,

        /// Only report this title (16 hex digits)
        #[arg(short, long)]
        title: Option<String>,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve a title's content overlays onto a base container
    Resolve {
        /// Mod search roots
        #[arg(required = true)]
        roots: Vec<String>,

        /// Title to resolve (16 hex digits)
        #[arg(short, long)]
        title: String,

        /// Path to the title's base content container
        #[arg(short, long)]
        base: String,

        /// Where to write the rebuilt container
        #[arg(short, long, default_value = "resolved.nxpack")]
        output: String,
    },
    /// List the cheat entries discovered for a title
    Cheats {
        /// Mod search roots
        #[arg(required = true)]
        roots: Vec<String>,

        /// Title to inspect (16 hex digits)
        #[arg(short, long)]
        title: String,

        /// Emit the list as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).expect("failed to parse arguments")
}

/// Initialize logging.
///
/// Set `RUST_LOG` for finer control, e.g.:
/// - `RUST_LOG=nxm_overlay=trace,info`
/// - `RUST_LOG=nxm_patch=debug,warn`
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = parse_args();
    init_logging(args.verbose);

    match args.command {
        Commands::Scan { roots, title, json } => scan_mods(ScanArgs { roots, title, json }),
        Commands::Resolve {
            roots,
            title,
            base,
            output,
        } => resolve_title(ResolveArgs {
            roots,
            title,
            base,
            output,
        }),
        Commands::Cheats { roots, title, json } => list_cheats(CheatsArgs { roots, title, json }),
    }
}
