mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use haptic_core::config::{Config, CONFIG_ENV};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "haptitalk",
    about = "Haptic coaching tools: pattern catalog, playback, message replay and a session server",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ./haptitalk.yaml)
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in coaching patterns
    Patterns,

    /// Read metrics out of a feedback string
    Parse {
        /// e.g. "호감도: 78%, 관심도: 92%"
        text: String,
    },

    /// Play a pattern in real time and print each pulse as it fires
    Play {
        /// Catalog id (S1, L1, F1, R1, F2, S2, R2, L3); unknown ids play the default pulse
        #[arg(required_unless_present = "test", conflicts_with = "test")]
        pattern_id: Option<String>,

        /// Variant tag, e.g. "volume_loud" mirrors S2
        #[arg(long)]
        variant: Option<String>,

        /// Play the test sequence from the haptics config instead
        #[arg(long)]
        test: bool,
    },

    /// Feed a JSONL file of inbound messages through a session
    Replay {
        /// One JSON message per line; blank lines are skipped
        file: PathBuf,

        /// Deliver as durable context updates (no acknowledgments)
        #[arg(long)]
        durable: bool,

        /// Treat the peer as unreachable, so replies go durable
        #[arg(long)]
        unreachable: bool,
    },

    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Run the HTTP/SSE session server
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let config_path = Config::resolve_path(cli.config.as_deref());

    let result = match cli.command {
        Commands::Patterns => cmd::patterns::run(cli.json),
        Commands::Parse { text } => cmd::parse::run(&text, cli.json),
        Commands::Play {
            pattern_id,
            variant,
            test,
        } => cmd::play::run(
            &config_path,
            pattern_id.as_deref(),
            variant.as_deref(),
            test,
            cli.json,
        ),
        Commands::Replay {
            file,
            durable,
            unreachable,
        } => cmd::replay::run(&config_path, &file, durable, unreachable, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&config_path, subcommand, cli.json),
        Commands::Serve { port } => cmd::serve::run(&config_path, port),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
