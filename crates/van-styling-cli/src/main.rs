mod cmd;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use van_styling::{StylingConfig, UnsupportedInputPolicy};

#[derive(Parser)]
#[command(name = "van-style", version, about = "Van styling engine - scenario runner")]
struct Cli {
    /// Run contract checks regardless of the scenario config
    #[arg(long, global = true)]
    dev: bool,
    /// Treat unsupported styling input as an empty map instead of failing
    #[arg(long, global = true)]
    lenient: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file and print its trace
    Run {
        /// Path to the scenario JSON
        file: PathBuf,
        /// Pretty-print the trace
        #[arg(long)]
        pretty: bool,
    },
    /// Read one scenario per stdin line, write one JSON response per line
    Serve,
}

/// Command-line switches layered over a scenario's own config.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub dev: bool,
    pub lenient: bool,
}

impl Overrides {
    pub fn apply(self, config: &mut StylingConfig) {
        if self.dev {
            config.dev_mode = true;
        }
        if self.lenient {
            config.unsupported_input = UnsupportedInputPolicy::Empty;
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let overrides = Overrides {
        dev: cli.dev,
        lenient: cli.lenient,
    };

    let result = match cli.command {
        Commands::Run { file, pretty } => cmd::run::run(&file, pretty, overrides),
        Commands::Serve => cmd::serve::run(overrides),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
