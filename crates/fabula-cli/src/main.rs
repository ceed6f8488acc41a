//! CLI frontend for the Fabula narrative scripting engine.

mod commands;
mod story;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "fabula",
    about = "Fabula, a narrative scripting interpreter and story runner",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint story fragments and report diagnostics
    Check {
        /// Check a single fragment instead of the whole story
        fragment: Option<String>,

        /// Story file to check
        #[arg(short, long, default_value = "fabula.json")]
        story: PathBuf,
    },

    /// Resolve one fragment and print the result
    Run {
        /// Fragment name
        fragment: String,

        /// Story file to load
        #[arg(short, long, default_value = "fabula.json")]
        story: PathBuf,

        /// Extract action blocks without executing them
        #[arg(long)]
        no_actions: bool,
    },

    /// List registered conditions, actions, placeholders, and templates
    Registry {
        /// Story file whose templates to include
        #[arg(short, long)]
        story: Option<PathBuf>,
    },

    /// Play a story interactively
    Play {
        /// Story file to play
        #[arg(short, long, default_value = "fabula.json")]
        story: PathBuf,

        /// Fragment to start from (default: the story's start fragment)
        #[arg(long)]
        start: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { fragment, story } => commands::check::run(&story, fragment.as_deref()),
        Commands::Run {
            fragment,
            story,
            no_actions,
        } => commands::run::run(&story, &fragment, no_actions),
        Commands::Registry { story } => commands::registry::run(story.as_deref()),
        Commands::Play { story, start } => commands::play::run(&story, start.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
