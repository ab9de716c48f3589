mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "assessor-cli")]
#[command(about = "Assessor CLI - Judge C++ solutions against the question bank", long_about = None)]
struct Cli {
    /// Print raw JSON responses instead of a summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a solution against custom input or a question's examples
    Run {
        /// Path to the C++ source file
        source: PathBuf,

        /// Question id whose example cases to run
        #[arg(short, long)]
        question: Option<String>,

        /// Custom stdin; overrides the question's examples
        #[arg(short, long)]
        input: Option<String>,

        /// Skip the judge backend and use the local simulator
        #[arg(long, default_value = "false")]
        offline: bool,

        /// Question bank file
        #[arg(long, default_value = "config/questions.json")]
        questions: PathBuf,
    },

    /// Submit a solution for scoring over examples and hidden cases
    Submit {
        /// Path to the C++ source file
        source: PathBuf,

        /// Question id
        #[arg(short, long)]
        question: String,

        /// Skip the judge backend and use the local simulator
        #[arg(long, default_value = "false")]
        offline: bool,

        /// Question bank file
        #[arg(long, default_value = "config/questions.json")]
        questions: PathBuf,
    },

    /// Write starter judge.json and questions.json files
    Init {
        /// Project path
        #[arg(short, long, default_value = ".")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            source,
            question,
            input,
            offline,
            questions,
        } => {
            commands::run(
                &source,
                question.as_deref(),
                input.as_deref(),
                offline,
                &questions,
                cli.json,
            )
            .await?;
        }
        Commands::Submit {
            source,
            question,
            offline,
            questions,
        } => {
            commands::submit(&source, &question, offline, &questions, cli.json).await?;
        }
        Commands::Init { path } => {
            commands::init_project(&path)?;
        }
    }

    Ok(())
}
