//! Recap generator binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use recap_cli::config::options_schema;
use recap_cli::prompt::{prompt_options, wait_for_enter};
use recap_cli::{load_options, CliOverrides, RecapPipeline, RecapResult, DEFAULT_OPTIONS_FILE};
use recap_models::ClipSelectionMethod;

#[derive(Debug, Parser)]
#[command(name = "recap", version, about = "Assemble a captioned recap video from a spreadsheet of clips")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Options document (YAML)
    #[arg(short, long, default_value = DEFAULT_OPTIONS_FILE)]
    options: PathBuf,

    /// Spreadsheet listing the source videos
    #[arg(long)]
    sheet: Option<PathBuf>,

    /// Directory containing the source videos
    #[arg(long)]
    videos: Option<PathBuf>,

    /// Output video file
    #[arg(short = 'O', long)]
    output: Option<PathBuf>,

    /// Clip selection method (auto or manual)
    #[arg(short, long)]
    mode: Option<ClipSelectionMethod>,

    /// Clip length in seconds for automatic selection
    #[arg(long)]
    clip_length: Option<u32>,

    /// Prompt for the common options before running
    #[arg(short, long)]
    interactive: bool,

    /// Exit without waiting for Enter
    #[arg(long)]
    no_wait: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the JSON schema of the options document
    Schema,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let cli = Cli::parse();

    if matches!(cli.command, Some(Command::Schema)) {
        match options_schema() {
            Ok(schema) => println!("{}", schema),
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let no_wait = cli.no_wait;
    let result = run(cli).await;

    let (message, code) = match &result {
        Ok(output) => {
            info!(output = %output.display(), "Recap generation complete");
            ("Recap generation complete!", 0)
        }
        Err(e) => {
            error!("Recap generation failed: {}", e);
            ("Recap generation failed.", 1)
        }
    };

    if !no_wait {
        wait_for_enter(message).ok();
    }

    std::process::exit(code);
}

async fn run(cli: Cli) -> RecapResult<PathBuf> {
    let mut options = load_options(&cli.options)?;

    CliOverrides {
        video_data_file: cli.sheet,
        video_directory: cli.videos,
        output_file: cli.output,
        clip_selection_method: cli.mode,
        clip_length: cli.clip_length,
    }
    .apply(&mut options);

    if cli.interactive {
        options = prompt_options(options)?;
    }

    info!(
        sheet = %options.video_data_file.display(),
        videos = %options.video_directory.display(),
        output = %options.output_file.display(),
        mode = %options.clip_selection_method,
        clip_length = options.clip_length,
        include_intro = options.include_intro,
        "Starting recap"
    );

    RecapPipeline::new(options).run().await
}

/// Pretty logs by default, JSON with `LOG_FORMAT=json`.
fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("recap=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .try_init()?;
    }

    Ok(())
}
