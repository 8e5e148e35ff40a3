use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod cli;
mod config;
mod error;
mod output;
mod sources;
mod status;
mod transcribe;
mod utils;

use api::TranscriptionService;
use cli::{Cli, Commands, OutputFormat};
use config::Config;
use status::StatusReporter;
use transcribe::{TranscriptionOutcome, TranscriptionPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "facilita=debug"
    } else {
        "facilita=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Transcribe {
            media,
            prompt,
            prompt_id,
            output,
            format,
            save_audio,
        } => {
            // ffmpeg/ffprobe only matter for local input (non-fatal warning)
            let is_web_input = media.starts_with("http://")
                || media.starts_with("https://")
                || sources::youtube::is_valid_youtube_url(&media);
            if !is_web_input {
                let missing_deps = utils::check_dependencies().await;
                if !missing_deps.is_empty() {
                    eprintln!("⚠️  Dependency check warnings:");
                    for dep in missing_deps {
                        eprintln!("   • {}", dep);
                    }
                    eprintln!("   (Continuing anyway - MP3 input needs neither)");
                }
            }

            let mut config = Config::load().await?;
            if save_audio {
                config.app.keep_audio = true;
            }

            let format = format
                .unwrap_or_else(|| OutputFormat::from_name(&config.app.default_output_format));

            let pipeline = TranscriptionPipeline::new(config)?;
            let prompt = pipeline.resolve_prompt(prompt, prompt_id).await?;
            let mut reporter = StatusReporter::new(cli.quiet);

            tracing::info!("Starting transcription for: {}", media);

            let outcome = pipeline.run(&media, &prompt, &mut reporter).await?;

            match output {
                Some(path) => {
                    output::save_to_file(&outcome, &path, &format).await?;
                    println!("Transcription saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&outcome, &format)?;
                }
            }

            if let Some(audio_path) = &outcome.audio_path {
                println!("Audio saved to: {}", audio_path.display());
            }

            if cli.verbose {
                print_summary(&outcome);
            }
        }
        Commands::Prompts => {
            let config = Config::load().await?;
            let client = api::ApiClient::new(&config.api.base_url);
            let prompts = client.list_prompts().await?;

            if prompts.is_empty() {
                println!("No prompt templates available.");
            } else {
                println!("Available prompt templates:");
                for template in prompts {
                    println!(
                        "  {} {}",
                        console::style(format!("[{}]", template.id)).cyan().bold(),
                        console::style(&template.title).bold()
                    );
                    if !template.template.is_empty() {
                        println!("      {}", template.template);
                    }
                }
                println!();
                println!("Use one with: facilita transcribe <MEDIA> --prompt-id <ID>");
            }
        }
        Commands::Sources => {
            println!("Supported media sources:");
            println!("  • YouTube links (youtube.com/watch?v=..., youtu.be/...)");
            println!("  • Local audio files (mp3, wav, m4a, aac, flac, ogg, opus)");
            println!("  • Local video files (mp4, mov, mkv, avi, webm, m4v, wmv)");
        }
        Commands::Config { show } => {
            let config = Config::load().await?;
            if show {
                config.display();
            } else {
                println!("Config file: {}", Config::config_path()?.display());
                println!(
                    "Edit it to change endpoints, or set {} for the resolver key.",
                    config::RESOLVER_KEY_ENV
                );
            }
        }
    }

    Ok(())
}

/// Extra context for `--verbose`, kept off stdout so piped output stays clean.
fn print_summary(outcome: &TranscriptionOutcome) {
    use console::style;

    eprintln!();
    eprintln!("{}", style("Transcription details:").bold());
    eprintln!("  Video ID: {}", outcome.video_id);
    if let Some(title) = &outcome.track.title {
        eprintln!("  Title: {}", title);
    }
    eprintln!(
        "  Source: {} ({})",
        outcome.track.kind.as_str(),
        outcome.track.origin
    );
    if let Some(duration) = outcome.track.duration {
        eprintln!("  Duration: {}", utils::format_duration(duration));
    }
    if let Some(size) = outcome.track.file_size {
        eprintln!("  Audio Size: {}", utils::format_file_size(size));
    }
}
