use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::transcribe::TranscriptionOutcome;

/// JSON shape written for `--format json`
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    video_id: &'a str,
    transcription: &'a str,
    prompt: &'a str,
    source: SourceReport<'a>,
    completed_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
struct SourceReport<'a> {
    kind: &'a str,
    origin: &'a str,
    title: Option<&'a str>,
    duration_secs: Option<f64>,
    file_size: Option<u64>,
}

fn render(outcome: &TranscriptionOutcome, format: &OutputFormat) -> Result<String> {
    let content = match format {
        OutputFormat::Text => format!("{}\n", outcome.transcription),
        OutputFormat::Json => {
            let report = JsonReport {
                video_id: &outcome.video_id,
                transcription: &outcome.transcription,
                prompt: &outcome.prompt,
                source: SourceReport {
                    kind: outcome.track.kind.as_str(),
                    origin: &outcome.track.origin,
                    title: outcome.track.title.as_deref(),
                    duration_secs: outcome.track.duration,
                    file_size: outcome.track.file_size,
                },
                completed_at: outcome.completed_at,
            };
            serde_json::to_string_pretty(&report)?
        }
    };

    Ok(content)
}

/// Save the transcription to a file
pub async fn save_to_file(
    outcome: &TranscriptionOutcome,
    path: &Path,
    format: &OutputFormat,
) -> Result<()> {
    let content = render(outcome, format)?;

    fs_err::write(path, content)?;
    Ok(())
}

/// Print the transcription to the console
pub fn print_to_console(outcome: &TranscriptionOutcome, format: &OutputFormat) -> Result<()> {
    let content = render(outcome, format)?;

    print!("{}", content);
    Ok(())
}
