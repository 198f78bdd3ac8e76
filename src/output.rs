//! Human-readable rendering of run events on stderr.
//!
//! The machine-readable NDJSON stream goes to stdout; this renderer gives an
//! operator a colored view of the same run without disturbing that stream.

use crate::pipeline::event::StageEvent;
use owo_colors::OwoColorize;

/// Render one event for a human operator.
pub fn render_event(event: &StageEvent, verbose: u8) {
    match event {
        StageEvent::Start { message } => {
            eprintln!("{}", message.cyan());
        }
        StageEvent::Info { message } => {
            if message.starts_with("[keep]") {
                eprintln!("  {}", message.green());
            } else if message.starts_with("[drop]") {
                eprintln!("  {}", message.red());
            } else if message.starts_with("[skip]") {
                eprintln!("  {}", message.yellow());
            } else if message.starts_with("[validation]") {
                eprintln!("  {}", message.yellow());
            } else {
                eprintln!("{}", message.dimmed());
            }
        }
        StageEvent::Error { message } => {
            eprintln!("{}", format!("Error: {message}").red());
        }
        StageEvent::TranscriptionDone {
            transcription,
            detailed_transcript,
        } => {
            eprintln!(
                "{}",
                format!(
                    "Transcript ready ({} segments)",
                    detailed_transcript.len()
                )
                .green()
            );
            if verbose >= 1 {
                for line in transcription.lines() {
                    eprintln!("  {}", line.dimmed());
                }
            }
        }
        StageEvent::Returncode { code, message } => {
            if verbose >= 2 {
                eprintln!("{}", format!("returncode {code}: {message}").dimmed());
            }
        }
        StageEvent::Done { soap, .. } => {
            eprintln!("{}", "Final SOAP note:".green());
            for section in crate::soap::Section::ALL {
                eprintln!(
                    "  {} {}",
                    format!("{}:", section.display_name()).bold(),
                    soap.section(section)
                );
            }
        }
    }
}
