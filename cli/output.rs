use anyhow::{Context, Result};
use byte_unit::{Byte, UnitType};
use colored::*;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use repoctx_core::{AppError, Explanation, GenerationReport, SkipReason};
use serde::Serialize;
use std::io::{self, Write};
use tiktoken_rs::cl100k_base;

pub fn print_generation_summary(report: &GenerationReport, tokens: Option<usize>) {
    let size = Byte::from_u64(report.bytes_written)
        .get_appropriate_unit(UnitType::Binary)
        .to_string();
    println!(
        "{} Wrote {} sections to {} ({})",
        "✅".green(),
        report.included.len().to_string().cyan(),
        report.output_path.display().to_string().blue(),
        size.cyan()
    );
    println!(
        "{:<20} {}",
        "Tracked files:".green(),
        report.tracked.to_string().cyan()
    );
    println!(
        "{:<20} {}",
        "Filtered by rules:".green(),
        report.filtered.to_string().cyan()
    );
    if let Some(tokens) = tokens {
        println!("{:<20} {}", "Est. tokens:".green(), tokens.to_string().cyan());
    }

    if report.skipped.is_empty() {
        return;
    }
    println!(
        "{:<20} {}",
        "Skipped files:".yellow(),
        report.skipped.len().to_string().yellow()
    );
    for skipped in &report.skipped {
        println!(
            "  - {} {}",
            skipped.path.dimmed(),
            format!("({})", describe_skip(&skipped.reason)).dimmed()
        );
    }
}

fn describe_skip(reason: &SkipReason) -> String {
    match reason {
        SkipReason::Blank => "blank".to_string(),
        SkipReason::Binary => "binary".to_string(),
        SkipReason::Encoding => "not UTF-8".to_string(),
        SkipReason::Symlink => "symlink".to_string(),
        SkipReason::Unreadable(e) => format!("unreadable: {}", e),
        SkipReason::Classification(e) => format!("classification failed: {}", e),
    }
}

pub fn print_explain_table(explanations: &[Explanation], quiet: bool) {
    if explanations.is_empty() {
        println!("{}", "(No tracked files)".yellow());
        return;
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Path").fg(Color::Green),
        Cell::new("Included").fg(Color::Green),
        Cell::new("Reason").fg(Color::Green),
    ]);
    for explanation in explanations {
        let (mark, color) = if explanation.included {
            ("yes", Color::Cyan)
        } else {
            ("no", Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(&explanation.path).fg(color),
            Cell::new(mark).fg(color),
            Cell::new(explanation.decision.describe()).fg(Color::DarkGrey),
        ]);
    }
    println!("{table}");

    if !quiet {
        let included = explanations.iter().filter(|e| e.included).count();
        println!(
            "{} of {} tracked files pass the rules.",
            included.to_string().cyan(),
            explanations.len().to_string().cyan()
        );
    }
}

pub fn print_structured<T: Serialize>(data: &T, format: &str) -> Result<()> {
    let content = serialize_output(data, format)?;
    write_to_stdout(&content)
}

fn serialize_output<T: Serialize>(data: &T, format: &str) -> Result<String> {
    let content = match format.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yml::to_string(data).map_err(AppError::from)?,
        "toml" => toml::to_string_pretty(data).map_err(AppError::from)?,
        _ => serde_json::to_string_pretty(data).map_err(AppError::from)?,
    };
    Ok(content)
}

/// cl100k token count of `text`.
pub fn estimate_tokens(text: &str) -> Result<usize> {
    let bpe = cl100k_base().map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
    Ok(bpe.encode_ordinary(text).len())
}

fn write_to_stdout(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    if !content.ends_with('\n') {
        handle
            .write_all(b"\n")
            .context("Failed to write newline to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}
