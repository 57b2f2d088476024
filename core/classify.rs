use crate::error::{AppError, Result};
use crate::process::run_with_timeout;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;
use std::time::Duration;

/// Bytes sniffed from the head of a file.
const SNIFF_LEN: u64 = 1024;

/// True when the content is empty after trimming whitespace. Bytes that are not UTF-8
/// are never blank; the text gate decides what happens to them.
pub fn is_blank(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.trim().is_empty(),
        Err(_) => false,
    }
}

/// Text-vs-binary decision for a file's content.
pub trait IsTextual: Send + Sync {
    fn is_textual(&self, path: &Path) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    /// In-process sniffing of the file head.
    #[default]
    Inspect,
    /// The `file` utility's MIME charset report.
    File,
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierKind::Inspect => f.write_str("inspect"),
            ClassifierKind::File => f.write_str("file"),
        }
    }
}

impl FromStr for ClassifierKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "inspect" => Ok(ClassifierKind::Inspect),
            "file" => Ok(ClassifierKind::File),
            other => Err(AppError::Configuration(format!(
                "Unknown classifier \"{}\" (expected inspect or file)",
                other
            ))),
        }
    }
}

pub fn build_classifier(kind: ClassifierKind, timeout: Duration) -> Box<dyn IsTextual> {
    match kind {
        ClassifierKind::Inspect => Box::new(ContentInspector),
        ClassifierKind::File => Box::new(FileCommand::new(timeout)),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContentInspector;

impl IsTextual for ContentInspector {
    fn is_textual(&self, path: &Path) -> Result<bool> {
        let classification_error = |e: std::io::Error| AppError::Classification {
            path: path.display().to_string(),
            reason: e.to_string(),
        };
        let file = File::open(path).map_err(classification_error)?;
        let mut head = Vec::with_capacity(SNIFF_LEN as usize);
        file.take(SNIFF_LEN)
            .read_to_end(&mut head)
            .map_err(classification_error)?;
        Ok(content_inspector::inspect(&head).is_text())
    }
}

/// Shells out to `file -b --mime`.
#[derive(Debug, Clone)]
pub struct FileCommand {
    timeout: Duration,
}

impl FileCommand {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl IsTextual for FileCommand {
    fn is_textual(&self, path: &Path) -> Result<bool> {
        let failure = |reason: String| AppError::Classification {
            path: path.display().to_string(),
            reason,
        };
        let mut command = Command::new("file");
        command.args(["-b", "--mime"]).arg(path);
        let output = run_with_timeout(&mut command, self.timeout)
            .map_err(|e| failure(format!("failed to run `file`: {}", e)))?;
        if !output.status.success() {
            return Err(failure(format!(
                "`file` exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let report = String::from_utf8_lossy(&output.stdout);
        parse_mime_report(report.trim())
            .ok_or_else(|| failure(format!("unexpected `file` output: {}", report.trim())))
    }
}

/// Reads `type/subtype; charset=...`. Anything with a charset other than `binary` is text.
pub fn parse_mime_report(report: &str) -> Option<bool> {
    let mut parts = report.split(';');
    let mime = parts.next()?.trim();
    if !mime.contains('/') {
        return None;
    }
    parts
        .find_map(|part| part.trim().strip_prefix("charset="))
        .map(|charset| charset.trim() != "binary")
}
