use crate::classify::{IsTextual, is_blank};
use crate::document::{Preamble, Section, write_document_atomically};
use crate::error::{AppError, Result};
use crate::lister::ListTrackedFiles;
use crate::policy::{Decision, Policy};
use crate::transform::strip_comments;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Why an included path did not produce a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    Blank,
    Binary,
    Encoding,
    /// Tracked symlinks are never followed; their targets may lie outside the snapshot.
    Symlink,
    Unreadable(String),
    Classification(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: SkipReason,
}

/// Result of running the selection pipeline over one repository.
#[derive(Debug, Clone, Default)]
pub struct Gathered {
    pub sections: Vec<Section>,
    pub skipped: Vec<SkippedFile>,
    /// Paths the lister reported.
    pub tracked: usize,
    /// Paths the rule engine turned away.
    pub filtered: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub path: String,
    pub included: bool,
    pub decision: Decision,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub output_path: PathBuf,
    pub tracked: usize,
    pub included: Vec<String>,
    pub filtered: usize,
    pub skipped: Vec<SkippedFile>,
    pub bytes_written: u64,
}

enum FileOutcome {
    Kept(Section),
    Skipped(SkipReason),
}

/// Lists, filters, classifies and transforms every tracked file. Sections come back
/// in listing order. Per-file failures are recorded in `skipped`; a listing failure
/// aborts the whole run.
pub fn gather_sections(
    project_root: &Path,
    policy: &Policy,
    lister: &dyn ListTrackedFiles,
    classifier: &dyn IsTextual,
) -> Result<Gathered> {
    gather_sections_excluding(project_root, policy, lister, classifier, None)
}

fn gather_sections_excluding(
    project_root: &Path,
    policy: &Policy,
    lister: &dyn ListTrackedFiles,
    classifier: &dyn IsTextual,
    own_output: Option<&str>,
) -> Result<Gathered> {
    log::debug!("Starting selection pipeline in {}", project_root.display());
    let tracked = lister.list_tracked_files(project_root)?;

    let candidates: Vec<&str> = tracked
        .iter()
        .map(String::as_str)
        .filter(|path| {
            if own_output == Some(*path) {
                log::debug!("Skipping {}: it is the output target.", path);
                return false;
            }
            policy.should_include(path)
        })
        .collect();
    let filtered = tracked.len() - candidates.len();
    log::info!(
        "{} of {} tracked files pass the rules; reading content...",
        candidates.len(),
        tracked.len()
    );

    let outcomes: Vec<(&str, FileOutcome)> = candidates
        .par_iter()
        .map(|path| {
            read_section(project_root, path, policy, classifier).map(|outcome| (*path, outcome))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut gathered = Gathered {
        tracked: tracked.len(),
        filtered,
        ..Gathered::default()
    };
    for (path, outcome) in outcomes {
        match outcome {
            FileOutcome::Kept(section) => gathered.sections.push(section),
            FileOutcome::Skipped(reason) => gathered.skipped.push(SkippedFile {
                path: path.to_string(),
                reason,
            }),
        }
    }
    log::info!(
        "Selected {} sections, skipped {} files.",
        gathered.sections.len(),
        gathered.skipped.len()
    );
    Ok(gathered)
}

/// Per-file errors become skips; anything else is returned and aborts the run.
fn read_section(
    project_root: &Path,
    path: &str,
    policy: &Policy,
    classifier: &dyn IsTextual,
) -> Result<FileOutcome> {
    match try_read_section(project_root, path, policy, classifier) {
        Ok(outcome) => Ok(outcome),
        Err(e) if e.is_per_file() => {
            log::warn!("Skipping {}: {}", path, e);
            let reason = match e {
                AppError::Encoding { .. } => SkipReason::Encoding,
                AppError::Classification { reason, .. } => SkipReason::Classification(reason),
                AppError::FileRead { source, .. } => SkipReason::Unreadable(source.to_string()),
                other => SkipReason::Unreadable(other.to_string()),
            };
            Ok(FileOutcome::Skipped(reason))
        }
        Err(e) => Err(e),
    }
}

fn try_read_section(
    project_root: &Path,
    path: &str,
    policy: &Policy,
    classifier: &dyn IsTextual,
) -> Result<FileOutcome> {
    let absolute = project_root.join(path);
    let metadata = fs::symlink_metadata(&absolute).map_err(|e| AppError::FileRead {
        path: absolute.clone(),
        source: e,
    })?;
    if metadata.file_type().is_symlink() {
        log::warn!("Skipping {}: tracked symlink is not followed", path);
        return Ok(FileOutcome::Skipped(SkipReason::Symlink));
    }
    let bytes = fs::read(&absolute).map_err(|e| AppError::FileRead {
        path: absolute.clone(),
        source: e,
    })?;

    if is_blank(&bytes) {
        log::debug!("Skipping blank file: {}", path);
        return Ok(FileOutcome::Skipped(SkipReason::Blank));
    }
    if !classifier.is_textual(&absolute)? {
        log::debug!("Skipping binary file: {}", path);
        return Ok(FileOutcome::Skipped(SkipReason::Binary));
    }

    let content = String::from_utf8(bytes).map_err(|_| AppError::Encoding {
        path: path.to_string(),
    })?;
    let content = if policy.remove_comments() {
        strip_comments(path, &content).into_owned()
    } else {
        content
    };
    log::trace!("Including {} ({} bytes)", path, content.len());
    Ok(FileOutcome::Kept(Section {
        path: path.to_string(),
        content,
    }))
}

/// Evaluates every tracked path against the rules only; files are not opened.
pub fn explain_decisions(
    project_root: &Path,
    policy: &Policy,
    lister: &dyn ListTrackedFiles,
) -> Result<Vec<Explanation>> {
    let tracked = lister.list_tracked_files(project_root)?;
    Ok(tracked
        .into_iter()
        .map(|path| {
            let decision = policy.evaluate(&path);
            Explanation {
                included: decision.is_included(),
                path,
                decision,
            }
        })
        .collect())
}

/// Runs the pipeline and replaces `output` with the assembled document. Nothing is
/// written when listing fails.
pub fn generate(
    project_root: &Path,
    policy: &Policy,
    lister: &dyn ListTrackedFiles,
    classifier: &dyn IsTextual,
    preamble: &Preamble,
    output: &Path,
) -> Result<GenerationReport> {
    let own_output = output_relative_to_root(project_root, output);
    let gathered = gather_sections_excluding(
        project_root,
        policy,
        lister,
        classifier,
        own_output.as_deref(),
    )?;
    let bytes_written = write_document_atomically(output, preamble, &gathered.sections)?;

    Ok(GenerationReport {
        output_path: output.to_path_buf(),
        tracked: gathered.tracked,
        included: gathered.sections.into_iter().map(|s| s.path).collect(),
        filtered: gathered.filtered,
        skipped: gathered.skipped,
        bytes_written,
    })
}

/// The output target's path as the lister would report it, when it lies inside the
/// repository. A tracked output file would otherwise feed into the next run.
fn output_relative_to_root(project_root: &Path, output: &Path) -> Option<String> {
    let file_name = output.file_name()?;
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let parent = fs::canonicalize(parent).ok()?;
    let root = fs::canonicalize(project_root).ok()?;
    let relative = parent.join(file_name).strip_prefix(&root).ok()?.to_path_buf();
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}
