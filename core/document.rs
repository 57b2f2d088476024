use crate::builtin::{DOCUMENT_TERMINATOR, SECTION_DIVIDER, get_default_preamble};
use crate::error::{AppError, Result};
use serde::Serialize;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One file's contribution to the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preamble {
    Default,
    Custom(String),
}

impl Preamble {
    /// Reads a caller-supplied preamble verbatim, or falls back to the built-in header.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                log::debug!("Reading preamble from {}", p.display());
                fs::read_to_string(p)
                    .map(Preamble::Custom)
                    .map_err(|e| AppError::FileRead {
                        path: p.to_path_buf(),
                        source: e,
                    })
            }
            None => Ok(Preamble::Default),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Preamble::Default => get_default_preamble(),
            Preamble::Custom(text) => text,
        }
    }
}

/// Streams the framing: preamble, sections in call order, terminator.
pub struct DocumentWriter<W: Write> {
    inner: W,
    sections: usize,
}

impl<W: Write> DocumentWriter<W> {
    pub fn start(mut inner: W, preamble: &Preamble) -> io::Result<Self> {
        inner.write_all(preamble.text().as_bytes())?;
        Ok(Self { inner, sections: 0 })
    }

    pub fn write_section(&mut self, section: &Section) -> io::Result<()> {
        writeln!(self.inner, "{}", SECTION_DIVIDER)?;
        writeln!(self.inner, "{}", section.path)?;
        writeln!(self.inner, "{}", section.content)?;
        self.sections += 1;
        Ok(())
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.inner.write_all(DOCUMENT_TERMINATOR.as_bytes())?;
        self.inner.flush()?;
        log::trace!("Document finished with {} sections.", self.sections);
        Ok(self.inner)
    }
}

pub fn render_document(preamble: &Preamble, sections: &[Section]) -> Result<String> {
    let mut writer = DocumentWriter::start(Vec::new(), preamble)?;
    for section in sections {
        writer.write_section(section)?;
    }
    let bytes = writer.finish()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Writes the document next to `target` and renames it into place, so `target` only
/// ever holds a complete document. Returns the number of bytes written.
pub fn write_document_atomically(
    target: &Path,
    preamble: &Preamble,
    sections: &[Section],
) -> Result<u64> {
    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&parent).map_err(|e| AppError::FileWrite {
        path: parent.clone(),
        source: e,
    })?;

    let write_error = |e: io::Error| AppError::FileWrite {
        path: target.to_path_buf(),
        source: e,
    };
    let mut staging = NamedTempFile::new_in(&parent).map_err(write_error)?;
    {
        let mut writer =
            DocumentWriter::start(BufWriter::new(staging.as_file_mut()), preamble)
                .map_err(write_error)?;
        for section in sections {
            writer.write_section(section).map_err(write_error)?;
        }
        writer.finish().map_err(write_error)?;
    }
    staging.as_file().sync_all().map_err(write_error)?;
    apply_target_permissions(staging.as_file(), target).map_err(write_error)?;
    staging.persist(target).map_err(|e| write_error(e.error))?;

    let written = fs::metadata(target).map_err(write_error)?.len();
    log::info!("Wrote {} bytes to {}", written, target.display());
    Ok(written)
}

/// Keeps the permissions of a document being replaced; new documents get the usual
/// world-readable mode instead of the private mode of a temporary file.
fn apply_target_permissions(staging: &fs::File, target: &Path) -> io::Result<()> {
    let permissions = match fs::metadata(target) {
        Ok(metadata) if metadata.is_file() => metadata.permissions(),
        #[cfg(unix)]
        _ => {
            use std::os::unix::fs::PermissionsExt;
            fs::Permissions::from_mode(0o644)
        }
        #[cfg(not(unix))]
        _ => return Ok(()),
    };
    staging.set_permissions(permissions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn section(path: &str, content: &str) -> Section {
        Section {
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn framing_matches_the_documented_layout() {
        let preamble = Preamble::Custom("Intro\n".to_string());
        let document = render_document(
            &preamble,
            &[
                section("relative/path/one", "one\n"),
                section("relative/path/two", "two\n"),
            ],
        )
        .unwrap();
        assert_eq!(
            document,
            "Intro\n----\nrelative/path/one\none\n\n----\nrelative/path/two\ntwo\n\n--END--"
        );
    }

    #[test]
    fn empty_selection_is_preamble_plus_terminator() {
        let document = render_document(&Preamble::Default, &[]).unwrap();
        assert_eq!(
            document,
            format!("{}--END--", get_default_preamble())
        );
    }

    #[test]
    fn custom_preamble_is_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preamble.txt");
        fs::write(&path, "This is a custom preamble").unwrap();
        let preamble = Preamble::load(Some(&path)).unwrap();
        assert_eq!(
            render_document(&preamble, &[]).unwrap(),
            "This is a custom preamble--END--"
        );
    }

    #[test]
    fn missing_preamble_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.txt");
        assert!(matches!(
            Preamble::load(Some(&missing)),
            Err(AppError::FileRead { .. })
        ));
    }

    #[test]
    fn atomic_write_replaces_existing_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out").join("context.txt");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "stale content that is much longer than the new document").unwrap();

        let sections = [section("a.rb", "puts 1")];
        let written =
            write_document_atomically(&target, &Preamble::Custom(String::new()), &sections)
                .unwrap();

        let on_disk = fs::read_to_string(&target).unwrap();
        assert_eq!(on_disk, "----\na.rb\nputs 1\n--END--");
        assert_eq!(written, on_disk.len() as u64);
        let leftovers: Vec<_> = fs::read_dir(target.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested/deeper/context.txt");
        write_document_atomically(&target, &Preamble::Default, &[]).unwrap();
        assert!(target.is_file());
    }

    #[test]
    fn failed_rename_leaves_no_staging_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("context.txt");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("inside.txt"), "keep").unwrap();

        let result =
            write_document_atomically(&target, &Preamble::Default, &[section("a.rb", "1")]);
        assert!(matches!(result, Err(AppError::FileWrite { .. })));

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("context.txt")]);
        assert!(target.is_dir());
        assert_eq!(fs::read_to_string(target.join("inside.txt")).unwrap(), "keep");
    }
}
