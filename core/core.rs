pub mod builtin;
pub mod classify;
pub mod config;
pub mod document;
pub mod error;
pub mod gather;
pub mod lister;
pub mod policy;
pub mod process;
pub mod transform;

pub use builtin::{BuiltinIgnores, get_builtin_ignore_patterns, get_default_preamble};
pub use classify::{ClassifierKind, ContentInspector, FileCommand, IsTextual, build_classifier};
pub use config::{CategoryConfig, Config};
pub use document::{Preamble, Section, render_document, write_document_atomically};
pub use error::{AppError, Result};
pub use gather::{
    Explanation, Gathered, GenerationReport, SkipReason, SkippedFile, explain_decisions,
    gather_sections, generate,
};
pub use lister::{GitLister, ListTrackedFiles};
pub use policy::{Category, Decision, Policy};
