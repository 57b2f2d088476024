use once_cell::sync::Lazy;
use serde::Deserialize;

/// Marker line written before every section header.
pub const SECTION_DIVIDER: &str = "----";
/// Final token of every document.
pub const DOCUMENT_TERMINATOR: &str = "--END--";

#[derive(Debug, Default, Deserialize)]
pub struct BuiltinIgnores {
    #[serde(default)]
    pub patterns: Vec<String>,
}

static BUILTIN_IGNORE_PATTERNS: Lazy<BuiltinIgnores> = Lazy::new(|| {
    let yaml_content = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../data/default_ignore.yaml"
    ));
    serde_yml::from_str(yaml_content).expect("Failed to parse embedded data/default_ignore.yaml")
});

static DEFAULT_PREAMBLE: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../data/preamble.txt"));

pub fn get_builtin_ignore_patterns() -> &'static BuiltinIgnores {
    &BUILTIN_IGNORE_PATTERNS
}

pub fn get_default_preamble() -> &'static str {
    DEFAULT_PREAMBLE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_ignore_list_parses() {
        let ignores = get_builtin_ignore_patterns();
        assert!(ignores.patterns.iter().any(|p| p == "bin/*"));
        assert!(ignores.patterns.iter().any(|p| p == "*.key"));
    }

    #[test]
    fn default_preamble_describes_framing() {
        let preamble = get_default_preamble();
        assert!(preamble.contains(SECTION_DIVIDER));
        assert!(preamble.contains(DOCUMENT_TERMINATOR));
        assert!(preamble.ends_with('\n'));
    }
}
