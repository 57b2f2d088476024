use crate::classify::ClassifierKind;
use crate::error::{AppError, Result};
use crate::policy::Category;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILENAMES: [&str; 3] = [".repoctx.toml", ".repoctx.yml", ".repoctx.yaml"];
pub const LEGACY_IGNORE_FILENAME: &str = ".gptignore";
pub const DEFAULT_OUTPUT_FILE: &str = "output.txt";
pub const DEFAULT_COMMAND_TIMEOUT: &str = "10s";

/// One configuration layer. Every field is optional: `None` means "not set here",
/// so the layer below decides.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_default_ignore: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_comments: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preamble_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<ClassifierKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub categories: IndexMap<String, CategoryConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Config {
    /// Compiled-in bottom layer. Every field is set.
    pub fn defaults() -> Self {
        let categories = Category::ALL
            .iter()
            .map(|category| {
                (
                    category.as_str().to_string(),
                    CategoryConfig {
                        enabled: Some(true),
                        pattern: category.default_pattern().map(String::from),
                    },
                )
            })
            .collect();
        Self {
            exclude_files: Some(Vec::new()),
            include_files: Some(Vec::new()),
            use_default_ignore: Some(true),
            remove_comments: Some(false),
            output_file: Some(PathBuf::from(DEFAULT_OUTPUT_FILE)),
            preamble_file: None,
            classifier: Some(ClassifierKind::default()),
            command_timeout: Some(DEFAULT_COMMAND_TIMEOUT.to_string()),
            categories,
        }
    }

    /// defaults < project < overrides.
    pub fn layered(project: Config, overrides: Config) -> Self {
        merge(merge(Config::defaults(), project), overrides)
    }

    pub fn determine_project_root(cli_project_root: Option<&PathBuf>) -> Result<PathBuf> {
        let path_str_opt = cli_project_root
            .map(|p| p.to_string_lossy().to_string())
            .or_else(|| env::var("REPOCTX_ROOT").ok().filter(|s| !s.is_empty()));

        let path_to_resolve = match path_str_opt {
            Some(p_str) => PathBuf::from(shellexpand::tilde(&p_str).as_ref()),
            None => env::current_dir().map_err(AppError::Io)?,
        };

        path_to_resolve.canonicalize().map_err(|e| {
            AppError::RepositoryAccess(format!(
                "Failed to resolve repository root '{}': {}",
                path_to_resolve.display(),
                e
            ))
        })
    }

    pub fn resolve_config_path(
        project_root: &Path,
        cli_config_file: Option<&PathBuf>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(p) => {
                let path = PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).as_ref());
                if !path.is_file() {
                    return Err(AppError::Configuration(format!(
                        "Specified config file not found at path: {}",
                        path.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", path.display());
                Ok(Some(path))
            }
            None => {
                let found = DEFAULT_CONFIG_FILENAMES
                    .iter()
                    .map(|name| project_root.join(name))
                    .find(|candidate| candidate.is_file());
                match &found {
                    Some(path) => log::debug!("Using project config file: {}", path.display()),
                    None => log::debug!(
                        "No config file specified and none found in: {}",
                        project_root.display()
                    ),
                }
                Ok(found)
            }
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let content = read_utf8_config(config_path)?;
        let is_yaml = config_path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"));
        let parsed = if is_yaml {
            serde_yml::from_str::<Config>(&content).map_err(|e| e.to_string())
        } else {
            toml::from_str::<Config>(&content).map_err(|e| e.to_string())
        };
        parsed.map_err(|e| {
            AppError::Configuration(format!(
                "Error parsing config file '{}': {}",
                config_path.display(),
                e
            ))
        })
    }

    /// Patterns from a `.gptignore` file at the repository root, if present.
    pub fn load_legacy_ignore(project_root: &Path) -> Result<Option<Vec<String>>> {
        let path = project_root.join(LEGACY_IGNORE_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }
        let content = read_utf8_config(&path)?;
        let patterns: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect();
        log::debug!(
            "Loaded {} patterns from {}",
            patterns.len(),
            path.display()
        );
        Ok(Some(patterns))
    }

    /// The project layer: config file (if any) plus `.gptignore` patterns. Relative file
    /// paths in the config file are anchored at the repository root.
    pub fn load_project_layer(
        project_root: &Path,
        cli_config_file: Option<&PathBuf>,
        cli_disable_config: bool,
    ) -> Result<Self> {
        let mut layer =
            match Self::resolve_config_path(project_root, cli_config_file, cli_disable_config)? {
                Some(path) => Self::load_from_path(&path)?,
                None => Config::default(),
            };
        if cli_disable_config {
            return Ok(layer);
        }

        layer.output_file = layer.output_file.map(|p| anchor(project_root, p));
        layer.preamble_file = layer.preamble_file.map(|p| anchor(project_root, p));

        if let Some(patterns) = Self::load_legacy_ignore(project_root)? {
            let legacy = Config {
                exclude_files: Some(patterns),
                ..Config::default()
            };
            layer = merge(layer, legacy);
        }
        Ok(layer)
    }

    pub fn effective_timeout(&self) -> Result<Duration> {
        let raw = self
            .command_timeout
            .as_deref()
            .unwrap_or(DEFAULT_COMMAND_TIMEOUT);
        parse_duration::parse(raw).map_err(|e| {
            AppError::Configuration(format!(
                "Invalid command timeout '{}': {}. Use format like '500ms', '10s'.",
                raw, e
            ))
        })
    }

    pub fn effective_classifier(&self) -> ClassifierKind {
        self.classifier.unwrap_or_default()
    }

    pub fn effective_output_file(&self) -> PathBuf {
        self.output_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE))
    }
}

/// I/O failures stay `FileRead`; a readable file that is not UTF-8 is malformed config.
fn read_utf8_config(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| AppError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    String::from_utf8(bytes).map_err(|_| {
        AppError::Configuration(format!(
            "Config file '{}' is not valid UTF-8",
            path.display()
        ))
    })
}

fn anchor(project_root: &Path, path: PathBuf) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());
    if expanded.is_absolute() {
        expanded
    } else {
        project_root.join(expanded)
    }
}

/// Overlays `overlay` on `base`. Scalars: overlay wins when set. Pattern lists: union in
/// base-then-overlay order, duplicates dropped. Categories: merged field by field.
pub fn merge(base: Config, overlay: Config) -> Config {
    let mut categories = base.categories;
    for (name, over) in overlay.categories {
        let entry = categories.entry(name).or_default();
        entry.enabled = over.enabled.or(entry.enabled);
        entry.pattern = over.pattern.or(entry.pattern.take());
    }

    Config {
        exclude_files: union(base.exclude_files, overlay.exclude_files),
        include_files: union(base.include_files, overlay.include_files),
        use_default_ignore: overlay.use_default_ignore.or(base.use_default_ignore),
        remove_comments: overlay.remove_comments.or(base.remove_comments),
        output_file: overlay.output_file.or(base.output_file),
        preamble_file: overlay.preamble_file.or(base.preamble_file),
        classifier: overlay.classifier.or(base.classifier),
        command_timeout: overlay.command_timeout.or(base.command_timeout),
        categories,
    }
}

fn union(base: Option<Vec<String>>, overlay: Option<Vec<String>>) -> Option<Vec<String>> {
    match (base, overlay) {
        (Some(mut merged), Some(extra)) => {
            for pattern in extra {
                if !merged.contains(&pattern) {
                    merged.push(pattern);
                }
            }
            Some(merged)
        }
        (base, None) => base,
        (None, overlay) => overlay,
    }
}
