use crate::builtin::get_builtin_ignore_patterns;
use crate::config::Config;
use crate::error::{AppError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::Serialize;

pub mod category;

pub use category::Category;

/// Outcome of evaluating one path, naming the rule that decided it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "detail", rename_all = "snake_case")]
pub enum Decision {
    ExcludeFiles(String),
    IncludeFiles(String),
    DefaultIgnore(String),
    Category(Category),
    NoCategory,
}

impl Decision {
    pub fn is_included(&self) -> bool {
        matches!(self, Decision::IncludeFiles(_) | Decision::Category(_))
    }

    pub fn describe(&self) -> String {
        match self {
            Decision::ExcludeFiles(p) => format!("excluded by exclude_files \"{}\"", p),
            Decision::IncludeFiles(p) => format!("included by include_files \"{}\"", p),
            Decision::DefaultIgnore(p) => format!("excluded by default ignore \"{}\"", p),
            Decision::Category(c) => format!("included by category {}", c),
            Decision::NoCategory => "no enabled category matches".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct PatternSet {
    patterns: Vec<String>,
    set: GlobSet,
}

impl PatternSet {
    fn build(patterns: &[String]) -> Result<Self> {
        Ok(Self {
            patterns: patterns.to_vec(),
            set: build_glob_set_from_vec(patterns)?,
        })
    }

    fn first_match(&self, path: &str) -> Option<&str> {
        self.set
            .matches(path)
            .into_iter()
            .min()
            .map(|index| self.patterns[index].as_str())
    }
}

#[derive(Debug, Clone)]
enum CategoryMatcher {
    Pattern(Regex),
    /// Matches paths that no `Pattern` matcher claims.
    Unclaimed,
}

#[derive(Debug, Clone)]
pub struct CategoryFilter {
    pub category: Category,
    pub enabled: bool,
    matcher: CategoryMatcher,
}

/// Fully resolved selection rules for one run.
#[derive(Debug, Clone)]
pub struct Policy {
    exclude_files: PatternSet,
    include_files: PatternSet,
    default_ignore: Option<PatternSet>,
    category_filters: Vec<CategoryFilter>,
    remove_comments: bool,
}

impl Policy {
    /// Compiles a merged configuration. Layers that leave a field unset get the
    /// compiled-in default for it.
    pub fn from_config(config: &Config) -> Result<Self> {
        log::debug!("Compiling selection policy...");
        let exclude_files = PatternSet::build(config.exclude_files.as_deref().unwrap_or(&[]))?;
        let include_files = PatternSet::build(config.include_files.as_deref().unwrap_or(&[]))?;
        let default_ignore = if config.use_default_ignore.unwrap_or(true) {
            Some(PatternSet::build(&get_builtin_ignore_patterns().patterns)?)
        } else {
            log::debug!("Default ignore list disabled.");
            None
        };

        for name in config.categories.keys() {
            name.parse::<Category>()?;
        }

        let mut category_filters = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            let settings = config.categories.get(category.as_str());
            let enabled = settings.and_then(|s| s.enabled).unwrap_or(true);
            let pattern = settings
                .and_then(|s| s.pattern.as_deref())
                .or_else(|| category.default_pattern());
            let matcher = match pattern {
                Some(p) => CategoryMatcher::Pattern(Regex::new(p).map_err(|e| {
                    AppError::Configuration(format!(
                        "Invalid pattern for category \"{}\": {}",
                        category, e
                    ))
                })?),
                None => CategoryMatcher::Unclaimed,
            };
            log::trace!(
                "Category {} enabled={} pattern={:?}",
                category,
                enabled,
                pattern
            );
            category_filters.push(CategoryFilter {
                category,
                enabled,
                matcher,
            });
        }

        Ok(Self {
            exclude_files,
            include_files,
            default_ignore,
            category_filters,
            remove_comments: config.remove_comments.unwrap_or(false),
        })
    }

    pub fn remove_comments(&self) -> bool {
        self.remove_comments
    }

    pub fn category_filters(&self) -> &[CategoryFilter] {
        &self.category_filters
    }

    /// Four tiers, first match wins: exclude_files, include_files, default ignore,
    /// enabled categories.
    pub fn evaluate(&self, path: &str) -> Decision {
        if let Some(pattern) = self.exclude_files.first_match(path) {
            return Decision::ExcludeFiles(pattern.to_string());
        }
        if let Some(pattern) = self.include_files.first_match(path) {
            return Decision::IncludeFiles(pattern.to_string());
        }
        if let Some(pattern) = self
            .default_ignore
            .as_ref()
            .and_then(|ignores| ignores.first_match(path))
        {
            return Decision::DefaultIgnore(pattern.to_string());
        }

        let mut claimed: Option<bool> = None;
        for filter in self.category_filters.iter().filter(|f| f.enabled) {
            let hit = match &filter.matcher {
                CategoryMatcher::Pattern(re) => re.is_match(path),
                CategoryMatcher::Unclaimed => {
                    !*claimed.get_or_insert_with(|| self.is_claimed(path))
                }
            };
            if hit {
                return Decision::Category(filter.category);
            }
        }
        Decision::NoCategory
    }

    pub fn should_include(&self, path: &str) -> bool {
        let decision = self.evaluate(path);
        log::trace!("{}: {}", path, decision.describe());
        decision.is_included()
    }

    fn is_claimed(&self, path: &str) -> bool {
        self.category_filters.iter().any(|f| match &f.matcher {
            CategoryMatcher::Pattern(re) => re.is_match(path),
            CategoryMatcher::Unclaimed => false,
        })
    }
}

fn build_glob_set_from_vec(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern_str in patterns {
        let mut processed_pattern = pattern_str.trim().to_string();
        if processed_pattern.ends_with('/') && processed_pattern.len() > 1 {
            processed_pattern.push_str("**");
        }
        match Glob::new(&processed_pattern) {
            Ok(glob) => {
                log::trace!(
                    "Adding glob pattern: {} (processed as {})",
                    pattern_str,
                    processed_pattern
                );
                builder.add(glob);
            }
            Err(e) => {
                return Err(AppError::Configuration(format!(
                    "Invalid glob pattern \"{}\" (processed as \"{}\"): {}",
                    pattern_str, processed_pattern, e
                )));
            }
        }
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategoryConfig, merge};

    fn policy_with(overlay: Config) -> Policy {
        Policy::from_config(&merge(Config::defaults(), overlay)).unwrap()
    }

    fn only(categories: &[Category]) -> Config {
        let mut config = Config::default();
        for category in Category::ALL {
            config.categories.insert(
                category.as_str().to_string(),
                CategoryConfig {
                    enabled: Some(categories.contains(&category)),
                    pattern: None,
                },
            );
        }
        config
    }

    fn list(items: &[&str]) -> Option<Vec<String>> {
        Some(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn exclude_wins_over_include() {
        let policy = policy_with(Config {
            exclude_files: list(&["app/models/secret.rb"]),
            include_files: list(&["app/models/*"]),
            ..Config::default()
        });
        assert_eq!(
            policy.evaluate("app/models/secret.rb"),
            Decision::ExcludeFiles("app/models/secret.rb".into())
        );
        assert!(policy.should_include("app/models/user.rb"));
    }

    #[test]
    fn include_overrides_default_ignore_and_disabled_categories() {
        let mut overlay = only(&[]);
        overlay.include_files = list(&["bin/setup"]);
        let policy = policy_with(overlay);

        assert_eq!(
            policy.evaluate("bin/setup"),
            Decision::IncludeFiles("bin/setup".into())
        );
        assert_eq!(
            policy.evaluate("bin/rails"),
            Decision::DefaultIgnore("bin/*".into())
        );
        assert_eq!(policy.evaluate("app/models/user.rb"), Decision::NoCategory);
    }

    #[test]
    fn default_ignore_beats_categories() {
        let policy = policy_with(Config::default());
        assert!(!policy.should_include(".gitignore"));
        assert!(!policy.should_include("app/assets/config/.keep"));
        assert!(!policy.should_include("Gemfile.lock"));
        assert!(!policy.should_include("config/master.key"));
        assert!(!policy.should_include("vendor/cache/gem.rb"));
        assert!(policy.should_include("Gemfile"));
    }

    #[test]
    fn default_ignore_can_be_disabled() {
        let policy = policy_with(Config {
            use_default_ignore: Some(false),
            ..Config::default()
        });
        assert_eq!(
            policy.evaluate("bin/rails"),
            Decision::Category(Category::Other)
        );
    }

    #[test]
    fn only_enabled_categories_include() {
        let policy = policy_with(only(&[Category::Backend]));
        assert_eq!(
            policy.evaluate("app/models/user.rb"),
            Decision::Category(Category::Backend)
        );
        assert_eq!(
            policy.evaluate("app/views/users/show.html.erb"),
            Decision::NoCategory
        );
        assert_eq!(policy.evaluate("README.md"), Decision::NoCategory);
    }

    #[test]
    fn any_enabled_category_is_enough() {
        let policy = policy_with(only(&[Category::Backend]));
        // Also a test file, but backend claims it.
        assert!(policy.should_include("app/models/user_test.rb"));

        let policy = policy_with(only(&[Category::Tests]));
        assert!(policy.should_include("app/models/user_test.rb"));
        assert!(!policy.should_include("app/models/user.rb"));
    }

    #[test]
    fn other_catches_only_unclaimed_paths() {
        let mut overlay = only(&[Category::Other]);
        overlay.use_default_ignore = Some(false);
        let policy = policy_with(overlay);
        assert_eq!(
            policy.evaluate("scripts/deploy.sh"),
            Decision::Category(Category::Other)
        );
        // Claimed by the (disabled) backend category, so not "other".
        assert_eq!(policy.evaluate("lib/tasks/seed.rake"), Decision::NoCategory);
    }

    #[test]
    fn category_pattern_can_be_replaced() {
        let mut overlay = only(&[Category::Backend]);
        overlay.categories.insert(
            "backend".into(),
            CategoryConfig {
                enabled: Some(true),
                pattern: Some(r"^src/.*\.rs$".into()),
            },
        );
        let policy = policy_with(overlay);
        assert!(policy.should_include("src/main.rs"));
        assert!(!policy.should_include("app/models/user.rb"));
    }

    #[test]
    fn glob_semantics() {
        let policy = policy_with(Config {
            exclude_files: list(&["docs/", "**/*.snap", "config/*.yml"]),
            ..Config::default()
        });
        assert!(!policy.should_include("docs/guide/intro.md"));
        assert!(!policy.should_include("test/snapshots/deep/a.snap"));
        // `*` is not restricted to one path segment.
        assert!(!policy.should_include("config/locales/en.yml"));
        assert!(policy.should_include("config/routes.rb"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let policy = policy_with(Config {
            exclude_files: list(&["secret.txt"]),
            ..Config::default()
        });
        assert!(!policy.should_include("secret.txt"));
        assert!(policy.should_include("SECRET.txt"));
    }

    #[test]
    fn invalid_rules_are_configuration_errors() {
        let bad_glob = merge(
            Config::defaults(),
            Config {
                exclude_files: list(&["a/[b"]),
                ..Config::default()
            },
        );
        assert!(matches!(
            Policy::from_config(&bad_glob),
            Err(AppError::Configuration(_))
        ));

        let mut bad_regex = Config::defaults();
        bad_regex.categories.insert(
            "tests".into(),
            CategoryConfig {
                enabled: Some(true),
                pattern: Some("(unclosed".into()),
            },
        );
        assert!(matches!(
            Policy::from_config(&bad_regex),
            Err(AppError::Configuration(_))
        ));

        let mut unknown = Config::defaults();
        unknown
            .categories
            .insert("widgets".into(), CategoryConfig::default());
        assert!(matches!(
            Policy::from_config(&unknown),
            Err(AppError::Configuration(_))
        ));
    }
}
