use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse role of a path inside a repository. Variants are listed in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Backend,
    Views,
    Frontend,
    Tests,
    Configuration,
    Database,
    Documentation,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Backend,
        Category::Views,
        Category::Frontend,
        Category::Tests,
        Category::Configuration,
        Category::Database,
        Category::Documentation,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Backend => "backend",
            Category::Views => "views",
            Category::Frontend => "frontend",
            Category::Tests => "tests",
            Category::Configuration => "configuration",
            Category::Database => "database",
            Category::Documentation => "documentation",
            Category::Other => "other",
        }
    }

    /// Compiled-in path rule. `Other` has none: it claims whatever no named category matches.
    pub fn default_pattern(&self) -> Option<&'static str> {
        match self {
            Category::Backend => Some(
                r"^(app/(models|controllers|helpers|jobs|mailers|channels|services|policies|serializers|workers|graphql|concerns)/|lib/)",
            ),
            Category::Views => Some(r"^app/(views|components)/"),
            Category::Frontend => {
                Some(r"^(app/(assets|javascript|frontend)/|frontend/|vendor/javascript/)")
            }
            Category::Tests => Some(r"^(test|tests|spec|features)/|_(test|spec)\.[A-Za-z0-9]+$"),
            Category::Configuration => Some(
                r"^(config/|[^/]*\.(toml|ya?ml|json)$|Gemfile$|Rakefile$|config\.ru$|Procfile[^/]*$|Dockerfile$|\.[^/]*rc$)",
            ),
            Category::Database => Some(r"^db/"),
            Category::Documentation => Some(r"^(docs?/|README[^/]*$|[^/]*\.(md|rdoc|adoc)$)"),
            Category::Other => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
                AppError::Configuration(format!(
                    "Unknown category \"{}\" (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn matches(category: Category, path: &str) -> bool {
        let pattern = category.default_pattern().expect("named category");
        Regex::new(pattern).unwrap().is_match(path)
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!(matches!(
            "widgets".parse::<Category>(),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn default_patterns_compile() {
        for category in Category::ALL {
            if let Some(pattern) = category.default_pattern() {
                Regex::new(pattern).unwrap();
            }
        }
    }

    #[test]
    fn rails_layout_is_classified() {
        assert!(matches(Category::Backend, "app/models/user.rb"));
        assert!(matches(Category::Backend, "lib/tasks/seed.rake"));
        assert!(!matches(Category::Backend, "app/views/users/index.html.erb"));
        assert!(matches(Category::Views, "app/views/users/index.html.erb"));
        assert!(matches(Category::Frontend, "app/javascript/application.js"));
        assert!(matches(Category::Tests, "test/models/user_test.rb"));
        assert!(matches(Category::Tests, "spec/models/user_spec.rb"));
        assert!(matches(Category::Configuration, "config/routes.rb"));
        assert!(matches(Category::Configuration, "Gemfile"));
        assert!(!matches(Category::Configuration, "app/Gemfile"));
        assert!(matches(Category::Database, "db/schema.rb"));
        assert!(matches(Category::Documentation, "README.md"));
        assert!(matches(Category::Documentation, "docs/setup.txt"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(!matches(Category::Backend, "App/Models/user.rb"));
        assert!(!matches(Category::Configuration, "gemfile"));
    }
}
