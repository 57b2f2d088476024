//! Best-effort comment stripping. Patterns are applied textually, so comment markers
//! inside string literals are stripped too.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::path::Path;

static BLOCK_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid block comment regex"));
static MARKUP_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid markup comment regex"));
static TEMPLATE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<%#.*?%>").expect("valid template comment regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `/* ... */`
    StyleSheet,
    /// `// ...`
    DoubleSlash,
    /// Whole-line `# ...`
    Hash,
    /// `<!-- ... -->` and `<%# ... %>`
    Markup,
    None,
}

pub fn comment_style_for(path: &str) -> CommentStyle {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name {
        "Gemfile" | "Rakefile" | "Guardfile" | "Capfile" | "Brewfile" | "Podfile"
        | "Dockerfile" | "Makefile" | "Procfile" | "config.ru" => return CommentStyle::Hash,
        _ => {}
    }
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("css" | "scss" | "sass" | "less") => CommentStyle::StyleSheet,
        Some(
            "js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" | "java" | "c" | "h" | "cpp" | "hpp"
            | "cc" | "cs" | "go" | "rs" | "swift" | "kt" | "scala" | "dart",
        ) => CommentStyle::DoubleSlash,
        Some(
            "rb" | "rake" | "gemspec" | "ru" | "py" | "sh" | "bash" | "zsh" | "pl" | "r" | "yml"
            | "yaml" | "toml",
        ) => CommentStyle::Hash,
        Some("html" | "htm" | "xml" | "erb" | "vue" | "svelte" | "md") => CommentStyle::Markup,
        _ => CommentStyle::None,
    }
}

/// Strips comments according to the style implied by `path`. Unknown types pass through.
pub fn strip_comments<'a>(path: &str, content: &'a str) -> Cow<'a, str> {
    match comment_style_for(path) {
        CommentStyle::StyleSheet => BLOCK_COMMENT.replace_all(content, ""),
        CommentStyle::DoubleSlash => Cow::Owned(filter_lines(content, strip_double_slash)),
        CommentStyle::Hash => Cow::Owned(filter_lines(content, |line| {
            if line.trim_start().starts_with('#') {
                None
            } else {
                Some(line)
            }
        })),
        CommentStyle::Markup => {
            let without_markup = MARKUP_COMMENT.replace_all(content, "");
            Cow::Owned(
                TEMPLATE_COMMENT
                    .replace_all(&without_markup, "")
                    .into_owned(),
            )
        }
        CommentStyle::None => Cow::Borrowed(content),
    }
}

/// `None` drops the line; a line that only held a comment disappears entirely.
fn strip_double_slash(line: &str) -> Option<&str> {
    match line.find("//") {
        Some(index) => {
            let code = line[..index].trim_end();
            if code.trim_start().is_empty() {
                None
            } else {
                Some(code)
            }
        }
        None => Some(line),
    }
}

/// Applies `keep` to each line body, preserving the original line endings.
fn filter_lines<'a>(content: &'a str, keep: impl Fn(&'a str) -> Option<&'a str>) -> String {
    let mut output = String::with_capacity(content.len());
    for line in content.split_inclusive('\n') {
        let body = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
        let ending = &line[body.len()..];
        if let Some(kept) = keep(body) {
            output.push_str(kept);
            output.push_str(ending);
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_follow_extension_and_file_name() {
        assert_eq!(comment_style_for("app/assets/app.css"), CommentStyle::StyleSheet);
        assert_eq!(comment_style_for("src/index.TS"), CommentStyle::DoubleSlash);
        assert_eq!(comment_style_for("app/models/user.rb"), CommentStyle::Hash);
        assert_eq!(comment_style_for("Gemfile"), CommentStyle::Hash);
        assert_eq!(comment_style_for("sub/Rakefile"), CommentStyle::Hash);
        assert_eq!(
            comment_style_for("app/views/users/index.html.erb"),
            CommentStyle::Markup
        );
        assert_eq!(comment_style_for("notes.txt"), CommentStyle::None);
        assert_eq!(comment_style_for("LICENSE"), CommentStyle::None);
    }

    #[test]
    fn hash_comments_only_stripped_on_full_lines() {
        let source = "# this is a comment\nx = 1  # not stripped inline\n    # indented\ny = \"#{x}\"\n";
        assert_eq!(
            strip_comments("script.rb", source),
            "x = 1  # not stripped inline\ny = \"#{x}\"\n"
        );
    }

    #[test]
    fn double_slash_comments_removed_to_end_of_line() {
        let source = "// header\nconst a = 1; // trailing\r\n  // indented\nconst b = 2;";
        assert_eq!(
            strip_comments("app.js", source),
            "const a = 1;\r\nconst b = 2;"
        );
    }

    #[test]
    fn double_slash_inside_strings_is_a_known_casualty() {
        let source = "const url = \"http://example.com\";\n";
        assert_eq!(strip_comments("app.ts", source), "const url = \"http:\n");
    }

    #[test]
    fn block_comments_span_lines() {
        let source = "a { color: red; } /* one */\n/* multi\n line */\nb { }\n";
        assert_eq!(
            strip_comments("site.scss", source),
            "a { color: red; } \n\nb { }\n"
        );
    }

    #[test]
    fn markup_and_template_comments_span_lines() {
        let source = "<div>\n<!-- note\n more -->\n<%# erb\n comment %>\n<%= name %>\n</div>\n";
        assert_eq!(
            strip_comments("show.html.erb", source),
            "<div>\n\n\n<%= name %>\n</div>\n"
        );
    }

    #[test]
    fn unknown_types_pass_through_unchanged() {
        let source = "# heading\n// not code\n";
        assert!(matches!(
            strip_comments("notes.txt", source),
            Cow::Borrowed(_)
        ));
    }
}
