//! Path rule matching shared by sync scoping and search exclusion.
//!
//! Rules come in as comma-separated strings from configuration:
//! - include rules are plain path prefixes; an empty list admits everything
//! - exclude rules are `*`-wildcard patterns, compiled to anchored regexes
//!   and tested against the full path, every path segment, and every path
//!   suffix, so `"*_draft.md"` catches `notes/x_draft.md` and `"build"`
//!   catches anything under a `build/` directory

use regex::Regex;

/// Compiled include/exclude rule set for one scope.
#[derive(Debug, Clone, Default)]
pub struct PathRules {
    includes: Vec<String>,
    excludes: Vec<Regex>,
}

/// Convert one `*`-wildcard rule into an anchored regex.
///
/// Everything except `*` is literal; `*` matches any run of characters,
/// path separators included.
fn wildcard_to_regex(rule: &str) -> Option<Regex> {
    let pattern = format!("^{}$", regex::escape(rule).replace(r"\*", ".*"));
    Regex::new(&pattern).ok()
}

fn split_rules(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|r| !r.is_empty())
}

impl PathRules {
    /// Build a rule set from comma-separated include prefixes and exclude
    /// wildcard patterns.
    pub fn new(include: &str, exclude: &str) -> Self {
        Self {
            includes: split_rules(include).map(str::to_string).collect(),
            excludes: split_rules(exclude).filter_map(wildcard_to_regex).collect(),
        }
    }

    /// Exclude-only rule set (search scopes have no include side).
    pub fn from_exclude(exclude: &str) -> Self {
        Self::new("", exclude)
    }

    /// Whether the path passes the include prefixes (empty list admits all).
    pub fn is_included(&self, path: &str) -> bool {
        self.includes.is_empty() || self.includes.iter().any(|p| path.starts_with(p.as_str()))
    }

    /// Whether any exclude rule matches the full path, one of its segments,
    /// or one of its suffixes.
    pub fn is_excluded(&self, path: &str) -> bool {
        if self.excludes.is_empty() {
            return false;
        }
        let parts: Vec<&str> = path.split('/').collect();
        self.excludes.iter().any(|re| {
            if re.is_match(path) {
                return true;
            }
            if parts.iter().any(|part| re.is_match(part)) {
                return true;
            }
            (1..parts.len()).any(|i| re.is_match(&parts[i..].join("/")))
        })
    }

    /// Combined gate: included and not excluded.
    pub fn admits(&self, path: &str) -> bool {
        self.is_included(path) && !self.is_excluded(path)
    }

    pub fn has_includes(&self) -> bool {
        !self.includes.is_empty()
    }

    pub fn has_excludes(&self) -> bool {
        !self.excludes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rules_admit_everything() {
        let rules = PathRules::new("", "");
        assert!(rules.admits("notes/a.md"));
        assert!(rules.admits("deep/nested/path/file.md"));
        assert!(!rules.has_includes());
        assert!(!rules.has_excludes());
    }

    #[test]
    fn test_exclude_wildcard_full_path() {
        let rules = PathRules::from_exclude("*_draft.md");
        assert!(rules.is_excluded("notes/x_draft.md"));
        assert!(!rules.is_excluded("notes/x.md"));
    }

    #[test]
    fn test_exclude_matches_path_segment() {
        let rules = PathRules::from_exclude("build");
        assert!(rules.is_excluded("a/build/c.md"));
        assert!(rules.is_excluded("build/out.md"));
        assert!(!rules.is_excluded("a/builder/c.md"));
    }

    #[test]
    fn test_exclude_matches_path_suffix() {
        let rules = PathRules::from_exclude("docs/*.md");
        assert!(rules.is_excluded("src/docs/readme.md"));
        assert!(rules.is_excluded("docs/readme.md"));
        assert!(!rules.is_excluded("src/docs/sub/readme.txt"));
    }

    #[test]
    fn test_exclude_multiple_rules_comma_separated() {
        let rules = PathRules::from_exclude("*.tmp, archive");
        assert!(rules.is_excluded("notes/a.tmp"));
        assert!(rules.is_excluded("archive/old.md"));
        assert!(rules.is_excluded("x/archive/old.md"));
        assert!(!rules.is_excluded("notes/a.md"));
    }

    #[test]
    fn test_exclude_literal_dots_not_regex_dots() {
        let rules = PathRules::from_exclude("*.md");
        assert!(rules.is_excluded("a.md"));
        assert!(!rules.is_excluded("amd"));
    }

    #[test]
    fn test_exclude_question_mark_is_literal() {
        let rules = PathRules::from_exclude("faq?.md");
        assert!(rules.is_excluded("faq?.md"));
        assert!(!rules.is_excluded("faq.md"));
        assert!(!rules.is_excluded("faqx.md"));
    }

    #[test]
    fn test_include_prefix() {
        let rules = PathRules::new("notes/", "");
        assert!(rules.is_included("notes/a.md"));
        assert!(rules.is_included("notes/sub/b.md"));
        assert!(!rules.is_included("journal/a.md"));
    }

    #[test]
    fn test_include_multiple_prefixes() {
        let rules = PathRules::new("notes/, journal/", "");
        assert!(rules.is_included("notes/a.md"));
        assert!(rules.is_included("journal/2024.md"));
        assert!(!rules.is_included("scratch/x.md"));
    }

    #[test]
    fn test_admits_combines_include_and_exclude() {
        let rules = PathRules::new("notes/", "*_draft.md");
        assert!(rules.admits("notes/a.md"));
        assert!(!rules.admits("notes/a_draft.md"));
        assert!(!rules.admits("journal/a.md"));
    }

    #[test]
    fn test_blank_entries_between_commas_ignored() {
        let rules = PathRules::new(" , ,notes/", "*.tmp,, ");
        assert!(rules.has_includes());
        assert!(rules.admits("notes/a.md"));
        assert!(!rules.admits("notes/a.tmp"));
    }

    #[test]
    fn test_wildcard_star_crosses_separators() {
        let rules = PathRules::from_exclude("private*");
        assert!(rules.is_excluded("private/deep/nested.md"));
        assert!(rules.is_excluded("private.md"));
    }
}
