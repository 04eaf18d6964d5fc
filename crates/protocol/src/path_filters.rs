//! Include/exclude/glob filtering applied to listing output.
//!
//! Filters compare on a canonical form that ignores a leading `/` or `./`, so
//! `--include home/docs` and `--include /home/docs` select the same subtree in
//! an index of absolute paths.

#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Vec<String>,
    exclude: Vec<String>,
    pattern: Option<glob::Pattern>,
    substring: Option<String>,
}

impl PathFilter {
    /// Build a filter; empty or root-only prefixes are dropped. A pattern
    /// without `*`, `?` or `[` is treated as a plain substring; any other
    /// pattern must be a valid glob.
    pub fn new(
        include: &[String],
        exclude: &[String],
        pattern: Option<&str>,
    ) -> Result<Self, glob::PatternError> {
        let canonical = |raw: &[String]| -> Vec<String> {
            raw.iter()
                .map(|p| canonical_prefix(p))
                .filter(|p| !p.is_empty())
                .collect()
        };

        let pattern = pattern.map(str::trim).filter(|p| !p.is_empty());
        let (pattern, substring) = match pattern {
            Some(p) if p.contains(['*', '?', '[']) => (Some(glob::Pattern::new(p)?), None),
            Some(p) => (None, Some(p.to_string())),
            None => (None, None),
        };

        Ok(Self {
            include: canonical(include),
            exclude: canonical(exclude),
            pattern,
            substring,
        })
    }

    pub fn is_active(&self) -> bool {
        !self.include.is_empty()
            || !self.exclude.is_empty()
            || self.pattern.is_some()
            || self.substring.is_some()
    }

    pub fn allows(&self, path: &str) -> bool {
        let canonical = canonical_path(path);

        if !self.include.is_empty()
            && !self
                .include
                .iter()
                .any(|prefix| segment_prefix_matches(prefix, canonical))
        {
            return false;
        }

        if self
            .exclude
            .iter()
            .any(|prefix| segment_prefix_matches(prefix, canonical))
        {
            return false;
        }

        if let Some(sub) = &self.substring {
            return path.contains(sub.as_str());
        }
        if let Some(pattern) = &self.pattern {
            return pattern.matches(path);
        }
        true
    }
}

fn canonical_path(raw: &str) -> &str {
    let mut value = raw;
    while let Some(rest) = value.strip_prefix("./") {
        value = rest;
    }
    value.trim_start_matches('/')
}

fn canonical_prefix(raw: &str) -> String {
    let value = raw.trim().replace('\\', "/");
    let value = canonical_path(&value).trim_end_matches('/');
    if value == "." {
        return String::new();
    }
    value.to_string()
}

fn segment_prefix_matches(prefix: &str, path: &str) -> bool {
    if path == prefix {
        return true;
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('/'))
}
