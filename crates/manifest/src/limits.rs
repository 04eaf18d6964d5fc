use serde::{Deserialize, Serialize};

pub const FETCH_CONCURRENCY_ENV: &str = "HOMEMAP_FETCH_CONCURRENCY";

const MAX_FETCH_CONCURRENCY: usize = 16;
const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// Tuning for [`crate::ManifestAssembler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssemblerConfig {
    /// Maximum number of part fetches in flight for one manifest.
    pub fetch_concurrency: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }
}

impl AssemblerConfig {
    /// Defaults, overridden by `HOMEMAP_FETCH_CONCURRENCY` when it parses.
    pub fn from_env() -> Self {
        Self::default().overlay_env()
    }

    /// `self` with `HOMEMAP_FETCH_CONCURRENCY` taking precedence when it parses.
    #[must_use]
    pub fn overlay_env(self) -> Self {
        let raw = std::env::var(FETCH_CONCURRENCY_ENV).ok();
        Self {
            fetch_concurrency: parse_fetch_concurrency(raw.as_deref(), self.fetch_concurrency),
        }
    }

    /// Clamp values into the supported range.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            fetch_concurrency: self.fetch_concurrency.clamp(1, MAX_FETCH_CONCURRENCY),
        }
    }
}

fn parse_fetch_concurrency(raw: Option<&str>, default_value: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .clamp(1, MAX_FETCH_CONCURRENCY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fetch_concurrency_defaults_and_clamps() {
        let default_value = DEFAULT_FETCH_CONCURRENCY;
        assert_eq!(parse_fetch_concurrency(None, default_value), default_value);
        assert_eq!(parse_fetch_concurrency(Some("  "), default_value), default_value);
        assert_eq!(parse_fetch_concurrency(Some("2"), default_value), 2);
        assert_eq!(parse_fetch_concurrency(Some("0"), default_value), 1);
        assert_eq!(
            parse_fetch_concurrency(Some("999"), default_value),
            MAX_FETCH_CONCURRENCY
        );
        assert_eq!(parse_fetch_concurrency(Some("abc"), default_value), default_value);
        assert_eq!(parse_fetch_concurrency(Some(" 5 "), default_value), 5);
    }

    #[test]
    fn normalized_clamps_configured_values() {
        let cfg = AssemblerConfig {
            fetch_concurrency: 0,
        };
        assert_eq!(cfg.normalized().fetch_concurrency, 1);
    }
}
