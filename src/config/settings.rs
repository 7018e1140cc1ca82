//! Engine runtime settings. From env `RELMAP_MAX_RELATION_DEPTH` or set in code.

pub const MAX_RELATION_DEPTH_ENV: &str = "RELMAP_MAX_RELATION_DEPTH";

/// Nesting allowed for relation expansion before a call is failed.
pub const DEFAULT_MAX_RELATION_DEPTH: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// `None` expands without limit; a cyclic inclusion chain then never terminates.
    pub max_relation_depth: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_relation_depth: Some(DEFAULT_MAX_RELATION_DEPTH),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        match std::env::var(MAX_RELATION_DEPTH_ENV) {
            Ok(raw) => Self::parse_depth(&raw),
            Err(_) => Self::default(),
        }
    }

    /// `0` or `none` mean unbounded; unparsable input keeps the default.
    fn parse_depth(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == "0" || raw.eq_ignore_ascii_case("none") {
            return Settings {
                max_relation_depth: None,
            };
        }
        match raw.parse::<usize>() {
            Ok(n) => Settings {
                max_relation_depth: Some(n),
            },
            Err(_) => {
                tracing::warn!(
                    value = %raw,
                    "{} is not a number; using default {}",
                    MAX_RELATION_DEPTH_ENV,
                    DEFAULT_MAX_RELATION_DEPTH
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_parsing() {
        assert_eq!(Settings::parse_depth("4").max_relation_depth, Some(4));
        assert_eq!(Settings::parse_depth("0").max_relation_depth, None);
        assert_eq!(Settings::parse_depth("NONE").max_relation_depth, None);
        assert_eq!(Settings::parse_depth("deep"), Settings::default());
    }
}
