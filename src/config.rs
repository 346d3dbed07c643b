//! Typed environment lookups with fallbacks.
//!
//! Each accessor reads one variable and returns `fallback` when it is unset,
//! not valid UTF-8, or does not parse. Nothing is cached.
//!
//! ```rust
//! use trellis::config;
//!
//! let port = config::int_env("PORT", 8080);
//! let verbose = config::bool_env("VERBOSE", false);
//! ```

use std::env;
use std::str::FromStr;
use std::time::Duration;

pub fn int_env(key: &str, fallback: i64) -> i64 {
    parse_or(lookup(key).as_deref(), fallback)
}

pub fn float_env(key: &str, fallback: f64) -> f64 {
    parse_or(lookup(key).as_deref(), fallback)
}

/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn bool_env(key: &str, fallback: bool) -> bool {
    lookup(key).as_deref().and_then(parse_bool).unwrap_or(fallback)
}

pub fn string_env(key: &str, fallback: &str) -> String {
    lookup(key).unwrap_or_else(|| fallback.to_owned())
}

/// Whole seconds, e.g. `TIMEOUT_SECS=15`.
pub fn duration_secs_env(key: &str, fallback: Duration) -> Duration {
    secs_or(lookup(key).as_deref(), fallback)
}

fn lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn parse_or<T: FromStr>(value: Option<&str>, fallback: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(fallback)
}

fn secs_or(value: Option<&str>, fallback: Duration) -> Duration {
    value
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The environment is process-global and the test harness is threaded,
    // so tests only read it and exercise parsing through the pure helpers.

    #[test]
    fn unset_variables_fall_back() {
        assert_eq!(int_env("TRELLIS_TEST_UNSET", 8080), 8080);
        assert_eq!(float_env("TRELLIS_TEST_UNSET", 0.5), 0.5);
        assert!(bool_env("TRELLIS_TEST_UNSET", true));
        assert_eq!(string_env("TRELLIS_TEST_UNSET", "dflt"), "dflt");
        assert_eq!(duration_secs_env("TRELLIS_TEST_UNSET", Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn int_parses_or_falls_back() {
        assert_eq!(parse_or(Some("9090"), 8080), 9090);
        assert_eq!(parse_or(Some("-3"), 0), -3);
        assert_eq!(parse_or(Some("abc"), 8080), 8080);
        assert_eq!(parse_or::<i64>(None, 8080), 8080);
    }

    #[test]
    fn float_parses_or_falls_back() {
        assert_eq!(parse_or(Some("0.25"), 1.0), 0.25);
        assert_eq!(parse_or(Some("quarter"), 1.0), 1.0);
    }

    #[test]
    fn bool_accepts_the_usual_spellings() {
        for (value, expected) in [("1", true), ("True", true), ("f", false), ("FALSE", false)] {
            assert_eq!(parse_bool(value), Some(expected), "{value}");
        }
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn duration_reads_whole_seconds() {
        assert_eq!(secs_or(Some("15"), Duration::ZERO), Duration::from_secs(15));
        assert_eq!(secs_or(Some("1.5"), Duration::ZERO), Duration::ZERO);
        assert_eq!(secs_or(Some("-1"), Duration::from_secs(2)), Duration::from_secs(2));
    }
}
