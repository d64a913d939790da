//! Structured intent grammar.
//!
//! A query is tried against an ordered table of fixed-shape commands. Each row
//! owns a whole-string, case-insensitive pattern and an extractor that turns
//! the captures into a typed [`Intent`]. The first row whose pattern matches
//! wins; there is no scoring and no backtracking into later rows.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::QueryError;

/// A recognised command with its parameters already parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Deadliest {
        year: i32,
    },
    CountEvents {
        kind: String,
        country: String,
        start: i32,
        end: i32,
    },
    Weather {
        lat: f64,
        lon: f64,
    },
}

/// Which path produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Deadliest,
    Count,
    Weather,
    Generative,
}

impl Intent {
    pub fn route(&self) -> Route {
        match self {
            Self::Deadliest { .. } => Route::Deadliest,
            Self::CountEvents { .. } => Route::Count,
            Self::Weather { .. } => Route::Weather,
        }
    }
}

pub type Extractor = fn(&Captures<'_>) -> Result<Intent, QueryError>;

/// One row of the grammar.
#[derive(Clone)]
pub struct IntentMatcher {
    pub name: &'static str,
    pattern: Regex,
    extract: Extractor,
}

impl std::fmt::Debug for IntentMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentMatcher")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

impl IntentMatcher {
    pub fn new(name: &'static str, pattern: &str, extract: Extractor) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            extract,
        })
    }

    /// `None` when the pattern does not match. A structural match whose
    /// captures fail to parse yields `Some(Err(MalformedQuery))`.
    pub fn try_match(&self, query: &str) -> Option<Result<Intent, QueryError>> {
        self.pattern.captures(query).map(|caps| (self.extract)(&caps))
    }
}

fn capture<T: FromStr>(caps: &Captures<'_>, idx: usize, what: &str) -> Result<T, QueryError>
where
    T::Err: std::fmt::Display,
{
    let raw = caps
        .get(idx)
        .map(|m| m.as_str())
        .ok_or_else(|| QueryError::MalformedQuery(format!("missing {}", what)))?;
    raw.parse()
        .map_err(|e| QueryError::MalformedQuery(format!("invalid {} '{}': {}", what, raw, e)))
}

fn extract_deadliest(caps: &Captures<'_>) -> Result<Intent, QueryError> {
    Ok(Intent::Deadliest {
        year: capture(caps, 1, "year")?,
    })
}

fn extract_count(caps: &Captures<'_>) -> Result<Intent, QueryError> {
    Ok(Intent::CountEvents {
        kind: capture(caps, 1, "disaster type")?,
        country: capture(caps, 2, "country")?,
        start: capture(caps, 3, "start year")?,
        end: capture(caps, 4, "end year")?,
    })
}

fn extract_weather(caps: &Captures<'_>) -> Result<Intent, QueryError> {
    Ok(Intent::Weather {
        lat: capture(caps, 1, "latitude")?,
        lon: capture(caps, 2, "longitude")?,
    })
}

static DEFAULT_MATCHERS: LazyLock<Vec<IntentMatcher>> = LazyLock::new(|| {
    vec![
        IntentMatcher::new("deadliest", r"(?i)^deadliest\s+([0-9]{4})$", extract_deadliest)
            .expect("deadliest regex is valid"),
        IntentMatcher::new(
            "count",
            r"(?i)^count\s+(\w+)\s+(\w+)\s+([0-9]{4})-([0-9]{4})$",
            extract_count,
        )
        .expect("count regex is valid"),
        IntentMatcher::new(
            "weather",
            r"(?i)^weather\s+(-?[0-9]+\.?[0-9]*)\s+(-?[0-9]+\.?[0-9]*)$",
            extract_weather,
        )
        .expect("weather regex is valid"),
    ]
});

/// The built-in grammar in priority order.
pub fn default_matchers() -> Vec<IntentMatcher> {
    DEFAULT_MATCHERS.clone()
}

/// Run `query` (trimmed) through `matchers` in order.
pub fn match_intent(query: &str, matchers: &[IntentMatcher]) -> Option<Result<Intent, QueryError>> {
    let query = query.trim();
    matchers.iter().find_map(|m| {
        let outcome = m.try_match(query)?;
        tracing::debug!(matcher = m.name, "Intent matched");
        Some(outcome)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(query: &str) -> Option<Intent> {
        match_intent(query, &default_matchers()).map(|r| r.unwrap())
    }

    #[test]
    fn test_deadliest_year() {
        assert_eq!(parse("deadliest 2010"), Some(Intent::Deadliest { year: 2010 }));
        assert_eq!(parse("  DEADLIEST   1999 "), Some(Intent::Deadliest { year: 1999 }));
    }

    #[test]
    fn test_deadliest_requires_exact_shape() {
        assert_eq!(parse("deadliest 1999 extra"), None);
        assert_eq!(parse("deadliest 99"), None);
        assert_eq!(parse("what was the deadliest 1999"), None);
        assert_eq!(parse("deadliest disaster"), None);
    }

    #[test]
    fn test_count_events() {
        assert_eq!(
            parse("count flood india 2000-2010"),
            Some(Intent::CountEvents {
                kind: "flood".into(),
                country: "india".into(),
                start: 2000,
                end: 2010,
            })
        );
    }

    #[test]
    fn test_count_keeps_reversed_range() {
        assert_eq!(
            parse("Count Storm Fiji 2010-2000"),
            Some(Intent::CountEvents {
                kind: "Storm".into(),
                country: "Fiji".into(),
                start: 2010,
                end: 2000,
            })
        );
    }

    #[test]
    fn test_count_rejects_multiword_country() {
        assert_eq!(parse("count flood sri lanka 2000-2010"), None);
        assert_eq!(parse("count flood india 2000 - 2010"), None);
    }

    #[test]
    fn test_weather_signed_decimals() {
        assert_eq!(parse("weather 40.7 -74.0"), Some(Intent::Weather { lat: 40.7, lon: -74.0 }));
        assert_eq!(parse("weather 999 1."), Some(Intent::Weather { lat: 999.0, lon: 1.0 }));
    }

    #[test]
    fn test_weather_rejects_trailing_tokens() {
        assert_eq!(parse("weather 40.7 -74.0 tomorrow"), None);
        assert_eq!(parse("weather in paris"), None);
        assert_eq!(parse("weather +40.7 -74.0"), None);
    }

    #[test]
    fn test_free_text_does_not_match() {
        assert_eq!(parse("tell me about hurricanes"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_routes() {
        assert_eq!(Intent::Deadliest { year: 1 }.route(), Route::Deadliest);
        assert_eq!(Intent::Weather { lat: 0.0, lon: 0.0 }.route(), Route::Weather);
    }

    #[test]
    fn test_first_matcher_wins() {
        fn always_year(_: &Captures<'_>) -> Result<Intent, QueryError> {
            Ok(Intent::Deadliest { year: 1 })
        }
        let mut matchers = vec![IntentMatcher::new("catch_all", r"(?i)^deadliest", always_year).unwrap()];
        matchers.extend(default_matchers());
        assert_eq!(
            match_intent("deadliest 2010", &matchers).unwrap().unwrap(),
            Intent::Deadliest { year: 1 }
        );
    }

    #[test]
    fn test_unparsable_capture_is_malformed() {
        fn bad(caps: &Captures<'_>) -> Result<Intent, QueryError> {
            Ok(Intent::Deadliest {
                year: capture(caps, 1, "year")?,
            })
        }
        let matchers = vec![IntentMatcher::new("big", r"^big ([0-9]+)$", bad).unwrap()];
        let outcome = match_intent("big 99999999999999", &matchers).unwrap();
        assert!(matches!(outcome, Err(QueryError::MalformedQuery(_))));
    }
}
