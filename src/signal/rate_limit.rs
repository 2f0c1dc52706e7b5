use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::signal::clock::{TimeParseError, next_reset, parse_time_of_day, parse_zone};

pub const DEFAULT_BUFFER_SECS: u64 = 60;
pub const DEFAULT_BARE_MAX_CHARS: usize = 500;

// Order matters: `H:MM am|pm` must be tried before `H am|pm`, which would
// otherwise stop short of the minutes.
static TIMED_NOTICE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let patterns = [
        // resets 6:30pm (America/Sao_Paulo)
        r"(?i)resets?\s+(\d{1,2}:\d{2}\s*(?:am|pm))\s*\(([^)]+)\)",
        // resets 6pm (America/Bahia)
        r"(?i)resets?\s+(\d{1,2}\s*(?:am|pm))\s*\(([^)]+)\)",
        // resets 18:00 (UTC)
        r"(?i)resets?\s+(\d{1,2}:\d{2})\s*\(([^)]+)\)",
        // resets January 15, 2026, 3:30pm (America/Bahia)
        r"(?i)resets?\s+[A-Za-z]+\s+\d{1,2},?\s+\d{4},?\s+(\d{1,2}(?::\d{2})?\s*(?:am|pm))\s*\(([^)]+)\)",
    ];

    patterns
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

static BARE_NOTICE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let patterns = [
        r"(?i)you'?ve hit your limit",
        r"(?i)rate limit exceeded",
        r"(?i)rate limited",
        r"(?i)too many requests",
    ];

    patterns
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReset {
    pub epoch_secs: i64,
    pub human_readable: String,
    pub time_zone_id: String,
}

/// Why a detected notice could not be turned into a retry time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Unparseable {
    #[error("rate limit detected but reset time could not be parsed")]
    NoResetTime,
    #[error("rate limit detected but timezone `{0}` is unknown")]
    UnknownZone(String),
    #[error("rate limit detected but could not parse time `{time}` in timezone `{zone}`: {source}")]
    BadTime {
        time: String,
        zone: String,
        source: TimeParseError,
    },
    #[error("rate limit detected but `{time}` has no instant in timezone `{zone}`")]
    NoInstant { time: String, zone: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitSignal {
    NotDetected,
    DetectedUnparseable(Unparseable),
    DetectedResolved(ResolvedReset),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Notice {
    Timed { time: String, zone: String },
    Bare,
}

fn detect(text: &str, bare_max_chars: usize) -> Option<Notice> {
    for pattern in TIMED_NOTICE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text)
            && let (Some(time), Some(zone)) = (caps.get(1), caps.get(2))
        {
            return Some(Notice::Timed {
                time: time.as_str().trim().to_string(),
                zone: zone.as_str().trim().to_string(),
            });
        }
    }

    // Bare phrases only count in short output.
    if text.chars().count() > bare_max_chars {
        return None;
    }
    BARE_NOTICE_PATTERNS
        .iter()
        .any(|pattern| pattern.is_match(text))
        .then_some(Notice::Bare)
}

/// Turns rate-limit notices in assistant output into an absolute retry time.
#[derive(Debug, Clone)]
pub struct RateLimitResolver {
    buffer: TimeDelta,
    bare_max_chars: usize,
}

impl Default for RateLimitResolver {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SECS, DEFAULT_BARE_MAX_CHARS)
    }
}

impl RateLimitResolver {
    pub fn new(buffer_secs: u64, bare_max_chars: usize) -> Self {
        let buffer = i64::try_from(buffer_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::seconds(DEFAULT_BUFFER_SECS as i64));
        Self {
            buffer,
            bare_max_chars,
        }
    }

    pub fn resolve(&self, text: &str) -> RateLimitSignal {
        self.resolve_at(text, Utc::now())
    }

    pub fn resolve_at(&self, text: &str, now: DateTime<Utc>) -> RateLimitSignal {
        match detect(text, self.bare_max_chars) {
            None => RateLimitSignal::NotDetected,
            Some(Notice::Bare) => RateLimitSignal::DetectedUnparseable(Unparseable::NoResetTime),
            Some(Notice::Timed { time, zone }) => match self.resolve_notice(&time, &zone, now) {
                Ok(reset) => RateLimitSignal::DetectedResolved(reset),
                Err(reason) => RateLimitSignal::DetectedUnparseable(reason),
            },
        }
    }

    fn resolve_notice(
        &self,
        time: &str,
        zone: &str,
        now: DateTime<Utc>,
    ) -> Result<ResolvedReset, Unparseable> {
        let tz = parse_zone(zone).ok_or_else(|| Unparseable::UnknownZone(zone.to_string()))?;
        let spec = parse_time_of_day(time).map_err(|source| Unparseable::BadTime {
            time: time.to_string(),
            zone: zone.to_string(),
            source,
        })?;
        let reset = next_reset(spec, tz, now, self.buffer).ok_or_else(|| Unparseable::NoInstant {
            time: time.to_string(),
            zone: zone.to_string(),
        })?;

        Ok(ResolvedReset {
            epoch_secs: reset.timestamp(),
            human_readable: reset.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
            time_zone_id: zone.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BARE_NOTICE_PATTERNS, DEFAULT_BARE_MAX_CHARS, Notice, RateLimitResolver, RateLimitSignal,
        ResolvedReset, TIMED_NOTICE_PATTERNS, Unparseable, detect,
    };
    use chrono::{DateTime, TimeZone, Utc};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn timed(time: &str, zone: &str) -> Option<Notice> {
        Some(Notice::Timed {
            time: time.to_string(),
            zone: zone.to_string(),
        })
    }

    #[test]
    fn every_notice_pattern_compiles() {
        assert_eq!(TIMED_NOTICE_PATTERNS.len(), 4);
        assert_eq!(BARE_NOTICE_PATTERNS.len(), 4);
    }

    #[test]
    fn detects_each_timed_shape() {
        assert_eq!(
            detect("Limit reached. resets 6pm (America/Bahia)", 500),
            timed("6pm", "America/Bahia")
        );
        assert_eq!(
            detect("resets 6:30pm (America/Sao_Paulo)", 500),
            timed("6:30pm", "America/Sao_Paulo")
        );
        assert_eq!(detect("resets 18:00 (UTC)", 500), timed("18:00", "UTC"));
        assert_eq!(
            detect("resets January 15, 2026, 3:30pm (America/Bahia)", 500),
            timed("3:30pm", "America/Bahia")
        );
        assert_eq!(
            detect("resets Jan 1 2026 9 am ( UTC )", 500),
            timed("9 am", "UTC")
        );
    }

    #[test]
    fn minutes_are_not_truncated_by_hour_only_shape() {
        assert_eq!(
            detect("Your limit resets 11:45am (UTC) - try later", 500),
            timed("11:45am", "UTC")
        );
    }

    #[test]
    fn singular_reset_and_mixed_case_are_accepted() {
        assert_eq!(detect("RESET 7PM (UTC)", 500), timed("7PM", "UTC"));
        assert_eq!(detect("Resets 7 pm (UTC)", 500), timed("7 pm", "UTC"));
    }

    #[test]
    fn bare_phrases_only_count_in_short_output() {
        for phrase in [
            "You've hit your limit",
            "youve hit your limit",
            "Rate limit exceeded.",
            "request was rate limited",
            "429 Too Many Requests",
        ] {
            assert_eq!(detect(phrase, 500), Some(Notice::Bare), "{phrase}");
        }

        let long = format!("{} you've hit your limit", "analysis ".repeat(1200));
        assert_eq!(detect(&long, DEFAULT_BARE_MAX_CHARS), None);
    }

    #[test]
    fn bare_limit_counts_characters_not_bytes() {
        let text = format!("{} rate limited", "é".repeat(480));
        assert!(text.len() > 500);
        assert_eq!(detect(&text, 500), Some(Notice::Bare));
    }

    #[test]
    fn unrelated_text_is_not_detected() {
        assert_eq!(detect("All tasks complete.", 500), None);
        assert_eq!(detect("", 500), None);
    }

    #[test]
    fn same_day_reset_gets_buffer() {
        let resolver = RateLimitResolver::default();
        let got = resolver.resolve_at("... resets 6pm (UTC) ...", at(2025, 1, 1, 10, 0));
        assert_eq!(
            got,
            RateLimitSignal::DetectedResolved(ResolvedReset {
                epoch_secs: 1_735_754_460,
                human_readable: "2025-01-01 18:01:00 UTC".to_string(),
                time_zone_id: "UTC".to_string(),
            })
        );
    }

    #[test]
    fn past_reset_rolls_over_to_tomorrow() {
        let resolver = RateLimitResolver::default();
        let got = resolver.resolve_at("... resets 6pm (UTC) ...", at(2025, 1, 1, 20, 0));
        let RateLimitSignal::DetectedResolved(reset) = got else {
            panic!("expected resolved reset, got {got:?}");
        };
        assert_eq!(reset.epoch_secs, at(2025, 1, 2, 18, 1).timestamp());
        assert_eq!(reset.human_readable, "2025-01-02 18:01:00 UTC");
    }

    #[test]
    fn reset_is_computed_in_the_named_zone() {
        let resolver = RateLimitResolver::default();
        let got = resolver.resolve_at(
            "You've hit your limit · resets 6:30pm (America/Sao_Paulo)",
            at(2025, 6, 1, 12, 0),
        );
        let RateLimitSignal::DetectedResolved(reset) = got else {
            panic!("expected resolved reset, got {got:?}");
        };
        assert_eq!(reset.epoch_secs, at(2025, 6, 1, 21, 31).timestamp());
        assert!(reset.human_readable.starts_with("2025-06-01 18:31:00"));
        assert_eq!(reset.time_zone_id, "America/Sao_Paulo");
    }

    #[test]
    fn resolved_epoch_is_always_in_the_future() {
        let resolver = RateLimitResolver::default();
        let now = at(2025, 1, 1, 18, 0);
        let RateLimitSignal::DetectedResolved(reset) = resolver.resolve_at("resets 18:00 (UTC)", now)
        else {
            panic!("expected resolved reset");
        };
        assert!(reset.epoch_secs > now.timestamp());
    }

    #[test]
    fn custom_buffer_is_applied() {
        let resolver = RateLimitResolver::new(300, 500);
        let RateLimitSignal::DetectedResolved(reset) =
            resolver.resolve_at("resets 18:00 (UTC)", at(2025, 1, 1, 10, 0))
        else {
            panic!("expected resolved reset");
        };
        assert_eq!(reset.epoch_secs, at(2025, 1, 1, 18, 5).timestamp());
    }

    #[test]
    fn unknown_zone_is_unparseable() {
        let resolver = RateLimitResolver::default();
        assert_eq!(
            resolver.resolve_at("resets 18:00 (Not/AZone)", at(2025, 1, 1, 10, 0)),
            RateLimitSignal::DetectedUnparseable(Unparseable::UnknownZone(
                "Not/AZone".to_string()
            ))
        );
    }

    #[test]
    fn impossible_time_is_unparseable() {
        let resolver = RateLimitResolver::default();
        let got = resolver.resolve_at("resets 25:00 (UTC)", at(2025, 1, 1, 10, 0));
        assert!(matches!(
            got,
            RateLimitSignal::DetectedUnparseable(Unparseable::BadTime { .. })
        ));
    }

    #[test]
    fn bare_notice_is_unparseable_and_long_text_is_not_detected() {
        let resolver = RateLimitResolver::default();
        let now = at(2025, 1, 1, 10, 0);
        assert_eq!(
            resolver.resolve_at("you've hit your limit", now),
            RateLimitSignal::DetectedUnparseable(Unparseable::NoResetTime)
        );

        let mut doc = "x".repeat(10_000);
        doc.insert_str(5_000, " you've hit your limit ");
        assert_eq!(resolver.resolve_at(&doc, now), RateLimitSignal::NotDetected);
    }

    #[test]
    fn repeated_resolution_is_identical() {
        let resolver = RateLimitResolver::default();
        let now = at(2025, 1, 1, 10, 0);
        let text = "resets 9am (Europe/Berlin)";
        assert_eq!(resolver.resolve_at(text, now), resolver.resolve_at(text, now));
    }
}
