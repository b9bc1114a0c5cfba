//! Core Data Models
//!
//! This module defines the data structures shared by the usage client, the
//! refresh scheduler and the display layer.
//!
//! ## Core Types
//!
//! - [`UsageSnapshot`] - One complete reading of all usage windows
//! - [`UsageLimit`] - Utilization and reset time for a single window
//! - [`WindowKind`] - The tracked usage windows
//! - [`DisplayMode`] - Which window the compact indicator shows
//!
//! Snapshots are immutable once built and are shared as `Arc<UsageSnapshot>`
//! between the cache and its readers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Utilization and reset time of one usage window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageLimit {
    /// Percentage of the window's limit consumed
    pub utilization: f64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub resets_at: Option<DateTime<Utc>>,
}

impl UsageLimit {
    pub fn new(utilization: f64, resets_at: Option<DateTime<Utc>>) -> Self {
        Self {
            utilization,
            resets_at,
        }
    }
}

/// Missing, empty or malformed reset times all mean "no reset scheduled"
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

/// The usage windows tracked by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    CurrentSession,
    WeeklyAll,
    WeeklyOpus,
}

impl WindowKind {
    pub const ALL: [WindowKind; 3] = [
        WindowKind::CurrentSession,
        WindowKind::WeeklyAll,
        WindowKind::WeeklyOpus,
    ];

    /// Menu label, including the trailing colon
    pub fn label(self) -> &'static str {
        match self {
            WindowKind::CurrentSession => "5-Hour Session:",
            WindowKind::WeeklyAll => "Weekly (All):",
            WindowKind::WeeklyOpus => "Weekly (Opus):",
        }
    }

    /// Human-readable name without punctuation
    pub fn name(self) -> &'static str {
        match self {
            WindowKind::CurrentSession => "5-Hour Session",
            WindowKind::WeeklyAll => "Weekly (All)",
            WindowKind::WeeklyOpus => "Weekly (Opus)",
        }
    }
}

/// One complete reading of all usage windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub five_hour: Option<UsageLimit>,
    pub seven_day: Option<UsageLimit>,
    pub seven_day_opus: Option<UsageLimit>,
    pub fetched_at: DateTime<Utc>,
}

impl UsageSnapshot {
    pub fn window(&self, kind: WindowKind) -> Option<&UsageLimit> {
        match kind {
            WindowKind::CurrentSession => self.five_hour.as_ref(),
            WindowKind::WeeklyAll => self.seven_day.as_ref(),
            WindowKind::WeeklyOpus => self.seven_day_opus.as_ref(),
        }
    }
}

/// Selects which window the compact indicator renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum DisplayMode {
    #[default]
    CurrentSession,
    WeeklyAll,
    WeeklyOpus,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 3] = [
        DisplayMode::CurrentSession,
        DisplayMode::WeeklyAll,
        DisplayMode::WeeklyOpus,
    ];

    pub fn window(self) -> WindowKind {
        match self {
            DisplayMode::CurrentSession => WindowKind::CurrentSession,
            DisplayMode::WeeklyAll => WindowKind::WeeklyAll,
            DisplayMode::WeeklyOpus => WindowKind::WeeklyOpus,
        }
    }

    /// Stored representation, matching the session file format
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::CurrentSession => "currentSession",
            DisplayMode::WeeklyAll => "weeklyAll",
            DisplayMode::WeeklyOpus => "weeklyOpus",
        }
    }

    /// Parses a stored value; anything unrecognized falls back to the default
    pub fn from_stored(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "currentSession" | "current-session" => Ok(DisplayMode::CurrentSession),
            "weeklyAll" | "weekly-all" => Ok(DisplayMode::WeeklyAll),
            "weeklyOpus" | "weekly-opus" => Ok(DisplayMode::WeeklyOpus),
            other => Err(format!("unknown display mode: {}", other)),
        }
    }
}

impl Serialize for DisplayMode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DisplayMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(DisplayMode::from_stored(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_limit_decodes_reset_time() {
        let limit: UsageLimit =
            serde_json::from_str(r#"{"utilization": 42.3, "resets_at": "2025-09-30T14:00:00+00:00"}"#)
                .unwrap();
        assert_eq!(limit.utilization, 42.3);
        assert_eq!(
            limit.resets_at,
            Some(Utc.with_ymd_and_hms(2025, 9, 30, 14, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_limit_tolerates_bad_reset_time() {
        for raw in [
            r#"{"utilization": 1.0, "resets_at": null}"#,
            r#"{"utilization": 1.0, "resets_at": ""}"#,
            r#"{"utilization": 1.0, "resets_at": "tomorrow"}"#,
            r#"{"utilization": 1.0}"#,
        ] {
            let limit: UsageLimit = serde_json::from_str(raw).unwrap();
            assert_eq!(limit.resets_at, None, "input: {}", raw);
        }
    }

    #[test]
    fn test_display_mode_parsing() {
        assert_eq!(DisplayMode::from_stored("weeklyAll"), DisplayMode::WeeklyAll);
        assert_eq!(DisplayMode::from_stored("weekly-opus"), DisplayMode::WeeklyOpus);
        assert_eq!(DisplayMode::from_stored(""), DisplayMode::CurrentSession);
        assert_eq!(DisplayMode::from_stored("bogus"), DisplayMode::CurrentSession);
    }

    #[test]
    fn test_display_mode_serde_uses_stored_names() {
        let json = serde_json::to_string(&DisplayMode::WeeklyOpus).unwrap();
        assert_eq!(json, r#""weeklyOpus""#);
        let mode: DisplayMode = serde_json::from_str(r#""nonsense""#).unwrap();
        assert_eq!(mode, DisplayMode::CurrentSession);
    }

    #[test]
    fn test_snapshot_window_lookup() {
        let snapshot = UsageSnapshot {
            five_hour: Some(UsageLimit::new(10.0, None)),
            seven_day: None,
            seven_day_opus: Some(UsageLimit::new(70.0, None)),
            fetched_at: Utc::now(),
        };
        assert_eq!(snapshot.window(WindowKind::CurrentSession).unwrap().utilization, 10.0);
        assert!(snapshot.window(WindowKind::WeeklyAll).is_none());
        assert_eq!(snapshot.window(DisplayMode::WeeklyOpus.window()).unwrap().utilization, 70.0);
    }
}
