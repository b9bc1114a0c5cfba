//! Display Synchronizer
//!
//! Turns a usage snapshot and the selected [`DisplayMode`] into the text shown
//! by a tray surface: a compact indicator title plus one menu item per usage
//! window. Everything here is a pure function of its inputs (including the
//! current time), so rendering can be tested without a clock or a surface.
//!
//! ## Indicator
//!
//! ```text
//! 🟡 63% (2h10m)      selected window with a scheduled reset
//! 🟢 0%               selected window without a reset
//! ⚪ --               selected window missing from the snapshot
//! ⚪ Loading...       no snapshot yet
//! ⚪ Error            last fetch failed
//! ```
//!
//! ## Rounding
//!
//! - Utilization rounds half up to a whole percent.
//! - Time to reset rounds to the nearest ten minutes; 60 carries into the hour.
//!
//! ## Tiers
//!
//! - 🟢 below 50%
//! - 🟡 50% up to 80%
//! - 🔴 80% and above

pub mod surface;
#[cfg(feature = "tui")]
pub mod tui;
#[cfg(feature = "tui")]
pub mod widgets;

pub use surface::{read_status_view, StatusFileSurface, TraySurface};

use crate::errors::FetchError;
use crate::models::{DisplayMode, UsageLimit, UsageSnapshot, WindowKind};
use chrono::{DateTime, Duration, DurationRound, Local, Utc};
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

pub const NEUTRAL_INDICATOR: &str = "⚪";
pub const LOADING_TITLE: &str = "⚪ Loading...";
pub const ERROR_TITLE: &str = "⚪ Error";
pub const NOT_LOGGED_IN_TITLE: &str = "⚪ Not logged in";
pub const ERROR_ITEM: &str = "Error loading data";
pub const SESSION_EXPIRED_ITEM: &str = "Session expired - please login again";

/// Color band for a utilization value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageTier {
    Low,
    Mid,
    High,
}

impl UsageTier {
    pub fn from_utilization(utilization: f64) -> Self {
        if utilization < 50.0 {
            UsageTier::Low
        } else if utilization < 80.0 {
            UsageTier::Mid
        } else {
            UsageTier::High
        }
    }

    pub fn indicator(self) -> &'static str {
        match self {
            UsageTier::Low => "🟢",
            UsageTier::Mid => "🟡",
            UsageTier::High => "🔴",
        }
    }

    fn paint(self, text: &str) -> ColoredString {
        match self {
            UsageTier::Low => text.green(),
            UsageTier::Mid => text.yellow(),
            UsageTier::High => text.red(),
        }
    }
}

/// Round a utilization percentage half up to a whole number
pub fn round_utilization(utilization: f64) -> u32 {
    (utilization + 0.5).floor().max(0.0) as u32
}

/// Round a minute count to the nearest multiple of ten
pub fn round_to_ten_minutes(minutes: i64) -> i64 {
    ((minutes + 5) / 10) * 10
}

/// Hours and minutes until `reset`, rounded to ten minutes.
///
/// `None` when there is no reset time or it already passed.
pub fn time_until_reset(reset: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<(i64, i64)> {
    let reset = reset?;
    let remaining = reset.signed_duration_since(now);
    if remaining < Duration::zero() {
        return None;
    }

    let total = round_to_ten_minutes(remaining.num_minutes());
    Some((total / 60, total % 60))
}

/// Local wall-clock time of a reset, minutes rounded to the nearest ten
pub fn format_reset_time(reset: DateTime<Utc>) -> String {
    let local = reset.with_timezone(&Local);
    // Rounding on the full timestamp lets 60 minutes carry into the hour and day
    let rounded = local
        .duration_round(Duration::minutes(10))
        .unwrap_or(local);
    rounded.format("%Y-%m-%d %H:%M").to_string()
}

/// Menu item text for one window
pub fn format_usage_with_reset(
    limit: Option<&UsageLimit>,
    label: &str,
    now: DateTime<Utc>,
) -> String {
    let Some(limit) = limit else {
        return format!("{} --", label);
    };

    let utilization = round_utilization(limit.utilization);

    match time_until_reset(limit.resets_at, now) {
        Some((hours, minutes)) => format!(
            "{} {}% (resets {}, in {}h {}m)",
            label,
            utilization,
            // time_until_reset only succeeds with a reset time
            limit.resets_at.map(format_reset_time).unwrap_or_default(),
            hours,
            minutes
        ),
        None if utilization == 0 => format!("{} no active session", label),
        None => format!("{} {}%", label, utilization),
    }
}

/// Compact indicator for the selected window
pub fn indicator_title(
    snapshot: Option<&UsageSnapshot>,
    mode: DisplayMode,
    now: DateTime<Utc>,
) -> String {
    let Some(snapshot) = snapshot else {
        return LOADING_TITLE.to_string();
    };

    let Some(limit) = snapshot.window(mode.window()) else {
        return format!("{} --", NEUTRAL_INDICATOR);
    };

    let utilization = round_utilization(limit.utilization);
    let indicator = UsageTier::from_utilization(limit.utilization).indicator();

    match time_until_reset(limit.resets_at, now) {
        Some((hours, minutes)) => {
            format!("{} {}% ({}h{}m)", indicator, utilization, hours, minutes)
        }
        None => format!("{} {}%", indicator, utilization),
    }
}

/// One selectable line of the menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub mode: DisplayMode,
    pub label: String,
    pub checked: bool,
}

/// Everything a surface needs to draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuView {
    pub title: String,
    pub items: Vec<MenuItem>,
    /// Set when the view carries no usage data and only quitting makes sense
    #[serde(default)]
    pub disabled: bool,
}

impl MenuView {
    /// Initial view before any fetch has completed
    pub fn loading(mode: DisplayMode) -> Self {
        let items = DisplayMode::ALL
            .iter()
            .map(|&m| MenuItem {
                mode: m,
                label: format!("{} --", m.window().label()),
                checked: m == mode,
            })
            .collect();

        Self {
            title: LOADING_TITLE.to_string(),
            items,
            disabled: false,
        }
    }

    /// View shown by a worker that has no stored session
    pub fn not_logged_in() -> Self {
        Self {
            title: NOT_LOGGED_IN_TITLE.to_string(),
            items: vec![MenuItem {
                mode: DisplayMode::CurrentSession,
                label: "⚠️  Please login first".to_string(),
                checked: false,
            }],
            disabled: true,
        }
    }

    pub fn checked_mode(&self) -> Option<DisplayMode> {
        self.items.iter().find(|i| i.checked).map(|i| i.mode)
    }

    pub fn item(&self, mode: DisplayMode) -> Option<&MenuItem> {
        self.items.iter().find(|i| i.mode == mode)
    }

    fn item_mut(&mut self, mode: DisplayMode) -> Option<&mut MenuItem> {
        self.items.iter_mut().find(|i| i.mode == mode)
    }

    /// Refresh every line from a freshly fetched snapshot
    pub fn apply_snapshot(&mut self, snapshot: &UsageSnapshot, mode: DisplayMode, now: DateTime<Utc>) {
        for item in &mut self.items {
            let window = item.mode.window();
            item.label = format_usage_with_reset(snapshot.window(window), window.label(), now);
        }
        self.title = indicator_title(Some(snapshot), mode, now);
    }

    /// Move the checkmark to `mode`, recomputing the title when a cached
    /// snapshot is available
    pub fn select(&mut self, mode: DisplayMode, cached: Option<&UsageSnapshot>, now: DateTime<Utc>) {
        for item in &mut self.items {
            item.checked = item.mode == mode;
        }
        if let Some(snapshot) = cached {
            self.title = indicator_title(Some(snapshot), mode, now);
        }
    }

    /// Show a failed fetch; the other lines keep their last values
    pub fn apply_error(&mut self, error: &FetchError) {
        self.title = ERROR_TITLE.to_string();
        let label = if error.is_auth_failure() {
            SESSION_EXPIRED_ITEM
        } else {
            ERROR_ITEM
        };
        if let Some(item) = self.item_mut(DisplayMode::CurrentSession) {
            item.label = label.to_string();
        }
    }
}

/// Console line for one window, used by the CLI status output
pub fn format_console_usage(
    limit: Option<&UsageLimit>,
    label: &str,
    no_session_msg: Option<&str>,
    now: DateTime<Utc>,
) -> String {
    let Some(limit) = limit else {
        return format!("{:<16}  --", label);
    };

    let tier = UsageTier::from_utilization(limit.utilization);
    let percent = tier.paint(&format!("{:>3}%", round_utilization(limit.utilization)));

    match (time_until_reset(limit.resets_at, now), no_session_msg) {
        (Some((hours, minutes)), _) => format!(
            "{:<16}  {}  (resets {}, in {}h {}m)",
            label,
            percent,
            limit.resets_at.map(format_reset_time).unwrap_or_default(),
            hours,
            minutes
        ),
        (None, Some(msg)) => format!("{:<16}  {}  ({})", label, percent, msg.dimmed()),
        (None, None) => format!("{:<16}  {}", label, percent),
    }
}

/// Print the `=== Current Usage ===` block
pub fn print_usage_stats(snapshot: &UsageSnapshot) {
    let now = Utc::now();
    println!("{}", "=== Current Usage ===".bold());
    println!(
        "{}",
        format_console_usage(
            snapshot.five_hour.as_ref(),
            WindowKind::CurrentSession.label(),
            Some("no active session"),
            now
        )
    );
    println!(
        "{}",
        format_console_usage(snapshot.seven_day.as_ref(), WindowKind::WeeklyAll.label(), None, now)
    );
    println!(
        "{}",
        format_console_usage(
            snapshot.seven_day_opus.as_ref(),
            WindowKind::WeeklyOpus.label(),
            None,
            now
        )
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 30, 12, 0, 0).unwrap()
    }

    fn snapshot(five_hour: Option<UsageLimit>) -> UsageSnapshot {
        UsageSnapshot {
            five_hour,
            seven_day: Some(UsageLimit::new(55.0, None)),
            seven_day_opus: None,
            fetched_at: now(),
        }
    }

    #[test]
    fn test_round_utilization_half_up() {
        assert_eq!(round_utilization(49.5), 50);
        assert_eq!(round_utilization(79.4), 79);
        assert_eq!(round_utilization(42.3), 42);
        assert_eq!(round_utilization(0.0), 0);
        assert_eq!(round_utilization(0.49), 0);
        assert_eq!(round_utilization(99.5), 100);
    }

    #[test]
    fn test_round_to_ten_minutes() {
        assert_eq!(round_to_ten_minutes(0), 0);
        assert_eq!(round_to_ten_minutes(4), 0);
        assert_eq!(round_to_ten_minutes(5), 10);
        assert_eq!(round_to_ten_minutes(83), 80);
        assert_eq!(round_to_ten_minutes(61), 60);
    }

    #[test]
    fn test_time_until_reset_never_shows_sixty_minutes() {
        for offset in 0..(48 * 60) {
            let reset = now() + Duration::minutes(offset);
            let (_, minutes) = time_until_reset(Some(reset), now()).unwrap();
            assert!(minutes < 60, "offset {} gave {} minutes", offset, minutes);
            assert_eq!(minutes % 10, 0);
        }

        let reset = now() + Duration::minutes(61);
        assert_eq!(time_until_reset(Some(reset), now()), Some((1, 0)));
        let reset = now() + Duration::minutes(116);
        assert_eq!(time_until_reset(Some(reset), now()), Some((2, 0)));
    }

    #[test]
    fn test_time_until_reset_requires_future_reset() {
        assert_eq!(time_until_reset(None, now()), None);
        assert_eq!(time_until_reset(Some(now() - Duration::minutes(1)), now()), None);
        assert_eq!(time_until_reset(Some(now()), now()), Some((0, 0)));
    }

    #[test]
    fn test_tiers() {
        assert_eq!(UsageTier::from_utilization(0.0), UsageTier::Low);
        assert_eq!(UsageTier::from_utilization(49.9), UsageTier::Low);
        assert_eq!(UsageTier::from_utilization(50.0), UsageTier::Mid);
        assert_eq!(UsageTier::from_utilization(79.9), UsageTier::Mid);
        assert_eq!(UsageTier::from_utilization(80.0), UsageTier::High);
        assert_eq!(UsageTier::from_utilization(100.0), UsageTier::High);
    }

    #[test]
    fn test_indicator_with_reset() {
        let reset = now() + Duration::minutes(83);
        let snap = snapshot(Some(UsageLimit::new(42.3, Some(reset))));
        assert_eq!(
            indicator_title(Some(&snap), DisplayMode::CurrentSession, now()),
            "🟢 42% (1h20m)"
        );
        assert_eq!(
            indicator_title(Some(&snap), DisplayMode::WeeklyAll, now()),
            "🟡 55%"
        );
    }

    #[test]
    fn test_indicator_placeholders() {
        assert_eq!(indicator_title(None, DisplayMode::WeeklyAll, now()), LOADING_TITLE);
        let snap = snapshot(None);
        assert_eq!(indicator_title(Some(&snap), DisplayMode::WeeklyOpus, now()), "⚪ --");
    }

    #[test]
    fn test_menu_item_variants() {
        let label = WindowKind::CurrentSession.label();
        assert_eq!(format_usage_with_reset(None, label, now()), "5-Hour Session: --");
        assert_eq!(
            format_usage_with_reset(Some(&UsageLimit::new(0.2, None)), label, now()),
            "5-Hour Session: no active session"
        );
        assert_eq!(
            format_usage_with_reset(Some(&UsageLimit::new(12.5, None)), label, now()),
            "5-Hour Session: 13%"
        );

        let reset = now() + Duration::minutes(125);
        let text = format_usage_with_reset(Some(&UsageLimit::new(88.0, Some(reset))), label, now());
        assert!(text.starts_with("5-Hour Session: 88% (resets "), "{}", text);
        assert!(text.ends_with(", in 2h 10m)"), "{}", text);
    }

    #[test]
    fn test_zero_with_expired_reset_is_no_session() {
        let past = now() - Duration::hours(1);
        assert_eq!(
            format_usage_with_reset(Some(&UsageLimit::new(0.0, Some(past))), "X:", now()),
            "X: no active session"
        );
    }

    #[test]
    fn test_reset_time_rounds_into_next_hour() {
        let reset = Utc.with_ymd_and_hms(2025, 9, 30, 13, 57, 0).unwrap();
        let text = format_reset_time(reset);
        assert!(text.ends_with('0'), "{}", text);

        let expected = reset
            .with_timezone(&Local)
            .duration_round(Duration::minutes(10))
            .unwrap()
            .format("%Y-%m-%d %H:%M")
            .to_string();
        assert_eq!(text, expected);
    }

    #[test]
    fn test_loading_view_checks_only_selected_mode() {
        let view = MenuView::loading(DisplayMode::WeeklyAll);
        assert_eq!(view.title, LOADING_TITLE);
        assert_eq!(view.items.len(), 3);
        assert_eq!(view.items.iter().filter(|i| i.checked).count(), 1);
        assert_eq!(view.checked_mode(), Some(DisplayMode::WeeklyAll));
        assert_eq!(view.item(DisplayMode::WeeklyOpus).unwrap().label, "Weekly (Opus): --");
    }

    #[test]
    fn test_select_is_mutually_exclusive() {
        let mut view = MenuView::loading(DisplayMode::CurrentSession);
        for mode in [DisplayMode::WeeklyAll, DisplayMode::WeeklyOpus, DisplayMode::CurrentSession] {
            view.select(mode, None, now());
            assert_eq!(view.items.iter().filter(|i| i.checked).count(), 1);
            assert_eq!(view.checked_mode(), Some(mode));
        }
        // Nothing cached, title stays as it was
        assert_eq!(view.title, LOADING_TITLE);
    }

    #[test]
    fn test_select_uses_cached_snapshot() {
        let mut view = MenuView::loading(DisplayMode::CurrentSession);
        let snap = snapshot(Some(UsageLimit::new(10.0, None)));
        view.apply_snapshot(&snap, DisplayMode::CurrentSession, now());
        assert_eq!(view.title, "🟢 10%");

        view.select(DisplayMode::WeeklyAll, Some(&snap), now());
        assert_eq!(view.title, "🟡 55%");
    }

    #[test]
    fn test_error_views() {
        let mut view = MenuView::loading(DisplayMode::WeeklyAll);
        let snap = snapshot(Some(UsageLimit::new(10.0, None)));
        view.apply_snapshot(&snap, DisplayMode::WeeklyAll, now());

        view.apply_error(&FetchError::UnexpectedStatus {
            status: 502,
            body: String::new(),
        });
        assert_eq!(view.title, ERROR_TITLE);
        assert_eq!(view.item(DisplayMode::CurrentSession).unwrap().label, ERROR_ITEM);
        assert_eq!(view.item(DisplayMode::WeeklyAll).unwrap().label, "Weekly (All): 55%");

        view.apply_error(&FetchError::AuthFailed { status: 401 });
        assert_eq!(
            view.item(DisplayMode::CurrentSession).unwrap().label,
            SESSION_EXPIRED_ITEM
        );
        assert_eq!(view.checked_mode(), Some(DisplayMode::WeeklyAll));
    }

    #[test]
    fn test_console_line_without_data() {
        let line = format_console_usage(None, "Weekly (Opus):", None, now());
        assert_eq!(line.trim_end(), "Weekly (Opus):    --");
    }
}
