use chrono::{Duration, TimeZone, Utc};
use claude_monitor_lite::display::{
    format_usage_with_reset, indicator_title, MenuView, LOADING_TITLE,
};
use claude_monitor_lite::models::{DisplayMode, UsageLimit, UsageSnapshot, WindowKind};

fn snapshot_at(now: chrono::DateTime<Utc>) -> UsageSnapshot {
    UsageSnapshot {
        five_hour: Some(UsageLimit::new(
            42.3,
            Some(now + Duration::hours(1) + Duration::minutes(23)),
        )),
        seven_day: Some(UsageLimit::new(79.4, Some(now + Duration::days(3)))),
        seven_day_opus: Some(UsageLimit::new(0.0, None)),
        fetched_at: now,
    }
}

#[test]
fn test_session_window_with_upcoming_reset() {
    let now = Utc.with_ymd_and_hms(2025, 9, 30, 12, 0, 0).unwrap();
    let snapshot = snapshot_at(now);

    let title = indicator_title(Some(&snapshot), DisplayMode::CurrentSession, now);
    assert_eq!(title, "🟢 42% (1h20m)");

    let mut view = MenuView::loading(DisplayMode::CurrentSession);
    view.apply_snapshot(&snapshot, DisplayMode::CurrentSession, now);

    let session = &view.item(DisplayMode::CurrentSession).unwrap().label;
    assert!(session.starts_with("5-Hour Session: 42% (resets "), "{}", session);
    assert!(session.ends_with(", in 1h 20m)"), "{}", session);

    let weekly = &view.item(DisplayMode::WeeklyAll).unwrap().label;
    assert!(weekly.starts_with("Weekly (All): 79% (resets "), "{}", weekly);
    assert!(weekly.ends_with(", in 72h 0m)"), "{}", weekly);

    assert_eq!(
        view.item(DisplayMode::WeeklyOpus).unwrap().label,
        "Weekly (Opus): no active session"
    );
}

#[test]
fn test_weekly_indicator_tier() {
    let now = Utc.with_ymd_and_hms(2025, 9, 30, 12, 0, 0).unwrap();
    let snapshot = snapshot_at(now);
    assert_eq!(
        indicator_title(Some(&snapshot), DisplayMode::WeeklyAll, now),
        "🟡 79% (72h0m)"
    );
    assert_eq!(
        indicator_title(Some(&snapshot), DisplayMode::WeeklyOpus, now),
        "🟢 0%"
    );
}

#[test]
fn test_rapid_reselection_before_first_fetch() {
    let now = Utc.with_ymd_and_hms(2025, 9, 30, 12, 0, 0).unwrap();
    let cached = snapshot_at(now);

    let mut view = MenuView::loading(DisplayMode::CurrentSession);
    view.select(DisplayMode::WeeklyOpus, None, now);
    view.select(DisplayMode::CurrentSession, None, now);
    assert_eq!(view.title, LOADING_TITLE);
    assert_eq!(view.checked_mode(), Some(DisplayMode::CurrentSession));

    view.select(DisplayMode::WeeklyOpus, Some(&cached), now);
    view.select(DisplayMode::CurrentSession, Some(&cached), now);
    assert_eq!(view.title, "🟢 42% (1h20m)");
    assert_eq!(view.items.iter().filter(|i| i.checked).count(), 1);
}

#[test]
fn test_missing_window_placeholder() {
    let now = Utc::now();
    assert_eq!(
        format_usage_with_reset(None, WindowKind::WeeklyOpus.label(), now),
        "Weekly (Opus): --"
    );
}
