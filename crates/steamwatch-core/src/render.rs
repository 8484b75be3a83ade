//! Human-readable notification text.
//!
//! Messages use Discord-flavoured markdown (`**bold**`) and render
//! timestamps in UTC so every recipient sees the same wall-clock time.

use chrono::DateTime;
use steamwatch_types::{ItemKind, TrackerEvent};

/// Render the notification text for `event`.
pub fn render(event: &TrackerEvent) -> String {
    let item = event.item();
    match (event, event.kind()) {
        (TrackerEvent::Updated { new_timestamp, .. }, ItemKind::WorkshopMod) => format!(
            "Steam Mod **{}** ({}) updated at {}",
            item.name,
            item.id,
            format_timestamp(*new_timestamp)
        ),
        (TrackerEvent::Updated { new_timestamp, .. }, ItemKind::Game) => format!(
            "Game **{}** ({}) has new update/news at {}",
            item.name,
            item.id,
            format_timestamp(*new_timestamp)
        ),
        (TrackerEvent::Removed { .. }, ItemKind::WorkshopMod) => format!(
            "Steam Mod **{}** ({}) has been removed from Steam Workshop! \u{274c}",
            item.name, item.id
        ),
        (TrackerEvent::Removed { .. }, ItemKind::Game) => format!(
            "Game **{}** ({}) is no longer available on Steam! \u{274c}",
            item.name, item.id
        ),
    }
}

/// Format unix seconds as `YYYY-MM-DD HH:MM:SS UTC`.
///
/// Out-of-range values fall back to the raw number.
pub fn format_timestamp(unix_seconds: i64) -> String {
    DateTime::from_timestamp(unix_seconds, 0).map_or_else(
        || unix_seconds.to_string(),
        |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}
