//! Caption composition and posting slots.

use chrono::{DateTime, Duration, NaiveTime, Utc};

/// Hour (UTC) of the first posting slot of a day.
pub const FIRST_SLOT_HOUR: u32 = 9;

/// Spacing between consecutive posting slots.
pub const SLOT_SPACING_HOURS: i64 = 2;

/// Caption, a blank line, then space-separated `#tag`s.
///
/// Tags are trimmed and take a single leading `#`; empty tags are dropped.
/// With no usable tags the caption is returned unchanged.
pub fn compose_caption(caption: &str, hashtags: &[String]) -> String {
    let tags: Vec<String> = hashtags
        .iter()
        .map(|t| t.trim().trim_start_matches('#'))
        .filter(|t| !t.is_empty())
        .map(|t| format!("#{}", t))
        .collect();

    if tags.is_empty() {
        caption.to_string()
    } else {
        format!("{}\n\n{}", caption, tags.join(" "))
    }
}

/// The day after `now`, at 09:00 UTC.
pub fn default_slot(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive() + Duration::days(1);
    let nine = NaiveTime::from_hms_opt(FIRST_SLOT_HOUR, 0, 0).unwrap_or_default();
    tomorrow.and_time(nine).and_utc()
}

/// The `index`-th slot after `first`, slots two hours apart.
pub fn slot_after(first: DateTime<Utc>, index: usize) -> DateTime<Utc> {
    first + Duration::hours(SLOT_SPACING_HOURS * index as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_compose_caption() {
        let tags = vec!["history".to_string(), "#ai".to_string(), " ".to_string()];
        assert_eq!(
            compose_caption("Samurai meets segway", &tags),
            "Samurai meets segway\n\n#history #ai"
        );
        assert_eq!(compose_caption("plain", &[]), "plain");
    }

    #[test]
    fn test_default_slot_is_tomorrow_nine_utc() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 22, 45, 10).unwrap();
        assert_eq!(
            default_slot(now),
            Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_slots_two_hours_apart() {
        let first = Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap();
        assert_eq!(slot_after(first, 0), first);
        assert_eq!(
            slot_after(first, 3),
            Utc.with_ymd_and_hms(2026, 10, 17, 15, 0, 0).unwrap()
        );
    }
}
