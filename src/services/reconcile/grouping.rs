use crate::models::event::{EventRecord, EventSource};

/// Named palette entries the external provider assigns to calendars.
/// Arbitrary colors outside this set get a generated token instead.
const PALETTE: [(&str, &str); 11] = [
    ("d50000", "tomato"),
    ("e67c73", "flamingo"),
    ("f4511e", "tangerine"),
    ("f6bf26", "banana"),
    ("33b679", "sage"),
    ("0b8043", "basil"),
    ("039be5", "peacock"),
    ("3f51b5", "blueberry"),
    ("7986cb", "lavender"),
    ("8e24aa", "grape"),
    ("616161", "graphite"),
];

/// Key under which an event is grouped into a display calendar.
///
/// Provider events group by their resolved color token so each provider
/// calendar renders as one visual series. Task, habit, and manual events
/// group by source alone, except that an explicit color splits them into
/// their own group, keeping differently colored tasks from collapsing into
/// one series.
pub fn display_calendar_key(record: &EventRecord) -> String {
    match record.source {
        EventSource::External => match &record.color {
            Some(color) => color_token(color),
            None => "default".to_string(),
        },
        source => match &record.color {
            Some(color) => format!("{}-{}", source.as_str(), color_token(color)),
            None => source.as_str().to_string(),
        },
    }
}

/// Resolve a hex color to a palette name, or generate a stable token for
/// colors the palette does not know.
fn color_token(color: &str) -> String {
    let hex = normalize_hex(color);
    PALETTE
        .iter()
        .find(|(palette_hex, _)| *palette_hex == hex)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("custom-{}", hex))
}

/// Lowercase the hex digits, drop the leading `#`, and widen the short
/// `#RGB` form to six digits so equivalent spellings share one token.
fn normalize_hex(color: &str) -> String {
    let stripped = color.trim().trim_start_matches('#').to_ascii_lowercase();
    if stripped.len() == 3 {
        stripped
            .chars()
            .flat_map(|c| [c, c])
            .collect()
    } else {
        stripped
    }
}
