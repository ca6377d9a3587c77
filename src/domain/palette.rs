use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteItem {
    pub label: String,
    pub action: String,
}

impl PaletteItem {
    pub fn new(label: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: action.into(),
        }
    }
}

pub fn fuzzy_filter(items: &[PaletteItem], query: &str) -> Vec<PaletteItem> {
    if query.trim().is_empty() {
        return items.to_vec();
    }

    let mut matcher = Matcher::new(Config::DEFAULT);
    let pattern = Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart);

    let mut buf = Vec::new();
    let mut scored = Vec::new();
    for item in items {
        let haystack = Utf32Str::new(&item.label, &mut buf);
        if let Some(score) = pattern.score(haystack, &mut matcher) {
            scored.push((score, item.clone()));
        }
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.label.cmp(&b.1.label)));
    scored.into_iter().map(|(_, item)| item).collect()
}

/// Transport actions plus one "jump to" entry per playlist track.
pub fn player_palette(track_titles: &[String]) -> Vec<PaletteItem> {
    let mut items = vec![
        PaletteItem::new("Play / pause", "toggle"),
        PaletteItem::new("Stop playback", "stop"),
        PaletteItem::new("Next track", "next"),
        PaletteItem::new("Previous track", "previous"),
        PaletteItem::new("Volume up", "volume-up"),
        PaletteItem::new("Volume down", "volume-down"),
        PaletteItem::new("Remove selected track", "remove"),
        PaletteItem::new("Clear playlist", "clear"),
        PaletteItem::new("Show help", "help"),
        PaletteItem::new("Quit musicbox", "quit"),
    ];
    items.extend(
        track_titles
            .iter()
            .enumerate()
            .map(|(idx, title)| PaletteItem::new(format!("Play {title}"), format!("play:{idx}"))),
    );
    items
}
