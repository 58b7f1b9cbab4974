//! SATD comment-marker scanner — ambient supplement (SPEC_FULL §C),
//! feeding the TDG `consistency` component. Grounded on `server/src/
//! models/tdg.rs`'s `SatdItem`/`SatdSeverity` ordering.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::satd::{SatdItem, SatdSeverity};

static MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(TODO|FIXME|HACK|XXX)\b:?\s*(.*)").expect("SATD marker regex is valid")
});

pub fn scan(file: &str, source: &str) -> Vec<SatdItem> {
    let mut items = Vec::new();
    for (idx, line) in source.lines().enumerate() {
        if let Some(caps) = MARKER.captures(line) {
            let marker = caps.get(1).unwrap().as_str().to_string();
            let text = caps.get(2).map(|m| m.as_str().trim().to_string()).unwrap_or_default();
            items.push(SatdItem {
                file: file.to_string(),
                line: idx + 1,
                severity: SatdSeverity::from_marker(&marker),
                marker,
                text,
            });
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_fixme_as_high_severity() {
        let items = scan("a.rs", "// FIXME: this leaks memory\nfn ok() {}");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].severity, SatdSeverity::High);
    }

    #[test]
    fn detects_todo_as_low_severity() {
        let items = scan("a.rs", "// TODO: revisit\n");
        assert_eq!(items[0].severity, SatdSeverity::Low);
    }
}
