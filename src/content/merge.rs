// src/content/merge.rs
//! Normalized-title dedup shared by both streams.

use std::collections::HashSet;

use crate::content::types::ContentItem;

/// Normalize a title for identity comparison: entity decode, tag strip,
/// whitespace collapse, trim, case fold. Exact equality on this key is
/// the only dedup criterion; ids from the generator are not trusted.
pub fn normalize_title(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_lowercase()
}

/// Fold freshly fetched items into history: incoming before existing
/// (freshness wins on duplicates), first occurrence of each normalized
/// title kept, empty titles dropped, result truncated to `capacity`.
/// Stable and order-preserving.
pub fn merge_deduplicated<T: ContentItem>(existing: &[T], incoming: &[T], capacity: usize) -> Vec<T> {
    let mut seen: HashSet<String> = HashSet::with_capacity(incoming.len() + existing.len());
    let mut out = Vec::with_capacity(capacity.min(incoming.len() + existing.len()));

    for item in incoming.iter().chain(existing.iter()) {
        if out.len() >= capacity {
            break;
        }
        let key = normalize_title(item.title());
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        out.push(item.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::types::StoryItem;

    fn story(title: &str) -> StoryItem {
        StoryItem {
            id: String::new(),
            category: "GLOBAL".into(),
            title: title.into(),
            short_body: String::new(),
            timestamp_label: String::new(),
            image_url: String::new(),
        }
    }

    #[test]
    fn normalize_title_decodes_strips_and_folds() {
        assert_eq!(
            normalize_title("  <b>Crisis&nbsp;  Clim&aacute;tica</b> "),
            "crisis climática"
        );
        assert_eq!(normalize_title("<p></p>"), "");
    }

    #[test]
    fn incoming_wins_and_order_is_preserved() {
        let existing = vec![story("Alpha"), story("Beta")];
        let incoming = vec![story("BETA"), story("Gamma")];
        let merged = merge_deduplicated(&existing, &incoming, 10);
        let titles: Vec<&str> = merged.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["BETA", "Gamma", "Alpha"]);
    }

    #[test]
    fn empty_titles_are_dropped() {
        let incoming = vec![story("  "), story("<i></i>"), story("Real")];
        let merged = merge_deduplicated(&[], &incoming, 10);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "Real");
    }

    #[test]
    fn capacity_truncates_keeping_newest_first() {
        let existing: Vec<StoryItem> = (0..5).map(|i| story(&format!("old {i}"))).collect();
        let incoming: Vec<StoryItem> = (0..3).map(|i| story(&format!("new {i}"))).collect();
        let merged = merge_deduplicated(&existing, &incoming, 4);
        assert_eq!(merged.len(), 4);
        assert_eq!(merged[0].title, "new 0");
        assert_eq!(merged[3].title, "old 0");
    }

    #[test]
    fn degenerate_capacities_still_bound_the_result() {
        let existing = vec![story("uno"), story("dos")];
        let incoming = vec![story("tres")];
        assert!(merge_deduplicated(&existing, &incoming, 0).is_empty());
        let one = merge_deduplicated(&existing, &incoming, 1);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].title, "tres");
    }

    #[test]
    fn merging_a_list_with_itself_is_idempotent() {
        let a: Vec<StoryItem> = vec![story("one"), story("two"), story("three")];
        let self_merged = merge_deduplicated(&a, &a, 10);
        let identity = merge_deduplicated(&a, &[], 10);
        assert_eq!(self_merged, identity);
    }
}
