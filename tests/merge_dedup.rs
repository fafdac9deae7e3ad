//! Merge/dedup properties shared by both content streams.

use cdlt_news::content::merge::{merge_deduplicated, normalize_title};
use cdlt_news::content::types::ArticleItem;

fn article(title: &str) -> ArticleItem {
    serde_json::from_str(&serde_json::json!({ "title": title }).to_string()).unwrap()
}

#[test]
fn merging_a_stream_with_itself_adds_nothing() {
    let a: Vec<ArticleItem> = ["uno", "dos", "tres"].iter().map(|t| article(t)).collect();
    for cap in [1usize, 2, 3, 10] {
        assert_eq!(
            merge_deduplicated(&a, &a, cap),
            merge_deduplicated(&a, &[], cap)
        );
    }
}

#[test]
fn duplicate_titles_differing_only_in_case_and_markup_collapse() {
    let existing = vec![article("Crisis Climática en el Ártico")];
    let incoming = vec![article("  CRISIS   CLIMÁTICA en el ártico "), article("Otra")];
    let merged = merge_deduplicated(&existing, &incoming, 10);
    assert_eq!(merged.len(), 2);
    // The incoming spelling wins.
    assert_eq!(merged[0].title, "  CRISIS   CLIMÁTICA en el ártico ");
}

#[test]
fn capacity_bound_holds_over_repeated_merges() {
    let cap = 7;
    let mut history: Vec<ArticleItem> = Vec::new();
    for round in 0..10 {
        let incoming: Vec<ArticleItem> = (0..5)
            .map(|i| article(&format!("round {round} item {i}")))
            .collect();
        history = merge_deduplicated(&history, &incoming, cap);
        assert!(history.len() <= cap);
    }
    // Most-recently-merged items sit first.
    assert_eq!(history[0].title, "round 9 item 0");
    assert_eq!(history[4].title, "round 9 item 4");
    assert_eq!(history[5].title, "round 8 item 0");
}

#[test]
fn zero_and_one_capacities_are_hard_bounds() {
    let existing = vec![article("uno"), article("dos")];

    assert!(merge_deduplicated(&existing, &[], 0).is_empty());
    assert!(merge_deduplicated(&existing, &[article("tres")], 0).is_empty());

    let one = merge_deduplicated(&existing, &[article("tres")], 1);
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].title, "tres");
}

#[test]
fn normalized_title_is_the_only_identity() {
    // Same ids, different titles: both kept. Different ids, same title: deduped.
    let mut a = article("titulo A");
    let mut b = article("titulo B");
    a.id = "same".into();
    b.id = "same".into();
    assert_eq!(merge_deduplicated(&[a.clone()], &[b], 10).len(), 2);

    let mut c = article("titulo A");
    c.id = "different".into();
    assert_eq!(merge_deduplicated(&[a], &[c], 10).len(), 1);
}

#[test]
fn normalize_title_examples() {
    assert_eq!(normalize_title("Wall&nbsp;Street  <b>cierra</b>"), "wall street cierra");
    assert_eq!(normalize_title(" \t "), "");
}
