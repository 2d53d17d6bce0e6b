use super::*;

#[test]
fn denylisted_substrings_match_case_insensitively() {
    let filter = SafetyFilter::default();
    assert!(!filter.is_safe("Stock market CRASH today"));
    assert!(!filter.is_safe("Election night memes"));
    assert!(filter.is_safe("Cats discovering cucumbers"));
}

#[test]
fn filter_preserves_order_of_survivors() {
    let filter = SafetyFilter::new(["storm"]);
    let candidates = vec![
        "Pizza".to_string(),
        "Storm warning".to_string(),
        "Sloths".to_string(),
        "brainSTORMing".to_string(),
    ];
    assert_eq!(filter.filter(&candidates), vec!["Pizza", "Sloths"]);
}

#[test]
fn blank_denylist_entries_are_ignored() {
    let filter = SafetyFilter::new(["", "  "]);
    assert!(filter.is_safe("anything"));
}

#[test]
fn safe_defaults_pass_the_default_filter() {
    let filter = SafetyFilter::default();
    for topic in SAFE_DEFAULT_TOPICS {
        assert!(filter.is_safe(topic), "{topic}");
    }
    assert!(SAFE_DEFAULT_TOPICS.contains(&FALLBACK_TOPIC));
}
