/// Substrings that keep a trending topic out of caption generation.
pub const DEFAULT_DENYLIST: &[&str] = &[
    "death",
    "dead",
    "died",
    "killed",
    "murder",
    "shooting",
    "attack",
    "terror",
    "war",
    "bomb",
    "suicide",
    "abuse",
    "disaster",
    "earthquake",
    "crash",
    "funeral",
    "tragedy",
    "victim",
    "politic",
    "election",
    "religion",
];

/// Always-eligible topics used when every candidate was filtered out.
pub const SAFE_DEFAULT_TOPICS: &[&str] = &["Monday mornings", "Coffee before work"];

/// Used when the topic source cannot be reached at all.
pub const FALLBACK_TOPIC: &str = "Monday mornings";

/// Case-insensitive substring denylist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SafetyFilter {
    denylist: Vec<String>,
}

impl Default for SafetyFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST.iter().copied())
    }
}

impl SafetyFilter {
    pub fn new<I, S>(denylist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let denylist = denylist
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self { denylist }
    }

    pub fn is_safe(&self, topic: &str) -> bool {
        let topic = topic.to_lowercase();
        !self.denylist.iter().any(|bad| topic.contains(bad.as_str()))
    }

    /// Safe candidates in input order.
    pub fn filter(&self, candidates: &[String]) -> Vec<String> {
        candidates
            .iter()
            .filter(|t| self.is_safe(t))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/topics/safety.rs"]
mod tests;
