use std::path::{Path, PathBuf};

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{
    foundation::{
        config::TopicConfig,
        error::{MemeError, MemeResult},
    },
    topics::{ledger::TopicLedger, safety::SafetyFilter},
};

/// Supplier of trending topic candidates.
pub trait TopicSource {
    fn fetch_candidates(&mut self) -> MemeResult<Vec<String>>;
}

#[derive(Clone, Debug, Default)]
pub struct StaticTopicSource {
    topics: Vec<String>,
}

impl StaticTopicSource {
    pub fn new<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topics: topics.into_iter().map(Into::into).collect(),
        }
    }
}

impl TopicSource for StaticTopicSource {
    fn fetch_candidates(&mut self) -> MemeResult<Vec<String>> {
        Ok(self.topics.clone())
    }
}

/// Candidates from a file: a JSON array of strings, or one topic per line.
#[derive(Clone, Debug)]
pub struct FileTopicSource {
    path: PathBuf,
}

impl FileTopicSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TopicSource for FileTopicSource {
    fn fetch_candidates(&mut self) -> MemeResult<Vec<String>> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            MemeError::topic_source(format!("read '{}': {e}", self.path.display()))
        })?;

        if raw.trim_start().starts_with('[') {
            return serde_json::from_str::<Vec<String>>(&raw).map_err(|e| {
                MemeError::topic_source(format!("parse '{}': {e}", self.path.display()))
            });
        }

        Ok(raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChoiceOrigin {
    /// Picked among fresh, safe candidates.
    Candidate,
    /// The source failed; the fixed fallback topic was used.
    SourceUnavailable,
    /// Every candidate was unsafe or already used; a safe default was used.
    Exhausted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicChoice {
    pub topic: String,
    pub origin: ChoiceOrigin,
}

impl TopicChoice {
    /// Defaults stay perpetually eligible and are never recorded.
    pub fn is_default(&self) -> bool {
        self.origin != ChoiceOrigin::Candidate
    }
}

/// Safety filter, then ledger dedup, then a uniform pick.
#[derive(Debug)]
pub struct TopicSelector<R = StdRng> {
    safety: SafetyFilter,
    fallback_topic: String,
    safe_defaults: Vec<String>,
    rng: R,
}

impl TopicSelector<StdRng> {
    pub fn from_config(cfg: &TopicConfig) -> Self {
        Self::with_rng(cfg, StdRng::from_entropy())
    }
}

impl<R: rand::Rng> TopicSelector<R> {
    pub fn with_rng(cfg: &TopicConfig, rng: R) -> Self {
        Self {
            safety: SafetyFilter::new(&cfg.denylist),
            fallback_topic: cfg.fallback_topic.clone(),
            safe_defaults: cfg.safe_defaults.clone(),
            rng,
        }
    }

    pub fn safety(&self) -> &SafetyFilter {
        &self.safety
    }

    /// True for the fallback topic and the safe defaults, even when a source offers them.
    pub fn is_default_topic(&self, topic: &str) -> bool {
        topic == self.fallback_topic || self.safe_defaults.iter().any(|d| d == topic)
    }

    /// Never fails: source and exhaustion problems resolve to default topics.
    pub fn select(
        &mut self,
        source: &mut dyn TopicSource,
        ledger: &mut dyn TopicLedger,
    ) -> TopicChoice {
        let candidates = match source.fetch_candidates() {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(error = %err, topic = %self.fallback_topic, "using fallback topic");
                return TopicChoice {
                    topic: self.fallback_topic.clone(),
                    origin: ChoiceOrigin::SourceUnavailable,
                };
            }
        };

        let candidates: Vec<String> = candidates
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        let safe = self.safety.filter(&candidates);
        let fresh = match ledger.filter_unused(&safe) {
            Ok(fresh) => fresh,
            Err(err) => {
                tracing::warn!(error = %err, "topic ledger unreadable, skipping dedup");
                safe
            }
        };

        if let Some(topic) = fresh.choose(&mut self.rng) {
            tracing::debug!(
                candidates = candidates.len(),
                fresh = fresh.len(),
                %topic,
                "topic selected"
            );
            return TopicChoice {
                topic: topic.clone(),
                origin: ChoiceOrigin::Candidate,
            };
        }

        let err = MemeError::exhausted(format!(
            "{} candidates, none safe and unused",
            candidates.len()
        ));
        let topic = self
            .safe_defaults
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| self.fallback_topic.clone());
        tracing::warn!(error = %err, %topic, "using safe default topic");
        TopicChoice {
            topic,
            origin: ChoiceOrigin::Exhausted,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/topics/selector.rs"]
mod tests;
