use rand::rngs::StdRng;

use crate::{
    encode::sink::SinkFactory,
    foundation::{error::MemeResult, language::Language},
    layout::engine::clean_caption,
    pipeline::compose::{ArtifactPaths, CompositionOutput, CompositionPipeline, CompositionRequest},
    render::surface::CaptionSurface,
    topics::{
        ledger::TopicLedger,
        selector::{TopicChoice, TopicSelector, TopicSource},
    },
};

/// Used when the caption source fails or produces nothing printable.
pub const FALLBACK_CAPTION: &str = "When you realize it's Monday...";

/// Writes a caption about a topic. Text generation itself lives outside this crate.
pub trait CaptionSource {
    fn caption(&mut self, topic: &str, language: Language) -> MemeResult<String>;
}

/// Fills `{topic}` and `{language}` placeholders in a fixed template.
#[derive(Clone, Debug)]
pub struct TemplateCaption {
    template: String,
}

impl TemplateCaption {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl Default for TemplateCaption {
    fn default() -> Self {
        Self::new("Me checking {topic} every five minutes")
    }
}

impl CaptionSource for TemplateCaption {
    fn caption(&mut self, topic: &str, language: Language) -> MemeResult<String> {
        Ok(self
            .template
            .replace("{topic}", topic)
            .replace("{language}", language.name))
    }
}

#[derive(Debug)]
pub struct TrendingOutput {
    pub choice: TopicChoice,
    pub caption: String,
    pub composition: CompositionOutput,
    /// Whether the topic was written to the ledger.
    pub recorded: bool,
}

/// Collaborators for one trending composition.
pub struct TrendingRun<'a, R = StdRng> {
    pub selector: &'a mut TopicSelector<R>,
    pub topics: &'a mut dyn TopicSource,
    pub ledger: &'a mut dyn TopicLedger,
    pub captions: &'a mut dyn CaptionSource,
    pub language: Language,
}

impl<R: rand::Rng> TrendingRun<'_, R> {
    /// Pick a topic, caption it, compose, and record the topic only once both artifacts exist.
    ///
    /// Default topics are never recorded. A failed ledger write is logged; the artifacts are
    /// already on disk by then.
    #[tracing::instrument(skip_all, fields(language = self.language.code))]
    pub fn run<F: SinkFactory>(
        mut self,
        pipeline: &mut CompositionPipeline<F>,
        surface: &mut dyn CaptionSurface,
        base: &CompositionRequest,
        paths: &ArtifactPaths,
    ) -> MemeResult<TrendingOutput> {
        let choice = self.selector.select(&mut *self.topics, &mut *self.ledger);
        tracing::info!(topic = %choice.topic, origin = ?choice.origin, "trending topic chosen");

        let caption = match self.captions.caption(&choice.topic, self.language) {
            Ok(text) if !clean_caption(&text).is_empty() => text,
            Ok(_) => {
                tracing::warn!(topic = %choice.topic, "empty caption, using fallback");
                FALLBACK_CAPTION.to_string()
            }
            Err(err) => {
                tracing::warn!(topic = %choice.topic, error = %err, "caption source failed, using fallback");
                FALLBACK_CAPTION.to_string()
            }
        };

        let req = CompositionRequest {
            caption: caption.clone(),
            ..base.clone()
        };
        let composition = pipeline.compose(surface, &req, paths)?;

        let recordable = composition.is_complete()
            && !choice.is_default()
            && !self.selector.is_default_topic(&choice.topic);
        let recorded = recordable
            && match self.ledger.mark_used(&choice.topic) {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(topic = %choice.topic, error = %err, "could not record topic");
                    false
                }
            };

        Ok(TrendingOutput {
            choice,
            caption,
            composition,
            recorded,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/trending.rs"]
mod tests;
