//! Mention scoring
//!
//! For a candidate answer and a clue, the scorer plugs each of the answer's referring
//! expressions into the context windows around every detected mention and asks the
//! language model how natural the result is. The best length-normalized log-probability
//! becomes the feature value; the detected mentions themselves are emitted as
//! `answer~mention` annotation tokens.
//!
//! Clues are usually scored against many answers in a row, so the spans of the last text
//! seen are kept in a single-slot cache.

use crate::detector::ReferenceDetector;
use crate::error::{Error, Result};
use crate::lm::ModelHandle;
use crate::normalize::{lm_tokenize, normalize_title, underscore_spaces};
use crate::refex::{ReferringExpressions, SCORE_DELIMITER};
use crate::types::{FeatureRecord, ScoreField};
use crate::MentionConfig;
use tracing::debug;

/// Separator between the answer and the mention in an annotation token
pub const ANNOTATION_SEPARATOR: char = '~';

/// Context windows and mention text of one cached span, lowercased and normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMention {
    pub prefix: String,
    pub mention: String,
    pub suffix: String,
}

/// Spans of the most recently scored text
#[derive(Debug, Default)]
struct MentionCache {
    last_text: Option<String>,
    last_spans: Vec<CachedMention>,
}

/// Scores candidate answers against the mentions found in clue text
#[derive(Debug)]
pub struct MentionScorer {
    config: MentionConfig,
    detector: ReferenceDetector,
    refexs: ReferringExpressions,
    model: ModelHandle,
    cache: MentionCache,
    span_computations: usize,
}

impl MentionScorer {
    /// Create a scorer whose language model is loaded from `config.lm_path` on first use
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` fails [`MentionConfig::validate`].
    pub fn new(
        config: MentionConfig,
        detector: ReferenceDetector,
        refexs: ReferringExpressions,
    ) -> Result<Self> {
        let model = ModelHandle::lazy(config.lm_path.clone());
        Self::with_model(config, detector, refexs, model)
    }

    /// Create a scorer around an explicit model handle
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` fails [`MentionConfig::validate`].
    pub fn with_model(
        config: MentionConfig,
        detector: ReferenceDetector,
        refexs: ReferringExpressions,
        model: ModelHandle,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            detector,
            refexs,
            model,
            cache: MentionCache::default(),
            span_computations: 0,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &MentionConfig {
        &self.config
    }

    #[must_use]
    pub const fn referring_expressions(&self) -> &ReferringExpressions {
        &self.refexs
    }

    /// Mentions cached for the most recent text
    #[must_use]
    pub fn cached_mentions(&self) -> &[CachedMention] {
        &self.cache.last_spans
    }

    /// How many times spans have been (re)computed; unchanged on a cache hit
    #[must_use]
    pub const fn span_computations(&self) -> usize {
        self.span_computations
    }

    /// Score `answer` against `text` using the configured frequency threshold
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelLoad`] if the language model cannot be loaded and
    /// [`Error::Invariant`] if `:` leaks into the answer or a mention.
    pub fn score(&mut self, answer: &str, text: &str) -> Result<FeatureRecord> {
        self.score_with_threshold(answer, text, self.config.max_count)
    }

    /// Score `answer` against `text`, considering only expressions generated fewer than
    /// `max_count` times across all answers
    ///
    /// # Errors
    ///
    /// Same as [`MentionScorer::score`].
    pub fn score_with_threshold(
        &mut self,
        answer: &str,
        text: &str,
        max_count: usize,
    ) -> Result<FeatureRecord> {
        let model = self.model.get()?;
        self.refresh_cache(text);

        let mut best: Option<f64> = None;
        for expression in self.refexs.referring_exs(answer, max_count) {
            let expression_tokens = lm_tokenize(expression);

            for cached in &self.cache.last_spans {
                let mut tokens = lm_tokenize(&cached.prefix);
                tokens.extend(expression_tokens.iter().cloned());
                tokens.extend(lm_tokenize(&cached.suffix));
                if tokens.is_empty() {
                    continue;
                }

                #[allow(clippy::cast_precision_loss)]
                let normalized = model.score(&tokens.join(" ")) / tokens.len() as f64;
                if best.is_none_or(|b| normalized > b) {
                    best = Some(normalized);
                }
            }
        }

        let score = match best {
            Some(value) if value > f64::NEG_INFINITY => ScoreField::Score(value),
            _ => ScoreField::Missing,
        };

        Ok(FeatureRecord {
            name: self.config.feature_name.clone(),
            score,
            annotations: self.annotations(answer)?,
        })
    }

    fn annotations(&self, answer: &str) -> Result<Vec<String>> {
        let title = normalize_title(answer);
        check_delimiter("answer", &title)?;

        self.cache
            .last_spans
            .iter()
            .map(|cached| {
                check_delimiter("mention", &cached.mention)?;
                Ok(underscore_spaces(&format!(
                    "{title}{ANNOTATION_SEPARATOR}{}",
                    cached.mention
                )))
            })
            .collect()
    }

    /// Recompute the cached spans if `text` differs from the last text seen
    fn refresh_cache(&mut self, text: &str) {
        if self.cache.last_text.as_deref() == Some(text) {
            return;
        }

        let min_chars = self.config.min_mention_chars;
        let spans: Vec<CachedMention> = self
            .detector
            .detect(text, self.config.padding)
            .map(|span| CachedMention {
                prefix: span.prefix_text(),
                mention: span.mention_text(),
                suffix: span.suffix_text(),
            })
            .filter(|cached| cached.mention.trim().chars().count() > min_chars)
            .collect();

        self.span_computations += 1;
        debug!(mentions = spans.len(), "refreshed mention cache");

        self.cache = MentionCache {
            last_text: Some(text.to_string()),
            last_spans: spans,
        };
    }
}

fn check_delimiter(kind: &str, value: &str) -> Result<()> {
    if value.contains(SCORE_DELIMITER) {
        return Err(Error::Invariant(format!(
            "{kind} {value:?} contains '{SCORE_DELIMITER}'"
        )));
    }
    Ok(())
}
