//! Core data types shared by the detector, scorer and preprocessing stages

use serde::{Deserialize, Serialize};
use std::fmt;

/// A token paired with its part-of-speech tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub surface: String,
    pub tag: String,
}

impl TaggedToken {
    #[must_use]
    pub fn new(surface: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            tag: tag.into(),
        }
    }

    /// Penn-style noun tags (`NN`, `NNS`, `NNP`, `NNPS`)
    #[must_use]
    pub fn is_noun(&self) -> bool {
        self.tag.starts_with("NN")
    }

    /// Any tag starting with `V`
    #[must_use]
    pub fn is_verb(&self) -> bool {
        self.tag.starts_with('V')
    }
}

/// A detected reference span with its left and right context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSpan {
    /// Index of the opening demonstrative in the tagged sequence
    pub start: usize,

    /// Index of the noun closing the span (inclusive)
    pub stop: usize,

    /// Up to `padding` normalized tokens before `start`
    pub prefix: Vec<String>,

    /// Normalized tokens from `start` through `stop`
    pub mention: Vec<String>,

    /// Up to `padding` normalized tokens after `stop`
    pub suffix: Vec<String>,
}

impl ReferenceSpan {
    /// The prefix joined with single spaces
    #[must_use]
    pub fn prefix_text(&self) -> String {
        self.prefix.join(" ")
    }

    /// The mention joined with single spaces
    #[must_use]
    pub fn mention_text(&self) -> String {
        self.mention.join(" ")
    }

    /// The suffix joined with single spaces
    #[must_use]
    pub fn suffix_text(&self) -> String {
        self.suffix.join(" ")
    }
}

/// Outcome of scoring one entity against one text
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreField {
    /// Best length-normalized log-probability
    Score(f64),
    /// No (expression, context) combination was evaluated
    Missing,
}

/// The feature emitted for an (entity, text) pair
///
/// `Display` renders the exact text consumed by the downstream feature encoder:
///
/// ```
/// use clue_mentions::types::{FeatureRecord, ScoreField};
///
/// let record = FeatureRecord {
///     name: "mentions".to_string(),
///     score: ScoreField::Score(-1.5),
///     annotations: vec!["desdemona~this_character".to_string()],
/// };
/// assert_eq!(record.to_string(), "|mentions score:-1.500000 desdemona~this_character");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Feature namespace name
    pub name: String,

    pub score: ScoreField,

    /// `entity~mention` tokens, spaces already replaced with underscores
    pub annotations: Vec<String>,
}

impl FeatureRecord {
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self.score, ScoreField::Missing)
    }

    /// Render only the score field (`|name score:x` or `|name missing:1`)
    #[must_use]
    pub fn score_field(&self) -> String {
        match self.score {
            ScoreField::Score(value) => format!("|{} score:{value:.6}", self.name),
            ScoreField::Missing => format!("|{} missing:1", self.name),
        }
    }
}

impl fmt::Display for FeatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.score_field())?;
        for annotation in &self.annotations {
            write!(f, " {annotation}")?;
        }
        Ok(())
    }
}
