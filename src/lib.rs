//! # Clue Mentions
//!
//! Mention detection and scoring features for quiz-bowl answer guessing.
//!
//! Quiz clues refer to their answer with demonstratives ("this character", "these
//! structures"). This library finds those reference spans, builds a set of referring
//! expressions for every candidate answer, and scores how naturally each answer fits into
//! the mention's context according to an n-gram language model.
//!
//! ## Features
//!
//! - Reference span detection over part-of-speech tagged text
//! - Referring expression generation with global commonness filtering
//! - Language-model scoring with a single-slot span cache per scorer
//! - Dataset preprocessing with optional mention tokens
//!
//! ## Example
//!
//! ```rust,no_run
//! use clue_mentions::{
//!     EnglishPluralizer, LexiconTagger, MentionConfig, MentionScorer, ReferenceDetector,
//!     ReferringExpressions,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MentionConfig::from_env()?;
//!     let answers = ["Desdemona", "De Stijl", "Mikhail Gorbachev", "Chromosome"];
//!
//!     let refexs = ReferringExpressions::generate(answers, &EnglishPluralizer)?;
//!     let detector = ReferenceDetector::new(LexiconTagger::new());
//!     let mut scorer = MentionScorer::new(config, detector, refexs)?;
//!
//!     let clue = "This leader spent three days in house arrest.";
//!     println!("{}", scorer.score("Mikhail Gorbachev", clue)?);
//!
//!     Ok(())
//! }
//! ```

use std::env;
use std::path::PathBuf;

pub mod detector;
pub mod error;
pub mod lexicon;
pub mod lm;
pub mod normalize;
pub mod preprocess;
pub mod refex;
pub mod scorer;
pub mod tagger;
pub mod types;

pub use detector::ReferenceDetector;
pub use error::{Error, Result};
pub use lexicon::StateLexicon;
pub use lm::{ArpaModel, LanguageModel, ModelHandle};
pub use preprocess::{ClassIndex, PreprocessConfig, PreprocessedData, TrainingData};
pub use refex::{EnglishPluralizer, Pluralizer, ReferringExpressions};
pub use scorer::{CachedMention, MentionScorer};
pub use tagger::{LexiconTagger, Tagger};
pub use types::{FeatureRecord, ReferenceSpan, ScoreField, TaggedToken};

/// Initialize the library by loading a .env file
///
/// Call this at the start of an application so `from_env` constructors see variables
/// defined in a .env file in the current directory or its parents.
///
/// # Errors
///
/// Never fails today; a missing .env file is ignored.
pub fn init() -> Result<()> {
    dotenvy::dotenv().ok();
    Ok(())
}

/// Configuration for mention scoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionConfig {
    /// ARPA language model file, read on first score
    pub lm_path: PathBuf,

    /// Feature namespace written in the score field (`|mentions score:...`)
    pub feature_name: String,

    /// Context tokens kept on each side of a mention
    pub padding: usize,

    /// Mentions whose trimmed text is this many characters or fewer are dropped
    pub min_mention_chars: usize,

    /// Referring expressions generated this many times or more are skipped
    pub max_count: usize,
}

impl Default for MentionConfig {
    fn default() -> Self {
        Self {
            lm_path: PathBuf::from("data/kenlm.arpa"),
            feature_name: "mentions".to_string(),
            padding: detector::DEFAULT_PADDING,
            min_mention_chars: 3,
            max_count: refex::DEFAULT_MAX_COUNT,
        }
    }
}

fn env_usize(key: &str, default: usize) -> Result<usize> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {value:?}"))),
        Err(_) => Ok(default),
    }
}

impl MentionConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// Automatically loads a .env file if present. Supports these variables:
    /// - `MENTIONS_LM_PATH`: ARPA model path (default: "data/kenlm.arpa")
    /// - `MENTIONS_FEATURE_NAME`: Feature name (default: "mentions")
    /// - `MENTIONS_PADDING`: Context window in tokens (default: 5)
    /// - `MENTIONS_MIN_MENTION_CHARS`: Minimum mention length, exclusive (default: 3)
    /// - `MENTIONS_MAX_COUNT`: Expression frequency threshold, exclusive (default: 5)
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is set but cannot be parsed, or if the
    /// feature name fails [`MentionConfig::validate`]
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let lm_path = env::var("MENTIONS_LM_PATH").map_or(defaults.lm_path, PathBuf::from);
        let feature_name = env::var("MENTIONS_FEATURE_NAME").unwrap_or(defaults.feature_name);

        let config = Self {
            lm_path,
            feature_name,
            padding: env_usize("MENTIONS_PADDING", defaults.padding)?,
            min_mention_chars: env_usize("MENTIONS_MIN_MENTION_CHARS", defaults.min_mention_chars)?,
            max_count: env_usize("MENTIONS_MAX_COUNT", defaults.max_count)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the feature name renders as a single `|name` field
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the feature name is empty or contains a space, `|` or `:`
    pub fn validate(&self) -> Result<()> {
        if self.feature_name.is_empty() || self.feature_name.contains([' ', '|', ':']) {
            return Err(Error::Config(format!(
                "feature name must be non-empty without spaces, '|' or ':', got {:?}",
                self.feature_name
            )));
        }
        Ok(())
    }

    /// Set the language model path
    #[must_use]
    pub fn with_lm_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.lm_path = path.into();
        self
    }

    /// Set the feature name
    #[must_use]
    pub fn with_feature_name(mut self, name: impl Into<String>) -> Self {
        self.feature_name = name.into();
        self
    }

    /// Set the context window size
    #[must_use]
    pub const fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    /// Set the minimum mention length
    #[must_use]
    pub const fn with_min_mention_chars(mut self, chars: usize) -> Self {
        self.min_mention_chars = chars;
        self
    }

    /// Set the expression frequency threshold
    #[must_use]
    pub const fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count;
        self
    }
}
