//! Dataset preprocessing for answer classifiers
//!
//! Turns labeled multi-sentence questions into token sequences and integer labels. Each
//! question can be expanded per sentence, as cumulative runs, or kept whole, and can carry
//! the mention phrases found by the [`ReferenceDetector`] as extra tokens.

use crate::detector::{ReferenceDetector, DEFAULT_PADDING};
use crate::error::{Error, Result};
use crate::tagger::word_tokenize;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::info;

const BOILERPLATE: [&str; 11] = [
    "--for 10 points--",
    ", for 10 points,",
    ", for ten points,",
    ", ftp,ftp,",
    "for 10 points, ",
    "for 10 points--",
    "for ten points, ",
    "for 10 points ",
    "for ten points ",
    "ftp",
    "\n",
];

static CLEAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    let mut alternatives = vec![r"\[.*?\]".to_string(), r"\(.*?\)".to_string()];
    alternatives.extend(BOILERPLATE.iter().map(|p| regex::escape(p)));
    alternatives.push(r"[[:punct:]]".to_string());
    Regex::new(&alternatives.join("|")).expect("cleaning pattern is valid")
});

/// Remove boilerplate, bracketed asides and punctuation from a question
///
/// # Examples
///
/// ```
/// use clue_mentions::preprocess::clean_question;
///
/// assert_eq!(
///     clean_question("For 10 points, name this leader [GOR-bah-chof]."),
///     "name this leader "
/// );
/// ```
#[must_use]
pub fn clean_question(question: &str) -> String {
    CLEAN_RE
        .replace_all(&question.trim().to_lowercase(), "")
        .into_owned()
}

/// Tokenize a question sentence, optionally appending its mention phrases
///
/// Mention phrases are taken from the original text (before cleaning) and appended whole,
/// e.g. `"this character"`, with no length filtering.
#[must_use]
pub fn tokenize_question(text: &str, mentions: Option<&ReferenceDetector>) -> Vec<String> {
    let mut tokens = word_tokenize(&clean_question(text));

    if let Some(detector) = mentions {
        tokens.extend(
            detector
                .detect(text, DEFAULT_PADDING)
                .map(|span| span.mention_text()),
        );
    }

    tokens
}

/// Normalize a guess into a single feature-safe token
///
/// # Examples
///
/// ```
/// use clue_mentions::preprocess::format_guess;
///
/// assert_eq!(format_guess(" Star Trek: Voyager "), "star_trek_voyager");
/// ```
#[must_use]
pub fn format_guess(guess: &str) -> String {
    guess
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace([':', '|'], "")
}

/// Labeled questions: `questions[i]` is a list of sentences answered by `answers[i]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingData {
    pub questions: Vec<Vec<String>>,
    pub answers: Vec<String>,
}

impl TrainingData {
    /// Read a dataset from a JSON file with `questions` and `answers` arrays
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Json`] if it is not a
    /// valid dataset.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Options controlling how questions are expanded into examples
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    /// Fraction of questions used for training, in `(0, 1]`; `1` means no test set
    pub train_size: f64,

    /// Emit one example per sentence containing every sentence so far
    pub create_runs: bool,

    /// Emit one example per question
    pub full_question: bool,

    /// Append detected mention phrases to each sentence's tokens
    pub generate_mentions: bool,

    /// Seed for the train/test shuffle
    pub seed: u64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            train_size: 0.9,
            create_runs: false,
            full_question: false,
            generate_mentions: false,
            seed: 0,
        }
    }
}

impl PreprocessConfig {
    /// Reject incompatible or out-of-range options
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if both `create_runs` and `full_question` are set or
    /// `train_size` is outside `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.create_runs && self.full_question {
            return Err(Error::Config(format!(
                "The options create_runs={} and full_question={} are not compatible",
                self.create_runs, self.full_question
            )));
        }
        if !(self.train_size > 0.0 && self.train_size <= 1.0) {
            return Err(Error::Config(format!(
                "train_size must be in (0, 1], got {}",
                self.train_size
            )));
        }
        Ok(())
    }

    #[must_use]
    pub const fn with_train_size(mut self, train_size: f64) -> Self {
        self.train_size = train_size;
        self
    }

    #[must_use]
    pub const fn with_create_runs(mut self, create_runs: bool) -> Self {
        self.create_runs = create_runs;
        self
    }

    #[must_use]
    pub const fn with_full_question(mut self, full_question: bool) -> Self {
        self.full_question = full_question;
        self
    }

    #[must_use]
    pub const fn with_generate_mentions(mut self, generate_mentions: bool) -> Self {
        self.generate_mentions = generate_mentions;
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Stable mapping between answers and integer labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassIndex {
    pub class_to_i: HashMap<String, usize>,
    pub i_to_class: Vec<String>,
}

impl ClassIndex {
    /// Build an index over the distinct answers, labeled in sorted order
    #[must_use]
    pub fn from_answers<S: AsRef<str>>(answers: &[S]) -> Self {
        let classes: BTreeSet<&str> = answers.iter().map(AsRef::as_ref).collect();

        let i_to_class: Vec<String> = classes.into_iter().map(str::to_string).collect();
        let class_to_i = i_to_class
            .iter()
            .enumerate()
            .map(|(i, class)| (class.clone(), i))
            .collect();

        Self {
            class_to_i,
            i_to_class,
        }
    }

    /// Label of `answer`
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownClass`] if the answer is not indexed.
    pub fn label(&self, answer: &str) -> Result<usize> {
        self.class_to_i
            .get(answer)
            .copied()
            .ok_or_else(|| Error::UnknownClass(answer.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.i_to_class.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.i_to_class.is_empty()
    }
}

/// Tokenized train and test examples with their vocabulary and label space
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessedData {
    pub x_train: Vec<Vec<String>>,
    pub y_train: Vec<usize>,
    pub x_test: Vec<Vec<String>>,
    pub y_test: Vec<usize>,
    pub vocab: BTreeSet<String>,
    pub classes: ClassIndex,
}

impl PreprocessedData {
    /// Write the examples, vocabulary and label space as JSON
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails and [`Error::Io`] if the file
    /// cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Read data written by [`PreprocessedData::save`]
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Json`] if it does not
    /// hold preprocessed data.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Split, tokenize and label a dataset
///
/// The train/test split is over whole questions, before they are expanded into
/// sentences or runs, so no question contributes to both partitions. Pass `vocab` and
/// `classes` from an earlier call to share them between calls.
///
/// # Errors
///
/// Returns [`Error::Config`] for invalid options, a missing detector when mentions are
/// requested, or mismatched question/answer counts, and [`Error::UnknownClass`] if a
/// supplied `classes` index lacks one of the answers.
pub fn preprocess_dataset(
    data: &TrainingData,
    config: &PreprocessConfig,
    vocab: Option<BTreeSet<String>>,
    classes: Option<ClassIndex>,
    detector: Option<&ReferenceDetector>,
) -> Result<PreprocessedData> {
    config.validate()?;
    if config.generate_mentions && detector.is_none() {
        return Err(Error::Config(
            "generate_mentions requires a reference detector".to_string(),
        ));
    }
    if data.questions.len() != data.answers.len() {
        return Err(Error::Config(format!(
            "{} questions but {} answers",
            data.questions.len(),
            data.answers.len()
        )));
    }

    let classes = classes.unwrap_or_else(|| ClassIndex::from_answers(&data.answers));
    let mentions = if config.generate_mentions { detector } else { None };

    let mut pairs: Vec<(&[String], &str)> = data
        .questions
        .iter()
        .map(Vec::as_slice)
        .zip(data.answers.iter().map(String::as_str))
        .collect();

    let (train, test) = if config.train_size < 1.0 {
        pairs.shuffle(&mut StdRng::seed_from_u64(config.seed));
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let n_train = (config.train_size * pairs.len() as f64).floor() as usize;
        pairs.split_at(n_train)
    } else {
        (pairs.as_slice(), &[][..])
    };

    let mut out = PreprocessedData {
        vocab: vocab.unwrap_or_default(),
        ..PreprocessedData::default()
    };

    for (question, answer) in train {
        let label = classes.label(answer)?;
        let mut q_text: Vec<String> = Vec::new();

        for sentence in *question {
            let tokens = tokenize_question(sentence, mentions);
            if config.create_runs || config.full_question {
                q_text.extend(tokens.iter().cloned());
            } else {
                q_text.clone_from(&tokens);
            }

            if tokens.is_empty() {
                continue;
            }
            out.vocab.extend(tokens);
            if !config.full_question {
                out.x_train.push(q_text.clone());
                out.y_train.push(label);
            }
        }

        if config.full_question {
            out.x_train.push(q_text);
            out.y_train.push(label);
        }
    }

    for (question, answer) in test {
        let label = classes.label(answer)?;
        let mut q_text: Vec<String> = Vec::new();

        for sentence in *question {
            let tokens = tokenize_question(sentence, mentions);
            if config.create_runs || config.full_question {
                q_text.extend(tokens);
            } else {
                q_text = tokens;
            }

            if !config.full_question {
                out.x_test.push(q_text.clone());
                out.y_test.push(label);
            }
        }

        if config.full_question {
            out.x_test.push(q_text);
            out.y_test.push(label);
        }
    }

    info!(
        train = out.x_train.len(),
        test = out.x_test.len(),
        vocab = out.vocab.len(),
        classes = classes.len(),
        "preprocessed dataset"
    );

    out.classes = classes;
    Ok(out)
}
