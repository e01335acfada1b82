//! N-gram language model used to score mention contexts
//!
//! Models are read from the ARPA text format and scored with standard Katz back-off,
//! matching what KenLM reports for `score(sentence, bos=True, eos=True)`: the total log10
//! probability of the sentence wrapped in `<s>` ... `</s>`.
//!
//! [`ModelHandle`] wraps a model in a load-once lifecycle so the file is only read the
//! first time something is scored.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const BOS: &str = "<s>";
const EOS: &str = "</s>";
const UNK: &str = "<unk>";

/// Log10 probability used for unknown words when the model has no `<unk>` entry
pub const DEFAULT_UNK_LOG_PROB: f64 = -100.0;

/// Read-only statistical language model
pub trait LanguageModel: Send + Sync {
    /// Total log10 probability of a whitespace-tokenized sentence, including `</s>`
    fn score(&self, sentence: &str) -> f64;
}

#[derive(Debug, Clone, Copy)]
struct NgramEntry {
    log_prob: f64,
    backoff: f64,
}

/// Back-off n-gram model loaded from an ARPA file
#[derive(Debug, Clone)]
pub struct ArpaModel {
    /// `ngrams[n - 1]` holds the n-grams, keyed by space-joined words
    ngrams: Vec<HashMap<String, NgramEntry>>,
    unk_log_prob: f64,
}

impl ArpaModel {
    /// Load a model from an ARPA file
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelLoad`] if the file is missing, unreadable or malformed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| Error::ModelLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::parse(&source).map_err(|reason| Error::ModelLoad {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse a model from ARPA text
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed line.
    pub fn parse(source: &str) -> std::result::Result<Self, String> {
        let mut ngrams: Vec<HashMap<String, NgramEntry>> = Vec::new();
        let mut section: Option<usize> = None;
        let mut seen_data = false;
        let mut seen_end = false;

        for (line_no, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if line == "\\data\\" {
                seen_data = true;
                continue;
            }
            if line == "\\end\\" {
                seen_end = true;
                break;
            }
            if let Some(order) = line
                .strip_prefix('\\')
                .and_then(|l| l.strip_suffix("-grams:"))
            {
                let order: usize = order
                    .parse()
                    .map_err(|_| format!("line {}: bad section header {line:?}", line_no + 1))?;
                if order == 0 {
                    return Err(format!("line {}: zero-order section", line_no + 1));
                }
                if ngrams.len() < order {
                    ngrams.resize_with(order, HashMap::new);
                }
                section = Some(order);
                continue;
            }

            let Some(order) = section else {
                // `ngram N=count` lines in the \data\ header carry nothing we need
                if seen_data && line.starts_with("ngram ") {
                    continue;
                }
                return Err(format!("line {}: unexpected {line:?}", line_no + 1));
            };

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != order + 1 && fields.len() != order + 2 {
                return Err(format!(
                    "line {}: expected {order}-gram entry, got {line:?}",
                    line_no + 1
                ));
            }

            let parse_num = |s: &str| {
                s.parse::<f64>()
                    .map_err(|_| format!("line {}: bad number {s:?}", line_no + 1))
            };
            let log_prob = parse_num(fields[0])?;
            let backoff = match fields.get(order + 1) {
                Some(&b) => parse_num(b)?,
                None => 0.0,
            };

            ngrams[order - 1].insert(fields[1..=order].join(" "), NgramEntry { log_prob, backoff });
        }

        if !seen_data {
            return Err("missing \\data\\ header".to_string());
        }
        if !seen_end {
            return Err("missing \\end\\ marker".to_string());
        }
        if ngrams.first().is_none_or(HashMap::is_empty) {
            return Err("model has no unigrams".to_string());
        }

        let unk_log_prob = ngrams[0]
            .get(UNK)
            .map_or(DEFAULT_UNK_LOG_PROB, |e| e.log_prob);

        Ok(Self {
            ngrams,
            unk_log_prob,
        })
    }

    /// Highest n-gram order in the model
    #[must_use]
    pub fn order(&self) -> usize {
        self.ngrams.len()
    }

    fn lookup(&self, words: &[&str]) -> Option<&NgramEntry> {
        self.ngrams.get(words.len().checked_sub(1)?)?.get(&words.join(" "))
    }

    /// Log10 probability of `word` given `context` (oldest word first)
    fn word_log_prob(&self, context: &[&str], word: &str) -> f64 {
        let mut backoff = 0.0;

        for start in 0..=context.len() {
            let history = &context[start..];

            let mut ngram = history.to_vec();
            ngram.push(word);
            if let Some(entry) = self.lookup(&ngram) {
                return backoff + entry.log_prob;
            }

            if let Some(entry) = self.lookup(history) {
                backoff += entry.backoff;
            }
        }

        backoff + self.unk_log_prob
    }
}

impl LanguageModel for ArpaModel {
    fn score(&self, sentence: &str) -> f64 {
        let max_history = self.order().saturating_sub(1);
        let mut context: Vec<&str> = vec![BOS];
        let mut total = 0.0;

        for word in sentence.split_whitespace().chain(std::iter::once(EOS)) {
            let from = context.len().saturating_sub(max_history);
            total += self.word_log_prob(&context[from..], word);
            context.push(word);
        }

        total
    }
}

type ModelLoader = Box<dyn FnOnce() -> Result<Arc<dyn LanguageModel>> + Send>;

enum ModelState {
    Uninitialized(ModelLoader),
    Ready(Arc<dyn LanguageModel>),
    Failed(String),
}

/// A language model that is loaded on first use, at most once
///
/// A failed load is remembered: every later call reports the same error without
/// touching the file again.
pub struct ModelHandle {
    origin: PathBuf,
    state: ModelState,
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            ModelState::Uninitialized(_) => "Uninitialized",
            ModelState::Ready(_) => "Ready",
            ModelState::Failed(_) => "Failed",
        };
        f.debug_struct("ModelHandle")
            .field("origin", &self.origin)
            .field("state", &state)
            .finish()
    }
}

impl ModelHandle {
    /// Defer loading an ARPA model from `path` until first use
    #[must_use]
    pub fn lazy(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let load_path = path.clone();
        Self::with_loader(path, move || {
            let model: Arc<dyn LanguageModel> = Arc::new(ArpaModel::from_path(load_path)?);
            Ok(model)
        })
    }

    /// Defer loading through a custom loader; `origin` labels the model in errors
    #[must_use]
    pub fn with_loader<F>(origin: impl Into<PathBuf>, loader: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn LanguageModel>> + Send + 'static,
    {
        Self {
            origin: origin.into(),
            state: ModelState::Uninitialized(Box::new(loader)),
        }
    }

    /// Wrap an already loaded model, e.g. one shared read-only between scorers
    #[must_use]
    pub fn ready(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            origin: PathBuf::from("<in-memory>"),
            state: ModelState::Ready(model),
        }
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, ModelState::Ready(_))
    }

    /// Return the model, loading it if this is the first call
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelLoad`] if loading fails now or failed on an earlier call.
    pub fn get(&mut self) -> Result<Arc<dyn LanguageModel>> {
        let state = std::mem::replace(&mut self.state, ModelState::Failed(String::new()));

        let (state, result) = match state {
            ModelState::Ready(model) => (ModelState::Ready(model.clone()), Ok(model)),
            ModelState::Failed(reason) => {
                let err = Error::ModelLoad {
                    path: self.origin.clone(),
                    reason: reason.clone(),
                };
                (ModelState::Failed(reason), Err(err))
            }
            ModelState::Uninitialized(loader) => match loader() {
                Ok(model) => {
                    info!(origin = %self.origin.display(), "loaded language model");
                    (ModelState::Ready(model.clone()), Ok(model))
                }
                Err(e) => {
                    let reason = match e {
                        Error::ModelLoad { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    warn!(origin = %self.origin.display(), %reason, "language model failed to load");
                    let err = Error::ModelLoad {
                        path: self.origin.clone(),
                        reason: reason.clone(),
                    };
                    (ModelState::Failed(reason), Err(err))
                }
            },
        };

        self.state = state;
        result
    }
}
