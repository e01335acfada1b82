//! U.S. state names treated as non-closing tokens by the reference detector
//!
//! The list is a versioned data asset (`data/us_states.txt`), not logic. The built-in copy
//! is parsed once per process; a different version can be loaded from disk and handed to
//! the detector instead.

use crate::error::Result;
use cached::proc_macro::once;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

const BUILTIN_STATE_LINES: &str = include_str!("../data/us_states.txt");
const VERSION_PREFIX: &str = "# version:";

/// A set of lowercased state names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateLexicon {
    version: Option<String>,
    names: HashSet<String>,
}

impl StateLexicon {
    /// Parse a lexicon from its line format
    ///
    /// Blank lines and `#` comments are skipped, except a `# version: ...` header which
    /// sets [`StateLexicon::version`]. Multiword lemmas are ignored, except `New X`
    /// which registers `X`. Lemmas of two characters or fewer (postal codes) are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use clue_mentions::lexicon::StateLexicon;
    ///
    /// let lexicon = StateLexicon::from_lines("# version: test\nOhio\nNew York\nNorth Dakota\nOH\n");
    /// assert!(lexicon.contains("ohio"));
    /// assert!(lexicon.contains("York"));
    /// assert!(!lexicon.contains("Dakota"));
    /// assert!(!lexicon.contains("OH"));
    /// assert_eq!(lexicon.version(), Some("test"));
    /// ```
    #[must_use]
    pub fn from_lines(source: &str) -> Self {
        let mut lexicon = Self::default();

        for line in source.lines().map(str::trim) {
            if let Some(version) = line.strip_prefix(VERSION_PREFIX) {
                lexicon.version = Some(version.trim().to_string());
                continue;
            }
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let name = line.replace('_', " ");
            if let Some(rest) = name.strip_prefix("New ") {
                lexicon.names.insert(rest.to_lowercase());
            } else if name.chars().count() > 2 && !name.contains(' ') {
                lexicon.names.insert(name.to_lowercase());
            }
        }

        lexicon
    }

    /// Load a lexicon file from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::from_lines(&source))
    }

    /// The lexicon shipped with the crate, parsed once per process
    #[must_use]
    pub fn builtin() -> Arc<Self> {
        builtin_states()
    }

    /// Whether `token` (compared case-insensitively) is a state name
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.names.contains(&token.to_lowercase())
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[once]
fn builtin_states() -> Arc<StateLexicon> {
    Arc::new(StateLexicon::from_lines(BUILTIN_STATE_LINES))
}
