//! Tokenization and part-of-speech tagging
//!
//! The detector only needs two distinctions from a tagger: noun tags (prefix `NN`) and
//! verb tags (prefix `V`). [`LexiconTagger`] provides those with a closed-class lexicon,
//! suffix rules and a couple of context rules, which is enough for quiz-clue prose.
//! Any other tagger can be plugged in through the [`Tagger`] trait.

use crate::types::TaggedToken;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\p{L}[\p{L}\p{N}]*(?:[-'’][\p{L}\p{N}]+)*|\p{N}+(?:[.,]\p{N}+)*|[^\s\p{L}\p{N}]")
        .expect("token pattern is valid")
});

const CLITICS: [&str; 6] = ["s", "re", "ve", "ll", "d", "m"];

/// Trait for part-of-speech taggers
pub trait Tagger: Send + Sync {
    /// Tokenize and tag `text`, preserving token order
    fn tag(&self, text: &str) -> Vec<TaggedToken>;
}

/// Split text into Treebank-style tokens
///
/// Punctuation marks become their own tokens and the clitics `'s`, `'re`, `'ve`, `'ll`,
/// `'d`, `'m` and `n't` are split from their host word.
///
/// # Examples
///
/// ```
/// use clue_mentions::tagger::word_tokenize;
///
/// assert_eq!(
///     word_tokenize("Gorbachev's arrest didn't last."),
///     vec!["Gorbachev", "'s", "arrest", "did", "n't", "last", "."]
/// );
/// ```
#[must_use]
pub fn word_tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();

    for m in TOKEN_RE.find_iter(text) {
        split_clitic(m.as_str(), &mut tokens);
    }

    tokens
}

fn split_clitic(word: &str, out: &mut Vec<String>) {
    let lower = word.to_lowercase();

    if lower.len() > 3 && lower.ends_with("n't") {
        let cut = word.len() - 3;
        out.push(word[..cut].to_string());
        out.push(word[cut..].to_string());
        return;
    }

    if let Some(pos) = word.rfind(['\'', '’']) {
        let clitic = word[pos..].to_lowercase();
        let rest = clitic.trim_start_matches(['\'', '’']);
        if pos > 0 && CLITICS.contains(&rest) {
            out.push(word[..pos].to_string());
            out.push(word[pos..].to_string());
            return;
        }
    }

    out.push(word.to_string());
}

fn is_punctuation(token: &str) -> bool {
    token.chars().all(|c| !c.is_alphanumeric())
}

const CLOSED_CLASS: &[(&str, &[&str])] = &[
    (
        "DT",
        &[
            "the", "a", "an", "this", "these", "those", "every", "each", "some", "any", "no",
            "another", "all", "both",
        ],
    ),
    ("WDT", &["that", "which"]),
    ("WP", &["who", "whom", "what"]),
    ("WP$", &["whose"]),
    ("WRB", &["where", "when", "how", "why"]),
    (
        "IN",
        &[
            "of", "in", "on", "at", "by", "for", "with", "from", "into", "about", "after",
            "before", "during", "under", "over", "between", "through", "against", "among",
            "without", "within", "as", "than", "since", "until", "upon", "while", "because",
            "although", "though", "if", "whether", "like", "near", "across", "around",
        ],
    ),
    ("TO", &["to"]),
    ("CC", &["and", "or", "but", "nor", "yet"]),
    (
        "PRP",
        &["he", "she", "it", "they", "we", "i", "you", "him", "them", "us", "me"],
    ),
    ("PRP$", &["his", "her", "its", "their", "our", "my", "your"]),
    (
        "MD",
        &["can", "could", "may", "might", "must", "shall", "should", "will", "would"],
    ),
    ("VBZ", &["is", "has", "does"]),
    ("VBP", &["are", "am", "have", "do"]),
    (
        "VBD",
        &[
            "was", "were", "had", "did", "spent", "wrote", "made", "became", "began", "came",
            "went", "saw", "took", "gave", "found", "led", "won", "told", "held", "fought",
            "brought", "built", "said", "sent", "left", "met", "lost", "ran", "kept", "thought",
            "fell", "rose", "drew", "sang", "stood", "struck", "taught", "knew", "grew", "bore",
        ],
    ),
    (
        "VBN",
        &[
            "been", "known", "written", "taken", "given", "seen", "done", "begun", "drawn",
            "born", "shown", "sung",
        ],
    ),
    ("VB", &["be"]),
    ("VBG", &["being"]),
    (
        "RB",
        &["not", "n't", "also", "very", "often", "later", "then", "once", "never", "still"],
    ),
    (
        "CD",
        &[
            "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
            "hundred", "thousand", "million",
        ],
    ),
    (
        "JJ",
        &["many", "few", "several", "other", "such", "own", "same", "first", "last", "new"],
    ),
    ("EX", &["there"]),
    ("POS", &["'s", "’s"]),
];

const ADJECTIVE_SUFFIXES: [&str; 7] = ["ous", "ful", "ive", "able", "ible", "ical", "less"];

/// Rule-based tagger backed by a closed-class lexicon and suffix heuristics
#[derive(Debug, Clone)]
pub struct LexiconTagger {
    lexicon: HashMap<String, String>,
}

impl Default for LexiconTagger {
    fn default() -> Self {
        let lexicon = CLOSED_CLASS
            .iter()
            .flat_map(|(tag, words)| words.iter().map(move |w| ((*w).to_string(), (*tag).to_string())))
            .collect();

        Self { lexicon }
    }
}

impl LexiconTagger {
    /// Create a tagger with the built-in lexicon
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or override a lexicon entry (the word is matched case-insensitively)
    #[must_use]
    pub fn with_entry(mut self, word: &str, tag: impl Into<String>) -> Self {
        self.lexicon.insert(word.to_lowercase(), tag.into());
        self
    }

    fn tag_token(&self, tokens: &[String], idx: usize, prev: Option<&TaggedToken>) -> String {
        let word = &tokens[idx];
        let lower = word.to_lowercase();

        if is_punctuation(word) {
            return word.clone();
        }
        if let Some(tag) = self.lexicon.get(&lower) {
            return tag.clone();
        }
        if word.chars().all(|c| c.is_numeric() || c == '.' || c == ',') {
            return "CD".to_string();
        }

        let plural = lower.len() > 2
            && lower.ends_with('s')
            && !lower.ends_with("ss")
            && !lower.ends_with("us")
            && !lower.ends_with("is");

        let sentence_initial =
            idx == 0 || prev.is_some_and(|p| matches!(p.surface.as_str(), "." | "!" | "?" | "\"" | "``"));
        if !sentence_initial && word.chars().next().is_some_and(char::is_uppercase) {
            return if plural { "NNPS" } else { "NNP" }.to_string();
        }

        if lower.len() > 5 && lower.ends_with("ing") {
            return "VBG".to_string();
        }
        if lower.len() > 4 && lower.ends_with("ed") {
            return "VBD".to_string();
        }
        if lower.len() > 4 && lower.ends_with("ly") {
            return "RB".to_string();
        }
        if lower.len() > 5 && ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            return "JJ".to_string();
        }

        if plural {
            // "character appears": a plural-looking word right after a noun reads as a verb
            if prev.is_some_and(TaggedToken::is_noun) {
                return "VBZ".to_string();
            }
            return "NNS".to_string();
        }

        "NN".to_string()
    }
}

impl Tagger for LexiconTagger {
    fn tag(&self, text: &str) -> Vec<TaggedToken> {
        let tokens = word_tokenize(text);
        let mut tagged: Vec<TaggedToken> = Vec::with_capacity(tokens.len());

        for idx in 0..tokens.len() {
            let tag = self.tag_token(&tokens, idx, tagged.last());
            tagged.push(TaggedToken::new(tokens[idx].clone(), tag));
        }

        tagged
    }
}
