//! Reference span detection
//!
//! Quiz clues refer to their answer with demonstratives: "This leader spent three days in
//! house arrest", "Calvin Bridges sketched these structures". The detector finds those
//! spans with a single left-to-right scan over tagged tokens:
//!
//! - `this`/`these` opens a span (replacing any span still open)
//! - punctuation and U.S. state names are skipped
//! - a noun ending a maximal noun run closes the open span
//! - a verb seen before such a noun abandons the open span
//!
//! A synthetic verb is appended to the tagged sequence so nothing stays open at the end.

use crate::lexicon::StateLexicon;
use crate::normalize::normalize_token;
use crate::tagger::Tagger;
use crate::types::{ReferenceSpan, TaggedToken};
use std::sync::Arc;
use tracing::debug;

/// Surface form of the synthetic terminal token
pub const END_TOKEN: &str = "END";

/// Tag of the synthetic terminal token
pub const END_TAG: &str = "V";

/// Default number of context tokens kept on each side of a mention
pub const DEFAULT_PADDING: usize = 5;

/// Scanner state: either no demonstrative is pending or one opened at the given index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanState {
    Closed,
    Open(usize),
}

fn is_demonstrative(word: &str) -> bool {
    word.eq_ignore_ascii_case("this") || word.eq_ignore_ascii_case("these")
}

fn is_punctuation(word: &str) -> bool {
    word.chars().all(|c| c.is_ascii_punctuation())
}

/// Finds demonstrative reference spans in text
pub struct ReferenceDetector {
    tagger: Box<dyn Tagger>,
    states: Arc<StateLexicon>,
}

impl std::fmt::Debug for ReferenceDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceDetector")
            .field("tagger", &"Tagger")
            .field("states", &self.states.version())
            .finish()
    }
}

impl ReferenceDetector {
    /// Create a detector using the built-in state lexicon
    #[must_use]
    pub fn new(tagger: impl Tagger + 'static) -> Self {
        Self {
            tagger: Box::new(tagger),
            states: StateLexicon::builtin(),
        }
    }

    /// Replace the state-name exception list
    #[must_use]
    pub fn with_states(mut self, states: Arc<StateLexicon>) -> Self {
        self.states = states;
        self
    }

    /// Tag `text` and append the synthetic terminal verb
    #[must_use]
    pub fn tag(&self, text: &str) -> Vec<TaggedToken> {
        let mut tags = self.tagger.tag(text);
        tags.push(TaggedToken::new(END_TOKEN, END_TAG));
        tags
    }

    /// Return the `(start, stop)` index pairs of every span in a tagged sequence
    ///
    /// `stop` is inclusive. Spans come out in order and never overlap.
    #[must_use]
    pub fn find_spans(&self, tags: &[TaggedToken]) -> Vec<(usize, usize)> {
        let mut found = Vec::new();
        let mut state = SpanState::Closed;

        for (idx, token) in tags.iter().enumerate() {
            if is_demonstrative(&token.surface) {
                state = SpanState::Open(idx);
                continue;
            }
            if is_punctuation(&token.surface) || self.states.contains(&token.surface) {
                continue;
            }

            let ends_noun_run =
                token.is_noun() && !tags.get(idx + 1).is_some_and(TaggedToken::is_noun);

            state = match state {
                SpanState::Open(start) if ends_noun_run => {
                    found.push((start, idx));
                    SpanState::Closed
                }
                _ if token.is_verb() => SpanState::Closed,
                unchanged => unchanged,
            };
        }

        found
    }

    /// Detect reference spans in `text`, keeping `padding` context tokens on each side
    ///
    /// Tokens are normalized with [`normalize_token`]; tokens that normalize to nothing
    /// (punctuation) are dropped. The synthetic terminal token never appears in a span.
    pub fn detect(&self, text: &str, padding: usize) -> impl Iterator<Item = ReferenceSpan> {
        let tags = self.tag(text);
        let spans = self.find_spans(&tags);
        debug!(spans = spans.len(), tokens = tags.len() - 1, "detected reference spans");

        let words: Vec<String> = tags[..tags.len() - 1]
            .iter()
            .map(|t| normalize_token(&t.surface))
            .collect();

        spans.into_iter().map(move |(start, stop)| {
            let window = |from: usize, to: usize| -> Vec<String> {
                words[from..to.min(words.len())]
                    .iter()
                    .filter(|w| !w.is_empty())
                    .cloned()
                    .collect()
            };

            ReferenceSpan {
                start,
                stop,
                prefix: window(start.saturating_sub(padding), start),
                mention: window(start, stop + 1),
                suffix: window(stop + 1, stop + 1 + padding),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagger::LexiconTagger;

    /// Tagger that ignores its input and returns a fixed sequence
    struct FixedTagger(Vec<TaggedToken>);

    impl FixedTagger {
        fn new(pairs: &[(&str, &str)]) -> Self {
            Self(pairs.iter().map(|(w, t)| TaggedToken::new(*w, *t)).collect())
        }
    }

    impl Tagger for FixedTagger {
        fn tag(&self, _text: &str) -> Vec<TaggedToken> {
            self.0.clone()
        }
    }

    fn detector(pairs: &[(&str, &str)]) -> ReferenceDetector {
        ReferenceDetector::new(FixedTagger::new(pairs))
    }

    #[test]
    fn test_no_demonstrative() {
        let d = ReferenceDetector::new(LexiconTagger::new());
        let spans: Vec<_> = d
            .detect("Calvin Bridges sketched a specific type of chromosome.", 5)
            .collect();
        assert!(spans.is_empty());
    }

    #[test]
    fn test_character_example() {
        let d = detector(&[
            ("This", "DT"),
            ("character", "NN"),
            ("appears", "VBZ"),
            ("in", "IN"),
            ("many", "JJ"),
            ("plays", "NNS"),
            (".", "."),
        ]);

        let spans: Vec<_> = d.detect("ignored", 5).collect();
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start, spans[0].stop), (0, 1));
        assert!(spans[0].prefix.is_empty());
        assert_eq!(spans[0].mention, vec!["this", "character"]);
        assert_eq!(spans[0].suffix, vec!["appears", "in", "many", "plays"]);
    }

    #[test]
    fn test_prefix_padding() {
        let d = detector(&[
            ("A", "DT"),
            ("2011", "CD"),
            ("play", "NN"),
            ("about", "IN"),
            ("this", "DT"),
            ("character", "NN"),
            ("was", "VBD"),
        ]);

        let spans: Vec<_> = d.detect("ignored", 2).collect();
        assert_eq!(spans[0].prefix, vec!["play", "about"]);
        assert_eq!(spans[0].suffix, vec!["was"]);
    }

    #[test]
    fn test_noun_run_extends_mention() {
        let d = detector(&[
            ("this", "DT"),
            ("house", "NN"),
            ("arrest", "NN"),
            ("ended", "VBD"),
        ]);

        let spans = d.find_spans(&d.tag("ignored"));
        assert_eq!(spans, vec![(0, 2)]);
    }

    #[test]
    fn test_verb_abandons_open_span() {
        let d = detector(&[
            ("in", "IN"),
            ("this", "DT"),
            ("he", "PRP"),
            ("argued", "VBD"),
            ("that", "WDT"),
            ("poems", "NNS"),
            ("matter", "VBP"),
        ]);

        assert!(d.find_spans(&d.tag("ignored")).is_empty());
    }

    #[test]
    fn test_last_demonstrative_wins() {
        let d = detector(&[
            ("this", "DT"),
            ("and", "CC"),
            ("these", "DT"),
            ("structures", "NNS"),
            ("contain", "VBP"),
        ]);

        assert_eq!(d.find_spans(&d.tag("ignored")), vec![(2, 3)]);
    }

    #[test]
    fn test_state_names_do_not_close() {
        let d = detector(&[
            ("this", "DT"),
            ("Ohio", "NNP"),
            (",", ","),
            ("a", "DT"),
            ("governor", "NN"),
            ("won", "VBD"),
        ]);

        assert_eq!(d.find_spans(&d.tag("ignored")), vec![(0, 4)]);
    }

    #[test]
    fn test_custom_states() {
        let d = detector(&[
            ("this", "DT"),
            ("Ohio", "NNP"),
            (",", ","),
            ("a", "DT"),
            ("governor", "NN"),
        ])
        .with_states(Arc::new(StateLexicon::default()));

        assert_eq!(d.find_spans(&d.tag("ignored")), vec![(0, 1)]);
    }

    #[test]
    fn test_open_span_closed_by_terminal() {
        let d = detector(&[("these", "DT"), ("structures", "NNS")]);
        let spans: Vec<_> = d.detect("ignored", 5).collect();

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].mention, vec!["these", "structures"]);
        assert!(spans[0].suffix.is_empty());
    }

    #[test]
    fn test_pending_demonstrative_without_noun() {
        let d = detector(&[("about", "IN"), ("this", "DT")]);
        assert!(d.find_spans(&d.tag("ignored")).is_empty());
    }

    #[test]
    fn test_punctuation_dropped_from_windows() {
        let d = detector(&[
            ("Traore", "NNP"),
            (",", ","),
            ("this", "DT"),
            ("group", "NN"),
            ("is", "VBZ"),
        ]);

        let spans: Vec<_> = d.detect("ignored", 5).collect();
        assert_eq!(spans[0].prefix, vec!["traore"]);
        assert_eq!(spans[0].mention_text(), "this group");
        assert_eq!(spans[0].suffix_text(), "is");
    }

    #[test]
    fn test_inner_hyphens_and_apostrophes_kept() {
        let d = detector(&[
            ("Eugene", "NNP"),
            ("O'Neill", "NNP"),
            ("admired", "VBD"),
            ("this", "DT"),
            ("twentieth-century", "JJ"),
            ("poet", "NN"),
            ("greatly", "RB"),
            (".", "."),
        ]);

        let spans: Vec<_> = d.detect("ignored", 5).collect();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].prefix_text(), "eugene o'neill admired");
        assert_eq!(spans[0].mention_text(), "this twentieth-century poet");
        assert_eq!(spans[0].suffix_text(), "greatly");
    }

    #[test]
    fn test_spans_ordered_and_disjoint() {
        let d = ReferenceDetector::new(LexiconTagger::new());
        let texts = [
            "This group is represented by a dove in the Book of the Three Birds, written by a \
             Welsh member of this group named Morgan Llwyd. A member of this religious group \
             adopted the pseudonym 'Martin Marprelate' to pen a series of attacks against authorities.",
            "This leader spent three days in house arrest during an event masterminded by the 'Gang of Eight.'",
            "The founder of this movement was inspired to develop its style by the stained glass \
             windows he made for the De Lange House.",
        ];

        for text in texts {
            let spans: Vec<_> = d.detect(text, 5).collect();
            assert!(!spans.is_empty(), "no span in {text}");

            let mut last_stop = None;
            for span in &spans {
                assert!(span.stop >= span.start);
                if let Some(prev) = last_stop {
                    assert!(span.start > prev);
                }
                last_stop = Some(span.stop);
            }
        }
    }

    #[test]
    fn test_demo_clues_with_lexicon_tagger() {
        let d = ReferenceDetector::new(LexiconTagger::new());

        let mentions: Vec<String> = d
            .detect(
                "A member of this religious group adopted the pseudonym 'Martin Marprelate'.",
                5,
            )
            .map(|s| s.mention_text())
            .collect();
        assert_eq!(mentions, vec!["this religious group"]);

        let mentions: Vec<String> = d
            .detect(
                "Calvin Bridges sketched a specific type of these structures that contain diffuse regions.",
                5,
            )
            .map(|s| s.mention_text())
            .collect();
        assert_eq!(mentions, vec!["these structures"]);
    }
}
