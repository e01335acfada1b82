//! Referring expression generation
//!
//! For every possible answer we store the short phrases that could stand in for it in a
//! clue: each word of the title, the whole title, their plurals, and "the <title>". A
//! global count of how many times each phrase was generated across all answers lets the
//! scorer skip phrases that are too generic to discriminate between answers.

use crate::error::{Error, Result};
use std::collections::{BTreeSet, HashMap};
use tracing::info;

/// Separator between an answer title and its disambiguation suffix (`Mercury_(planet)`)
pub const DISAMBIGUATION_DELIMITER: &str = "_(";

/// Character that must never appear inside an expression
pub const SCORE_DELIMITER: char = ':';

/// Default frequency threshold for [`ReferringExpressions::referring_exs`]
pub const DEFAULT_MAX_COUNT: usize = 5;

/// Turns a singular noun phrase into its plural form
///
/// Implementations must be deterministic: the same input always yields the same output.
pub trait Pluralizer: Send + Sync {
    fn pluralize(&self, word: &str) -> String;
}

const IRREGULAR: &[(&str, &str)] = &[
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("person", "people"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("goose", "geese"),
    ("mouse", "mice"),
    ("louse", "lice"),
    ("ox", "oxen"),
    ("life", "lives"),
    ("wife", "wives"),
    ("knife", "knives"),
    ("leaf", "leaves"),
    ("wolf", "wolves"),
    ("half", "halves"),
    ("shelf", "shelves"),
    ("thief", "thieves"),
    ("hero", "heroes"),
    ("potato", "potatoes"),
    ("tomato", "tomatoes"),
    ("echo", "echoes"),
    ("veto", "vetoes"),
];

const UNINFLECTED: &[&str] = &["sheep", "fish", "deer", "series", "species", "aircraft", "moose"];

/// Regular-suffix English pluralization
///
/// Only the last word of a phrase is inflected, and the case of its first letter is kept.
///
/// # Examples
///
/// ```
/// use clue_mentions::refex::{EnglishPluralizer, Pluralizer};
///
/// let p = EnglishPluralizer;
/// assert_eq!(p.pluralize("Desdemona"), "Desdemonas");
/// assert_eq!(p.pluralize("Chromosome"), "Chromosomes");
/// assert_eq!(p.pluralize("church"), "churches");
/// assert_eq!(p.pluralize("Mikhail Gorbachev"), "Mikhail Gorbachevs");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishPluralizer;

impl EnglishPluralizer {
    fn pluralize_word(word: &str) -> String {
        let lower = word.to_lowercase();

        if UNINFLECTED.contains(&lower.as_str()) {
            return word.to_string();
        }
        if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == lower) {
            return match_first_case(word, plural);
        }

        let before_last = lower.chars().rev().nth(1);
        let consonant_before = before_last.is_some_and(|c| c.is_alphabetic() && !"aeiou".contains(c));

        if lower.ends_with("sis") {
            format!("{}es", &word[..word.len() - 2])
        } else if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
            format!("{word}es")
        } else if lower.ends_with('y') && consonant_before {
            format!("{}ies", &word[..word.len() - 1])
        } else {
            format!("{word}s")
        }
    }
}

fn match_first_case(original: &str, replacement: &str) -> String {
    if original.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = replacement.chars();
        chars
            .next()
            .map(|c| c.to_uppercase().chain(chars).collect())
            .unwrap_or_default()
    } else {
        replacement.to_string()
    }
}

impl Pluralizer for EnglishPluralizer {
    fn pluralize(&self, word: &str) -> String {
        match word.rsplit_once(' ') {
            Some((head, last)) => format!("{head} {}", Self::pluralize_word(last)),
            None if word.is_empty() => String::new(),
            None => Self::pluralize_word(word),
        }
    }
}

/// Candidate referring expressions per answer, with global generation counts
#[derive(Debug, Clone, Default)]
pub struct ReferringExpressions {
    lookup: HashMap<String, BTreeSet<String>>,
    counts: HashMap<String, usize>,
}

impl ReferringExpressions {
    /// Build the expression index for a closed set of answers
    ///
    /// Duplicate answers are ignored, so the result only depends on the set of answers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invariant`] if a generated expression contains `:`.
    pub fn generate<I, S>(answers: I, pluralizer: &dyn Pluralizer) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let answers: BTreeSet<String> = answers
            .into_iter()
            .map(|a| a.as_ref().to_string())
            .collect();

        let mut refexs = Self::default();

        for answer in &answers {
            let base = answer
                .split(DISAMBIGUATION_DELIMITER)
                .next()
                .unwrap_or(answer.as_str());

            for word in base.split_whitespace() {
                refexs.add(answer, word.to_lowercase())?;
                refexs.add(answer, pluralizer.pluralize(word).to_lowercase())?;
            }

            refexs.add(answer, base.to_lowercase())?;
            refexs.add(answer, pluralizer.pluralize(base).to_lowercase())?;

            refexs.add(answer, format!("the {}", base.to_lowercase()))?;
        }

        info!(
            answers = refexs.lookup.len(),
            expressions = refexs.counts.len(),
            "generated referring expressions"
        );

        Ok(refexs)
    }

    fn add(&mut self, answer: &str, expression: String) -> Result<()> {
        if expression.contains(SCORE_DELIMITER) {
            return Err(Error::Invariant(format!(
                "referring expression {expression:?} for {answer:?} contains '{SCORE_DELIMITER}'"
            )));
        }

        *self.counts.entry(expression.clone()).or_insert(0) += 1;
        self.lookup
            .entry(answer.to_string())
            .or_default()
            .insert(expression);
        Ok(())
    }

    /// Yield the expressions of `answer` whose global count is strictly below `max_count`
    ///
    /// `max_count` is a commonness threshold, not a limit on how many expressions are
    /// returned. Unknown answers yield nothing.
    pub fn referring_exs<'a>(
        &'a self,
        answer: &str,
        max_count: usize,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.lookup
            .get(answer)
            .into_iter()
            .flatten()
            .filter(move |expr| self.count(expr) < max_count)
            .map(String::as_str)
    }

    /// Every expression stored for `answer`, regardless of count
    #[must_use]
    pub fn expressions(&self, answer: &str) -> Option<&BTreeSet<String>> {
        self.lookup.get(answer)
    }

    /// How many times `expression` was generated across all answers
    #[must_use]
    pub fn count(&self, expression: &str) -> usize {
        self.counts.get(expression).copied().unwrap_or(0)
    }

    /// Number of answers indexed
    #[must_use]
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pluralizer that leaves words alone, to make counts easy to reason about
    struct Identity;

    impl Pluralizer for Identity {
        fn pluralize(&self, word: &str) -> String {
            word.to_string()
        }
    }

    #[test]
    fn test_pluralize_rules() {
        let p = EnglishPluralizer;
        assert_eq!(p.pluralize("structure"), "structures");
        assert_eq!(p.pluralize("box"), "boxes");
        assert_eq!(p.pluralize("Bush"), "Bushes");
        assert_eq!(p.pluralize("city"), "cities");
        assert_eq!(p.pluralize("day"), "days");
        assert_eq!(p.pluralize("crisis"), "crises");
        assert_eq!(p.pluralize("Woman"), "Women");
        assert_eq!(p.pluralize("sheep"), "sheep");
        assert_eq!(p.pluralize(""), "");
    }

    #[test]
    fn test_pluralize_is_deterministic() {
        let p = EnglishPluralizer;
        assert_eq!(p.pluralize("De Stijl"), p.pluralize("De Stijl"));
        assert_eq!(p.pluralize("De Stijl"), "De Stijls");
    }

    #[test]
    fn test_desdemona_candidates() {
        let refexs = ReferringExpressions::generate(["Desdemona"], &EnglishPluralizer).unwrap();
        let exprs = refexs.expressions("Desdemona").unwrap();

        assert!(exprs.contains("desdemona"));
        assert!(exprs.contains("desdemonas"));
        assert!(exprs.contains("the desdemona"));
        assert_eq!(exprs.len(), 3);
    }

    #[test]
    fn test_disambiguation_suffix_stripped() {
        let refexs =
            ReferringExpressions::generate(["Mercury_(planet)"], &EnglishPluralizer).unwrap();
        let exprs = refexs.expressions("Mercury_(planet)").unwrap();

        assert!(exprs.contains("mercury"));
        assert!(exprs.contains("the mercury"));
        assert!(!exprs.iter().any(|e| e.contains("planet")));
    }

    #[test]
    fn test_counts_are_global() {
        let refexs = ReferringExpressions::generate(
            ["Abraham Lincoln", "Lincoln Memorial", "Mary Todd Lincoln"],
            &Identity,
        )
        .unwrap();

        // word and plural form for each of the three answers
        assert_eq!(refexs.count("lincoln"), 6);
        assert_eq!(refexs.count("abraham"), 2);
        assert_eq!(refexs.count("the lincoln memorial"), 1);
        assert_eq!(refexs.count("unknown"), 0);
    }

    #[test]
    fn test_threshold_filters_common_expressions() {
        let refexs = ReferringExpressions::generate(
            ["Abraham Lincoln", "Lincoln Memorial", "Mary Todd Lincoln"],
            &Identity,
        )
        .unwrap();

        let yielded: Vec<&str> = refexs.referring_exs("Abraham Lincoln", 5).collect();
        assert!(!yielded.contains(&"lincoln"));
        assert!(yielded.contains(&"abraham"));

        for expr in &yielded {
            assert!(refexs.count(expr) < 5);
            assert!(refexs.expressions("Abraham Lincoln").unwrap().contains(*expr));
        }
    }

    #[test]
    fn test_threshold_is_not_a_result_limit() {
        let refexs =
            ReferringExpressions::generate(["One Two Three Four Five Six"], &Identity).unwrap();

        let yielded = refexs.referring_exs("One Two Three Four Five Six", 3).count();
        assert_eq!(yielded, 8);
    }

    #[test]
    fn test_unknown_answer_yields_nothing() {
        let refexs = ReferringExpressions::generate(["Desdemona"], &EnglishPluralizer).unwrap();
        assert_eq!(refexs.referring_exs("Othello", 5).count(), 0);
    }

    #[test]
    fn test_generation_is_idempotent() {
        let answers = vec!["De Stijl", "Chromosome", "De Stijl"];
        let first = ReferringExpressions::generate(&answers, &EnglishPluralizer).unwrap();
        let second = ReferringExpressions::generate(&answers, &EnglishPluralizer).unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first.expressions("De Stijl"), second.expressions("De Stijl"));
        assert_eq!(first.count("the de stijl"), 1);
    }

    #[test]
    fn test_delimiter_rejected() {
        let result = ReferringExpressions::generate(["Star Trek: Voyager"], &EnglishPluralizer);
        assert!(matches!(result, Err(Error::Invariant(_))));
    }
}
