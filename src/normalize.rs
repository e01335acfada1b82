//! Text normalization for titles, span tokens and language-model queries
//!
//! All normalization goes through the `slug` crate, which transliterates Unicode to ASCII
//! (stripping diacritics) and lowercases before splitting on anything non-alphanumeric.
//! Span tokens keep their internal hyphens and apostrophes so mention annotations read
//! `this_twentieth-century_poet`; the language model only ever sees [`lm_tokenize`] output.

use slug::slugify;

/// Normalize a title or token into a key-safe form
///
/// Transliterates to ASCII, lowercases and keeps only alphanumeric characters. The result
/// never contains whitespace or punctuation, so it is safe to join with `~`, `_` or `:`.
/// Pure punctuation normalizes to the empty string.
///
/// # Examples
///
/// ```
/// use clue_mentions::normalize::normalize_title;
///
/// assert_eq!(normalize_title("Desdemona"), "desdemona");
/// assert_eq!(normalize_title("José García"), "josegarcia");
/// assert_eq!(normalize_title("Gorbachev's"), "gorbachevs");
/// assert_eq!(normalize_title("."), "");
/// ```
#[must_use]
pub fn normalize_title(title: &str) -> String {
    slugify(title).replace('-', "")
}

/// Normalize one span token
///
/// Transliterates to lowercase ASCII like [`normalize_title`] but keeps hyphens and
/// apostrophes inside the token. Leading and trailing ones are trimmed, and pure
/// punctuation normalizes to the empty string.
///
/// # Examples
///
/// ```
/// use clue_mentions::normalize::normalize_token;
///
/// assert_eq!(normalize_token("O'Neill"), "o'neill");
/// assert_eq!(normalize_token("twentieth-century"), "twentieth-century");
/// assert_eq!(normalize_token("Traoré"), "traore");
/// assert_eq!(normalize_token("'s"), "s");
/// assert_eq!(normalize_token("--"), "");
/// ```
#[must_use]
pub fn normalize_token(token: &str) -> String {
    let folded: String = token
        .chars()
        .map(|c| match c {
            '-' | '\'' => c.to_string(),
            '’' => "'".to_string(),
            c if c.is_ascii_alphanumeric() => c.to_ascii_lowercase().to_string(),
            c => slugify(c.to_string()).replace('-', ""),
        })
        .collect();

    folded.trim_matches(['-', '\'']).to_string()
}

/// Split text into the tokens the language model was trained on
///
/// Lowercased ASCII alphanumeric runs; everything else separates tokens.
///
/// # Examples
///
/// ```
/// use clue_mentions::normalize::lm_tokenize;
///
/// assert_eq!(lm_tokenize("The De Stijl"), vec!["the", "de", "stijl"]);
/// assert_eq!(lm_tokenize("gang of eight.'"), vec!["gang", "of", "eight"]);
/// ```
#[must_use]
pub fn lm_tokenize(text: &str) -> Vec<String> {
    slugify(text)
        .split('-')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Replace every space with an underscore
#[must_use]
pub fn underscore_spaces(text: &str) -> String {
    text.replace(' ', "_")
}
