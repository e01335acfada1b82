//! Integration tests for mention detection and scoring

use clue_mentions::{
    ArpaModel, EnglishPluralizer, Error, LanguageModel, LexiconTagger, MentionConfig,
    MentionScorer, ModelHandle, ReferenceDetector, ReferringExpressions,
};
use serde::Deserialize;
use std::fs;
use std::sync::Arc;

const MODEL_PATH: &str = "tests/fixtures/tiny.arpa";
const CLUES_PATH: &str = "tests/fixtures/clues.json";

#[derive(Debug, Deserialize)]
struct TestCase {
    id: String,
    text: String,
    answer: String,
    expected_mentions: Vec<String>,
}

#[derive(Debug)]
struct EvaluationMetrics {
    precision: f64,
    recall: f64,
    true_positives: usize,
}

impl EvaluationMetrics {
    /// Multiset overlap between predicted and expected mention phrases
    fn new(predicted: &[String], expected: &[String]) -> Self {
        let mut remaining = expected.to_vec();
        let mut true_positives = 0;
        for mention in predicted {
            if let Some(pos) = remaining.iter().position(|e| e == mention) {
                remaining.swap_remove(pos);
                true_positives += 1;
            }
        }

        let precision = if predicted.is_empty() {
            1.0
        } else {
            true_positives as f64 / predicted.len() as f64
        };
        let recall = if expected.is_empty() {
            1.0
        } else {
            true_positives as f64 / expected.len() as f64
        };

        Self {
            precision,
            recall,
            true_positives,
        }
    }
}

fn load_cases() -> Vec<TestCase> {
    let contents = fs::read_to_string(CLUES_PATH).expect("Failed to read test fixtures");
    serde_json::from_str(&contents).expect("Failed to parse test fixtures")
}

fn answers(cases: &[TestCase]) -> Vec<String> {
    cases.iter().map(|c| c.answer.clone()).collect()
}

fn scorer_for(cases: &[TestCase]) -> MentionScorer {
    let refexs = ReferringExpressions::generate(answers(cases), &EnglishPluralizer).unwrap();
    MentionScorer::new(
        MentionConfig::default().with_lm_path(MODEL_PATH),
        ReferenceDetector::new(LexiconTagger::new()),
        refexs,
    )
    .unwrap()
}

#[test]
fn test_fixture_loads() {
    let cases = load_cases();
    assert_eq!(cases.len(), 6);
    assert!(cases.iter().any(|c| c.expected_mentions.is_empty()));
}

#[test]
fn test_mention_detection_on_fixtures() {
    let detector = ReferenceDetector::new(LexiconTagger::new());

    for case in load_cases() {
        let predicted: Vec<String> = detector
            .detect(&case.text, 5)
            .map(|span| span.mention_text())
            .collect();
        let metrics = EvaluationMetrics::new(&predicted, &case.expected_mentions);

        assert_eq!(
            metrics.true_positives,
            case.expected_mentions.len(),
            "{}: predicted {predicted:?}",
            case.id
        );
        assert!(
            (metrics.precision - 1.0).abs() < f64::EPSILON,
            "{}: precision {:.2}",
            case.id,
            metrics.precision
        );
        assert!((metrics.recall - 1.0).abs() < f64::EPSILON);
    }
}

#[test]
fn test_end_to_end_scoring() {
    let cases = load_cases();
    let mut scorer = scorer_for(&cases);
    let clue = &cases[0].text;

    let desdemona = scorer.score("Desdemona", clue).unwrap();
    assert_eq!(
        desdemona.to_string(),
        "|mentions score:-1.090000 desdemona~this_character"
    );

    let chromosome = scorer.score("Chromosome", clue).unwrap();
    assert_eq!(
        chromosome.to_string(),
        "|mentions score:-1.518182 chromosome~this_character"
    );

    // all answers scored against the same clue share one span computation
    assert_eq!(scorer.span_computations(), 1);
}

#[test]
fn test_every_answer_gets_a_record() {
    let cases = load_cases();
    let mut scorer = scorer_for(&cases);

    for case in &cases {
        for answer in answers(&cases) {
            let record = scorer.score(&answer, &case.text).unwrap();
            let rendered = record.to_string();

            assert!(rendered.starts_with("|mentions "));
            assert_eq!(record.annotations.len(), case.expected_mentions.len());
            if case.expected_mentions.is_empty() {
                assert_eq!(rendered, "|mentions missing:1");
            }
            for annotation in &record.annotations {
                assert!(!annotation.contains(' '));
                assert!(!annotation.contains(':'));
                assert_eq!(annotation.matches('~').count(), 1);
            }
        }
    }
}

#[test]
fn test_hyphenated_mention_annotation() {
    let refexs =
        ReferringExpressions::generate(["O'Neill", "Desdemona"], &EnglishPluralizer).unwrap();
    let mut scorer = MentionScorer::new(
        MentionConfig::default().with_lm_path(MODEL_PATH),
        ReferenceDetector::new(LexiconTagger::new()),
        refexs,
    )
    .unwrap();

    let record = scorer
        .score("O'Neill", "Eugene O'Neill admired this twentieth-century poet greatly.")
        .unwrap();

    assert!(!record.is_missing());
    assert_eq!(scorer.cached_mentions()[0].prefix, "eugene o'neill admired");
    assert_eq!(record.annotations, vec!["oneill~this_twentieth-century_poet"]);
}

#[test]
fn test_missing_model_file() {
    let dir = tempfile::tempdir().unwrap();
    let cases = load_cases();
    let refexs = ReferringExpressions::generate(answers(&cases), &EnglishPluralizer).unwrap();
    let mut scorer = MentionScorer::new(
        MentionConfig::default().with_lm_path(dir.path().join("kenlm.arpa")),
        ReferenceDetector::new(LexiconTagger::new()),
        refexs,
    )
    .unwrap();

    let err = scorer.score("Desdemona", &cases[0].text).unwrap_err();
    assert!(matches!(err, Error::ModelLoad { .. }));
    assert!(err.to_string().contains("kenlm.arpa"));
}

#[test]
fn test_shared_model_across_workers() -> anyhow::Result<()> {
    let cases = load_cases();
    let model: Arc<dyn LanguageModel> = Arc::new(ArpaModel::from_path(MODEL_PATH)?);

    let handles: Vec<_> = ["Desdemona", "Chromosome"]
        .into_iter()
        .map(|answer| {
            let model = Arc::clone(&model);
            let names = answers(&cases);
            let clue = cases[0].text.clone();
            std::thread::spawn(move || -> clue_mentions::Result<String> {
                let refexs = ReferringExpressions::generate(names, &EnglishPluralizer)?;
                let mut scorer = MentionScorer::with_model(
                    MentionConfig::default(),
                    ReferenceDetector::new(LexiconTagger::new()),
                    refexs,
                    ModelHandle::ready(model),
                )?;
                Ok(scorer.score(answer, &clue)?.to_string())
            })
        })
        .collect();

    let mut outputs = Vec::new();
    for handle in handles {
        outputs.push(handle.join().expect("worker panicked")?);
    }

    assert!(outputs[0].starts_with("|mentions score:-1.090000"));
    assert!(outputs[1].starts_with("|mentions score:-1.518182"));
    Ok(())
}
