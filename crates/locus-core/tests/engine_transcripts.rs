//! # Engine Transcript Corpus
//!
//! Recorded console output of the recognition engine, one file per case
//! under `tests/fixtures/engine/`. Each transcript pins a piece of the
//! report grammar (version 1).

use locus_core::engine_output::{self, GRAMMAR_VERSION, MatchSource};
use locus_core::FrameId;

struct Transcript {
    name: &'static str,
    text: &'static str,
    source: MatchSource,
    candidate: Option<(i64, f64)>,
    collected: usize,
}

const CORPUS: &[Transcript] = &[
    Transcript {
        name: "localized_loop",
        text: include_str!("fixtures/engine/localized_loop.txt"),
        source: MatchSource::Iteration,
        candidate: Some((95, 0.031)),
        collected: 1,
    },
    Transcript {
        name: "localized_high",
        text: include_str!("fixtures/engine/localized_high.txt"),
        source: MatchSource::Iteration,
        candidate: Some((133, 0.412)),
        collected: 2,
    },
    Transcript {
        name: "weak_hypothesis",
        text: include_str!("fixtures/engine/weak_hypothesis.txt"),
        source: MatchSource::Iteration,
        candidate: None,
        collected: 1,
    },
    Transcript {
        name: "fallback_hypothesis",
        text: include_str!("fixtures/engine/fallback_hypothesis.txt"),
        source: MatchSource::Fallback,
        candidate: Some((17, 0.064)),
        collected: 1,
    },
    Transcript {
        name: "database_locked",
        text: include_str!("fixtures/engine/database_locked.txt"),
        source: MatchSource::Empty,
        candidate: None,
        collected: 0,
    },
    Transcript {
        name: "truncated_report",
        text: include_str!("fixtures/engine/truncated_report.txt"),
        source: MatchSource::Empty,
        candidate: None,
        collected: 0,
    },
];

#[test]
fn grammar_version_is_pinned() {
    assert_eq!(GRAMMAR_VERSION, 1);
}

#[test]
fn corpus_parses_as_recorded() {
    for case in CORPUS {
        let report = engine_output::parse(case.text);

        assert_eq!(report.source, case.source, "{}: source", case.name);
        assert_eq!(report.matches.len(), case.collected, "{}: collected", case.name);
        match case.candidate {
            Some((id, score)) => {
                assert!(report.candidate.is_some(), "{}: expected a candidate", case.name);
                let c = report.candidate.expect("candidate");
                assert_eq!(c.frame_id, FrameId(id), "{}: frame", case.name);
                assert!((c.score - score).abs() < 1e-12, "{}: score", case.name);
            }
            None => assert!(report.is_no_match(), "{}: expected no match", case.name),
        }
    }
}

#[test]
fn no_match_keeps_diagnostics() {
    let text = include_str!("fixtures/engine/weak_hypothesis.txt");
    let report = engine_output::parse(text);
    assert!(report.is_no_match());
    assert_eq!(report.describe_best(), "frame 42 hyp 0.003");
}

#[test]
fn ansi_never_reaches_the_grammar() {
    let text = include_str!("fixtures/engine/localized_loop.txt");
    assert!(text.contains('\u{1b}'));
    assert!(!engine_output::strip_ansi(text).contains('\u{1b}'));
}

#[test]
fn stdout_then_stderr_concatenation() {
    // The coordinator appends stderr after stdout; a report split across
    // the two streams still parses.
    let stdout = "iteration(1) loop(61)";
    let stderr = " hyp(0.25) time=0.2s";
    let report = engine_output::parse(&format!("{stdout}{stderr}"));
    assert_eq!(report.candidate.map(|c| c.frame_id), Some(FrameId(61)));
}
