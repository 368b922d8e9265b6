//! # Recognition Engine Report Parser
//!
//! The recognition engine has no structured output. Its console log is the
//! protocol, so the grammar accepted here is versioned and pinned by the
//! transcript corpus in `tests/fixtures/engine/`.
//!
//! ## Grammar (version 1)
//!
//! After ANSI escape sequences are removed:
//!
//! ```text
//! report    := iteration (any)* id (any)* score
//! iteration := "iteration(" DIGITS ")"
//! id        := ("loop(" | "high(") DIGITS ")"
//! score     := "hyp(" [0-9.]+ ")"
//! ```
//!
//! Reports are collected left to right without overlap. When none are
//! found the fallback pairs the first `loop(ID)` with the first
//! `hyp(SCORE)` / `hypothesis=SCORE` anywhere in the text.

use crate::primitives::HYPOTHESIS_THRESHOLD;
use crate::types::FrameId;
use serde::{Deserialize, Serialize};

/// Version of the accepted report grammar.
pub const GRAMMAR_VERSION: u32 = 1;

// =============================================================================
// RESULT TYPES
// =============================================================================

/// One (frame, score) pair reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HypothesisMatch {
    pub frame_id: FrameId,
    pub score: f64,
}

/// Which rule produced the collected matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Iteration,
    Fallback,
    Empty,
}

/// Outcome of parsing one engine transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedReport {
    /// Accepted candidate, if the first match clears the threshold.
    pub candidate: Option<HypothesisMatch>,
    /// Every match collected, in order of appearance.
    pub matches: Vec<HypothesisMatch>,
    pub source: MatchSource,
}

impl ParsedReport {
    /// `true` when no candidate was accepted.
    #[must_use]
    pub const fn is_no_match(&self) -> bool {
        self.candidate.is_none()
    }

    /// Short description of the strongest evidence, for logs and errors.
    #[must_use]
    pub fn describe_best(&self) -> String {
        match self.matches.first() {
            Some(m) => format!("frame {} hyp {}", m.frame_id, m.score),
            None => "no hypothesis reported".to_string(),
        }
    }
}

// =============================================================================
// PARSER
// =============================================================================

/// Parse raw engine output (stdout and stderr combined).
pub fn parse(raw: &str) -> ParsedReport {
    let text = strip_ansi(raw);

    let mut matches = scan_iterations(&text);
    let mut source = MatchSource::Iteration;

    if matches.is_empty() {
        source = MatchSource::Fallback;
        let id = first_loop_id(&text);
        let score = first_score(&text);
        if let (Some(frame_id), Some(score)) = (id, score) {
            matches.push(HypothesisMatch { frame_id, score });
        }
    }

    if matches.is_empty() {
        source = MatchSource::Empty;
    }

    let candidate = matches
        .first()
        .copied()
        .filter(|m| m.score >= HYPOTHESIS_THRESHOLD);

    ParsedReport {
        candidate,
        matches,
        source,
    }
}

/// Remove CSI escape sequences (`ESC [ params letter`).
pub fn strip_ansi(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('\u{1b}') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        match csi_len(after) {
            Some(len) => rest = &after[len..],
            None => {
                out.push('\u{1b}');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Length of `[params letter` at the start of `s`, if it is a CSI body.
fn csi_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'[') {
        return None;
    }
    let mut i = 1;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b';') {
        i += 1;
    }
    match bytes.get(i) {
        Some(b) if b.is_ascii_alphabetic() => Some(i + 1),
        _ => None,
    }
}

// =============================================================================
// TOKEN SCANNING
// =============================================================================

/// Match `prefix` followed by a run of chars accepted by `accept` and `)`.
/// Returns the run and the byte offset just past `)`.
fn token_at<'a>(
    text: &'a str,
    at: usize,
    prefix: &str,
    accept: fn(u8) -> bool,
) -> Option<(&'a str, usize)> {
    let rest = text.get(at..)?;
    let body = rest.strip_prefix(prefix)?;
    let len = body.bytes().take_while(|b| accept(*b)).count();
    if len == 0 || body.as_bytes().get(len) != Some(&b')') {
        return None;
    }
    Some((&body[..len], at + prefix.len() + len + 1))
}

fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

fn is_score_char(b: u8) -> bool {
    b.is_ascii_digit() || b == b'.'
}

/// Earliest `prefix(RUN)` token at or after `from`.
fn find_token<'a>(
    text: &'a str,
    from: usize,
    prefixes: &[&str],
    accept: fn(u8) -> bool,
) -> Option<(&'a str, usize, usize)> {
    let mut best: Option<(&str, usize, usize)> = None;
    for prefix in prefixes {
        let mut cursor = from;
        while let Some(offset) = text.get(cursor..).and_then(|s| s.find(prefix)) {
            let at = cursor + offset;
            if let Some((run, end)) = token_at(text, at, prefix, accept) {
                if best.is_none_or(|(_, start, _)| at < start) {
                    best = Some((run, at, end));
                }
                break;
            }
            cursor = at + 1;
        }
    }
    best
}

/// Collect every `iteration(N) ... loop|high(ID) ... hyp(SCORE)` report.
fn scan_iterations(text: &str) -> Vec<HypothesisMatch> {
    let mut found = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = text.get(cursor..).and_then(|s| s.find("iteration(")) {
        let at = cursor + offset;
        let Some((_, after_iter)) = token_at(text, at, "iteration(", is_digit) else {
            cursor = at + 1;
            continue;
        };
        let report = find_token(text, after_iter, &["loop(", "high("], is_digit).and_then(
            |(id, _, after_id)| {
                find_token(text, after_id, &["hyp("], is_score_char)
                    .map(|(score, _, end)| (id, score, end))
            },
        );
        match report {
            Some((id, score, end)) => {
                if let (Ok(id), Ok(score)) = (id.parse::<i64>(), score.parse::<f64>()) {
                    found.push(HypothesisMatch {
                        frame_id: FrameId(id),
                        score,
                    });
                }
                cursor = end;
            }
            None => cursor = at + 1,
        }
    }

    found
}

fn first_loop_id(text: &str) -> Option<FrameId> {
    let mut cursor = 0;
    while let Some((id, _, end)) = find_token(text, cursor, &["loop("], is_digit) {
        if let Ok(id) = id.parse::<i64>() {
            return Some(FrameId(id));
        }
        cursor = end;
    }
    None
}

/// First `hyp(SCORE)` or `hypothesis=SCORE` / `hypothesis SCORE` token.
fn first_score(text: &str) -> Option<f64> {
    let mut hyp = None;
    let mut cursor = 0;
    while let Some((run, at, end)) = find_token(text, cursor, &["hyp("], is_score_char) {
        if let Ok(v) = run.parse::<f64>() {
            hyp = Some((at, v));
            break;
        }
        cursor = end;
    }
    let spelled = first_spelled_hypothesis(text);

    match (hyp, spelled) {
        (Some((a, v)), Some((b, w))) => Some(if a <= b { v } else { w }),
        (Some((_, v)), None) | (None, Some((_, v))) => Some(v),
        (None, None) => None,
    }
}

fn first_spelled_hypothesis(text: &str) -> Option<(usize, f64)> {
    let mut cursor = 0;
    while let Some(offset) = text.get(cursor..).and_then(|s| s.find("hypothesis")) {
        let at = cursor + offset;
        let tail = &text[at + "hypothesis".len()..];
        let sep = tail
            .bytes()
            .take_while(|b| *b == b'=' || b.is_ascii_whitespace())
            .count();
        let run = tail[sep..]
            .bytes()
            .take_while(|b| is_score_char(*b))
            .count();
        if sep > 0 && run > 0 {
            if let Ok(v) = tail[sep..sep + run].parse::<f64>() {
                return Some((at, v));
            }
        }
        cursor = at + 1;
    }
    None
}

// =============================================================================
// TESTS
// =============================================================================
