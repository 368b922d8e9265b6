//! Per-object relevance scoring.
//!
//! The last query word is the primary term and must match the object's
//! class label. Every other word is a modifier, and every modifier must
//! match the object too: one missing modifier zeroes the object.

use super::normalize::{normalize, surface_form, words};
use super::similarity::similarity;
use crate::primitives::{
    FUZZY_THRESHOLD, GENERIC_TERMS, SCORE_ALL_MODIFIERS, SCORE_EXACT, SCORE_FALLBACK_FUZZY,
    SCORE_FALLBACK_NOTES, SCORE_FALLBACK_WORD, SCORE_FUZZY, SCORE_MODIFIER_CLASS,
    SCORE_MODIFIER_FUZZY, SCORE_MODIFIER_NOTES, SCORE_WHOLE_WORD, STRICT_FUZZY_THRESHOLD,
};
use crate::types::{LocusError, ObjectAnnotation};
use serde::{Deserialize, Serialize};

// =============================================================================
// TERMS
// =============================================================================

/// A word in both its surface spelling and its canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub surface: String,
    pub canonical: String,
}

impl Term {
    pub fn new(raw: &str) -> Self {
        Self {
            surface: surface_form(raw),
            canonical: normalize(raw),
        }
    }

    fn same_word(&self, other: &Term) -> bool {
        self.surface == other.surface || self.canonical == other.canonical
    }
}

/// A query split into modifiers and a primary term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerms {
    pub primary: Term,
    pub modifiers: Vec<Term>,
}

impl QueryTerms {
    /// Split on whitespace; the last word is primary.
    pub fn parse(query: &str) -> Result<Self, LocusError> {
        let mut terms: Vec<Term> = query
            .split_whitespace()
            .map(Term::new)
            .filter(|t| !t.surface.is_empty())
            .collect();
        let primary = terms
            .pop()
            .ok_or_else(|| LocusError::InvalidQuery("query has no words".to_string()))?;
        Ok(Self {
            primary,
            modifiers: terms,
        })
    }

    #[must_use]
    pub fn is_single_word(&self) -> bool {
        self.modifiers.is_empty()
    }
}

// =============================================================================
// SCORING
// =============================================================================

/// How the primary term matched the class label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryTier {
    Exact,
    WholeWord,
    Fuzzy,
    FallbackWord,
    FallbackFuzzy,
    FallbackNotes,
}

impl PrimaryTier {
    #[must_use]
    pub const fn score(self) -> u32 {
        match self {
            Self::Exact => SCORE_EXACT,
            Self::WholeWord => SCORE_WHOLE_WORD,
            Self::Fuzzy => SCORE_FUZZY,
            Self::FallbackWord => SCORE_FALLBACK_WORD,
            Self::FallbackFuzzy => SCORE_FALLBACK_FUZZY,
            Self::FallbackNotes => SCORE_FALLBACK_NOTES,
        }
    }
}

/// Score of one object against a query. Zero means "not a match".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectScore {
    pub total: u32,
    pub tier: Option<PrimaryTier>,
}

impl ObjectScore {
    const NONE: Self = Self {
        total: 0,
        tier: None,
    };

    #[must_use]
    pub const fn is_match(&self) -> bool {
        self.total > 0
    }
}

/// The parts of an annotation the scorer compares against.
struct Label {
    surface: String,
    canonical: String,
    words: Vec<Term>,
    note_words: Vec<Term>,
}

impl Label {
    fn new(object: &ObjectAnnotation) -> Self {
        let class = object.class_str();
        Self {
            surface: surface_form(class),
            canonical: normalize(class),
            words: words(class).iter().map(|w| Term::new(w)).collect(),
            note_words: words(object.notes_str()).iter().map(|w| Term::new(w)).collect(),
        }
    }
}

/// Score one object annotation.
pub fn score_object(query: &QueryTerms, object: &ObjectAnnotation) -> ObjectScore {
    let label = Label::new(object);
    let primary = &query.primary;

    let tier = match primary_tier(primary, &label) {
        Some(tier) => tier,
        None if query.is_single_word() => match fallback_tier(primary, &label) {
            Some(tier) => tier,
            None => return ObjectScore::NONE,
        },
        None => return ObjectScore::NONE,
    };

    let mut total = tier.score();
    if query.modifiers.is_empty() {
        return ObjectScore {
            total,
            tier: Some(tier),
        };
    }

    for modifier in &query.modifiers {
        match modifier_score(modifier, &label) {
            Some(points) => total += points,
            None => return ObjectScore::NONE,
        }
    }

    ObjectScore {
        total: total + SCORE_ALL_MODIFIERS,
        tier: Some(tier),
    }
}

fn primary_tier(primary: &Term, label: &Label) -> Option<PrimaryTier> {
    if primary.surface == label.surface || primary.canonical == label.canonical {
        return Some(PrimaryTier::Exact);
    }
    if label.words.iter().any(|w| w.surface == primary.surface) {
        return Some(PrimaryTier::WholeWord);
    }
    if label.surface.contains(&primary.surface) {
        // Part of a longer word: only the strict fallback may accept it.
        return None;
    }
    let closeness = similarity(&primary.surface, &label.surface)
        .max(similarity(&primary.canonical, &label.canonical));
    (closeness >= FUZZY_THRESHOLD).then_some(PrimaryTier::Fuzzy)
}

fn fallback_tier(word: &Term, label: &Label) -> Option<PrimaryTier> {
    if label.words.iter().any(|w| w.canonical == word.canonical) {
        return Some(PrimaryTier::FallbackWord);
    }
    if similarity(&word.surface, &label.surface) >= STRICT_FUZZY_THRESHOLD {
        return Some(PrimaryTier::FallbackFuzzy);
    }
    let leads_notes = label
        .note_words
        .first()
        .is_some_and(|first| first.surface == word.surface);
    (GENERIC_TERMS.contains(&word.surface.as_str()) && leads_notes)
        .then_some(PrimaryTier::FallbackNotes)
}

fn modifier_score(modifier: &Term, label: &Label) -> Option<u32> {
    if label.note_words.iter().any(|w| w.same_word(modifier)) {
        return Some(SCORE_MODIFIER_NOTES);
    }
    if label.surface.contains(&modifier.surface) {
        return Some(SCORE_MODIFIER_CLASS);
    }
    label
        .note_words
        .iter()
        .any(|w| similarity(&modifier.surface, &w.surface) >= FUZZY_THRESHOLD)
        .then_some(SCORE_MODIFIER_FUZZY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(query: &str, class: &str, notes: &str) -> u32 {
        let q = QueryTerms::parse(query).expect("query");
        score_object(&q, &ObjectAnnotation::new(class, notes)).total
    }

    #[test]
    fn empty_query_rejected() {
        assert!(QueryTerms::parse("   ").is_err());
    }

    #[test]
    fn primary_tiers() {
        assert_eq!(score("milk", "milk", ""), SCORE_EXACT);
        assert_eq!(score("lait", "milk", ""), SCORE_EXACT);
        assert_eq!(score("paper", "toilet_paper", ""), SCORE_WHOLE_WORD);
        assert_eq!(score("cerael", "cereal", ""), SCORE_FUZZY);
    }

    #[test]
    fn substring_only_falls_back_to_strict_fuzzy() {
        // "chair" is inside "chairs" but not a word of it.
        assert_eq!(score("chair", "chairs", ""), SCORE_FALLBACK_FUZZY);
        // Multi-word queries get no fallback.
        assert_eq!(score("red chair", "chairs", "red"), 0);
    }

    #[test]
    fn fallback_canonical_word() {
        // "cola" is canonical "soda", which is a word of the label.
        assert_eq!(score("cola", "diet soda", ""), SCORE_FALLBACK_WORD);
    }

    #[test]
    fn generic_term_on_notes() {
        assert_eq!(score("door", "exit", "door to the loading dock"), SCORE_FALLBACK_NOTES);
        assert_eq!(score("door", "exit", "the loading dock door"), 0);
        assert_eq!(score("shelf", "exit", "shelf by the door"), 0);
    }

    #[test]
    fn modifier_rule_is_all_or_nothing() {
        assert_eq!(score("2% milk", "milk", "whole milk 1L"), 0);
        assert_eq!(
            score("2% milk", "milk", "2% milk 1L"),
            SCORE_EXACT + SCORE_MODIFIER_NOTES + SCORE_ALL_MODIFIERS
        );
        assert_eq!(score("organic 2% milk", "milk", "2% milk 1L"), 0);
    }

    #[test]
    fn modifier_channels() {
        assert_eq!(
            score("vanilla milk", "vanilla_milk", "1L"),
            SCORE_WHOLE_WORD + SCORE_MODIFIER_CLASS + SCORE_ALL_MODIFIERS
        );
        assert_eq!(
            score("organik milk", "milk", "organic 1L"),
            SCORE_EXACT + SCORE_MODIFIER_FUZZY + SCORE_ALL_MODIFIERS
        );
    }
}
