//! Query and annotation normalisation.
//!
//! `normalize` is idempotent: every table output is either a canonical
//! synonym head (which resolves to itself), a dietary key, or a singular
//! that no table maps further.

use super::lexicon::LEXICON;
use crate::primitives::{MAX_EXPANDED_TERMS, MIN_PREFILTER_WORD_LEN};

/// Lowercase, drop apostrophes, trim, join words with underscores.
pub fn surface_form(text: &str) -> String {
    text.to_lowercase()
        .replace(['\'', '\u{2019}'], "")
        .trim()
        .replace(' ', "_")
}

/// Map a term to its canonical form.
///
/// Steps, in order: surface form, French -> English, synonym -> canonical
/// head, dietary phrasing -> dietary key, irregular plural -> singular.
pub fn normalize(term: &str) -> String {
    let mut t = surface_form(term);

    if let Some(english) = LEXICON.english(&t) {
        t = english.to_string();
    }
    if let Some(head) = LEXICON.synonym_head(&t) {
        t = head.to_string();
    }
    if let Some(diet) = LEXICON.dietary_head(&t) {
        t = diet.to_string();
    }
    if let Some(single) = LEXICON.singular(&t) {
        t = single.to_string();
    }
    t
}

/// Alternate spellings of a normalised term: the term, its synonyms, its
/// French translation and its dietary phrasings, without duplicates.
pub fn expand(term: &str) -> Vec<String> {
    let mut out = vec![term.to_string()];
    out.extend(LEXICON.synonyms_of(term).iter().map(|s| s.to_string()));
    if let Some(fr) = LEXICON.french(term) {
        out.push(fr.to_string());
    }
    out.extend(LEXICON.dietary_of(term).iter().map(|s| s.to_string()));
    dedup_in_order(out)
}

/// Substring terms for the store prefilter.
///
/// Built from the normalised query, its underscore-separated parts, each
/// query word in surface and normalised form, the first expanded terms and
/// a brand category. Terms shorter than two characters are dropped.
pub fn prefilter_terms(query: &str) -> Vec<String> {
    let normalized = normalize(query);
    let mut terms = vec![normalized.clone()];
    terms.extend(normalized.split('_').map(str::to_string));
    for word in query.split_whitespace() {
        terms.push(surface_form(word));
        terms.push(normalize(word));
    }
    terms.extend(expand(&normalized).into_iter().take(MAX_EXPANDED_TERMS));
    if let Some(category) = LEXICON.brand_category(&normalized) {
        terms.push(category.to_string());
    }

    dedup_in_order(
        terms
            .into_iter()
            .filter(|t| t.chars().count() >= MIN_PREFILTER_WORD_LEN)
            .collect(),
    )
}

/// Split free text into word surfaces. Letters, digits and `%` form words.
pub fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(['\'', '\u{2019}'], "")
        .split(|c: char| !(c.is_alphanumeric() || c == '%'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn dedup_in_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    items
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::lexicon::Lexicon;

    #[test]
    fn surface_joins_words() {
        assert_eq!(surface_form("  Rubik's Cube "), "rubiks_cube");
        assert_eq!(surface_form("Toilet Paper"), "toilet_paper");
    }

    #[test]
    fn pipeline_steps() {
        assert_eq!(normalize("Lait"), "milk");
        assert_eq!(normalize("pomme de terre"), "potatoes");
        assert_eq!(normalize("2% milk"), "milk");
        assert_eq!(normalize("Gluten Free"), "gluten_free");
        assert_eq!(normalize("candies"), "candy");
        assert_eq!(normalize("pâtes"), "pasta");
        assert_eq!(normalize("chips"), "chip");
        assert_eq!(normalize("widget"), "widget");
    }

    #[test]
    fn idempotent_over_every_table_entry() {
        for term in Lexicon::all_terms() {
            let once = normalize(term);
            assert_eq!(normalize(&once), once, "term {term:?}");
        }
    }

    #[test]
    fn expansion_is_ordered_and_unique() {
        let terms = expand("milk");
        assert_eq!(terms[0], "milk");
        assert_eq!(terms[1], "dairy");
        assert!(terms.contains(&"lait".to_string()));
        let unique: std::collections::BTreeSet<_> = terms.iter().collect();
        assert_eq!(unique.len(), terms.len());
    }

    #[test]
    fn prefilter_terms_cover_query_words() {
        let terms = prefilter_terms("organic milk");
        assert!(terms.contains(&"organic_milk".to_string()));
        assert!(terms.contains(&"organic".to_string()));
        assert!(terms.contains(&"milk".to_string()));
        assert!(terms.iter().all(|t| t.chars().count() >= 2));
    }

    #[test]
    fn prefilter_terms_include_brand_category() {
        assert!(prefilter_terms("pepsi").contains(&"soda".to_string()));
    }

    #[test]
    fn words_keep_percent() {
        assert_eq!(words("2% milk, 1L"), vec!["2%", "milk", "1l"]);
        assert_eq!(words("Kid's cereal"), vec!["kids", "cereal"]);
    }
}
