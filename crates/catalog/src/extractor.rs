//! Entity extraction from raw utterance text.
//!
//! Matching is a case-insensitive surface-form lookup against the catalog
//! vocabulary: an entity is mentioned when its name appears in the
//! utterance on word boundaries. Each matching form is reported once per
//! utterance, at its first occurrence; across a growing context the same
//! entity may be reported many times (de-duplication is a downstream
//! concern, not this layer's).

use rayon::prelude::*;

use crate::types::EntityCatalog;

/// Scans utterances for catalog entity mentions.
///
/// The vocabulary is lowercased once at construction; extraction itself is
/// a data-parallel scan over the vocabulary.
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    /// (lowercased form, canonical catalog key)
    vocabulary: Vec<(String, String)>,
}

impl EntityExtractor {
    pub fn new(catalog: &EntityCatalog) -> Self {
        let vocabulary = catalog
            .surface_forms()
            .filter(|form| !form.is_empty())
            .map(|form| (form.to_lowercase(), form.to_string()))
            .collect();
        Self { vocabulary }
    }

    /// Extract the entities mentioned in a single utterance, ordered by
    /// first appearance. Ties at the same position prefer the longer form.
    pub fn extract(&self, utterance: &str) -> Vec<String> {
        if utterance.is_empty() {
            return Vec::new();
        }
        let haystack = utterance.to_lowercase();

        let mut matches: Vec<(usize, &str)> = self
            .vocabulary
            .par_iter()
            .filter_map(|(needle, canonical)| {
                find_on_boundary(&haystack, needle).map(|pos| (pos, canonical.as_str()))
            })
            .collect();

        matches.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| b.1.len().cmp(&a.1.len()))
                .then_with(|| a.1.cmp(b.1))
        });
        matches.into_iter().map(|(_, name)| name.to_string()).collect()
    }

    /// Extract across all utterances of a context, accumulating mentions in
    /// order of appearance. Duplicates across utterances are kept.
    pub fn extract_all(&self, utterances: &[String]) -> Vec<String> {
        utterances
            .iter()
            .flat_map(|utt| self.extract(utt))
            .collect()
    }
}

/// First occurrence of `needle` in `haystack` that sits on word boundaries
/// (neighbouring characters, if any, are not alphanumeric).
fn find_on_boundary(haystack: &str, needle: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(offset) = haystack[from..].find(needle) {
        let pos = from + offset;
        let end = pos + needle.len();

        let open = haystack[..pos].chars().next_back().is_none_or(|c| !c.is_alphanumeric());
        let close = haystack[end..].chars().next().is_none_or(|c| !c.is_alphanumeric());
        if open && close {
            return Some(pos);
        }

        // Resume after the next character; pos itself is a char boundary.
        match haystack[pos..].chars().next() {
            Some(c) => from = pos + c.len_utf8(),
            None => break,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> EntityCatalog {
        let mut catalog = EntityCatalog::new();
        catalog.insert_entity("The Matrix", 0);
        catalog.insert_entity("The Matrix Reloaded", 1);
        catalog.insert_entity("Up", 2);
        catalog.insert_entity("Titanic", 3);
        catalog
    }

    #[test]
    fn test_extract_orders_by_position() {
        let extractor = EntityExtractor::new(&sample_catalog());
        let found = extractor.extract("I liked Titanic more than The Matrix");
        assert_eq!(found, vec!["Titanic".to_string(), "The Matrix".to_string()]);
    }

    #[test]
    fn test_extract_is_case_insensitive() {
        let extractor = EntityExtractor::new(&sample_catalog());
        let found = extractor.extract("have you seen the matrix?");
        assert_eq!(found, vec!["The Matrix".to_string()]);
    }

    #[test]
    fn test_extract_respects_word_boundaries() {
        let extractor = EntityExtractor::new(&sample_catalog());
        // "Up" must not match inside "Super".
        assert!(extractor.extract("Super heroes are fine").is_empty());
        assert_eq!(extractor.extract("I loved Up!"), vec!["Up".to_string()]);
    }

    #[test]
    fn test_longer_form_wins_position_tie() {
        let extractor = EntityExtractor::new(&sample_catalog());
        let found = extractor.extract("watched The Matrix Reloaded yesterday");
        // Both forms match at the same position; the longer one sorts first.
        assert_eq!(found[0], "The Matrix Reloaded");
        assert_eq!(found[1], "The Matrix");
    }

    #[test]
    fn test_extract_all_keeps_duplicates() {
        let extractor = EntityExtractor::new(&sample_catalog());
        let utterances = vec![
            "Titanic was great".to_string(),
            "".to_string(),
            "yes, Titanic!".to_string(),
        ];
        let found = extractor.extract_all(&utterances);
        assert_eq!(found, vec!["Titanic".to_string(), "Titanic".to_string()]);
    }
}
