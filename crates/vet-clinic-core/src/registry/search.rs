//! Fuzzy client lookup for the front end's "select a client" step.

use strsim::{jaro_winkler, normalized_levenshtein};

use super::Registry;
use crate::models::Client;

/// Minimum similarity for a client to be offered as a match.
const MIN_SCORE: f64 = 0.55;

/// A client and how closely its name matched the query.
#[derive(Debug, Clone, Copy)]
pub struct ClientMatch<'a> {
    pub client: &'a Client,
    /// 0.0 - 1.0
    pub score: f64,
}

impl Registry {
    /// Clients whose names resemble `query`, best first.
    ///
    /// A query contained in a name (case-insensitive) always matches.
    pub fn search_clients(&self, query: &str, limit: usize) -> Vec<ClientMatch<'_>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<ClientMatch<'_>> = self
            .clients()
            .iter()
            .filter_map(|client| {
                let name = client.person.name.to_lowercase();
                let score = if name.contains(&query) {
                    1.0
                } else {
                    fuzzy_match(&query, &name)
                };
                (score >= MIN_SCORE).then_some(ClientMatch { client, score })
            })
            .collect();

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(limit);
        matches
    }
}

/// Compute fuzzy string similarity using combined metrics.
fn fuzzy_match(a: &str, b: &str) -> f64 {
    // Jaro-Winkler favours shared prefixes, Levenshtein overall similarity
    let jw = jaro_winkler(a, b);
    let lev = normalized_levenshtein(a, b);
    jw * 0.6 + lev * 0.4
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Registry {
        let mut registry = Registry::new();
        for (name, contact) in [
            ("Maria Lopez", "555-0100"),
            ("Mario Lopes", "555-0101"),
            ("Juan Perez", "555-0200"),
        ] {
            registry.add_client(Client::new(name, contact, "123 Oak St").unwrap());
        }
        registry
    }

    #[test]
    fn test_substring_match_ranks_first() {
        let registry = setup();
        let results = registry.search_clients("maria", 10);
        assert!(!results.is_empty());
        assert_eq!(results[0].client.person.name, "Maria Lopez");
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn test_typo_still_matches() {
        let registry = setup();
        let results = registry.search_clients("Juan Peres", 10);
        assert_eq!(results[0].client.person.name, "Juan Perez");
    }

    #[test]
    fn test_limit_and_empty_query() {
        let registry = setup();
        assert_eq!(registry.search_clients("lope", 1).len(), 1);
        assert!(registry.search_clients("   ", 10).is_empty());
    }

    #[test]
    fn test_unrelated_query_finds_nothing() {
        let registry = setup();
        assert!(registry.search_clients("zzzzzz", 10).is_empty());
    }
}
