use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Inverse document frequency: `ln(document_count / document_frequency)`.
///
/// A term present in every document gets exactly `0.0`.
pub fn idf(document_count: u64, document_frequency: u64) -> f64 {
    (document_count as f64 / document_frequency as f64).ln()
}

/// Ranked search result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub score: f64,
}

impl SearchHit {
    pub fn new(doc_id: String, score: f64) -> Self {
        Self { doc_id, score }
    }
}

/// Score every candidate as `sum over query terms of tf(term, doc) * idf(term)`.
///
/// There is no query-vector normalization. Repeated query terms count once
/// per occurrence. Results are sorted by descending score, ties by ascending
/// document id.
pub fn rank_documents(
    query_terms: &[String],
    candidates: &[String],
    term_frequencies: &HashMap<(String, String), f64>,
    document_frequencies: &HashMap<String, u64>,
    document_count: u64,
) -> Vec<SearchHit> {
    let idfs: HashMap<&str, f64> = document_frequencies
        .iter()
        .map(|(term, &df)| (term.as_str(), idf(document_count, df)))
        .collect();

    let mut scored_docs: Vec<SearchHit> = candidates
        .iter()
        .map(|doc_id| {
            let score = query_terms
                .iter()
                .map(|term| {
                    let tf = term_frequencies
                        .get(&(term.clone(), doc_id.clone()))
                        .copied()
                        .unwrap_or(0.0);
                    tf * idfs.get(term.as_str()).copied().unwrap_or(0.0)
                })
                .sum();
            SearchHit::new(doc_id.clone(), score)
        })
        .collect();

    scored_docs.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });

    scored_docs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_idf() {
        assert_eq!(idf(2, 2), 0.0);
        assert!((idf(2, 1) - std::f64::consts::LN_2).abs() < 1e-12);
        assert!(idf(10, 1) > idf(10, 5));
    }

    #[test]
    fn test_rank_documents_sums_weights() {
        let mut tfs = HashMap::new();
        tfs.insert(("cat".to_string(), "a".to_string()), 0.5);
        tfs.insert(("dog".to_string(), "a".to_string()), 0.25);
        tfs.insert(("cat".to_string(), "b".to_string()), 0.1);
        tfs.insert(("dog".to_string(), "b".to_string()), 0.9);

        let mut dfs = HashMap::new();
        dfs.insert("cat".to_string(), 2);
        dfs.insert("dog".to_string(), 2);

        let ranked = rank_documents(&strings(&["cat", "dog"]), &strings(&["a", "b"]), &tfs, &dfs, 4);

        let ln2 = std::f64::consts::LN_2;
        assert_eq!(ranked[0].doc_id, "b");
        assert!((ranked[0].score - 1.0 * ln2).abs() < 1e-12);
        assert_eq!(ranked[1].doc_id, "a");
        assert!((ranked[1].score - 0.75 * ln2).abs() < 1e-12);
    }

    #[test]
    fn test_ties_break_on_document_id() {
        let mut tfs = HashMap::new();
        for doc in ["c", "a", "b"] {
            tfs.insert(("dog".to_string(), doc.to_string()), 0.5);
        }
        let mut dfs = HashMap::new();
        dfs.insert("dog".to_string(), 3);

        let ranked = rank_documents(&strings(&["dog"]), &strings(&["c", "a", "b"]), &tfs, &dfs, 3);
        let ids: Vec<&str> = ranked.iter().map(|d| d.doc_id.as_str()).collect();

        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(ranked.iter().all(|d| d.score == 0.0));
    }

    #[test]
    fn test_repeated_query_terms_count_twice() {
        let mut tfs = HashMap::new();
        tfs.insert(("cat".to_string(), "a".to_string()), 0.5);
        let mut dfs = HashMap::new();
        dfs.insert("cat".to_string(), 1);

        let once = rank_documents(&strings(&["cat"]), &strings(&["a"]), &tfs, &dfs, 2);
        let twice = rank_documents(&strings(&["cat", "cat"]), &strings(&["a"]), &tfs, &dfs, 2);

        assert!((twice[0].score - 2.0 * once[0].score).abs() < 1e-12);
    }
}
