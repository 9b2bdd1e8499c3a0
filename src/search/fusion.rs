//! Reciprocal Rank Fusion over ranked result lists

use std::collections::HashMap;

use tracing::debug;

use super::types::SearchResult;
use crate::error::{Result, SearchError};

/// Default RRF k parameter
pub const DEFAULT_RRF_K: u32 = 60;

/// Merges independently ranked lists with Reciprocal Rank Fusion.
///
/// A result at 1-based rank `r` contributes `1 / (k + r)` to its document's
/// fused score; contributions are summed across lists.
#[derive(Debug, Clone, Copy)]
pub struct RrfScorer {
    default_k: u32,
}

impl Default for RrfScorer {
    fn default() -> Self {
        Self {
            default_k: DEFAULT_RRF_K,
        }
    }
}

impl RrfScorer {
    /// Create a scorer; `default_k` must be positive
    pub fn new(default_k: u32) -> Result<Self> {
        check_k(default_k)?;
        Ok(Self { default_k })
    }

    pub fn default_k(&self) -> u32 {
        self.default_k
    }

    /// Fuse `result_lists` into one ranking, using `k` or the default.
    ///
    /// Each document keeps the payload of its first occurrence (list order,
    /// then rank order) and gets the fused score. Equal scores keep
    /// first-seen order.
    pub fn merge(
        &self,
        result_lists: Vec<Vec<SearchResult>>,
        k: Option<u32>,
    ) -> Result<Vec<SearchResult>> {
        let k = k.unwrap_or(self.default_k);
        check_k(k)?;
        let k = f64::from(k);

        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut fused: Vec<SearchResult> = Vec::new();

        for list in result_lists {
            for (rank, result) in list.into_iter().enumerate() {
                let contribution = 1.0 / (k + rank as f64 + 1.0);
                match positions.get(&result.doc_id) {
                    Some(&pos) => fused[pos].score += contribution,
                    None => {
                        positions.insert(result.doc_id.clone(), fused.len());
                        fused.push(SearchResult {
                            score: contribution,
                            ..result
                        });
                    }
                }
            }
        }

        // sort_by is stable: ties stay in first-seen order
        fused.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!("RRF merged {} distinct documents (k={})", fused.len(), k);
        Ok(fused)
    }
}

fn check_k(k: u32) -> Result<()> {
    if k == 0 {
        return Err(SearchError::InvalidArgument(format!(
            "RRF constant k must be positive, got {}",
            k
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    const TOLERANCE: f64 = 1e-12;

    fn result(doc_id: &str, score: f64, index: &str) -> SearchResult {
        SearchResult {
            doc_id: doc_id.to_string(),
            score,
            content: format!("content of {}", doc_id),
            metadata: Map::new(),
            source_index: index.to_string(),
        }
    }

    fn ids(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.doc_id.as_str()).collect()
    }

    #[test]
    fn test_formula_rank_one_and_three() {
        let scorer = RrfScorer::default();
        let a = vec![result("doc1", 10.0, "news")];
        let b = vec![
            result("x", 0.9, "news"),
            result("y", 0.8, "news"),
            result("doc1", 0.7, "news"),
        ];

        let fused = scorer.merge(vec![a, b], None).unwrap();
        let doc1 = fused.iter().find(|r| r.doc_id == "doc1").unwrap();

        assert!((doc1.score - (1.0 / 61.0 + 1.0 / 63.0)).abs() < TOLERANCE);
        assert!((doc1.score - 0.0323).abs() < 1e-4);
    }

    #[test]
    fn test_formula_arbitrary_k_and_rank() {
        let scorer = RrfScorer::default();
        for k in [1u32, 7, 60, 1000] {
            let list: Vec<SearchResult> = (0..5)
                .map(|i| result(&format!("d{}", i), 0.0, "news"))
                .collect();
            let fused = scorer.merge(vec![list], Some(k)).unwrap();
            for (i, r) in fused.iter().enumerate() {
                let expected = 1.0 / (f64::from(k) + i as f64 + 1.0);
                assert!((r.score - expected).abs() < TOLERANCE);
            }
        }
    }

    #[test]
    fn test_worked_example() {
        let scorer = RrfScorer::new(60).unwrap();
        let a = vec![
            result("doc1", 3.0, "sec_filings"),
            result("doc2", 2.0, "sec_filings"),
            result("doc3", 1.0, "sec_filings"),
        ];
        let b = vec![
            result("doc2", 0.9, "news"),
            result("doc4", 0.8, "news"),
            result("doc1", 0.7, "news"),
        ];

        let fused = scorer.merge(vec![a, b], None).unwrap();

        assert_eq!(ids(&fused), vec!["doc2", "doc1", "doc4", "doc3"]);
        assert!((fused[0].score - 0.0325).abs() < 1e-4);
        assert!((fused[1].score - 0.0323).abs() < 1e-4);
        assert!((fused[2].score - 0.0161).abs() < 1e-4);
        assert!((fused[3].score - 0.0159).abs() < 1e-4);
    }

    #[test]
    fn test_first_occurrence_payload_retained() {
        let scorer = RrfScorer::default();
        let a = vec![result("doc1", 5.0, "sec_filings")];
        let b = vec![result("doc1", 0.5, "news")];

        let fused = scorer.merge(vec![a, b], None).unwrap();

        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].source_index, "sec_filings");
        assert!((fused[0].score - 2.0 / 61.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_disjoint_sets() {
        let scorer = RrfScorer::default();
        let a = vec![result("a1", 1.0, "news"), result("a2", 0.5, "news")];
        let b = vec![result("b1", 1.0, "news"), result("b2", 0.5, "news")];

        let fused = scorer.merge(vec![a, b], None).unwrap();

        assert_eq!(fused.len(), 4);
        assert!((fused[0].score - 1.0 / 61.0).abs() < TOLERANCE);
        assert!((fused[3].score - 1.0 / 62.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_full_overlap_doubles_scores() {
        let scorer = RrfScorer::default();
        let list = vec![result("d1", 1.0, "news"), result("d2", 0.5, "news")];

        let single = scorer.merge(vec![list.clone()], None).unwrap();
        let doubled = scorer.merge(vec![list.clone(), list], None).unwrap();

        assert_eq!(doubled.len(), 2);
        for (s, d) in single.iter().zip(doubled.iter()) {
            assert_eq!(s.doc_id, d.doc_id);
            assert!((d.score - 2.0 * s.score).abs() < TOLERANCE);
        }
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let scorer = RrfScorer::default();
        let a = vec![result("alpha", 1.0, "news")];
        let b = vec![result("beta", 1.0, "news")];
        let c = vec![result("gamma", 1.0, "news")];

        for _ in 0..10 {
            let fused = scorer
                .merge(vec![a.clone(), b.clone(), c.clone()], None)
                .unwrap();
            assert_eq!(ids(&fused), vec!["alpha", "beta", "gamma"]);
        }
    }

    #[test]
    fn test_empty_inputs() {
        let scorer = RrfScorer::default();
        assert!(scorer.merge(vec![], None).unwrap().is_empty());
        assert!(scorer.merge(vec![vec![], vec![]], None).unwrap().is_empty());

        let one = scorer
            .merge(vec![vec![], vec![result("d1", 1.0, "news")]], None)
            .unwrap();
        assert_eq!(ids(&one), vec!["d1"]);
    }

    #[test]
    fn test_invalid_k() {
        assert!(matches!(
            RrfScorer::new(0),
            Err(SearchError::InvalidArgument(_))
        ));

        let scorer = RrfScorer::default();
        let err = scorer
            .merge(vec![vec![result("d1", 1.0, "news")]], Some(0))
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument(_)));
        assert!(err.to_string().contains("must be positive"));
    }
}
