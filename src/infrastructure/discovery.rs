//! Hash Discovery Coordinator
//!
//! A single page occasionally fails to trigger the full request set (blocked
//! ads, layout variants, network flakes), so resilience means trying
//! *different* pages rather than re-trying the same one. Candidates are
//! attempted in order until one yields the mandatory hash pair.

use tracing::{info, warn};

use crate::domain::OperationHashes;
use crate::infrastructure::hash_sniffer::HashExtractor;

/// Tries candidates until one yields a sufficient hash set.
///
/// Returns the first sufficient set, short-circuiting the remaining
/// candidates, or `None` when the list is exhausted. Extractor errors and
/// insufficient results are both non-fatal and advance to the next candidate.
pub async fn discover_hashes<E: HashExtractor + ?Sized>(
    extractor: &E,
    candidates: &[String],
) -> Option<OperationHashes> {
    for (attempt, listing_id) in candidates.iter().enumerate() {
        match extractor.extract(listing_id).await {
            Ok(hashes) if hashes.is_sufficient() => {
                info!(
                    listing_id,
                    attempt = attempt + 1,
                    resolved = hashes.resolved_count(),
                    "discovered sufficient hash set"
                );
                return Some(hashes);
            }
            Ok(hashes) => {
                warn!(
                    listing_id,
                    resolved = hashes.resolved_count(),
                    "candidate did not yield the mandatory hashes"
                );
            }
            Err(error) => {
                warn!(listing_id, error = %format!("{error:#}"), "hash extraction failed for candidate");
            }
        }
    }

    warn!(
        candidates = candidates.len(),
        "no candidate yielded a sufficient hash set"
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GraphQlOperation, QueryHash};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted extractor: one outcome per candidate, attempts counted.
    struct ScriptedExtractor {
        outcomes: Vec<Outcome>,
        attempts: AtomicUsize,
    }

    enum Outcome {
        Sufficient,
        Insufficient,
        Error,
    }

    impl ScriptedExtractor {
        fn new(outcomes: Vec<Outcome>) -> Self {
            Self {
                outcomes,
                attempts: AtomicUsize::new(0),
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HashExtractor for ScriptedExtractor {
        async fn extract(&self, _listing_id: &str) -> anyhow::Result<OperationHashes> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            match self.outcomes[attempt] {
                Outcome::Sufficient => {
                    let mut hashes = OperationHashes::default();
                    hashes.record(
                        GraphQlOperation::StaysPdpSections,
                        QueryHash::new("a".repeat(64)).unwrap(),
                    );
                    Ok(hashes)
                }
                Outcome::Insufficient => Ok(OperationHashes::default()),
                Outcome::Error => Err(anyhow!("browser crashed")),
            }
        }
    }

    fn candidates(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("id-{i}")).collect()
    }

    #[tokio::test]
    async fn first_sufficient_candidate_short_circuits() {
        let extractor = ScriptedExtractor::new(vec![Outcome::Sufficient, Outcome::Sufficient]);
        let result = discover_hashes(&extractor, &candidates(2)).await;
        assert!(result.is_some());
        assert_eq!(extractor.attempts(), 1);
    }

    #[tokio::test]
    async fn extractor_error_advances_to_next_candidate() {
        let extractor = ScriptedExtractor::new(vec![Outcome::Error, Outcome::Sufficient]);
        let result = discover_hashes(&extractor, &candidates(2)).await;
        assert!(result.is_some());
        assert_eq!(extractor.attempts(), 2);
    }

    #[tokio::test]
    async fn insufficient_result_advances_to_next_candidate() {
        let extractor = ScriptedExtractor::new(vec![Outcome::Insufficient, Outcome::Sufficient]);
        let result = discover_hashes(&extractor, &candidates(2)).await;
        assert!(result.is_some());
        assert_eq!(extractor.attempts(), 2);
    }

    #[tokio::test]
    async fn exhausted_candidates_return_none() {
        let extractor = ScriptedExtractor::new(vec![Outcome::Error, Outcome::Insufficient]);
        let result = discover_hashes(&extractor, &candidates(2)).await;
        assert!(result.is_none());
        assert_eq!(extractor.attempts(), 2);
    }

    #[tokio::test]
    async fn empty_candidate_list_returns_none() {
        let extractor = ScriptedExtractor::new(vec![]);
        assert!(discover_hashes(&extractor, &[]).await.is_none());
    }
}
