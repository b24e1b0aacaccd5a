//! Round Store
//!
//! In-memory home for rounds. Each round sits behind its own lock so a
//! transition on one round never blocks another; the map lock is only held
//! long enough to find the entry.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::round::error::RoundError;
use crate::round::state::{Round, RoundId};

/// A stored round plus its insertion sequence (list tiebreak).
struct StoredRound {
    seq: u64,
    round: Arc<RwLock<Round>>,
}

/// Thread-safe round store.
pub struct RoundStore {
    /// Rounds by id.
    rounds: RwLock<BTreeMap<RoundId, StoredRound>>,
    /// Nonces already bound to a round.
    nonces: RwLock<BTreeMap<String, RoundId>>,
    /// Next insertion sequence number.
    next_seq: AtomicU64,
}

impl RoundStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            rounds: RwLock::new(BTreeMap::new()),
            nonces: RwLock::new(BTreeMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Insert a freshly created round.
    ///
    /// Fails with a conflict when another round already uses the nonce.
    pub async fn insert(&self, round: Round) -> Result<(), RoundError> {
        // Lock order: nonces, then rounds.
        let mut nonces = self.nonces.write().await;
        if nonces.contains_key(&round.nonce) {
            return Err(RoundError::DuplicateNonce(round.nonce));
        }

        let id = round.id;
        nonces.insert(round.nonce.clone(), id);

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut rounds = self.rounds.write().await;
        rounds.insert(id, StoredRound {
            seq,
            round: Arc::new(RwLock::new(round)),
        });

        Ok(())
    }

    /// Snapshot of a round.
    pub async fn get(&self, id: &RoundId) -> Option<Round> {
        let entry = self.entry(id).await?;
        let round = entry.read().await;
        Some(round.clone())
    }

    /// Most recent rounds first, at most `limit`.
    pub async fn list_recent(&self, limit: usize) -> Vec<Round> {
        let entries: Vec<(u64, Arc<RwLock<Round>>)> = {
            let rounds = self.rounds.read().await;
            rounds
                .values()
                .map(|stored| (stored.seq, stored.round.clone()))
                .collect()
        };

        let mut snapshots = Vec::with_capacity(entries.len());
        for (seq, entry) in entries {
            snapshots.push((seq, entry.read().await.clone()));
        }

        snapshots.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });
        snapshots.into_iter().take(limit).map(|(_, round)| round).collect()
    }

    /// Apply a transition under the round's write lock.
    ///
    /// `transition` sees the current round and returns its replacement.
    /// Nothing is written when it fails, and no other transition on the same
    /// round can run in between the read and the write.
    pub async fn update_with<F>(&self, id: &RoundId, transition: F) -> Result<Round, RoundError>
    where
        F: FnOnce(&Round) -> Result<Round, RoundError>,
    {
        let entry = self.entry(id).await.ok_or(RoundError::NotFound(*id))?;
        let mut round = entry.write().await;

        let next = transition(&*round)?;
        debug_assert_eq!(next.id, round.id);
        *round = next.clone();

        Ok(next)
    }

    /// Number of stored rounds.
    pub async fn len(&self) -> usize {
        self.rounds.read().await.len()
    }

    /// Is the store empty?
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn entry(&self, id: &RoundId) -> Option<Arc<RwLock<Round>>> {
        let rounds = self.rounds.read().await;
        rounds.get(id).map(|stored| stored.round.clone())
    }
}

impl Default for RoundStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use crate::proof::commitment::{RoundCommitment, ServerSeed};
    use crate::round::engine::{reveal_round, start_round, StartRequest};
    use crate::round::state::RoundStatus;

    fn create_test_round(nonce: &str) -> Round {
        let seed = ServerSeed::from_hex(&"5a".repeat(32)).unwrap();
        let commitment = RoundCommitment::new(&seed, nonce);
        Round::new(seed, commitment, 12, Utc::now())
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = RoundStore::new();
        let round = create_test_round("1");
        let id = round.id;

        store.insert(round.clone()).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&id).await, Some(round));
        assert_eq!(store.get(&RoundId::new()).await, None);
    }

    #[tokio::test]
    async fn test_duplicate_nonce_rejected() {
        let store = RoundStore::new();
        store.insert(create_test_round("7")).await.unwrap();

        let result = store.insert(create_test_round("7")).await;
        assert_eq!(result, Err(RoundError::DuplicateNonce("7".into())));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = RoundStore::new();
        let base = Utc::now();

        let mut ids = Vec::new();
        for i in 0..5 {
            let mut round = create_test_round(&i.to_string());
            round.created_at = base + Duration::milliseconds(i);
            ids.push(round.id);
            store.insert(round).await.unwrap();
        }

        // Same timestamp: later insertion wins the tie.
        let mut tied = create_test_round("tied");
        tied.created_at = base + Duration::milliseconds(4);
        let tied_id = tied.id;
        store.insert(tied).await.unwrap();

        let listed: Vec<RoundId> = store.list_recent(3).await.iter().map(|r| r.id).collect();
        assert_eq!(listed, vec![tied_id, ids[4], ids[3]]);
        assert_eq!(store.list_recent(100).await.len(), 6);
    }

    #[tokio::test]
    async fn test_failed_update_writes_nothing() {
        let store = RoundStore::new();
        let round = create_test_round("3");
        let id = round.id;
        store.insert(round.clone()).await.unwrap();

        let result = store
            .update_with(&id, |_| Err(RoundError::MissingField("client_seed")))
            .await;
        assert!(result.is_err());
        assert_eq!(store.get(&id).await, Some(round));

        let missing = store.update_with(&RoundId::new(), |r| Ok(r.clone())).await;
        assert!(matches!(missing, Err(RoundError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_start_single_winner() {
        let store = Arc::new(RoundStore::new());
        let round = create_test_round("race");
        let id = round.id;
        store.insert(round).await.unwrap();

        let mut handles = Vec::new();
        for drop_column in [0u32, 24] {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let request = StartRequest {
                    drop_column: Some(drop_column),
                    ..StartRequest::default()
                };
                store.update_with(&id, |r| start_round(r, request)).await
            }));
        }

        let mut winners = Vec::new();
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(round) => winners.push(round),
                Err(RoundError::InvalidTransition { status, .. }) => {
                    assert_eq!(status, RoundStatus::Started);
                    conflicts += 1;
                }
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert_eq!(winners.len(), 1);
        assert_eq!(conflicts, 1);
        assert_eq!(store.get(&id).await.unwrap(), winners[0]);
    }

    #[tokio::test]
    async fn test_reveal_through_store_is_idempotent() {
        let store = RoundStore::new();
        let round = create_test_round("9");
        let id = round.id;
        store.insert(round).await.unwrap();

        let first = store.update_with(&id, |r| Ok(reveal_round(r, Utc::now()))).await.unwrap();
        let later = Utc::now() + Duration::seconds(30);
        let second = store.update_with(&id, |r| Ok(reveal_round(r, later))).await.unwrap();

        assert_eq!(first.revealed_at, second.revealed_at);
        assert_eq!(first.server_seed, second.server_seed);
        assert_eq!(second.status, RoundStatus::Revealed);
    }
}
