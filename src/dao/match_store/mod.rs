#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{FlashcardEntity, MatchEntity, UserEntity, WaitingEntity};
use crate::dao::storage::StorageResult;

/// Result of a version-conditioned match update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The expected version matched and the fields were written.
    Applied,
    /// Another writer bumped the version first; reload and recompute.
    Conflict,
}

/// Abstraction over the persistence layer for matches, the waiting pool,
/// the flashcard deck, and user profiles.
///
/// Progress updates and waiting-pool takes must be atomic at the backend so
/// concurrent requests serialize there rather than behind in-process locks.
pub trait DuelStore: Send + Sync {
    fn insert_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    fn find_ongoing_match_for(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    fn list_matches_for(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;
    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;
    /// Replace the stored match with `entity` if and only if the stored
    /// version still equals `expected_version`.
    fn update_progress(
        &self,
        expected_version: i64,
        entity: MatchEntity,
    ) -> BoxFuture<'static, StorageResult<UpdateOutcome>>;

    fn join_waiting(
        &self,
        user_id: String,
        joined_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn take_oldest_waiting_except(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<WaitingEntity>>>;
    fn evict_stale_waiting(&self, cutoff: SystemTime) -> BoxFuture<'static, StorageResult<u64>>;
    fn leave_waiting(&self, user_id: String) -> BoxFuture<'static, StorageResult<u64>>;
    fn count_waiting_except(&self, user_id: String) -> BoxFuture<'static, StorageResult<u64>>;
    fn list_waiting(&self) -> BoxFuture<'static, StorageResult<Vec<WaitingEntity>>>;
    fn clear_waiting(&self) -> BoxFuture<'static, StorageResult<u64>>;

    fn sample_flashcards(
        &self,
        count: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<FlashcardEntity>>>;
    fn list_flashcards(&self) -> BoxFuture<'static, StorageResult<Vec<FlashcardEntity>>>;

    fn upsert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_users(&self, ids: Vec<String>) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::dao::models::MatchStatus;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct MemoryInner {
        matches: Vec<MatchEntity>,
        waiting: Vec<WaitingEntity>,
        flashcards: Vec<FlashcardEntity>,
        users: Vec<UserEntity>,
        injected_conflicts: u32,
    }

    /// Hand-rolled in-memory store backing the service tests.
    ///
    /// Sampling returns the first `count` cards in insertion order so tests
    /// stay deterministic.
    #[derive(Clone, Default)]
    pub struct MemoryDuelStore {
        inner: Arc<Mutex<MemoryInner>>,
    }

    impl MemoryDuelStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_flashcards(self, cards: Vec<FlashcardEntity>) -> Self {
            self.inner.lock().unwrap().flashcards = cards;
            self
        }

        pub fn with_users(self, users: Vec<UserEntity>) -> Self {
            self.inner.lock().unwrap().users = users;
            self
        }

        /// Make the next `count` progress updates report a version conflict
        /// without applying anything.
        pub fn with_injected_conflicts(self, count: u32) -> Self {
            self.inner.lock().unwrap().injected_conflicts = count;
            self
        }

        pub fn waiting_user_ids(&self) -> Vec<String> {
            self.inner
                .lock()
                .unwrap()
                .waiting
                .iter()
                .map(|entry| entry.user_id.clone())
                .collect()
        }

        pub fn match_by_id(&self, id: Uuid) -> Option<MatchEntity> {
            self.inner
                .lock()
                .unwrap()
                .matches
                .iter()
                .find(|entity| entity.id == id)
                .cloned()
        }

        pub fn stored_matches(&self) -> Vec<MatchEntity> {
            self.inner.lock().unwrap().matches.clone()
        }
    }

    impl DuelStore for MemoryDuelStore {
        fn insert_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
            let store = self.clone();
            Box::pin(async move {
                store.inner.lock().unwrap().matches.push(entity);
                Ok(())
            })
        }

        fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
            let store = self.clone();
            Box::pin(async move { Ok(store.match_by_id(id)) })
        }

        fn find_ongoing_match_for(
            &self,
            user_id: String,
        ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
            let store = self.clone();
            Box::pin(async move {
                let inner = store.inner.lock().unwrap();
                Ok(inner
                    .matches
                    .iter()
                    .find(|entity| {
                        entity.status == MatchStatus::Ongoing && entity.has_player(&user_id)
                    })
                    .cloned())
            })
        }

        fn list_matches_for(
            &self,
            user_id: String,
        ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
            let store = self.clone();
            Box::pin(async move {
                let inner = store.inner.lock().unwrap();
                let mut found: Vec<MatchEntity> = inner
                    .matches
                    .iter()
                    .filter(|entity| entity.has_player(&user_id))
                    .cloned()
                    .collect();
                found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                Ok(found)
            })
        }

        fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
            let store = self.clone();
            Box::pin(async move { Ok(store.stored_matches()) })
        }

        fn update_progress(
            &self,
            expected_version: i64,
            entity: MatchEntity,
        ) -> BoxFuture<'static, StorageResult<UpdateOutcome>> {
            let store = self.clone();
            Box::pin(async move {
                let mut inner = store.inner.lock().unwrap();
                if inner.injected_conflicts > 0 {
                    inner.injected_conflicts -= 1;
                    return Ok(UpdateOutcome::Conflict);
                }

                let Some(slot) = inner
                    .matches
                    .iter_mut()
                    .find(|stored| stored.id == entity.id && stored.version == expected_version)
                else {
                    return Ok(UpdateOutcome::Conflict);
                };

                *slot = entity;
                Ok(UpdateOutcome::Applied)
            })
        }

        fn join_waiting(
            &self,
            user_id: String,
            joined_at: SystemTime,
        ) -> BoxFuture<'static, StorageResult<()>> {
            let store = self.clone();
            Box::pin(async move {
                let mut inner = store.inner.lock().unwrap();
                if !inner.waiting.iter().any(|entry| entry.user_id == user_id) {
                    inner.waiting.push(WaitingEntity { user_id, joined_at });
                }
                Ok(())
            })
        }

        fn take_oldest_waiting_except(
            &self,
            user_id: String,
        ) -> BoxFuture<'static, StorageResult<Option<WaitingEntity>>> {
            let store = self.clone();
            Box::pin(async move {
                let mut inner = store.inner.lock().unwrap();
                let oldest = inner
                    .waiting
                    .iter()
                    .enumerate()
                    .filter(|(_, entry)| entry.user_id != user_id)
                    .min_by_key(|(_, entry)| entry.joined_at)
                    .map(|(index, _)| index);
                Ok(oldest.map(|index| inner.waiting.remove(index)))
            })
        }

        fn evict_stale_waiting(
            &self,
            cutoff: SystemTime,
        ) -> BoxFuture<'static, StorageResult<u64>> {
            let store = self.clone();
            Box::pin(async move {
                let mut inner = store.inner.lock().unwrap();
                let before = inner.waiting.len();
                inner.waiting.retain(|entry| entry.joined_at >= cutoff);
                Ok((before - inner.waiting.len()) as u64)
            })
        }

        fn leave_waiting(&self, user_id: String) -> BoxFuture<'static, StorageResult<u64>> {
            let store = self.clone();
            Box::pin(async move {
                let mut inner = store.inner.lock().unwrap();
                let before = inner.waiting.len();
                inner.waiting.retain(|entry| entry.user_id != user_id);
                Ok((before - inner.waiting.len()) as u64)
            })
        }

        fn count_waiting_except(&self, user_id: String) -> BoxFuture<'static, StorageResult<u64>> {
            let store = self.clone();
            Box::pin(async move {
                let inner = store.inner.lock().unwrap();
                Ok(inner
                    .waiting
                    .iter()
                    .filter(|entry| entry.user_id != user_id)
                    .count() as u64)
            })
        }

        fn list_waiting(&self) -> BoxFuture<'static, StorageResult<Vec<WaitingEntity>>> {
            let store = self.clone();
            Box::pin(async move { Ok(store.inner.lock().unwrap().waiting.clone()) })
        }

        fn clear_waiting(&self) -> BoxFuture<'static, StorageResult<u64>> {
            let store = self.clone();
            Box::pin(async move {
                let mut inner = store.inner.lock().unwrap();
                let cleared = inner.waiting.len() as u64;
                inner.waiting.clear();
                Ok(cleared)
            })
        }

        fn sample_flashcards(
            &self,
            count: usize,
        ) -> BoxFuture<'static, StorageResult<Vec<FlashcardEntity>>> {
            let store = self.clone();
            Box::pin(async move {
                let inner = store.inner.lock().unwrap();
                Ok(inner.flashcards.iter().take(count).cloned().collect())
            })
        }

        fn list_flashcards(&self) -> BoxFuture<'static, StorageResult<Vec<FlashcardEntity>>> {
            let store = self.clone();
            Box::pin(async move { Ok(store.inner.lock().unwrap().flashcards.clone()) })
        }

        fn upsert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
            let store = self.clone();
            Box::pin(async move {
                let mut inner = store.inner.lock().unwrap();
                if let Some(existing) = inner.users.iter_mut().find(|u| u.id == user.id) {
                    existing.email = user.email;
                } else {
                    inner.users.push(user);
                }
                Ok(())
            })
        }

        fn find_users(&self, ids: Vec<String>) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
            let store = self.clone();
            Box::pin(async move {
                let inner = store.inner.lock().unwrap();
                Ok(inner
                    .users
                    .iter()
                    .filter(|user| ids.iter().any(|id| *id == user.id))
                    .cloned()
                    .collect())
            })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn seconds_ago(base: SystemTime, seconds: u64) -> SystemTime {
        base - Duration::from_secs(seconds)
    }

    #[tokio::test]
    async fn take_oldest_skips_the_caller_and_removes_the_entry() {
        let store = MemoryDuelStore::new();
        let now = SystemTime::now();
        store
            .join_waiting("alice".into(), seconds_ago(now, 30))
            .await
            .unwrap();
        store
            .join_waiting("bob".into(), seconds_ago(now, 90))
            .await
            .unwrap();

        let taken = store
            .take_oldest_waiting_except("bob".into())
            .await
            .unwrap();

        let entry = taken.expect("an opponent should be available");
        assert_eq!(entry.user_id, "alice");
        assert_eq!(store.waiting_user_ids(), vec!["bob".to_string()]);
    }

    #[tokio::test]
    async fn take_oldest_returns_none_when_only_the_caller_waits() {
        let store = MemoryDuelStore::new();
        store
            .join_waiting("alice".into(), SystemTime::now())
            .await
            .unwrap();

        let taken = store
            .take_oldest_waiting_except("alice".into())
            .await
            .unwrap();

        assert!(taken.is_none());
        assert_eq!(store.waiting_user_ids(), vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn joining_twice_keeps_the_original_join_time() {
        let store = MemoryDuelStore::new();
        let now = SystemTime::now();
        let first = seconds_ago(now, 60);
        store.join_waiting("alice".into(), first).await.unwrap();
        store.join_waiting("alice".into(), now).await.unwrap();

        let entries = store.list_waiting().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].joined_at, first);
    }

    #[tokio::test]
    async fn eviction_only_removes_entries_older_than_the_cutoff() {
        let store = MemoryDuelStore::new();
        let now = SystemTime::now();
        store
            .join_waiting("stale".into(), seconds_ago(now, 300))
            .await
            .unwrap();
        store
            .join_waiting("fresh".into(), seconds_ago(now, 10))
            .await
            .unwrap();

        let evicted = store
            .evict_stale_waiting(seconds_ago(now, 120))
            .await
            .unwrap();

        assert_eq!(evicted, 1);
        assert_eq!(store.waiting_user_ids(), vec!["fresh".to_string()]);
    }

    #[tokio::test]
    async fn update_progress_refuses_a_stale_version() {
        use indexmap::IndexMap;

        let store = MemoryDuelStore::new();
        let now = SystemTime::now();
        let entity = MatchEntity {
            id: Uuid::new_v4(),
            players: vec![
                crate::dao::models::MatchPlayerEntity {
                    id: "alice".into(),
                    email: String::new(),
                },
                crate::dao::models::MatchPlayerEntity {
                    id: "bob".into(),
                    email: String::new(),
                },
            ],
            scores: IndexMap::from([("alice".to_string(), 0), ("bob".to_string(), 0)]),
            questions: vec![FlashcardEntity {
                question: "2+2?".into(),
                answer: "4".into(),
            }],
            current_question: 0,
            current_question_answers: IndexMap::new(),
            status: MatchStatus::Ongoing,
            host_id: "alice".into(),
            outcome: None,
            correct_answers: 0,
            wrong_answers: 0,
            created_at: now,
            last_updated: now,
            version: 0,
        };
        let id = entity.id;
        store.insert_match(entity.clone()).await.unwrap();

        let mut updated = entity.clone();
        updated
            .current_question_answers
            .insert("alice".to_string(), "4".to_string());
        updated.version = 1;

        let applied = store.update_progress(0, updated.clone()).await.unwrap();
        assert_eq!(applied, UpdateOutcome::Applied);
        assert_eq!(store.match_by_id(id).unwrap().version, 1);

        // Same expected version again: the first write already bumped it.
        let conflicted = store.update_progress(0, updated).await.unwrap();
        assert_eq!(conflicted, UpdateOutcome::Conflict);
    }
}
