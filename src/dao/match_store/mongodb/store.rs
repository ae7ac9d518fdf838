use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{DateTime, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoFlashcardDocument, MongoMatchDocument, MongoUserDocument, MongoWaitingDocument,
        doc_id, uuid_as_binary,
    },
};
use crate::dao::{
    match_store::{DuelStore, UpdateOutcome},
    models::{FlashcardEntity, MatchEntity, UserEntity, WaitingEntity},
    storage::StorageResult,
};

const MATCH_COLLECTION_NAME: &str = "matches";
const WAITING_COLLECTION_NAME: &str = "waiting";
const FLASHCARD_COLLECTION_NAME: &str = "flashcards";
const USER_COLLECTION_NAME: &str = "users";

const STATUS_ONGOING: &str = "ongoing";

#[derive(Clone)]
pub struct MongoDuelStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoDuelStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        // FIFO pairing and staleness eviction both scan by join time.
        let waiting = database.collection::<MongoWaitingDocument>(WAITING_COLLECTION_NAME);
        let waiting_index = mongodb::IndexModel::builder()
            .keys(doc! {"joined_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("waiting_joined_at_idx".to_owned()))
                    .build(),
            )
            .build();
        waiting
            .create_index(waiting_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: WAITING_COLLECTION_NAME,
                index: "joined_at",
                source,
            })?;

        // Ongoing-match lookups and per-player history filter on these two.
        let matches = database.collection::<MongoMatchDocument>(MATCH_COLLECTION_NAME);
        let match_index = mongodb::IndexModel::builder()
            .keys(doc! {"players.id": 1, "status": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("match_player_status_idx".to_owned()))
                    .build(),
            )
            .build();
        matches
            .create_index(match_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: MATCH_COLLECTION_NAME,
                index: "players.id,status",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn match_collection(&self) -> Collection<MongoMatchDocument> {
        self.database()
            .await
            .collection::<MongoMatchDocument>(MATCH_COLLECTION_NAME)
    }

    async fn waiting_collection(&self) -> Collection<MongoWaitingDocument> {
        self.database()
            .await
            .collection::<MongoWaitingDocument>(WAITING_COLLECTION_NAME)
    }

    async fn flashcard_collection(&self) -> Collection<MongoFlashcardDocument> {
        self.database()
            .await
            .collection::<MongoFlashcardDocument>(FLASHCARD_COLLECTION_NAME)
    }

    async fn user_collection(&self) -> Collection<MongoUserDocument> {
        self.database()
            .await
            .collection::<MongoUserDocument>(USER_COLLECTION_NAME)
    }

    async fn insert_match(&self, entity: MatchEntity) -> MongoResult<()> {
        let id = entity.id;
        let document: MongoMatchDocument = entity.into();
        self.match_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveMatch { id, source })?;
        Ok(())
    }

    async fn find_match(&self, id: Uuid) -> MongoResult<Option<MatchEntity>> {
        let document = self
            .match_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadMatch { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn find_ongoing_match_for(&self, user_id: &str) -> MongoResult<Option<MatchEntity>> {
        let document = self
            .match_collection()
            .await
            .find_one(doc! {"players.id": user_id, "status": STATUS_ONGOING})
            .await
            .map_err(|source| MongoDaoError::QueryMatches { source })?;
        Ok(document.map(Into::into))
    }

    async fn list_matches_for(&self, user_id: &str) -> MongoResult<Vec<MatchEntity>> {
        let documents: Vec<MongoMatchDocument> = self
            .match_collection()
            .await
            .find(doc! {"players.id": user_id})
            .sort(doc! {"created_at": -1})
            .await
            .map_err(|source| MongoDaoError::QueryMatches { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryMatches { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_matches(&self) -> MongoResult<Vec<MatchEntity>> {
        let documents: Vec<MongoMatchDocument> = self
            .match_collection()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::QueryMatches { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryMatches { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    /// Replace the match document if and only if it still carries
    /// `expected_version`. A lost race surfaces as [`UpdateOutcome::Conflict`].
    async fn update_progress(
        &self,
        expected_version: i64,
        entity: MatchEntity,
    ) -> MongoResult<UpdateOutcome> {
        let id = entity.id;
        let document: MongoMatchDocument = entity.into();
        let result = self
            .match_collection()
            .await
            .replace_one(
                doc! {"_id": uuid_as_binary(id), "version": expected_version},
                &document,
            )
            .await
            .map_err(|source| MongoDaoError::UpdateMatch { id, source })?;

        if result.matched_count == 0 {
            Ok(UpdateOutcome::Conflict)
        } else {
            Ok(UpdateOutcome::Applied)
        }
    }

    async fn join_waiting(&self, user_id: &str, joined_at: SystemTime) -> MongoResult<()> {
        self.waiting_collection()
            .await
            .update_one(
                doc! {"_id": user_id},
                doc! {"$setOnInsert": {"joined_at": DateTime::from_system_time(joined_at)}},
            )
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveWaiting {
                user_id: user_id.to_owned(),
                source,
            })?;
        Ok(())
    }

    async fn take_oldest_waiting_except(&self, user_id: &str) -> MongoResult<Option<WaitingEntity>> {
        let document = self
            .waiting_collection()
            .await
            .find_one_and_delete(doc! {"_id": {"$ne": user_id}})
            .sort(doc! {"joined_at": 1})
            .await
            .map_err(|source| MongoDaoError::QueryWaiting { source })?;
        Ok(document.map(Into::into))
    }

    async fn evict_stale_waiting(&self, cutoff: SystemTime) -> MongoResult<u64> {
        let result = self
            .waiting_collection()
            .await
            .delete_many(doc! {"joined_at": {"$lt": DateTime::from_system_time(cutoff)}})
            .await
            .map_err(|source| MongoDaoError::DropWaiting { source })?;
        Ok(result.deleted_count)
    }

    async fn leave_waiting(&self, user_id: &str) -> MongoResult<u64> {
        let result = self
            .waiting_collection()
            .await
            .delete_many(doc! {"_id": user_id})
            .await
            .map_err(|source| MongoDaoError::DropWaiting { source })?;
        Ok(result.deleted_count)
    }

    async fn count_waiting_except(&self, user_id: &str) -> MongoResult<u64> {
        self.waiting_collection()
            .await
            .count_documents(doc! {"_id": {"$ne": user_id}})
            .await
            .map_err(|source| MongoDaoError::QueryWaiting { source })
    }

    async fn list_waiting(&self) -> MongoResult<Vec<WaitingEntity>> {
        let documents: Vec<MongoWaitingDocument> = self
            .waiting_collection()
            .await
            .find(doc! {})
            .sort(doc! {"joined_at": 1})
            .await
            .map_err(|source| MongoDaoError::QueryWaiting { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryWaiting { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn clear_waiting(&self) -> MongoResult<u64> {
        let result = self
            .waiting_collection()
            .await
            .delete_many(doc! {})
            .await
            .map_err(|source| MongoDaoError::DropWaiting { source })?;
        Ok(result.deleted_count)
    }

    async fn sample_flashcards(&self, count: usize) -> MongoResult<Vec<FlashcardEntity>> {
        let documents: Vec<MongoFlashcardDocument> = self
            .flashcard_collection()
            .await
            .aggregate(vec![doc! {"$sample": {"size": count as i64}}])
            .with_type::<MongoFlashcardDocument>()
            .await
            .map_err(|source| MongoDaoError::SampleFlashcards { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::SampleFlashcards { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_flashcards(&self) -> MongoResult<Vec<FlashcardEntity>> {
        let documents: Vec<MongoFlashcardDocument> = self
            .flashcard_collection()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListFlashcards { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListFlashcards { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    /// Drop the current deck and insert the given cards, returning how many
    /// were written. Used by the seeding tool, not by the serving path.
    pub async fn replace_flashcard_deck(&self, cards: Vec<FlashcardEntity>) -> MongoResult<u64> {
        let collection = self.flashcard_collection().await;
        collection
            .delete_many(doc! {})
            .await
            .map_err(|source| MongoDaoError::ReplaceFlashcards { source })?;

        if cards.is_empty() {
            return Ok(0);
        }

        let documents: Vec<MongoFlashcardDocument> = cards.into_iter().map(Into::into).collect();
        let result = collection
            .insert_many(&documents)
            .await
            .map_err(|source| MongoDaoError::ReplaceFlashcards { source })?;
        Ok(result.inserted_ids.len() as u64)
    }

    async fn upsert_user(&self, user: UserEntity) -> MongoResult<()> {
        self.user_collection()
            .await
            .update_one(
                doc! {"_id": user.id.as_str()},
                doc! {"$set": {"email": user.email.as_str()}},
            )
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveUser {
                id: user.id,
                source,
            })?;
        Ok(())
    }

    async fn find_users(&self, ids: Vec<String>) -> MongoResult<Vec<UserEntity>> {
        let documents: Vec<MongoUserDocument> = self
            .user_collection()
            .await
            .find(doc! {"_id": {"$in": ids}})
            .await
            .map_err(|source| MongoDaoError::LoadUsers { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadUsers { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }
}

impl DuelStore for MongoDuelStore {
    fn insert_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_match(entity).await.map_err(Into::into) })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_match(id).await.map_err(Into::into) })
    }

    fn find_ongoing_match_for(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_ongoing_match_for(&user_id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_matches_for(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_matches_for(&user_id).await.map_err(Into::into) })
    }

    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_matches().await.map_err(Into::into) })
    }

    fn update_progress(
        &self,
        expected_version: i64,
        entity: MatchEntity,
    ) -> BoxFuture<'static, StorageResult<UpdateOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_progress(expected_version, entity)
                .await
                .map_err(Into::into)
        })
    }

    fn join_waiting(
        &self,
        user_id: String,
        joined_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .join_waiting(&user_id, joined_at)
                .await
                .map_err(Into::into)
        })
    }

    fn take_oldest_waiting_except(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<WaitingEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .take_oldest_waiting_except(&user_id)
                .await
                .map_err(Into::into)
        })
    }

    fn evict_stale_waiting(&self, cutoff: SystemTime) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.evict_stale_waiting(cutoff).await.map_err(Into::into) })
    }

    fn leave_waiting(&self, user_id: String) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.leave_waiting(&user_id).await.map_err(Into::into) })
    }

    fn count_waiting_except(&self, user_id: String) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .count_waiting_except(&user_id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_waiting(&self) -> BoxFuture<'static, StorageResult<Vec<WaitingEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_waiting().await.map_err(Into::into) })
    }

    fn clear_waiting(&self) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.clear_waiting().await.map_err(Into::into) })
    }

    fn sample_flashcards(
        &self,
        count: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<FlashcardEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.sample_flashcards(count).await.map_err(Into::into) })
    }

    fn list_flashcards(&self) -> BoxFuture<'static, StorageResult<Vec<FlashcardEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_flashcards().await.map_err(Into::into) })
    }

    fn upsert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_user(user).await.map_err(Into::into) })
    }

    fn find_users(&self, ids: Vec<String>) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_users(ids).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
