use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("missing environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save match `{id}`")]
    SaveMatch {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load match `{id}`")]
    LoadMatch {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to update match `{id}`")]
    UpdateMatch {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to query matches")]
    QueryMatches {
        #[source]
        source: MongoError,
    },
    #[error("failed to write waiting entry for `{user_id}`")]
    SaveWaiting {
        user_id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to query the waiting pool")]
    QueryWaiting {
        #[source]
        source: MongoError,
    },
    #[error("failed to delete waiting entries")]
    DropWaiting {
        #[source]
        source: MongoError,
    },
    #[error("failed to sample flashcards")]
    SampleFlashcards {
        #[source]
        source: MongoError,
    },
    #[error("failed to list flashcards")]
    ListFlashcards {
        #[source]
        source: MongoError,
    },
    #[error("failed to replace the flashcard deck")]
    ReplaceFlashcards {
        #[source]
        source: MongoError,
    },
    #[error("failed to save user `{id}`")]
    SaveUser {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load users")]
    LoadUsers {
        #[source]
        source: MongoError,
    },
}
