use indexmap::IndexMap;
use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    FlashcardEntity, MatchEntity, MatchOutcomeEntity, MatchPlayerEntity, MatchStatus, UserEntity,
    WaitingEntity,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    players: Vec<MatchPlayerEntity>,
    scores: IndexMap<String, i32>,
    questions: Vec<FlashcardEntity>,
    current_question: usize,
    current_question_answers: IndexMap<String, String>,
    status: MatchStatus,
    host_id: String,
    outcome: Option<MatchOutcomeEntity>,
    #[serde(default)]
    correct_answers: i64,
    #[serde(default)]
    wrong_answers: i64,
    created_at: DateTime,
    last_updated: DateTime,
    pub version: i64,
}

impl From<MatchEntity> for MongoMatchDocument {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id,
            players: value.players,
            scores: value.scores,
            questions: value.questions,
            current_question: value.current_question,
            current_question_answers: value.current_question_answers,
            status: value.status,
            host_id: value.host_id,
            outcome: value.outcome,
            correct_answers: value.correct_answers,
            wrong_answers: value.wrong_answers,
            created_at: DateTime::from_system_time(value.created_at),
            last_updated: DateTime::from_system_time(value.last_updated),
            version: value.version,
        }
    }
}

impl From<MongoMatchDocument> for MatchEntity {
    fn from(value: MongoMatchDocument) -> Self {
        Self {
            id: value.id,
            players: value.players,
            scores: value.scores,
            questions: value.questions,
            current_question: value.current_question,
            current_question_answers: value.current_question_answers,
            status: value.status,
            host_id: value.host_id,
            outcome: value.outcome,
            correct_answers: value.correct_answers,
            wrong_answers: value.wrong_answers,
            created_at: value.created_at.to_system_time(),
            last_updated: value.last_updated.to_system_time(),
            version: value.version,
        }
    }
}

/// Waiting-pool entry keyed by the user id so joins are idempotent by
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoWaitingDocument {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub joined_at: DateTime,
}

impl From<MongoWaitingDocument> for WaitingEntity {
    fn from(value: MongoWaitingDocument) -> Self {
        Self {
            user_id: value.user_id,
            joined_at: value.joined_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoFlashcardDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    question: String,
    answer: String,
}

impl From<FlashcardEntity> for MongoFlashcardDocument {
    fn from(value: FlashcardEntity) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: value.question,
            answer: value.answer,
        }
    }
}

impl From<MongoFlashcardDocument> for FlashcardEntity {
    fn from(value: MongoFlashcardDocument) -> Self {
        Self {
            question: value.question,
            answer: value.answer,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUserDocument {
    #[serde(rename = "_id")]
    id: String,
    email: String,
}

impl From<UserEntity> for MongoUserDocument {
    fn from(value: UserEntity) -> Self {
        Self {
            id: value.id,
            email: value.email,
        }
    }
}

impl From<MongoUserDocument> for UserEntity {
    fn from(value: MongoUserDocument) -> Self {
        Self {
            id: value.id,
            email: value.email,
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
