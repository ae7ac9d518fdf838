use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for FlashDuel Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::matches::request_match,
        crate::routes::matches::match_history,
        crate::routes::matches::cancel_search,
        crate::routes::matches::ongoing_match,
        crate::routes::matches::get_match,
        crate::routes::matches::submit_answer,
        crate::routes::sse::match_stream,
        crate::routes::flashcards::list_flashcards,
        crate::routes::users::upsert_user,
        crate::routes::debug::list_waiting,
        crate::routes::debug::clear_waiting,
        crate::routes::debug::list_matches,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::matches::MatchRequestResponse,
            crate::dto::matches::MatchSnapshot,
            crate::dto::matches::MatchDetailResponse,
            crate::dto::matches::OngoingMatchResponse,
            crate::dto::matches::MatchListResponse,
            crate::dto::matches::CancelSearchResponse,
            crate::dto::matches::SubmitAnswerRequest,
            crate::dto::matches::SubmitAnswerResponse,
            crate::dto::flashcards::FlashcardListResponse,
            crate::dto::events::NewQuestionEvent,
            crate::dto::events::GameFinishedEvent,
            crate::dto::users::UpsertUserRequest,
            crate::dto::users::UpsertUserResponse,
            crate::dto::debug::WaitingListResponse,
            crate::dto::debug::ClearWaitingResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "matches", description = "Matchmaking, match progression and realtime streams"),
        (name = "flashcards", description = "Flashcard deck access"),
        (name = "users", description = "User profile upkeep"),
        (name = "debug", description = "Diagnostics, mounted only when enabled by configuration"),
    )
)]
pub struct ApiDoc;
