//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling HTTP requests for the game
//! catalog, conversation practice, learning progress, translation and
//! AI feedback.
//! It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use lingo_core::{
    catalog::{CatalogError, GameType},
    conversation::{ConversationContext, ConversationState, ScriptedLine},
    feedback::{self, FeedbackOutcome},
    language::{self, speech_locale},
    scoring::{
        self, CONVERSATION_RESOURCE, GAME_RESOURCE, GameRound, UserProgress, game_resource_id,
    },
    speech::narrate,
    store::ChatMessage,
    translation::TranslationOutcome,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    models::{
        AnswerPayload, AnswerResponse, ConversationHistory, ConversationMessagePayload,
        ConversationQuery, ConversationReply, CulturalExplanation, CulturalQuestionPayload,
        DialogueContext, EntriesQuery, Entry, ErrorResponse, FeedbackResponse, Game, GamesQuery,
        Language, MaxDifficultyResponse, Message, Progress, ProgressSummary, StagesQuery,
        StagesResponse, TopicPayload, TranslatePayload, TranslateResponse,
        TranslationReviewPayload,
    },
    state::{ActiveConversation, AppState, LearnerSession},
};

/// Topic under which conversations without an explicit topic are stored.
pub const DEFAULT_TOPIC: &str = "general";

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unprocessable(String),
    Unavailable(String),
    InternalServerError(anyhow::Error),
}

impl ApiError {
    /// Maps catalog misses onto HTTP statuses; anything else is internal.
    pub fn from_catalog(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(message) => ApiError::NotFound(message),
            err @ CatalogError::IndexOutOfRange { .. } => ApiError::Unprocessable(err.to_string()),
            CatalogError::MissingSlot(message) => ApiError::BadRequest(message),
            other => ApiError::InternalServerError(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::Unprocessable(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(ErrorResponse { message })).into_response()
            }
            ApiError::Unavailable(message) => {
                (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

fn user_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest("x-user-id header is required".to_string()))
}

// --- Catalog ---

/// List the supported languages.
#[utoipa::path(
    get,
    path = "/languages",
    responses(
        (status = 200, description = "Supported languages", body = [Language])
    )
)]
pub async fn list_languages() -> Json<Vec<Language>> {
    Json(
        language::all()
            .iter()
            .map(Language::from)
            .collect(),
    )
}

/// List the games on offer, optionally only those available in a language.
#[utoipa::path(
    get,
    path = "/games",
    params(GamesQuery),
    responses(
        (status = 200, description = "Available games", body = [Game])
    )
)]
pub async fn list_games(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GamesQuery>,
) -> Json<Vec<Game>> {
    let games = state
        .catalog
        .available_games(query.language.as_deref())
        .into_iter()
        .map(Game::from)
        .collect();
    Json(games)
}

/// Get the entries of a game at a difficulty level and stage.
#[utoipa::path(
    get,
    path = "/games/{game_type}/{language}/entries",
    params(
        ("game_type" = String, Path, description = "Game type, e.g. proverb_match"),
        ("language" = String, Path, description = "Language key, e.g. zulu"),
        EntriesQuery
    ),
    responses(
        (status = 200, description = "Matching entries", body = [Entry]),
        (status = 404, description = "Unknown game, language, or no content at this level", body = ErrorResponse)
    )
)]
pub async fn get_entries(
    State(state): State<Arc<AppState>>,
    Path((game_type, language)): Path<(String, String)>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    let difficulty = query.difficulty.unwrap_or(1);
    let stage = query.stage.unwrap_or(1);

    let entries = state
        .catalog
        .indexed_entries(&game_type, &language, difficulty, stage)
        .map_err(ApiError::from_catalog)?
        .into_iter()
        .map(|(index, entry)| {
            Ok(Entry {
                index,
                difficulty: entry.difficulty,
                stage: entry.stage,
                payload: serde_json::to_value(&entry.payload)?,
            })
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;

    Ok(Json(entries))
}

/// List the stages available at a difficulty level. Empty when unknown.
#[utoipa::path(
    get,
    path = "/games/{game_type}/{language}/stages",
    params(
        ("game_type" = String, Path, description = "Game type"),
        ("language" = String, Path, description = "Language key"),
        StagesQuery
    ),
    responses(
        (status = 200, description = "Sorted stage numbers", body = StagesResponse)
    )
)]
pub async fn get_stages(
    State(state): State<Arc<AppState>>,
    Path((game_type, language)): Path<(String, String)>,
    Query(query): Query<StagesQuery>,
) -> Json<StagesResponse> {
    let stages = state
        .catalog
        .stages(&game_type, &language, query.difficulty.unwrap_or(1))
        .into_iter()
        .collect();
    Json(StagesResponse { stages })
}

/// Get the highest difficulty level of a game in a language (1 when unknown).
#[utoipa::path(
    get,
    path = "/games/{game_type}/{language}/max-difficulty",
    params(
        ("game_type" = String, Path, description = "Game type"),
        ("language" = String, Path, description = "Language key")
    ),
    responses(
        (status = 200, description = "Highest difficulty level", body = MaxDifficultyResponse)
    )
)]
pub async fn get_max_difficulty(
    State(state): State<Arc<AppState>>,
    Path((game_type, language)): Path<(String, String)>,
) -> Json<MaxDifficultyResponse> {
    Json(MaxDifficultyResponse {
        max_difficulty: state.catalog.max_difficulty(&game_type, &language),
    })
}

/// Check an answer to a game entry and record the learner's progress.
#[utoipa::path(
    post,
    path = "/games/{game_type}/{language}/answers",
    request_body = AnswerPayload,
    params(
        ("game_type" = String, Path, description = "Game type"),
        ("language" = String, Path, description = "Language key"),
        ("x-user-id" = String, Header, description = "The ID of the user answering")
    ),
    responses(
        (status = 200, description = "Answer checked", body = AnswerResponse),
        (status = 400, description = "Missing user id, or a pair game answered without its prompt word", body = ErrorResponse),
        (status = 404, description = "Unknown game, language, story slot or prompt word", body = ErrorResponse),
        (status = 422, description = "Entry index out of range", body = ErrorResponse)
    )
)]
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((game_type, language)): Path<(String, String)>,
    Json(payload): Json<AnswerPayload>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let user_id = user_id(&headers)?;
    let parsed_type: GameType = game_type.parse().map_err(ApiError::from_catalog)?;

    let check = state
        .catalog
        .check_answer(
            &game_type,
            &language,
            payload.entry_index,
            &payload.answer,
            payload.slot.as_deref(),
        )
        .map_err(ApiError::from_catalog)?;

    let round = payload.round.map(|round| {
        let mut round = GameRound::from(round);
        round.record(check.correct);
        round
    });

    let resource_id = game_resource_id(parsed_type, &language, payload.entry_index);
    if let Err(e) = state
        .progress_store
        .record_progress(&user_id, GAME_RESOURCE, &resource_id, 1.0, check.correct)
        .await
    {
        warn!(%user_id, %resource_id, "Failed to record game progress: {:?}", e);
    }

    Ok(Json(AnswerResponse::new(check, round)))
}

// --- Conversations ---

/// Resolves the topic a language's turns are stored under.
///
/// An open conversation keeps the topic it was opened with, so a later
/// message naming another topic still lands in the same row. Otherwise the
/// requested topic (or `general`) opens one, restoring any saved context and
/// transcript. The store is read without holding the sessions lock; storage
/// failures open an empty conversation.
async fn open_conversation(
    state: &AppState,
    user_id: &str,
    language: &str,
    requested_topic: Option<&str>,
) -> String {
    {
        let sessions = state.sessions.lock().await;
        if let Some(active) = sessions
            .get(user_id)
            .and_then(|session| session.conversations.get(language))
        {
            return active.topic.clone();
        }
    }

    let topic = requested_topic.unwrap_or(DEFAULT_TOPIC).to_string();
    let stored = match state
        .conversation_store
        .load_conversation_state(user_id, language, &topic)
        .await
    {
        Ok(stored) => stored,
        Err(e) => {
            warn!(%user_id, %language, %topic, "Failed to load conversation: {:?}", e);
            None
        }
    };

    let mut sessions = state.sessions.lock().await;
    let session = sessions
        .entry(user_id.to_string())
        .or_insert_with(|| LearnerSession::new(state.phrasebooks.clone()));
    if let Some(active) = session.conversations.get(language) {
        // Opened by a concurrent request while the store was read.
        return active.topic.clone();
    }
    let transcript = match stored {
        Some(stored) => {
            info!(%user_id, %language, %topic, "Restored saved conversation");
            session.driver.restore(language, stored.context);
            stored.messages
        }
        None => Vec::new(),
    };
    session.conversations.insert(
        language.to_string(),
        ActiveConversation::new(topic.clone(), transcript),
    );
    topic
}

/// Saves the conversation. Failures are only logged.
async fn save_conversation(
    state: &AppState,
    user_id: &str,
    language: &str,
    topic: &str,
    context: &ConversationContext,
    messages: &[ChatMessage],
) {
    if let Err(e) = state
        .conversation_store
        .save_conversation_state(user_id, language, topic, context, messages)
        .await
    {
        warn!(%user_id, %language, %topic, "Failed to save conversation: {:?}", e);
    }
}

async fn record_conversation_progress(
    state: &AppState,
    user_id: &str,
    language: &str,
    topic: &str,
    context: &ConversationContext,
) {
    let resource_id = format!("{}/{}", language, topic);
    if let Err(e) = state
        .progress_store
        .record_progress(
            user_id,
            CONVERSATION_RESOURCE,
            &resource_id,
            scoring::conversation_progress(context.state),
            context.state == ConversationState::Practice,
        )
        .await
    {
        warn!(%user_id, %resource_id, "Failed to record conversation progress: {:?}", e);
    }
}

/// Voices the driver's reply, appends it to the transcript and saves the turn.
async fn deliver(
    state: &AppState,
    user_id: &str,
    language: &str,
    topic: String,
    line: ScriptedLine,
) -> ConversationReply {
    let narrated = narrate(line, state.speech.as_ref(), speech_locale(language)).await;
    let audio = narrated.audio.map(|bytes| STANDARD.encode(bytes));
    let audio_ref = audio
        .as_ref()
        .map(|encoded| format!("data:audio/mpeg;base64,{}", encoded));

    let (topic, context, messages) = {
        let mut sessions = state.sessions.lock().await;
        let session = sessions
            .entry(user_id.to_string())
            .or_insert_with(|| LearnerSession::new(state.phrasebooks.clone()));
        let context = session
            .driver
            .context(language)
            .cloned()
            .unwrap_or_default();
        let conversation = session
            .conversations
            .entry(language.to_string())
            .or_insert_with(|| ActiveConversation::new(topic, Vec::new()));
        conversation.push(ChatMessage::assistant(narrated.text.clone()).with_audio_ref(audio_ref));
        (
            conversation.topic.clone(),
            context,
            conversation.transcript.clone(),
        )
    };

    save_conversation(state, user_id, language, &topic, &context, &messages).await;
    record_conversation_progress(state, user_id, language, &topic, &context).await;

    ConversationReply {
        text: narrated.text,
        audio,
        context: DialogueContext::from(&context),
    }
}

/// Start (or restart) a practice conversation in a language.
///
/// The conversation is stored under the given topic (default `general`)
/// until it ends or is restarted.
#[utoipa::path(
    post,
    path = "/conversations/{language}/start",
    request_body = TopicPayload,
    params(
        ("language" = String, Path, description = "Language key, e.g. zulu"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    ),
    responses(
        (status = 200, description = "Opening greeting", body = ConversationReply),
        (status = 400, description = "Bad request", body = ErrorResponse)
    )
)]
pub async fn start_conversation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(language): Path<String>,
    Json(payload): Json<TopicPayload>,
) -> Result<Json<ConversationReply>, ApiError> {
    let user_id = user_id(&headers)?;
    let topic = payload.topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string());

    let line = {
        let mut sessions = state.sessions.lock().await;
        let session = sessions
            .entry(user_id.clone())
            .or_insert_with(|| LearnerSession::new(state.phrasebooks.clone()));
        session.conversations.insert(
            language.clone(),
            ActiveConversation::new(topic.clone(), Vec::new()),
        );
        session.driver.start_conversation(&language)
    };
    info!(%user_id, %language, %topic, "Conversation started");

    Ok(Json(deliver(&state, &user_id, &language, topic, line).await))
}

/// Send a learner message and get the scripted reply.
///
/// `topic` steers the reply; it only picks the storage key when no
/// conversation is open for the language yet.
#[utoipa::path(
    post,
    path = "/conversations/{language}/messages",
    request_body = ConversationMessagePayload,
    params(
        ("language" = String, Path, description = "Language key"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    ),
    responses(
        (status = 200, description = "Scripted reply", body = ConversationReply),
        (status = 400, description = "Bad request", body = ErrorResponse)
    )
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(language): Path<String>,
    Json(payload): Json<ConversationMessagePayload>,
) -> Result<Json<ConversationReply>, ApiError> {
    let user_id = user_id(&headers)?;
    if payload.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }
    let topic = open_conversation(&state, &user_id, &language, payload.topic.as_deref()).await;

    let line = {
        let mut sessions = state.sessions.lock().await;
        let session = sessions
            .entry(user_id.clone())
            .or_insert_with(|| LearnerSession::new(state.phrasebooks.clone()));
        session
            .conversations
            .entry(language.clone())
            .or_insert_with(|| ActiveConversation::new(topic.clone(), Vec::new()))
            .push(ChatMessage::user(payload.message.clone()));
        session
            .driver
            .respond(&language, &payload.message, payload.topic.as_deref())
    };

    Ok(Json(deliver(&state, &user_id, &language, topic, line).await))
}

/// Leave practice mode. Repeating the call has no further effect.
///
/// The reset conversation is saved and then closed; learning progress
/// already earned is left as it is.
#[utoipa::path(
    post,
    path = "/conversations/{language}/end",
    request_body = TopicPayload,
    params(
        ("language" = String, Path, description = "Language key"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    ),
    responses(
        (status = 200, description = "Conversation reset", body = DialogueContext),
        (status = 400, description = "Bad request", body = ErrorResponse)
    )
)]
pub async fn end_practice(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(language): Path<String>,
    Json(payload): Json<TopicPayload>,
) -> Result<Json<DialogueContext>, ApiError> {
    let user_id = user_id(&headers)?;
    let topic = open_conversation(&state, &user_id, &language, payload.topic.as_deref()).await;

    let (topic, context, messages) = {
        let mut sessions = state.sessions.lock().await;
        let session = sessions
            .entry(user_id.clone())
            .or_insert_with(|| LearnerSession::new(state.phrasebooks.clone()));
        session.driver.end_practice(&language);
        let context = session
            .driver
            .context(&language)
            .cloned()
            .unwrap_or_default();
        let (topic, messages) = match session.close(&language) {
            Some(conversation) => (conversation.topic, conversation.transcript),
            None => (topic, Vec::new()),
        };
        if session.is_idle() {
            sessions.remove(&user_id);
        }
        (topic, context, messages)
    };

    save_conversation(&state, &user_id, &language, &topic, &context, &messages).await;
    info!(%user_id, %language, %topic, "Practice ended");

    Ok(Json(DialogueContext::from(&context)))
}

/// Get the saved conversation of a language and topic.
#[utoipa::path(
    get,
    path = "/conversations/{language}",
    params(
        ("language" = String, Path, description = "Language key"),
        ConversationQuery,
        ("x-user-id" = String, Header, description = "The ID of the user")
    ),
    responses(
        (status = 200, description = "Saved conversation", body = ConversationHistory),
        (status = 404, description = "No saved conversation", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(language): Path<String>,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<ConversationHistory>, ApiError> {
    let user_id = user_id(&headers)?;
    let topic = query.topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string());

    let stored = state
        .conversation_store
        .load_conversation_state(&user_id, &language, &topic)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "No saved conversation for language '{}' and topic '{}'",
                language, topic
            ))
        })?;

    Ok(Json(ConversationHistory {
        context: DialogueContext::from(&stored.context),
        messages: stored.messages.into_iter().map(Message::from).collect(),
        language,
        topic,
    }))
}

// --- Progress & translation ---

/// Get the learner's progress records and earned achievements.
#[utoipa::path(
    get,
    path = "/progress",
    params(
        ("x-user-id" = String, Header, description = "The ID of the user")
    ),
    responses(
        (status = 200, description = "Progress summary", body = ProgressSummary),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ProgressSummary>, ApiError> {
    let user_id = user_id(&headers)?;
    let records = state.progress_store.progress_for(&user_id).await?;
    let summary = UserProgress::from_records(&records);

    Ok(Json(ProgressSummary {
        games_played: summary.games_played,
        proverbs_learned: summary.proverbs_learned,
        achievements: scoring::achievements(&summary)
            .into_iter()
            .map(Into::into)
            .collect(),
        records: records.into_iter().map(Progress::from).collect(),
    }))
}

/// Translate text between two languages.
#[utoipa::path(
    post,
    path = "/translate",
    request_body = TranslatePayload,
    responses(
        (status = 200, description = "Translated text", body = TranslateResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 503, description = "No translator could serve the request", body = ErrorResponse)
    )
)]
pub async fn translate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TranslatePayload>,
) -> Result<Json<TranslateResponse>, ApiError> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }

    // Language names ("Zulu") are accepted alongside codes.
    let source = language::code_for_name(&payload.source).unwrap_or(payload.source.as_str());
    let target = language::code_for_name(&payload.target).unwrap_or(payload.target.as_str());

    match state.translator.translate(&payload.text, source, target).await {
        TranslationOutcome::Translated(translation) => Ok(Json(TranslateResponse { translation })),
        TranslationOutcome::Unavailable(reason) => {
            warn!(%source, %target, %reason, "Translation unavailable");
            Err(ApiError::Unavailable(format!(
                "Translation is currently unavailable: {}",
                reason
            )))
        }
    }
}

/// Get written feedback on a learner's translation of an English phrase.
#[utoipa::path(
    post,
    path = "/feedback/translations",
    request_body = TranslationReviewPayload,
    responses(
        (status = 200, description = "Model feedback", body = FeedbackResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 503, description = "No feedback model could serve the request", body = ErrorResponse)
    )
)]
pub async fn review_translation(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TranslationReviewPayload>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    if payload.phrase.trim().is_empty() || payload.translation.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "phrase and translation must not be empty".to_string(),
        ));
    }

    match state
        .feedback
        .review_translation(
            &payload.phrase,
            &payload.translation,
            &payload.language,
            &payload.context,
        )
        .await
    {
        FeedbackOutcome::Feedback(feedback) => Ok(Json(FeedbackResponse { feedback })),
        FeedbackOutcome::Unavailable(reason) => {
            warn!(language = %payload.language, %reason, "Translation feedback unavailable");
            Err(ApiError::Unavailable(format!(
                "Could not get AI feedback at this time: {}",
                reason
            )))
        }
    }
}

/// Explain a cultural topic. Falls back to a stock explanation when no model
/// is available.
#[utoipa::path(
    post,
    path = "/culture/explanations",
    request_body = CulturalQuestionPayload,
    responses(
        (status = 200, description = "Explanation", body = CulturalExplanation),
        (status = 400, description = "Bad request", body = ErrorResponse)
    )
)]
pub async fn explain_culture(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CulturalQuestionPayload>,
) -> Result<Json<CulturalExplanation>, ApiError> {
    if payload.topic.trim().is_empty() {
        return Err(ApiError::BadRequest("topic must not be empty".to_string()));
    }
    let subtopic = payload.subtopic.as_deref().unwrap_or(DEFAULT_TOPIC);
    let question = payload.question.as_deref().unwrap_or_default();

    let explanation = match state
        .feedback
        .explain_culture(&payload.language, &payload.topic, subtopic, question)
        .await
    {
        FeedbackOutcome::Feedback(explanation) => CulturalExplanation {
            explanation,
            generated: true,
        },
        FeedbackOutcome::Unavailable(reason) => {
            warn!(topic = %payload.topic, %reason, "Cultural explanation unavailable; using stock text");
            CulturalExplanation {
                explanation: feedback::fallback_explanation(&payload.topic, subtopic),
                generated: false,
            }
        }
    };
    Ok(Json(explanation))
}
