//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        AchievementBadge, AnswerPayload, AnswerResponse, ConversationHistory,
        ConversationMessagePayload, ConversationReply, CulturalExplanation,
        CulturalQuestionPayload, DialogueContext, DialogueState, Entry, ErrorResponse,
        FeedbackResponse, Game, Language, MaxDifficultyResponse, Message, MessageRole, Progress,
        ProgressSummary, Round, StagesResponse, TopicPayload, TranslatePayload, TranslateResponse,
        TranslationReviewPayload,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_languages,
        handlers::list_games,
        handlers::get_entries,
        handlers::get_stages,
        handlers::get_max_difficulty,
        handlers::submit_answer,
        handlers::start_conversation,
        handlers::send_message,
        handlers::end_practice,
        handlers::get_conversation,
        handlers::get_progress,
        handlers::translate,
        handlers::review_translation,
        handlers::explain_culture,
    ),
    components(
        schemas(
            Language, Game, Entry, StagesResponse, MaxDifficultyResponse, Round, AnswerPayload,
            AnswerResponse, TopicPayload, ConversationMessagePayload, ConversationReply,
            DialogueContext, DialogueState, ConversationHistory, Message, MessageRole, Progress,
            ProgressSummary, AchievementBadge, TranslatePayload, TranslateResponse,
            TranslationReviewPayload, FeedbackResponse, CulturalQuestionPayload,
            CulturalExplanation, ErrorResponse
        )
    ),
    tags(
        (name = "Ubuntu Lingo API", description = "Cultural games and conversation practice for South African languages")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Group all routes that require AppState into their own router.
    let api_router = Router::new()
        .route("/languages", get(handlers::list_languages))
        .route("/games", get(handlers::list_games))
        .route(
            "/games/{game_type}/{language}/entries",
            get(handlers::get_entries),
        )
        .route(
            "/games/{game_type}/{language}/stages",
            get(handlers::get_stages),
        )
        .route(
            "/games/{game_type}/{language}/max-difficulty",
            get(handlers::get_max_difficulty),
        )
        .route(
            "/games/{game_type}/{language}/answers",
            post(handlers::submit_answer),
        )
        .route("/conversations/{language}", get(handlers::get_conversation))
        .route(
            "/conversations/{language}/start",
            post(handlers::start_conversation),
        )
        .route(
            "/conversations/{language}/messages",
            post(handlers::send_message),
        )
        .route("/conversations/{language}/end", post(handlers::end_practice))
        .route("/progress", get(handlers::get_progress))
        .route("/translate", post(handlers::translate))
        .route("/feedback/translations", post(handlers::review_translation))
        .route("/culture/explanations", post(handlers::explain_culture))
        // Apply the state ONLY to this group of routes.
        .with_state(app_state);

    // Create the final router that merges the stateful routes
    // with the stateless routes (like Swagger UI).
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Db, tests::memory_db};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use lingo_core::{
        catalog::ContentCatalog,
        conversation::ConversationContext,
        feedback::{FeedbackOutcome, FeedbackService, OfflineFeedback},
        phrasebook::Phrasebooks,
        speech::{MockSpeech, SilentSpeech, SpeechSynthesizer},
        store::{ChatMessage, ConversationStore, ProgressRecord, ProgressStore, StoredConversation},
        translation::{TranslationOutcome, Translator},
    };
    use mockall::mock;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    mock! {
        pub Translate {}

        #[async_trait]
        impl Translator for Translate {
            async fn translate(&self, text: &str, source: &str, target: &str) -> TranslationOutcome;
        }
    }

    mock! {
        pub Feedback {}

        #[async_trait]
        impl FeedbackService for Feedback {
            async fn review_translation(
                &self,
                phrase: &str,
                translation: &str,
                language: &str,
                context: &str,
            ) -> FeedbackOutcome;

            async fn explain_culture(
                &self,
                language: &str,
                topic: &str,
                subtopic: &str,
                question: &str,
            ) -> FeedbackOutcome;
        }
    }

    mock! {
        pub BrokenStore {}

        #[async_trait]
        impl ProgressStore for BrokenStore {
            async fn record_progress(
                &self,
                user_id: &str,
                resource_type: &str,
                resource_id: &str,
                progress: f64,
                completed: bool,
            ) -> anyhow::Result<()>;

            async fn progress_for(&self, user_id: &str) -> anyhow::Result<Vec<ProgressRecord>>;
        }

        #[async_trait]
        impl ConversationStore for BrokenStore {
            async fn save_conversation_state(
                &self,
                user_id: &str,
                language: &str,
                topic: &str,
                context: &ConversationContext,
                messages: &[ChatMessage],
            ) -> anyhow::Result<()>;

            async fn load_conversation_state(
                &self,
                user_id: &str,
                language: &str,
                topic: &str,
            ) -> anyhow::Result<Option<StoredConversation>>;
        }
    }

    fn translator(outcome: TranslationOutcome) -> Arc<dyn Translator> {
        let mut mock = MockTranslate::new();
        mock.expect_translate()
            .returning(move |_, _, _| outcome.clone());
        Arc::new(mock)
    }

    fn feedback(outcome: FeedbackOutcome) -> Arc<dyn FeedbackService> {
        let mut mock = MockFeedback::new();
        let review = outcome.clone();
        mock.expect_review_translation()
            .returning(move |_, _, _, _| review.clone());
        mock.expect_explain_culture()
            .returning(move |_, _, _, _| outcome.clone());
        Arc::new(mock)
    }

    fn state_with(
        db: Arc<Db>,
        speech: Arc<dyn SpeechSynthesizer>,
        translator: Arc<dyn Translator>,
        feedback: Arc<dyn FeedbackService>,
    ) -> AppState {
        AppState::new(
            Arc::new(ContentCatalog::builtin().unwrap()),
            Arc::new(Phrasebooks::builtin().unwrap()),
            db.clone(),
            db,
            speech,
            translator,
            feedback,
        )
    }

    async fn app_with(speech: Arc<dyn SpeechSynthesizer>, translator: Arc<dyn Translator>) -> Router {
        let db = Arc::new(memory_db().await);
        create_router(Arc::new(state_with(
            db,
            speech,
            translator,
            feedback(FeedbackOutcome::Unavailable("offline".to_string())),
        )))
    }

    async fn app() -> Router {
        app_with(
            Arc::new(MockSpeech),
            translator(TranslationOutcome::Translated("Sawubona".to_string())),
        )
        .await
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-user-id", "learner-1")
            .body(Body::empty())
            .unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-user-id", "learner-1")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_languages_and_games() {
        let app = app().await;

        let (status, body) = send(&app, get("/languages")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 12);

        let (status, body) = send(&app, get("/games?language=sasl")).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|g| g["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["sign_language_practice"]);
    }

    #[tokio::test]
    async fn test_entries_and_two_tier_misses() {
        let app = app().await;

        let (status, body) = send(&app, get("/games/proverb_match/zulu/entries")).await;
        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert!(!entries.is_empty());
        assert!(entries.iter().all(|e| e["difficulty"] == 1 && e["stage"] == 1));
        assert!(entries[0]["payload"]["proverb"].is_string());

        let (status, body) = send(&app, get("/games/chess/zulu/entries")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "game type not found");

        let (status, body) = send(&app, get("/games/cultural_quiz/venda/entries")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "language not supported for this game");

        let (status, body) =
            send(&app, get("/games/proverb_match/zulu/entries?difficulty=9&stage=1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "no content for difficulty level 9, stage 1");

        let (status, body) = send(&app, get("/games/chess/zulu/stages")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stages"], json!([]));

        let (status, body) = send(&app, get("/games/chess/zulu/max-difficulty")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["max_difficulty"], 1);
    }

    #[tokio::test]
    async fn test_answers_record_progress_and_achievements() {
        let app = app().await;

        let (status, entries) = send(&app, get("/games/proverb_match/xhosa/entries")).await;
        assert_eq!(status, StatusCode::OK);
        let meaning = entries[0]["payload"]["meaning"].as_str().unwrap().to_uppercase();
        let index = entries[0]["index"].as_u64().unwrap();

        let (status, body) = send(
            &app,
            post_json(
                "/games/proverb_match/xhosa/answers",
                json!({
                    "entry_index": index,
                    "answer": format!("  {}  ", meaning),
                    "round": {"total": 1, "answered": 0, "score": 0}
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["correct"], true);
        assert_eq!(body["round"]["score"], 1);
        assert_eq!(body["round_finished"], true);

        let (status, body) = send(&app, get("/progress")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["games_played"], 1);
        assert_eq!(body["proverbs_learned"], 1);
        assert_eq!(
            body["records"][0]["resource_id"],
            format!("proverb_match/xhosa/{}", index)
        );
    }

    #[tokio::test]
    async fn test_wrong_retry_keeps_a_learned_proverb() {
        let app = app().await;
        let (_, entries) = send(&app, get("/games/proverb_match/zulu/entries")).await;
        let meaning = entries[0]["payload"]["meaning"].as_str().unwrap().to_string();
        let index = entries[0]["index"].as_u64().unwrap();

        for answer in [meaning.as_str(), "something else entirely"] {
            send(
                &app,
                post_json(
                    "/games/proverb_match/zulu/answers",
                    json!({"entry_index": index, "answer": answer}),
                ),
            )
            .await;
        }

        let (_, body) = send(&app, get("/progress")).await;
        assert_eq!(body["proverbs_learned"], 1);
        assert_eq!(body["records"][0]["completed"], true);
    }

    #[tokio::test]
    async fn test_pair_answers_name_the_prompt_word() {
        let app = app().await;
        let answer = |answer: &str, slot: Option<&str>| {
            post_json(
                "/games/memory_match/zulu/answers",
                json!({"entry_index": 0, "answer": answer, "slot": slot}),
            )
        };

        let (status, body) = send(&app, answer("Hello", Some("sawubona"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["correct"], true);
        assert_eq!(body["context"], "Greetings");

        let (_, body) = send(&app, answer("sawubona", Some("sawubona"))).await;
        assert_eq!(body["correct"], false);

        let (status, _) = send(&app, answer("Hello", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, answer("Hello", Some("molo"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_answer_errors() {
        let app = app().await;

        let (status, _) = send(
            &app,
            post_json(
                "/games/proverb_match/xhosa/answers",
                json!({"entry_index": 2, "answer": "anything"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(
            &app,
            post_json(
                "/games/proverb_match/klingon/answers",
                json!({"entry_index": 0, "answer": "anything"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let request = Request::builder()
            .method("POST")
            .uri("/games/proverb_match/xhosa/answers")
            .header("content-type", "application/json")
            .body(Body::from(json!({"entry_index": 0, "answer": "x"}).to_string()))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "x-user-id header is required");
    }

    #[tokio::test]
    async fn test_conversation_flow_is_saved() {
        let app = app().await;

        let (status, body) = send(
            &app,
            post_json("/conversations/zulu/start", json!({"topic": "basics"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Sawubona! (Hello)");
        assert_eq!(body["context"]["state"], "greeting");
        assert!(body["audio"].is_string());

        let (_, body) = send(
            &app,
            post_json(
                "/conversations/zulu/messages",
                json!({"message": "Sawubona", "topic": "basics"}),
            ),
        )
        .await;
        assert_eq!(body["text"], "Unjani? (How are you?)");
        assert_eq!(body["context"]["state"], "conversation");

        let (status, body) = send(&app, get("/conversations/zulu?topic=basics")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["context"]["state"], "conversation");
        let roles: Vec<&str> = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["assistant", "user", "assistant"]);

        let (status, body) = send(
            &app,
            post_json("/conversations/zulu/end", json!({"topic": "basics"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "greeting");
        assert_eq!(body["practice_mode_enabled"], false);

        let (status, _) = send(&app, get("/conversations/zulu?topic=grammar")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_conversation_stays_in_the_row_it_was_opened_with() {
        let db = Arc::new(memory_db().await);
        let app = create_router(Arc::new(state_with(
            db.clone(),
            Arc::new(MockSpeech),
            translator(TranslationOutcome::Unavailable("offline".to_string())),
            Arc::new(OfflineFeedback),
        )));

        send(&app, post_json("/conversations/zulu/start", json!({}))).await;
        send(
            &app,
            post_json("/conversations/zulu/messages", json!({"message": "Sawubona"})),
        )
        .await;
        send(
            &app,
            post_json("/conversations/zulu/messages", json!({"message": "ngiyaphila"})),
        )
        .await;
        let (status, body) = send(
            &app,
            post_json(
                "/conversations/zulu/messages",
                json!({"message": "numbers", "topic": "numbers"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Let's practice numbers. Repeat after me: kunye");
        assert_eq!(body["context"]["state"], "practice");

        let (status, body) = send(&app, get("/conversations/zulu")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["topic"], "general");
        assert_eq!(body["context"]["state"], "practice");
        assert_eq!(body["context"]["current_topic"], "numbers");
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 7);
        assert_eq!(messages[5]["content"], "numbers");
        assert!(
            messages[0]["audio_ref"]
                .as_str()
                .unwrap()
                .starts_with("data:audio/mpeg;base64,")
        );
        assert!(messages[1]["audio_ref"].is_null());

        let (status, _) = send(&app, get("/conversations/zulu?topic=numbers")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // A fresh process picks the conversation up where it was saved.
        let restarted = create_router(Arc::new(state_with(
            db,
            Arc::new(MockSpeech),
            translator(TranslationOutcome::Unavailable("offline".to_string())),
            Arc::new(OfflineFeedback),
        )));
        let (status, body) = send(
            &restarted,
            post_json("/conversations/zulu/messages", json!({"message": "kunye"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Good! Now repeat after me: kubili");
        assert_eq!(body["context"]["current_topic"], "numbers");

        let (_, body) = send(&restarted, get("/conversations/zulu")).await;
        assert_eq!(body["messages"].as_array().unwrap().len(), 9);
    }

    #[tokio::test]
    async fn test_ending_practice_keeps_progress_and_frees_the_session() {
        let db = Arc::new(memory_db().await);
        let state = Arc::new(state_with(
            db,
            Arc::new(SilentSpeech),
            translator(TranslationOutcome::Unavailable("offline".to_string())),
            Arc::new(OfflineFeedback),
        ));
        let app = create_router(state.clone());

        send(&app, post_json("/conversations/xhosa/start", json!({}))).await;
        for message in ["Molo", "ndiphilile", "family"] {
            send(
                &app,
                post_json("/conversations/xhosa/messages", json!({"message": message})),
            )
            .await;
        }

        let conversation_record = |body: &Value| {
            body["records"]
                .as_array()
                .unwrap()
                .iter()
                .find(|r| r["resource_id"] == "xhosa/general")
                .cloned()
                .unwrap()
        };
        let (_, body) = send(&app, get("/progress")).await;
        let before = conversation_record(&body);
        assert_eq!(before["progress"], 1.0);
        assert_eq!(before["completed"], true);

        let (status, body) = send(&app, post_json("/conversations/xhosa/end", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "greeting");
        assert!(state.sessions.lock().await.is_empty());

        let (_, body) = send(&app, get("/progress")).await;
        let after = conversation_record(&body);
        assert_eq!(after["progress"], 1.0);
        assert_eq!(after["completed"], true);

        let (_, body) = send(&app, get("/conversations/xhosa")).await;
        assert_eq!(body["context"]["state"], "greeting");
        assert_eq!(body["context"]["practice_mode_enabled"], false);
    }

    #[tokio::test]
    async fn test_conversation_survives_speech_and_storage_failures() {
        let mut store = MockBrokenStore::new();
        store
            .expect_load_conversation_state()
            .returning(|_, _, _| Err(anyhow!("disk full")));
        store
            .expect_save_conversation_state()
            .returning(|_, _, _, _, _| Err(anyhow!("disk full")));
        store
            .expect_record_progress()
            .returning(|_, _, _, _, _| Err(anyhow!("disk full")));
        let store = Arc::new(store);

        let state = AppState::new(
            Arc::new(ContentCatalog::builtin().unwrap()),
            Arc::new(Phrasebooks::builtin().unwrap()),
            store.clone(),
            store,
            Arc::new(SilentSpeech),
            translator(TranslationOutcome::Unavailable("offline".to_string())),
            Arc::new(OfflineFeedback),
        );
        let app = create_router(Arc::new(state));

        let (status, body) = send(
            &app,
            post_json("/conversations/xhosa/messages", json!({"message": "Molo"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Unjani? (How are you?)");
        assert!(body["audio"].is_null());
    }

    #[tokio::test]
    async fn test_translate() {
        let app = app().await;
        let (status, body) = send(
            &app,
            post_json(
                "/translate",
                json!({"text": "Hello", "source": "en-ZA", "target": "zu-ZA"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["translation"], "Sawubona");

        let (status, _) = send(
            &app,
            post_json("/translate", json!({"text": "  ", "source": "en", "target": "zu"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let offline = app_with(
            Arc::new(SilentSpeech),
            translator(TranslationOutcome::Unavailable("offline".to_string())),
        )
        .await;
        let (status, body) = send(
            &offline,
            post_json(
                "/translate",
                json!({"text": "Hello", "source": "en-ZA", "target": "zu-ZA"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["message"].as_str().unwrap().contains("offline"));
    }

    #[tokio::test]
    async fn test_translate_accepts_language_names() {
        let mut mock = MockTranslate::new();
        mock.expect_translate()
            .withf(|text, source, target| text == "Thank you" && source == "en-ZA" && target == "xh-ZA")
            .times(1)
            .returning(|_, _, _| TranslationOutcome::Translated("Enkosi".to_string()));
        let app = app_with(Arc::new(SilentSpeech), Arc::new(mock)).await;

        let (status, body) = send(
            &app,
            post_json(
                "/translate",
                json!({"text": "Thank you", "source": "English", "target": "xhosa"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["translation"], "Enkosi");
    }

    #[tokio::test]
    async fn test_translation_feedback() {
        let db = Arc::new(memory_db().await);
        let online = create_router(Arc::new(state_with(
            db,
            Arc::new(SilentSpeech),
            translator(TranslationOutcome::Unavailable("offline".to_string())),
            feedback(FeedbackOutcome::Feedback("Accurate and natural.".to_string())),
        )));
        let review = json!({"phrase": "Hello", "translation": "Sawubona", "language": "zulu"});

        let (status, body) = send(&online, post_json("/feedback/translations", review.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["feedback"], "Accurate and natural.");

        let (status, _) = send(
            &online,
            post_json(
                "/feedback/translations",
                json!({"phrase": "Hello", "translation": " ", "language": "zulu"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let offline = app().await;
        let (status, body) = send(&offline, post_json("/feedback/translations", review)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["message"].as_str().unwrap().contains("offline"));
    }

    #[tokio::test]
    async fn test_cultural_explanations_fall_back_to_stock_text() {
        let question = json!({"language": "xhosa", "topic": "Music", "subtopic": "Drumming"});

        let offline = app().await;
        let (status, body) = send(&offline, post_json("/culture/explanations", question.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["generated"], false);
        assert_eq!(
            body["explanation"],
            lingo_core::feedback::fallback_explanation("Music", "Drumming")
        );

        let db = Arc::new(memory_db().await);
        let online = create_router(Arc::new(state_with(
            db,
            Arc::new(SilentSpeech),
            translator(TranslationOutcome::Unavailable("offline".to_string())),
            feedback(FeedbackOutcome::Feedback("Drums call people together.".to_string())),
        )));
        let (_, body) = send(&online, post_json("/culture/explanations", question)).await;
        assert_eq!(body["generated"], true);
        assert_eq!(body["explanation"], "Drums call people together.");

        let (status, _) = send(
            &online,
            post_json("/culture/explanations", json!({"language": "xhosa", "topic": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/languages",
            "/games",
            "/games/{game_type}/{language}/entries",
            "/games/{game_type}/{language}/answers",
            "/conversations/{language}/start",
            "/conversations/{language}",
            "/progress",
            "/translate",
            "/feedback/translations",
            "/culture/explanations",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
