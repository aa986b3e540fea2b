//! Main Entrypoint for the Ubuntu Lingo API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Opening the SQLite database and running migrations.
//! 3. Loading the game catalog and phrasebooks, and wiring the speech,
//!    translation and feedback capabilities.
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use lingo_api::{
    config::{Config, GEMINI_OPENAI_BASE, OPENAI_API_BASE, Provider},
    db::Db,
    router::create_router,
    state::AppState,
};
use lingo_core::{
    catalog::ContentCatalog,
    phrasebook::Phrasebooks,
    speech::{OpenAiSpeech, SilentSpeech, SpeechSynthesizer},
    feedback::{FeedbackService, LlmFeedback, OfflineFeedback},
    translation::{ChainTranslator, GoogleTranslator, LlmTranslator, Translator},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

fn openai_config(api_key: &str, api_base: &str) -> OpenAIConfig {
    OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(api_base)
}

/// Chat endpoint of the configured provider, if it has a key.
fn llm_config(config: &Config) -> Option<OpenAIConfig> {
    match config.provider {
        Provider::OpenAI => config
            .openai_api_key
            .as_deref()
            .map(|key| openai_config(key, OPENAI_API_BASE)),
        Provider::Gemini => config
            .gemini_api_key
            .as_deref()
            .map(|key| openai_config(key, GEMINI_OPENAI_BASE)),
    }
}

/// Speech needs an OpenAI key; without one replies are text only.
fn build_speech(config: &Config) -> Arc<dyn SpeechSynthesizer> {
    match &config.openai_api_key {
        Some(api_key) => {
            info!(model = %config.tts_model, voice = %config.tts_voice, "Using OpenAI speech.");
            Arc::new(OpenAiSpeech::new(
                openai_config(api_key, OPENAI_API_BASE),
                config.tts_model.clone(),
                &config.tts_voice,
            ))
        }
        None => {
            warn!("OPENAI_API_KEY not set; speech synthesis disabled.");
            Arc::new(SilentSpeech)
        }
    }
}

/// Google Translate first, then the configured LLM provider.
fn build_translator(config: &Config) -> Arc<dyn Translator> {
    let mut translators: Vec<Arc<dyn Translator>> = Vec::new();

    if let Some(api_key) = &config.google_translate_api_key {
        info!("Using Google Translate.");
        translators.push(Arc::new(GoogleTranslator::new(api_key.clone())));
    }

    if let Some(llm_config) = llm_config(config) {
        info!(provider = ?config.provider, model = %config.chat_model, "Using LLM translation.");
        translators.push(Arc::new(LlmTranslator::new(
            llm_config,
            config.chat_model.clone(),
        )));
    }

    let chain = ChainTranslator::new(translators);
    if chain.is_empty() {
        warn!("No translation backend configured; /translate will answer 503.");
    }
    Arc::new(chain)
}

fn build_feedback(config: &Config) -> Arc<dyn FeedbackService> {
    match llm_config(config) {
        Some(llm_config) => {
            info!(provider = ?config.provider, model = %config.chat_model, "Using LLM feedback.");
            Arc::new(LlmFeedback::new(llm_config, config.chat_model.clone()))
        }
        None => {
            warn!("No LLM provider key set; AI feedback disabled.");
            Arc::new(OfflineFeedback)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Database ---
    let db = Arc::new(
        Db::connect(&config.database_url)
            .await
            .context("Failed to connect to database")?,
    );
    db.run_migrations().await?;
    info!("Database connection established and migrations are up-to-date.");

    // --- 4. Load Content and Capabilities ---
    let catalog = Arc::new(ContentCatalog::builtin().context("Failed to load game content")?);
    let phrasebooks = Arc::new(Phrasebooks::builtin().context("Failed to load phrasebooks")?);
    info!(
        games = catalog.available_games(None).len(),
        phrasebooks = phrasebooks.languages().count(),
        "Content loaded."
    );

    let app_state = Arc::new(AppState::new(
        catalog,
        phrasebooks,
        db.clone(),
        db,
        build_speech(&config),
        build_translator(&config),
        build_feedback(&config),
    ));

    // --- 5. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 6. Start Server ---
    info!(
        provider = ?config.provider,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
