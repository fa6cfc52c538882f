//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{InMemoryFormStore, SubmissionLog},
    config::Config,
    error::ApiError,
    web::{build_router, AppState},
};
use chrono::Utc;
use recruitment_forms_core::{
    presets::candidate_profile_fields, FormDefinition, FormPublishingService, QuestionSpec,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_CAMPAIGN_ID: &str = "1";

/// Working draft for the demo campaign so the editor has something to show.
/// It asks for the full candidate profile so received applications can be
/// screened.
fn demo_definition() -> FormDefinition {
    FormDefinition {
        base_fields: candidate_profile_fields(Utc::now().date_naive()),
        title: "Responsable Comptable".to_string(),
        description: "Candidature pour le poste de Responsable Comptable".to_string(),
        questions: vec![
            QuestionSpec::new(
                "Pourquoi souhaitez-vous rejoindre notre entreprise ?",
                true,
            ),
            QuestionSpec::new(
                "Décrivez votre expérience en comptabilité générale.",
                true,
            ),
            QuestionSpec::new("Quelles sont vos prétentions salariales ?", true),
        ],
        require_cv: true,
        require_cover_letter: true,
        ..FormDefinition::default()
    }
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let forms = Arc::new(InMemoryFormStore::new());
    forms
        .save_draft(DEMO_CAMPAIGN_ID, &demo_definition())
        .await?;
    info!(campaign_id = DEMO_CAMPAIGN_ID, "Seeded demo campaign draft");

    let submissions = Arc::new(SubmissionLog::new(config.max_applications_per_form));

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        forms,
        applications: submissions.clone(),
        submissions,
        config: config.clone(),
    });

    // --- 4. Create the Web Router ---
    let app = build_router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
