//! services/api/src/web/router.rs
//!
//! Assembles the axum router: API routes, CORS, body limit, request tracing
//! and the Swagger UI.

use crate::web::{applications, apply, campaigns, rest, state::AppState};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        Method,
    },
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_origin.clone())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let editor_routes = Router::new()
        .route(
            "/campaigns/{campaign_id}/form",
            get(campaigns::get_form_handler).put(campaigns::put_form_handler),
        )
        .route(
            "/campaigns/{campaign_id}/form/questions",
            post(campaigns::add_question_handler),
        )
        .route(
            "/campaigns/{campaign_id}/form/questions/{index}",
            put(campaigns::update_question_handler).delete(campaigns::remove_question_handler),
        )
        .route(
            "/campaigns/{campaign_id}/form/publish",
            post(campaigns::publish_form_handler),
        )
        .route(
            "/campaigns/{campaign_id}/forms",
            get(campaigns::list_forms_handler),
        )
        .route(
            "/campaigns/{campaign_id}/applications",
            get(applications::list_applications_handler),
        );

    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route(
            "/apply/{token}",
            get(apply::get_application_form_handler).post(apply::submit_application_handler),
        );

    let api_router = Router::new()
        .merge(editor_routes)
        .merge(public_routes)
        .layer(DefaultBodyLimit::max(app_state.config.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", rest::ApiDoc::openapi()))
}
