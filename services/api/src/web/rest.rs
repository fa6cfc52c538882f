//! services/api/src/web/rest.rs
//!
//! Contains the master definition for the OpenAPI specification and the
//! liveness handler.

use crate::web::{applications, apply, campaigns, protocol};
use axum::response::Json;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        campaigns::get_form_handler,
        campaigns::put_form_handler,
        campaigns::add_question_handler,
        campaigns::update_question_handler,
        campaigns::remove_question_handler,
        campaigns::publish_form_handler,
        campaigns::list_forms_handler,
        applications::list_applications_handler,
        apply::get_application_form_handler,
        apply::submit_application_handler,
    ),
    components(
        schemas(
            HealthResponse,
            protocol::ErrorBody,
            protocol::FormDefinitionPayload,
            protocol::DraftResponse,
            protocol::QuestionPayload,
            protocol::AddQuestionResponse,
            protocol::PublicationResponse,
            protocol::FieldView,
            protocol::FormView,
            protocol::ApplicationPayload,
            protocol::ApplicationReceipt,
            protocol::ApplicationListResponse,
        )
    ),
    tags(
        (name = "Recruitment Forms API", description = "Campaign form editing, publication, public applications and screening.")
    )
)]
pub struct ApiDoc;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
