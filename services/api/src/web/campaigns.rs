//! services/api/src/web/campaigns.rs
//!
//! Handlers behind the recruiter's form editor: the working draft of a
//! campaign's application form, its questions, and publication.

use crate::web::{
    protocol::{
        failure, field_failure, AddQuestionResponse, ApiFailure, DraftResponse, ErrorBody,
        FormDefinitionPayload, PublicationResponse, QuestionPayload,
    },
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use recruitment_forms_core::{EditorError, FormDefinition, FormEditor, PortError};
use std::sync::Arc;
use tracing::{error, info};

/// Maps a form-store failure onto a response, logging anything unexpected.
pub(crate) fn store_failure(e: PortError, context: &str) -> ApiFailure {
    match e {
        PortError::NotFound(msg) => failure(StatusCode::NOT_FOUND, msg),
        PortError::Rejected(msg) => failure(StatusCode::CONFLICT, msg),
        PortError::Unexpected(msg) => {
            error!("{}: {}", context, msg);
            failure(StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    }
}

fn editor_failure(e: EditorError) -> ApiFailure {
    match e {
        EditorError::QuestionOutOfRange { .. } => failure(StatusCode::NOT_FOUND, e.to_string()),
        EditorError::Invalid(errors) => field_failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            "form definition is invalid",
            errors,
        ),
        EditorError::Compile(e) => failure(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        EditorError::Port(e) => store_failure(e, "Failed to publish form"),
    }
}

async fn load_draft(state: &AppState, campaign_id: &str) -> Result<FormDefinition, ApiFailure> {
    state
        .forms
        .get_draft(campaign_id)
        .await
        .map(Option::unwrap_or_default)
        .map_err(|e| store_failure(e, "Failed to load form draft"))
}

async fn store_draft(
    state: &AppState,
    campaign_id: &str,
    definition: &FormDefinition,
) -> Result<(), ApiFailure> {
    state
        .forms
        .save_draft(campaign_id, definition)
        .await
        .map_err(|e| store_failure(e, "Failed to save form draft"))
}

/// Get the working form definition of a campaign.
///
/// A campaign without a saved draft gets the default definition.
#[utoipa::path(
    get,
    path = "/campaigns/{campaign_id}/form",
    params(("campaign_id" = String, Path, description = "Campaign identifier")),
    responses(
        (status = 200, description = "Current draft", body = DraftResponse),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn get_form_handler(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<String>,
) -> Result<impl IntoResponse, ApiFailure> {
    let definition = load_draft(&state, &campaign_id).await?;
    Ok(Json(DraftResponse {
        campaign_id,
        definition,
    }))
}

/// Replace the working form definition of a campaign.
#[utoipa::path(
    put,
    path = "/campaigns/{campaign_id}/form",
    params(("campaign_id" = String, Path, description = "Campaign identifier")),
    request_body = FormDefinitionPayload,
    responses(
        (status = 200, description = "Draft saved", body = DraftResponse),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn put_form_handler(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<String>,
    Json(FormDefinitionPayload(definition)): Json<FormDefinitionPayload>,
) -> Result<impl IntoResponse, ApiFailure> {
    store_draft(&state, &campaign_id, &definition).await?;
    Ok(Json(DraftResponse {
        campaign_id,
        definition,
    }))
}

/// Append a question to the working definition.
#[utoipa::path(
    post,
    path = "/campaigns/{campaign_id}/form/questions",
    params(("campaign_id" = String, Path, description = "Campaign identifier")),
    request_body = QuestionPayload,
    responses(
        (status = 201, description = "Question added", body = AddQuestionResponse),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn add_question_handler(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<String>,
    Json(payload): Json<QuestionPayload>,
) -> Result<impl IntoResponse, ApiFailure> {
    let mut editor = FormEditor::from_definition(load_draft(&state, &campaign_id).await?);

    let index = editor.add_question();
    editor
        .update_question(index, payload.question, payload.required)
        .map_err(editor_failure)?;
    let definition = editor.into_definition();
    store_draft(&state, &campaign_id, &definition).await?;

    let question_id = definition.questions[index].id;
    Ok((
        StatusCode::CREATED,
        Json(AddQuestionResponse {
            index,
            question_id,
            definition,
        }),
    ))
}

/// Reword a question of the working definition.
#[utoipa::path(
    put,
    path = "/campaigns/{campaign_id}/form/questions/{index}",
    params(
        ("campaign_id" = String, Path, description = "Campaign identifier"),
        ("index" = usize, Path, description = "Position of the question")
    ),
    request_body = QuestionPayload,
    responses(
        (status = 200, description = "Question updated", body = DraftResponse),
        (status = 404, description = "No question at this position", body = ErrorBody)
    )
)]
pub async fn update_question_handler(
    State(state): State<Arc<AppState>>,
    Path((campaign_id, index)): Path<(String, usize)>,
    Json(payload): Json<QuestionPayload>,
) -> Result<impl IntoResponse, ApiFailure> {
    let mut editor = FormEditor::from_definition(load_draft(&state, &campaign_id).await?);
    editor
        .update_question(index, payload.question, payload.required)
        .map_err(editor_failure)?;
    let definition = editor.into_definition();
    store_draft(&state, &campaign_id, &definition).await?;
    Ok(Json(DraftResponse {
        campaign_id,
        definition,
    }))
}

/// Remove the question at `index`. Later questions move up one position.
#[utoipa::path(
    delete,
    path = "/campaigns/{campaign_id}/form/questions/{index}",
    params(
        ("campaign_id" = String, Path, description = "Campaign identifier"),
        ("index" = usize, Path, description = "Position of the question")
    ),
    responses(
        (status = 200, description = "Question removed", body = DraftResponse),
        (status = 404, description = "No question at this position", body = ErrorBody)
    )
)]
pub async fn remove_question_handler(
    State(state): State<Arc<AppState>>,
    Path((campaign_id, index)): Path<(String, usize)>,
) -> Result<impl IntoResponse, ApiFailure> {
    let mut editor = FormEditor::from_definition(load_draft(&state, &campaign_id).await?);
    editor.remove_question(index).map_err(editor_failure)?;
    let definition = editor.into_definition();
    store_draft(&state, &campaign_id, &definition).await?;
    Ok(Json(DraftResponse {
        campaign_id,
        definition,
    }))
}

/// Validate the working definition and publish it under a new token.
///
/// Every publication yields a new public link; earlier links keep working.
#[utoipa::path(
    post,
    path = "/campaigns/{campaign_id}/form/publish",
    params(("campaign_id" = String, Path, description = "Campaign identifier")),
    responses(
        (status = 201, description = "Form published", body = PublicationResponse),
        (status = 422, description = "Definition is invalid", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn publish_form_handler(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<String>,
) -> Result<impl IntoResponse, ApiFailure> {
    let editor = FormEditor::from_definition(load_draft(&state, &campaign_id).await?);
    let published = editor
        .save(&campaign_id, state.forms.as_ref())
        .await
        .map_err(editor_failure)?;

    let form_url = state.config.form_url(published.token.as_str());
    info!(%campaign_id, %form_url, "Form link ready");
    Ok((
        StatusCode::CREATED,
        Json(PublicationResponse::new(&published, form_url)),
    ))
}

/// List every publication of a campaign, oldest first.
#[utoipa::path(
    get,
    path = "/campaigns/{campaign_id}/forms",
    params(("campaign_id" = String, Path, description = "Campaign identifier")),
    responses(
        (status = 200, description = "Publications of the campaign", body = [PublicationResponse]),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn list_forms_handler(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<String>,
) -> Result<impl IntoResponse, ApiFailure> {
    let forms = state
        .forms
        .list_published(&campaign_id)
        .await
        .map_err(|e| store_failure(e, "Failed to list forms"))?;

    let publications: Vec<PublicationResponse> = forms
        .iter()
        .map(|form| PublicationResponse::new(form, state.config.form_url(form.token.as_str())))
        .collect();
    Ok(Json(publications))
}
