//! services/api/src/web/apply.rs
//!
//! Handlers behind the public application page reached through a form's
//! unguessable link.

use crate::web::{
    campaigns::store_failure,
    protocol::{
        failure, field_failure, ApiFailure, ApplicationPayload, ApplicationReceipt, ErrorBody,
        FormView,
    },
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use recruitment_forms_core::{
    compile, AddressToken, FieldError, FormController, PublishedForm, SubmitError,
};
use std::sync::Arc;
use tracing::{error, warn};

const CONFIGURATION_ERROR: &str = "This form is misconfigured and cannot accept applications.";

async fn load_published(state: &AppState, raw_token: &str) -> Result<PublishedForm, ApiFailure> {
    let not_found = || failure(StatusCode::NOT_FOUND, "Form not found");
    let token = AddressToken::parse(raw_token).map_err(|_| not_found())?;
    state
        .forms
        .get_published(&token)
        .await
        .map_err(|e| store_failure(e, "Failed to load form"))
}

fn configuration_failure(token: &str, e: impl std::fmt::Display) -> ApiFailure {
    error!(%token, "Published form does not compile: {}", e);
    failure(StatusCode::INTERNAL_SERVER_ERROR, CONFIGURATION_ERROR)
}

/// Get the render view of a published form.
#[utoipa::path(
    get,
    path = "/apply/{token}",
    params(("token" = String, Path, description = "Public token of the form")),
    responses(
        (status = 200, description = "Fields in render order", body = FormView),
        (status = 404, description = "Unknown token", body = ErrorBody),
        (status = 500, description = "Form is misconfigured", body = ErrorBody)
    )
)]
pub async fn get_application_form_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiFailure> {
    let form = load_published(&state, &token).await?;
    compile(Some(&form.definition)).map_err(|e| configuration_failure(&token, e))?;
    Ok(Json(FormView::from_published(&form)))
}

/// Submit an application to a published form.
///
/// The body maps wire keys to raw values. Keys left out keep their defaults.
#[utoipa::path(
    post,
    path = "/apply/{token}",
    params(("token" = String, Path, description = "Public token of the form")),
    request_body = ApplicationPayload,
    responses(
        (status = 201, description = "Application accepted", body = ApplicationReceipt),
        (status = 400, description = "Unknown field", body = ErrorBody),
        (status = 404, description = "Unknown token", body = ErrorBody),
        (status = 422, description = "Fields failed validation", body = ErrorBody),
        (status = 500, description = "Form is misconfigured", body = ErrorBody),
        (status = 502, description = "Application was not recorded", body = ErrorBody)
    )
)]
pub async fn submit_application_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(ApplicationPayload(fields)): Json<ApplicationPayload>,
) -> Result<impl IntoResponse, ApiFailure> {
    let form = load_published(&state, &token).await?;
    let controller = FormController::for_published(&form, state.submissions.clone())
        .map_err(|e| configuration_failure(&token, e))?;

    for (key, raw) in &fields {
        controller
            .set_field_json(key, raw)
            .map_err(|FieldError::UnknownField(key)| {
                failure(StatusCode::BAD_REQUEST, format!("unknown field '{}'", key))
            })?;
    }

    match controller.submit().await {
        Ok(record) => Ok((StatusCode::CREATED, Json(ApplicationReceipt(record)))),
        Err(SubmitError::Validation(failed)) => Err(field_failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Some fields need attention.",
            failed.errors,
        )),
        Err(SubmitError::Submission(failed)) => {
            warn!(%token, error = %failed.source, "Application was not recorded");
            Err(failure(StatusCode::BAD_GATEWAY, failed.message))
        }
        // Each request owns its controller, so this only fires if one is shared.
        Err(e @ SubmitError::AlreadySubmitting) => {
            Err(failure(StatusCode::CONFLICT, e.to_string()))
        }
    }
}
