//! services/api/src/web/applications.rs
//!
//! Recruiter view of the applications a campaign's forms have received.

use crate::web::{
    campaigns::store_failure,
    protocol::{
        failure, ApiFailure, ApplicationListResponse, ApplicationQuery, ApplicationReceipt,
        ErrorBody,
    },
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use recruitment_forms_core::{AddressToken, CandidateFilter};
use std::sync::Arc;

/// List the applications received through every publication of a campaign,
/// optionally screened on the candidate profile.
#[utoipa::path(
    get,
    path = "/campaigns/{campaign_id}/applications",
    params(
        ("campaign_id" = String, Path, description = "Campaign identifier"),
        ApplicationQuery
    ),
    responses(
        (status = 200, description = "Matching applications, oldest first", body = ApplicationListResponse),
        (status = 400, description = "Contradictory criteria", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn list_applications_handler(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<String>,
    Query(query): Query<ApplicationQuery>,
) -> Result<impl IntoResponse, ApiFailure> {
    let filter = CandidateFilter::from(query);
    filter
        .validate()
        .map_err(|e| failure(StatusCode::BAD_REQUEST, e.to_string()))?;

    let tokens: Vec<AddressToken> = state
        .forms
        .list_published(&campaign_id)
        .await
        .map_err(|e| store_failure(e, "Failed to list forms"))?
        .into_iter()
        .map(|form| form.token)
        .collect();

    let applications: Vec<ApplicationReceipt> = state
        .applications
        .list_applications(&tokens, &filter)
        .await
        .map_err(|e| store_failure(e, "Failed to list applications"))?
        .into_iter()
        .map(ApplicationReceipt)
        .collect();

    Ok(Json(ApplicationListResponse {
        campaign_id,
        count: applications.len(),
        applications,
    }))
}
