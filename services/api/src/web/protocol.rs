//! services/api/src/web/protocol.rs
//!
//! Request and response payloads exchanged between the dashboard / public
//! application page and the API server.

use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use recruitment_forms_core::{
    CandidateFilter, FieldKind, FieldSpec, FieldValue, FormDefinition, FormInstance,
    NormalizedRecord, PublishedForm, QuestionId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// Errors
//=========================================================================================

/// Body of every non-2xx response.
#[derive(Serialize, Debug, ToSchema)]
pub struct ErrorBody {
    pub message: String,
    /// Per-field messages keyed by wire key, present on validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

/// The error half of every handler result.
pub type ApiFailure = (StatusCode, Json<ErrorBody>);

pub fn failure(status: StatusCode, message: impl Into<String>) -> ApiFailure {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
            errors: None,
        }),
    )
}

pub fn field_failure(
    status: StatusCode,
    message: impl Into<String>,
    errors: BTreeMap<String, String>,
) -> ApiFailure {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
            errors: Some(errors),
        }),
    )
}

//=========================================================================================
// Campaign Form Editor
//=========================================================================================

/// Payload of `PUT /campaigns/{campaign_id}/form`. Missing base fields default
/// to the identity fields.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct FormDefinitionPayload(pub FormDefinition);

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftResponse {
    pub campaign_id: String,
    #[schema(value_type = Object)]
    pub definition: FormDefinition,
}

/// Payload for adding or rewording a question.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(default)]
pub struct QuestionPayload {
    pub question: String,
    pub required: bool,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddQuestionResponse {
    pub index: usize,
    #[schema(value_type = String)]
    pub question_id: QuestionId,
    #[schema(value_type = Object)]
    pub definition: FormDefinition,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicationResponse {
    pub token: String,
    pub form_url: String,
    pub title: String,
    pub questions: usize,
    pub published_at: DateTime<Utc>,
}

impl PublicationResponse {
    pub fn new(form: &PublishedForm, form_url: String) -> Self {
        Self {
            token: form.token.to_string(),
            form_url,
            title: form.definition.title.clone(),
            questions: form.definition.questions.len(),
            published_at: form.published_at,
        }
    }
}

//=========================================================================================
// Public Application Page
//=========================================================================================

/// One field of the application page, in render order.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub key: String,
    pub label: String,
    /// Absent for attachment flags.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub kind: Option<FieldKind>,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[schema(value_type = Object)]
    pub default_value: FieldValue,
}

impl FieldView {
    fn from_spec(spec: &FieldSpec, default_value: FieldValue) -> Self {
        Self {
            key: spec.key.clone(),
            label: spec.label.clone(),
            kind: Some(spec.kind),
            required: spec.required,
            choices: spec.choices.clone(),
            default_value,
        }
    }
}

/// Everything the public page needs to render a published form.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub token: String,
    pub title: String,
    pub description: String,
    pub fields: Vec<FieldView>,
    #[serde(rename = "requireCV")]
    pub require_cv: bool,
    pub require_cover_letter: bool,
}

impl FormView {
    pub fn from_published(form: &PublishedForm) -> Self {
        let definition = &form.definition;
        let defaults = FormInstance::initialize(definition).values();
        let default_of = |key: &str| {
            defaults
                .get(key)
                .cloned()
                .unwrap_or(FieldValue::Text(String::new()))
        };

        let base = definition
            .base_fields
            .iter()
            .map(|spec| FieldView::from_spec(spec, default_of(&spec.key)));
        let questions = definition
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| q.to_field_spec(i))
            .map(|spec| FieldView::from_spec(&spec, default_of(&spec.key)));
        let attachments = definition.required_attachments().into_iter().map(|a| FieldView {
            key: a.wire_key().to_string(),
            label: a.label().to_string(),
            kind: None,
            required: true,
            choices: Vec::new(),
            default_value: FieldValue::Flag(false),
        });

        Self {
            token: form.token.to_string(),
            title: definition.title.clone(),
            description: definition.description.clone(),
            fields: base.chain(questions).chain(attachments).collect(),
            require_cv: definition.require_cv,
            require_cover_letter: definition.require_cover_letter,
        }
    }
}

/// Payload of `POST /apply/{token}`: wire key to raw value.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct ApplicationPayload(pub serde_json::Map<String, serde_json::Value>);

/// The record handed to the submission collaborator.
#[derive(Serialize, Debug, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct ApplicationReceipt(pub NormalizedRecord);

//=========================================================================================
// Received Applications
//=========================================================================================

/// Screening criteria for `GET /campaigns/{campaign_id}/applications`. List
/// values are comma separated.
#[derive(Deserialize, Debug, Default, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ApplicationQuery {
    /// Accepted education levels, e.g. `bac+5,doctorat`.
    pub education_level: Option<String>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    /// Accepted specializations, case-insensitive.
    pub specialization: Option<String>,
    pub min_years_of_experience: Option<f64>,
}

impl From<ApplicationQuery> for CandidateFilter {
    fn from(query: ApplicationQuery) -> Self {
        Self {
            education_levels: split_list(query.education_level.as_deref()),
            min_age: query.min_age,
            max_age: query.max_age,
            specializations: split_list(query.specialization.as_deref()),
            min_years_of_experience: query.min_years_of_experience,
        }
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListResponse {
    pub campaign_id: String,
    pub count: usize,
    pub applications: Vec<ApplicationReceipt>,
}
