//! crates/recruitment_forms_core/src/domain.rs
//!
//! Defines the pure data structures of the forms engine: field specifications,
//! form definitions, runtime field values and the normalized record handed to
//! the submission collaborator once a form passes validation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

use crate::presets;
use crate::token::AddressToken;

/// Prefix of the wire key of every custom question (`question_0`, `question_1`, ...).
pub const QUESTION_KEY_PREFIX: &str = "question_";

//=========================================================================================
// Field Specifications
//=========================================================================================

/// The input kinds a form field can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    ShortText,
    Email,
    Phone,
    LongText,
    Date,
    Number,
    SingleChoice,
}

impl FieldKind {
    /// Text-like kinds hold a `FieldValue::Text`.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            FieldKind::ShortText | FieldKind::Email | FieldKind::Phone | FieldKind::LongText
        )
    }
}

/// Kind-specific constraints. Unset entries fall back to the kind's canonical rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<NaiveDate>,
}

/// One form field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    /// Allowed answers, only meaningful for `FieldKind::SingleChoice`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default)]
    pub constraints: Constraints,
    /// Overrides the message of the field's primary rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldSpec {
    /// Creates a required field of the given kind with no extra constraints.
    pub fn new(key: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            required: true,
            choices: Vec::new(),
            constraints: Constraints::default(),
            message: None,
        }
    }

    pub fn short_text(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::ShortText)
    }

    pub fn email(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Email)
    }

    pub fn phone(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Phone)
    }

    pub fn long_text(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::LongText)
    }

    pub fn date(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Date)
    }

    pub fn number(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Number)
    }

    pub fn single_choice(key: &str, label: &str, choices: &[&str]) -> Self {
        Self {
            choices: choices.iter().map(|c| c.to_string()).collect(),
            ..Self::new(key, label, FieldKind::SingleChoice)
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_min_length(mut self, min: usize) -> Self {
        self.constraints.min_length = Some(min);
        self
    }

    pub fn with_value_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.constraints.min_value = min;
        self.constraints.max_value = max;
        self
    }

    pub fn with_date_range(mut self, min: Option<NaiveDate>, max: Option<NaiveDate>) -> Self {
        self.constraints.min_date = min;
        self.constraints.max_date = max;
        self
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

//=========================================================================================
// Questions
//=========================================================================================

/// Stable identity of a custom question, assigned when the question is created.
///
/// Runtime values and errors of a question are keyed by this id, so removing or
/// reordering questions never moves an answer onto a different question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(Uuid);

impl QuestionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuestionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

fn default_question_kind() -> FieldKind {
    FieldKind::LongText
}

/// A recruiter-authored question appended after the base fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSpec {
    #[serde(default)]
    pub id: QuestionId,
    pub question: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_question_kind")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default)]
    pub constraints: Constraints,
}

impl QuestionSpec {
    pub fn new(question: &str, required: bool) -> Self {
        Self {
            id: QuestionId::new(),
            question: question.to_string(),
            required,
            kind: default_question_kind(),
            choices: Vec::new(),
            constraints: Constraints::default(),
        }
    }

    /// The field this question occupies at `index`. Text questions carry no
    /// implicit minimum length; requiredness alone decides presence.
    pub fn to_field_spec(&self, index: usize) -> FieldSpec {
        let mut constraints = self.constraints.clone();
        if self.kind.is_textual() {
            constraints.min_length = Some(constraints.min_length.unwrap_or(0));
        }
        FieldSpec {
            key: question_key(index),
            label: self.question.clone(),
            kind: self.kind,
            required: self.required,
            choices: self.choices.clone(),
            constraints,
            message: None,
        }
    }
}

/// Wire key of the question at `index`.
pub fn question_key(index: usize) -> String {
    format!("{}{}", QUESTION_KEY_PREFIX, index)
}

//=========================================================================================
// Form Definition
//=========================================================================================

/// A document a candidate may be asked to attach. Only presence is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attachment {
    Cv,
    CoverLetter,
}

impl Attachment {
    pub fn wire_key(self) -> &'static str {
        match self {
            Attachment::Cv => "cv",
            Attachment::CoverLetter => "coverLetter",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Attachment::Cv => "CV",
            Attachment::CoverLetter => "Cover letter",
        }
    }
}

/// Internal identity of a form slot. Wire keys are derived from it against the
/// current definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    Base(String),
    Question(QuestionId),
    Attachment(Attachment),
}

/// Declarative description of a form's fields and requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    pub title: String,
    pub description: String,
    #[serde(default = "presets::identity_fields")]
    pub base_fields: Vec<FieldSpec>,
    #[serde(default)]
    pub questions: Vec<QuestionSpec>,
    #[serde(default = "default_require_cv", rename = "requireCV")]
    pub require_cv: bool,
    #[serde(default)]
    pub require_cover_letter: bool,
}

fn default_require_cv() -> bool {
    true
}

impl Default for FormDefinition {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            base_fields: presets::identity_fields(),
            questions: Vec::new(),
            require_cv: true,
            require_cover_letter: false,
        }
    }
}

impl FormDefinition {
    /// Attachments the form asks for, in render order.
    pub fn required_attachments(&self) -> Vec<Attachment> {
        let mut attachments = Vec::new();
        if self.require_cv {
            attachments.push(Attachment::Cv);
        }
        if self.require_cover_letter {
            attachments.push(Attachment::CoverLetter);
        }
        attachments
    }

    /// Every slot of the form as `(key, wire key, kind)`, ordered base fields,
    /// then questions by position, then attachments. Attachments have no kind.
    pub fn slots(&self) -> Vec<(FieldKey, String, Option<FieldKind>)> {
        let base = self
            .base_fields
            .iter()
            .map(|f| (FieldKey::Base(f.key.clone()), f.key.clone(), Some(f.kind)));
        let questions = self
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| (FieldKey::Question(q.id), question_key(i), Some(q.kind)));
        let attachments = self
            .required_attachments()
            .into_iter()
            .map(|a| (FieldKey::Attachment(a), a.wire_key().to_string(), None));
        base.chain(questions).chain(attachments).collect()
    }

    /// Resolves a wire key against the current question order.
    pub fn resolve_wire_key(&self, wire_key: &str) -> Option<FieldKey> {
        self.slots()
            .into_iter()
            .find(|(_, wire, _)| wire == wire_key)
            .map(|(key, _, _)| key)
    }

    /// The kind of the slot behind a wire key, `None` for attachment flags.
    pub fn kind_of(&self, wire_key: &str) -> Option<Option<FieldKind>> {
        self.slots()
            .into_iter()
            .find(|(_, wire, _)| wire == wire_key)
            .map(|(_, _, kind)| kind)
    }
}

//=========================================================================================
// Runtime Values
//=========================================================================================

/// The current, possibly invalid, value of a single field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(Option<NaiveDate>),
    Choice(Option<String>),
    Flag(bool),
}

impl FieldValue {
    /// The value a freshly initialized slot holds.
    pub fn default_for(kind: Option<FieldKind>) -> Self {
        match kind {
            Some(FieldKind::Number) => FieldValue::Number(0.0),
            Some(FieldKind::Date) => FieldValue::Date(None),
            Some(FieldKind::SingleChoice) => FieldValue::Choice(None),
            Some(_) => FieldValue::Text(String::new()),
            None => FieldValue::Flag(false),
        }
    }

    /// Converts a loosely typed JSON input into the value shape of `kind`.
    ///
    /// Inputs that cannot be coerced are kept as raw text so that the field's
    /// rule reports them instead of the conversion silently dropping them.
    pub fn coerce(kind: Option<FieldKind>, raw: &serde_json::Value) -> Self {
        use serde_json::Value;

        match (kind, raw) {
            (None, Value::Bool(b)) => FieldValue::Flag(*b),
            (None, Value::Null) => FieldValue::Flag(false),
            (Some(FieldKind::Number), Value::Number(n)) => match n.as_f64() {
                Some(n) => FieldValue::Number(n),
                None => FieldValue::Text(n.to_string()),
            },
            (Some(FieldKind::Number), Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => FieldValue::Number(n),
                _ => FieldValue::Text(s.clone()),
            },
            (Some(FieldKind::Date), Value::Null) => FieldValue::Date(None),
            (Some(FieldKind::Date), Value::String(s)) if s.trim().is_empty() => {
                FieldValue::Date(None)
            }
            (Some(FieldKind::Date), Value::String(s)) => {
                match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
                    Ok(date) => FieldValue::Date(Some(date)),
                    Err(_) => FieldValue::Text(s.clone()),
                }
            }
            (Some(FieldKind::SingleChoice), Value::Null) => FieldValue::Choice(None),
            (Some(FieldKind::SingleChoice), Value::String(s)) if s.is_empty() => {
                FieldValue::Choice(None)
            }
            (Some(FieldKind::SingleChoice), Value::String(s)) => FieldValue::Choice(Some(s.clone())),
            (Some(kind), Value::Null) if kind.is_textual() => FieldValue::Text(String::new()),
            (Some(kind), Value::String(s)) if kind.is_textual() => FieldValue::Text(s.clone()),
            (Some(kind), Value::Number(n)) if kind.is_textual() => FieldValue::Text(n.to_string()),
            (_, Value::String(s)) => FieldValue::Text(s.clone()),
            (_, other) => FieldValue::Text(other.to_string()),
        }
    }

    /// Empty text (after trimming), unset date or choice, or an unchecked flag.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) => false,
            FieldValue::Date(d) => d.is_none(),
            FieldValue::Choice(c) => c.is_none(),
            FieldValue::Flag(b) => !b,
        }
    }

    pub fn as_flag(&self) -> bool {
        matches!(self, FieldValue::Flag(true))
    }

    /// Plain-text rendering used for question answers.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(d) => d.map(|d| d.to_string()).unwrap_or_default(),
            FieldValue::Choice(c) => c.clone().unwrap_or_default(),
            FieldValue::Flag(b) => b.to_string(),
        }
    }
}

/// Field values keyed by wire key, kept in form order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues(Vec<(String, FieldValue)>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the value for `key`, appending it when absent.
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        let mut values = FormValues::new();
        for (key, value) in iter {
            values.insert(key, value);
        }
        values
    }
}

impl Serialize for FormValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

//=========================================================================================
// Submission Output
//=========================================================================================

/// One answered question, projected for collaborators that do not know about
/// wire keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnswer {
    pub question_index: usize,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachments {
    pub cv: bool,
    pub cover_letter: bool,
}

/// The validated, structured output of a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_token: Option<AddressToken>,
    pub values: FormValues,
    pub answers: Vec<QuestionAnswer>,
    pub attachments: Attachments,
    pub submitted_at: DateTime<Utc>,
}

/// A form definition snapshot published under its own address token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedForm {
    pub token: AddressToken,
    pub campaign_id: String,
    pub definition: FormDefinition,
    pub published_at: DateTime<Utc>,
}
