//! crates/recruitment_forms_core/src/schema.rs
//!
//! The schema compiler. A `FormDefinition` is turned into a `Validator`: an
//! ordered list of per-key rule sets, described as data so it can be inspected
//! and tested without any UI.

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

use crate::domain::{
    Attachment, FieldKind, FieldSpec, FieldValue, FormDefinition, FormValues, QuestionId,
};

const DEFAULT_SHORT_TEXT_MIN: usize = 2;
const DEFAULT_PHONE_MIN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("no form definition was provided")]
    MissingDefinition,

    #[error("form definition has no base fields")]
    NoBaseFields,

    #[error("field key '{0}' is used more than once")]
    DuplicateKey(String),

    #[error("single choice field '{0}' has no choices")]
    EmptyChoices(String),

    #[error("question id {0} is used by more than one question")]
    DuplicateQuestionId(QuestionId),
}

//=========================================================================================
// Rules
//=========================================================================================

/// A single check applied to one field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum Rule {
    /// The value has the shape of `kind`.
    Kind { kind: FieldKind, message: String },
    /// The value is not blank.
    Required { message: String },
    /// Trimmed text holds at least `min` characters.
    MinLength { min: usize, message: String },
    Email { message: String },
    MinValue { min: f64, message: String },
    MaxValue { max: f64, message: String },
    NotBefore { date: NaiveDate, message: String },
    NotAfter { date: NaiveDate, message: String },
    OneOf { choices: Vec<String>, message: String },
    /// An attachment flag is set.
    Checked { message: String },
}

impl Rule {
    pub fn message(&self) -> &str {
        match self {
            Rule::Kind { message, .. }
            | Rule::Required { message }
            | Rule::MinLength { message, .. }
            | Rule::Email { message }
            | Rule::MinValue { message, .. }
            | Rule::MaxValue { message, .. }
            | Rule::NotBefore { message, .. }
            | Rule::NotAfter { message, .. }
            | Rule::OneOf { message, .. }
            | Rule::Checked { message } => message,
        }
    }

    /// Whether `value` satisfies this rule. Rules that do not apply to the
    /// value's shape accept it; shape is checked by `Rule::Kind`.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (Rule::Kind { kind, .. }, value) => matches_kind(*kind, value),
            (Rule::Required { .. }, value) => !value.is_blank(),
            (Rule::MinLength { min, .. }, FieldValue::Text(s)) => s.trim().chars().count() >= *min,
            (Rule::Email { .. }, FieldValue::Text(s)) => email_regex().is_match(s.trim()),
            (Rule::MinValue { min, .. }, FieldValue::Number(n)) => n >= min,
            (Rule::MaxValue { max, .. }, FieldValue::Number(n)) => n <= max,
            (Rule::NotBefore { date, .. }, FieldValue::Date(Some(d))) => d >= date,
            (Rule::NotAfter { date, .. }, FieldValue::Date(Some(d))) => d <= date,
            (Rule::OneOf { choices, .. }, FieldValue::Choice(Some(c))) => choices.contains(c),
            (Rule::Checked { .. }, value) => value.as_flag(),
            _ => true,
        }
    }
}

fn matches_kind(kind: FieldKind, value: &FieldValue) -> bool {
    match value {
        FieldValue::Text(_) => kind.is_textual(),
        FieldValue::Number(_) => kind == FieldKind::Number,
        FieldValue::Date(_) => kind == FieldKind::Date,
        FieldValue::Choice(_) => kind == FieldKind::SingleChoice,
        FieldValue::Flag(_) => false,
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
            .expect("email pattern is valid")
    })
}

/// The ordered rules guarding one wire key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRules {
    pub key: String,
    /// Blank values skip every rule.
    pub optional: bool,
    pub rules: Vec<Rule>,
}

impl FieldRules {
    /// The message of the first failing rule, if any.
    pub fn check(&self, value: &FieldValue) -> Option<&str> {
        if self.optional && value.is_blank() {
            return None;
        }
        self.rules
            .iter()
            .find(|rule| !rule.accepts(value))
            .map(Rule::message)
    }
}

//=========================================================================================
// Validator
//=========================================================================================

/// Compiled rule set that checks a values mapping and reports per-field failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Validator {
    fields: Vec<FieldRules>,
}

impl Validator {
    pub fn rules(&self) -> &[FieldRules] {
        &self.fields
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    pub fn rules_for(&self, key: &str) -> Option<&FieldRules> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Checks every rule set against `values`, one message per failing key.
    /// A key missing from `values` is checked as blank text.
    pub fn check(&self, values: &FormValues) -> BTreeMap<String, String> {
        let blank = FieldValue::Text(String::new());
        self.fields
            .iter()
            .filter_map(|field| {
                let value = values.get(&field.key).unwrap_or(&blank);
                field
                    .check(value)
                    .map(|message| (field.key.clone(), message.to_string()))
            })
            .collect()
    }

    /// Checks one key in isolation. `None` when it passes or is not a known key.
    pub fn check_field(&self, key: &str, value: &FieldValue) -> Option<String> {
        self.rules_for(key)
            .and_then(|field| field.check(value))
            .map(str::to_string)
    }
}

//=========================================================================================
// Compilation
//=========================================================================================

/// Compiles a form definition into a validator.
///
/// Base fields come first, then one rule set per question keyed by position,
/// then presence rules for requested attachments.
pub fn compile(definition: Option<&FormDefinition>) -> Result<Validator, CompileError> {
    let definition = definition.ok_or(CompileError::MissingDefinition)?;
    if definition.base_fields.is_empty() {
        return Err(CompileError::NoBaseFields);
    }

    // Runtime state is keyed by question id, so ids must be unique.
    let mut ids = HashSet::new();
    if let Some(question) = definition.questions.iter().find(|q| !ids.insert(q.id)) {
        return Err(CompileError::DuplicateQuestionId(question.id));
    }

    let specs: Vec<FieldSpec> = definition
        .base_fields
        .iter()
        .cloned()
        .chain(
            definition
                .questions
                .iter()
                .enumerate()
                .map(|(i, q)| q.to_field_spec(i)),
        )
        .collect();

    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(specs.len() + 2);
    for spec in &specs {
        if !seen.insert(spec.key.clone()) {
            return Err(CompileError::DuplicateKey(spec.key.clone()));
        }
        fields.push(field_rules(spec)?);
    }

    for attachment in definition.required_attachments() {
        let key = attachment.wire_key().to_string();
        if !seen.insert(key.clone()) {
            return Err(CompileError::DuplicateKey(key));
        }
        fields.push(attachment_rules(attachment));
    }

    debug!(
        title = %definition.title,
        fields = fields.len(),
        questions = definition.questions.len(),
        "Compiled form definition"
    );
    Ok(Validator { fields })
}

fn field_rules(spec: &FieldSpec) -> Result<FieldRules, CompileError> {
    let c = &spec.constraints;
    let primary = |default: String| spec.message.clone().unwrap_or(default);
    let kind_rule = Rule::Kind {
        kind: spec.kind,
        message: kind_message(spec),
    };
    let mut rules = vec![kind_rule];

    match spec.kind {
        FieldKind::ShortText | FieldKind::LongText | FieldKind::Phone => {
            let default_min = match spec.kind {
                FieldKind::ShortText => DEFAULT_SHORT_TEXT_MIN,
                FieldKind::Phone => DEFAULT_PHONE_MIN,
                _ => 0,
            };
            let min = c.min_length.unwrap_or(default_min);
            if min == 0 {
                if spec.required {
                    rules.push(Rule::Required {
                        message: primary("this field is required".to_string()),
                    });
                }
            } else {
                let message = match spec.kind {
                    FieldKind::Phone => primary("invalid phone number".to_string()),
                    _ => primary(format!(
                        "{} must contain at least {} characters",
                        spec.label, min
                    )),
                };
                rules.push(Rule::MinLength { min, message });
            }
        }
        FieldKind::Email => {
            if let Some(min) = c.min_length.filter(|m| *m > 0) {
                rules.push(Rule::MinLength {
                    min,
                    message: format!("{} must contain at least {} characters", spec.label, min),
                });
            }
            rules.push(Rule::Email {
                message: primary("invalid email address".to_string()),
            });
        }
        FieldKind::Number => {
            if let Some(min) = c.min_value {
                rules.push(Rule::MinValue {
                    min,
                    message: primary(format!("{} must be at least {}", spec.label, min)),
                });
            }
            if let Some(max) = c.max_value {
                rules.push(Rule::MaxValue {
                    max,
                    message: format!("{} must be at most {}", spec.label, max),
                });
            }
        }
        FieldKind::Date => {
            if spec.required {
                rules.push(Rule::Required {
                    message: primary(format!("{} is required", spec.label)),
                });
            }
            if let Some(date) = c.min_date {
                rules.push(Rule::NotBefore {
                    date,
                    message: format!("{} must not be before {}", spec.label, date),
                });
            }
            if let Some(date) = c.max_date {
                rules.push(Rule::NotAfter {
                    date,
                    message: format!("{} must not be after {}", spec.label, date),
                });
            }
        }
        FieldKind::SingleChoice => {
            if spec.choices.is_empty() {
                return Err(CompileError::EmptyChoices(spec.key.clone()));
            }
            if spec.required {
                rules.push(Rule::Required {
                    message: primary(format!("{} is required", spec.label)),
                });
            }
            rules.push(Rule::OneOf {
                choices: spec.choices.clone(),
                message: format!("{} must be one of the offered choices", spec.label),
            });
        }
    }

    Ok(FieldRules {
        key: spec.key.clone(),
        optional: !spec.required,
        rules,
    })
}

fn kind_message(spec: &FieldSpec) -> String {
    match spec.kind {
        FieldKind::Number => format!("{} must be a number", spec.label),
        FieldKind::Date => format!("{} must be a date (YYYY-MM-DD)", spec.label),
        FieldKind::SingleChoice => format!("{} must be one of the offered choices", spec.label),
        _ => format!("{} must be text", spec.label),
    }
}

fn attachment_rules(attachment: Attachment) -> FieldRules {
    let message = match attachment {
        Attachment::Cv => "CV is required",
        Attachment::CoverLetter => "cover letter is required",
    };
    FieldRules {
        key: attachment.wire_key().to_string(),
        optional: false,
        rules: vec![Rule::Checked {
            message: message.to_string(),
        }],
    }
}
