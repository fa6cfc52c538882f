//! crates/recruitment_forms_core/src/instance.rs
//!
//! The form instance controller. It owns the live state of one form fill,
//! mediates field edits and runs the guarded submit pipeline against the
//! injected `SubmissionService`.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{
    Attachment, Attachments, FieldKey, FieldKind, FieldValue, FormDefinition, FormValues,
    NormalizedRecord, PublishedForm, QuestionAnswer,
};
use crate::ports::{PortError, SubmissionService};
use crate::schema::{compile, CompileError, Validator};
use crate::token::AddressToken;

/// Shown once when the submission collaborator refuses a valid application.
pub const SUBMISSION_FAILED_MESSAGE: &str =
    "Your application could not be submitted. Please try again.";

//=========================================================================================
// Errors
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
}

/// One or more fields fail their rule. Keys are wire keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationFailure {
    pub errors: BTreeMap<String, String>,
}

/// The submission collaborator rejected a structurally valid record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SubmissionFailure {
    pub message: String,
    #[source]
    pub source: PortError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("a submission is already in progress")]
    AlreadySubmitting,
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    #[error(transparent)]
    Submission(#[from] SubmissionFailure),
}

//=========================================================================================
// FormInstance
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    key: FieldKey,
    wire_key: String,
    kind: Option<FieldKind>,
    value: FieldValue,
}

/// Live, mutable state for one in-progress form fill.
#[derive(Debug, Clone, PartialEq)]
pub struct FormInstance {
    slots: Vec<Slot>,
    errors: BTreeMap<FieldKey, String>,
    notice: Option<String>,
    submitting: bool,
}

impl FormInstance {
    /// Default values for every slot of `definition`, in form order.
    pub fn initialize(definition: &FormDefinition) -> Self {
        let slots = definition
            .slots()
            .into_iter()
            .map(|(key, wire_key, kind)| Slot {
                key,
                wire_key,
                kind,
                value: FieldValue::default_for(kind),
            })
            .collect();
        Self {
            slots,
            errors: BTreeMap::new(),
            notice: None,
            submitting: false,
        }
    }

    pub fn values(&self) -> FormValues {
        self.slots
            .iter()
            .map(|slot| (slot.wire_key.clone(), slot.value.clone()))
            .collect()
    }

    pub fn value(&self, wire_key: &str) -> Option<&FieldValue> {
        self.slot(wire_key).map(|slot| &slot.value)
    }

    /// Current failures keyed by wire key.
    pub fn errors(&self) -> BTreeMap<String, String> {
        self.slots
            .iter()
            .filter_map(|slot| {
                self.errors
                    .get(&slot.key)
                    .map(|message| (slot.wire_key.clone(), message.clone()))
            })
            .collect()
    }

    pub fn error(&self, wire_key: &str) -> Option<&str> {
        self.slot(wire_key)
            .and_then(|slot| self.errors.get(&slot.key))
            .map(String::as_str)
    }

    /// The last non-field-scoped failure, cleared by the next submit.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    fn slot(&self, wire_key: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.wire_key == wire_key)
    }

    fn slot_mut(&mut self, wire_key: &str) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|slot| slot.wire_key == wire_key)
    }

    fn replace_errors(&mut self, failures: &BTreeMap<String, String>) {
        self.errors = self
            .slots
            .iter()
            .filter_map(|slot| {
                failures
                    .get(&slot.wire_key)
                    .map(|message| (slot.key.clone(), message.clone()))
            })
            .collect();
    }

    fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.value = FieldValue::default_for(slot.kind);
        }
        self.errors.clear();
        self.notice = None;
    }

    /// Keeps the values of slots that survive a definition change unchanged in
    /// identity and kind. Everything else starts from defaults.
    fn carry_over(&mut self, previous: &FormInstance) {
        for slot in &mut self.slots {
            if let Some(old) = previous
                .slots
                .iter()
                .find(|old| old.key == slot.key && old.kind == slot.kind)
            {
                slot.value = old.value.clone();
            }
        }
    }
}

//=========================================================================================
// FormController
//=========================================================================================

/// Owns one `FormInstance` together with the compiled validator of its
/// definition and the collaborator that receives successful submissions.
pub struct FormController {
    definition: FormDefinition,
    validator: Validator,
    form_token: Option<AddressToken>,
    instance: Mutex<FormInstance>,
    sink: Arc<dyn SubmissionService>,
}

impl FormController {
    pub fn new(
        definition: FormDefinition,
        sink: Arc<dyn SubmissionService>,
    ) -> Result<Self, CompileError> {
        let validator = compile(Some(&definition))?;
        let instance = Mutex::new(FormInstance::initialize(&definition));
        Ok(Self {
            definition,
            validator,
            form_token: None,
            instance,
            sink,
        })
    }

    /// A controller for the public page of a published form. Records it emits
    /// carry the form's token.
    pub fn for_published(
        form: &PublishedForm,
        sink: Arc<dyn SubmissionService>,
    ) -> Result<Self, CompileError> {
        let mut controller = Self::new(form.definition.clone(), sink)?;
        controller.form_token = Some(form.token.clone());
        Ok(controller)
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn snapshot(&self) -> FormInstance {
        self.instance.lock().clone()
    }

    pub fn values(&self) -> FormValues {
        self.instance.lock().values()
    }

    pub fn errors(&self) -> BTreeMap<String, String> {
        self.instance.lock().errors()
    }

    pub fn is_submitting(&self) -> bool {
        self.instance.lock().submitting
    }

    /// Overwrites one value. Other fields' errors are left alone; this field's
    /// error is cleared as soon as the new value passes its own rule.
    pub fn set_field(&self, wire_key: &str, value: FieldValue) -> Result<(), FieldError> {
        let passes = self.validator.check_field(wire_key, &value).is_none();
        let mut instance = self.instance.lock();
        let slot = instance
            .slot_mut(wire_key)
            .ok_or_else(|| FieldError::UnknownField(wire_key.to_string()))?;
        slot.value = value;
        let key = slot.key.clone();
        if passes {
            instance.errors.remove(&key);
        }
        Ok(())
    }

    /// Like `set_field`, coercing a loosely typed JSON input to the field's kind.
    pub fn set_field_json(&self, wire_key: &str, raw: &serde_json::Value) -> Result<(), FieldError> {
        let kind = self
            .definition
            .kind_of(wire_key)
            .ok_or_else(|| FieldError::UnknownField(wire_key.to_string()))?;
        self.set_field(wire_key, FieldValue::coerce(kind, raw))
    }

    /// Validates a single field when the user leaves it, recording or clearing
    /// its error. Returns the failure message, if any.
    pub fn blur_field(&self, wire_key: &str) -> Result<Option<String>, FieldError> {
        let mut instance = self.instance.lock();
        let slot = instance
            .slot(wire_key)
            .ok_or_else(|| FieldError::UnknownField(wire_key.to_string()))?;
        let key = slot.key.clone();
        let failure = self.validator.check_field(wire_key, &slot.value);
        match &failure {
            Some(message) => {
                instance.errors.insert(key, message.clone());
            }
            None => {
                instance.errors.remove(&key);
            }
        }
        Ok(failure)
    }

    /// Swaps in an edited definition. Answers of questions that still exist
    /// follow their question to its new position; values of removed questions
    /// and all errors are dropped.
    pub fn rebind(&mut self, definition: FormDefinition) -> Result<(), CompileError> {
        let validator = compile(Some(&definition))?;
        let mut instance = FormInstance::initialize(&definition);
        instance.carry_over(self.instance.get_mut());

        debug!(
            questions = definition.questions.len(),
            "Rebound form instance to edited definition"
        );
        self.definition = definition;
        self.validator = validator;
        *self.instance.get_mut() = instance;
        Ok(())
    }

    /// Validates and emits the current values.
    ///
    /// Rejected outright while another submission is in flight. On success the
    /// instance is reset to its defaults; on a collaborator failure the entered
    /// values are kept and a single notice is recorded.
    pub async fn submit(&self) -> Result<NormalizedRecord, SubmitError> {
        let record = {
            let mut instance = self.instance.lock();
            if instance.submitting {
                warn!("Ignoring submit while another submission is in flight");
                return Err(SubmitError::AlreadySubmitting);
            }
            instance.submitting = true;
            instance.notice = None;

            let values = instance.values();
            let failures = self.validator.check(&values);
            if !failures.is_empty() {
                instance.replace_errors(&failures);
                instance.submitting = false;
                debug!(failed = failures.len(), "Form submission failed validation");
                return Err(ValidationFailure { errors: failures }.into());
            }
            instance.errors.clear();
            self.normalize(values)
        };

        // Clears `submitting` however this future ends, including being dropped.
        let guard = SubmittingGuard(&self.instance);

        let outcome = self.sink.submit_application(&record).await;
        let result = match outcome {
            Ok(()) => {
                self.instance.lock().reset();
                info!(
                    token = ?self.form_token.as_ref().map(AddressToken::as_str),
                    answers = record.answers.len(),
                    "Application submitted"
                );
                Ok(record)
            }
            Err(e) => {
                warn!(error = %e, "Submission collaborator rejected a valid application");
                self.instance.lock().notice = Some(SUBMISSION_FAILED_MESSAGE.to_string());
                Err(SubmissionFailure {
                    message: SUBMISSION_FAILED_MESSAGE.to_string(),
                    source: e,
                }
                .into())
            }
        };
        drop(guard);
        result
    }

    fn normalize(&self, values: FormValues) -> NormalizedRecord {
        let answers = self
            .definition
            .questions
            .iter()
            .enumerate()
            .map(|(index, question)| QuestionAnswer {
                question_index: index,
                question: question.question.clone(),
                answer: values
                    .get(&crate::domain::question_key(index))
                    .map(FieldValue::display)
                    .unwrap_or_default(),
            })
            .collect();
        let flag = |attachment: Attachment| {
            values
                .get(attachment.wire_key())
                .is_some_and(FieldValue::as_flag)
        };
        let attachments = Attachments {
            cv: flag(Attachment::Cv),
            cover_letter: flag(Attachment::CoverLetter),
        };

        NormalizedRecord {
            form_token: self.form_token.clone(),
            answers,
            attachments,
            values,
            submitted_at: Utc::now(),
        }
    }
}

struct SubmittingGuard<'a>(&'a Mutex<FormInstance>);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().submitting = false;
    }
}
