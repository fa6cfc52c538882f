//! crates/recruitment_forms_core/src/editor.rs
//!
//! Campaign-side editing of a form definition, and publication of the result
//! under a fresh address token.

use chrono::Utc;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

use crate::domain::{FormDefinition, PublishedForm, QuestionSpec};
use crate::ports::{FormPublishingService, PortError};
use crate::schema::{compile, CompileError};
use crate::token::AddressToken;

const MIN_TITLE_CHARS: usize = 2;
const MIN_DESCRIPTION_CHARS: usize = 10;
const MIN_QUESTION_CHARS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("question {index} does not exist (the form has {len} questions)")]
    QuestionOutOfRange { index: usize, len: usize },

    /// Editor fields that fail their rule, keyed like `title` or `questions.0.question`.
    #[error("form definition is invalid: {} field(s) failed", .0.len())]
    Invalid(BTreeMap<String, String>),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Port(#[from] PortError),
}

/// Mutates a working `FormDefinition` before it is compiled or published.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormEditor {
    definition: FormDefinition,
}

impl FormEditor {
    /// Starts from an empty form that asks for a CV and no cover letter.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definition(definition: FormDefinition) -> Self {
        Self { definition }
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    pub fn into_definition(self) -> FormDefinition {
        self.definition
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.definition.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.definition.description = description.into();
    }

    pub fn set_require_cv(&mut self, required: bool) {
        self.definition.require_cv = required;
    }

    pub fn set_require_cover_letter(&mut self, required: bool) {
        self.definition.require_cover_letter = required;
    }

    /// Appends an empty optional question and returns its index. Earlier
    /// questions keep their positions.
    pub fn add_question(&mut self) -> usize {
        self.definition.questions.push(QuestionSpec::new("", false));
        self.definition.questions.len() - 1
    }

    pub fn update_question(
        &mut self,
        index: usize,
        question: impl Into<String>,
        required: bool,
    ) -> Result<(), EditorError> {
        let len = self.definition.questions.len();
        let entry = self
            .definition
            .questions
            .get_mut(index)
            .ok_or(EditorError::QuestionOutOfRange { index, len })?;
        entry.question = question.into();
        entry.required = required;
        Ok(())
    }

    /// Removes exactly the question at `index`; later questions shift down one
    /// position. Live form instances must be rebound afterwards.
    pub fn remove_question(&mut self, index: usize) -> Result<QuestionSpec, EditorError> {
        let len = self.definition.questions.len();
        if index >= len {
            return Err(EditorError::QuestionOutOfRange { index, len });
        }
        Ok(self.definition.questions.remove(index))
    }

    /// Checks the editor's own rules: a title of at least 2 characters, a
    /// description of at least 10 and questions of at least 5.
    pub fn validate(&self) -> Result<(), EditorError> {
        let mut errors = BTreeMap::new();
        if char_count(&self.definition.title) < MIN_TITLE_CHARS {
            errors.insert(
                "title".to_string(),
                format!("title must contain at least {} characters", MIN_TITLE_CHARS),
            );
        }
        if char_count(&self.definition.description) < MIN_DESCRIPTION_CHARS {
            errors.insert(
                "description".to_string(),
                format!(
                    "description must contain at least {} characters",
                    MIN_DESCRIPTION_CHARS
                ),
            );
        }
        for (i, question) in self.definition.questions.iter().enumerate() {
            if char_count(&question.question) < MIN_QUESTION_CHARS {
                errors.insert(
                    format!("questions.{}.question", i),
                    format!(
                        "question must contain at least {} characters",
                        MIN_QUESTION_CHARS
                    ),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(EditorError::Invalid(errors))
        }
    }

    /// Validates the definition, then publishes it under a freshly generated
    /// token. Every save yields a new token; earlier ones stay valid.
    pub async fn save(
        &self,
        campaign_id: &str,
        publisher: &dyn FormPublishingService,
    ) -> Result<PublishedForm, EditorError> {
        self.validate()?;
        compile(Some(&self.definition))?;

        let published = PublishedForm {
            token: AddressToken::generate(),
            campaign_id: campaign_id.to_string(),
            definition: self.definition.clone(),
            published_at: Utc::now(),
        };
        publisher.publish(&published).await?;

        info!(
            campaign_id,
            token = %published.token,
            questions = published.definition.questions.len(),
            "Published application form"
        );
        Ok(published)
    }
}

fn char_count(s: &str) -> usize {
    s.trim().chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockFormPublishingService;

    fn filled() -> FormEditor {
        let mut editor = FormEditor::new();
        editor.set_title("Candidature - Responsable Comptable");
        editor.set_description("Merci de remplir ce formulaire pour postuler");
        editor
    }

    #[test]
    fn new_forms_ask_for_a_cv_only() {
        let editor = FormEditor::new();
        assert!(editor.definition().require_cv);
        assert!(!editor.definition().require_cover_letter);
        assert!(editor.definition().questions.is_empty());
    }

    #[test]
    fn add_appends_without_moving_existing_questions() {
        let mut editor = filled();
        editor.add_question();
        editor.update_question(0, "Quels logiciels maîtrisez-vous ?", true).unwrap();
        let first_id = editor.definition().questions[0].id;

        assert_eq!(editor.add_question(), 1);
        let questions = &editor.definition().questions;
        assert_eq!(questions[0].id, first_id);
        assert_eq!(questions[1].question, "");
        assert!(!questions[1].required);
    }

    #[test]
    fn remove_shifts_later_questions_down() {
        let mut editor = filled();
        for text in ["First question", "Second question", "Third question"] {
            let i = editor.add_question();
            editor.update_question(i, text, false).unwrap();
        }

        let removed = editor.remove_question(0).unwrap();
        assert_eq!(removed.question, "First question");
        let texts: Vec<&str> = editor
            .definition()
            .questions
            .iter()
            .map(|q| q.question.as_str())
            .collect();
        assert_eq!(texts, vec!["Second question", "Third question"]);

        assert_eq!(
            editor.remove_question(2),
            Err(EditorError::QuestionOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn validate_reports_each_short_field() {
        let mut editor = FormEditor::new();
        editor.set_title("X");
        editor.add_question();

        let Err(EditorError::Invalid(errors)) = editor.validate() else {
            panic!("expected validation errors");
        };
        assert_eq!(
            errors.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["description", "questions.0.question", "title"]
        );
    }

    #[tokio::test]
    async fn save_publishes_under_a_new_token_each_time() {
        let mut publisher = MockFormPublishingService::new();
        publisher
            .expect_publish()
            .withf(|form| form.campaign_id == "3")
            .times(2)
            .returning(|_| Ok(()));

        let editor = filled();
        let first = editor.save("3", &publisher).await.unwrap();
        let second = editor.save("3", &publisher).await.unwrap();
        assert_ne!(first.token, second.token);
        assert_eq!(first.definition, second.definition);
    }

    #[tokio::test]
    async fn invalid_definitions_are_never_published() {
        let mut publisher = MockFormPublishingService::new();
        publisher.expect_publish().never();

        let err = FormEditor::new().save("3", &publisher).await.unwrap_err();
        assert!(matches!(err, EditorError::Invalid(_)));
    }
}
