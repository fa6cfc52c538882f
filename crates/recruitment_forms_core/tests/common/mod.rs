use async_trait::async_trait;
use parking_lot::Mutex;
use recruitment_forms_core::{
    FieldValue, FormController, FormDefinition, NormalizedRecord, PortError, PortResult,
    QuestionSpec, SubmissionService,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Records every application it accepts. When gated, each call waits for
/// `release` before answering.
#[derive(Default)]
pub struct RecordingSink {
    pub records: Mutex<Vec<NormalizedRecord>>,
    pub calls: AtomicUsize,
    pub gate: Option<Notify>,
    pub reject: bool,
}

impl RecordingSink {
    pub fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::default()
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmissionService for RecordingSink {
    async fn submit_application(&self, record: &NormalizedRecord) -> PortResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.reject {
            return Err(PortError::Rejected("storage unavailable".to_string()));
        }
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// Identity fields plus the given `(question, required)` pairs, no attachments.
pub fn definition_with(questions: &[(&str, bool)]) -> FormDefinition {
    FormDefinition {
        title: "Candidature - Responsable Comptable".to_string(),
        description: "Merci de remplir ce formulaire".to_string(),
        questions: questions
            .iter()
            .map(|(q, required)| QuestionSpec::new(q, *required))
            .collect(),
        require_cv: false,
        ..FormDefinition::default()
    }
}

pub fn fill(controller: &FormController, entries: &[(&str, &str)]) {
    for (key, value) in entries {
        controller
            .set_field(key, FieldValue::Text(value.to_string()))
            .expect("known field");
    }
}

pub const JEAN: [(&str, &str); 4] = [
    ("firstName", "Jean"),
    ("lastName", "Dupont"),
    ("email", "jean@x.com"),
    ("phone", "690000000"),
];
