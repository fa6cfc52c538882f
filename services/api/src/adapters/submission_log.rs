//! services/api/src/adapters/submission_log.rs
//!
//! In-memory implementation of the `SubmissionService` and
//! `ApplicationDirectory` ports. Accepted applications are kept in order and
//! logged; an optional per-form quota makes the log refuse further
//! applications once a form is full.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use recruitment_forms_core::{
    AddressToken, ApplicationDirectory, CandidateFilter, NormalizedRecord, PortError, PortResult,
    SubmissionService,
};
use tracing::{debug, info};

pub struct SubmissionLog {
    records: RwLock<Vec<NormalizedRecord>>,
    max_per_form: Option<usize>,
}

impl SubmissionLog {
    pub fn new(max_per_form: Option<usize>) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            max_per_form,
        }
    }

    pub fn records(&self) -> Vec<NormalizedRecord> {
        self.records.read().clone()
    }
}

#[async_trait]
impl SubmissionService for SubmissionLog {
    async fn submit_application(&self, record: &NormalizedRecord) -> PortResult<()> {
        let mut records = self.records.write();

        if let Some(max) = self.max_per_form {
            let received = records
                .iter()
                .filter(|r| r.form_token == record.form_token)
                .count();
            if received >= max {
                return Err(PortError::Rejected(
                    "this form is no longer accepting applications".to_string(),
                ));
            }
        }

        info!(
            token = ?record.form_token.as_ref().map(|t| t.as_str()),
            email = ?record.values.get("email").map(|v| v.display()),
            answers = record.answers.len(),
            cv = record.attachments.cv,
            cover_letter = record.attachments.cover_letter,
            "Application received"
        );
        records.push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl ApplicationDirectory for SubmissionLog {
    async fn list_applications(
        &self,
        tokens: &[AddressToken],
        filter: &CandidateFilter,
    ) -> PortResult<Vec<NormalizedRecord>> {
        let today = Utc::now().date_naive();
        let matching: Vec<NormalizedRecord> = self
            .records
            .read()
            .iter()
            .filter(|r| r.form_token.as_ref().is_some_and(|t| tokens.contains(t)))
            .filter(|r| filter.matches(&r.values, today))
            .cloned()
            .collect();
        debug!(forms = tokens.len(), matching = matching.len(), "Listed applications");
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recruitment_forms_core::{presets::EDUCATION_LEVEL_KEY, Attachments, FieldValue, FormValues};

    fn record(token: &AddressToken) -> NormalizedRecord {
        record_with_level(token, "bac+3")
    }

    fn record_with_level(token: &AddressToken, level: &str) -> NormalizedRecord {
        NormalizedRecord {
            form_token: Some(token.clone()),
            values: [(EDUCATION_LEVEL_KEY, FieldValue::Choice(Some(level.to_string())))]
                .into_iter()
                .collect::<FormValues>(),
            answers: Vec::new(),
            attachments: Attachments::default(),
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn quota_applies_per_form() {
        let log = SubmissionLog::new(Some(1));
        let full = AddressToken::generate();
        let other = AddressToken::generate();

        log.submit_application(&record(&full)).await.unwrap();
        assert!(matches!(
            log.submit_application(&record(&full)).await,
            Err(PortError::Rejected(_))
        ));
        log.submit_application(&record(&other)).await.unwrap();
        assert_eq!(log.records().len(), 2);
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_given_forms_and_filtered() {
        let log = SubmissionLog::new(None);
        let campaign_form = AddressToken::generate();
        let other_form = AddressToken::generate();
        log.submit_application(&record_with_level(&campaign_form, "bac+5"))
            .await
            .unwrap();
        log.submit_application(&record_with_level(&campaign_form, "bac+2"))
            .await
            .unwrap();
        log.submit_application(&record_with_level(&other_form, "bac+5"))
            .await
            .unwrap();

        let all = log
            .list_applications(&[campaign_form.clone()], &CandidateFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let filter = CandidateFilter {
            education_levels: vec!["bac+5".to_string()],
            ..CandidateFilter::default()
        };
        let screened = log
            .list_applications(&[campaign_form.clone()], &filter)
            .await
            .unwrap();
        assert_eq!(screened.len(), 1);
        assert_eq!(screened[0].form_token, Some(campaign_form));
    }
}
