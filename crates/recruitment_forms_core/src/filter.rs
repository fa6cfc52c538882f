//! crates/recruitment_forms_core/src/filter.rs
//!
//! Recruiter-side screening of received applications on the candidate
//! profile fields: education level, age, specialization and experience.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{FieldValue, FormValues};
use crate::presets::{
    DATE_OF_BIRTH_KEY, EDUCATION_LEVEL_KEY, SPECIALIZATION_KEY, YEARS_OF_EXPERIENCE_KEY,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("minimum age {min} is above maximum age {max}")]
    InvertedAgeRange { min: u32, max: u32 },
}

/// Criteria an application must meet to be listed. Empty lists and unset
/// bounds do not constrain anything; an application missing a field that a
/// set criterion needs does not match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateFilter {
    /// Accepted education levels, matched exactly.
    pub education_levels: Vec<String>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    /// Accepted specializations, matched case-insensitively.
    pub specializations: Vec<String>,
    pub min_years_of_experience: Option<f64>,
}

impl CandidateFilter {
    pub fn validate(&self) -> Result<(), FilterError> {
        match (self.min_age, self.max_age) {
            (Some(min), Some(max)) if min > max => Err(FilterError::InvertedAgeRange { min, max }),
            _ => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.education_levels.is_empty()
            && self.specializations.is_empty()
            && self.min_age.is_none()
            && self.max_age.is_none()
            && self.min_years_of_experience.is_none()
    }

    pub fn matches(&self, values: &FormValues, today: NaiveDate) -> bool {
        self.education_matches(values)
            && self.age_matches(values, today)
            && self.specialization_matches(values)
            && self.experience_matches(values)
    }

    fn education_matches(&self, values: &FormValues) -> bool {
        if self.education_levels.is_empty() {
            return true;
        }
        match values.get(EDUCATION_LEVEL_KEY) {
            Some(FieldValue::Choice(Some(level))) => self.education_levels.contains(level),
            _ => false,
        }
    }

    fn age_matches(&self, values: &FormValues, today: NaiveDate) -> bool {
        if self.min_age.is_none() && self.max_age.is_none() {
            return true;
        }
        let Some(FieldValue::Date(Some(birth))) = values.get(DATE_OF_BIRTH_KEY) else {
            return false;
        };
        let age = age_on(*birth, today);
        self.min_age.map_or(true, |min| age >= i64::from(min))
            && self.max_age.map_or(true, |max| age <= i64::from(max))
    }

    fn specialization_matches(&self, values: &FormValues) -> bool {
        if self.specializations.is_empty() {
            return true;
        }
        match values.get(SPECIALIZATION_KEY) {
            Some(FieldValue::Text(s)) => {
                let candidate = s.trim().to_lowercase();
                self.specializations
                    .iter()
                    .any(|wanted| wanted.trim().to_lowercase() == candidate)
            }
            _ => false,
        }
    }

    fn experience_matches(&self, values: &FormValues) -> bool {
        let Some(min) = self.min_years_of_experience else {
            return true;
        };
        matches!(values.get(YEARS_OF_EXPERIENCE_KEY), Some(FieldValue::Number(n)) if *n >= min)
    }
}

/// Whole years between `birth` and `today`; the birthday itself counts.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i64 {
    let mut age = i64::from(today.year() - birth.year());
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn candidate(level: &str, born: NaiveDate, specialization: &str, years: f64) -> FormValues {
        [
            (EDUCATION_LEVEL_KEY, FieldValue::Choice(Some(level.to_string()))),
            (DATE_OF_BIRTH_KEY, FieldValue::Date(Some(born))),
            (SPECIALIZATION_KEY, FieldValue::Text(specialization.to_string())),
            (YEARS_OF_EXPERIENCE_KEY, FieldValue::Number(years)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn age_counts_completed_years() {
        let today = date(2025, 6, 15);
        assert_eq!(age_on(date(1995, 6, 15), today), 30);
        assert_eq!(age_on(date(1995, 6, 16), today), 29);
        assert_eq!(age_on(date(2000, 2, 29), date(2025, 2, 28)), 24);
    }

    #[test]
    fn empty_filter_matches_anything() {
        let filter = CandidateFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&FormValues::new(), date(2025, 1, 1)));
    }

    #[test]
    fn every_set_criterion_must_hold() {
        let today = date(2025, 6, 15);
        let filter = CandidateFilter {
            education_levels: vec!["bac+5".to_string(), "doctorat".to_string()],
            min_age: Some(25),
            max_age: Some(40),
            specializations: vec!["Finance".to_string()],
            min_years_of_experience: Some(3.0),
        };

        assert!(filter.matches(&candidate("bac+5", date(1990, 1, 1), "finance ", 5.0), today));
        assert!(!filter.matches(&candidate("bac+3", date(1990, 1, 1), "finance", 5.0), today));
        assert!(!filter.matches(&candidate("bac+5", date(1980, 1, 1), "finance", 5.0), today));
        assert!(!filter.matches(&candidate("bac+5", date(1990, 1, 1), "marketing", 5.0), today));
        assert!(!filter.matches(&candidate("bac+5", date(1990, 1, 1), "finance", 2.0), today));
    }

    #[test]
    fn missing_profile_fields_do_not_match_set_criteria() {
        let filter = CandidateFilter {
            min_years_of_experience: Some(0.0),
            ..CandidateFilter::default()
        };
        assert!(!filter.matches(&FormValues::new(), date(2025, 1, 1)));
    }

    #[test]
    fn inverted_age_range_is_rejected() {
        let filter = CandidateFilter {
            min_age: Some(40),
            max_age: Some(30),
            ..CandidateFilter::default()
        };
        assert_eq!(
            filter.validate(),
            Err(FilterError::InvertedAgeRange { min: 40, max: 30 })
        );
    }
}
