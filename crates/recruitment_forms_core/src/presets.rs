//! crates/recruitment_forms_core/src/presets.rs
//!
//! Ready-made field sets: the identity fields every application form starts
//! with, and the full candidate profile used by the stand-alone application.

use chrono::{Datelike, NaiveDate};

use crate::domain::FieldSpec;

/// Education ladder offered by the candidate profile, lowest first.
pub const EDUCATION_LEVELS: [&str; 6] = ["bac", "bac+2", "bac+3", "bac+4", "bac+5", "doctorat"];

pub const DATE_OF_BIRTH_KEY: &str = "dateOfBirth";
pub const EDUCATION_LEVEL_KEY: &str = "educationLevel";
pub const SPECIALIZATION_KEY: &str = "specialization";
pub const YEARS_OF_EXPERIENCE_KEY: &str = "yearsOfExperience";

pub const MIN_CANDIDATE_AGE: i32 = 18;
pub const MAX_CANDIDATE_AGE: i32 = 70;

/// First name, last name, email and phone. Always required.
pub fn identity_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::short_text("firstName", "First name").with_min_length(2),
        FieldSpec::short_text("lastName", "Last name").with_min_length(2),
        FieldSpec::email("email", "Email"),
        FieldSpec::phone("phone", "Phone").with_min_length(8),
    ]
}

/// The identity fields followed by the personal and professional details of
/// the stand-alone candidate application. Birth dates are bounded so that the
/// candidate is between 18 and 70 years old on `today`.
pub fn candidate_profile_fields(today: NaiveDate) -> Vec<FieldSpec> {
    let oldest = years_before(today, MAX_CANDIDATE_AGE);
    let youngest = years_before(today, MIN_CANDIDATE_AGE);

    let mut fields = identity_fields();
    fields.extend([
        FieldSpec::date(DATE_OF_BIRTH_KEY, "Date of birth")
            .with_date_range(Some(oldest), Some(youngest))
            .with_message("date of birth is required"),
        FieldSpec::short_text("placeOfBirth", "Place of birth")
            .with_min_length(2)
            .with_message("place of birth is required"),
        FieldSpec::single_choice(EDUCATION_LEVEL_KEY, "Education level", &EDUCATION_LEVELS)
            .with_message("education level is required"),
        FieldSpec::short_text(SPECIALIZATION_KEY, "Specialization")
            .with_min_length(2)
            .with_message("specialization is required"),
        FieldSpec::number(YEARS_OF_EXPERIENCE_KEY, "Years of experience")
            .with_value_range(Some(0.0), None)
            .with_message("years of experience must be a positive number"),
        FieldSpec::long_text("coverletter", "Motivation").optional(),
    ]);
    fields
}

// Feb 29 falls back to Feb 28 in non-leap target years.
fn years_before(date: NaiveDate, years: i32) -> NaiveDate {
    let year = date.year() - years;
    date.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .unwrap_or(date)
}
