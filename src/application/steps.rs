//! Per-step forms of the admission wizard.
//!
//! Each form is parsed from the raw JSON payload with every field optional,
//! validated with the school in context and cleaned into its step group.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use utoipa::ToSchema;

use super::models::{AdditionalInfo, BasicInfo, ParentContact, School, SchoolLevel};
use crate::validation::{
    clean_optional, clean_required, validate_email_optional, validate_max_len, validate_phone,
    validate_required, ValidationError, ValidationErrors,
};

const MAX_NAME_LEN: usize = 100;
const MAX_TEXT_LEN: usize = 500;
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = b"\xff\xd8\xff";

/// Deserialize a step payload, reporting shape errors as a validation failure.
pub fn parse_form<T: DeserializeOwned>(payload: serde_json::Value) -> Result<T, ValidationErrors> {
    serde_json::from_value(payload).map_err(|e| {
        ValidationErrors::single(
            ValidationError::new("payload", format!("Malformed step data: {e}"))
                .with_suggestion("Send a JSON object with the fields of this step"),
        )
    })
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BasicInfoForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `YYYY-MM-DD`
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    /// Base64 PNG or JPEG, at most 2 MiB decoded. A `data:` URI prefix is accepted.
    pub applicant_image: Option<String>,
}

impl BasicInfoForm {
    pub fn clean(self, today: NaiveDate) -> Result<BasicInfo, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        validate_required(self.first_name.as_deref(), "first_name", "First name", &mut errors);
        validate_max_len(self.first_name.as_deref(), MAX_NAME_LEN, "first_name", "First name", &mut errors);
        validate_required(self.last_name.as_deref(), "last_name", "Last name", &mut errors);
        validate_max_len(self.last_name.as_deref(), MAX_NAME_LEN, "last_name", "Last name", &mut errors);
        validate_required(self.gender.as_deref(), "gender", "Gender", &mut errors);

        let date_of_birth = parse_date_of_birth(self.date_of_birth.as_deref(), today, &mut errors);
        let applicant_image = clean_optional(self.applicant_image)
            .and_then(|raw| clean_image(&raw, &mut errors));

        errors.into_result()?;
        let date_of_birth = date_of_birth.ok_or_else(|| {
            ValidationErrors::single(ValidationError::empty_field("date_of_birth", "Date of birth"))
        })?;

        Ok(BasicInfo {
            first_name: clean_required(self.first_name),
            last_name: clean_required(self.last_name),
            date_of_birth,
            gender: clean_required(self.gender),
            applicant_image,
        })
    }
}

fn parse_date_of_birth(
    value: Option<&str>,
    today: NaiveDate,
    errors: &mut ValidationErrors,
) -> Option<NaiveDate> {
    let raw = value.unwrap_or_default().trim();
    if raw.is_empty() {
        errors.add(ValidationError::empty_field("date_of_birth", "Date of birth"));
        return None;
    }

    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) if date > today => {
            errors.add(ValidationError::new(
                "date_of_birth",
                "Date of birth cannot be in the future",
            ));
            None
        }
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(
                ValidationError::new("date_of_birth", "Date of birth is not a valid date")
                    .with_suggestion("Use the format YYYY-MM-DD, e.g. 2012-03-14"),
            );
            None
        }
    }
}

/// Strip an optional data-URI prefix and check the image is a PNG or JPEG within the size limit.
fn clean_image(raw: &str, errors: &mut ValidationErrors) -> Option<String> {
    let encoded = match raw.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data.trim(),
        _ => raw,
    };

    let bytes = match STANDARD.decode(encoded) {
        Ok(bytes) => bytes,
        Err(_) => {
            errors.add(ValidationError::new(
                "applicant_image",
                "Applicant image is not valid base64",
            ));
            return None;
        }
    };

    if bytes.len() > MAX_IMAGE_BYTES {
        errors.add(
            ValidationError::new("applicant_image", "Applicant image is too large")
                .with_suggestion("Upload an image of at most 2 MB"),
        );
        return None;
    }

    if !bytes.starts_with(PNG_MAGIC) && !bytes.starts_with(JPEG_MAGIC) {
        errors.add(
            ValidationError::new("applicant_image", "Applicant image must be a PNG or JPEG")
                .with_suggestion("Upload a .png or .jpg photo"),
        );
        return None;
    }

    Some(encoded.to_string())
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SchoolLevelForm {
    pub level: Option<String>,
    pub previous_school: Option<String>,
    pub previous_class: Option<String>,
}

impl SchoolLevelForm {
    pub fn clean(self, school: &School) -> Result<SchoolLevel, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_required(self.level.as_deref(), "level", "Level", &mut errors);
        validate_max_len(self.previous_school.as_deref(), MAX_NAME_LEN, "previous_school", "Previous school", &mut errors);
        validate_max_len(self.previous_class.as_deref(), MAX_NAME_LEN, "previous_class", "Previous class", &mut errors);

        if let Some(level) = self.level.as_deref().filter(|l| !l.trim().is_empty()) {
            if !school.admits(level) {
                errors.add(
                    ValidationError::new(
                        "level",
                        format!("{} does not admit level {}", school.name, level.trim()),
                    )
                    .with_suggestion(format!("Choose one of: {}", school.levels.join(", "))),
                );
            }
        }
        errors.into_result()?;

        Ok(SchoolLevel {
            level: clean_required(self.level),
            previous_school: clean_optional(self.previous_school),
            previous_class: clean_optional(self.previous_class),
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ParentContactForm {
    pub guardian_name: Option<String>,
    pub relationship: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl ParentContactForm {
    pub fn clean(self) -> Result<ParentContact, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_required(self.guardian_name.as_deref(), "guardian_name", "Guardian name", &mut errors);
        validate_max_len(self.guardian_name.as_deref(), MAX_NAME_LEN, "guardian_name", "Guardian name", &mut errors);
        validate_required(self.relationship.as_deref(), "relationship", "Relationship", &mut errors);
        validate_phone(self.phone.as_deref(), "phone", &mut errors);
        validate_email_optional(self.email.as_deref(), "email", &mut errors);
        validate_required(self.address.as_deref(), "address", "Address", &mut errors);
        validate_max_len(self.address.as_deref(), MAX_TEXT_LEN, "address", "Address", &mut errors);
        errors.into_result()?;

        Ok(ParentContact {
            guardian_name: clean_required(self.guardian_name),
            relationship: clean_required(self.relationship),
            phone: clean_required(self.phone),
            email: clean_optional(self.email),
            address: clean_required(self.address),
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AdditionalInfoForm {
    pub medical_conditions: Option<String>,
    pub special_needs: Option<String>,
    pub extracurricular_interests: Option<String>,
    pub referral_source: Option<String>,
}

impl AdditionalInfoForm {
    pub fn clean(self) -> Result<AdditionalInfo, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for (field, label, value) in [
            ("medical_conditions", "Medical conditions", self.medical_conditions.as_deref()),
            ("special_needs", "Special needs", self.special_needs.as_deref()),
            ("extracurricular_interests", "Extracurricular interests", self.extracurricular_interests.as_deref()),
            ("referral_source", "Referral source", self.referral_source.as_deref()),
        ] {
            validate_max_len(value, MAX_TEXT_LEN, field, label, &mut errors);
        }
        errors.into_result()?;

        Ok(AdditionalInfo {
            medical_conditions: clean_optional(self.medical_conditions),
            special_needs: clean_optional(self.special_needs),
            extracurricular_interests: clean_optional(self.extracurricular_interests),
            referral_source: clean_optional(self.referral_source),
        })
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
