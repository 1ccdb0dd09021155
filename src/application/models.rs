use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::wizard::WizardStep;

/// A school accepting applications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct School {
    pub id: Uuid,
    #[schema(example = "Freetown Secondary School for Girls")]
    pub name: String,
    pub address: Option<String>,
    /// Class levels admitted; empty means any level.
    #[schema(example = json!(["JSS1", "JSS2", "SSS1"]))]
    pub levels: Vec<String>,
}

impl School {
    pub fn admits(&self, level: &str) -> bool {
        self.levels.is_empty()
            || self
                .levels
                .iter()
                .any(|offered| offered.eq_ignore_ascii_case(level.trim()))
    }
}

// Step 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BasicInfo {
    pub first_name: String,
    pub last_name: String,
    #[schema(example = "2012-03-14")]
    pub date_of_birth: NaiveDate,
    pub gender: String,
    /// Base64-encoded PNG or JPEG photo of the applicant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicant_image: Option<String>,
}

impl BasicInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// Step 2
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SchoolLevel {
    #[schema(example = "JSS1")]
    pub level: String,
    pub previous_school: Option<String>,
    pub previous_class: Option<String>,
}

// Step 3
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ParentContact {
    pub guardian_name: String,
    pub relationship: String,
    #[schema(example = "+23276123456")]
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
}

// Step 4
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdditionalInfo {
    pub medical_conditions: Option<String>,
    pub special_needs: Option<String>,
    pub extracurricular_interests: Option<String>,
    pub referral_source: Option<String>,
}

/// A completed admission application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApplicationRecord {
    pub id: Uuid,
    #[schema(example = "APP-2026-1A2B3C4D")]
    pub application_code: String,
    pub guardian_id: Uuid,
    pub school_id: Uuid,
    pub basic_info: BasicInfo,
    pub school_level: SchoolLevel,
    pub parent_contact: ParentContact,
    pub additional_info: AdditionalInfo,
    /// SVG image encoding the application code.
    pub qr_code: String,
    pub created_at: DateTime<Utc>,
}

/// All four cleaned step groups, ready for the final create.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationDraft {
    pub guardian_id: Uuid,
    pub school_id: Uuid,
    pub basic_info: BasicInfo,
    pub school_level: SchoolLevel,
    pub parent_contact: ParentContact,
    pub additional_info: AdditionalInfo,
}

/// What the client sees for the current position in the wizard.
#[derive(Debug, Serialize, ToSchema)]
pub struct WizardView {
    pub wizard_id: Uuid,
    pub school: School,
    pub current_step: WizardStep,
    pub steps: Vec<WizardStep>,
    /// Step being displayed, with previously cleaned data when going back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<WizardStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<serde_json::Value>,
}

/// Returned once the last step is accepted.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApplicationDone {
    pub application: ApplicationRecord,
    pub school: School,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_school_admits_listed_levels_case_insensitively() {
        let school = School {
            id: Uuid::new_v4(),
            name: "Bo Government Secondary".to_string(),
            address: None,
            levels: vec!["JSS1".to_string(), "SSS1".to_string()],
        };
        assert!(school.admits("jss1"));
        assert!(school.admits(" SSS1 "));
        assert!(!school.admits("JSS3"));

        let open = School {
            levels: Vec::new(),
            ..school
        };
        assert!(open.admits("anything"));
    }

    #[test]
    fn test_basic_info_without_image_omits_field() {
        let info = BasicInfo {
            first_name: "Aminata".to_string(),
            last_name: "Kamara".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2012, 3, 14).unwrap(),
            gender: "female".to_string(),
            applicant_image: None,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("applicant_image").is_none());
        assert_eq!(json["date_of_birth"], "2012-03-14");
        assert_eq!(info.full_name(), "Aminata Kamara");
    }
}
