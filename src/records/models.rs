use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::validation::{
    clean_optional, clean_required, validate_max_len, validate_required, ValidationErrors,
    Validator,
};

const MAX_FIELD_LEN: usize = 200;
const MAX_FOLLOW_UP_LEN: usize = 2000;

/// The two accumulating generation workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    LessonPlan,
    CreativeWriting,
}

impl WorkflowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LessonPlan => "lesson_plan",
            Self::CreativeWriting => "creative_writing",
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lesson_plan" => Ok(Self::LessonPlan),
            "creative_writing" => Ok(Self::CreativeWriting),
            other => Err(format!("unknown workflow kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LessonSubject {
    #[schema(example = "Fractions")]
    pub topic: String,
    #[schema(example = "JSS2")]
    pub level: Option<String>,
    #[schema(example = "Freetown")]
    pub area: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreativeSubject {
    pub genre: String,
    pub tone: String,
    pub level: String,
    pub location: String,
    pub theme: String,
    pub plot: String,
    pub idea: String,
    pub title: String,
}

/// Immutable fields captured when a record is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubjectFields {
    LessonPlan(LessonSubject),
    CreativeWriting(CreativeSubject),
}

impl SubjectFields {
    pub fn kind(&self) -> WorkflowKind {
        match self {
            Self::LessonPlan(_) => WorkflowKind::LessonPlan,
            Self::CreativeWriting(_) => WorkflowKind::CreativeWriting,
        }
    }
}

/// A persisted generation thread: the initial content plus appended follow-ups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GenerationRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub subject: SubjectFields,
    /// Accumulated HTML; only ever appended to.
    pub content: String,
    pub follow_up_count: i32,
    pub created_at: DateTime<Utc>,
}

impl GenerationRecord {
    pub fn kind(&self) -> WorkflowKind {
        self.subject.kind()
    }
}

/// Insert payload for `RecordStore::create_record`.
#[derive(Debug, Clone)]
pub struct NewGenerationRecord {
    pub owner_id: Uuid,
    pub subject: SubjectFields,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LessonPlanRequest {
    #[schema(example = "Fractions")]
    pub topic: Option<String>,
    #[schema(example = "JSS2")]
    pub level: Option<String>,
    #[schema(example = "Freetown")]
    pub area: Option<String>,
}

impl Validator for LessonPlanRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_required(self.topic.as_deref(), "topic", "Topic", &mut errors);
        validate_max_len(self.topic.as_deref(), MAX_FIELD_LEN, "topic", "Topic", &mut errors);
        validate_max_len(self.level.as_deref(), MAX_FIELD_LEN, "level", "Level", &mut errors);
        validate_max_len(self.area.as_deref(), MAX_FIELD_LEN, "area", "Area", &mut errors);
        errors.into_result()
    }
}

impl LessonPlanRequest {
    pub fn into_subject(self) -> Result<SubjectFields, ValidationErrors> {
        self.validate()?;
        Ok(SubjectFields::LessonPlan(LessonSubject {
            topic: clean_required(self.topic),
            level: clean_optional(self.level),
            area: clean_optional(self.area),
        }))
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreativeWritingRequest {
    #[schema(example = "Adventure")]
    pub genre: Option<String>,
    #[schema(example = "Hopeful")]
    pub tone: Option<String>,
    #[schema(example = "JSS3")]
    pub level: Option<String>,
    #[schema(example = "Bo")]
    pub location: Option<String>,
    pub theme: Option<String>,
    pub plot: Option<String>,
    pub idea: Option<String>,
    pub title: Option<String>,
}

impl CreativeWritingRequest {
    fn fields(&self) -> [(&'static str, &'static str, Option<&str>); 8] {
        [
            ("genre", "Genre", self.genre.as_deref()),
            ("tone", "Tone", self.tone.as_deref()),
            ("level", "Level", self.level.as_deref()),
            ("location", "Location", self.location.as_deref()),
            ("theme", "Theme", self.theme.as_deref()),
            ("plot", "Plot", self.plot.as_deref()),
            ("idea", "Idea", self.idea.as_deref()),
            ("title", "Title", self.title.as_deref()),
        ]
    }

    pub fn into_subject(self) -> Result<SubjectFields, ValidationErrors> {
        self.validate()?;
        Ok(SubjectFields::CreativeWriting(CreativeSubject {
            genre: clean_required(self.genre),
            tone: clean_required(self.tone),
            level: clean_required(self.level),
            location: clean_required(self.location),
            theme: clean_required(self.theme),
            plot: clean_required(self.plot),
            idea: clean_required(self.idea),
            title: clean_required(self.title),
        }))
    }
}

impl Validator for CreativeWritingRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for (field, label, value) in self.fields() {
            validate_required(value, field, label, &mut errors);
            validate_max_len(value, MAX_FIELD_LEN, field, label, &mut errors);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct FollowUpRequest {
    #[schema(example = "explain with a market analogy")]
    pub follow_up_request: Option<String>,
}

impl Validator for FollowUpRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let value = self.follow_up_request.as_deref();
        validate_required(value, "follow_up_request", "Follow-up request", &mut errors);
        validate_max_len(
            value,
            MAX_FOLLOW_UP_LEN,
            "follow_up_request",
            "Follow-up request",
            &mut errors,
        );
        errors.into_result()
    }
}

impl FollowUpRequest {
    pub fn into_instruction(self) -> Result<String, ValidationErrors> {
        self.validate()?;
        Ok(clean_required(self.follow_up_request))
    }
}

/// Body returned by the create and follow-up endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct GenerationResponse {
    pub record: GenerationRecord,
    /// HTML of the section appended by this follow-up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improvement_tips: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_request_requires_topic_only() {
        let err = LessonPlanRequest::default().into_subject().unwrap_err();
        assert!(err.has_field("topic"));
        assert_eq!(err.len(), 1);

        let subject = LessonPlanRequest {
            topic: Some(" Fractions ".to_string()),
            level: Some("".to_string()),
            area: Some("Freetown".to_string()),
        }
        .into_subject()
        .unwrap();

        assert_eq!(
            subject,
            SubjectFields::LessonPlan(LessonSubject {
                topic: "Fractions".to_string(),
                level: None,
                area: Some("Freetown".to_string()),
            })
        );
    }

    #[test]
    fn test_creative_request_requires_every_field() {
        let request = CreativeWritingRequest {
            genre: Some("Adventure".to_string()),
            title: Some("  ".to_string()),
            ..Default::default()
        };
        let err = request.into_subject().unwrap_err();
        assert_eq!(err.len(), 7);
        assert!(err.has_field("title"));
        assert!(!err.has_field("genre"));
    }

    #[test]
    fn test_follow_up_request_rejects_blank() {
        let err = FollowUpRequest {
            follow_up_request: Some("\n ".to_string()),
        }
        .into_instruction()
        .unwrap_err();
        assert!(err.has_field("follow_up_request"));
    }

    #[test]
    fn test_subject_serialization_is_tagged() {
        let subject = SubjectFields::LessonPlan(LessonSubject {
            topic: "Fractions".to_string(),
            level: Some("JSS2".to_string()),
            area: None,
        });
        let json = serde_json::to_value(&subject).unwrap();
        assert_eq!(json["kind"], "lesson_plan");
        assert_eq!(json["topic"], "Fractions");

        let back: SubjectFields = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), WorkflowKind::LessonPlan);
    }

    #[test]
    fn test_workflow_kind_parse() {
        assert_eq!("creative_writing".parse::<WorkflowKind>(), Ok(WorkflowKind::CreativeWriting));
        assert!("poem".parse::<WorkflowKind>().is_err());
    }
}
