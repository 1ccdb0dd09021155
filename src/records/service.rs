//! Generate-then-persist orchestration for lesson plans and creative writing.

use std::sync::Arc;

use uuid::Uuid;

use super::models::{
    GenerationRecord, GenerationResponse, NewGenerationRecord, SubjectFields, WorkflowKind,
};
use crate::auth::AuthenticatedUser;
use crate::db::RecordStore;
use crate::error::ServiceError;
use crate::generation::prompts::{follow_up_prompt, initial_prompt, CREATIVE_IMPROVEMENT_TIPS};
use crate::generation::{render_markdown, TextGenerator};

/// Marker placed between the existing content and each appended follow-up.
pub const FOLLOW_UP_SEPARATOR: &str =
    "<div class=\"follow-up-separator\"><h2>Follow-Up Content</h2></div>";

/// How follow-up fragments are joined onto a record of one workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUpPolicy {
    pub separator: Option<String>,
}

impl FollowUpPolicy {
    pub fn separated() -> Self {
        Self {
            separator: Some(FOLLOW_UP_SEPARATOR.to_string()),
        }
    }

    pub fn plain() -> Self {
        Self { separator: None }
    }

    pub fn fragment(&self, rendered: &str) -> String {
        match &self.separator {
            Some(separator) => format!("{separator}{rendered}"),
            None => rendered.to_string(),
        }
    }
}

pub struct ContentService {
    store: Arc<dyn RecordStore>,
    generator: Arc<dyn TextGenerator>,
    lesson_plan_policy: FollowUpPolicy,
    creative_writing_policy: FollowUpPolicy,
}

impl ContentService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        generator: Arc<dyn TextGenerator>,
        creative_follow_up_separator: bool,
    ) -> Self {
        Self {
            store,
            generator,
            lesson_plan_policy: FollowUpPolicy::separated(),
            creative_writing_policy: if creative_follow_up_separator {
                FollowUpPolicy::separated()
            } else {
                FollowUpPolicy::plain()
            },
        }
    }

    pub fn policy(&self, kind: WorkflowKind) -> &FollowUpPolicy {
        match kind {
            WorkflowKind::LessonPlan => &self.lesson_plan_policy,
            WorkflowKind::CreativeWriting => &self.creative_writing_policy,
        }
    }

    async fn generate_html(&self, prompt: &str, kind: WorkflowKind) -> Result<String, ServiceError> {
        let text = self.generator.generate(prompt).await.map_err(|e| {
            log::error!("Generation for {} failed: {}", kind, e);
            ServiceError::Generation(e)
        })?;
        Ok(render_markdown(&text))
    }

    /// Generate the initial content and persist a new record with no follow-ups.
    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        subject: SubjectFields,
    ) -> Result<GenerationResponse, ServiceError> {
        let kind = subject.kind();
        let prompt = initial_prompt(&subject, user.role);
        let content = self.generate_html(&prompt, kind).await?;

        let record = self
            .store
            .create_record(NewGenerationRecord {
                owner_id: user.id,
                subject,
                content,
            })
            .await?;
        log::info!("Created {} {} for user {}", kind, record.id, user.id);

        Ok(GenerationResponse {
            record,
            follow_up_content: None,
            improvement_tips: match kind {
                WorkflowKind::CreativeWriting => Some(CREATIVE_IMPROVEMENT_TIPS.to_string()),
                WorkflowKind::LessonPlan => None,
            },
        })
    }

    /// Generate a follow-up from the record's original subject and append it.
    pub async fn follow_up(
        &self,
        user: &AuthenticatedUser,
        kind: WorkflowKind,
        id: Uuid,
        instruction: &str,
    ) -> Result<GenerationResponse, ServiceError> {
        let record = self.get(user, kind, id).await?;

        let prompt = follow_up_prompt(&record.subject, instruction, user.role);
        let rendered = self.generate_html(&prompt, kind).await?;
        let fragment = self.policy(kind).fragment(&rendered);

        let record = self
            .store
            .append_to_record(id, user.id, kind, &fragment)
            .await?
            .ok_or(ServiceError::NotFoundOrForbidden)?;
        log::info!(
            "Appended follow-up {} to {} {}",
            record.follow_up_count,
            kind,
            record.id
        );

        Ok(GenerationResponse {
            record,
            follow_up_content: Some(rendered),
            improvement_tips: None,
        })
    }

    pub async fn get(
        &self,
        user: &AuthenticatedUser,
        kind: WorkflowKind,
        id: Uuid,
    ) -> Result<GenerationRecord, ServiceError> {
        self.store
            .get_record(id, user.id, kind)
            .await?
            .ok_or(ServiceError::NotFoundOrForbidden)
    }

    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        kind: WorkflowKind,
    ) -> Result<Vec<GenerationRecord>, ServiceError> {
        Ok(self.store.list_records(user.id, kind).await?)
    }
}
