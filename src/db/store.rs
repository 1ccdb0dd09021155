//! Persistence seam shared by the Postgres and in-memory stores.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::models::{ApplicationRecord, School};
use crate::records::models::{GenerationRecord, NewGenerationRecord, WorkflowKind};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("stored row is inconsistent: {0}")]
    Corrupt(String),
}

/// Create/read/update operations keyed by record id and owner.
///
/// Every record-scoped read filters by owner as well as id, so a record owned
/// by someone else is indistinguishable from a missing one.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_record(
        &self,
        new: NewGenerationRecord,
    ) -> Result<GenerationRecord, StoreError>;

    async fn get_record(
        &self,
        id: Uuid,
        owner_id: Uuid,
        kind: WorkflowKind,
    ) -> Result<Option<GenerationRecord>, StoreError>;

    /// Append `fragment` to the record's content and bump its follow-up count
    /// in one atomic read-modify-write. `None` when the record is not visible.
    async fn append_to_record(
        &self,
        id: Uuid,
        owner_id: Uuid,
        kind: WorkflowKind,
        fragment: &str,
    ) -> Result<Option<GenerationRecord>, StoreError>;

    /// Owner's records of one kind, newest first.
    async fn list_records(
        &self,
        owner_id: Uuid,
        kind: WorkflowKind,
    ) -> Result<Vec<GenerationRecord>, StoreError>;

    async fn list_schools(&self) -> Result<Vec<School>, StoreError>;

    async fn get_school(&self, id: Uuid) -> Result<Option<School>, StoreError>;

    /// Persist a complete application; either the whole record lands or nothing does.
    async fn create_application(&self, application: &ApplicationRecord) -> Result<(), StoreError>;

    async fn get_application(
        &self,
        id: Uuid,
        guardian_id: Uuid,
    ) -> Result<Option<ApplicationRecord>, StoreError>;

    /// Guardian's applications, newest first.
    async fn list_applications(
        &self,
        guardian_id: Uuid,
    ) -> Result<Vec<ApplicationRecord>, StoreError>;
}
