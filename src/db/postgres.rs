//! Postgres-backed `RecordStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::store::{RecordStore, StoreError};
use crate::application::models::{
    AdditionalInfo, ApplicationRecord, BasicInfo, ParentContact, School, SchoolLevel,
};
use crate::records::models::{
    GenerationRecord, NewGenerationRecord, SubjectFields, WorkflowKind,
};

const RECORD_COLUMNS: &str =
    "id, owner_id, kind, subject, content, follow_up_count, created_at";
const APPLICATION_COLUMNS: &str = "id, application_code, guardian_id, school_id, basic_info, school_level, parent_contact, additional_info, qr_code, created_at";

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: Uuid,
    owner_id: Uuid,
    kind: String,
    subject: Json<SubjectFields>,
    content: String,
    follow_up_count: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<RecordRow> for GenerationRecord {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let kind: WorkflowKind = row.kind.parse().map_err(StoreError::Corrupt)?;
        let subject = row.subject.0;
        if subject.kind() != kind {
            return Err(StoreError::Corrupt(format!(
                "record {} has kind {} but {} subject",
                row.id,
                kind,
                subject.kind()
            )));
        }

        Ok(GenerationRecord {
            id: row.id,
            owner_id: row.owner_id,
            subject,
            content: row.content,
            follow_up_count: row.follow_up_count,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SchoolRow {
    id: Uuid,
    name: String,
    address: Option<String>,
    levels: Vec<String>,
}

impl From<SchoolRow> for School {
    fn from(row: SchoolRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            address: row.address,
            levels: row.levels,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: Uuid,
    application_code: String,
    guardian_id: Uuid,
    school_id: Uuid,
    basic_info: Json<BasicInfo>,
    school_level: Json<SchoolLevel>,
    parent_contact: Json<ParentContact>,
    additional_info: Json<AdditionalInfo>,
    qr_code: String,
    created_at: DateTime<Utc>,
}

impl From<ApplicationRow> for ApplicationRecord {
    fn from(row: ApplicationRow) -> Self {
        Self {
            id: row.id,
            application_code: row.application_code,
            guardian_id: row.guardian_id,
            school_id: row.school_id,
            basic_info: row.basic_info.0,
            school_level: row.school_level.0,
            parent_contact: row.parent_contact.0,
            additional_info: row.additional_info.0,
            qr_code: row.qr_code,
            created_at: row.created_at,
        }
    }
}

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect, tune the pool and bring the schema up to date.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .idle_timeout(std::time::Duration::from_secs(900))
            .max_lifetime(std::time::Duration::from_secs(1800))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("Database migrations applied");

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn create_record(
        &self,
        new: NewGenerationRecord,
    ) -> Result<GenerationRecord, StoreError> {
        let sql = format!(
            "INSERT INTO generation_records (id, owner_id, kind, subject, content, follow_up_count, created_at) \
             VALUES ($1, $2, $3, $4, $5, 0, $6) RETURNING {RECORD_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(new.owner_id)
            .bind(new.subject.kind().as_str())
            .bind(Json(&new.subject))
            .bind(&new.content)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn get_record(
        &self,
        id: Uuid,
        owner_id: Uuid,
        kind: WorkflowKind,
    ) -> Result<Option<GenerationRecord>, StoreError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM generation_records WHERE id = $1 AND owner_id = $2 AND kind = $3"
        );
        sqlx::query_as::<_, RecordRow>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(GenerationRecord::try_from)
            .transpose()
    }

    async fn append_to_record(
        &self,
        id: Uuid,
        owner_id: Uuid,
        kind: WorkflowKind,
        fragment: &str,
    ) -> Result<Option<GenerationRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT {RECORD_COLUMNS} FROM generation_records \
             WHERE id = $1 AND owner_id = $2 AND kind = $3 FOR UPDATE"
        );
        let current = sqlx::query_as::<_, RecordRow>(&select)
            .bind(id)
            .bind(owner_id)
            .bind(kind.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(current) = current else {
            tx.rollback().await?;
            return Ok(None);
        };

        let combined = format!("{}{}", current.content, fragment);
        let update = format!(
            "UPDATE generation_records SET content = $1, follow_up_count = follow_up_count + 1 \
             WHERE id = $2 RETURNING {RECORD_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RecordRow>(&update)
            .bind(&combined)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        row.try_into().map(Some)
    }

    async fn list_records(
        &self,
        owner_id: Uuid,
        kind: WorkflowKind,
    ) -> Result<Vec<GenerationRecord>, StoreError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM generation_records \
             WHERE owner_id = $1 AND kind = $2 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, RecordRow>(&sql)
            .bind(owner_id)
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(GenerationRecord::try_from)
            .collect()
    }

    async fn list_schools(&self) -> Result<Vec<School>, StoreError> {
        let rows = sqlx::query_as::<_, SchoolRow>(
            "SELECT id, name, address, levels FROM schools ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(School::from).collect())
    }

    async fn get_school(&self, id: Uuid) -> Result<Option<School>, StoreError> {
        let row = sqlx::query_as::<_, SchoolRow>(
            "SELECT id, name, address, levels FROM schools WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(School::from))
    }

    async fn create_application(&self, application: &ApplicationRecord) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO applications
                (id, application_code, guardian_id, school_id, basic_info, school_level,
                 parent_contact, additional_info, qr_code, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(application.id)
        .bind(&application.application_code)
        .bind(application.guardian_id)
        .bind(application.school_id)
        .bind(Json(&application.basic_info))
        .bind(Json(&application.school_level))
        .bind(Json(&application.parent_contact))
        .bind(Json(&application.additional_info))
        .bind(&application.qr_code)
        .bind(application.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_application(
        &self,
        id: Uuid,
        guardian_id: Uuid,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1 AND guardian_id = $2"
        );
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(id)
            .bind(guardian_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ApplicationRecord::from))
    }

    async fn list_applications(
        &self,
        guardian_id: Uuid,
    ) -> Result<Vec<ApplicationRecord>, StoreError> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE guardian_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(guardian_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ApplicationRecord::from).collect())
    }
}
