//! In-process `RecordStore` for local runs without Postgres and for tests.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::store::{RecordStore, StoreError};
use crate::application::models::{ApplicationRecord, School};
use crate::records::models::{GenerationRecord, NewGenerationRecord, WorkflowKind};

#[derive(Default)]
struct Tables {
    // Insertion order doubles as creation order.
    records: Vec<GenerationRecord>,
    schools: Vec<School>,
    applications: Vec<ApplicationRecord>,
}

#[derive(Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<Tables>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with one demo school so the wizard is usable out of the box.
    pub fn seeded() -> Self {
        let store = Self::new();
        let school = School {
            id: Uuid::new_v4(),
            name: "Demo Community Secondary School".to_string(),
            address: Some("Freetown".to_string()),
            levels: ["JSS1", "JSS2", "JSS3", "SSS1", "SSS2", "SSS3"]
                .iter()
                .map(|l| l.to_string())
                .collect(),
        };
        log::info!("Seeded in-memory store with school {} ({})", school.name, school.id);
        store.add_school(school);
        store
    }

    pub fn add_school(&self, school: School) {
        self.tables.write().schools.push(school);
    }

    pub fn record_count(&self) -> usize {
        self.tables.read().records.len()
    }

    pub fn application_count(&self) -> usize {
        self.tables.read().applications.len()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create_record(
        &self,
        new: NewGenerationRecord,
    ) -> Result<GenerationRecord, StoreError> {
        let record = GenerationRecord {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            subject: new.subject,
            content: new.content,
            follow_up_count: 0,
            created_at: Utc::now(),
        };
        self.tables.write().records.push(record.clone());
        Ok(record)
    }

    async fn get_record(
        &self,
        id: Uuid,
        owner_id: Uuid,
        kind: WorkflowKind,
    ) -> Result<Option<GenerationRecord>, StoreError> {
        Ok(self
            .tables
            .read()
            .records
            .iter()
            .find(|r| r.id == id && r.owner_id == owner_id && r.kind() == kind)
            .cloned())
    }

    async fn append_to_record(
        &self,
        id: Uuid,
        owner_id: Uuid,
        kind: WorkflowKind,
        fragment: &str,
    ) -> Result<Option<GenerationRecord>, StoreError> {
        let mut tables = self.tables.write();
        let Some(record) = tables
            .records
            .iter_mut()
            .find(|r| r.id == id && r.owner_id == owner_id && r.kind() == kind)
        else {
            return Ok(None);
        };

        record.content.push_str(fragment);
        record.follow_up_count += 1;
        Ok(Some(record.clone()))
    }

    async fn list_records(
        &self,
        owner_id: Uuid,
        kind: WorkflowKind,
    ) -> Result<Vec<GenerationRecord>, StoreError> {
        let tables = self.tables.read();
        let mut records: Vec<GenerationRecord> = tables
            .records
            .iter()
            .rev()
            .filter(|r| r.owner_id == owner_id && r.kind() == kind)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn list_schools(&self) -> Result<Vec<School>, StoreError> {
        let mut schools = self.tables.read().schools.clone();
        schools.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(schools)
    }

    async fn get_school(&self, id: Uuid) -> Result<Option<School>, StoreError> {
        Ok(self
            .tables
            .read()
            .schools
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn create_application(&self, application: &ApplicationRecord) -> Result<(), StoreError> {
        self.tables.write().applications.push(application.clone());
        Ok(())
    }

    async fn get_application(
        &self,
        id: Uuid,
        guardian_id: Uuid,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        Ok(self
            .tables
            .read()
            .applications
            .iter()
            .find(|a| a.id == id && a.guardian_id == guardian_id)
            .cloned())
    }

    async fn list_applications(
        &self,
        guardian_id: Uuid,
    ) -> Result<Vec<ApplicationRecord>, StoreError> {
        let tables = self.tables.read();
        let mut applications: Vec<ApplicationRecord> = tables
            .applications
            .iter()
            .rev()
            .filter(|a| a.guardian_id == guardian_id)
            .cloned()
            .collect();
        applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(applications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::models::{CreativeSubject, LessonSubject, SubjectFields};
    use std::sync::Arc;

    fn lesson(owner_id: Uuid, topic: &str) -> NewGenerationRecord {
        NewGenerationRecord {
            owner_id,
            subject: SubjectFields::LessonPlan(LessonSubject {
                topic: topic.to_string(),
                level: None,
                area: None,
            }),
            content: format!("<h3>{topic}</h3>"),
        }
    }

    #[tokio::test]
    async fn test_create_starts_at_zero_follow_ups() {
        let store = InMemoryRecordStore::new();
        let record = store.create_record(lesson(Uuid::new_v4(), "Fractions")).await.unwrap();
        assert_eq!(record.follow_up_count, 0);
        assert_eq!(record.content, "<h3>Fractions</h3>");
    }

    #[tokio::test]
    async fn test_get_hides_other_owners_and_kinds() {
        let store = InMemoryRecordStore::new();
        let owner = Uuid::new_v4();
        let record = store.create_record(lesson(owner, "Fractions")).await.unwrap();

        assert!(store.get_record(record.id, owner, WorkflowKind::LessonPlan).await.unwrap().is_some());
        assert!(store.get_record(record.id, Uuid::new_v4(), WorkflowKind::LessonPlan).await.unwrap().is_none());
        assert!(store.get_record(record.id, owner, WorkflowKind::CreativeWriting).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_accumulates() {
        let store = InMemoryRecordStore::new();
        let owner = Uuid::new_v4();
        let record = store.create_record(lesson(owner, "Fractions")).await.unwrap();

        store.append_to_record(record.id, owner, WorkflowKind::LessonPlan, "<p>one</p>").await.unwrap();
        let updated = store
            .append_to_record(record.id, owner, WorkflowKind::LessonPlan, "<p>two</p>")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.follow_up_count, 2);
        assert_eq!(updated.content, "<h3>Fractions</h3><p>one</p><p>two</p>");
        assert_eq!(updated.created_at, record.created_at);
        assert_eq!(updated.subject, record.subject);

        let foreign = store
            .append_to_record(record.id, Uuid::new_v4(), WorkflowKind::LessonPlan, "<p>x</p>")
            .await
            .unwrap();
        assert!(foreign.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let store = Arc::new(InMemoryRecordStore::new());
        let owner = Uuid::new_v4();
        let record = store.create_record(lesson(owner, "Fractions")).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append_to_record(record.id, owner, WorkflowKind::LessonPlan, &format!("[{i}]"))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = store.get_record(record.id, owner, WorkflowKind::LessonPlan).await.unwrap().unwrap();
        assert_eq!(stored.follow_up_count, 16);
        for i in 0..16 {
            assert!(stored.content.contains(&format!("[{i}]")));
        }
    }

    #[tokio::test]
    async fn test_list_filters_by_owner_and_kind_newest_first() {
        let store = InMemoryRecordStore::new();
        let owner = Uuid::new_v4();
        store.create_record(lesson(owner, "First")).await.unwrap();
        store.create_record(lesson(owner, "Second")).await.unwrap();
        store.create_record(lesson(Uuid::new_v4(), "Other")).await.unwrap();
        store
            .create_record(NewGenerationRecord {
                owner_id: owner,
                subject: SubjectFields::CreativeWriting(CreativeSubject {
                    genre: "g".into(),
                    tone: "t".into(),
                    level: "l".into(),
                    location: "loc".into(),
                    theme: "th".into(),
                    plot: "p".into(),
                    idea: "i".into(),
                    title: "ti".into(),
                }),
                content: String::new(),
            })
            .await
            .unwrap();

        let lessons = store.list_records(owner, WorkflowKind::LessonPlan).await.unwrap();
        let topics: Vec<_> = lessons
            .iter()
            .map(|r| match &r.subject {
                SubjectFields::LessonPlan(l) => l.topic.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(topics, vec!["Second", "First"]);
        assert_eq!(store.record_count(), 4);
    }
}
