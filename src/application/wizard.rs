//! Four-step admission wizard.
//!
//! Step data lives in a TTL session cache until the last step is accepted;
//! only then is a single application record written.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use utoipa::ToSchema;
use uuid::Uuid;

use super::code::{application_code, qr_svg};
use super::models::{
    AdditionalInfo, ApplicationDone, ApplicationDraft, ApplicationRecord, BasicInfo,
    ParentContact, School, SchoolLevel, WizardView,
};
use super::steps::{
    parse_form, today, AdditionalInfoForm, BasicInfoForm, ParentContactForm, SchoolLevelForm,
};
use crate::auth::AuthenticatedUser;
use crate::db::RecordStore;
use crate::error::ServiceError;

const MAX_SESSIONS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    BasicInfo,
    SchoolLevel,
    ParentContact,
    AdditionalInfo,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        Self::BasicInfo,
        Self::SchoolLevel,
        Self::ParentContact,
        Self::AdditionalInfo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BasicInfo => "basic_info",
            Self::SchoolLevel => "school_level",
            Self::ParentContact => "parent_contact",
            Self::AdditionalInfo => "additional_info",
        }
    }

    pub fn next(&self) -> Option<Self> {
        match self {
            Self::BasicInfo => Some(Self::SchoolLevel),
            Self::SchoolLevel => Some(Self::ParentContact),
            Self::ParentContact => Some(Self::AdditionalInfo),
            Self::AdditionalInfo => None,
        }
    }

    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WizardStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| format!("unknown wizard step: {s}"))
    }
}

#[derive(Debug, Clone)]
pub struct WizardSession {
    pub id: Uuid,
    pub guardian_id: Uuid,
    pub school_id: Uuid,
    /// Furthest step the guardian may open or submit.
    pub current: WizardStep,
    pub basic_info: Option<BasicInfo>,
    pub school_level: Option<SchoolLevel>,
    pub parent_contact: Option<ParentContact>,
    pub additional_info: Option<AdditionalInfo>,
    pub created_at: DateTime<Utc>,
    /// Set once the final step claims the session for its application.
    consumed: bool,
}

impl WizardSession {
    fn new(guardian_id: Uuid, school_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            guardian_id,
            school_id,
            current: WizardStep::BasicInfo,
            basic_info: None,
            school_level: None,
            parent_contact: None,
            additional_info: None,
            created_at: Utc::now(),
            consumed: false,
        }
    }

    /// Previously cleaned data for `step`, as shown when going back.
    pub fn step_data(&self, step: WizardStep) -> Option<serde_json::Value> {
        let value = match step {
            WizardStep::BasicInfo => serde_json::to_value(self.basic_info.as_ref()?),
            WizardStep::SchoolLevel => serde_json::to_value(self.school_level.as_ref()?),
            WizardStep::ParentContact => serde_json::to_value(self.parent_contact.as_ref()?),
            WizardStep::AdditionalInfo => serde_json::to_value(self.additional_info.as_ref()?),
        };
        value.ok()
    }

    /// All four groups merged, or `None` while any is missing.
    pub fn into_draft(self) -> Option<ApplicationDraft> {
        Some(ApplicationDraft {
            guardian_id: self.guardian_id,
            school_id: self.school_id,
            basic_info: self.basic_info?,
            school_level: self.school_level?,
            parent_contact: self.parent_contact?,
            additional_info: self.additional_info?,
        })
    }
}

/// Result of a step submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    Advanced(WizardView),
    Completed(ApplicationDone),
}

type SessionHandle = Arc<Mutex<WizardSession>>;

pub struct AdmissionWizard {
    store: Arc<dyn RecordStore>,
    sessions: Cache<Uuid, SessionHandle>,
}

impl AdmissionWizard {
    pub fn new(store: Arc<dyn RecordStore>, session_ttl: Duration) -> Self {
        let sessions = Cache::builder()
            .time_to_live(session_ttl)
            .max_capacity(MAX_SESSIONS)
            .build();
        Self { store, sessions }
    }

    pub async fn start(
        &self,
        user: &AuthenticatedUser,
        school_id: Uuid,
    ) -> Result<WizardView, ServiceError> {
        require_guardian(user)?;
        let school = self.school(school_id).await?;

        let session = WizardSession::new(user.id, school.id);
        log::info!(
            "Guardian {} started application wizard {} for school {}",
            user.id,
            session.id,
            school.id
        );
        let view = view_for(&session, school, WizardStep::BasicInfo);
        self.sessions
            .insert(session.id, Arc::new(Mutex::new(session)))
            .await;
        Ok(view)
    }

    pub async fn show(
        &self,
        user: &AuthenticatedUser,
        school_id: Uuid,
        wizard_id: Uuid,
        step: WizardStep,
    ) -> Result<WizardView, ServiceError> {
        let (session, school) = self.load(user, school_id, wizard_id).await?;
        ensure_reached(&session, step)?;
        Ok(view_for(&session, school, step))
    }

    pub async fn submit(
        &self,
        user: &AuthenticatedUser,
        school_id: Uuid,
        wizard_id: Uuid,
        step: WizardStep,
        payload: serde_json::Value,
    ) -> Result<SubmitOutcome, ServiceError> {
        let (mut session, school) = self.load(user, school_id, wizard_id).await?;
        ensure_reached(&session, step)?;

        match step {
            WizardStep::BasicInfo => {
                session.basic_info = Some(parse_form::<BasicInfoForm>(payload)?.clean(today())?)
            }
            WizardStep::SchoolLevel => {
                session.school_level =
                    Some(parse_form::<SchoolLevelForm>(payload)?.clean(&school)?)
            }
            WizardStep::ParentContact => {
                session.parent_contact = Some(parse_form::<ParentContactForm>(payload)?.clean()?)
            }
            WizardStep::AdditionalInfo => {
                session.additional_info = Some(parse_form::<AdditionalInfoForm>(payload)?.clean()?)
            }
        }

        match step.next() {
            Some(next) => {
                session.current = next;
                let view = view_for(&session, school, next);
                // Re-inserting the same handle refreshes the TTL.
                let handle = OwnedMutexGuard::mutex(&session).clone();
                self.sessions.insert(session.id, handle).await;
                Ok(SubmitOutcome::Advanced(view))
            }
            None => self.complete(session, school).await.map(SubmitOutcome::Completed),
        }
    }

    /// Called with the session lock held.
    async fn complete(
        &self,
        mut session: OwnedMutexGuard<WizardSession>,
        school: School,
    ) -> Result<ApplicationDone, ServiceError> {
        let draft = (*session).clone().into_draft().ok_or_else(|| {
            ServiceError::invalid("wizard", "Complete all previous steps before submitting")
        })?;

        session.consumed = true;
        self.sessions.invalidate(&session.id).await;

        match self.create_application(draft).await {
            Ok(application) => {
                log::info!(
                    "Application {} ({}) created for school {}",
                    application.application_code,
                    application.id,
                    school.id
                );
                Ok(ApplicationDone {
                    application,
                    school,
                })
            }
            Err(e) => {
                session.consumed = false;
                let handle = OwnedMutexGuard::mutex(&session).clone();
                self.sessions.insert(session.id, handle).await;
                Err(e)
            }
        }
    }

    async fn create_application(
        &self,
        draft: ApplicationDraft,
    ) -> Result<ApplicationRecord, ServiceError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let application_code = application_code(id, created_at);
        let qr_code = qr_svg(&application_code)
            .map_err(|e| ServiceError::Internal(format!("Failed to derive QR code: {e}")))?;

        let application = ApplicationRecord {
            id,
            application_code,
            guardian_id: draft.guardian_id,
            school_id: draft.school_id,
            basic_info: draft.basic_info,
            school_level: draft.school_level,
            parent_contact: draft.parent_contact,
            additional_info: draft.additional_info,
            qr_code,
            created_at,
        };

        self.store.create_application(&application).await?;
        Ok(application)
    }

    async fn school(&self, school_id: Uuid) -> Result<School, ServiceError> {
        self.store
            .get_school(school_id)
            .await?
            .ok_or(ServiceError::NotFoundOrForbidden)
    }

    async fn load(
        &self,
        user: &AuthenticatedUser,
        school_id: Uuid,
        wizard_id: Uuid,
    ) -> Result<(OwnedMutexGuard<WizardSession>, School), ServiceError> {
        require_guardian(user)?;
        let handle = self
            .sessions
            .get(&wizard_id)
            .await
            .ok_or(ServiceError::NotFoundOrForbidden)?;

        // A handle fetched before the final step may be locked only after it
        // was consumed.
        let session = handle.lock_owned().await;
        if session.consumed || session.guardian_id != user.id || session.school_id != school_id {
            return Err(ServiceError::NotFoundOrForbidden);
        }

        let school = self.school(school_id).await?;
        Ok((session, school))
    }
}

fn require_guardian(user: &AuthenticatedUser) -> Result<(), ServiceError> {
    if user.role.is_guardian() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "Only guardians can submit school applications".to_string(),
        ))
    }
}

fn ensure_reached(session: &WizardSession, step: WizardStep) -> Result<(), ServiceError> {
    if step > session.current {
        return Err(ServiceError::invalid(
            "step",
            format!("Complete the {} step first", session.current),
        ));
    }
    Ok(())
}

fn view_for(session: &WizardSession, school: School, step: WizardStep) -> WizardView {
    WizardView {
        wizard_id: session.id,
        school,
        current_step: session.current,
        steps: WizardStep::ALL.to_vec(),
        step: Some(step),
        data: session.step_data(step),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::db::InMemoryRecordStore;
    use serde_json::json;

    fn guardian() -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            username: "guardian".to_string(),
            role: Role::Guardian,
        }
    }

    fn setup() -> (Arc<InMemoryRecordStore>, AdmissionWizard, School) {
        let store = Arc::new(InMemoryRecordStore::new());
        let school = School {
            id: Uuid::new_v4(),
            name: "Waterloo Secondary".to_string(),
            address: None,
            levels: vec!["JSS1".to_string()],
        };
        store.add_school(school.clone());
        let wizard = AdmissionWizard::new(store.clone(), Duration::from_secs(60));
        (store, wizard, school)
    }

    fn payload(step: WizardStep) -> serde_json::Value {
        match step {
            WizardStep::BasicInfo => json!({
                "first_name": "Isatu", "last_name": "Bangura",
                "date_of_birth": "2013-05-20", "gender": "female"
            }),
            WizardStep::SchoolLevel => json!({"level": "JSS1"}),
            WizardStep::ParentContact => json!({
                "guardian_name": "Abu Bangura", "relationship": "Father",
                "phone": "+23277111222", "address": "Waterloo"
            }),
            WizardStep::AdditionalInfo => json!({"referral_source": "Radio"}),
        }
    }

    #[test]
    fn test_step_order() {
        assert!(WizardStep::BasicInfo < WizardStep::AdditionalInfo);
        assert_eq!(WizardStep::ParentContact.next(), Some(WizardStep::AdditionalInfo));
        assert!(WizardStep::AdditionalInfo.is_last());
        assert_eq!("school_level".parse::<WizardStep>(), Ok(WizardStep::SchoolLevel));
    }

    #[tokio::test]
    async fn test_only_guardians_start() {
        let (_, wizard, school) = setup();
        let teacher = AuthenticatedUser {
            role: Role::Teacher,
            ..guardian()
        };
        assert!(matches!(
            wizard.start(&teacher, school.id).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            wizard.start(&guardian(), Uuid::new_v4()).await,
            Err(ServiceError::NotFoundOrForbidden)
        ));
    }

    #[tokio::test]
    async fn test_cannot_skip_ahead() {
        let (_, wizard, school) = setup();
        let user = guardian();
        let view = wizard.start(&user, school.id).await.unwrap();

        let err = wizard
            .submit(&user, school.id, view.wizard_id, WizardStep::ParentContact, payload(WizardStep::ParentContact))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(wizard.show(&user, school.id, view.wizard_id, WizardStep::SchoolLevel).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_step_leaves_session_unchanged() {
        let (_, wizard, school) = setup();
        let user = guardian();
        let id = wizard.start(&user, school.id).await.unwrap().wizard_id;

        let err = wizard
            .submit(&user, school.id, id, WizardStep::BasicInfo, json!({"first_name": "Isatu"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let view = wizard.show(&user, school.id, id, WizardStep::BasicInfo).await.unwrap();
        assert_eq!(view.current_step, WizardStep::BasicInfo);
        assert!(view.data.is_none());
    }

    #[tokio::test]
    async fn test_full_run_creates_exactly_one_application() {
        let (store, wizard, school) = setup();
        let user = guardian();
        let id = wizard.start(&user, school.id).await.unwrap().wizard_id;

        for step in &WizardStep::ALL[..3] {
            let outcome = wizard.submit(&user, school.id, id, *step, payload(*step)).await.unwrap();
            assert!(matches!(outcome, SubmitOutcome::Advanced(_)));
        }
        assert_eq!(store.application_count(), 0);

        let outcome = wizard
            .submit(&user, school.id, id, WizardStep::AdditionalInfo, payload(WizardStep::AdditionalInfo))
            .await
            .unwrap();
        let SubmitOutcome::Completed(done) = outcome else {
            panic!("expected completion");
        };
        assert!(done.application.application_code.starts_with("APP-"));
        assert_eq!(done.application.basic_info.first_name, "Isatu");
        assert_eq!(store.application_count(), 1);

        // The session is gone once the application exists.
        assert!(matches!(
            wizard.show(&user, school.id, id, WizardStep::BasicInfo).await,
            Err(ServiceError::NotFoundOrForbidden)
        ));
    }

    #[tokio::test]
    async fn test_resubmit_racing_final_step_cannot_revive_session() {
        let (store, wizard, school) = setup();
        let user = guardian();
        let id = wizard.start(&user, school.id).await.unwrap().wizard_id;
        for step in &WizardStep::ALL[..3] {
            wizard.submit(&user, school.id, id, *step, payload(*step)).await.unwrap();
        }

        // Hold the lock so both submissions fetch the handle before either runs.
        let held = wizard.sessions.get(&id).await.unwrap().lock_owned().await;
        let last = wizard.submit(&user, school.id, id, WizardStep::AdditionalInfo, payload(WizardStep::AdditionalInfo));
        let resubmit = wizard.submit(&user, school.id, id, WizardStep::ParentContact, payload(WizardStep::ParentContact));
        let release = async move {
            tokio::task::yield_now().await;
            drop(held);
        };
        let (last, resubmit, ()) = tokio::join!(last, resubmit, release);

        assert!(matches!(last, Ok(SubmitOutcome::Completed(_))));
        assert!(matches!(resubmit, Err(ServiceError::NotFoundOrForbidden)));
        assert_eq!(store.application_count(), 1);

        let again = wizard
            .submit(&user, school.id, id, WizardStep::AdditionalInfo, payload(WizardStep::AdditionalInfo))
            .await;
        assert!(matches!(again, Err(ServiceError::NotFoundOrForbidden)));
        assert_eq!(store.application_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_steps_do_not_lose_updates() {
        let (_, wizard, school) = setup();
        let user = guardian();
        let id = wizard.start(&user, school.id).await.unwrap().wizard_id;
        for step in &WizardStep::ALL[..2] {
            wizard.submit(&user, school.id, id, *step, payload(*step)).await.unwrap();
        }

        let mut renamed = payload(WizardStep::BasicInfo);
        renamed["first_name"] = json!("Mariatu");
        let (first, second) = tokio::join!(
            wizard.submit(&user, school.id, id, WizardStep::BasicInfo, renamed),
            wizard.submit(
                &user,
                school.id,
                id,
                WizardStep::SchoolLevel,
                json!({"level": "JSS1", "previous_school": "Waterloo Primary"})
            ),
        );
        first.unwrap();
        second.unwrap();

        let basic = wizard.show(&user, school.id, id, WizardStep::BasicInfo).await.unwrap();
        assert_eq!(basic.data.unwrap()["first_name"], "Mariatu");
        let level = wizard.show(&user, school.id, id, WizardStep::SchoolLevel).await.unwrap();
        assert_eq!(level.data.unwrap()["previous_school"], "Waterloo Primary");
    }

    #[tokio::test]
    async fn test_going_back_shows_and_overwrites_data() {
        let (_, wizard, school) = setup();
        let user = guardian();
        let id = wizard.start(&user, school.id).await.unwrap().wizard_id;
        wizard.submit(&user, school.id, id, WizardStep::BasicInfo, payload(WizardStep::BasicInfo)).await.unwrap();
        wizard.submit(&user, school.id, id, WizardStep::SchoolLevel, payload(WizardStep::SchoolLevel)).await.unwrap();

        let back = wizard.show(&user, school.id, id, WizardStep::BasicInfo).await.unwrap();
        assert_eq!(back.data.unwrap()["first_name"], "Isatu");

        let mut changed = payload(WizardStep::BasicInfo);
        changed["first_name"] = json!("Mariatu");
        let SubmitOutcome::Advanced(view) = wizard
            .submit(&user, school.id, id, WizardStep::BasicInfo, changed)
            .await
            .unwrap()
        else {
            panic!("expected to advance");
        };
        assert_eq!(view.current_step, WizardStep::SchoolLevel);
        assert_eq!(view.data.unwrap()["level"], "JSS1");
    }

    #[tokio::test]
    async fn test_other_guardian_cannot_use_session() {
        let (_, wizard, school) = setup();
        let owner = guardian();
        let id = wizard.start(&owner, school.id).await.unwrap().wizard_id;

        assert!(matches!(
            wizard.show(&guardian(), school.id, id, WizardStep::BasicInfo).await,
            Err(ServiceError::NotFoundOrForbidden)
        ));
        assert!(matches!(
            wizard.show(&owner, Uuid::new_v4(), id, WizardStep::BasicInfo).await,
            Err(ServiceError::NotFoundOrForbidden)
        ));
    }
}
