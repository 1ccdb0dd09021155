//! Database module - AppState and persistence
//!
//! This module is split into submodules for better separation of concerns:
//! - `store` - the `RecordStore` trait and `StoreError`
//! - `postgres` - sqlx/Postgres implementation with migrations
//! - `memory` - in-process implementation for local runs and tests

mod memory;
mod postgres;
mod store;

pub use memory::InMemoryRecordStore;
pub use postgres::PgRecordStore;
pub use store::{RecordStore, StoreError};

use std::sync::Arc;

use crate::application::AdmissionWizard;
use crate::config::AppConfig;
use crate::export::RendererSet;
use crate::generation::{GroqClient, TextGenerator};
use crate::records::ContentService;

/// Shared handles every request handler works with.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn RecordStore>,
    pub content: Arc<ContentService>,
    pub wizard: Arc<AdmissionWizard>,
    pub renderers: RendererSet,
}

impl AppState {
    /// Build production state: Postgres when `DATABASE_URL` is set, Groq for generation,
    /// and the configured PDF backends.
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn RecordStore> = match config.database_url.as_deref() {
            Some(url) => {
                let store = PgRecordStore::connect(url).await?;
                log::info!("Connected to Postgres");
                Arc::new(store)
            }
            None => Arc::new(InMemoryRecordStore::seeded()),
        };

        let generator = Arc::new(GroqClient::new(&config.groq)?);
        log::info!("Using Groq model {}", generator.model());

        let renderers = RendererSet::from_config(&config.pdf);
        Ok(Self::with_components(config, store, generator, renderers))
    }

    /// Assemble state from explicit parts.
    pub fn with_components(
        config: AppConfig,
        store: Arc<dyn RecordStore>,
        generator: Arc<dyn TextGenerator>,
        renderers: RendererSet,
    ) -> Self {
        let content = Arc::new(ContentService::new(
            store.clone(),
            generator,
            config.creative_follow_up_separator,
        ));
        let wizard = Arc::new(AdmissionWizard::new(store.clone(), config.wizard_session_ttl));

        Self {
            config: Arc::new(config),
            store,
            content,
            wizard,
            renderers,
        }
    }
}
