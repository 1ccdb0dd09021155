#![allow(dead_code, unused_macros)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use school_portal_server::application::models::School;
use school_portal_server::auth::{generate_access_token, Role};
use school_portal_server::config::AppConfig;
use school_portal_server::db::InMemoryRecordStore;
use school_portal_server::export::{DocumentRenderer, RenderConfig, RenderError, RendererSet};
use school_portal_server::generation::{GenerationError, TextGenerator};
use school_portal_server::AppState;

pub const STUB_PDF: &[u8] = b"%PDF-1.4 stub";

/// Text generator that replays queued replies, then a default one, and keeps every prompt.
pub struct StubGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(&self, text: &str) {
        self.replies.lock().push_back(Ok(text.to_string()));
    }

    pub fn fail(&self) {
        self.replies.lock().push_back(Err(GenerationError::Status {
            status: 503,
            body: "upstream unavailable".to_string(),
        }));
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().push(prompt.to_string());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok("### Generated\nStub content.".to_string()))
    }
}

/// Renderer that records its input instead of running a converter.
pub struct CapturingRenderer {
    pub calls: Mutex<Vec<(String, RenderConfig)>>,
}

impl CapturingRenderer {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl DocumentRenderer for CapturingRenderer {
    fn name(&self) -> &'static str {
        "capturing"
    }

    fn render(&self, html: &str, config: &RenderConfig) -> Result<Vec<u8>, RenderError> {
        self.calls.lock().push((html.to_string(), config.clone()));
        Ok(STUB_PDF.to_vec())
    }
}

pub struct TestContext {
    pub state: AppState,
    pub store: Arc<InMemoryRecordStore>,
    pub generator: Arc<StubGenerator>,
    pub renderer: Arc<CapturingRenderer>,
    pub school: School,
}

pub fn context() -> TestContext {
    context_with(AppConfig::for_tests())
}

pub fn context_with(config: AppConfig) -> TestContext {
    let store = Arc::new(InMemoryRecordStore::new());
    let school = School {
        id: Uuid::new_v4(),
        name: "Freetown Secondary School".to_string(),
        address: Some("Freetown".to_string()),
        levels: vec!["JSS1".to_string(), "JSS2".to_string(), "SSS1".to_string()],
    };
    store.add_school(school.clone());

    let generator = Arc::new(StubGenerator::new());
    let renderer = Arc::new(CapturingRenderer::new());
    let state = AppState::with_components(
        config,
        store.clone(),
        generator.clone(),
        RendererSet::uniform(renderer.clone()),
    );

    TestContext {
        state,
        store,
        generator,
        renderer,
        school,
    }
}

/// A signed-in user: id plus the `Authorization` header value.
pub struct TestUser {
    pub id: Uuid,
    pub auth: String,
}

pub fn user(role: Role) -> TestUser {
    let id = Uuid::new_v4();
    let token = generate_access_token(&id.to_string(), "test-user", role)
        .expect("token should be issued");
    TestUser {
        id,
        auth: format!("Bearer {token}"),
    }
}

/// Initialise the full `/api` app over a `TestContext`.
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.state.clone()))
                .app_data(school_portal_server::json_config())
                .service(
                    actix_web::web::scope("/api")
                        .configure(school_portal_server::configure_api),
                ),
        )
        .await
    };
}
