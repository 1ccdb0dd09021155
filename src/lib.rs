use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpResponse, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod application;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod generation;
pub mod records;
pub mod validation;

pub use crate::config::AppConfig;
pub use crate::db::AppState;
pub use crate::error::ServiceError;

use crate::validation::ValidationError;

/// Largest accepted JSON body; leaves room for a base64 applicant photo.
const JSON_LIMIT_BYTES: usize = 4 * 1024 * 1024;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ValidationErrorBody>,
}

/// Per-field detail attached to validation failures.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorBody {
    pub field: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl From<ValidationError> for ValidationErrorBody {
    fn from(error: ValidationError) -> Self {
        Self {
            field: error.field,
            message: error.message,
            suggestion: error.suggestion,
        }
    }
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<ValidationError>) -> Self {
        self.fields = fields.into_iter().map(ValidationErrorBody::from).collect();
        self
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::records::handlers::list_lesson_plans,
        crate::records::handlers::create_lesson_plan,
        crate::records::handlers::get_lesson_plan,
        crate::records::handlers::lesson_plan_follow_up,
        crate::records::handlers::download_lesson_plan,
        crate::records::handlers::list_creative_writing,
        crate::records::handlers::create_creative_writing,
        crate::records::handlers::get_creative_writing,
        crate::records::handlers::creative_writing_follow_up,
        crate::records::handlers::download_creative_writing,
        crate::application::handlers::list_schools,
        crate::application::handlers::get_school,
        crate::application::handlers::start_wizard,
        crate::application::handlers::show_wizard_step,
        crate::application::handlers::submit_wizard_step,
        crate::application::handlers::list_applications,
        crate::application::handlers::get_application,
        crate::application::handlers::download_application
    ),
    components(
        schemas(
            records::models::WorkflowKind,
            records::models::LessonSubject,
            records::models::CreativeSubject,
            records::models::SubjectFields,
            records::models::GenerationRecord,
            records::models::LessonPlanRequest,
            records::models::CreativeWritingRequest,
            records::models::FollowUpRequest,
            records::models::GenerationResponse,
            application::models::School,
            application::models::BasicInfo,
            application::models::SchoolLevel,
            application::models::ParentContact,
            application::models::AdditionalInfo,
            application::models::ApplicationRecord,
            application::models::WizardView,
            application::models::ApplicationDone,
            application::wizard::WizardStep,
            application::steps::BasicInfoForm,
            application::steps::SchoolLevelForm,
            application::steps::ParentContactForm,
            application::steps::AdditionalInfoForm,
            application::handlers::StepPayload,
            ErrorResponse,
            ValidationErrorBody,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Lesson Plans", description = "Lesson plan and study note generation with follow-ups."),
        (name = "Creative Writing", description = "Creative writing prompts with follow-ups."),
        (name = "Schools", description = "School directory."),
        (name = "Applications", description = "Admission wizard and submitted applications.")
    ),
    servers(
        (url = "http://127.0.0.1:8080", description = "Localhost server")
    )
)]
pub struct ApiDoc;

/// JSON extractor settings: larger limit and errors in the `ErrorResponse` shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(|err, _req| {
            let response =
                HttpResponse::BadRequest().json(ErrorResponse::bad_request(&err.to_string()));
            actix_web::error::InternalError::from_response(err, response).into()
        })
}

/// Every `/api` route.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(records::handlers::config)
        .configure(application::handlers::config);
}

pub async fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    let bind = (config.host.clone(), config.port);
    let static_dir = config.static_dir.clone();
    let allowed_origins = config.cors_allowed_origins.clone();

    let app_state = match AppState::new(config).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to initialise application state. Please check DATABASE_URL and GROQ_API_KEY in .env. Error: {}", e);
            return Err(e);
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("school_portal_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create Prometheus metrics middleware: {}", e))?;

    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
            ])
            .expose_headers(vec![header::CONTENT_DISPOSITION])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .app_data(json_config())
            .service(web::scope("/api").configure(configure_api))
            .service(actix_files::Files::new("/static", static_dir.clone()))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .backlog(8192)
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}
