use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::models::{ApplicationDone, ApplicationRecord, School, WizardView};
use super::wizard::{SubmitOutcome, WizardStep};
use crate::auth::AuthenticatedUser;
use crate::error::ServiceError;
use crate::export::{pdf_attachment, ExportDocument};
use crate::{AppState, ErrorResponse};

/// Raw step payload; its fields depend on the step being submitted.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct StepPayload(pub serde_json::Value);

#[utoipa::path(
    context_path = "/api",
    tag = "Schools",
    get,
    path = "/schools",
    responses(
        (status = 200, description = "All schools accepting applications", body = [School])
    )
)]
pub async fn list_schools(state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let schools = state.store.list_schools().await?;
    Ok(HttpResponse::Ok().json(schools))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Schools",
    get,
    path = "/schools/{id}",
    params(("id" = Uuid, Path, description = "School id")),
    responses(
        (status = 200, description = "School found", body = School),
        (status = 404, description = "School not found", body = ErrorResponse)
    )
)]
pub async fn get_school(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let school = state
        .store
        .get_school(id.into_inner())
        .await?
        .ok_or(ServiceError::NotFoundOrForbidden)?;
    Ok(HttpResponse::Ok().json(school))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Applications",
    post,
    path = "/schools/{school_id}/applications/wizard",
    params(("school_id" = Uuid, Path, description = "School to apply to")),
    responses(
        (status = 201, description = "Wizard started at the first step", body = WizardView),
        (status = 403, description = "Caller is not a guardian", body = ErrorResponse),
        (status = 404, description = "School not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn start_wizard(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    school_id: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let view = state.wizard.start(&user, school_id.into_inner()).await?;
    Ok(HttpResponse::Created().json(view))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Applications",
    get,
    path = "/schools/{school_id}/applications/wizard/{wizard_id}/{step}",
    params(
        ("school_id" = Uuid, Path, description = "School the wizard was started for"),
        ("wizard_id" = Uuid, Path, description = "Wizard session id"),
        ("step" = WizardStep, Path, description = "Step to display")
    ),
    responses(
        (status = 200, description = "Step with any previously entered data", body = WizardView),
        (status = 400, description = "Step not reached yet", body = ErrorResponse),
        (status = 404, description = "Wizard not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn show_wizard_step(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid, WizardStep)>,
) -> Result<HttpResponse, ServiceError> {
    let (school_id, wizard_id, step) = path.into_inner();
    let view = state.wizard.show(&user, school_id, wizard_id, step).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Submit one step. The last step creates the application and returns 201.
#[utoipa::path(
    context_path = "/api",
    tag = "Applications",
    post,
    path = "/schools/{school_id}/applications/wizard/{wizard_id}/{step}",
    params(
        ("school_id" = Uuid, Path, description = "School the wizard was started for"),
        ("wizard_id" = Uuid, Path, description = "Wizard session id"),
        ("step" = WizardStep, Path, description = "Step being submitted")
    ),
    request_body = StepPayload,
    responses(
        (status = 200, description = "Step accepted, next step returned", body = WizardView),
        (status = 201, description = "Application created", body = ApplicationDone),
        (status = 400, description = "Invalid step data", body = ErrorResponse),
        (status = 404, description = "Wizard not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn submit_wizard_step(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid, WizardStep)>,
    payload: web::Json<StepPayload>,
) -> Result<HttpResponse, ServiceError> {
    let (school_id, wizard_id, step) = path.into_inner();
    let outcome = state
        .wizard
        .submit(&user, school_id, wizard_id, step, payload.into_inner().0)
        .await?;

    Ok(match outcome {
        SubmitOutcome::Advanced(view) => HttpResponse::Ok().json(view),
        SubmitOutcome::Completed(done) => HttpResponse::Created().json(done),
    })
}

#[utoipa::path(
    context_path = "/api",
    tag = "Applications",
    get,
    path = "/applications",
    responses(
        (status = 200, description = "Own applications, newest first", body = [ApplicationRecord])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_applications(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ServiceError> {
    let applications = state.store.list_applications(user.id).await?;
    Ok(HttpResponse::Ok().json(applications))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Applications",
    get,
    path = "/applications/{id}",
    params(("id" = Uuid, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application found", body = ApplicationRecord),
        (status = 404, description = "Record not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_application(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let application = state
        .store
        .get_application(id.into_inner(), user.id)
        .await?
        .ok_or(ServiceError::NotFoundOrForbidden)?;
    Ok(HttpResponse::Ok().json(application))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Applications",
    get,
    path = "/applications/{id}/pdf",
    params(("id" = Uuid, Path, description = "Application id")),
    responses(
        (status = 200, description = "PDF attachment", content_type = "application/pdf"),
        (status = 404, description = "Record not found", body = ErrorResponse),
        (status = 500, description = "Rendering failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_application(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let application = state
        .store
        .get_application(id.into_inner(), user.id)
        .await?
        .ok_or(ServiceError::NotFoundOrForbidden)?;
    let school = state
        .store
        .get_school(application.school_id)
        .await?
        .ok_or_else(|| {
            ServiceError::Internal(format!(
                "School {} of application {} is missing",
                application.school_id, application.id
            ))
        })?;

    let filename = format!("application_{}.pdf", application.application_code);
    let document = ExportDocument::for_application(
        &application,
        &school,
        &state.config.logo_url(),
        chrono::Utc::now().date_naive(),
    );
    pdf_attachment(&state.renderers, document, filename).await
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/schools").route(web::get().to(list_schools)))
        .service(web::resource("/schools/{id}").route(web::get().to(get_school)))
        .service(
            web::resource("/schools/{school_id}/applications/wizard")
                .route(web::post().to(start_wizard)),
        )
        .service(
            web::resource("/schools/{school_id}/applications/wizard/{wizard_id}/{step}")
                .route(web::get().to(show_wizard_step))
                .route(web::post().to(submit_wizard_step)),
        )
        .service(web::resource("/applications").route(web::get().to(list_applications)))
        .service(web::resource("/applications/{id}").route(web::get().to(get_application)))
        .service(
            web::resource("/applications/{id}/pdf").route(web::get().to(download_application)),
        );
}
