use actix_web::{web, HttpResponse};
use uuid::Uuid;

use super::models::{
    CreativeWritingRequest, FollowUpRequest, GenerationRecord, GenerationResponse,
    LessonPlanRequest, WorkflowKind,
};
use crate::auth::AuthenticatedUser;
use crate::error::ServiceError;
use crate::export::{pdf_attachment, ExportDocument};
use crate::{AppState, ErrorResponse};

async fn list(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    kind: WorkflowKind,
) -> Result<HttpResponse, ServiceError> {
    let records = state.content.list(&user, kind).await?;
    Ok(HttpResponse::Ok().json(records))
}

async fn fetch(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    kind: WorkflowKind,
    id: Uuid,
) -> Result<HttpResponse, ServiceError> {
    let record = state.content.get(&user, kind, id).await?;
    Ok(HttpResponse::Ok().json(record))
}

async fn follow_up(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    kind: WorkflowKind,
    id: Uuid,
    body: FollowUpRequest,
) -> Result<HttpResponse, ServiceError> {
    let instruction = body.into_instruction()?;
    let response = state.content.follow_up(&user, kind, id, &instruction).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn download(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    kind: WorkflowKind,
    id: Uuid,
) -> Result<HttpResponse, ServiceError> {
    let record = state.content.get(&user, kind, id).await?;
    let (filename, missing) = match kind {
        WorkflowKind::LessonPlan => ("lesson_plan.pdf", "No lesson plan available to download."),
        WorkflowKind::CreativeWriting => (
            "creative_writing_prompt.pdf",
            "No creative writing prompt available to download.",
        ),
    };
    if record.content.trim().is_empty() {
        return Err(ServiceError::invalid("content", missing));
    }

    let document = ExportDocument::for_record(
        &record,
        &state.config.logo_url(),
        chrono::Utc::now().date_naive(),
    );
    pdf_attachment(&state.renderers, document, filename.to_string()).await
}

// ---------------------------------------------------------------------------
// Lesson plans
// ---------------------------------------------------------------------------

#[utoipa::path(
    context_path = "/api",
    tag = "Lesson Plans",
    get,
    path = "/lesson-plans",
    responses(
        (status = 200, description = "Own lesson plans, newest first", body = [GenerationRecord]),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_lesson_plans(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ServiceError> {
    list(state, user, WorkflowKind::LessonPlan).await
}

/// Generate a lesson plan (or study notes for students) and store it.
#[utoipa::path(
    context_path = "/api",
    tag = "Lesson Plans",
    post,
    path = "/lesson-plans",
    request_body = LessonPlanRequest,
    responses(
        (status = 201, description = "Lesson plan generated", body = GenerationResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 502, description = "Generation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_lesson_plan(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<LessonPlanRequest>,
) -> Result<HttpResponse, ServiceError> {
    let subject = body.into_inner().into_subject()?;
    log::info!("Lesson plan requested by {} ({})", user.username, user.role.as_str());
    let response = state.content.create(&user, subject).await?;
    Ok(HttpResponse::Created().json(response))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Lesson Plans",
    get,
    path = "/lesson-plans/{id}",
    params(("id" = Uuid, Path, description = "Lesson plan id")),
    responses(
        (status = 200, description = "Lesson plan found", body = GenerationRecord),
        (status = 404, description = "Record not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_lesson_plan(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    fetch(state, user, WorkflowKind::LessonPlan, id.into_inner()).await
}

#[utoipa::path(
    context_path = "/api",
    tag = "Lesson Plans",
    post,
    path = "/lesson-plans/{id}/follow-ups",
    params(("id" = Uuid, Path, description = "Lesson plan id")),
    request_body = FollowUpRequest,
    responses(
        (status = 200, description = "Follow-up appended", body = GenerationResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Record not found", body = ErrorResponse),
        (status = 502, description = "Generation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn lesson_plan_follow_up(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
    body: web::Json<FollowUpRequest>,
) -> Result<HttpResponse, ServiceError> {
    follow_up(state, user, WorkflowKind::LessonPlan, id.into_inner(), body.into_inner()).await
}

#[utoipa::path(
    context_path = "/api",
    tag = "Lesson Plans",
    get,
    path = "/lesson-plans/{id}/pdf",
    params(("id" = Uuid, Path, description = "Lesson plan id")),
    responses(
        (status = 200, description = "PDF attachment", content_type = "application/pdf"),
        (status = 400, description = "Nothing to export", body = ErrorResponse),
        (status = 404, description = "Record not found", body = ErrorResponse),
        (status = 500, description = "Rendering failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_lesson_plan(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    download(state, user, WorkflowKind::LessonPlan, id.into_inner()).await
}

// ---------------------------------------------------------------------------
// Creative writing
// ---------------------------------------------------------------------------

#[utoipa::path(
    context_path = "/api",
    tag = "Creative Writing",
    get,
    path = "/creative-writing",
    responses(
        (status = 200, description = "Own creative writing prompts, newest first", body = [GenerationRecord]),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_creative_writing(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ServiceError> {
    list(state, user, WorkflowKind::CreativeWriting).await
}

/// Generate a creative writing prompt; the response carries improvement tips.
#[utoipa::path(
    context_path = "/api",
    tag = "Creative Writing",
    post,
    path = "/creative-writing",
    request_body = CreativeWritingRequest,
    responses(
        (status = 201, description = "Prompt generated", body = GenerationResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 502, description = "Generation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_creative_writing(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CreativeWritingRequest>,
) -> Result<HttpResponse, ServiceError> {
    let subject = body.into_inner().into_subject()?;
    log::info!("Creative writing requested by {} ({})", user.username, user.role.as_str());
    let response = state.content.create(&user, subject).await?;
    Ok(HttpResponse::Created().json(response))
}

#[utoipa::path(
    context_path = "/api",
    tag = "Creative Writing",
    get,
    path = "/creative-writing/{id}",
    params(("id" = Uuid, Path, description = "Creative writing record id")),
    responses(
        (status = 200, description = "Record found", body = GenerationRecord),
        (status = 404, description = "Record not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_creative_writing(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    fetch(state, user, WorkflowKind::CreativeWriting, id.into_inner()).await
}

#[utoipa::path(
    context_path = "/api",
    tag = "Creative Writing",
    post,
    path = "/creative-writing/{id}/follow-ups",
    params(("id" = Uuid, Path, description = "Creative writing record id")),
    request_body = FollowUpRequest,
    responses(
        (status = 200, description = "Follow-up appended", body = GenerationResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Record not found", body = ErrorResponse),
        (status = 502, description = "Generation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn creative_writing_follow_up(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
    body: web::Json<FollowUpRequest>,
) -> Result<HttpResponse, ServiceError> {
    follow_up(state, user, WorkflowKind::CreativeWriting, id.into_inner(), body.into_inner()).await
}

#[utoipa::path(
    context_path = "/api",
    tag = "Creative Writing",
    get,
    path = "/creative-writing/{id}/pdf",
    params(("id" = Uuid, Path, description = "Creative writing record id")),
    responses(
        (status = 200, description = "PDF attachment", content_type = "application/pdf"),
        (status = 400, description = "Nothing to export", body = ErrorResponse),
        (status = 404, description = "Record not found", body = ErrorResponse),
        (status = 500, description = "Rendering failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_creative_writing(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    download(state, user, WorkflowKind::CreativeWriting, id.into_inner()).await
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/lesson-plans")
            .route(web::get().to(list_lesson_plans))
            .route(web::post().to(create_lesson_plan)),
    )
    .service(web::resource("/lesson-plans/{id}").route(web::get().to(get_lesson_plan)))
    .service(
        web::resource("/lesson-plans/{id}/follow-ups")
            .route(web::post().to(lesson_plan_follow_up)),
    )
    .service(web::resource("/lesson-plans/{id}/pdf").route(web::get().to(download_lesson_plan)))
    .service(
        web::resource("/creative-writing")
            .route(web::get().to(list_creative_writing))
            .route(web::post().to(create_creative_writing)),
    )
    .service(web::resource("/creative-writing/{id}").route(web::get().to(get_creative_writing)))
    .service(
        web::resource("/creative-writing/{id}/follow-ups")
            .route(web::post().to(creative_writing_follow_up)),
    )
    .service(
        web::resource("/creative-writing/{id}/pdf").route(web::get().to(download_creative_writing)),
    );
}
