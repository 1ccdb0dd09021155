use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};

use super::{ExportDocument, RenderConfig, RendererSet};
use crate::error::ServiceError;

/// Render `document` on the blocking pool and return it as a PDF attachment.
pub async fn pdf_attachment(
    renderers: &RendererSet,
    document: ExportDocument,
    filename: String,
) -> Result<HttpResponse, ServiceError> {
    let renderer = renderers.for_kind(document.kind);
    let config = RenderConfig::for_label(document.label(), document.generated_on);
    let html = document.to_html();

    log::info!("Rendering {} with {}", filename, renderer.name());
    let pdf = web::block(move || renderer.render(&html, &config)).await??;

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .body(pdf))
}
