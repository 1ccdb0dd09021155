//! Application code and QR derivation.

use chrono::{DateTime, Datelike, Utc};
use qrcode::render::svg;
use qrcode::QrCode;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("failed to encode QR code: {0}")]
    Qr(#[from] qrcode::types::QrError),
}

/// `APP-<year>-<first 8 hex digits of the id>`, upper-case.
pub fn application_code(id: Uuid, created_at: DateTime<Utc>) -> String {
    let simple = id.simple().to_string().to_ascii_uppercase();
    format!("APP-{}-{}", created_at.year(), &simple[..8])
}

/// SVG QR image encoding `code`.
pub fn qr_svg(code: &str) -> Result<String, DeriveError> {
    let qr = QrCode::new(code.as_bytes())?;
    Ok(qr
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}
