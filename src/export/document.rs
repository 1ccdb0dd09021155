//! Full-page HTML for exported documents.
//!
//! Output depends only on the inputs, so the same record and date always
//! produce identical converter input.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;

use super::DocumentKind;
use crate::application::models::{ApplicationRecord, School};
use crate::generation::markdown::escape_html;
use crate::records::models::{GenerationRecord, SubjectFields};

const STYLES: &str = "body { font-family: 'DejaVu Sans', Arial, sans-serif; line-height: 1.5; color: #222; } \
header { display: flex; align-items: center; gap: 16px; border-bottom: 2px solid #1f4e79; padding-bottom: 8px; margin-bottom: 16px; } \
header img { height: 64px; } \
h1 { font-size: 20pt; color: #1f4e79; margin: 0; } \
.generated-on { color: #666; font-size: 10pt; } \
table { border-collapse: collapse; width: 100%; } \
th, td { border: 1px solid #999; padding: 6px; text-align: left; vertical-align: top; } \
.follow-up-separator { page-break-before: always; } \
.applicant-photo { max-width: 150px; max-height: 180px; } \
.qr-code img { width: 140px; height: 140px; }";

#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub kind: DocumentKind,
    pub title: String,
    pub body_html: String,
    pub logo_url: String,
    pub generated_on: NaiveDate,
}

impl ExportDocument {
    pub fn for_record(record: &GenerationRecord, logo_url: &str, generated_on: NaiveDate) -> Self {
        let (kind, title) = match &record.subject {
            SubjectFields::LessonPlan(subject) => (
                DocumentKind::LessonPlan,
                format!("Lesson Plan: {}", subject.topic),
            ),
            SubjectFields::CreativeWriting(subject) => (
                DocumentKind::CreativeWriting,
                format!("Creative Writing: {}", subject.title),
            ),
        };

        Self {
            kind,
            title,
            body_html: record.content.clone(),
            logo_url: logo_url.to_string(),
            generated_on,
        }
    }

    pub fn for_application(
        application: &ApplicationRecord,
        school: &School,
        logo_url: &str,
        generated_on: NaiveDate,
    ) -> Self {
        Self {
            kind: DocumentKind::Application,
            title: format!("Application {}", application.application_code),
            body_html: application_body(application, school),
            logo_url: logo_url.to_string(),
            generated_on,
        }
    }

    /// Footer label. The application code stays in the title and filename.
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    pub fn to_html(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
             <title>{title}</title>\n<style>{STYLES}</style>\n</head>\n<body>\n\
             <header><img src=\"{logo}\" alt=\"School logo\"><div><h1>{title}</h1>\
             <div class=\"generated-on\">Generated on {date}</div></div></header>\n\
             <main>\n{body}\n</main>\n</body>\n</html>\n",
            title = escape_html(&self.title),
            logo = escape_html(&self.logo_url),
            date = self.generated_on.format("%Y-%m-%d"),
            body = self.body_html,
        )
    }
}

/// `data:` URI for a base64 image, sniffing PNG vs JPEG from the payload.
pub fn image_data_uri(encoded: &str) -> String {
    let mime = if encoded.starts_with("/9j/") {
        "image/jpeg"
    } else {
        "image/png"
    };
    format!("data:{mime};base64,{encoded}")
}

fn row(label: &str, value: &str) -> String {
    format!(
        "<tr><th>{}</th><td>{}</td></tr>",
        escape_html(label),
        escape_html(value)
    )
}

fn optional_row(label: &str, value: Option<&str>) -> String {
    row(label, value.unwrap_or("-"))
}

fn application_body(application: &ApplicationRecord, school: &School) -> String {
    let basic = &application.basic_info;
    let level = &application.school_level;
    let contact = &application.parent_contact;
    let extra = &application.additional_info;

    let mut html = String::new();

    html.push_str("<section class=\"application-summary\">");
    html.push_str(&format!(
        "<p><strong>Application code:</strong> {}</p><p><strong>School:</strong> {}</p>",
        escape_html(&application.application_code),
        escape_html(&school.name)
    ));
    if let Some(image) = &basic.applicant_image {
        html.push_str(&format!(
            "<img class=\"applicant-photo\" src=\"{}\" alt=\"Applicant photo\">",
            image_data_uri(image)
        ));
    }
    html.push_str(&format!(
        "<div class=\"qr-code\"><img src=\"data:image/svg+xml;base64,{}\" alt=\"Application QR code\"></div>",
        STANDARD.encode(application.qr_code.as_bytes())
    ));
    html.push_str("</section>");

    html.push_str("<h2>Applicant</h2><table>");
    html.push_str(&row("Full name", &basic.full_name()));
    html.push_str(&row("Date of birth", &basic.date_of_birth.format("%Y-%m-%d").to_string()));
    html.push_str(&row("Gender", &basic.gender));
    html.push_str("</table>");

    html.push_str("<h2>School Level</h2><table>");
    html.push_str(&row("Level applied for", &level.level));
    html.push_str(&optional_row("Previous school", level.previous_school.as_deref()));
    html.push_str(&optional_row("Previous class", level.previous_class.as_deref()));
    html.push_str("</table>");

    html.push_str("<h2>Parent / Guardian</h2><table>");
    html.push_str(&row("Name", &contact.guardian_name));
    html.push_str(&row("Relationship", &contact.relationship));
    html.push_str(&row("Phone", &contact.phone));
    html.push_str(&optional_row("Email", contact.email.as_deref()));
    html.push_str(&row("Address", &contact.address));
    html.push_str("</table>");

    html.push_str("<h2>Additional Information</h2><table>");
    html.push_str(&optional_row("Medical conditions", extra.medical_conditions.as_deref()));
    html.push_str(&optional_row("Special needs", extra.special_needs.as_deref()));
    html.push_str(&optional_row(
        "Extracurricular interests",
        extra.extracurricular_interests.as_deref(),
    ));
    html.push_str(&optional_row("Referral source", extra.referral_source.as_deref()));
    html.push_str("</table>");

    html
}
