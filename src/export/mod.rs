//! PDF export - business logic for turning stored HTML into downloadable documents.
//!
//! - `document` - deterministic full-page HTML for each exported kind
//! - `download` - blocking-pool rendering into an attachment response
//! - `engine` - temp-dir plumbing shared by the converter CLIs
//! - `wkhtmltopdf` / `weasyprint` - `DocumentRenderer` backends

pub mod document;
pub mod download;
pub mod engine;
pub mod weasyprint;
pub mod wkhtmltopdf;

pub use document::ExportDocument;
pub use download::pdf_attachment;
pub use weasyprint::WeasyPrintRenderer;
pub use wkhtmltopdf::WkhtmltopdfRenderer;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::PdfConfig;

/// Errors that can occur while converting HTML to PDF.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to write HTML source: {0}")]
    Write(#[source] std::io::Error),
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("converter exited with status {0}")]
    Exit(i32),
    #[error("failed to read generated PDF: {0}")]
    ReadPdf(#[source] std::io::Error),
    #[error("render worker was cancelled")]
    Cancelled,
}

/// Converter selectable per document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    WeasyPrint,
    Wkhtmltopdf,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weasyprint" => Ok(Self::WeasyPrint),
            "wkhtmltopdf" => Ok(Self::Wkhtmltopdf),
            other => Err(format!("unknown PDF backend: {other}")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WeasyPrint => "weasyprint",
            Self::Wkhtmltopdf => "wkhtmltopdf",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portrait => "Portrait",
            Self::Landscape => "Landscape",
        }
    }
}

/// Page setup shared by every backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub page_size: &'static str,
    pub orientation: Orientation,
    pub margin_top: &'static str,
    pub margin_right: &'static str,
    pub margin_bottom: &'static str,
    pub margin_left: &'static str,
    pub dpi: u32,
    pub encoding: &'static str,
    pub zoom: f32,
    pub header_left: String,
    pub footer_left: String,
    pub footer_right: &'static str,
    pub header_font_size: u32,
    pub footer_font_size: u32,
    pub minimum_font_size: u32,
}

impl RenderConfig {
    /// Standard A4 setup with the generated date in the header and `label` in the footer.
    pub fn for_label(label: &str, generated_on: NaiveDate) -> Self {
        Self {
            page_size: "A4",
            orientation: Orientation::Portrait,
            margin_top: "1in",
            margin_right: "1in",
            margin_bottom: "1in",
            margin_left: "1in",
            dpi: 300,
            encoding: "UTF-8",
            zoom: 1.1,
            header_left: format!("Generated on {}", generated_on.format("%Y-%m-%d")),
            footer_left: label.to_string(),
            footer_right: "[page] of [topage]",
            header_font_size: 10,
            footer_font_size: 10,
            minimum_font_size: 12,
        }
    }
}

/// Anything that converts a full HTML page into PDF bytes. Implementations block.
pub trait DocumentRenderer: Send + Sync {
    fn name(&self) -> &'static str;
    fn render(&self, html: &str, config: &RenderConfig) -> Result<Vec<u8>, RenderError>;
}

/// Exportable document kinds, each with its own backend, filename and footer label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    LessonPlan,
    CreativeWriting,
    Application,
}

impl DocumentKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::LessonPlan => "Lesson Plan",
            Self::CreativeWriting => "Creative Writing Prompt",
            Self::Application => "Application Details",
        }
    }
}

/// One renderer per document kind, chosen from configuration.
#[derive(Clone)]
pub struct RendererSet {
    lesson_plan: Arc<dyn DocumentRenderer>,
    creative_writing: Arc<dyn DocumentRenderer>,
    application: Arc<dyn DocumentRenderer>,
}

impl RendererSet {
    pub fn from_config(config: &PdfConfig) -> Self {
        let build = |kind: BackendKind| -> Arc<dyn DocumentRenderer> {
            match kind {
                BackendKind::WeasyPrint => {
                    Arc::new(WeasyPrintRenderer::new(config.weasyprint_bin.clone()))
                }
                BackendKind::Wkhtmltopdf => {
                    Arc::new(WkhtmltopdfRenderer::new(config.wkhtmltopdf_bin.clone()))
                }
            }
        };

        Self {
            lesson_plan: build(config.lesson_plan_backend),
            creative_writing: build(config.creative_writing_backend),
            application: build(config.application_backend),
        }
    }

    /// Same renderer for every kind.
    pub fn uniform(renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self {
            lesson_plan: renderer.clone(),
            creative_writing: renderer.clone(),
            application: renderer,
        }
    }

    pub fn for_kind(&self, kind: DocumentKind) -> Arc<dyn DocumentRenderer> {
        match kind {
            DocumentKind::LessonPlan => self.lesson_plan.clone(),
            DocumentKind::CreativeWriting => self.creative_writing.clone(),
            DocumentKind::Application => self.application.clone(),
        }
    }
}
