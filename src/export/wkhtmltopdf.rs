use super::engine::run_converter;
use super::{DocumentRenderer, RenderConfig, RenderError};

/// wkhtmltopdf backend; page setup maps one-to-one onto CLI flags.
pub struct WkhtmltopdfRenderer {
    program: String,
}

impl WkhtmltopdfRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

pub fn build_args(config: &RenderConfig) -> Vec<String> {
    let pairs: [(&str, String); 15] = [
        ("--page-size", config.page_size.to_string()),
        ("--orientation", config.orientation.as_str().to_string()),
        ("--margin-top", config.margin_top.to_string()),
        ("--margin-right", config.margin_right.to_string()),
        ("--margin-bottom", config.margin_bottom.to_string()),
        ("--margin-left", config.margin_left.to_string()),
        ("--dpi", config.dpi.to_string()),
        ("--encoding", config.encoding.to_string()),
        ("--zoom", config.zoom.to_string()),
        ("--header-left", config.header_left.clone()),
        ("--header-font-size", config.header_font_size.to_string()),
        ("--footer-left", config.footer_left.clone()),
        ("--footer-right", config.footer_right.to_string()),
        ("--footer-font-size", config.footer_font_size.to_string()),
        ("--minimum-font-size", config.minimum_font_size.to_string()),
    ];

    let mut args: Vec<String> = [
        "--quiet",
        "--enable-local-file-access",
        "--print-media-type",
        "--disable-smart-shrinking",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    for (flag, value) in pairs {
        args.push(flag.to_string());
        args.push(value);
    }
    args
}

impl DocumentRenderer for WkhtmltopdfRenderer {
    fn name(&self) -> &'static str {
        "wkhtmltopdf"
    }

    fn render(&self, html: &str, config: &RenderConfig) -> Result<Vec<u8>, RenderError> {
        run_converter(&self.program, &build_args(config), html)
    }
}
