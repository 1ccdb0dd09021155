use super::engine::run_converter;
use super::{DocumentRenderer, RenderConfig, RenderError};

/// WeasyPrint backend. It has no header/footer flags, so the page setup is
/// injected into the document as CSS `@page` rules.
pub struct WeasyPrintRenderer {
    program: String,
}

impl WeasyPrintRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

fn css_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// `[page]`/`[topage]` placeholders become CSS page counters.
fn css_content(value: &str) -> String {
    let mut parts = Vec::new();
    let mut rest = value;
    while let Some(start) = rest.find('[') {
        let Some(len) = rest[start..].find(']') else {
            break;
        };
        let counter = match &rest[start + 1..start + len] {
            "page" => "counter(page)",
            "topage" => "counter(pages)",
            _ => {
                parts.push(css_string(&rest[..start + len + 1]));
                rest = &rest[start + len + 1..];
                continue;
            }
        };
        if start > 0 {
            parts.push(css_string(&rest[..start]));
        }
        parts.push(counter.to_string());
        rest = &rest[start + len + 1..];
    }
    if !rest.is_empty() {
        parts.push(css_string(rest));
    }
    parts.join(" ")
}

pub fn page_css(config: &RenderConfig) -> String {
    format!(
        "@page {{ size: {size} {orientation}; margin: {top} {right} {bottom} {left}; \
         @top-left {{ content: {header}; font-size: {header_size}pt; }} \
         @bottom-left {{ content: {footer_left}; font-size: {footer_size}pt; }} \
         @bottom-right {{ content: {footer_right}; font-size: {footer_size}pt; }} }} \
         body {{ font-size: {body_size:.1}pt; }}",
        size = config.page_size,
        orientation = config.orientation.as_str().to_ascii_lowercase(),
        top = config.margin_top,
        right = config.margin_right,
        bottom = config.margin_bottom,
        left = config.margin_left,
        header = css_string(&config.header_left),
        header_size = config.header_font_size,
        footer_left = css_string(&config.footer_left),
        footer_right = css_content(config.footer_right),
        footer_size = config.footer_font_size,
        body_size = config.minimum_font_size as f32 * config.zoom,
    )
}

/// Insert the page rules right before `</head>`, or at the top when there is no head.
pub fn inject_page_css(html: &str, config: &RenderConfig) -> String {
    let style = format!("<style>{}</style>", page_css(config));
    match html.find("</head>") {
        Some(index) => format!("{}{}{}", &html[..index], style, &html[index..]),
        None => format!("{style}{html}"),
    }
}

impl DocumentRenderer for WeasyPrintRenderer {
    fn name(&self) -> &'static str {
        "weasyprint"
    }

    fn render(&self, html: &str, config: &RenderConfig) -> Result<Vec<u8>, RenderError> {
        let args = vec![
            "--encoding".to_string(),
            config.encoding.to_string(),
            "--dpi".to_string(),
            config.dpi.to_string(),
        ];
        run_converter(&self.program, &args, &inject_page_css(html, config))
    }
}
