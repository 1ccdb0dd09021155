//! Markdown to HTML for generated content.
//!
//! Tables and fenced code are rendered. `$...$` / `$$...$$` math and Mermaid
//! fences are left for client-side renderers. Raw HTML in model output is
//! escaped rather than emitted.

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

const TOKEN_OPEN: char = '\u{E000}';
const TOKEN_CLOSE: char = '\u{E001}';

/// Render model output into HTML suitable for display and PDF embedding.
pub fn render_markdown(source: &str) -> String {
    let (protected, spans) = protect_math(source);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let events = rewrite_events(Parser::new_ext(&protected, options));
    let mut rendered = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut rendered, events.into_iter());

    restore_math(rendered, &spans)
}

/// Escape the HTML-significant characters of `value`, as pulldown-cmark does
/// for attributes.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    // Writing into a String never fails.
    let _ = pulldown_cmark_escape::escape_html(&mut out, value);
    out
}

fn rewrite_events<'a>(parser: Parser<'a>) -> Vec<Event<'a>> {
    let mut events = Vec::new();
    let mut mermaid: Option<String> = None;

    for event in parser {
        if mermaid.is_some() {
            match event {
                Event::Text(text) => {
                    if let Some(buffer) = mermaid.as_mut() {
                        buffer.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    let source = mermaid.take().unwrap_or_default();
                    events.push(Event::Html(CowStr::from(format!(
                        "<pre class=\"mermaid\">{}</pre>\n",
                        escape_html(&source)
                    ))));
                }
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref lang)))
                if lang.trim().eq_ignore_ascii_case("mermaid") =>
            {
                mermaid = Some(String::new());
            }
            Event::Html(raw) | Event::InlineHtml(raw) => events.push(Event::Text(raw)),
            other => events.push(other),
        }
    }

    events
}

/// Replace math spans outside code with opaque tokens Markdown leaves alone.
fn protect_math(source: &str) -> (String, Vec<String>) {
    let mut out = String::with_capacity(source.len());
    let mut spans = Vec::new();
    let mut prose = String::new();
    let mut fence: Option<String> = None;

    for line in source.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(marker) = fence.clone() {
            out.push_str(line);
            if closes_fence(trimmed, &marker) {
                fence = None;
            }
        } else if let Some(marker) = fence_marker(trimmed) {
            out.push_str(&protect_prose(&prose, &mut spans));
            prose.clear();
            out.push_str(line);
            fence = Some(marker);
        } else {
            prose.push_str(line);
        }
    }
    out.push_str(&protect_prose(&prose, &mut spans));

    (out, spans)
}

fn fence_marker(trimmed_line: &str) -> Option<String> {
    for ch in ['`', '~'] {
        let run = trimmed_line.chars().take_while(|c| *c == ch).count();
        if run >= 3 {
            return Some(ch.to_string().repeat(run));
        }
    }
    None
}

fn closes_fence(trimmed_line: &str, marker: &str) -> bool {
    let line = trimmed_line.trim_end();
    match marker.chars().next() {
        Some(ch) => line.starts_with(marker) && line.chars().all(|c| c == ch),
        None => false,
    }
}

fn protect_prose(prose: &str, spans: &mut Vec<String>) -> String {
    let chars: Vec<char> = prose.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(prose.len());
    let mut i = 0;

    while i < n {
        let c = chars[i];

        if c == '\\' && i + 1 < n && chars[i + 1] == '$' {
            out.push(c);
            out.push('$');
            i += 2;
            continue;
        }

        if c == '`' {
            let run = count_run(&chars, i, '`');
            if let Some(close) = find_backtick_close(&chars, i + run, run) {
                out.extend(&chars[i..close + run]);
                i = close + run;
            } else {
                out.extend(&chars[i..i + run]);
                i += run;
            }
            continue;
        }

        if c == '$' && i + 1 < n && chars[i + 1] == '$' {
            if let Some(end) = find_display_close(&chars, i + 2) {
                push_token(&mut out, spans, chars[i..end + 2].iter().collect());
                i = end + 2;
            } else {
                out.push_str("$$");
                i += 2;
            }
            continue;
        }

        if c == '$' {
            if let Some(end) = find_inline_close(&chars, i) {
                push_token(&mut out, spans, chars[i..=end].iter().collect());
                i = end + 1;
            } else {
                out.push('$');
                i += 1;
            }
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

fn count_run(chars: &[char], start: usize, ch: char) -> usize {
    chars[start..].iter().take_while(|c| **c == ch).count()
}

fn find_backtick_close(chars: &[char], from: usize, run: usize) -> Option<usize> {
    let mut j = from;
    while j < chars.len() {
        if chars[j] == '`' {
            let len = count_run(chars, j, '`');
            if len == run {
                return Some(j);
            }
            j += len;
        } else {
            j += 1;
        }
    }
    None
}

fn find_display_close(chars: &[char], from: usize) -> Option<usize> {
    let mut j = from;
    while j + 1 < chars.len() {
        if chars[j] == '$' && chars[j + 1] == '$' && chars[j - 1] != '\\' {
            let has_body = chars[from..j].iter().any(|c| !c.is_whitespace());
            return has_body.then_some(j);
        }
        j += 1;
    }
    None
}

/// Inline math needs a non-space after the opener, a non-space before the
/// closer and no digit right after it, so "$5 and $10" stays literal.
fn find_inline_close(chars: &[char], open: usize) -> Option<usize> {
    let first = *chars.get(open + 1)?;
    if first.is_whitespace() || first == '$' {
        return None;
    }

    let mut j = open + 1;
    while j < chars.len() && chars[j] != '\n' {
        if chars[j] == '$'
            && chars[j - 1] != '\\'
            && !chars[j - 1].is_whitespace()
            && !chars.get(j + 1).is_some_and(|c| c.is_ascii_digit())
        {
            return Some(j);
        }
        j += 1;
    }
    None
}

fn push_token(out: &mut String, spans: &mut Vec<String>, span: String) {
    out.push(TOKEN_OPEN);
    out.push_str(&spans.len().to_string());
    out.push(TOKEN_CLOSE);
    spans.push(span);
}

fn restore_math(mut rendered: String, spans: &[String]) -> String {
    for (index, span) in spans.iter().enumerate() {
        let token = format!("{TOKEN_OPEN}{index}{TOKEN_CLOSE}");
        rendered = rendered.replace(&token, &escape_html(span));
    }
    rendered
}
