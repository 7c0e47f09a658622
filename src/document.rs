use std::path::Path;
use scraper::{Html, Selector};
use serde_json;
use thiserror::Error;
use crate::input::{InputError, Source};
use crate::options::{Decoration, Margins, RenderOptions};

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Can't read {0}: {1}")]
    IOError(String, #[source] std::io::Error),
    #[error("JSON conversion error: {0}")]
    JsonConversionError(#[from] serde_json::Error),
    #[error("Cover page: {0}")]
    CoverError(#[from] InputError),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

const PAGE_BREAK: &str = r#"<div style="page-break-after: always; break-after: page;"></div>"#;

const GRAYSCALE_CSS: &str = "html { filter: grayscale(100%) !important; }";

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

struct Heading {
    level: u32,
    text: String,
    id: Option<String>,
}

fn headings(html: &str, depth: u32) -> Vec<Heading> {

    let depth = depth.clamp(1, 6);
    let selector = (1..=depth)
        .map(|level| format!("h{}", level))
        .collect::<Vec<_>>()
        .join(", ");

    let Ok(selector) = Selector::parse(&selector) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);

    document
        .select(&selector)
        .filter_map(|el| {
            let text = el.text().collect::<Vec<_>>().join(" ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return None;
            }
            let level = el.value().name()[1..].parse().ok()?;
            Some(Heading { level, text, id: el.value().id().map(str::to_string) })
        })
        .collect()
}

/// Table of contents block for the headings up to `depth`, followed by a page break.
/// Returns `None` when the page has no headings.
pub fn toc_html(html: &str, depth: u32) -> Option<String> {

    let headings = headings(html, depth);
    if headings.is_empty() {
        return None;
    }

    let mut toc = String::from(r#"<div class="wkhtmltopdf-toc"><h1>Table of Contents</h1>"#);

    for heading in headings {
        let indent = (heading.level - 1) * 2;
        let text = escape_html(&heading.text);
        let entry = match heading.id {
            Some(id) => format!(r##"<a href="#{}">{}</a>"##, escape_html(&id), text),
            None => text,
        };
        toc.push_str(&format!(r#"<div style="margin-left: {}em;">{}</div>"#, indent, entry));
    }

    toc.push_str("</div>");
    toc.push_str(PAGE_BREAK);
    Some(toc)
}

/// Body content of a cover page, followed by a page break.
pub fn cover_html(html: &str) -> String {

    let document = Html::parse_document(html);

    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next().map(|b| b.inner_html()))
        .unwrap_or_else(|| html.to_string());

    format!(r#"<div class="wkhtmltopdf-cover">{}</div>{}"#, body, PAGE_BREAK)
}

/// Adds a UTF-8 charset and a `<base>` to a page that will be opened from
/// somewhere other than its own directory. Goes right after `<head>` when
/// there is one.
pub fn with_base(html: &str, base: &str) -> String {

    let tags = format!(r#"<meta charset="utf-8"><base href="{}">"#, escape_html(base));

    let head = html
        .to_ascii_lowercase()
        .find("<head")
        .and_then(|start| html[start..].find('>').map(|end| start + end + 1));

    match head {
        Some(at) => format!("{}{}{}", &html[..at], tags, &html[at..]),
        None => format!("{}{}", tags, html),
    }
}

/// Reads the `--cover` page, a file or a URL, and extracts its body.
pub fn load_cover(options: &RenderOptions) -> Result<Option<String>> {

    let Some(cover) = &options.cover else {
        return Ok(None);
    };

    let html = Source::parse(cover)?.read(&options.encoding, &options.request_headers())?;
    Ok(Some(cover_html(&html)))
}

fn read_style_sheet(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| DocumentError::IOError(path.display().to_string(), e))
}

fn add_style(css: &str) -> Result<String> {
    Ok(format!(
        "(() => {{ const s = document.createElement('style'); s.textContent = {}; \
         (document.head || document.documentElement).appendChild(s); }})();",
        serde_json::to_string(css)?
    ))
}

fn prepend_body(html: &str) -> Result<String> {
    Ok(format!(
        "(() => {{ const b = document.body || document.documentElement; \
         b.insertAdjacentHTML('afterbegin', {}); }})();",
        serde_json::to_string(html)?
    ))
}

/// JavaScript run against the loaded page, in order: title, grayscale,
/// user stylesheet, table of contents, cover.
pub fn injections(options: &RenderOptions, page_html: Option<&str>, cover: Option<&str>) -> Result<Vec<String>> {

    let mut scripts = Vec::new();

    if let Some(title) = &options.title {
        scripts.push(format!("document.title = {};", serde_json::to_string(title)?));
    }

    if options.grayscale {
        scripts.push(add_style(GRAYSCALE_CSS)?);
    }

    if let Some(path) = &options.user_style_sheet {
        scripts.push(add_style(&read_style_sheet(path)?)?);
    }

    // Cover goes in last so it ends up before the TOC.
    if let (Some(depth), Some(html)) = (options.toc, page_html) {
        if let Some(toc) = toc_html(html, depth) {
            scripts.push(prepend_body(&toc)?);
        }
    }

    if let Some(cover) = cover {
        scripts.push(prepend_body(cover)?);
    }

    Ok(scripts)
}

fn substitute_variables(text: &str) -> String {

    let mut out = String::new();
    let mut rest = text;

    while let Some(start) = rest.find('[') {
        let Some(len) = rest[start..].find(']') else {
            break;
        };
        out.push_str(&escape_html(&rest[..start]));

        let class = match &rest[start + 1..start + len] {
            "page" | "frompage" => Some("pageNumber"),
            "topage" => Some("totalPages"),
            "title" | "doctitle" => Some("title"),
            "date" | "time" | "isodate" => Some("date"),
            "webpage" => Some("url"),
            _ => None,
        };
        if let Some(class) = class {
            out.push_str(&format!(r#"<span class="{}"></span>"#, class));
        }

        rest = &rest[start + len + 1..];
    }

    out.push_str(&escape_html(rest));
    out
}

fn template(decoration: &Decoration, margins: &Margins, header: bool) -> String {

    let cell = |text: &Option<String>, align: &str| {
        format!(
            r#"<span style="flex: 1; text-align: {};">{}</span>"#,
            align,
            text.as_deref().map(substitute_variables).unwrap_or_default()
        )
    };

    let spacing = decoration.spacing_mm.unwrap_or(0.0);
    let (border, padding) = if header {
        ("border-bottom", format!("padding-bottom: {}mm;", spacing))
    } else {
        ("border-top", format!("padding-top: {}mm;", spacing))
    };
    let line = if decoration.line { format!("{}: 1px solid black;", border) } else { String::new() };

    format!(
        r#"<div style="font-size: 9px; width: 100%; margin: 0 {}mm 0 {}mm; display: flex; {}{}">{}{}{}</div>"#,
        margins.right,
        margins.left,
        padding,
        line,
        cell(&decoration.left, "left"),
        cell(&decoration.center, "center"),
        cell(&decoration.right, "right"),
    )
}

/// Chrome print header template, or `None` when no header text was given.
pub fn header_template(options: &RenderOptions) -> Option<String> {
    options.header.has_text().then(|| template(&options.header, &options.margins_mm, true))
}

/// Chrome print footer template, or `None` when no footer text was given.
pub fn footer_template(options: &RenderOptions) -> Option<String> {
    options.footer.has_text().then(|| template(&options.footer, &options.margins_mm, false))
}
