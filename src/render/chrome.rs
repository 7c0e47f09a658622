use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use base64::Engine;
use headless_chrome;
use tempfile::TempDir;
use url::Url;
use headless_chrome::protocol::cdp::Emulation;
use headless_chrome::types::PrintToPdfOptions;
use tracing::{info, warn};
use crate::document;
use crate::input::Source;
use crate::options::RenderOptions;
use crate::units::mm_to_inches;
use super::{local_access, RenderError, RenderJob, Renderer, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Chrome refuses scales outside this range.
const MIN_SCALE: f64 = 0.1;
const MAX_SCALE: f64 = 2.0;

/// Prints through a headless Chrome or Chromium.
pub struct ChromeRenderer {
    pub executable: Option<PathBuf>,
    pub sandbox: bool,
    pub window_status_timeout: Duration,
}

impl Renderer for ChromeRenderer {

    fn name(&self) -> &'static str {
        "chrome"
    }

    fn render(&self, job: &RenderJob, output: &Path) -> Result<()> {

        let options = job.options;
        let file_access = local_access(job);

        let browser = Browser::launch(self, options, file_access)?;
        let page = browser.open_page(job, file_access)?;

        if let Some(status) = &options.window_status {
            page.wait_for_window_status(status, self.window_status_timeout)?;
        }

        page.apply(options)?;

        info!("Writing PDF to: {}", output.display());
        page.to_pdf(options, output)
    }
}

struct Browser (headless_chrome::Browser);

impl Browser {

    fn launch(renderer: &ChromeRenderer, options: &RenderOptions, file_access: bool) -> Result<Self> {

        let mut flags: Vec<OsString> = Vec::new();
        if !options.load_images {
            flags.push("--blink-settings=imagesEnabled=false".into());
        }
        if file_access {
            flags.push("--allow-file-access-from-files".into());
        }
        let flags: Vec<&OsStr> = flags.iter().map(OsString::as_os_str).collect();

        let launch_options = headless_chrome::LaunchOptions::default_builder()
            .headless(true)
            .sandbox(renderer.sandbox)
            .window_size(options.viewport)
            .path(renderer.executable.clone())
            .args(flags)
            .build()
            .map_err(|e| RenderError::Unavailable(e.to_string()))?;

        let browser = headless_chrome::Browser::new(launch_options)
            .map_err(|e| RenderError::Unavailable(e.to_string()))?;

        Ok(Self(browser))
    }

    fn open_page(&self, job: &RenderJob, file_access: bool) -> Result<WebPage> {

        let options = job.options;
        let tab = self.0.new_tab()?;

        if !options.enable_javascript {
            tab.call_method(Emulation::SetScriptExecutionDisabled { value: true })?;
        }

        if !options.print_media_type {
            tab.call_method(Emulation::SetEmulatedMedia {
                media: Some("screen".to_string()),
                features: None,
            })?;
        }

        let headers = options.request_headers();
        if !headers.is_empty() {
            if !options.custom_header_propagation {
                info!("Chrome sends custom headers with every resource request");
            }
            let headers: HashMap<&str, &str> = headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()))
                .collect();
            tab.set_extra_http_headers(headers)?;
        }

        let (url, staging) = match job.source {
            Source::Url(url) => {
                info!("Loading {}", url);
                (url.to_string(), None)
            }
            Source::File(_) if file_access => {
                info!("Loading {} through a staged copy", job.source);
                let (staging, url) = stage_page(&job.html()?, job.source)?;
                (url.to_string(), Some(staging))
            }
            Source::File(_) => {
                info!("Loading {} without local file access", job.source);
                (data_url(&job.html()?), None)
            }
        };

        tab.navigate_to(&url)?.wait_until_navigated()?;

        Ok(WebPage { tab, _staging: staging })
    }
}

/// Writes the decoded page as UTF-8 to a temporary file whose `<base>`
/// points back at the input, so relative resources still resolve.
fn stage_page(html: &str, source: &Source) -> Result<(TempDir, Url)> {

    let base = source.file_url()?;
    let staging = tempfile::tempdir()?;
    let page = staging.path().join("page.html");
    std::fs::write(&page, document::with_base(html, base.as_str()))?;

    let url = Source::File(page).file_url()?;
    Ok((staging, url))
}

fn data_url(html: &str) -> String {
    format!(
        "data:text/html;charset=utf-8;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(html)
    )
}

struct WebPage {
    tab: Arc<headless_chrome::Tab>,
    // Removed once the PDF is written.
    _staging: Option<TempDir>,
}

impl WebPage {

    fn wait_for_window_status(&self, status: &str, timeout: Duration) -> Result<()> {

        let start = Instant::now();

        loop {
            let current = self.tab.evaluate("window.status", false)?.value;
            if current.as_ref().and_then(|v| v.as_str()) == Some(status) {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                warn!("window.status never became '{}', printing anyway", status);
                return Ok(());
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Title, grayscale, user stylesheet, TOC and cover.
    fn apply(&self, options: &RenderOptions) -> Result<()> {

        let page_html = match options.toc {
            Some(_) => Some(self.tab.get_content()?),
            None => None,
        };
        let cover = document::load_cover(options)?;

        let scripts = document::injections(options, page_html.as_deref(), cover.as_deref())?;
        for script in scripts {
            self.tab.evaluate(&script, false)?;
        }

        Ok(())
    }

    fn to_pdf(&self, options: &RenderOptions, output: &Path) -> Result<()> {

        let pdf = self.tab.print_to_pdf(Some(print_options(options)))?;
        std::fs::write(output, pdf)?;
        Ok(())
    }
}

fn print_options(options: &RenderOptions) -> PrintToPdfOptions {

    let (width, height) = options.paper_mm();
    let header = document::header_template(options);
    let footer = document::footer_template(options);
    let decorated = header.is_some() || footer.is_some();

    // Chrome prints its own date/title header unless both templates are given.
    let empty = || "<span></span>".to_string();

    // Orientation is already in the swapped paper size.
    PrintToPdfOptions {
        display_header_footer: Some(decorated),
        header_template: decorated.then(|| header.unwrap_or_else(empty)),
        footer_template: decorated.then(|| footer.unwrap_or_else(empty)),
        print_background: Some(true),
        generate_document_outline: Some(options.outline.is_some()),
        scale: options.zoom.map(|z| z.clamp(MIN_SCALE, MAX_SCALE)),
        paper_width: Some(mm_to_inches(width)),
        paper_height: Some(mm_to_inches(height)),
        margin_top: Some(mm_to_inches(options.margins_mm.top)),
        margin_right: Some(mm_to_inches(options.margins_mm.right)),
        margin_bottom: Some(mm_to_inches(options.margins_mm.bottom)),
        margin_left: Some(mm_to_inches(options.margins_mm.left)),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use crate::cli::Args;

    fn resolve(args: &[&str]) -> RenderOptions {
        let argv = std::iter::once("wkhtmltopdf").chain(args.iter().copied());
        RenderOptions::from_args(&Args::try_parse_from(argv).unwrap())
    }

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_default_print_options() {
        let pdf = print_options(&resolve(&["a.html", "b.pdf"]));

        assert!(close(pdf.paper_width, 210.0 / 25.4));
        assert!(close(pdf.paper_height, 297.0 / 25.4));
        assert!(close(pdf.margin_top, 10.0 / 25.4));
        assert_eq!(pdf.display_header_footer, Some(false));
        assert_eq!(pdf.header_template, None);
        assert_eq!(pdf.scale, None);
        assert_eq!(pdf.generate_document_outline, Some(true));
    }

    #[test]
    fn test_no_outline() {
        let pdf = print_options(&resolve(&["--no-outline", "a.html", "b.pdf"]));
        assert_eq!(pdf.generate_document_outline, Some(false));
    }

    #[test]
    fn test_staged_page_keeps_decoded_text() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("latin1.html");
        std::fs::write(&input, b"<html><head></head><body>caf\xe9</body></html>").unwrap();

        let html = crate::input::decode(&std::fs::read(&input).unwrap(), "latin1");
        let source = Source::File(input);
        let (staging, url) = stage_page(&html, &source).unwrap();

        let staged = url.to_file_path().unwrap();
        assert!(staged.starts_with(staging.path()));

        let text = std::fs::read_to_string(&staged).unwrap();
        assert!(text.contains("<body>caf\u{e9}</body>"));
        assert!(text.contains(&format!(r#"<base href="{}">"#, source.file_url().unwrap())));

        drop(staging);
        assert!(!staged.exists());
    }

    #[test]
    fn test_landscape_and_zoom() {
        let pdf = print_options(&resolve(&["-O", "Landscape", "--zoom", "5", "a.html", "b.pdf"]));

        assert!(close(pdf.paper_width, 297.0 / 25.4));
        assert!(close(pdf.paper_height, 210.0 / 25.4));
        assert_eq!(pdf.scale, Some(MAX_SCALE));
    }

    #[test]
    fn test_footer_only_blanks_header() {
        let pdf = print_options(&resolve(&["--footer-center", "[page]", "a.html", "b.pdf"]));

        assert_eq!(pdf.display_header_footer, Some(true));
        assert_eq!(pdf.header_template.as_deref(), Some("<span></span>"));
        assert!(pdf.footer_template.unwrap().contains("pageNumber"));
    }

    #[test]
    fn test_data_url() {
        assert_eq!(data_url("<p>hi</p>"), "data:text/html;charset=utf-8;base64,PHA+aGk8L3A+");
    }

    #[test]
    #[ignore = "needs a Chrome or Chromium installation"]
    fn test_render_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("page.html");
        let output = dir.path().join("page.pdf");
        std::fs::write(&input, "<h1>Hello</h1>").unwrap();

        let source = crate::input::Source::File(input);
        let options = resolve(&["a.html", "b.pdf"]);
        let renderer = ChromeRenderer { executable: None, sandbox: false, window_status_timeout: Duration::from_secs(1) };

        renderer.render(&RenderJob { source: &source, options: &options, html: Some("<h1>Hello</h1>") }, &output).unwrap();
        assert!(std::fs::read(&output).unwrap().starts_with(b"%PDF"));
    }
}
