pub mod chrome;
pub mod pandoc;

use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};
use crate::cli::{Args, RendererChoice};
use crate::document::DocumentError;
use crate::input::{InputError, Source};
use crate::options::RenderOptions;

#[derive(Error, Debug)]
pub enum RenderError {
    /// This backend can't run here; the next one is tried.
    #[error("{0}")]
    Unavailable(String),
    #[error("ChromeError: {0}")]
    ChromeError(#[from] anyhow::Error),
    #[error("PandocError: {0}")]
    PandocError(#[from] ::pandoc::PandocError),
    #[error(transparent)]
    InputError(#[from] InputError),
    #[error(transparent)]
    DocumentError(#[from] DocumentError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("no renderer available ({0})")]
    NoRenderer(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Everything a backend needs for one conversion.
pub struct RenderJob<'a> {
    pub source: &'a Source,
    pub options: &'a RenderOptions,
    /// Decoded contents of a local input, read before any backend runs.
    pub html: Option<&'a str>,
}

impl RenderJob<'_> {

    /// The input document as text, fetching it when the input is a URL.
    pub fn html(&self) -> Result<String> {
        match self.html {
            Some(html) => Ok(html.to_string()),
            None => Ok(self.source.read(&self.options.encoding, &self.options.request_headers())?),
        }
    }
}

pub trait Renderer {
    fn name(&self) -> &'static str;

    /// Writes the PDF for `job` to `output`.
    fn render(&self, job: &RenderJob, output: &Path) -> Result<()>;
}

/// Tries each renderer in order, skipping unavailable ones. Returns the
/// name of the one that produced the PDF.
pub fn dispatch(renderers: &[Box<dyn Renderer>], job: &RenderJob, output: &Path) -> Result<&'static str> {

    let mut reasons = Vec::new();

    for renderer in renderers {
        match renderer.render(job, output) {
            Ok(()) => return Ok(renderer.name()),
            Err(RenderError::Unavailable(reason)) => {
                warn!("Renderer {} unavailable: {}", renderer.name(), reason);
                reasons.push(format!("{}: {}", renderer.name(), reason));
            }
            Err(e) => return Err(e),
        }
    }

    Err(RenderError::NoRenderer(reasons.join("; ")))
}

/// The renderer chain selected by `--renderer`.
pub fn from_args(args: &Args) -> Vec<Box<dyn Renderer>> {

    let chrome = || -> Box<dyn Renderer> {
        Box::new(chrome::ChromeRenderer {
            executable: args.chrome_path.clone(),
            sandbox: !args.no_sandbox,
            window_status_timeout: std::time::Duration::from_secs(args.window_status_timeout),
        })
    };
    let pandoc = || -> Box<dyn Renderer> {
        Box::new(pandoc::PandocRenderer { pdf_engine: args.pdf_engine.clone() })
    };

    let renderers = match args.renderer {
        RendererChoice::Auto => vec![chrome(), pandoc()],
        RendererChoice::Chrome => vec![chrome()],
        RendererChoice::Pandoc => vec![pandoc()],
    };

    info!("Renderers: {}", renderers.iter().map(|r| r.name()).collect::<Vec<_>>().join(", "));
    renderers
}

/// Whether a local file may pull in other local files.
pub fn local_access(job: &RenderJob) -> bool {
    job.options.allow_local_file_access || job.source.is_within(&job.options.allowed_paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use clap::Parser;

    struct Stub {
        name: &'static str,
        outcome: fn() -> Result<()>,
    }

    impl Stub {
        fn new(name: &'static str, outcome: fn() -> Result<()>) -> Self {
            Self { name, outcome }
        }
    }

    impl Renderer for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        fn render(&self, _job: &RenderJob, _output: &Path) -> Result<()> {
            (self.outcome)()
        }
    }

    fn options() -> RenderOptions {
        RenderOptions::from_args(&Args::try_parse_from(["wkhtmltopdf", "a.html", "b.pdf"]).unwrap())
    }

    #[test]
    fn test_falls_back_when_unavailable() {
        let source = Source::File(PathBuf::from("a.html"));
        let options = options();
        let job = RenderJob { source: &source, options: &options, html: None };

        let renderers: Vec<Box<dyn Renderer>> = vec![
            Box::new(Stub::new("first", || Err(RenderError::Unavailable("missing".into())))),
            Box::new(Stub::new("second", || Ok(()))),
        ];

        assert_eq!(dispatch(&renderers, &job, Path::new("b.pdf")).unwrap(), "second");
    }

    #[test]
    fn test_failure_stops_the_chain() {
        let source = Source::File(PathBuf::from("a.html"));
        let options = options();
        let job = RenderJob { source: &source, options: &options, html: None };

        let renderers: Vec<Box<dyn Renderer>> = vec![
            Box::new(Stub::new("first", || Err(RenderError::IoError(std::io::Error::other("disk full"))))),
            Box::new(Stub::new("second", || panic!("second renderer must not run"))),
        ];

        let err = dispatch(&renderers, &job, Path::new("b.pdf")).unwrap_err();
        assert!(matches!(err, RenderError::IoError(_)));
    }

    #[test]
    fn test_all_unavailable() {
        let source = Source::File(PathBuf::from("a.html"));
        let options = options();
        let job = RenderJob { source: &source, options: &options, html: None };

        let renderers: Vec<Box<dyn Renderer>> = vec![
            Box::new(Stub::new("chrome", || Err(RenderError::Unavailable("not installed".into())))),
            Box::new(Stub::new("pandoc", || Err(RenderError::Unavailable("not found".into())))),
        ];

        let err = dispatch(&renderers, &job, Path::new("b.pdf")).unwrap_err();
        assert_eq!(err.to_string(), "no renderer available (chrome: not installed; pandoc: not found)");
    }

    #[test]
    fn test_renderer_choice() {
        let args = Args::try_parse_from(["wkhtmltopdf", "--renderer", "pandoc", "a.html", "b.pdf"]).unwrap();
        let names: Vec<_> = from_args(&args).iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["pandoc"]);

        let args = Args::try_parse_from(["wkhtmltopdf", "--renderer", "auto", "a.html", "b.pdf"]).unwrap();
        let names: Vec<_> = from_args(&args).iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["chrome", "pandoc"]);
    }

    #[test]
    fn test_job_prefers_preloaded_html() {
        let source = Source::File(PathBuf::from("/definitely/not/here.html"));
        let options = options();

        let job = RenderJob { source: &source, options: &options, html: Some("<p>loaded</p>") };
        assert_eq!(job.html().unwrap(), "<p>loaded</p>");

        let job = RenderJob { source: &source, options: &options, html: None };
        assert!(matches!(job.html(), Err(RenderError::InputError(InputError::NotFound(_)))));
    }
}
