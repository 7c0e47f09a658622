#![recursion_limit = "256"]

pub mod cli;
pub mod document;
pub mod input;
pub mod logging;
pub mod options;
pub mod render;
pub mod status;
pub mod units;

use std::path::Path;
use clap::Parser;
use thiserror::Error;
use tracing::{error, info, warn};
use crate::cli::Args;
use crate::input::{InputError, Source};
use crate::options::RenderOptions;
use crate::render::{RenderError, RenderJob, Renderer};

pub use status::ExitStatus;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Runs one invocation: log it, parse it, convert.
pub fn run<I, T>(argv: I) -> ExitStatus
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let argv: Vec<String> = argv.into_iter().map(Into::into).collect();

    let log_path = logging::log_path();
    let _guard = logging::init(log_path.as_deref());
    logging::log_invocation(&argv);

    let args = match Args::try_parse_from(&argv) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitStatus::Error } else { ExitStatus::Success };
        }
    };

    let renderers = render::from_args(&args);
    convert(&args, &renderers)
}

fn usage_error(message: &str) -> ExitStatus {
    eprintln!("Error: {}", message);
    eprintln!("{}", cli::USAGE);
    ExitStatus::Error
}

/// Converts `args.input` to `args.output` with the first available renderer.
pub fn convert(args: &Args, renderers: &[Box<dyn Renderer>]) -> ExitStatus {

    let Some(input) = args.input.as_deref() else {
        return usage_error("Input file or URL is required.");
    };
    let Some(output) = args.output.as_deref() else {
        return usage_error("Output PDF file is required.");
    };

    if !args.quiet {
        eprintln!("Converting {} to {}...", input, output);
    }

    let options = RenderOptions::from_args(args);

    info!("Input: {}", input);
    info!("Output: {}", output);
    info!("Command-line options: {}", args.logged_options());
    match serde_json::to_string(&options) {
        Ok(json) => info!("Render options: {}", json),
        Err(e) => error!("Render options not serializable: {}", e),
    }
    let ignored = options.ignored();
    if !ignored.is_empty() {
        warn!("Accepted but not applied: {}", ignored.join(", "));
    }

    match render_pdf(input, Path::new(output), &options, renderers) {
        Ok(renderer) => {
            if !args.quiet {
                eprintln!("Successfully created {}", output);
            }
            info!("Renderer: {}", renderer);
            info!("Success: PDF created at {}", output);
            info!("");
            ExitStatus::Success
        }
        Err(e) => {
            let message = format!("Error: {}", e);
            eprintln!("{}", message);
            error!("Failed: {}", message);
            if args.debug_javascript {
                let traceback = traceback(&e);
                eprintln!("{}", traceback);
                error!("Traceback: {}", traceback);
            }
            info!("");
            ExitStatus::Error
        }
    }
}

fn render_pdf(input: &str, output: &Path, options: &RenderOptions, renderers: &[Box<dyn Renderer>]) -> Result<&'static str, ConvertError> {

    let source = Source::parse(input)?;
    let html = match &source {
        Source::Url(url) => {
            info!("Loading URL: {}", url);
            None
        }
        Source::File(path) => {
            info!("Loading HTML file: {}", path.display());
            Some(crate::input::decode(&crate::input::read_file(path)?, &options.encoding))
        }
    };

    let job = RenderJob { source: &source, options, html: html.as_deref() };
    Ok(render::dispatch(renderers, &job, output)?)
}

/// The error and each of its causes, one per line.
fn traceback(error: &dyn std::error::Error) -> String {

    let mut lines = vec![format!("{:?}", error)];
    let mut source = error.source();

    while let Some(cause) = source {
        lines.push(format!("caused by: {}", cause));
        source = cause.source();
    }

    lines.join("\n")
}
