use std::path::PathBuf;
use clap::{ArgAction, Parser, ValueEnum};
use clap::builder::FalseyValueParser;
use serde_json::{json, Value};
use crate::options::{Orientation, PageSize};

pub const USAGE: &str = "Usage: wkhtmltopdf [options] <input> <output>";

const EXAMPLES: &str = "\
Examples:
  wkhtmltopdf input.html output.pdf
  wkhtmltopdf --page-size A4 --orientation Portrait input.html output.pdf
  wkhtmltopdf --margin-top 20mm --margin-bottom 20mm input.html output.pdf";

const SHIM: &str = "Shim options";

/// Which rendering backends to try, in order
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum RendererChoice {
    /// Headless Chrome, then pandoc
    #[default]
    Auto,
    Chrome,
    Pandoc,
}

/// Converts HTML to PDF, accepting the wkhtmltopdf command line
#[derive(Parser, Debug)]
#[command(name = "wkhtmltopdf", version, about, long_about = None, after_help = EXAMPLES)]
pub struct Args {
    /// Input HTML file or URL
    pub input: Option<String>,

    /// Output PDF file
    pub output: Option<String>,

    /// Set paper size
    #[arg(long, short = 's', value_enum, ignore_case = true, default_value_t = PageSize::A4)]
    pub page_size: PageSize,

    /// Set orientation
    #[arg(long, short = 'O', value_enum, ignore_case = true, default_value_t = Orientation::Portrait)]
    pub orientation: Orientation,

    /// Set the page top margin
    #[arg(long, short = 'T', default_value = "10mm")]
    pub margin_top: String,

    /// Set the page right margin
    #[arg(long, short = 'R', default_value = "10mm")]
    pub margin_right: String,

    /// Set the page bottom margin
    #[arg(long, short = 'B', default_value = "10mm")]
    pub margin_bottom: String,

    /// Set the page left margin
    #[arg(long, short = 'L', default_value = "10mm")]
    pub margin_left: String,

    /// Zoom factor
    #[arg(long, default_value_t = 1.0)]
    pub zoom: f64,

    /// Change the dpi explicitly
    #[arg(long, short = 'd', default_value_t = 96)]
    pub dpi: u32,

    /// Disable the intelligent shrinking strategy
    #[arg(long, overrides_with = "enable_smart_shrinking")]
    pub disable_smart_shrinking: bool,

    /// Enable the intelligent shrinking strategy (default)
    #[arg(long, overrides_with = "disable_smart_shrinking")]
    pub enable_smart_shrinking: bool,

    /// Do not load or print images
    #[arg(long, overrides_with = "images")]
    pub no_images: bool,

    /// Load or print images (default)
    #[arg(long, overrides_with = "no_images")]
    pub images: bool,

    /// Do not allow web pages to run javascript
    #[arg(long, short = 'n', overrides_with = "enable_javascript")]
    pub disable_javascript: bool,

    /// Allow web pages to run javascript (default)
    #[arg(long, overrides_with = "disable_javascript")]
    pub enable_javascript: bool,

    /// Do not stop slow running javascripts
    #[arg(long, overrides_with = "stop_slow_scripts")]
    pub no_stop_slow_scripts: bool,

    /// Stop slow running javascripts (default)
    #[arg(long, overrides_with = "no_stop_slow_scripts")]
    pub stop_slow_scripts: bool,

    /// Set the default text encoding
    #[arg(long, default_value = "utf-8")]
    pub encoding: String,

    /// Be less verbose
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Show javascript debugging output, and error tracebacks
    #[arg(long)]
    pub debug_javascript: bool,

    /// The title of the generated pdf file
    #[arg(long)]
    pub title: Option<String>,

    /// PDF will be generated in grayscale
    #[arg(long, short = 'g')]
    pub grayscale: bool,

    /// Generates lower quality pdf
    #[arg(long, short = 'l')]
    pub lowquality: bool,

    /// Use print media-type instead of screen
    #[arg(long, overrides_with = "no_print_media_type")]
    pub print_media_type: bool,

    /// Do not use print media-type (default)
    #[arg(long, overrides_with = "print_media_type")]
    pub no_print_media_type: bool,

    /// Set viewport size, e.g. "1024x768"
    #[arg(long)]
    pub viewport_size: Option<String>,

    /// Wait until window.status is equal to this string before rendering page
    #[arg(long)]
    pub window_status: Option<String>,

    /// Left aligned header text
    #[arg(long)]
    pub header_left: Option<String>,

    /// Centered header text
    #[arg(long)]
    pub header_center: Option<String>,

    /// Right aligned header text
    #[arg(long)]
    pub header_right: Option<String>,

    /// Spacing between header and content in mm
    #[arg(long)]
    pub header_spacing: Option<f64>,

    /// Display line below the header
    #[arg(long)]
    pub header_line: bool,

    /// Left aligned footer text
    #[arg(long)]
    pub footer_left: Option<String>,

    /// Centered footer text
    #[arg(long)]
    pub footer_center: Option<String>,

    /// Right aligned footer text
    #[arg(long)]
    pub footer_right: Option<String>,

    /// Spacing between footer and content in mm
    #[arg(long)]
    pub footer_spacing: Option<f64>,

    /// Display line above the footer
    #[arg(long)]
    pub footer_line: bool,

    /// Insert a table of contents in the generated pdf
    #[arg(long)]
    pub toc: bool,

    /// Depth of the table of contents
    #[arg(long, default_value_t = 3)]
    pub toc_depth: u32,

    /// Use a HTML page as cover
    #[arg(long)]
    pub cover: Option<String>,

    /// Put an outline into the pdf (default)
    #[arg(long, overrides_with = "no_outline")]
    pub outline: bool,

    /// Do not put an outline into the pdf
    #[arg(long, overrides_with = "outline")]
    pub no_outline: bool,

    /// Set the depth of the outline
    #[arg(long, default_value_t = 4)]
    pub outline_depth: u32,

    /// Set an additional cookie (repeatable), value should be url encoded
    #[arg(long = "cookie", num_args = 2, value_names = ["NAME", "VALUE"], action = ArgAction::Append)]
    pub cookies: Vec<String>,

    /// Set an additional HTTP header (repeatable)
    #[arg(long = "custom-header", num_args = 2, value_names = ["NAME", "VALUE"], action = ArgAction::Append)]
    pub custom_headers: Vec<String>,

    /// Add HTTP headers defined by --custom-header for each resource request
    #[arg(long, overrides_with = "no_custom_header_propagation")]
    pub custom_header_propagation: bool,

    /// Do not add HTTP headers for each resource request (default)
    #[arg(long, overrides_with = "custom_header_propagation")]
    pub no_custom_header_propagation: bool,

    /// Specify a user style sheet, to load with every page
    #[arg(long)]
    pub user_style_sheet: Option<PathBuf>,

    /// Allow the file or files from the specified folder to be loaded (repeatable)
    #[arg(long = "allow", value_name = "PATH", action = ArgAction::Append)]
    pub allowed_paths: Vec<PathBuf>,

    /// Do not allow conversion of a local file to read in other local files
    #[arg(long, overrides_with = "enable_local_file_access")]
    pub disable_local_file_access: bool,

    /// Allow conversion of a local file to read in other local files (default)
    #[arg(long, overrides_with = "disable_local_file_access")]
    pub enable_local_file_access: bool,

    /// Rendering backends to try
    #[arg(long, value_enum, env = "FAKEWKHTMLTOPDF_RENDERER", default_value_t = RendererChoice::Auto, help_heading = SHIM)]
    pub renderer: RendererChoice,

    /// Chrome or Chromium executable, autodetected when not given
    #[arg(long, env = "FAKEWKHTMLTOPDF_CHROME", help_heading = SHIM)]
    pub chrome_path: Option<PathBuf>,

    /// Launch Chrome without its sandbox (needed when running as root)
    #[arg(long, env = "FAKEWKHTMLTOPDF_NO_SANDBOX", value_parser = FalseyValueParser::new(), help_heading = SHIM)]
    pub no_sandbox: bool,

    /// PDF engine pandoc should use
    #[arg(long, env = "FAKEWKHTMLTOPDF_PDF_ENGINE", help_heading = SHIM)]
    pub pdf_engine: Option<PathBuf>,

    /// Seconds to wait for --window-status before printing anyway
    #[arg(long, env = "FAKEWKHTMLTOPDF_WINDOW_STATUS_TIMEOUT", default_value_t = 30, help_heading = SHIM)]
    pub window_status_timeout: u64,
}

impl Args {

    pub fn smart_shrinking(&self) -> bool {
        !self.disable_smart_shrinking
    }

    pub fn load_images(&self) -> bool {
        !self.no_images
    }

    pub fn javascript(&self) -> bool {
        !self.disable_javascript
    }

    pub fn stop_slow_scripts(&self) -> bool {
        !self.no_stop_slow_scripts
    }

    pub fn outline_enabled(&self) -> bool {
        !self.no_outline
    }

    pub fn local_file_access(&self) -> bool {
        !self.disable_local_file_access
    }

    pub fn cookie_pairs(&self) -> Vec<(String, String)> {
        pairs(&self.cookies)
    }

    pub fn header_pairs(&self) -> Vec<(String, String)> {
        pairs(&self.custom_headers)
    }

    /// Every option that holds a value, for the log.
    pub fn logged_options(&self) -> Value {

        let mut options = json!({
            "input": self.input,
            "output": self.output,
            "page_size": self.page_size.name(),
            "orientation": self.orientation.name(),
            "margin_top": self.margin_top,
            "margin_right": self.margin_right,
            "margin_bottom": self.margin_bottom,
            "margin_left": self.margin_left,
            "zoom": self.zoom,
            "dpi": self.dpi,
            "enable_smart_shrinking": self.smart_shrinking(),
            "load_images": self.load_images(),
            "enable_javascript": self.javascript(),
            "stop_slow_scripts": self.stop_slow_scripts(),
            "encoding": self.encoding,
            "quiet": self.quiet,
            "debug_javascript": self.debug_javascript,
            "title": self.title,
            "grayscale": self.grayscale,
            "lowquality": self.lowquality,
            "print_media_type": self.print_media_type,
            "viewport_size": self.viewport_size,
            "window_status": self.window_status,
            "header_left": self.header_left,
            "header_center": self.header_center,
            "header_right": self.header_right,
            "header_spacing": self.header_spacing,
            "header_line": self.header_line,
            "footer_left": self.footer_left,
            "footer_center": self.footer_center,
            "footer_right": self.footer_right,
            "footer_spacing": self.footer_spacing,
            "footer_line": self.footer_line,
            "toc": self.toc,
            "toc_depth": self.toc_depth,
            "cover": self.cover,
            "outline": self.outline_enabled(),
            "outline_depth": self.outline_depth,
            "cookies": self.cookie_pairs(),
            "custom_headers": self.header_pairs(),
            "custom_header_propagation": self.custom_header_propagation,
            "user_style_sheet": self.user_style_sheet,
            "allowed_paths": self.allowed_paths,
            "allow_local_file_access": self.local_file_access(),
        });

        if let Value::Object(map) = &mut options {
            map.retain(|_, v| match v {
                Value::Null => false,
                Value::Array(items) => !items.is_empty(),
                _ => true,
            });
        }

        options
    }
}

fn pairs(values: &[String]) -> Vec<(String, String)> {
    values
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}
