use std::path::PathBuf;
use clap::ValueEnum;
use serde::Serialize;
use crate::cli::Args;
use crate::units;

const DEFAULT_MARGIN_MM: f64 = 10.0;
const DEFAULT_ZOOM: f64 = 1.0;
const DEFAULT_DPI: u32 = 96;
const DEFAULT_OUTLINE_DEPTH: u32 = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PageSize {
    #[value(name = "A0")] A0,
    #[value(name = "A1")] A1,
    #[value(name = "A2")] A2,
    #[value(name = "A3")] A3,
    #[value(name = "A4")] A4,
    #[value(name = "A5")] A5,
    #[value(name = "A6")] A6,
    #[value(name = "A7")] A7,
    #[value(name = "A8")] A8,
    #[value(name = "A9")] A9,
    #[value(name = "B0")] B0,
    #[value(name = "B1")] B1,
    #[value(name = "B2")] B2,
    #[value(name = "B3")] B3,
    #[value(name = "B4")] B4,
    #[value(name = "B5")] B5,
    #[value(name = "B6")] B6,
    #[value(name = "B7")] B7,
    #[value(name = "B8")] B8,
    #[value(name = "B9")] B9,
    #[value(name = "B10")] B10,
    #[value(name = "C5E")] C5E,
    #[value(name = "Comm10E")] Comm10E,
    #[value(name = "DLE")] DLE,
    #[value(name = "Executive")] Executive,
    #[value(name = "Folio")] Folio,
    #[value(name = "Ledger")] Ledger,
    #[value(name = "Legal")] Legal,
    #[value(name = "Letter")] Letter,
    #[value(name = "Tabloid")] Tabloid,
}

impl PageSize {

    pub fn name(&self) -> &'static str {
        match self {
            PageSize::A0 => "A0",
            PageSize::A1 => "A1",
            PageSize::A2 => "A2",
            PageSize::A3 => "A3",
            PageSize::A4 => "A4",
            PageSize::A5 => "A5",
            PageSize::A6 => "A6",
            PageSize::A7 => "A7",
            PageSize::A8 => "A8",
            PageSize::A9 => "A9",
            PageSize::B0 => "B0",
            PageSize::B1 => "B1",
            PageSize::B2 => "B2",
            PageSize::B3 => "B3",
            PageSize::B4 => "B4",
            PageSize::B5 => "B5",
            PageSize::B6 => "B6",
            PageSize::B7 => "B7",
            PageSize::B8 => "B8",
            PageSize::B9 => "B9",
            PageSize::B10 => "B10",
            PageSize::C5E => "C5E",
            PageSize::Comm10E => "Comm10E",
            PageSize::DLE => "DLE",
            PageSize::Executive => "Executive",
            PageSize::Folio => "Folio",
            PageSize::Ledger => "Ledger",
            PageSize::Legal => "Legal",
            PageSize::Letter => "Letter",
            PageSize::Tabloid => "Tabloid",
        }
    }

    /// Portrait width and height in millimetres.
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match self {
            PageSize::A0 => (841.0, 1189.0),
            PageSize::A1 => (594.0, 841.0),
            PageSize::A2 => (420.0, 594.0),
            PageSize::A3 => (297.0, 420.0),
            PageSize::A4 => (210.0, 297.0),
            PageSize::A5 => (148.0, 210.0),
            PageSize::A6 => (105.0, 148.0),
            PageSize::A7 => (74.0, 105.0),
            PageSize::A8 => (52.0, 74.0),
            PageSize::A9 => (37.0, 52.0),
            PageSize::B0 => (1000.0, 1414.0),
            PageSize::B1 => (707.0, 1000.0),
            PageSize::B2 => (500.0, 707.0),
            PageSize::B3 => (353.0, 500.0),
            PageSize::B4 => (250.0, 353.0),
            PageSize::B5 => (176.0, 250.0),
            PageSize::B6 => (125.0, 176.0),
            PageSize::B7 => (88.0, 125.0),
            PageSize::B8 => (62.0, 88.0),
            PageSize::B9 => (44.0, 62.0),
            PageSize::B10 => (31.0, 44.0),
            PageSize::C5E => (163.0, 229.0),
            PageSize::Comm10E => (105.0, 241.0),
            PageSize::DLE => (110.0, 220.0),
            PageSize::Executive => (190.5, 254.0),
            PageSize::Folio => (210.0, 330.0),
            PageSize::Ledger => (431.8, 279.4),
            PageSize::Legal => (215.9, 355.6),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Tabloid => (279.4, 431.8),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Orientation {
    #[value(name = "Portrait")]
    Portrait,
    #[value(name = "Landscape")]
    Landscape,
}

impl Orientation {
    pub fn name(&self) -> &'static str {
        match self {
            Orientation::Portrait => "Portrait",
            Orientation::Landscape => "Landscape",
        }
    }
}

/// Header or footer text with its layout flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Decoration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing_mm: Option<f64>,
    pub line: bool,
}

impl Decoration {
    pub fn has_text(&self) -> bool {
        [&self.left, &self.center, &self.right]
            .iter()
            .any(|t| t.as_deref().is_some_and(|t| !t.is_empty()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Renderer-independent options, resolved once from the command line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOptions {
    pub page_size: &'static str,
    pub paper_width_mm: f64,
    pub paper_height_mm: f64,
    pub landscape: bool,
    pub margins_mm: Margins,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
    pub smart_shrinking: bool,
    pub grayscale: bool,
    pub low_quality: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub print_media_type: bool,
    pub load_images: bool,
    pub enable_javascript: bool,
    pub encoding: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<(u32, u32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_status: Option<String>,
    pub header: Decoration,
    pub footer: Decoration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toc: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_style_sheet: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_headers: Vec<(String, String)>,
    pub custom_header_propagation: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_paths: Vec<PathBuf>,
    pub allow_local_file_access: bool,
}

fn margin(value: &str) -> f64 {
    units::parse_size(value).unwrap_or(DEFAULT_MARGIN_MM)
}

impl RenderOptions {

    pub fn from_args(args: &Args) -> Self {

        let (paper_width_mm, paper_height_mm) = args.page_size.dimensions_mm();

        Self {
            page_size: args.page_size.name(),
            paper_width_mm,
            paper_height_mm,
            landscape: args.orientation == Orientation::Landscape,
            margins_mm: Margins {
                top: margin(&args.margin_top),
                right: margin(&args.margin_right),
                bottom: margin(&args.margin_bottom),
                left: margin(&args.margin_left),
            },
            zoom: Some(args.zoom).filter(|z| z.is_finite() && *z > 0.0 && *z != DEFAULT_ZOOM),
            dpi: Some(args.dpi).filter(|d| *d != DEFAULT_DPI),
            smart_shrinking: args.smart_shrinking(),
            grayscale: args.grayscale,
            low_quality: args.lowquality,
            title: args.title.clone(),
            print_media_type: args.print_media_type,
            load_images: args.load_images(),
            enable_javascript: args.javascript(),
            encoding: args.encoding.clone(),
            viewport: args.viewport_size.as_deref().and_then(units::parse_viewport),
            window_status: args.window_status.clone(),
            header: Decoration {
                left: args.header_left.clone(),
                center: args.header_center.clone(),
                right: args.header_right.clone(),
                spacing_mm: args.header_spacing,
                line: args.header_line,
            },
            footer: Decoration {
                left: args.footer_left.clone(),
                center: args.footer_center.clone(),
                right: args.footer_right.clone(),
                spacing_mm: args.footer_spacing,
                line: args.footer_line,
            },
            toc: args.toc.then_some(args.toc_depth),
            cover: args.cover.clone(),
            outline: args.outline_enabled().then_some(args.outline_depth),
            user_style_sheet: args.user_style_sheet.clone(),
            cookies: args.cookie_pairs(),
            custom_headers: args.header_pairs(),
            custom_header_propagation: args.custom_header_propagation,
            allowed_paths: args.allowed_paths.clone(),
            allow_local_file_access: args.local_file_access(),
        }
    }

    /// Paper width and height as printed, after orientation.
    pub fn paper_mm(&self) -> (f64, f64) {
        if self.landscape {
            (self.paper_height_mm, self.paper_width_mm)
        } else {
            (self.paper_width_mm, self.paper_height_mm)
        }
    }

    /// Flags that were given but that no renderer applies.
    pub fn ignored(&self) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        if self.dpi.is_some() {
            ignored.push("--dpi");
        }
        if self.low_quality {
            ignored.push("--lowquality");
        }
        if !self.smart_shrinking {
            ignored.push("--disable-smart-shrinking");
        }
        // Chrome builds the outline from every heading level.
        if self.outline.is_some_and(|depth| depth != DEFAULT_OUTLINE_DEPTH) {
            ignored.push("--outline-depth");
        }
        ignored
    }

    /// HTTP headers sent with the input request: custom headers plus
    /// a `Cookie` header built from the cookies.
    pub fn request_headers(&self) -> Vec<(String, String)> {

        let mut headers = self.custom_headers.clone();

        if !self.cookies.is_empty() {
            let cookie = self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            headers.push(("Cookie".to_string(), cookie));
        }

        headers
    }
}
