use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use pandoc;
use tracing::info;
use crate::document;
use crate::options::RenderOptions;
use super::{RenderError, RenderJob, Renderer, Result};

/// Converts through pandoc and whatever PDF engine it is configured with.
pub struct PandocRenderer {
    pub pdf_engine: Option<PathBuf>,
}

fn pandoc_installed() -> bool {
    Command::new("pandoc")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

fn geometry(options: &RenderOptions) -> String {
    let m = &options.margins_mm;
    let mut geometry = format!(
        "paperwidth={}mm,paperheight={}mm,top={}mm,right={}mm,bottom={}mm,left={}mm",
        options.paper_width_mm, options.paper_height_mm, m.top, m.right, m.bottom, m.left
    );
    if options.landscape {
        geometry.push_str(",landscape");
    }
    geometry
}

impl PandocRenderer {

    fn pandoc_options(&self, options: &RenderOptions) -> Vec<pandoc::PandocOption> {

        let mut pandoc_options = vec![
            pandoc::PandocOption::Var("geometry".to_string(), Some(geometry(options))),
        ];

        if let Some(title) = &options.title {
            pandoc_options.push(pandoc::PandocOption::Var("title".to_string(), Some(title.clone())));
            pandoc_options.push(pandoc::PandocOption::Var("pagetitle".to_string(), Some(title.clone())));
        }

        if let Some(depth) = options.toc {
            pandoc_options.push(pandoc::PandocOption::TableOfContents);
            pandoc_options.push(pandoc::PandocOption::TableOfContentsDepth(depth));
        }

        if let Some(engine) = &self.pdf_engine {
            pandoc_options.push(pandoc::PandocOption::PdfEngine(engine.clone()));
        }

        pandoc_options
    }
}

impl Renderer for PandocRenderer {

    fn name(&self) -> &'static str {
        "pandoc"
    }

    fn render(&self, job: &RenderJob, output: &Path) -> Result<()> {

        // Checked before the input URL or cover is fetched.
        if !pandoc_installed() {
            return Err(RenderError::Unavailable("pandoc is not installed".to_string()));
        }

        let options = job.options;
        let mut html = job.html()?;
        if let Some(cover) = document::load_cover(options)? {
            html.insert_str(0, &cover);
        }

        // pandoc picks the output format from the file extension
        let staging = tempfile::tempdir()?;
        let staged = staging.path().join("output.pdf");

        let mut pandoc = pandoc::Pandoc::new();
        pandoc
            .set_input(pandoc::InputKind::Pipe(html))
            .set_input_format(pandoc::InputFormat::Html, vec![])
            .set_output(pandoc::OutputKind::File(staged.clone()));
        for option in self.pandoc_options(options) {
            pandoc.add_option(option);
        }

        match pandoc.execute() {
            Ok(_) => {}
            Err(pandoc::PandocError::PandocNotFound) => {
                return Err(RenderError::Unavailable("pandoc is not installed".to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        info!("Writing PDF to: {}", output.display());
        std::fs::copy(&staged, output)?;
        Ok(())
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

    #[test]
    fn test_geometry() {
        let options = resolve(&["-s", "A5", "-T", "1cm", "a.html", "b.pdf"]);
        assert_eq!(
            geometry(&options),
            "paperwidth=148mm,paperheight=210mm,top=10mm,right=10mm,bottom=10mm,left=10mm"
        );

        let options = resolve(&["-O", "Landscape", "a.html", "b.pdf"]);
        assert!(geometry(&options).ends_with(",landscape"));
    }

    #[test]
    fn test_pandoc_options() {
        let renderer = PandocRenderer { pdf_engine: Some(PathBuf::from("weasyprint")) };

        assert_eq!(renderer.pandoc_options(&resolve(&["a.html", "b.pdf"])).len(), 2);

        let options = resolve(&["--title", "Report", "--toc", "a.html", "b.pdf"]);
        assert_eq!(renderer.pandoc_options(&options).len(), 6);
    }
}
