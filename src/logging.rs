//! Invocation log.
//!
//! Every run appends a block of plain lines to `~/.wkhtmltopdf.log`, or to
//! the file named by `FAKEWKHTMLTOPDF_LOG`. Lines go through `tracing`, so
//! anything in the crate that logs ends up in the same block.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;
use tracing::subscriber::DefaultGuard;

pub const LOG_ENV: &str = "FAKEWKHTMLTOPDF_LOG";

const LOG_FILE_NAME: &str = ".wkhtmltopdf.log";

/// The log file: `$FAKEWKHTMLTOPDF_LOG`, else `~/.wkhtmltopdf.log`.
pub fn log_path() -> Option<PathBuf> {
    std::env::var_os(LOG_ENV)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(LOG_FILE_NAME)))
}

/// Routes `tracing` events on this thread to the log file, one bare
/// message per line. Logging is dropped when the file can't be opened.
pub fn init(path: Option<&Path>) -> DefaultGuard {

    let file = path.and_then(|path| {
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    let builder = tracing_subscriber::fmt()
        .with_ansi(false)
        .without_time()
        .with_level(false)
        .with_target(false);

    match file {
        Some(file) => tracing::subscriber::set_default(builder.with_writer(Mutex::new(file)).finish()),
        None => tracing::subscriber::set_default(builder.with_writer(std::io::sink).finish()),
    }
}

pub fn timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(&Rfc3339).unwrap_or_else(|_| now.to_string())
}

pub fn log_invocation(argv: &[String]) {
    info!("=== {} ===", timestamp());
    info!("Full command line: {}", argv.join(" "));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_bare_and_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shim.log");
        std::fs::write(&path, "earlier run\n").unwrap();

        {
            let _guard = init(Some(path.as_path()));
            log_invocation(&["wkhtmltopdf".to_string(), "a.html".to_string(), "b.pdf".to_string()]);
            info!("");
        }

        let log = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = log.lines().collect();

        assert_eq!(lines[0], "earlier run");
        assert!(lines[1].starts_with("=== ") && lines[1].ends_with(" ==="));
        assert_eq!(lines[2], "Full command line: wkhtmltopdf a.html b.pdf");
        assert_eq!(lines[3], "");
    }

    #[test]
    fn test_unwritable_log_is_ignored() {
        let _guard = init(Some(Path::new("/definitely/not/here/shim.log")));
        info!("goes nowhere");
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let stamp = timestamp();
        assert_eq!(stamp.as_bytes()[4], b'-');
        assert_eq!(stamp.as_bytes()[10], b'T');
    }
}
