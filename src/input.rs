use std::path::{Path, PathBuf};
use encoding_rs::{Encoding, UTF_8};
use reqwest;
use thiserror::Error;
use tracing::warn;
use url::{Url, ParseError};

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Input file '{0}' does not exist.")]
    NotFound(String),
    #[error("UrlError, can't parse given URL: {0}")]
    UrlError(#[from] ParseError),
    #[error("ReqwestError: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("Invalid header {0}: {1}")]
    HeaderError(String, String),
    #[error("I/O error reading {0}: {1}")]
    IOError(String, #[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InputError>;

/// True when the string parses as a URL with both a scheme and a host.
pub fn is_url(input: &str) -> bool {
    Url::parse(input)
        .map(|url| url.host_str().is_some_and(|host| !host.is_empty()))
        .unwrap_or(false)
}

/// Where the HTML comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Url(Url),
    File(PathBuf),
}

impl Source {

    /// Resolves the command-line input. Local files must exist.
    pub fn parse(input: &str) -> Result<Self> {

        if is_url(input) {
            return Ok(Source::Url(Url::parse(input)?));
        }

        let path = PathBuf::from(input);
        if !path.is_file() {
            return Err(InputError::NotFound(input.to_string()));
        }

        Ok(Source::File(path))
    }

    pub fn is_url(&self) -> bool {
        matches!(self, Source::Url(_))
    }

    /// URL a browser should navigate to for this source.
    pub fn file_url(&self) -> Result<Url> {
        match self {
            Source::Url(url) => Ok(url.clone()),
            Source::File(path) => {
                let absolute = std::path::absolute(path)
                    .map_err(|e| InputError::IOError(path.display().to_string(), e))?;
                Url::from_file_path(&absolute)
                    .map_err(|_| InputError::NotFound(path.display().to_string()))
            }
        }
    }

    /// True when the file lies under one of the given directories, or is one of them.
    pub fn is_within(&self, allowed: &[PathBuf]) -> bool {
        let Source::File(path) = self else {
            return false;
        };
        let Ok(path) = path.canonicalize() else {
            return false;
        };

        allowed
            .iter()
            .filter_map(|a| a.canonicalize().ok())
            .any(|a| path.starts_with(&a))
    }

    /// Fetches the raw bytes and decodes them with the given encoding label.
    pub fn read(&self, encoding: &str, headers: &[(String, String)]) -> Result<String> {
        let bytes = match self {
            Source::Url(url) => fetch(url, headers)?,
            Source::File(path) => read_file(path)?,
        };
        Ok(decode(&bytes, encoding))
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Url(url) => write!(f, "{}", url),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) wkhtmltopdf";

fn fetch(url: &Url, headers: &[(String, String)]) -> Result<Vec<u8>> {

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .build()?;

    let mut request = client.get(url.clone());
    for (name, value) in headers {
        let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| InputError::HeaderError(name.clone(), e.to_string()))?;
        let value = reqwest::header::HeaderValue::from_str(value)
            .map_err(|e| InputError::HeaderError(name.as_str().to_string(), e.to_string()))?;
        request = request.header(name, value);
    }

    let response = request
        .send()?
        .error_for_status()?;

    Ok(response.bytes()?.to_vec())
}

pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => InputError::NotFound(path.display().to_string()),
        _ => InputError::IOError(path.display().to_string(), e),
    })
}

/// Decodes with the named encoding, falling back to UTF-8 for unknown labels.
/// A byte order mark overrides the label.
pub fn decode(bytes: &[u8], label: &str) -> String {

    let encoding = Encoding::for_label(label.trim().as_bytes()).unwrap_or_else(|| {
        warn!("Unknown encoding '{}', using utf-8", label);
        UTF_8
    });

    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use wiremock::matchers::{header, method, path};

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/page.html"));
        assert!(is_url("http://localhost:8080"));
        assert!(!is_url("page.html"));
        assert!(!is_url("/tmp/page.html"));
        assert!(!is_url("file:///tmp/page.html"));
        assert!(!is_url("C:\\docs\\page.html"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_missing_file() {
        let err = Source::parse("/definitely/not/here.html").unwrap_err();
        assert!(matches!(err, InputError::NotFound(_)));
        assert_eq!(err.to_string(), "Input file '/definitely/not/here.html' does not exist.");
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Source::parse(dir.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, InputError::NotFound(_)));
    }

    #[test]
    fn test_read_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<h1>caf\u{e9}</h1>").unwrap();

        let source = Source::parse(file.path().to_str().unwrap()).unwrap();
        assert!(!source.is_url());
        assert_eq!(source.read("utf-8", &[]).unwrap(), "<h1>caf\u{e9}</h1>");
        assert_eq!(source.file_url().unwrap().scheme(), "file");
    }

    #[test]
    fn test_decode_labels() {
        assert_eq!(decode(b"caf\xe9", "latin1"), "caf\u{e9}");
        assert_eq!(decode(b"caf\xe9", "windows-1252"), "caf\u{e9}");
        assert_eq!(decode("caf\u{e9}".as_bytes(), "UTF-8"), "caf\u{e9}");
        assert_eq!(decode(b"plain", "no-such-encoding"), "plain");
    }

    // reqwest's blocking client can't run on an async worker thread.
    async fn read_blocking(url: String, headers: Vec<(String, String)>) -> Result<String> {
        tokio::task::spawn_blocking(move || Source::parse(&url)?.read("utf-8", &headers))
            .await
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_sends_headers_and_cookies() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/page.html"))
            .and(header("X-Trace", "abc"))
            .and(header("Cookie", "a=1; b=2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>remote</h1>"))
            .expect(1)
            .mount(&server)
            .await;

        let headers = vec![
            ("X-Trace".to_string(), "abc".to_string()),
            ("Cookie".to_string(), "a=1; b=2".to_string()),
        ];
        let html = read_blocking(format!("{}/page.html", server.uri()), headers).await.unwrap();

        assert_eq!(html, "<h1>remote</h1>");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing.html"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = read_blocking(format!("{}/missing.html", server.uri()), Vec::new()).await.unwrap_err();
        assert!(matches!(err, InputError::ReqwestError(_)));
    }

    #[test]
    fn test_invalid_header_name() {
        let source = Source::parse("http://127.0.0.1:9/page.html").unwrap();
        let headers = [("Bad Header".to_string(), "x".to_string())];

        let err = source.read("utf-8", &headers).unwrap_err();
        assert!(matches!(err, InputError::HeaderError(ref name, _) if name == "Bad Header"));
    }

    #[test]
    fn test_is_within_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<p>x</p>").unwrap();

        let source = Source::File(path);
        assert!(source.is_within(&[dir.path().to_path_buf()]));
        assert!(!source.is_within(&[PathBuf::from("/definitely/not/here")]));
        assert!(!source.is_within(&[]));

        let url = Source::Url(Url::parse("https://example.com").unwrap());
        assert!(!url.is_within(&[dir.path().to_path_buf()]));
    }
}
