//! Document loading from files and HTTP URLs, with a fetch-once cache.

use std::io::Write;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ExtractError, FetchError};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Timeout for HTTP requests. Full swagger documents run to several megabytes.
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Obtains the raw bytes behind a locator.
pub trait Fetcher {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetches `http://`/`https://` locators over the network and reads
/// everything else from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFetcher;

impl Fetcher for DefaultFetcher {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError> {
        if is_url(locator) {
            fetch_url(locator)
        } else {
            read_file(Path::new(locator))
        }
    }
}

/// Wraps a fetcher so each cache entry is fetched at most once.
///
/// An existing cache file is returned as-is; it is only refreshed after
/// something outside this crate removes it.
#[derive(Debug, Clone, Default)]
pub struct CachedFetcher<F> {
    inner: F,
}

impl<F: Fetcher> CachedFetcher<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }

    /// Return the bytes cached at `cache_path`, fetching `locator` on a miss.
    ///
    /// The entry is written through a temporary file in the cache directory,
    /// so a failed fetch or write never leaves a partial entry behind.
    pub fn fetch(&self, locator: &str, cache_path: &Path) -> Result<Vec<u8>, FetchError> {
        if cache_path.is_file() {
            debug!(cache = %cache_path.display(), "cache hit");
            return read_file(cache_path);
        }

        info!(locator, cache = %cache_path.display(), "downloading");
        let bytes = self.inner.fetch(locator)?;
        write_cache_entry(cache_path, &bytes)?;
        Ok(bytes)
    }
}

fn write_cache_entry(cache_path: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    let cache_error = |source| FetchError::CacheWrite {
        path: cache_path.to_path_buf(),
        source,
    };

    let dir = match cache_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(cache_error)?;

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(cache_error)?;
    file.write_all(bytes).map_err(cache_error)?;
    file.persist(cache_path).map_err(|e| cache_error(e.error))?;
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>, FetchError> {
    if !path.exists() {
        return Err(FetchError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read(path).map_err(|source| FetchError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(feature = "remote")]
fn fetch_url(url: &str) -> Result<Vec<u8>, FetchError> {
    let network_error = |source| FetchError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    let response = client.get(url).send().map_err(network_error)?;

    // Check for HTTP errors before reading the body
    let response = response.error_for_status().map_err(network_error)?;

    response
        .bytes()
        .map(|body| body.to_vec())
        .map_err(network_error)
}

#[cfg(not(feature = "remote"))]
fn fetch_url(url: &str) -> Result<Vec<u8>, FetchError> {
    Err(FetchError::RemoteDisabled {
        url: url.to_string(),
    })
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Parse JSON bytes into a document.
pub fn parse_document(bytes: &[u8]) -> Result<Value, ExtractError> {
    serde_json::from_slice(bytes).map_err(|source| ExtractError::InvalidJson { source })
}

/// Load a JSON document from a file path or URL.
pub fn load_document(source: &str) -> Result<Value, ExtractError> {
    let bytes = DefaultFetcher.fetch(source)?;
    parse_document(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::{NamedTempFile, TempDir};

    struct CountingFetcher {
        calls: Cell<usize>,
        body: &'static [u8],
    }

    impl Fetcher for CountingFetcher {
        fn fetch(&self, _locator: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.body.to_vec())
        }
    }

    struct FailingFetcher;

    impl Fetcher for FailingFetcher {
        fn fetch(&self, locator: &str) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::FileNotFound {
                path: locator.into(),
            })
        }
    }

    #[test]
    fn load_document_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"definitions": {{}}}}"#).unwrap();

        let document = load_document(file.path().to_str().unwrap()).unwrap();
        assert!(document["definitions"].is_object());
    }

    #[test]
    fn load_document_file_not_found() {
        let result = load_document("/nonexistent/swagger.json");
        assert!(matches!(
            result,
            Err(ExtractError::Fetch(FetchError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn load_document_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let result = load_document(file.path().to_str().unwrap());
        assert!(matches!(result, Err(ExtractError::InvalidJson { .. })));
    }

    #[test]
    fn is_url_detection() {
        assert!(is_url("https://example.com/swagger.json"));
        assert!(is_url("http://example.com/swagger.json"));
        assert!(!is_url("/path/to/swagger.json"));
        assert!(!is_url("./swagger.json"));
    }

    #[test]
    fn cache_miss_fetches_and_stores() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("cache/k8s-1.18.0-swagger.json");
        let fetcher = CachedFetcher::new(CountingFetcher {
            calls: Cell::new(0),
            body: br#"{"definitions":{}}"#,
        });

        let bytes = fetcher.fetch("https://example.com/swagger.json", &cache).unwrap();
        assert_eq!(bytes, br#"{"definitions":{}}"#);
        assert_eq!(std::fs::read(&cache).unwrap(), bytes);
        assert_eq!(fetcher.inner.calls.get(), 1);
    }

    #[test]
    fn cache_hit_never_refetches() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("swagger.json");
        std::fs::write(&cache, b"cached").unwrap();
        let fetcher = CachedFetcher::new(CountingFetcher {
            calls: Cell::new(0),
            body: b"fresh",
        });

        assert_eq!(fetcher.fetch("ignored", &cache).unwrap(), b"cached");
        assert_eq!(fetcher.fetch("ignored", &cache).unwrap(), b"cached");
        assert_eq!(fetcher.inner.calls.get(), 0);
    }

    #[test]
    fn failed_fetch_leaves_no_cache_entry() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("swagger.json");
        let fetcher = CachedFetcher::new(FailingFetcher);

        assert!(fetcher.fetch("missing.json", &cache).is_err());
        assert!(!cache.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(not(feature = "remote"))]
    #[test]
    fn urls_need_remote_feature() {
        let result = DefaultFetcher.fetch("https://example.com/swagger.json");
        assert!(matches!(result, Err(FetchError::RemoteDisabled { .. })));
    }
}
