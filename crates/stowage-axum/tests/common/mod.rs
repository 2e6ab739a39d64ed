//! Test harness: a real on-disk cache behind the router, with canned
//! downloads in place of remote sources.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use stowage_axum::{AxumContext, CorsConfig, create_router};
use stowage_core::{
    ContentItem, ContentRequest, ContentService, Credentials, DownloadError, Downloader,
    DownloaderFactory, Locator, reader_from_bytes,
};
use tempfile::TempDir;

/// Outcome served for one locator.
#[derive(Clone)]
pub enum Canned {
    Body(Vec<u8>),
    Fail(DownloadError),
    /// Serves these bytes, then the connection resets.
    Truncated(Vec<u8>),
}

struct CannedDownloader(Canned);

#[async_trait]
impl Downloader for CannedDownloader {
    async fn download(&self) -> Result<Vec<ContentItem>, DownloadError> {
        match &self.0 {
            Canned::Body(bytes) => Ok(vec![ContentItem::unaddressed(reader_from_bytes(
                bytes.clone(),
            ))]),
            Canned::Fail(err) => Err(err.clone()),
            Canned::Truncated(bytes) => {
                let reader = tokio_test::io::Builder::new()
                    .read(bytes)
                    .read_error(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        "connection reset by peer",
                    ))
                    .build();
                Ok(vec![ContentItem::unaddressed(Box::new(reader))])
            }
        }
    }
}

/// Factory serving canned outcomes for `https` locators only.
#[derive(Default)]
pub struct CannedDownloads {
    canned: HashMap<String, Canned>,
    pub requests: Arc<Mutex<Vec<ContentRequest>>>,
}

impl CannedDownloads {
    pub fn with(mut self, locator: &str, canned: Canned) -> Self {
        self.canned.insert(locator.to_string(), canned);
        self
    }
}

impl DownloaderFactory for CannedDownloads {
    fn downloader(&self, request: &ContentRequest) -> Result<Box<dyn Downloader>, DownloadError> {
        let locator = Locator::parse(&request.locator)?;
        if locator.url().scheme() != "https" {
            return Err(DownloadError::UnsupportedScheme {
                scheme: locator.url().scheme().to_string(),
            });
        }
        self.requests.lock().unwrap().push(request.clone());
        let canned = self
            .canned
            .get(&request.locator)
            .cloned()
            .unwrap_or_else(|| {
                Canned::Fail(DownloadError::upstream_status(
                    request.locator.clone(),
                    "GET",
                    404,
                ))
            });
        Ok(Box::new(CannedDownloader(canned)))
    }
}

pub struct TestApp {
    pub router: Router,
    pub requests: Arc<Mutex<Vec<ContentRequest>>>,
    _tmp: TempDir,
}

impl TestApp {
    pub async fn new(downloads: CannedDownloads) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let cache = stowage_store::open_cache(tmp.path().join("cache"))
            .await
            .unwrap();
        let requests = Arc::clone(&downloads.requests);
        let service = ContentService::new(Arc::new(cache), Arc::new(downloads))
            .with_spill_dir(Some(tmp.path().to_path_buf()));
        let router = create_router(AxumContext::new(Arc::new(service)), &CorsConfig::Disabled);
        Self {
            router,
            requests,
            _tmp: tmp,
        }
    }

    /// Credentials seen by the downloader factory, in request order.
    pub fn credentials(&self) -> Vec<Option<Credentials>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.credentials.clone())
            .collect()
    }
}
