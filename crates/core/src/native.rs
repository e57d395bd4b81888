//! Adapters for desktop and terminal hosts.
//!
//! Blocking work runs on short-lived worker threads and reports back through
//! a oneshot channel, so a single-threaded `LocalPool` can drive the returned
//! futures.

use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture};

use crate::announcements::{AnnouncementSource, FetchError, FetchRequest};
use crate::endpoint::EndpointResolver;
use crate::preload::{AssetError, ImageLoader};

/// Environment variable read by [`EnvEndpoint::default`].
pub const ENDPOINT_VAR: &str = "CONF_HERO_API_URL";

/// Run `work` on a worker thread. Resolves to `None` if the thread could not
/// be started or died before answering.
pub fn off_thread<T, F>(name: &str, work: F) -> LocalBoxFuture<'static, Option<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let spawned = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            // The receiver is gone when the task was aborted; nothing to do.
            let _ = tx.send(work());
        });
    match spawned {
        Ok(_) => rx.map(Result::ok).boxed_local(),
        Err(err) => {
            log::error!("could not start {name} worker: {err}");
            future::ready(None).boxed_local()
        }
    }
}

/// Announcements over HTTP with a blocking `reqwest` client.
///
/// There is no cookie jar on native hosts, so `with_credentials` has no
/// effect here.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    fn get(client: &reqwest::blocking::Client, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = client
            .get(url)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response
            .bytes()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(body.to_vec())
    }
}

impl AnnouncementSource for HttpSource {
    fn fetch(&self, request: &FetchRequest) -> LocalBoxFuture<'static, Result<Vec<u8>, FetchError>> {
        let client = self.client.clone();
        let url = request.url.clone();
        off_thread("conf-hero-fetch", move || Self::get(&client, &url))
            .map(|outcome| {
                outcome.unwrap_or_else(|| {
                    Err(FetchError::Transport("fetch worker stopped".into()))
                })
            })
            .boxed_local()
    }
}

/// Preloads slide images from a directory standing in for the site root.
#[derive(Debug, Clone)]
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of a site-absolute image URI.
    pub fn resolve(&self, uri: &str) -> PathBuf {
        self.root.join(uri.trim_start_matches('/'))
    }

    /// URI a renderer can hand to its image loader.
    pub fn display_uri(&self, uri: &str) -> String {
        format!("file://{}", self.resolve(uri).display())
    }

    /// Contents of an image file. Empty files are rejected.
    pub fn read_bytes(path: &Path) -> Result<Vec<u8>, AssetError> {
        match std::fs::read(path) {
            Ok(bytes) if bytes.is_empty() => Err(AssetError::Rejected("empty file".into())),
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(AssetError::NotFound),
            Err(err) => Err(AssetError::Io(err.to_string())),
        }
    }
}

impl ImageLoader for FsImageLoader {
    fn load(&self, uri: &str) -> LocalBoxFuture<'static, Result<(), AssetError>> {
        let path = self.resolve(uri);
        off_thread("conf-hero-preload", move || Self::read_bytes(&path).map(|_| ()))
            .map(|outcome| {
                outcome.unwrap_or_else(|| Err(AssetError::Io("preload worker stopped".into())))
            })
            .boxed_local()
    }
}

/// Base URL taken from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvEndpoint {
    var: String,
}

impl EnvEndpoint {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvEndpoint {
    fn default() -> Self {
        Self::new(ENDPOINT_VAR)
    }
}

impl EndpointResolver for EnvEndpoint {
    fn resolve(&self) -> LocalBoxFuture<'static, Option<String>> {
        let value = std::env::var(&self.var).ok();
        if value.is_none() {
            log::warn!("{} is not set", self.var);
        }
        future::ready(value).boxed_local()
    }
}
