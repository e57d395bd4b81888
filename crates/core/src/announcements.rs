use std::fmt;
use std::rc::Rc;

use conf_hero_protocol::AnnouncementItem;
use futures::future::LocalBoxFuture;
use thiserror::Error;

use crate::diagnostics::{Diagnostic, Diagnostics};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("malformed announcements: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Sequence number of a fetch. Later requests carry larger tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub const fn new(sequence: u64) -> Self {
        Self(sequence)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One GET for the announcements of a conference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: Ticket,
    pub url: String,
    /// Send cookies / auth with the request.
    pub with_credentials: bool,
}

/// Transport for announcement requests. Returns the raw response body of a
/// successful (2xx) response.
pub trait AnnouncementSource {
    fn fetch(&self, request: &FetchRequest) -> LocalBoxFuture<'static, Result<Vec<u8>, FetchError>>;
}

/// `{base}/{path}/{conf_id}` with duplicate slashes removed and the id
/// percent-encoded.
pub fn endpoint_url(base: &str, path: &str, conf_id: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_matches('/');
    let conf_id = urlencoding::encode(conf_id);
    if path.is_empty() {
        format!("{base}/{conf_id}")
    } else {
        format!("{base}/{path}/{conf_id}")
    }
}

/// Decode a JSON array of announcements and order it by `sequence`.
/// Equal sequences keep their response order.
pub fn decode_sorted(body: &[u8]) -> Result<Vec<AnnouncementItem>, serde_json::Error> {
    let mut items: Vec<AnnouncementItem> = serde_json::from_slice(body)?;
    items.sort_by(|a, b| a.sequence.total_cmp(&b.sequence));
    Ok(items)
}

/// What [`AnnouncementLoader::complete`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The list was replaced with this many items.
    Stored(usize),
    /// The request failed and the list was emptied.
    Cleared,
    /// The response belonged to a superseded request and was dropped.
    Stale,
}

impl Completion {
    /// Whether the stored list was touched.
    pub fn changed(self) -> bool {
        !matches!(self, Completion::Stale)
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Derives announcement requests from two independently arriving inputs
/// and owns the resulting list.
///
/// Each change of the `(endpoint, conf_id)` pair yields at most one
/// [`FetchRequest`]. Only the response to the latest request is applied.
pub struct AnnouncementLoader {
    path: String,
    endpoint: Option<String>,
    conf_id: Option<String>,
    pending: Option<FetchRequest>,
    last_ticket: u64,
    items: Vec<AnnouncementItem>,
    diagnostics: Rc<dyn Diagnostics>,
}

impl AnnouncementLoader {
    pub fn new(path: impl Into<String>, diagnostics: Rc<dyn Diagnostics>) -> Self {
        Self {
            path: path.into(),
            endpoint: None,
            conf_id: None,
            pending: None,
            last_ticket: 0,
            items: Vec::new(),
            diagnostics,
        }
    }

    /// Seed the conference id without evaluating it. Pair with
    /// [`refresh`](Self::refresh).
    pub fn with_conf_id(mut self, conf_id: Option<String>) -> Self {
        self.conf_id = present(conf_id);
        self
    }

    pub fn items(&self) -> &[AnnouncementItem] {
        &self.items
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn conf_id(&self) -> Option<&str> {
        self.conf_id.as_deref()
    }

    /// The request whose response is still awaited, if any.
    pub fn pending(&self) -> Option<&FetchRequest> {
        self.pending.as_ref()
    }

    pub fn set_endpoint(&mut self, endpoint: Option<String>) -> Option<FetchRequest> {
        let endpoint = present(endpoint);
        if endpoint == self.endpoint {
            return None;
        }
        self.endpoint = endpoint;
        self.reconcile()
    }

    pub fn set_conf_id(&mut self, conf_id: Option<String>) -> Option<FetchRequest> {
        let conf_id = present(conf_id);
        if conf_id == self.conf_id {
            return None;
        }
        self.conf_id = conf_id;
        self.reconcile()
    }

    /// Evaluate the current inputs as if they had just changed.
    pub fn refresh(&mut self) -> Option<FetchRequest> {
        self.reconcile()
    }

    fn reconcile(&mut self) -> Option<FetchRequest> {
        // Any input change supersedes the request in flight.
        self.pending = None;

        let (Some(endpoint), Some(conf_id)) = (&self.endpoint, &self.conf_id) else {
            self.diagnostics.report(Diagnostic::ConfigurationMissing {
                endpoint: self.endpoint.is_none(),
                conf_id: self.conf_id.is_none(),
            });
            return None;
        };

        self.last_ticket += 1;
        let request = FetchRequest {
            ticket: Ticket(self.last_ticket),
            url: endpoint_url(endpoint, &self.path, conf_id),
            with_credentials: true,
        };
        log::debug!("requesting announcements {} from {}", request.ticket, request.url);
        self.pending = Some(request.clone());
        Some(request)
    }

    /// Apply the outcome of the request identified by `ticket`.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<Vec<u8>, FetchError>,
    ) -> Completion {
        let request = match self.pending.take() {
            Some(request) if request.ticket == ticket => request,
            other => {
                self.pending = other;
                self.diagnostics
                    .report(Diagnostic::StaleResponse { ticket: ticket.get() });
                return Completion::Stale;
            }
        };

        match outcome.and_then(|body| decode_sorted(&body).map_err(FetchError::from)) {
            Ok(items) => {
                log::debug!("stored {} announcements from {}", items.len(), request.url);
                self.items = items;
                Completion::Stored(self.items.len())
            }
            Err(err) => {
                self.items.clear();
                self.diagnostics.report(Diagnostic::FetchFailed {
                    url: request.url,
                    reason: err.to_string(),
                });
                Completion::Cleared
            }
        }
    }

    /// Forget the in-flight request so its response is dropped on arrival.
    pub fn invalidate(&mut self) {
        self.pending = None;
    }
}
