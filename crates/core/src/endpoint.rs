use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;

/// Supplies the API base URL. Called once per mount.
pub trait EndpointResolver {
    fn resolve(&self) -> LocalBoxFuture<'static, Option<String>>;
}

/// A base URL known up front.
#[derive(Debug, Clone, Default)]
pub struct StaticEndpoint(Option<String>);

impl StaticEndpoint {
    pub fn new(base: impl Into<String>) -> Self {
        Self(Some(base.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl EndpointResolver for StaticEndpoint {
    fn resolve(&self) -> LocalBoxFuture<'static, Option<String>> {
        future::ready(self.0.clone()).boxed_local()
    }
}
