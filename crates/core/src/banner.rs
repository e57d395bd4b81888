use std::cell::RefCell;
use std::future::Future;
use std::num::NonZeroUsize;
use std::rc::Rc;

use conf_hero_protocol::{
    AnnouncementItem, HeroAction, HeroSnapshot, ScrollMetrics, SlideView, TickerView,
};
use futures::FutureExt;
use futures::future::{self, AbortHandle};
use futures::task::{LocalSpawn, LocalSpawnExt};

use crate::announcements::{AnnouncementLoader, AnnouncementSource, FetchError, FetchRequest, Ticket};
use crate::config::{ConfigError, HeroConfig};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::endpoint::EndpointResolver;
use crate::preload::{AssetError, ImageLoader, PreloadGate};
use crate::rotator::SlideShow;
use crate::schedule::Scheduler;
use crate::ticker::{Ticker, TickerPhase};

/// Host capabilities the banner runs on.
#[derive(Clone)]
pub struct HeroServices {
    pub scheduler: Rc<dyn Scheduler>,
    pub spawner: Rc<dyn LocalSpawn>,
    pub endpoint: Rc<dyn EndpointResolver>,
    pub source: Rc<dyn AnnouncementSource>,
    pub images: Rc<dyn ImageLoader>,
    pub diagnostics: Rc<dyn Diagnostics>,
}

/// State that lives exactly as long as one mount.
struct Mounted {
    slides: SlideShow,
    gate: PreloadGate,
    loader: AnnouncementLoader,
    ticker: Ticker,
    fetch: Option<AbortHandle>,
    tasks: Vec<AbortHandle>,
}

struct Inner {
    config: HeroConfig,
    slide_count: NonZeroUsize,
    services: HeroServices,
    conf_id: RefCell<Option<String>>,
    mounted: RefCell<Option<Mounted>>,
}

/// The hero component: slide rotator, preload gate, announcement loader
/// and ticker wired to one scheduler and one executor.
///
/// Spawned futures and scheduled callbacks only hold weak references, so
/// the banner owns everything it started. [`unmount`](Self::unmount), or
/// dropping the banner, cancels all of it.
pub struct HeroBanner {
    inner: Rc<Inner>,
}

impl HeroBanner {
    pub fn new(config: HeroConfig, services: HeroServices) -> Result<Self, ConfigError> {
        config.validate()?;
        let slide_count = config.slide_count()?;
        let conf_id = config.conf_id.clone();
        Ok(Self {
            inner: Rc::new(Inner {
                config,
                slide_count,
                services,
                conf_id: RefCell::new(conf_id),
                mounted: RefCell::new(None),
            }),
        })
    }

    pub fn config(&self) -> &HeroConfig {
        &self.inner.config
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.borrow().is_some()
    }

    /// Start the slide timer, endpoint resolution and image preloads.
    /// Mounting an already mounted banner does nothing.
    pub fn mount(&self) {
        let inner = &self.inner;
        if inner.mounted.borrow().is_some() {
            return;
        }
        let config = &inner.config;
        let scheduler = &*inner.services.scheduler;

        let mut slides = SlideShow::new(inner.slide_count, config.rotate_interval());
        slides.activate(scheduler);

        let mut gate = PreloadGate::new(config.images.clone());
        let preloads = gate.begin();

        let mut loader = AnnouncementLoader::new(
            config.announcements_path.clone(),
            inner.services.diagnostics.clone(),
        )
        .with_conf_id(inner.conf_id.borrow().clone());
        // The endpoint is still unresolved, so this only reports what is
        // missing and never yields a request.
        loader.refresh();

        *inner.mounted.borrow_mut() = Some(Mounted {
            slides,
            gate,
            loader,
            ticker: Ticker::new(config.scroll_step),
            fetch: None,
            tasks: Vec::new(),
        });
        log::info!(
            "hero banner mounted with {} slides, conf_id {:?}",
            inner.slide_count,
            inner.conf_id.borrow()
        );

        let mut tasks = Vec::with_capacity(preloads.len() + 1);
        tasks.extend(inner.spawn_endpoint());
        for (slot, uri) in preloads {
            tasks.extend(inner.spawn_preload(slot, uri));
        }
        if let Some(mounted) = inner.mounted.borrow_mut().as_mut() {
            mounted.tasks = tasks;
        }
    }

    /// Cancel every timer, frame task and pending future. Idempotent.
    pub fn unmount(&self) {
        let mounted = self.inner.mounted.borrow_mut().take();
        let Some(mut mounted) = mounted else {
            return;
        };
        let scheduler = &*self.inner.services.scheduler;
        mounted.slides.deactivate(scheduler);
        mounted.ticker.stop(scheduler);
        mounted.loader.invalidate();
        if let Some(fetch) = mounted.fetch.take() {
            fetch.abort();
        }
        for task in mounted.tasks.drain(..) {
            task.abort();
        }
        log::info!("hero banner unmounted");
    }

    /// Update the conference id prop. While mounted this refetches when the
    /// value changes; otherwise it is used by the next mount.
    pub fn set_conf_id(&self, conf_id: Option<String>) {
        *self.inner.conf_id.borrow_mut() = conf_id.clone();
        let request = {
            let mut mounted = self.inner.mounted.borrow_mut();
            let Some(mounted) = mounted.as_mut() else {
                return;
            };
            mounted.loader.set_conf_id(conf_id)
        };
        self.inner.inputs_changed(request);
    }

    pub fn next(&self) -> Option<usize> {
        self.inner.with_mounted(|m| m.slides.next())
    }

    pub fn previous(&self) -> Option<usize> {
        self.inner.with_mounted(|m| m.slides.previous())
    }

    /// Jump to slide `index`. Out-of-range indices are reported and ignored.
    pub fn jump_to(&self, index: usize) -> Option<usize> {
        let result = self.inner.with_mounted(|m| m.slides.jump_to(index))?;
        match result {
            Ok(index) => Some(index),
            Err(err) => {
                log::debug!("{err}");
                self.inner.services.diagnostics.report(Diagnostic::InvalidSlide {
                    requested: index,
                    len: self.inner.slide_count.get(),
                });
                None
            }
        }
    }

    /// Route a renderer action to the matching control.
    pub fn apply(&self, action: HeroAction) -> Option<usize> {
        match action {
            HeroAction::Previous => self.previous(),
            HeroAction::Next => self.next(),
            HeroAction::JumpTo(index) => self.jump_to(index),
        }
    }

    /// Ticker geometry measured by the renderer on its latest frame.
    pub fn set_ticker_metrics(&self, metrics: ScrollMetrics) {
        self.inner.with_mounted(|m| m.ticker.set_metrics(metrics));
    }

    pub fn current_slide(&self) -> usize {
        self.inner.with_mounted(|m| m.slides.index()).unwrap_or(0)
    }

    pub fn images_ready(&self) -> bool {
        self.inner
            .with_mounted(|m| m.gate.is_ready())
            .unwrap_or(false)
    }

    /// Number of slide images that failed to preload this mount.
    pub fn image_failures(&self) -> usize {
        self.inner.with_mounted(|m| m.gate.failures()).unwrap_or(0)
    }

    pub fn announcements(&self) -> Vec<AnnouncementItem> {
        self.inner
            .with_mounted(|m| m.loader.items().to_vec())
            .unwrap_or_default()
    }

    /// The request whose response would currently be applied.
    pub fn pending_fetch(&self) -> Option<FetchRequest> {
        self.inner
            .with_mounted(|m| m.loader.pending().cloned())
            .flatten()
    }

    pub fn ticker_offset(&self) -> f32 {
        self.inner.with_mounted(|m| m.ticker.offset()).unwrap_or(0.0)
    }

    pub fn ticker_phase(&self) -> TickerPhase {
        self.inner
            .with_mounted(|m| m.ticker.phase())
            .unwrap_or(TickerPhase::Idle)
    }

    /// View model for the current frame.
    pub fn snapshot(&self) -> HeroSnapshot {
        let config = &self.inner.config;
        let mut snapshot = HeroSnapshot {
            slide: None,
            slide_count: self.inner.slide_count.get(),
            current: 0,
            ticker: TickerView::default(),
            copy: config.copy.clone(),
            links: config.links.clone(),
            organizer: config.organizer.clone(),
        };

        self.inner.with_mounted(|m| {
            let current = m.slides.index();
            snapshot.current = current;
            if m.gate.is_ready() {
                snapshot.slide = config
                    .images
                    .get(current)
                    .map(|uri| SlideView::new(current, uri.as_str()));
            }
            snapshot.ticker = TickerView {
                offset: m.ticker.offset(),
                scrolling: m.ticker.phase() == TickerPhase::Scrolling,
                headlines: m
                    .loader
                    .items()
                    .iter()
                    .filter_map(AnnouncementItem::headline)
                    .map(str::to_owned)
                    .collect(),
            };
        });
        snapshot
    }
}

impl Drop for HeroBanner {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl Inner {
    fn with_mounted<T>(&self, f: impl FnOnce(&mut Mounted) -> T) -> Option<T> {
        self.mounted.borrow_mut().as_mut().map(f)
    }

    /// Spawn `task` as an abortable future.
    fn track(
        &self,
        name: &'static str,
        task: impl Future<Output = ()> + 'static,
    ) -> Option<AbortHandle> {
        let (task, handle) = future::abortable(task);
        match self.services.spawner.spawn_local(task.map(|_| ())) {
            Ok(()) => Some(handle),
            Err(err) => {
                self.services.diagnostics.report(Diagnostic::SpawnFailed {
                    task: name,
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    fn spawn_endpoint(self: &Rc<Self>) -> Option<AbortHandle> {
        let resolve = self.services.endpoint.resolve();
        let inner = Rc::downgrade(self);
        self.track("endpoint resolution", async move {
            let endpoint = resolve.await;
            if let Some(inner) = inner.upgrade() {
                inner.endpoint_resolved(endpoint);
            }
        })
    }

    /// A preload that cannot be spawned settles as failed, so the gate
    /// still opens.
    fn spawn_preload(self: &Rc<Self>, slot: usize, uri: String) -> Option<AbortHandle> {
        let load = self.services.images.load(&uri);
        let inner = Rc::downgrade(self);
        let task_uri = uri.clone();
        let handle = self.track("image preload", async move {
            let outcome = load.await;
            if let Some(inner) = inner.upgrade() {
                inner.preload_settled(slot, task_uri, outcome);
            }
        });
        if handle.is_none() {
            let refused = AssetError::Rejected("preload task was not spawned".into());
            self.preload_settled(slot, uri, Err(refused));
        }
        handle
    }

    fn endpoint_resolved(self: &Rc<Self>, endpoint: Option<String>) {
        log::debug!("endpoint resolved to {endpoint:?}");
        let request = self.with_mounted(|m| m.loader.set_endpoint(endpoint));
        if let Some(request) = request {
            self.inputs_changed(request);
        }
    }

    fn preload_settled(&self, slot: usize, uri: String, outcome: Result<(), AssetError>) {
        let mut mounted = self.mounted.borrow_mut();
        let Some(mounted) = mounted.as_mut() else {
            return;
        };
        if let Err(err) = &outcome {
            self.services.diagnostics.report(Diagnostic::AssetFailed {
                uri,
                reason: err.to_string(),
            });
        }
        if mounted.gate.settle(slot, &outcome) {
            log::info!(
                "slide images ready ({} loaded, {} failed)",
                mounted.gate.loaded(),
                mounted.gate.failures()
            );
        }
    }

    /// Follow up on an input change: start the new request, or abort the
    /// one in flight if the inputs no longer allow any.
    fn inputs_changed(self: &Rc<Self>, request: Option<FetchRequest>) {
        if let Some(request) = request {
            self.issue(request);
            return;
        }
        self.with_mounted(|m| {
            if m.loader.pending().is_none()
                && let Some(fetch) = m.fetch.take()
            {
                fetch.abort();
            }
        });
    }

    fn issue(self: &Rc<Self>, request: FetchRequest) {
        let fetch = self.services.source.fetch(&request);
        let ticket = request.ticket;
        let inner = Rc::downgrade(self);
        let handle = self.track("announcements fetch", async move {
            let outcome = fetch.await;
            if let Some(inner) = inner.upgrade() {
                inner.fetch_finished(ticket, outcome);
            }
        });
        self.with_mounted(|m| {
            if let Some(previous) = std::mem::replace(&mut m.fetch, handle) {
                previous.abort();
            }
        });
    }

    fn fetch_finished(&self, ticket: Ticket, outcome: Result<Vec<u8>, FetchError>) {
        let scheduler = &*self.services.scheduler;
        self.with_mounted(|m| {
            let completion = m.loader.complete(ticket, outcome);
            if completion.changed() {
                m.fetch = None;
                m.ticker.sync(!m.loader.items().is_empty(), scheduler);
            }
        });
    }
}
