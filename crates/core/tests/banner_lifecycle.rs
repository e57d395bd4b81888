//! Integration tests: drive a mounted `HeroBanner` through endpoint
//! resolution, preloads, fetches and teardown with a manual clock and a
//! single-threaded executor.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use conf_hero_core::announcements::FetchRequest;
use conf_hero_core::ticker::TickerPhase;
use conf_hero_core::{
    AnnouncementSource, AssetError, Diagnostic, EndpointResolver, FetchError, FrameClock,
    HeroBanner, HeroConfig, HeroServices, ImageLoader, MemoryDiagnostics,
};
use conf_hero_protocol::{HeroAction, ScrollMetrics};
use futures::FutureExt;
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::LocalBoxFuture;
use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};
use log::Level;

type Reply = Result<Vec<u8>, FetchError>;

/// Endpoint whose resolution the test completes by hand.
#[derive(Default)]
struct ManualEndpoint {
    calls: Cell<usize>,
    reply: RefCell<Option<oneshot::Sender<Option<String>>>>,
}

impl ManualEndpoint {
    fn resolve_to(&self, base: Option<&str>) {
        if let Some(tx) = self.reply.borrow_mut().take() {
            let _ = tx.send(base.map(str::to_owned));
        }
    }
}

impl EndpointResolver for ManualEndpoint {
    fn resolve(&self) -> LocalBoxFuture<'static, Option<String>> {
        let (tx, rx) = oneshot::channel();
        self.calls.set(self.calls.get() + 1);
        *self.reply.borrow_mut() = Some(tx);
        rx.map(|r| r.ok().flatten()).boxed_local()
    }
}

/// Announcement source that records requests and answers on demand.
#[derive(Default)]
struct ManualSource {
    requests: RefCell<Vec<(FetchRequest, Option<oneshot::Sender<Reply>>)>>,
}

impl ManualSource {
    fn count(&self) -> usize {
        self.requests.borrow().len()
    }

    fn url(&self, n: usize) -> String {
        self.requests.borrow()[n].0.url.clone()
    }

    /// Answer the `n`th request. Returns whether anyone was still listening.
    fn answer(&self, n: usize, reply: Reply) -> bool {
        let tx = self.requests.borrow_mut()[n].1.take();
        tx.is_some_and(|tx| tx.send(reply).is_ok())
    }

    /// Whether the future for the `n`th request has been dropped.
    fn abandoned(&self, n: usize) -> bool {
        self.requests.borrow()[n]
            .1
            .as_ref()
            .is_none_or(oneshot::Sender::is_canceled)
    }
}

impl AnnouncementSource for ManualSource {
    fn fetch(&self, request: &FetchRequest) -> LocalBoxFuture<'static, Reply> {
        let (tx, rx) = oneshot::channel();
        self.requests.borrow_mut().push((request.clone(), Some(tx)));
        rx.map(|r| r.unwrap_or_else(|_| Err(FetchError::Transport("dropped".into()))))
            .boxed_local()
    }
}

/// Image loader settled per URI by the test.
#[derive(Default)]
struct ManualImages {
    loads: RefCell<Vec<(String, Option<oneshot::Sender<Result<(), AssetError>>>)>>,
}

impl ManualImages {
    fn settle(&self, uri: &str, outcome: Result<(), AssetError>) {
        let mut loads = self.loads.borrow_mut();
        if let Some((_, tx)) = loads.iter_mut().find(|(u, tx)| u == uri && tx.is_some())
            && let Some(tx) = tx.take()
        {
            let _ = tx.send(outcome);
        }
    }

    fn settle_all(&self) {
        let uris: Vec<String> = self.loads.borrow().iter().map(|(u, _)| u.clone()).collect();
        for uri in uris {
            self.settle(&uri, Ok(()));
        }
    }
}

impl ImageLoader for ManualImages {
    fn load(&self, uri: &str) -> LocalBoxFuture<'static, Result<(), AssetError>> {
        let (tx, rx) = oneshot::channel();
        self.loads.borrow_mut().push((uri.to_owned(), Some(tx)));
        rx.map(|r| r.unwrap_or(Err(AssetError::Rejected("dropped".into()))))
            .boxed_local()
    }
}

struct Harness {
    pool: LocalPool,
    clock: Rc<FrameClock>,
    endpoint: Rc<ManualEndpoint>,
    source: Rc<ManualSource>,
    images: Rc<ManualImages>,
    diagnostics: Rc<MemoryDiagnostics>,
    banner: HeroBanner,
}

impl Harness {
    fn new(conf_id: Option<&str>) -> Self {
        let config = HeroConfig {
            conf_id: conf_id.map(str::to_owned),
            ..HeroConfig::default()
        };
        let pool = LocalPool::new();
        let clock = Rc::new(FrameClock::new());
        let endpoint = Rc::new(ManualEndpoint::default());
        let source = Rc::new(ManualSource::default());
        let images = Rc::new(ManualImages::default());
        let diagnostics = Rc::new(MemoryDiagnostics::new());
        let services = HeroServices {
            scheduler: clock.clone(),
            spawner: Rc::new(pool.spawner()),
            endpoint: endpoint.clone(),
            source: source.clone(),
            images: images.clone(),
            diagnostics: diagnostics.clone(),
        };
        let banner = HeroBanner::new(config, services).unwrap();
        Self {
            pool,
            clock,
            endpoint,
            source,
            images,
            diagnostics,
            banner,
        }
    }

    fn run(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Mount and resolve the endpoint.
    fn mount_resolved(&mut self) {
        self.banner.mount();
        self.run();
        self.endpoint.resolve_to(Some("https://api.example.org"));
        self.run();
    }
}

fn body(sequences: &[u32]) -> Reply {
    let items: Vec<_> = sequences
        .iter()
        .map(|s| serde_json::json!({ "sequence": s, "title": format!("news {s}") }))
        .collect();
    Ok(serde_json::to_vec(&items).unwrap())
}

fn sequences(banner: &HeroBanner) -> Vec<f64> {
    banner.announcements().iter().map(|i| i.sequence).collect()
}

#[test]
fn slide_hidden_until_every_image_settles() {
    let mut h = Harness::new(None);
    h.banner.mount();
    h.run();
    assert!(h.banner.snapshot().slide.is_none());

    for n in 1..=4 {
        h.images.settle(&format!("/heroImages/hero{n}.jpg"), Ok(()));
    }
    h.run();
    assert!(!h.banner.images_ready());
    assert!(h.banner.snapshot().slide.is_none());

    h.images.settle("/heroImages/hero5.jpg", Err(AssetError::NotFound));
    h.run();
    assert!(h.banner.images_ready());
    assert_eq!(h.banner.image_failures(), 1);

    let slide = h.banner.snapshot().slide.unwrap();
    assert_eq!(slide.index, 0);
    assert_eq!(slide.uri, "/heroImages/hero1.jpg");
    assert_eq!(slide.alt, "Conference image 1");
    assert!(h.diagnostics.entries().iter().any(|d| matches!(
        d,
        Diagnostic::AssetFailed { uri, .. } if uri == "/heroImages/hero5.jpg"
    )));
}

#[test]
fn rotates_on_the_timer_and_by_hand() {
    let mut h = Harness::new(None);
    h.banner.mount();
    h.images.settle_all();
    h.run();

    h.clock.advance(Duration::from_millis(4000));
    assert_eq!(h.banner.current_slide(), 1);
    assert_eq!(h.banner.apply(HeroAction::Previous), Some(0));
    assert_eq!(h.banner.apply(HeroAction::Previous), Some(4));
    assert_eq!(h.banner.apply(HeroAction::JumpTo(2)), Some(2));
    assert_eq!(h.banner.snapshot().slide.unwrap().uri, "/heroImages/hero3.jpg");

    h.clock.advance(Duration::from_millis(4000 * 3));
    assert_eq!(h.banner.current_slide(), 0);
}

#[test]
fn out_of_range_jump_is_reported_and_ignored() {
    let mut h = Harness::new(None);
    h.banner.mount();
    h.run();
    h.banner.jump_to(1);
    assert_eq!(h.banner.jump_to(5), None);
    assert_eq!(h.banner.current_slide(), 1);
    assert_eq!(
        h.diagnostics.entries().last(),
        Some(&Diagnostic::InvalidSlide {
            requested: 5,
            len: 5
        })
    );
}

#[test]
fn one_request_once_endpoint_and_conf_id_exist() {
    let mut h = Harness::new(Some("X"));
    h.banner.mount();
    h.run();
    assert_eq!(h.source.count(), 0);
    assert_eq!(h.endpoint.calls.get(), 1);

    h.endpoint.resolve_to(Some("https://api.example.org/"));
    h.run();
    assert_eq!(h.source.count(), 1);
    assert_eq!(
        h.source.url(0),
        "https://api.example.org/conferencemodule/announcements/conf/X"
    );

    // Re-sending the same prop is not a change.
    h.banner.set_conf_id(Some("X".into()));
    h.run();
    assert_eq!(h.source.count(), 1);
}

#[test]
fn no_request_without_conf_id() {
    let mut h = Harness::new(None);
    h.mount_resolved();
    assert_eq!(h.source.count(), 0);
    assert!(h.diagnostics.count_at(Level::Warn) >= 1);
    assert!(h.banner.announcements().is_empty());
}

#[test]
fn stores_sorted_announcements_and_scrolls() {
    let mut h = Harness::new(Some("X"));
    h.mount_resolved();
    assert_eq!(h.banner.ticker_phase(), TickerPhase::Idle);

    assert!(h.source.answer(0, body(&[3, 1, 2])));
    h.run();
    assert_eq!(sequences(&h.banner), vec![1.0, 2.0, 3.0]);
    assert_eq!(h.banner.ticker_phase(), TickerPhase::Scrolling);

    h.banner.set_ticker_metrics(ScrollMetrics::new(100.0, 1000.0));
    for _ in 0..4 {
        h.clock.frame();
    }
    let snapshot = h.banner.snapshot();
    assert_eq!(snapshot.ticker.offset, 2.0);
    assert!(snapshot.ticker.scrolling);
    assert_eq!(snapshot.ticker.headlines, vec!["news 1", "news 2", "news 3"]);
}

#[test]
fn failure_clears_list_and_stops_ticker() {
    let mut h = Harness::new(Some("X"));
    h.mount_resolved();
    h.source.answer(0, body(&[1, 2]));
    h.run();
    assert_eq!(h.banner.announcements().len(), 2);

    h.banner.set_conf_id(Some("Z".into()));
    h.run();
    assert_eq!(h.source.count(), 2);
    h.source.answer(1, Err(FetchError::Status(503)));
    h.run();

    assert!(h.banner.announcements().is_empty());
    assert_eq!(h.banner.ticker_phase(), TickerPhase::Idle);
    assert_eq!(h.diagnostics.count_at(Level::Error), 1);
    // Only the slide timer is left.
    assert_eq!(h.clock.pending(), 1);
}

#[test]
fn superseded_request_never_lands() {
    let mut h = Harness::new(Some("A"));
    h.mount_resolved();
    h.banner.set_conf_id(Some("B".into()));
    h.run();
    assert_eq!(h.source.count(), 2);
    assert!(h.source.url(1).ends_with("/conf/B"));

    // The A future was aborted when B was issued.
    assert!(h.source.abandoned(0));
    assert!(!h.source.answer(0, body(&[1, 2, 3])));

    h.source.answer(1, body(&[9]));
    h.run();
    assert_eq!(sequences(&h.banner), vec![9.0]);
}

#[test]
fn late_answer_to_superseded_request_is_dropped() {
    let mut h = Harness::new(Some("A"));
    h.mount_resolved();
    h.banner.set_conf_id(Some("B".into()));

    // Answer both before the executor gets a chance to run: B first, A last.
    h.source.answer(1, body(&[9]));
    h.source.answer(0, body(&[1, 2, 3]));
    h.run();
    assert_eq!(sequences(&h.banner), vec![9.0]);
    assert_eq!(h.banner.pending_fetch(), None);
}

#[test]
fn clearing_conf_id_abandons_the_request() {
    let mut h = Harness::new(Some("A"));
    h.mount_resolved();
    h.banner.set_conf_id(None);
    h.run();
    assert!(h.source.abandoned(0));
    assert_eq!(h.banner.pending_fetch(), None);
}

#[test]
fn unmount_leaves_nothing_running() {
    let mut h = Harness::new(Some("X"));
    h.mount_resolved();
    h.images.settle_all();
    h.source.answer(0, body(&[1]));
    h.run();
    h.banner.set_conf_id(Some("Y".into()));
    h.run();
    assert_eq!(h.clock.pending(), 2);
    assert_eq!(h.source.count(), 2);

    h.banner.unmount();
    assert!(!h.banner.is_mounted());
    assert_eq!(h.clock.pending(), 0);

    let diagnostics_before = h.diagnostics.len();
    h.run();
    assert!(h.source.abandoned(1));
    assert!(!h.source.answer(1, body(&[5])));
    assert_eq!(h.clock.tick(Duration::from_secs(60)), 0);
    h.run();

    assert_eq!(h.source.count(), 2);
    assert_eq!(h.diagnostics.len(), diagnostics_before);
    assert!(h.banner.announcements().is_empty());
    assert!(h.banner.snapshot().slide.is_none());
    // Unmounting twice is harmless.
    h.banner.unmount();
}

#[test]
fn remount_starts_from_scratch() {
    let mut h = Harness::new(Some("X"));
    h.mount_resolved();
    h.images.settle_all();
    h.run();
    h.banner.jump_to(3);

    h.banner.unmount();
    h.banner.mount();
    h.banner.mount();
    h.run();

    assert_eq!(h.banner.current_slide(), 0);
    assert!(!h.banner.images_ready());
    assert_eq!(h.endpoint.calls.get(), 2);
    assert_eq!(h.clock.pending(), 1);

    h.endpoint.resolve_to(Some("https://api.example.org"));
    h.run();
    assert_eq!(h.source.count(), 2);
}

#[test]
fn conf_id_set_while_unmounted_applies_on_mount() {
    let mut h = Harness::new(None);
    h.banner.set_conf_id(Some("later".into()));
    assert_eq!(h.source.count(), 0);
    h.mount_resolved();
    assert_eq!(h.source.count(), 1);
    assert!(h.source.url(0).ends_with("/conf/later"));
}

#[test]
fn dropping_the_banner_cancels_its_tasks() {
    let mut h = Harness::new(Some("X"));
    h.mount_resolved();
    h.source.answer(0, body(&[1]));
    h.run();
    assert_eq!(h.clock.pending(), 2);

    let Harness {
        banner, clock, ..
    } = h;
    drop(banner);
    assert_eq!(clock.pending(), 0);
}

/// Executor that has already shut down.
struct RefusingSpawner;

impl LocalSpawn for RefusingSpawner {
    fn spawn_local_obj(&self, _future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        Err(SpawnError::shutdown())
    }
}

#[test]
fn refused_preloads_still_open_the_gate() {
    let config = HeroConfig::default();
    let slides = config.images.len();
    let clock = Rc::new(FrameClock::new());
    let diagnostics = Rc::new(MemoryDiagnostics::new());
    let services = HeroServices {
        scheduler: clock.clone(),
        spawner: Rc::new(RefusingSpawner),
        endpoint: Rc::new(ManualEndpoint::default()),
        source: Rc::new(ManualSource::default()),
        images: Rc::new(ManualImages::default()),
        diagnostics: diagnostics.clone(),
    };
    let banner = HeroBanner::new(config, services).unwrap();
    banner.mount();

    assert!(banner.images_ready());
    assert_eq!(banner.image_failures(), slides);
    assert!(banner.snapshot().slide.is_some());
    let refused = diagnostics
        .entries()
        .into_iter()
        .filter(|d| matches!(d, Diagnostic::SpawnFailed { .. }))
        .count();
    assert_eq!(refused, slides + 1);
}
