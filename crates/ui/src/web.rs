//! Browser implementations of the banner's host services.

use std::cell::RefCell;
use std::rc::Rc;

use conf_hero_core::{
    AnnouncementSource, AssetError, EndpointResolver, FetchError, FetchRequest, FrameClock,
    HeroBanner, HeroConfig, HeroServices, ImageLoader, MemoryDiagnostics,
};
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture};
use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::app::{HeroApp, HeroHost};
use crate::textures::SlideTextures;

pub const CANVAS_ID: &str = "conf_hero_canvas";
const API_URL_ATTRIBUTE: &str = "data-api-url";
const CONF_ID_ATTRIBUTE: &str = "data-conf-id";

fn js_error(value: JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Runs futures on the browser's microtask queue.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}

pub async fn fetch_bytes(url: &str, with_credentials: bool) -> Result<Vec<u8>, FetchError> {
    let transport = |e: JsValue| FetchError::Transport(js_error(e));

    let window = web_sys::window().ok_or_else(|| FetchError::Transport("no window".into()))?;
    let init = web_sys::RequestInit::new();
    init.set_method("GET");
    if with_credentials {
        init.set_credentials(web_sys::RequestCredentials::Include);
    }
    let request = web_sys::Request::new_with_str_and_init(url, &init).map_err(transport)?;
    let response: web_sys::Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(transport)?
        .dyn_into()
        .map_err(|_| FetchError::Transport("not a Response".into()))?;
    if !response.ok() {
        return Err(FetchError::Status(response.status()));
    }
    let buffer = JsFuture::from(response.array_buffer().map_err(transport)?)
        .await
        .map_err(transport)?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// Announcements through `window.fetch`, sending cookies when asked.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserSource;

impl AnnouncementSource for BrowserSource {
    fn fetch(&self, request: &FetchRequest) -> LocalBoxFuture<'static, Result<Vec<u8>, FetchError>> {
        let url = request.url.clone();
        let with_credentials = request.with_credentials;
        async move { fetch_bytes(&url, with_credentials).await }.boxed_local()
    }
}

/// An `<img>` being loaded. Detaches its handlers when dropped so an
/// aborted preload never calls into freed closures.
struct PendingImage {
    element: web_sys::HtmlImageElement,
    _on_load: Closure<dyn FnMut()>,
    _on_error: Closure<dyn FnMut()>,
}

impl Drop for PendingImage {
    fn drop(&mut self) {
        self.element.set_onload(None);
        self.element.set_onerror(None);
    }
}

type Settler = Rc<RefCell<Option<oneshot::Sender<Result<(), AssetError>>>>>;

/// First of onload/onerror wins.
fn settle(tx: &Settler, outcome: Result<(), AssetError>) {
    if let Some(tx) = tx.borrow_mut().take() {
        let _ = tx.send(outcome);
    }
}

/// Preloads through detached `HtmlImageElement`s, which fills the browser
/// cache for the textures fetched later.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlImageLoader;

impl ImageLoader for HtmlImageLoader {
    fn load(&self, uri: &str) -> LocalBoxFuture<'static, Result<(), AssetError>> {
        let element = match web_sys::HtmlImageElement::new() {
            Ok(element) => element,
            Err(err) => return future::ready(Err(AssetError::Rejected(js_error(err)))).boxed_local(),
        };

        let (tx, rx) = oneshot::channel();
        let tx: Settler = Rc::new(RefCell::new(Some(tx)));
        let on_load = {
            let tx = tx.clone();
            Closure::<dyn FnMut()>::new(move || settle(&tx, Ok(())))
        };
        let failed = format!("could not load {uri}");
        let on_error =
            Closure::<dyn FnMut()>::new(move || settle(&tx, Err(AssetError::Rejected(failed.clone()))));
        element.set_onload(Some(on_load.as_ref().unchecked_ref()));
        element.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        element.set_src(uri);

        let pending = PendingImage {
            element,
            _on_load: on_load,
            _on_error: on_error,
        };
        async move {
            let outcome = rx
                .await
                .unwrap_or_else(|_| Err(AssetError::Rejected("image element dropped".into())));
            drop(pending);
            outcome
        }
        .boxed_local()
    }
}

/// Base URL from the canvas `data-api-url` attribute, else the page origin.
#[derive(Debug, Clone, Default)]
pub struct PageEndpoint {
    configured: Option<String>,
}

impl PageEndpoint {
    pub fn from_element(element: &web_sys::Element) -> Self {
        Self {
            configured: element
                .get_attribute(API_URL_ATTRIBUTE)
                .filter(|value| !value.trim().is_empty()),
        }
    }
}

impl EndpointResolver for PageEndpoint {
    fn resolve(&self) -> LocalBoxFuture<'static, Option<String>> {
        let base = self.configured.clone().or_else(|| {
            web_sys::window()
                .and_then(|w| w.location().origin().ok())
                .filter(|origin| origin != "null")
        });
        future::ready(base).boxed_local()
    }
}

/// `log` backend writing to the browser console.
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

pub fn init_logging(level: log::LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// Mount the banner on the page canvas.
pub async fn run(web_options: eframe::WebOptions) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas = document
        .get_element_by_id(CANVAS_ID)
        .ok_or_else(|| JsValue::from_str(&format!("no canvas element with id '{CANVAS_ID}'")))?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str("element is not a canvas"))?;

    let config = HeroConfig {
        conf_id: canvas
            .get_attribute(CONF_ID_ATTRIBUTE)
            .filter(|value| !value.trim().is_empty()),
        ..HeroConfig::default()
    };

    let clock = Rc::new(FrameClock::new());
    let diagnostics = Rc::new(MemoryDiagnostics::new());
    let services = HeroServices {
        scheduler: clock.clone(),
        spawner: Rc::new(BrowserSpawner),
        endpoint: Rc::new(PageEndpoint::from_element(&canvas)),
        source: Rc::new(BrowserSource),
        images: Rc::new(HtmlImageLoader),
        diagnostics: diagnostics.clone(),
    };
    let banner = HeroBanner::new(config, services).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let host = HeroHost {
        banner,
        clock,
        textures: SlideTextures::new(),
        diagnostics,
    };

    eframe::WebRunner::new()
        .start(
            canvas,
            web_options,
            Box::new(move |cc| Ok(Box::new(HeroApp::new(cc, host)))),
        )
        .await
}
