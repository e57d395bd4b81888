mod app;
#[cfg(not(target_arch = "wasm32"))]
mod desktop;
mod renderer;
mod textures;
mod theme;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::{HeroApp, HeroHost};
#[cfg(not(target_arch = "wasm32"))]
pub use desktop::run_desktop;
pub use renderer::{HeroResponse, cover_uv, render_hero};
pub use textures::SlideTextures;
pub use theme::ThemeMode;

// WASM entry point
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Redirect logs/panics to console
    console_error_panic_hook::set_once();
    web::init_logging(log::LevelFilter::Info);

    let web_options = eframe::WebOptions::default();
    wasm_bindgen_futures::spawn_local(async {
        if let Err(e) = web::run(web_options).await {
            log::error!("failed to start hero banner: {e:?}");
        }
    });
    Ok(())
}
