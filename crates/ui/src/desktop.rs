use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Result, anyhow};
use conf_hero_core::native::{EnvEndpoint, HttpSource};
use conf_hero_core::{FrameClock, HeroBanner, HeroConfig, HeroServices, MemoryDiagnostics};
use futures::executor::LocalPool;

use crate::app::{HeroApp, HeroHost};
use crate::textures::SlideTextures;

/// Open a desktop window showing the banner. `asset_root` stands in for the
/// site root that image URIs are relative to.
pub fn run_desktop(config: HeroConfig, asset_root: PathBuf) -> Result<()> {
    let pool = LocalPool::new();
    let clock = Rc::new(FrameClock::new());
    let diagnostics = Rc::new(MemoryDiagnostics::new());
    // Preloads decode straight into the texture cache.
    let textures = SlideTextures::new(&asset_root, pool.spawner());
    let services = HeroServices {
        scheduler: clock.clone(),
        spawner: Rc::new(pool.spawner()),
        endpoint: Rc::new(EnvEndpoint::default()),
        source: Rc::new(HttpSource::new()?),
        images: Rc::new(textures.clone()),
        diagnostics: diagnostics.clone(),
    };
    let banner = HeroBanner::new(config, services)?;
    log::info!("serving slide images from {}", asset_root.display());

    let host = HeroHost {
        banner,
        clock,
        textures,
        diagnostics,
        pool,
    };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("conf-hero")
            .with_inner_size([1280.0, 820.0]),
        ..Default::default()
    };
    eframe::run_native(
        "conf-hero",
        options,
        Box::new(move |cc| Ok(Box::new(HeroApp::new(cc, host)))),
    )
    .map_err(|e| anyhow!("failed to start eframe: {e}"))
}
