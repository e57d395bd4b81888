mod renderer;

use std::fs::File;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;
use conf_hero_core::native::{EnvEndpoint, FsImageLoader, HttpSource};
use conf_hero_core::{FrameClock, HeroBanner, HeroConfig, HeroServices, LogDiagnostics};
use env_logger::{Builder, Target};
use futures::executor::LocalPool;
use log::LevelFilter;

const LOG_FILE: &str = "conf-hero-tui.log";

/// The terminal is in raw mode, so log lines go to a file instead.
fn init_logger() -> Result<()> {
    let file = File::create(std::env::temp_dir().join(LOG_FILE))?;
    let mut builder = Builder::new();
    builder.target(Target::Pipe(Box::new(file)));
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    } else {
        builder
            .filter_level(LevelFilter::Warn)
            .filter_module("conf_hero", LevelFilter::Debug);
    }
    builder.init();
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        eprintln!("Usage: conf-hero-tui [config.json] [asset-root]");
        return Ok(());
    }
    init_logger()?;

    let config = match args.get(1) {
        Some(path) => HeroConfig::load(path)?,
        None => HeroConfig::default(),
    };
    let asset_root = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("public"));

    let mut pool = LocalPool::new();
    let clock = Rc::new(FrameClock::new());
    let services = HeroServices {
        scheduler: clock.clone(),
        spawner: Rc::new(pool.spawner()),
        endpoint: Rc::new(EnvEndpoint::default()),
        source: Rc::new(HttpSource::new()?),
        images: Rc::new(FsImageLoader::new(asset_root)),
        diagnostics: Rc::new(LogDiagnostics),
    };
    let banner = HeroBanner::new(config, services)?;
    banner.mount();

    let result = renderer::run(&banner, &clock, &mut pool);
    banner.unmount();
    result
}
