#[cfg(not(target_arch = "wasm32"))]
fn init_logger() {
    use env_logger::{Builder, Target};
    use log::LevelFilter;

    if std::env::var("RUST_LOG").is_ok() {
        env_logger::init();
        return;
    }
    Builder::new()
        .target(Target::Stderr)
        .filter_level(LevelFilter::Warn)
        .filter_module("conf_hero", LevelFilter::Debug)
        .init();
}

/// Usage: `conf-hero [config.json] [asset-root]`
#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use std::path::PathBuf;

    use conf_hero_core::HeroConfig;

    init_logger();

    let args: Vec<String> = std::env::args().collect();
    let config = match args.get(1) {
        Some(path) => HeroConfig::load(path)?,
        None => HeroConfig::default(),
    };
    let asset_root = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("public"));
    conf_hero_ui::run_desktop(config, asset_root)
}

// The browser build starts from `conf_hero_ui::start`.
#[cfg(target_arch = "wasm32")]
fn main() {}
