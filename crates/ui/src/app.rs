use std::rc::Rc;
use std::time::Duration;

use conf_hero_core::{FrameClock, HeroBanner, MemoryDiagnostics};
use conf_hero_protocol::ThemeToken;
use eframe::egui;
use log::Level;

use crate::renderer;
use crate::textures::SlideTextures;
use crate::theme::{self, ThemeMode};

/// Longest step fed to the clock per frame, so a backgrounded tab does not
/// replay a burst of rotations when it comes back.
const MAX_FRAME_STEP: f32 = 0.25;
/// Repaint cadence while nothing animates, so timers and I/O still land.
const IDLE_REPAINT: Duration = Duration::from_millis(100);

/// Everything a platform entry point wires up before the app starts.
pub struct HeroHost {
    pub banner: HeroBanner,
    pub clock: Rc<FrameClock>,
    pub textures: SlideTextures,
    pub diagnostics: Rc<MemoryDiagnostics>,
    /// Native hosts drive spawned futures from the frame loop; the browser
    /// runs them on its own task queue.
    #[cfg(not(target_arch = "wasm32"))]
    pub pool: futures::executor::LocalPool,
}

/// Main application state.
pub struct HeroApp {
    host: HeroHost,
    theme_mode: ThemeMode,
    /// `InputState::time` of the previous frame.
    last_time: Option<f64>,
}

impl HeroApp {
    pub fn new(cc: &eframe::CreationContext<'_>, host: HeroHost) -> Self {
        Self::with_context(&cc.egui_ctx, host)
    }

    fn with_context(ctx: &egui::Context, host: HeroHost) -> Self {
        let theme_mode = ThemeMode::Light;
        ctx.set_visuals(theme_mode.visuals());
        host.banner.mount();
        Self {
            host,
            theme_mode,
            last_time: None,
        }
    }

    /// Seconds since the previous frame, measured from input timestamps.
    /// egui's `stable_dt` falls back to a predicted 1/60 s after idle
    /// frames, which would slow the slide timer down.
    fn frame_step(&mut self, ctx: &egui::Context) -> f32 {
        let now = ctx.input(|i| i.time);
        let dt = self.last_time.map_or(0.0, |last| (now - last) as f32);
        self.last_time = Some(now);
        dt.clamp(0.0, MAX_FRAME_STEP)
    }

    fn pump(&mut self, ctx: &egui::Context) {
        let dt = self.frame_step(ctx);
        self.host.clock.tick(Duration::from_secs_f32(dt));
        #[cfg(not(target_arch = "wasm32"))]
        self.host.pool.run_until_stalled();
    }

    fn open(ctx: &egui::Context, href: &str) {
        log::debug!("opening {href}");
        ctx.open_url(egui::OpenUrl::same_tab(href));
    }

    fn toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("conf-hero");
                ui.separator();

                let theme_label = match self.theme_mode {
                    ThemeMode::Dark => "🌙 Dark",
                    ThemeMode::Light => "☀ Light",
                };
                if ui.button(theme_label).clicked() {
                    self.theme_mode = self.theme_mode.toggled();
                    ctx.set_visuals(self.theme_mode.visuals());
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let banner = &self.host.banner;
                    let diagnostics = &self.host.diagnostics;
                    let errors = diagnostics.count_at(Level::Error);
                    if errors > 0 {
                        ui.colored_label(egui::Color32::RED, format!("{errors} errors"));
                    }
                    let failures = banner.image_failures();
                    if failures > 0 {
                        ui.label(format!("{failures} images missing"));
                    }
                    ui.label(format!("{} announcements", banner.announcements().len()));
                    ui.label(format!(
                        "Slide {}/{}",
                        banner.current_slide() + 1,
                        banner.config().images.len()
                    ));
                });
            });
        });
    }
}

impl eframe::App for HeroApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pump(ctx);
        self.toolbar(ctx);

        let snapshot = self.host.banner.snapshot();
        let frame = egui::Frame::NONE.fill(theme::resolve(ThemeToken::Background, self.theme_mode));
        let response = egui::CentralPanel::default()
            .frame(frame)
            .show(ctx, |ui| {
                renderer::render_hero(ui, &snapshot, &self.host.textures, self.theme_mode)
            })
            .inner;

        let banner = &self.host.banner;
        if let Some(action) = response.action {
            banner.apply(action);
        }
        banner.set_ticker_metrics(response.ticker);
        if let Some(href) = response.open {
            Self::open(ctx, &href);
        }

        if snapshot.ticker.scrolling {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(IDLE_REPAINT);
        }
    }
}
