use conf_hero_protocol::{HeroAction, HeroSnapshot, ScrollMetrics, ThemeToken, TickerView};
use egui::{Align2, Color32, CornerRadius, FontId, Pos2, Rect, Sense, Stroke, StrokeKind, Vec2, pos2, vec2};

use crate::textures::SlideTextures;
use crate::theme::{self, ThemeMode};

const TICKER_HEIGHT: f32 = 34.0;
const TICKER_PADDING: f32 = 12.0;
const TICKER_SEPARATOR: &str = "     •     ";
const ARROW_RADIUS: f32 = 16.0;
const DOT_RADIUS: f32 = 4.0;
const DOT_SPACING: f32 = 16.0;

/// What the user did this frame, plus geometry the component needs back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeroResponse {
    pub action: Option<HeroAction>,
    pub ticker: ScrollMetrics,
    /// Href of a clicked call-to-action.
    pub open: Option<String>,
}

/// Draw the whole banner into the remaining space of `ui`.
pub fn render_hero(
    ui: &mut egui::Ui,
    snapshot: &HeroSnapshot,
    textures: &SlideTextures,
    mode: ThemeMode,
) -> HeroResponse {
    let mut response = HeroResponse::default();
    let available = ui.available_rect_before_wrap();
    let hero_height = (available.height() * 0.7).max(240.0);
    let hero_rect = Rect::from_min_size(available.min, vec2(available.width(), hero_height));
    let ticker_rect = Rect::from_min_size(
        pos2(available.left(), hero_rect.bottom()),
        vec2(available.width(), TICKER_HEIGHT),
    );
    let links_rect = Rect::from_min_max(pos2(available.left(), ticker_rect.bottom()), available.max);

    ui.allocate_rect(available, Sense::hover());

    render_slide(ui, hero_rect, snapshot, textures, mode);
    if let Some(href) = render_copy(ui, hero_rect, snapshot, mode) {
        response.open = Some(href);
    }
    response.action = render_controls(ui, hero_rect, snapshot, mode);
    response.ticker = render_ticker(ui, ticker_rect, &snapshot.ticker, mode);
    if let Some(href) = render_links(ui, links_rect, snapshot, mode) {
        response.open = Some(href);
    }
    response
}

/// UV rect that crops an image to fill `frame` without distortion.
pub fn cover_uv(image: Vec2, frame: Vec2) -> Rect {
    let full = Rect::from_min_max(Pos2::ZERO, pos2(1.0, 1.0));
    if image.x <= 0.0 || image.y <= 0.0 || frame.x <= 0.0 || frame.y <= 0.0 {
        return full;
    }
    let image_aspect = image.x / image.y;
    let frame_aspect = frame.x / frame.y;
    if image_aspect > frame_aspect {
        let inset = (1.0 - frame_aspect / image_aspect) / 2.0;
        Rect::from_min_max(pos2(inset, 0.0), pos2(1.0 - inset, 1.0))
    } else {
        let inset = (1.0 - image_aspect / frame_aspect) / 2.0;
        Rect::from_min_max(pos2(0.0, inset), pos2(1.0, 1.0 - inset))
    }
}

fn render_slide(
    ui: &egui::Ui,
    rect: Rect,
    snapshot: &HeroSnapshot,
    textures: &SlideTextures,
    mode: ThemeMode,
) {
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, CornerRadius::same(8), theme::resolve(ThemeToken::SlidePlaceholder, mode));

    // Nothing is shown until every image has been preloaded.
    let Some(slide) = &snapshot.slide else {
        return;
    };
    match textures.texture(ui.ctx(), &slide.uri) {
        Some(texture) => {
            let uv = cover_uv(texture.size_vec2(), rect.size());
            painter.image(texture.id(), rect, uv, Color32::WHITE);
        }
        None => {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                &slide.alt,
                FontId::proportional(16.0),
                theme::resolve(ThemeToken::CopyBody, mode),
            );
        }
    }
}

fn render_copy(ui: &mut egui::Ui, hero: Rect, snapshot: &HeroSnapshot, mode: ThemeMode) -> Option<String> {
    let size = vec2((hero.width() * 0.45).clamp(260.0, 450.0), (hero.height() * 0.7).min(330.0));
    let rect = Rect::from_min_size(
        pos2(hero.left() + 24.0, hero.center().y - size.y / 2.0),
        size,
    );
    let painter = ui.painter_at(hero);
    painter.rect_filled(rect, CornerRadius::same(8), theme::resolve(ThemeToken::CopyBoxFill, mode));
    painter.rect_stroke(
        rect,
        CornerRadius::same(8),
        Stroke::new(1.0, Color32::from_white_alpha(26)),
        StrokeKind::Inside,
    );

    let copy = &snapshot.copy;
    let inner = rect.shrink2(vec2(28.0, 24.0));
    let mut clicked = None;
    ui.scope_builder(egui::UiBuilder::new().max_rect(inner), |ui| {
        ui.add_space((inner.height() - 220.0).max(0.0) / 2.0);
        ui.label(
            egui::RichText::new(&copy.title)
                .size(28.0)
                .color(theme::resolve(ThemeToken::CopyTitle, mode)),
        );
        ui.add_space(12.0);
        ui.label(
            egui::RichText::new(&copy.subtitle)
                .size(15.0)
                .color(theme::resolve(ThemeToken::CopyBody, mode)),
        );
        ui.add_space(16.0);
        let button = egui::Button::new(
            egui::RichText::new(&copy.register.label)
                .size(15.0)
                .color(theme::resolve(ThemeToken::ButtonText, mode)),
        )
        .fill(theme::resolve(ThemeToken::ButtonFill, mode));
        if ui.add(button).on_hover_text(&copy.register.href).clicked() {
            clicked = Some(copy.register.href.clone());
        }
    });
    clicked
}

fn render_controls(
    ui: &mut egui::Ui,
    hero: Rect,
    snapshot: &HeroSnapshot,
    mode: ThemeMode,
) -> Option<HeroAction> {
    let painter = ui.painter_at(hero);
    let mut action = None;

    let baseline = hero.bottom() - 28.0;
    let next_center = pos2(hero.right() - 28.0, baseline);
    let previous_center = next_center - vec2(ARROW_RADIUS * 2.0 + 12.0, 0.0);
    for (center, candidate, pointing) in [
        (previous_center, HeroAction::Previous, -1.0),
        (next_center, HeroAction::Next, 1.0),
    ] {
        let rect = Rect::from_center_size(center, Vec2::splat(ARROW_RADIUS * 2.0));
        let response = ui
            .interact(rect, ui.id().with(candidate), Sense::click())
            .on_hover_text(candidate.label());
        let mut fill = theme::resolve(ThemeToken::ArrowFill, mode);
        if response.hovered() {
            fill = Color32::from_black_alpha(fill.a().saturating_add(30));
        }
        painter.circle_filled(center, ARROW_RADIUS, fill);
        let stroke = Stroke::new(2.0, theme::resolve(ThemeToken::ArrowIcon, mode));
        let tip = center + vec2(4.0 * pointing, 0.0);
        let back = center - vec2(3.0 * pointing, 0.0);
        painter.line_segment([back + vec2(0.0, -6.0), tip], stroke);
        painter.line_segment([back + vec2(0.0, 6.0), tip], stroke);
        if response.clicked() {
            action = Some(candidate);
        }
    }

    let count = snapshot.slide_count;
    let row_width = DOT_SPACING * count.saturating_sub(1) as f32;
    let first = pos2(hero.center().x - row_width / 2.0, baseline);
    for index in 0..count {
        let center = first + vec2(DOT_SPACING * index as f32, 0.0);
        let rect = Rect::from_center_size(center, Vec2::splat(DOT_SPACING));
        let candidate = HeroAction::JumpTo(index);
        let response = ui
            .interact(rect, ui.id().with(candidate), Sense::click())
            .on_hover_text(HeroSnapshot::dot_label(index));
        let token = if index == snapshot.current {
            ThemeToken::DotActive
        } else {
            ThemeToken::DotInactive
        };
        painter.circle_filled(center, DOT_RADIUS, theme::resolve(token, mode));
        if response.clicked() {
            action = Some(candidate);
        }
    }
    action
}

/// Draw the scrolling strip. Returns the measured viewport and content widths.
fn render_ticker(ui: &egui::Ui, rect: Rect, ticker: &TickerView, mode: ThemeMode) -> ScrollMetrics {
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, CornerRadius::ZERO, theme::resolve(ThemeToken::TickerBackground, mode));
    painter.line_segment(
        [rect.left_top(), rect.right_top()],
        Stroke::new(1.0, theme::resolve(ThemeToken::TickerBorder, mode)),
    );
    if ticker.headlines.is_empty() {
        return ScrollMetrics::new(rect.width(), 0.0);
    }

    let galley = painter.layout_no_wrap(
        ticker.headlines.join(TICKER_SEPARATOR),
        FontId::proportional(14.0),
        theme::resolve(ThemeToken::TickerText, mode),
    );
    let content = galley.size().x + TICKER_PADDING * 2.0;
    let pos = pos2(
        rect.left() + TICKER_PADDING - ticker.offset,
        rect.center().y - galley.size().y / 2.0,
    );
    painter.galley(pos, galley, theme::resolve(ThemeToken::TickerText, mode));
    ScrollMetrics::new(rect.width(), content)
}

fn render_links(ui: &mut egui::Ui, rect: Rect, snapshot: &HeroSnapshot, mode: ThemeMode) -> Option<String> {
    ui.painter_at(rect)
        .rect_filled(rect, CornerRadius::ZERO, theme::resolve(ThemeToken::LinkBarBackground, mode));

    let mut clicked = None;
    ui.scope_builder(egui::UiBuilder::new().max_rect(rect.shrink(16.0)), |ui| {
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new(&snapshot.organizer)
                    .size(13.0)
                    .color(theme::resolve(ThemeToken::LinkBarText, mode)),
            );
            ui.add_space(12.0);
            ui.horizontal_wrapped(|ui| {
                ui.spacing_mut().item_spacing.x = 24.0;
                for link in &snapshot.links {
                    let button = egui::Button::new(
                        egui::RichText::new(&link.label)
                            .strong()
                            .color(theme::resolve(ThemeToken::LinkText, mode)),
                    )
                    .fill(theme::resolve(ThemeToken::LinkFill, mode))
                    .stroke(Stroke::new(1.0, theme::resolve(ThemeToken::Border, mode)));
                    if ui.add(button).on_hover_text(&link.href).clicked() {
                        clicked = Some(link.href.clone());
                    }
                }
            });
        });
    });
    clicked
}
