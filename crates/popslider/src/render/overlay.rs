use std::time::Instant;

use eframe::egui::{self, FontId, Pos2, Sense};

use crate::carousel::{Carousel, Direction};
use crate::controller::PopupUiState;
use crate::render::image_cache::ImageCache;
use crate::render::slide;
use crate::theme::Theme;

const PANEL_MAX_WIDTH: f32 = 960.0;
const PANEL_MAX_HEIGHT: f32 = 680.0;
const PANEL_PADDING: f32 = 28.0;
const PAGINATION_HEIGHT: f32 = 36.0;
const DOT_RADIUS: f32 = 5.0;
const DOT_SPACING: f32 = 20.0;
const BANNER_HEIGHT: f32 = 36.0;

/// What the user asked for this frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OverlayResponse {
    pub close: bool,
    pub navigate: Option<Direction>,
    pub go_to: Option<usize>,
}

/// Draw the popup over the whole window: backdrop, panel, current slide,
/// arrows, pagination dots and the error banner.
pub fn show(
    ui: &mut egui::Ui,
    state: &PopupUiState,
    carousel: &Carousel,
    fetching: bool,
    theme: &Theme,
    images: &ImageCache,
    now: Instant,
) -> OverlayResponse {
    let mut response = OverlayResponse::default();
    let screen = ui.max_rect();

    if !state.is_open {
        if let Some(message) = state.fetch_error.as_deref() {
            draw_error_banner(ui, message, screen, theme);
        }
        return response;
    }

    let backdrop = ui.interact(screen, ui.id().with("backdrop"), Sense::click());
    ui.painter().rect_filled(screen, 0.0, theme.backdrop);

    // The panel sits below the banner so the message stays readable
    let available = match state.fetch_error.as_deref() {
        Some(message) => {
            let banner = draw_error_banner(ui, message, screen, theme);
            egui::Rect::from_min_max(Pos2::new(screen.left(), banner.bottom()), screen.right_bottom())
        }
        None => screen,
    };
    let panel = panel_rect(available);

    // Swallow clicks that land on the panel itself
    ui.interact(panel, ui.id().with("panel"), Sense::click());
    ui.painter()
        .rect_filled(panel, 12.0, theme.panel_background);

    if backdrop.clicked() {
        if let Some(pos) = backdrop.interact_pointer_pos() {
            if is_backdrop_click(pos, panel) {
                response.close = true;
            }
        }
    }

    let close_size = theme.control_size;
    let close_rect = egui::Rect::from_min_size(
        Pos2::new(panel.right() - close_size - 8.0, panel.top() + 6.0),
        egui::vec2(close_size, close_size),
    );
    let close = ui.put(
        close_rect,
        egui::Button::new(
            egui::RichText::new("\u{00D7}")
                .size(theme.control_size)
                .color(theme.foreground),
        )
        .frame(false),
    );
    if close.on_hover_text("Close").clicked() {
        response.close = true;
    }

    let content = panel.shrink(PANEL_PADDING);
    let viewport = egui::Rect::from_min_max(
        Pos2::new(content.left(), content.top() + close_size * 0.5),
        Pos2::new(content.right(), content.bottom() - PAGINATION_HEIGHT),
    );

    if carousel.is_empty() {
        draw_empty(ui, viewport, fetching, theme);
        return response;
    }

    draw_slides(ui, state, carousel, viewport, theme, images, now);

    if carousel.len() > 1 {
        if let Some(direction) = draw_arrows(ui, panel, viewport, theme) {
            response.navigate = Some(direction);
        }
        let dots_center = Pos2::new(content.center().x, content.bottom() - PAGINATION_HEIGHT / 2.0);
        let active = carousel.transition().map_or(carousel.current(), |t| t.to);
        response.go_to = draw_pagination(ui, dots_center, carousel.len(), active, theme);
    }

    response
}

fn draw_slides(
    ui: &mut egui::Ui,
    state: &PopupUiState,
    carousel: &Carousel,
    viewport: egui::Rect,
    theme: &Theme,
    images: &ImageCache,
    now: Instant,
) {
    let Some(t) = carousel.transition().copied() else {
        if let Some(current) = state.slides.get(carousel.current()) {
            slide::draw(ui, current, viewport, theme, images, true);
        }
        return;
    };

    let progress = t.progress(now, carousel.options().transition_speed);
    let w = viewport.width();
    let sign = match t.direction {
        Direction::Forward => -1.0,
        Direction::Backward => 1.0,
    };
    let from_offset = sign * progress * w;
    let to_offset = from_offset - sign * w;

    ui.scope(|ui| {
        ui.set_clip_rect(viewport);
        if let Some(from) = state.slides.get(t.from) {
            let rect = viewport.translate(egui::vec2(from_offset, 0.0));
            slide::draw(ui, from, rect, theme, images, false);
        }
        if let Some(to) = state.slides.get(t.to) {
            let rect = viewport.translate(egui::vec2(to_offset, 0.0));
            slide::draw(ui, to, rect, theme, images, false);
        }
    });
}

fn draw_empty(ui: &egui::Ui, viewport: egui::Rect, fetching: bool, theme: &Theme) {
    let label = if fetching {
        let spinner_rect = egui::Rect::from_center_size(
            viewport.center() - egui::vec2(0.0, 28.0),
            egui::vec2(32.0, 32.0),
        );
        egui::Spinner::new()
            .color(theme.muted)
            .paint_at(ui, spinner_rect);
        "Loading\u{2026}"
    } else {
        "No slides to display"
    };

    let galley = ui.painter().layout_no_wrap(
        label.to_string(),
        FontId::proportional(theme.body_size),
        theme.muted,
    );
    let pos = viewport.center() - galley.rect.size() / 2.0;
    ui.painter().galley(pos, galley, theme.muted);
}

fn draw_arrows(
    ui: &mut egui::Ui,
    panel: egui::Rect,
    viewport: egui::Rect,
    theme: &Theme,
) -> Option<Direction> {
    let size = egui::vec2(PANEL_PADDING, theme.control_size * 2.0);
    let y = viewport.center().y;
    let arrows = [
        (Direction::Backward, "\u{2039}", panel.left() + PANEL_PADDING / 2.0),
        (Direction::Forward, "\u{203A}", panel.right() - PANEL_PADDING / 2.0),
    ];

    let mut clicked = None;
    for (direction, glyph, x) in arrows {
        let rect = egui::Rect::from_center_size(Pos2::new(x, y), size);
        let button = egui::Button::new(
            egui::RichText::new(glyph)
                .size(theme.control_size)
                .color(theme.foreground),
        )
        .frame(false);
        if ui.put(rect, button).clicked() {
            clicked = Some(direction);
        }
    }
    clicked
}

fn draw_pagination(
    ui: &mut egui::Ui,
    center: Pos2,
    count: usize,
    active: usize,
    theme: &Theme,
) -> Option<usize> {
    let mut clicked = None;
    for (i, dot) in dot_centers(center, count).into_iter().enumerate() {
        let hit = egui::Rect::from_center_size(dot, egui::vec2(DOT_SPACING, DOT_SPACING));
        let response = ui.interact(hit, ui.id().with(("dot", i)), Sense::click());
        let color = if i == active {
            theme.accent
        } else if response.hovered() {
            theme.foreground
        } else {
            theme.muted
        };
        ui.painter().circle_filled(dot, DOT_RADIUS, color);
        if response.clicked() {
            clicked = Some(i);
        }
    }
    clicked
}

fn draw_error_banner(ui: &egui::Ui, message: &str, screen: egui::Rect, theme: &Theme) -> egui::Rect {
    let rect = egui::Rect::from_min_size(screen.left_top(), egui::vec2(screen.width(), BANNER_HEIGHT));
    ui.painter().rect_filled(rect, 0.0, theme.error_background);
    let galley = ui.painter().layout(
        message.to_string(),
        FontId::proportional(theme.body_size),
        theme.error_foreground,
        rect.width() - 24.0,
    );
    let pos = Pos2::new(rect.left() + 12.0, rect.center().y - galley.rect.height() / 2.0);
    ui.painter().galley(pos, galley, theme.error_foreground);
    rect
}

/// Centered content panel, at most `PANEL_MAX_WIDTH` x `PANEL_MAX_HEIGHT`
/// and never more than 90% of the available area.
pub fn panel_rect(available: egui::Rect) -> egui::Rect {
    let w = (available.width() * 0.9).min(PANEL_MAX_WIDTH);
    let h = (available.height() * 0.9).min(PANEL_MAX_HEIGHT);
    egui::Rect::from_center_size(available.center(), egui::vec2(w, h))
}

pub fn is_backdrop_click(pos: Pos2, panel: egui::Rect) -> bool {
    !panel.contains(pos)
}

/// Centers of `count` pagination dots laid out around `center`.
pub fn dot_centers(center: Pos2, count: usize) -> Vec<Pos2> {
    let total = DOT_SPACING * count.saturating_sub(1) as f32;
    let start = center.x - total / 2.0;
    (0..count)
        .map(|i| Pos2::new(start + DOT_SPACING * i as f32, center.y))
        .collect()
}
