use eframe::egui::{self, Color32, FontId, Pos2, Stroke};

use crate::fetch::SlideRecord;
use crate::render::image_cache::{ImageCache, ImageState};
use crate::theme::Theme;

const CAPTION_GAP: f32 = 14.0;
const LINE_GAP: f32 = 6.0;

pub const NO_IMAGE_TEXT: &str = "No image available";
const BROKEN_IMAGE_TEXT: &str = "Image could not be loaded";

/// Draw one slide: the visual on top, link and caption beneath.
///
/// Only a settled slide gets a clickable heading; slides in motion are
/// painted without widgets.
pub fn draw(
    ui: &mut egui::Ui,
    slide: &SlideRecord,
    rect: egui::Rect,
    theme: &Theme,
    images: &ImageCache,
    interactive: bool,
) {
    let linked = !slide.heading_url.is_empty();
    let heading_color = if linked {
        theme.accent
    } else {
        theme.heading_color
    };
    let heading_galley = ui.painter().layout(
        slide.heading.clone(),
        FontId::proportional(theme.heading_size),
        heading_color,
        rect.width(),
    );
    let description_galley = ui.painter().layout(
        slide.description.clone(),
        FontId::proportional(theme.body_size),
        theme.foreground,
        rect.width(),
    );
    let caption_height =
        heading_galley.rect.height() + LINE_GAP + description_galley.rect.height();

    let visual_bottom = (rect.bottom() - caption_height - CAPTION_GAP).max(rect.top());
    let visual = egui::Rect::from_min_max(rect.left_top(), Pos2::new(rect.right(), visual_bottom));
    draw_visual(ui, slide.image_url.as_deref(), visual, theme, images);

    let mut y = visual_bottom + CAPTION_GAP;
    let heading_size = heading_galley.rect.size();
    if interactive && linked {
        let heading_rect = egui::Rect::from_min_size(Pos2::new(rect.left(), y), heading_size);
        let link = egui::Hyperlink::from_label_and_url(
            egui::RichText::new(&slide.heading)
                .size(theme.heading_size)
                .color(theme.accent),
            &slide.heading_url,
        )
        .open_in_new_tab(true);
        ui.put(heading_rect.expand(1.0), link);
    } else {
        ui.painter()
            .galley(Pos2::new(rect.left(), y), heading_galley, heading_color);
    }
    y += heading_size.y + LINE_GAP;

    ui.painter()
        .galley(Pos2::new(rect.left(), y), description_galley, theme.foreground);
}

fn draw_visual(
    ui: &egui::Ui,
    image_url: Option<&str>,
    area: egui::Rect,
    theme: &Theme,
    images: &ImageCache,
) {
    let Some(image_url) = image_url else {
        draw_placeholder(ui, NO_IMAGE_TEXT, area, theme);
        return;
    };

    match images.get_or_load(ui.ctx(), image_url) {
        ImageState::Ready(texture) => {
            let draw_rect = contain_rect(texture.size_vec2(), area);
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            ui.painter()
                .image(texture.id(), draw_rect, uv, Color32::WHITE);
        }
        ImageState::Loading => {
            let size = 32.0_f32.min(area.height());
            let spinner_rect = egui::Rect::from_center_size(area.center(), egui::vec2(size, size));
            egui::Spinner::new().color(theme.muted).paint_at(ui, spinner_rect);
        }
        ImageState::Failed => draw_placeholder(ui, BROKEN_IMAGE_TEXT, area, theme),
    }
}

fn draw_placeholder(ui: &egui::Ui, label: &str, area: egui::Rect, theme: &Theme) {
    if area.height() <= 0.0 {
        return;
    }
    ui.painter()
        .rect_filled(area, 8.0, theme.placeholder_background);
    ui.painter().rect_stroke(
        area,
        8.0,
        Stroke::new(1.0, theme.muted),
        egui::StrokeKind::Inside,
    );

    let galley = ui.painter().layout(
        label.to_string(),
        FontId::proportional(theme.body_size),
        theme.muted,
        area.width(),
    );
    let text_pos = Pos2::new(
        area.center().x - galley.rect.width() / 2.0,
        area.center().y - galley.rect.height() / 2.0,
    );
    ui.painter().galley(text_pos, galley, theme.muted);
}

/// Fit `tex_size` inside `available`, preserving aspect ratio, never upscaling.
pub fn contain_rect(tex_size: egui::Vec2, available: egui::Rect) -> egui::Rect {
    if tex_size.x <= 0.0 || tex_size.y <= 0.0 {
        return egui::Rect::from_center_size(available.center(), egui::Vec2::ZERO);
    }
    let scale = (available.width() / tex_size.x)
        .min(available.height() / tex_size.y)
        .min(1.0);
    egui::Rect::from_center_size(available.center(), tex_size * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(w: f32, h: f32) -> egui::Rect {
        egui::Rect::from_min_size(Pos2::ZERO, egui::vec2(w, h))
    }

    #[test]
    fn test_contain_shrinks_wide_image() {
        let r = contain_rect(egui::vec2(2000.0, 1000.0), area(800.0, 600.0));
        assert_eq!(r.size(), egui::vec2(800.0, 400.0));
        assert_eq!(r.center(), Pos2::new(400.0, 300.0));
    }

    #[test]
    fn test_contain_shrinks_tall_image() {
        let r = contain_rect(egui::vec2(500.0, 1200.0), area(800.0, 600.0));
        assert_eq!(r.size(), egui::vec2(250.0, 600.0));
    }

    #[test]
    fn test_contain_never_upscales() {
        let r = contain_rect(egui::vec2(100.0, 50.0), area(800.0, 600.0));
        assert_eq!(r.size(), egui::vec2(100.0, 50.0));
    }

    #[test]
    fn test_contain_degenerate_texture() {
        let r = contain_rect(egui::vec2(0.0, 10.0), area(800.0, 600.0));
        assert_eq!(r.size(), egui::Vec2::ZERO);
    }
}
