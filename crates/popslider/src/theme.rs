use eframe::egui::Color32;

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    /// Dimmed layer behind the popup.
    pub backdrop: Color32,
    pub panel_background: Color32,
    pub foreground: Color32,
    pub heading_color: Color32,
    pub accent: Color32,
    pub muted: Color32,
    pub placeholder_background: Color32,
    pub error_background: Color32,
    pub error_foreground: Color32,
    pub heading_size: f32,
    pub body_size: f32,
    pub control_size: f32,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            backdrop: Color32::from_rgba_unmultiplied(0, 0, 0, 190),
            panel_background: Color32::from_rgb(0x1E, 0x1E, 0x1E),
            foreground: Color32::from_rgb(0xC8, 0xC8, 0xC8),
            heading_color: Color32::WHITE,
            accent: Color32::from_rgb(0x52, 0x94, 0xE2),
            muted: Color32::from_rgb(0x6A, 0x6A, 0x6A),
            placeholder_background: Color32::from_rgb(0x2D, 0x2D, 0x2D),
            error_background: Color32::from_rgb(0x5C, 0x1A, 0x1A),
            error_foreground: Color32::from_rgb(0xFF, 0xC9, 0xC9),
            heading_size: 24.0,
            body_size: 16.0,
            control_size: 28.0,
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            backdrop: Color32::from_rgba_unmultiplied(0, 0, 0, 140),
            panel_background: Color32::WHITE,
            foreground: Color32::from_rgb(0x1A, 0x1A, 0x2E),
            heading_color: Color32::from_rgb(0x16, 0x21, 0x3E),
            accent: Color32::from_rgb(0x0F, 0x34, 0x60),
            muted: Color32::from_rgb(0xB0, 0xB0, 0xB8),
            placeholder_background: Color32::from_rgb(0xF5, 0xF5, 0xF5),
            error_background: Color32::from_rgb(0xFD, 0xE7, 0xE9),
            error_foreground: Color32::from_rgb(0xA8, 0x00, 0x00),
            heading_size: 24.0,
            body_size: 16.0,
            control_size: 28.0,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "dark" => Self::dark(),
            _ => Self::light(),
        }
    }
}
