use eframe::egui;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::carousel::{Carousel, Direction};
use crate::config::Config;
use crate::controller::{NOT_CONFIGURED_MESSAGE, Phase, PopupController, PopupSettings};
use crate::fetch::SharePointClient;
use crate::render::image_cache::ImageCache;
use crate::render::overlay;
use crate::store::FileCounterStore;
use crate::theme::Theme;

/// Wheel movement needed to page once.
const WHEEL_THRESHOLD: f32 = 1.0;

/// Command-line overrides for a popup run.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub list_name: Option<String>,
    pub site_url: Option<String>,
    pub max_popup_shows: Option<u32>,
    pub windowed: bool,
}

struct PopupApp {
    controller: PopupController<FileCounterStore>,
    carousel: Carousel,
    theme: Theme,
    images: ImageCache,
}

impl PopupApp {
    fn navigate(&mut self, direction: Direction, now: Instant) {
        match direction {
            Direction::Forward => self.carousel.next(now),
            Direction::Backward => self.carousel.prev(now),
        };
    }
}

impl eframe::App for PopupApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        if self.controller.poll() {
            tracing::debug!("popup state updated from fetch");
        }
        self.carousel
            .sync_len(self.controller.state().slides.len(), now);

        let mut close_requested = false;
        let mut navigate: Option<Direction> = None;
        ctx.input(|i| {
            if i.key_pressed(egui::Key::Escape) {
                close_requested = true;
                return;
            }
            if i.key_pressed(egui::Key::ArrowRight) {
                navigate = Some(Direction::Forward);
            }
            if i.key_pressed(egui::Key::ArrowLeft) {
                navigate = Some(Direction::Backward);
            }
            let wheel = i.raw_scroll_delta.y;
            if wheel <= -WHEEL_THRESHOLD {
                navigate = Some(Direction::Forward);
            } else if wheel >= WHEEL_THRESHOLD {
                navigate = Some(Direction::Backward);
            }
        });
        if let Some(direction) = navigate {
            self.navigate(direction, now);
        }
        self.carousel.tick(now);

        let fetching = self.controller.is_fetching();
        let response = egui::CentralPanel::default()
            .frame(egui::Frame::new())
            .show(ctx, |ui| {
                overlay::show(
                    ui,
                    self.controller.state(),
                    &self.carousel,
                    fetching,
                    &self.theme,
                    &self.images,
                    now,
                )
            })
            .inner;

        if let Some(direction) = response.navigate {
            self.navigate(direction, now);
        }
        if let Some(index) = response.go_to {
            self.carousel.go_to(index, now);
        }
        if close_requested || response.close {
            tracing::debug!("popup dismissed by user");
            self.controller.close();
        }

        if !self.controller.state().is_open {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        match self.carousel.next_wakeup(now) {
            Some(Duration::ZERO) => ctx.request_repaint(),
            Some(wait) => ctx.request_repaint_after(wait),
            None => {}
        }
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0, 0.0, 0.0, 0.0]
    }
}

pub fn run(overrides: RunOverrides) -> anyhow::Result<()> {
    let config = Config::load_or_default();

    let settings = PopupSettings {
        list_name: overrides
            .list_name
            .or_else(|| config.list_name().map(str::to_string)),
        site_url: overrides
            .site_url
            .or_else(|| config.site_url().map(str::to_string)),
        max_popup_shows: overrides
            .max_popup_shows
            .unwrap_or_else(|| config.max_popup_shows()),
    };
    let site_url = settings.site_url.clone().unwrap_or_default();
    let access_token = config.access_token();

    let store = FileCounterStore::for_site(&site_url);
    tracing::debug!(path = %store.path().display(), "popup counter store");
    let fetcher = Arc::new(SharePointClient::new(access_token.clone()));

    let mut controller = PopupController::new(store, fetcher);
    controller.init(&settings, chrono::Local::now().date_naive());

    match controller.phase() {
        Phase::Error => anyhow::bail!(
            "{NOT_CONFIGURED_MESSAGE}. Run `popslider config init` or pass --list and --site."
        ),
        Phase::Closed => {
            tracing::info!("popup already shown the maximum number of times today");
            return Ok(());
        }
        _ => {}
    }

    let title = settings
        .list_name
        .clone()
        .unwrap_or_else(|| "popslider".to_string());

    let viewport = egui::ViewportBuilder::default()
        .with_title(&title)
        .with_transparent(true)
        .with_decorations(false)
        .with_always_on_top();
    let viewport = if overrides.windowed {
        viewport.with_inner_size([1280.0, 800.0])
    } else {
        viewport.with_fullscreen(true)
    };

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    let carousel_options = config.carousel_options();
    let theme = Theme::from_name(config.theme_name());
    tracing::debug!(theme = %theme.name, ?carousel_options, "launching popup window");

    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            let repaint = cc.egui_ctx.clone();
            controller.set_waker(move || repaint.request_repaint());
            Ok(Box::new(PopupApp {
                controller,
                carousel: Carousel::new(carousel_options, Instant::now()),
                theme,
                images: ImageCache::new(site_url, access_token),
            }))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
