use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::carousel::{CarouselOptions, DEFAULT_AUTOPLAY_DELAY_MS, DEFAULT_TRANSITION_SPEED_MS};

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "popslider";

pub const TOKEN_ENV_VAR: &str = "POPSLIDER_ACCESS_TOKEN";
pub const MIN_POPUP_SHOWS: u32 = 1;
pub const MAX_POPUP_SHOWS: u32 = 10;
pub const DEFAULT_POPUP_SHOWS: u32 = 1;

pub const VALID_KEYS: &str = "popup.list_name, popup.site_url, popup.max_popup_shows, \
    popup.access_token, carousel.autoplay_delay_ms, carousel.transition_speed_ms, \
    carousel.loop, defaults.theme";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup: Option<PopupConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carousel: Option<CarouselConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PopupConfig {
    /// Title of the SharePoint list holding the slides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,

    /// Absolute URL of the site hosting the list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_popup_shows: Option<u32>,

    /// Bearer token. If not set, falls back to POPSLIDER_ACCESS_TOKEN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarouselConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoplay_delay_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_speed_ms: Option<u64>,

    #[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_slides: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl PopupConfig {
    /// Resolve the access token from config or environment variable.
    pub fn resolve_access_token(&self) -> Option<String> {
        if let Some(token) = &self.access_token {
            if !token.is_empty() {
                return Some(token.clone());
            }
        }
        std::env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.is_empty())
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `popslider config init` to create one.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("using default config: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# popslider configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn list_name(&self) -> Option<&str> {
        self.popup.as_ref().and_then(|p| p.list_name.as_deref())
    }

    pub fn site_url(&self) -> Option<&str> {
        self.popup.as_ref().and_then(|p| p.site_url.as_deref())
    }

    pub fn max_popup_shows(&self) -> u32 {
        self.popup
            .as_ref()
            .and_then(|p| p.max_popup_shows)
            .unwrap_or(DEFAULT_POPUP_SHOWS)
            .clamp(MIN_POPUP_SHOWS, MAX_POPUP_SHOWS)
    }

    pub fn access_token(&self) -> Option<String> {
        match &self.popup {
            Some(popup) => popup.resolve_access_token(),
            None => PopupConfig::default().resolve_access_token(),
        }
    }

    pub fn carousel_options(&self) -> CarouselOptions {
        let carousel = self.carousel.clone().unwrap_or_default();
        CarouselOptions {
            autoplay_delay: Duration::from_millis(
                carousel.autoplay_delay_ms.unwrap_or(DEFAULT_AUTOPLAY_DELAY_MS),
            ),
            transition_speed: Duration::from_millis(
                carousel
                    .transition_speed_ms
                    .unwrap_or(DEFAULT_TRANSITION_SPEED_MS),
            ),
            loop_slides: carousel.loop_slides.unwrap_or(true),
        }
    }

    pub fn theme_name(&self) -> &str {
        self.defaults
            .as_ref()
            .and_then(|d| d.theme.as_deref())
            .unwrap_or("light")
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "popup.list_name" => {
                if value.trim().is_empty() {
                    anyhow::bail!("List name must not be empty.");
                }
                self.popup_mut().list_name = Some(value.to_string());
            }
            "popup.site_url" => {
                let parsed = url::Url::parse(value)
                    .map_err(|e| anyhow::anyhow!("Invalid site URL: {value} ({e})"))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    anyhow::bail!("Invalid site URL: {value}. Must start with http:// or https://.");
                }
                self.popup_mut().site_url = Some(value.trim_end_matches('/').to_string());
            }
            "popup.max_popup_shows" => {
                let shows = parse_max_popup_shows(value)?;
                self.popup_mut().max_popup_shows = Some(shows);
            }
            "popup.access_token" => {
                self.popup_mut().access_token = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "carousel.autoplay_delay_ms" => {
                let ms = parse_millis(key, value)?;
                if ms == 0 {
                    anyhow::bail!("Invalid autoplay_delay_ms: {value}. Must be greater than 0.");
                }
                self.carousel_mut().autoplay_delay_ms = Some(ms);
            }
            "carousel.transition_speed_ms" => {
                let ms = parse_millis(key, value)?;
                self.carousel_mut().transition_speed_ms = Some(ms);
            }
            "carousel.loop" => {
                let looping = match value {
                    "true" | "yes" | "on" => true,
                    "false" | "no" | "off" => false,
                    _ => anyhow::bail!("Invalid loop: {value}. Must be 'true' or 'false'."),
                };
                self.carousel_mut().loop_slides = Some(looping);
            }
            "defaults.theme" => {
                match value {
                    "light" | "dark" => {}
                    _ => anyhow::bail!("Invalid theme: {value}. Must be 'light' or 'dark'."),
                }
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .theme = Some(value.to_string());
            }
            _ => anyhow::bail!("Unknown config key: {key}. Valid keys: {VALID_KEYS}"),
        }
        Ok(())
    }

    fn popup_mut(&mut self) -> &mut PopupConfig {
        self.popup.get_or_insert_with(PopupConfig::default)
    }

    fn carousel_mut(&mut self) -> &mut CarouselConfig {
        self.carousel.get_or_insert_with(CarouselConfig::default)
    }
}

pub fn parse_max_popup_shows(value: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(n) if (MIN_POPUP_SHOWS..=MAX_POPUP_SHOWS).contains(&n) => Ok(n),
        _ => anyhow::bail!(
            "Invalid max_popup_shows: {value}. Must be a number from {MIN_POPUP_SHOWS} to {MAX_POPUP_SHOWS}."
        ),
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| anyhow::anyhow!("Invalid {key}: {value}. Must be a whole number of milliseconds."))
}
