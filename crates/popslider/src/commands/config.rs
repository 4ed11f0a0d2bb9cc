use anyhow::Result;
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::{Config, MAX_POPUP_SHOWS, MIN_POPUP_SHOWS};

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Init => init(),
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(&key, &value),
    }
}

fn init() -> Result<()> {
    let mut config = Config::load_or_default();

    let site_url = inquire::Text::new("SharePoint site URL:")
        .with_initial_value(config.site_url().unwrap_or_default())
        .with_help_message("Absolute URL of the site, e.g. https://contoso.sharepoint.com/sites/hr")
        .prompt()?;
    config.set("popup.site_url", site_url.trim())?;

    let list_name = inquire::Text::new("SharePoint list name:")
        .with_initial_value(config.list_name().unwrap_or_default())
        .prompt()?;
    config.set("popup.list_name", list_name.trim())?;

    let max_shows = inquire::CustomType::<u32>::new("Maximum popups per day:")
        .with_default(config.max_popup_shows())
        .with_help_message(&format!("{MIN_POPUP_SHOWS} to {MAX_POPUP_SHOWS}"))
        .prompt()?;
    config.set("popup.max_popup_shows", &max_shows.to_string())?;

    let path = config.save()?;
    println!(
        "{} {}",
        "Saved configuration to".green(),
        path.display().to_string().bold()
    );
    Ok(())
}

fn show() -> Result<()> {
    let path = Config::path()?;
    let config = Config::load_or_default();

    println!("{} {}", "Config file:".bold(), path.display());
    if !path.exists() {
        println!("{}", "(not created yet, showing defaults)".dimmed());
    }
    println!();

    let unset = || "(not set)".dimmed().to_string();
    let popup = config.popup.clone().unwrap_or_default();
    println!("{}", "popup".bold());
    println!(
        "  list_name:         {}",
        popup.list_name.clone().unwrap_or_else(unset)
    );
    println!(
        "  site_url:          {}",
        popup.site_url.clone().unwrap_or_else(unset)
    );
    println!("  max_popup_shows:   {}", config.max_popup_shows());
    let token = match (&popup.access_token, config.access_token()) {
        (Some(_), _) => "(set in config)".to_string(),
        (None, Some(_)) => format!("(from {})", crate::config::TOKEN_ENV_VAR),
        (None, None) => unset(),
    };
    println!("  access_token:      {token}");

    let carousel = config.carousel_options();
    println!("{}", "carousel".bold());
    println!(
        "  autoplay_delay_ms: {}",
        carousel.autoplay_delay.as_millis()
    );
    println!(
        "  transition_speed_ms: {}",
        carousel.transition_speed.as_millis()
    );
    println!("  loop:              {}", carousel.loop_slides);

    println!("{}", "defaults".bold());
    println!("  theme:             {}", config.theme_name());
    Ok(())
}

fn set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_or_default();
    config.set(key, value)?;
    let path = config.save()?;
    println!(
        "{} {key} = {} ({})",
        "Set".green(),
        if key == "popup.access_token" {
            "********".to_string()
        } else {
            value.to_string()
        },
        path.display()
    );
    Ok(())
}
