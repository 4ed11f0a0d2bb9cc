use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::Config;
use crate::gate;
use crate::store::{CounterStore, FileCounterStore};

fn configured_store(config: &Config, site: Option<String>) -> Result<FileCounterStore> {
    let site = site
        .or_else(|| config.site_url().map(str::to_string))
        .context("No site URL configured. Pass --site or run `popslider config init`.")?;
    Ok(FileCounterStore::for_site(&site))
}

/// Show today's counter for the configured site.
pub fn status(site: Option<String>) -> Result<()> {
    let config = Config::load_or_default();
    let store = configured_store(&config, site)?;
    let max = config.max_popup_shows();
    let today = gate::today_key(chrono::Local::now().date_naive());

    println!("{} {}", "Counter file:".bold(), store.path().display());

    let stored = store
        .read()
        .with_context(|| format!("Failed to read {}", store.path().display()))?;

    let shown_today = match &stored {
        Some(state) => {
            println!("  lastVisit:  {}", state.last_visit_date);
            println!("  popupCount: {}", state.shown_count);
            if state.last_visit_date == today {
                state.shown_count
            } else {
                0
            }
        }
        None => {
            println!("  {}", "(no visits recorded)".dimmed());
            0
        }
    };

    let remaining = max.saturating_sub(shown_today);
    let summary = format!("Shown {shown_today} of {max} time(s) today, {remaining} remaining.");
    if remaining > 0 {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.yellow());
    }
    Ok(())
}

/// Forget the counter so the popup shows again today.
pub fn reset(site: Option<String>) -> Result<()> {
    let config = Config::load_or_default();
    let store = configured_store(&config, site)?;
    let removed = store
        .clear()
        .with_context(|| format!("Failed to remove {}", store.path().display()))?;

    if removed {
        println!("{}", "Popup counter reset.".green());
    } else {
        println!("{}", "No popup counter stored; nothing to reset.".yellow());
    }
    Ok(())
}
