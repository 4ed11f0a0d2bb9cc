use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::Config;
use crate::fetch::{SharePointClient, SlideFetcher, SlideRecord};

/// Fetch the list once and print the slides, without opening a window.
pub fn run(list_name: Option<String>, site_url: Option<String>) -> Result<()> {
    let config = Config::load_or_default();
    let list_name = list_name
        .or_else(|| config.list_name().map(str::to_string))
        .context("No list name configured. Pass --list or run `popslider config init`.")?;
    let site_url = site_url
        .or_else(|| config.site_url().map(str::to_string))
        .context("No site URL configured. Pass --site or run `popslider config init`.")?;

    let client = SharePointClient::new(config.access_token());
    let slides = client
        .fetch_slides(&site_url, &list_name)
        .with_context(|| format!("Failed to fetch list '{list_name}' from {site_url}"))?;

    if slides.is_empty() {
        println!("{}", format!("List '{list_name}' has no items.").yellow());
        return Ok(());
    }

    println!("Found {} slide(s) in '{list_name}':", slides.len());
    for (i, slide) in slides.iter().enumerate() {
        println!();
        print_slide(i + 1, slide);
    }
    Ok(())
}

fn print_slide(number: usize, slide: &SlideRecord) {
    let heading = if slide.heading.is_empty() {
        "(no heading)".dimmed().to_string()
    } else {
        slide.heading.bold().to_string()
    };
    println!("{number:>3}. {heading}");
    if !slide.heading_url.is_empty() {
        println!("     link:  {}", slide.heading_url.cyan());
    }
    match &slide.image_url {
        Some(url) => println!("     image: {url}"),
        None => println!("     image: {}", "No image available".dimmed()),
    }
    if !slide.description.is_empty() {
        println!("     {}", slide.description);
    }
}
