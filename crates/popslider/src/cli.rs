use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::config::{MAX_POPUP_SHOWS, MIN_POPUP_SHOWS};

#[derive(Parser)]
#[command(name = "popslider")]
#[command(author, version, about)]
#[command(long_about = "A once-a-day announcement popup backed by a SharePoint list.\n\n\
    Slides are read from a SharePoint list and shown in a carousel overlay,\n\
    at most a configured number of times per calendar day.\n\n\
    Examples:\n  \
    popslider                              Show the popup if today's limit allows\n  \
    popslider --windowed                   Show it in a window instead of fullscreen\n  \
    popslider --list News --site https://contoso.sharepoint.com/sites/hr\n  \
    popslider status                       Show today's popup counter\n  \
    popslider reset                        Allow the popup to show again today")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// SharePoint list holding the slides (overrides popup.list_name)
    #[arg(long, global = false)]
    pub list: Option<String>,

    /// Absolute SharePoint site URL (overrides popup.site_url)
    #[arg(long, global = false)]
    pub site: Option<String>,

    /// Maximum popups per day (overrides popup.max_popup_shows)
    #[arg(long, global = false, value_parser = parse_max_shows)]
    pub max_shows: Option<u32>,

    /// Launch in a window instead of fullscreen
    #[arg(long, global = false)]
    pub windowed: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show today's popup counter
    Status {
        /// Site whose counter to inspect (defaults to popup.site_url)
        #[arg(long)]
        site: Option<String>,
    },

    /// Reset the popup counter so it shows again today
    Reset {
        /// Site whose counter to reset (defaults to popup.site_url)
        #[arg(long)]
        site: Option<String>,
    },

    /// Fetch the slides and print them without opening a window
    Slides {
        /// SharePoint list holding the slides
        #[arg(long)]
        list: Option<String>,

        /// Absolute SharePoint site URL
        #[arg(long)]
        site: Option<String>,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Interactively set up the SharePoint list and site
    Init,

    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. popup.list_name, popup.max_popup_shows, carousel.loop)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

fn parse_max_shows(value: &str) -> Result<u32, String> {
    let n: u32 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a whole number"))?;
    if (MIN_POPUP_SHOWS..=MAX_POPUP_SHOWS).contains(&n) {
        Ok(n)
    } else {
        Err(format!(
            "must be between {MIN_POPUP_SHOWS} and {MAX_POPUP_SHOWS}"
        ))
    }
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Status { site }) => crate::commands::counter::status(site),
            Some(Commands::Reset { site }) => crate::commands::counter::reset(site),
            Some(Commands::Slides { list, site }) => crate::commands::slides::run(list, site),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                println!("popslider {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            None => crate::app::run(crate::app::RunOverrides {
                list_name: self.list,
                site_url: self.site,
                max_popup_shows: self.max_shows,
                windowed: self.windowed,
            }),
        }
    }
}
