use chrono::NaiveDate;

use crate::store::CounterState;

/// Format used for `lastVisit` keys.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateConfig {
    pub max_shows_per_day: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    pub should_show: bool,
    pub next_state: CounterState,
}

pub fn today_key(today: NaiveDate) -> String {
    today.format(DATE_KEY_FORMAT).to_string()
}

/// Decide whether the popup may show today and compute the counter to persist.
///
/// A stored record from another day counts as zero shows. The count only
/// grows when the popup is actually shown, so it never passes the cap.
pub fn evaluate(
    today: NaiveDate,
    stored: Option<&CounterState>,
    config: GateConfig,
) -> GateDecision {
    let today_key = today_key(today);

    let effective_count = match stored {
        Some(state) if state.last_visit_date == today_key => state.shown_count,
        _ => 0,
    };

    let should_show = effective_count < config.max_shows_per_day;
    let shown_count = if should_show {
        effective_count + 1
    } else {
        effective_count
    };

    GateDecision {
        should_show,
        next_state: CounterState {
            last_visit_date: today_key,
            shown_count,
        },
    }
}
