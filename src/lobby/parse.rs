use serde::Deserialize;

use crate::models::{LobbyRow, MatchStatus, PricePair};
use crate::snapshot::slug::slugify;
use crate::text::{collapse_ws, first_float};

/// Raw text of one lobby table row, as captured from the rendered page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLobbyRow {
    /// Full title cell text, usually "<date> | Team A v Team B"
    pub title: String,
    /// Date/time text inside the title cell
    pub dtime: String,
    pub live: bool,
    pub visit: Option<RawOutcomeCell>,
    pub draw: Option<RawOutcomeCell>,
    pub home: Option<RawOutcomeCell>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOutcomeCell {
    pub back: Vec<String>,
    pub lay: Vec<String>,
}

/// Parse captured rows, dropping anything that is not a "A v B" fixture.
pub fn parse_lobby_rows(raw: &[RawLobbyRow], max_rows: usize) -> Vec<LobbyRow> {
    raw.iter().filter_map(parse_row).take(max_rows).collect()
}

fn parse_row(raw: &RawLobbyRow) -> Option<LobbyRow> {
    let dtime = collapse_ws(&raw.dtime);
    let dtime = dtime.trim_end_matches('|').trim().to_string();

    let mut title = collapse_ws(&raw.title);
    if !dtime.is_empty() {
        if let Some(rest) = title.strip_prefix(dtime.as_str()) {
            title = rest.trim().trim_start_matches('|').trim().to_string();
        }
    }

    let (a, b) = title.split_once(" v ")?;
    let (a, b) = (a.trim().to_string(), b.trim().to_string());
    let display = format!("{} v {}", a, b);

    Some(LobbyRow {
        match_id: slugify(&display),
        title: display,
        teams: [a, b],
        starts_at: if dtime.is_empty() { None } else { Some(dtime) },
        status: if raw.live {
            MatchStatus::Live
        } else {
            MatchStatus::Scheduled
        },
        one: best_from_cell(raw.visit.as_ref()),
        draw: best_from_cell(raw.draw.as_ref()),
        two: best_from_cell(raw.home.as_ref()),
    })
}

/// Back is the last parseable back cell (nearest the centre), lay the first.
fn best_from_cell(cell: Option<&RawOutcomeCell>) -> PricePair {
    match cell {
        Some(c) => (
            c.back.iter().filter_map(|t| first_float(t)).last(),
            c.lay.iter().find_map(|t| first_float(t)),
        ),
        None => (None, None),
    }
}
