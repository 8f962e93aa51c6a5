//! Event page capture → `EventDetail`.
//!
//! The render service hands back the event page as raw cell text, grouped by
//! market box. Everything here is pure: picking the match-odds and
//! zero-commission boxes, pairing back/lay cells into ladders, and pulling
//! numbers out of display text.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::PageError;
use crate::models::{EventDetail, EventId, FancyBet, LadderStep, RunnerOdds};
use crate::snapshot::slug::correlation_key_for_title;
use crate::text::{collapse_ws, first_float};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageCapture {
    pub title: Option<String>,
    pub match_time: Option<String>,
    pub markets: Vec<MarketCapture>,
    pub fancy: Vec<FancyCapture>,
}

/// One market box on the page ("Match Odds", "Bookmaker 0 Commission", ...).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MarketCapture {
    pub heading: String,
    pub suspended: bool,
    pub rows: Vec<RunnerCapture>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunnerCapture {
    pub name: String,
    /// Best price first
    pub back: Vec<PriceCell>,
    /// Best price first
    pub lay: Vec<PriceCell>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PriceCell {
    pub price: String,
    pub size: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FancyCapture {
    pub name: String,
    pub no: Option<PriceCell>,
    pub yes: Option<PriceCell>,
    pub limits: Option<String>,
}

const MATCH_ODDS_HEADINGS: &[&str] = &["winner", "match odds", "matchodds"];
const BOOKMAKER_HEADINGS: &[&str] = &["bookmaker 0 commission", "bookmaker"];

/// Turn a page capture into an `EventDetail`.
///
/// A capture with no title, no markets and no fancy rows is the page of an
/// event that has not rendered (or no longer exists) and is rejected as empty.
pub fn parse_event_page(
    event_id: EventId,
    source_url: &str,
    capture: PageCapture,
) -> Result<EventDetail, PageError> {
    let title = non_empty(capture.title.as_deref());
    if title.is_none() && capture.markets.is_empty() && capture.fancy.is_empty() {
        return Err(PageError::Empty);
    }

    let match_odds = find_market(&capture.markets, MATCH_ODDS_HEADINGS).or_else(|| {
        capture
            .markets
            .iter()
            .find(|m| !heading_matches(m, BOOKMAKER_HEADINGS) && !m.rows.is_empty())
    });
    let bookmaker = find_market(&capture.markets, BOOKMAKER_HEADINGS);

    let mut detail = EventDetail::empty(event_id, source_url);
    detail.correlation_key = title.as_deref().and_then(correlation_key_for_title);
    detail.title = title;
    detail.match_time = non_empty(capture.match_time.as_deref());
    if let Some(market) = match_odds {
        detail.runners = parse_runners(market);
    }
    if let Some(market) = bookmaker {
        detail.bookmaker_zero_commission_suspended = market.suspended;
        detail.bookmaker_zero_commission = parse_runners(market);
    }
    detail.fancy = capture.fancy.iter().filter_map(parse_fancy).collect();

    Ok(detail)
}

fn heading_matches(market: &MarketCapture, keywords: &[&str]) -> bool {
    let heading = market.heading.to_lowercase();
    keywords.iter().any(|k| heading.contains(k))
}

fn find_market<'a>(markets: &'a [MarketCapture], keywords: &[&str]) -> Option<&'a MarketCapture> {
    markets.iter().find(|m| heading_matches(m, keywords))
}

fn parse_runners(market: &MarketCapture) -> BTreeMap<String, RunnerOdds> {
    market
        .rows
        .iter()
        .filter_map(|row| {
            let name = collapse_ws(&row.name);
            if name.is_empty() {
                return None;
            }
            Some((name, RunnerOdds::from_ladder(build_ladder(&row.back, &row.lay))))
        })
        .collect()
}

/// Pair back[i] with lay[i]; the shorter side is padded with empty levels.
fn build_ladder(back: &[PriceCell], lay: &[PriceCell]) -> Vec<LadderStep> {
    (0..back.len().max(lay.len()))
        .map(|i| {
            let (back, back_size) = cell_values(back.get(i));
            let (lay, lay_size) = cell_values(lay.get(i));
            LadderStep {
                back,
                back_size,
                lay,
                lay_size,
            }
        })
        .collect()
}

fn cell_values(cell: Option<&PriceCell>) -> (Option<f64>, String) {
    match cell {
        Some(c) => (first_float(&c.price), c.size.trim().to_string()),
        None => (None, String::new()),
    }
}

fn parse_fancy(row: &FancyCapture) -> Option<FancyBet> {
    let name = collapse_ws(&row.name);
    if name.is_empty() {
        return None;
    }
    let (no, no_size) = cell_values(row.no.as_ref());
    let (yes, yes_size) = cell_values(row.yes.as_ref());
    Some(FancyBet {
        name,
        no,
        no_size,
        yes,
        yes_size,
        limits: row.limits.as_deref().map(collapse_ws),
    })
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(collapse_ws).filter(|t| !t.is_empty())
}
