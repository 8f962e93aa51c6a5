use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Current shape of the persisted snapshot document.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Upstream event identifier (always kept as its decimal text form).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        EventId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric order when both ids are digit runs, text order otherwise.
    pub fn cmp_numeric(&self, other: &EventId) -> Ordering {
        let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if digits(&self.0) && digits(&other.0) {
            let a = self.0.trim_start_matches('0');
            let b = other.0.trim_start_matches('0');
            a.len().cmp(&b.len()).then_with(|| a.cmp(b))
        } else {
            self.0.cmp(&other.0)
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// (best back, best lay) for one lobby outcome.
pub type PricePair = (Option<f64>, Option<f64>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Live,
    Scheduled,
    #[serde(other)]
    Other,
}

/// One coarse entry of the lobby listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyRow {
    /// Correlation key shared with the matching `EventDetail`
    pub match_id: String,
    /// Display title, "Team A v Team B"
    pub title: String,
    pub teams: [String; 2],
    pub starts_at: Option<String>,
    pub status: MatchStatus,
    pub one: PricePair,
    /// `(None, None)` for two-outcome sports
    pub draw: PricePair,
    pub two: PricePair,
}

/// One price level of a ladder. Sizes are kept as displayed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LadderStep {
    pub back: Option<f64>,
    pub back_size: String,
    pub lay: Option<f64>,
    pub lay_size: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunnerOdds {
    pub best_back: Option<f64>,
    pub best_lay: Option<f64>,
    /// Best price first, in source order
    pub ladder: Vec<LadderStep>,
}

impl RunnerOdds {
    /// Best back is the highest back price, best lay the lowest lay price.
    pub fn from_ladder(ladder: Vec<LadderStep>) -> Self {
        let best_back = ladder
            .iter()
            .filter_map(|s| s.back)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));
        let best_lay = ladder
            .iter()
            .filter_map(|s| s.lay)
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))));
        RunnerOdds {
            best_back,
            best_lay,
            ladder,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FancyBet {
    pub name: String,
    pub no: Option<f64>,
    pub no_size: String,
    pub yes: Option<f64>,
    pub yes_size: String,
    /// Opaque min/max text, e.g. "Min: 100 Max: 50K"
    pub limits: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionLine {
    pub label: String,
    pub yes: Option<f64>,
    pub no: Option<f64>,
}

/// Deep per-event data scraped from one event page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetail {
    pub event_id: EventId,
    pub title: Option<String>,
    pub match_time: Option<String>,
    /// "Match Odds" market, runner name → odds
    pub runners: BTreeMap<String, RunnerOdds>,
    pub bookmaker_zero_commission: BTreeMap<String, RunnerOdds>,
    pub bookmaker_zero_commission_suspended: bool,
    pub fancy: Vec<FancyBet>,
    /// Reserved; not scraped yet
    pub sessions: Option<Vec<SessionLine>>,
    /// Reserved; not scraped yet
    pub result: Option<String>,
    pub source_url: String,
    /// Key matching `LobbyRow::match_id`, derived from the page title
    pub correlation_key: Option<String>,
}

impl EventDetail {
    /// An event with no market data, as returned for an empty page.
    pub fn empty(event_id: EventId, source_url: impl Into<String>) -> Self {
        EventDetail {
            event_id,
            title: None,
            match_time: None,
            runners: BTreeMap::new(),
            bookmaker_zero_commission: BTreeMap::new(),
            bookmaker_zero_commission_suspended: false,
            fancy: Vec::new(),
            sessions: None,
            result: None,
            source_url: source_url.into(),
            correlation_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestPrices {
    pub back: Option<f64>,
    pub lay: Option<f64>,
}

/// Flattened slug-keyed view of an event's headline fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveDetail {
    pub event_id: EventId,
    pub title: Option<String>,
    pub match_time: Option<String>,
    pub bookmaker: BTreeMap<String, BestPrices>,
    pub fancy: Vec<FancyBet>,
    pub sessions: Option<Vec<SessionLine>>,
    pub result: Option<String>,
}

impl From<(&EventId, &EventDetail)> for LiveDetail {
    fn from((event_id, detail): (&EventId, &EventDetail)) -> Self {
        LiveDetail {
            event_id: event_id.clone(),
            title: detail.title.clone(),
            match_time: detail.match_time.clone(),
            bookmaker: detail
                .runners
                .iter()
                .map(|(name, odds)| {
                    (
                        name.clone(),
                        BestPrices {
                            back: odds.best_back,
                            lay: odds.best_lay,
                        },
                    )
                })
                .collect(),
            fancy: detail.fancy.clone(),
            sessions: detail.sessions.clone(),
            result: detail.result.clone(),
        }
    }
}

/// The document persisted once per poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub cycle: u64,
    pub fetched_at: DateTime<Utc>,
    pub lobby: Vec<LobbyRow>,
    pub events: BTreeMap<EventId, EventDetail>,
    pub live_details: BTreeMap<String, LiveDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(back: Option<f64>, lay: Option<f64>) -> LadderStep {
        LadderStep {
            back,
            back_size: String::new(),
            lay,
            lay_size: String::new(),
        }
    }

    #[test]
    fn test_event_id_numeric_order() {
        let id = |s: &str| EventId::new(s);
        assert_eq!(id("99999").cmp_numeric(&id("100000")), Ordering::Less);
        assert_eq!(id("0042").cmp_numeric(&id("42")), Ordering::Equal);
        assert_eq!(id("34848333").cmp_numeric(&id("34848334")), Ordering::Less);
        assert_eq!(id("abc").cmp_numeric(&id("abd")), Ordering::Less);
    }

    #[test]
    fn test_best_prices_from_ladder() {
        let odds = RunnerOdds::from_ladder(vec![
            step(Some(1.9), Some(2.1)),
            step(Some(1.95), None),
            step(None, Some(2.02)),
        ]);
        assert_eq!(odds.best_back, Some(1.95));
        assert_eq!(odds.best_lay, Some(2.02));
        assert_eq!(odds.ladder.len(), 3);
        assert_eq!(odds.ladder[0].back, Some(1.9));
    }

    #[test]
    fn test_empty_ladder_has_null_best_prices() {
        let odds = RunnerOdds::from_ladder(vec![]);
        assert_eq!(odds.best_back, None);
        assert_eq!(odds.best_lay, None);
    }

    #[test]
    fn test_absent_fields_serialize_as_null() {
        let detail = EventDetail::empty(EventId::new("34848333"), "https://x/event/4/34848333");
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["event_id"], "34848333");
        assert!(json["sessions"].is_null());
        assert!(json["result"].is_null());
        assert!(json.get("title").is_some());
        assert!(json["runners"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_lobby_row_price_pairs_serialize_as_arrays() {
        let row = LobbyRow {
            match_id: "india-v-australia".into(),
            title: "India v Australia".into(),
            teams: ["India".into(), "Australia".into()],
            starts_at: None,
            status: MatchStatus::Live,
            one: (Some(1.8), Some(1.82)),
            draw: (None, None),
            two: (Some(2.2), None),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["status"], "live");
        assert_eq!(json["draw"], serde_json::json!([null, null]));
        assert_eq!(json["one"], serde_json::json!([1.8, 1.82]));
    }
}
