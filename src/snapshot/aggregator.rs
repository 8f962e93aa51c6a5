use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use crate::detail::FetchOutcome;
use crate::error::FetchError;
use crate::models::{EventDetail, EventId, LiveDetail, LobbyRow, Snapshot, SNAPSHOT_SCHEMA_VERSION};

use super::slug::slugify;

/// Builds one snapshot from scratch out of this cycle's lobby and fetch outcomes.
///
/// Successful details are copied in verbatim. Failed ids are left out of the
/// document and handed back so the caller can log them.
pub fn aggregate(
    cycle: u64,
    fetched_at: DateTime<Utc>,
    lobby: Vec<LobbyRow>,
    outcomes: BTreeMap<EventId, FetchOutcome>,
) -> (Snapshot, Vec<(EventId, FetchError)>) {
    let mut events: BTreeMap<EventId, EventDetail> = BTreeMap::new();
    let mut failures = Vec::new();
    for (id, outcome) in outcomes {
        match outcome {
            Ok(detail) => {
                events.insert(id, detail);
            }
            Err(e) => failures.push((id, e)),
        }
    }

    let live_details = build_live_details(&lobby, &events);

    let snapshot = Snapshot {
        version: SNAPSHOT_SCHEMA_VERSION,
        cycle,
        fetched_at,
        lobby,
        events,
        live_details,
    };
    (snapshot, failures)
}

/// Slug of each lobby title → headline fields of the correlated event.
///
/// Only events of this cycle's `events` map can appear. On duplicate
/// correlation keys the numerically lowest event id wins; on duplicate slugs the first
/// lobby row wins.
fn build_live_details(
    lobby: &[LobbyRow],
    events: &BTreeMap<EventId, EventDetail>,
) -> BTreeMap<String, LiveDetail> {
    let mut by_key: HashMap<&str, (&EventId, &EventDetail)> = HashMap::new();
    for (id, detail) in events {
        let Some(key) = detail.correlation_key.as_deref() else {
            continue;
        };
        match by_key.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert((id, detail));
            }
            Entry::Occupied(mut slot) => {
                if id.cmp_numeric(slot.get().0).is_lt() {
                    slot.insert((id, detail));
                }
            }
        }
    }

    let mut view = BTreeMap::new();
    for row in lobby {
        let slug = slugify(&row.title);
        if slug.is_empty() || view.contains_key(&slug) {
            continue;
        }
        if let Some(&entry) = by_key.get(row.match_id.as_str()) {
            view.insert(slug, LiveDetail::from(entry));
        }
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchStatus, RunnerOdds};

    fn row(title: &str) -> LobbyRow {
        let (a, b) = title.split_once(" v ").unwrap();
        LobbyRow {
            match_id: slugify(title),
            title: title.to_string(),
            teams: [a.to_string(), b.to_string()],
            starts_at: None,
            status: MatchStatus::Live,
            one: (Some(1.5), Some(1.52)),
            draw: (None, None),
            two: (Some(2.6), Some(2.7)),
        }
    }

    fn detail(id: &str, title: &str) -> EventDetail {
        let mut d = EventDetail::empty(EventId::new(id), format!("https://x/event/4/{}", id));
        d.title = Some(format!("{} - T20 Cup", title));
        d.correlation_key = Some(slugify(title));
        d.runners.insert(
            "Home".into(),
            RunnerOdds {
                best_back: Some(1.5),
                best_lay: Some(1.52),
                ladder: vec![],
            },
        );
        d
    }

    fn outcomes(items: Vec<(&str, FetchOutcome)>) -> BTreeMap<EventId, FetchOutcome> {
        items.into_iter().map(|(id, o)| (EventId::new(id), o)).collect()
    }

    #[test]
    fn test_failed_ids_omitted_and_reported() {
        let (snap, failures) = aggregate(
            1,
            Utc::now(),
            vec![row("India v Australia"), row("Pakistan v England")],
            outcomes(vec![
                ("111", Ok(detail("111", "India v Australia"))),
                ("222", Err(FetchError::Timeout)),
            ]),
        );

        assert_eq!(snap.events.len(), 1);
        assert!(snap.events.contains_key(&EventId::new("111")));
        assert_eq!(failures, vec![(EventId::new("222"), FetchError::Timeout)]);
        assert_eq!(snap.lobby.len(), 2);
        assert_eq!(snap.version, SNAPSHOT_SCHEMA_VERSION);
    }

    #[test]
    fn test_failure_does_not_block_other_events() {
        let (snap, _) = aggregate(
            1,
            Utc::now(),
            vec![],
            outcomes(vec![
                ("1", Err(FetchError::NotFound)),
                ("2", Ok(detail("2", "A v B"))),
                ("3", Err(FetchError::ParseFailure("no table".into()))),
                ("4", Ok(detail("4", "C v D"))),
            ]),
        );
        let ids: Vec<_> = snap.events.keys().map(|k| k.as_str()).collect();
        assert_eq!(ids, vec!["2", "4"]);
    }

    #[test]
    fn test_live_details_only_for_matched_rows() {
        let (snap, _) = aggregate(
            1,
            Utc::now(),
            vec![row("India v Australia"), row("Pakistan v England")],
            outcomes(vec![("111", Ok(detail("111", "India v Australia")))]),
        );

        assert_eq!(snap.live_details.len(), 1);
        let live = &snap.live_details["india-v-australia"];
        assert_eq!(live.event_id, EventId::new("111"));
        assert_eq!(live.bookmaker["Home"].back, Some(1.5));
        assert_eq!(live.title.as_deref(), Some("India v Australia - T20 Cup"));
        for live in snap.live_details.values() {
            assert!(snap.events.contains_key(&live.event_id));
        }
    }

    #[test]
    fn test_duplicate_keys_and_slugs_are_deterministic() {
        let (snap, _) = aggregate(
            1,
            Utc::now(),
            vec![row("India v Australia"), row("India  v  Australia")],
            outcomes(vec![
                ("900", Ok(detail("900", "India v Australia"))),
                ("100", Ok(detail("100", "India v Australia"))),
            ]),
        );
        assert_eq!(snap.live_details.len(), 1);
        assert_eq!(snap.live_details["india-v-australia"].event_id, EventId::new("100"));
    }

    #[test]
    fn test_duplicate_key_tie_break_is_numeric() {
        let (snap, _) = aggregate(
            1,
            Utc::now(),
            vec![row("India v Australia")],
            outcomes(vec![
                ("100000", Ok(detail("100000", "India v Australia"))),
                ("99999", Ok(detail("99999", "India v Australia"))),
            ]),
        );
        assert_eq!(snap.live_details["india-v-australia"].event_id, EventId::new("99999"));
    }

    #[test]
    fn test_successive_cycles_do_not_mix() {
        let (first, _) = aggregate(
            1,
            Utc::now(),
            vec![row("India v Australia")],
            outcomes(vec![("111", Ok(detail("111", "India v Australia")))]),
        );
        let (second, _) = aggregate(
            2,
            Utc::now(),
            vec![row("India v Australia"), row("Pakistan v England")],
            outcomes(vec![("333", Ok(detail("333", "Pakistan v England")))]),
        );

        assert!(first.live_details.contains_key("india-v-australia"));
        assert!(!second.events.contains_key(&EventId::new("111")));
        assert!(!second.live_details.contains_key("india-v-australia"));
        assert_eq!(second.live_details["pakistan-v-england"].event_id, EventId::new("333"));
        for live in second.live_details.values() {
            assert!(second.events.contains_key(&live.event_id));
        }
    }
}
