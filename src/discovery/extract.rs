//! Event-id extraction from a discovery payload of unknown shape.
//!
//! The eventtype endpoint has returned at least three layouts over time:
//! a bare array of ids, `{"events": {"34848333": {...}}}` keyed by id, and
//! lists of market objects carrying `eventId` / `event.id`. Rather than model
//! any of them, the payload is walked generically and every value that looks
//! like an event id in a plausible position is collected.
//!
//! Acceptance rules:
//! - a scalar under an id-named key (`id`, `eventId`, `event_id`, ...) is taken
//!   if it is a non-negative integer or an all-digit string;
//! - an object key that is itself a long digit run is taken (id-keyed maps);
//! - array elements inherit the position of the key holding the array, so
//!   `"eventIds": [..]` vouches for its items and `"openDates": [..]` does not;
//! - a bare scalar (the root, or inside arrays with no enclosing key) is
//!   taken only if it is a long digit run, since there is no key to vouch for it.
//!
//! Floats are never ids, which keeps prices out.

use serde_json::Value;
use std::collections::HashSet;

use crate::models::EventId;

/// Keys whose scalar values are treated as event ids (lowercased, `_` removed).
const ID_KEYS: &[&str] = &["id", "eventid", "eventidpk", "eventpk", "eventpkid"];

/// Digit-run length accepted for keyed ids. Short runs are runner and
/// selection ids nested inside event objects.
const KEYED_DIGITS: std::ops::RangeInclusive<usize> = 3..=19;
/// Digit-run length accepted without a vouching key. Upper bound excludes
/// epoch-millisecond timestamps.
const BARE_DIGITS: std::ops::RangeInclusive<usize> = 5..=12;

#[derive(Clone, Copy)]
enum Position {
    /// Root value, or an element of an array with no enclosing key
    Bare,
    /// Value of an id-named key
    IdKey,
    /// Value of any other key
    OtherKey,
}

enum Frame<'a> {
    Key(&'a str),
    Value(&'a Value, Position),
}

/// Collect candidate event ids in first-seen order, without duplicates.
///
/// Never fails: an unexpected shape simply yields fewer (or no) ids.
pub fn extract_event_ids(payload: &Value) -> Vec<EventId> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut push = |candidate: String| {
        if seen.insert(candidate.clone()) {
            out.push(EventId::new(candidate));
        }
    };

    // Explicit stack so hostile nesting depth cannot overflow ours.
    let mut stack = vec![Frame::Value(payload, Position::Bare)];
    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Key(key) => {
                if let Some(id) = digit_run(key, BARE_DIGITS) {
                    push(id);
                }
            }
            Frame::Value(Value::Object(map), _) => {
                for (key, value) in map.iter().rev() {
                    let position = if is_id_key(key) {
                        Position::IdKey
                    } else {
                        Position::OtherKey
                    };
                    stack.push(Frame::Value(value, position));
                    stack.push(Frame::Key(key));
                }
            }
            Frame::Value(Value::Array(items), position) => {
                for item in items.iter().rev() {
                    stack.push(Frame::Value(item, position));
                }
            }
            Frame::Value(scalar, Position::IdKey) => {
                if let Some(id) = scalar_id(scalar, KEYED_DIGITS) {
                    push(id);
                }
            }
            Frame::Value(scalar, Position::Bare) => {
                if let Some(id) = scalar_id(scalar, BARE_DIGITS) {
                    push(id);
                }
            }
            Frame::Value(_, Position::OtherKey) => {}
        }
    }

    out
}

fn is_id_key(key: &str) -> bool {
    let normalized: String = key
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();
    ID_KEYS.contains(&normalized.as_str())
}

fn scalar_id(value: &Value, digits: std::ops::RangeInclusive<usize>) -> Option<String> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|v| v.to_string())
            .filter(|s| digits.contains(&s.len())),
        Value::String(s) => digit_run(s, digits),
        _ => None,
    }
}

fn digit_run(text: &str, digits: std::ops::RangeInclusive<usize>) -> Option<String> {
    let t = text.trim();
    if digits.contains(&t.len()) && t.bytes().all(|b| b.is_ascii_digit()) {
        Some(t.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(v: &Value) -> Vec<String> {
        extract_event_ids(v)
            .into_iter()
            .map(|id| id.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_mixed_result_list() {
        let v = json!({"result": [{"id": 111}, {"eventId": "222"}, "not-an-id"]});
        assert_eq!(ids(&v), vec!["111", "222"]);
    }

    #[test]
    fn test_id_keyed_events_map() {
        let v = json!({"events": {"34848333": {"name": "A v B"}, "34848400": {"name": "C v D"}}});
        assert_eq!(ids(&v), vec!["34848333", "34848400"]);
    }

    #[test]
    fn test_nested_event_object() {
        let v = json!([{"market": "winner", "event": {"id": 34848333, "openDate": 1760000000000u64}}]);
        assert_eq!(ids(&v), vec!["34848333"]);
    }

    #[test]
    fn test_bare_array_of_ids() {
        let v = json!([34848333, "34848334", 34848333]);
        assert_eq!(ids(&v), vec!["34848333", "34848334"]);
    }

    #[test]
    fn test_incidental_numbers_ignored() {
        let v = json!({
            "price": 195,
            "back": 1.95,
            "volume": "250000",
            "openDate": 1760000000000u64,
            "ts": [1760000000000u64, 1.5, 7],
            "id": 12.5,
        });
        assert!(ids(&v).is_empty());
    }

    #[test]
    fn test_keyed_arrays_follow_their_key() {
        let v = json!({
            "events": [{"event": {"id": 34848333}, "runners": [{"id": 1}, {"id": 2}]}],
            "openDates": [1760000000, 1760003600],
            "volumes": [250000, 300000],
        });
        assert_eq!(ids(&v), vec!["34848333"]);

        let v = json!({"eventIds": [34848333, "34848334"], "counts": [[12345678]]});
        assert_eq!(ids(&v), vec!["34848333", "34848334"]);
    }

    #[test]
    fn test_nested_arrays_without_key_stay_bare() {
        let v = json!([[34848333, 7], [1.5, "34848334"]]);
        assert_eq!(ids(&v), vec!["34848333", "34848334"]);
    }

    #[test]
    fn test_short_keyed_ids_rejected() {
        let v = json!([{"id": 1}, {"eventId": "42"}, {"id": 111}]);
        assert_eq!(ids(&v), vec!["111"]);
    }

    #[test]
    fn test_key_name_variants() {
        let v = json!([
            {"event_id": 1001},
            {"EventId": "1002"},
            {"eventPkId": 1003},
            {"id": -5},
            {"id": "12a"}
        ]);
        assert_eq!(ids(&v), vec!["1001", "1002", "1003"]);
    }

    #[test]
    fn test_first_seen_order_and_dedup() {
        let v = json!({
            "b": [{"id": 300}, {"id": 100}],
            "a": {"eventId": "300", "children": [{"id": 200}, {"id": 100}]}
        });
        assert_eq!(ids(&v), vec!["300", "100", "200"]);
    }

    #[test]
    fn test_scalar_and_empty_roots() {
        assert!(ids(&Value::Null).is_empty());
        assert!(ids(&json!({})).is_empty());
        assert!(ids(&json!([])).is_empty());
        assert!(ids(&json!(true)).is_empty());
        assert!(ids(&json!("hello")).is_empty());
        assert_eq!(ids(&json!("34848333")), vec!["34848333"]);
    }

    #[test]
    fn test_deep_nesting_terminates() {
        let mut v = json!({"id": 424242});
        for _ in 0..10_000 {
            v = json!([v]);
        }
        assert_eq!(ids(&v), vec!["424242"]);
        // Dropping a deeply nested Value recurses in serde_json; leak it instead.
        std::mem::forget(v);
    }

    #[test]
    fn test_repeated_shared_substructure() {
        let shared = json!({"event": {"id": 555}, "markets": [{"id": 555}]});
        let v = json!([shared.clone(), shared.clone(), {"wrap": shared}]);
        assert_eq!(ids(&v), vec!["555"]);
    }
}
