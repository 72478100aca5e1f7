use super::{is_truthy, rank_of};
use crate::database_ops::games::{GameFields, Platform};
use serde_json::{Map, Value};

// Candidate source keys per target column, highest priority first.
const PUBLISHER_ID: &[&str] = &["publisherId", "publisher_id", "publisher"];
const NAME: &[&str] = &["name", "title"];
const STORE_ID: &[&str] = &["storeId", "store_id", "id", "app_id"];
const BUNDLE_ID: &[&str] = &["bundleId", "bundle_id", "package"];
const APP_VERSION: &[&str] = &["appVersion", "app_version", "version"];

/// Map raw feed records onto game rows for one platform. One row per record,
/// in input order; the platform tag comes from the caller, never the record.
pub fn normalize_games(records: &[Value], platform: Platform) -> Vec<GameFields> {
    records
        .iter()
        .map(|record| normalize_game(record, platform))
        .collect()
}

pub fn normalize_game(record: &Value, platform: Platform) -> GameFields {
    let empty = Map::new();
    let record = record.as_object().unwrap_or(&empty);
    GameFields {
        publisher_id: text_field(record, PUBLISHER_ID),
        name: text_field(record, NAME),
        platform,
        store_id: text_field(record, STORE_ID),
        bundle_id: text_field(record, BUNDLE_ID),
        app_version: text_field(record, APP_VERSION),
        is_published: record.get("isPublished").and_then(published_flag).unwrap_or(true),
        rank: rank_of(record),
    }
}

fn text_field(record: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .filter(|v| is_truthy(v))
        .find_map(scalar_text)
        .unwrap_or_default()
}

// Objects and arrays have no sensible column text and are skipped.
fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn published_flag(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn alternate_field_names_map_to_canonical_columns() {
        let g = normalize_game(
            &json!({"publisher": "Acme", "title": "Game", "app_id": "77"}),
            Platform::Ios,
        );
        assert_eq!(
            g,
            GameFields {
                publisher_id: "Acme".into(),
                name: "Game".into(),
                platform: Platform::Ios,
                store_id: "77".into(),
                bundle_id: String::new(),
                app_version: String::new(),
                is_published: true,
                rank: None,
            }
        );
    }

    #[test]
    fn primary_names_win_over_fallbacks() {
        let g = normalize_game(
            &json!({
                "publisherId": "p1", "publisher": "p2",
                "name": "N", "title": "T",
                "storeId": "s1", "id": "s2",
                "bundleId": "com.a", "package": "com.b",
                "appVersion": "2.0", "version": "1.0",
                "rank": 4
            }),
            Platform::Android,
        );
        assert_eq!(g.publisher_id, "p1");
        assert_eq!(g.name, "N");
        assert_eq!(g.store_id, "s1");
        assert_eq!(g.bundle_id, "com.a");
        assert_eq!(g.app_version, "2.0");
        assert_eq!(g.rank, Some(4));
    }

    #[test]
    fn empty_candidates_fall_through_and_numbers_become_text() {
        let g = normalize_game(
            &json!({"storeId": "", "store_id": null, "id": 284882215, "publisher_id": 0, "publisher": "Fallback"}),
            Platform::Ios,
        );
        assert_eq!(g.store_id, "284882215");
        assert_eq!(g.publisher_id, "Fallback");
    }

    #[test]
    fn missing_fields_get_documented_defaults() {
        for raw in [json!({}), json!(null), json!("junk"), json!({"name": {"en": "x"}})] {
            let g = normalize_game(&raw, Platform::Android);
            assert_eq!(g.name, "");
            assert_eq!(g.publisher_id, "");
            assert_eq!(g.store_id, "");
            assert_eq!(g.bundle_id, "");
            assert_eq!(g.app_version, "");
            assert!(g.is_published);
            assert_eq!(g.rank, None);
            assert_eq!(g.platform, Platform::Android);
        }
    }

    #[test]
    fn explicit_unpublished_is_kept() {
        let g = normalize_game(&json!({"isPublished": false}), Platform::Ios);
        assert!(!g.is_published);
        let g = normalize_game(&json!({"isPublished": "false"}), Platform::Ios);
        assert!(!g.is_published);
        let g = normalize_game(&json!({"isPublished": null}), Platform::Ios);
        assert!(g.is_published);
    }

    #[test]
    fn published_strings_follow_numeric_flags() {
        for raw in ["0", "no", "False", " OFF "] {
            let g = normalize_game(&json!({"isPublished": raw}), Platform::Ios);
            assert!(!g.is_published, "{raw}");
        }
        for raw in ["1", "YES", "true", "maybe", ""] {
            let g = normalize_game(&json!({"isPublished": raw}), Platform::Ios);
            assert!(g.is_published, "{raw}");
        }
        let g = normalize_game(&json!({"isPublished": 0}), Platform::Ios);
        assert!(!g.is_published);
    }

    #[test]
    fn platform_tag_ignores_record_contents() {
        let g = normalize_game(&json!({"platform": "android", "name": "x"}), Platform::Ios);
        assert_eq!(g.platform, Platform::Ios);
    }

    #[test]
    fn batch_preserves_order_and_length() {
        let records = vec![
            json!({"name": "b", "rank": 2}),
            json!(null),
            json!({"name": "a", "rank": 1}),
        ];
        let out = normalize_games(&records, Platform::Android);
        assert_eq!(out.len(), 3);
        let names: Vec<_> = out.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["b", "", "a"]);
        assert!(normalize_games(&[], Platform::Ios).is_empty());
    }
}
