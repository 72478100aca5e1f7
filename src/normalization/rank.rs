use super::{first_truthy, rank_of};
use serde_json::{Map, Value};

const NAME_KEYS: &[&str] = &["name", "title"];
const ID_KEYS: &[&str] = &["id", "app_id", "storeId", "store_id"];

/// Top `limit` ranked records of a feed payload, ordered by rank.
///
/// The payload may be a flat array of records or an array of per-rank arrays;
/// it is flattened by exactly one level. Only objects with a truthy integer
/// `rank`, a name-like field and an id-like field survive. Ties keep their
/// feed order. Note that `rank: 0` counts as missing and is dropped.
///
/// Anything that is not a non-empty array yields an empty list.
pub fn extract_top_by_rank(payload: &Value, limit: usize) -> Vec<Value> {
    let Some(entries) = payload.as_array().filter(|a| !a.is_empty()) else {
        return Vec::new();
    };

    let mut ranked: Vec<(i64, &Value)> = entries
        .iter()
        .flat_map(|entry| match entry {
            Value::Array(inner) => inner.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .filter_map(|entry| {
            let record = entry.as_object()?;
            if !is_well_formed(record) {
                return None;
            }
            rank_of(record).map(|rank| (rank, entry))
        })
        .collect();

    // sort_by_key is stable
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked
        .into_iter()
        .take(limit)
        .map(|(_, entry)| entry.clone())
        .collect()
}

fn is_well_formed(record: &Map<String, Value>) -> bool {
    first_truthy(record, NAME_KEYS).is_some() && first_truthy(record, ID_KEYS).is_some()
}
