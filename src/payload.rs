//! Raw JSON payload handling
//!
//! The device's list endpoints return bare names (`["introA", "introB"]`)
//! rather than objects. [`normalize_name_list`] turns them into
//! `[{"name": "introA"}, {"name": "introB"}]` before typed decoding. It is a
//! separate step so it can be inspected and tested on its own.

use crate::error::{FppError, Result};
use crate::types::{Device, DeviceUpdate, Playlist, Sequence, SystemStatus};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

/// Top-level keys of a full device payload
pub const SYSTEM_STATUS: &str = "system_status";
pub const PLAYLISTS: &str = "playlists";
pub const SEQUENCES: &str = "sequences";

/// Wrap bare strings of a list payload into `{"name": ...}` records
///
/// Objects already in record form are kept as-is. Non-array values are
/// returned unchanged and left for the decoder to reject.
pub fn normalize_name_list(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(name) => json!({ "name": name }),
                    other => other,
                })
                .collect(),
        ),
        other => other,
    }
}

/// Apply [`normalize_name_list`] to the `playlists` and `sequences` keys of a
/// full device payload
pub fn normalize_device_payload(mut payload: Map<String, Value>) -> Map<String, Value> {
    for key in [PLAYLISTS, SEQUENCES] {
        if let Some(value) = payload.remove(key) {
            payload.insert(key.to_string(), normalize_name_list(value));
        }
    }
    payload
}

/// Whether a response body counts as "no content"
///
/// `null`, `false`, `0`, `""`, `[]` and `{}` are empty.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Decode `value` into `T`, tagging failures with `entity`
pub fn decode<T: DeserializeOwned>(entity: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|source| FppError::Decode {
        entity: entity.to_string(),
        source,
    })
}

/// Decode a system status payload
pub fn decode_system_status(value: Value) -> Result<SystemStatus> {
    decode(SYSTEM_STATUS, value)
}

/// Decode a playlists payload, normalizing bare names first
pub fn decode_playlists(value: Value) -> Result<Vec<Playlist>> {
    decode(PLAYLISTS, normalize_name_list(value))
}

/// Decode a sequences payload, normalizing bare names first
pub fn decode_sequences(value: Value) -> Result<Vec<Sequence>> {
    decode(SEQUENCES, normalize_name_list(value))
}

/// Decode a full `{system_status, playlists, sequences}` payload into a
/// [`Device`]
///
/// All three keys are required.
pub fn decode_device(payload: Map<String, Value>) -> Result<Device> {
    let payload = normalize_device_payload(payload);
    decode("device", Value::Object(payload))
}

/// Decode the sub-trees of an incremental update
///
/// Keys that are missing or whose payload [`is_empty`] are skipped, so the
/// matching field of the device keeps its current value. Nothing is applied
/// here; a decode failure in any sub-tree leaves the device untouched.
pub fn decode_update(mut payload: Map<String, Value>) -> Result<DeviceUpdate> {
    let mut take = |key: &str| payload.remove(key).filter(|value| !is_empty(value));

    let system_status = take(SYSTEM_STATUS);
    let playlists = take(PLAYLISTS);
    let sequences = take(SEQUENCES);

    Ok(DeviceUpdate {
        system_status: system_status.map(decode_system_status).transpose()?,
        playlists: playlists.map(decode_playlists).transpose()?,
        sequences: sequences.map(decode_sequences).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_names_become_records_in_order() {
        let sequences = decode_sequences(json!(["introA", "introB"])).unwrap();

        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].name, "introA");
        assert_eq!(sequences[1].name, "introB");
    }

    #[test]
    fn normalization_keeps_objects() {
        let normalized = normalize_name_list(json!(["a", {"name": "b", "version": 2}]));
        assert_eq!(normalized, json!([{"name": "a"}, {"name": "b", "version": 2}]));
    }

    #[test]
    fn normalization_leaves_non_lists_alone() {
        assert_eq!(normalize_name_list(json!("x")), json!("x"));
        assert_eq!(normalize_name_list(json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn playlists_accept_bare_names() {
        let playlists = decode_playlists(json!(["Main Show", "Test"])).unwrap();

        assert_eq!(playlists[0].name, "Main Show");
        assert_eq!(playlists[1].name, "Test");
        assert!(playlists[0].main_playlist.is_empty());
    }

    #[test]
    fn device_payload_is_normalized_before_decode() {
        let payload = json!({
            "system_status": {"fppd": "running", "volume": 55},
            "playlists": ["Show"],
            "sequences": ["a.fseq", "b.fseq"]
        });
        let Value::Object(map) = payload else {
            unreachable!()
        };

        let device = decode_device(map).unwrap();

        assert_eq!(device.system_status.volume(), 55);
        assert_eq!(device.playlist_names(), vec!["Show"]);
        assert_eq!(device.sequence_names(), vec!["a.fseq", "b.fseq"]);
    }

    #[test]
    fn device_payload_requires_all_keys() {
        let payload = json!({"system_status": {}, "playlists": []});
        let Value::Object(map) = payload else {
            unreachable!()
        };

        let err = decode_device(map).unwrap_err();
        assert!(matches!(err, FppError::Decode { ref entity, .. } if entity == "device"));
    }

    #[test]
    fn update_skips_empty_payloads() {
        let payload = json!({
            "system_status": {"volume": 30},
            "playlists": [],
            "sequences": ["x"]
        });
        let Value::Object(map) = payload else {
            unreachable!()
        };

        let update = decode_update(map).unwrap();

        assert_eq!(update.system_status.map(|s| s.volume()), Some(30));
        assert_eq!(update.playlists, None);
        assert_eq!(update.sequences.unwrap()[0].name, "x");
    }

    #[test]
    fn decode_errors_name_the_entity() {
        let err = decode_system_status(json!({"mode": [1, 2]})).unwrap_err();

        match err {
            FppError::Decode { entity, source } => {
                assert_eq!(entity, "system_status");
                assert!(source.to_string().contains("integer"), "{source}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn sequences_reject_non_list() {
        assert!(decode_sequences(json!({"name": "x"})).is_err());
        assert!(decode_sequences(json!([42])).is_err());
    }

    #[test]
    fn emptiness_follows_truthiness() {
        for value in [json!(null), json!(false), json!(0), json!(""), json!([]), json!({})] {
            assert!(is_empty(&value), "{value} should be empty");
        }
        for value in [json!(true), json!(1), json!("x"), json!(["a"]), json!({"a": 1})] {
            assert!(!is_empty(&value), "{value} should not be empty");
        }
    }
}
