// Copyright (c) Microsoft Corporation.

//! The persisted JSON shape of a cache entry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use rewarm_backend::{Entry, Error};

/// The wire record for a stored entry.
///
/// The error is flattened to its message; an empty string means no error.
/// Deserialisation reconstructs a plain message-only error, so error identity
/// is not preserved across this backend.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: DeserializeOwned", serialize = "T: Serialize"))]
struct StoredEntry<T> {
    #[serde(default)]
    data: Option<T>,
    err: String,
    created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fixed_expiration: Option<DateTime<Utc>>,
}

pub(crate) fn encode<T>(entry: &Entry<T>) -> Result<String, Error>
where
    T: Serialize + Clone,
{
    let record = StoredEntry {
        data: entry.data().map(|data| data.as_ref().clone()),
        err: entry.error().map(ToString::to_string).unwrap_or_default(),
        created: entry.created(),
        fixed_expiration: entry.fixed_expiration(),
    };

    serde_json::to_string(&record).map_err(Error::other)
}

pub(crate) fn decode<T>(raw: &str) -> Result<Entry<T>, Error>
where
    T: DeserializeOwned,
{
    let record: StoredEntry<T> = serde_json::from_str(raw).map_err(Error::other)?;

    let err = if record.err.is_empty() {
        None
    } else {
        Some(Error::message(record.err))
    };

    Ok(Entry::from_parts(
        record.data.map(Arc::new),
        err,
        record.created,
        record.fixed_expiration,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn value_entries_round_trip() {
        let entry = Entry::ok("payload".to_string());

        let raw = encode(&entry).unwrap();
        let decoded: Entry<String> = decode(&raw).unwrap();

        assert_eq!(decoded.data().map(|v| v.as_str()), Some("payload"));
        assert!(decoded.error().is_none());
        assert_eq!(decoded.created(), entry.created());
        assert_eq!(decoded.fixed_expiration(), None);
    }

    #[test]
    fn error_entries_become_plain_messages() {
        let source = Error::backend_read("upstream", std::io::Error::other("socket closed"));
        let entry = Entry::<String>::err(source, Duration::from_secs(30));

        let raw = encode(&entry).unwrap();
        let decoded: Entry<String> = decode(&raw).unwrap();

        // The message survives, the type does not.
        let replayed = decoded.error().expect("error should survive the round trip");
        assert!(matches!(replayed, Error::Message(_)));
        assert!(replayed.to_string().contains("upstream"));
        assert_eq!(decoded.fixed_expiration(), entry.fixed_expiration());
    }

    #[test]
    fn empty_sentinel_round_trips() {
        let entry = Entry::<String>::empty_expired();

        let raw = encode(&entry).unwrap();
        let decoded: Entry<String> = decode(&raw).unwrap();

        assert!(decoded.data().is_none());
        assert!(decoded.error().is_none());
        assert!(decoded.fixed_expiration().is_some());
    }

    #[test]
    fn wire_layout_uses_the_expected_field_names() {
        let entry = Entry::from_parts(
            Some(Arc::new(7)),
            None,
            Utc::now(),
            Some(Utc::now() + chrono::TimeDelta::minutes(1)),
        );

        let raw = encode(&entry).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let object = value.as_object().unwrap();

        assert!(object.contains_key("data"));
        assert!(object.contains_key("err"));
        assert!(object.contains_key("created"));
        assert!(object.contains_key("fixedExpiration"));
    }

    #[test]
    fn fixed_expiration_is_omitted_when_absent() {
        let raw = encode(&Entry::ok(7)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert!(value.get("fixedExpiration").is_none());
        assert_eq!(value.get("err"), Some(&serde_json::Value::String(String::new())));
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(decode::<String>("not json").is_err());
    }
}
