use chrono::Duration;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::account::Account;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JogMode {
    /// From the start point to a chosen destination.
    Linear,
    /// A closed loop back to the start point.
    Circular,
}

/// A finished jog, in the shape it is uploaded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JogRecord {
    #[serde(rename = "jogid")]
    pub jog_id: Id<JogRecord>,
    #[serde(rename = "uid")]
    pub user_id: Id<Account>,
    #[serde(with = "utility::serde::duration_millis")]
    pub time: Duration,
    /// meters
    pub distance: f64,
}

impl HasId for JogRecord {
    type IdType = u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_uses_upload_field_names() {
        let record = JogRecord {
            jog_id: Id::new(3),
            user_id: Id::new(7),
            time: Duration::milliseconds(61_000),
            distance: 5230.5,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "jogid": 3, "uid": 7, "time": 61000, "distance": 5230.5 })
        );
        let back: JogRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn modes_are_lowercase() {
        assert_eq!(serde_json::to_value(JogMode::Circular).unwrap(), "circular");
        let mode: JogMode = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(mode, JogMode::Linear);
    }
}
