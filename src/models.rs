//! Data models for converted records and the persisted collection
//!
//! The JSON shape follows the SMS Backup & Restore archive: every value is
//! a string, dates are epoch milliseconds, and direction is `"1"` or `"2"`.
//! Record structs keep unknown keys so that entries loaded from an existing
//! collection are written back untouched.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Provenance tag written into every converted call
pub const DATA_FROM_IMAZING: &str = "iMazing";

/// Classification of an input CSV, derived from its header row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Header matched no known layout
    #[default]
    Unknown,
    /// iMazing call history export
    CallHistory,
    /// iMazing message history export
    #[serde(rename = "messages")]
    MessageHistory,
}

impl FileKind {
    /// Name used in logs and metric labels
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::CallHistory => "call_history",
            Self::MessageHistory => "messages",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a call or message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Received by the device owner
    Incoming,
    /// Sent or placed by the device owner
    Outgoing,
}

impl Direction {
    /// Fold an export direction label.
    ///
    /// Only the exact text `Outgoing` is outgoing; every other value,
    /// including unexpected ones, counts as incoming.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label == "Outgoing" {
            Self::Outgoing
        } else {
            Self::Incoming
        }
    }

    /// Direction code stored in the archive
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Incoming => "1",
            Self::Outgoing => "2",
        }
    }
}

/// A single call entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CallRecord {
    /// Contact display name
    pub contact_name: String,
    /// Epoch milliseconds as a decimal string
    pub date: String,
    /// Date text exactly as exported
    pub readable_date: String,
    /// Second display field, filled with the contact name
    pub presentation: String,
    /// Call duration as exported
    pub duration: String,
    /// Provenance tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_from: Option<String>,
    /// Service name without any trailing number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    /// Remote phone number
    pub number: String,
    /// Direction code, `"1"` incoming or `"2"` outgoing
    #[serde(rename = "type")]
    pub kind: String,
    /// Keys this crate does not produce, preserved on round-trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single text message entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageRecord {
    /// Sender name, or the chat session when the sender has no name
    pub contact_name: String,
    /// Message subject
    pub subject: String,
    /// Message text
    pub body: String,
    /// Epoch milliseconds as a decimal string
    pub date: String,
    /// Date text exactly as exported
    pub readable_date: String,
    /// Sender identifier (phone number or e-mail)
    pub address: String,
    /// Delivery status as exported
    pub status: String,
    /// Direction code, `"1"` incoming or `"2"` outgoing
    #[serde(rename = "type")]
    pub kind: String,
    /// Keys this crate does not produce, preserved on round-trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Multimedia message entry, carried through without interpretation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MmsRecord(pub Value);

/// Calls converted from one call history export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calls {
    /// Number of calls as a decimal string
    pub count: String,
    /// Calls in file order
    pub call: Vec<CallRecord>,
}

impl Default for Calls {
    fn default() -> Self {
        Self {
            count: "0".to_string(),
            call: Vec::new(),
        }
    }
}

/// Messages converted from one message history export
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Messages {
    /// Text messages in file order
    pub sms: Vec<MessageRecord>,
    /// Multimedia messages; never filled by the CSV converter
    pub mms: Vec<MmsRecord>,
}

/// Records produced by converting one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordBatch {
    /// Result of a call history conversion
    Calls(Calls),
    /// Result of a message history conversion
    Messages(Messages),
}

impl RecordBatch {
    /// Kind of file the batch was converted from
    #[must_use]
    pub const fn file_kind(&self) -> FileKind {
        match self {
            Self::Calls(_) => FileKind::CallHistory,
            Self::Messages(_) => FileKind::MessageHistory,
        }
    }

    /// Number of records in the batch
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Calls(calls) => calls.call.len(),
            Self::Messages(messages) => messages.sms.len() + messages.mms.len(),
        }
    }

    /// True if the file had a header but no data rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The persisted archive aggregate
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Collection {
    /// All calls, oldest import first
    #[serde(deserialize_with = "null_as_default")]
    pub calls: Vec<CallRecord>,
    /// All text messages, oldest import first
    #[serde(deserialize_with = "null_as_default")]
    pub sms: Vec<MessageRecord>,
    /// All multimedia messages
    #[serde(deserialize_with = "null_as_default")]
    pub mms: Vec<MmsRecord>,
    /// Opaque archive key
    #[serde(deserialize_with = "null_as_default")]
    pub key: String,
    /// Keys this crate does not produce, preserved on round-trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Archives written by other tools store absent sequences as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Collection {
    /// Append converted calls after the existing ones
    pub fn append_calls(&mut self, calls: Calls) {
        self.calls.extend(calls.call);
    }

    /// Append converted messages after the existing ones
    pub fn append_messages(&mut self, messages: Messages) {
        self.sms.extend(messages.sms);
        self.mms.extend(messages.mms);
    }

    /// Append a batch to the sequence matching its kind.
    ///
    /// Returns the number of records appended. Appending is purely
    /// additive: nothing is deduplicated or reordered.
    pub fn append(&mut self, batch: RecordBatch) -> usize {
        let appended = batch.len();
        match batch {
            RecordBatch::Calls(calls) => self.append_calls(calls),
            RecordBatch::Messages(messages) => self.append_messages(messages),
        }
        appended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(number: &str) -> CallRecord {
        CallRecord {
            number: number.to_string(),
            kind: Direction::Incoming.code().to_string(),
            ..CallRecord::default()
        }
    }

    #[test]
    fn test_direction_fold() {
        assert_eq!(Direction::from_label("Outgoing").code(), "2");
        assert_eq!(Direction::from_label("Incoming").code(), "1");
        assert_eq!(Direction::from_label("outgoing").code(), "1");
        assert_eq!(Direction::from_label("Missed").code(), "1");
        assert_eq!(Direction::from_label("").code(), "1");
    }

    #[test]
    fn test_file_kind_display() {
        assert_eq!(FileKind::Unknown.to_string(), "unknown");
        assert_eq!(FileKind::CallHistory.to_string(), "call_history");
        assert_eq!(FileKind::MessageHistory.to_string(), "messages");
    }

    #[test]
    fn test_append_keeps_existing_entries_first() {
        let mut collection = Collection {
            calls: vec![call("+100")],
            ..Collection::default()
        };
        let batch = Calls {
            count: "2".to_string(),
            call: vec![call("+200"), call("+300")],
        };

        let appended = collection.append(RecordBatch::Calls(batch));

        assert_eq!(appended, 2);
        let numbers: Vec<_> = collection.calls.iter().map(|c| c.number.as_str()).collect();
        assert_eq!(numbers, ["+100", "+200", "+300"]);
        assert!(collection.sms.is_empty());
    }

    #[test]
    fn test_call_record_serializes_type_key() {
        let record = CallRecord {
            kind: "2".to_string(),
            data_from: Some(DATA_FROM_IMAZING.to_string()),
            ..CallRecord::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "2");
        assert_eq!(json["data_from"], "iMazing");
        assert!(json.get("service_type").is_none());
    }

    #[test]
    fn test_null_sequences_load_as_empty() {
        let raw = r#"{"calls":null,"sms":null,"mms":null,"key":null,"version":3}"#;
        let mut collection: Collection = serde_json::from_str(raw).unwrap();
        assert!(collection.calls.is_empty());
        assert!(collection.sms.is_empty());
        assert!(collection.mms.is_empty());
        assert_eq!(collection.key, "");
        assert_eq!(collection.extra["version"], 3);

        collection.append(RecordBatch::Calls(Calls {
            count: "1".to_string(),
            call: vec![call("+1")],
        }));
        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(json["calls"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["sms"], serde_json::json!([]));
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let raw = r#"{"contact_name":"Ann","number":"+1","type":"1","subscription_id":"7"}"#;
        let record: CallRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.extra["subscription_id"], "7");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["subscription_id"], "7");
        assert_eq!(json["contact_name"], "Ann");
    }
}
