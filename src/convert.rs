//! CSV to record conversion.
//!
//! Rows are transformed strictly in file order. Any bad row aborts the
//! whole conversion, so callers either get every record or none.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use csv::{Reader, ReaderBuilder, StringRecord};
use tracing::{debug, trace};

use crate::error::{DateFormatError, ImportError, Result};
use crate::header::{self, CallLayout, Layout, MessageLayout};
use crate::models::{CallRecord, Calls, Direction, FileKind, MessageRecord, Messages, RecordBatch, DATA_FROM_IMAZING};
use crate::validation::InputValidator;

/// Layout of the date columns, e.g. `2024-03-15 14:30:00`
pub const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert the export at `path`.
///
/// A missing file is rejected before any CSV parsing happens.
pub fn convert_file(path: &Path) -> Result<RecordBatch> {
    InputValidator::validate_import_file(path)?;
    debug!(file = %path.display(), "converting file");
    let file = File::open(path)?;
    convert_reader(file)
}

/// Convert an export read from any byte source.
pub fn convert_reader<R: Read>(input: R) -> Result<RecordBatch> {
    let mut reader = ReaderBuilder::new().has_headers(false).from_reader(input);

    let mut header = StringRecord::new();
    let has_header = reader
        .read_record(&mut header)
        .map_err(|source| ImportError::RowRead {
            kind: FileKind::Unknown,
            row: 0,
            source,
        })?;
    if !has_header {
        return Err(ImportError::EmptyInput);
    }

    match header::resolve(&header)? {
        Layout::Call(layout) => transform_calls(&mut reader, &layout).map(RecordBatch::Calls),
        Layout::Message(layout) => transform_messages(&mut reader, &layout).map(RecordBatch::Messages),
    }
}

/// Transform the remaining rows of a call history export.
pub fn transform_calls<R: Read>(reader: &mut Reader<R>, layout: &CallLayout) -> Result<Calls> {
    let kind = FileKind::CallHistory;
    let mut calls = Calls::default();
    let mut record = StringRecord::new();
    let mut row = 0;

    while next_row(reader, &mut record, kind, row + 1)? {
        row += 1;
        let readable_date = field(&record, layout.date);
        let contact = field(&record, layout.contact);

        let call = CallRecord {
            contact_name: contact.to_string(),
            date: epoch_millis(readable_date, kind, row)?,
            readable_date: readable_date.to_string(),
            presentation: contact.to_string(),
            duration: field(&record, layout.duration).to_string(),
            data_from: Some(DATA_FROM_IMAZING.to_string()),
            service_type: Some(service_type(field(&record, layout.service)).to_string()),
            number: field(&record, layout.number).to_string(),
            kind: Direction::from_label(field(&record, layout.call_type)).code().to_string(),
            ..CallRecord::default()
        };
        trace!(row, number = %call.number, "call found");
        calls.call.push(call);
    }

    calls.count = calls.call.len().to_string();
    Ok(calls)
}

/// Transform the remaining rows of a message history export.
///
/// Delivered, read and edited dates as well as attachment columns are
/// resolved by the header but not carried into the records.
pub fn transform_messages<R: Read>(reader: &mut Reader<R>, layout: &MessageLayout) -> Result<Messages> {
    let kind = FileKind::MessageHistory;
    let mut messages = Messages::default();
    let mut record = StringRecord::new();
    let mut row = 0;

    while next_row(reader, &mut record, kind, row + 1)? {
        row += 1;
        let readable_date = field(&record, layout.message_date);
        let contact_name = match field(&record, layout.sender_name) {
            "" => field(&record, layout.chat_session),
            name => name,
        };

        let sms = MessageRecord {
            contact_name: contact_name.to_string(),
            subject: field(&record, layout.subject).to_string(),
            body: field(&record, layout.text).to_string(),
            date: epoch_millis(readable_date, kind, row)?,
            readable_date: readable_date.to_string(),
            address: field(&record, layout.sender_id).to_string(),
            status: field(&record, layout.status).to_string(),
            kind: Direction::from_label(field(&record, layout.message_type)).code().to_string(),
            ..MessageRecord::default()
        };
        trace!(row, contact = %sms.contact_name, "message found");
        messages.sms.push(sms);
    }

    Ok(messages)
}

/// Service name with any `:`-separated suffix removed.
///
/// `Phone: +1234567890` becomes `Phone`; text without a colon is returned
/// unchanged.
#[must_use]
pub fn service_type(raw: &str) -> &str {
    raw.split_once(':').map_or(raw, |(service, _)| service)
}

/// Parse an export date and render it as epoch milliseconds.
///
/// The export carries no zone, so the wall-clock value is taken as UTC.
/// chrono accepts unpadded fields, extra whitespace and signed years, so the
/// text must also read back identically in the fixed layout.
pub fn parse_export_date(text: &str) -> std::result::Result<String, DateFormatError> {
    let parsed = NaiveDateTime::parse_from_str(text, EXPORT_DATE_FORMAT)?;
    if parsed.format(EXPORT_DATE_FORMAT).to_string() != text {
        return Err(DateFormatError::Layout);
    }
    Ok(parsed.and_utc().timestamp_millis().to_string())
}

fn epoch_millis(text: &str, kind: FileKind, row: usize) -> Result<String> {
    parse_export_date(text).map_err(|source| ImportError::DateParse {
        kind,
        row,
        value: text.to_string(),
        source,
    })
}

fn next_row<R: Read>(reader: &mut Reader<R>, record: &mut StringRecord, kind: FileKind, row: usize) -> Result<bool> {
    reader
        .read_record(record)
        .map_err(|source| ImportError::RowRead { kind, row, source })
}

// The reader is not flexible, so every row has as many fields as the header
// and resolved positions are always in range.
fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALL_HEADER: &str = "Call type,Date,Duration,Number,Contact,Location,Service\n";

    fn convert_calls(body: &str) -> Result<Calls> {
        match convert_reader(format!("{CALL_HEADER}{body}").as_bytes())? {
            RecordBatch::Calls(calls) => Ok(calls),
            RecordBatch::Messages(_) => panic!("expected calls"),
        }
    }

    #[test]
    fn test_service_type_split() {
        assert_eq!(service_type("Phone: +1234567890"), "Phone");
        assert_eq!(service_type("Signal Audio"), "Signal Audio");
        assert_eq!(service_type("a:b:c"), "a");
        assert_eq!(service_type(":leading"), "");
        assert_eq!(service_type(""), "");
    }

    #[test]
    fn test_parse_export_date() {
        assert_eq!(parse_export_date("2024-03-15 14:30:00").unwrap(), "1710513000000");
        assert_eq!(parse_export_date("1970-01-01 00:00:01").unwrap(), "1000");
        assert!(parse_export_date("15.03.2024 14:30").is_err());
        assert!(parse_export_date("2024-03-15T14:30:00").is_err());
    }

    #[test]
    fn test_parse_export_date_requires_fixed_layout() {
        for text in [
            "2024-3-5 14:30:00",
            "2024-03-15 14:3:0",
            "2024-03-15   14:30:00",
            "2024-03-1514:30:00",
            "+2024-03-15 14:30:00",
        ] {
            assert!(
                matches!(parse_export_date(text), Err(DateFormatError::Layout)),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn test_call_row() {
        let calls = convert_calls("Outgoing,2024-03-15 14:30:00,00:01:00,+1234567890,Test Contact,USA,Phone: +1234567890\n").unwrap();
        assert_eq!(calls.count, "1");

        let call = &calls.call[0];
        assert_eq!(call.contact_name, "Test Contact");
        assert_eq!(call.presentation, "Test Contact");
        assert_eq!(call.date, "1710513000000");
        assert_eq!(call.readable_date, "2024-03-15 14:30:00");
        assert_eq!(call.duration, "00:01:00");
        assert_eq!(call.number, "+1234567890");
        assert_eq!(call.data_from.as_deref(), Some("iMazing"));
        assert_eq!(call.service_type.as_deref(), Some("Phone"));
        assert_eq!(call.kind, "2");
    }

    #[test]
    fn test_header_only_call_file() {
        let calls = convert_calls("").unwrap();
        assert!(calls.call.is_empty());
        assert_eq!(calls.count, "0");
    }

    #[test]
    fn test_bad_date_aborts_conversion() {
        let err = convert_calls(
            "Outgoing,2024-03-15 14:30:00,00:01:00,+1,A,USA,Phone\n\
             Incoming,yesterday,00:01:00,+2,B,USA,Phone\n",
        )
        .unwrap_err();
        match err {
            ImportError::DateParse { kind, row, value, .. } => {
                assert_eq!(kind, FileKind::CallHistory);
                assert_eq!(row, 2);
                assert_eq!(value, "yesterday");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_row_is_rejected() {
        let err = convert_calls("Outgoing,2024-03-15 14:30:00,00:01:00\n").unwrap_err();
        assert!(matches!(err, ImportError::RowRead { kind: FileKind::CallHistory, row: 1, .. }));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(convert_reader("".as_bytes()), Err(ImportError::EmptyInput)));
    }
}
