//! Header row classification.
//!
//! The first cell of an iMazing export decides its layout. Column positions
//! are then resolved by name once per file, so the transformers index rows
//! through plain `usize` fields instead of string lookups.

use csv::StringRecord;
use tracing::debug;

use crate::error::{ImportError, Result};
use crate::models::FileKind;

/// First header cell of a call history export
pub const CALL_HISTORY_MARKER: &str = "Call type";
/// First header cell of a message history export
pub const MESSAGE_HISTORY_MARKER: &str = "Chat Session";

/// Column positions of a call history export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallLayout {
    /// `Call Type`: Incoming / Outgoing
    pub call_type: usize,
    /// `Date`
    pub date: usize,
    /// `Duration`
    pub duration: usize,
    /// `Number`
    pub number: usize,
    /// `Contact`
    pub contact: usize,
    /// `Location`
    pub location: Option<usize>,
    /// `Service`, e.g. `Phone: +1234567890` or `WhatsApp Video`
    pub service: usize,
}

/// Column positions of a message history export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLayout {
    /// `Chat Session`
    pub chat_session: usize,
    /// `Message Date`
    pub message_date: usize,
    /// `Delivered Date`
    pub delivered_date: Option<usize>,
    /// `Read Date`
    pub read_date: Option<usize>,
    /// `Edited Date`
    pub edited_date: Option<usize>,
    /// `Service`
    pub service: Option<usize>,
    /// `Type`: Incoming / Outgoing
    pub message_type: usize,
    /// `Sender ID`
    pub sender_id: usize,
    /// `Sender Name`
    pub sender_name: usize,
    /// `Status`
    pub status: usize,
    /// `Replying to`
    pub replying_to: Option<usize>,
    /// `Subject`
    pub subject: usize,
    /// `Text`
    pub text: usize,
    /// `Attachment`
    pub attachment: Option<usize>,
    /// `Attachment type`
    pub attachment_type: Option<usize>,
}

/// A recognized export layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Call history columns
    Call(CallLayout),
    /// Message history columns
    Message(MessageLayout),
}

impl Layout {
    /// Kind of file this layout belongs to
    #[must_use]
    pub const fn file_kind(&self) -> FileKind {
        match self {
            Self::Call(_) => FileKind::CallHistory,
            Self::Message(_) => FileKind::MessageHistory,
        }
    }
}

/// Classify a header row and resolve its column positions.
pub fn resolve(header: &StringRecord) -> Result<Layout> {
    let first = header.get(0).unwrap_or_default().trim_start_matches('\u{feff}');

    let kind = match first {
        CALL_HISTORY_MARKER => FileKind::CallHistory,
        MESSAGE_HISTORY_MARKER => FileKind::MessageHistory,
        _ => {
            return Err(ImportError::UnrecognizedFormat {
                header: first.to_string(),
            })
        },
    };

    let columns = HeaderColumns::new(header, kind);
    for (index, name) in columns.cells.iter().enumerate() {
        debug!(header = %name, index, kind = %kind, "header");
    }

    match kind {
        FileKind::CallHistory => columns.call_layout().map(Layout::Call),
        _ => columns.message_layout().map(Layout::Message),
    }
}

struct HeaderColumns {
    cells: Vec<String>,
    kind: FileKind,
}

impl HeaderColumns {
    fn new(header: &StringRecord, kind: FileKind) -> Self {
        let cells = header
            .iter()
            .map(|cell| cell.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        Self { cells, kind }
    }

    // Exact name first; the call export capitalizes `Call type` differently
    // from the other column names, so fall back to a case-insensitive match.
    fn find(&self, name: &str) -> Option<usize> {
        self.cells
            .iter()
            .position(|cell| cell == name)
            .or_else(|| self.cells.iter().position(|cell| cell.eq_ignore_ascii_case(name)))
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.find(name).ok_or_else(|| ImportError::MissingColumn {
            kind: self.kind,
            column: name.to_string(),
        })
    }

    fn call_layout(&self) -> Result<CallLayout> {
        Ok(CallLayout {
            call_type: self.require("Call Type")?,
            date: self.require("Date")?,
            duration: self.require("Duration")?,
            number: self.require("Number")?,
            contact: self.require("Contact")?,
            location: self.find("Location"),
            service: self.require("Service")?,
        })
    }

    fn message_layout(&self) -> Result<MessageLayout> {
        Ok(MessageLayout {
            chat_session: self.require("Chat Session")?,
            message_date: self.require("Message Date")?,
            delivered_date: self.find("Delivered Date"),
            read_date: self.find("Read Date"),
            edited_date: self.find("Edited Date"),
            service: self.find("Service"),
            message_type: self.require("Type")?,
            sender_id: self.require("Sender ID")?,
            sender_name: self.require("Sender Name")?,
            status: self.require("Status")?,
            replying_to: self.find("Replying to"),
            subject: self.require("Subject")?,
            text: self.require("Text")?,
            attachment: self.find("Attachment"),
            attachment_type: self.find("Attachment type"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALL_HEADER: &[&str] = &["Call type", "Date", "Duration", "Number", "Contact", "Location", "Service"];
    const MESSAGE_HEADER: &[&str] = &[
        "Chat Session",
        "Message Date",
        "Delivered Date",
        "Read Date",
        "Edited Date",
        "Service",
        "Type",
        "Sender ID",
        "Sender Name",
        "Status",
        "Replying to",
        "Subject",
        "Text",
        "Attachment",
        "Attachment type",
    ];

    #[test]
    fn test_call_header() {
        let layout = resolve(&StringRecord::from(CALL_HEADER.to_vec())).unwrap();
        assert_eq!(layout.file_kind(), FileKind::CallHistory);
        assert_eq!(
            layout,
            Layout::Call(CallLayout {
                call_type: 0,
                date: 1,
                duration: 2,
                number: 3,
                contact: 4,
                location: Some(5),
                service: 6,
            })
        );
    }

    #[test]
    fn test_message_header_indexes_every_column() {
        let Layout::Message(layout) = resolve(&StringRecord::from(MESSAGE_HEADER.to_vec())).unwrap() else {
            panic!("expected message layout");
        };
        assert_eq!(layout.chat_session, 0);
        assert_eq!(layout.edited_date, Some(4));
        assert_eq!(layout.message_type, 6);
        assert_eq!(layout.sender_name, 8);
        assert_eq!(layout.text, 12);
        assert_eq!(layout.attachment, Some(13));
        assert_eq!(layout.attachment_type, Some(14));
    }

    #[test]
    fn test_marker_is_case_sensitive() {
        let header = StringRecord::from(vec!["call type", "Date"]);
        let err = resolve(&header).unwrap_err();
        assert!(matches!(err, ImportError::UnrecognizedFormat { ref header } if header == "call type"));
        assert_eq!(err.file_kind(), FileKind::Unknown);
    }

    #[test]
    fn test_invalid_header() {
        let header = StringRecord::from(vec!["Invalid", "Header", "Format"]);
        assert!(matches!(resolve(&header), Err(ImportError::UnrecognizedFormat { .. })));
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let mut cells = CALL_HEADER.to_vec();
        cells[0] = "\u{feff}Call type";
        assert!(matches!(resolve(&StringRecord::from(cells)), Ok(Layout::Call(_))));
    }

    #[test]
    fn test_missing_required_column() {
        let header = StringRecord::from(vec!["Call type", "Date", "Duration", "Number", "Contact"]);
        let err = resolve(&header).unwrap_err();
        match err {
            ImportError::MissingColumn { kind, column } => {
                assert_eq!(kind, FileKind::CallHistory);
                assert_eq!(column, "Service");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let header = StringRecord::from(vec![
            "Chat Session",
            "Message Date",
            "Type",
            "Sender ID",
            "Sender Name",
            "Status",
            "Subject",
            "Text",
        ]);
        let Layout::Message(layout) = resolve(&header).unwrap() else {
            panic!("expected message layout");
        };
        assert_eq!(layout.delivered_date, None);
        assert_eq!(layout.attachment, None);
        assert_eq!(layout.text, 7);
    }
}
