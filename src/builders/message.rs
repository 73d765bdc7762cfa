use chrono::{DateTime, Utc};

use crate::types::{Attachment, DeletedState, Message, MessageStatus, Party};

/// Already-resolved inputs for one message. Joins (folder, owner account),
/// participants and the decoded timestamp are produced by the pipeline before
/// this is assembled.
#[derive(Clone, Debug)]
pub struct MessageParts {
    pub source: String,
    pub folder: Option<String>,
    pub from: Party,
    pub to: Vec<Party>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub unread: Option<bool>,
    pub timestamp: Option<DateTime<Utc>>,
    pub attachments: Vec<Attachment>,
    pub cc: Vec<Party>,
    pub bcc: Vec<Party>,
    pub account: Option<String>,
}

pub fn build_message(parts: MessageParts) -> Message {
    let status = parts.unread.map(|unread| {
        if unread {
            MessageStatus::Unread
        } else {
            MessageStatus::Read
        }
    });

    Message {
        source: parts.source,
        folder: parts.folder,
        from: parts.from,
        to: parts.to,
        subject: parts.subject,
        body: parts.body,
        status,
        timestamp: parts.timestamp,
        attachments: parts.attachments,
        cc: parts.cc,
        bcc: parts.bcc,
        account: parts.account,
        deleted: DeletedState::Intact,
    }
}
