use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Raw rows, as read from the app's SQLite stores. Every column is nullable.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityRow {
    pub account_id: Option<i64>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub entry_date: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MailRow {
    pub id: Option<i64>,
    pub folder_id: Option<i64>,
    pub account_id: Option<i64>,
    pub email_from: Option<String>,
    pub email_to: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub subject: Option<String>,
    pub text_body: Option<String>,
    pub sender: Option<String>,
    pub is_unread: Option<bool>,
    pub date: Option<i64>, // milliseconds since the Unix epoch
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FolderRow {
    pub id: Option<i64>,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttachmentRow {
    pub mail_id: Option<i64>,
    pub file_name: Option<String>,
}

/// All rows of the four logical tables, in the order the store delivered them.
#[derive(Clone, Debug, Default)]
pub struct SourceTables {
    pub identities: Vec<IdentityRow>,
    pub mails: Vec<MailRow>,
    pub folders: Vec<FolderRow>,
    pub attachments: Vec<AttachmentRow>,
    /// Where the identity rows came from, recorded on every account.
    pub identity_source: Option<String>,
}

// Normalized entities handed to the result sink.

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeletedState {
    #[default]
    Intact,
    Deleted,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PartyRole {
    From,
    To,
    Cc,
    Bcc,
    #[default]
    General,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MessageStatus {
    Read,
    Unread,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Party {
    pub identifier: Option<String>,
    pub name: Option<String>,
    pub role: PartyRole,
    pub date_delivered: Option<DateTime<Utc>>,
    pub deleted: DeletedState,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub username: Option<String>,
    pub service_type: String,
    pub time_created: Option<DateTime<Utc>>,
    pub name: String,
    pub source: Option<String>,
    pub deleted: DeletedState,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub source: String,
    pub folder: Option<String>,
    pub from: Party,
    pub to: Vec<Party>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub status: Option<MessageStatus>,
    pub timestamp: Option<DateTime<Utc>>,
    pub attachments: Vec<Attachment>,
    pub cc: Vec<Party>,
    pub bcc: Vec<Party>,
    pub account: Option<String>,
    pub deleted: DeletedState,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum Entity {
    Account(Account),
    Message(Message),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionStats {
    pub accounts: usize,
    pub messages: usize,
    pub skipped_messages: usize,
    pub distinct_senders: usize,
    pub distinct_recipients: usize,
    pub attachments_loaded: usize,
    pub timestamp_anomalies: usize,
}

/// One run's output: accounts first, then messages.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Extraction {
    pub entities: Vec<Entity>,
    pub stats: ExtractionStats,
}

impl Extraction {
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.entities.iter().filter_map(|e| match e {
            Entity::Account(a) => Some(a),
            Entity::Message(_) => None,
        })
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entities.iter().filter_map(|e| match e {
            Entity::Message(m) => Some(m),
            Entity::Account(_) => None,
        })
    }
}
