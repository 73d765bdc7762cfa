use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

use crate::storage::locate::SourceSet;
use crate::types::{AttachmentRow, FolderRow, IdentityRow, MailRow, SourceTables};

/// Read-only handle on one of the app's SQLite stores.
#[derive(Clone)]
pub struct SourceDatabase {
    pool: SqlitePool,
    path: PathBuf,
}

impl SourceDatabase {
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            // Device stores come with leftover -journal/-wal files; never try to
            // recover them.
            .immutable(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("opening sqlite store {}", path.display()))?;

        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    pub async fn load_identities(&self) -> Result<Vec<IdentityRow>> {
        let rows = self.fetch_table("Identity").await?;
        Ok(rows
            .iter()
            .map(|row| IdentityRow {
                account_id: loose_int(row, "accountId"),
                email: loose_text(row, "email"),
                name: loose_text(row, "name"),
                entry_date: loose_text(row, "entryDate"),
            })
            .collect())
    }

    pub async fn load_mails(&self) -> Result<Vec<MailRow>> {
        let rows = self.fetch_table("mail").await?;
        Ok(rows
            .iter()
            .map(|row| MailRow {
                id: loose_int(row, "_id"),
                folder_id: loose_int(row, "folderId"),
                account_id: loose_int(row, "account_id"),
                email_from: loose_text(row, "email_from"),
                email_to: loose_text(row, "email_to"),
                cc: loose_text(row, "cc"),
                bcc: loose_text(row, "bcc"),
                subject: loose_text(row, "subject"),
                text_body: loose_text(row, "textbody"),
                sender: loose_text(row, "sender"),
                is_unread: loose_bool(row, "isUnread"),
                date: loose_int(row, "date"),
            })
            .collect())
    }

    pub async fn load_folders(&self) -> Result<Vec<FolderRow>> {
        let rows = self.fetch_table("folder").await?;
        Ok(rows
            .iter()
            .map(|row| FolderRow {
                id: loose_int(row, "_id"),
                name: loose_text(row, "name"),
            })
            .collect())
    }

    pub async fn load_attachments(&self) -> Result<Vec<AttachmentRow>> {
        let rows = self.fetch_table("attachment").await?;
        Ok(rows
            .iter()
            .map(|row| AttachmentRow {
                mail_id: loose_int(row, "mailId"),
                file_name: loose_text(row, "name"),
            })
            .collect())
    }

    async fn fetch_table(&self, table: &str) -> Result<Vec<SqliteRow>> {
        // Table names are fixed identifiers, never user input.
        let sql = format!("SELECT * FROM \"{table}\" ORDER BY rowid");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("reading table {table} from {}", self.path.display()))?;
        debug!(table, rows = rows.len(), path = %self.path.display(), "Loaded table");
        Ok(rows)
    }
}

/// Read every table the pipeline consumes from the located stores.
///
/// Without a mail_room store only accounts can be produced; its tables load
/// as empty.
pub async fn load_tables(sources: &SourceSet) -> Result<SourceTables> {
    let identity_db = SourceDatabase::open(&sources.identity).await?;
    let identities = identity_db.load_identities().await?;
    identity_db.close().await;

    let mut tables = SourceTables {
        identities,
        identity_source: Some(sources.identity.display().to_string()),
        ..SourceTables::default()
    };

    if let Some(path) = &sources.mail_room {
        let mail_db = SourceDatabase::open(path).await?;
        tables.mails = mail_db.load_mails().await?;
        tables.folders = mail_db.load_folders().await?;
        tables.attachments = mail_db.load_attachments().await?;
        mail_db.close().await;
    }

    info!(
        identities = tables.identities.len(),
        mails = tables.mails.len(),
        folders = tables.folders.len(),
        attachments = tables.attachments.len(),
        "Loaded source tables"
    );
    Ok(tables)
}

// SQLite columns are loosely typed: ids and flags show up as INTEGER or TEXT
// depending on app version, and older schemas lack some columns entirely. A
// missing column reads as `None` silently; a present but undecodable value is
// logged.

fn has_column(row: &SqliteRow, column: &str) -> bool {
    row.try_column(column).is_ok()
}

fn loose_int(row: &SqliteRow, column: &str) -> Option<i64> {
    if !has_column(row, column) {
        return None;
    }
    if let Ok(value) = row.try_get::<Option<i64>, _>(column) {
        return value;
    }

    let parsed = loose_text(row, column).and_then(|s| s.trim().parse().ok());
    if parsed.is_none() {
        warn!(column, "Non-integer value in integer column; leaving unset");
    }
    parsed
}

fn loose_text(row: &SqliteRow, column: &str) -> Option<String> {
    if !has_column(row, column) {
        return None;
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(column) {
        return value;
    }
    if let Ok(value) = row.try_get::<Option<i64>, _>(column) {
        return value.map(|v| v.to_string());
    }

    match row.try_get::<Option<Vec<u8>>, _>(column) {
        Ok(bytes) => {
            warn!(column, "Invalid UTF-8 in text column; decoding lossily");
            bytes.map(|b| String::from_utf8_lossy(&b).into_owned())
        }
        Err(e) => {
            warn!(column, error = %e, "Undecodable text column; leaving unset");
            None
        }
    }
}

fn loose_bool(row: &SqliteRow, column: &str) -> Option<bool> {
    if !has_column(row, column) {
        return None;
    }
    if let Ok(value) = row.try_get::<Option<i64>, _>(column) {
        return value.map(|v| v != 0);
    }

    let flag = loose_text(row, column);
    match flag.as_deref().map(|s| s.trim().to_ascii_lowercase()) {
        Some(s) if s == "1" || s == "true" => Some(true),
        Some(s) if s == "0" || s == "false" => Some(false),
        _ => {
            warn!(column, value = ?flag, "Unrecognized boolean value; leaving unset");
            None
        }
    }
}
