//! Single-pass extraction: identity rows become accounts, mail rows become
//! messages joined against folders and identities.
use std::collections::HashMap;

use tracing::{debug, info};

use crate::builders::{build_account, build_message, build_party, AccountParts, MessageParts};
use crate::errors::{AppError, AppResult};
use crate::normalize::{canonical_address, TimestampGuard, TimestampPolicy};
use crate::types::{
    Entity, Extraction, ExtractionStats, IdentityRow, MailRow, Party, PartyRole, SourceTables,
};

pub const DEFAULT_SERVICE_NAME: &str = "WEB.DE Mail & Cloud";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Uninitialized,
    SourcesLocated,
    TablesLoaded,
    AccountsEmitted,
    MessagesEmitted,
    Done,
    NoSourceFound,
}

/// How the per-run participant cache identifies a party.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PartyCacheKey {
    /// The address column exactly as stored.
    #[default]
    Raw,
    /// The bare address extracted from the column.
    Canonical,
}

impl std::str::FromStr for PartyCacheKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "canonical" => Ok(Self::Canonical),
            other => Err(AppError::Config(format!("unknown party cache key: {other}"))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub service_name: String,
    pub timestamps: TimestampPolicy,
    pub party_cache_key: PartyCacheKey,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            timestamps: TimestampPolicy::default(),
            party_cache_key: PartyCacheKey::default(),
        }
    }
}

type PartyCache = HashMap<Option<String>, Party>;

pub struct Pipeline {
    options: PipelineOptions,
    stage: Stage,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            stage: Stage::Uninitialized,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Record progress made outside the pipeline (locating and loading the
    /// stores), so the stage log follows the real order of work.
    pub fn advance(&mut self, next: Stage) {
        debug!(from = ?self.stage, to = ?next, "Pipeline stage");
        self.stage = next;
    }

    /// Run over already-loaded tables. `None` means no identity store was
    /// found, which is a normal "nothing to extract" outcome.
    ///
    /// Callers that located and loaded the stores themselves report it through
    /// [`Pipeline::advance`]; tables handed over directly count as loaded.
    pub fn run(&mut self, tables: Option<&SourceTables>) -> AppResult<Extraction> {
        let Some(tables) = tables else {
            self.advance(Stage::NoSourceFound);
            info!("No identity database found; nothing to extract");
            return Ok(Extraction::default());
        };
        if self.stage != Stage::TablesLoaded {
            self.advance(Stage::TablesLoaded);
        }

        let mut timestamps = TimestampGuard::new(self.options.timestamps);
        let mut entities = Vec::with_capacity(tables.identities.len() + tables.mails.len());
        let mut stats = ExtractionStats {
            attachments_loaded: tables.attachments.len(),
            ..ExtractionStats::default()
        };

        for identity in &tables.identities {
            let account = build_account(
                AccountParts {
                    username: identity.email.as_deref(),
                    service_type: &self.options.service_name,
                    created_at: identity.entry_date.as_deref(),
                    name: identity.name.as_deref(),
                    source: tables.identity_source.as_deref(),
                },
                &mut timestamps,
            )?;
            entities.push(Entity::Account(account));
            stats.accounts += 1;
        }
        self.advance(Stage::AccountsEmitted);

        let mut senders = PartyCache::new();
        let mut recipients = PartyCache::new();
        for mail in &tables.mails {
            if mail.subject.is_none() && mail.text_body.is_none() && mail.email_from.is_none() {
                stats.skipped_messages += 1;
                continue;
            }

            let parts = self.message_parts(tables, mail, &mut senders, &mut recipients, &mut timestamps)?;
            entities.push(Entity::Message(build_message(parts)));
            stats.messages += 1;
        }
        self.advance(Stage::MessagesEmitted);

        stats.distinct_senders = senders.len();
        stats.distinct_recipients = recipients.len();
        stats.timestamp_anomalies = timestamps.anomalies();
        info!(
            accounts = stats.accounts,
            messages = stats.messages,
            skipped = stats.skipped_messages,
            attachments = stats.attachments_loaded,
            timestamp_anomalies = stats.timestamp_anomalies,
            "Extraction finished"
        );
        self.advance(Stage::Done);

        Ok(Extraction { entities, stats })
    }

    fn message_parts(
        &self,
        tables: &SourceTables,
        mail: &MailRow,
        senders: &mut PartyCache,
        recipients: &mut PartyCache,
        timestamps: &mut TimestampGuard,
    ) -> AppResult<MessageParts> {
        let folder = tables
            .folders
            .iter()
            .find(|f| mail.folder_id.is_some() && f.id == mail.folder_id)
            .and_then(|f| f.name.clone());

        // Decoded once: the message and all of its parties share it.
        let delivered = timestamps.millis("mail.date", mail.date)?;

        let from = build_party(
            mail.email_from.as_deref(),
            delivered,
            mail.sender.as_deref(),
            PartyRole::From,
        );
        let from = remember(senders, self.cache_key(mail.email_from.as_deref()), from);

        let to_name = identity_by_email(&tables.identities, mail.email_to.as_deref())
            .and_then(|identity| identity.name.as_deref());
        let to = build_party(mail.email_to.as_deref(), delivered, to_name, PartyRole::To);
        let to = remember(recipients, self.cache_key(mail.email_to.as_deref()), to);

        let mut cc = Vec::new();
        if let Some(raw) = non_empty(mail.cc.as_deref()) {
            cc.push(build_party(Some(raw), delivered, None, PartyRole::General));
        }
        let mut bcc = Vec::new();
        if let Some(raw) = non_empty(mail.bcc.as_deref()) {
            bcc.push(build_party(Some(raw), delivered, None, PartyRole::General));
        }

        let account = tables
            .identities
            .iter()
            .find(|identity| mail.account_id.is_some() && identity.account_id == mail.account_id)
            .and_then(|identity| identity.email.clone());

        debug!(mail_id = ?mail.id, folder = ?folder, "Assembled message");
        Ok(MessageParts {
            source: self.options.service_name.clone(),
            folder,
            from,
            to: vec![to],
            subject: mail.subject.clone(),
            body: mail.text_body.clone(),
            unread: mail.is_unread,
            timestamp: delivered,
            // Attachment rows are loaded but not linked to messages.
            attachments: Vec::new(),
            cc,
            bcc,
            account,
        })
    }

    fn cache_key(&self, raw: Option<&str>) -> Option<String> {
        match self.options.party_cache_key {
            PartyCacheKey::Raw => raw.map(str::to_string),
            PartyCacheKey::Canonical => canonical_address(raw),
        }
    }
}

fn remember(cache: &mut PartyCache, key: Option<String>, party: Party) -> Party {
    cache.insert(key, party.clone());
    party
}

fn identity_by_email<'a>(identities: &'a [IdentityRow], email: Option<&str>) -> Option<&'a IdentityRow> {
    let email = email?;
    identities
        .iter()
        .find(|identity| identity.email.as_deref() == Some(email))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
