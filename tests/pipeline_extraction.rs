use chrono::{TimeZone, Utc};
use mailroom::errors::AppError;
use mailroom::normalize::TimestampPolicy;
use mailroom::pipeline::{PartyCacheKey, Pipeline, PipelineOptions, Stage, DEFAULT_SERVICE_NAME};
use mailroom::types::{
    DeletedState, Entity, FolderRow, IdentityRow, MailRow, MessageStatus, PartyRole, SourceTables,
};

fn identity(account_id: i64, email: &str, name: &str, entry_date: &str) -> IdentityRow {
    IdentityRow {
        account_id: Some(account_id),
        email: Some(email.into()),
        name: Some(name.into()),
        entry_date: Some(entry_date.into()),
    }
}

fn mail(from: &str, to: &str, subject: &str) -> MailRow {
    MailRow {
        id: Some(1),
        folder_id: Some(1),
        account_id: Some(1),
        email_from: Some(from.into()),
        email_to: Some(to.into()),
        subject: Some(subject.into()),
        text_body: Some("Body".into()),
        is_unread: Some(true),
        date: Some(1_700_000_000_000),
        ..MailRow::default()
    }
}

fn scenario() -> SourceTables {
    SourceTables {
        identities: vec![identity(1, "a@b.com", "A B", "2022-05-01T10:00:00Z")],
        mails: vec![mail("X <x@y.com>", "a@b.com", "Hi")],
        folders: vec![FolderRow {
            id: Some(1),
            name: Some("Inbox".into()),
        }],
        ..SourceTables::default()
    }
}

fn run(tables: &SourceTables) -> mailroom::types::Extraction {
    Pipeline::new(PipelineOptions::default())
        .run(Some(tables))
        .expect("pipeline run")
}

#[test]
fn end_to_end_scenario() {
    let extraction = run(&scenario());
    assert_eq!(extraction.entities.len(), 2);

    let accounts: Vec<_> = extraction.accounts().collect();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].username.as_deref(), Some("a@b.com"));
    assert_eq!(accounts[0].name, "A B");
    assert_eq!(accounts[0].service_type, DEFAULT_SERVICE_NAME);
    assert_eq!(
        accounts[0].time_created,
        Some(Utc.with_ymd_and_hms(2022, 5, 1, 10, 0, 0).unwrap())
    );

    let messages: Vec<_> = extraction.messages().collect();
    assert_eq!(messages.len(), 1);
    let message = messages[0];
    assert_eq!(message.folder.as_deref(), Some("Inbox"));
    assert_eq!(message.subject.as_deref(), Some("Hi"));
    assert_eq!(message.body.as_deref(), Some("Body"));
    assert_eq!(message.status, Some(MessageStatus::Unread));
    assert_eq!(message.timestamp.map(|t| t.timestamp()), Some(1_700_000_000));
    assert_eq!(message.account.as_deref(), Some("a@b.com"));
    assert!(message.attachments.is_empty());
    assert!(message.cc.is_empty() && message.bcc.is_empty());

    assert_eq!(message.from.identifier.as_deref(), Some("x@y.com"));
    assert_eq!(message.from.name.as_deref(), Some("X"));
    assert_eq!(message.from.role, PartyRole::From);
    assert_eq!(message.to.len(), 1);
    assert_eq!(message.to[0].identifier.as_deref(), Some("a@b.com"));
    assert_eq!(message.to[0].role, PartyRole::To);
    assert_eq!(
        message.to[0].date_delivered.map(|t| t.timestamp()),
        Some(1_700_000_000)
    );

    assert_eq!(extraction.stats.accounts, 1);
    assert_eq!(extraction.stats.messages, 1);
}

#[test]
fn accounts_come_first_in_source_order() {
    let mut tables = scenario();
    tables.identities = vec![
        identity(2, "z@b.com", "Zed", "2022-05-01T10:00:00Z"),
        identity(1, "a@b.com", "A B", ""),
    ];

    let extraction = run(&tables);
    let kinds: Vec<_> = extraction
        .entities
        .iter()
        .map(|e| matches!(e, Entity::Account(_)))
        .collect();
    assert_eq!(kinds, vec![true, true, false]);

    let usernames: Vec<_> = extraction
        .accounts()
        .map(|a| a.username.clone().unwrap_or_default())
        .collect();
    assert_eq!(usernames, vec!["z@b.com", "a@b.com"]);
    assert!(extraction.accounts().all(|a| a.service_type == DEFAULT_SERVICE_NAME));
    assert_eq!(extraction.accounts().nth(1).unwrap().time_created, None);
}

#[test]
fn missing_identity_name_defaults_to_empty() {
    let mut tables = scenario();
    tables.identities[0].name = None;
    let extraction = run(&tables);
    assert_eq!(extraction.accounts().next().unwrap().name, "");
}

#[test]
fn rows_without_content_are_dropped() {
    let mut tables = scenario();
    tables.mails.push(MailRow {
        email_to: Some("a@b.com".into()),
        date: Some(1),
        ..MailRow::default()
    });
    tables.mails.push(MailRow {
        text_body: Some("only a body".into()),
        ..MailRow::default()
    });

    let extraction = run(&tables);
    assert_eq!(extraction.stats.messages, 2);
    assert_eq!(extraction.stats.skipped_messages, 1);

    let bodies: Vec<_> = extraction.messages().map(|m| m.body.clone()).collect();
    assert_eq!(bodies, vec![Some("Body".into()), Some("only a body".into())]);
}

#[test]
fn absent_fields_stay_unset() {
    let mut tables = scenario();
    tables.mails = vec![MailRow {
        subject: Some("bare".into()),
        ..MailRow::default()
    }];

    let extraction = run(&tables);
    let message = extraction.messages().next().unwrap();
    assert_eq!(message.folder, None);
    assert_eq!(message.body, None);
    assert_eq!(message.status, None);
    assert_eq!(message.timestamp, None);
    assert_eq!(message.account, None);
    assert_eq!(message.from.identifier, None);
    assert_eq!(message.from.date_delivered, None);
    assert_eq!(message.to.len(), 1);
    assert_eq!(message.to[0].identifier, None);
}

#[test]
fn read_flag_maps_to_read_status() {
    let mut tables = scenario();
    tables.mails[0].is_unread = Some(false);
    let extraction = run(&tables);
    assert_eq!(extraction.messages().next().unwrap().status, Some(MessageStatus::Read));
}

#[test]
fn unmatched_joins_leave_fields_unset() {
    let mut tables = scenario();
    tables.mails[0].folder_id = Some(99);
    tables.mails[0].account_id = Some(42);

    let extraction = run(&tables);
    let message = extraction.messages().next().unwrap();
    assert_eq!(message.folder, None);
    assert_eq!(message.account, None);
}

#[test]
fn first_matching_folder_wins() {
    let mut tables = scenario();
    tables.folders.push(FolderRow {
        id: Some(1),
        name: Some("Duplicate".into()),
    });
    let extraction = run(&tables);
    assert_eq!(extraction.messages().next().unwrap().folder.as_deref(), Some("Inbox"));
}

#[test]
fn recipient_name_comes_from_identity_table_when_address_like() {
    let mut tables = scenario();
    tables.identities[0].name = Some("alias@b.com".into());
    let extraction = run(&tables);
    let to = &extraction.messages().next().unwrap().to[0];
    assert_eq!(to.name.as_deref(), Some("alias@b.com"));

    let extraction = run(&scenario());
    let to = &extraction.messages().next().unwrap().to[0];
    assert_eq!(to.name, None);
}

#[test]
fn sender_column_used_only_when_address_like() {
    let mut tables = scenario();
    tables.mails[0].email_from = Some("x@y.com".into());
    tables.mails[0].sender = Some("Mr X".into());
    let extraction = run(&tables);
    assert_eq!(extraction.messages().next().unwrap().from.name, None);

    tables.mails[0].sender = Some("reply@y.com".into());
    let extraction = run(&tables);
    assert_eq!(
        extraction.messages().next().unwrap().from.name.as_deref(),
        Some("reply@y.com")
    );
}

#[test]
fn cc_and_bcc_only_when_non_empty() {
    let mut tables = scenario();
    tables.mails[0].cc = Some("".into());
    tables.mails[0].bcc = None;
    let extraction = run(&tables);
    let message = extraction.messages().next().unwrap();
    assert!(message.cc.is_empty());
    assert!(message.bcc.is_empty());

    tables.mails[0].cc = Some("Carol <carol@x.com>".into());
    tables.mails[0].bcc = Some("dave@x.com".into());
    let extraction = run(&tables);
    let message = extraction.messages().next().unwrap();
    assert_eq!(message.cc.len(), 1);
    assert_eq!(message.cc[0].identifier.as_deref(), Some("carol@x.com"));
    assert_eq!(message.cc[0].name.as_deref(), Some("Carol"));
    assert_eq!(message.cc[0].role, PartyRole::General);
    assert_eq!(message.bcc.len(), 1);
    assert_eq!(message.bcc[0].identifier.as_deref(), Some("dave@x.com"));
    assert_eq!(message.bcc[0].role, PartyRole::General);
}

#[test]
fn every_entity_is_intact() {
    let mut tables = scenario();
    tables.mails[0].cc = Some("c@x.com".into());
    let extraction = run(&tables);
    for entity in &extraction.entities {
        match entity {
            Entity::Account(a) => assert_eq!(a.deleted, DeletedState::Intact),
            Entity::Message(m) => {
                assert_eq!(m.deleted, DeletedState::Intact);
                assert_eq!(m.from.deleted, DeletedState::Intact);
                assert!(m.to.iter().chain(&m.cc).all(|p| p.deleted == DeletedState::Intact));
            }
        }
    }
}

#[test]
fn attachments_are_counted_but_not_linked() {
    let mut tables = scenario();
    tables.attachments = vec![mailroom::types::AttachmentRow {
        mail_id: Some(1),
        file_name: Some("file.pdf".into()),
    }];
    let extraction = run(&tables);
    assert_eq!(extraction.stats.attachments_loaded, 1);
    assert!(extraction.messages().all(|m| m.attachments.is_empty()));
}

#[test]
fn no_source_found_yields_empty_result() {
    let mut pipeline = Pipeline::new(PipelineOptions::default());
    let extraction = pipeline.run(None).unwrap();
    assert!(extraction.entities.is_empty());
    assert_eq!(pipeline.stage(), Stage::NoSourceFound);
}

#[test]
fn completed_run_reaches_done() {
    let mut pipeline = Pipeline::new(PipelineOptions::default());
    assert_eq!(pipeline.stage(), Stage::Uninitialized);
    pipeline.run(Some(&scenario())).unwrap();
    assert_eq!(pipeline.stage(), Stage::Done);
}

#[test]
fn lenient_run_drops_malformed_creation_time() {
    let mut tables = scenario();
    tables.identities[0].entry_date = Some("2022-05-01".into());

    let extraction = run(&tables);
    assert_eq!(extraction.accounts().next().unwrap().time_created, None);
    assert_eq!(extraction.stats.timestamp_anomalies, 1);
    assert_eq!(extraction.stats.messages, 1);
}

#[test]
fn strict_run_aborts_on_malformed_creation_time() {
    let mut tables = scenario();
    tables.identities[0].entry_date = Some("01.05.2022 10:00".into());

    let options = PipelineOptions {
        timestamps: TimestampPolicy::Strict,
        ..PipelineOptions::default()
    };
    match Pipeline::new(options).run(Some(&tables)) {
        Err(AppError::Timestamp(_)) => {}
        other => panic!("expected timestamp error, got {other:?}"),
    }
}

#[test]
fn canonical_cache_key_merges_formatting_variants() {
    let mut tables = scenario();
    tables.mails.push(mail("x@y.com", "A <a@b.com>", "Again"));

    let raw = run(&tables);
    assert_eq!(raw.stats.distinct_senders, 2);
    assert_eq!(raw.stats.distinct_recipients, 2);

    let options = PipelineOptions {
        party_cache_key: PartyCacheKey::Canonical,
        ..PipelineOptions::default()
    };
    let canonical = Pipeline::new(options).run(Some(&tables)).unwrap();
    assert_eq!(canonical.stats.distinct_senders, 1);
    assert_eq!(canonical.stats.distinct_recipients, 1);

    assert_eq!(raw.entities, canonical.entities);
}

#[test]
fn repeated_runs_are_identical() {
    let mut tables = scenario();
    tables.mails.push(mail("Y <y@y.com>", "a@b.com", "Second"));
    assert_eq!(run(&tables), run(&tables));
}

#[test]
fn cache_key_parses_from_config_strings() {
    assert_eq!("raw".parse::<PartyCacheKey>().unwrap(), PartyCacheKey::Raw);
    assert_eq!(" Canonical ".parse::<PartyCacheKey>().unwrap(), PartyCacheKey::Canonical);
    assert!(matches!("other".parse::<PartyCacheKey>(), Err(AppError::Config(_))));
}

#[test]
fn bad_message_date_counts_as_one_anomaly() {
    let mut tables = scenario();
    tables.mails[0].date = Some(i64::MAX);
    tables.mails[0].cc = Some("c@x.com".into());
    tables.mails[0].bcc = Some("d@x.com".into());

    let extraction = run(&tables);
    assert_eq!(extraction.stats.timestamp_anomalies, 1);

    let message = extraction.messages().next().unwrap();
    assert_eq!(message.timestamp, None);
    assert_eq!(message.from.date_delivered, None);
    assert!(message
        .to
        .iter()
        .chain(&message.cc)
        .chain(&message.bcc)
        .all(|p| p.date_delivered.is_none()));
}

#[test]
fn stages_recorded_by_caller_are_kept() {
    let mut pipeline = Pipeline::new(PipelineOptions::default());
    pipeline.advance(Stage::SourcesLocated);
    assert_eq!(pipeline.stage(), Stage::SourcesLocated);
    pipeline.advance(Stage::TablesLoaded);

    let extraction = pipeline.run(Some(&scenario())).unwrap();
    assert_eq!(extraction.stats.messages, 1);
    assert_eq!(pipeline.stage(), Stage::Done);
}
