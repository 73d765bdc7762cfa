use crate::cli::Cli;
use crate::config::AppDefaults;
use crate::pipeline::{Pipeline, Stage};
use crate::storage::{load_tables, locate_sources, SourceSet};
use crate::types::Extraction;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use tracing::info;

pub async fn run(cli: Cli) -> Result<()> {
    let mut defaults = AppDefaults::load()?;
    if cli.strict {
        defaults.strict_timestamps = true;
    }

    let sources = resolve_sources(&cli, &defaults)?;
    let extraction = extract(sources.as_ref(), &defaults).await?;
    write_extraction(&cli, &extraction)
}

/// Locate, load and normalize. A missing identity store yields an empty
/// extraction.
pub async fn extract(sources: Option<&SourceSet>, defaults: &AppDefaults) -> Result<Extraction> {
    let mut pipeline = Pipeline::new(defaults.pipeline_options());
    let tables = match sources {
        Some(set) => {
            pipeline.advance(Stage::SourcesLocated);
            let tables = load_tables(set).await?;
            pipeline.advance(Stage::TablesLoaded);
            Some(tables)
        }
        None => None,
    };
    let extraction = pipeline
        .run(tables.as_ref())
        .context("normalizing source tables")?;
    Ok(extraction)
}

fn resolve_sources(cli: &Cli, defaults: &AppDefaults) -> Result<Option<SourceSet>> {
    if let Some(identity) = &cli.identity_db {
        return Ok(Some(SourceSet {
            identity: identity.clone(),
            mail_room: cli.mail_room_db.clone(),
        }));
    }

    match &cli.root {
        Some(root) => locate_sources(root, &defaults.package),
        None => Ok(None),
    }
}

fn write_extraction(cli: &Cli, extraction: &Extraction) -> Result<()> {
    let json = if cli.compact {
        serde_json::to_string(extraction)
    } else {
        serde_json::to_string_pretty(extraction)
    }
    .context("serializing extraction")?;

    match &cli.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), entities = extraction.entities.len(), "Wrote extraction");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("writing extraction to stdout")?;
        }
    }
    Ok(())
}
