use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

pub const DEFAULT_PACKAGE: &str = "de.web.mobile.android.mail";

const IDENTITY_PREFIX: &str = "identity";
const MAIL_ROOM_PREFIX: &str = "mail_room";

// SQLite side files: `-journal`, `-shm`, `-wal`, optionally with a `_N` copy suffix.
static SIDE_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-(journal|shm|wal)(_?[0-9]*)$").expect("side-file pattern"));

/// Database files picked for one extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceSet {
    pub identity: PathBuf,
    pub mail_room: Option<PathBuf>,
}

pub fn is_side_file(name: &str) -> bool {
    SIDE_FILE.is_match(name)
}

/// Search `root` for the app's `databases` directory and pick the identity and
/// mail_room stores. Returns `Ok(None)` when no identity store exists.
///
/// Unreadable entries below `root` are logged and skipped; only a missing or
/// non-directory `root` is an error.
pub fn locate_sources(root: &Path, package: &str) -> Result<Option<SourceSet>> {
    if !root.is_dir() {
        bail!("search root {} is not a directory", root.display());
    }

    let db_dirs = database_dirs(root, package);
    debug!(root = %root.display(), dirs = db_dirs.len(), "Scanned for database directories");

    let Some(identity) = find_db(&db_dirs, IDENTITY_PREFIX) else {
        info!(root = %root.display(), package, "No identity database found");
        return Ok(None);
    };
    let mail_room = find_db(&db_dirs, MAIL_ROOM_PREFIX);

    info!(identity = %identity.display(), mail_room = ?mail_room, "Located source databases");
    Ok(Some(SourceSet {
        identity,
        mail_room,
    }))
}

fn readable_entries(walker: WalkDir) -> impl Iterator<Item = DirEntry> {
    walker.sort_by_file_name().into_iter().filter_map(|entry| match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!(path = ?e.path(), error = %e, "Skipping unreadable entry");
            None
        }
    })
}

fn database_dirs(root: &Path, package: &str) -> Vec<PathBuf> {
    let suffix = Path::new(package).join("databases");
    readable_entries(WalkDir::new(root))
        .filter(|entry| entry.file_type().is_dir() && entry.path().ends_with(&suffix))
        .map(DirEntry::into_path)
        .collect()
}

/// The last non-side-file whose name starts with `prefix` wins.
fn find_db(db_dirs: &[PathBuf], prefix: &str) -> Option<PathBuf> {
    let mut found = None;
    for dir in db_dirs {
        let files = readable_entries(WalkDir::new(dir).min_depth(1).max_depth(1))
            .filter(|entry| entry.file_type().is_file());

        for entry in files {
            let name = entry.file_name().to_string_lossy();
            if !name.starts_with(prefix) {
                continue;
            }
            if is_side_file(&name) {
                debug!(file = %name, "Skipping SQLite side file");
                continue;
            }
            found = Some(entry.into_path());
        }
    }
    found
}
