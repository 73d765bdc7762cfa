use clap::Parser;
use std::path::PathBuf;

/// Command-line options for mailroom.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Root of the extracted device file system to search for the app's databases.
    #[arg(long, required_unless_present = "identity_db")]
    pub root: Option<PathBuf>,

    /// Use this identity database instead of searching under --root.
    #[arg(long)]
    pub identity_db: Option<PathBuf>,

    /// Use this mail_room database instead of searching under --root.
    #[arg(long, requires = "identity_db")]
    pub mail_room_db: Option<PathBuf>,

    /// Write the extraction to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Emit single-line JSON.
    #[arg(long)]
    pub compact: bool,

    /// Abort on the first malformed timestamp instead of leaving it unset.
    #[arg(long)]
    pub strict: bool,
}
