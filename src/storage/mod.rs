pub mod db;
pub mod locate;

pub use db::{load_tables, SourceDatabase};
pub use locate::{locate_sources, SourceSet, DEFAULT_PACKAGE};
