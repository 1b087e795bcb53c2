mod codec;
mod constraint;
pub mod db;
mod drive_files;
mod events;
pub mod migrations;
pub mod policy;
mod setlists;
mod singers;
mod songs;
pub(crate) mod users;

pub use db::Database;
pub use events::AttendanceOutcome;
pub use policy::{DeletePolicy, Relation, RELATIONS};
