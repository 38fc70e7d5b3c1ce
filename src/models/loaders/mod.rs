pub mod toml_loader;

pub use toml_loader::{load_all_roster_files, load_roster_file, Roster, RosterEntry};
