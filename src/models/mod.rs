pub mod cadre;
pub mod category;
pub mod faculty;
pub mod loaders;
pub mod role;
pub mod status;

pub use cadre::{Cadre, Designation};
pub use category::Category;
pub use faculty::{
    FacultyRecord, InteractionScore, Marks, PortfolioDetail, PortfolioType, SectionScore,
};
pub use loaders::{load_all_roster_files, load_roster_file, Roster, RosterEntry};
pub use role::Role;
pub use status::Status;
