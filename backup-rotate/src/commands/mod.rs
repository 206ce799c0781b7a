mod list;
mod rotate;
mod show_backup;

pub use list::run_list;
pub use rotate::run_rotation;
pub use show_backup::run_show_backup;
