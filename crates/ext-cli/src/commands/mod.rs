//! Command implementations

mod list;
mod settings;
mod update;

pub use list::{run_info, run_list};
pub use settings::{run_settings_set, run_settings_show, run_status};
pub use update::{run_check, run_update};
