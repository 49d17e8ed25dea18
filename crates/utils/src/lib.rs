mod directory_archive;
mod display_relocation;
mod find_project_root;
mod get_shadowpack_config;
mod relocate_entries;

pub use directory_archive::{DirectorySink, DirectorySource, get_entry_path};
pub use display_relocation::{
    display_bad_call, display_plan, display_relocated, display_report, display_warning,
};
pub use find_project_root::find_project_root;
pub use get_shadowpack_config::{
    CONFIG_FILE_NAME, get_shadowpack_config, get_shadowpack_dir, read_config_file,
};
pub use relocate_entries::{collect_entries, compile_ignore_patterns, relocate_entries};
