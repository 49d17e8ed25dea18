mod config;
mod init;
mod plan;
mod relocate;
mod scan;

pub use config::ConfigArgs;
pub use config::handle_config;
pub use init::InitArgs;
pub use init::handle_init;
pub use plan::PlanArgs;
pub use plan::handle_plan;
pub use relocate::RelocateArgs;
pub use relocate::handle_relocate;
pub use relocate::handle_relocate_with_prompter;
pub use scan::ScanArgs;
pub use scan::handle_scan;
