pub mod context;
pub mod vanilla;

pub use context::InstallContext;
pub use vanilla::{install_version, library_entries, InstallReport};
