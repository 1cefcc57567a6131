pub mod archive;
pub mod fetcher;
pub mod manager;
pub mod urls;
pub mod util;

pub use fetcher::Dependency;
pub use manager::DependencyManager;
pub use util::is_executable_present;
