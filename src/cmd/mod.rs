pub mod version;

pub use version::handle_version_command;
