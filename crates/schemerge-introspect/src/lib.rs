//! Schema loading and database executors.

pub mod loader;
pub mod mysql;
pub mod options;

pub use loader::load_schema;
pub use mysql::{ConnectOptions, MySqlExecutor};
pub use options::IntrospectOptions;

pub use schemerge_core::Schema;
