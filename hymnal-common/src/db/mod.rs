//! Database schema and key/value configuration

pub mod init;
pub mod settings;

pub use init::*;
pub use settings::*;
