//! SQLite storage setup

pub mod init;

pub use init::*;
