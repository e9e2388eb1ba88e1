//! Database bootstrap shared by the CIPA service and its tests

pub mod init;

pub use init::*;
