//! treedupe - duplicate file and directory-tree finder.
//!
//! Files are digested either in full or through sparse chunk sampling;
//! directories fold their children's digests order-independently, so
//! byte-identical trees digest equal no matter how the filesystem
//! enumerates them. A session cache keeps shared subtrees from being hashed
//! twice, and the report layer clusters equal digests into duplicate sets
//! with removal guidance.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod hasher;
pub mod logging;
pub mod report;
pub mod vfs;

pub use app::run_app;
