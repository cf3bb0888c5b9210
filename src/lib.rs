//! Deploykit - offline OS deployment media acquisition and image servicing.
//!
//! Two jobs with real failure-handling requirements live here: fetching
//! installation media with all-or-nothing write semantics, and applying
//! ordered mutations to a mounted disk image through a transactional
//! session that never leaves a mount dangling. Everything around them
//! (catalog validation, tool discovery, configuration) supports those two.

pub mod batch;
pub mod catalog;
pub mod checksum;
pub mod config;
pub mod download;
pub mod error;
pub mod imaging;
pub mod preflight;
pub mod process;
pub mod servicing;
