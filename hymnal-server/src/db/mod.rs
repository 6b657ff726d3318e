//! Catalog queries
//!
//! Functions return `hymnal_common::Result`; domain failures use the
//! `NotFound` / `InvalidInput` / `Conflict` variants so the HTTP layer can
//! map them to status codes.

pub mod chapters;
pub mod genres;
pub mod popular;
pub mod songs;
