//! Core data models for the metadata editor.
//!
//! `record` is the stored shape of a service provider's metadata and
//! serializes naturally as JSON via `serde`. `form` covers both directions of
//! the HTML form: submitted values in, form description out.

pub mod form;
pub mod record;
