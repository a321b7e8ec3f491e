//! Core library for the json2excel command line application.
//!
//! A breach dump is a JSON object mapping group names to arrays of records.
//! The library reads such a dump ([`io::json_read`]), flattens it into a
//! single table tagged with each record's group ([`flatten`]), and writes a
//! formatted workbook ([`io::excel_write`]). [`convert`] ties the steps
//! together and [`web`] exposes them behind an upload form.

pub mod convert;
pub mod error;
pub mod flatten;
pub mod io;
pub mod model;
pub mod web;

pub use error::{Result, ToolError};
