//! Keyword indexing and search for manual pages.
//!
//! The indexer walks validated document trees, extracts keywords tagged
//! by macro semantics (names, functions, paths, environment variables,
//! …), normalizes them to plain UTF-8, and publishes a two-file on-disk
//! database; the query engine evaluates boolean search expressions
//! against that database and streams matching records in record-number
//! order.
//!
//! # Database layout
//!
//! Inside an index directory live [`KEYWORD_DB`] (a duplicate-allowing
//! ordered map from keyword bytes to an 8-byte mask + record-number
//! value, little-endian) and [`RECORD_DB`] (a dense 1-based store of
//! five nil-terminated fields per manual). Writers stage into shadow
//! files and atomically rename, so readers never observe a torn pair.
//!
//! # Example
//!
//! ```no_run
//! use manroff_diagnostics::MemorySink;
//! use manroff_parser::{ParseConfig, Parser};
//! use manroff_index::{Indexer, Query, QueryOpts, search};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let parser = Parser::new(ParseConfig::default());
//! let mut sink = MemorySink::new();
//!
//! let mut indexer = Indexer::new("/usr/share/man");
//! indexer.add_source("cat.1", "...", &parser, &mut sink);
//! indexer.commit()?;
//!
//! let query = Query::compile(&["name=cat"])?;
//! search(
//!     "/usr/share/man".as_ref(),
//!     &QueryOpts::default(),
//!     &query,
//!     |records| {
//!         for r in records {
//!             println!("{}({}) - {}", r.title, r.sec, r.desc);
//!         }
//!     },
//! )?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

mod classes;
mod db;
mod indexer;
mod normalize;
mod query;

pub use classes::KeyMask;
pub use db::{
    DbError, DbReader, DbStage, KEYWORD_DB, KeywordEntry, RECORD_DB, Record, SHADOW_SUFFIX,
};
pub use indexer::Indexer;
pub use normalize::normalize;
pub use query::{Query, QueryError, QueryOpts, search};
