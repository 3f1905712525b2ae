//! # cppstream-core
//!
//! A library for generating C++ "stream" headers from Protocol Buffer
//! descriptors.
//!
//! A stream header carries no message classes. For every field it declares a
//! `const uint64_t` holding a packed *field ID* (number, declared type and
//! repetition), and for every enum a set of `const int` values. Both come
//! with reflection tables so streaming writers can name fields and values
//! at runtime without the schema.
//!
//! ## Architecture
//!
//! - [`field_id`]: the 64-bit field ID layout
//! - [`naming`]: constant-name and prefix conventions
//! - [`header`]: per-file header rendering
//! - [`plugin`]: `protoc` request handling and the all-or-nothing error policy
//! - [`error`]: error types and the per-run diagnostic log
//!
//! ## Example
//!
//! ```no_run
//! use cppstream_core::{plugin, HeaderGenerator};
//! use std::io::Read;
//!
//! let mut input = Vec::new();
//! std::io::stdin().read_to_end(&mut input)?;
//!
//! let request = plugin::decode_request(&input)?;
//! let response = plugin::generate(&request, &HeaderGenerator::new())?;
//! let output = plugin::encode_response(&response)?;
//! # let _ = output;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod error;
pub mod field_id;
pub mod header;
pub mod naming;
pub mod plugin;

// Re-export primary types for convenience
pub use error::{Diagnostic, Error, ErrorLog, Result};
pub use field_id::{FieldCount, FieldId, FieldType};
pub use header::{HeaderConfig, HeaderFile, HeaderGenerator, HeaderStats};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
