//! C++ header generation module.
//!
//! This module turns one `FileDescriptorProto` into one C++ header holding
//! field ID constants, enum constants and reflection tables.
//!
//! ## Architecture
//!
//! [`HeaderGenerator`] owns the [`HeaderConfig`] and computes the per-file
//! names (output file, include guard). The actual text is produced by the
//! internal `HeaderWriter`, which walks the descriptor tree:
//!
//! 1. package namespaces are opened, one per `.`-separated segment
//! 2. top-level enums are written, then top-level messages
//! 3. every message opens a namespace holding its nested enums, nested
//!    messages, field constants and field reflection tables
//! 4. namespaces are closed innermost first
//!
//! Problems found on the way are recorded in the caller's [`ErrorLog`]; the
//! writer itself only fails if the underlying `fmt::Write` does.

mod writer;

use crate::error::{Error, ErrorLog, Result};
use crate::naming::{make_constant_name, replace_char};
use prost_types::FileDescriptorProto;
use std::ops::AddAssign;
use tracing::debug;

use writer::HeaderWriter;

/// Name written into the banner of every generated header
pub const GENERATOR_NAME: &str = "protoc-gen-cppstream";

/// Reflection tables (`_ENUM_*_NAMES`, `_FIELD_IDS`, ...) are always emitted
pub const GENERATE_REFLECTION_TABLES: bool = true;

/// Configuration for header generation
#[derive(Debug, Clone)]
pub struct HeaderConfig {
    /// Indentation string (default: 4 spaces)
    pub indent_str: String,
    /// Suffix appended to the `.proto` name to form the output name
    pub file_suffix: String,
    /// Prefix of the include guard, before normalization
    pub guard_prefix: String,
    /// Suffix of the include guard, before normalization
    pub guard_suffix: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            indent_str: "    ".to_string(),
            file_suffix: ".h".to_string(),
            guard_prefix: "ANDROID_".to_string(),
            guard_suffix: "_stream_h".to_string(),
        }
    }
}

impl HeaderConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indentation string
    pub fn indent_str(mut self, s: impl Into<String>) -> Self {
        self.indent_str = s.into();
        self
    }

    /// Sets the output file suffix
    pub fn file_suffix(mut self, s: impl Into<String>) -> Self {
        self.file_suffix = s.into();
        self
    }

    /// Sets the include guard prefix
    pub fn guard_prefix(mut self, s: impl Into<String>) -> Self {
        self.guard_prefix = s.into();
        self
    }

    /// Sets the include guard suffix
    pub fn guard_suffix(mut self, s: impl Into<String>) -> Self {
        self.guard_suffix = s.into();
        self
    }
}

/// Counts of the elements written into a header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderStats {
    /// Number of messages (including nested ones)
    pub messages: usize,
    /// Number of enums (including nested ones)
    pub enums: usize,
    /// Number of fields
    pub fields: usize,
}

impl AddAssign for HeaderStats {
    fn add_assign(&mut self, other: Self) {
        self.messages += other.messages;
        self.enums += other.enums;
        self.fields += other.fields;
    }
}

/// A generated header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFile {
    /// Output file name (`<source>.h`)
    pub name: String,
    /// Header text
    pub content: String,
    /// What went into the header
    pub stats: HeaderStats,
}

/// Generates C++ headers from file descriptors
#[derive(Debug, Clone, Default)]
pub struct HeaderGenerator {
    config: HeaderConfig,
}

impl HeaderGenerator {
    /// Creates a generator with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator with a custom configuration
    pub fn with_config(config: HeaderConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration
    pub fn config(&self) -> &HeaderConfig {
        &self.config
    }

    /// Returns the output file name for a descriptor
    pub fn output_filename(&self, file: &FileDescriptorProto) -> String {
        format!("{}{}", file.name(), self.config.file_suffix)
    }

    /// Returns the include guard macro for a descriptor
    ///
    /// `a/b.proto` with the default config becomes `ANDROID_A_B_PROTO_STREAM_H`.
    pub fn include_guard(&self, file: &FileDescriptorProto) -> String {
        let guard = format!("{}{}", self.config.guard_prefix, file.name());
        let guard = replace_char(&guard, '/', '_');
        let guard = replace_char(&guard, '.', '_');
        make_constant_name(&format!("{}{}", guard, self.config.guard_suffix))
    }

    /// Generates the header for one file.
    ///
    /// Diagnostics go into `log`; the header is returned even when some were
    /// recorded, and it is up to the caller to discard it.
    pub fn generate(&self, file: &FileDescriptorProto, log: &mut ErrorLog) -> Result<HeaderFile> {
        let guard = self.include_guard(file);
        let mut content = String::new();

        let stats = {
            let mut writer = HeaderWriter::new(&mut content, &self.config, log, file.name());
            writer
                .write_file(file, &guard)
                .map_err(|_| Error::internal(format!("failed to format header for {}", file.name())))?;
            writer.stats()
        };

        let name = self.output_filename(file);
        debug!(
            "Generated {} ({} messages, {} enums, {} fields)",
            name, stats.messages, stats.enums, stats.fields
        );

        Ok(HeaderFile {
            name,
            content,
            stats,
        })
    }
}
