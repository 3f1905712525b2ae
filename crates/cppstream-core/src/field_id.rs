//! Field ID encoding.
//!
//! Every field is identified at runtime by a single `u64` that packs its
//! number, declared type and repetition. Streaming writers pass this value
//! around instead of consulting the schema, so the layout is a permanent
//! contract:
//!
//! ```text
//!  63        44 43   40 39      32 31                    0
//! +------------+-------+----------+-----------------------+
//! |  reserved  | count |   type   |     field number      |
//! +------------+-------+----------+-----------------------+
//! ```
//!
//! The type byte leaves room for future types even though only 18 are
//! defined. Count codes are 1 (single), 2 (repeated) and 5 (packed).

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::FieldDescriptorProto;
use std::fmt;

/// Position of the field type in a field ID
pub const FIELD_TYPE_SHIFT: u64 = 32;

/// Mask for the field type stored in a field ID
pub const FIELD_TYPE_MASK: u64 = 0xff << FIELD_TYPE_SHIFT;

/// Position of the count in a field ID
pub const FIELD_COUNT_SHIFT: u64 = 40;

/// Mask for the count stored in a field ID
pub const FIELD_COUNT_MASK: u64 = 0x0f << FIELD_COUNT_SHIFT;

/// Mask for the field number stored in a field ID
pub const FIELD_NUMBER_MASK: u64 = 0xffff_ffff;

/// Declared field types
///
/// Discriminants are the stable type codes written into field IDs; they
/// match the type numbers of `descriptor.proto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FieldType {
    /// 64-bit IEEE float
    Double = 1,
    /// 32-bit IEEE float
    Float = 2,
    /// Varint-encoded signed 64-bit
    Int64 = 3,
    /// Varint-encoded unsigned 64-bit
    Uint64 = 4,
    /// Varint-encoded signed 32-bit
    Int32 = 5,
    /// Fixed-width unsigned 64-bit
    Fixed64 = 6,
    /// Fixed-width unsigned 32-bit
    Fixed32 = 7,
    /// Boolean
    Bool = 8,
    /// UTF-8 string
    String = 9,
    /// Group (deprecated)
    Group = 10,
    /// Embedded message
    Message = 11,
    /// Raw bytes
    Bytes = 12,
    /// Varint-encoded unsigned 32-bit
    Uint32 = 13,
    /// Enum value
    Enum = 14,
    /// Fixed-width signed 32-bit
    Sfixed32 = 15,
    /// Fixed-width signed 64-bit
    Sfixed64 = 16,
    /// Zigzag-encoded signed 32-bit
    Sint32 = 17,
    /// Zigzag-encoded signed 64-bit
    Sint64 = 18,
}

impl FieldType {
    /// Every type in the catalogue, in code order
    pub const ALL: [FieldType; 18] = [
        FieldType::Double,
        FieldType::Float,
        FieldType::Int64,
        FieldType::Uint64,
        FieldType::Int32,
        FieldType::Fixed64,
        FieldType::Fixed32,
        FieldType::Bool,
        FieldType::String,
        FieldType::Group,
        FieldType::Message,
        FieldType::Bytes,
        FieldType::Uint32,
        FieldType::Enum,
        FieldType::Sfixed32,
        FieldType::Sfixed64,
        FieldType::Sint32,
        FieldType::Sint64,
    ];

    /// Returns the declared type of a field, or `None` if it is missing or
    /// not a known type
    pub fn of(field: &FieldDescriptorProto) -> Option<Self> {
        let raw = field.r#type?;
        Type::try_from(raw).ok().map(Self::from)
    }

    /// Returns the type code stored in field IDs
    pub fn code(self) -> u64 {
        self as u64
    }

    /// Returns the `.proto` keyword for this type
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::Int64 => "int64",
            FieldType::Uint64 => "uint64",
            FieldType::Int32 => "int32",
            FieldType::Fixed64 => "fixed64",
            FieldType::Fixed32 => "fixed32",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Group => "group",
            FieldType::Message => "message",
            FieldType::Bytes => "bytes",
            FieldType::Uint32 => "uint32",
            FieldType::Enum => "enum",
            FieldType::Sfixed32 => "sfixed32",
            FieldType::Sfixed64 => "sfixed64",
            FieldType::Sint32 => "sint32",
            FieldType::Sint64 => "sint64",
        }
    }
}

impl From<Type> for FieldType {
    fn from(value: Type) -> Self {
        match value {
            Type::Double => FieldType::Double,
            Type::Float => FieldType::Float,
            Type::Int64 => FieldType::Int64,
            Type::Uint64 => FieldType::Uint64,
            Type::Int32 => FieldType::Int32,
            Type::Fixed64 => FieldType::Fixed64,
            Type::Fixed32 => FieldType::Fixed32,
            Type::Bool => FieldType::Bool,
            Type::String => FieldType::String,
            Type::Group => FieldType::Group,
            Type::Message => FieldType::Message,
            Type::Bytes => FieldType::Bytes,
            Type::Uint32 => FieldType::Uint32,
            Type::Enum => FieldType::Enum,
            Type::Sfixed32 => FieldType::Sfixed32,
            Type::Sfixed64 => FieldType::Sfixed64,
            Type::Sint32 => FieldType::Sint32,
            Type::Sint64 => FieldType::Sint64,
        }
    }
}

impl TryFrom<u64> for FieldType {
    type Error = u64;

    fn try_from(code: u64) -> std::result::Result<Self, u64> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| t.code() == code)
            .ok_or(code)
    }
}

/// How many values a field carries on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FieldCount {
    /// At most one value
    Single = 1,
    /// Zero or more values, one tag each
    Repeated = 2,
    /// Zero or more values in a single length-delimited run
    Packed = 5,
}

impl FieldCount {
    /// Returns the count of a field: packed wins over repeated
    pub fn of(field: &FieldDescriptorProto) -> Self {
        let packed = field
            .options
            .as_ref()
            .and_then(|o| o.packed)
            .unwrap_or(false);

        if packed {
            FieldCount::Packed
        } else if field.label() == Label::Repeated {
            FieldCount::Repeated
        } else {
            FieldCount::Single
        }
    }

    /// Returns the count code stored in field IDs
    pub fn code(self) -> u64 {
        self as u64
    }
}

impl TryFrom<u64> for FieldCount {
    type Error = u64;

    fn try_from(code: u64) -> std::result::Result<Self, u64> {
        match code {
            1 => Ok(FieldCount::Single),
            2 => Ok(FieldCount::Repeated),
            5 => Ok(FieldCount::Packed),
            other => Err(other),
        }
    }
}

/// A packed 64-bit field identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(u64);

impl FieldId {
    /// Packs a field number, type and count
    pub fn new(number: i32, field_type: FieldType, count: FieldCount) -> Self {
        let mut id = u64::from(number as u32);
        id |= field_type.code() << FIELD_TYPE_SHIFT;
        id |= count.code() << FIELD_COUNT_SHIFT;
        Self(id)
    }

    /// Computes the ID of a field descriptor.
    ///
    /// Returns `None` when the declared type is missing or unknown.
    pub fn for_field(field: &FieldDescriptorProto) -> Option<Self> {
        let field_type = FieldType::of(field)?;
        Some(Self::new(field.number(), field_type, FieldCount::of(field)))
    }

    /// Wraps a raw value
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value
    pub fn get(self) -> u64 {
        self.0
    }

    /// Field number stored in the low 32 bits
    pub fn number(self) -> u32 {
        (self.0 & FIELD_NUMBER_MASK) as u32
    }

    /// Declared type, if the type byte holds a known code
    pub fn field_type(self) -> Option<FieldType> {
        FieldType::try_from((self.0 & FIELD_TYPE_MASK) >> FIELD_TYPE_SHIFT).ok()
    }

    /// Count, if the count nibble holds a known code
    pub fn count(self) -> Option<FieldCount> {
        FieldCount::try_from((self.0 & FIELD_COUNT_MASK) >> FIELD_COUNT_SHIFT).ok()
    }
}

/// Renders the C++ literal: `0x` + 16 zero-padded hex digits + `ULL`
impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}ULL", self.0)
    }
}

impl From<FieldId> for u64 {
    fn from(id: FieldId) -> u64 {
        id.0
    }
}
