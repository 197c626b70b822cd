use std::collections::HashMap;

use bebop_foundation::source::{SourceFileId, Span};
use indexmap::IndexMap;
use uuid::Uuid;

use crate::environment::DefId;

/// The scalar types built into the schema language. Their names are reserved;
/// user definitions cannot shadow them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Bool,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    String,
    Guid,
    Date,
}

impl BaseType {
    pub fn from_name(name: &str) -> Option<BaseType> {
        Some(match name {
            "bool" => BaseType::Bool,
            "byte" => BaseType::Byte,
            "int16" => BaseType::Int16,
            "uint16" => BaseType::UInt16,
            "int32" => BaseType::Int32,
            "uint32" => BaseType::UInt32,
            "int64" => BaseType::Int64,
            "uint64" => BaseType::UInt64,
            "float32" => BaseType::Float32,
            "float64" => BaseType::Float64,
            "string" => BaseType::String,
            "guid" => BaseType::Guid,
            "date" => BaseType::Date,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            BaseType::Bool => "bool",
            BaseType::Byte => "byte",
            BaseType::Int16 => "int16",
            BaseType::UInt16 => "uint16",
            BaseType::Int32 => "int32",
            BaseType::UInt32 => "uint32",
            BaseType::Int64 => "int64",
            BaseType::UInt64 => "uint64",
            BaseType::Float32 => "float32",
            BaseType::Float64 => "float64",
            BaseType::String => "string",
            BaseType::Guid => "guid",
            BaseType::Date => "date",
        }
    }

    pub fn is_integer(self) -> bool {
        self.integer_range().is_some()
    }

    pub fn is_float(self) -> bool {
        matches!(self, BaseType::Float32 | BaseType::Float64)
    }

    /// The inclusive range of values an integer base type can hold.
    pub fn integer_range(self) -> Option<(i128, i128)> {
        Some(match self {
            BaseType::Byte => (u8::MIN as i128, u8::MAX as i128),
            BaseType::Int16 => (i16::MIN as i128, i16::MAX as i128),
            BaseType::UInt16 => (u16::MIN as i128, u16::MAX as i128),
            BaseType::Int32 => (i32::MIN as i128, i32::MAX as i128),
            BaseType::UInt32 => (u32::MIN as i128, u32::MAX as i128),
            BaseType::Int64 => (i64::MIN as i128, i64::MAX as i128),
            BaseType::UInt64 => (u64::MIN as i128, u64::MAX as i128),
            _ => return None,
        })
    }

    /// Encoded size in bytes, or `None` for `string`, whose size depends on
    /// the value.
    pub fn fixed_size(self) -> Option<u32> {
        Some(match self {
            BaseType::Bool | BaseType::Byte => 1,
            BaseType::Int16 | BaseType::UInt16 => 2,
            BaseType::Int32 | BaseType::UInt32 | BaseType::Float32 => 4,
            BaseType::Int64 | BaseType::UInt64 | BaseType::Float64 | BaseType::Date => 8,
            BaseType::Guid => 16,
            BaseType::String => return None,
        })
    }
}

/// A fully resolved type. `Error` stands in for a reference that failed to
/// resolve and poisons whatever contains it; a schema containing one is never
/// surfaced as a successful compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Base(BaseType),
    Array(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Optional(Box<Type>),
    Defined(DefId),
    Error,
}

/// Data shared by every definition kind.
#[derive(Debug, Clone)]
pub struct DefHeader {
    pub name: String,
    pub file: SourceFileId,
    pub span: Span,
    pub doc: Option<String>,
    /// The union this definition is a branch of, if any.
    pub parent: Option<DefId>,
}

/// A resolved `[opcode(..)]` attribute. The value is the `u32` itself or the
/// little-endian reading of a four-character ASCII tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub value: u32,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumDef {
    pub header: DefHeader,
    pub base: BaseType,
    pub is_flags: bool,
    pub members: Vec<EnumMemberDef>,
}

#[derive(Debug, Clone)]
pub struct EnumMemberDef {
    pub name: String,
    pub value: i128,
    pub doc: Option<String>,
    pub deprecated: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct StructDef {
    pub header: DefHeader,
    pub is_readonly: bool,
    pub opcode: Option<Opcode>,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub ty: Type,
    pub doc: Option<String>,
    pub deprecated: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct MessageDef {
    pub header: DefHeader,
    pub opcode: Option<Opcode>,
    pub fields: Vec<MessageFieldDef>,
}

#[derive(Debug, Clone)]
pub struct MessageFieldDef {
    /// Unique within the message, in `1..=255`, increasing in source order.
    /// Gaps are allowed and mean "reserved".
    pub index: u8,
    pub field: FieldDef,
}

#[derive(Debug, Clone)]
pub struct UnionDef {
    pub header: DefHeader,
    pub opcode: Option<Opcode>,
    pub branches: Vec<UnionBranchDef>,
}

#[derive(Debug, Clone)]
pub struct UnionBranchDef {
    pub discriminator: u8,
    pub def: DefId,
    pub doc: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ConstDef {
    pub header: DefHeader,
    pub ty: BaseType,
    pub value: ConstValue,
}

/// An evaluated constant, in its canonical representation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    Integer(i128),
    Float(f64),
    String(String),
    Guid(Uuid),
}

#[derive(Debug, Clone)]
pub enum Definition {
    Enum(EnumDef),
    Struct(StructDef),
    Message(MessageDef),
    Union(UnionDef),
    Const(ConstDef),
}

impl Definition {
    pub fn header(&self) -> &DefHeader {
        match self {
            Definition::Enum(def) => &def.header,
            Definition::Struct(def) => &def.header,
            Definition::Message(def) => &def.header,
            Definition::Union(def) => &def.header,
            Definition::Const(def) => &def.header,
        }
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Definition::Enum(_) => "enum",
            Definition::Struct(_) => "struct",
            Definition::Message(_) => "message",
            Definition::Union(_) => "union",
            Definition::Const(_) => "const",
        }
    }

    pub fn opcode(&self) -> Option<Opcode> {
        match self {
            Definition::Struct(def) => def.opcode,
            Definition::Message(def) => def.opcode,
            Definition::Union(def) => def.opcode,
            Definition::Enum(_) | Definition::Const(_) => None,
        }
    }
}

/// The validated, immutable intermediate representation handed to generators.
///
/// Iteration order of `definitions` is source order; generated output must be
/// stable across runs, so this order is part of the public contract.
#[derive(Debug, Clone)]
pub struct Schema {
    pub namespace: Option<String>,
    /// Top-level definitions by name. Union branch definitions are reachable
    /// through their parent union and the environment.
    pub definitions: IndexMap<String, DefId>,
    /// Top-level definitions that no other definition references.
    pub roots: Vec<DefId>,
    /// Smallest possible encoding, in bytes, of a value of each definition.
    pub minimal_sizes: HashMap<DefId, u32>,
}
