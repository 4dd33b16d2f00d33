//! Generic type records consumed by the IR layer
//!
//! The front end populates these; the IR only queries size, signedness and
//! floating-point class. Types live in a `TypeArena` and are referenced by
//! `TypeId` handles.

use ollie_common::{OllieError, OllieResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique handle to a type record in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Basic scalar type tokens as the front end reports them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Char,
    Bool,
    Void,
}

impl BasicType {
    /// Size of the type in bytes
    pub fn size(self) -> u32 {
        match self {
            BasicType::I8 | BasicType::U8 | BasicType::Char | BasicType::Bool => 1,
            BasicType::I16 | BasicType::U16 => 2,
            BasicType::I32 | BasicType::U32 | BasicType::F32 => 4,
            BasicType::I64 | BasicType::U64 | BasicType::F64 => 8,
            BasicType::Void => 0,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            BasicType::I8 | BasicType::I16 | BasicType::I32 | BasicType::I64
        )
    }

    pub fn is_floating_point(self) -> bool {
        matches!(self, BasicType::F32 | BasicType::F64)
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BasicType::I8 => "i8",
            BasicType::U8 => "u8",
            BasicType::I16 => "i16",
            BasicType::U16 => "u16",
            BasicType::I32 => "i32",
            BasicType::U32 => "u32",
            BasicType::I64 => "i64",
            BasicType::U64 => "u64",
            BasicType::F32 => "f32",
            BasicType::F64 => "f64",
            BasicType::Char => "char",
            BasicType::Bool => "bool",
            BasicType::Void => "void",
        };
        write!(f, "{}", name)
    }
}

/// Class tag for a generic type record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    /// A basic scalar type
    Basic(BasicType),
    /// Pointer to another type
    Pointer { points_to: TypeId },
    /// Fixed-size array
    Array { member: TypeId, num_members: u32 },
    /// Function signature (used for function pointers)
    Function {
        return_type: TypeId,
        parameters: Vec<TypeId>,
    },
    /// Named aggregate; the IR only needs its size
    Struct { name: String, size: u32 },
}

/// A generic type record: class tag plus computed byte size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericType {
    pub kind: TypeKind,
    pub size: u32,
}

/// Storage-size class of a variable
///
/// Byte/Word/DoubleWord/QuadWord are the integer widths, SinglePrecision and
/// DoublePrecision are the SSE widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableSize {
    Byte,
    Word,
    DoubleWord,
    QuadWord,
    SinglePrecision,
    DoublePrecision,
}

impl VariableSize {
    pub fn bytes(self) -> u32 {
        match self {
            VariableSize::Byte => 1,
            VariableSize::Word => 2,
            VariableSize::DoubleWord | VariableSize::SinglePrecision => 4,
            VariableSize::QuadWord | VariableSize::DoublePrecision => 8,
        }
    }

    pub fn is_floating_point(self) -> bool {
        matches!(
            self,
            VariableSize::SinglePrecision | VariableSize::DoublePrecision
        )
    }

    /// The AT&T operand-size suffix for this class
    pub fn suffix(self) -> char {
        match self {
            VariableSize::Byte => 'b',
            VariableSize::Word => 'w',
            VariableSize::DoubleWord => 'l',
            VariableSize::QuadWord => 'q',
            VariableSize::SinglePrecision => 's',
            VariableSize::DoublePrecision => 'd',
        }
    }
}

impl fmt::Display for VariableSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariableSize::Byte => "byte",
            VariableSize::Word => "word",
            VariableSize::DoubleWord => "dword",
            VariableSize::QuadWord => "qword",
            VariableSize::SinglePrecision => "single",
            VariableSize::DoublePrecision => "double",
        };
        write!(f, "{}", name)
    }
}

/// Arena holding every type record for one compilation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeArena {
    records: Vec<GenericType>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, record: GenericType) -> TypeId {
        let id = TypeId(self.records.len() as u32);
        self.records.push(record);
        id
    }

    pub fn get(&self, id: TypeId) -> &GenericType {
        &self.records[id.index()]
    }

    /// Register a basic scalar type
    pub fn basic(&mut self, token: BasicType) -> TypeId {
        // Basic records are tiny; re-registration is cheaper than interning.
        self.add(GenericType {
            kind: TypeKind::Basic(token),
            size: token.size(),
        })
    }

    pub fn pointer_to(&mut self, points_to: TypeId) -> TypeId {
        self.add(GenericType {
            kind: TypeKind::Pointer { points_to },
            size: 8,
        })
    }

    pub fn array_of(&mut self, member: TypeId, num_members: u32) -> TypeId {
        let member_size = self.get(member).size;
        self.add(GenericType {
            kind: TypeKind::Array {
                member,
                num_members,
            },
            size: member_size * num_members,
        })
    }

    pub fn function(&mut self, return_type: TypeId, parameters: Vec<TypeId>) -> TypeId {
        // A function type is referenced through pointers only.
        self.add(GenericType {
            kind: TypeKind::Function {
                return_type,
                parameters,
            },
            size: 8,
        })
    }

    pub fn struct_type(&mut self, name: impl Into<String>, size: u32) -> TypeId {
        self.add(GenericType {
            kind: TypeKind::Struct {
                name: name.into(),
                size,
            },
            size,
        })
    }

    pub fn size(&self, id: TypeId) -> u32 {
        self.get(id).size
    }

    pub fn basic_type(&self, id: TypeId) -> Option<BasicType> {
        match self.get(id).kind {
            TypeKind::Basic(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_floating_point(&self, id: TypeId) -> bool {
        self.basic_type(id)
            .map(BasicType::is_floating_point)
            .unwrap_or(false)
    }

    /// Pointers and aggregates count as unsigned for selection purposes
    pub fn is_signed(&self, id: TypeId) -> bool {
        self.basic_type(id).map(BasicType::is_signed).unwrap_or(false)
    }

    pub fn is_pointer(&self, id: TypeId) -> bool {
        matches!(self.get(id).kind, TypeKind::Pointer { .. })
    }

    pub fn pointee(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id).kind {
            TypeKind::Pointer { points_to } => Some(points_to),
            _ => None,
        }
    }

    /// Storage-size class for a variable of this type
    pub fn variable_size(&self, id: TypeId) -> OllieResult<VariableSize> {
        let record = self.get(id);
        match &record.kind {
            TypeKind::Basic(BasicType::F32) => Ok(VariableSize::SinglePrecision),
            TypeKind::Basic(BasicType::F64) => Ok(VariableSize::DoublePrecision),
            TypeKind::Basic(BasicType::Void) => Err(OllieError::type_error(
                "void has no storage size class",
            )),
            TypeKind::Pointer { .. } | TypeKind::Function { .. } => Ok(VariableSize::QuadWord),
            _ => match record.size {
                1 => Ok(VariableSize::Byte),
                2 => Ok(VariableSize::Word),
                4 => Ok(VariableSize::DoubleWord),
                8 => Ok(VariableSize::QuadWord),
                other => Err(OllieError::type_error(format!(
                    "no scalar size class for a {}-byte type",
                    other
                ))),
            },
        }
    }
}
