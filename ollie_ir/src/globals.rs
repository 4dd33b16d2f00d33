//! Global variables and function-scoped local constants

use crate::constant::ConstId;
use crate::symbols::VarSymbolId;
use serde::{Deserialize, Serialize};

/// Handle to a local constant (`.LC<n>`) in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalConstId(pub u32);

impl LocalConstId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a global variable in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalId(pub u32);

impl GlobalId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Payload of a `.LC` entry. Strings and floating-point literals are the
/// only data that reach the pool; floats keep their value so emission can
/// print the exact bit pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocalConstantValue {
    String(String),
    Float(f32),
    Double(f64),
}

/// A function-scoped constant pool entry, emitted as `.LC<id>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConstant {
    pub id: u32,
    pub value: LocalConstantValue,
    pub reference_count: u32,
}

impl LocalConstant {
    pub fn label(&self) -> String {
        format!(".LC{}", self.id)
    }
}

/// Initializer of a global variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GlobalInitializer {
    /// Uninitialized; lands in `.bss`
    None,
    Constant(ConstId),
    /// Constants in declaration order
    Array(Vec<ConstId>),
    String(String),
}

/// A global variable: symbol plus initializer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalVariable {
    pub symbol: VarSymbolId,
    pub initializer: GlobalInitializer,
    pub reference_count: u32,
    /// Set when the initializer holds pointers into the local-constant pool,
    /// which forces the `.data.rel.local` section
    pub relocatable_data: bool,
}

impl GlobalVariable {
    pub fn is_initialized(&self) -> bool {
        !matches!(self.initializer, GlobalInitializer::None)
    }
}
