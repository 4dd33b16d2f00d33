//! Symbol-table records consumed by the IR layer
//!
//! The front end and type checker populate these records; the IR treats them
//! as opaque handles apart from the fields listed here.

use crate::types::TypeId;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Handle to a variable symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarSymbolId(pub u32);

impl VarSymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a function symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FuncSymbolId(pub u32);

impl FuncSymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// System-V parameter register class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterClass {
    Integer,
    Sse,
}

/// A region of the function's stack frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRegion {
    /// Offset from the frame base, in bytes
    pub offset: i32,
    pub size: u32,
}

/// A source-level variable record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSymbol {
    pub name: String,
    /// The declared type
    pub defined_type: TypeId,
    /// Stack region, once frame layout has assigned one
    pub stack_region: Option<StackRegion>,
    /// Parameter register class, if this symbol is a function parameter
    pub parameter_class: Option<ParameterClass>,
    /// Order within the parameter class (0-based)
    pub parameter_order: Option<u8>,
    /// Function parameters alias their in-function implementation symbol
    pub alias: Option<VarSymbolId>,
    /// The function this symbol belongs to; `None` for globals
    pub function: Option<FuncSymbolId>,
    pub is_global: bool,
}

impl VariableSymbol {
    pub fn new(name: impl Into<String>, defined_type: TypeId) -> Self {
        Self {
            name: name.into(),
            defined_type,
            stack_region: None,
            parameter_class: None,
            parameter_order: None,
            alias: None,
            function: None,
            is_global: false,
        }
    }

    pub fn with_stack_region(mut self, region: StackRegion) -> Self {
        self.stack_region = Some(region);
        self
    }

    pub fn with_parameter(mut self, class: ParameterClass, order: u8) -> Self {
        self.parameter_class = Some(class);
        self.parameter_order = Some(order);
        self
    }

    pub fn with_function(mut self, function: FuncSymbolId) -> Self {
        self.function = Some(function);
        self
    }

    pub fn global(mut self) -> Self {
        self.is_global = true;
        self
    }
}

/// A function record: name plus signature type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSymbol {
    pub name: String,
    pub signature: TypeId,
}

/// The symbol table handed over by the front end
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    variables: Vec<VariableSymbol>,
    functions: Vec<FunctionSymbol>,
    variables_by_name: HashMap<String, VarSymbolId>,
    functions_by_name: HashMap<String, FuncSymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, symbol: VariableSymbol) -> VarSymbolId {
        let id = VarSymbolId(self.variables.len() as u32);
        self.variables_by_name.insert(symbol.name.clone(), id);
        self.variables.push(symbol);
        id
    }

    pub fn add_function(&mut self, symbol: FunctionSymbol) -> FuncSymbolId {
        let id = FuncSymbolId(self.functions.len() as u32);
        self.functions_by_name.insert(symbol.name.clone(), id);
        self.functions.push(symbol);
        id
    }

    pub fn variable(&self, id: VarSymbolId) -> &VariableSymbol {
        &self.variables[id.index()]
    }

    pub fn variable_mut(&mut self, id: VarSymbolId) -> &mut VariableSymbol {
        &mut self.variables[id.index()]
    }

    pub fn function(&self, id: FuncSymbolId) -> &FunctionSymbol {
        &self.functions[id.index()]
    }

    pub fn lookup_variable(&self, name: &str) -> Option<VarSymbolId> {
        self.variables_by_name.get(name).copied()
    }

    pub fn lookup_function(&self, name: &str) -> Option<FuncSymbolId> {
        self.functions_by_name.get(name).copied()
    }

    /// Follow the alias link, if any. Aliases do not chain.
    pub fn resolve_alias(&self, id: VarSymbolId) -> VarSymbolId {
        self.variable(id).alias.unwrap_or(id)
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}
