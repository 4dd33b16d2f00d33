//! Process-scoped ownership of all IR nodes
//!
//! The `IrContext` owns every variable, constant, statement, live range,
//! local constant, and global allocated during one compilation, along with
//! the monotonic id counters. Nothing is freed individually; the whole IR
//! lives until the context is dropped.

use crate::constant::{self, ConstId, ConstantValue};
use crate::globals::{
    GlobalId, GlobalInitializer, GlobalVariable, LocalConstId, LocalConstant, LocalConstantValue,
};
use crate::live_range::{LiveRange, LiveRangeId};
use crate::module::{BlockId, JumpTableId};
use crate::statement::{Statement, StmtId};
use crate::symbols::{FuncSymbolId, StackRegion, SymbolTable, VarSymbolId};
use crate::types::{BasicType, TypeArena, TypeId, TypeKind, VariableSize};
use crate::variable::{VarId, Variable, VariableKind};
use log::{debug, trace};
use ollie_common::{OllieError, OllieResult};

/// A statement together with its block/function back-references
#[derive(Debug, Clone)]
pub struct StatementNode {
    pub statement: Statement,
    pub block: Option<BlockId>,
    pub function: Option<FuncSymbolId>,
}

/// The per-compilation arena context
#[derive(Debug, Default)]
pub struct IrContext {
    pub types: TypeArena,
    pub symbols: SymbolTable,
    variables: Vec<Variable>,
    constants: Vec<ConstantValue>,
    statements: Vec<StatementNode>,
    live_ranges: Vec<LiveRange>,
    local_constants: Vec<LocalConstant>,
    globals: Vec<GlobalVariable>,
    next_temp_id: u32,
    next_block_id: u32,
    next_jump_table_id: u32,
    next_local_constant_id: u32,
}

impl IrContext {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- arena accessors -------------------------------------------------

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.index()]
    }

    pub fn variable_mut(&mut self, id: VarId) -> &mut Variable {
        &mut self.variables[id.index()]
    }

    pub fn constant(&self, id: ConstId) -> &ConstantValue {
        &self.constants[id.index()]
    }

    pub fn node(&self, id: StmtId) -> &StatementNode {
        &self.statements[id.index()]
    }

    pub fn node_mut(&mut self, id: StmtId) -> &mut StatementNode {
        &mut self.statements[id.index()]
    }

    pub fn statement(&self, id: StmtId) -> &Statement {
        &self.node(id).statement
    }

    pub fn live_range(&self, id: LiveRangeId) -> &LiveRange {
        &self.live_ranges[id.index()]
    }

    pub fn live_range_mut(&mut self, id: LiveRangeId) -> &mut LiveRange {
        &mut self.live_ranges[id.index()]
    }

    pub fn local_constant(&self, id: LocalConstId) -> &LocalConstant {
        &self.local_constants[id.index()]
    }

    pub fn global(&self, id: GlobalId) -> &GlobalVariable {
        &self.globals[id.index()]
    }

    pub fn global_mut(&mut self, id: GlobalId) -> &mut GlobalVariable {
        &mut self.globals[id.index()]
    }

    pub fn globals(&self) -> impl Iterator<Item = (GlobalId, &GlobalVariable)> {
        self.globals
            .iter()
            .enumerate()
            .map(|(i, g)| (GlobalId(i as u32), g))
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn constant_count(&self) -> usize {
        self.constants.len()
    }

    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    // ---- id counters -----------------------------------------------------

    pub fn next_block_id(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        id
    }

    pub fn next_jump_table_id(&mut self) -> JumpTableId {
        let id = JumpTableId(self.next_jump_table_id);
        self.next_jump_table_id += 1;
        id
    }

    // ---- variable emitters -----------------------------------------------

    fn add_variable(&mut self, variable: Variable) -> VarId {
        let id = VarId(self.variables.len() as u32);
        trace!("emit variable v{} ({:?})", id.0, variable.kind);
        self.variables.push(variable);
        id
    }

    /// A fresh compiler temporary of the given type
    pub fn temp(&mut self, defined_type: TypeId) -> OllieResult<VarId> {
        let size = self.types.variable_size(defined_type)?;
        let id = self.next_temp_id;
        self.next_temp_id += 1;
        Ok(self.add_variable(Variable::new(
            VariableKind::Temp { id },
            defined_type,
            size,
        )))
    }

    /// A reference to a `.LC` pool entry; bumps the entry's reference count
    pub fn local_constant_temp(&mut self, constant: LocalConstId) -> VarId {
        self.local_constants[constant.index()].reference_count += 1;
        let defined_type = self.types.basic(BasicType::U64);
        self.add_variable(Variable::new(
            VariableKind::LocalConstant { constant },
            defined_type,
            VariableSize::QuadWord,
        ))
    }

    /// A RIP-relative reference to a function, typed by its signature
    pub fn function_pointer_temp(&mut self, function: FuncSymbolId) -> VarId {
        let signature = self.symbols.function(function).signature;
        self.add_variable(Variable::new(
            VariableKind::FunctionAddress { function },
            signature,
            VariableSize::QuadWord,
        ))
    }

    /// A variable referencing a source-level symbol at SSA generation zero.
    ///
    /// If the symbol has an alias, the alias is substituted: function
    /// parameters alias their in-function implementation.
    pub fn var(&mut self, symbol: VarSymbolId) -> OllieResult<VarId> {
        self.var_ssa(symbol, 0)
    }

    /// Like [`IrContext::var`] with an explicit SSA generation
    pub fn var_ssa(&mut self, symbol: VarSymbolId, ssa_generation: u32) -> OllieResult<VarId> {
        let symbol = self.symbols.resolve_alias(symbol);
        let defined_type = self.symbols.variable(symbol).defined_type;
        let size = self.types.variable_size(defined_type)?;
        Ok(self.add_variable(Variable::new(
            VariableKind::NonTemp {
                symbol,
                ssa_generation,
            },
            defined_type,
            size,
        )))
    }

    /// Like [`IrContext::var`] but the inferred (post-cast) type overrides
    /// the symbol's declared type
    pub fn var_from_identifier(
        &mut self,
        symbol: VarSymbolId,
        inferred_type: TypeId,
    ) -> OllieResult<VarId> {
        let symbol = self.symbols.resolve_alias(symbol);
        let size = self.types.variable_size(inferred_type)?;
        Ok(self.add_variable(Variable::new(
            VariableKind::NonTemp {
                symbol,
                ssa_generation: 0,
            },
            inferred_type,
            size,
        )))
    }

    /// The address of a named storage location
    pub fn memory_address_var(&mut self, symbol: VarSymbolId) -> VarId {
        let symbol = self.symbols.resolve_alias(symbol);
        let record = self.symbols.variable(symbol);
        let stack_region = record.stack_region;
        let defined_type = record.defined_type;
        self.add_variable(Variable::new(
            VariableKind::MemoryAddress {
                symbol: Some(symbol),
                stack_region,
            },
            defined_type,
            VariableSize::QuadWord,
        ))
    }

    /// The address of an anonymous stack region
    pub fn memory_address_temp(&mut self, defined_type: TypeId, region: StackRegion) -> VarId {
        self.add_variable(Variable::new(
            VariableKind::MemoryAddress {
                symbol: None,
                stack_region: Some(region),
            },
            defined_type,
            VariableSize::QuadWord,
        ))
    }

    /// A fresh temp linked into an existing live range
    pub fn temp_from_live_range(&mut self, live_range: LiveRangeId) -> VarId {
        let id = self.next_temp_id;
        self.next_temp_id += 1;
        let defined_type = self.types.basic(BasicType::U64);
        let mut variable = Variable::new(
            VariableKind::Temp { id },
            defined_type,
            VariableSize::QuadWord,
        );
        variable.live_range = Some(live_range);
        let var_id = self.add_variable(variable);
        self.live_ranges[live_range.index()].variables.push(var_id);
        var_id
    }

    /// Bitwise copy preserving kind, stack-pointer flag, and SSA generation
    pub fn var_copy(&mut self, source: VarId) -> VarId {
        let copy = self.variable(source).clone();
        self.add_variable(copy)
    }

    // ---- constant emitters -----------------------------------------------

    /// Intern a constant value
    pub fn constant_of(&mut self, value: ConstantValue) -> ConstId {
        let id = ConstId(self.constants.len() as u32);
        self.constants.push(value);
        id
    }

    /// Emit an integer or character constant with the kind chosen from a
    /// basic scalar type token. Strings and floats take the local-constant
    /// path instead.
    pub fn int_constant(&mut self, value: i64, defined_type: TypeId) -> OllieResult<ConstId> {
        let token = match &self.types.get(defined_type).kind {
            TypeKind::Basic(token) => *token,
            TypeKind::Pointer { .. } => {
                // Pointer-typed literals (null and friends) are quad words.
                return Ok(self.constant_of(ConstantValue::ULong(value as u64)));
            }
            other => {
                return Err(OllieError::internal_error(format!(
                    "cannot build a direct constant of non-scalar type {:?}",
                    other
                )))
            }
        };
        let kind = match token {
            BasicType::I8 => in_range(value, i8::MIN as i64, i8::MAX as i64, token)
                .map(|v| ConstantValue::Byte(v as i8))?,
            BasicType::U8 => in_range(value, 0, u8::MAX as i64, token)
                .map(|v| ConstantValue::UByte(v as u8))?,
            BasicType::I16 => in_range(value, i16::MIN as i64, i16::MAX as i64, token)
                .map(|v| ConstantValue::Short(v as i16))?,
            BasicType::U16 => in_range(value, 0, u16::MAX as i64, token)
                .map(|v| ConstantValue::UShort(v as u16))?,
            BasicType::I32 => in_range(value, i32::MIN as i64, i32::MAX as i64, token)
                .map(|v| ConstantValue::Int(v as i32))?,
            BasicType::U32 => in_range(value, 0, u32::MAX as i64, token)
                .map(|v| ConstantValue::UInt(v as u32))?,
            BasicType::I64 => ConstantValue::Long(value),
            BasicType::U64 => ConstantValue::ULong(value as u64),
            BasicType::Char => in_range(value, 0, u8::MAX as i64, token)
                .map(|v| ConstantValue::Char(v as u8))?,
            BasicType::Bool => in_range(value, 0, 1, token)
                .map(|v| ConstantValue::UByte(v as u8))?,
            BasicType::F32 | BasicType::F64 => {
                return Err(OllieError::internal_error(
                    "floating-point literals are emitted through the local-constant pool",
                ))
            }
            BasicType::Void => {
                return Err(OllieError::internal_error(
                    "cannot build a constant of type void",
                ))
            }
        };
        Ok(self.constant_of(kind))
    }

    /// A constant referring to a local-constant variable, for use inside
    /// global initializer tables
    pub fn relative_address_constant(&mut self, target: VarId) -> ConstId {
        self.constant_of(ConstantValue::RelativeAddress(target))
    }

    // ---- constant folding ------------------------------------------------

    /// Fold `a + b`, interning the result
    pub fn fold_add(&mut self, a: ConstId, b: ConstId) -> OllieResult<ConstId> {
        let value = constant::fold_add(self.constant(a), self.constant(b))?;
        Ok(self.constant_of(value))
    }

    /// Fold `a - b`, interning the result
    pub fn fold_sub(&mut self, a: ConstId, b: ConstId) -> OllieResult<ConstId> {
        let value = constant::fold_sub(self.constant(a), self.constant(b))?;
        Ok(self.constant_of(value))
    }

    /// Fold `a * b`, interning the result
    pub fn fold_mul(&mut self, a: ConstId, b: ConstId) -> OllieResult<ConstId> {
        let value = constant::fold_mul(self.constant(a), self.constant(b))?;
        Ok(self.constant_of(value))
    }

    /// Fold `a || b` on literal truthiness, interning the 0/1 ULong result
    pub fn fold_logical_or(&mut self, a: ConstId, b: ConstId) -> OllieResult<ConstId> {
        let value = constant::fold_logical_or(self.constant(a), self.constant(b))?;
        Ok(self.constant_of(value))
    }

    /// Fold `a && b` on literal truthiness, interning the 0/1 ULong result
    pub fn fold_logical_and(&mut self, a: ConstId, b: ConstId) -> OllieResult<ConstId> {
        let value = constant::fold_logical_and(self.constant(a), self.constant(b))?;
        Ok(self.constant_of(value))
    }

    /// Fold `a + raw`, promoting to a signed Long
    pub fn fold_add_raw(&mut self, a: ConstId, raw: i64) -> OllieResult<ConstId> {
        let value = constant::fold_add_raw(self.constant(a), raw)?;
        Ok(self.constant_of(value))
    }

    // ---- live ranges -----------------------------------------------------

    pub fn new_live_range(&mut self) -> LiveRangeId {
        let id = LiveRangeId(self.live_ranges.len() as u32);
        self.live_ranges.push(LiveRange::new(id.0));
        id
    }

    /// Attach a variable to a live range, linking both directions
    pub fn attach_live_range(&mut self, variable: VarId, live_range: LiveRangeId) {
        self.variables[variable.index()].live_range = Some(live_range);
        let range = &mut self.live_ranges[live_range.index()];
        if !range.variables.contains(&variable) {
            range.variables.push(variable);
        }
    }

    // ---- local constants and globals -------------------------------------

    fn add_local_constant(&mut self, value: LocalConstantValue) -> LocalConstId {
        let id = LocalConstId(self.local_constants.len() as u32);
        let label_id = self.next_local_constant_id;
        self.next_local_constant_id += 1;
        self.local_constants.push(LocalConstant {
            id: label_id,
            value,
            reference_count: 0,
        });
        id
    }

    /// A `.LC` entry holding a string literal
    pub fn string_local_constant(&mut self, value: impl Into<String>) -> LocalConstId {
        self.add_local_constant(LocalConstantValue::String(value.into()))
    }

    /// A `.LC` entry holding a single-precision literal
    pub fn float_local_constant(&mut self, value: f32) -> LocalConstId {
        self.add_local_constant(LocalConstantValue::Float(value))
    }

    /// A `.LC` entry holding a double-precision literal
    pub fn double_local_constant(&mut self, value: f64) -> LocalConstId {
        self.add_local_constant(LocalConstantValue::Double(value))
    }

    /// Register a global variable. Initializers holding pointers into the
    /// local-constant pool force the relocatable-writable-data section.
    pub fn add_global(
        &mut self,
        symbol: VarSymbolId,
        initializer: GlobalInitializer,
    ) -> GlobalId {
        let relocatable_data = match &initializer {
            GlobalInitializer::Constant(c) => {
                matches!(self.constant(*c), ConstantValue::RelativeAddress(_))
            }
            GlobalInitializer::Array(members) => members
                .iter()
                .any(|c| matches!(self.constant(*c), ConstantValue::RelativeAddress(_))),
            _ => false,
        };
        let id = GlobalId(self.globals.len() as u32);
        self.globals.push(GlobalVariable {
            symbol,
            initializer,
            reference_count: 0,
            relocatable_data,
        });
        id
    }

    // ---- statement emitters ----------------------------------------------

    fn add_statement(&mut self, statement: Statement) -> StmtId {
        let id = StmtId(self.statements.len() as u32);
        trace!("emit statement s{} ({})", id.0, statement.class_name());
        self.statements.push(StatementNode {
            statement,
            block: None,
            function: None,
        });
        id
    }

    pub fn emit_binary_op(
        &mut self,
        assignee: VarId,
        op1: VarId,
        op: crate::operators::Operator,
        op2: VarId,
    ) -> StmtId {
        self.add_statement(Statement::BinaryOp {
            assignee,
            op1,
            op,
            op2,
        })
    }

    pub fn emit_binary_op_const(
        &mut self,
        assignee: VarId,
        op1: VarId,
        op: crate::operators::Operator,
        op2: ConstId,
    ) -> StmtId {
        self.add_statement(Statement::BinaryOpConst {
            assignee,
            op1,
            op,
            op2,
        })
    }

    pub fn emit_assign(&mut self, assignee: VarId, op1: VarId) -> StmtId {
        self.add_statement(Statement::Assign { assignee, op1 })
    }

    pub fn emit_assign_const(&mut self, assignee: VarId, constant: ConstId) -> StmtId {
        self.add_statement(Statement::AssignConst { assignee, constant })
    }

    pub fn emit_ret(&mut self, value: Option<VarId>) -> StmtId {
        self.add_statement(Statement::Ret { value })
    }

    pub fn emit_jump(&mut self, target: BlockId) -> StmtId {
        self.add_statement(Statement::Jump { target })
    }

    pub fn emit_branch(
        &mut self,
        if_target: BlockId,
        else_target: BlockId,
        relies_on: VarId,
        branch: crate::operators::ConditionCode,
    ) -> StmtId {
        self.add_statement(Statement::Branch {
            if_target,
            else_target,
            relies_on,
            branch,
        })
    }

    pub fn emit_call(
        &mut self,
        assignee: Option<VarId>,
        function: FuncSymbolId,
        parameters: crate::statement::ParameterList,
    ) -> StmtId {
        self.add_statement(Statement::Call {
            assignee,
            function,
            parameters,
        })
    }

    pub fn emit_indirect_call(
        &mut self,
        assignee: Option<VarId>,
        callee: VarId,
        parameters: crate::statement::ParameterList,
    ) -> StmtId {
        self.add_statement(Statement::IndirectCall {
            assignee,
            callee,
            parameters,
        })
    }

    pub fn emit_load(&mut self, assignee: VarId, address: VarId) -> StmtId {
        self.variables[address.index()].is_dereferenced = true;
        self.add_statement(Statement::Load { assignee, address })
    }

    pub fn emit_store(&mut self, address: VarId, source: VarId) -> StmtId {
        self.variables[address.index()].is_dereferenced = true;
        self.add_statement(Statement::Store { address, source })
    }

    pub fn emit_load_off(&mut self, assignee: VarId, address: VarId, offset: ConstId) -> StmtId {
        self.variables[address.index()].is_dereferenced = true;
        self.add_statement(Statement::LoadOff {
            assignee,
            address,
            offset,
        })
    }

    pub fn emit_store_off(&mut self, address: VarId, offset: ConstId, source: VarId) -> StmtId {
        self.variables[address.index()].is_dereferenced = true;
        self.add_statement(Statement::StoreOff {
            address,
            offset,
            source,
        })
    }

    pub fn emit_lea(&mut self, assignee: VarId, form: crate::statement::LeaForm) -> StmtId {
        self.add_statement(Statement::Lea { assignee, form })
    }

    pub fn emit_phi(
        &mut self,
        assignee: VarId,
        parameters: crate::statement::ParameterList,
    ) -> StmtId {
        self.add_statement(Statement::Phi {
            assignee,
            parameters,
        })
    }

    pub fn emit_neg(&mut self, assignee: VarId, op1: VarId) -> StmtId {
        self.add_statement(Statement::Neg { assignee, op1 })
    }

    pub fn emit_not(&mut self, assignee: VarId, op1: VarId) -> StmtId {
        self.add_statement(Statement::Not { assignee, op1 })
    }

    pub fn emit_logical_not(&mut self, assignee: VarId, op1: VarId) -> StmtId {
        self.add_statement(Statement::LogicalNot { assignee, op1 })
    }

    pub fn emit_inc(&mut self, target: VarId) -> StmtId {
        self.add_statement(Statement::Inc { target })
    }

    pub fn emit_dec(&mut self, target: VarId) -> StmtId {
        self.add_statement(Statement::Dec { target })
    }

    pub fn emit_asm_inline(&mut self, assembly: impl Into<String>) -> StmtId {
        self.add_statement(Statement::AsmInline {
            assembly: assembly.into(),
        })
    }

    pub fn emit_idle(&mut self) -> StmtId {
        self.add_statement(Statement::Idle)
    }

    pub fn emit_test_if_not_zero(&mut self, target: VarId) -> StmtId {
        self.add_statement(Statement::TestIfNotZero { target })
    }

    pub fn emit_mem_access(
        &mut self,
        assignee: VarId,
        address: VarId,
        access: crate::statement::MemoryAccessType,
    ) -> StmtId {
        self.variables[address.index()].is_dereferenced = true;
        self.add_statement(Statement::MemAccess {
            assignee,
            address,
            access,
        })
    }

    pub fn emit_indir_jump_addr_calc(
        &mut self,
        assignee: VarId,
        jump_table: JumpTableId,
        index: VarId,
        multiplier: u8,
    ) -> StmtId {
        self.add_statement(Statement::IndirJumpAddrCalc {
            assignee,
            jump_table,
            index,
            multiplier,
        })
    }

    pub fn emit_indirect_jump(&mut self, address: VarId) -> StmtId {
        self.add_statement(Statement::IndirectJump { address })
    }

    pub fn emit_clear(&mut self, target: VarId) -> StmtId {
        self.add_statement(Statement::Clear { target })
    }

    pub fn emit_stack_alloc(&mut self, bytes: u32) -> StmtId {
        self.add_statement(Statement::StackAlloc { bytes })
    }

    pub fn emit_stack_dealloc(&mut self, bytes: u32) -> StmtId {
        self.add_statement(Statement::StackDealloc { bytes })
    }

    pub fn emit_set_ne(&mut self, assignee: VarId) -> StmtId {
        self.add_statement(Statement::SetNe { assignee })
    }
}

impl Drop for IrContext {
    fn drop(&mut self) {
        debug!(
            "ir context teardown: {} variables, {} constants, {} statements, {} live ranges",
            self.variables.len(),
            self.constants.len(),
            self.statements.len(),
            self.live_ranges.len()
        );
    }
}

fn in_range(value: i64, min: i64, max: i64, token: BasicType) -> OllieResult<i64> {
    if value < min || value > max {
        return Err(OllieError::type_error(format!(
            "literal {} does not fit in type {}",
            value, token
        )));
    }
    Ok(value)
}
