//! Blocks, functions, and modules
//!
//! A block owns an array-backed list of statement handles. The leader and
//! exit are always derived from the list ends, never assigned, so insertion
//! can never leave them stale.

use crate::context::IrContext;
use crate::globals::{GlobalId, LocalConstId};
use crate::statement::StmtId;
use crate::symbols::FuncSymbolId;
use ollie_common::{OllieError, OllieResult};
use serde::{Deserialize, Serialize};

/// Handle to a basic block; doubles as the `.L<n>` label number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn label(self) -> String {
        format!(".L{}", self.0)
    }
}

/// Handle to a jump table; doubles as the `.JT<n>` label number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JumpTableId(pub u32);

impl JumpTableId {
    pub fn label(self) -> String {
        format!(".JT{}", self.0)
    }
}

/// A basic block: a label plus the statements it contains, in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    /// The function this block belongs to
    pub function: Option<FuncSymbolId>,
    statements: Vec<StmtId>,
}

impl BasicBlock {
    pub fn new(id: BlockId, function: Option<FuncSymbolId>) -> Self {
        Self {
            id,
            function,
            statements: Vec::new(),
        }
    }

    /// The first statement of the block
    pub fn leader(&self) -> Option<StmtId> {
        self.statements.first().copied()
    }

    /// The last statement of the block
    pub fn exit(&self) -> Option<StmtId> {
        self.statements.last().copied()
    }

    pub fn instruction_count(&self) -> usize {
        self.statements.len()
    }

    pub fn statements(&self) -> &[StmtId] {
        &self.statements
    }

    pub fn contains(&self, stmt: StmtId) -> bool {
        self.statements.contains(&stmt)
    }

    fn adopt(&self, ctx: &mut IrContext, stmt: StmtId) {
        let node = ctx.node_mut(stmt);
        node.block = Some(self.id);
        node.function = self.function;
    }

    /// Append a statement to the end of the block
    pub fn append(&mut self, ctx: &mut IrContext, stmt: StmtId) {
        self.adopt(ctx, stmt);
        self.statements.push(stmt);
    }

    /// Insert `new` immediately before `pivot`
    pub fn insert_before(
        &mut self,
        ctx: &mut IrContext,
        new: StmtId,
        pivot: StmtId,
    ) -> OllieResult<()> {
        let position = self.position_of(pivot)?;
        self.adopt(ctx, new);
        self.statements.insert(position, new);
        Ok(())
    }

    /// Insert `new` immediately after `pivot`
    pub fn insert_after(
        &mut self,
        ctx: &mut IrContext,
        new: StmtId,
        pivot: StmtId,
    ) -> OllieResult<()> {
        let position = self.position_of(pivot)?;
        self.adopt(ctx, new);
        self.statements.insert(position + 1, new);
        Ok(())
    }

    /// Remove a statement from the block, clearing its back-reference
    pub fn remove(&mut self, ctx: &mut IrContext, stmt: StmtId) -> OllieResult<()> {
        let position = self.position_of(stmt)?;
        self.statements.remove(position);
        let node = ctx.node_mut(stmt);
        node.block = None;
        node.function = None;
        Ok(())
    }

    fn position_of(&self, stmt: StmtId) -> OllieResult<usize> {
        self.statements
            .iter()
            .position(|&s| s == stmt)
            .ok_or_else(|| {
                OllieError::ir_error(format!(
                    "statement {} is not in block {}",
                    stmt.0,
                    self.id.label()
                ))
            })
    }
}

/// A jump table mapping dense case indices to block targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JumpTable {
    pub id: JumpTableId,
    pub targets: Vec<BlockId>,
}

/// One function's worth of IR
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub symbol: FuncSymbolId,
    pub blocks: Vec<BasicBlock>,
    /// The function-scoped `.LC` pool, in emission order
    pub local_constants: Vec<LocalConstId>,
    pub stack_frame_size: u32,
}

impl Function {
    pub fn new(symbol: FuncSymbolId) -> Self {
        Self {
            symbol,
            blocks: Vec::new(),
            local_constants: Vec::new(),
            stack_frame_size: 0,
        }
    }

    /// Create a fresh block owned by this function
    pub fn add_block(&mut self, ctx: &mut IrContext) -> BlockId {
        let id = ctx.next_block_id();
        self.blocks.push(BasicBlock::new(id, Some(self.symbol)));
        id
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    pub fn entry_block(&self) -> Option<&BasicBlock> {
        self.blocks.first()
    }

    pub fn statement_count(&self) -> usize {
        self.blocks.iter().map(BasicBlock::instruction_count).sum()
    }
}

/// A whole translation unit of IR
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    pub globals: Vec<GlobalId>,
    pub jump_tables: Vec<JumpTable>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            globals: Vec::new(),
            jump_tables: Vec::new(),
        }
    }

    pub fn add_function(&mut self, function: Function) -> &mut Function {
        self.functions.push(function);
        self.functions.last_mut().expect("just pushed")
    }

    pub fn function_by_symbol(&self, symbol: FuncSymbolId) -> Option<&Function> {
        self.functions.iter().find(|f| f.symbol == symbol)
    }

    pub fn jump_table(&self, id: JumpTableId) -> Option<&JumpTable> {
        self.jump_tables.iter().find(|t| t.id == id)
    }

    /// Serialize the module structure to JSON for driver tooling
    pub fn to_json(&self) -> OllieResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| OllieError::ir_error(format!("module serialization failed: {}", e)))
    }

    /// Rebuild a module from its JSON snapshot
    pub fn from_json(json: &str) -> OllieResult<Module> {
        serde_json::from_str(json)
            .map_err(|e| OllieError::ir_error(format!("module deserialization failed: {}", e)))
    }
}
