//! Concrete x86-64 addressing modes and abstract-LEA lowering
//!
//! The abstract LEA forms carry constant handles; lowering resolves them to
//! literal displacements and applies the degenerate rewrites: a zero offset
//! over a single base collapses to a register move, and a scale of one
//! collapses the scaled form to its unscaled counterpart.

use ollie_ir::{ConstId, IrContext, JumpTableId, LeaForm, VarId};
use ollie_common::{OllieError, OllieResult};
use serde::{Deserialize, Serialize};

/// A concrete address-calculation mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressMode {
    /// `k(r)`
    OffsetOnly { offset: i64, base: VarId },
    /// `(r1, r2)`
    RegistersOnly { base: VarId, index: VarId },
    /// `(r1, r2, s)`
    RegistersAndScale { base: VarId, index: VarId, scale: u8 },
    /// `k(r1, r2)`
    RegistersAndOffset {
        offset: i64,
        base: VarId,
        index: VarId,
    },
    /// `k(r1, r2, s)`
    RegistersOffsetAndScale {
        offset: i64,
        base: VarId,
        index: VarId,
        scale: u8,
    },
    /// `sym(%rip)`
    RipRelative { target: VarId },
    /// `k + sym(%rip)`
    RipRelativeWithOffset { offset: i64, target: VarId },
    /// `(, r, s)`
    IndexAndScale { index: VarId, scale: u8 },
    /// `k(, r, s)`
    IndexOffsetAndScale {
        offset: i64,
        index: VarId,
        scale: u8,
    },
    /// `.JT<n>(, r, s)`
    JumpTable {
        table: JumpTableId,
        index: VarId,
        scale: u8,
    },
}

/// Outcome of lowering an abstract LEA form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoweredLea {
    /// A real address computation
    Address(AddressMode),
    /// The form degenerated to a plain register-to-register move
    RegisterMove { source: VarId },
}

fn check_scale(scale: u8) -> OllieResult<u8> {
    match scale {
        1 | 2 | 4 | 8 => Ok(scale),
        other => Err(OllieError::internal_error(format!(
            "address scale must be 1, 2, 4, or 8; found {}",
            other
        ))),
    }
}

fn displacement(ctx: &IrContext, offset: ConstId) -> OllieResult<i64> {
    ctx.constant(offset).integer_value().map_err(|_| {
        OllieError::internal_error(format!(
            "address displacement must be an integer constant, found {}",
            ctx.constant(offset).kind_name()
        ))
    })
}

/// Lower an abstract LEA form to a concrete addressing mode
pub fn lower_lea_form(ctx: &IrContext, form: &LeaForm) -> OllieResult<LoweredLea> {
    let lowered = match form {
        LeaForm::OffsetOnly { offset, base } => {
            let offset = displacement(ctx, *offset)?;
            if offset == 0 {
                return Ok(LoweredLea::RegisterMove { source: *base });
            }
            AddressMode::OffsetOnly {
                offset,
                base: *base,
            }
        }
        LeaForm::RegistersOnly { base, index } => AddressMode::RegistersOnly {
            base: *base,
            index: *index,
        },
        LeaForm::RegistersAndScale { base, index, scale } => {
            if check_scale(*scale)? == 1 {
                AddressMode::RegistersOnly {
                    base: *base,
                    index: *index,
                }
            } else {
                AddressMode::RegistersAndScale {
                    base: *base,
                    index: *index,
                    scale: *scale,
                }
            }
        }
        LeaForm::RegistersAndOffset {
            offset,
            base,
            index,
        } => AddressMode::RegistersAndOffset {
            offset: displacement(ctx, *offset)?,
            base: *base,
            index: *index,
        },
        LeaForm::RegistersOffsetAndScale {
            offset,
            base,
            index,
            scale,
        } => {
            let offset = displacement(ctx, *offset)?;
            if check_scale(*scale)? == 1 {
                AddressMode::RegistersAndOffset {
                    offset,
                    base: *base,
                    index: *index,
                }
            } else {
                AddressMode::RegistersOffsetAndScale {
                    offset,
                    base: *base,
                    index: *index,
                    scale: *scale,
                }
            }
        }
        LeaForm::RipRelative { target } => AddressMode::RipRelative { target: *target },
        LeaForm::RipRelativeWithOffset { offset, target } => AddressMode::RipRelativeWithOffset {
            offset: displacement(ctx, *offset)?,
            target: *target,
        },
        LeaForm::IndexAndScale { index, scale } => AddressMode::IndexAndScale {
            index: *index,
            scale: check_scale(*scale)?,
        },
        LeaForm::IndexOffsetAndScale {
            offset,
            index,
            scale,
        } => AddressMode::IndexOffsetAndScale {
            offset: displacement(ctx, *offset)?,
            index: *index,
            scale: check_scale(*scale)?,
        },
    };
    Ok(LoweredLea::Address(lowered))
}

impl AddressMode {
    /// A plain indirect access through one register: `(r)`
    pub fn indirect(base: VarId) -> AddressMode {
        AddressMode::OffsetOnly { offset: 0, base }
    }

    /// Variables this mode reads to form the address
    pub fn address_variables(&self) -> Vec<VarId> {
        match self {
            AddressMode::OffsetOnly { base, .. } => vec![*base],
            AddressMode::RegistersOnly { base, index }
            | AddressMode::RegistersAndScale { base, index, .. }
            | AddressMode::RegistersAndOffset { base, index, .. }
            | AddressMode::RegistersOffsetAndScale { base, index, .. } => vec![*base, *index],
            AddressMode::RipRelative { target }
            | AddressMode::RipRelativeWithOffset { target, .. } => vec![*target],
            AddressMode::IndexAndScale { index, .. }
            | AddressMode::IndexOffsetAndScale { index, .. }
            | AddressMode::JumpTable { index, .. } => vec![*index],
        }
    }
}
