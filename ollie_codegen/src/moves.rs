//! Move and conversion selection
//!
//! Maps (source width, destination width, signedness) onto the concrete
//! move family: plain moves at equal width, MOVS*/MOVZ* for widening,
//! and the CVT families across the integer/SSE boundary. Truncating
//! float-to-integer conversions always use the CVTT* forms.

use crate::opcode::Opcode;
use ollie_common::{OllieError, OllieResult};
use ollie_ir::{MemoryAccessType, VariableSize};

/// Outcome of move selection: most pairs need one instruction, but a
/// sub-double-word integer entering the SSE domain (or leaving it) widens
/// or truncates through a second opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSelection {
    One(Opcode),
    /// `first` runs before `second`, feeding it at double-word width
    Two { first: Opcode, second: Opcode },
}

use VariableSize::*;

fn widen_integer(source: VariableSize, destination: VariableSize, signed: bool) -> Opcode {
    match (source, destination, signed) {
        (Byte, Word, true) => Opcode::Movsbw,
        (Byte, DoubleWord, true) => Opcode::Movsbl,
        (Byte, QuadWord, true) => Opcode::Movsbq,
        (Word, DoubleWord, true) => Opcode::Movswl,
        (Word, QuadWord, true) => Opcode::Movswq,
        (DoubleWord, QuadWord, true) => Opcode::Movslq,
        (Byte, Word, false) => Opcode::Movzbw,
        (Byte, DoubleWord, false) => Opcode::Movzbl,
        (Byte, QuadWord, false) => Opcode::Movzbq,
        (Word, DoubleWord, false) => Opcode::Movzwl,
        (Word, QuadWord, false) => Opcode::Movzwq,
        // Writing a 32-bit register zero-extends; there is no MOVZLQ.
        (DoubleWord, QuadWord, false) => Opcode::Movl,
        _ => Opcode::mov(destination),
    }
}

/// Select the move or conversion chain for a value of `source` width moving
/// into a location of `destination` width. `signed` describes the source.
pub fn select_move(
    source: VariableSize,
    destination: VariableSize,
    signed: bool,
) -> OllieResult<MoveSelection> {
    let selection = match (
        source.is_floating_point(),
        destination.is_floating_point(),
    ) {
        // Integer to integer
        (false, false) => {
            if source.bytes() < destination.bytes() {
                MoveSelection::One(widen_integer(source, destination, signed))
            } else {
                // Equal width, or a narrowing move at destination width.
                MoveSelection::One(Opcode::mov(destination))
            }
        }
        // Floating point to floating point
        (true, true) => match (source, destination) {
            (SinglePrecision, DoublePrecision) => MoveSelection::One(Opcode::Cvtss2sd),
            (DoublePrecision, SinglePrecision) => MoveSelection::One(Opcode::Cvtsd2ss),
            _ => MoveSelection::One(Opcode::mov(destination)),
        },
        // Integer into the SSE domain
        (false, true) => {
            let convert = match (source, destination) {
                (QuadWord, SinglePrecision) => Opcode::Cvtsi2ssq,
                (QuadWord, DoublePrecision) => Opcode::Cvtsi2sdq,
                (_, SinglePrecision) => Opcode::Cvtsi2ssl,
                (_, DoublePrecision) => Opcode::Cvtsi2sdl,
                _ => {
                    return Err(OllieError::internal_error(
                        "integer-to-float conversion with a non-SSE destination",
                    ))
                }
            };
            match source {
                DoubleWord | QuadWord => MoveSelection::One(convert),
                // Sub-double-word sources widen to 32 bits first.
                Byte | Word => MoveSelection::Two {
                    first: widen_integer(source, DoubleWord, signed),
                    second: convert,
                },
                _ => {
                    return Err(OllieError::internal_error(
                        "float source classified as integer",
                    ))
                }
            }
        }
        // SSE into the integer domain; always the truncating forms
        (true, false) => {
            let convert = match (source, destination) {
                (SinglePrecision, QuadWord) => Opcode::Cvttss2siq,
                (SinglePrecision, _) => Opcode::Cvttss2sil,
                (DoublePrecision, QuadWord) => Opcode::Cvttsd2siq,
                (DoublePrecision, _) => Opcode::Cvttsd2sil,
                _ => {
                    return Err(OllieError::internal_error(
                        "integer source classified as float",
                    ))
                }
            };
            match destination {
                DoubleWord | QuadWord => MoveSelection::One(convert),
                // Narrow integer destinations truncate the 32-bit result.
                _ => MoveSelection::Two {
                    first: convert,
                    second: Opcode::mov(destination),
                },
            }
        }
    };
    Ok(selection)
}

/// The memory-access direction of a move given which side is a memory
/// operand. Two-memory moves do not exist on x86-64.
pub fn memory_direction(
    source_is_memory: bool,
    destination_is_memory: bool,
) -> OllieResult<MemoryAccessType> {
    match (source_is_memory, destination_is_memory) {
        (true, true) => Err(OllieError::internal_error(
            "memory-to-memory moves cannot be encoded",
        )),
        (true, false) => Ok(MemoryAccessType::Read),
        (false, true) => Ok(MemoryAccessType::Write),
        (false, false) => Ok(MemoryAccessType::None),
    }
}
