//! x86-64 instruction selection and assembly emission for the Ollie compiler
//!
//! Consumes the three-address OIR and produces AT&T-syntax x86-64:
//! - The concrete opcode taxonomy and instruction model
//! - Address-mode lowering from the abstract LEA forms
//! - Move/conversion selection across widths, signedness, and the SSE
//!   boundary
//! - The instruction selector, including division and constant-multiplier
//!   lowering
//! - The assembly printer and data-section emission

pub mod address;
pub mod instr;
pub mod moves;
pub mod opcode;
pub mod printer;
pub mod select;

pub use address::*;
pub use instr::*;
pub use moves::*;
pub use opcode::*;
pub use printer::*;
pub use select::*;
