//! Physical x86-64 register model
//!
//! Register names differ by operand size on the general-purpose file
//! (`%al/%ax/%eax/%rax`, `%r8b/%r8w/%r8d/%r8`); SSE register names are
//! identical across single and double precision.

use crate::types::VariableSize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A physical register, general-purpose or SSE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Register {
    Rax,
    Rcx,
    Rdx,
    Rbx,
    Rsi,
    Rdi,
    Rsp,
    Rbp,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
    /// High byte of AX; exists only at byte width
    Ah,
    /// High byte of BX; exists only at byte width
    Bh,
    /// High byte of CX; exists only at byte width
    Ch,
    /// High byte of DX; exists only at byte width
    Dh,
    Xmm0,
    Xmm1,
    Xmm2,
    Xmm3,
    Xmm4,
    Xmm5,
    Xmm6,
    Xmm7,
    Xmm8,
    Xmm9,
    Xmm10,
    Xmm11,
    Xmm12,
    Xmm13,
    Xmm14,
    Xmm15,
}

/// Integer parameter registers in System-V order
pub static INTEGER_PARAMETER_REGISTERS: [Register; 6] = [
    Register::Rdi,
    Register::Rsi,
    Register::Rdx,
    Register::Rcx,
    Register::R8,
    Register::R9,
];

/// SSE parameter registers in System-V order
pub static SSE_PARAMETER_REGISTERS: [Register; 8] = [
    Register::Xmm0,
    Register::Xmm1,
    Register::Xmm2,
    Register::Xmm3,
    Register::Xmm4,
    Register::Xmm5,
    Register::Xmm6,
    Register::Xmm7,
];

impl Register {
    pub fn is_sse(self) -> bool {
        self >= Register::Xmm0
    }

    /// The legacy high-byte registers have no wider sub-register
    pub fn is_high_byte(self) -> bool {
        matches!(
            self,
            Register::Ah | Register::Bh | Register::Ch | Register::Dh
        )
    }

    /// The percent-prefixed name of this register at the given operand size.
    ///
    /// General-purpose registers select the matching sub-register; SSE
    /// registers have one name, as do the high-byte registers. A
    /// floating-point size class on a general-purpose register falls back
    /// to the quad-word name.
    pub fn name(self, size: VariableSize) -> &'static str {
        use Register::*;
        if self.is_sse() || self.is_high_byte() {
            return self.quad_name();
        }
        let column = match size {
            VariableSize::Byte => 0,
            VariableSize::Word => 1,
            VariableSize::DoubleWord => 2,
            _ => 3,
        };
        let names: [&'static str; 4] = match self {
            Rax => ["%al", "%ax", "%eax", "%rax"],
            Rcx => ["%cl", "%cx", "%ecx", "%rcx"],
            Rdx => ["%dl", "%dx", "%edx", "%rdx"],
            Rbx => ["%bl", "%bx", "%ebx", "%rbx"],
            Rsi => ["%sil", "%si", "%esi", "%rsi"],
            Rdi => ["%dil", "%di", "%edi", "%rdi"],
            Rsp => ["%spl", "%sp", "%esp", "%rsp"],
            Rbp => ["%bpl", "%bp", "%ebp", "%rbp"],
            R8 => ["%r8b", "%r8w", "%r8d", "%r8"],
            R9 => ["%r9b", "%r9w", "%r9d", "%r9"],
            R10 => ["%r10b", "%r10w", "%r10d", "%r10"],
            R11 => ["%r11b", "%r11w", "%r11d", "%r11"],
            R12 => ["%r12b", "%r12w", "%r12d", "%r12"],
            R13 => ["%r13b", "%r13w", "%r13d", "%r13"],
            R14 => ["%r14b", "%r14w", "%r14d", "%r14"],
            R15 => ["%r15b", "%r15w", "%r15d", "%r15"],
            _ => unreachable!("SSE and high-byte registers handled above"),
        };
        names[column]
    }

    /// The full-width name (`%rax`, `%xmm3`); high-byte registers have
    /// only their byte name
    pub fn quad_name(self) -> &'static str {
        use Register::*;
        match self {
            Ah => "%ah",
            Bh => "%bh",
            Ch => "%ch",
            Dh => "%dh",
            Rax => "%rax",
            Rcx => "%rcx",
            Rdx => "%rdx",
            Rbx => "%rbx",
            Rsi => "%rsi",
            Rdi => "%rdi",
            Rsp => "%rsp",
            Rbp => "%rbp",
            R8 => "%r8",
            R9 => "%r9",
            R10 => "%r10",
            R11 => "%r11",
            R12 => "%r12",
            R13 => "%r13",
            R14 => "%r14",
            R15 => "%r15",
            Xmm0 => "%xmm0",
            Xmm1 => "%xmm1",
            Xmm2 => "%xmm2",
            Xmm3 => "%xmm3",
            Xmm4 => "%xmm4",
            Xmm5 => "%xmm5",
            Xmm6 => "%xmm6",
            Xmm7 => "%xmm7",
            Xmm8 => "%xmm8",
            Xmm9 => "%xmm9",
            Xmm10 => "%xmm10",
            Xmm11 => "%xmm11",
            Xmm12 => "%xmm12",
            Xmm13 => "%xmm13",
            Xmm14 => "%xmm14",
            Xmm15 => "%xmm15",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.quad_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_sub_register_names() {
        assert_eq!(Register::Rax.name(VariableSize::Byte), "%al");
        assert_eq!(Register::Rax.name(VariableSize::Word), "%ax");
        assert_eq!(Register::Rax.name(VariableSize::DoubleWord), "%eax");
        assert_eq!(Register::Rax.name(VariableSize::QuadWord), "%rax");
        assert_eq!(Register::Rsi.name(VariableSize::Byte), "%sil");
    }

    #[test]
    fn extended_sub_register_names() {
        assert_eq!(Register::R8.name(VariableSize::Byte), "%r8b");
        assert_eq!(Register::R8.name(VariableSize::Word), "%r8w");
        assert_eq!(Register::R8.name(VariableSize::DoubleWord), "%r8d");
        assert_eq!(Register::R8.name(VariableSize::QuadWord), "%r8");
    }

    #[test]
    fn sse_names_ignore_precision() {
        assert_eq!(Register::Xmm3.name(VariableSize::SinglePrecision), "%xmm3");
        assert_eq!(Register::Xmm3.name(VariableSize::DoublePrecision), "%xmm3");
    }

    #[test]
    fn high_byte_registers_name_only_their_byte_form() {
        assert_eq!(Register::Ah.name(VariableSize::Byte), "%ah");
        assert_eq!(Register::Ah.name(VariableSize::QuadWord), "%ah");
        assert_eq!(Register::Dh.name(VariableSize::Byte), "%dh");
        assert!(!Register::Ah.is_sse());
    }
}
