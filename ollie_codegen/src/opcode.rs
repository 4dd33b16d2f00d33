//! The concrete x86-64 opcode taxonomy
//!
//! Variants follow AT&T mnemonics with the operand-size suffix baked in.
//! SAL and SHL are architecturally identical on register destinations; both
//! variants exist so the selector can keep the signed/unsigned distinction
//! visible in its output.

use ollie_common::{OllieError, OllieResult};
use ollie_ir::{ConditionCode, VariableSize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A concrete x86-64 opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Opcode {
    // Plain moves
    Movb,
    Movw,
    Movl,
    Movq,
    Movss,
    Movsd,
    // Sign-extending moves
    Movsbw,
    Movsbl,
    Movsbq,
    Movswl,
    Movswq,
    Movslq,
    // Zero-extending moves
    Movzbw,
    Movzbl,
    Movzbq,
    Movzwl,
    Movzwq,
    // Integer ALU
    Addb,
    Addw,
    Addl,
    Addq,
    Subb,
    Subw,
    Subl,
    Subq,
    Imulb,
    Imulw,
    Imull,
    Imulq,
    Mulb,
    Mulw,
    Mull,
    Mulq,
    Andb,
    Andw,
    Andl,
    Andq,
    Orb,
    Orw,
    Orl,
    Orq,
    Xorb,
    Xorw,
    Xorl,
    Xorq,
    // Shifts and rotates
    Salb,
    Salw,
    Sall,
    Salq,
    Shlb,
    Shlw,
    Shll,
    Shlq,
    Sarb,
    Sarw,
    Sarl,
    Sarq,
    Shrb,
    Shrw,
    Shrl,
    Shrq,
    Rolb,
    Rolw,
    Roll,
    Rolq,
    Rorb,
    Rorw,
    Rorl,
    Rorq,
    // Division, reading the implicit dividend pair
    Idivb,
    Idivw,
    Idivl,
    Idivq,
    Divb,
    Divw,
    Divl,
    Divq,
    // Dividend sign-extension group
    Cbtw,
    Cwtl,
    Cltd,
    Cqto,
    // Address computation
    Leaw,
    Leal,
    Leaq,
    // SSE scalar arithmetic
    Addss,
    Addsd,
    Subss,
    Subsd,
    Mulss,
    Mulsd,
    Divss,
    Divsd,
    // SSE compares
    Ucomiss,
    Ucomisd,
    // SSE and integer conversions
    Cvtsi2ssl,
    Cvtsi2ssq,
    Cvtsi2sdl,
    Cvtsi2sdq,
    Cvttss2sil,
    Cvttss2siq,
    Cvttsd2sil,
    Cvttsd2siq,
    Cvtss2sd,
    Cvtsd2ss,
    // Compares and tests
    Cmpb,
    Cmpw,
    Cmpl,
    Cmpq,
    Testb,
    Testw,
    Testl,
    Testq,
    // Conditional moves
    Cmove,
    Cmovne,
    Cmovg,
    Cmovge,
    Cmovl,
    Cmovle,
    Cmova,
    Cmovae,
    Cmovb,
    Cmovbe,
    // Conditional sets
    Sete,
    Setne,
    Setg,
    Setge,
    Setl,
    Setle,
    Seta,
    Setae,
    Setb,
    Setbe,
    Setz,
    Setnz,
    // Jumps
    Jmp,
    Je,
    Jne,
    Jg,
    Jge,
    Jl,
    Jle,
    Ja,
    Jae,
    Jb,
    Jbe,
    Jz,
    Jnz,
    // Unary read-modify-write
    Negb,
    Negw,
    Negl,
    Negq,
    Notb,
    Notw,
    Notl,
    Notq,
    Incb,
    Incw,
    Incl,
    Incq,
    Decb,
    Decw,
    Decl,
    Decq,
    // Stack
    Pushq,
    Popq,
    /// Push of a physical general-purpose register, bypassing live ranges
    PushDirectGp,
    PopDirectGp,
    /// Push of a physical SSE register; emitted as a stack adjust plus move
    PushDirectSse,
    PopDirectSse,
    // Flow
    Nop,
    Call,
    IndirectCall,
    Ret,
}

impl Opcode {
    /// The AT&T mnemonic text
    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            Movb => "movb",
            Movw => "movw",
            Movl => "movl",
            Movq => "movq",
            Movss => "movss",
            Movsd => "movsd",
            Movsbw => "movsbw",
            Movsbl => "movsbl",
            Movsbq => "movsbq",
            Movswl => "movswl",
            Movswq => "movswq",
            Movslq => "movslq",
            Movzbw => "movzbw",
            Movzbl => "movzbl",
            Movzbq => "movzbq",
            Movzwl => "movzwl",
            Movzwq => "movzwq",
            Addb => "addb",
            Addw => "addw",
            Addl => "addl",
            Addq => "addq",
            Subb => "subb",
            Subw => "subw",
            Subl => "subl",
            Subq => "subq",
            Imulb => "imulb",
            Imulw => "imulw",
            Imull => "imull",
            Imulq => "imulq",
            Mulb => "mulb",
            Mulw => "mulw",
            Mull => "mull",
            Mulq => "mulq",
            Andb => "andb",
            Andw => "andw",
            Andl => "andl",
            Andq => "andq",
            Orb => "orb",
            Orw => "orw",
            Orl => "orl",
            Orq => "orq",
            Xorb => "xorb",
            Xorw => "xorw",
            Xorl => "xorl",
            Xorq => "xorq",
            Salb => "salb",
            Salw => "salw",
            Sall => "sall",
            Salq => "salq",
            Shlb => "shlb",
            Shlw => "shlw",
            Shll => "shll",
            Shlq => "shlq",
            Sarb => "sarb",
            Sarw => "sarw",
            Sarl => "sarl",
            Sarq => "sarq",
            Shrb => "shrb",
            Shrw => "shrw",
            Shrl => "shrl",
            Shrq => "shrq",
            Rolb => "rolb",
            Rolw => "rolw",
            Roll => "roll",
            Rolq => "rolq",
            Rorb => "rorb",
            Rorw => "rorw",
            Rorl => "rorl",
            Rorq => "rorq",
            Idivb => "idivb",
            Idivw => "idivw",
            Idivl => "idivl",
            Idivq => "idivq",
            Divb => "divb",
            Divw => "divw",
            Divl => "divl",
            Divq => "divq",
            Cbtw => "cbtw",
            Cwtl => "cwtl",
            Cltd => "cltd",
            Cqto => "cqto",
            Leaw => "leaw",
            Leal => "leal",
            Leaq => "leaq",
            Addss => "addss",
            Addsd => "addsd",
            Subss => "subss",
            Subsd => "subsd",
            Mulss => "mulss",
            Mulsd => "mulsd",
            Divss => "divss",
            Divsd => "divsd",
            Ucomiss => "ucomiss",
            Ucomisd => "ucomisd",
            Cvtsi2ssl => "cvtsi2ssl",
            Cvtsi2ssq => "cvtsi2ssq",
            Cvtsi2sdl => "cvtsi2sdl",
            Cvtsi2sdq => "cvtsi2sdq",
            Cvttss2sil => "cvttss2sil",
            Cvttss2siq => "cvttss2siq",
            Cvttsd2sil => "cvttsd2sil",
            Cvttsd2siq => "cvttsd2siq",
            Cvtss2sd => "cvtss2sd",
            Cvtsd2ss => "cvtsd2ss",
            Cmpb => "cmpb",
            Cmpw => "cmpw",
            Cmpl => "cmpl",
            Cmpq => "cmpq",
            Testb => "testb",
            Testw => "testw",
            Testl => "testl",
            Testq => "testq",
            Cmove => "cmove",
            Cmovne => "cmovne",
            Cmovg => "cmovg",
            Cmovge => "cmovge",
            Cmovl => "cmovl",
            Cmovle => "cmovle",
            Cmova => "cmova",
            Cmovae => "cmovae",
            Cmovb => "cmovb",
            Cmovbe => "cmovbe",
            Sete => "sete",
            Setne => "setne",
            Setg => "setg",
            Setge => "setge",
            Setl => "setl",
            Setle => "setle",
            Seta => "seta",
            Setae => "setae",
            Setb => "setb",
            Setbe => "setbe",
            Setz => "setz",
            Setnz => "setnz",
            Jmp => "jmp",
            Je => "je",
            Jne => "jne",
            Jg => "jg",
            Jge => "jge",
            Jl => "jl",
            Jle => "jle",
            Ja => "ja",
            Jae => "jae",
            Jb => "jb",
            Jbe => "jbe",
            Jz => "jz",
            Jnz => "jnz",
            Negb => "negb",
            Negw => "negw",
            Negl => "negl",
            Negq => "negq",
            Notb => "notb",
            Notw => "notw",
            Notl => "notl",
            Notq => "notq",
            Incb => "incb",
            Incw => "incw",
            Incl => "incl",
            Incq => "incq",
            Decb => "decb",
            Decw => "decw",
            Decl => "decl",
            Decq => "decq",
            Pushq | PushDirectGp | PushDirectSse => "pushq",
            Popq | PopDirectGp | PopDirectSse => "popq",
            Nop => "nop",
            Call => "call",
            IndirectCall => "call",
            Ret => "ret",
        }
    }

    /// Plain move family plus the extending moves
    pub fn is_move_family(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            Movb | Movw
                | Movl
                | Movq
                | Movss
                | Movsd
                | Movsbw
                | Movsbl
                | Movsbq
                | Movswl
                | Movswq
                | Movslq
                | Movzbw
                | Movzbl
                | Movzbq
                | Movzwl
                | Movzwq
        )
    }

    /// Same-width moves without extension or conversion
    pub fn is_plain_move(self) -> bool {
        use Opcode::*;
        matches!(self, Movb | Movw | Movl | Movq | Movss | Movsd)
    }

    /// The ALU family whose destination is both read and written
    pub fn is_destination_also_operand(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            Addb | Addw
                | Addl
                | Addq
                | Subb
                | Subw
                | Subl
                | Subq
                | Imulb
                | Imulw
                | Imull
                | Imulq
                | Andb
                | Andw
                | Andl
                | Andq
                | Orb
                | Orw
                | Orl
                | Orq
                | Xorb
                | Xorw
                | Xorl
                | Xorq
                | Salb
                | Salw
                | Sall
                | Salq
                | Shlb
                | Shlw
                | Shll
                | Shlq
                | Sarb
                | Sarw
                | Sarl
                | Sarq
                | Shrb
                | Shrw
                | Shrl
                | Shrq
                | Rolb
                | Rolw
                | Roll
                | Rolq
                | Rorb
                | Rorw
                | Rorl
                | Rorq
                | Addss
                | Addsd
                | Subss
                | Subsd
                | Mulss
                | Mulsd
                | Divss
                | Divsd
        )
    }

    /// MULB/W/L/Q, the wide implicit-pair form; IMUL is not in this set
    pub fn is_unsigned_multiplication(self) -> bool {
        matches!(
            self,
            Opcode::Mulb | Opcode::Mulw | Opcode::Mull | Opcode::Mulq
        )
    }

    // ---- width-parameterized constructors --------------------------------

    pub fn mov(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Movb,
            VariableSize::Word => Opcode::Movw,
            VariableSize::DoubleWord => Opcode::Movl,
            VariableSize::QuadWord => Opcode::Movq,
            VariableSize::SinglePrecision => Opcode::Movss,
            VariableSize::DoublePrecision => Opcode::Movsd,
        }
    }

    pub fn add(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Addb,
            VariableSize::Word => Opcode::Addw,
            VariableSize::DoubleWord => Opcode::Addl,
            VariableSize::SinglePrecision => Opcode::Addss,
            VariableSize::DoublePrecision => Opcode::Addsd,
            VariableSize::QuadWord => Opcode::Addq,
        }
    }

    pub fn sub(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Subb,
            VariableSize::Word => Opcode::Subw,
            VariableSize::DoubleWord => Opcode::Subl,
            VariableSize::SinglePrecision => Opcode::Subss,
            VariableSize::DoublePrecision => Opcode::Subsd,
            VariableSize::QuadWord => Opcode::Subq,
        }
    }

    /// Two-operand signed multiply; the byte form falls back to the
    /// single-operand encoding
    pub fn imul(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Imulb,
            VariableSize::Word => Opcode::Imulw,
            VariableSize::SinglePrecision => Opcode::Mulss,
            VariableSize::DoublePrecision => Opcode::Mulsd,
            VariableSize::QuadWord => Opcode::Imulq,
            VariableSize::DoubleWord => Opcode::Imull,
        }
    }

    pub fn mul_wide(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Mulb,
            VariableSize::Word => Opcode::Mulw,
            VariableSize::QuadWord => Opcode::Mulq,
            _ => Opcode::Mull,
        }
    }

    pub fn and(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Andb,
            VariableSize::Word => Opcode::Andw,
            VariableSize::QuadWord => Opcode::Andq,
            _ => Opcode::Andl,
        }
    }

    pub fn or(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Orb,
            VariableSize::Word => Opcode::Orw,
            VariableSize::QuadWord => Opcode::Orq,
            _ => Opcode::Orl,
        }
    }

    pub fn xor(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Xorb,
            VariableSize::Word => Opcode::Xorw,
            VariableSize::QuadWord => Opcode::Xorq,
            _ => Opcode::Xorl,
        }
    }

    /// Arithmetic left shift; identical encoding to [`Opcode::shl`]
    pub fn sal(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Salb,
            VariableSize::Word => Opcode::Salw,
            VariableSize::QuadWord => Opcode::Salq,
            _ => Opcode::Sall,
        }
    }

    pub fn shl(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Shlb,
            VariableSize::Word => Opcode::Shlw,
            VariableSize::QuadWord => Opcode::Shlq,
            _ => Opcode::Shll,
        }
    }

    pub fn sar(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Sarb,
            VariableSize::Word => Opcode::Sarw,
            VariableSize::QuadWord => Opcode::Sarq,
            _ => Opcode::Sarl,
        }
    }

    pub fn shr(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Shrb,
            VariableSize::Word => Opcode::Shrw,
            VariableSize::QuadWord => Opcode::Shrq,
            _ => Opcode::Shrl,
        }
    }

    pub fn idiv(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Idivb,
            VariableSize::Word => Opcode::Idivw,
            VariableSize::QuadWord => Opcode::Idivq,
            _ => Opcode::Idivl,
        }
    }

    pub fn div(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Divb,
            VariableSize::Word => Opcode::Divw,
            VariableSize::QuadWord => Opcode::Divq,
            _ => Opcode::Divl,
        }
    }

    /// The dividend sign-extension instruction preceding a signed divide
    pub fn sign_extension(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Cbtw,
            VariableSize::Word => Opcode::Cwtl,
            VariableSize::QuadWord => Opcode::Cqto,
            _ => Opcode::Cltd,
        }
    }

    /// LEA exists at word, double-word, and quad-word widths
    pub fn lea(size: VariableSize) -> OllieResult<Opcode> {
        match size {
            VariableSize::Word => Ok(Opcode::Leaw),
            VariableSize::DoubleWord => Ok(Opcode::Leal),
            VariableSize::QuadWord => Ok(Opcode::Leaq),
            other => Err(OllieError::internal_error(format!(
                "no LEA form at {} width",
                other
            ))),
        }
    }

    pub fn cmp(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Cmpb,
            VariableSize::Word => Opcode::Cmpw,
            VariableSize::QuadWord => Opcode::Cmpq,
            VariableSize::SinglePrecision => Opcode::Ucomiss,
            VariableSize::DoublePrecision => Opcode::Ucomisd,
            VariableSize::DoubleWord => Opcode::Cmpl,
        }
    }

    pub fn test(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Testb,
            VariableSize::Word => Opcode::Testw,
            VariableSize::QuadWord => Opcode::Testq,
            _ => Opcode::Testl,
        }
    }

    pub fn neg(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Negb,
            VariableSize::Word => Opcode::Negw,
            VariableSize::QuadWord => Opcode::Negq,
            _ => Opcode::Negl,
        }
    }

    pub fn not(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Notb,
            VariableSize::Word => Opcode::Notw,
            VariableSize::QuadWord => Opcode::Notq,
            _ => Opcode::Notl,
        }
    }

    pub fn inc(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Incb,
            VariableSize::Word => Opcode::Incw,
            VariableSize::QuadWord => Opcode::Incq,
            _ => Opcode::Incl,
        }
    }

    pub fn dec(size: VariableSize) -> Opcode {
        match size {
            VariableSize::Byte => Opcode::Decb,
            VariableSize::Word => Opcode::Decw,
            VariableSize::QuadWord => Opcode::Decq,
            _ => Opcode::Decl,
        }
    }

    // ---- condition-code families -----------------------------------------

    /// The conditional-jump opcode for a condition code
    pub fn jcc(code: ConditionCode) -> Opcode {
        match code {
            ConditionCode::Equal => Opcode::Je,
            ConditionCode::NotEqual => Opcode::Jne,
            ConditionCode::Greater => Opcode::Jg,
            ConditionCode::GreaterOrEqual => Opcode::Jge,
            ConditionCode::Less => Opcode::Jl,
            ConditionCode::LessOrEqual => Opcode::Jle,
            ConditionCode::Above => Opcode::Ja,
            ConditionCode::AboveOrEqual => Opcode::Jae,
            ConditionCode::Below => Opcode::Jb,
            ConditionCode::BelowOrEqual => Opcode::Jbe,
            ConditionCode::Zero => Opcode::Jz,
            ConditionCode::NotZero => Opcode::Jnz,
        }
    }

    /// The conditional-set opcode for a condition code
    pub fn setcc(code: ConditionCode) -> Opcode {
        match code {
            ConditionCode::Equal => Opcode::Sete,
            ConditionCode::NotEqual => Opcode::Setne,
            ConditionCode::Greater => Opcode::Setg,
            ConditionCode::GreaterOrEqual => Opcode::Setge,
            ConditionCode::Less => Opcode::Setl,
            ConditionCode::LessOrEqual => Opcode::Setle,
            ConditionCode::Above => Opcode::Seta,
            ConditionCode::AboveOrEqual => Opcode::Setae,
            ConditionCode::Below => Opcode::Setb,
            ConditionCode::BelowOrEqual => Opcode::Setbe,
            ConditionCode::Zero => Opcode::Setz,
            ConditionCode::NotZero => Opcode::Setnz,
        }
    }

    /// The conditional-move opcode for a condition code. The zero conditions
    /// alias the equality encodings.
    pub fn cmovcc(code: ConditionCode) -> Opcode {
        match code {
            ConditionCode::Equal | ConditionCode::Zero => Opcode::Cmove,
            ConditionCode::NotEqual | ConditionCode::NotZero => Opcode::Cmovne,
            ConditionCode::Greater => Opcode::Cmovg,
            ConditionCode::GreaterOrEqual => Opcode::Cmovge,
            ConditionCode::Less => Opcode::Cmovl,
            ConditionCode::LessOrEqual => Opcode::Cmovle,
            ConditionCode::Above => Opcode::Cmova,
            ConditionCode::AboveOrEqual => Opcode::Cmovae,
            ConditionCode::Below => Opcode::Cmovb,
            ConditionCode::BelowOrEqual => Opcode::Cmovbe,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}
