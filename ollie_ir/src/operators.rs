//! Source-level operators, branch polarity, and condition-code selection

use serde::{Deserialize, Serialize};
use std::fmt;

/// The original source-level operator token carried by binary operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Modulo,
    ShiftLeft,
    ShiftRight,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    GreaterThan,
    LessThan,
    GreaterThanOrEq,
    LessThanOrEq,
    Equals,
    NotEquals,
    LogicalAnd,
    LogicalOr,
    LogicalNot,
}

impl Operator {
    /// op ∈ { >, <, >=, <=, ==, != }
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            Operator::GreaterThan
                | Operator::LessThan
                | Operator::GreaterThanOrEq
                | Operator::LessThanOrEq
                | Operator::Equals
                | Operator::NotEquals
        )
    }

    /// Operators whose result is materialized as a 0/1 byte
    pub fn generates_truthful_byte(self) -> bool {
        self.is_relational() || matches!(self, Operator::LogicalAnd | Operator::LogicalOr)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Modulo => "%",
            Operator::ShiftLeft => "<<",
            Operator::ShiftRight => ">>",
            Operator::BitwiseAnd => "&",
            Operator::BitwiseOr => "|",
            Operator::BitwiseXor => "^",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterThanOrEq => ">=",
            Operator::LessThanOrEq => "<=",
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::LogicalAnd => "&&",
            Operator::LogicalOr => "||",
            Operator::LogicalNot => "!",
        };
        write!(f, "{}", text)
    }
}

/// Whether a branch takes the if-edge on the condition holding (Normal) or
/// failing (Inverse)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Normal,
    Inverse,
}

impl Polarity {
    pub fn inverted(self) -> Polarity {
        match self {
            Polarity::Normal => Polarity::Inverse,
            Polarity::Inverse => Polarity::Normal,
        }
    }
}

/// A concrete x86-64 condition code, shared by the branch, set, and
/// conditional-move families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionCode {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Above,
    AboveOrEqual,
    Below,
    BelowOrEqual,
    Zero,
    NotZero,
}

impl ConditionCode {
    /// The mnemonic fragment (`e`, `ne`, `g`, ...)
    pub fn mnemonic(self) -> &'static str {
        match self {
            ConditionCode::Equal => "e",
            ConditionCode::NotEqual => "ne",
            ConditionCode::Greater => "g",
            ConditionCode::GreaterOrEqual => "ge",
            ConditionCode::Less => "l",
            ConditionCode::LessOrEqual => "le",
            ConditionCode::Above => "a",
            ConditionCode::AboveOrEqual => "ae",
            ConditionCode::Below => "b",
            ConditionCode::BelowOrEqual => "be",
            ConditionCode::Zero => "z",
            ConditionCode::NotZero => "nz",
        }
    }

    /// The logically inverse condition under integer comparison semantics
    pub fn inverse(self) -> ConditionCode {
        match self {
            ConditionCode::Equal => ConditionCode::NotEqual,
            ConditionCode::NotEqual => ConditionCode::Equal,
            ConditionCode::Greater => ConditionCode::LessOrEqual,
            ConditionCode::GreaterOrEqual => ConditionCode::Less,
            ConditionCode::Less => ConditionCode::GreaterOrEqual,
            ConditionCode::LessOrEqual => ConditionCode::Greater,
            ConditionCode::Above => ConditionCode::BelowOrEqual,
            ConditionCode::AboveOrEqual => ConditionCode::Below,
            ConditionCode::Below => ConditionCode::AboveOrEqual,
            ConditionCode::BelowOrEqual => ConditionCode::Above,
            ConditionCode::Zero => ConditionCode::NotZero,
            ConditionCode::NotZero => ConditionCode::Zero,
        }
    }
}

impl fmt::Display for ConditionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Select the condition code for a conditional branch.
///
/// Relational operators follow the signedness-aware table; the logical-not
/// operator tests for zero; any other operator tests for not-zero. Inverse
/// polarity yields the logical inverse in every row.
pub fn select_branch(op: Operator, polarity: Polarity, is_signed: bool) -> ConditionCode {
    let normal = match op {
        Operator::GreaterThan if is_signed => ConditionCode::Greater,
        Operator::GreaterThan => ConditionCode::Above,
        Operator::LessThan if is_signed => ConditionCode::Less,
        Operator::LessThan => ConditionCode::Below,
        Operator::GreaterThanOrEq if is_signed => ConditionCode::GreaterOrEqual,
        Operator::GreaterThanOrEq => ConditionCode::AboveOrEqual,
        Operator::LessThanOrEq if is_signed => ConditionCode::LessOrEqual,
        Operator::LessThanOrEq => ConditionCode::BelowOrEqual,
        Operator::Equals => ConditionCode::Equal,
        Operator::NotEquals => ConditionCode::NotEqual,
        Operator::LogicalNot => ConditionCode::Zero,
        _ => ConditionCode::NotZero,
    };
    match polarity {
        Polarity::Normal => normal,
        Polarity::Inverse => normal.inverse(),
    }
}

/// Select the condition code for a conditional-set instruction; the table is
/// the branch table.
pub fn select_set(op: Operator, polarity: Polarity, is_signed: bool) -> ConditionCode {
    select_branch(op, polarity, is_signed)
}

/// Select the condition code for a conditional move; the table is the branch
/// table.
pub fn select_conditional_move(op: Operator, polarity: Polarity, is_signed: bool) -> ConditionCode {
    select_branch(op, polarity, is_signed)
}
