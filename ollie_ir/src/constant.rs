//! The three-address constant and its folding arithmetic
//!
//! Folding is width- and signedness-correct: the result takes operand 1's
//! kind, the arithmetic wraps at operand 1's width, and operand 2 contributes
//! only its numeric interpretation. Folds return a fresh value; the caller
//! interns it into the arena.

use crate::variable::VarId;
use ollie_common::{OllieError, OllieResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a constant in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstId(pub u32);

impl ConstId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A typed literal value; the variant is the constant-kind tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstantValue {
    Byte(i8),
    UByte(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Float(f32),
    Double(f64),
    Char(u8),
    String(String),
    /// Reference to a local-constant variable, used in global initializers
    RelativeAddress(VarId),
}

impl ConstantValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConstantValue::Byte(_) => "byte",
            ConstantValue::UByte(_) => "ubyte",
            ConstantValue::Short(_) => "short",
            ConstantValue::UShort(_) => "ushort",
            ConstantValue::Int(_) => "int",
            ConstantValue::UInt(_) => "uint",
            ConstantValue::Long(_) => "long",
            ConstantValue::ULong(_) => "ulong",
            ConstantValue::Float(_) => "float",
            ConstantValue::Double(_) => "double",
            ConstantValue::Char(_) => "char",
            ConstantValue::String(_) => "string",
            ConstantValue::RelativeAddress(_) => "relative address",
        }
    }

    pub fn is_integer_kind(&self) -> bool {
        matches!(
            self,
            ConstantValue::Byte(_)
                | ConstantValue::UByte(_)
                | ConstantValue::Short(_)
                | ConstantValue::UShort(_)
                | ConstantValue::Int(_)
                | ConstantValue::UInt(_)
                | ConstantValue::Long(_)
                | ConstantValue::ULong(_)
                | ConstantValue::Char(_)
        )
    }

    pub fn is_signed_kind(&self) -> bool {
        matches!(
            self,
            ConstantValue::Byte(_)
                | ConstantValue::Short(_)
                | ConstantValue::Int(_)
                | ConstantValue::Long(_)
        )
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, ConstantValue::Float(_) | ConstantValue::Double(_))
    }

    /// Numeric interpretation of an integer-kind constant: sign-extended for
    /// signed kinds, zero-extended for unsigned kinds.
    pub fn integer_value(&self) -> OllieResult<i64> {
        match self {
            ConstantValue::Byte(v) => Ok(*v as i64),
            ConstantValue::UByte(v) => Ok(*v as i64),
            ConstantValue::Short(v) => Ok(*v as i64),
            ConstantValue::UShort(v) => Ok(*v as i64),
            ConstantValue::Int(v) => Ok(*v as i64),
            ConstantValue::UInt(v) => Ok(*v as i64),
            ConstantValue::Long(v) => Ok(*v),
            ConstantValue::ULong(v) => Ok(*v as i64),
            ConstantValue::Char(v) => Ok(*v as i64),
            other => Err(OllieError::internal_error(format!(
                "no integer interpretation for a {} constant",
                other.kind_name()
            ))),
        }
    }

    fn is_truthy(&self) -> OllieResult<bool> {
        Ok(self.integer_value()? != 0)
    }

    /// Width-agnostic equality with zero
    pub fn is_zero(&self) -> bool {
        match self {
            ConstantValue::Float(v) => *v == 0.0,
            ConstantValue::Double(v) => *v == 0.0,
            other => other.integer_value().map(|v| v == 0).unwrap_or(false),
        }
    }

    /// Width-agnostic equality with one
    pub fn is_one(&self) -> bool {
        match self {
            ConstantValue::Float(v) => *v == 1.0,
            ConstantValue::Double(v) => *v == 1.0,
            other => other.integer_value().map(|v| v == 1).unwrap_or(false),
        }
    }

    /// True for integer-kind constants with exactly one bit set; signed kinds
    /// must also be strictly positive.
    pub fn is_power_of_2(&self) -> bool {
        if !self.is_integer_kind() {
            return false;
        }
        match self.integer_value() {
            Ok(v) if self.is_signed_kind() => v > 0 && (v & (v - 1)) == 0,
            Ok(v) => {
                // Unsigned kinds: test the bit pattern, which for ULong may
                // read as negative through the i64 view.
                let bits = v as u64;
                bits != 0 && (bits & (bits - 1)) == 0
            }
            Err(_) => false,
        }
    }

    /// True when the value can serve as an x86-64 address scale
    pub fn is_lea_compatible_power_of_2(&self) -> bool {
        self.is_integer_kind()
            && matches!(self.integer_value(), Ok(1) | Ok(2) | Ok(4) | Ok(8))
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Byte(v) => write!(f, "{}", v),
            ConstantValue::UByte(v) => write!(f, "{}", v),
            ConstantValue::Short(v) => write!(f, "{}", v),
            ConstantValue::UShort(v) => write!(f, "{}", v),
            ConstantValue::Int(v) => write!(f, "{}", v),
            ConstantValue::UInt(v) => write!(f, "{}", v),
            ConstantValue::Long(v) => write!(f, "{}", v),
            ConstantValue::ULong(v) => write!(f, "{}", v),
            ConstantValue::Float(v) => write!(f, "{}", v),
            ConstantValue::Double(v) => write!(f, "{}", v),
            ConstantValue::Char(v) => write!(f, "{}", v),
            ConstantValue::String(v) => write!(f, "{:?}", v),
            ConstantValue::RelativeAddress(var) => write!(f, "reladdr(v{})", var.0),
        }
    }
}

#[derive(Clone, Copy)]
enum FoldOp {
    Add,
    Sub,
    Mul,
}

/// Perform one wrapping arithmetic fold at operand 1's kind and width.
///
/// Defined for every pair of integer-kind operands; any other kind is a
/// structural error, since floating-point literals reach the backend through
/// the local-constant pool instead.
fn fold(op: FoldOp, lhs: &ConstantValue, rhs: &ConstantValue) -> OllieResult<ConstantValue> {
    let b = rhs.integer_value()?;

    macro_rules! arm {
        ($variant:ident, $ty:ty, $a:expr) => {{
            let a: $ty = *$a;
            let b = b as $ty;
            let value = match op {
                FoldOp::Add => a.wrapping_add(b),
                FoldOp::Sub => a.wrapping_sub(b),
                FoldOp::Mul => a.wrapping_mul(b),
            };
            ConstantValue::$variant(value)
        }};
    }

    Ok(match lhs {
        ConstantValue::Byte(a) => arm!(Byte, i8, a),
        ConstantValue::UByte(a) => arm!(UByte, u8, a),
        ConstantValue::Short(a) => arm!(Short, i16, a),
        ConstantValue::UShort(a) => arm!(UShort, u16, a),
        ConstantValue::Int(a) => arm!(Int, i32, a),
        ConstantValue::UInt(a) => arm!(UInt, u32, a),
        ConstantValue::Long(a) => arm!(Long, i64, a),
        ConstantValue::ULong(a) => arm!(ULong, u64, a),
        ConstantValue::Char(a) => arm!(Char, u8, a),
        other => {
            return Err(OllieError::internal_error(format!(
                "cannot fold arithmetic on a {} constant",
                other.kind_name()
            )))
        }
    })
}

/// `lhs + rhs` at operand 1's kind
pub fn fold_add(lhs: &ConstantValue, rhs: &ConstantValue) -> OllieResult<ConstantValue> {
    fold(FoldOp::Add, lhs, rhs)
}

/// `lhs - rhs` at operand 1's kind
pub fn fold_sub(lhs: &ConstantValue, rhs: &ConstantValue) -> OllieResult<ConstantValue> {
    fold(FoldOp::Sub, lhs, rhs)
}

/// `lhs * rhs` at operand 1's kind
pub fn fold_mul(lhs: &ConstantValue, rhs: &ConstantValue) -> OllieResult<ConstantValue> {
    fold(FoldOp::Mul, lhs, rhs)
}

/// Logical OR on literal truthiness, short-circuiting on operand 1.
/// The result is always a ULong holding 0 or 1.
pub fn fold_logical_or(lhs: &ConstantValue, rhs: &ConstantValue) -> OllieResult<ConstantValue> {
    if lhs.is_truthy()? {
        return Ok(ConstantValue::ULong(1));
    }
    Ok(ConstantValue::ULong(rhs.is_truthy()? as u64))
}

/// Logical AND on literal truthiness, short-circuiting on operand 1.
/// The result is always a ULong holding 0 or 1.
pub fn fold_logical_and(lhs: &ConstantValue, rhs: &ConstantValue) -> OllieResult<ConstantValue> {
    if !lhs.is_truthy()? {
        return Ok(ConstantValue::ULong(0));
    }
    Ok(ConstantValue::ULong(rhs.is_truthy()? as u64))
}

/// Add a raw signed value during address simplification. The result is
/// promoted to a signed Long regardless of operand 1's prior kind.
pub fn fold_add_raw(lhs: &ConstantValue, value: i64) -> OllieResult<ConstantValue> {
    Ok(ConstantValue::Long(lhs.integer_value()?.wrapping_add(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_uses_operand_one_kind_and_width() {
        let a = ConstantValue::Int(i32::MAX);
        let b = ConstantValue::Long(1);
        assert_eq!(fold_add(&a, &b).unwrap(), ConstantValue::Int(i32::MIN));

        let a = ConstantValue::UByte(250);
        let b = ConstantValue::Int(10);
        assert_eq!(fold_add(&a, &b).unwrap(), ConstantValue::UByte(4));
    }

    #[test]
    fn fold_reads_unsigned_operand_two_without_sign_extension() {
        let a = ConstantValue::Long(0);
        let b = ConstantValue::UInt(u32::MAX);
        assert_eq!(
            fold_add(&a, &b).unwrap(),
            ConstantValue::Long(u32::MAX as i64)
        );
    }

    #[test]
    fn fold_rejects_non_integer_kinds() {
        let a = ConstantValue::Float(1.0);
        let b = ConstantValue::Int(2);
        assert!(fold_add(&a, &b).is_err());
        assert!(fold_mul(&b, &ConstantValue::String("x".into())).is_err());
    }

    #[test]
    fn raw_fold_promotes_to_long() {
        let a = ConstantValue::UShort(7);
        assert_eq!(fold_add_raw(&a, -10).unwrap(), ConstantValue::Long(-3));
    }

    #[test]
    fn signed_power_of_two_is_strictly_positive() {
        assert!(ConstantValue::Int(8).is_power_of_2());
        assert!(!ConstantValue::Int(0).is_power_of_2());
        assert!(!ConstantValue::Int(-8).is_power_of_2());
        assert!(!ConstantValue::Byte(i8::MIN).is_power_of_2());
        assert!(ConstantValue::ULong(1 << 63).is_power_of_2());
    }

    #[test]
    fn lea_compatible_powers() {
        for v in [1i32, 2, 4, 8] {
            assert!(ConstantValue::Int(v).is_lea_compatible_power_of_2());
        }
        assert!(!ConstantValue::Int(16).is_lea_compatible_power_of_2());
        assert!(!ConstantValue::Int(3).is_lea_compatible_power_of_2());
    }
}
