//! Fixed-width wraparound arithmetic over arbitrary-precision integers.
//! Ported from `fixed_width_ops` (reference implementation): every
//! representative is a non-negative value in `[0, 2ⁿ)`; signed operations
//! reinterpret the high bit as two's complement before computing, then
//! re-encode.

use num::bigint::BigInt;
use num::{One, Signed, Zero};

use crate::error::DomainError;

fn validate_bits(bits: u32) -> Result<(), DomainError> {
    if bits < 1 {
        return Err(DomainError::InvalidBitWidth { bits: bits as i64 });
    }
    Ok(())
}

fn mask(bits: u32) -> BigInt {
    (BigInt::one() << bits as usize) - BigInt::one()
}

fn to_signed(value: &BigInt, bits: u32) -> BigInt {
    let sign_bit = BigInt::one() << (bits as usize - 1);
    if (value & &sign_bit).is_zero() {
        value.clone()
    } else {
        value - (&sign_bit << 1)
    }
}

fn to_unsigned(value: &BigInt, bits: u32) -> BigInt {
    if !value.is_negative() {
        value.clone()
    } else {
        value + (BigInt::one() << bits as usize)
    }
}

macro_rules! wrap_binop {
    ($name:ident, $op:tt) => {
        pub fn $name(a: &BigInt, b: &BigInt, bits: u32) -> Result<BigInt, DomainError> {
            validate_bits(bits)?;
            Ok((a $op b) & mask(bits))
        }
    };
}

wrap_binop!(add, +);
wrap_binop!(sub, -);
wrap_binop!(mul, *);

pub fn udiv(a: &BigInt, b: &BigInt, bits: u32) -> Result<BigInt, DomainError> {
    validate_bits(bits)?;
    if b.is_zero() {
        return Err(DomainError::DivisionByZero {
            op: "udiv".into(),
            bits,
        });
    }
    Ok((a / b) & mask(bits))
}

pub fn urem(a: &BigInt, b: &BigInt, bits: u32) -> Result<BigInt, DomainError> {
    validate_bits(bits)?;
    if b.is_zero() {
        return Err(DomainError::DivisionByZero {
            op: "urem".into(),
            bits,
        });
    }
    Ok((a % b) & mask(bits))
}

pub fn sdiv(a: &BigInt, b: &BigInt, bits: u32) -> Result<BigInt, DomainError> {
    validate_bits(bits)?;
    let sb = to_signed(b, bits);
    if sb.is_zero() {
        return Err(DomainError::DivisionByZero {
            op: "sdiv".into(),
            bits,
        });
    }
    let sa = to_signed(a, bits);
    Ok(to_unsigned(&(sa / sb), bits))
}

pub fn srem(a: &BigInt, b: &BigInt, bits: u32) -> Result<BigInt, DomainError> {
    validate_bits(bits)?;
    let sb = to_signed(b, bits);
    if sb.is_zero() {
        return Err(DomainError::DivisionByZero {
            op: "srem".into(),
            bits,
        });
    }
    let sa = to_signed(a, bits);
    Ok(to_unsigned(&(sa % sb), bits))
}

pub fn and(a: &BigInt, b: &BigInt, bits: u32) -> Result<BigInt, DomainError> {
    validate_bits(bits)?;
    Ok((a & b) & mask(bits))
}

pub fn or(a: &BigInt, b: &BigInt, bits: u32) -> Result<BigInt, DomainError> {
    validate_bits(bits)?;
    Ok((a | b) & mask(bits))
}

pub fn xor(a: &BigInt, b: &BigInt, bits: u32) -> Result<BigInt, DomainError> {
    validate_bits(bits)?;
    Ok((a ^ b) & mask(bits))
}

fn shift_amount(b: &BigInt) -> Option<u32> {
    if b.is_negative() {
        return None;
    }
    b.to_biguint().and_then(|u| {
        use num::ToPrimitive;
        u.to_u32()
    })
}

pub fn shl(a: &BigInt, b: &BigInt, bits: u32) -> Result<BigInt, DomainError> {
    validate_bits(bits)?;
    match shift_amount(b) {
        Some(s) if s < bits => Ok((a << s as usize) & mask(bits)),
        _ => Ok(BigInt::zero()),
    }
}

pub fn lshr(a: &BigInt, b: &BigInt, bits: u32) -> Result<BigInt, DomainError> {
    validate_bits(bits)?;
    match shift_amount(b) {
        Some(s) if s < bits => Ok(a >> s as usize),
        _ => Ok(BigInt::zero()),
    }
}

pub fn ashr(a: &BigInt, b: &BigInt, bits: u32) -> Result<BigInt, DomainError> {
    validate_bits(bits)?;
    let sign_set = !(a & (BigInt::one() << (bits as usize - 1))).is_zero();
    match shift_amount(b) {
        Some(s) if s < bits => {
            let sa = to_signed(a, bits);
            Ok(to_unsigned(&(sa >> s as usize), bits))
        }
        _ => {
            let all_ones = if sign_set {
                to_unsigned(&BigInt::from(-1), bits)
            } else {
                BigInt::zero()
            };
            Ok(all_ones)
        }
    }
}

pub fn eq(a: &BigInt, b: &BigInt, _bits: u32) -> bool {
    a == b
}

pub fn ne(a: &BigInt, b: &BigInt, _bits: u32) -> bool {
    a != b
}

pub fn ult(a: &BigInt, b: &BigInt, _bits: u32) -> bool {
    a < b
}

pub fn ule(a: &BigInt, b: &BigInt, _bits: u32) -> bool {
    a <= b
}

pub fn slt(a: &BigInt, b: &BigInt, bits: u32) -> bool {
    to_signed(a, bits) < to_signed(b, bits)
}

pub fn sle(a: &BigInt, b: &BigInt, bits: u32) -> bool {
    to_signed(a, bits) <= to_signed(b, bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn i(n: i64) -> BigInt {
        BigInt::from(n)
    }

    #[test]
    fn add_wraps_modulo_2n() {
        assert_eq!(add(&i(250), &i(10), 8).unwrap(), i(4));
    }

    #[test]
    fn sdiv_uses_signed_interpretation() {
        // -16 as an 8-bit representative is 240.
        let neg16 = i(240);
        let two = i(2);
        let result = sdiv(&neg16, &two, 8).unwrap();
        // -8 as an 8-bit representative is 248.
        assert_eq!(result, i(248));
    }

    #[test]
    fn udiv_by_zero_is_domain_error() {
        assert!(matches!(
            udiv(&i(5), &i(0), 8),
            Err(DomainError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn shl_out_of_range_yields_zero() {
        assert_eq!(shl(&i(1), &i(40), 32).unwrap(), BigInt::zero());
    }

    #[test]
    fn ashr_sign_extends_negative_values() {
        // -16 as a 32-bit representative.
        let rep = to_unsigned(&i(-16), 32);
        let got = ashr(&rep, &i(2), 32).unwrap();
        let expected = to_unsigned(&i(-4), 32);
        assert_eq!(got, expected);
    }

    #[test]
    fn slt_compares_signed_interpretations() {
        let neg1 = to_unsigned(&i(-1), 8);
        let pos1 = i(1);
        assert!(slt(&neg1, &pos1, 8));
        assert!(!ult(&neg1, &pos1, 8));
    }

    #[test]
    fn invalid_bit_width_is_rejected() {
        assert!(matches!(
            add(&i(1), &i(1), 0),
            Err(DomainError::InvalidBitWidth { .. })
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Any `BigInt`, reduced into a valid `[0, 2^bits)` representative by
    /// masking, the way every public constant in this crate is required to
    /// arrive already normalized.
    fn representative(raw: i64, bits: u32) -> BigInt {
        BigInt::from(raw) & mask(bits)
    }

    proptest! {
        #[test]
        fn wrapping_ops_stay_in_range(a in any::<i64>(), b in any::<i64>(), bits in 1u32..=32) {
            let ra = representative(a, bits);
            let rb = representative(b, bits);
            let upper = BigInt::one() << bits as usize;
            for result in [
                add(&ra, &rb, bits).unwrap(),
                sub(&ra, &rb, bits).unwrap(),
                mul(&ra, &rb, bits).unwrap(),
                and(&ra, &rb, bits).unwrap(),
                or(&ra, &rb, bits).unwrap(),
                xor(&ra, &rb, bits).unwrap(),
            ] {
                prop_assert!(result >= BigInt::zero() && result < upper);
            }
        }

        #[test]
        fn division_and_shift_results_stay_in_range(a in any::<i64>(), b in any::<i64>(), bits in 1u32..=32) {
            let ra = representative(a, bits);
            let rb = representative(b, bits);
            let upper = BigInt::one() << bits as usize;
            let mut results = vec![
                shl(&ra, &rb, bits).unwrap(),
                lshr(&ra, &rb, bits).unwrap(),
                ashr(&ra, &rb, bits).unwrap(),
            ];
            if let Ok(r) = udiv(&ra, &rb, bits) { results.push(r); }
            if let Ok(r) = urem(&ra, &rb, bits) { results.push(r); }
            if let Ok(r) = sdiv(&ra, &rb, bits) { results.push(r); }
            if let Ok(r) = srem(&ra, &rb, bits) { results.push(r); }
            for result in results {
                prop_assert!(result >= BigInt::zero() && result < upper);
            }
        }

        #[test]
        fn to_signed_then_to_unsigned_round_trips(raw in any::<i64>(), bits in 1u32..=32) {
            let rep = representative(raw, bits);
            prop_assert_eq!(to_unsigned(&to_signed(&rep, bits), bits), rep);
        }

        #[test]
        fn slt_agrees_with_signed_subtraction_sign(a in any::<i64>(), b in any::<i64>(), bits in 2u32..=32) {
            let ra = representative(a, bits);
            let rb = representative(b, bits);
            let signed_less = to_signed(&ra, bits) < to_signed(&rb, bits);
            prop_assert_eq!(slt(&ra, &rb, bits), signed_less);
        }
    }
}
