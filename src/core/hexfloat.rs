//! Hexadecimal floating-point literals.
//!
//! Floats travel as ASCII text such as `0x1.8000000000000p+1` (3.0). Every
//! finite `f64` has an exact literal, so formatting then parsing gives back the
//! same bits. Special values are spelled `inf`, `-inf` and `nan`; a numeric
//! literal that rounds past `f64::MAX` is rejected rather than read as `inf`.

/// Mantissa bits stored in an `f64`.
const MANTISSA_BITS: u32 = 52;
const MANTISSA_MASK: u64 = (1 << MANTISSA_BITS) - 1;
const EXPONENT_BIAS: i64 = 1023;
/// Weight of the lowest subnormal bit.
const MIN_LSB_EXPONENT: i64 = -1074;
/// Exponents beyond this saturate; they can only produce zero or infinity.
const EXPONENT_CLAMP: i64 = 100_000;

/// Format `value` as a hexadecimal literal.
pub fn format(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    let sign = if value.is_sign_negative() { "-" } else { "" };
    if value.is_infinite() {
        return format!("{sign}inf");
    }
    if value == 0.0 {
        return format!("{sign}0x0.0p+0");
    }

    let bits = value.to_bits();
    let biased = ((bits >> MANTISSA_BITS) & 0x7FF) as i64;
    let mantissa = bits & MANTISSA_MASK;
    if biased == 0 {
        format!("{sign}0x0.{mantissa:013x}p{:+}", 1 - EXPONENT_BIAS)
    } else {
        format!("{sign}0x1.{mantissa:013x}p{:+}", biased - EXPONENT_BIAS)
    }
}

/// Parse a hexadecimal literal, rounding to nearest-even when the literal
/// carries more precision than an `f64`.
///
/// Accepts an optional sign, an optional `0x` prefix, hex digits with an
/// optional point, and an optional binary exponent (`p` followed by a signed
/// decimal). Returns `None` for anything else, including a finite literal
/// too large for an `f64`.
pub fn parse(literal: &str) -> Option<f64> {
    let text = literal.trim_matches(|c: char| c.is_ascii_whitespace());
    let (negative, text) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let signed = |v: f64| if negative { -v } else { v };

    if text.eq_ignore_ascii_case("inf") || text.eq_ignore_ascii_case("infinity") {
        return Some(signed(f64::INFINITY));
    }
    if text.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }

    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    let (digits, exponent) = match text.find(['p', 'P']) {
        Some(at) => (&text[..at], parse_exponent(&text[at + 1..])?),
        None => (text, 0),
    };
    let (int_part, frac_part) = match digits.find('.') {
        Some(at) => (&digits[..at], &digits[at + 1..]),
        None => (digits, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    // value = significand * 2^exp, plus a sticky remainder below the lowest bit
    let mut significand: u64 = 0;
    let mut exp: i64 = exponent;
    let mut sticky = false;
    for (c, fractional) in int_part
        .chars()
        .map(|c| (c, false))
        .chain(frac_part.chars().map(|c| (c, true)))
    {
        let digit = u64::from(c.to_digit(16)?);
        if significand >> 60 == 0 {
            significand = (significand << 4) | digit;
            if fractional {
                exp -= 4;
            }
        } else {
            sticky |= digit != 0;
            if !fractional {
                exp += 4;
            }
        }
    }

    let magnitude = compose(significand, exp, sticky);
    if magnitude.is_infinite() {
        return None;
    }
    Some(signed(magnitude))
}

fn parse_exponent(text: &str) -> Option<i64> {
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() {
        return None;
    }
    let mut value: i64 = 0;
    for c in digits.chars() {
        let digit = i64::from(c.to_digit(10)?);
        value = value.saturating_mul(10).saturating_add(digit);
    }
    let value = value.min(EXPONENT_CLAMP);
    Some(if negative { -value } else { value })
}

/// Round `significand * 2^exp` to the nearest `f64`.
fn compose(significand: u64, exp: i64, sticky: bool) -> f64 {
    if significand == 0 {
        return 0.0;
    }

    let width = i64::from(64 - significand.leading_zeros());
    let leading = exp + width - 1;
    if leading > EXPONENT_BIAS {
        return f64::INFINITY;
    }

    let mut lsb = (leading - i64::from(MANTISSA_BITS)).max(MIN_LSB_EXPONENT);
    let shift = lsb - exp;

    let mut mantissa = if shift <= 0 {
        significand << (-shift)
    } else if shift > 64 {
        0
    } else {
        let kept = if shift == 64 { 0 } else { significand >> shift };
        let dropped = if shift == 64 {
            significand
        } else {
            significand & ((1u64 << shift) - 1)
        };
        let half = 1u64 << (shift - 1);
        let round_up = dropped > half || (dropped == half && (sticky || kept & 1 == 1));
        kept + u64::from(round_up)
    };

    if mantissa == 1 << (MANTISSA_BITS + 1) {
        mantissa >>= 1;
        lsb += 1;
    }

    if mantissa >> MANTISSA_BITS == 0 {
        // Subnormal, lsb is pinned at MIN_LSB_EXPONENT.
        return f64::from_bits(mantissa);
    }

    let biased = lsb + i64::from(MANTISSA_BITS) + EXPONENT_BIAS;
    if biased >= 0x7FF {
        return f64::INFINITY;
    }
    f64::from_bits(((biased as u64) << MANTISSA_BITS) | (mantissa & MANTISSA_MASK))
}
