use std::fmt::{self, Write};

/// Decimal exponent from which the scientific notation is used, for the
/// shortest representation.
const SCIENTIFIC_EXPONENT_THRESHOLD: i32 = 6;
/// Smallest decimal exponent still written in positional notation.
const SMALLEST_POSITIONAL_EXPONENT: i32 = -4;

/// Writes `value` the way the Prometheus text format renders sample values.
///
/// `0`, `1`, `-1`, `NaN`, `+Inf` and `-Inf` have fixed spellings, negative zero
/// included in `0`. Everything else gets the shortest digits that parse back
/// to exactly `value`, laid out like Go's `strconv.FormatFloat(v, 'g', -1, 64)`:
/// scientific notation with a signed, two-digit minimum exponent when the
/// exponent is below -4 or at least 6, positional otherwise.
pub fn write_float<W: Write>(writer: &mut W, value: f64) -> fmt::Result {
    if value == 1.0 {
        return writer.write_char('1');
    }
    if value == 0.0 {
        return writer.write_char('0');
    }
    if value == -1.0 {
        return writer.write_str("-1");
    }
    if value.is_nan() {
        return writer.write_str("NaN");
    }
    if value.is_infinite() {
        return writer.write_str(if value > 0.0 { "+Inf" } else { "-Inf" });
    }

    // Rust's `{:e}` already produces the shortest round-trip digits,
    // e.g. "1.2345e-7". Only the layout has to change.
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific.split_once('e').ok_or(fmt::Error)?;
    let exponent: i32 = exponent.parse().map_err(|_| fmt::Error)?;
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if value.is_sign_negative() {
        writer.write_char('-')?;
    }

    if !(SMALLEST_POSITIONAL_EXPONENT..SCIENTIFIC_EXPONENT_THRESHOLD).contains(&exponent) {
        write_scientific(writer, &digits, exponent)
    } else {
        write_positional(writer, &digits, exponent)
    }
}

/// Appends `value` to `output`. See [`write_float`].
pub fn push_float(output: &mut String, value: f64) {
    // Writing into a String only fails if the digits could not be parsed,
    // which `{:e}` never produces.
    let _ = write_float(output, value);
}

/// Formats `value` into a new string. See [`write_float`].
pub fn format_float(value: f64) -> String {
    let mut output = String::new();
    push_float(&mut output, value);
    output
}

fn write_scientific<W: Write>(writer: &mut W, digits: &str, exponent: i32) -> fmt::Result {
    let (first, rest) = digits.split_at(1);
    writer.write_str(first)?;
    if !rest.is_empty() {
        writer.write_char('.')?;
        writer.write_str(rest)?;
    }
    let sign = if exponent < 0 { '-' } else { '+' };
    write!(writer, "e{}{:02}", sign, exponent.unsigned_abs())
}

fn write_positional<W: Write>(writer: &mut W, digits: &str, exponent: i32) -> fmt::Result {
    // Number of digits before the decimal point.
    let integer_digits = exponent + 1;

    if integer_digits <= 0 {
        writer.write_str("0.")?;
        for _ in 0..-integer_digits {
            writer.write_char('0')?;
        }
        return writer.write_str(digits);
    }

    let integer_digits = integer_digits as usize;
    if digits.len() <= integer_digits {
        writer.write_str(digits)?;
        for _ in digits.len()..integer_digits {
            writer.write_char('0')?;
        }
        Ok(())
    } else {
        let (integer, fraction) = digits.split_at(integer_digits);
        writer.write_str(integer)?;
        writer.write_char('.')?;
        writer.write_str(fraction)
    }
}
