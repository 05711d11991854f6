//! Significant-digit float formatting for logged state values.
//!
//! State columns are written with 3 significant digits in the style of
//! C's `%g`: fixed notation for moderate exponents, scientific notation
//! with a signed two-digit exponent otherwise, trailing zeros trimmed.
//! Downstream tooling parses both forms.

/// Format `value` with `sig` significant digits, `%g` style.
pub(crate) fn format_g(value: f32, sig: usize) -> String {
    debug_assert!(sig >= 1);

    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    // Round to `sig` significant digits first; the exponent that decides
    // between fixed and scientific notation is the post-rounding one
    // (999.6 at 3 digits is 1e+03, not 1000).
    let sci = format!("{:.*e}", sig - 1, value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some(parts) => parts,
        None => return sci,
    };
    let exponent: i32 = match exponent.parse() {
        Ok(e) => e,
        Err(_) => return sci,
    };

    if exponent < -4 || exponent >= sig as i32 {
        let mantissa = trim_trailing_zeros(mantissa);
        if exponent < 0 {
            format!("{}e-{:02}", mantissa, -exponent)
        } else {
            format!("{}e+{:02}", mantissa, exponent)
        }
    } else {
        let decimals = (sig as i32 - 1 - exponent).max(0) as usize;
        trim_trailing_zeros(&format!("{:.*}", decimals, value))
    }
}

fn trim_trailing_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}
