//! Number formatting shared by the writers

/// NASTRAN free-field real that fits an 8-character field
///
/// Decimal places shrink as the magnitude grows: 5 below 10, 4 below 100,
/// 3 otherwise.
pub fn nas_fmt(x: f64) -> String {
    let ax = x.abs();
    if ax < 10.0 {
        format!("{:8.5}", x)
    } else if ax < 100.0 {
        format!("{:8.4}", x)
    } else {
        format!("{:8.3}", x)
    }
}

/// Right-aligned integer in an 8-character field
pub fn nas_int(i: usize) -> String {
    format!("{:>8}", i)
}

/// Fixed notation with 6 decimals (C `%f`)
pub fn c_fmt_f(x: f64) -> String {
    format!("{:.6}", x)
}

fn split_exponent(s: &str) -> (&str, i32) {
    match s.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse().unwrap_or(0)),
        None => (s, 0),
    }
}

fn c_exponent(exp: i32) -> String {
    let sign = if exp < 0 { '-' } else { '+' };
    format!("e{}{:02}", sign, exp.abs())
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Scientific notation with `precision` decimals and a signed two-digit exponent (C `%.*e`)
pub fn c_fmt_e(x: f64, precision: usize) -> String {
    if !x.is_finite() {
        return format!("{x}");
    }
    let s = format!("{:.*e}", precision, x);
    let (mantissa, exp) = split_exponent(&s);
    format!("{}{}", mantissa, c_exponent(exp))
}

/// Shortest of fixed/scientific with 6 significant digits (C `%g`)
pub fn c_fmt_g(x: f64) -> String {
    const PRECISION: i32 = 6;
    if x == 0.0 {
        return "0".to_string();
    }
    if !x.is_finite() {
        return format!("{x}");
    }
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, x);
    let (mantissa, exp) = split_exponent(&sci);
    if exp < -4 || exp >= PRECISION {
        format!("{}{}", trim_fraction(mantissa), c_exponent(exp))
    } else {
        let decimals = (PRECISION - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, x)).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nas_fmt_precision_by_magnitude() {
        assert_eq!(nas_fmt(1.5), " 1.50000");
        assert_eq!(nas_fmt(-2.25), "-2.25000");
        assert_eq!(nas_fmt(12.5), " 12.5000");
        assert_eq!(nas_fmt(123.25), " 123.250");
        assert_eq!(nas_fmt(-99.5), "-99.5000");
        assert_eq!(nas_fmt(0.0), " 0.00000");
    }

    #[test]
    fn test_c_fmt_g() {
        assert_eq!(c_fmt_g(0.002), "0.002");
        assert_eq!(c_fmt_g(2700.0), "2700");
        assert_eq!(c_fmt_g(7.0e10), "7e+10");
        assert_eq!(c_fmt_g(0.33), "0.33");
        assert_eq!(c_fmt_g(2.36e-5), "2.36e-05");
        assert_eq!(c_fmt_g(123456789.0), "1.23457e+08");
        assert_eq!(c_fmt_g(-1.5), "-1.5");
        assert_eq!(c_fmt_g(0.0), "0");
    }

    #[test]
    fn test_c_fmt_e() {
        assert_eq!(c_fmt_e(1.0, 10), "1.0000000000e+00");
        assert_eq!(c_fmt_e(-0.5, 3), "-5.000e-01");
        assert_eq!(c_fmt_e(12345.0, 2), "1.23e+04");
    }

    #[test]
    fn test_nas_int() {
        assert_eq!(nas_int(42), "      42");
        assert_eq!(nas_int(12345678), "12345678");
    }
}
