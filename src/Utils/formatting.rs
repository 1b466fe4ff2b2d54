//! Presentation helpers. Algorithms keep full precision internally; these are only applied to reported values.

/// number of decimal places used to report a result computed with tolerance epsilon:
/// the count of fractional digits in epsilon, clamped to [3, 12]; 6 if epsilon has no fractional part
pub fn decimal_places(epsilon: f64) -> u32 {
    if !(epsilon > 0.0) || !epsilon.is_finite() {
        return 6;
    }
    // Display for f64 never uses exponent notation, so 1e-7 is printed as 0.0000001
    let repr = format!("{}", epsilon);
    match repr.split_once('.') {
        Some((_, fraction)) => (fraction.len() as u32).clamp(3, 12),
        None => 6,
    }
}

pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() { rounded } else { value }
}

/// coefficient printed with up to 6 decimals and no trailing zeros
fn format_coefficient(value: f64) -> String {
    let text = format!("{:.6}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn power_suffix(power: usize) -> String {
    match power {
        0 => String::new(),
        1 => "x".to_string(),
        2 => "x²".to_string(),
        3 => "x³".to_string(),
        _ => format!("x^{}", power),
    }
}

/// human-readable polynomial with coefficients ordered from low to high degree:
/// [1.0, -2.5, 0.5] -> "y = 1 - 2.5x + 0.5x²"
pub fn polynomial_equation(coefficients: &[f64]) -> String {
    let mut equation = String::from("y =");
    for (power, &c) in coefficients.iter().enumerate() {
        if power == 0 {
            equation.push_str(&format!(" {}", format_coefficient(c)));
        } else {
            let sign = if c >= 0.0 { '+' } else { '-' };
            equation.push_str(&format!(
                " {} {}{}",
                sign,
                format_coefficient(c.abs()),
                power_suffix(power)
            ));
        }
    }
    if coefficients.is_empty() {
        equation.push_str(" 0");
    }
    equation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_places() {
        assert_eq!(decimal_places(0.001), 3);
        assert_eq!(decimal_places(0.1), 3);
        assert_eq!(decimal_places(0.0015), 4);
        assert_eq!(decimal_places(1e-6), 6);
        assert_eq!(decimal_places(1e-15), 12);
        assert_eq!(decimal_places(1.0), 6);
        assert_eq!(decimal_places(0.0), 6);
        assert_eq!(decimal_places(-1e-3), 6);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(-2.0004, 3), -2.0);
        assert_eq!(round_to(f64::MAX, 12), f64::MAX);
    }

    #[test]
    fn test_polynomial_equation() {
        assert_eq!(polynomial_equation(&[1.0, 2.0]), "y = 1 + 2x");
        assert_eq!(polynomial_equation(&[1.0, -2.5, 0.5]), "y = 1 - 2.5x + 0.5x²");
        assert_eq!(polynomial_equation(&[0.1234567, 0.0]), "y = 0.123457 + 0x");
        assert_eq!(polynomial_equation(&[]), "y = 0");
    }
}
