//! Numeric extraction from `vcgencmd` output lines

use regex::Regex;
use std::sync::LazyLock;

/// Anything that cannot be part of a decimal number.
static NON_DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d.]+").expect("valid regex"));

/// The `frequency(<clock id>)=` token printed before the clock in Hz.
static FREQUENCY_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*frequency\(\d+\)=").expect("valid regex"));

const HZ_PER_MHZ: u64 = 1_000_000;

fn decimal(line: &str) -> Option<f64> {
    NON_DECIMAL_RE.replace_all(line, "").parse().ok()
}

/// `temp=42.8'C` -> 42.8
pub fn temperature(line: &str) -> Option<f64> {
    decimal(line)
}

/// `frequency(45)=1200000000` -> 1200 (whole MHz)
pub fn frequency(line: &str) -> Option<f64> {
    let hz: u64 = FREQUENCY_PREFIX_RE.replace(line, "").trim().parse().ok()?;
    Some((hz / HZ_PER_MHZ) as f64)
}

/// `volt=1.2000V` -> 1.2
pub fn voltage(line: &str) -> Option<f64> {
    decimal(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature() {
        assert_eq!(temperature("temp=42.8'C"), Some(42.8));
        assert_eq!(temperature("temp=42.8'C\n"), Some(42.8));
        assert_eq!(temperature("temp=0.0'C"), Some(0.0));
    }

    #[test]
    fn test_frequency() {
        assert_eq!(frequency("frequency(45)=1200000000"), Some(1200.0));
        assert_eq!(frequency("frequency(48)=1500000000\n"), Some(1500.0));
        // Whole MHz, remainder dropped
        assert_eq!(frequency("frequency(45)=600117000"), Some(600.0));
    }

    #[test]
    fn test_voltage() {
        assert_eq!(voltage("volt=1.2000V"), Some(1.2));
        assert_eq!(voltage("volt=0.8500V\n"), Some(0.85));
    }

    #[test]
    fn test_sign_is_stripped() {
        // Only digits and dots survive, so a minus sign is dropped
        assert_eq!(temperature("temp=-5.0'C"), Some(5.0));
        assert_eq!(voltage("volt=-1.2000V"), Some(1.2));
    }

    #[test]
    fn test_malformed() {
        assert_eq!(temperature("temp='C"), None);
        assert_eq!(temperature(""), None);
        assert_eq!(voltage("volt=1.2.0V"), None);
        assert_eq!(frequency("frequency(45)="), None);
        assert_eq!(frequency("frequency(45)=12ab"), None);
        assert_eq!(frequency("clock=1200000000Hz"), None);
    }
}
