// Parsing and formatting helpers.
//
// The loader leans on these so the rest of the crate can assume typed,
// validated values.
use num_format::{Locale, ToFormattedString};

/// Numeric cell as a finite `f64`. Thousands separators are dropped and
/// exponent form (`1e-05`) is accepted; `NaN` and infinities are not.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let digits: String = s?.trim().chars().filter(|&c| c != ',').collect();
    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    // Some exports write years as `2001.0`.
    s.parse::<i32>().ok().or_else(|| {
        let f = s.parse::<f64>().ok()?;
        (f.fract() == 0.0 && f.abs() < i32::MAX as f64).then_some(f as i32)
    })
}

/// Trimmed text cell, `None` when missing or blank.
pub fn clean_text(s: Option<String>) -> Option<String> {
    let s = s?.trim().to_string();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators
    // (e.g. `1,234,567.89`).
    if !n.is_finite() {
        return String::new();
    }
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Row and group counts, e.g. `9,855`.
pub fn format_count(n: usize) -> String {
    n.to_formatted_string(&Locale::en)
}
