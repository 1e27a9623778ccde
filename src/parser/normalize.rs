//! Turns the numeric tokens found on listener pages into integers.
//!
//! Pages are localized, so the same count shows up as `1,234,567`,
//! `1.234.567`, `1 234 567` or `1.2M`. Suffixed values are scaled with exact
//! decimal arithmetic and truncated; unsuffixed values have their grouping
//! separators removed, with a trailing non-three-digit group read as a decimal
//! part and dropped.

pub fn normalize_count(token: &str) -> Option<u64> {
    let cleaned: String = token
        .chars()
        .filter(|c| !matches!(c, '\u{00A0}' | '\u{202F}'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned.starts_with('-') {
        return None;
    }

    match split_magnitude(cleaned) {
        Some((number, magnitude)) => scale_decimal(number.trim_end(), magnitude),
        None => parse_grouped(cleaned),
    }
}

fn split_magnitude(token: &str) -> Option<(&str, u32)> {
    let last = token.chars().last()?;
    let exponent = match last.to_ascii_lowercase() {
        'k' => 3,
        'm' => 6,
        'b' => 9,
        _ => return None,
    };
    Some((&token[..token.len() - last.len_utf8()], exponent))
}

/// `1.2` with exponent 3 -> 1200. Fraction digits beyond the exponent are truncated.
fn scale_decimal(number: &str, exponent: u32) -> Option<u64> {
    let number: String = number.chars().filter(|c| *c != ' ').collect();
    let (integer, fraction) = split_decimal(&number)?;

    let integer = if integer.is_empty() {
        0
    } else {
        integer.parse::<u64>().ok()?
    };

    let width = exponent as usize;
    let mut fraction: String = fraction.chars().take(width).collect();
    while fraction.len() < width {
        fraction.push('0');
    }
    let fraction = fraction.parse::<u64>().ok()?;

    integer
        .checked_mul(10u64.pow(exponent))?
        .checked_add(fraction)
}

/// Splits a suffixed number into integer digits and fraction digits.
fn split_decimal(number: &str) -> Option<(String, String)> {
    let (integer, fraction) = if number.contains('.') {
        let (integer, fraction) = number.rsplit_once('.')?;
        (integer.replace(',', ""), fraction.to_string())
    } else if let Some((integer, fraction)) = number.rsplit_once(',') {
        if integer.contains(',') || fraction.len() == 3 {
            (number.replace(',', ""), String::new())
        } else {
            (integer.to_string(), fraction.to_string())
        }
    } else {
        (number.to_string(), String::new())
    };

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (integer.is_empty() && fraction.is_empty()) || !all_digits(&integer) || !all_digits(&fraction)
    {
        return None;
    }
    Some((integer, fraction))
}

fn parse_grouped(token: &str) -> Option<u64> {
    let token: String = token.chars().filter(|c| *c != ' ').collect();
    let has_comma = token.contains(',');
    let has_period = token.contains('.');

    let integer = match (has_comma, has_period) {
        (false, false) => token,
        (false, true) => {
            let groups: Vec<&str> = token.split('.').collect();
            if groups[1..].iter().all(|group| group.len() == 3) {
                groups.concat()
            } else if groups.len() == 2 {
                groups[0].to_string()
            } else {
                return None;
            }
        }
        (true, false) => token.replace(',', ""),
        (true, true) => {
            let position = token.rfind(['.', ','])?;
            let trailing = &token[position + 1..];
            if trailing.len() == 3 {
                token.replace([',', '.'], "")
            } else {
                token[..position].replace([',', '.'], "")
            }
        }
    };

    if integer.is_empty() {
        return if has_period { Some(0) } else { None };
    }
    if !integer.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    integer.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude_suffixes() {
        assert_eq!(normalize_count("1.2K"), Some(1_200));
        assert_eq!(normalize_count("2.5M"), Some(2_500_000));
        assert_eq!(normalize_count("3b"), Some(3_000_000_000));
        assert_eq!(normalize_count("12k"), Some(12_000));
        assert_eq!(normalize_count("1,5M"), Some(1_500_000));
        assert_eq!(normalize_count("1.2345K"), Some(1_234));
    }

    #[test]
    fn test_zero_is_valid() {
        assert_eq!(normalize_count("0"), Some(0));
        assert_eq!(normalize_count("0K"), Some(0));
    }

    #[test]
    fn test_period_grouped_thousands() {
        assert_eq!(normalize_count("1.048"), Some(1_048));
        assert_eq!(normalize_count("2.500.000"), Some(2_500_000));
    }

    #[test]
    fn test_decimal_is_truncated() {
        assert_eq!(normalize_count("12.5"), Some(12));
        assert_eq!(normalize_count("7.99"), Some(7));
        assert_eq!(normalize_count("1,234.56"), Some(1_234));
        assert_eq!(normalize_count("1.234,56"), Some(1_234));
    }

    #[test]
    fn test_comma_and_space_groups() {
        assert_eq!(normalize_count("1,234,567"), Some(1_234_567));
        assert_eq!(normalize_count("1 234 567"), Some(1_234_567));
        assert_eq!(normalize_count("12\u{00A0}345"), Some(12_345));
        assert_eq!(normalize_count("12\u{202F}345"), Some(12_345));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(normalize_count(""), None);
        assert_eq!(normalize_count("-5"), None);
        assert_eq!(normalize_count("abc"), None);
        assert_eq!(normalize_count("1.2.34"), None);
        assert_eq!(normalize_count("K"), None);
    }
}
