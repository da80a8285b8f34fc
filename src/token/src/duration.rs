//! Short human duration strings ("30m", "14d") to whole seconds.

use crate::error::DurationError;

/// Parse `<digits><unit>` where unit is one of `s`, `m`, `h`, `d`.
///
/// Compound forms such as `1h30m` and surrounding whitespace are rejected.
pub fn parse_duration(input: &str) -> Result<u64, DurationError> {
    if input.is_empty() {
        return Err(DurationError::Empty);
    }

    let split = input.len() - input.chars().last().map(char::len_utf8).unwrap_or(0);
    let (digits, unit) = input.split_at(split);

    if unit.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DurationError::MissingUnit(input.to_string()));
    }
    if digits.is_empty() {
        return Err(DurationError::MissingValue(input.to_string()));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DurationError::Malformed(input.to_string()));
    }

    let multiplier: u64 = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return Err(DurationError::UnknownUnit(input.to_string())),
    };

    let value: u64 = digits
        .parse()
        .map_err(|_| DurationError::Overflow(input.to_string()))?;

    value
        .checked_mul(multiplier)
        .ok_or_else(|| DurationError::Overflow(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_units() {
        assert_eq!(parse_duration("5s").unwrap(), 5);
        assert_eq!(parse_duration("30m").unwrap(), 1_800);
        assert_eq!(parse_duration("1h").unwrap(), 3_600);
        assert_eq!(parse_duration("14d").unwrap(), 1_209_600);
        assert_eq!(parse_duration("0s").unwrap(), 0);
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(parse_duration(""), Err(DurationError::Empty));
        assert!(matches!(parse_duration("m"), Err(DurationError::MissingValue(_))));
        assert!(matches!(parse_duration("15"), Err(DurationError::MissingUnit(_))));
        assert!(matches!(parse_duration("15w"), Err(DurationError::UnknownUnit(_))));
        assert!(matches!(parse_duration("1h30m"), Err(DurationError::Malformed(_))));
        assert!(matches!(parse_duration("-5s"), Err(DurationError::Malformed(_))));
        assert!(matches!(parse_duration("5é"), Err(DurationError::UnknownUnit(_))));
    }

    #[test]
    fn test_rejects_surrounding_whitespace() {
        assert!(matches!(parse_duration(" 5s"), Err(DurationError::Malformed(_))));
        assert!(matches!(parse_duration("5s\n"), Err(DurationError::Malformed(_))));
        assert!(matches!(parse_duration("5 s"), Err(DurationError::Malformed(_))));
        assert!(matches!(parse_duration(" "), Err(DurationError::Malformed(_))));
    }

    #[test]
    fn test_overflow() {
        assert!(matches!(
            parse_duration("99999999999999999999d"),
            Err(DurationError::Overflow(_))
        ));
        assert!(matches!(
            parse_duration("999999999999999999d"),
            Err(DurationError::Overflow(_))
        ));
    }

    proptest! {
        #[test]
        fn test_minutes_are_sixty_seconds(n in 0u64..1_000_000) {
            prop_assert_eq!(parse_duration(&format!("{}m", n)).unwrap(), n * 60);
        }

        #[test]
        fn test_never_panics(s in "\\PC{0,12}") {
            let _ = parse_duration(&s);
        }
    }
}
