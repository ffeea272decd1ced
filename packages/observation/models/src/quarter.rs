//! Calendar quarter code helpers.
//!
//! Period codes end in `Q` followed by the quarter digit (e.g. `"CY2022Q3"`).

/// Returns the quarter digit (`"1"` to `"4"`) encoded in the last two
/// characters of `code`, or `None` if the code does not end in `Q<digit>`.
#[must_use]
pub fn quarter_of(code: &str) -> Option<&str> {
    let start = code.len().checked_sub(2)?;
    let tail = code.get(start..)?;
    let digit = tail.strip_prefix(['Q', 'q'])?;
    matches!(digit, "1" | "2" | "3" | "4").then_some(digit)
}

/// Normalizes a user quarter selection (`"1"`, `"Q1"`, `" q1 "`) to the
/// bare digit. Returns `None` for anything that is not a quarter.
#[must_use]
pub fn normalize_quarter(selection: &str) -> Option<String> {
    let trimmed = selection.trim();
    let digit = trimmed.strip_prefix(['Q', 'q']).unwrap_or(trimmed);
    matches!(digit, "1" | "2" | "3" | "4").then(|| digit.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_quarter_digit() {
        assert_eq!(quarter_of("CY2022Q4"), Some("4"));
        assert_eq!(quarter_of("2022Q1"), Some("1"));
        assert_eq!(quarter_of("2022q2"), Some("2"));
    }

    #[test]
    fn rejects_codes_without_quarter() {
        assert_eq!(quarter_of("2022"), None);
        assert_eq!(quarter_of("Q"), None);
        assert_eq!(quarter_of(""), None);
        assert_eq!(quarter_of("CY2022Q5"), None);
    }

    #[test]
    fn normalizes_selections() {
        assert_eq!(normalize_quarter("1").as_deref(), Some("1"));
        assert_eq!(normalize_quarter(" Q3 ").as_deref(), Some("3"));
        assert_eq!(normalize_quarter("q4").as_deref(), Some("4"));
        assert_eq!(normalize_quarter("Q0"), None);
        assert_eq!(normalize_quarter("2022Q1"), None);
    }
}
