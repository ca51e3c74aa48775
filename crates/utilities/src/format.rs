use std::fmt;

/// Formats a number with thousands separators, i.e., `1234567` is written as
/// `1,234,567`. Used for the metrics of the term and symbol tables.
pub struct LargeFormatter<T: ToString>(pub T);

impl<T: ToString> fmt::Display for LargeFormatter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();

        // A leading minus sign is not a digit.
        let (sign, digits) = match digits.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", digits.as_str()),
        };

        write!(f, "{sign}")?;
        let len = digits.len();
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                write!(f, ",")?;
            }
            write!(f, "{ch}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_large_formatter() {
        assert_eq!(format!("{}", LargeFormatter(0)), "0");
        assert_eq!(format!("{}", LargeFormatter(999)), "999");
        assert_eq!(format!("{}", LargeFormatter(131072)), "131,072");
        assert_eq!(format!("{}", LargeFormatter(1234567usize)), "1,234,567");
    }

    #[test]
    fn test_large_formatter_negative() {
        assert_eq!(format!("{}", LargeFormatter(-100000i64)), "-100,000");
        assert_eq!(format!("{}", LargeFormatter(-12i64)), "-12");
    }
}
