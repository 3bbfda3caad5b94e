/// Code prefixes of boards with a 20% daily limit.
const WIDE_LIMIT_PREFIXES: [&str; 3] = ["688", "300", "301"];

const WIDE_LIMIT: f64 = 0.20;
const NARROW_LIMIT: f64 = 0.10;

/// Ceiling price for the session given the previous close.
///
/// Truncated to cents, never rounded up: a ceiling of 11.005 is 11.00.
pub fn board_ceiling(code: &str, prev_close: f64) -> f64 {
    let pct = if WIDE_LIMIT_PREFIXES.iter().any(|p| code.starts_with(p)) {
        WIDE_LIMIT
    } else {
        NARROW_LIMIT
    };

    ((1.0 + pct) * prev_close * 100.0).floor() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_board_gets_ten_percent() {
        assert_eq!(board_ceiling("600000", 10.0), 11.0);
    }

    #[test]
    fn growth_boards_get_twenty_percent() {
        assert_eq!(board_ceiling("688111", 10.0), 12.0);
        assert_eq!(board_ceiling("300750", 50.0), 60.0);
        assert_eq!(board_ceiling("301001", 5.0), 6.0);
    }

    #[test]
    fn result_is_truncated_not_rounded() {
        // 1.1 * 10.05 = 11.055 -> 11.05
        assert_eq!(board_ceiling("000001", 10.05), 11.05);
        // 1.1 * 3.37 = 3.707 -> 3.70
        assert_eq!(board_ceiling("600519", 3.37), 3.7);
    }
}
