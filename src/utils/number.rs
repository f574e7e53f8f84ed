// Lenient integer parsing for spreadsheet cells

/// Integer prefix of a cell: "120 szt." -> 120, "12.5" -> 12, "30a" -> 30.
/// Leading whitespace and one sign are allowed; no digits gives `None`.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
