use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One decoded cell. Decoders produce only these three shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Number(f64),
    Text(String),
}

/// A decoded row: raw header -> cell, in source column order
pub type Record = IndexMap<String, CellValue>;

impl CellValue {
    /// Infer a cell from raw delimited text.
    ///
    /// Blank text is `Null`; plain decimal numbers become `Number`. Values
    /// with a leading zero (`"007"`) stay text so identifiers keep their
    /// padding.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        if looks_numeric(trimmed) {
            if let Ok(n) = trimmed.parse::<f64>() {
                if n.is_finite() {
                    return CellValue::Number(n);
                }
            }
        }
        CellValue::Text(raw.to_string())
    }

    /// Non-blank text or any number
    pub fn is_present(&self) -> bool {
        match self {
            CellValue::Null => false,
            CellValue::Number(_) => true,
            CellValue::Text(s) => !s.trim().is_empty(),
        }
    }

    /// Text form of a present cell, trimmed. Integral numbers print without
    /// a fractional part.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

fn looks_numeric(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return false;
    }
    if digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.") {
        return false;
    }
    digits
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_cells() {
        assert_eq!(CellValue::infer(""), CellValue::Null);
        assert_eq!(CellValue::infer("   "), CellValue::Null);
        assert_eq!(CellValue::infer("42"), CellValue::Number(42.0));
        assert_eq!(CellValue::infer("-1.5"), CellValue::Number(-1.5));
        assert_eq!(CellValue::infer("0.25"), CellValue::Number(0.25));
        assert_eq!(CellValue::infer("007"), CellValue::Text("007".to_string()));
        assert_eq!(CellValue::infer("ORD1"), CellValue::Text("ORD1".to_string()));
        assert_eq!(
            CellValue::infer("15.01.2024 08:00"),
            CellValue::Text("15.01.2024 08:00".to_string())
        );
        assert_eq!(CellValue::infer("inf"), CellValue::Text("inf".to_string()));
    }

    #[test]
    fn test_as_text() {
        assert_eq!(CellValue::Number(1700000000.0).as_text().as_deref(), Some("1700000000"));
        assert_eq!(CellValue::Number(2.5).as_text().as_deref(), Some("2.5"));
        assert_eq!(CellValue::Text("  M1 ".into()).as_text().as_deref(), Some("M1"));
        assert_eq!(CellValue::Text("  ".into()).as_text(), None);
        assert_eq!(CellValue::Null.as_text(), None);
        assert!(CellValue::Number(0.0).is_present());
    }
}
