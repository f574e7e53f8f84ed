//! Header normalizer
//!
//! Maps arbitrary column headers onto canonical fields by token matching.
//! Headers are lower-cased and stripped of everything but letters and digits
//! (Polish letters survive), then tested against prefix rules for every
//! field before any substring rule, so a header that starts with a known
//! token is never captured by a looser substring of another field.
//!
//! English and Polish business vocabulary are both recognized:
//!
//! ```text
//! "Order No."          -> orderno       "Zlecenie"      -> orderno
//! "Machine"            -> resource      "Maszyna"       -> resource
//! "Start Time"         -> starttime     "Początek"      -> starttime
//! "Finish"             -> endtime       "Koniec"        -> endtime
//! ```

use crate::models::{CanonicalField, ColumnMapping};

struct TokenRule {
    field: CanonicalField,
    prefixes: &'static [&'static str],
    contains: &'static [&'static str],
}

const RULES: &[TokenRule] = &[
    TokenRule {
        field: CanonicalField::OrderNo,
        prefixes: &["order", "id", "nr", "no"],
        contains: &["zlecen"],
    },
    TokenRule {
        field: CanonicalField::Resource,
        prefixes: &["resource", "maszyna", "machine", "zasob", "zasób", "workcenter"],
        contains: &["resource", "maszyn", "machine", "zasob", "zasób"],
    },
    TokenRule {
        field: CanonicalField::StartTime,
        prefixes: &["start", "begin", "początek", "poczatek"],
        contains: &["start", "begin", "początek", "poczatek", "rozpocz"],
    },
    TokenRule {
        field: CanonicalField::EndTime,
        prefixes: &["end", "finish", "koniec"],
        contains: &["end", "finish", "koniec", "zakończ", "zakoncz"],
    },
    TokenRule {
        field: CanonicalField::Qty,
        prefixes: &["qty", "quantity", "ilość", "ilosc"],
        contains: &["qty", "quantity"],
    },
    TokenRule {
        field: CanonicalField::OpNo,
        prefixes: &["op", "operation", "operacja"],
        contains: &["opno", "operation", "operacj"],
    },
    TokenRule {
        field: CanonicalField::Product,
        prefixes: &["product", "produkt"],
        contains: &["product", "produkt"],
    },
    TokenRule {
        field: CanonicalField::PartNo,
        prefixes: &["part", "partno", "partnumber"],
        contains: &["partno", "partnumber", "części", "czesci"],
    },
];

/// Lower-case and keep only alphanumeric characters
pub fn normalize_key(header: &str) -> String {
    header
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Map a raw header to its canonical field, or `None` when no rule matches
pub fn normalize(header: &str) -> Option<CanonicalField> {
    let key = normalize_key(header);
    if key.is_empty() {
        return None;
    }

    RULES
        .iter()
        .find(|rule| rule.prefixes.iter().any(|p| key.starts_with(p)))
        .or_else(|| {
            RULES
                .iter()
                .find(|rule| rule.contains.iter().any(|c| key.contains(c)))
        })
        .map(|rule| rule.field)
}

/// A "resource group" column names the work-center group and beats a plain
/// resource column for the resource field.
pub fn is_resource_group(header: &str) -> bool {
    normalize_key(header).contains("resourcegroup")
}

/// Detect a mapping from the headers of the first row.
///
/// The first header matching each field wins, except that a resource-group
/// header replaces a plain resource header.
pub fn detect_mapping<'a, I>(headers: I) -> ColumnMapping
where
    I: IntoIterator<Item = &'a str>,
{
    let mut mapping = ColumnMapping::new();
    let mut resource_is_group = false;

    for header in headers {
        let Some(field) = normalize(header) else {
            continue;
        };

        if field == CanonicalField::Resource {
            let group = is_resource_group(header);
            if mapping.get(field).is_none() || (group && !resource_is_group) {
                mapping.set(field, header);
                resource_is_group = group;
            }
            continue;
        }

        if mapping.get(field).is_none() {
            mapping.set(field, header);
        }
    }

    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Order No."), "orderno");
        assert_eq!(normalize_key("  Start-Time (UTC) "), "starttimeutc");
        assert_eq!(normalize_key("Początek"), "początek");
    }

    #[test]
    fn test_english_headers() {
        assert_eq!(normalize("Order No."), Some(CanonicalField::OrderNo));
        assert_eq!(normalize("ID"), Some(CanonicalField::OrderNo));
        assert_eq!(normalize("Resource"), Some(CanonicalField::Resource));
        assert_eq!(normalize("Machine"), Some(CanonicalField::Resource));
        assert_eq!(normalize("Start Time"), Some(CanonicalField::StartTime));
        assert_eq!(normalize("Begin"), Some(CanonicalField::StartTime));
        assert_eq!(normalize("End Time"), Some(CanonicalField::EndTime));
        assert_eq!(normalize("Finish"), Some(CanonicalField::EndTime));
        assert_eq!(normalize("Qty."), Some(CanonicalField::Qty));
        assert_eq!(normalize("Op. No."), Some(CanonicalField::OpNo));
        assert_eq!(normalize("Operation"), Some(CanonicalField::OpNo));
        assert_eq!(normalize("Product"), Some(CanonicalField::Product));
        assert_eq!(normalize("Part No."), Some(CanonicalField::PartNo));
    }

    #[test]
    fn test_polish_headers() {
        assert_eq!(normalize("Maszyna"), Some(CanonicalField::Resource));
        assert_eq!(normalize("Numer zlecenia"), Some(CanonicalField::OrderNo));
        assert_eq!(normalize("Początek"), Some(CanonicalField::StartTime));
        assert_eq!(normalize("Czas rozpoczęcia"), Some(CanonicalField::StartTime));
        assert_eq!(normalize("Koniec"), Some(CanonicalField::EndTime));
        assert_eq!(normalize("Czas zakończenia"), Some(CanonicalField::EndTime));
        assert_eq!(normalize("Ilość"), Some(CanonicalField::Qty));
        assert_eq!(normalize("Numer operacji"), Some(CanonicalField::OpNo));
        assert_eq!(normalize("Produkt"), Some(CanonicalField::Product));
        assert_eq!(normalize("Numer części"), Some(CanonicalField::PartNo));
    }

    #[test]
    fn test_substring_rules() {
        assert_eq!(normalize("Planned Start"), Some(CanonicalField::StartTime));
        assert_eq!(normalize("Planned End"), Some(CanonicalField::EndTime));
        assert_eq!(normalize("Resource Group Name"), Some(CanonicalField::Resource));
    }

    #[test]
    fn test_unmapped_headers() {
        assert_eq!(normalize("Duration(min)"), None);
        assert_eq!(normalize("Comment"), None);
        assert_eq!(normalize("---"), None);
        assert_eq!(normalize(""), None);
    }

    #[test]
    fn test_detect_mapping_first_match_wins() {
        let mapping = detect_mapping(["Order No.", "ID", "Resource", "Start Time", "End Time", "Qty."]);
        assert_eq!(mapping.get(CanonicalField::OrderNo), Some("Order No."));
        assert_eq!(mapping.get(CanonicalField::Resource), Some("Resource"));
        assert_eq!(mapping.get(CanonicalField::Qty), Some("Qty."));
        assert!(mapping.validate().is_ok());
    }

    #[test]
    fn test_resource_group_wins() {
        let mapping = detect_mapping(["Resource", "Resource Group Name", "Start", "End", "Order"]);
        assert_eq!(mapping.get(CanonicalField::Resource), Some("Resource Group Name"));

        let reversed = detect_mapping(["Resource Group Name", "Resource"]);
        assert_eq!(reversed.get(CanonicalField::Resource), Some("Resource Group Name"));
    }
}
