use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical task attributes that raw column headers are mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    OrderNo,
    Resource,
    StartTime,
    EndTime,
    Qty,
    OpNo,
    Product,
    PartNo,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 8] = [
        CanonicalField::OrderNo,
        CanonicalField::Resource,
        CanonicalField::StartTime,
        CanonicalField::EndTime,
        CanonicalField::Qty,
        CanonicalField::OpNo,
        CanonicalField::Product,
        CanonicalField::PartNo,
    ];

    pub const REQUIRED: [CanonicalField; 4] = [
        CanonicalField::OrderNo,
        CanonicalField::Resource,
        CanonicalField::StartTime,
        CanonicalField::EndTime,
    ];

    /// Normalized tag, as produced by the header normalizer
    pub fn tag(&self) -> &'static str {
        match self {
            CanonicalField::OrderNo => "orderno",
            CanonicalField::Resource => "resource",
            CanonicalField::StartTime => "starttime",
            CanonicalField::EndTime => "endtime",
            CanonicalField::Qty => "qty",
            CanonicalField::OpNo => "opno",
            CanonicalField::Product => "product",
            CanonicalField::PartNo => "partno",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CanonicalField::OrderNo => "orderNo",
            CanonicalField::Resource => "resource",
            CanonicalField::StartTime => "startTime",
            CanonicalField::EndTime => "endTime",
            CanonicalField::Qty => "qty",
            CanonicalField::OpNo => "opNo",
            CanonicalField::Product => "product",
            CanonicalField::PartNo => "partNo",
        }
    }

    /// Accepts the tag or the display name, ignoring case
    pub fn from_str(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|f| f.tag() == lower || f.name().to_lowercase() == lower)
    }

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }

    /// Literal headers read when the mapped column is absent or empty.
    /// Kept for files exported before column mapping existed.
    pub fn legacy_headers(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::OrderNo => &["Order No.", "Order No", "ID"],
            CanonicalField::Resource => &["Resource", "Maszyna"],
            CanonicalField::StartTime => &["Start Time", "Start"],
            CanonicalField::EndTime => &["End Time", "End"],
            CanonicalField::Qty => &["Qty.", "Qty", "Ilość"],
            CanonicalField::OpNo => &["Op. No.", "Op No", "Operation"],
            CanonicalField::Product => &["Product", "Produkt"],
            CanonicalField::PartNo => &["Part No.", "Part No", "Part Number"],
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("required columns not mapped: {}", join_fields(.0))]
    MissingRequired(Vec<CanonicalField>),
    #[error("unknown field '{0}' (expected one of orderNo, resource, startTime, endTime, qty, opNo, product, partNo)")]
    UnknownField(String),
    #[error("invalid mapping '{0}': expected FIELD=HEADER")]
    InvalidSpec(String),
}

fn join_fields(fields: &[CanonicalField]) -> String {
    fields.iter().map(|f| f.name()).collect::<Vec<_>>().join(", ")
}

/// Canonical field -> raw header chosen by the user or by auto-detection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    columns: BTreeMap<CanonicalField, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `field` to `header`. An empty header clears the field.
    pub fn set(&mut self, field: CanonicalField, header: impl Into<String>) {
        let header = header.into();
        if header.is_empty() {
            self.columns.remove(&field);
        } else {
            self.columns.insert(field, header);
        }
    }

    pub fn with(mut self, field: CanonicalField, header: impl Into<String>) -> Self {
        self.set(field, header);
        self
    }

    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &str)> {
        self.columns.iter().map(|(f, h)| (*f, h.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn missing_required(&self) -> Vec<CanonicalField> {
        CanonicalField::REQUIRED
            .into_iter()
            .filter(|f| !self.columns.contains_key(f))
            .collect()
    }

    /// A confirmed mapping must name all four required fields.
    pub fn validate(&self) -> Result<(), MappingError> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MappingError::MissingRequired(missing))
        }
    }

    /// Parse `FIELD=HEADER` specs (e.g. `orderNo=Zlecenie`) into a mapping
    pub fn from_specs<S: AsRef<str>>(specs: &[S]) -> Result<Self, MappingError> {
        let mut mapping = Self::new();
        for spec in specs {
            let spec = spec.as_ref();
            let (field, header) = spec
                .split_once('=')
                .ok_or_else(|| MappingError::InvalidSpec(spec.to_string()))?;
            let field = CanonicalField::from_str(field)
                .ok_or_else(|| MappingError::UnknownField(field.trim().to_string()))?;
            let header = header.trim();
            if header.is_empty() {
                return Err(MappingError::InvalidSpec(spec.to_string()));
            }
            mapping.set(field, header);
        }
        Ok(mapping)
    }
}
