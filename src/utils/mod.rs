pub mod date;
pub mod fuzzy;
pub mod number;

pub use date::{format_export, format_timestamp, parse_timestamp, DateParseError};
pub use number::parse_leading_int;
