//! Import pipeline: decode raw files on a worker thread, then reconcile
//! the decoded rows into tasks.

pub mod decoder;
pub mod header;
pub mod reconcile;
pub mod worker;

pub use decoder::{decoder_for_path, CsvDecoder, DecodeError, JsonDecoder, RecordDecoder};
pub use header::{detect_mapping, normalize};
pub use reconcile::{reconcile, reconcile_rows, ReconcileReport};
pub use worker::{DecodeMessage, ImportError, ImportHandle, ImportOutcome};
