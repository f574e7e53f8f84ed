//! Record decoders
//!
//! A decoder turns a source file into an ordered stream of flat
//! [`Record`]s, handed over in chunks together with a progress percentage.
//! Decoders know nothing about tasks or canonical fields.

use crate::models::{CellValue, Record};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Rows per chunk unless configured otherwise
pub const DEFAULT_CHUNK_SIZE: usize = 500;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("JSON input must be an array of objects ({0})")]
    JsonShape(String),
    #[error("unsupported file type '{0}' (expected .csv or .json)")]
    UnsupportedFormat(String),
}

/// Receives one chunk of rows and the progress (0-100) reached after it.
/// Returning `false` asks the decoder to stop.
pub type ChunkSink<'a> = dyn FnMut(Vec<Record>, f32) -> bool + 'a;

pub trait RecordDecoder: Send {
    /// Decode the whole source, returning the number of rows produced
    fn decode(&mut self, sink: &mut ChunkSink<'_>) -> Result<usize, DecodeError>;
}

/// Pick a decoder by file extension. Unsupported types are refused before
/// any work starts.
pub fn decoder_for_path(path: &Path, chunk_size: usize) -> Result<Box<dyn RecordDecoder>, DecodeError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "txt" | "tsv" => Ok(Box::new(CsvDecoder::open(path)?.with_chunk_size(chunk_size))),
        "json" => Ok(Box::new(JsonDecoder::open(path)?.with_chunk_size(chunk_size))),
        _ => Err(DecodeError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Delimited text with a header row.
///
/// The delimiter (`,` `;` or tab) is sniffed from the header line. Blank
/// lines and rows whose cells are all blank are skipped. Short rows are
/// padded with `Null`.
pub struct CsvDecoder<R> {
    reader: Option<R>,
    total_bytes: u64,
    chunk_size: usize,
}

impl CsvDecoder<File> {
    pub fn open(path: &Path) -> Result<Self, DecodeError> {
        let file = File::open(path)?;
        let total_bytes = file.metadata()?.len();
        Ok(Self::new(file, total_bytes))
    }
}

impl<R: Read + Send> CsvDecoder<R> {
    /// `total_bytes` is used only for progress reporting
    pub fn new(reader: R, total_bytes: u64) -> Self {
        Self {
            reader: Some(reader),
            total_bytes,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    fn progress(&self, byte: u64) -> f32 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        ((byte as f64 / self.total_bytes as f64) * 100.0).min(100.0) as f32
    }
}

impl<R: Read + Send> RecordDecoder for CsvDecoder<R> {
    fn decode(&mut self, sink: &mut ChunkSink<'_>) -> Result<usize, DecodeError> {
        let Some(reader) = self.reader.take() else {
            return Ok(0);
        };
        let mut buffered = BufReader::new(reader);
        let delimiter = sniff_delimiter(buffered.fill_buf()?);

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .has_headers(true)
            .from_reader(buffered);

        let headers = unique_headers(
            csv_reader
                .headers()?
                .iter()
                .map(|h| h.trim_start_matches('\u{feff}').to_string()),
        );

        let mut chunk = Vec::with_capacity(self.chunk_size);
        let mut total = 0;
        let mut record = csv::StringRecord::new();

        while csv_reader.read_record(&mut record)? {
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            let mut row = Record::with_capacity(headers.len());
            for (index, header) in headers.iter().enumerate() {
                let cell = record.get(index).map(CellValue::infer).unwrap_or(CellValue::Null);
                row.insert(header.clone(), cell);
            }
            chunk.push(row);
            total += 1;

            if chunk.len() >= self.chunk_size {
                let progress = self.progress(csv_reader.position().byte());
                if !sink(std::mem::take(&mut chunk), progress) {
                    log::debug!("CSV decode stopped by consumer after {} rows", total);
                    return Ok(total);
                }
            }
        }

        if !chunk.is_empty() {
            sink(chunk, 100.0);
        }
        Ok(total)
    }
}

/// Repeated header names get a `_N` suffix ("Resource", "Resource_1") so
/// no column overwrites another in the row map
fn unique_headers(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut taken = HashSet::new();
    let mut headers = Vec::new();
    for header in raw {
        let mut name = header.clone();
        let mut suffix = 0;
        while taken.contains(&name) {
            suffix += 1;
            name = format!("{}_{}", header, suffix);
        }
        taken.insert(name.clone());
        headers.push(name);
    }
    headers
}

fn sniff_delimiter(head: &[u8]) -> u8 {
    let line = head.split(|b| *b == b'\n').next().unwrap_or(head);
    [b',', b';', b'\t']
        .into_iter()
        .map(|d| (d, line.iter().filter(|b| **b == d).count()))
        .filter(|(_, count)| *count > 0)
        // max_by_key keeps the last maximum; reverse so ',' wins ties
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

/// A JSON array of flat objects.
///
/// Strings, numbers and null map directly; booleans and nested values are
/// kept as their JSON text.
pub struct JsonDecoder<R> {
    reader: Option<R>,
    chunk_size: usize,
}

impl JsonDecoder<File> {
    pub fn open(path: &Path) -> Result<Self, DecodeError> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read + Send> JsonDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl<R: Read + Send> RecordDecoder for JsonDecoder<R> {
    fn decode(&mut self, sink: &mut ChunkSink<'_>) -> Result<usize, DecodeError> {
        let Some(reader) = self.reader.take() else {
            return Ok(0);
        };
        let value: serde_json::Value = serde_json::from_reader(BufReader::new(reader))?;
        let serde_json::Value::Array(items) = value else {
            return Err(DecodeError::JsonShape("top level is not an array".to_string()));
        };

        let mut rows = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let serde_json::Value::Object(fields) = item else {
                return Err(DecodeError::JsonShape(format!("element {} is not an object", index)));
            };
            let row: Record = fields.into_iter().map(|(k, v)| (k, json_cell(v))).collect();
            rows.push(row);
        }

        let total = rows.len();
        let mut processed = 0;
        let mut remaining = rows.into_iter().peekable();
        while remaining.peek().is_some() {
            let chunk: Vec<Record> = remaining.by_ref().take(self.chunk_size).collect();
            processed += chunk.len();
            let progress = (processed as f32 / total as f32) * 100.0;
            if !sink(chunk, progress.min(100.0)) {
                return Ok(processed);
            }
        }
        Ok(total)
    }
}

fn json_cell(value: serde_json::Value) -> CellValue {
    use serde_json::Value;
    match value {
        Value::Null => CellValue::Null,
        Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or(CellValue::Null),
        Value::String(s) => CellValue::Text(s),
        other => CellValue::Text(other.to_string()),
    }
}
