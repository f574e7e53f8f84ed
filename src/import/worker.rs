//! Background import worker
//!
//! Decoding runs on its own thread and streams [`DecodeMessage`]s over an
//! mpsc channel. The [`ImportHandle`] on the session side accumulates chunks
//! in receipt order and settles exactly once: on `Done`, on `Failed`, on
//! cancellation, or when the watchdog sees no message within the timeout.
//! After it has settled, late messages and repeated cancels are ignored.

use crate::import::decoder::RecordDecoder;
use crate::models::{MappingError, Record};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Messages sent from the decoder thread to the session
#[derive(Debug)]
pub enum DecodeMessage {
    Chunk { rows: Vec<Record>, progress: f32 },
    Done { total_rows: usize },
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("import failed: {0}")]
    Decode(String),
    #[error("import timed out after {0:?} without data")]
    TimedOut(Duration),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error("import cancelled")]
    Cancelled,
    #[error("import worker stopped unexpectedly")]
    WorkerLost,
    #[error("failed to start import worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// How an import settled
#[derive(Debug)]
pub enum ImportOutcome {
    /// All rows received so far. `partial` is set when the watchdog cut the
    /// stream short.
    Completed { rows: Vec<Record>, partial: bool },
    Failed(ImportError),
    Cancelled,
}

pub struct ImportHandle {
    rx: Receiver<DecodeMessage>,
    cancel: Arc<AtomicBool>,
    completed: bool,
    rows: Vec<Record>,
    progress: f32,
    timeout: Duration,
    last_activity: Instant,
    worker: Option<JoinHandle<()>>,
}

impl ImportHandle {
    /// Start decoding on a worker thread
    pub fn spawn(mut decoder: Box<dyn RecordDecoder>, timeout: Duration) -> Result<Self, ImportError> {
        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = Arc::clone(&cancel);

        let worker = thread::Builder::new()
            .name("gantt-import".to_string())
            .spawn(move || {
                let mut sink = |rows: Vec<Record>, progress: f32| {
                    if worker_cancel.load(Ordering::SeqCst) {
                        return false;
                    }
                    tx.send(DecodeMessage::Chunk { rows, progress }).is_ok()
                };
                let result = decoder.decode(&mut sink);
                if worker_cancel.load(Ordering::SeqCst) {
                    return;
                }
                let message = match result {
                    Ok(total_rows) => DecodeMessage::Done { total_rows },
                    Err(e) => DecodeMessage::Failed(e.to_string()),
                };
                // The receiver may already be gone
                let _ = tx.send(message);
            })
            .map_err(ImportError::Spawn)?;

        Ok(Self {
            rx,
            cancel,
            completed: false,
            rows: Vec::new(),
            progress: 0.0,
            timeout,
            last_activity: Instant::now(),
            worker: Some(worker),
        })
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Last reported progress, 0-100
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn rows_received(&self) -> usize {
        self.rows.len()
    }

    /// Non-blocking: drain pending messages and check the watchdog.
    /// Returns the outcome once, when the import settles.
    pub fn poll(&mut self) -> Option<ImportOutcome> {
        if self.completed {
            return None;
        }
        loop {
            match self.rx.try_recv() {
                Ok(message) => {
                    if let Some(outcome) = self.handle_message(message) {
                        return Some(outcome);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Some(self.finish(ImportOutcome::Failed(ImportError::WorkerLost)));
                }
            }
        }
        if self.last_activity.elapsed() >= self.timeout {
            return Some(self.stalled());
        }
        None
    }

    /// Block until the import settles
    pub fn wait(mut self) -> ImportOutcome {
        if self.completed {
            return ImportOutcome::Cancelled;
        }
        loop {
            let remaining = self.timeout.saturating_sub(self.last_activity.elapsed());
            match self.rx.recv_timeout(remaining) {
                Ok(message) => {
                    if let Some(outcome) = self.handle_message(message) {
                        return outcome;
                    }
                }
                Err(RecvTimeoutError::Timeout) => return self.stalled(),
                Err(RecvTimeoutError::Disconnected) => {
                    return self.finish(ImportOutcome::Failed(ImportError::WorkerLost));
                }
            }
        }
    }

    /// Stop the import. Returns `false` when it had already settled.
    pub fn cancel(&mut self) -> bool {
        if self.completed {
            return false;
        }
        log::info!("import cancelled after {} rows", self.rows.len());
        self.finish(ImportOutcome::Cancelled);
        true
    }

    fn handle_message(&mut self, message: DecodeMessage) -> Option<ImportOutcome> {
        if self.completed {
            return None;
        }
        self.last_activity = Instant::now();
        match message {
            DecodeMessage::Chunk { mut rows, progress } => {
                log::debug!("received chunk of {} rows ({:.0}%)", rows.len(), progress);
                self.rows.append(&mut rows);
                self.progress = progress;
                None
            }
            DecodeMessage::Done { total_rows } => {
                log::info!("import finished: {} rows decoded", total_rows);
                self.progress = 100.0;
                let rows = std::mem::take(&mut self.rows);
                Some(self.finish(ImportOutcome::Completed { rows, partial: false }))
            }
            DecodeMessage::Failed(message) => {
                log::warn!("import failed: {}", message);
                Some(self.finish(ImportOutcome::Failed(ImportError::Decode(message))))
            }
        }
    }

    fn stalled(&mut self) -> ImportOutcome {
        if self.rows.is_empty() {
            log::warn!("import stalled after {:?} with no rows", self.timeout);
            self.finish(ImportOutcome::Failed(ImportError::TimedOut(self.timeout)))
        } else {
            log::warn!("import stalled after {:?}; keeping {} rows", self.timeout, self.rows.len());
            let rows = std::mem::take(&mut self.rows);
            self.finish(ImportOutcome::Completed { rows, partial: true })
        }
    }

    fn finish(&mut self, outcome: ImportOutcome) -> ImportOutcome {
        self.completed = true;
        self.cancel.store(true, Ordering::SeqCst);
        // A finished worker can be reaped; a stalled one is left to observe the flag
        if let Some(worker) = self.worker.take() {
            if worker.is_finished() {
                let _ = worker.join();
            } else {
                self.worker = Some(worker);
            }
        }
        outcome
    }
}

impl Drop for ImportHandle {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::decoder::{ChunkSink, DecodeError};
    use crate::models::CellValue;

    /// Emits the given chunks, pausing `pause` before each one
    struct ScriptedDecoder {
        chunks: Vec<usize>,
        pause: Duration,
        fail: bool,
    }

    impl RecordDecoder for ScriptedDecoder {
        fn decode(&mut self, sink: &mut ChunkSink<'_>) -> Result<usize, DecodeError> {
            let mut total = 0;
            for size in self.chunks.drain(..) {
                thread::sleep(self.pause);
                let rows = (0..size)
                    .map(|i| {
                        let mut row = Record::new();
                        row.insert("n".to_string(), CellValue::Number((total + i) as f64));
                        row
                    })
                    .collect();
                total += size;
                if !sink(rows, 50.0) {
                    return Ok(total);
                }
            }
            if self.fail {
                return Err(DecodeError::UnsupportedFormat("broken".to_string()));
            }
            Ok(total)
        }
    }

    fn scripted(chunks: Vec<usize>, pause_ms: u64) -> Box<dyn RecordDecoder> {
        Box::new(ScriptedDecoder { chunks, pause: Duration::from_millis(pause_ms), fail: false })
    }

    #[test]
    fn test_chunks_accumulate_in_order() {
        let handle = ImportHandle::spawn(scripted(vec![2, 3], 0), Duration::from_secs(5)).unwrap();
        match handle.wait() {
            ImportOutcome::Completed { rows, partial } => {
                assert!(!partial);
                let ns: Vec<_> = rows.iter().map(|r| r["n"].clone()).collect();
                let expected: Vec<_> = (0..5).map(|n| CellValue::Number(n as f64)).collect();
                assert_eq!(ns, expected);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_failure_is_reported() {
        let decoder = Box::new(ScriptedDecoder { chunks: vec![1], pause: Duration::ZERO, fail: true });
        let handle = ImportHandle::spawn(decoder, Duration::from_secs(5)).unwrap();
        assert!(matches!(handle.wait(), ImportOutcome::Failed(ImportError::Decode(_))));
    }

    #[test]
    fn test_stall_without_rows_times_out() {
        let handle = ImportHandle::spawn(scripted(vec![4, 4], 300), Duration::from_millis(100)).unwrap();
        // First chunk arrives after 300ms, past the timeout
        assert!(matches!(handle.wait(), ImportOutcome::Failed(ImportError::TimedOut(_))));
    }

    #[test]
    fn test_stall_after_first_chunk() {
        let decoder = Box::new(ScriptedDecoder {
            chunks: vec![3, 3],
            pause: Duration::from_millis(0),
            fail: false,
        });
        // Wrap so the second chunk is delayed well past the timeout
        struct SlowSecond(Box<dyn RecordDecoder>);
        impl RecordDecoder for SlowSecond {
            fn decode(&mut self, sink: &mut ChunkSink<'_>) -> Result<usize, DecodeError> {
                let mut first = true;
                self.0.decode(&mut |rows, progress| {
                    if !first {
                        thread::sleep(Duration::from_millis(400));
                    }
                    first = false;
                    sink(rows, progress)
                })
            }
        }
        let handle = ImportHandle::spawn(Box::new(SlowSecond(decoder)), Duration::from_millis(100)).unwrap();
        match handle.wait() {
            ImportOutcome::Completed { rows, partial } => {
                assert!(partial);
                assert_eq!(rows.len(), 3);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut handle = ImportHandle::spawn(scripted(vec![1, 1, 1], 50), Duration::from_secs(5)).unwrap();
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(handle.is_completed());

        // Late messages are ignored once settled
        thread::sleep(Duration::from_millis(200));
        assert!(handle.poll().is_none());
        assert_eq!(handle.rows_received(), 0);
        assert!(matches!(handle.wait(), ImportOutcome::Cancelled));
    }

    #[test]
    fn test_poll_settles_once() {
        let mut handle = ImportHandle::spawn(scripted(vec![2], 0), Duration::from_secs(5)).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        let outcome = loop {
            if let Some(outcome) = handle.poll() {
                break outcome;
            }
            assert!(Instant::now() < deadline, "import never settled");
            thread::sleep(Duration::from_millis(5));
        };
        assert!(matches!(outcome, ImportOutcome::Completed { partial: false, .. }));
        assert!(handle.poll().is_none());
        assert!(!handle.cancel());
    }
}
