// Error classification for consistent messages and exit codes
//
// User errors (bad input files, unknown ids, invalid ranges) exit with 1.
// Internal errors (settings storage failures, a lost worker thread) exit
// with 2 and print the cause chain.

use crate::import::worker::ImportError;
use crate::repo::settings::SettingsError;

pub const EXIT_USER: i32 = 1;
pub const EXIT_INTERNAL: i32 = 2;

/// True when any error in the chain is a storage or runtime failure rather
/// than a problem with the user's input
pub fn is_internal_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if cause.is::<rusqlite::Error>() {
            return true;
        }
        if let Some(settings) = cause.downcast_ref::<SettingsError>() {
            return matches!(settings, SettingsError::Storage(_));
        }
        if let Some(import) = cause.downcast_ref::<ImportError>() {
            return matches!(import, ImportError::WorkerLost | ImportError::Spawn(_));
        }
        false
    })
}

pub fn exit_code(err: &anyhow::Error) -> i32 {
    if is_internal_error(err) {
        EXIT_INTERNAL
    } else {
        EXIT_USER
    }
}
