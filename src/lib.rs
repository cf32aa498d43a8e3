//! Batch client for the Addis AI text-to-speech and speech-to-text endpoints.
//!
//! The library is split the same way the binary uses it: `domain` holds the
//! result records, the history store and the batch submission loop, while
//! `infrastructure` holds everything that talks to the outside world (the
//! versioned HTTP backends, key-value persistence, spreadsheet import and
//! archive export).

pub mod domain;
pub mod error;
pub mod infrastructure;
