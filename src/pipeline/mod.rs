//! Pipeline stages for spreadsheet-to-PDF conversion.
//!
//! Each submodule implements exactly one stage. Keeping stages separate
//! makes each independently testable against a mock
//! [`crate::remote::DocumentService`] and keeps the retry machinery out of
//! the thin listing code.
//!
//! ## Data Flow
//!
//! ```text
//! list ──▶ { mirror ∥ tabs } ──▶ export
//! (documents) (folder + sheet tabs)  (retry-until-valid per tab)
//! ```
//!
//! 1. [`list`]   — enumerate the source folder's spreadsheets; failure here
//!    is fatal, there is nothing to convert
//! 2. [`mirror`] — one output folder per document under the destination root
//! 3. [`tabs`]   — project each document's sheet tabs (title + numeric id)
//! 4. [`export`] — the retry state machine: export, upload, size-validate,
//!    delete runts, bounded retries; the only stage touching the rate limiter

pub mod export;
pub mod list;
pub mod mirror;
pub mod tabs;
