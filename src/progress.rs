//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::AssistantConfigBuilder::progress_callback`] to receive
//! events as the workflow processes each uploaded image.
//!
//! # Example
//!
//! ```rust
//! use archive_assistant::{AssistantConfig, BatchProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, name: &str, text_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{index}/{total} {name}: {text_len} bytes");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = AssistantConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch workflow as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Indices are 1-based.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first file is read.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before a file is sent for extraction.
    fn on_file_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when both extraction and transform produced text.
    ///
    /// `text_len` is the byte length of the processed text.
    fn on_file_complete(&self, index: usize, total: usize, name: &str, text_len: usize) {
        let _ = (index, total, name, text_len);
    }

    /// Called when extraction or transform reported a problem for a file.
    ///
    /// The batch continues; `error` is the notice text shown to the user.
    fn on_file_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let _ = (index, total, name, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AssistantConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
