//! Pipeline stages for turning scans into articles.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ encode ──▶ llm (vision) ──▶ postprocess ──▶ llm (rewrite) ──▶ postprocess
//! (bytes)    (base64)   (raw text)        (cleanup)       (style)           (cleanup)
//! ```
//!
//! 1. [`encode`]: sniff PNG/JPEG and base64-wrap the scan for the API body
//! 2. [`llm`]: the [`llm::LanguageModel`] seam; the only network I/O
//! 3. [`postprocess`]: deterministic cleanup of model replies
//!
//! The memoized stage adapters built on top of these live in
//! [`crate::assistant`].

pub mod encode;
pub mod llm;
pub mod postprocess;
