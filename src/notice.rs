//! User-visible notices produced in-band by the pipeline.
//!
//! Remote failures never propagate as `Err`; each adapter returns its
//! fallback value together with a [`Notice`] that the session keeps for
//! display next to the results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A message shown to the user alongside the session view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

/// The value produced by a pipeline stage plus an optional notice.
///
/// `value` is always usable: on failure it holds the stage's fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput<T> {
    pub value: T,
    pub notice: Option<Notice>,
    /// `true` when the value came from the session cache.
    pub cached: bool,
}

impl<T> StageOutput<T> {
    pub(crate) fn fresh(value: T) -> Self {
        Self {
            value,
            notice: None,
            cached: false,
        }
    }

    pub(crate) fn cached(value: T) -> Self {
        Self {
            value,
            notice: None,
            cached: true,
        }
    }

    pub(crate) fn fallback(value: T, notice: Notice) -> Self {
        Self {
            value,
            notice: Some(notice),
            cached: false,
        }
    }

    /// `true` when the stage reported a warning or error.
    pub fn failed(&self) -> bool {
        matches!(
            self.notice.as_ref().map(|n| n.level),
            Some(NoticeLevel::Warning | NoticeLevel::Error)
        )
    }
}
