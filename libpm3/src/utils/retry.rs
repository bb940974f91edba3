//! Bounded sequential retry.

use log::debug;

use crate::{Error, Result};

/// Number of attempts used by card operations unless told otherwise.
pub const DEFAULT_RETRY_ATTEMPTS: usize = 3;

/// Retry policy for single-unit card operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Default: 3.
    pub attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// Run `op` according to this policy.
    pub fn run<T>(&self, op: impl FnMut() -> Result<T>) -> Result<T> {
        retry(self.attempts, op)
    }
}

/// Run `op` up to `attempts` times, one after another.
///
/// Only the last failure is kept; it is returned wrapped in
/// [`Error::Retried`]. Errors that cannot improve on a second attempt
/// (see [`Error::is_retryable`]) are returned as-is right away.
pub fn retry<T>(attempts: usize, mut op: impl FnMut() -> Result<T>) -> Result<T> {
    if attempts < 1 {
        return Err(Error::InvalidArgument(format!(
            "retry attempts must be at least 1, got {}",
            attempts
        )));
    }
    let mut last = None;
    for attempt in 1..=attempts {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                debug!("attempt {}/{} failed: {}", attempt, attempts, e);
                last = Some(e);
            }
        }
    }
    match last {
        Some(source) => Err(Error::Retried {
            attempts,
            source: Box::new(source),
        }),
        None => Err(Error::InvalidArgument("retry ran no attempts".into())),
    }
}
