//! Sensitive data marker for automatic redaction
//!
//! Device configurations carry secrets (enable secrets, SNMP communities,
//! pre-shared keys). Parsers wrap such values in `Sensitive<T>` so they can
//! only reach logs or serialized output in redacted form.

use serde::{Serialize, Serializer};
use std::fmt;

const REDACTED: &str = "***REDACTED***";

/// Wrapper for sensitive data that redacts itself in Debug, Display and Serialize
///
/// # Example
///
/// ```
/// use cfgdrift_core_types::Sensitive;
///
/// let secret = Sensitive::new("5 $1$mERr$hx5rVt7rPNoS4wqbXKX7m0");
/// assert_eq!(format!("{:?}", secret), "***REDACTED***");
/// assert_eq!(format!("{}", secret), "***REDACTED***");
/// assert!(secret.expose().starts_with("5 "));
/// ```
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    /// Wrap a sensitive value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying value
    ///
    /// Only fingerprinting code should need this.
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }

    /// Transform the wrapped value without unwrapping it
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sensitive<U> {
        Sensitive(f(self.0))
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> Serialize for Sensitive<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl<T: Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
