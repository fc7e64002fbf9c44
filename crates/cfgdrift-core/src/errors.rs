use cfgdrift_core_types::{RequestId, TraceId};
use thiserror::Error;

use crate::model::{ConfigPath, VendorTag};

/// Result type alias using DriftError
pub type Result<T> = std::result::Result<T, DriftError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every kind maps to a stable error code used in batch reports, CLI output
/// and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExErrorKind {
    // Parsing
    ParseError,
    UnknownVendor,

    // Comparison
    IncompatibleTrees,
    DepthExceeded,
    ListLimitExceeded,

    // Rollback
    UnsynthesizableChange,
    ApplyConflict,

    // Tables and configuration
    InvalidSchemaTable,
    InvalidConfig,

    // Integration/IO
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::ParseError => "ERR_PARSE",
            ExErrorKind::UnknownVendor => "ERR_UNKNOWN_VENDOR",
            ExErrorKind::IncompatibleTrees => "ERR_INCOMPATIBLE_TREES",
            ExErrorKind::DepthExceeded => "ERR_DEPTH_EXCEEDED",
            ExErrorKind::ListLimitExceeded => "ERR_LIST_LIMIT_EXCEEDED",
            ExErrorKind::UnsynthesizableChange => "ERR_UNSYNTHESIZABLE_CHANGE",
            ExErrorKind::ApplyConflict => "ERR_APPLY_CONFLICT",
            ExErrorKind::InvalidSchemaTable => "ERR_INVALID_SCHEMA_TABLE",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether a failure of this kind only affects the comparison that raised it
    ///
    /// Table and configuration errors poison every comparison that would use
    /// the same tables, so a batch driver stops on them.
    pub fn is_per_comparison(&self) -> bool {
        !matches!(
            self,
            ExErrorKind::InvalidSchemaTable | ExErrorKind::InvalidConfig
        )
    }
}

/// Canonical structured error type
///
/// Carries a kind plus the context needed to explain a failure in a batch
/// report without access to the original inputs.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    vendor: Option<VendorTag>,
    path: Option<ConfigPath>,
    offset: Option<usize>,
    device_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            vendor: None,
            path: None,
            offset: None,
            device_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add vendor context
    pub fn with_vendor(mut self, vendor: VendorTag) -> Self {
        self.vendor = Some(vendor);
        self
    }

    /// Add the config path the error refers to
    pub fn with_path(mut self, path: ConfigPath) -> Self {
        self.path = Some(path);
        self
    }

    /// Add a byte offset into the raw input
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Add device context
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add trace ID context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn vendor(&self) -> Option<VendorTag> {
        self.vendor
    }

    pub fn path(&self) -> Option<&ConfigPath> {
        self.path.as_ref()
    }

    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(device_id) = &self.device_id {
            write!(f, " (device: {})", device_id)?;
        }
        if let Some(vendor) = self.vendor {
            write!(f, " (vendor: {})", vendor)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        if let Some(offset) = self.offset {
            write!(f, " (offset: {})", offset)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for parsing, comparison and rollback synthesis
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriftError {
    /// Raw configuration could not be turned into a tree
    #[error("Parse error for {vendor} at byte {offset}: {reason}")]
    Parse {
        vendor: VendorTag,
        offset: usize,
        reason: String,
    },

    /// No parser is registered for the vendor
    #[error("No parser registered for vendor {vendor}")]
    UnknownVendor { vendor: VendorTag },

    /// The two trees handed to diff come from different vendors
    #[error("Cannot compare trees from different vendors: {before} vs {after}")]
    IncompatibleTrees { before: VendorTag, after: VendorTag },

    /// Nesting beyond the configured depth limit
    #[error("Nesting depth limit {limit} exceeded at {path}")]
    DepthExceeded { path: ConfigPath, limit: usize },

    /// An ordered list is too large to align within the configured limits
    #[error(
        "Ordered list at {path} exceeds alignment limit {limit} ({before_len} -> {after_len} elements)"
    )]
    ListLimitExceeded {
        path: ConfigPath,
        before_len: usize,
        after_len: usize,
        limit: usize,
    },

    /// No generic inverse exists for a delta entry
    #[error("Cannot synthesize rollback for {path}: {reason}")]
    Unsynthesizable { path: ConfigPath, reason: String },

    /// A rollback operation does not fit the tree it is applied to
    #[error("Cannot apply rollback operation at {path}: {reason}")]
    ApplyConflict { path: ConfigPath, reason: String },

    /// A vendor schema table or classification rule table is invalid
    #[error("Invalid table {table}: {reason}")]
    SchemaTable { table: String, reason: String },

    /// Limits or engine configuration are invalid
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Serialization failed
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl DriftError {
    /// Shorthand for schema table errors
    pub fn schema_table(table: impl Into<String>, reason: impl Into<String>) -> Self {
        DriftError::SchemaTable {
            table: table.into(),
            reason: reason.into(),
        }
    }
}

impl From<DriftError> for ExError {
    fn from(err: DriftError) -> Self {
        let message = err.to_string();
        match err {
            DriftError::Parse { vendor, offset, .. } => ExError::new(ExErrorKind::ParseError)
                .with_vendor(vendor)
                .with_offset(offset)
                .with_message(message),
            DriftError::UnknownVendor { vendor } => ExError::new(ExErrorKind::UnknownVendor)
                .with_vendor(vendor)
                .with_message(message),
            DriftError::IncompatibleTrees { before, .. } => {
                ExError::new(ExErrorKind::IncompatibleTrees)
                    .with_vendor(before)
                    .with_message(message)
            }
            DriftError::DepthExceeded { path, .. } => ExError::new(ExErrorKind::DepthExceeded)
                .with_path(path)
                .with_message(message),
            DriftError::ListLimitExceeded { path, .. } => {
                ExError::new(ExErrorKind::ListLimitExceeded)
                    .with_path(path)
                    .with_message(message)
            }
            DriftError::Unsynthesizable { path, .. } => {
                ExError::new(ExErrorKind::UnsynthesizableChange)
                    .with_path(path)
                    .with_message(message)
            }
            DriftError::ApplyConflict { path, .. } => ExError::new(ExErrorKind::ApplyConflict)
                .with_path(path)
                .with_message(message),
            DriftError::SchemaTable { .. } => {
                ExError::new(ExErrorKind::InvalidSchemaTable).with_message(message)
            }
            DriftError::InvalidConfig { .. } => {
                ExError::new(ExErrorKind::InvalidConfig).with_message(message)
            }
            DriftError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for DriftError {
    fn from(err: serde_json::Error) -> Self {
        DriftError::Serialization {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_carries_vendor_and_offset() {
        let err = DriftError::Parse {
            vendor: VendorTag::Junos,
            offset: 42,
            reason: "unbalanced '}'".to_string(),
        };
        let ex: ExError = err.into();
        assert_eq!(ex.kind(), ExErrorKind::ParseError);
        assert_eq!(ex.code(), "ERR_PARSE");
        assert_eq!(ex.vendor(), Some(VendorTag::Junos));
        assert_eq!(ex.offset(), Some(42));
        assert!(ex.message().contains("unbalanced"));
    }

    #[test]
    fn test_table_errors_are_not_per_comparison() {
        assert!(!ExErrorKind::InvalidSchemaTable.is_per_comparison());
        assert!(!ExErrorKind::InvalidConfig.is_per_comparison());
        assert!(ExErrorKind::ParseError.is_per_comparison());
        assert!(ExErrorKind::DepthExceeded.is_per_comparison());
    }

    #[test]
    fn test_display_includes_code_and_context() {
        let ex = ExError::new(ExErrorKind::DepthExceeded)
            .with_op("diff")
            .with_device_id("core-sw-2")
            .with_message("too deep");
        let text = ex.to_string();
        assert!(text.starts_with("[ERR_DEPTH_EXCEEDED]"));
        assert!(text.contains("'diff'"));
        assert!(text.contains("core-sw-2"));
    }
}
