//! Operation logging macros
//!
//! Every operation boundary emits exactly one start event and one end (or
//! end_error) event. Callers must have `cfgdrift-core-types` and `tracing`
//! as dependencies.

/// Shared body of the `log_op_*` macros; stamps `component`, `op` and `event`
#[doc(hidden)]
#[macro_export]
macro_rules! __log_op_event {
    ($level:expr, $event:expr, $op:expr) => {
        tracing::event!(
            $level,
            component = module_path!(),
            op = $op,
            event = $event,
        )
    };
    ($level:expr, $event:expr, $op:expr, $($field:tt)+) => {
        tracing::event!(
            $level,
            component = module_path!(),
            op = $op,
            event = $event,
            $($field)+
        )
    };
}

/// Log the start of an operation
///
/// ```
/// # use cfgdrift_core::log_op_start;
/// log_op_start!("parse");
/// log_op_start!("parse", vendor = "junos", bytes = 5120);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)+)?) => {
        $crate::__log_op_event!(
            tracing::Level::INFO,
            cfgdrift_core_types::schema::EVENT_START,
            $op
            $(, $($field)+)?
        )
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use cfgdrift_core::log_op_end;
/// log_op_end!("diff", duration_ms = 3);
/// log_op_end!("diff", duration_ms = 3, entry_count = 12);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {
        $crate::__log_op_event!(
            tracing::Level::INFO,
            cfgdrift_core_types::schema::EVENT_END,
            $op,
            duration_ms = $duration
            $(, $($field)+)?
        )
    };
}

/// Log a failed operation with its stable error kind and code.
/// `err` is anything convertible into `ExError`.
///
/// ```
/// # use cfgdrift_core::log_op_error;
/// # use cfgdrift_core::errors::DriftError;
/// # use cfgdrift_core::model::VendorTag;
/// let err = DriftError::UnknownVendor { vendor: VendorTag::Meraki };
/// log_op_error!("parse", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__log_op_event!(
            tracing::Level::ERROR,
            cfgdrift_core_types::schema::EVENT_END_ERROR,
            $op,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code()
            $(, $($field)+)?
        )
    }};
}
