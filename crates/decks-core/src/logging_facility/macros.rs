//! Canonical logging macros

/// Log the start of an operation
///
/// ```
/// # use decks_core::log_op_start;
/// log_op_start!("decks.create");
/// log_op_start!("decks.get", deck_id = "d1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        $crate::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        $crate::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use decks_core::log_op_end;
/// log_op_end!("decks.create", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        $crate::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        $crate::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// Anything convertible into `ExError` is accepted; the stable code is
/// recorded as `err_code`.
///
/// ```
/// # use decks_core::{log_op_error, errors::DecksError};
/// let err = DecksError::DeckNotFound { deck_id: "d1".to_string() };
/// log_op_error!("decks.get", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::__types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_message = %ex_err,
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::__types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_message = %ex_err,
            $($field)*
        );
    }};
}
