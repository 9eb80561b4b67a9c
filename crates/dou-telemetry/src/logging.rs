//! Structured logging macros.
//!
//! Every event carries a `subsystem` field so that logs from the registry,
//! the spam gate and the ledger can be filtered apart:
//!
//! ```rust,ignore
//! log_event!(info, "registry", "Validator registered", stake = 150.0);
//! log_address_event!(debug, "spam_gate", "Message rejected", sender, reason = "blacklisted");
//! ```

/// Log an event with a `subsystem` field.
#[macro_export]
macro_rules! log_event {
    // Info level with subsystem
    (info, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Warn level with subsystem
    (warn, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Error level with subsystem
    (error, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Debug level with subsystem
    (debug, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log an address-scoped event (sender, validator) with standard fields.
#[macro_export]
macro_rules! log_address_event {
    ($level:ident, $subsystem:expr, $msg:expr, $address:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            address = %$address,
            $($($field)*,)?
            $msg
        )
    };
}
