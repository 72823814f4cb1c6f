//! OS signal handling.
//!
//! Ctrl-C cancels in-flight operations instead of killing the process, so a
//! pipeline stops at its next await point and reports `Cancelled`.

use crate::lifecycle::context::Cancellation;

/// Cancel `cancellation` when the process receives Ctrl-C.
pub fn cancel_on_ctrl_c(cancellation: Cancellation) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Interrupt received, cancelling in-flight operations");
                cancellation.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to install Ctrl-C handler"),
        }
    });
}
