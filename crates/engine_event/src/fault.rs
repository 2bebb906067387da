//! Listener fault containment.
//!
//! Bus handlers and delay callbacks are client code. A failing one must not
//! stop the dispatch it runs in, so both dispatch sites wrap every invocation
//! in [`contain`] and log what comes back. Nothing else in the engine catches
//! faults.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// A contained listener fault.
#[derive(Debug, thiserror::Error)]
pub enum Fault {
    /// The listener returned an error.
    #[error("listener failed: {0:#}")]
    Failed(anyhow::Error),

    /// The listener panicked.
    #[error("listener panicked: {0}")]
    Panicked(String),
}

/// Run a listener, converting an error return or a panic into a [`Fault`].
pub fn contain<F>(listener: F) -> Result<(), Fault>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(listener)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(Fault::Failed(err)),
        Err(payload) => Err(Fault::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_passes_through() {
        assert!(contain(|| Ok(())).is_ok());
    }

    #[test]
    fn test_error_is_contained() {
        let fault = contain(|| Err(anyhow::anyhow!("boom"))).unwrap_err();
        assert!(matches!(fault, Fault::Failed(_)));
        assert_eq!(fault.to_string(), "listener failed: boom");
    }

    #[test]
    fn test_panic_is_contained() {
        let fault = contain(|| panic!("kaput")).unwrap_err();
        match fault {
            Fault::Panicked(msg) => assert_eq!(msg, "kaput"),
            other => panic!("unexpected fault: {other}"),
        }
    }

    #[test]
    fn test_formatted_panic_message() {
        let code = 7;
        let fault = contain(|| panic!("code {code}")).unwrap_err();
        assert_eq!(fault.to_string(), "listener panicked: code 7");
    }
}
