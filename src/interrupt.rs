//! Cooperative cancellation between provisioning steps.
//!
//! A SIGINT only raises a flag; the orchestrator checks it before starting
//! each step, so an in-flight provider call always completes.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::warn;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static HANDLER: OnceLock<()> = OnceLock::new();

/// Shared cancellation flag handed to the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    local: Arc<AtomicBool>,
    watch_process: bool,
}

impl CancelFlag {
    /// A flag that ignores SIGINT; tests raise it by hand.
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// A flag that is also raised by SIGINT once the handler is installed.
    pub fn for_process() -> Self {
        install_sigint_handler();
        Self {
            local: Arc::new(AtomicBool::new(false)),
            watch_process: true,
        }
    }

    #[cfg(test)]
    pub fn cancel(&self) {
        self.local.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.local.load(Ordering::SeqCst)
            || (self.watch_process && INTERRUPTED.load(Ordering::SeqCst))
    }
}

fn install_sigint_handler() {
    HANDLER.get_or_init(|| {
        if let Err(err) = ctrlc::set_handler(|| INTERRUPTED.store(true, Ordering::SeqCst)) {
            warn!(error = %err, "SIGINT handler not installed; cancellation disabled");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_visible_through_clones() {
        let flag = CancelFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_cancelled());
        flag.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn process_flags_can_be_created_repeatedly() {
        let first = CancelFlag::for_process();
        let second = CancelFlag::for_process();
        assert!(HANDLER.get().is_some());
        assert!(!first.is_cancelled());
        assert!(!second.is_cancelled());
    }
}
