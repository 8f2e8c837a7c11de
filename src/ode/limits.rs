//! Cancellation and time limits of the potentially unbounded stages (root finding and
//! integration).
use crate::ode::vop_error::VopError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Clone, Debug, Default)]
pub struct SolverLimits {
    pub timeout: Option<Duration>,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl SolverLimits {
    pub fn unlimited() -> SolverLimits {
        SolverLimits::default()
    }

    pub fn with_timeout(timeout: Duration) -> SolverLimits {
        SolverLimits {
            timeout: Some(timeout),
            cancel: None,
        }
    }

    /// shares `flag`; storing true from any thread stops the running stage at its next check
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> SolverLimits {
        self.cancel = Some(flag);
        self
    }

    /// starts the clock of one stage
    pub fn start(&self) -> LimitGuard<'_> {
        LimitGuard {
            limits: self,
            started: Instant::now(),
        }
    }
}

/// clock of a running stage
pub struct LimitGuard<'a> {
    limits: &'a SolverLimits,
    started: Instant,
}

impl LimitGuard<'_> {
    pub fn check(&self) -> Result<(), VopError> {
        if let Some(flag) = &self.limits.cancel {
            if flag.load(Ordering::Relaxed) {
                return Err(VopError::Cancelled);
            }
        }
        if let Some(timeout) = self.limits.timeout {
            if self.started.elapsed() > timeout {
                return Err(VopError::TimedOut(timeout.as_millis()));
            }
        }
        Ok(())
    }

    /// true when the stage must stop; used as the interrupt callback of the symbolic routines
    pub fn interrupted(&self) -> bool {
        self.check().is_err()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_never_interrupts() {
        let limits = SolverLimits::unlimited();
        assert!(limits.start().check().is_ok());
    }

    #[test]
    fn test_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let limits = SolverLimits::unlimited().with_cancel_flag(flag.clone());
        let guard = limits.start();
        assert!(!guard.interrupted());
        flag.store(true, Ordering::Relaxed);
        assert_eq!(guard.check(), Err(VopError::Cancelled));
    }

    #[test]
    fn test_timeout() {
        let limits = SolverLimits::with_timeout(Duration::from_millis(0));
        let guard = limits.start();
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(guard.check(), Err(VopError::TimedOut(0)));
    }
}
