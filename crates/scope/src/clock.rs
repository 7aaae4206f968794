#![forbid(unsafe_code)]

use std::time::Instant;

pub trait Clock: Send + Sync {
    /// Current monotonic time.
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[cfg(test)]
pub(crate) use manual::ManualClock;

#[cfg(test)]
mod manual {
    use super::Clock;
    use std::sync::{Mutex, MutexGuard};
    use std::time::{Duration, Instant};

    /// Clock that only moves when told to.
    #[derive(Debug)]
    pub(crate) struct ManualClock {
        now: Mutex<Instant>,
    }

    impl ManualClock {
        pub(crate) fn new() -> Self {
            Self {
                now: Mutex::new(Instant::now()),
            }
        }

        fn lock(&self) -> MutexGuard<'_, Instant> {
            match self.now.lock() {
                Ok(now) => now,
                Err(poisoned) => poisoned.into_inner(),
            }
        }

        pub(crate) fn advance(&self, by: Duration) {
            *self.lock() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.lock()
        }
    }
}
