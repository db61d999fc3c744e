//! Source of the current time for time sensitive decisions.
use std::fmt;
use std::sync::Arc;

use time::OffsetDateTime;

/// Read the current time from a runtime configured backend.
///
/// Recovery cooldown windows and emergent read expiry all measure time
/// through the context clock so tests can drive them deterministically.
#[derive(Clone)]
pub struct Clock(Arc<dyn ClockBackend>);

impl Clock {
    /// The current time in the UTC timezone.
    pub fn now_utc(&self) -> OffsetDateTime {
        self.0.now_utc()
    }

    /// A clock reading the system time.
    pub fn system() -> Clock {
        Clock(Arc::new(SystemClock))
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Clock").finish_non_exhaustive()
    }
}

impl<T> From<T> for Clock
where
    T: ClockBackend + 'static,
{
    fn from(value: T) -> Self {
        Clock(Arc::new(value))
    }
}

/// Operations implemented by time sources supported by the process.
pub trait ClockBackend: Send + Sync {
    /// The current time in the UTC timezone.
    fn now_utc(&self) -> OffsetDateTime;
}

/// Default backend reading the system time.
struct SystemClock;

impl ClockBackend for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::ClockFixture;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture {
    use std::sync::Arc;
    use std::sync::Mutex;

    use time::Duration;
    use time::OffsetDateTime;

    use super::Clock;
    use super::ClockBackend;

    /// Manually driven clock for unit tests.
    #[derive(Clone)]
    pub struct ClockFixture {
        now: Arc<Mutex<OffsetDateTime>>,
    }

    impl ClockFixture {
        pub fn new() -> ClockFixture {
            ClockFixture {
                now: Arc::new(Mutex::new(OffsetDateTime::UNIX_EPOCH)),
            }
        }

        /// Create a [`Clock`] reading time from this fixture.
        pub fn clock(&self) -> Clock {
            Clock::from(self.clone())
        }

        /// Move the fixture time forward.
        pub fn advance(&self, by: Duration) {
            let mut now = self.now.lock().expect("clock fixture lock poisoned");
            *now += by;
        }

        /// Set the fixture time to a specific instant.
        pub fn set(&self, to: OffsetDateTime) {
            let mut now = self.now.lock().expect("clock fixture lock poisoned");
            *now = to;
        }
    }

    impl Default for ClockFixture {
        fn default() -> Self {
            ClockFixture::new()
        }
    }

    impl ClockBackend for ClockFixture {
        fn now_utc(&self) -> OffsetDateTime {
            let now = self.now.lock().expect("clock fixture lock poisoned");
            *now
        }
    }
}
