//! The [`Context`] is an immutable container to carry operation scoped values.
//!
//! Contexts are organised into a tree structure:
//!
//! - A root context represents the general process wide scope.
//! - Derived contexts represent a narrower scope within their parent with
//!   additional or updated information attached to them.
//!
//! A [`Context`] provides access to the current [`Logger`], the identity of
//! this orchestrator process within the fleet of peers and the [`Clock`] used
//! for every time sensitive decision (recovery cooldowns, dedup expiry).
use slog::Logger;
use slog::OwnedKV;
use slog::SendSyncRefUnwindSafeKV;

use replimend_models::NodeIdentity;

mod clock;

pub use self::clock::Clock;
pub use self::clock::ClockBackend;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::clock::ClockFixture;

/// Immutable container to carry operation scoped values.
///
/// Refer to the [crate level docs](crate) for details.
#[derive(Clone, Debug)]
pub struct Context {
    /// Logger with contextual attributes attached to it.
    pub logger: Logger,

    /// Identity of this orchestrator process.
    pub node: NodeIdentity,

    /// Source of the current time for this process.
    pub clock: Clock,
}

impl Context {
    /// Derive a new [`Context`] by making changes to the current one.
    pub fn derive(&self) -> ContextBuilder {
        ContextBuilder {
            logger: self.logger.clone(),
            node: self.node.clone(),
            clock: self.clock.clone(),
        }
    }

    /// Derive a new [`Context`] using the provided callback.
    pub fn derive_with<F>(&self, callback: F) -> Context
    where
        F: FnOnce(ContextBuilder) -> ContextBuilder,
    {
        let builder = callback(self.derive());
        builder.build()
    }

    /// Initialise a new root context for this process.
    pub fn root(logger: Logger, node: NodeIdentity) -> ContextBuilder {
        ContextBuilder {
            logger,
            node,
            clock: Clock::system(),
        }
    }
}

/// A builder for root and derived contexts.
pub struct ContextBuilder {
    logger: Logger,
    node: NodeIdentity,
    clock: Clock,
}

impl ContextBuilder {
    /// Finalise the build process and return a new [`Context`].
    pub fn build(self) -> Context {
        Context {
            logger: self.logger,
            node: self.node,
            clock: self.clock,
        }
    }

    /// Update the [`Context`] logger to attach new log key/pair values.
    pub fn log_values<T>(mut self, entries: OwnedKV<T>) -> Self
    where
        T: SendSyncRefUnwindSafeKV + 'static,
    {
        self.logger = self.logger.new(entries);
        self
    }

    /// Replace the clock the derived [`Context`] will carry.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

#[cfg(any(test, feature = "test-fixture"))]
impl Context {
    /// Create an empty context useful for tests.
    pub fn fixture() -> Context {
        let logger = Logger::root(slog::Discard, slog::o!());
        Context {
            logger,
            node: NodeIdentity::new("unit-tests.local"),
            clock: Clock::system(),
        }
    }

    /// Create an empty context driven by the given clock.
    pub fn fixture_with_clock(clock: Clock) -> Context {
        let mut context = Context::fixture();
        context.clock = clock;
        context
    }
}

#[cfg(test)]
mod tests {
    use super::Context;

    #[test]
    fn derive_log_attributes() {
        let root = Context::fixture();
        let parent = root
            .derive()
            .log_values(slog::o!("root" => "value", "test" => "root"))
            .build();
        let context = parent
            .derive()
            .log_values(slog::o!("test" => "override"))
            .build();
        assert_eq!(format!("{:?}", context.logger.list()), "(test, test, root)");
    }

    #[test]
    fn derive_keeps_node_identity() {
        let parent = Context::fixture();
        let context = parent.derive().build();
        assert_eq!(parent.node, context.node);
    }
}
