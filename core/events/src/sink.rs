//! Interfaces to emit audit events to an operator facing sink.
use std::sync::Arc;

use anyhow::Result;

use replimend_context::Context;

use super::Event;

/// Emit audit events to the backing sink.
#[derive(Clone)]
pub struct Audit(Arc<dyn AuditBackend>);

impl Audit {
    /// Emit an auditing event.
    pub async fn audit(&self, context: &Context, event: Event) -> Result<()> {
        self.0.audit(context, event).await
    }
}

impl<T> From<T> for Audit
where
    T: AuditBackend + 'static,
{
    fn from(value: T) -> Self {
        Audit(Arc::new(value))
    }
}

/// Operations implemented by audit sinks supported by the recovery core.
#[async_trait::async_trait]
pub trait AuditBackend: Send + Sync {
    /// Emit an auditing event.
    async fn audit(&self, context: &Context, event: Event) -> Result<()>;
}

#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::{AuditFixture, AuditFixtureBackend};

#[cfg(any(test, feature = "test-fixture"))]
mod fixture {
    use std::time::Duration;

    use anyhow::Result;
    use tokio::sync::broadcast;
    use tokio::sync::broadcast::Receiver;
    use tokio::sync::broadcast::Sender;

    use replimend_context::Context;

    use super::Audit;
    use super::AuditBackend;
    use super::Event;

    /// Introspection tools for audit events emitted during unit tests.
    pub struct AuditFixture {
        events: Receiver<Event>,
        send: Sender<Event>,
    }

    impl Clone for AuditFixture {
        fn clone(&self) -> Self {
            Self {
                events: self.send.subscribe(),
                send: self.send.clone(),
            }
        }
    }

    impl AuditFixture {
        pub fn new() -> AuditFixture {
            let (send, events) = broadcast::channel(50);
            AuditFixture { events, send }
        }

        /// Create an [`Audit`] sink that will send events to this fixture.
        pub fn audit(&self) -> Audit {
            Audit::from(self.backend())
        }

        /// Create a backend that will send events to this fixture.
        pub fn backend(&self) -> AuditFixtureBackend {
            AuditFixtureBackend {
                send: self.send.clone(),
            }
        }

        /// Fetch the next [`Event`] emitted onto the audit stream.
        pub async fn pop(&mut self) -> Result<Event> {
            let event = self.events.recv().await?;
            Ok(event)
        }

        /// Fetch the next [`Event`] emitted onto the audit stream, with a timeout.
        pub async fn pop_timeout(&mut self, timeout: Duration) -> Result<Event> {
            let event = tokio::time::timeout(timeout, self.pop()).await?;
            event
        }
    }

    impl Default for AuditFixture {
        fn default() -> Self {
            AuditFixture::new()
        }
    }

    /// Audit backend for unit tests.
    pub struct AuditFixtureBackend {
        send: Sender<Event>,
    }

    #[async_trait::async_trait]
    impl AuditBackend for AuditFixtureBackend {
        async fn audit(&self, _: &Context, event: Event) -> Result<()> {
            self.send.send(event)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use replimend_context::Context;

    use super::AuditFixture;
    use super::Event;

    #[tokio::test]
    async fn events_reach_the_fixture() {
        let context = Context::fixture();
        let mut fixture = AuditFixture::new();
        let audit = fixture.audit();
        audit
            .audit(&context, Event::new("TEST"))
            .await
            .expect("event to be emitted");
        let event = fixture
            .pop_timeout(Duration::from_secs(1))
            .await
            .expect("event to be received");
        assert_eq!(event.code, "TEST");
    }
}
