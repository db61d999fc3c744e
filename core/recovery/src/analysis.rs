//! Interface to the replication analyzer.
use std::sync::Arc;

use anyhow::Result;

use replimend_context::Context;
use replimend_models::AnalysisEntry;

/// Fetch replication failure findings from the analyzer.
///
/// The recovery core performs no probing of its own: the analyzer backend
/// owns the periodic scan of the fleet and derives verdicts from raw
/// per-instance observations.
#[derive(Clone)]
pub struct Analyzer(Arc<dyn AnalyzerBackend>);

impl Analyzer {
    /// Fetch the current set of analysis findings.
    pub async fn replication_analysis(
        &self,
        context: &Context,
        include_downtimed: bool,
    ) -> Result<Vec<AnalysisEntry>> {
        self.0.replication_analysis(context, include_downtimed).await
    }
}

impl<T> From<T> for Analyzer
where
    T: AnalyzerBackend + 'static,
{
    fn from(value: T) -> Self {
        Analyzer(Arc::new(value))
    }
}

/// Operations implemented by replication analyzers supported by the core.
#[async_trait::async_trait]
pub trait AnalyzerBackend: Send + Sync {
    /// Fetch the current set of analysis findings.
    async fn replication_analysis(
        &self,
        context: &Context,
        include_downtimed: bool,
    ) -> Result<Vec<AnalysisEntry>>;
}

#[cfg(any(test, feature = "test-fixture"))]
impl Analyzer {
    /// Initialise a new analyzer backend fixture for unit tests.
    pub fn fixture() -> (Analyzer, AnalyzerFixture) {
        let fixture = AnalyzerFixture::default();
        (Analyzer::from(fixture.clone()), fixture)
    }
}

#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::AnalyzerFixture;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture {
    use std::sync::Arc;
    use std::sync::Mutex;

    use anyhow::Result;

    use replimend_context::Context;
    use replimend_models::AnalysisEntry;

    use super::AnalyzerBackend;

    /// Analyzer backend returning scripted findings for unit tests.
    #[derive(Clone, Default)]
    pub struct AnalyzerFixture {
        entries: Arc<Mutex<Vec<AnalysisEntry>>>,
    }

    impl AnalyzerFixture {
        /// Add a finding for the next analysis fetch.
        pub fn entry(&self, entry: AnalysisEntry) -> &Self {
            self.entries
                .lock()
                .expect("AnalyzerFixture entries lock poisoned")
                .push(entry);
            self
        }
    }

    #[async_trait::async_trait]
    impl AnalyzerBackend for AnalyzerFixture {
        async fn replication_analysis(
            &self,
            _: &Context,
            include_downtimed: bool,
        ) -> Result<Vec<AnalysisEntry>> {
            let entries = self
                .entries
                .lock()
                .expect("AnalyzerFixture entries lock poisoned");
            Ok(entries
                .iter()
                .filter(|entry| include_downtimed || !entry.downtimed)
                .cloned()
                .collect())
        }
    }
}
