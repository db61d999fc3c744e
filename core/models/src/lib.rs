//! Data model for the Replimend failure detection and recovery core.
//!
//! The types in this crate describe replication topologies as the control
//! plane sees them: instances addressed by `host:port` keys, the replication
//! coordinates used to compare their progress, the verdicts produced by the
//! replication analyzer and the persistent record of topology recoveries.
mod analysis;
mod instance;
mod recovery;

pub use self::analysis::AnalysisEntry;
pub use self::analysis::AnalysisVerdict;
pub use self::instance::BinlogCoordinates;
pub use self::instance::Instance;
pub use self::instance::InstanceKey;
pub use self::recovery::NodeIdentity;
pub use self::recovery::TopologyRecovery;
