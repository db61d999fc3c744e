//! Instances and the coordinates used to compare their replication progress.
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;

use serde::Deserialize;
use serde::Serialize;

/// Address of a database instance as known to the topology store.
///
/// Hostnames compare case-insensitively: two keys are equal when their ports
/// match and their hostnames match ignoring ASCII case.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstanceKey {
    pub hostname: String,
    pub port: u16,
}

impl InstanceKey {
    pub fn new<S>(hostname: S, port: u16) -> InstanceKey
    where
        S: Into<String>,
    {
        InstanceKey {
            hostname: hostname.into(),
            port,
        }
    }

    fn normalised_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.hostname.bytes().map(|byte| byte.to_ascii_lowercase())
    }
}

impl PartialEq for InstanceKey {
    fn eq(&self, other: &InstanceKey) -> bool {
        self.port == other.port && self.normalised_bytes().eq(other.normalised_bytes())
    }
}

impl Eq for InstanceKey {}

impl Hash for InstanceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.normalised_bytes() {
            state.write_u8(byte);
        }
        state.write_u16(self.port);
    }
}

impl Ord for InstanceKey {
    fn cmp(&self, other: &InstanceKey) -> Ordering {
        self.normalised_bytes()
            .cmp(other.normalised_bytes())
            .then_with(|| self.port.cmp(&other.port))
    }
}

impl PartialOrd for InstanceKey {
    fn partial_cmp(&self, other: &InstanceKey) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

/// Position in a binary log, ordered lexicographically on (file, position).
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BinlogCoordinates {
    pub log_file: String,
    pub log_pos: u64,
}

impl BinlogCoordinates {
    pub fn new<S>(log_file: S, log_pos: u64) -> BinlogCoordinates
    where
        S: Into<String>,
    {
        BinlogCoordinates {
            log_file: log_file.into(),
            log_pos,
        }
    }
}

impl Ord for BinlogCoordinates {
    fn cmp(&self, other: &BinlogCoordinates) -> Ordering {
        self.log_file
            .cmp(&other.log_file)
            .then_with(|| self.log_pos.cmp(&other.log_pos))
    }
}

impl PartialOrd for BinlogCoordinates {
    fn partial_cmp(&self, other: &BinlogCoordinates) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BinlogCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.log_file, self.log_pos)
    }
}

/// Snapshot of a database instance read from the topology store.
///
/// Snapshots are immutable for the duration of a single recovery decision and
/// refreshed between decisions; the authoritative topology graph lives in the
/// store and instances reference each other by key only.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub key: InstanceKey,

    /// Key of the instance this one replicates from, if any.
    #[serde(default)]
    pub upstream_key: Option<InstanceKey>,

    /// Keys of the instances replicating from this one.
    #[serde(default)]
    pub downstream_keys: BTreeSet<InstanceKey>,

    /// Coordinates of the last executed replication event.
    pub exec_coordinates: BinlogCoordinates,

    /// Coordinates of the last relayed replication event.
    pub read_coordinates: BinlogCoordinates,

    pub binlog_enabled: bool,
    pub log_replica_updates: bool,
    pub replica_running: bool,
    pub last_check_valid: bool,
    pub has_replication_filters: bool,
    pub is_max_scale: bool,

    pub cluster_name: String,
    pub cluster_alias: String,
    pub data_center: String,
    pub physical_environment: String,
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::Hash;
    use std::hash::Hasher;

    use super::BinlogCoordinates;
    use super::InstanceKey;

    fn hash_of(key: &InstanceKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn keys_compare_hostnames_case_insensitively() {
        let lower = InstanceKey::new("db1.example.com", 3306);
        let upper = InstanceKey::new("DB1.Example.COM", 3306);
        assert_eq!(lower, upper);
        assert_eq!(hash_of(&lower), hash_of(&upper));
    }

    #[test]
    fn keys_differ_on_port() {
        let main = InstanceKey::new("db1.example.com", 3306);
        let admin = InstanceKey::new("db1.example.com", 3307);
        assert_ne!(main, admin);
    }

    #[test]
    fn keys_differ_on_hostname() {
        let one = InstanceKey::new("db1.example.com", 3306);
        let two = InstanceKey::new("db2.example.com", 3306);
        assert_ne!(one, two);
    }

    #[test]
    fn coordinates_order_on_file_first() {
        let early = BinlogCoordinates::new("mysql-bin.000009", 9000);
        let late = BinlogCoordinates::new("mysql-bin.000010", 10);
        assert!(early < late);
    }

    #[test]
    fn coordinates_order_on_position_within_file() {
        let early = BinlogCoordinates::new("mysql-bin.000010", 500);
        let late = BinlogCoordinates::new("mysql-bin.000010", 700);
        assert!(early < late);
        assert!(late > early);
    }

    #[test]
    fn coordinates_total_order() {
        let mut coords = vec![
            BinlogCoordinates::new("mysql-bin.000010", 700),
            BinlogCoordinates::new("mysql-bin.000009", 9000),
            BinlogCoordinates::new("mysql-bin.000010", 500),
            BinlogCoordinates::new("mysql-bin.000009", 10),
        ];
        coords.sort();
        let positions: Vec<u64> = coords.iter().map(|c| c.log_pos).collect();
        assert_eq!(positions, vec![10, 9000, 500, 700]);
    }

    #[test]
    fn coordinates_sort_is_stable_on_equal_values() {
        // Pair equal coordinates with markers to observe their original order.
        let mut tagged = vec![
            (BinlogCoordinates::new("mysql-bin.000010", 500), "first"),
            (BinlogCoordinates::new("mysql-bin.000010", 500), "second"),
            (BinlogCoordinates::new("mysql-bin.000009", 100), "third"),
        ];
        tagged.sort_by(|a, b| a.0.cmp(&b.0));
        let markers: Vec<&str> = tagged.iter().map(|(_, marker)| *marker).collect();
        assert_eq!(markers, vec!["third", "first", "second"]);
    }
}
