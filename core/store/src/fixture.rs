//! Inefficient in-memory store implementations for unit tests.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use anyhow::Result;
use time::Duration;

use replimend_context::Context;
use replimend_models::AnalysisEntry;
use replimend_models::Instance;
use replimend_models::InstanceKey;
use replimend_models::TopologyRecovery;

use super::InstanceNotFound;
use super::MatchUpOutcome;
use super::MultiMatchOutcome;
use super::RecoveriesBackend;
use super::RecoveryNotActive;
use super::RegroupOutcome;
use super::TopologyBackend;

/// In-memory implementation of a mock [`Topology`](super::Topology) store.
///
/// The fixture keeps a consistent topology graph: re-parenting primitives
/// update both upstream and downstream pointers so tests can assert the
/// resulting shape with [`TopologyFixture::get`]. Operation failures can be
/// scripted per primitive.
#[derive(Clone)]
pub struct TopologyFixture {
    inner: Arc<Mutex<TopologyFixtureState>>,
}

impl TopologyFixture {
    fn access(&self) -> MutexGuard<'_, TopologyFixtureState> {
        self.inner
            .lock()
            .expect("TopologyFixture::inner state lock poisoned")
    }

    /// Add or replace an instance snapshot in the fixture.
    ///
    /// Upstream and downstream pointers of the surrounding graph are linked
    /// up automatically so fixtures stay consistent in any insertion order.
    pub fn instance(&self, instance: Instance) -> &Self {
        let mut state = self.access();
        let key = instance.key.clone();
        let upstream = instance.upstream_key.clone();
        state.instances.insert(key.clone(), instance);
        if let Some(upstream) = upstream {
            if let Some(parent) = state.instances.get_mut(&upstream) {
                parent.downstream_keys.insert(key.clone());
            }
        }
        let downstream: Vec<InstanceKey> = state
            .instances
            .values()
            .filter(|other| other.key != key && other.upstream_key.as_ref() == Some(&key))
            .map(|other| other.key.clone())
            .collect();
        if let Some(inserted) = state.instances.get_mut(&key) {
            inserted.downstream_keys.extend(downstream);
        }
        self
    }

    /// Register an instance as a promotion candidate for a cluster.
    pub fn candidate<S>(&self, cluster_name: S, key: InstanceKey) -> &Self
    where
        S: Into<String>,
    {
        let mut state = self.access();
        state
            .candidates
            .entry(cluster_name.into())
            .or_default()
            .push(key);
        self
    }

    /// Fetch the current snapshot of an instance for assertions.
    pub fn get(&self, key: &InstanceKey) -> Option<Instance> {
        let state = self.access();
        state.instances.get(key).cloned()
    }

    /// Script the next regroup call to also report per-replica errors.
    pub fn inject_regroup_errors(&self, errors: Vec<String>) -> &Self {
        let mut state = self.access();
        state.regroup_errors = errors;
        self
    }

    /// Script every regroup call to fail outright.
    pub fn fail_regroup(&self) -> &Self {
        self.access().fail_regroup = true;
        self
    }

    /// Script every multi-match call to fail outright.
    pub fn fail_multi_match(&self) -> &Self {
        self.access().fail_multi_match = true;
        self
    }

    /// Script every match-up call to fail outright.
    pub fn fail_match_up(&self) -> &Self {
        self.access().fail_match_up = true;
        self
    }

    /// Script every upstream swap call to fail outright.
    pub fn fail_swap(&self) -> &Self {
        self.access().fail_swap = true;
        self
    }
}

impl Default for TopologyFixture {
    fn default() -> Self {
        let inner = TopologyFixtureState::default();
        TopologyFixture {
            inner: Arc::new(Mutex::new(inner)),
        }
    }
}

#[derive(Default)]
struct TopologyFixtureState {
    instances: HashMap<InstanceKey, Instance>,
    candidates: HashMap<String, Vec<InstanceKey>>,
    regroup_errors: Vec<String>,
    fail_regroup: bool,
    fail_multi_match: bool,
    fail_match_up: bool,
    fail_swap: bool,
}

impl TopologyFixtureState {
    /// Direct replicas of `key`, sorted for deterministic selection.
    fn replicas_of(&self, key: &InstanceKey) -> Vec<Instance> {
        let mut replicas: Vec<Instance> = self
            .instances
            .values()
            .filter(|instance| instance.upstream_key.as_ref() == Some(key))
            .cloned()
            .collect();
        replicas.sort_by(|a, b| a.key.cmp(&b.key));
        replicas
    }

    /// Point `child` at a new upstream, keeping downstream sets consistent.
    fn reparent(&mut self, child: &InstanceKey, new_upstream: Option<InstanceKey>) {
        let old_upstream = self
            .instances
            .get(child)
            .and_then(|instance| instance.upstream_key.clone());
        if let Some(old) = old_upstream {
            if let Some(parent) = self.instances.get_mut(&old) {
                parent.downstream_keys.remove(child);
            }
        }
        if let Some(new) = &new_upstream {
            let child = child.clone();
            if let Some(parent) = self.instances.get_mut(new) {
                parent.downstream_keys.insert(child);
            }
        }
        if let Some(instance) = self.instances.get_mut(child) {
            instance.upstream_key = new_upstream;
        }
    }
}

#[async_trait::async_trait]
impl TopologyBackend for TopologyFixture {
    async fn instance(&self, _: &Context, key: &InstanceKey) -> Result<Option<Instance>> {
        Ok(self.get(key))
    }

    async fn replicas(&self, _: &Context, key: &InstanceKey) -> Result<Vec<Instance>> {
        let state = self.access();
        Ok(state.replicas_of(key))
    }

    async fn cluster_candidates(&self, _: &Context, cluster_name: &str) -> Result<Vec<Instance>> {
        let state = self.access();
        let keys = state.candidates.get(cluster_name).cloned().unwrap_or_default();
        Ok(keys
            .iter()
            .filter_map(|key| state.instances.get(key).cloned())
            .collect())
    }

    async fn regroup_replicas(&self, _: &Context, key: &InstanceKey) -> Result<RegroupOutcome> {
        let mut state = self.access();
        if state.fail_regroup {
            anyhow::bail!("scripted regroup failure for '{}'", key);
        }
        let errors = std::mem::take(&mut state.regroup_errors);
        let replicas = state.replicas_of(key);
        let promoted = replicas
            .iter()
            .fold(None::<&Instance>, |best, replica| match best {
                Some(best) if best.exec_coordinates >= replica.exec_coordinates => Some(best),
                _ => Some(replica),
            })
            .cloned();
        let promoted = match promoted {
            Some(promoted) => promoted,
            None => return Ok(RegroupOutcome { errors, ..RegroupOutcome::default() }),
        };

        let mut equal = Vec::new();
        for replica in &replicas {
            if replica.key == promoted.key {
                continue;
            }
            if replica.exec_coordinates == promoted.exec_coordinates {
                equal.push(replica.key.clone());
            }
            state.reparent(&replica.key, Some(promoted.key.clone()));
        }

        // The group leader takes over a topology head's position outright;
        // under an intermediate it stays attached for a later match-up.
        let failed_upstream = state
            .instances
            .get(key)
            .and_then(|failed| failed.upstream_key.clone());
        if failed_upstream.is_none() {
            state.reparent(&promoted.key, None);
        }

        let promoted = state.instances.get(&promoted.key).cloned();
        Ok(RegroupOutcome {
            promoted,
            lost: Vec::new(),
            equal,
            ahead: Vec::new(),
            errors,
        })
    }

    async fn multi_match_replicas(
        &self,
        _: &Context,
        from: &InstanceKey,
        to: &InstanceKey,
        _pattern: &str,
    ) -> Result<MultiMatchOutcome> {
        let mut state = self.access();
        if state.fail_multi_match {
            anyhow::bail!("scripted multi-match failure for '{}'", from);
        }
        if !state.instances.contains_key(to) {
            return Err(InstanceNotFound::new(to.clone()).into());
        }
        let mut matched = Vec::new();
        for replica in state.replicas_of(from) {
            if replica.key == *to {
                continue;
            }
            state.reparent(&replica.key, Some(to.clone()));
            matched.push(replica.key);
        }
        Ok(MultiMatchOutcome {
            matched,
            target: state.instances.get(to).cloned(),
            errors: Vec::new(),
        })
    }

    async fn match_up_replicas(
        &self,
        _: &Context,
        key: &InstanceKey,
        _pattern: &str,
    ) -> Result<MatchUpOutcome> {
        let mut state = self.access();
        if state.fail_match_up {
            anyhow::bail!("scripted match-up failure for '{}'", key);
        }
        let upstream = state
            .instances
            .get(key)
            .and_then(|instance| instance.upstream_key.clone());
        let upstream = match upstream {
            Some(upstream) => upstream,
            None => {
                return Ok(MatchUpOutcome {
                    matched: Vec::new(),
                    target: None,
                    errors: vec![format!("instance '{}' has no upstream to match up to", key)],
                })
            }
        };
        let mut matched = Vec::new();
        for replica in state.replicas_of(key) {
            state.reparent(&replica.key, Some(upstream.clone()));
            matched.push(replica.key);
        }
        Ok(MatchUpOutcome {
            matched,
            target: state.instances.get(&upstream).cloned(),
            errors: Vec::new(),
        })
    }

    async fn swap_with_upstream(&self, _: &Context, key: &InstanceKey) -> Result<Instance> {
        let mut state = self.access();
        if state.fail_swap {
            anyhow::bail!("scripted swap failure for '{}'", key);
        }
        let instance = state
            .instances
            .get(key)
            .cloned()
            .ok_or_else(|| InstanceNotFound::new(key.clone()))?;
        let parent_key = match instance.upstream_key {
            Some(parent_key) => parent_key,
            None => anyhow::bail!("instance '{}' has no upstream to swap with", key),
        };
        let grandparent = state
            .instances
            .get(&parent_key)
            .and_then(|parent| parent.upstream_key.clone());

        for sibling in state.replicas_of(&parent_key) {
            if sibling.key == *key {
                continue;
            }
            state.reparent(&sibling.key, Some(key.clone()));
        }
        state.reparent(key, grandparent);
        state.reparent(&parent_key, Some(key.clone()));

        state
            .instances
            .get(key)
            .cloned()
            .ok_or_else(|| InstanceNotFound::new(key.clone()).into())
    }
}

/// In-memory implementation of a mock [`Recoveries`](super::Recoveries) store.
///
/// A single mutex stands in for the conditional insert of real backends: a
/// claim scans active rows and cluster cooldowns before inserting, all under
/// the one lock.
#[derive(Clone)]
pub struct RecoveriesFixture {
    inner: Arc<Mutex<RecoveriesFixtureState>>,
}

impl RecoveriesFixture {
    fn access(&self) -> MutexGuard<'_, RecoveriesFixtureState> {
        self.inner
            .lock()
            .expect("RecoveriesFixture::inner state lock poisoned")
    }

    /// All recovery rows, oldest first, for assertions.
    pub fn rows(&self) -> Vec<TopologyRecovery> {
        self.access().rows.clone()
    }
}

impl Default for RecoveriesFixture {
    fn default() -> Self {
        let inner = RecoveriesFixtureState {
            rows: Vec::new(),
            next_id: 1,
        };
        RecoveriesFixture {
            inner: Arc::new(Mutex::new(inner)),
        }
    }
}

struct RecoveriesFixtureState {
    rows: Vec<TopologyRecovery>,
    next_id: u64,
}

#[async_trait::async_trait]
impl RecoveriesBackend for RecoveriesFixture {
    async fn claim(
        &self,
        context: &Context,
        entry: &AnalysisEntry,
        block_window: Duration,
    ) -> Result<Option<TopologyRecovery>> {
        let now = context.clock.now_utc();
        let mut state = self.access();
        let held = state
            .rows
            .iter()
            .any(|row| row.active && row.entry.analyzed_key == entry.analyzed_key);
        if held {
            return Ok(None);
        }
        let blocked = state.rows.iter().any(|row| {
            row.entry.cluster_name == entry.cluster_name
                && row.ended.map_or(false, |ended| now - ended < block_window)
        });
        if blocked {
            return Ok(None);
        }
        let recovery = TopologyRecovery {
            recovery_id: state.next_id,
            entry: entry.clone(),
            successor_key: None,
            active: true,
            started: now,
            ended: None,
            processing_node: context.node.clone(),
        };
        state.next_id += 1;
        state.rows.push(recovery.clone());
        Ok(Some(recovery))
    }

    async fn resolve(
        &self,
        context: &Context,
        failed_key: &InstanceKey,
        successor: Option<InstanceKey>,
    ) -> Result<()> {
        let now = context.clock.now_utc();
        let mut state = self.access();
        let row = state
            .rows
            .iter_mut()
            .find(|row| row.active && row.entry.analyzed_key == *failed_key);
        match row {
            Some(row) => {
                row.active = false;
                row.successor_key = successor;
                row.ended = Some(now);
                Ok(())
            }
            None => Err(RecoveryNotActive::new(failed_key.clone()).into()),
        }
    }
}
