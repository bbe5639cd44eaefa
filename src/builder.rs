use tracing::{debug, info};

use crate::topology::ClusterTopology;

/// Accumulates membership and leadership changes into the next
/// [`ClusterTopology`] snapshot.
///
/// The builder is the single mutable stage of the copy-on-update cycle:
/// start from [`TopologyBuilder::new`] or [`ClusterTopology::to_builder`],
/// fold in changes as the discovery layer reports them, then
/// [`build`](Self::build) and publish the result.
///
/// The discovery layer delivers events best-effort: possibly duplicated,
/// possibly reordered. Every mutator is therefore idempotent or a silent
/// no-op under repeated application, and none of them fails: stale terms,
/// unknown brokers and duplicate registrations are ignored so the view
/// converges regardless of delivery order.
///
/// At most one updater may drive a given builder at a time; the builder
/// performs no internal synchronization.
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    pub(crate) state: ClusterTopology,
}

impl TopologyBuilder {
    /// Creates a builder with empty tables and zero scalars.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `leader_id` as leader of the partition iff `term` is newer
    /// than the recorded term, and evicts the new leader from the
    /// partition's follower list.
    ///
    /// A lower-or-equal term means the announcement is stale (delivered out
    /// of order) and is dropped. Absent partitions compare as term -1, so
    /// any non-negative term is accepted for a partition seen for the
    /// first time.
    pub fn set_partition_leader(&mut self, partition_id: i32, leader_id: i32, term: i64) {
        let current = self
            .state
            .partition_terms
            .get(&partition_id)
            .copied()
            .unwrap_or(-1);
        if current >= term {
            debug!(
                partition_id,
                leader_id,
                term,
                current_term = current,
                "dropping stale leadership announcement",
            );
            return;
        }

        self.state.partition_leaders.insert(partition_id, leader_id);
        self.state.partition_terms.insert(partition_id, term);
        if let Some(followers) = self.state.partition_followers.get_mut(&partition_id) {
            followers.retain(|follower| *follower != leader_id);
        }

        debug!(partition_id, leader_id, term, "partition leader changed");
    }

    /// Adds the broker to the partition's follower list, creating the list
    /// if absent. Re-adding a present follower or the partition's current
    /// leader is a no-op, so a broker never appears as leader and follower
    /// of the same partition at once.
    pub fn add_partition_follower(&mut self, partition_id: i32, follower_id: i32) {
        if self.state.partition_leaders.get(&partition_id) == Some(&follower_id) {
            return;
        }

        let followers = self
            .state
            .partition_followers
            .entry(partition_id)
            .or_default();
        if !followers.contains(&follower_id) {
            followers.push(follower_id);
        }
    }

    /// Registers the partition id once; no-op if already known.
    pub fn add_partition_if_absent(&mut self, partition_id: i32) {
        if !self.state.partitions.contains(&partition_id) {
            self.state.partitions.push(partition_id);
        }
    }

    /// Registers the broker once, with an empty placeholder address until
    /// [`set_broker_address_if_present`](Self::set_broker_address_if_present)
    /// resolves it; no-op if already known.
    pub fn add_broker_if_absent(&mut self, node_id: i32) {
        if self.state.broker_addresses.contains_key(&node_id) {
            return;
        }

        self.state.broker_addresses.insert(node_id, String::new());
        self.state.brokers.push(node_id);
        info!(node_id, "new broker");
    }

    /// Updates the address of an already-known broker. Unknown brokers are
    /// silently ignored; this never implicitly creates a broker.
    pub fn set_broker_address_if_present(&mut self, broker_id: i32, address: impl Into<String>) {
        if let Some(slot) = self.state.broker_addresses.get_mut(&broker_id) {
            *slot = address.into();
        }
    }

    /// Removes the broker and every reference to it: the address entry, the
    /// membership sequence entry, any leader claim (the partition reverts
    /// to "no leader") and every follower entry.
    ///
    /// The recorded leadership terms are kept, so a stale announcement from
    /// before the departure is still fenced. This is the only
    /// O(partitions) mutator.
    pub fn remove_broker(&mut self, broker_id: i32) {
        let was_known = self.state.broker_addresses.remove(&broker_id).is_some();
        self.state.brokers.retain(|id| *id != broker_id);
        self.state
            .partition_leaders
            .retain(|_, leader| *leader != broker_id);
        for followers in self.state.partition_followers.values_mut() {
            followers.retain(|follower| *follower != broker_id);
        }

        if was_known {
            info!(broker_id, "broker removed");
        }
    }

    /// Records the announced cluster size.
    pub fn set_cluster_size(&mut self, cluster_size: i32) {
        self.state.cluster_size = cluster_size;
    }

    /// Records the announced partition count.
    pub fn set_partitions_count(&mut self, partitions_count: i32) {
        self.state.partitions_count = partitions_count;
    }

    /// Records the announced replication factor.
    pub fn set_replication_factor(&mut self, replication_factor: i16) {
        self.state.replication_factor = replication_factor;
    }

    /// Consumes the builder and yields the finished snapshot.
    pub fn build(self) -> ClusterTopology {
        self.state
    }
}
