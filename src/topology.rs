use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use rand::Rng;

use crate::builder::TopologyBuilder;

/// Immutable snapshot of the cluster's partition/broker topology.
///
/// A snapshot is produced by [`TopologyBuilder::build`] and never mutated
/// afterwards, so any number of readers may query it concurrently without
/// synchronization. To derive the next version, deep-copy it back into a
/// builder with [`ClusterTopology::to_builder`] and publish the rebuilt
/// snapshot, e.g. through [`SharedTopology`](crate::SharedTopology).
///
/// All "not found" conditions are answered with `None` rather than an error;
/// the queries sit on the per-request routing path and must always return a
/// well-defined value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterTopology {
    /// Current leader by partition id
    pub(crate) partition_leaders: HashMap<i32, i32>,

    /// Fencing term of the last accepted leadership assignment, by
    /// partition id. Entries outlive the leader itself (see
    /// [`TopologyBuilder::remove_broker`]).
    pub(crate) partition_terms: HashMap<i32, i64>,

    /// Follower broker ids by partition id, in insertion order
    pub(crate) partition_followers: HashMap<i32, Vec<i32>>,

    /// Network address by broker id. An empty string means the broker is
    /// known but its address has not been resolved yet.
    pub(crate) broker_addresses: HashMap<i32, String>,

    /// Broker ids in the order they were first observed
    pub(crate) brokers: Vec<i32>,

    /// Partition ids in the order they were first observed
    pub(crate) partitions: Vec<i32>,

    pub(crate) cluster_size: i32,
    pub(crate) partitions_count: i32,
    pub(crate) replication_factor: i16,
}

impl ClusterTopology {
    /// Deep-copies this snapshot into a builder for the next round of
    /// mutation. The snapshot itself stays untouched, so in-flight readers
    /// keep a consistent view while the copy is being updated.
    pub fn to_builder(&self) -> TopologyBuilder {
        TopologyBuilder {
            state: self.clone(),
        }
    }

    /// Returns true while no brokers are known, i.e. before the first
    /// membership event has been observed.
    pub fn is_empty(&self) -> bool {
        self.brokers.is_empty()
    }

    /// The expected number of broker nodes in the cluster, as announced by
    /// the discovery layer. Informational; not derived from the tables.
    pub fn cluster_size(&self) -> i32 {
        self.cluster_size
    }

    /// The expected number of partitions in the cluster.
    pub fn partitions_count(&self) -> i32 {
        self.partitions_count
    }

    /// The configured replication factor.
    pub fn replication_factor(&self) -> i16 {
        self.replication_factor
    }

    /// Returns the current leader of the partition, if one is known.
    pub fn leader_for_partition(&self, partition_id: i32) -> Option<i32> {
        self.partition_leaders.get(&partition_id).copied()
    }

    /// Returns the known followers of the partition, in the order they were
    /// first observed. The current leader is never among them.
    pub fn followers_for_partition(&self, partition_id: i32) -> Option<&[i32]> {
        self.partition_followers
            .get(&partition_id)
            .map(|followers| followers.as_slice())
    }

    /// Returns the stored address of the broker.
    ///
    /// An empty string means the broker is known but unresolved; `None`
    /// means the broker is not known at all.
    pub fn broker_address(&self, broker_id: i32) -> Option<&str> {
        self.broker_addresses
            .get(&broker_id)
            .map(|address| address.as_str())
    }

    /// All known broker ids, in the order they were first observed.
    ///
    /// Insertion order, not numeric order, is the contract.
    pub fn brokers(&self) -> &[i32] {
        &self.brokers
    }

    /// All known partition ids, in the order they were first observed.
    pub fn partitions(&self) -> &[i32] {
        &self.partitions
    }

    /// Returns a uniformly random known broker id, or `None` while no
    /// brokers are known. Used to pick a destination for partition-agnostic
    /// requests.
    pub fn random_broker(&self) -> Option<i32> {
        self.random_broker_with(&mut rand::thread_rng())
    }

    /// Like [`random_broker`](Self::random_broker) with a caller-supplied
    /// random source, so tests can inject a deterministic one.
    pub fn random_broker_with<R: Rng>(&self, rng: &mut R) -> Option<i32> {
        if self.brokers.is_empty() {
            return None;
        }

        Some(self.brokers[rng.gen_range(0..self.brokers.len())])
    }

    /// Returns the partition id at `index` modulo the number of known
    /// partitions, or `None` while no partitions are known.
    ///
    /// An external caller incrementing an integer cursor gets simple
    /// round-robin iteration out of this.
    pub fn partition_at(&self, index: usize) -> Option<i32> {
        if self.partitions.is_empty() {
            return None;
        }

        Some(self.partitions[index % self.partitions.len()])
    }
}

/// Human-readable dump for logging. The format is not stable and must not
/// be parsed.
impl Display for ClusterTopology {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ClusterTopology {{ leaders: {:?}, brokers: {:?}, partitions: {:?}, \
             cluster_size: {}, partitions_count: {}, replication_factor: {} }}",
            self.partition_leaders,
            self.brokers,
            self.partitions,
            self.cluster_size,
            self.partitions_count,
            self.replication_factor,
        )
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn empty_topology_answers_everything() {
        let topology = ClusterTopology::default();

        assert!(topology.is_empty());
        assert_eq!(topology.cluster_size(), 0);
        assert_eq!(topology.partitions_count(), 0);
        assert_eq!(topology.replication_factor(), 0);
        assert_eq!(topology.leader_for_partition(1), None);
        assert_eq!(topology.followers_for_partition(1), None);
        assert_eq!(topology.broker_address(1), None);
        assert_eq!(topology.brokers(), &[] as &[i32]);
        assert_eq!(topology.partitions(), &[] as &[i32]);
        assert_eq!(topology.random_broker(), None);
        assert_eq!(topology.partition_at(0), None);
        assert_eq!(topology.partition_at(17), None);
    }

    #[test]
    fn sequences_keep_insertion_order() {
        let mut builder = TopologyBuilder::new();
        builder.add_broker_if_absent(7);
        builder.add_broker_if_absent(0);
        builder.add_broker_if_absent(3);
        builder.add_partition_if_absent(9);
        builder.add_partition_if_absent(2);

        let topology = builder.build();
        assert_eq!(topology.brokers(), &[7, 0, 3]);
        assert_eq!(topology.partitions(), &[9, 2]);
    }

    #[test]
    fn partition_at_wraps_via_modulo() {
        let mut builder = TopologyBuilder::new();
        builder.add_partition_if_absent(3);
        builder.add_partition_if_absent(7);
        builder.add_partition_if_absent(9);

        let topology = builder.build();
        assert_eq!(topology.partition_at(0), Some(3));
        assert_eq!(topology.partition_at(1), Some(7));
        assert_eq!(topology.partition_at(2), Some(9));
        assert_eq!(topology.partition_at(3), Some(3));
        assert_eq!(topology.partition_at(100), Some(7));
    }

    #[test]
    fn random_broker_stays_within_membership() {
        let mut builder = TopologyBuilder::new();
        builder.add_broker_if_absent(1);
        builder.add_broker_if_absent(4);
        builder.add_broker_if_absent(6);
        let topology = builder.build();

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let picked = topology.random_broker_with(&mut rng).unwrap();
            assert!(topology.brokers().contains(&picked));
        }
    }

    #[test]
    fn random_broker_covers_all_brokers() {
        let mut builder = TopologyBuilder::new();
        for broker_id in [1, 4, 6] {
            builder.add_broker_if_absent(broker_id);
        }
        let topology = builder.build();

        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            seen.insert(topology.random_broker_with(&mut rng).unwrap());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn unresolved_broker_has_placeholder_address() {
        let mut builder = TopologyBuilder::new();
        builder.add_broker_if_absent(2);

        let topology = builder.build();
        assert_eq!(topology.broker_address(2), Some(""));
    }

    #[test]
    fn display_mentions_the_tables() {
        let mut builder = TopologyBuilder::new();
        builder.add_broker_if_absent(1);
        builder.add_partition_if_absent(5);
        builder.set_partition_leader(5, 1, 3);
        builder.set_cluster_size(3);

        let dump = builder.build().to_string();
        assert!(dump.contains("brokers"));
        assert!(dump.contains("cluster_size: 3"));
    }
}
