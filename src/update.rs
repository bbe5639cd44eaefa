//! Batched topology updates from the discovery layer.
//!
//! Membership and leadership changes usually arrive as whole digests (a
//! gossip payload, a heartbeat response) rather than single events. A
//! [`ClusterUpdate`] carries one such digest; [`TopologyBuilder::apply_update`]
//! validates it and folds it through the individual mutators.

use thiserror::Error;

use crate::builder::TopologyBuilder;

/// A malformed update batch. The batch originates outside the process, so
/// it is validated before application; a rejected batch leaves the builder
/// untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpdateError {
    #[error("negative broker id {node_id} in update")]
    NegativeBrokerId { node_id: i32 },

    #[error("negative partition id {partition_id} in update")]
    NegativePartitionId { partition_id: i32 },

    #[error("negative term {term} for partition {partition_id} in update")]
    NegativeTerm { partition_id: i32, term: i64 },
}

/// One broker entry in an update batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerUpdate {
    /// The broker id
    pub node_id: i32,

    /// Resolved network address, if the discovery layer knows it yet
    pub address: Option<String>,
}

/// Leadership assignment carried by a partition entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderUpdate {
    /// The leading broker id
    pub node_id: i32,

    /// Fencing term of the assignment, handed down from the coordination
    /// layer that elected the leader
    pub term: i64,
}

/// One partition entry in an update batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionUpdate {
    /// The partition id
    pub partition_id: i32,

    /// Current leader, if the digest announces one
    pub leader: Option<LeaderUpdate>,

    /// Follower broker ids
    pub followers: Vec<i32>,
}

/// One observed topology change, covering any subset of the tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterUpdate {
    /// Announced cluster size, if the digest carries it
    pub cluster_size: Option<i32>,

    /// Announced partition count, if the digest carries it
    pub partitions_count: Option<i32>,

    /// Announced replication factor, if the digest carries it
    pub replication_factor: Option<i16>,

    /// Brokers to register or re-address
    pub brokers: Vec<BrokerUpdate>,

    /// Brokers that left the cluster
    pub removed_brokers: Vec<i32>,

    /// Per-partition leadership and replica membership
    pub partitions: Vec<PartitionUpdate>,
}

impl ClusterUpdate {
    fn validate(&self) -> Result<(), UpdateError> {
        for broker in &self.brokers {
            if broker.node_id < 0 {
                return Err(UpdateError::NegativeBrokerId {
                    node_id: broker.node_id,
                });
            }
        }

        for &node_id in &self.removed_brokers {
            if node_id < 0 {
                return Err(UpdateError::NegativeBrokerId { node_id });
            }
        }

        for partition in &self.partitions {
            if partition.partition_id < 0 {
                return Err(UpdateError::NegativePartitionId {
                    partition_id: partition.partition_id,
                });
            }
            if let Some(leader) = partition.leader {
                if leader.node_id < 0 {
                    return Err(UpdateError::NegativeBrokerId {
                        node_id: leader.node_id,
                    });
                }
                if leader.term < 0 {
                    return Err(UpdateError::NegativeTerm {
                        partition_id: partition.partition_id,
                        term: leader.term,
                    });
                }
            }
            for &follower in &partition.followers {
                if follower < 0 {
                    return Err(UpdateError::NegativeBrokerId { node_id: follower });
                }
            }
        }

        Ok(())
    }
}

impl TopologyBuilder {
    /// Validates `update` and folds it through the individual mutators:
    /// scalars first, then broker registrations and addresses, then
    /// partition leadership and followers, then departures.
    ///
    /// A malformed batch is rejected whole; nothing is applied. A valid
    /// batch is equivalent to the corresponding mutator call sequence, so
    /// stale terms and duplicate entries inside it degrade to no-ops as
    /// usual.
    pub fn apply_update(&mut self, update: &ClusterUpdate) -> Result<(), UpdateError> {
        update.validate()?;

        if let Some(cluster_size) = update.cluster_size {
            self.set_cluster_size(cluster_size);
        }
        if let Some(partitions_count) = update.partitions_count {
            self.set_partitions_count(partitions_count);
        }
        if let Some(replication_factor) = update.replication_factor {
            self.set_replication_factor(replication_factor);
        }

        for broker in &update.brokers {
            self.add_broker_if_absent(broker.node_id);
            if let Some(address) = &broker.address {
                self.set_broker_address_if_present(broker.node_id, address.as_str());
            }
        }

        for partition in &update.partitions {
            self.add_partition_if_absent(partition.partition_id);
            if let Some(leader) = partition.leader {
                self.set_partition_leader(partition.partition_id, leader.node_id, leader.term);
            }
            for &follower in &partition.followers {
                self.add_partition_follower(partition.partition_id, follower);
            }
        }

        for &broker_id in &update.removed_brokers {
            self.remove_broker(broker_id);
        }

        Ok(())
    }
}
