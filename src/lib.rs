//! Client-side view of a distributed cluster's partition/broker topology.
//!
//! A gateway that routes requests to broker nodes needs three answers on
//! every request, cheaply and without blocking: who currently leads a given
//! partition, which broker can serve a partition-agnostic request, and how
//! a broker id resolves to a connectable address. This crate keeps that
//! view as an immutable [`ClusterTopology`] snapshot, built by a
//! [`TopologyBuilder`] from the asynchronous, partial and possibly
//! reordered event stream of a membership/leadership discovery layer, and
//! shared with concurrent readers through [`SharedTopology`].
//!
//! ```
//! use cluster_topology::{SharedTopology, TopologyBuilder};
//!
//! let shared = SharedTopology::new();
//!
//! // updater side: fold observed changes into the next snapshot
//! shared.update(|topology| {
//!     topology.add_broker_if_absent(0);
//!     topology.set_broker_address_if_present(0, "10.0.0.7:26501");
//!     topology.add_partition_if_absent(1);
//!     topology.set_partition_leader(1, 0, 1);
//! });
//!
//! // router side: lock-light reads on the per-request hot path
//! let topology = shared.get();
//! assert_eq!(topology.leader_for_partition(1), Some(0));
//! assert_eq!(topology.broker_address(0), Some("10.0.0.7:26501"));
//! ```
//!
//! Leadership changes carry a monotonically increasing term supplied by the
//! coordination layer; announcements with an older term are dropped, so the
//! view converges no matter in which order events are delivered. Queries
//! never fail: unknown ids answer `None`.
//!
//! This crate does not elect leaders, check broker reachability, retry
//! anything, or talk to the network; it is the state container between a
//! discovery layer pushing updates in and a request router reading them
//! out.

pub mod builder;
pub mod shared;
pub mod topology;
pub mod update;

pub use crate::builder::TopologyBuilder;
pub use crate::shared::SharedTopology;
pub use crate::topology::ClusterTopology;
pub use crate::update::{
    BrokerUpdate, ClusterUpdate, LeaderUpdate, PartitionUpdate, UpdateError,
};
