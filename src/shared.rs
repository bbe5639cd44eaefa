use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::builder::TopologyBuilder;
use crate::topology::ClusterTopology;

/// Shared publish point for topology snapshots.
///
/// Readers call [`get`](Self::get) on every routed request; the read lock is
/// held only long enough to clone the inner [`Arc`]. The updater prepares
/// the next snapshot off to the side and swaps it in with
/// [`publish`](Self::publish) or [`update`](Self::update). Readers still
/// holding the previous snapshot keep an internally consistent view until
/// they drop it; a stale read simply answers from the prior snapshot, which
/// is the eventual-consistency contract of the overall system.
///
/// At most one updater may drive a given handle: two racing
/// [`update`](Self::update) calls would each copy the same base snapshot,
/// and the later publish would silently discard the earlier one's changes.
#[derive(Debug, Default)]
pub struct SharedTopology {
    current: RwLock<Arc<ClusterTopology>>,
}

impl SharedTopology {
    /// Creates a handle holding an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the currently published snapshot.
    pub fn get(&self) -> Arc<ClusterTopology> {
        Arc::clone(&self.current.read())
    }

    /// Publishes `topology` as the current snapshot and returns it. New
    /// reads see it immediately; in-flight reads keep the previous one.
    pub fn publish(&self, topology: ClusterTopology) -> Arc<ClusterTopology> {
        let next = Arc::new(topology);
        *self.current.write() = Arc::clone(&next);

        debug!(
            brokers = next.brokers().len(),
            partitions = next.partitions().len(),
            "published topology snapshot",
        );
        next
    }

    /// Copies the current snapshot into a builder, applies `f` to it, and
    /// publishes the result. This is the copy → mutate → swap cycle in one
    /// call.
    pub fn update<F>(&self, f: F) -> Arc<ClusterTopology>
    where
        F: FnOnce(&mut TopologyBuilder),
    {
        let mut builder = self.get().to_builder();
        f(&mut builder);
        self.publish(builder.build())
    }
}
