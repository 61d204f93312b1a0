use crate::core::FixtureHandle;
use crate::fixtures::ProxyId;
use crate::math::Aabb;

use std::collections::BTreeMap;

/// A pair of fixtures whose broadphase proxies currently overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyPair {
    /// The first fixture
    pub fixture_a: FixtureHandle,

    /// The second fixture
    pub fixture_b: FixtureHandle,
}

/// Trait for broadphase spatial-overlap providers.
///
/// The step only consumes the pair set; how proxies are partitioned is the
/// implementor's business.
pub trait BroadPhase: Send {
    /// Registers a fixture's proxy and returns its id
    fn create_proxy(&mut self, fixture: FixtureHandle, aabb: Aabb) -> ProxyId;

    /// Updates a proxy's AABB
    fn move_proxy(&mut self, proxy: ProxyId, aabb: Aabb);

    /// Removes a proxy
    fn destroy_proxy(&mut self, proxy: ProxyId);

    /// Returns every pair of proxies whose AABBs currently overlap
    fn pairs(&self) -> Vec<ProxyPair>;
}

/// Brute-force broadphase checking every proxy against every other.
///
/// Proxies live in a BTreeMap so pair enumeration is in stable id order and
/// the step stays deterministic.
pub struct BruteForceBroadPhase {
    proxies: BTreeMap<ProxyId, (FixtureHandle, Aabb)>,
    next_id: ProxyId,
}

impl BruteForceBroadPhase {
    /// Creates a new empty broadphase
    pub fn new() -> Self {
        Self {
            proxies: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl Default for BruteForceBroadPhase {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadPhase for BruteForceBroadPhase {
    fn create_proxy(&mut self, fixture: FixtureHandle, aabb: Aabb) -> ProxyId {
        let id = self.next_id;
        self.next_id += 1;
        self.proxies.insert(id, (fixture, aabb));
        id
    }

    fn move_proxy(&mut self, proxy: ProxyId, aabb: Aabb) {
        if let Some(entry) = self.proxies.get_mut(&proxy) {
            entry.1 = aabb;
        }
    }

    fn destroy_proxy(&mut self, proxy: ProxyId) {
        self.proxies.remove(&proxy);
    }

    fn pairs(&self) -> Vec<ProxyPair> {
        let entries: Vec<_> = self.proxies.values().collect();
        let mut pairs = Vec::new();

        for i in 0..entries.len() {
            let (fixture_a, aabb_a) = entries[i];
            for (fixture_b, aabb_b) in entries.iter().skip(i + 1) {
                if aabb_a.intersects(aabb_b) {
                    pairs.push(ProxyPair {
                        fixture_a: *fixture_a,
                        fixture_b: *fixture_b,
                    });
                }
            }
        }

        pairs
    }
}
