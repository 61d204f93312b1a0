use crate::bodies::PhysicsBody;
use crate::collision::{Contact, ContactId, NarrowPhase, ProxyPair};
use crate::core::{
    BodyHandle, CollisionBehavior, CollisionEvent, CollisionEventType, EventQueue, FixtureHandle,
    PhysicsCommands, Storage,
};
use crate::fixtures::Fixture;
use crate::math::Vec2;

use std::collections::{BTreeMap, HashMap};

/// Owns the global contact list and keeps it consistent with the broadphase.
///
/// Contacts persist across ticks; only their manifolds, touching state and
/// per-tick island flags change. All passes iterate in ascending contact id
/// order so the step stays deterministic.
pub struct ContactManager {
    contacts: BTreeMap<ContactId, Contact>,
    pair_map: HashMap<(FixtureHandle, FixtureHandle), ContactId>,
    next_id: u32,
}

impl ContactManager {
    /// Creates a new empty contact manager
    pub fn new() -> Self {
        Self {
            contacts: BTreeMap::new(),
            pair_map: HashMap::new(),
            next_id: 1,
        }
    }

    /// Returns the number of live contacts
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// Gets a contact by id
    pub fn contact(&self, id: ContactId) -> Option<&Contact> {
        self.contacts.get(&id)
    }

    /// Gets a mutable contact by id
    pub(crate) fn contact_mut(&mut self, id: ContactId) -> Option<&mut Contact> {
        self.contacts.get_mut(&id)
    }

    /// Returns an iterator over all contacts in id order
    pub fn contacts(&self) -> impl Iterator<Item = (ContactId, &Contact)> {
        self.contacts.iter().map(|(id, c)| (*id, c))
    }

    /// Returns the contact id tracking a fixture pair, if one exists
    pub fn contact_for_pair(
        &self,
        fixture_a: FixtureHandle,
        fixture_b: FixtureHandle,
    ) -> Option<ContactId> {
        self.pair_map.get(&pair_key(fixture_a, fixture_b)).copied()
    }

    /// Creates contacts for broadphase pairs that do not have one yet.
    ///
    /// A pair is skipped when both fixtures belong to the same body, either
    /// body opted out of collision, or the layer/mask filters do not
    /// intersect. Existing pairs are a no-op.
    pub fn find_new_contacts(
        &mut self,
        pairs: &[ProxyPair],
        bodies: &mut Storage<PhysicsBody, BodyHandle>,
        fixtures: &Storage<Fixture, FixtureHandle>,
    ) {
        for pair in pairs {
            let key = pair_key(pair.fixture_a, pair.fixture_b);
            if self.pair_map.contains_key(&key) {
                continue;
            }

            let (Some(fixture_a), Some(fixture_b)) =
                (fixtures.get(key.0), fixtures.get(key.1))
            else {
                continue;
            };

            let body_a = fixture_a.body();
            let body_b = fixture_b.body();
            if body_a == body_b {
                continue;
            }
            if !fixture_a.should_collide(fixture_b) {
                continue;
            }

            let collidable = bodies.get(body_a).is_some_and(|b| b.can_collide())
                && bodies.get(body_b).is_some_and(|b| b.can_collide());
            if !collidable {
                continue;
            }

            let hard = fixture_a.hard && fixture_b.hard;
            let mut contact = Contact::new(key.0, key.1, body_a, body_b, hard);
            contact.friction = fixture_a.material.friction.min(fixture_b.material.friction);
            contact.restitution = fixture_a
                .material
                .restitution
                .max(fixture_b.material.restitution);

            let id = ContactId(self.next_id);
            self.next_id += 1;
            self.contacts.insert(id, contact);
            self.pair_map.insert(key, id);

            if let Some(body) = bodies.get_mut(body_a) {
                body.add_contact_edge(id);
            }
            if let Some(body) = bodies.get_mut(body_b) {
                body.add_contact_edge(id);
            }
        }
    }

    /// Refreshes every contact: destroys pairs whose proxies stopped
    /// overlapping or whose fixtures vanished, and runs the narrow phase on
    /// the survivors to update manifolds and touching state.
    pub fn collide(
        &mut self,
        bodies: &mut Storage<PhysicsBody, BodyHandle>,
        fixtures: &Storage<Fixture, FixtureHandle>,
        narrow_phase: &dyn NarrowPhase,
        events: &mut EventQueue,
    ) {
        let ids: Vec<ContactId> = self.contacts.keys().copied().collect();

        for id in ids {
            let (fh_a, fh_b, body_a, body_b) = {
                let Some(contact) = self.contacts.get(&id) else {
                    continue;
                };
                (
                    contact.fixture_a,
                    contact.fixture_b,
                    contact.body_a,
                    contact.body_b,
                )
            };

            // A stale fixture or body reference invalidates the contact.
            let (Some(fixture_a), Some(fixture_b)) = (fixtures.get(fh_a), fixtures.get(fh_b))
            else {
                self.destroy_contact(id, bodies, events);
                continue;
            };

            let collidable = bodies.get(body_a).is_some_and(|b| b.can_collide())
                && bodies.get(body_b).is_some_and(|b| b.can_collide());
            if !collidable {
                self.destroy_contact(id, bodies, events);
                continue;
            }

            let overlap = match (fixture_a.proxy(), fixture_b.proxy()) {
                (Some(pa), Some(pb)) => pa.aabb.intersects(&pb.aabb),
                _ => false,
            };
            if !overlap {
                self.destroy_contact(id, bodies, events);
                continue;
            }

            let transform_a = bodies.get(body_a).map(|b| b.transform());
            let transform_b = bodies.get(body_b).map(|b| b.transform());
            let (Some(transform_a), Some(transform_b)) = (transform_a, transform_b) else {
                self.destroy_contact(id, bodies, events);
                continue;
            };

            let manifold = narrow_phase.collide(
                fixture_a.shape.as_ref(),
                &transform_a,
                fixture_b.shape.as_ref(),
                &transform_b,
            );

            let Some(contact) = self.contacts.get_mut(&id) else {
                continue;
            };
            let was_touching = contact.touching;

            match manifold {
                Some(mut manifold) if contact.enabled => {
                    manifold.inherit_impulses(&contact.manifold);
                    contact.manifold = manifold;
                    contact.touching = true;
                }
                _ => {
                    contact.manifold.points.clear();
                    contact.touching = false;
                }
            }

            let (touching, body_a, body_b, normal, hard) = (
                contact.touching,
                contact.body_a,
                contact.body_b,
                contact.manifold.normal,
                contact.hard,
            );

            if touching && !was_touching {
                // A fresh touch wakes both ends of the contact.
                wake_pair(bodies, body_a, body_b, events);
                events.add_collision_event(CollisionEvent {
                    event_type: CollisionEventType::Begin,
                    body_a,
                    body_b,
                    normal,
                    hard,
                });
            } else if touching && was_touching {
                events.add_collision_event(CollisionEvent {
                    event_type: CollisionEventType::Persist,
                    body_a,
                    body_b,
                    normal,
                    hard,
                });
            } else if !touching && was_touching {
                events.add_collision_event(CollisionEvent {
                    event_type: CollisionEventType::End,
                    body_a,
                    body_b,
                    normal: Vec2::zeros(),
                    hard,
                });
            }
        }
    }

    /// Runs collision behaviors for every touching, enabled contact.
    ///
    /// Each behavior sees `on_collide` once per touching contact on its body
    /// and `post_collide` once with the tick's hit count. A side whose body
    /// has a removal staged is skipped from that point on.
    pub fn pre_solve(
        &mut self,
        dt: f32,
        behaviors: &mut HashMap<BodyHandle, Vec<Box<dyn CollisionBehavior>>>,
        commands: &mut PhysicsCommands,
    ) {
        if behaviors.is_empty() {
            return;
        }

        let mut hit_counts: HashMap<(BodyHandle, usize), u32> = HashMap::new();

        for contact in self.contacts.values() {
            if !contact.touching || !contact.enabled {
                continue;
            }

            for (ours, other) in [
                (contact.body_a, contact.body_b),
                (contact.body_b, contact.body_a),
            ] {
                if commands.removal_queued(ours) || commands.removal_queued(other) {
                    continue;
                }
                let Some(list) = behaviors.get_mut(&ours) else {
                    continue;
                };
                for (idx, behavior) in list.iter_mut().enumerate() {
                    behavior.on_collide(ours, other, dt, commands);
                    *hit_counts.entry((ours, idx)).or_insert(0) += 1;
                }
            }
        }

        let mut hit: Vec<((BodyHandle, usize), u32)> = hit_counts.into_iter().collect();
        hit.sort_by_key(|&(key, _)| key);
        for ((body, idx), count) in hit {
            if commands.removal_queued(body) {
                continue;
            }
            if let Some(list) = behaviors.get_mut(&body) {
                if let Some(behavior) = list.get_mut(idx) {
                    behavior.post_collide(count, dt, commands);
                }
            }
        }
    }

    /// Enables or disables a contact. Disabled contacts are skipped by
    /// island building and solving until re-enabled; the bodies need not be
    /// re-woken for the change to take effect.
    pub fn set_contact_enabled(&mut self, id: ContactId, enabled: bool) -> bool {
        match self.contacts.get_mut(&id) {
            Some(contact) => {
                contact.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Clears per-tick island bookkeeping on all contacts
    pub fn post_solve(&mut self) {
        for contact in self.contacts.values_mut() {
            contact.island_flag = false;
        }
    }

    /// Destroys a contact, unhooking it from both bodies' edge lists and
    /// emitting an `End` event if it was touching.
    pub(crate) fn destroy_contact(
        &mut self,
        id: ContactId,
        bodies: &mut Storage<PhysicsBody, BodyHandle>,
        events: &mut EventQueue,
    ) {
        let Some(contact) = self.contacts.remove(&id) else {
            return;
        };
        self.pair_map
            .remove(&pair_key(contact.fixture_a, contact.fixture_b));

        if let Some(body) = bodies.get_mut(contact.body_a) {
            body.remove_contact_edge(id);
        }
        if let Some(body) = bodies.get_mut(contact.body_b) {
            body.remove_contact_edge(id);
        }

        if contact.touching {
            events.add_collision_event(CollisionEvent {
                event_type: CollisionEventType::End,
                body_a: contact.body_a,
                body_b: contact.body_b,
                normal: Vec2::zeros(),
                hard: contact.hard,
            });
        }
    }

    /// Destroys every contact involving the given fixture
    pub(crate) fn destroy_contacts_for_fixture(
        &mut self,
        fixture: FixtureHandle,
        bodies: &mut Storage<PhysicsBody, BodyHandle>,
        events: &mut EventQueue,
    ) {
        let ids: Vec<ContactId> = self
            .contacts
            .iter()
            .filter(|(_, c)| c.fixture_a == fixture || c.fixture_b == fixture)
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            self.destroy_contact(id, bodies, events);
        }
    }
}

impl Default for ContactManager {
    fn default() -> Self {
        Self::new()
    }
}

fn pair_key(a: FixtureHandle, b: FixtureHandle) -> (FixtureHandle, FixtureHandle) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn wake_pair(
    bodies: &mut Storage<PhysicsBody, BodyHandle>,
    body_a: BodyHandle,
    body_b: BodyHandle,
    events: &mut EventQueue,
) {
    use crate::core::{BodyEvent, BodyEventType};

    for handle in [body_a, body_b] {
        if let Some(body) = bodies.get_mut(handle) {
            if !body.is_awake() && body.body_type().is_mobile() {
                body.wake_up();
                events.add_body_event(BodyEvent {
                    event_type: BodyEventType::Awake,
                    body: handle,
                });
            }
        }
    }
}
