use dashmap::DashMap;
use std::collections::HashSet;
use togetherly_core::{ConnectionId, RoomId};

/// Two-sided index of room membership.
///
/// `rooms` is the authoritative side and its entry lock doubles as the
/// per-room lock: every mutation takes the room entry first and only then the
/// connection entry in `memberships`, so both sides change under one critical
/// section and the lock order can never invert.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<RoomId, HashSet<ConnectionId>>,
    memberships: DashMap<ConnectionId, HashSet<RoomId>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `connection_id` to `room_id`, creating the room if needed.
    ///
    /// Returns the other members as seen at the moment of joining, or `None`
    /// if the connection was already a member. The snapshot is taken under
    /// the room lock, so concurrent joiners are each announced exactly once.
    pub fn join(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Option<Vec<ConnectionId>> {
        let mut members = self.rooms.entry(room_id.clone()).or_default();
        if !members.insert(connection_id.clone()) {
            return None;
        }

        let inserted = self
            .memberships
            .entry(connection_id.clone())
            .or_default()
            .insert(room_id.clone());
        assert!(
            inserted,
            "registry out of sync: {} already listed room {}",
            connection_id, room_id
        );

        Some(others(&members, connection_id))
    }

    /// Removes `connection_id` from `room_id`. Empty rooms are dropped.
    ///
    /// Returns the remaining members as seen under the room lock, or `None`
    /// if the connection was not a member.
    pub fn leave(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Option<Vec<ConnectionId>> {
        let mut members = self.rooms.get_mut(room_id)?;
        if !members.remove(connection_id) {
            return None;
        }
        let remaining = others(&members, connection_id);
        let room_empty = members.is_empty();

        let connection_idle = self
            .memberships
            .get_mut(connection_id)
            .map(|mut rooms| {
                let removed = rooms.remove(room_id);
                assert!(
                    removed,
                    "registry out of sync: {} missing room {}",
                    connection_id, room_id
                );
                rooms.is_empty()
            })
            .unwrap_or(false);
        drop(members);

        // Re-checked under the entry lock in case a join slipped in.
        if connection_idle {
            self.memberships
                .remove_if(connection_id, |_, rooms| rooms.is_empty());
        }
        if room_empty {
            self.rooms.remove_if(room_id, |_, members| members.is_empty());
        }

        Some(remaining)
    }

    /// Snapshot of the room's members other than `connection_id`.
    pub fn members_excluding(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|members| others(&members, connection_id))
            .unwrap_or_default()
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn rooms_of(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        self.memberships
            .get(connection_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of rooms with at least one member.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

fn others(members: &HashSet<ConnectionId>, connection_id: &ConnectionId) -> Vec<ConnectionId> {
    members
        .iter()
        .filter(|id| *id != connection_id)
        .cloned()
        .collect()
}
