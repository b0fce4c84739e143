use std::collections::HashMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{MAP_HEIGHT, MAP_WIDTH, SPAWN_AREA_HEIGHT, SPAWN_AREA_WIDTH};
use crate::geometry::Vec2;

/// Opaque server-generated player identifier, not tied to any network address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn random() -> Self {
        PlayerId(Uuid::new_v4())
    }

    /// Short prefix used when naming a player in announcements.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..6].to_string()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Server-side record for one connected player.
#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub id: PlayerId,
    /// Body segments, head first. Never empty while the session exists.
    pub segments: Vec<Vec2>,
    pub rotation: f64,
    pub alive: bool,
    pub last_activity_ms: i64,
    pub kills: u32,
    pub score: u32,
    /// Segments owed to the snake but not yet appended.
    pub pending_growth: u32,
}

impl PlayerSession {
    fn new(id: PlayerId, now_ms: i64) -> Self {
        PlayerSession {
            id,
            segments: vec![spawn_point()],
            rotation: 0.0,
            alive: true,
            last_activity_ms: now_ms,
            kills: 0,
            score: 0,
            pending_growth: 0,
        }
    }

    pub fn head(&self) -> Vec2 {
        *self.segments.first().expect("session body should not be empty")
    }

    /// Live segments plus the growth still owed.
    pub fn total_length(&self) -> u32 {
        self.segments.len() as u32 + self.pending_growth
    }

    /// Put the player back on the field. Kills and score persist.
    pub fn respawn(&mut self) {
        self.segments = vec![spawn_point()];
        self.rotation = 0.0;
        self.alive = true;
        self.pending_growth = 0;
    }

    /// Respawn for a fresh game: kills and score are wiped too.
    pub fn reset_for_new_game(&mut self) {
        self.respawn();
        self.kills = 0;
        self.score = 0;
    }
}

/// Random position inside the centered spawn rectangle.
fn spawn_point() -> Vec2 {
    let mut rng = rand::thread_rng();
    let left = (MAP_WIDTH - SPAWN_AREA_WIDTH) / 2.0;
    let top = (MAP_HEIGHT - SPAWN_AREA_HEIGHT) / 2.0;
    Vec2::new(
        left + rng.gen_range(0.0..SPAWN_AREA_WIDTH),
        top + rng.gen_range(0.0..SPAWN_AREA_HEIGHT),
    )
}

/// Sole owner of all player sessions. Other components reach sessions only
/// through lookup and iteration here, never through private copies.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<PlayerId, PlayerSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore::default()
    }

    pub fn create(&mut self, id: PlayerId, now_ms: i64) {
        self.sessions.insert(id, PlayerSession::new(id, now_ms));
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<PlayerSession> {
        self.sessions.remove(&id)
    }

    pub fn get(&self, id: PlayerId) -> Option<&PlayerSession> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut PlayerSession> {
        self.sessions.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.sessions.values().filter(|s| s.alive).count()
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.sessions.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerSession> {
        self.sessions.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlayerSession> {
        self.sessions.values_mut()
    }
}
