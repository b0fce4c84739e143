use serde::{Deserialize, Serialize};

use crate::session::{PlayerId, PlayerSession};

/// Why a round is winding down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Every connected player is dead; respawn shortly, scores persist.
    AllDead,
    /// Someone hit the kill threshold; full reset after the end timer.
    GameOver { winner: PlayerId },
}

/// The one round phase. A single tagged value replaces the independent
/// `isActive`/`waitingForPlayers`/`gameOver` booleans so contradictory flag
/// combinations cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundPhase {
    WaitingForPlayers,
    Active,
    Ending { ends_at_ms: i64, reason: EndReason },
}

/// Process-wide round bookkeeping, owned by the simulation context.
#[derive(Debug)]
pub struct RoundState {
    /// Monotonic; incremented only when a threshold win restarts the game.
    pub number: u32,
    pub phase: RoundPhase,
    pub server_time_ms: i64,
    /// Pending dead-player respawn while the round stays active (the
    /// last-snake-standing case).
    pub respawn_at_ms: Option<i64>,
}

impl RoundState {
    pub fn new(now_ms: i64) -> Self {
        RoundState {
            number: 1,
            phase: RoundPhase::WaitingForPlayers,
            server_time_ms: now_ms,
            respawn_at_ms: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase == RoundPhase::Active
    }

    pub fn is_waiting(&self) -> bool {
        self.phase == RoundPhase::WaitingForPlayers
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.phase {
            RoundPhase::Ending {
                reason: EndReason::GameOver { winner },
                ..
            } => Some(winner),
            _ => None,
        }
    }

    /// The next pending timer, whichever comes first.
    pub fn round_end_ms(&self) -> Option<i64> {
        match self.phase {
            RoundPhase::Ending { ends_at_ms, .. } => Some(ends_at_ms),
            RoundPhase::Active => self.respawn_at_ms,
            RoundPhase::WaitingForPlayers => None,
        }
    }

    /// The wire-visible view of the round.
    pub fn info(&self) -> RoundInfo {
        RoundInfo {
            round_number: self.number,
            is_active: self.is_active(),
            waiting_for_players: self.is_waiting(),
            winner: self.winner(),
            round_end_time: self.round_end_ms(),
            server_time: self.server_time_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundInfo {
    pub round_number: u32,
    pub is_active: bool,
    pub waiting_for_players: bool,
    pub winner: Option<PlayerId>,
    pub round_end_time: Option<i64>,
    pub server_time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: PlayerId,
    pub kills: u32,
    pub score: u32,
}

/// All sessions ranked by kills descending. Score rides along for display
/// but deliberately does not break ties.
pub fn leaderboard<'a>(sessions: impl Iterator<Item = &'a PlayerSession>) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = sessions
        .map(|s| LeaderboardEntry {
            id: s.id,
            kills: s.kills,
            score: s.score,
        })
        .collect();
    entries.sort_by(|a, b| b.kills.cmp(&a.kills));
    entries
}
