use serde::{Deserialize, Serialize};

use crate::announce::Announcement;
use crate::geometry::Vec2;
use crate::rounds::{LeaderboardEntry, RoundInfo};
use crate::session::{PlayerId, PlayerSession};

/// Messages a client may send. Everything else on the wire is a parse error
/// reported back to that client alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Desired head position, and optionally a new heading.
    Movement {
        position: Vec2,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rotation: Option<f64>,
    },
    /// Dev affordance: begin a round without waiting for the player gate.
    ForceStart,
}

/// One player's slice of a state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: PlayerId,
    pub segments: Vec<Vec2>,
    pub rotation: f64,
    pub alive: bool,
    pub kills: u32,
    pub score: u32,
}

impl From<&PlayerSession> for PlayerState {
    fn from(session: &PlayerSession) -> Self {
        PlayerState {
            id: session.id,
            segments: session.segments.clone(),
            rotation: session.rotation,
            alive: session.alive,
            kills: session.kills,
            score: session.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    Connected {
        id: PlayerId,
        round_number: u32,
        server_time: i64,
        waiting_for_players: bool,
        players_needed: usize,
    },
    #[serde(rename_all = "camelCase")]
    WaitingForPlayers {
        players_needed: usize,
        server_time: i64,
    },
    Announcement { announcement: Announcement },
    #[serde(rename_all = "camelCase")]
    NewRound {
        round_number: u32,
        server_time: i64,
        is_active: bool,
        announcements: Vec<Announcement>,
    },
    #[serde(rename_all = "camelCase")]
    PlayerStates {
        players: Vec<PlayerState>,
        food: Vec<Vec2>,
        round_info: RoundInfo,
        announcements: Vec<Announcement>,
    },
    #[serde(rename_all = "camelCase")]
    Died {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        killed_by: Option<PlayerId>,
    },
    Kill {
        kills: u32,
        score: u32,
        growth: u32,
        victim: PlayerId,
    },
    #[serde(rename_all = "camelCase")]
    LastAlive { message: String, server_time: i64 },
    #[serde(rename_all = "camelCase")]
    AllDead {
        message: String,
        server_time: i64,
        end_time: i64,
    },
    #[serde(rename_all = "camelCase")]
    GameOver {
        winner: PlayerId,
        round_number: u32,
        leaderboard: Vec<LeaderboardEntry>,
        server_time: i64,
        end_time: i64,
    },
    FoodEaten {
        score: u32,
        growth: u32,
        effect: String,
    },
    Error { message: String },
}
