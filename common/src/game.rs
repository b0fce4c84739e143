use log::{debug, info};

use crate::announce::{Announcement, AnnouncementBus, Severity};
use crate::collision::{self, CollisionEvent};
use crate::constants::{
    GAME_OVER_RESTART_MS, INACTIVITY_TIMEOUT_MS, MIN_PLAYERS, ROUND_RESTART_MS, WIN_KILLS,
};
use crate::food::FoodManager;
use crate::protocol::{ClientMessage, PlayerState, ServerMessage};
use crate::rounds::{EndReason, RoundPhase, RoundState, leaderboard};
use crate::session::{PlayerId, SessionStore};
use crate::snake;

/// Typed connection events fed into the simulation. The transport layer owns
/// sockets and tasks; the world only ever sees these.
#[derive(Debug, Clone)]
pub enum Inbound {
    Connect(PlayerId),
    Message(PlayerId, ClientMessage),
    Disconnect(PlayerId),
}

/// Directed delivery produced by the simulation for the gateway to fan out.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Broadcast(ServerMessage),
    To(PlayerId, ServerMessage),
    /// Forcibly close this player's connection (inactivity reaping).
    Close(PlayerId),
}

/// The whole game state behind one explicit context struct: session store,
/// food set, round machine, announcement bus. All mutation funnels through
/// `handle`/`tick`/`recheck` under a single writer; nothing here is async and
/// nothing reads the clock on its own.
#[derive(Debug)]
pub struct GameWorld {
    sessions: SessionStore,
    food: FoodManager,
    round: RoundState,
    bus: AnnouncementBus,
}

impl GameWorld {
    pub fn new(now_ms: i64) -> Self {
        GameWorld {
            sessions: SessionStore::new(),
            food: FoodManager::with_full_set(),
            round: RoundState::new(now_ms),
            bus: AnnouncementBus::new(),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn food(&self) -> &FoodManager {
        &self.food
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    /// The next pending round timer, if any. The gateway arms a wakeup for
    /// it so restarts fire on time instead of on tick granularity.
    pub fn next_deadline_ms(&self) -> Option<i64> {
        self.round.round_end_ms()
    }

    pub fn handle(&mut self, event: Inbound, now_ms: i64) -> Vec<Outbound> {
        self.round.server_time_ms = now_ms;
        let mut out = Vec::new();
        match event {
            Inbound::Connect(id) => self.on_connect(id, now_ms, &mut out),
            Inbound::Message(id, msg) => self.on_message(id, msg, now_ms, &mut out),
            Inbound::Disconnect(id) => self.on_disconnect(id, now_ms, &mut out),
        }
        out
    }

    /// The once-per-second background pass: advance the clock, fire due
    /// round timers, start a waiting round, reap idle sessions.
    pub fn tick(&mut self, now_ms: i64) -> Vec<Outbound> {
        self.round.server_time_ms = now_ms;
        let mut out = Vec::new();
        let mut changed = self.fire_due_timers(now_ms, &mut out);
        changed |= self.try_start_round(now_ms, &mut out);
        changed |= self.reap_inactive(now_ms, &mut out);
        if changed {
            self.broadcast_state(now_ms, &mut out);
        }
        out
    }

    /// Debounced re-evaluation after a disconnect has settled.
    pub fn recheck(&mut self, now_ms: i64) -> Vec<Outbound> {
        self.round.server_time_ms = now_ms;
        let mut out = Vec::new();
        self.check_player_count(now_ms, &mut out);
        self.try_start_round(now_ms, &mut out);
        self.check_alive(now_ms, &mut out);
        self.broadcast_state(now_ms, &mut out);
        out
    }

    fn players_needed(&self) -> usize {
        MIN_PLAYERS.saturating_sub(self.sessions.len())
    }

    fn on_connect(&mut self, id: PlayerId, now_ms: i64, out: &mut Vec<Outbound>) {
        self.sessions.create(id, now_ms);
        info!(
            "player {} connected ({} online)",
            id.short(),
            self.sessions.len()
        );
        out.push(Outbound::To(
            id,
            ServerMessage::Connected {
                id,
                round_number: self.round.number,
                server_time: now_ms,
                waiting_for_players: self.round.is_waiting(),
                players_needed: self.players_needed(),
            },
        ));
        if self.round.is_waiting() && self.sessions.len() < MIN_PLAYERS {
            out.push(Outbound::Broadcast(ServerMessage::WaitingForPlayers {
                players_needed: self.players_needed(),
                server_time: now_ms,
            }));
        } else {
            self.try_start_round(now_ms, out);
        }
        self.broadcast_state(now_ms, out);
    }

    fn on_disconnect(&mut self, id: PlayerId, now_ms: i64, out: &mut Vec<Outbound>) {
        if self.sessions.remove(id).is_none() {
            return;
        }
        info!(
            "player {} disconnected ({} online)",
            id.short(),
            self.sessions.len()
        );
        self.check_player_count(now_ms, out);
        self.broadcast_state(now_ms, out);
    }

    fn on_message(
        &mut self,
        id: PlayerId,
        msg: ClientMessage,
        now_ms: i64,
        out: &mut Vec<Outbound>,
    ) {
        // A message racing its own disconnect is dropped quietly.
        match self.sessions.get_mut(id) {
            Some(session) => session.last_activity_ms = now_ms,
            None => return,
        }

        match msg {
            ClientMessage::ForceStart => {
                info!("player {} forced a round start", id.short());
                self.start_round(false, now_ms, out);
                self.broadcast_state(now_ms, out);
            }
            ClientMessage::Movement { position, rotation } => {
                if !self.round.is_active() {
                    // Idle movement still counts toward getting a round going.
                    if self.try_start_round(now_ms, out) {
                        self.broadcast_state(now_ms, out);
                    }
                    return;
                }
                {
                    let Some(session) = self.sessions.get_mut(id) else {
                        return;
                    };
                    if !session.alive {
                        return;
                    }
                    if let Some(rotation) = rotation {
                        session.rotation = rotation;
                    }
                    snake::advance(&mut session.segments, &mut session.pending_growth, position);
                }

                let mut events = Vec::new();
                collision::resolve_food(&mut self.sessions, &mut self.food, id, &mut events);
                collision::resolve_snakes(&mut self.sessions, id, &mut events);
                self.emit_collision_events(events, now_ms, out);

                self.check_win(now_ms, out);
                self.check_alive(now_ms, out);
                self.broadcast_state(now_ms, out);
            }
        }
    }

    fn emit_collision_events(
        &mut self,
        events: Vec<CollisionEvent>,
        now_ms: i64,
        out: &mut Vec<Outbound>,
    ) {
        for event in events {
            match event {
                CollisionEvent::FoodEaten {
                    player,
                    score,
                    growth,
                } => {
                    out.push(Outbound::To(
                        player,
                        ServerMessage::FoodEaten {
                            score,
                            growth,
                            effect: "grow".to_string(),
                        },
                    ));
                }
                CollisionEvent::ScoreMilestone { player, score } => {
                    self.announce(
                        format!("Player {} reached {} points", player.short(), score),
                        Severity::Success,
                        now_ms,
                        out,
                    );
                }
                CollisionEvent::LengthMilestone { player, length } => {
                    self.announce(
                        format!("Player {} grew to {} segments", player.short(), length),
                        Severity::Success,
                        now_ms,
                        out,
                    );
                }
                CollisionEvent::HeadToHead { mover, other } => {
                    let died = ServerMessage::Died {
                        reason: "head-on collision".to_string(),
                        killed_by: None,
                    };
                    out.push(Outbound::To(mover, died.clone()));
                    out.push(Outbound::To(other, died));
                    self.announce(
                        "Two snakes collided head-on",
                        Severity::Warning,
                        now_ms,
                        out,
                    );
                }
                CollisionEvent::TailKill {
                    victim,
                    killer,
                    kills,
                    score,
                    growth,
                    counter: _,
                } => {
                    out.push(Outbound::To(
                        victim,
                        ServerMessage::Died {
                            reason: "collision".to_string(),
                            killed_by: Some(killer),
                        },
                    ));
                    out.push(Outbound::To(
                        killer,
                        ServerMessage::Kill {
                            kills,
                            score,
                            growth,
                            victim,
                        },
                    ));
                }
                CollisionEvent::KillStreak { player, kills } => {
                    let text = if kills == WIN_KILLS - 1 {
                        format!("Player {} is one kill from victory", player.short())
                    } else {
                        format!("Player {} is on a rampage with {} kills", player.short(), kills)
                    };
                    self.announce(text, Severity::Warning, now_ms, out);
                }
            }
        }
    }

    fn announce(
        &mut self,
        text: impl Into<String>,
        kind: Severity,
        now_ms: i64,
        out: &mut Vec<Outbound>,
    ) {
        let announcement = Announcement::new(text, kind);
        self.bus.push(announcement.clone(), now_ms);
        out.push(Outbound::Broadcast(ServerMessage::Announcement {
            announcement,
        }));
    }

    /// Starts (or restarts) a round if enough players are waiting.
    fn try_start_round(&mut self, now_ms: i64, out: &mut Vec<Outbound>) -> bool {
        if self.round.is_waiting() && self.sessions.len() >= MIN_PLAYERS {
            self.start_round(false, now_ms, out);
            true
        } else {
            false
        }
    }

    /// Re-entrant round entry. The ordinary path respawns dead players and
    /// leaves everyone else alone; the game-over path repositions everybody,
    /// wipes kills and scores, bumps the round number and reshuffles food.
    fn start_round(&mut self, game_over: bool, now_ms: i64, out: &mut Vec<Outbound>) {
        if game_over {
            self.round.number += 1;
            self.food.reshuffle();
            for session in self.sessions.iter_mut() {
                session.reset_for_new_game();
            }
        } else {
            for session in self.sessions.iter_mut() {
                if !session.alive {
                    session.respawn();
                }
            }
        }
        self.round.phase = RoundPhase::Active;
        self.round.respawn_at_ms = None;
        info!(
            "round {} active with {} players",
            self.round.number,
            self.sessions.len()
        );
        out.push(Outbound::Broadcast(ServerMessage::NewRound {
            round_number: self.round.number,
            server_time: now_ms,
            is_active: true,
            announcements: self.bus.recent(now_ms),
        }));
    }

    fn check_win(&mut self, now_ms: i64, out: &mut Vec<Outbound>) {
        if !self.round.is_active() {
            return;
        }
        let Some(winner) = self
            .sessions
            .iter()
            .find(|s| s.kills >= WIN_KILLS)
            .map(|s| s.id)
        else {
            return;
        };
        let ends_at_ms = now_ms + GAME_OVER_RESTART_MS;
        self.round.phase = RoundPhase::Ending {
            ends_at_ms,
            reason: EndReason::GameOver { winner },
        };
        self.round.respawn_at_ms = None;
        info!(
            "round {} over: player {} reached {} kills",
            self.round.number,
            winner.short(),
            WIN_KILLS
        );
        self.bus.clear();
        self.announce(
            format!("Player {} wins round {}", winner.short(), self.round.number),
            Severity::Success,
            now_ms,
            out,
        );
        out.push(Outbound::Broadcast(ServerMessage::GameOver {
            winner,
            round_number: self.round.number,
            leaderboard: leaderboard(self.sessions.iter()),
            server_time: now_ms,
            end_time: ends_at_ms,
        }));
    }

    fn check_alive(&mut self, now_ms: i64, out: &mut Vec<Outbound>) {
        if !self.round.is_active() {
            return;
        }
        let total = self.sessions.len();
        if total == 0 {
            return;
        }
        let alive = self.sessions.alive_count();
        if alive == 1 && total > 1 {
            if self.round.respawn_at_ms.is_some() {
                return;
            }
            if let Some(survivor) = self.sessions.iter().find(|s| s.alive).map(|s| s.id) {
                out.push(Outbound::To(
                    survivor,
                    ServerMessage::LastAlive {
                        message: "You are the last snake standing".to_string(),
                        server_time: now_ms,
                    },
                ));
            }
            self.announce("Only one snake remains", Severity::Warning, now_ms, out);
            self.round.respawn_at_ms = Some(now_ms + ROUND_RESTART_MS);
        } else if alive == 0 {
            let ends_at_ms = now_ms + ROUND_RESTART_MS;
            self.round.phase = RoundPhase::Ending {
                ends_at_ms,
                reason: EndReason::AllDead,
            };
            self.round.respawn_at_ms = None;
            out.push(Outbound::Broadcast(ServerMessage::AllDead {
                message: "All snakes are down".to_string(),
                server_time: now_ms,
                end_time: ends_at_ms,
            }));
            self.announce(
                "Everyone is down, restarting shortly",
                Severity::Warning,
                now_ms,
                out,
            );
        }
    }

    /// Any state, below the player floor: back to the lobby.
    fn check_player_count(&mut self, now_ms: i64, out: &mut Vec<Outbound>) {
        if self.sessions.len() < MIN_PLAYERS && !self.round.is_waiting() {
            self.round.phase = RoundPhase::WaitingForPlayers;
            self.round.respawn_at_ms = None;
            info!("waiting for players: {} more needed", self.players_needed());
            out.push(Outbound::Broadcast(ServerMessage::WaitingForPlayers {
                players_needed: self.players_needed(),
                server_time: now_ms,
            }));
        }
    }

    fn fire_due_timers(&mut self, now_ms: i64, out: &mut Vec<Outbound>) -> bool {
        let mut changed = false;

        if let Some(at) = self.round.respawn_at_ms {
            if self.round.is_active() && now_ms >= at {
                self.start_round(false, now_ms, out);
                changed = true;
            } else if !self.round.is_active() {
                self.round.respawn_at_ms = None;
            }
        }

        if let RoundPhase::Ending { ends_at_ms, reason } = self.round.phase {
            if now_ms >= ends_at_ms {
                let game_over = matches!(reason, EndReason::GameOver { .. });
                if self.sessions.len() >= MIN_PLAYERS {
                    self.start_round(game_over, now_ms, out);
                } else {
                    // The win still closes out the game even if the table
                    // emptied during the end timer.
                    if game_over {
                        self.round.number += 1;
                        self.food.reshuffle();
                        for session in self.sessions.iter_mut() {
                            session.reset_for_new_game();
                        }
                    }
                    self.round.phase = RoundPhase::WaitingForPlayers;
                    self.round.respawn_at_ms = None;
                    out.push(Outbound::Broadcast(ServerMessage::WaitingForPlayers {
                        players_needed: self.players_needed(),
                        server_time: now_ms,
                    }));
                }
                changed = true;
            }
        }

        changed
    }

    fn reap_inactive(&mut self, now_ms: i64, out: &mut Vec<Outbound>) -> bool {
        let stale: Vec<PlayerId> = self
            .sessions
            .iter()
            .filter(|s| now_ms - s.last_activity_ms > INACTIVITY_TIMEOUT_MS)
            .map(|s| s.id)
            .collect();
        if stale.is_empty() {
            return false;
        }
        for id in stale {
            debug!("reaping inactive player {}", id.short());
            self.sessions.remove(id);
            out.push(Outbound::Close(id));
        }
        self.check_player_count(now_ms, out);
        self.check_alive(now_ms, out);
        true
    }

    fn broadcast_state(&mut self, now_ms: i64, out: &mut Vec<Outbound>) {
        let players: Vec<PlayerState> = self.sessions.iter().map(PlayerState::from).collect();
        out.push(Outbound::Broadcast(ServerMessage::PlayerStates {
            players,
            food: self.food.items().to_vec(),
            round_info: self.round.info(),
            announcements: self.bus.recent(now_ms),
        }));
    }
}
