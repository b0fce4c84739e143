pub mod announce;
pub mod collision;
pub mod constants;
pub mod food;
pub mod game;
pub mod geometry;
pub mod protocol;
pub mod rounds;
pub mod session;
pub mod snake;

pub use announce::{Announcement, AnnouncementBus, Severity};
pub use constants::*;
pub use game::{GameWorld, Inbound, Outbound};
pub use geometry::Vec2;
pub use protocol::{ClientMessage, PlayerState, ServerMessage};
pub use rounds::{EndReason, LeaderboardEntry, RoundInfo, RoundPhase, RoundState};
pub use session::{PlayerId, PlayerSession, SessionStore};
