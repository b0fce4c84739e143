/// Playfield width in world units
pub const MAP_WIDTH: f64 = 4000.0;

/// Playfield height in world units
pub const MAP_HEIGHT: f64 = 4000.0;

/// Width of the centered rectangle new players spawn into
pub const SPAWN_AREA_WIDTH: f64 = 1000.0;

/// Height of the centered rectangle new players spawn into
pub const SPAWN_AREA_HEIGHT: f64 = 1000.0;

/// Collision radius of one body segment
pub const SEGMENT_RADIUS: f64 = 10.0;

/// Collision radius of one food item
pub const FOOD_RADIUS: f64 = 8.0;

/// Target distance between adjacent body segments
pub const SEGMENT_SPACING: f64 = 16.0;

/// A follower only corrects once it lags more than this multiple of the spacing
pub const FOLLOW_SLACK: f64 = 1.2;

/// Fraction of the follow correction applied per movement update
pub const FOLLOW_LERP: f64 = 0.5;

/// Number of food items kept live on the map
pub const FOOD_COUNT: usize = 300;

/// Score awarded per food item
pub const FOOD_SCORE: u32 = 1;

/// Pending-growth segments awarded per food item
pub const FOOD_GROWTH: u32 = 2;

/// Score awarded for a kill detected by the victim running into your tail
pub const KILL_SCORE: u32 = 5;

/// Pending-growth segments awarded per kill
pub const KILL_GROWTH: u32 = 5;

/// Smaller score for a kill detected while the victim's own update ran
pub const COUNTER_KILL_SCORE: u32 = 3;

/// Kill count that ends the round
pub const WIN_KILLS: u32 = 10;

/// Connected players required for a round to run
pub const MIN_PLAYERS: usize = 2;

/// Score interval that triggers a milestone announcement
pub const SCORE_MILESTONE: u32 = 50;

/// Kill count that triggers the rampage announcement
pub const KILL_STREAK_NOTICE: u32 = 5;

/// Delay between a threshold win and the next round, in milliseconds
pub const GAME_OVER_RESTART_MS: i64 = 5000;

/// Delay before dead players respawn after a wipe, in milliseconds
pub const ROUND_RESTART_MS: i64 = 3000;

/// Retained announcements expire after this many milliseconds
pub const ANNOUNCEMENT_TTL_MS: i64 = 3000;

/// Sessions idle longer than this are reaped, in milliseconds
pub const INACTIVITY_TIMEOUT_MS: i64 = 60_000;

/// Interval of the background simulation tick, in milliseconds
pub const TICK_INTERVAL_MS: u64 = 1000;

/// Settle time before round state is re-evaluated after a disconnect
pub const DISCONNECT_DEBOUNCE_MS: u64 = 100;
