use crate::constants::{
    COUNTER_KILL_SCORE, FOOD_GROWTH, FOOD_RADIUS, FOOD_SCORE, KILL_GROWTH, KILL_SCORE,
    KILL_STREAK_NOTICE, SCORE_MILESTONE, SEGMENT_RADIUS, WIN_KILLS,
};
use crate::food::FoodManager;
use crate::session::{PlayerId, SessionStore};

/// What a collision pass did to the world. The simulation context turns
/// these into protocol messages and announcements.
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionEvent {
    /// `score` and `growth` are the player's totals after this item.
    FoodEaten {
        player: PlayerId,
        score: u32,
        growth: u32,
    },
    ScoreMilestone {
        player: PlayerId,
        score: u32,
    },
    LengthMilestone {
        player: PlayerId,
        length: u32,
    },
    /// Both heads met; both players are down, nobody is credited.
    HeadToHead {
        mover: PlayerId,
        other: PlayerId,
    },
    /// `kills`/`score`/`growth` are the killer's totals after crediting.
    /// `counter` marks the reverse check, which pays the smaller reward.
    TailKill {
        victim: PlayerId,
        killer: PlayerId,
        kills: u32,
        score: u32,
        growth: u32,
        counter: bool,
    },
    KillStreak {
        player: PlayerId,
        kills: u32,
    },
}

/// Food pass for one moved player: consume everything in reach of the head,
/// credit score and growth per item, and surface milestone crossings.
pub fn resolve_food(
    store: &mut SessionStore,
    food: &mut FoodManager,
    mover: PlayerId,
    events: &mut Vec<CollisionEvent>,
) {
    let head = match store.get(mover) {
        Some(s) if s.alive => s.head(),
        _ => return,
    };

    let reach = SEGMENT_RADIUS + FOOD_RADIUS;
    let reach_sq = reach * reach;
    let hits: Vec<usize> = food
        .items()
        .iter()
        .enumerate()
        .filter(|(_, item)| head.distance_squared(**item) <= reach_sq)
        .map(|(index, _)| index)
        .collect();
    if hits.is_empty() {
        return;
    }

    // Consume back to front so earlier indices stay valid; each consume
    // pushes its replacement at the end, outside the scanned range.
    for &index in hits.iter().rev() {
        food.consume(index);
    }

    let Some(session) = store.get_mut(mover) else {
        return;
    };
    for _ in 0..hits.len() {
        session.score += FOOD_SCORE;
        session.pending_growth += FOOD_GROWTH;
        events.push(CollisionEvent::FoodEaten {
            player: mover,
            score: session.score,
            growth: session.pending_growth,
        });
        if session.score >= SCORE_MILESTONE && session.score % SCORE_MILESTONE == 0 {
            events.push(CollisionEvent::ScoreMilestone {
                player: mover,
                score: session.score,
            });
        }
        let length = session.total_length();
        if length == 50 || length == 100 {
            events.push(CollisionEvent::LengthMilestone {
                player: mover,
                length,
            });
        }
    }
}

/// Snake pass for one moved player against every other alive session.
pub fn resolve_snakes(store: &mut SessionStore, mover: PlayerId, events: &mut Vec<CollisionEvent>) {
    let (mover_head, mover_segments) = match store.get(mover) {
        Some(s) if s.alive => (s.head(), s.segments.clone()),
        _ => return,
    };

    let collide = 2.0 * SEGMENT_RADIUS;
    let collide_sq = collide * collide;

    let others: Vec<PlayerId> = store
        .iter()
        .filter(|s| s.id != mover && s.alive && !s.segments.is_empty())
        .map(|s| s.id)
        .collect();

    for other_id in others {
        let Some(other) = store.get(other_id) else {
            continue;
        };
        let other_head = other.head();
        // Only the first (lowest-index) matching tail segment resolves a hit.
        let mover_hit_tail = other
            .segments
            .iter()
            .skip(1)
            .position(|seg| mover_head.distance_squared(*seg) <= collide_sq);
        let other_hit_tail = mover_segments
            .iter()
            .skip(1)
            .position(|seg| other_head.distance_squared(*seg) <= collide_sq);

        if mover_head.distance_squared(other_head) <= collide_sq {
            if let Some(s) = store.get_mut(mover) {
                s.alive = false;
            }
            if let Some(s) = store.get_mut(other_id) {
                s.alive = false;
            }
            events.push(CollisionEvent::HeadToHead {
                mover,
                other: other_id,
            });
        }

        if mover_hit_tail.is_some() {
            if let Some(s) = store.get_mut(mover) {
                s.alive = false;
            }
            if let Some(other) = store.get_mut(other_id) {
                other.kills += 1;
                other.score += KILL_SCORE;
                other.pending_growth += KILL_GROWTH;
                events.push(CollisionEvent::TailKill {
                    victim: mover,
                    killer: other_id,
                    kills: other.kills,
                    score: other.score,
                    growth: other.pending_growth,
                    counter: false,
                });
                if other.kills == KILL_STREAK_NOTICE || other.kills == WIN_KILLS - 1 {
                    events.push(CollisionEvent::KillStreak {
                        player: other_id,
                        kills: other.kills,
                    });
                }
            }
        }

        // The reverse check runs even when a death already resolved for this
        // pair; a mover marked dead above can still be credited here.
        if other_hit_tail.is_some() {
            if let Some(s) = store.get_mut(other_id) {
                s.alive = false;
            }
            if let Some(session) = store.get_mut(mover) {
                session.kills += 1;
                session.score += COUNTER_KILL_SCORE;
                session.pending_growth += KILL_GROWTH;
                events.push(CollisionEvent::TailKill {
                    victim: other_id,
                    killer: mover,
                    kills: session.kills,
                    score: session.score,
                    growth: session.pending_growth,
                    counter: true,
                });
                if session.kills == KILL_STREAK_NOTICE || session.kills == WIN_KILLS - 1 {
                    events.push(CollisionEvent::KillStreak {
                        player: mover,
                        kills: session.kills,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;

    fn store_with(n: usize) -> (SessionStore, Vec<PlayerId>) {
        let mut store = SessionStore::new();
        let ids: Vec<PlayerId> = (0..n).map(|_| PlayerId::random()).collect();
        for &id in &ids {
            store.create(id, 0);
        }
        (store, ids)
    }

    fn place(store: &mut SessionStore, id: PlayerId, segments: Vec<Vec2>) {
        store.get_mut(id).unwrap().segments = segments;
    }

    #[test]
    fn eating_food_credits_score_and_growth() {
        let (mut store, ids) = store_with(1);
        let snack = Vec2::new(100.0, 100.0);
        place(&mut store, ids[0], vec![snack]);
        let mut food = FoodManager::with_items(vec![snack, Vec2::new(900.0, 900.0)]);

        let mut events = Vec::new();
        resolve_food(&mut store, &mut food, ids[0], &mut events);

        let session = store.get(ids[0]).unwrap();
        assert_eq!(session.score, FOOD_SCORE);
        assert_eq!(session.pending_growth, FOOD_GROWTH);
        // Count is invariant under consumption.
        assert_eq!(food.len(), 2);
        assert!(!food.items().contains(&snack));
        assert_eq!(
            events,
            vec![CollisionEvent::FoodEaten {
                player: ids[0],
                score: FOOD_SCORE,
                growth: FOOD_GROWTH,
            }]
        );
    }

    #[test]
    fn food_out_of_reach_is_untouched() {
        let (mut store, ids) = store_with(1);
        place(&mut store, ids[0], vec![Vec2::new(100.0, 100.0)]);
        let far = Vec2::new(100.0 + SEGMENT_RADIUS + FOOD_RADIUS + 1.0, 100.0);
        let mut food = FoodManager::with_items(vec![far]);

        let mut events = Vec::new();
        resolve_food(&mut store, &mut food, ids[0], &mut events);
        assert!(events.is_empty());
        assert_eq!(food.items(), &[far]);
    }

    #[test]
    fn dead_players_eat_nothing() {
        let (mut store, ids) = store_with(1);
        let snack = Vec2::new(50.0, 50.0);
        place(&mut store, ids[0], vec![snack]);
        store.get_mut(ids[0]).unwrap().alive = false;
        let mut food = FoodManager::with_items(vec![snack]);

        let mut events = Vec::new();
        resolve_food(&mut store, &mut food, ids[0], &mut events);
        assert!(events.is_empty());
        assert_eq!(store.get(ids[0]).unwrap().score, 0);
    }

    #[test]
    fn score_milestone_fires_once_at_each_multiple() {
        let (mut store, ids) = store_with(1);
        let snack = Vec2::new(10.0, 10.0);
        place(&mut store, ids[0], vec![snack]);
        store.get_mut(ids[0]).unwrap().score = SCORE_MILESTONE - 1;
        let mut food = FoodManager::with_items(vec![snack]);

        let mut events = Vec::new();
        resolve_food(&mut store, &mut food, ids[0], &mut events);
        assert!(events.contains(&CollisionEvent::ScoreMilestone {
            player: ids[0],
            score: SCORE_MILESTONE,
        }));
    }

    #[test]
    fn length_milestone_fires_at_fifty() {
        let (mut store, ids) = store_with(1);
        let snack = Vec2::new(10.0, 10.0);
        place(&mut store, ids[0], vec![snack]);
        store.get_mut(ids[0]).unwrap().pending_growth = 47; // 1 segment + 47 + 2 = 50
        let mut food = FoodManager::with_items(vec![snack]);

        let mut events = Vec::new();
        resolve_food(&mut store, &mut food, ids[0], &mut events);
        assert!(events.contains(&CollisionEvent::LengthMilestone {
            player: ids[0],
            length: 50,
        }));
    }

    #[test]
    fn running_into_a_tail_kills_the_mover_and_credits_the_owner() {
        let (mut store, ids) = store_with(2);
        let (a, b) = (ids[0], ids[1]);
        // A's head lands on B's third segment.
        place(&mut store, a, vec![Vec2::new(200.0, 200.0)]);
        place(
            &mut store,
            b,
            vec![
                Vec2::new(500.0, 500.0),
                Vec2::new(500.0, 516.0),
                Vec2::new(200.0, 205.0),
                Vec2::new(500.0, 548.0),
            ],
        );

        let mut events = Vec::new();
        resolve_snakes(&mut store, a, &mut events);

        assert!(!store.get(a).unwrap().alive);
        let killer = store.get(b).unwrap();
        assert!(killer.alive);
        assert_eq!(killer.kills, 1);
        assert_eq!(killer.score, KILL_SCORE);
        assert_eq!(killer.pending_growth, KILL_GROWTH);
        assert_eq!(
            events,
            vec![CollisionEvent::TailKill {
                victim: a,
                killer: b,
                kills: 1,
                score: KILL_SCORE,
                growth: KILL_GROWTH,
                counter: false,
            }]
        );
    }

    #[test]
    fn head_to_head_kills_both_without_scoring() {
        let (mut store, ids) = store_with(2);
        let (a, b) = (ids[0], ids[1]);
        place(&mut store, a, vec![Vec2::new(300.0, 300.0)]);
        place(&mut store, b, vec![Vec2::new(300.0, 300.0 + SEGMENT_RADIUS)]);

        let mut events = Vec::new();
        resolve_snakes(&mut store, a, &mut events);

        assert!(!store.get(a).unwrap().alive);
        assert!(!store.get(b).unwrap().alive);
        assert_eq!(store.get(a).unwrap().score, 0);
        assert_eq!(store.get(b).unwrap().score, 0);
        assert_eq!(events, vec![CollisionEvent::HeadToHead { mover: a, other: b }]);
    }

    #[test]
    fn reverse_check_pays_the_smaller_reward() {
        let (mut store, ids) = store_with(2);
        let (a, b) = (ids[0], ids[1]);
        // B's head sits on A's tail; A is the one moving.
        place(
            &mut store,
            a,
            vec![Vec2::new(100.0, 100.0), Vec2::new(600.0, 600.0)],
        );
        place(&mut store, b, vec![Vec2::new(600.0, 605.0)]);

        let mut events = Vec::new();
        resolve_snakes(&mut store, a, &mut events);

        assert!(!store.get(b).unwrap().alive);
        let mover = store.get(a).unwrap();
        assert!(mover.alive);
        assert_eq!(mover.kills, 1);
        assert_eq!(mover.score, COUNTER_KILL_SCORE);
        assert_eq!(mover.pending_growth, KILL_GROWTH);
        assert!(matches!(
            events.as_slice(),
            [CollisionEvent::TailKill { counter: true, .. }]
        ));
    }

    #[test]
    fn freshly_dead_mover_is_still_credited_by_the_reverse_check() {
        let (mut store, ids) = store_with(2);
        let (a, b) = (ids[0], ids[1]);
        // A's head is on B's tail AND B's head is on A's tail: both checks
        // execute for the pair, so both players die and both are credited.
        place(
            &mut store,
            a,
            vec![Vec2::new(100.0, 100.0), Vec2::new(600.0, 600.0)],
        );
        place(
            &mut store,
            b,
            vec![Vec2::new(600.0, 602.0), Vec2::new(100.0, 102.0)],
        );

        let mut events = Vec::new();
        resolve_snakes(&mut store, a, &mut events);

        assert!(!store.get(a).unwrap().alive);
        assert!(!store.get(b).unwrap().alive);
        assert_eq!(store.get(b).unwrap().kills, 1);
        assert_eq!(store.get(a).unwrap().kills, 1);
        assert_eq!(store.get(a).unwrap().score, COUNTER_KILL_SCORE);
        assert_eq!(store.get(b).unwrap().score, KILL_SCORE);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn dead_sessions_are_skipped_entirely() {
        let (mut store, ids) = store_with(2);
        let (a, b) = (ids[0], ids[1]);
        place(&mut store, a, vec![Vec2::new(100.0, 100.0)]);
        place(
            &mut store,
            b,
            vec![Vec2::new(400.0, 400.0), Vec2::new(100.0, 102.0)],
        );
        store.get_mut(b).unwrap().alive = false;

        let mut events = Vec::new();
        resolve_snakes(&mut store, a, &mut events);
        assert!(events.is_empty());
        assert!(store.get(a).unwrap().alive);
    }

    #[test]
    fn kill_streak_notice_fires_at_five() {
        let (mut store, ids) = store_with(2);
        let (a, b) = (ids[0], ids[1]);
        place(&mut store, a, vec![Vec2::new(200.0, 200.0)]);
        place(
            &mut store,
            b,
            vec![Vec2::new(500.0, 500.0), Vec2::new(200.0, 205.0)],
        );
        store.get_mut(b).unwrap().kills = KILL_STREAK_NOTICE - 1;

        let mut events = Vec::new();
        resolve_snakes(&mut store, a, &mut events);
        assert!(events.contains(&CollisionEvent::KillStreak {
            player: b,
            kills: KILL_STREAK_NOTICE,
        }));
    }
}
