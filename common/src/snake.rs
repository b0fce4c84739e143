use crate::constants::{FOLLOW_LERP, FOLLOW_SLACK, SEGMENT_SPACING};
use crate::geometry::Vec2;

/// Advance a snake body toward a new head position.
///
/// Growth owed to the snake materializes before re-chaining: one segment per
/// update appears at the current tail. Each follower then eases toward the
/// distance-constrained position behind its predecessor instead of snapping,
/// which keeps long bodies visually smooth. Bounds are the sender's problem,
/// not ours.
pub fn advance(segments: &mut Vec<Vec2>, pending_growth: &mut u32, new_head: Vec2) {
    if *pending_growth > 0 {
        if let Some(tail) = segments.last().copied() {
            segments.push(tail);
            *pending_growth -= 1;
        }
    }

    if let Some(head) = segments.first_mut() {
        *head = new_head;
    }

    for i in 1..segments.len() {
        let leader = segments[i - 1];
        let follower = segments[i];
        if follower.distance(leader) > SEGMENT_SPACING * FOLLOW_SLACK {
            let constrained = follower.at_distance_from(leader, SEGMENT_SPACING);
            segments[i] = follower.lerp(constrained, FOLLOW_LERP);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_moves_to_requested_position() {
        let mut segments = vec![Vec2::ZERO];
        let mut growth = 0;
        advance(&mut segments, &mut growth, Vec2::new(12.0, 8.0));
        assert_eq!(segments[0], Vec2::new(12.0, 8.0));
    }

    #[test]
    fn pending_growth_appends_one_segment_at_tail() {
        let tail = Vec2::new(5.0, 5.0);
        let mut segments = vec![Vec2::new(10.0, 5.0), tail];
        let mut growth = 3;
        advance(&mut segments, &mut growth, Vec2::new(11.0, 5.0));
        assert_eq!(segments.len(), 3);
        assert_eq!(growth, 2);
        // The new segment appears where the tail was before the update.
        assert_eq!(segments[2], tail);
    }

    #[test]
    fn follower_within_slack_does_not_move() {
        let follower = Vec2::new(SEGMENT_SPACING, 0.0);
        let mut segments = vec![Vec2::ZERO, follower];
        let mut growth = 0;
        advance(&mut segments, &mut growth, Vec2::ZERO);
        assert_eq!(segments[1], follower);
    }

    #[test]
    fn lagging_follower_closes_half_the_gap() {
        // Follower sits 40 units behind on the x axis; the constrained
        // position is 16 units from the head, and only half the correction
        // applies per update.
        let mut segments = vec![Vec2::ZERO, Vec2::new(40.0, 0.0)];
        let mut growth = 0;
        advance(&mut segments, &mut growth, Vec2::ZERO);
        assert_eq!(segments[1], Vec2::new(28.0, 0.0));
    }

    #[test]
    fn followers_chain_off_updated_predecessors() {
        let mut segments = vec![Vec2::ZERO, Vec2::new(40.0, 0.0), Vec2::new(80.0, 0.0)];
        let mut growth = 0;
        advance(&mut segments, &mut growth, Vec2::ZERO);
        // Second follower eases toward the first follower's new position.
        assert_eq!(segments[1], Vec2::new(28.0, 0.0));
        assert_eq!(segments[2], Vec2::new(62.0, 0.0));
    }
}
