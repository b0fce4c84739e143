use rand::Rng;

use crate::constants::{FOOD_COUNT, MAP_HEIGHT, MAP_WIDTH};
use crate::geometry::Vec2;

/// The live food set. The count stays constant: every consumed item is
/// replaced immediately, and the whole set is only rebuilt when a round
/// restarts after a threshold win.
#[derive(Debug, Default)]
pub struct FoodManager {
    items: Vec<Vec2>,
}

impl FoodManager {
    pub fn with_full_set() -> Self {
        FoodManager {
            items: spawn(FOOD_COUNT),
        }
    }

    pub fn items(&self) -> &[Vec2] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove the item at `index` and push exactly one replacement.
    pub fn consume(&mut self, index: usize) -> Vec2 {
        let eaten = self.items.remove(index);
        self.items.push(random_position());
        eaten
    }

    /// Replace the entire set. Only called on a game-over restart.
    pub fn reshuffle(&mut self) {
        self.items = spawn(FOOD_COUNT);
    }

    #[cfg(test)]
    pub fn with_items(items: Vec<Vec2>) -> Self {
        FoodManager { items }
    }
}

/// `n` positions drawn uniformly from the map bounds.
pub fn spawn(n: usize) -> Vec<Vec2> {
    (0..n).map(|_| random_position()).collect()
}

fn random_position() -> Vec2 {
    let mut rng = rand::thread_rng();
    Vec2::new(
        rng.gen_range(0.0..MAP_WIDTH),
        rng.gen_range(0.0..MAP_HEIGHT),
    )
}
