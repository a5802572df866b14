use arcade_types::LEVEL_THRESHOLDS;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Play-field geometry, matching the reference client's layout.
pub const FIELD_WIDTH: f32 = 500.0;
pub const FIELD_HEIGHT: f32 = 800.0;
pub const PLAYER_WIDTH: f32 = 60.0;
pub const ITEM_SIZE: f32 = 40.0;
pub const INITIAL_LIVES: u32 = 3;

/// The catch band sits this far above the bottom edge.
const CATCH_BAND_MARGIN: f32 = 20.0;
/// Item speeds are expressed in pixels per nominal frame.
const FRAME_MS: f32 = 16.0;
const GOOD_PROBABILITY: f32 = 0.7;
const BASE_SPAWN_MS: f32 = 800.0;
const SPAWN_STEP_MS: f32 = 40.0;
const MIN_SPAWN_MS: f32 = 200.0;

/// Spawns speed up with level, down to a floor.
pub fn spawn_interval_ms(level: u32) -> f32 {
    (BASE_SPAWN_MS - level as f32 * SPAWN_STEP_MS).max(MIN_SPAWN_MS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflexPhase {
    Idle,
    Playing,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Good,
    Bad,
}

#[derive(Debug, Clone)]
pub struct FallingItem {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub kind: ItemKind,
    /// Pixels per nominal frame, scaled by dt on each tick.
    pub speed: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReflexEvent {
    LevelUp { level: u32 },
    GameOver { final_score: u32 },
}

/// The falling-items reflex game as a stepped simulation.
///
/// Spawning and ticking are accumulators inside `tick`, not timers, so the
/// run is reproducible for a fixed seed and dt sequence, and leaving
/// `Playing` halts both with nothing left running.
#[derive(Debug)]
pub struct ReflexEngine {
    phase: ReflexPhase,
    score: u32,
    level: u32,
    lives: u32,
    player_x: f32,
    items: Vec<FallingItem>,
    spawn_accum_ms: f32,
    next_item_id: u64,
    rng: Pcg32,
    events: Vec<ReflexEvent>,
}

impl ReflexEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            phase: ReflexPhase::Idle,
            score: 0,
            level: 1,
            lives: INITIAL_LIVES,
            player_x: FIELD_WIDTH / 2.0,
            items: Vec::new(),
            spawn_accum_ms: 0.0,
            next_item_id: 0,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    pub fn phase(&self) -> ReflexPhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn player_x(&self) -> f32 {
        self.player_x
    }

    pub fn items(&self) -> &[FallingItem] {
        &self.items
    }

    pub fn drain_events(&mut self) -> Vec<ReflexEvent> {
        std::mem::take(&mut self.events)
    }

    /// Begin a run at the customer's current level. Valid from `Idle` or
    /// `GameOver`; starting over mid-game is not a transition this engine has.
    pub fn start(&mut self, level: u32) {
        if self.phase == ReflexPhase::Playing {
            return;
        }
        self.phase = ReflexPhase::Playing;
        self.score = 0;
        self.level = level.max(1);
        self.lives = INITIAL_LIVES;
        self.items.clear();
        self.spawn_accum_ms = 0.0;
        self.events.clear();
    }

    /// Drive the player from absolute pointer/touch coordinates, clamped so
    /// the sprite stays inside the field.
    pub fn move_player(&mut self, x: f32) {
        let half = PLAYER_WIDTH / 2.0;
        self.player_x = x.clamp(half, FIELD_WIDTH - half);
    }

    /// End the run, cancelling all pending simulation work, and report the
    /// final score.
    pub fn stop(&mut self) -> u32 {
        self.phase = ReflexPhase::GameOver;
        self.items.clear();
        self.spawn_accum_ms = 0.0;
        self.score
    }

    /// Advance the simulation by `dt_ms`. Fixed per-frame order: advance
    /// items, spawn due items, then resolve catches and misses.
    pub fn tick(&mut self, dt_ms: f32) {
        if self.phase != ReflexPhase::Playing {
            return;
        }

        for item in &mut self.items {
            item.y += item.speed * dt_ms / FRAME_MS;
        }

        self.spawn_accum_ms += dt_ms;
        while self.spawn_accum_ms >= spawn_interval_ms(self.level) {
            self.spawn_accum_ms -= spawn_interval_ms(self.level);
            self.spawn_item();
        }

        self.resolve_collisions();

        let next_threshold = LEVEL_THRESHOLDS
            .get(self.level as usize)
            .copied()
            .unwrap_or(u32::MAX);
        if self.score >= next_threshold {
            self.level += 1;
            self.events.push(ReflexEvent::LevelUp { level: self.level });
        }

        if self.lives == 0 {
            self.phase = ReflexPhase::GameOver;
            self.items.clear();
            self.events.push(ReflexEvent::GameOver {
                final_score: self.score,
            });
        }
    }

    fn spawn_item(&mut self) {
        let kind = if self.rng.random::<f32>() < GOOD_PROBABILITY {
            ItemKind::Good
        } else {
            ItemKind::Bad
        };
        let item = FallingItem {
            id: self.next_item_id,
            x: self.rng.random_range(0.0..FIELD_WIDTH - ITEM_SIZE),
            y: -ITEM_SIZE,
            kind,
            speed: (2.0 + self.rng.random::<f32>() * 2.0) * (1.0 + self.level as f32 * 0.1),
        };
        self.next_item_id += 1;
        self.items.push(item);
    }

    fn resolve_collisions(&mut self) {
        let player_left = self.player_x - PLAYER_WIDTH / 2.0;
        let player_right = self.player_x + PLAYER_WIDTH / 2.0;

        let items = std::mem::take(&mut self.items);
        let mut kept = Vec::with_capacity(items.len());

        for item in items {
            if self.lives == 0 {
                // the run ended on an earlier item this frame
                break;
            }

            let in_catch_band = item.y > FIELD_HEIGHT - ITEM_SIZE - CATCH_BAND_MARGIN
                && item.y < FIELD_HEIGHT - CATCH_BAND_MARGIN;
            let over_player = item.x < player_right && item.x + ITEM_SIZE > player_left;

            if in_catch_band && over_player {
                match item.kind {
                    ItemKind::Good => self.score += 10 * self.level,
                    ItemKind::Bad => self.lives = self.lives.saturating_sub(1),
                }
            } else if item.y >= FIELD_HEIGHT {
                // a good item slipping past costs a life; bad items just leave
                if item.kind == ItemKind::Good {
                    self.lives = self.lives.saturating_sub(1);
                }
            } else {
                kept.push(item);
            }
        }

        self.items = kept;
    }

    #[cfg(test)]
    fn inject_item(&mut self, x: f32, y: f32, kind: ItemKind, speed: f32) {
        let id = self.next_item_id;
        self.next_item_id += 1;
        self.items.push(FallingItem { id, x, y, kind, speed });
    }
}
