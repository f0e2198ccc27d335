use instant::{Duration, Instant};
use rand::{SeedableRng, rngs::StdRng};

use crate::{config::EngineConfig, data_structures::scene_graph::SceneGraph};

/// Everything a flow may touch besides its own state.
///
/// The scene arena is shared by all flows; each flow keeps the ids of the
/// nodes it created. `now` is the frame clock: every flow sees the same
/// instant during one frame. Runtime tuning, such as the tick interval, is
/// changed through `config`.
pub struct Context {
    pub scene: SceneGraph,
    pub config: EngineConfig,
    pub now: Instant,
    pub frame: u64,
}

impl Context {
    pub fn new(config: EngineConfig, now: Instant) -> Self {
        Self {
            scene: SceneGraph::new(),
            config,
            now,
            frame: 0,
        }
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(self.config.tick_duration_millis)
    }
}

/// Handed to flow constructors before the first frame.
#[derive(Debug, Clone)]
pub struct InitContext {
    pub config: EngineConfig,
    /// Position of the flow in the constructor list.
    pub flow_index: usize,
}

impl InitContext {
    /// RNG for this flow: seeded from `config.seed` (offset by the flow index)
    /// or from OS entropy.
    pub fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(self.flow_index as u64)),
            None => StdRng::from_entropy(),
        }
    }
}
