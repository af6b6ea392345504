mod forces;
mod seed;

use eframe::egui::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Edge};

pub use forces::{cluster_centroids, stroke_weight};
pub use seed::SavedPosition;

use forces::{accumulate_gravity, accumulate_repulsion, accumulate_springs, integrate};
use seed::{random_positions, ring_positions};

pub const ALPHA_DECAY: f32 = 0.985;
pub const ALPHA_MIN: f32 = 0.02;
/// Above this many active nodes pairwise repulsion is skipped.
pub const REPULSION_NODE_CEILING: usize = 400;
const DRAG_ALPHA: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub repulsion: f32,
    pub spring: f32,
    pub rest_length: f32,
    pub gravity: f32,
    pub damping: f32,
    pub max_speed: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            repulsion: 2400.0,
            spring: 0.02,
            rest_length: 90.0,
            gravity: 0.012,
            damping: 0.85,
            max_speed: 40.0,
        }
    }
}

impl PhysicsConfig {
    pub fn clamped(self) -> Self {
        Self {
            repulsion: self.repulsion.clamp(0.0, 20_000.0),
            spring: self.spring.clamp(0.0, 0.5),
            rest_length: self.rest_length.clamp(10.0, 400.0),
            gravity: self.gravity.clamp(0.0, 0.2),
            damping: self.damping.clamp(0.1, 0.99),
            max_speed: self.max_speed.clamp(1.0, 200.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeState {
    pub pos: Vec2,
    pub velocity: Vec2,
    pub fixed: bool,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            velocity: Vec2::ZERO,
            fixed: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimPhase {
    Seeding,
    Simulating,
    Settled,
}

/// Source of animation frames; the engine asks for one more frame after
/// each tick while the simulation is running.
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

/// Filtered view the tick reads; rebuilt by the caller after any filter or
/// topology change.
pub struct TickInput<'a> {
    pub dataset: &'a Dataset,
    pub edges: &'a [Edge],
    pub displayable: &'a [bool],
    pub active: &'a [usize],
}

pub struct LayoutEngine {
    states: Vec<NodeState>,
    phase: SimPhase,
    alpha: f32,
    dragging: Option<usize>,
    forces: Vec<Vec2>,
}

impl LayoutEngine {
    pub fn new(node_count: usize) -> Self {
        Self {
            states: vec![NodeState::default(); node_count],
            phase: SimPhase::Seeding,
            alpha: 1.0,
            dragging: None,
            forces: Vec::new(),
        }
    }

    pub fn states(&self) -> &[NodeState] {
        &self.states
    }

    pub fn state(&self, index: usize) -> Option<&NodeState> {
        self.states.get(index)
    }

    pub fn positions(&self) -> Vec<Vec2> {
        self.states.iter().map(|state| state.pos).collect()
    }

    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    pub fn is_running(&self) -> bool {
        self.phase == SimPhase::Simulating
    }

    fn apply_seed(&mut self, positions: Vec<Vec2>) {
        self.states = positions
            .into_iter()
            .map(|pos| NodeState {
                pos,
                ..NodeState::default()
            })
            .collect();
        self.dragging = None;
        self.phase = SimPhase::Seeding;
    }

    pub fn seed_rings(&mut self, dataset: &Dataset) {
        self.apply_seed(ring_positions(dataset));
    }

    pub fn seed_random(&mut self, dataset: &Dataset, rng: &mut impl Rng) {
        self.apply_seed(random_positions(dataset, rng));
    }

    /// Ring-seeds, then pins every node found in `saved` at its stored
    /// position. Returns how many nodes were restored.
    pub fn seed_restored(&mut self, dataset: &Dataset, saved: &[SavedPosition]) -> usize {
        self.seed_rings(dataset);

        let mut restored = 0usize;
        for entry in saved {
            if !entry.x.is_finite() || !entry.y.is_finite() {
                continue;
            }
            let Some(index) = dataset.node_index(&entry.id) else {
                continue;
            };
            let state = &mut self.states[index];
            state.pos = Vec2::new(entry.x, entry.y);
            state.fixed = true;
            restored += 1;
        }
        restored
    }

    pub fn snapshot(&self, dataset: &Dataset) -> Vec<SavedPosition> {
        dataset
            .nodes
            .iter()
            .zip(&self.states)
            .map(|(node, state)| SavedPosition {
                id: node.id.clone(),
                x: state.pos.x,
                y: state.pos.y,
            })
            .collect()
    }

    /// Full reheat, as for an explicit "run force" action or filter change.
    pub fn kick(&mut self) {
        self.alpha = 1.0;
        self.phase = SimPhase::Simulating;
    }

    pub fn reheat(&mut self, min_alpha: f32) {
        self.alpha = self.alpha.max(min_alpha).min(1.0);
        self.phase = SimPhase::Simulating;
    }

    pub fn begin_drag(&mut self, index: usize) {
        let Some(state) = self.states.get_mut(index) else {
            return;
        };
        state.fixed = true;
        state.velocity = Vec2::ZERO;
        self.dragging = Some(index);
        self.reheat(DRAG_ALPHA);
    }

    pub fn drag_to(&mut self, index: usize, pos: Vec2) {
        if let Some(state) = self.states.get_mut(index) {
            state.pos = pos;
            state.velocity = Vec2::ZERO;
        }
    }

    /// Ends the drag; the node stays pinned where it was dropped.
    pub fn end_drag(&mut self) {
        if self.dragging.take().is_some() {
            self.reheat(DRAG_ALPHA);
        }
    }

    pub fn unfix_all(&mut self) {
        for (index, state) in self.states.iter_mut().enumerate() {
            if Some(index) != self.dragging {
                state.fixed = false;
            }
        }
    }

    pub fn fixed_count(&self) -> usize {
        self.states.iter().filter(|state| state.fixed).count()
    }

    /// One simulation step followed by cooling. Returns whether the
    /// simulation is still running.
    pub fn tick(&mut self, input: &TickInput<'_>, physics: PhysicsConfig) -> bool {
        let node_count = self.states.len();
        if node_count == 0 || input.dataset.node_count() != node_count {
            self.phase = SimPhase::Settled;
            return false;
        }

        let physics = physics.clamped();
        self.forces.clear();
        self.forces.resize(node_count, Vec2::ZERO);

        if input.active.len() < REPULSION_NODE_CEILING {
            accumulate_repulsion(&self.states, input.active, physics.repulsion, &mut self.forces);
        }
        accumulate_springs(
            &self.states,
            input.edges,
            physics.spring,
            physics.rest_length,
            &mut self.forces,
        );
        let centroids = cluster_centroids(input.dataset, &self.states, input.displayable);
        accumulate_gravity(
            input.dataset,
            &self.states,
            input.displayable,
            &centroids,
            physics.gravity,
            &mut self.forces,
        );
        integrate(
            &mut self.states,
            &self.forces,
            input.displayable,
            physics.damping,
            physics.max_speed,
            self.alpha,
        );

        self.alpha *= ALPHA_DECAY;
        if self.dragging.is_some() {
            self.alpha = self.alpha.max(ALPHA_MIN);
        } else if self.alpha < ALPHA_MIN {
            self.phase = SimPhase::Settled;
        }

        self.is_running()
    }
}
