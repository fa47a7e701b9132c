mod forces;
mod quadtree;

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use forces::{ChargeParams, Spring, accumulate_charge, apply_centering, apply_springs};
use quadtree::QuadTree;

const INITIAL_RADIUS: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    pub link_distance: f32,
    pub charge_strength: f32,
    pub center_strength: f32,
    pub alpha_decay: f32,
    pub alpha_min: f32,
    pub velocity_decay: f32,
    pub drag_alpha_target: f32,
    pub theta: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            link_distance: 150.0,
            charge_strength: -300.0,
            center_strength: 0.2,
            alpha_decay: 0.05,
            alpha_min: 0.001,
            velocity_decay: 0.4,
            drag_alpha_target: 0.3,
            theta: 0.9,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimNode {
    pub position: Vec2,
    pub(super) velocity: Vec2,
    /// Fixed position. While set, the solver never moves the node.
    pub pin: Option<Vec2>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Settled,
    Stopped,
}

pub trait TickListener {
    fn on_tick(&mut self, nodes: &[SimNode]);
}

pub struct Simulation {
    nodes: Vec<SimNode>,
    springs: Vec<Spring>,
    config: SimulationConfig,
    alpha: f32,
    alpha_target: f32,
    state: LoopState,
    positions: Vec<Vec2>,
}

impl Simulation {
    pub fn new(node_count: usize, edges: &[(usize, usize)], config: SimulationConfig) -> Self {
        let initial_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
        let nodes = (0..node_count)
            .map(|index| {
                let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
                let angle = index as f32 * initial_angle;
                SimNode {
                    position: vec2(radius * angle.cos(), radius * angle.sin()),
                    velocity: Vec2::ZERO,
                    pin: None,
                }
            })
            .collect();

        Self {
            nodes,
            springs: Spring::from_edges(node_count, edges),
            config,
            alpha: 1.0,
            alpha_target: 0.0,
            state: LoopState::Idle,
            positions: Vec::with_capacity(node_count),
        }
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn config(&self) -> SimulationConfig {
        self.config
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn start(&mut self) {
        if self.state == LoopState::Stopped {
            return;
        }
        self.alpha = 1.0;
        self.state = LoopState::Running;
    }

    /// Halts the frame loop. Nothing wakes it again.
    pub fn stop(&mut self) {
        self.state = LoopState::Stopped;
    }

    pub fn reheat(&mut self, alpha_target: f32) {
        self.alpha_target = alpha_target;
        if self.state == LoopState::Settled {
            debug!(alpha_target, "simulation reheated");
            self.state = LoopState::Running;
        }
    }

    pub fn cool(&mut self) {
        self.alpha_target = 0.0;
    }

    pub fn is_reheated(&self) -> bool {
        self.alpha_target > 0.0
    }

    pub fn pin(&mut self, index: usize, position: Vec2) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.pin = Some(position);
            node.position = position;
            node.velocity = Vec2::ZERO;
        }
    }

    pub fn run_frame(&mut self, listeners: &mut [&mut dyn TickListener]) -> bool {
        if self.state != LoopState::Running {
            return false;
        }

        self.tick();
        for listener in listeners.iter_mut() {
            listener.on_tick(&self.nodes);
        }

        if self.alpha < self.config.alpha_min {
            debug!(alpha = self.alpha, "simulation settled");
            self.state = LoopState::Settled;
        }
        true
    }

    pub fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        let alpha = self.alpha;

        apply_springs(
            &mut self.nodes,
            &self.springs,
            self.config.link_distance,
            alpha,
        );
        self.apply_charge(alpha);
        apply_centering(&mut self.nodes, self.config.center_strength, alpha);

        let retain = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            match node.pin {
                Some(pin) => {
                    node.position = pin;
                    node.velocity = Vec2::ZERO;
                }
                None => {
                    node.velocity *= retain;
                    node.position += node.velocity;
                }
            }
        }
    }

    fn apply_charge(&mut self, alpha: f32) {
        if self.nodes.len() < 2 || self.config.charge_strength == 0.0 {
            return;
        }

        self.positions.clear();
        self.positions
            .extend(self.nodes.iter().map(|node| node.position));
        let Some(tree) = QuadTree::build(&self.positions) else {
            return;
        };

        let params = ChargeParams {
            strength: self.config.charge_strength * alpha,
            theta_sq: self.config.theta * self.config.theta,
            distance_min_sq: 1.0,
        };
        for (index, node) in self.nodes.iter_mut().enumerate() {
            accumulate_charge(
                &tree,
                tree.root(),
                index,
                &self.positions,
                params,
                &mut node.velocity,
            );
        }
    }
}
