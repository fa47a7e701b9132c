use eframe::egui::{Pos2, Vec2};
use tracing::trace;

use super::simulation::Simulation;

const MIN_SCALE: f32 = 0.05;
const MAX_SCALE: f32 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub translate: Vec2,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn scene_to_screen(self, center: Pos2, scene: Vec2) -> Pos2 {
        center + self.translate + scene * self.scale
    }

    pub fn screen_to_scene(self, center: Pos2, screen: Pos2) -> Vec2 {
        (screen - center - self.translate) / self.scale
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragState {
    Idle,
    Dragging { node: usize },
    Panning { last: Pos2 },
}

pub struct InteractionController {
    drag: DragState,
    transform: ViewTransform,
    attached: bool,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            drag: DragState::Idle,
            transform: ViewTransform::default(),
            attached: true,
        }
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn detach(&mut self) {
        self.attached = false;
        self.drag = DragState::Idle;
    }

    pub fn drag_start(&mut self, simulation: &mut Simulation, node: usize) {
        if !self.attached {
            return;
        }
        let Some(current) = simulation.nodes().get(node).map(|node| node.position) else {
            return;
        };

        if !simulation.is_reheated() {
            simulation.reheat(simulation.config().drag_alpha_target);
        }
        simulation.pin(node, current);
        self.drag = DragState::Dragging { node };
        trace!(node, "drag started");
    }

    pub fn drag_move(&mut self, simulation: &mut Simulation, pointer_scene: Vec2) {
        if let DragState::Dragging { node } = self.drag {
            simulation.pin(node, pointer_scene);
        }
    }

    /// The node stays pinned where it was released.
    pub fn drag_end(&mut self, simulation: &mut Simulation, pointer_scene: Vec2) {
        if let DragState::Dragging { node } = self.drag {
            simulation.cool();
            simulation.pin(node, pointer_scene);
            self.drag = DragState::Idle;
            trace!(node, "drag ended");
        }
    }

    pub fn pan_start(&mut self, pointer: Pos2) {
        if self.attached && self.drag == DragState::Idle {
            self.drag = DragState::Panning { last: pointer };
        }
    }

    pub fn pan_to(&mut self, pointer: Pos2) {
        if let DragState::Panning { last } = self.drag {
            self.transform.translate += pointer - last;
            self.drag = DragState::Panning { last: pointer };
        }
    }

    pub fn pan_end(&mut self) {
        if matches!(self.drag, DragState::Panning { .. }) {
            self.drag = DragState::Idle;
        }
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        if self.attached {
            self.transform.translate += delta;
        }
    }

    pub fn zoom_at(&mut self, center: Pos2, pointer: Pos2, scroll: f32) {
        if !self.attached || scroll.abs() <= f32::EPSILON {
            return;
        }

        let anchor = self.transform.screen_to_scene(center, pointer);
        let factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.transform.scale = (self.transform.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.transform.translate = pointer - center - (anchor * self.transform.scale);
    }
}
