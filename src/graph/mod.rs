mod encoding;
mod interaction;
mod model;
mod render_utils;
mod renderer;
mod scene;
mod simulation;
mod tooltip;

use eframe::egui::{self, PointerButton, Pos2, Sense, Ui, Vec2};
use thiserror::Error;
use tracing::{debug, info};

pub use encoding::{
    ServiceIcon, Severity, color_of, error_ratio, icon_of, link_color, link_width, severity_of,
};
pub use interaction::{DragState, InteractionController, ViewTransform};
pub use model::{LinkEnd, ResolvedLink, ServiceLink, ServiceNode, ServiceType};
pub use renderer::{HoverTarget, NODE_RADIUS};
pub use scene::{
    ICON_FONT_FAMILY, LabelShape, LegendEntry, LinkShape, MountSurface, NodeShape, Scene,
    SceneRoot,
};
pub use simulation::{LoopState, SimNode, Simulation, SimulationConfig, TickListener};
pub use tooltip::{TooltipHandle, TooltipOverlay};

use renderer::SceneRenderer;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("link {link} has unknown {end} node `{id}`")]
    UnknownNode { link: usize, end: LinkEnd, id: String },
    #[error("node id `{id}` appears more than once")]
    DuplicateNode { id: String },
}

pub trait FrameScheduler {
    fn request_frame(&self);
}

impl FrameScheduler for egui::Context {
    fn request_frame(&self) {
        self.request_repaint();
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Pressed { position: Pos2 },
    Moved { position: Pos2 },
    Released { position: Pos2 },
    Hover { position: Option<Pos2> },
    Scrolled { position: Pos2, delta: f32 },
    Panned { delta: Vec2 },
}

pub struct ForceGraph {
    simulation: Simulation,
    renderer: SceneRenderer,
    interaction: InteractionController,
    tooltip: TooltipHandle,
    origin: Pos2,
    destroyed: bool,
}

impl ForceGraph {
    pub fn create<F>(
        surface: &mut MountSurface,
        nodes: &[ServiceNode],
        links: &[ServiceLink],
        tooltip_content: F,
    ) -> Result<Self, GraphError>
    where
        F: Fn(&ServiceNode) -> String + 'static,
    {
        Self::create_with_config(
            surface,
            nodes,
            links,
            tooltip_content,
            SimulationConfig::default(),
        )
    }

    /// Fails before touching `surface` when the input does not resolve.
    pub fn create_with_config<F>(
        surface: &mut MountSurface,
        nodes: &[ServiceNode],
        links: &[ServiceLink],
        tooltip_content: F,
        config: SimulationConfig,
    ) -> Result<Self, GraphError>
    where
        F: Fn(&ServiceNode) -> String + 'static,
    {
        let resolved = model::resolve_links(nodes, links)?;
        let edges = resolved
            .iter()
            .map(|link| (link.source, link.target))
            .collect::<Vec<_>>();
        let simulation = Simulation::new(nodes.len(), &edges, config);

        let tooltip = TooltipHandle::acquire();
        let renderer = SceneRenderer::mount(
            surface,
            nodes.to_vec(),
            resolved,
            simulation.nodes(),
            tooltip.clone(),
            Box::new(tooltip_content),
        );

        info!(
            nodes = nodes.len(),
            links = links.len(),
            width = surface.size().x,
            height = surface.size().y,
            "force graph created"
        );

        Ok(Self {
            simulation,
            renderer,
            interaction: InteractionController::new(),
            tooltip,
            origin: surface.origin(),
            destroyed: false,
        })
    }

    pub fn start(&mut self) {
        if self.destroyed {
            return;
        }
        self.simulation.start();
        debug!("force graph started");
    }

    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.simulation.stop();
        self.interaction.detach();
        self.renderer.set_interactive(false, f64::NEG_INFINITY);
        info!("force graph destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn root_element(&self) -> SceneRoot {
        self.renderer.scene().clone()
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn pinned_count(&self) -> usize {
        self.simulation
            .nodes()
            .iter()
            .filter(|node| node.pin.is_some())
            .count()
    }

    pub fn frame(&mut self, scheduler: &dyn FrameScheduler) -> bool {
        let listeners: &mut [&mut dyn TickListener] = &mut [&mut self.renderer];
        if !self.simulation.run_frame(listeners) {
            return false;
        }
        if self.simulation.is_running() {
            scheduler.request_frame();
        }
        true
    }

    pub fn handle_pointer(&mut self, event: PointerEvent, now: f64) {
        if self.destroyed {
            return;
        }

        let scene = self.renderer.scene().clone();
        let to_scene = |screen: Pos2| scene.borrow().to_scene(self.origin, screen);

        match event {
            PointerEvent::Pressed { position } => {
                match self.renderer.hit_test(to_scene(position)) {
                    Some(HoverTarget::Node(node)) => {
                        self.interaction.drag_start(&mut self.simulation, node);
                    }
                    _ => self.interaction.pan_start(position),
                }
            }
            PointerEvent::Moved { position } => match self.interaction.drag_state() {
                DragState::Dragging { .. } => {
                    self.interaction
                        .drag_move(&mut self.simulation, to_scene(position));
                }
                DragState::Panning { .. } => self.interaction.pan_to(position),
                DragState::Idle => {}
            },
            PointerEvent::Released { position } => match self.interaction.drag_state() {
                DragState::Dragging { .. } => {
                    self.interaction
                        .drag_end(&mut self.simulation, to_scene(position));
                }
                DragState::Panning { .. } => self.interaction.pan_end(),
                DragState::Idle => {}
            },
            PointerEvent::Hover { position } => {
                if matches!(self.interaction.drag_state(), DragState::Idle) {
                    let target = position.and_then(|pointer| {
                        self.renderer.hit_test(to_scene(pointer))
                    });
                    self.renderer
                        .hover(target, position.unwrap_or_default(), now);
                }
            }
            PointerEvent::Scrolled { position, delta } => {
                let center = scene.borrow().center(self.origin);
                self.interaction.zoom_at(center, position, delta);
            }
            PointerEvent::Panned { delta } => self.interaction.pan_by(delta),
        }

        scene.borrow_mut().transform = self.interaction.transform();
    }

    pub fn ui(&mut self, ui: &mut Ui, surface: &mut MountSurface) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        surface.place(rect.min);
        self.origin = rect.min;

        let now = ui.input(|input| input.time);
        for event in collect_pointer_events(ui, &response) {
            self.handle_pointer(event, now);
        }

        self.frame(ui.ctx());

        if self.renderer.hovered().is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        surface.paint(&ui.painter_at(rect));
        self.tooltip.with(|overlay| {
            overlay.paint(ui.ctx(), now);
            if overlay.is_animating(now) {
                ui.ctx().request_repaint();
            }
        });
    }
}

impl Drop for ForceGraph {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn collect_pointer_events(ui: &Ui, response: &egui::Response) -> Vec<PointerEvent> {
    let mut events = Vec::new();
    let (press_origin, latest, scroll) = ui.input(|input| {
        (
            input.pointer.press_origin(),
            input.pointer.latest_pos(),
            input.raw_scroll_delta.y,
        )
    });

    if response.drag_started_by(PointerButton::Primary)
        && let Some(position) = press_origin
    {
        events.push(PointerEvent::Pressed { position });
    }

    if response.dragged_by(PointerButton::Primary)
        && let Some(position) = response.interact_pointer_pos()
    {
        events.push(PointerEvent::Moved { position });
    }

    if response.dragged_by(PointerButton::Secondary) || response.dragged_by(PointerButton::Middle)
    {
        events.push(PointerEvent::Panned {
            delta: response.drag_delta(),
        });
    }

    if response.drag_stopped()
        && let Some(position) = response.interact_pointer_pos().or(latest)
    {
        events.push(PointerEvent::Released { position });
    }

    events.push(PointerEvent::Hover {
        position: if response.hovered() {
            response.hover_pos()
        } else {
            None
        },
    });

    if response.hovered()
        && scroll.abs() > f32::EPSILON
        && let Some(position) = latest
    {
        events.push(PointerEvent::Scrolled {
            position,
            delta: scroll,
        });
    }

    events
}
