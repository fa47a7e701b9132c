use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui::{Pos2, Stroke, Vec2};
use tracing::debug;

use super::encoding::{color_of, icon_of, link_color, link_width};
use super::model::{ResolvedLink, ServiceNode};
use super::render_utils::distance_to_segment;
use super::scene::{LabelShape, LinkShape, MountSurface, NodeShape, Scene, SceneRoot};
use super::simulation::{SimNode, TickListener};
use super::tooltip::TooltipHandle;

pub const NODE_RADIUS: f32 = 20.0;
const NODE_BORDER: f32 = 3.0;
const LABEL_SIZE: f32 = 16.0;
const LINK_HOVER_SLOP: f32 = 4.0;

pub type TooltipContent = Box<dyn Fn(&ServiceNode) -> String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoverTarget {
    Node(usize),
    Link(usize),
}

pub struct SceneRenderer {
    scene: SceneRoot,
    nodes: Vec<ServiceNode>,
    links: Vec<ResolvedLink>,
    tooltip: TooltipHandle,
    tooltip_content: TooltipContent,
    hovered: Option<HoverTarget>,
}

impl SceneRenderer {
    pub fn mount(
        surface: &mut MountSurface,
        nodes: Vec<ServiceNode>,
        links: Vec<ResolvedLink>,
        positions: &[SimNode],
        tooltip: TooltipHandle,
        tooltip_content: TooltipContent,
    ) -> Self {
        let removed = surface.clear();
        if removed > 0 {
            debug!(removed, "cleared previous scene from surface");
        }

        let mut scene = Scene::new(surface.size());
        scene.links = links
            .iter()
            .map(|link| LinkShape {
                from: Vec2::ZERO,
                to: Vec2::ZERO,
                width: link_width(link.invocations),
                color: link_color(link.latency),
            })
            .collect();
        scene.nodes = nodes
            .iter()
            .map(|node| {
                let color = color_of(node);
                NodeShape {
                    center: Vec2::ZERO,
                    radius: NODE_RADIUS,
                    fill: color,
                    stroke: Stroke::new(NODE_BORDER, color),
                }
            })
            .collect();
        scene.labels = nodes
            .iter()
            .map(|node| LabelShape {
                position: Vec2::ZERO,
                icon: icon_of(node),
                size: LABEL_SIZE,
            })
            .collect();

        let scene = Rc::new(RefCell::new(scene));
        surface.attach(Rc::clone(&scene));

        let mut renderer = Self {
            scene,
            nodes,
            links,
            tooltip,
            tooltip_content,
            hovered: None,
        };
        renderer.on_tick(positions);
        renderer
    }

    pub fn scene(&self) -> &SceneRoot {
        &self.scene
    }

    pub fn hovered(&self) -> Option<HoverTarget> {
        self.hovered
    }

    pub fn hit_test(&self, point: Vec2) -> Option<HoverTarget> {
        let scene = self.scene.borrow();
        if let Some(index) = scene
            .nodes
            .iter()
            .rposition(|node| (node.center - point).length() <= node.radius)
        {
            return Some(HoverTarget::Node(index));
        }

        let slop = LINK_HOVER_SLOP / scene.transform.scale;
        scene
            .links
            .iter()
            .rposition(|link| {
                distance_to_segment(point, link.from, link.to) <= (link.width * 0.5).max(slop)
            })
            .map(HoverTarget::Link)
    }

    pub fn hover(&mut self, target: Option<HoverTarget>, pointer: Pos2, now: f64) {
        if target == self.hovered {
            return;
        }
        self.hovered = target;

        match target {
            Some(target) => self.tooltip.show(self.describe(target), pointer, now),
            None => self.tooltip.hide(now),
        }
    }

    fn describe(&self, target: HoverTarget) -> String {
        match target {
            HoverTarget::Node(index) => (self.tooltip_content)(&self.nodes[index]),
            HoverTarget::Link(index) => {
                let link = &self.links[index];
                format!(
                    "Invocations: {}\nLatency: {} ms",
                    link.invocations, link.latency
                )
            }
        }
    }

    pub fn set_interactive(&mut self, interactive: bool, now: f64) {
        self.scene.borrow_mut().interactive = interactive;
        if !interactive && self.hovered.take().is_some() {
            self.tooltip.hide(now);
        }
    }
}

impl TickListener for SceneRenderer {
    fn on_tick(&mut self, positions: &[SimNode]) {
        let mut scene = self.scene.borrow_mut();
        let scene = &mut *scene;

        for (shape, link) in scene.links.iter_mut().zip(&self.links) {
            shape.from = positions[link.source].position;
            shape.to = positions[link.target].position;
        }
        for (shape, node) in scene.nodes.iter_mut().zip(positions) {
            shape.center = node.position;
        }
        for (shape, node) in scene.labels.iter_mut().zip(positions) {
            shape.position = node.position;
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::graph::encoding::Severity;
    use crate::graph::model::node;

    fn positions(points: &[(f32, f32)]) -> Vec<SimNode> {
        points
            .iter()
            .map(|&(x, y)| SimNode {
                position: vec2(x, y),
                velocity: Vec2::ZERO,
                pin: None,
            })
            .collect()
    }

    fn renderer(surface: &mut MountSurface) -> SceneRenderer {
        let nodes = vec![node("a", 10, 9), node("b", 10, 1)];
        let links = vec![ResolvedLink {
            source: 0,
            target: 1,
            invocations: 5,
            latency: 100.0,
        }];
        SceneRenderer::mount(
            surface,
            nodes,
            links,
            &positions(&[(-100.0, 0.0), (100.0, 0.0)]),
            TooltipHandle::acquire(),
            Box::new(|node| format!("Name: {}", node.name)),
        )
    }

    #[test]
    fn mount_draws_one_scene() {
        let mut surface = MountSurface::new(vec2(800.0, 600.0));
        let renderer = renderer(&mut surface);

        assert_eq!(surface.scenes().len(), 1);
        let scene = renderer.scene().borrow();
        assert_eq!(scene.viewport_size, vec2(800.0, 600.0));
        assert_eq!(scene.drawable_count(), 6 + 1 + 2 + 2);
        assert_eq!(scene.nodes[0].fill, Severity::High.color());
        assert_eq!(scene.nodes[0].stroke.color, Severity::High.color());
        assert_eq!(scene.nodes[1].fill, Severity::Low.color());
        assert!((scene.links[0].width - 5.0_f32.sqrt() * 0.5).abs() < 1e-6);
        assert_eq!(scene.links[0].from, vec2(-100.0, 0.0));
    }

    #[test]
    fn remount_replaces_previous_scene() {
        let mut surface = MountSurface::new(vec2(800.0, 600.0));
        let first = renderer(&mut surface);
        let second = renderer(&mut surface);

        assert_eq!(surface.scenes().len(), 1);
        assert!(Rc::ptr_eq(&surface.scenes()[0], second.scene()));
        assert!(!Rc::ptr_eq(&surface.scenes()[0], first.scene()));
    }

    #[test]
    fn tick_moves_every_primitive() {
        let mut surface = MountSurface::new(vec2(800.0, 600.0));
        let mut renderer = renderer(&mut surface);
        renderer.on_tick(&positions(&[(1.0, 2.0), (3.0, 4.0)]));

        let scene = renderer.scene().borrow();
        assert_eq!(scene.links[0].from, vec2(1.0, 2.0));
        assert_eq!(scene.links[0].to, vec2(3.0, 4.0));
        assert_eq!(scene.nodes[1].center, vec2(3.0, 4.0));
        assert_eq!(scene.labels[0].position, vec2(1.0, 2.0));
    }

    #[test]
    fn hit_test_prefers_nodes_over_links() {
        let mut surface = MountSurface::new(vec2(800.0, 600.0));
        let renderer = renderer(&mut surface);

        assert_eq!(renderer.hit_test(vec2(-95.0, 5.0)), Some(HoverTarget::Node(0)));
        assert_eq!(renderer.hit_test(vec2(0.0, 1.0)), Some(HoverTarget::Link(0)));
        assert_eq!(renderer.hit_test(vec2(0.0, 50.0)), None);
    }

    #[test]
    fn hover_drives_the_tooltip() {
        let mut surface = MountSurface::new(vec2(800.0, 600.0));
        let mut renderer = renderer(&mut surface);
        let tooltip = TooltipHandle::acquire();

        renderer.hover(Some(HoverTarget::Node(1)), Pos2::new(50.0, 80.0), 0.0);
        tooltip.with(|overlay| {
            assert_eq!(overlay.content(), "Name: b");
            assert_eq!(overlay.position(), Pos2::new(50.0, 52.0));
            assert!(overlay.opacity(1.0) > 0.8);
        });

        renderer.hover(Some(HoverTarget::Link(0)), Pos2::new(10.0, 80.0), 1.0);
        tooltip.with(|overlay| {
            assert_eq!(overlay.content(), "Invocations: 5\nLatency: 100 ms");
        });

        renderer.hover(None, Pos2::ZERO, 2.0);
        assert_eq!(renderer.hovered(), None);
        tooltip.with(|overlay| assert_eq!(overlay.opacity(3.0), 0.0));
    }
}
