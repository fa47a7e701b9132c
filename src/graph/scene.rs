use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui::{
    Align2, Color32, FontFamily, FontId, Painter, Pos2, Rect, Stroke, Vec2, vec2,
};

use super::encoding::{ServiceIcon, Severity};
use super::interaction::ViewTransform;
use super::render_utils::{circle_visible, draw_background, edge_visible};

pub const ICON_FONT_FAMILY: &str = "service-icons";

const LEGEND_INSET: Vec2 = vec2(20.0, 20.0);
const LEGEND_ROW_PITCH: f32 = 20.0;
const LEGEND_SWATCH: f32 = 18.0;
const LEGEND_LABEL_GAP: f32 = 7.0;
const LEGEND_FONT_SIZE: f32 = 12.0;

pub type SceneRoot = Rc<RefCell<Scene>>;

#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
    pub swatch: Rect,
    pub color: Color32,
    pub label: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkShape {
    pub from: Vec2,
    pub to: Vec2,
    pub width: f32,
    pub color: Color32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeShape {
    pub center: Vec2,
    pub radius: f32,
    pub fill: Color32,
    pub stroke: Stroke,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelShape {
    pub position: Vec2,
    pub icon: ServiceIcon,
    pub size: f32,
}

#[derive(Debug)]
pub struct Scene {
    pub viewport_size: Vec2,
    pub transform: ViewTransform,
    pub legend: Vec<LegendEntry>,
    pub links: Vec<LinkShape>,
    pub nodes: Vec<NodeShape>,
    pub labels: Vec<LabelShape>,
    pub interactive: bool,
}

impl Scene {
    pub fn new(viewport_size: Vec2) -> Self {
        Self {
            viewport_size,
            transform: ViewTransform::default(),
            legend: legend_entries(viewport_size),
            links: Vec::new(),
            nodes: Vec::new(),
            labels: Vec::new(),
            interactive: true,
        }
    }

    pub fn drawable_count(&self) -> usize {
        self.legend.len() * 2 + self.links.len() + self.nodes.len() + self.labels.len()
    }

    pub fn center(&self, origin: Pos2) -> Pos2 {
        origin + self.viewport_size * 0.5
    }

    pub fn to_screen(&self, origin: Pos2, scene: Vec2) -> Pos2 {
        self.transform.scene_to_screen(self.center(origin), scene)
    }

    pub fn to_scene(&self, origin: Pos2, screen: Pos2) -> Vec2 {
        self.transform.screen_to_scene(self.center(origin), screen)
    }

    pub fn swatch_on_screen(&self, origin: Pos2, entry: &LegendEntry) -> Rect {
        Rect::from_min_size(
            self.to_screen(origin, entry.swatch.min.to_vec2()),
            entry.swatch.size() * self.transform.scale,
        )
    }

    fn paint(&self, painter: &Painter, origin: Pos2, icon_font: bool) {
        let viewport = Rect::from_min_size(origin, self.viewport_size);
        let scale = self.transform.scale;
        draw_background(painter, viewport, self.to_screen(origin, Vec2::ZERO), scale);

        for entry in &self.legend {
            let swatch = self.swatch_on_screen(origin, entry);
            painter.rect_filled(swatch, 0.0, entry.color);
            painter.text(
                swatch.right_center() + vec2(LEGEND_LABEL_GAP * scale, 0.0),
                Align2::LEFT_CENTER,
                entry.label,
                FontId::proportional(LEGEND_FONT_SIZE * scale),
                Color32::BLACK,
            );
        }

        for link in &self.links {
            let start = self.to_screen(origin, link.from);
            let end = self.to_screen(origin, link.to);
            let width = link.width * scale;
            if !edge_visible(viewport, start, end, width) {
                continue;
            }
            painter.line_segment([start, end], Stroke::new(width, link.color));
        }

        for node in &self.nodes {
            let center = self.to_screen(origin, node.center);
            let radius = node.radius * scale;
            if !circle_visible(viewport, center, radius) {
                continue;
            }
            painter.circle(
                center,
                radius,
                node.fill,
                Stroke::new(node.stroke.width * scale, node.stroke.color),
            );
        }

        for label in &self.labels {
            let position = self.to_screen(origin, label.position);
            if !viewport.contains(position) {
                continue;
            }
            let size = label.size * scale;
            if icon_font {
                painter.text(
                    position,
                    Align2::CENTER_CENTER,
                    label.icon.glyph(),
                    FontId::new(size, FontFamily::Name(ICON_FONT_FAMILY.into())),
                    Color32::BLACK,
                );
            } else {
                painter.text(
                    position,
                    Align2::CENTER_CENTER,
                    label.icon.fallback_text(),
                    FontId::monospace(size * 0.7),
                    Color32::BLACK,
                );
            }
        }
    }
}

fn legend_entries(viewport_size: Vec2) -> Vec<LegendEntry> {
    let top_left = (viewport_size * -0.5).to_pos2() + LEGEND_INSET;
    Severity::ALL
        .iter()
        .enumerate()
        .map(|(row, severity)| LegendEntry {
            swatch: Rect::from_min_size(
                top_left + vec2(0.0, LEGEND_ROW_PITCH * row as f32),
                Vec2::splat(LEGEND_SWATCH),
            ),
            color: severity.color(),
            label: severity.label(),
        })
        .collect()
}

pub struct MountSurface {
    origin: Pos2,
    size: Vec2,
    icon_font: bool,
    children: Vec<SceneRoot>,
}

impl MountSurface {
    pub fn new(size: Vec2) -> Self {
        Self {
            origin: Pos2::ZERO,
            size,
            icon_font: false,
            children: Vec::new(),
        }
    }

    pub fn with_icon_font(mut self, icon_font: bool) -> Self {
        self.icon_font = icon_font;
        self
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn origin(&self) -> Pos2 {
        self.origin
    }

    pub fn place(&mut self, origin: Pos2) {
        self.origin = origin;
    }

    pub fn resize(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.children.len();
        self.children.clear();
        removed
    }

    pub fn attach(&mut self, scene: SceneRoot) {
        self.children.push(scene);
    }

    pub fn scenes(&self) -> &[SceneRoot] {
        &self.children
    }

    pub fn paint(&self, painter: &Painter) {
        for scene in &self.children {
            scene.borrow().paint(painter, self.origin, self.icon_font);
        }
    }
}
