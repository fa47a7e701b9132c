use eframe::egui::{Vec2, vec2};
use tracing::debug;

use super::SimNode;
use super::quadtree::{Cell, Contents, QuadTree};

// Sub-micro offset for bodies on the exact same coordinate.
pub(super) fn jiggle(seed: usize) -> f32 {
    (((seed as f32) * 0.618_034).fract() - 0.5) * 1e-6
}

fn non_zero(delta: Vec2, seed: usize) -> Vec2 {
    vec2(
        if delta.x == 0.0 { jiggle(seed) } else { delta.x },
        if delta.y == 0.0 { jiggle(seed + 1) } else { delta.y },
    )
}

#[derive(Clone, Copy, Debug)]
pub(super) struct Spring {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) strength: f32,
    pub(super) bias: f32,
}

impl Spring {
    pub(super) fn from_edges(node_count: usize, edges: &[(usize, usize)]) -> Vec<Self> {
        let (edges, out_of_range): (Vec<_>, Vec<_>) = edges
            .iter()
            .copied()
            .partition(|&(source, target)| source < node_count && target < node_count);
        if !out_of_range.is_empty() {
            debug!(
                skipped = out_of_range.len(),
                node_count, "ignoring edges outside the node arena"
            );
        }

        // Stiffness is shared out by node degree.
        let mut degree = vec![0u32; node_count];
        for &(source, target) in &edges {
            degree[source] += 1;
            degree[target] += 1;
        }

        edges
            .iter()
            .map(|&(source, target)| {
                let source_degree = degree[source] as f32;
                let target_degree = degree[target] as f32;
                Self {
                    source,
                    target,
                    strength: 1.0 / source_degree.min(target_degree),
                    bias: source_degree / (source_degree + target_degree),
                }
            })
            .collect()
    }
}

pub(super) fn apply_springs(nodes: &mut [SimNode], springs: &[Spring], distance: f32, alpha: f32) {
    for (index, spring) in springs.iter().enumerate() {
        let source = nodes[spring.source];
        let target = nodes[spring.target];

        let delta = non_zero(
            (target.position + target.velocity) - (source.position + source.velocity),
            index,
        );
        let length = delta.length();
        let correction = delta * ((length - distance) / length * alpha * spring.strength);

        nodes[spring.target].velocity -= correction * spring.bias;
        nodes[spring.source].velocity += correction * (1.0 - spring.bias);
    }
}

#[derive(Clone, Copy, Debug)]
pub(super) struct ChargeParams {
    pub(super) strength: f32,
    pub(super) theta_sq: f32,
    pub(super) distance_min_sq: f32,
}

fn charge_between(delta: Vec2, mass: f32, params: ChargeParams, seed: usize) -> Vec2 {
    let delta = non_zero(delta, seed);
    let mut distance_sq = delta.length_sq();
    if distance_sq < params.distance_min_sq {
        distance_sq = (params.distance_min_sq * distance_sq).sqrt();
    }
    delta * (params.strength * mass / distance_sq)
}

pub(super) fn accumulate_charge(
    tree: &QuadTree,
    cell: &Cell,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    velocity: &mut Vec2,
) {
    if cell.mass <= 0.0 {
        return;
    }

    let point = positions[index];
    match &cell.contents {
        Contents::Bodies(bodies) => {
            for &other in bodies {
                if other != index {
                    *velocity +=
                        charge_between(positions[other] - point, 1.0, params, index ^ other);
                }
            }
        }
        Contents::Quadrants(children) => {
            let delta = cell.center_of_mass - point;
            let side = cell.extent.side;
            if !cell.extent.contains(point) && side * side / params.theta_sq < delta.length_sq() {
                *velocity += charge_between(delta, cell.mass, params, index);
                return;
            }
            for &child in children.iter().flatten() {
                accumulate_charge(tree, tree.cell(child), index, positions, params, velocity);
            }
        }
    }
}

pub(super) fn apply_centering(nodes: &mut [SimNode], strength: f32, alpha: f32) {
    for node in nodes {
        node.velocity -= node.position * (strength * alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(x: f32, y: f32) -> SimNode {
        SimNode {
            position: vec2(x, y),
            velocity: Vec2::ZERO,
            pin: None,
        }
    }

    #[test]
    fn spring_strength_follows_degree() {
        let springs = Spring::from_edges(3, &[(0, 1), (0, 2)]);
        assert_eq!(springs[0].strength, 1.0);
        assert!((springs[0].bias - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn edges_outside_the_arena_are_skipped() {
        let springs = Spring::from_edges(2, &[(0, 5), (0, 1), (7, 1)]);
        assert_eq!(springs.len(), 1);
        assert_eq!((springs[0].source, springs[0].target), (0, 1));
        assert_eq!(springs[0].strength, 1.0);
    }

    #[test]
    fn stretched_spring_pulls_ends_together() {
        let mut nodes = vec![body(0.0, 0.0), body(300.0, 0.0)];
        let springs = Spring::from_edges(2, &[(0, 1)]);
        apply_springs(&mut nodes, &springs, 150.0, 1.0);
        assert!(nodes[0].velocity.x > 0.0);
        assert!(nodes[1].velocity.x < 0.0);
        assert_eq!(nodes[0].velocity.y, 0.0);
    }

    #[test]
    fn charge_pushes_bodies_apart() {
        let positions = vec![vec2(-10.0, 0.0), vec2(10.0, 0.0)];
        let tree = QuadTree::build(&positions).unwrap();
        let params = ChargeParams {
            strength: -300.0,
            theta_sq: 0.81,
            distance_min_sq: 1.0,
        };

        let mut left = Vec2::ZERO;
        accumulate_charge(&tree, tree.root(), 0, &positions, params, &mut left);
        let mut right = Vec2::ZERO;
        accumulate_charge(&tree, tree.root(), 1, &positions, params, &mut right);

        assert!(left.x < 0.0);
        assert!(right.x > 0.0);
        assert!((left.x + right.x).abs() < 1e-4);
    }

    #[test]
    fn coincident_bodies_still_get_a_finite_push() {
        let positions = vec![vec2(5.0, 5.0), vec2(5.0, 5.0)];
        let tree = QuadTree::build(&positions).unwrap();
        let params = ChargeParams {
            strength: -300.0,
            theta_sq: 0.81,
            distance_min_sq: 1.0,
        };
        let mut velocity = Vec2::ZERO;
        accumulate_charge(&tree, tree.root(), 0, &positions, params, &mut velocity);
        assert!(velocity.x.is_finite() && velocity.y.is_finite());
    }

    #[test]
    fn centering_pulls_toward_origin() {
        let mut nodes = vec![body(100.0, -50.0)];
        apply_centering(&mut nodes, 0.2, 1.0);
        assert_eq!(nodes[0].velocity, vec2(-20.0, 10.0));
    }
}
