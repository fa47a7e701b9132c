use eframe::egui::{Vec2, vec2};

// Bodies closer than the smallest cell at this depth share a leaf.
const MAX_DEPTH: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Square {
    pub(super) min: Vec2,
    pub(super) side: f32,
}

impl Square {
    fn covering(points: &[Vec2]) -> Option<Self> {
        let (min, max) = points.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(min, max), point| (min.min(*point), max.max(*point)),
        );
        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return None;
        }

        let min = vec2(min.x.floor(), min.y.floor());
        let mut side = 1.0_f32;
        while min.x + side <= max.x || min.y + side <= max.y {
            side *= 2.0;
        }
        Some(Self { min, side })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let max = self.min + Vec2::splat(self.side);
        point.x >= self.min.x && point.y >= self.min.y && point.x <= max.x && point.y <= max.y
    }

    fn quadrant(self, point: Vec2) -> usize {
        let mid = self.min + Vec2::splat(self.side * 0.5);
        usize::from(point.x >= mid.x) | (usize::from(point.y >= mid.y) << 1)
    }

    fn child(self, quadrant: usize) -> Self {
        let half = self.side * 0.5;
        let offset = vec2(
            if quadrant & 1 == 0 { 0.0 } else { half },
            if quadrant & 2 == 0 { 0.0 } else { half },
        );
        Self {
            min: self.min + offset,
            side: half,
        }
    }
}

#[derive(Debug)]
pub(super) enum Contents {
    Bodies(Vec<usize>),
    Quadrants([Option<usize>; 4]),
}

#[derive(Debug)]
pub(super) struct Cell {
    pub(super) extent: Square,
    pub(super) contents: Contents,
    pub(super) mass: f32,
    pub(super) center_of_mass: Vec2,
}

impl Cell {
    fn leaf(extent: Square) -> Self {
        Self {
            extent,
            contents: Contents::Bodies(Vec::new()),
            mass: 0.0,
            center_of_mass: Vec2::ZERO,
        }
    }
}

// Every body carries unit charge, so a cell's mass is its body count.
#[derive(Debug)]
pub(super) struct QuadTree {
    cells: Vec<Cell>,
}

impl QuadTree {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let extent = Square::covering(positions)?;
        let mut tree = Self {
            cells: vec![Cell::leaf(extent)],
        };
        for body in 0..positions.len() {
            tree.insert(0, body, positions, 0);
        }
        tree.aggregate(0, positions);
        Some(tree)
    }

    pub(super) fn root(&self) -> &Cell {
        &self.cells[0]
    }

    pub(super) fn cell(&self, id: usize) -> &Cell {
        &self.cells[id]
    }

    fn insert(&mut self, cell: usize, body: usize, positions: &[Vec2], depth: usize) {
        let point = positions[body];
        let residents = match &mut self.cells[cell].contents {
            Contents::Bodies(bodies) => {
                if bodies.is_empty() || depth >= MAX_DEPTH || positions[bodies[0]] == point {
                    bodies.push(body);
                    return;
                }
                std::mem::take(bodies)
            }
            Contents::Quadrants(_) => Vec::new(),
        };

        if !residents.is_empty() {
            self.cells[cell].contents = Contents::Quadrants([None; 4]);
            for resident in residents {
                self.insert(cell, resident, positions, depth);
            }
        }

        let quadrant = self.cells[cell].extent.quadrant(point);
        let child = self.child_of(cell, quadrant);
        self.insert(child, body, positions, depth + 1);
    }

    fn child_of(&mut self, cell: usize, quadrant: usize) -> usize {
        if let Contents::Quadrants(children) = &self.cells[cell].contents
            && let Some(child) = children[quadrant]
        {
            return child;
        }

        let child = self.cells.len();
        let extent = self.cells[cell].extent.child(quadrant);
        self.cells.push(Cell::leaf(extent));
        if let Contents::Quadrants(children) = &mut self.cells[cell].contents {
            children[quadrant] = Some(child);
        }
        child
    }

    fn aggregate(&mut self, cell: usize, positions: &[Vec2]) -> (f32, Vec2) {
        let children = match &self.cells[cell].contents {
            Contents::Quadrants(children) => Some(*children),
            Contents::Bodies(_) => None,
        };

        let (mass, weighted) = match children {
            Some(children) => children.into_iter().flatten().fold(
                (0.0, Vec2::ZERO),
                |(mass, weighted), child| {
                    let (child_mass, child_weighted) = self.aggregate(child, positions);
                    (mass + child_mass, weighted + child_weighted)
                },
            ),
            None => match &self.cells[cell].contents {
                Contents::Bodies(bodies) => (
                    bodies.len() as f32,
                    bodies
                        .iter()
                        .fold(Vec2::ZERO, |sum, &body| sum + positions[body]),
                ),
                Contents::Quadrants(_) => (0.0, Vec2::ZERO),
            },
        };

        let node = &mut self.cells[cell];
        node.mass = mass;
        if mass > 0.0 {
            node.center_of_mass = weighted / mass;
        }
        (mass, weighted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bodies_below(tree: &QuadTree, cell: &Cell, out: &mut Vec<usize>) {
        match &cell.contents {
            Contents::Bodies(bodies) => out.extend_from_slice(bodies),
            Contents::Quadrants(children) => {
                for &child in children.iter().flatten() {
                    let child = tree.cell(child);
                    assert!(cell.extent.contains(child.extent.min));
                    bodies_below(tree, child, out);
                }
            }
        }
    }

    #[test]
    fn empty_input_has_no_tree() {
        assert!(QuadTree::build(&[]).is_none());
    }

    #[test]
    fn extent_covers_every_body() {
        let positions = vec![vec2(-3.5, 2.0), vec2(10.0, -7.25), vec2(0.0, 0.0)];
        let tree = QuadTree::build(&positions).unwrap();
        for point in &positions {
            assert!(tree.root().extent.contains(*point));
        }
        assert_eq!(tree.root().extent.min, vec2(-4.0, -8.0));
    }

    #[test]
    fn splits_and_keeps_every_body() {
        let positions = (0..40)
            .map(|index| vec2((index % 8) as f32 * 25.0, (index / 8) as f32 * 25.0))
            .collect::<Vec<_>>();
        let tree = QuadTree::build(&positions).unwrap();
        assert!(matches!(tree.root().contents, Contents::Quadrants(_)));
        assert_eq!(tree.root().mass, 40.0);

        let mut seen = Vec::new();
        bodies_below(&tree, tree.root(), &mut seen);
        seen.sort_unstable();
        assert_eq!(seen, (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn distinct_bodies_end_in_separate_leaves() {
        let positions = vec![vec2(1.0, 1.0), vec2(1.5, 1.0)];
        let tree = QuadTree::build(&positions).unwrap();

        assert!(matches!(tree.root().contents, Contents::Quadrants(_)));
        let leaves = tree
            .cells
            .iter()
            .filter(|cell| matches!(&cell.contents, Contents::Bodies(bodies) if !bodies.is_empty()))
            .count();
        assert_eq!(leaves, 2);
        assert_eq!(tree.root().center_of_mass, vec2(1.25, 1.0));
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let positions = vec![vec2(3.0, 3.0); 10];
        let tree = QuadTree::build(&positions).unwrap();
        let Contents::Bodies(bodies) = &tree.root().contents else {
            panic!("coincident bodies must not split");
        };
        assert_eq!(bodies.len(), 10);
        assert_eq!(tree.root().center_of_mass, vec2(3.0, 3.0));
    }
}
