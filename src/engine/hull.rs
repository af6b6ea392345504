use std::collections::BTreeMap;

use eframe::egui::Vec2;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

pub const HULL_PADDING: f32 = 18.0;
const SMOOTHING_ITERATIONS: usize = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HullStyle {
    Circle,
    #[default]
    Smooth,
    Convex,
    None,
}

impl HullStyle {
    pub const ALL: [HullStyle; 4] = [
        HullStyle::Smooth,
        HullStyle::Convex,
        HullStyle::Circle,
        HullStyle::None,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Smooth => "smooth",
            Self::Convex => "convex",
            Self::None => "none",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum HullShape {
    Circle { center: Vec2, radius: f32 },
    /// Closed polygon; the last point connects back to the first.
    Path { points: Vec<Vec2> },
}

impl HullShape {
    pub fn contains(&self, point: Vec2) -> bool {
        match self {
            Self::Circle { center, radius } => (point - *center).length() <= *radius,
            Self::Path { points } => polygon_contains(points, point),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClusterHull {
    pub cluster: i64,
    pub members: Vec<usize>,
    pub shape: HullShape,
}

/// Displayable, non-external members of each cluster.
pub fn cluster_members(dataset: &Dataset, displayable: &[bool]) -> BTreeMap<i64, Vec<usize>> {
    let mut members: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (index, node) in dataset.nodes.iter().enumerate() {
        if node.external || !displayable.get(index).copied().unwrap_or(false) {
            continue;
        }
        members.entry(node.cluster).or_default().push(index);
    }
    members
}

fn centroid_of(positions: &[Vec2], members: &[usize]) -> Vec2 {
    let sum = members
        .iter()
        .fold(Vec2::ZERO, |sum, &index| sum + positions[index]);
    sum / members.len().max(1) as f32
}

fn bounding_circle(positions: &[Vec2], radii: &[f32], members: &[usize]) -> HullShape {
    let center = centroid_of(positions, members);
    let radius = members
        .iter()
        .map(|&index| {
            (positions[index] - center).length() + radii.get(index).copied().unwrap_or(0.0)
        })
        .fold(0.0_f32, f32::max)
        + HULL_PADDING;
    HullShape::Circle { center, radius }
}

/// Member points pushed away from the centroid by padding plus node radius.
pub fn inflated_points(positions: &[Vec2], radii: &[f32], members: &[usize]) -> Vec<Vec2> {
    let center = centroid_of(positions, members);
    members
        .iter()
        .map(|&index| {
            let point = positions[index];
            let offset = point - center;
            let distance = offset.length();
            if distance <= 0.0001 {
                return point;
            }
            let grow = HULL_PADDING + radii.get(index).copied().unwrap_or(0.0);
            point + offset / distance * grow
        })
        .collect()
}

pub fn hull_for_members(
    positions: &[Vec2],
    radii: &[f32],
    members: &[usize],
    style: HullStyle,
) -> Option<HullShape> {
    if members.is_empty() || style == HullStyle::None {
        return None;
    }
    if style == HullStyle::Circle {
        return Some(bounding_circle(positions, radii, members));
    }

    let hull = convex_hull(&inflated_points(positions, radii, members));
    if hull.len() < 3 {
        return Some(bounding_circle(positions, radii, members));
    }

    if style == HullStyle::Smooth {
        // Corner cutting eats into sharp corners; keep the straight outline
        // when it would leave a member outside.
        let smooth = chaikin(&hull, SMOOTHING_ITERATIONS);
        if members
            .iter()
            .all(|&index| polygon_contains(&smooth, positions[index]))
        {
            return Some(HullShape::Path { points: smooth });
        }
    }
    Some(HullShape::Path { points: hull })
}

pub fn compute_hulls(
    dataset: &Dataset,
    positions: &[Vec2],
    radii: &[f32],
    displayable: &[bool],
    style: HullStyle,
) -> Vec<ClusterHull> {
    if style == HullStyle::None {
        return Vec::new();
    }

    cluster_members(dataset, displayable)
        .into_iter()
        .filter_map(|(cluster, members)| {
            let shape = hull_for_members(positions, radii, &members, style)?;
            Some(ClusterHull {
                cluster,
                members,
                shape,
            })
        })
        .collect()
}

fn cross(o: Vec2, a: Vec2, b: Vec2) -> f32 {
    let oa = a - o;
    let ob = b - o;
    (oa.x * ob.y) - (oa.y * ob.x)
}

/// Andrew's monotone chain. Counter-clockwise in a y-up frame, without
/// repeating the first point; collinear points are dropped.
pub fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
    let mut sorted = points
        .iter()
        .copied()
        .filter(|point| point.x.is_finite() && point.y.is_finite())
        .collect::<Vec<_>>();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<Vec2> = Vec::with_capacity(sorted.len());
    for &point in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], point) <= 0.0
        {
            lower.pop();
        }
        lower.push(point);
    }

    let mut upper: Vec<Vec2> = Vec::with_capacity(sorted.len());
    for &point in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], point) <= 0.0
        {
            upper.pop();
        }
        upper.push(point);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Chaikin corner cutting on a closed polygon.
pub fn chaikin(points: &[Vec2], iterations: usize) -> Vec<Vec2> {
    let mut current = points.to_vec();
    for _ in 0..iterations {
        if current.len() < 3 {
            break;
        }
        let mut next = Vec::with_capacity(current.len() * 2);
        for (index, &start) in current.iter().enumerate() {
            let end = current[(index + 1) % current.len()];
            next.push(start + (end - start) * 0.25);
            next.push(start + (end - start) * 0.75);
        }
        current = next;
    }
    current
}

/// Even-odd point-in-polygon test; points on an edge may go either way.
pub fn polygon_contains(polygon: &[Vec2], point: Vec2) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut previous = polygon[polygon.len() - 1];
    for &current in polygon {
        if (current.y > point.y) != (previous.y > point.y) {
            let t = (point.y - current.y) / (previous.y - current.y);
            let crossing_x = current.x + t * (previous.x - current.x);
            if point.x < crossing_x {
                inside = !inside;
            }
        }
        previous = current;
    }
    inside
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;
    use serde_json::json;

    use super::*;

    fn inside_or_on_convex(polygon: &[Vec2], point: Vec2) -> bool {
        (0..polygon.len()).all(|index| {
            let a = polygon[index];
            let b = polygon[(index + 1) % polygon.len()];
            cross(a, b, point) >= -1e-3
        })
    }

    #[test]
    fn monotone_chain_drops_interior_and_collinear_points() {
        let points = vec![
            vec2(0.0, 0.0),
            vec2(2.0, 0.0),
            vec2(4.0, 0.0),
            vec2(4.0, 4.0),
            vec2(0.0, 4.0),
            vec2(2.0, 2.0),
            vec2(1.0, 3.0),
        ];
        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 4);
        for corner in [vec2(0.0, 0.0), vec2(4.0, 0.0), vec2(4.0, 4.0), vec2(0.0, 4.0)] {
            assert!(hull.contains(&corner));
        }
    }

    #[test]
    fn collinear_members_fall_back_to_circle() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 0.0), vec2(20.0, 0.0)];
        let radii = vec![0.0; 3];
        let shape = hull_for_members(&positions, &radii, &[0, 1, 2], HullStyle::Convex);
        assert!(matches!(shape, Some(HullShape::Circle { .. })));
    }

    #[test]
    fn inflated_hull_contains_every_member() {
        let positions = vec![
            vec2(0.0, 0.0),
            vec2(120.0, 10.0),
            vec2(60.0, 90.0),
            vec2(55.0, 30.0),
            vec2(-20.0, 70.0),
            vec2(100.0, -40.0),
        ];
        let radii = vec![5.0, 9.0, 4.0, 12.0, 6.0, 7.0];
        let members = (0..positions.len()).collect::<Vec<_>>();
        let Some(HullShape::Path { points }) =
            hull_for_members(&positions, &radii, &members, HullStyle::Convex)
        else {
            panic!("expected a polygon hull");
        };
        for position in &positions {
            assert!(inside_or_on_convex(&points, *position));
            assert!(polygon_contains(&points, *position));
        }
    }

    #[test]
    fn smooth_hull_keeps_elongated_members_inside() {
        let positions = vec![vec2(0.0, 0.0), vec2(1000.0, 0.0), vec2(1000.0, 10.0)];
        let radii = vec![0.0; 3];
        let shape = hull_for_members(&positions, &radii, &[0, 1, 2], HullStyle::Smooth)
            .expect("hull for three members");
        for position in &positions {
            assert!(shape.contains(*position));
        }

        let compact = vec![
            vec2(0.0, 0.0),
            vec2(60.0, 0.0),
            vec2(60.0, 60.0),
            vec2(0.0, 60.0),
        ];
        let radii = vec![6.0; 4];
        let Some(HullShape::Path { points }) =
            hull_for_members(&compact, &radii, &[0, 1, 2, 3], HullStyle::Smooth)
        else {
            panic!("expected a polygon hull");
        };
        assert_eq!(points.len(), 16);
        for position in &compact {
            assert!(polygon_contains(&points, *position));
        }
    }

    #[test]
    fn chaikin_doubles_vertices_per_iteration() {
        let square = vec![
            vec2(0.0, 0.0),
            vec2(4.0, 0.0),
            vec2(4.0, 4.0),
            vec2(0.0, 4.0),
        ];
        let once = chaikin(&square, 1);
        assert_eq!(once.len(), 8);
        assert_eq!(once[0], vec2(1.0, 0.0));
        assert_eq!(once[1], vec2(3.0, 0.0));
        assert_eq!(chaikin(&square, 2).len(), 16);
    }

    #[test]
    fn circle_radius_covers_members_plus_padding() {
        let positions = vec![vec2(-10.0, 0.0), vec2(10.0, 0.0)];
        let radii = vec![3.0, 5.0];
        let Some(HullShape::Circle { center, radius }) =
            hull_for_members(&positions, &radii, &[0, 1], HullStyle::Circle)
        else {
            panic!("expected a circle");
        };
        assert_eq!(center, Vec2::ZERO);
        assert_eq!(radius, 10.0 + 5.0 + HULL_PADDING);
    }

    #[test]
    fn hulls_skip_external_and_hidden_members() {
        let dataset = Dataset::load(&json!({
            "nodes": [
                { "id": "a", "cluster": 0 },
                { "id": "b", "cluster": 0, "external": true },
                { "id": "c", "cluster": 1 },
                { "id": "d", "cluster": 2 }
            ]
        }));
        let positions = vec![Vec2::ZERO; 4];
        let radii = vec![5.0; 4];
        let hulls = compute_hulls(
            &dataset,
            &positions,
            &radii,
            &[true, true, true, false],
            HullStyle::Smooth,
        );
        assert_eq!(hulls.len(), 2);
        assert_eq!(hulls[0].members, vec![0]);
        assert_eq!(hulls[1].cluster, 1);
        assert!(compute_hulls(&dataset, &positions, &radii, &[true; 4], HullStyle::None).is_empty());
    }
}
