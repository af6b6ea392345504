use std::collections::HashMap;

use eframe::egui::Vec2;

use crate::dataset::{Dataset, Edge};

use super::highlight::HighlightState;
use super::hull::{HullShape, HullStyle, cluster_members, hull_for_members};
use super::layout::{NodeState, stroke_weight};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emphasis {
    Normal,
    Highlighted,
    Dimmed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeDraw {
    pub index: usize,
    pub pos: Vec2,
    pub radius: f32,
    pub cluster: i64,
    pub external: bool,
    pub fixed: bool,
    pub selected: bool,
    pub emphasis: Emphasis,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeDraw {
    pub source: usize,
    pub target: usize,
    pub from: Vec2,
    pub to: Vec2,
    pub width: f32,
    pub opacity: f32,
    pub emphasis: Emphasis,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HullDraw {
    pub cluster: i64,
    pub label: String,
    pub members: Vec<usize>,
    pub shape: HullShape,
    pub emphasis: Emphasis,
}

/// What a single node move invalidated, as indices into the scene lists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScenePatch {
    pub node: Option<usize>,
    pub edges: Vec<usize>,
    pub hull: Option<usize>,
}

pub struct SceneInput<'a> {
    pub dataset: &'a Dataset,
    pub edges: &'a [Edge],
    pub displayable: &'a [bool],
    pub radii: &'a [f32],
    pub states: &'a [NodeState],
    pub highlight: &'a HighlightState,
    pub hull_style: HullStyle,
    pub edge_opacity: f32,
    pub selected: Option<usize>,
}

/// Retained draw commands in world coordinates. Hulls paint first, then
/// edges, then nodes.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub nodes: Vec<NodeDraw>,
    pub edges: Vec<EdgeDraw>,
    pub hulls: Vec<HullDraw>,
    hull_style: HullStyle,
    node_slots: HashMap<usize, usize>,
    incident: HashMap<usize, Vec<usize>>,
    hull_slots: HashMap<i64, usize>,
}

fn node_emphasis(input: &SceneInput<'_>, index: usize) -> Emphasis {
    let highlight = input.highlight;
    if !highlight.node_in_spotlight(input.dataset, index) {
        return Emphasis::Dimmed;
    }
    if !highlight.focus_active {
        return Emphasis::Normal;
    }
    if highlight.nodes.contains(&index) {
        Emphasis::Highlighted
    } else {
        Emphasis::Dimmed
    }
}

fn edge_emphasis(input: &SceneInput<'_>, edge: &Edge) -> Emphasis {
    let highlight = input.highlight;
    let spotlit = highlight.node_in_spotlight(input.dataset, edge.source)
        && highlight.node_in_spotlight(input.dataset, edge.target);
    if !spotlit {
        return Emphasis::Dimmed;
    }
    if !highlight.focus_active {
        return Emphasis::Normal;
    }
    if highlight.edges.contains(&(edge.source, edge.target)) {
        Emphasis::Highlighted
    } else {
        Emphasis::Dimmed
    }
}

fn hull_emphasis(highlight: &HighlightState, cluster: i64) -> Emphasis {
    if !highlight.cluster_in_focus(cluster) {
        Emphasis::Dimmed
    } else if highlight
        .spotlight
        .is_some_and(|spotlight| spotlight.includes(cluster))
    {
        Emphasis::Highlighted
    } else {
        Emphasis::Normal
    }
}

fn hull_label(dataset: &Dataset, cluster: i64) -> String {
    dataset
        .topic(cluster)
        .map(|topic| topic.display_name())
        .unwrap_or_else(|| format!("Cluster {cluster}"))
}

fn positions_of(states: &[NodeState]) -> Vec<Vec2> {
    states.iter().map(|state| state.pos).collect()
}

fn position_at(states: &[NodeState], index: usize) -> Vec2 {
    states.get(index).map_or(Vec2::ZERO, |state| state.pos)
}

/// Builds the full scene. Pure: the same inputs always give the same scene.
pub fn build_scene(input: &SceneInput<'_>) -> Scene {
    let visible = |index: usize| input.displayable.get(index).copied().unwrap_or(false);
    let opacity = input.edge_opacity.clamp(0.0, 1.0);

    let mut scene = Scene {
        hull_style: input.hull_style,
        ..Scene::default()
    };

    for (index, node) in input.dataset.nodes.iter().enumerate() {
        if !visible(index) {
            continue;
        }
        let state = input.states.get(index).copied().unwrap_or_default();
        scene.node_slots.insert(index, scene.nodes.len());
        scene.nodes.push(NodeDraw {
            index,
            pos: state.pos,
            radius: input.radii.get(index).copied().unwrap_or(0.0),
            cluster: node.cluster,
            external: node.external,
            fixed: state.fixed,
            selected: input.selected == Some(index),
            emphasis: node_emphasis(input, index),
        });
    }

    for edge in input.edges {
        if !visible(edge.source) || !visible(edge.target) {
            continue;
        }
        let slot = scene.edges.len();
        scene.incident.entry(edge.source).or_default().push(slot);
        if edge.target != edge.source {
            scene.incident.entry(edge.target).or_default().push(slot);
        }
        scene.edges.push(EdgeDraw {
            source: edge.source,
            target: edge.target,
            from: position_at(input.states, edge.source),
            to: position_at(input.states, edge.target),
            width: stroke_weight(edge.weight),
            opacity,
            emphasis: edge_emphasis(input, edge),
        });
    }

    if input.hull_style != HullStyle::None {
        let positions = positions_of(input.states);
        for (cluster, members) in cluster_members(input.dataset, input.displayable) {
            let Some(shape) = hull_for_members(&positions, input.radii, &members, input.hull_style)
            else {
                continue;
            };
            scene.hull_slots.insert(cluster, scene.hulls.len());
            scene.hulls.push(HullDraw {
                cluster,
                label: hull_label(input.dataset, cluster),
                members,
                shape,
                emphasis: hull_emphasis(input.highlight, cluster),
            });
        }
    }

    scene
}

impl Scene {
    pub fn node(&self, index: usize) -> Option<&NodeDraw> {
        self.node_slots.get(&index).map(|&slot| &self.nodes[slot])
    }

    /// Topmost hull (last painted) containing a world point.
    pub fn hull_at(&self, point: Vec2) -> Option<i64> {
        self.hulls
            .iter()
            .rev()
            .find(|hull| hull.shape.contains(point))
            .map(|hull| hull.cluster)
    }

    /// Re-reads every position after a simulation tick; emphasis and
    /// membership stay as built.
    pub fn refresh_geometry(&mut self, states: &[NodeState], radii: &[f32]) {
        for draw in &mut self.nodes {
            if let Some(state) = states.get(draw.index) {
                draw.pos = state.pos;
                draw.fixed = state.fixed;
            }
        }
        for draw in &mut self.edges {
            draw.from = position_at(states, draw.source);
            draw.to = position_at(states, draw.target);
        }
        if self.hulls.is_empty() {
            return;
        }
        let positions = positions_of(states);
        for hull in &mut self.hulls {
            if let Some(shape) = hull_for_members(&positions, radii, &hull.members, self.hull_style) {
                hull.shape = shape;
            }
        }
    }

    /// Updates only the draw commands touched by moving `index`: the node,
    /// its incident edges and its cluster hull.
    pub fn patch_node(&mut self, index: usize, states: &[NodeState], radii: &[f32]) -> ScenePatch {
        let Some(&slot) = self.node_slots.get(&index) else {
            return ScenePatch::default();
        };
        let Some(state) = states.get(index) else {
            return ScenePatch::default();
        };

        let node = &mut self.nodes[slot];
        node.pos = state.pos;
        node.fixed = state.fixed;
        let cluster = node.cluster;
        let external = node.external;

        let edges = self.incident.get(&index).cloned().unwrap_or_default();
        for &edge_slot in &edges {
            let draw = &mut self.edges[edge_slot];
            draw.from = position_at(states, draw.source);
            draw.to = position_at(states, draw.target);
        }

        let hull = if external {
            None
        } else {
            self.hull_slots.get(&cluster).copied()
        };
        if let Some(hull_slot) = hull {
            let positions = positions_of(states);
            let draw = &mut self.hulls[hull_slot];
            if let Some(shape) = hull_for_members(&positions, radii, &draw.members, self.hull_style) {
                draw.shape = shape;
            }
        }

        ScenePatch {
            node: Some(slot),
            edges,
            hull,
        }
    }
}
