use std::collections::HashSet;

use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

use super::layout::{LayoutEngine, NodeState};

pub const MIN_ZOOM: f32 = 0.05;
pub const MAX_ZOOM: f32 = 6.0;
/// Pointer travel (screen px) below which a press counts as a click.
const CLICK_SLOP: f32 = 3.0;
const HIT_SLOP: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn world_to_screen(self, viewport: Rect, world: Vec2) -> Pos2 {
        viewport.center() + self.pan + world * self.zoom
    }

    pub fn screen_to_world(self, viewport: Rect, screen: Pos2) -> Vec2 {
        (screen - viewport.center() - self.pan) / self.zoom
    }

    /// On-screen radius of a node with world radius `radius`. Nodes grow
    /// slower than the zoom so they stay readable at both ends.
    pub fn screen_radius(self, radius: f32) -> f32 {
        (radius * self.zoom.powf(0.4)).clamp(2.0, 40.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerMode {
    Idle,
    Panning { last: Pos2 },
    Dragging { node: usize, grab_offset: Vec2 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Substring,
    Fuzzy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Spotlight {
    Cluster(i64),
    /// Two clusters lit together, as picked from the gap list.
    Gap(i64, i64),
}

impl Spotlight {
    pub fn includes(self, cluster: i64) -> bool {
        match self {
            Self::Cluster(only) => only == cluster,
            Self::Gap(a, b) => a == cluster || b == cluster,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerOutcome {
    None,
    Panned,
    DragStarted(usize),
    DragMoved(usize),
    /// `clicked` is set when the pointer barely moved between press and release.
    DragEnded { node: usize, clicked: bool },
    BackgroundClick(Vec2),
}

pub struct InteractionController {
    transform: ViewTransform,
    mode: PointerMode,
    viewport: Rect,
    press_origin: Option<Pos2>,
    hovered: Option<usize>,
    selected: Option<usize>,
    search_query: String,
    search_mode: SearchMode,
    search_matches: HashSet<usize>,
    spotlight: Option<Spotlight>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self {
            transform: ViewTransform::default(),
            mode: PointerMode::Idle,
            viewport: Rect::from_min_size(pos2(0.0, 0.0), vec2(1280.0, 800.0)),
            press_origin: None,
            hovered: None,
            selected: None,
            search_query: String::new(),
            search_mode: SearchMode::Substring,
            search_matches: HashSet::new(),
            spotlight: None,
        }
    }
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

impl InteractionController {
    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn mode(&self) -> PointerMode {
        self.mode
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn spotlight(&self) -> Option<Spotlight> {
        self.spotlight
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn search_mode(&self) -> SearchMode {
        self.search_mode
    }

    pub fn search_matches(&self) -> &HashSet<usize> {
        &self.search_matches
    }

    pub fn search_active(&self) -> bool {
        !self.search_query.trim().is_empty()
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Vec2 {
        self.transform.screen_to_world(self.viewport, screen)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Pos2 {
        self.transform.world_to_screen(self.viewport, world)
    }

    /// Returns whether the hover target changed.
    pub fn set_hover(&mut self, hovered: Option<usize>) -> bool {
        if self.hovered == hovered {
            return false;
        }
        self.hovered = hovered;
        true
    }

    pub fn select(&mut self, selected: Option<usize>) {
        self.selected = selected;
    }

    pub fn set_spotlight(&mut self, spotlight: Option<Spotlight>) {
        self.spotlight = spotlight;
    }

    /// Recomputes the match set over title and terms.
    pub fn set_search(&mut self, query: &str, mode: SearchMode, dataset: &Dataset) {
        self.search_query = query.to_owned();
        self.search_mode = mode;
        self.search_matches.clear();

        let query = query.trim();
        if query.is_empty() {
            return;
        }

        match mode {
            SearchMode::Substring => {
                let lowered = query.to_lowercase();
                self.search_matches.extend(
                    dataset
                        .nodes
                        .iter()
                        .enumerate()
                        .filter(|(_, node)| node.contains_lowercase(&lowered))
                        .map(|(index, _)| index),
                );
            }
            SearchMode::Fuzzy => {
                let matcher = SkimMatcherV2::default();
                self.search_matches.extend(
                    dataset
                        .nodes
                        .iter()
                        .enumerate()
                        .filter(|(_, node)| {
                            fuzzy_match_score(&matcher, &node.search_text(), query).is_some()
                        })
                        .map(|(index, _)| index),
                );
            }
        }
    }

    /// Topmost displayable node under the cursor.
    pub fn pick_node(
        &self,
        screen: Pos2,
        states: &[NodeState],
        radii: &[f32],
        displayable: &[bool],
    ) -> Option<usize> {
        states
            .iter()
            .enumerate()
            .filter(|(index, _)| displayable.get(*index).copied().unwrap_or(false))
            .filter_map(|(index, state)| {
                let distance = (self.world_to_screen(state.pos) - screen).length();
                let radius = radii.get(index).copied().unwrap_or(0.0);
                let reach = self.transform.screen_radius(radius) + HIT_SLOP;
                (distance <= reach).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    /// Zooms by `scroll` wheel units keeping the world point under `cursor`
    /// fixed on screen.
    pub fn scroll(&mut self, cursor: Pos2, scroll: f32) {
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let world_before = self.screen_to_world(cursor);
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.transform.zoom = (self.transform.zoom * zoom_factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.transform.pan = cursor - self.viewport.center() - (world_before * self.transform.zoom);
    }

    pub fn reset_transform(&mut self) {
        self.transform = ViewTransform::default();
    }

    pub fn pointer_down(
        &mut self,
        screen: Pos2,
        hit: Option<usize>,
        layout: &mut LayoutEngine,
    ) -> PointerOutcome {
        self.press_origin = Some(screen);
        match hit {
            Some(node) => {
                let Some(state) = layout.state(node) else {
                    self.mode = PointerMode::Panning { last: screen };
                    return PointerOutcome::None;
                };
                let grab_offset = state.pos - self.screen_to_world(screen);
                layout.begin_drag(node);
                self.mode = PointerMode::Dragging { node, grab_offset };
                PointerOutcome::DragStarted(node)
            }
            None => {
                self.mode = PointerMode::Panning { last: screen };
                PointerOutcome::None
            }
        }
    }

    pub fn pointer_move(&mut self, screen: Pos2, layout: &mut LayoutEngine) -> PointerOutcome {
        match self.mode {
            PointerMode::Idle => PointerOutcome::None,
            PointerMode::Panning { last } => {
                self.transform.pan += screen - last;
                self.mode = PointerMode::Panning { last: screen };
                PointerOutcome::Panned
            }
            PointerMode::Dragging { node, grab_offset } => {
                let world = self.screen_to_world(screen) + grab_offset;
                layout.drag_to(node, world);
                PointerOutcome::DragMoved(node)
            }
        }
    }

    pub fn pointer_up(&mut self, screen: Pos2, layout: &mut LayoutEngine) -> PointerOutcome {
        let clicked = self
            .press_origin
            .take()
            .is_some_and(|origin| origin.distance(screen) <= CLICK_SLOP);

        let outcome = match self.mode {
            PointerMode::Dragging { node, .. } => {
                layout.end_drag();
                PointerOutcome::DragEnded { node, clicked }
            }
            PointerMode::Panning { .. } if clicked => {
                PointerOutcome::BackgroundClick(self.screen_to_world(screen))
            }
            _ => PointerOutcome::None,
        };
        self.mode = PointerMode::Idle;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn viewport() -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0))
    }

    fn controller() -> InteractionController {
        let mut controller = InteractionController::default();
        controller.set_viewport(viewport());
        controller
    }

    #[test]
    fn screen_and_world_round_trip() {
        let transform = ViewTransform {
            pan: vec2(30.0, -12.0),
            zoom: 2.5,
        };
        let world = vec2(17.0, -44.0);
        let screen = transform.world_to_screen(viewport(), world);
        let back = transform.screen_to_world(viewport(), screen);
        assert!((back - world).length() < 1e-4);
    }

    #[test]
    fn wheel_zoom_keeps_cursor_anchored() {
        let mut controller = controller();
        let cursor = pos2(600.0, 150.0);
        let before = controller.screen_to_world(cursor);
        controller.scroll(cursor, 80.0);
        assert!(controller.transform().zoom > 1.0);
        let after = controller.screen_to_world(cursor);
        assert!((after - before).length() < 1e-3);

        controller.reset_transform();
        assert_eq!(controller.transform(), ViewTransform::default());
    }

    #[test]
    fn zoom_is_clamped() {
        let mut controller = controller();
        for _ in 0..500 {
            controller.scroll(pos2(400.0, 300.0), -500.0);
        }
        assert_eq!(controller.transform().zoom, MIN_ZOOM);
    }

    #[test]
    fn background_drag_pans() {
        let dataset = Dataset::load(&json!({ "nodes": [{ "id": "a" }] }));
        let mut layout = LayoutEngine::new(dataset.node_count());
        let mut controller = controller();

        controller.pointer_down(pos2(100.0, 100.0), None, &mut layout);
        assert!(matches!(controller.mode(), PointerMode::Panning { .. }));
        assert_eq!(
            controller.pointer_move(pos2(140.0, 90.0), &mut layout),
            PointerOutcome::Panned
        );
        assert_eq!(controller.transform().pan, vec2(40.0, -10.0));
        assert_eq!(
            controller.pointer_up(pos2(140.0, 90.0), &mut layout),
            PointerOutcome::None
        );
        assert_eq!(controller.mode(), PointerMode::Idle);
    }

    #[test]
    fn dragging_pins_and_moves_the_node() {
        let dataset = Dataset::load(&json!({ "nodes": [{ "id": "a" }, { "id": "b" }] }));
        let mut layout = LayoutEngine::new(dataset.node_count());
        layout.seed_rings(&dataset);
        let mut controller = controller();

        let start = controller.world_to_screen(layout.states()[0].pos);
        let hit = controller.pick_node(start, layout.states(), &[7.0, 7.0], &[true, true]);
        assert_eq!(hit, Some(0));

        controller.pointer_down(start, hit, &mut layout);
        assert!(layout.states()[0].fixed);
        assert_eq!(layout.dragging(), Some(0));

        let target = controller.world_to_screen(vec2(100.0, 200.0));
        controller.pointer_move(target, &mut layout);
        let pos = layout.states()[0].pos;
        assert!((pos - vec2(100.0, 200.0)).length() < 1e-3);

        let outcome = controller.pointer_up(target, &mut layout);
        assert_eq!(
            outcome,
            PointerOutcome::DragEnded {
                node: 0,
                clicked: false
            }
        );
        assert!(layout.states()[0].fixed);
        assert_eq!(layout.dragging(), None);
    }

    #[test]
    fn picking_matches_painted_radius() {
        let states = [NodeState::default()];
        let mut controller = controller();
        let center = controller.world_to_screen(Vec2::ZERO);

        controller.transform.zoom = 6.0;
        let painted = controller.transform.screen_radius(18.0);
        assert!((painted - 18.0 * 6.0f32.powf(0.4)).abs() < 1e-3);
        let inside = center + vec2(painted + 2.0, 0.0);
        let outside = center + vec2(painted + 5.0, 0.0);
        assert_eq!(controller.pick_node(inside, &states, &[18.0], &[true]), Some(0));
        assert_eq!(controller.pick_node(outside, &states, &[18.0], &[true]), None);
        assert_eq!(
            controller.pick_node(center + vec2(100.0, 0.0), &states, &[18.0], &[true]),
            None
        );

        controller.transform.zoom = 0.1;
        let painted = controller.transform.screen_radius(18.0);
        assert!(painted >= 2.0);
        assert_eq!(
            controller.pick_node(center + vec2(painted + 2.0, 0.0), &states, &[18.0], &[true]),
            Some(0)
        );
        assert_eq!(
            controller.pick_node(center + vec2(painted + 5.0, 0.0), &states, &[18.0], &[true]),
            None
        );
    }

    #[test]
    fn hidden_nodes_are_not_pickable() {
        let dataset = Dataset::load(&json!({ "nodes": [{ "id": "a" }] }));
        let mut layout = LayoutEngine::new(dataset.node_count());
        layout.seed_rings(&dataset);
        let controller = controller();
        let screen = controller.world_to_screen(Vec2::ZERO);
        assert_eq!(controller.pick_node(screen, layout.states(), &[7.0], &[false]), None);
    }

    #[test]
    fn substring_and_fuzzy_search() {
        let dataset = Dataset::load(&json!({
            "nodes": [
                { "id": "a", "title": "Force-Directed Layouts", "terms": ["graphs"] },
                { "id": "b", "title": "Convex hulls", "terms": ["Geometry"] }
            ]
        }));
        let mut controller = controller();
        controller.set_search("geometry", SearchMode::Substring, &dataset);
        assert_eq!(controller.search_matches(), &HashSet::from([1]));

        controller.set_search("fdl", SearchMode::Substring, &dataset);
        assert!(controller.search_matches().is_empty());
        controller.set_search("fdl", SearchMode::Fuzzy, &dataset);
        assert!(controller.search_matches().contains(&0));

        controller.set_search("   ", SearchMode::Substring, &dataset);
        assert!(!controller.search_active());
    }
}
