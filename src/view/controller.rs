use eframe::egui::{Pos2, Rect};
use tracing::{debug, info, warn};

use crate::dataset::{Dataset, EdgeMode, Node};
use crate::engine::gaps::{ClusterGap, cluster_gaps};
use crate::engine::highlight::{HighlightState, build_highlight_state};
use crate::engine::hull::cluster_members;
use crate::engine::interaction::{InteractionController, PointerOutcome, Spotlight};
use crate::engine::layout::{FrameScheduler, LayoutEngine, SavedPosition, TickInput};
use crate::engine::scene::{Scene, SceneInput, ScenePatch, build_scene};

use super::config::{CONFIG_KEY, SeedStrategy, ViewConfig};
use super::state::ViewState;
use super::store::Store;

/// Minimum alpha after a config change.
const NUDGE_ALPHA: f32 = 0.5;

/// Owns the config, the filtered view, the simulation and the scene, and
/// keeps them consistent with each other.
pub struct ViewController {
    dataset: Dataset,
    config: ViewConfig,
    view: ViewState,
    layout: LayoutEngine,
    interaction: InteractionController,
    highlight: HighlightState,
    scene: Scene,
    store: Box<dyn Store>,
    layout_key: String,
}

fn load_config(store: &dyn Store) -> ViewConfig {
    let Some(raw) = store.get(CONFIG_KEY) else {
        return ViewConfig::default();
    };
    match serde_json::from_str::<ViewConfig>(&raw) {
        Ok(config) => config.clamped(),
        Err(error) => {
            warn!(%error, "stored view config is unreadable, using defaults");
            ViewConfig::default()
        }
    }
}

fn load_layout(store: &dyn Store, key: &str) -> Option<Vec<SavedPosition>> {
    let raw = store.get(key)?;
    match serde_json::from_str::<Vec<SavedPosition>>(&raw) {
        Ok(saved) => Some(saved),
        Err(error) => {
            warn!(%error, key, "stored layout is unreadable, seeding rings");
            None
        }
    }
}

impl ViewController {
    pub fn new(dataset: Dataset, store: Box<dyn Store>) -> Self {
        let config = load_config(store.as_ref());
        let layout_key = dataset.layout_key();
        let view = ViewState::compute(&dataset, &config, None, 1);
        let layout = LayoutEngine::new(dataset.node_count());

        let mut controller = Self {
            dataset,
            config,
            view,
            layout,
            interaction: InteractionController::default(),
            highlight: HighlightState::default(),
            scene: Scene::default(),
            store,
            layout_key,
        };

        let restored = match load_layout(controller.store.as_ref(), &controller.layout_key) {
            Some(saved) => controller.layout.seed_restored(&controller.dataset, &saved),
            None => 0,
        };
        if restored == 0 {
            controller.seed(controller.config.seed_strategy);
        }
        controller.layout.kick();
        controller.rebuild_scene();

        info!(
            nodes = controller.dataset.node_count(),
            mode = controller.view.mode.as_ref().map(EdgeMode::key).unwrap_or("none"),
            restored,
            "graph view ready"
        );
        controller
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn current_mode(&self) -> Option<&EdgeMode> {
        self.view.mode.as_ref()
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn highlight(&self) -> &HighlightState {
        &self.highlight
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn layout_key(&self) -> &str {
        &self.layout_key
    }

    pub fn selected_node(&self) -> Option<(usize, &Node)> {
        let index = self.interaction.selected()?;
        self.dataset.nodes.get(index).map(|node| (index, node))
    }

    fn seed(&mut self, strategy: SeedStrategy) {
        match strategy {
            SeedStrategy::Rings => self.layout.seed_rings(&self.dataset),
            SeedStrategy::Random => self.layout.seed_random(&self.dataset, &mut rand::rng()),
        }
    }

    fn rebuild_highlight(&mut self) {
        self.highlight = build_highlight_state(&self.dataset, &self.view.edges, &self.interaction);
    }

    fn rebuild_scene(&mut self) {
        self.rebuild_highlight();
        self.scene = build_scene(&SceneInput {
            dataset: &self.dataset,
            edges: &self.view.edges,
            displayable: &self.view.displayable,
            radii: &self.view.radii,
            states: self.layout.states(),
            highlight: &self.highlight,
            hull_style: self.config.hull_style,
            edge_opacity: self.config.edge_opacity,
            selected: self.interaction.selected(),
        });
    }

    /// Refilters the view. `reselect` drops the resolved relation so an
    /// `Auto` config scores the candidates again.
    fn recompute_view(&mut self, reselect: bool) {
        let current = if reselect { None } else { self.view.mode.clone() };
        self.view = ViewState::compute(
            &self.dataset,
            &self.config,
            current.as_ref(),
            self.view.revision + 1,
        );

        if self
            .interaction
            .hovered()
            .is_some_and(|index| !self.view.is_displayable(index))
        {
            self.interaction.set_hover(None);
        }
        if self
            .interaction
            .selected()
            .is_some_and(|index| !self.view.is_displayable(index))
        {
            self.interaction.select(None);
        }
    }

    fn persist_config(&mut self) {
        let raw = match serde_json::to_string(&self.config) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%error, "failed to serialize view config");
                return;
            }
        };
        if let Err(error) = self.store.set(CONFIG_KEY, raw) {
            warn!(%error, "failed to persist view config");
        }
    }

    /// Applies a new config: recomputes filtered views when needed, rebuilds
    /// the scene, persists the config and nudges the simulation.
    pub fn update_config(&mut self, config: ViewConfig) {
        let config = config.clamped();
        if config == self.config {
            return;
        }

        let previous = std::mem::replace(&mut self.config, config);
        let sizing_changed = self.config.size_metric != previous.size_metric
            || self.config.size_scale != previous.size_scale;

        if self.config.topology_changed(&previous) || sizing_changed {
            self.recompute_view(self.config.edge_mode != previous.edge_mode);
        }
        if self.config.search_mode != previous.search_mode {
            let query = self.interaction.search_query().to_owned();
            self.interaction
                .set_search(&query, self.config.search_mode, &self.dataset);
        }

        self.persist_config();
        self.rebuild_scene();
        self.layout.reheat(NUDGE_ALPHA);
        debug!(revision = self.view.revision, "view config updated");
    }

    pub fn reset_layout_rings(&mut self) {
        self.layout.seed_rings(&self.dataset);
        self.layout.kick();
        self.scene.refresh_geometry(self.layout.states(), &self.view.radii);
    }

    /// Re-seeds with the configured strategy and restarts the simulation.
    pub fn reseed(&mut self) {
        self.seed(self.config.seed_strategy);
        self.layout.kick();
        self.scene.refresh_geometry(self.layout.states(), &self.view.radii);
    }

    pub fn kick_simulation(&mut self) {
        self.layout.kick();
    }

    /// Writes every node position under the dataset's layout key. Returns
    /// whether the write succeeded.
    pub fn save_layout(&mut self) -> bool {
        let snapshot = self.layout.snapshot(&self.dataset);
        let raw = match serde_json::to_string(&snapshot) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%error, "failed to serialize layout");
                return false;
            }
        };
        match self.store.set(&self.layout_key, raw) {
            Ok(()) => {
                info!(key = %self.layout_key, nodes = snapshot.len(), "layout saved");
                true
            }
            Err(error) => {
                warn!(%error, "failed to save layout");
                false
            }
        }
    }

    pub fn reset_view(&mut self) {
        self.interaction.reset_transform();
    }

    pub fn unfix_all(&mut self) {
        self.layout.unfix_all();
        self.layout.reheat(NUDGE_ALPHA);
    }

    /// Runs one tick if the simulation is live and asks for the next frame
    /// while it keeps running. Returns whether a tick ran.
    pub fn on_frame(&mut self, scheduler: &mut dyn FrameScheduler) -> bool {
        if !self.layout.is_running() {
            return false;
        }

        let still_running = self.layout.tick(
            &TickInput {
                dataset: &self.dataset,
                edges: &self.view.edges,
                displayable: &self.view.displayable,
                active: &self.view.active,
            },
            self.config.physics,
        );
        self.scene
            .refresh_geometry(self.layout.states(), &self.view.radii);

        if still_running {
            scheduler.request_frame();
        }
        true
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.interaction.set_viewport(viewport);
    }

    fn pick(&self, screen: Pos2) -> Option<usize> {
        self.interaction.pick_node(
            screen,
            self.layout.states(),
            &self.view.radii,
            &self.view.displayable,
        )
    }

    pub fn pointer_down(&mut self, screen: Pos2) {
        let hit = self.pick(screen);
        self.interaction.pointer_down(screen, hit, &mut self.layout);
    }

    /// Returns the scene patch when the move dragged a node.
    pub fn pointer_move(&mut self, screen: Pos2) -> Option<ScenePatch> {
        match self.interaction.pointer_move(screen, &mut self.layout) {
            PointerOutcome::DragMoved(node) => {
                Some(
                    self.scene
                        .patch_node(node, self.layout.states(), &self.view.radii),
                )
            }
            PointerOutcome::None => {
                let hit = self.pick(screen);
                if self.interaction.set_hover(hit) {
                    self.rebuild_scene();
                }
                None
            }
            _ => None,
        }
    }

    pub fn pointer_up(&mut self, screen: Pos2) {
        match self.interaction.pointer_up(screen, &mut self.layout) {
            PointerOutcome::DragEnded { node, clicked } => {
                if clicked {
                    self.interaction.select(Some(node));
                }
                self.rebuild_scene();
            }
            PointerOutcome::BackgroundClick(world) => match self.scene.hull_at(world) {
                Some(cluster) => self.toggle_cluster_spotlight(cluster),
                None => {
                    self.interaction.select(None);
                    self.set_spotlight(None);
                }
            },
            _ => {}
        }
    }

    pub fn pointer_left(&mut self) {
        if self.interaction.set_hover(None) {
            self.rebuild_scene();
        }
    }

    pub fn scroll(&mut self, cursor: Pos2, delta: f32) {
        self.interaction.scroll(cursor, delta);
    }

    pub fn set_search(&mut self, query: &str) {
        self.interaction
            .set_search(query, self.config.search_mode, &self.dataset);
        self.rebuild_scene();
    }

    pub fn set_spotlight(&mut self, spotlight: Option<Spotlight>) {
        self.interaction.set_spotlight(spotlight);
        self.rebuild_scene();
    }

    pub fn toggle_cluster_spotlight(&mut self, cluster: i64) {
        let next = match self.interaction.spotlight() {
            Some(Spotlight::Cluster(current)) if current == cluster => None,
            _ => Some(Spotlight::Cluster(cluster)),
        };
        self.set_spotlight(next);
    }

    pub fn select(&mut self, node: Option<usize>) {
        self.interaction.select(node);
        self.rebuild_scene();
    }

    /// Displayable non-external member count per cluster, ascending by id.
    pub fn cluster_sizes(&self) -> Vec<(i64, usize)> {
        cluster_members(&self.dataset, &self.view.displayable)
            .into_iter()
            .map(|(cluster, members)| (cluster, members.len()))
            .collect()
    }

    pub fn gaps(&self, limit: usize) -> Vec<ClusterGap> {
        cluster_gaps(&self.dataset, &self.view.edges, &self.view.displayable, limit)
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::Vec2;
    use serde_json::json;

    use super::*;
    use crate::engine::layout::SimPhase;
    use crate::view::config::EdgeModeChoice;
    use crate::view::store::MemoryStore;

    #[derive(Default)]
    struct CountingScheduler {
        frames: usize,
    }

    impl FrameScheduler for CountingScheduler {
        fn request_frame(&mut self) {
            self.frames += 1;
        }
    }

    fn dataset() -> Dataset {
        Dataset::load(&json!({
            "nodes": [
                { "id": "n0", "cluster": 0 },
                { "id": "n1", "cluster": 0 },
                { "id": "n2", "cluster": 1 },
                { "id": "n3", "cluster": 1 },
                { "id": "n4", "cluster": 1 },
                { "id": "ext", "cluster": 1, "external": true }
            ],
            "edgesets": {
                "citations": [],
                "semantic": [
                    { "source": "n0", "target": "n1" },
                    { "source": "n1", "target": "n2" },
                    { "source": "n2", "target": "n3" },
                    { "source": "n3", "target": "n4" },
                    { "source": "n4", "target": "ext" }
                ]
            },
            "topics": [{ "cluster": 1, "top_terms": ["hulls"], "size": 3 }]
        }))
    }

    fn controller(store: MemoryStore) -> ViewController {
        ViewController::new(dataset(), Box::new(store))
    }

    #[test]
    fn boot_picks_connected_mode_and_starts_simulating() {
        let controller = controller(MemoryStore::new());
        assert_eq!(controller.current_mode(), Some(&EdgeMode::Semantic));
        assert_eq!(controller.layout().phase(), SimPhase::Simulating);
        assert_eq!(controller.scene().nodes.len(), 6);
        assert_eq!(controller.scene().edges.len(), 5);
        assert_eq!(controller.cluster_sizes(), vec![(0, 2), (1, 3)]);
    }

    #[test]
    fn frames_are_requested_until_settled() {
        let mut controller = controller(MemoryStore::new());
        let mut scheduler = CountingScheduler::default();
        let mut ticks = 0;
        while controller.on_frame(&mut scheduler) {
            ticks += 1;
            assert!(ticks < 1_000);
        }
        assert_eq!(controller.layout().phase(), SimPhase::Settled);
        assert_eq!(scheduler.frames, ticks - 1);
        assert!(!controller.on_frame(&mut scheduler));

        controller.kick_simulation();
        assert!(controller.on_frame(&mut scheduler));
        assert_eq!(scheduler.frames, ticks);
    }

    #[test]
    fn saved_layout_restores_exact_positions() {
        let mut first = controller(MemoryStore::new());
        let mut scheduler = CountingScheduler::default();
        for _ in 0..30 {
            first.on_frame(&mut scheduler);
        }
        assert!(first.save_layout());
        let key = first.layout_key().to_owned();
        let raw = first.store().get(&key).unwrap();
        let expected = first.layout().positions();

        let mut store = MemoryStore::new();
        store.set(&key, raw).unwrap();
        let mut second = controller(store);
        second.on_frame(&mut scheduler);
        assert_eq!(second.layout().positions(), expected);
        assert_eq!(second.layout().fixed_count(), 6);
    }

    #[test]
    fn corrupt_persisted_state_falls_back() {
        let key = dataset().layout_key();
        let mut store = MemoryStore::new();
        store.set(CONFIG_KEY, "{ not json".into()).unwrap();
        store.set(&key, "[{\"id\": 3}]".into()).unwrap();

        let controller = controller(store);
        assert_eq!(controller.config(), &ViewConfig::default());
        assert_eq!(controller.layout().fixed_count(), 0);
    }

    #[test]
    fn config_changes_persist_and_refilter() {
        let mut controller = controller(MemoryStore::new());
        let revision = controller.view().revision;
        controller.update_config(ViewConfig {
            include_external: false,
            edge_mode: EdgeModeChoice::Fixed(EdgeMode::Semantic),
            ..controller.config().clone()
        });

        assert!(controller.view().revision > revision);
        assert_eq!(controller.view().edges.len(), 4);
        assert!(!controller.view().is_displayable(5));
        assert_eq!(controller.scene().nodes.len(), 5);

        let stored = controller.store().get(CONFIG_KEY).unwrap();
        let reloaded: ViewConfig = serde_json::from_str(&stored).unwrap();
        assert!(!reloaded.include_external);
        assert_eq!(reloaded.edge_mode, EdgeModeChoice::Fixed(EdgeMode::Semantic));
    }

    #[test]
    fn auto_mode_survives_filter_changes_until_picked_again() {
        let dataset = Dataset::load(&json!({
            "nodes": [
                { "id": "a", "cluster": 0 },
                { "id": "b", "cluster": 0 },
                { "id": "c", "cluster": 0 },
                { "id": "d", "cluster": 0 },
                { "id": "e", "cluster": 0 },
                { "id": "x", "cluster": 0, "external": true }
            ],
            "edgesets": {
                "citations": [
                    { "source": "x", "target": "a" },
                    { "source": "x", "target": "b" },
                    { "source": "x", "target": "c" },
                    { "source": "x", "target": "d" }
                ],
                "semantic": [{ "source": "a", "target": "e" }]
            }
        }));
        let mut store = MemoryStore::new();
        let config = ViewConfig {
            hide_isolated: true,
            ..ViewConfig::default()
        };
        store
            .set(CONFIG_KEY, serde_json::to_string(&config).unwrap())
            .unwrap();

        let mut controller = ViewController::new(dataset, Box::new(store));
        assert_eq!(controller.current_mode(), Some(&EdgeMode::Citations));
        assert!(!controller.view().is_displayable(4));

        controller.update_config(ViewConfig {
            include_external: false,
            ..controller.config().clone()
        });
        assert_eq!(controller.current_mode(), Some(&EdgeMode::Citations));
        assert!(!controller.view().is_displayable(4));

        controller.update_config(ViewConfig {
            edge_mode: EdgeModeChoice::Fixed(EdgeMode::Citations),
            ..controller.config().clone()
        });
        controller.update_config(ViewConfig {
            edge_mode: EdgeModeChoice::Auto,
            ..controller.config().clone()
        });
        assert_eq!(controller.current_mode(), Some(&EdgeMode::Semantic));
        assert!(controller.view().is_displayable(4));
    }

    #[test]
    fn drag_patches_scene_and_click_selects() {
        let mut controller = controller(MemoryStore::new());
        let start = controller
            .interaction()
            .world_to_screen(controller.layout().states()[1].pos);

        controller.pointer_down(start);
        controller.pointer_up(start);
        assert_eq!(controller.selected_node().map(|(index, _)| index), Some(1));
        assert!(controller.layout().states()[1].fixed);

        controller.pointer_down(start);
        let target = controller.interaction().world_to_screen(Vec2::new(100.0, 200.0));
        let patch = controller.pointer_move(target).unwrap();
        assert_eq!(patch.node, Some(1));
        assert_eq!(patch.edges, vec![0, 1]);
        assert_eq!(patch.hull, Some(0));
        controller.pointer_up(target);

        let dragged = controller.layout().states()[1];
        assert!((dragged.pos - Vec2::new(100.0, 200.0)).length() < 1e-3);
        assert!(controller.layout().is_running());
    }

    #[test]
    fn released_drag_lets_the_layout_settle() {
        let mut controller = controller(MemoryStore::new());
        let start = controller
            .interaction()
            .world_to_screen(controller.layout().states()[2].pos);
        controller.pointer_down(start);
        controller.pointer_move(start + Vec2::new(20.0, 0.0));
        controller.pointer_up(start + Vec2::new(20.0, 0.0));

        let mut scheduler = CountingScheduler::default();
        let mut ticks = 0;
        while controller.on_frame(&mut scheduler) {
            ticks += 1;
            assert!(ticks < 1_000);
        }
        assert_eq!(controller.layout().phase(), SimPhase::Settled);
    }

    #[test]
    fn search_and_spotlight_update_highlight() {
        let mut controller = controller(MemoryStore::new());
        controller.set_search("n3");
        assert!(controller.highlight().focus_active);
        assert!(controller.highlight().nodes.contains(&3));

        controller.set_spotlight(Some(Spotlight::Cluster(1)));
        assert!(controller.highlight().cluster_in_focus(1));
        assert!(!controller.highlight().cluster_in_focus(0));

        controller.toggle_cluster_spotlight(1);
        assert_eq!(controller.interaction().spotlight(), None);
    }

    #[test]
    fn gaps_use_rendered_edges() {
        let controller = controller(MemoryStore::new());
        let gaps = controller.gaps(5);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].between, 1);
        assert_eq!(gaps[0].score, 3.0);
    }
}
