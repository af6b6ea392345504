use eframe::egui::{self, Ui};

use citegraph::engine::hull::HullStyle;
use citegraph::engine::interaction::SearchMode;
use citegraph::engine::sizing::SizeMetric;
use citegraph::view::{EdgeModeChoice, MAX_MIN_WEIGHT, SeedStrategy, ViewConfig};

use super::super::GraphView;

fn physics_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: std::ops::RangeInclusive<f32>,
    text: &str,
    hover: &str,
) {
    ui.add(
        egui::Slider::new(value, range)
            .text(text)
            .clamping(egui::SliderClamping::Always),
    )
    .on_hover_text(hover);
}

impl GraphView {
    fn draw_edge_mode_picker(&self, ui: &mut Ui, config: &mut ViewConfig) {
        let available = self.controller.dataset().available_edge_keys();
        egui::ComboBox::from_label("Relation")
            .selected_text(config.edge_mode.to_string())
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut config.edge_mode, EdgeModeChoice::Auto, "Auto")
                    .on_hover_text("Pick the relation that leaves the fewest disconnected pieces.");
                for mode in available {
                    let label = mode.label().to_owned();
                    ui.selectable_value(&mut config.edge_mode, EdgeModeChoice::Fixed(mode), label);
                }
            });
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("View");
        ui.add_space(4.0);

        let search_response = ui.add(
            egui::TextEdit::singleline(&mut self.search)
                .hint_text("Search titles and terms")
                .desired_width(f32::INFINITY),
        );
        if search_response.changed() {
            self.controller.set_search(&self.search);
        }

        let mut config = self.controller.config().clone();

        ui.horizontal(|ui| {
            ui.selectable_value(&mut config.search_mode, SearchMode::Substring, "Substring")
                .on_hover_text("Case-insensitive substring over title and terms.");
            ui.selectable_value(&mut config.search_mode, SearchMode::Fuzzy, "Fuzzy")
                .on_hover_text("Skim-style fuzzy matching.");
        });
        ui.separator();

        self.draw_edge_mode_picker(ui, &mut config);

        ui.label("Cluster hulls");
        ui.horizontal(|ui| {
            for style in HullStyle::ALL {
                ui.selectable_value(&mut config.hull_style, style, style.label());
            }
        });

        ui.add(
            egui::Slider::new(&mut config.min_weight, 1.0..=MAX_MIN_WEIGHT)
                .step_by(1.0)
                .text("Min edge weight"),
        )
        .on_hover_text("Hide edges lighter than this.");
        ui.add(egui::Slider::new(&mut config.edge_opacity, 0.05..=1.0).text("Edge opacity"));

        ui.checkbox(&mut config.include_external, "Include external references")
            .on_hover_text("Show works cited by the library but not captured in it.");
        ui.checkbox(&mut config.only_doi, "Only works with a DOI");
        ui.checkbox(&mut config.hide_isolated, "Hide isolated nodes");
        ui.separator();

        ui.label("Size by");
        ui.horizontal(|ui| {
            for metric in SizeMetric::ALL {
                ui.selectable_value(&mut config.size_metric, metric, metric.label());
            }
        });
        ui.add(egui::Slider::new(&mut config.size_scale, 0.25..=4.0).text("Size scale"));
        ui.separator();

        ui.collapsing("Physics tuning", |ui| {
            let physics = &mut config.physics;
            physics_slider(
                ui,
                &mut physics.repulsion,
                0.0..=20_000.0,
                "Repulsion",
                "How strongly linked nodes push away from each other.",
            );
            physics_slider(
                ui,
                &mut physics.spring,
                0.0..=0.5,
                "Edge spring",
                "How strongly edges pull their endpoints to the rest length.",
            );
            physics_slider(
                ui,
                &mut physics.rest_length,
                10.0..=400.0,
                "Rest length",
                "Preferred edge length.",
            );
            physics_slider(
                ui,
                &mut physics.gravity,
                0.0..=0.2,
                "Cluster gravity",
                "Pull toward the centroid of each node's cluster.",
            );
            physics_slider(
                ui,
                &mut physics.damping,
                0.1..=0.99,
                "Velocity damping",
                "Fraction of velocity kept each tick.",
            );
            physics_slider(
                ui,
                &mut physics.max_speed,
                1.0..=200.0,
                "Max speed",
                "Per-tick velocity cap.",
            );
        });

        ui.horizontal(|ui| {
            ui.label("Seed");
            for strategy in SeedStrategy::ALL {
                ui.selectable_value(&mut config.seed_strategy, strategy, strategy.label());
            }
        });

        if &config != self.controller.config() {
            self.controller.update_config(config);
        }

        ui.separator();
        ui.heading("Layout");
        ui.horizontal_wrapped(|ui| {
            if ui.button("Reset to rings").clicked() {
                self.controller.reset_layout_rings();
            }
            if ui
                .button("Reseed")
                .on_hover_text("Seed again with the selected strategy.")
                .clicked()
            {
                self.controller.reseed();
            }
            if ui.button("Run force").clicked() {
                self.controller.kick_simulation();
            }
            if ui.button("Save layout").clicked() {
                self.controller.save_layout();
            }
            if ui.button("Reset pan/zoom").clicked() {
                self.controller.reset_view();
            }
            if ui.button("Unfix all").clicked() {
                self.controller.unfix_all();
            }
        });
    }
}
