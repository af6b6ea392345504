use eframe::egui::{self, Align, Context, Layout};

use citegraph::dataset::DataSource;
use citegraph::engine::layout::SimPhase;
use citegraph::view::ViewController;

use super::super::GraphView;

impl GraphView {
    pub(in crate::app) const INITIAL_GAP_ROWS: usize = 8;

    pub(in crate::app) fn new(controller: ViewController) -> Self {
        Self {
            controller,
            search: String::new(),
            pointer_captured: None,
            gap_rows: Self::INITIAL_GAP_ROWS,
        }
    }

    fn status_text(&self) -> String {
        let view = self.controller.view();
        let phase = match self.controller.layout().phase() {
            SimPhase::Seeding => "seeding",
            SimPhase::Simulating => "simulating",
            SimPhase::Settled => "settled",
        };
        format!(
            "{} shown / {} edges / {} pinned / {phase}",
            view.displayable_count(),
            view.edges.len(),
            self.controller.layout().fixed_count(),
        )
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source: &DataSource,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("citegraph");
                    ui.separator();
                    ui.label(format!("source: {}", source.describe()));
                    ui.label(format!("nodes: {}", self.controller.dataset().node_count()));
                    if let Some(mode) = self.controller.current_mode() {
                        ui.label(format!("relation: {}", mode.label()));
                    }
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload dataset"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.status_text());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("controls_scroll")
                    .show(ui, |ui| self.draw_controls(ui));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("details_scroll")
                    .show(ui, |ui| self.draw_details(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading dataset...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }
}
