use eframe::egui::{self, RichText, Ui};

use citegraph::engine::interaction::Spotlight;

use super::super::GraphView;
use super::super::render_utils::cluster_color;

impl GraphView {
    const GAP_PAGE_ROWS: usize = 8;

    fn cluster_name(&self, cluster: i64) -> String {
        self.controller
            .dataset()
            .topic(cluster)
            .map(|topic| topic.display_name())
            .unwrap_or_else(|| format!("Cluster {cluster}"))
    }

    fn draw_selection(&mut self, ui: &mut Ui) {
        ui.heading("Selection");
        ui.add_space(6.0);

        let Some((index, node)) = self.controller.selected_node() else {
            ui.label("Click a node to see its details.");
            return;
        };

        ui.label(RichText::new(node.title.as_str()).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);

        if node.external {
            ui.label("External reference");
        } else {
            ui.label(format!("Cluster: {}", self.cluster_name(node.cluster)));
        }
        if let Some(year) = node.year {
            ui.label(format!("Year: {year}"));
        }
        match &node.doi {
            Some(doi) => {
                ui.hyperlink_to(format!("DOI: {doi}"), format!("https://doi.org/{doi}"));
            }
            None if node.has_doi => {
                ui.label("Has DOI");
            }
            None => {}
        }
        ui.label(format!("Degree: {}", node.degree));
        if let Some(pagerank) = node.pagerank {
            ui.label(format!("PageRank: {pagerank:.4}"));
        }
        if !node.terms.is_empty() {
            ui.label(format!("Terms: {}", node.terms.join(", ")));
        }

        let pinned = self
            .controller
            .layout()
            .state(index)
            .is_some_and(|state| state.fixed);
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.label(if pinned { "Pinned" } else { "Free" });
            if ui.button("Clear selection").clicked() {
                self.controller.select(None);
            }
        });
    }

    fn draw_topics(&mut self, ui: &mut Ui) {
        let spotlight = self.controller.interaction().spotlight();
        let mut toggled = None;

        for (cluster, size) in self.controller.cluster_sizes() {
            let active = spotlight.is_some_and(|spotlight| spotlight == Spotlight::Cluster(cluster));
            ui.horizontal(|ui| {
                ui.colored_label(cluster_color(cluster), "●");
                let label = format!("{}  ({size})", self.cluster_name(cluster));
                if ui.selectable_label(active, label).clicked() {
                    toggled = Some(cluster);
                }
            });
        }

        if let Some(cluster) = toggled {
            self.controller.toggle_cluster_spotlight(cluster);
        }
    }

    fn draw_gaps(&mut self, ui: &mut Ui) {
        let gaps = self.controller.gaps(self.gap_rows);
        if gaps.is_empty() {
            ui.label("No cluster pairs large enough to compare.");
            return;
        }

        let spotlight = self.controller.interaction().spotlight();
        let mut picked = None;
        for gap in &gaps {
            let active = spotlight == Some(Spotlight::Gap(gap.a, gap.b));
            let label = format!(
                "{} / {}  ({} links, score {:.1})",
                self.cluster_name(gap.a),
                self.cluster_name(gap.b),
                gap.between,
                gap.score
            );
            if ui.selectable_label(active, label).clicked() {
                picked = Some(if active {
                    None
                } else {
                    Some(Spotlight::Gap(gap.a, gap.b))
                });
            }
        }
        if gaps.len() == self.gap_rows && ui.button("Show more").clicked() {
            self.gap_rows += Self::GAP_PAGE_ROWS;
        }

        if let Some(spotlight) = picked {
            self.controller.set_spotlight(spotlight);
        }
    }

    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        self.draw_selection(ui);
        ui.separator();

        egui::CollapsingHeader::new("Topics")
            .default_open(true)
            .show(ui, |ui| self.draw_topics(ui));
        ui.add_space(8.0);
        egui::CollapsingHeader::new("Gaps between clusters")
            .default_open(false)
            .show(ui, |ui| self.draw_gaps(ui));
    }
}
