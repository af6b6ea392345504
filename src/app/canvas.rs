use eframe::egui::{self, Align2, Color32, Context, FontId, Pos2, Sense, Shape, Stroke, Ui, vec2};

use citegraph::engine::hull::HullShape;
use citegraph::engine::layout::FrameScheduler;
use citegraph::engine::scene::Emphasis;

use super::GraphView;
use super::render_utils::{
    EXTERNAL_COLOR, blend_color, circle_visible, cluster_color, draw_background, edge_visible,
    emphasize, with_opacity,
};

/// Frame source backed by egui's repaint requests.
struct RepaintScheduler<'a> {
    ctx: &'a Context,
}

impl FrameScheduler for RepaintScheduler<'_> {
    fn request_frame(&mut self) {
        self.ctx.request_repaint();
    }
}

/// Where a captured gesture ends once the primary button is up. The release
/// can arrive without a position after the pointer left the window, so the
/// last captured spot stands in.
fn release_position(held: bool, pointer: Option<Pos2>, captured: Option<Pos2>) -> Option<Pos2> {
    if held {
        return None;
    }
    captured.map(|last| pointer.unwrap_or(last))
}

const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const EDGE_COLOR: Color32 = Color32::from_rgb(150, 160, 172);

impl GraphView {
    fn handle_pointer(&mut self, ui: &Ui, response: &egui::Response) {
        let (pointer, pressed, held, scroll) = ui.input(|input| {
            (
                input.pointer.interact_pos(),
                input.pointer.primary_pressed(),
                input.pointer.primary_down(),
                input.raw_scroll_delta.y,
            )
        });

        if response.hovered()
            && let Some(cursor) = pointer
        {
            self.controller.scroll(cursor, scroll);
        }

        if response.double_clicked() {
            self.controller.reset_view();
        }

        match pointer {
            Some(pointer) => {
                if pressed && response.hovered() {
                    self.controller.pointer_down(pointer);
                    self.pointer_captured = Some(pointer);
                }
                if self.pointer_captured.is_some() {
                    self.controller.pointer_move(pointer);
                    self.pointer_captured = Some(pointer);
                } else if response.hovered() {
                    self.controller.pointer_move(pointer);
                } else {
                    self.controller.pointer_left();
                }
            }
            None if self.pointer_captured.is_none() => self.controller.pointer_left(),
            None => {}
        }

        if let Some(at) = release_position(held, pointer, self.pointer_captured) {
            self.pointer_captured = None;
            self.controller.pointer_up(at);
        }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.controller.set_viewport(rect);
        self.handle_pointer(ui, &response);

        let ctx = ui.ctx().clone();
        self.controller
            .on_frame(&mut RepaintScheduler { ctx: &ctx });
        if self.pointer_captured.is_some() {
            ctx.request_repaint();
        }

        let painter = ui.painter_at(rect);
        let transform = self.controller.interaction().transform();
        draw_background(&painter, rect, transform.pan, transform.zoom);

        let scene = self.controller.scene();
        let to_screen = |world| transform.world_to_screen(rect, world);

        for hull in &scene.hulls {
            let base = cluster_color(hull.cluster);
            let fill = with_opacity(emphasize(base, hull.emphasis), 0.12);
            let stroke = Stroke::new(1.2, with_opacity(emphasize(base, hull.emphasis), 0.55));
            let label_anchor = match &hull.shape {
                HullShape::Circle { center, radius } => {
                    let center = to_screen(*center);
                    let radius = radius * transform.zoom;
                    if !circle_visible(rect, center, radius) {
                        continue;
                    }
                    painter.circle(center, radius, fill, stroke);
                    center - vec2(0.0, radius)
                }
                HullShape::Path { points } => {
                    let points = points.iter().map(|point| to_screen(*point)).collect::<Vec<_>>();
                    let top = points
                        .iter()
                        .copied()
                        .min_by(|a, b| a.y.total_cmp(&b.y))
                        .unwrap_or(rect.center());
                    painter.add(Shape::convex_polygon(points, fill, stroke));
                    top
                }
            };
            if hull.emphasis != Emphasis::Dimmed {
                painter.text(
                    label_anchor - vec2(0.0, 4.0),
                    Align2::CENTER_BOTTOM,
                    hull.label.as_str(),
                    FontId::proportional(12.0),
                    with_opacity(base, 0.9),
                );
            }
        }

        let zoom_sqrt = transform.zoom.sqrt();
        for edge in &scene.edges {
            let start = to_screen(edge.from);
            let end = to_screen(edge.to);
            if !edge_visible(rect, start, end, 2.0) {
                continue;
            }
            let opacity = match edge.emphasis {
                Emphasis::Highlighted => 1.0,
                Emphasis::Normal => edge.opacity,
                Emphasis::Dimmed => edge.opacity * 0.25,
            };
            let color = match edge.emphasis {
                Emphasis::Highlighted => blend_color(EDGE_COLOR, SELECTED_COLOR, 0.6),
                _ => EDGE_COLOR,
            };
            painter.line_segment(
                [start, end],
                Stroke::new(
                    (edge.width * zoom_sqrt).clamp(0.5, 4.0),
                    with_opacity(color, opacity),
                ),
            );
        }

        let mut hovered_label: Option<(Pos2, &str)> = None;
        let hovered = self.controller.interaction().hovered();
        for node in &scene.nodes {
            let position = to_screen(node.pos);
            let radius = transform.screen_radius(node.radius);
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let base = if node.external {
                EXTERNAL_COLOR
            } else {
                cluster_color(node.cluster)
            };
            painter.circle_filled(position, radius, emphasize(base, node.emphasis));

            let outline = if node.selected {
                Stroke::new(2.4, SELECTED_COLOR)
            } else if node.fixed {
                Stroke::new(1.6, Color32::from_gray(230))
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190))
            };
            painter.circle_stroke(position, radius, outline);

            if hovered == Some(node.index)
                && let Some(source) = self.controller.dataset().nodes.get(node.index)
            {
                hovered_label = Some((position + vec2(radius + 5.0, 0.0), source.title.as_str()));
            }
        }

        if let Some((anchor, title)) = hovered_label {
            painter.text(
                anchor,
                Align2::LEFT_CENTER,
                title,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if scene.nodes.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No nodes match the current filters.",
                FontId::proportional(14.0),
                Color32::from_gray(200),
            );
        }
    }
}
