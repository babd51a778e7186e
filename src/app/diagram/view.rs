use eframe::egui::{
    Align2, Color32, CursorIcon, FontId, PointerButton, Pos2, Rect, Sense, Stroke, Ui, vec2,
};

use crate::layout::{NODE_HEIGHT, NODE_WIDTH};
use crate::relation::{RelationId, RelationType};

use super::super::ViewModel;
use super::super::render_utils::{draw_background, node_screen_rect, world_to_screen};
use super::node::{MIN_DETAIL_ZOOM, draw_column_overlay, draw_node, expander_rect, relation_fill};

const EDGE_SEGMENTS: usize = 20;
const FLOW_DOTS: usize = 3;
const FLOW_SPEED: f64 = 0.35;

pub(in crate::app) const DEPENDENCY_EDGE_COLOR: Color32 = Color32::from_rgb(112, 120, 132);
pub(in crate::app) const STREAMING_EDGE_COLOR: Color32 =
    relation_fill(RelationType::MaterializedView);
pub(in crate::app) const FLOW_DOT_COLOR: Color32 = Color32::from_rgb(248, 204, 130);

impl ViewModel {
    pub(in crate::app) fn draw_diagram(&mut self, ui: &mut Ui) {
        if self.diagram_dirty {
            self.rebuild_diagram();
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);

        let no_nodes = self
            .diagram
            .as_ref()
            .is_none_or(|diagram| diagram.nodes.is_empty());
        if no_nodes {
            let message = if self.graph.relations.is_empty() {
                "Snapshot contains no relations."
            } else {
                "All relations are hidden by the current filters."
            };
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                message,
                FontId::proportional(15.0),
                Color32::from_gray(160),
            );
            return;
        }

        self.handle_zoom(ui, rect, &response);

        if self.auto_fit_pending {
            self.auto_fit_pending = false;
            self.fit_to_view(rect);
        }
        if let Some(id) = self.center_on.take() {
            self.center_view_on(id);
        }

        let pointer = ui.input(|input| input.pointer.hover_pos());
        let hovered = self.hovered_node(rect, pointer);
        self.handle_diagram_drag(&response, hovered);

        let time = ui.input(|input| input.time);
        let zoom_sqrt = self.zoom.sqrt();
        let animate = self.animate_streaming_edges;
        let mut streaming_on_screen = false;
        let mut hover_readout = None;
        let mut pending_selection: Option<Option<RelationId>> = None;
        let mut pending_toggle: Option<RelationId> = None;

        let Some(diagram) = &self.diagram else {
            return;
        };

        for (edge_index, edge) in diagram.edges.iter().enumerate() {
            let Some(source) = diagram.nodes.get(edge.source) else {
                continue;
            };
            let Some(target) = diagram.nodes.get(edge.target) else {
                continue;
            };

            let start = world_to_screen(
                rect,
                self.pan,
                self.zoom,
                source.pos + vec2(NODE_WIDTH, NODE_HEIGHT * 0.5),
            );
            let end = world_to_screen(
                rect,
                self.pan,
                self.zoom,
                target.pos + vec2(0.0, NODE_HEIGHT * 0.5),
            );

            let control = edge_controls(start, end, self.zoom);
            let hull = Rect::from_two_pos(control[0], control[1])
                .union(Rect::from_two_pos(control[2], control[3]))
                .expand(8.0);
            if !rect.intersects(hull) {
                continue;
            }

            let stroke = if edge.streaming {
                Stroke::new((2.8 * zoom_sqrt).clamp(1.6, 4.6), STREAMING_EDGE_COLOR)
            } else {
                Stroke::new((1.2 * zoom_sqrt).clamp(0.6, 2.4), DEPENDENCY_EDGE_COLOR)
            };

            let points: [Pos2; EDGE_SEGMENTS + 1] = std::array::from_fn(|segment| {
                cubic_point(control, segment as f32 / EDGE_SEGMENTS as f32)
            });
            for pair in points.windows(2) {
                painter.line_segment([pair[0], pair[1]], stroke);
            }

            if edge.streaming {
                streaming_on_screen = true;
                if animate {
                    let dot_radius = (3.4 * zoom_sqrt).clamp(2.0, 5.0);
                    for dot in 0..FLOW_DOTS {
                        let phase = (edge_index as f64 * 0.137) + (dot as f64 / FLOW_DOTS as f64);
                        let t = ((time * FLOW_SPEED) + phase).fract() as f32;
                        painter.circle_filled(cubic_point(control, t), dot_radius, FLOW_DOT_COLOR);
                    }
                }
            }
        }

        for (index, node) in diagram.nodes.iter().enumerate() {
            let screen = node_screen_rect(rect, self.pan, self.zoom, node.pos);
            if !rect.intersects(screen.expand(4.0)) {
                continue;
            }

            let is_selected = self.selected == Some(node.id);
            let anim_id = ui.make_persistent_id(("relation_selected", node.id));
            let selection_mix = ui.ctx().animate_bool(anim_id, is_selected);
            let is_hovered = hovered == Some(index);

            draw_node(
                &painter,
                node,
                screen,
                self.zoom,
                selection_mix,
                is_hovered,
                self.expanded.contains(&node.id),
            );

            if is_hovered {
                hover_readout = Some(format!(
                    "{}  |  {}  |  {}",
                    node.name,
                    node.relation_type.label(),
                    node.throughput_label
                ));
            }
        }

        // Column popups paint over nodes and edges.
        if self.zoom >= MIN_DETAIL_ZOOM {
            for node in &diagram.nodes {
                if !self.expanded.contains(&node.id) {
                    continue;
                }
                let screen = node_screen_rect(rect, self.pan, self.zoom, node.pos);
                if rect.expand(360.0).intersects(screen) {
                    draw_column_overlay(&painter, node, screen);
                }
            }
        }

        if let Some(readout) = hover_readout {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                readout,
                FontId::proportional(13.0),
                Color32::from_gray(230),
            );
            ui.output_mut(|output| output.cursor_icon = CursorIcon::PointingHand);
        }

        if response.clicked_by(PointerButton::Primary) {
            match hovered {
                Some(index) => {
                    if let Some(node) = diagram.nodes.get(index) {
                        let screen = node_screen_rect(rect, self.pan, self.zoom, node.pos);
                        let on_expander = self.zoom >= MIN_DETAIL_ZOOM
                            && pointer.is_some_and(|pointer| {
                                expander_rect(screen, self.zoom).contains(pointer)
                            });
                        if on_expander {
                            pending_toggle = Some(node.id);
                        } else {
                            pending_selection = Some(Some(node.id));
                        }
                    }
                }
                None => pending_selection = Some(None),
            }
        }

        let needs_repaint = (animate && streaming_on_screen) || response.dragged();

        if let Some(selection) = pending_selection {
            self.set_selected(selection);
        }
        if let Some(id) = pending_toggle {
            self.toggle_expanded(id);
        }

        if needs_repaint {
            ui.ctx().request_repaint();
        }
    }
}

/// Horizontal cubic: control points reach out along x so edges leave the
/// right anchor and enter the left anchor flat, even for back edges.
fn edge_controls(start: Pos2, end: Pos2, zoom: f32) -> [Pos2; 4] {
    let reach = ((end.x - start.x).abs() * 0.5).clamp(40.0 * zoom, 160.0 * zoom);
    [
        start,
        Pos2::new(start.x + reach, start.y),
        Pos2::new(end.x - reach, end.y),
        end,
    ]
}

fn cubic_point(points: [Pos2; 4], t: f32) -> Pos2 {
    let inverse = 1.0 - t;
    let w0 = inverse * inverse * inverse;
    let w1 = 3.0 * inverse * inverse * t;
    let w2 = 3.0 * inverse * t * t;
    let w3 = t * t * t;

    Pos2::new(
        (w0 * points[0].x) + (w1 * points[1].x) + (w2 * points[2].x) + (w3 * points[3].x),
        (w0 * points[0].y) + (w1 * points[1].y) + (w2 * points[2].y) + (w3 * points[3].y),
    )
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn cubic_curves_hit_their_endpoints() {
        let control = edge_controls(pos2(0.0, 0.0), pos2(300.0, 120.0), 1.0);

        assert_eq!(cubic_point(control, 0.0), pos2(0.0, 0.0));
        assert_eq!(cubic_point(control, 1.0), pos2(300.0, 120.0));
    }

    #[test]
    fn back_edge_controls_bow_outward() {
        let control = edge_controls(pos2(300.0, 0.0), pos2(0.0, 80.0), 1.0);

        assert!(control[1].x > 300.0);
        assert!(control[2].x < 0.0);
    }
}
