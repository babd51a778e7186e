use eframe::egui::{PointerButton, Pos2, Rect, Response, Ui, Vec2, vec2};

use crate::layout::{NODE_HEIGHT, NODE_WIDTH};
use crate::relation::RelationId;

use super::super::ViewModel;
use super::super::render_utils::{node_screen_rect, screen_to_world};

pub(in crate::app) const MIN_ZOOM: f32 = 0.1;
pub(in crate::app) const MAX_ZOOM: f32 = 4.0;

const FIT_PADDING: f32 = 60.0;

impl ViewModel {
    /// Scroll-to-zoom around the pointer: the world point under the cursor
    /// stays fixed while the scale changes.
    pub(in crate::app) fn handle_zoom(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub(in crate::app) fn handle_diagram_drag(&mut self, response: &Response, hovered: Option<usize>) {
        if response.drag_started_by(PointerButton::Primary) {
            self.drag_target = hovered;
        }

        if response.dragged_by(PointerButton::Primary) {
            let delta = response.drag_delta();
            match self.drag_target {
                Some(index) => {
                    if let Some(diagram) = &mut self.diagram
                        && let Some(node) = diagram.nodes.get_mut(index)
                    {
                        node.pos += delta / self.zoom;
                        node.dragged = true;
                    }
                }
                None => self.pan += delta,
            }
        } else if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }

        if response.drag_stopped() {
            self.drag_target = None;
        }
    }

    /// The last hit wins so the topmost painted node takes the pointer.
    pub(in crate::app) fn hovered_node(&self, rect: Rect, pointer: Option<Pos2>) -> Option<usize> {
        let pointer = pointer?;
        if !rect.contains(pointer) {
            return None;
        }
        let diagram = self.diagram.as_ref()?;

        let mut hovered = None;
        for (index, node) in diagram.nodes.iter().enumerate() {
            if node_screen_rect(rect, self.pan, self.zoom, node.pos).contains(pointer) {
                hovered = Some(index);
            }
        }
        hovered
    }

    /// Centers the whole diagram in `rect`, zooming out as needed but never
    /// past 1.0, so small graphs keep their natural size.
    pub(in crate::app) fn fit_to_view(&mut self, rect: Rect) {
        let Some(diagram) = &self.diagram else {
            return;
        };
        let Some(first) = diagram.nodes.first() else {
            self.pan = Vec2::ZERO;
            self.zoom = 1.0;
            return;
        };

        let mut min = first.pos;
        let mut max = first.pos + vec2(NODE_WIDTH, NODE_HEIGHT);
        for node in &diagram.nodes {
            min = min.min(node.pos);
            max = max.max(node.pos + vec2(NODE_WIDTH, NODE_HEIGHT));
        }

        let span = (max - min).max(vec2(1.0, 1.0));
        let available = (rect.size() - vec2(2.0 * FIT_PADDING, 2.0 * FIT_PADDING))
            .max(vec2(50.0, 50.0));
        let fit = (available.x / span.x).min(available.y / span.y);
        self.zoom = fit.clamp(MIN_ZOOM, 1.0);

        let center = (min + max) * 0.5;
        self.pan = -center * self.zoom;
    }

    pub(in crate::app) fn center_view_on(&mut self, id: RelationId) {
        let Some(diagram) = &self.diagram else {
            return;
        };
        let Some(&index) = diagram.index_by_id.get(&id) else {
            return;
        };
        let Some(node) = diagram.nodes.get(index) else {
            return;
        };

        let center = node.pos + (vec2(NODE_WIDTH, NODE_HEIGHT) * 0.5);
        self.pan = -center * self.zoom;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use eframe::egui::pos2;

    use crate::relation::{LineageGraph, RelationNode, RelationType};

    use super::super::super::render_utils::world_to_screen;
    use super::*;

    fn model_with_nodes(count: u32) -> ViewModel {
        let relations: Vec<RelationNode> = (0..count)
            .map(|id| RelationNode {
                id,
                name: format!("relation_{id}"),
                relation_type: RelationType::Table,
                columns: Vec::new(),
                dependencies: Vec::new(),
                dependents: Vec::new(),
            })
            .collect();
        let index_by_id = relations
            .iter()
            .enumerate()
            .map(|(index, relation)| (relation.id, index))
            .collect();
        let graph = LineageGraph {
            database: None,
            relations,
            index_by_id,
            edges: Vec::new(),
            warnings: Vec::new(),
        };

        let mut model = ViewModel::new(graph, None, None, Duration::from_secs(5));
        model.rebuild_diagram();
        model
    }

    #[test]
    fn hit_testing_matches_the_painted_rects() {
        let model = model_with_nodes(2);
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(1200.0, 800.0));

        let node_pos = model.diagram.as_ref().unwrap().nodes[1].pos;
        let inside = world_to_screen(rect, model.pan, model.zoom, node_pos + vec2(10.0, 10.0));
        let outside = world_to_screen(rect, model.pan, model.zoom, node_pos - vec2(30.0, 30.0));

        assert_eq!(model.hovered_node(rect, Some(inside)), Some(1));
        assert_eq!(model.hovered_node(rect, Some(outside)), None);
        assert_eq!(model.hovered_node(rect, None), None);
    }

    #[test]
    fn fit_centers_the_diagram_and_caps_zoom() {
        let mut model = model_with_nodes(2);
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(1200.0, 800.0));

        model.zoom = 3.0;
        model.fit_to_view(rect);

        assert!(model.zoom <= 1.0);
        assert!(model.zoom >= MIN_ZOOM);

        // The bounding box center must land on the screen center.
        let diagram = model.diagram.as_ref().unwrap();
        let mut min = diagram.nodes[0].pos;
        let mut max = diagram.nodes[0].pos + vec2(NODE_WIDTH, NODE_HEIGHT);
        for node in &diagram.nodes {
            min = min.min(node.pos);
            max = max.max(node.pos + vec2(NODE_WIDTH, NODE_HEIGHT));
        }
        let center = (min + max) * 0.5;
        let on_screen = world_to_screen(rect, model.pan, model.zoom, center);
        assert!((on_screen - rect.center()).length() < 1e-3);
    }

    #[test]
    fn centering_on_a_relation_puts_its_node_mid_screen() {
        let mut model = model_with_nodes(3);
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(1000.0, 700.0));

        model.center_view_on(2);

        let diagram = model.diagram.as_ref().unwrap();
        let index = diagram.index_by_id[&2];
        let node_center = diagram.nodes[index].pos + (vec2(NODE_WIDTH, NODE_HEIGHT) * 0.5);
        let on_screen = world_to_screen(rect, model.pan, model.zoom, node_center);
        assert!((on_screen - rect.center()).length() < 1e-3);
    }
}
