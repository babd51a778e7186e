use eframe::egui::{Pos2, RichText, Sense, Stroke, Ui, vec2};

use crate::relation::RelationType;

use super::super::ViewModel;
use super::super::diagram::{
    DEPENDENCY_EDGE_COLOR, FLOW_DOT_COLOR, STREAMING_EDGE_COLOR, relation_fill,
};

impl ViewModel {
    pub(in crate::app) fn draw_legend(&self, ui: &mut Ui) {
        ui.label(RichText::new("Legend").strong());
        ui.add_space(2.0);

        for relation_type in RelationType::ALL {
            ui.horizontal(|ui| {
                let (rect, _) = ui.allocate_exact_size(vec2(14.0, 14.0), Sense::hover());
                ui.painter().rect_filled(rect, 3.0, relation_fill(relation_type));
                ui.label(format!(
                    "{} ({})",
                    relation_type.label(),
                    relation_type.badge()
                ));
            });
        }

        ui.add_space(4.0);

        ui.horizontal(|ui| {
            let (rect, _) = ui.allocate_exact_size(vec2(34.0, 14.0), Sense::hover());
            let y = rect.center().y;
            ui.painter().line_segment(
                [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
                Stroke::new(1.2, DEPENDENCY_EDGE_COLOR),
            );
            ui.label("dependency");
        });

        ui.horizontal(|ui| {
            let (rect, _) = ui.allocate_exact_size(vec2(34.0, 14.0), Sense::hover());
            let y = rect.center().y;
            ui.painter().line_segment(
                [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
                Stroke::new(2.8, STREAMING_EDGE_COLOR),
            );
            ui.painter().circle_filled(rect.center(), 2.4, FLOW_DOT_COLOR);
            ui.label("streaming flow into a materialized view");
        });
    }
}
