use std::cmp::Ordering;

use eframe::egui::{self, Align, Layout, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::relation::{RelationId, RelationType};
use crate::util::{ellipsize, format_throughput};

use super::super::ViewModel;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher.fuzzy_match(text, query).or_else(|| {
        matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase())
    })
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Lineage Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search relations")
            .on_hover_text("Fuzzy-filter the relation list below.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();

        if ui
            .checkbox(&mut self.show_system_tables, "Show system tables")
            .on_hover_text("Include system tables in the diagram and the list.")
            .changed()
        {
            self.diagram_dirty = true;
        }

        ui.checkbox(&mut self.animate_streaming_edges, "Animate streaming edges")
            .on_hover_text("Animate flow along edges that feed materialized views.");

        ui.separator();

        ui.label("Cluster");
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.cluster_input).desired_width(160.0));
            if ui
                .button("Apply")
                .on_hover_text("Restart throughput polling against this cluster.")
                .clicked()
            {
                self.apply_cluster_input();
            }
        });

        ui.separator();

        egui::CollapsingHeader::new("Relations")
            .default_open(true)
            .show(ui, |ui| self.draw_relation_list(ui));

        ui.add_space(8.0);
        ui.separator();
        self.draw_legend(ui);
    }

    /// Relation list ordered by throughput, busiest first. Relations without
    /// a sample sort below reporting ones, alphabetically.
    fn draw_relation_list(&mut self, ui: &mut Ui) {
        let matcher = SkimMatcherV2::default();
        let query = self.search.trim();

        let mut entries: Vec<(RelationId, Option<f64>, &str)> = self
            .graph
            .relations
            .iter()
            .filter(|relation| {
                self.show_system_tables || relation.relation_type != RelationType::SystemTable
            })
            .filter(|relation| {
                query.is_empty() || fuzzy_match_score(&matcher, &relation.name, query).is_some()
            })
            .map(|relation| {
                (
                    relation.id,
                    self.throughput.get(relation.id),
                    relation.name.as_str(),
                )
            })
            .collect();

        entries.sort_by(|a, b| {
            match (a.1, b.1) {
                (Some(left), Some(right)) => right.total_cmp(&left),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| a.2.cmp(b.2))
        });

        if entries.is_empty() {
            ui.label("No relations match the current search.");
            return;
        }

        let total = entries.len();
        let row_count = total.min(self.list_rows_visible);
        let mut should_load_more = false;
        let mut selected_id = None;

        egui::ScrollArea::vertical()
            .id_salt("relation_list_scroll")
            .max_height(260.0)
            .auto_shrink([false, false])
            .show_rows(ui, 22.0, row_count, |ui, row_range| {
                if row_range.end + Self::LIST_PREFETCH_MARGIN >= row_count {
                    should_load_more = true;
                }

                for index in row_range {
                    let Some(&(id, throughput, name)) = entries.get(index) else {
                        continue;
                    };

                    let is_selected = self.selected == Some(id);
                    let row_response = ui
                        .horizontal(|ui| {
                            let clicked = ui
                                .selectable_label(is_selected, ellipsize(name, 28))
                                .clicked();
                            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                ui.label(format_throughput(throughput));
                            });
                            clicked
                        })
                        .inner;

                    if row_response {
                        selected_id = Some(id);
                    }
                }
            });

        if let Some(id) = selected_id {
            self.set_selected(Some(id));
            self.center_on = Some(id);
        }

        if should_load_more && row_count < total {
            self.list_rows_visible = (row_count + Self::LIST_PAGE_ROWS).min(total);
        }
    }
}
