use eframe::egui::{self, Color32, RichText, Ui};

use crate::relation::RelationId;
use crate::util::format_throughput;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Relation Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected else {
            ui.label("Select a relation from the diagram or the list.");
            return;
        };

        let Some(relation) = self.graph.relation(selected_id) else {
            ui.label("Selected relation no longer exists in this snapshot.");
            return;
        };

        let name = relation.name.clone();
        let type_label = relation.relation_type.label();
        let columns = relation.columns.clone();
        let upstream = self.named_relations(&relation.dependencies);
        let downstream = self.named_relations(&relation.dependents);
        let throughput = self.throughput.get(selected_id);

        ui.label(RichText::new(name).strong());
        ui.small(format!("{type_label}, id {selected_id}"));
        ui.add_space(6.0);

        ui.label(format!("Throughput: {}", format_throughput(throughput)));

        ui.separator();
        ui.label(RichText::new(format!("Columns ({})", columns.len())).strong());
        if columns.is_empty() {
            ui.label("No column metadata in this snapshot.");
        } else {
            egui::ScrollArea::vertical()
                .id_salt("column_scroll")
                .max_height(220.0)
                .auto_shrink([false, true])
                .show(ui, |ui| {
                    for column in &columns {
                        ui.horizontal(|ui| {
                            if column.is_primary_key {
                                ui.label(
                                    RichText::new(&column.name)
                                        .color(Color32::from_rgb(245, 206, 93)),
                                )
                                .on_hover_text("primary key");
                            } else {
                                ui.label(&column.name);
                            }
                            ui.small(&column.data_type);
                        });
                    }
                });
        }

        ui.separator();
        ui.label(RichText::new(format!("Upstream ({})", upstream.len())).strong());
        if upstream.is_empty() {
            ui.label("No upstream relations.");
        } else {
            for (id, name) in &upstream {
                if ui.link(name).on_hover_text(format!("id {id}")).clicked() {
                    self.set_selected(Some(*id));
                    self.center_on = Some(*id);
                }
            }
        }

        ui.add_space(4.0);
        ui.label(RichText::new(format!("Downstream ({})", downstream.len())).strong());
        if downstream.is_empty() {
            ui.label("No downstream relations.");
        } else {
            for (id, name) in &downstream {
                if ui.link(name).on_hover_text(format!("id {id}")).clicked() {
                    self.set_selected(Some(*id));
                    self.center_on = Some(*id);
                }
            }
        }
    }

    fn named_relations(&self, ids: &[RelationId]) -> Vec<(RelationId, String)> {
        ids.iter()
            .filter_map(|&id| {
                self.graph
                    .relation(id)
                    .map(|relation| (id, relation.name.clone()))
            })
            .collect()
    }
}
