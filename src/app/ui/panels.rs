use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{self, Align, Color32, Context, Layout, RichText, Ui, Vec2};
use tracing::{error, info};

use crate::metrics::{HttpMetricsSource, ThroughputPoller, ThroughputTable};
use crate::relation::{LineageGraph, RelationId};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) const INITIAL_LIST_ROWS: usize = 30;
    pub(in crate::app) const LIST_PAGE_ROWS: usize = 30;
    pub(in crate::app) const LIST_PREFETCH_MARGIN: usize = 4;

    pub(in crate::app) fn new(
        graph: LineageGraph,
        metrics_url: Option<String>,
        cluster_id: Option<String>,
        poll_interval: Duration,
    ) -> Self {
        let cluster_input = cluster_id.clone().unwrap_or_default();

        let mut model = Self {
            graph,
            metrics_url,
            cluster_id,
            cluster_input,
            poll_interval,
            poller: None,
            throughput: ThroughputTable::default(),
            search: String::new(),
            selected: None,
            expanded: HashSet::new(),
            show_system_tables: true,
            animate_streaming_edges: true,
            pan: Vec2::ZERO,
            zoom: 1.0,
            auto_fit_pending: true,
            center_on: None,
            drag_target: None,
            diagram_dirty: true,
            diagram: None,
            list_rows_visible: Self::INITIAL_LIST_ROWS,
            visible_node_count: 0,
            visible_edge_count: 0,
        };
        model.start_poller();
        model
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source_label: &str,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.drain_poll_events();
        if self.diagram_dirty {
            self.rebuild_diagram();
        }
        if self.poller.is_some() {
            // Poll results arrive between input events; keep frames coming so
            // fresh rates show up without waiting for the next interaction.
            ctx.request_repaint_after(Duration::from_millis(500));
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("WaveKit Lineage");
                    ui.separator();
                    if let Some(database) = &self.graph.database {
                        ui.label(format!("database: {database}"));
                    }
                    ui.label(format!("source: {source_label}"));
                    ui.label(format!("relations: {}", self.graph.relation_count()));
                    ui.label(format!("edges: {}", self.graph.edge_count()));
                    if !self.graph.warnings.is_empty() {
                        ui.label(
                            RichText::new(format!("warnings: {}", self.graph.warnings.len()))
                                .color(Color32::from_rgb(235, 190, 80)),
                        )
                        .on_hover_text(self.graph.warnings.join("\n"));
                    }

                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload snapshot"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if is_loading {
                        ui.spinner();
                    }
                    if ui.button("Fit view").clicked() {
                        self.auto_fit_pending = true;
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        self.draw_poll_status(ui);
                        ui.separator();
                        ui.label(format!(
                            "visible: {} nodes / {} edges",
                            self.visible_node_count, self.visible_edge_count
                        ));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        // The canvas keeps rendering during a background reload; only the top
        // bar signals that one is in flight.
        egui::CentralPanel::default().show(ctx, |ui| self.draw_diagram(ui));
    }

    fn draw_poll_status(&self, ui: &mut Ui) {
        if self.metrics_url.is_none() {
            ui.label("metrics: off");
            return;
        }
        if self.cluster_id.is_none() {
            ui.label("metrics: no cluster");
            return;
        }
        if self.poller.is_none() {
            ui.label(RichText::new("metrics: unavailable").color(Color32::from_rgb(220, 90, 90)));
            return;
        }

        if let Some(last_error) = self.throughput.last_error() {
            ui.label(RichText::new("metrics: stale").color(Color32::from_rgb(235, 190, 80)))
                .on_hover_text(last_error);
        } else if self.throughput.has_polled() {
            ui.label(format!("metrics: {} relations reporting", self.throughput.len()));
        } else {
            ui.label("metrics: waiting for samples");
        }
    }

    fn drain_poll_events(&mut self) {
        let Some(poller) = &self.poller else {
            return;
        };

        let mut changed = false;
        while let Ok(event) = poller.events().try_recv() {
            changed |= self.throughput.apply(event);
        }

        if changed {
            self.patch_diagram_throughput();
        }
    }

    fn start_poller(&mut self) {
        self.poller = None;

        let (Some(base_url), Some(cluster_id)) =
            (self.metrics_url.clone(), self.cluster_id.clone())
        else {
            return;
        };

        match HttpMetricsSource::new(&base_url) {
            Ok(source) => {
                info!(cluster = %cluster_id, interval = ?self.poll_interval, "starting throughput poller");
                self.poller = Some(ThroughputPoller::start(
                    Arc::new(source),
                    cluster_id,
                    self.poll_interval,
                ));
            }
            Err(err) => {
                error!("failed to build metrics client: {err:#}");
            }
        }
    }

    /// Retargets polling at the cluster typed into the controls panel. Rates
    /// from the previous cluster are dropped immediately rather than shown
    /// against the wrong cluster.
    pub(in crate::app) fn apply_cluster_input(&mut self) {
        let input = self.cluster_input.trim();
        let next = (!input.is_empty()).then(|| input.to_owned());
        if next == self.cluster_id {
            return;
        }

        info!(from = ?self.cluster_id, to = ?next, "switching throughput cluster");
        self.cluster_id = next;
        self.poller = None;
        self.throughput.reset();
        self.patch_diagram_throughput();
        self.start_poller();
    }

    /// Swaps in a freshly loaded graph while keeping the viewport, filters,
    /// and poller untouched. Selection and expansions are pruned to relations
    /// that still exist.
    pub(in crate::app) fn replace_graph(&mut self, graph: LineageGraph) {
        self.graph = graph;

        if let Some(id) = self.selected
            && self.graph.relation(id).is_none()
        {
            self.selected = None;
        }
        self.expanded.retain(|&id| self.graph.relation(id).is_some());
        self.list_rows_visible = Self::INITIAL_LIST_ROWS;
        self.diagram_dirty = true;

        info!(
            relations = self.graph.relation_count(),
            edges = self.graph.edge_count(),
            "applied reloaded lineage snapshot"
        );
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<RelationId>) {
        self.selected = selected;
    }

    pub(in crate::app) fn toggle_expanded(&mut self, id: RelationId) {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }
}
