use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use eframe::egui::{self, Context, Vec2};

use crate::metrics::{ThroughputPoller, ThroughputTable};
use crate::relation::{ColumnSchema, LineageGraph, RelationId, RelationSource, RelationType};

mod diagram;
mod render_utils;
mod ui;

pub struct AppConfig {
    pub relation_source: RelationSource,
    pub metrics_url: Option<String>,
    pub cluster_id: Option<String>,
    pub poll_interval: Duration,
}

pub struct LineageApp {
    config: AppConfig,
    source_label: String,
    state: AppState,
    reload_rx: Option<Receiver<Result<LineageGraph, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<LineageGraph, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    graph: LineageGraph,
    metrics_url: Option<String>,
    cluster_id: Option<String>,
    cluster_input: String,
    poll_interval: Duration,
    poller: Option<ThroughputPoller>,
    throughput: ThroughputTable,
    search: String,
    selected: Option<RelationId>,
    expanded: HashSet<RelationId>,
    show_system_tables: bool,
    animate_streaming_edges: bool,
    pan: Vec2,
    zoom: f32,
    auto_fit_pending: bool,
    center_on: Option<RelationId>,
    drag_target: Option<usize>,
    diagram_dirty: bool,
    diagram: Option<DiagramGraph>,
    list_rows_visible: usize,
    visible_node_count: usize,
    visible_edge_count: usize,
}

struct DiagramGraph {
    nodes: Vec<DiagramNode>,
    edges: Vec<DiagramEdge>,
    index_by_id: HashMap<RelationId, usize>,
}

#[derive(Clone, Debug, PartialEq)]
struct DiagramNode {
    id: RelationId,
    name: String,
    relation_type: RelationType,
    columns: Vec<ColumnSchema>,
    pos: Vec2,
    dragged: bool,
    throughput: Option<f64>,
    throughput_label: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct DiagramEdge {
    source: usize,
    target: usize,
    streaming: bool,
}

impl LineageApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let source_label = config.relation_source.describe();
        let state = Self::start_load(config.relation_source.clone());
        Self {
            config,
            source_label,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: RelationSource) -> Receiver<Result<LineageGraph, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = source.load().map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: RelationSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }
}

impl eframe::App for LineageApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(graph) => AppState::Ready(Box::new(ViewModel::new(
                            graph,
                            self.config.metrics_url.clone(),
                            self.config.cluster_id.clone(),
                            self.config.poll_interval,
                        ))),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading lineage snapshot...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load lineage snapshot");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.config.relation_source.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.source_label, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.config.relation_source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(graph)) => {
                            model.replace_graph(graph);
                        }
                        Ok(Err(error)) => {
                            transition = Some(AppState::Error(error));
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "background reload worker disconnected".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
