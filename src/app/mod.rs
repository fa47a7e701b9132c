use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Result;
use eframe::egui::{self, Context, Vec2};
use tracing::warn;

use service_graph::dataset::{Dataset, describe_node, load_dataset};
use service_graph::graph::{ForceGraph, MountSurface, SimulationConfig};

mod fonts;
mod panels;

pub struct ServiceGraphApp {
    data_path: PathBuf,
    config: SimulationConfig,
    state: AppState,
    reload_rx: Option<Receiver<Result<Dataset, String>>>,
    host: GraphHost,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Dataset, String>>,
    },
    Mounting(Dataset),
    Ready(DatasetSummary),
    Error(String),
}

struct DatasetSummary {
    nodes: usize,
    links: usize,
}

struct GraphHost {
    surface: MountSurface,
    engine: Option<ForceGraph>,
}

impl GraphHost {
    fn mount(&mut self, dataset: &Dataset, size: Vec2, config: SimulationConfig) -> Result<()> {
        if let Some(mut previous) = self.engine.take() {
            previous.destroy();
        }

        self.surface.resize(size);
        let mut engine = ForceGraph::create_with_config(
            &mut self.surface,
            &dataset.nodes,
            &dataset.links,
            describe_node,
            config,
        )?;
        engine.start();
        self.engine = Some(engine);
        Ok(())
    }

    fn unmount(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
        }
    }
}

impl ServiceGraphApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        data_path: PathBuf,
        icon_font: Option<PathBuf>,
        config: SimulationConfig,
    ) -> Self {
        let icon_font_installed = match icon_font {
            Some(path) => match fonts::install_icon_font(&cc.egui_ctx, &path) {
                Ok(()) => true,
                Err(error) => {
                    warn!("{error:#}; drawing text tags instead of icons");
                    false
                }
            },
            None => false,
        };

        let state = Self::start_load(data_path.clone());
        Self {
            data_path,
            config,
            state,
            reload_rx: None,
            host: GraphHost {
                surface: MountSurface::new(Vec2::ZERO).with_icon_font(icon_font_installed),
                engine: None,
            },
        }
    }

    fn spawn_load(data_path: PathBuf) -> Receiver<Result<Dataset, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_dataset(&data_path).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(data_path: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(data_path),
        }
    }

    fn loaded(&mut self, result: Result<Dataset, String>) -> AppState {
        match result {
            Ok(dataset) => AppState::Mounting(dataset),
            Err(error) => {
                self.host.unmount();
                AppState::Error(error)
            }
        }
    }
}

impl eframe::App for ServiceGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut reload_requested = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(result),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading service topology...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load service topology");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        reload_requested = true;
                    }
                });
            }
            AppState::Mounting(dataset) => {
                let summary = DatasetSummary {
                    nodes: dataset.nodes.len(),
                    links: dataset.links.len(),
                };
                panels::show_top_bar(
                    ctx,
                    &self.host,
                    &summary,
                    &self.data_path,
                    true,
                    &mut reload_requested,
                );
                let next = panels::graph_panel(ctx, |ui| {
                    match self.host.mount(dataset, ui.available_size(), self.config) {
                        Ok(()) => AppState::Ready(summary),
                        Err(error) => AppState::Error(format!("{error:#}")),
                    }
                });
                self.state = next;
                ctx.request_repaint();
            }
            AppState::Ready(summary) => {
                let is_reloading = self.reload_rx.is_some();
                panels::show_top_bar(
                    ctx,
                    &self.host,
                    summary,
                    &self.data_path,
                    is_reloading,
                    &mut reload_requested,
                );
                panels::show_graph(ctx, &mut self.host);

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if reload_requested && self.reload_rx.is_none() {
            if matches!(self.state, AppState::Error(_)) {
                self.state = Self::start_load(self.data_path.clone());
            } else {
                self.reload_rx = Some(Self::spawn_load(self.data_path.clone()));
            }
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = self.loaded(result);
        }
    }
}
