use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2};
use tracing::{error, info};

use citegraph::dataset::{DataSource, Dataset};
use citegraph::view::{FileStore, ViewController};
use citegraph::{boot_graph, boot_with_data};

mod canvas;
mod render_utils;
mod ui;

pub struct GraphApp {
    source: DataSource,
    state_dir: PathBuf,
    state: AppState,
    reload_rx: Option<Receiver<Result<Dataset, String>>>,
}

enum AppState {
    Loading { rx: Receiver<Result<Dataset, String>> },
    Ready(Box<GraphView>),
    Error(String),
}

/// UI-side state around the controller: text buffers and pointer capture.
struct GraphView {
    controller: ViewController,
    search: String,
    /// Last pointer position while a press on the canvas is held.
    pointer_captured: Option<Pos2>,
    gap_rows: usize,
}

impl GraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, source: DataSource, state_dir: PathBuf) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            state_dir,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: DataSource) -> Receiver<Result<Dataset, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = boot_graph(&source).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: DataSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready(&self, dataset: Dataset) -> AppState {
        info!(state_dir = %self.state_dir.display(), "opening graph view");
        let store = FileStore::new(self.state_dir.clone());
        AppState::Ready(Box::new(GraphView::new(boot_with_data(
            dataset,
            Box::new(store),
        ))))
    }

    fn failed(error: String) -> AppState {
        error!(%error, "dataset load failed");
        AppState::Error(error)
    }
}

impl eframe::App for GraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(dataset)) => transition = Some(Ok(dataset)),
                    Ok(Err(error)) => transition = Some(Err(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading(format!("Loading {}...", self.source.describe()));
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the citation graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
                if retry {
                    self.state = Self::start_load(self.source.clone());
                    return;
                }
            }
            AppState::Ready(view) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                view.show(ctx, &self.source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

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

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(dataset) => self.ready(dataset),
                Err(error) => Self::failed(error),
            };
        }
    }
}
