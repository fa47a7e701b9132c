use std::path::Path;

use eframe::egui::{self, Align, Context, Layout, Ui};

use super::{DatasetSummary, GraphHost};

pub(super) fn show_top_bar(
    ctx: &Context,
    host: &GraphHost,
    summary: &DatasetSummary,
    data_path: &Path,
    is_busy: bool,
    reload_requested: &mut bool,
) {
    egui::TopBottomPanel::top("top_bar")
        .resizable(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("System Service Status");
                ui.separator();
                ui.label(format!("data: {}", data_path.display()));
                ui.label(format!("services: {}", summary.nodes));
                ui.label(format!("calls: {}", summary.links));
                let reload_button = ui.add_enabled(!is_busy, egui::Button::new("Reload"));
                if reload_button.clicked() {
                    *reload_requested = true;
                }
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if let Some(engine) = &host.engine {
                        let simulation = engine.simulation();
                        ui.label(format!(
                            "alpha {:.3}  |  pinned {}  |  {:?}",
                            simulation.alpha(),
                            engine.pinned_count(),
                            simulation.state()
                        ));
                    }
                });
            });
        });
}

// Mounting measures its size here too, so the viewport an engine reads at
// construction is the area it is later drawn into.
pub(super) fn graph_panel<R>(ctx: &Context, add_contents: impl FnOnce(&mut Ui) -> R) -> R {
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE)
        .show(ctx, add_contents)
        .inner
}

pub(super) fn show_graph(ctx: &Context, host: &mut GraphHost) {
    graph_panel(ctx, |ui| {
        let GraphHost { surface, engine } = host;
        if let Some(engine) = engine {
            engine.ui(ui, surface);
        }
    });
}
