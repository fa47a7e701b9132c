mod app;

use std::path::PathBuf;

use clap::Parser;
use service_graph::graph::SimulationConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "data/data.json")]
    data: PathBuf,

    #[arg(long)]
    icon_font: Option<PathBuf>,

    #[arg(long)]
    link_distance: Option<f32>,

    #[arg(long, allow_negative_numbers = true)]
    charge: Option<f32>,

    #[arg(long)]
    alpha_decay: Option<f32>,
}

impl Args {
    fn simulation_config(&self) -> SimulationConfig {
        let defaults = SimulationConfig::default();
        SimulationConfig {
            link_distance: self.link_distance.unwrap_or(defaults.link_distance),
            charge_strength: self.charge.unwrap_or(defaults.charge_strength),
            alpha_decay: self
                .alpha_decay
                .unwrap_or(defaults.alpha_decay)
                .clamp(0.0001, 1.0),
            ..defaults
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = args.simulation_config();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "service-graph",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::ServiceGraphApp::new(
                cc,
                args.data.clone(),
                args.icon_font.clone(),
                config,
            )))
        }),
    )
}
