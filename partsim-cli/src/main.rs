mod view_app;

use clap::{Parser, Subcommand};
use partsim_core::{SimConfig, Simulation};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "partsim")]
#[command(about = "partsim - real-time 2D particle simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run headless for a fixed number of frames
    Run {
        /// JSON config file (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of frames to simulate
        #[arg(short, long, default_value_t = 600)]
        frames: u64,
        /// Simulated frame rate driving the spawn schedule
        #[arg(long, default_value_t = 60.0)]
        fps: f32,
        /// Log a profiler report every N frames (0 disables)
        #[arg(long, default_value_t = 60)]
        report_every: u64,
        /// Print final positions as JSON to stdout
        #[arg(long)]
        dump: bool,
    },
    /// Open the interactive viewer
    View {
        /// JSON config file, reloaded whenever it changes
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            frames,
            fps,
            report_every,
            dump,
        } => run_headless(config.as_deref(), frames, fps, report_every, dump),
        Commands::View { config } => run_viewer(config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<SimConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            log::info!("loading config from {}", path.display());
            Ok(SimConfig::load(path)?)
        }
        None => Ok(SimConfig::default()),
    }
}

fn run_headless(
    config: Option<&Path>,
    frames: u64,
    fps: f32,
    report_every: u64,
    dump: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(format!("fps must be > 0, got {}", fps).into());
    }
    let mut sim = Simulation::new(load_config(config)?)?;
    let frame_dt = 1.0 / fps;

    for frame in 1..=frames {
        sim.step_frame(frame_dt);
        if report_every > 0 && frame % report_every == 0 {
            log::info!("frame {}: {} particles", frame, sim.len());
            sim.profiler_mut().report();
        }
    }

    log::info!(
        "finished {} frames with {} particles",
        sim.frame(),
        sim.len()
    );

    if dump {
        let positions: Vec<[f32; 2]> = sim
            .particles()
            .positions()
            .iter()
            .map(|p| p.to_array())
            .collect();
        println!("{}", serde_json::to_string_pretty(&positions)?);
    }

    Ok(())
}

fn run_viewer(config: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([640.0, 640.0]),
        ..Default::default()
    };
    eframe::run_native(
        "partsim",
        options,
        Box::new(|cc| Ok(Box::new(view_app::ViewApp::new(config, cc)))),
    )?;
    Ok(())
}
