//! Interactive viewer
//!
//! Steps the simulation once per repaint, draws every particle with its own
//! radius and colour, and rebuilds the simulation whenever the config file
//! changes on disk.

use eframe::egui;
use notify::{Event, RecommendedWatcher, Watcher};
use partsim_core::runtime::LATERAL_STEP;
use partsim_core::{AccelCommand, SimConfig, Simulation};
use std::path::PathBuf;
use std::sync::mpsc;

/// Particles added per press of the spawn key
const MANUAL_SPAWN: usize = 10;

pub struct ViewApp {
    config_path: Option<PathBuf>,
    sim_opt: Option<Simulation>,
    last_load_error: Option<String>,
    playing: bool,
    #[allow(dead_code)] // Kept alive to maintain file watching
    file_watcher: Option<RecommendedWatcher>,
    file_receiver: mpsc::Receiver<notify::Result<Event>>,
}

impl ViewApp {
    pub fn new(config_path: Option<PathBuf>, _cc: &eframe::CreationContext<'_>) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })
        .ok();

        if let (Some(w), Some(path)) = (watcher.as_mut(), config_path.as_ref()) {
            if let Err(e) = w.watch(path, notify::RecursiveMode::NonRecursive) {
                log::warn!("not watching {}: {}", path.display(), e);
            }
        }

        let mut app = Self {
            config_path,
            sim_opt: None,
            last_load_error: None,
            playing: true,
            file_watcher: watcher,
            file_receiver: rx,
        };
        app.reload_simulation();
        app
    }

    fn reload_simulation(&mut self) {
        let config = match &self.config_path {
            Some(path) => SimConfig::load(path),
            None => Ok(SimConfig::default()),
        };
        match config.and_then(Simulation::new) {
            Ok(sim) => {
                log::info!("simulation loaded with {} particles", sim.len());
                self.sim_opt = Some(sim);
                self.last_load_error = None;
            }
            Err(e) => {
                log::error!("failed to load simulation: {}", e);
                self.last_load_error = Some(e.to_string());
                self.sim_opt = None;
            }
        }
    }

    fn check_file_changes(&mut self) {
        let mut needs_reload = false;
        while let Ok(event) = self.file_receiver.try_recv() {
            match event {
                Ok(Event {
                    kind: notify::EventKind::Modify(_),
                    paths,
                    ..
                }) => {
                    if let Some(path) = &self.config_path {
                        needs_reload |= paths.iter().any(|p| p.ends_with(path));
                    }
                }
                Ok(_) => {}
                Err(e) => log::warn!("file watcher error: {}", e),
            }
        }
        if needs_reload {
            self.reload_simulation();
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let (reverse, left, right, spawn, pause, reset, step) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowUp) || i.key_pressed(egui::Key::ArrowDown),
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::P),
                i.key_pressed(egui::Key::R),
                i.key_pressed(egui::Key::S),
            )
        });

        if pause {
            self.playing = !self.playing;
        }
        if reset {
            self.reload_simulation();
        }

        let Some(sim) = self.sim_opt.as_mut() else {
            return;
        };
        if reverse {
            sim.apply_command(AccelCommand::ReverseGravity);
        }
        if left {
            sim.apply_command(AccelCommand::AddLateral(-LATERAL_STEP));
        }
        if right {
            sim.apply_command(AccelCommand::AddLateral(LATERAL_STEP));
        }
        if spawn {
            sim.spawn(MANUAL_SPAWN);
        }
        if step && !self.playing {
            sim.step_frame(0.0);
        }
    }
}

fn to_color(r: f32, g: f32, b: f32) -> egui::Color32 {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgb(channel(r), channel(g), channel(b))
}

impl eframe::App for ViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_file_changes();
        self.handle_keys(ctx);

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button(if self.playing { "⏸ Pause" } else { "▶ Play" }).clicked() {
                    self.playing = !self.playing;
                }
                if ui.button("⏮ Reset").clicked() {
                    self.reload_simulation();
                }
                if ui.button("⏭ Step").clicked() {
                    if let Some(sim) = self.sim_opt.as_mut() {
                        sim.step_frame(0.0);
                    }
                }

                ui.separator();

                if let Some(sim) = &self.sim_opt {
                    ui.label(format!(
                        "Particles: {} / {}",
                        sim.len(),
                        sim.config().max_particles
                    ));
                    ui.label(format!("Frame: {}", sim.frame()));
                    ui.label(format!(
                        "Collide: {:?}",
                        sim.profiler().average("collide")
                    ));
                    let g = sim.spawn_acceleration();
                    ui.label(format!("Accel: ({:.1}, {:.1})", g.x, g.y));
                }
            });
            ui.label("arrows: gravity / lateral force   space: spawn   P: pause   S: step   R: reset");
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let rect = ui.max_rect();
            let painter = ui.painter();

            if let Some(sim) = &self.sim_opt {
                let bounds = sim.bounds();
                let extent = bounds.max - bounds.min;
                let scale = (rect.width() / extent.x).min(rect.height() / extent.y) * 0.95;
                let centre = (bounds.min + bounds.max) * 0.5;
                let to_screen = |x: f32, y: f32| {
                    rect.center() + egui::vec2((x - centre.x) * scale, -(y - centre.y) * scale)
                };

                let top_left = to_screen(bounds.min.x, bounds.max.y);
                let bottom_right = to_screen(bounds.max.x, bounds.min.y);
                painter.rect_stroke(
                    egui::Rect::from_two_pos(top_left, bottom_right),
                    0.0,
                    egui::Stroke::new(1.0, egui::Color32::GRAY),
                );

                let positions = sim.particles().positions();
                for (p, attrs) in positions.iter().zip(sim.render_attributes()) {
                    painter.circle_filled(
                        to_screen(p.x, p.y),
                        (attrs.radius * scale).max(1.0),
                        to_color(attrs.r, attrs.g, attrs.b),
                    );
                }
            }

            if let Some(ref error) = self.last_load_error {
                ui.vertical_centered(|ui| {
                    ui.add_space(rect.height() * 0.4);
                    ui.label(
                        egui::RichText::new(format!("Error: {}", error))
                            .color(egui::Color32::RED)
                            .size(16.0),
                    );
                });
            }
        });

        if self.playing {
            let frame_dt = ctx.input(|i| i.stable_dt);
            if let Some(sim) = self.sim_opt.as_mut() {
                sim.step_frame(frame_dt);
            }
            ctx.request_repaint();
        }
    }
}
