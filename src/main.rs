//! Drishti Monitor - map monitor daemon
//!
//! Overlays agent poses reported over TCP onto a static map raster shown in
//! a desktop window. The window offers two views: the current pose and the
//! accumulated pose history.
//!
//! ## Keys
//!
//! | Key | Action |
//! |-----|--------|
//! | `c` | show current pose |
//! | `h` | show pose history |
//! | `r` | reset history to the last pose |
//! | `p` | zoom in (+0.05) |
//! | `m` | zoom out (-0.05) |
//! | `q`/`Esc` | quit |
//!
//! All render state lives on the main thread; pose updates arrive on
//! connection threads and are drained from a queue once per frame.

use drishti_monitor::canvas::{self, MapCanvas};
use drishti_monitor::config::MonitorConfig;
use drishti_monitor::error::{Error, Result};
use drishti_monitor::geometry::{MapGeometry, Pose};
use drishti_monitor::monitor::{KeyCommand, Monitor, ViewMode};
use drishti_monitor::server::PoseServer;
use minifb::{Key, KeyRepeat, ScaleMode, Window, WindowOptions};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

const WINDOW_TITLE: &str = "Map Monitor";

/// Window refresh rate; 20 fps gives the ~50 ms key-poll tick
const TARGET_FPS: usize = 20;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        log::error!("Aborting drishti-monitor...");
        std::process::exit(-1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        return Err(Error::Config(
            "short of arguments: map package path and namespace must be given".to_string(),
        ));
    }
    let map_dir = &args[1];
    let namespace = &args[2];

    let config = MonitorConfig::load(map_dir, namespace)?;
    log::info!("image path is {}", config.image_path.display());

    let canvas = MapCanvas::load(&config.image_path)?;
    log::info!(
        "image {} was successfully loaded",
        config.image_path.display()
    );

    let map = MapGeometry {
        resolution: config.resolution,
        origin: config.origin,
    };
    let mut monitor = Monitor::new(canvas, map, config.ratio);

    // SIGINT behaves like the quit key
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("failed to set signal handler: {}", e)))?;

    let (updates_tx, updates_rx) = mpsc::channel();
    let server = PoseServer::bind(&config.bind, updates_tx, Arc::clone(&running))?;
    let server_handle = server.spawn()?;

    run_loop(&mut monitor, &updates_rx, &running)?;

    // Stop the service threads before exiting
    running.store(false, Ordering::Relaxed);
    drop(updates_rx);
    if server_handle.join().is_err() {
        log::error!("pose server thread panicked");
    }

    log::info!("drishti-monitor stopped");
    Ok(())
}

/// Cooperative render loop: poll keys, advance the state machine, present
/// the selected buffer, then service pending pose updates.
fn run_loop(
    monitor: &mut Monitor,
    updates: &mpsc::Receiver<Pose>,
    running: &AtomicBool,
) -> Result<()> {
    let width = monitor.canvas().scaled().width() as usize;
    let height = monitor.canvas().scaled().height() as usize;

    let mut window = Window::new(
        WINDOW_TITLE,
        width,
        height,
        WindowOptions {
            resize: true,
            scale_mode: ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        },
    )?;
    window.set_target_fps(TARGET_FPS);

    while window.is_open() && running.load(Ordering::Relaxed) {
        for key in window.get_keys_pressed(KeyRepeat::No) {
            if let Some(cmd) = map_key(key) {
                monitor.handle_key(cmd);
            }
        }
        if monitor.mode() == ViewMode::Quit {
            break;
        }

        let buffer = monitor.display_buffer();
        let frame = canvas::argb_frame(buffer);
        window.update_with_buffer(&frame, buffer.width() as usize, buffer.height() as usize)?;

        // Service tick: apply poses reported since the last frame
        for pose in updates.try_iter() {
            monitor.ingest_pose(pose);
        }
    }

    Ok(())
}

fn map_key(key: Key) -> Option<KeyCommand> {
    match key {
        Key::C => Some(KeyCommand::ShowCurrent),
        Key::H => Some(KeyCommand::ShowHistory),
        Key::R => Some(KeyCommand::ResetHistory),
        Key::P => Some(KeyCommand::ZoomIn),
        Key::M => Some(KeyCommand::ZoomOut),
        Key::Q | Key::Escape => Some(KeyCommand::Quit),
        _ => None,
    }
}
