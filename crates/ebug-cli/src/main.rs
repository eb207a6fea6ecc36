//! `ebug` – E-Bug operator console.
//!
//! This binary boots the robot firmware against the simulated rig and hands
//! the terminal to the operator. It:
//!
//! 1. Loads `~/.ebug/config.toml`, writing the defaults on first run.
//! 2. Self-tests the sensors and calibrates the gyro while the robot is still.
//! 3. Starts the motion, sensing and supervisor loops.
//! 4. Streams telemetry frames to `telemetry_log` (or the debug log).
//! 5. Drops the operator into the **command REPL**.
//! 6. Intercepts **Ctrl-C** to queue a `STOP` and shut down safely.

mod config;
mod repl;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use ebug_hal::sim::SimRig;
use ebug_hal::{Clock, SystemClock};
use ebug_middleware::{TelemetryReceiver, encode_frame};
use ebug_runtime::telemetry::init_tracing;
use ebug_runtime::{Coordinator, RandomSource, RngSource, RobotParts};
use ebug_types::{Command, RobotError, TelemetryFrame};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

/// Radius of the simulated pen the robot drives around in, in cm.
const ARENA_RADIUS_CM: f32 = 150.0;
const ARENA_POSTS: usize = 16;
const GYRO_CALIBRATION_SAMPLES: usize = 50;

fn main() {
    let cfg = load_config();
    if let Err(e) = cfg.robot.validate() {
        eprintln!("{}: {}", "Config error".red(), e);
        std::process::exit(1);
    }

    // ── Structured logging ────────────────────────────────────────────────
    // The console output below still uses println! for UX consistency.
    let _tracing = init_tracing("ebug", cfg.log_format);

    print_banner();

    if let Err(e) = run(cfg) {
        error!(error = %e, "ebug exited with an error");
        eprintln!("{}: {}", "Fatal".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cfg: config::Config) -> Result<(), RobotError> {
    // ── Telemetry sink runtime ────────────────────────────────────────────
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("ebug-telemetry")
        .enable_all()
        .build()
        .map_err(|e| RobotError::Task(format!("failed to build telemetry runtime: {e}")))?;

    // ── Hardware ──────────────────────────────────────────────────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let hardware = SimRig::new(clock.clone())
        .with_motor_config(cfg.robot.motor.clone())
        .with_arena(ARENA_RADIUS_CM, ARENA_POSTS)
        .with_obstacle(40.0, 60.0, 12.0)
        .build();
    let random: Box<dyn RandomSource> = match cfg.rng_seed {
        Some(seed) => {
            info!(seed, "Maneuver randomness seeded");
            Box::new(RngSource::seeded(seed))
        }
        None => Box::new(RngSource::from_entropy()),
    };
    let parts = RobotParts::from_sim(&cfg.robot, hardware, clock, random)?;

    // ── Self-test ─────────────────────────────────────────────────────────
    print!("\n  Sensor self-test … ");
    let report = parts.sensors.self_test();
    if report.passed() {
        println!("{} (distance ahead {:.1} cm)", "ok".green(), report.distance_cm);
    } else {
        println!("{}", "degraded".yellow());
        if !report.rangefinder_ok {
            warn!("Rangefinder failed self-test, navigation will see the sentinel distance");
        }
        if !report.imu_ok {
            warn!("IMU failed self-test, heading will not integrate");
        }
    }
    match parts.sensors.calibrate_gyro(GYRO_CALIBRATION_SAMPLES) {
        Ok(offset) => println!("  Gyro calibrated (offset {:.2})", offset),
        Err(e) => warn!(error = %e, "Gyro calibration failed, using zero offset"),
    }

    // ── Control loops ─────────────────────────────────────────────────────
    let coordinator = Coordinator::start(&cfg.robot, parts)?;
    let session = repl::Session {
        intake: coordinator.intake(),
        status: coordinator.status().clone(),
        snapshots: coordinator.snapshots(),
    };

    runtime.spawn(telemetry_sink(coordinator.bus().subscribe(), cfg.telemetry_log.clone()));

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    let intake = coordinator.intake();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the robot …".yellow().bold());
        match intake.try_push(Command::stop()) {
            Ok(()) => println!("{}", "  ✓ STOP queued.".green()),
            Err(e) => println!("  {}: {}", "STOP not queued".red(), e),
        }
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(&session, shutdown);

    // Give the motion loop a cycle to act on the final STOP.
    std::thread::sleep(Duration::from_millis(50));
    let result = coordinator.shutdown();
    runtime.shutdown_timeout(Duration::from_secs(1));
    println!("{}", "  ✓ Exiting E-Bug.".green());
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

fn load_config() -> config::Config {
    match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Telemetry sink
// ─────────────────────────────────────────────────────────────────────────────

/// Drain the telemetry bus until it closes. Each frame becomes one JSON
/// line, stamped with the wall-clock time it was received.
async fn telemetry_sink(mut rx: TelemetryReceiver, path: Option<PathBuf>) {
    let mut file = match &path {
        Some(path) => match tokio::fs::OpenOptions::new().create(true).append(true).open(path).await {
            Ok(file) => {
                info!(path = %path.display(), "Writing telemetry");
                Some(file)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Telemetry log unavailable, frames go to the debug log");
                None
            }
        },
        None => None,
    };

    while let Some(frame) = rx.recv().await {
        let line = match log_line(&frame) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Telemetry frame not encoded");
                continue;
            }
        };
        match file.as_mut() {
            Some(f) => {
                let written = match f.write_all(line.as_bytes()).await {
                    Ok(()) => f.flush().await,
                    Err(e) => Err(e),
                };
                if let Err(e) = written {
                    warn!(error = %e, "Telemetry write failed, falling back to the debug log");
                    file = None;
                }
            }
            None => debug!(telemetry = %line.trim_end(), "frame"),
        }
    }
}

fn log_line(frame: &TelemetryFrame) -> Result<String, RobotError> {
    let encoded = encode_frame(frame)?;
    let frame: serde_json::Value =
        serde_json::from_str(&encoded).map_err(|e| RobotError::Serialization(e.to_string()))?;
    let line = serde_json::json!({
        "received_at": chrono::Utc::now().to_rfc3339(),
        "frame": frame,
    });
    Ok(format!("{line}\n"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   ______      ____              "#.bold().cyan());
    println!("{}", r#"  / ____/     / __ )__  ______ _ "#.bold().cyan());
    println!("{}", r#" / __/______ / __  / / / / __ `/ "#.bold().cyan());
    println!("{}", r#"/ /__/_____// /_/ / /_/ / /_/ /  "#.bold().cyan());
    println!("{}", r#"\____/     /_____/\__,_/\__, /   "#.bold().cyan());
    println!("{}", r#"                       /____/    "#.bold().cyan());
    println!();
    println!(
        "  {}  {}",
        "E-Bug".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  {}", "Autonomous obstacle-avoiding rover".dimmed());
    println!();
}
