use std::{io::ErrorKind, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::MissedTickBehavior,
};
use tracing::{info, warn};

use relaystat_common::{Controller, ControllerConfig, Peripherals, Pin, SharedState, TickScheduler};

use crate::sim::{Board, FileStorage, GridDisplay, SimIo, SimSensor, ThreadDelay};

/// Loop iterations a typed button command keeps the button held.
const DEFAULT_HOLD_ITERATIONS: u32 = 1;

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let data_dir = std::env::var("THERMOSTAT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./.thermostat"));
    let config = load_config(&data_dir.join("config.json")).unwrap_or_else(|err| {
        warn!("failed to load controller config: {err:#}");
        ControllerConfig::default()
    });

    let ambient_c = std::env::var("THERMOSTAT_AMBIENT_C")
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(18.0);

    let shared = Arc::new(SharedState::new());
    let scheduler = TickScheduler::new(shared.clone(), config.sensor_interval_ticks);
    let board = Board::new();

    let mut controller = Controller::new(
        config.clone(),
        shared,
        Peripherals {
            sensor: SimSensor::new(board.clone(), ambient_c),
            display: GridDisplay::new(),
            storage: FileStorage::new(data_dir.join("eeprom.bin")),
            io: SimIo::new(board.clone()),
        },
    );

    tokio::task::block_in_place(|| controller.startup(&mut ThreadDelay));

    spawn_tick(scheduler.clone(), config.fast_tick_ms, TickScheduler::on_fast_tick);
    spawn_tick(scheduler, config.slow_tick_ms, TickScheduler::on_slow_tick);
    spawn_button_input(board);

    info!(
        "controller running (ambient {ambient_c:.1}); type u/d/w [n] to press up/down/wake"
    );

    let mut interval = tokio::time::interval(Duration::from_millis(config.loop_delay_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => controller.iterate(),
            result = &mut shutdown => {
                result.context("failed to listen for ctrl-c")?;
                break;
            }
        }
    }

    let shared = controller.shared();
    info!(
        "shutting down after {}s uptime, {} fast ticks",
        shared.uptime(),
        shared.heartbeats()
    );
    controller.shutdown();
    Ok(())
}

fn load_config(path: &std::path::Path) -> anyhow::Result<ControllerConfig> {
    match std::fs::read(path) {
        Ok(raw) => ControllerConfig::from_json(&raw)
            .with_context(|| format!("invalid config at {}", path.display())),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(ControllerConfig::default()),
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}

/// Periodic timer standing in for a hardware overflow interrupt.
fn spawn_tick(scheduler: TickScheduler, period_ms: u64, handler: fn(&TickScheduler)) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(period_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        // The first tick completes immediately; hardware fires only after a full period.
        interval.tick().await;
        loop {
            interval.tick().await;
            handler(&scheduler);
        }
    });
}

fn spawn_button_input(board: Arc<Board>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_button_command(&line) {
                    Some((pin, iterations)) => board.hold(pin, iterations),
                    None => warn!("unknown command {line:?}"),
                },
                Ok(None) => break,
                Err(err) => {
                    warn!("stdin read error: {err}");
                    break;
                }
            }
        }
    });
}

fn parse_button_command(line: &str) -> Option<(Pin, u32)> {
    let mut parts = line.split_whitespace();
    let pin = match parts.next()?.to_ascii_lowercase().as_str() {
        "u" | "up" | "+" => Pin::ButtonUp,
        "d" | "down" | "-" => Pin::ButtonDown,
        "w" | "wake" => Pin::ButtonWake,
        _ => return None,
    };
    let iterations = match parts.next() {
        Some(count) => count.parse::<u32>().ok().filter(|count| *count > 0)?,
        None => DEFAULT_HOLD_ITERATIONS,
    };
    Some((pin, iterations))
}
