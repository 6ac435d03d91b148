mod logs;
mod shutdown;

use std::env;
use std::thread;

use anyhow::{Result, bail};
use tracing::{debug, info};
use ytvconfig::get_config;
use ytvcontrol::time_utils::format_clock_ms;
use ytvcontrol::{ControllerOptions, PlaybackController, RemoteControlConfig};

fn remote_control_config(config: &ytvconfig::Config) -> Result<RemoteControlConfig> {
    Ok(RemoteControlConfig {
        host: config.get_remote_host()?,
        port: config.get_remote_port()?,
        password: config.get_remote_password()?,
        path: config.get_remote_path()?,
        attempts: u32::try_from(config.get_remote_attempts()?).unwrap_or(u32::MAX),
        retry_delay: config.get_remote_retry_delay()?,
        timeout: config.get_remote_timeout()?,
    })
}

fn controller_options(config: &ytvconfig::Config) -> Result<ControllerOptions> {
    Ok(ControllerOptions {
        stop_grace: config.get_stop_grace()?,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let Some(url) = env::args().nth(1) else {
        eprintln!("usage: ytview <stream-url>");
        bail!("missing stream URL");
    };

    let config = get_config()?;
    logs::init_logging(&config)?;

    let controller = PlaybackController::for_current_platform(
        &remote_control_config(&config)?,
        controller_options(&config)?,
    );
    let mut shutdown = shutdown::ShutdownSignals::new()?;
    info!("🎵 Starting ytview on {}", controller.platform());

    let events = controller.subscribe();
    thread::Builder::new()
        .name("playback-events".to_string())
        .spawn(move || {
            for event in events.iter() {
                debug!(?event, "Playback event");
            }
        })?;

    let player = controller.clone();
    let target = url.clone();
    tokio::task::spawn_blocking(move || player.play(&target)).await??;
    info!(
        "▶️ Playing {} with {}",
        url,
        controller.backend_name().unwrap_or_default()
    );

    let mut ticker = tokio::time::interval(config.get_progress_interval()?);

    loop {
        tokio::select! {
            signal = shutdown.recv() => {
                info!(signal, "⏹️ Interrupted, stopping playback");
                break;
            }
            _ = ticker.tick() => {
                let probe = controller.clone();
                let (finished, snapshot) =
                    tokio::task::spawn_blocking(move || (probe.is_finished(), probe.snapshot())).await?;
                if finished {
                    info!("✅ Playback finished");
                    break;
                }
                info!(
                    elapsed = %format_clock_ms(snapshot.elapsed_ms),
                    "{}",
                    serde_json::to_string(&snapshot)?
                );
            }
        }
    }

    let stopper = controller.clone();
    tokio::task::spawn_blocking(move || stopper.cleanup()).await?;
    Ok(())
}
