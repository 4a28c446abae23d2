use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use gnsscfg::{spawn_receiver, Catalog, PortSettings, ReceiveMonitor, TransportDriver};
use log::{info, warn};

use crate::run::{finish, send_all, OfflineLink};

mod cli;
mod plan;
mod run;

/// Chunks queued between the receive thread and the logger
const RX_QUEUE_CHUNKS: usize = 32;
/// Read deadline of the receive handle, so the receive loop can see the stop flag
const RX_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// How long replies are still collected after the last command
const RX_LINGER: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    let command = cli::CommandBuilder::default()
        .build()
        .about(clap::crate_description!())
        .version(clap::crate_version!());
    let settings = cli::Settings::from_matches(&command.get_matches())?;

    env_logger::Builder::new()
        .filter_level(settings.log_level())
        .parse_default_env()
        .init();

    if settings.list {
        let catalog = if settings.selection.is_empty() {
            Catalog::standard()?
        } else {
            plan::build_plan(&settings.selection)?
        };
        let summaries: Vec<_> = catalog.summaries().collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    let plan = plan::build_plan(&settings.selection).context("Could not build the command plan")?;

    if settings.dry_run {
        info!("TESTRUN ONLY!");
        if settings.monitor {
            warn!("--monitor has no effect in a dry run");
        }
        let mut driver = TransportDriver::open(OfflineLink, PortSettings::new(settings.baud))?;
        return finish(send_all(&mut driver, &plan, &settings), plan.len());
    }

    let port_name = settings
        .port
        .as_deref()
        .context("Expected a serial port")?;
    let port = serialport::new(port_name, settings.baud)
        .timeout(RX_POLL_INTERVAL)
        .open()
        .with_context(|| format!("Failed to open port: {}", port_name))?;
    // The receive side gets its own handle
    let rx_port = port.try_clone().context("Failed to clone serial port")?;

    let (callback, log) = ReceiveMonitor::new(RX_QUEUE_CHUNKS, settings.rx_buffer);
    let logger = log.spawn_logger();
    let stop = Arc::new(AtomicBool::new(false));
    let receiver = spawn_receiver(callback, rx_port, stop.clone());

    let mut driver = TransportDriver::open(port, PortSettings::new(settings.baud))?;
    info!("Opened {} at {} baud", port_name, settings.baud);
    let failed = send_all(&mut driver, &plan, &settings);

    if settings.monitor {
        info!("Monitoring receiver output, press Ctrl-C to exit");
    } else {
        thread::sleep(RX_LINGER);
        stop.store(true, Ordering::Relaxed);
    }
    match receiver.join() {
        Ok(Ok(stats)) => info!(
            "Received {} bytes, {} chunks dropped",
            stats.received, stats.dropped
        ),
        Ok(Err(e)) => warn!("Receive loop stopped: {}", e),
        Err(_) => return Err(anyhow!("Receive thread panicked")),
    }
    logger
        .join()
        .map_err(|_| anyhow!("Logger thread panicked"))?;

    finish(failed, plan.len())
}
