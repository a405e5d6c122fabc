//! padsense demo
//!
//! Drives a scripted mock controller through the router at animation-frame
//! cadence and logs the semantic events it produces. No real hardware is
//! touched; the mock host stands in for the platform binding.
//!
//! Run with `RUST_LOG=debug` to see tracker decisions as well.

use log::info;
use padsense::{callback, Config, ControlEvent, MockHost, RawDeviceState, SemanticEventRouter};
use std::time::Duration;

const DEVICE_ID: &str = "Axis T8311 (Vendor: 0a12 Product: 3f11)";
const FRAME: Duration = Duration::from_millis(16);
const TOTAL_FRAMES: u32 = 240;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::load_default() {
        Ok(config) => config,
        Err(e) => {
            info!("Using built-in configuration ({})", e);
            Config::default()
        }
    };

    let host = MockHost::new();
    let mut router = SemanticEventRouter::from_config(host.clone(), &config)?;

    for name in ["left", "right", "up", "down", "zoom-in", "zoom-out"] {
        router.on(name, callback(move |e: &ControlEvent| {
            if let ControlEvent::Axis { value, device_id, .. } = e {
                info!("{:>9} {:+.2} from {}", name, value, device_id);
            }
            Ok(())
        }));
    }
    for name in ["J1", "J2", "J3", "J4", "L", "R"] {
        router.on(name, callback(move |e: &ControlEvent| {
            if let ControlEvent::Button { device_id, .. } = e {
                info!("{:>9} pressed on {}", name, device_id);
            }
            Ok(())
        }));
    }
    router.on("device-connected", callback(|e: &ControlEvent| {
        if let ControlEvent::Device(d) = e {
            info!("Connected: {} ({} axes, {} buttons)", d.id, d.axes.len(), d.buttons.len());
        }
        Ok(())
    }));
    router.on("device-disconnected", callback(|e: &ControlEvent| {
        if let ControlEvent::Device(d) = e {
            info!("Disconnected: {}", d.id);
        }
        Ok(())
    }));

    router.start(config.settings.continuous_default);

    let pad = RawDeviceState::new(DEVICE_ID, 3, 6);
    host.plug(pad.clone());
    router.device_connected(pad.clone())?;

    let mut ticker = tokio::time::interval(FRAME);
    for frame in 0..TOTAL_FRAMES {
        ticker.tick().await;
        host.advance(FRAME);
        script(&host, frame);

        if frame == TOTAL_FRAMES / 2 {
            info!("Switching to discrete mode");
            router.set_update_mode(false, Some(DEVICE_ID));
        }

        if let Some(handle) = host.take_frame() {
            router.frame(handle)?;
        }
    }

    host.unplug(DEVICE_ID);
    router.device_disconnected(pad)?;
    info!("Polling after disconnect: {}", router.is_polling());

    Ok(())
}

/// Sweep the stick left to right and tap a few buttons
fn script(host: &MockHost, frame: u32) {
    let phase = (frame % 120) as f32 / 120.0;
    let x = (phase * std::f32::consts::TAU).sin();
    host.set_axis(DEVICE_ID, 0, x);

    if frame % 60 == 0 {
        host.set_button(DEVICE_ID, 0, true);
    } else if frame % 60 == 2 {
        host.set_button(DEVICE_ID, 0, false);
    }

    if frame % 90 == 45 {
        host.set_axis(DEVICE_ID, 2, 0.8);
    } else if frame % 90 == 50 {
        host.set_axis(DEVICE_ID, 2, 0.0);
    }
}
