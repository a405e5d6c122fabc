//! Two controllers on a mock host
//!
//! Plugs two scripted pads into a mock host, flips one of them into
//! discrete mode and prints every semantic event the router emits.
//! Nothing touches real hardware.

use padsense::{callback, Config, ControlEvent, MockHost, RawDeviceState, SemanticEventRouter};
use std::error::Error;
use std::thread;
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    println!("=== padsense: two pads on a mock host ===");
    println!();

    let config = match Config::load_default() {
        Ok(cfg) => {
            println!("✓ Loaded configuration from configs/default.toml");
            cfg
        }
        Err(e) => {
            println!("✗ {} (using built-in configuration)", e);
            Config::default()
        }
    };

    let host = MockHost::new();
    let mut router = SemanticEventRouter::from_config(host.clone(), &config)?;

    let names = ["J1", "J2", "J3", "J4", "L", "R", "left", "right", "up", "down", "zoom-in", "zoom-out"];
    for name in names {
        router.on(name, callback(move |e: &ControlEvent| {
            match e {
                ControlEvent::Axis { value, device_id, .. } => println!("  {:<8} {:+.2}  [{}]", name, value, device_id),
                ControlEvent::Button { device_id, .. } => println!("  {:<8} held   [{}]", name, device_id),
                ControlEvent::Custom(payload) => println!("  {:<8} custom {}", name, payload),
                ControlEvent::Device(_) => {}
            }
            Ok(())
        }));
    }
    for name in ["device-connected", "device-disconnected"] {
        router.on(name, callback(move |e: &ControlEvent| {
            if let ControlEvent::Device(d) = e {
                println!("* {} {}", name, d.id);
            }
            Ok(())
        }));
    }

    router.start(true);

    let left = RawDeviceState::new("pad-left", 3, 6);
    let right = RawDeviceState::new("pad-right", 3, 6);
    host.plug(left.clone());
    host.plug(right.clone());
    router.device_connected(left)?;
    router.device_connected(right)?;

    println!();
    println!("pad-right switches to discrete mode");
    router.set_update_mode(false, Some("pad-right"));

    for frame in 0..60u32 {
        thread::sleep(FRAME);
        host.advance(FRAME);

        let x = if frame < 30 { -0.6 } else { 0.6 };
        host.set_axis("pad-left", 0, x);
        host.set_axis("pad-right", 1, -x);
        host.set_button("pad-left", 4, frame % 20 == 0);

        if let Some(handle) = host.take_frame() {
            router.frame(handle)?;
        }
    }

    println!();
    router.trigger("left", &ControlEvent::Custom(serde_json::json!({ "source": "demo" })));

    for id in ["pad-left", "pad-right"] {
        if let Some(pad) = host.unplug(id) {
            router.device_disconnected(pad)?;
        }
    }
    println!("Polling after both pads left: {}", router.is_polling());

    Ok(())
}
