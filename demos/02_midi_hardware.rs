//! # 02 - MIDI Hardware
//!
//! Play a short phrase on the first hardware MIDI output port.
//!
//! **Concepts:** Port enumeration, `sink_opener`, restartable worker
//!
//! ```bash
//! cargo run --example 02_midi_hardware --features midi-io
//! ```

use std::time::Duration;
use tactus::prelude::*;

fn main() -> tactus::Result<()> {
    tracing_subscriber::fmt::init();

    let ports = MidirSink::port_names();
    println!("MIDI output ports:");
    if ports.is_empty() {
        println!("  (none found - connect a device or start a software synth)");
        return Ok(());
    }
    for (index, name) in ports.iter().enumerate() {
        println!("  [{index}] {name}");
    }

    // The port is opened inside the worker on every start
    let mut scheduler = Scheduler::builder()
        .silence_policy(SilencePolicy::Panic)
        .sink_opener(|| Ok(Box::new(MidirSink::open(0, "tactus")?) as Box<dyn Sink>))
        .build()?;

    for pass in 0..2 {
        println!("\nPass {}", pass + 1);
        scheduler.start()?;
        for (i, note) in [60u8, 64, 67, 72].into_iter().enumerate() {
            let at = i as f64 * 0.25;
            scheduler.send_after(RawMessage::note_on(0, note, 100), at)?;
            scheduler.send_after(RawMessage::note_off(0, note, 0), at + 0.2)?;
        }
        std::thread::sleep(Duration::from_millis(1200));
        scheduler.stop(Duration::from_secs(2))?;
    }

    println!("Done.");
    Ok(())
}
