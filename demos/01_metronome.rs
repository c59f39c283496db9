//! # 01 - Metronome
//!
//! Schedule a bar of clicks against the wall clock and print them as they
//! reach the sink.
//!
//! **Concepts:** Custom `Sink`, `send_after`, tempo changes, diagnostics
//!
//! ```bash
//! cargo run --example 01_metronome
//! ```

use std::time::Duration;
use tactus::prelude::*;

/// Prints every batch with the time it was written.
struct PrintSink {
    clock: MonotonicClock,
}

impl Sink for PrintSink {
    fn send(&mut self, batch: &[RawMessage]) -> std::result::Result<(), SinkError> {
        for message in batch {
            println!("{:>8.3}s  {:02X?}", self.clock.now(), message.as_bytes());
        }
        Ok(())
    }

    fn send_sysex(&mut self, message: &RawMessage) -> std::result::Result<(), SinkError> {
        println!("{:>8.3}s  sysex, {} bytes", self.clock.now(), message.len());
        Ok(())
    }
}

fn main() -> tactus::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Sink and scheduler must read the same clock
    let clock = MonotonicClock::new();
    let mut scheduler = Scheduler::builder()
        .bpm(120.0)
        .clock(std::sync::Arc::new(clock))
        .sink(PrintSink { clock })
        .build()?;
    scheduler.start()?;

    // One bar of quarter notes, accent on the downbeat
    let beat = 60.0 / scheduler.bpm();
    for i in 0..4 {
        let velocity = if i == 0 { 127 } else { 80 };
        let at = i as f64 * beat;
        scheduler.send_after(RawMessage::note_on(9, 37, velocity), at)?;
        scheduler.send_after(RawMessage::note_off(9, 37, 0), at + 0.05)?;
    }

    // Pending due times are absolute: this only changes the loop's tick rate
    scheduler.set_bpm(90.0)?;

    std::thread::sleep(Duration::from_secs_f64(4.0 * beat + 0.2));
    scheduler.stop_default()?;

    let diagnostics = scheduler.diagnostics();
    println!(
        "ticks: {}, dispatched: {}, jitter: {:?}",
        diagnostics.ticks(),
        diagnostics.dispatched(),
        diagnostics.last_jitter()
    );
    Ok(())
}
