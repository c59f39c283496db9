//! [`Sink`] over a midir output connection.

use crate::sink::{Sink, SinkError};
use midir::{MidiOutput, MidiOutputConnection};
use tactus_midi::RawMessage;
use tracing::debug;

pub struct MidirSink {
    connection: Option<MidiOutputConnection>,
    port_name: String,
}

impl From<midir::InitError> for SinkError {
    fn from(e: midir::InitError) -> Self {
        SinkError::Open(e.to_string())
    }
}

impl From<midir::ConnectError<MidiOutput>> for SinkError {
    fn from(e: midir::ConnectError<MidiOutput>) -> Self {
        SinkError::Open(e.to_string())
    }
}

impl From<midir::SendError> for SinkError {
    fn from(e: midir::SendError) -> Self {
        SinkError::Write(e.to_string())
    }
}

impl MidirSink {
    /// Names of the available output ports, in index order.
    pub fn port_names() -> Vec<String> {
        let Ok(midi_output) = MidiOutput::new("tactus-port-list") else {
            return Vec::new();
        };
        midi_output
            .ports()
            .iter()
            .enumerate()
            .map(|(index, port)| {
                midi_output
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index))
            })
            .collect()
    }

    pub fn open(port_index: usize, client_name: &str) -> Result<Self, SinkError> {
        let midi_output = MidiOutput::new(client_name)?;
        let ports = midi_output.ports();
        let port = ports.get(port_index).ok_or_else(|| {
            SinkError::Open(format!("MIDI output port {} not found", port_index))
        })?;

        let port_name = midi_output
            .port_name(port)
            .unwrap_or_else(|_| format!("Device {}", port_index));
        let connection = midi_output.connect(port, "tactus-output")?;
        debug!(port = %port_name, "opened MIDI output");

        Ok(Self {
            connection: Some(connection),
            port_name,
        })
    }

    /// Opens the first port whose name contains `name`, case-insensitively.
    pub fn open_by_name(name: &str, client_name: &str) -> Result<Self, SinkError> {
        let needle = name.to_lowercase();
        let index = Self::port_names()
            .iter()
            .position(|port| port.to_lowercase().contains(&needle))
            .ok_or_else(|| {
                SinkError::Open(format!("no MIDI output port matching '{}'", name))
            })?;
        Self::open(index, client_name)
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn connection(&mut self) -> Result<&mut MidiOutputConnection, SinkError> {
        self.connection.as_mut().ok_or(SinkError::Closed)
    }
}

impl Sink for MidirSink {
    fn send(&mut self, batch: &[RawMessage]) -> Result<(), SinkError> {
        let connection = self.connection()?;
        for message in batch {
            connection.send(message.as_bytes())?;
        }
        Ok(())
    }

    fn send_sysex(&mut self, message: &RawMessage) -> Result<(), SinkError> {
        self.connection()?.send(message.as_bytes())?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if let Some(connection) = self.connection.take() {
            connection.close();
            debug!(port = %self.port_name, "closed MIDI output");
        }
        Ok(())
    }
}

impl Drop for MidirSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
