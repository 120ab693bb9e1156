use std::time::Instant;

use battlink_frame::catalog::{MSG_CONFIG_SNAPSHOT, MSG_TELEMETRY};
use battlink_frame::{
    encode_query, ConfigSnapshot, ConfigWrite, Frame, FrameScanner, Telemetry, WriteAck,
    CMD_CONFIG_SNAPSHOT, CMD_TELEMETRY,
};
use battlink_transport::Transport;
use tracing::{debug, trace};

use crate::error::{ClientError, Result};
use crate::retry::RetryPolicy;

/// One controller-side connection to a peripheral.
///
/// State machine per exchange: transmit, poll the transport, feed chunks to
/// the scanner, and scan emitted frames for the expected message id. Frames
/// with other ids are logged and discarded — they never abort the wait. A
/// silent polling window re-issues the command, bounded by [`RetryPolicy`].
///
/// Every exchange holds `&mut self` from send to match, so a second
/// concurrent request on the same connection cannot be expressed.
pub struct Session<T> {
    transport: T,
    scanner: FrameScanner,
    policy: RetryPolicy,
}

impl<T: Transport> Session<T> {
    /// Create a session with the default retry policy.
    pub fn new(transport: T) -> Self {
        Self::with_policy(transport, RetryPolicy::default())
    }

    /// Create a session with an explicit retry policy.
    pub fn with_policy(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            scanner: FrameScanner::new(),
            policy,
        }
    }

    /// Request a telemetry report.
    pub fn read_telemetry(&mut self) -> Result<Telemetry> {
        let frame = self.exchange(&encode_query(CMD_TELEMETRY), MSG_TELEMETRY)?;
        Ok(Telemetry::decode(&frame)?)
    }

    /// Request a configuration snapshot.
    pub fn read_config(&mut self) -> Result<ConfigSnapshot> {
        let frame = self.exchange(&encode_query(CMD_CONFIG_SNAPSHOT), MSG_CONFIG_SNAPSHOT)?;
        Ok(ConfigSnapshot::decode(&frame)?)
    }

    /// Issue a configuration write and await its echo acknowledgement.
    ///
    /// The expected response id is the command code itself, including the
    /// name-set variant.
    pub fn write_config(&mut self, write: &ConfigWrite) -> Result<WriteAck> {
        let frame = self.exchange(&write.encode(), write.command())?;
        Ok(WriteAck::decode(&frame)?)
    }

    /// Parse and write a named configuration field in one step.
    pub fn set_field(&mut self, field_name: &str, value_text: &str) -> Result<WriteAck> {
        let write = ConfigWrite::parse(field_name, value_text)?;
        self.write_config(&write)
    }

    /// Core exchange loop: transmit, poll, match, retry.
    fn exchange(&mut self, wire: &[u8], expected: u8) -> Result<Frame> {
        for attempt in 1..=self.policy.max_attempts {
            debug!(command = format_args!("0x{expected:02X}"), attempt, "transmitting");
            self.transport.send(wire)?;

            let deadline = Instant::now() + self.policy.poll_window;
            loop {
                while let Some(frame) = self.scanner.next_frame() {
                    if frame.message_id == expected {
                        debug!(
                            command = format_args!("0x{expected:02X}"),
                            attempt,
                            skipped = self.scanner.skipped(),
                            "response matched"
                        );
                        return Ok(frame);
                    }
                    trace!(
                        id = frame.message_id,
                        "ignoring frame while awaiting response"
                    );
                }

                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                match self.transport.recv(deadline - now)? {
                    Some(chunk) => self.scanner.push(&chunk),
                    None => break,
                }
            }

            if attempt < self.policy.max_attempts {
                std::thread::sleep(self.policy.delay_after(attempt));
            }
        }

        Err(ClientError::RetriesExhausted {
            command: expected,
            attempts: self.policy.max_attempts,
        })
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    /// Consume the session and return the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }
}
