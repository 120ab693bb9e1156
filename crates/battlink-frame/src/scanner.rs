use bytes::{Buf, BytesMut};
use tracing::trace;

use crate::codec::{decode_frame, Frame};
use crate::error::FrameError;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Recovers validated frames from a noisy, arbitrarily chunked byte stream.
///
/// Feed notification chunks with [`push`](Self::push) and drain frames with
/// [`next_frame`](Self::next_frame). Decoding is attempted at offset 0; a
/// corrupted or misaligned prefix is skipped exactly one byte at a time
/// until a valid magic + checksum combination lines up again. A trailing
/// partial frame is retained for the next chunk.
///
/// Pure over the currently available bytes — never blocks, and the offset
/// advances by at least one byte per failed decode attempt, so draining
/// always terminates.
#[derive(Debug, Default)]
pub struct FrameScanner {
    buf: BytesMut,
    skipped: u64,
}

impl FrameScanner {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            skipped: 0,
        }
    }

    /// Append a received chunk to the scan buffer.
    pub fn push(&mut self, chunk: &[u8]) {
        trace!(len = chunk.len(), data = %hex::encode(chunk), "chunk received");
        self.buf.extend_from_slice(chunk);
    }

    /// Yield the next validated frame, or `None` when the remaining bytes
    /// hold no complete frame.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            if self.buf.is_empty() {
                return None;
            }

            match decode_frame(&self.buf) {
                Ok((frame, consumed)) => {
                    self.buf.advance(consumed);
                    return Some(frame);
                }
                Err(FrameError::Truncated { .. }) => return None,
                Err(err) => {
                    trace!(reason = %err, "resync: skipping one byte");
                    self.buf.advance(1);
                    self.skipped += 1;
                }
            }
        }
    }

    /// Bytes skipped during resynchronization since construction.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Bytes currently retained waiting for a complete frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Telemetry, WriteAck, ACK_ECHO_FILLER};
    use crate::codec::checksum;

    fn sample_telemetry() -> Telemetry {
        Telemetry {
            device_address: 4,
            percentage: 90,
            capacity: 300.0,
            voltage: 720,
            current: 10.0,
            charge_energy: 2000,
            discharge_energy: 2000,
            temperature: 22.0,
            reserved: 33,
        }
    }

    #[test]
    fn yields_frame_from_clean_stream() {
        let mut scanner = FrameScanner::new();
        scanner.push(&sample_telemetry().encode());

        let frame = scanner.next_frame().expect("frame should decode");
        assert_eq!(frame.message_id, 1);
        assert!(scanner.next_frame().is_none());
        assert_eq!(scanner.skipped(), 0);
        assert_eq!(scanner.pending(), 0);
    }

    #[test]
    fn skips_leading_noise_one_byte_at_a_time() {
        let mut wire = vec![0x00, 0xDE, 0xAD, 0xBE];
        wire.extend_from_slice(&sample_telemetry().encode());

        let mut scanner = FrameScanner::new();
        scanner.push(&wire);

        let frame = scanner.next_frame().expect("frame after noise");
        assert_eq!(frame.message_id, 1);
        assert_eq!(scanner.skipped(), 4);
    }

    #[test]
    fn corrupted_checksum_resyncs_to_following_frame() {
        let mut first = sample_telemetry().encode().to_vec();
        let last = first.len() - 1;
        first[last] = first[last].wrapping_add(1);

        let second = WriteAck {
            device_address: 4,
            command: 0x06,
            echo: ACK_ECHO_FILLER,
        }
        .encode();

        let mut scanner = FrameScanner::new();
        scanner.push(&first);
        scanner.push(&second);

        let frame = scanner.next_frame().expect("second frame should survive");
        assert_eq!(frame.message_id, 0x06);
        // The whole corrupted frame was walked byte by byte.
        assert_eq!(scanner.skipped(), first.len() as u64);
    }

    #[test]
    fn partial_frame_is_retained_across_pushes() {
        let wire = sample_telemetry().encode();
        let (head, tail) = wire.split_at(8);

        let mut scanner = FrameScanner::new();
        scanner.push(head);
        assert!(scanner.next_frame().is_none());
        assert_eq!(scanner.pending(), head.len());

        scanner.push(tail);
        let frame = scanner.next_frame().expect("reassembled frame");
        assert_eq!(frame.message_id, 1);
    }

    #[test]
    fn drains_multiple_frames_from_one_chunk() {
        let mut wire = sample_telemetry().encode().to_vec();
        wire.extend_from_slice(
            &WriteAck {
                device_address: 4,
                command: 0x0B,
                echo: ACK_ECHO_FILLER,
            }
            .encode(),
        );

        let mut scanner = FrameScanner::new();
        scanner.push(&wire);

        assert_eq!(scanner.next_frame().unwrap().message_id, 1);
        assert_eq!(scanner.next_frame().unwrap().message_id, 0x0B);
        assert!(scanner.next_frame().is_none());
    }

    #[test]
    fn progress_is_monotonic_on_pathological_input() {
        // A long run of valid-magic prefixes that never checksum.
        let mut wire = Vec::new();
        for _ in 0..32 {
            wire.extend_from_slice(&[0xB5, 0x5B, 0x00, 0x01, 0x00]);
        }

        let mut scanner = FrameScanner::new();
        scanner.push(&wire);
        assert!(scanner.next_frame().is_none());
        // Everything consumed or retained: skipped + pending == pushed.
        assert_eq!(scanner.skipped() as usize + scanner.pending(), wire.len());
    }

    #[test]
    fn unknown_device_message_id_is_skipped() {
        // Device id 3 is absent from the catalog; the scanner must slide past.
        let mut junk = vec![0xB5, 0x5B, 0x04, 0x03, 0x00, 0x00, 0x00, 0x00, 0xA8];
        let crc = checksum(&junk);
        junk.push(crc);
        junk.extend_from_slice(&sample_telemetry().encode());

        let mut scanner = FrameScanner::new();
        scanner.push(&junk);

        let frame = scanner.next_frame().expect("telemetry should be found");
        assert_eq!(frame.message_id, 1);
    }
}
