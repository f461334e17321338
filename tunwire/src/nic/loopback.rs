//! Implementation of an in-memory device.
use std::collections::VecDeque;
use std::io;

use super::Conduit;

/// A software device holding frames in memory.
///
/// Frames pushed are received in order, frames sent are recorded. When no frame is queued a
/// receive returns an empty read, as a device does after it went away.
#[derive(Clone, Debug, Default)]
pub struct Loopback {
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    write_limit: Option<usize>,
    writes: usize,
}

impl Loopback {
    /// Create a device with nothing queued.
    pub fn new() -> Self {
        Loopback::default()
    }

    /// Queue a frame to be received.
    pub fn push_frame(&mut self, frame: impl Into<Vec<u8>>) {
        self.inbound.push_back(frame.into());
    }

    /// The number of frames waiting to be received.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// The frames written so far, in order.
    ///
    /// A frame taken only in part is recorded as far as it was taken.
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Take only up to `limit` bytes of each following write.
    pub fn limit_writes(&mut self, limit: Option<usize>) {
        self.write_limit = limit;
    }

    /// The number of write calls so far, including partial ones.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Conduit for Loopback {
    fn recv(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let frame = match self.inbound.pop_front() {
            Some(frame) => frame,
            None => return Ok(0),
        };

        // Excess bytes are lost, as with a datagram socket.
        let len = frame.len().min(buffer.len());
        buffer[..len].copy_from_slice(&frame[..len]);
        Ok(len)
    }

    fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        let len = match self.write_limit {
            Some(limit) => frame.len().min(limit),
            None => frame.len(),
        };
        self.sent.push(frame[..len].to_vec());
        Ok(len)
    }
}
