//! Exchanging packets with a tun or tap device.
//!
//! The device itself is opened and configured elsewhere. What remains is a [`Conduit`], a duplex
//! channel where each read and each write transfers one frame. An [`Interface`] composes a
//! conduit with the [`FrameShape`] of its platform and a buffer [`Pool`] into packet io.
//!
//! [`Conduit`]: trait.Conduit.html
//! [`Interface`]: struct.Interface.html
//! [`FrameShape`]: enum.FrameShape.html
//! [`Pool`]: pool/struct.Pool.html
use core::fmt;
use std::io;

use crate::packet::Packet;
use crate::wire;

mod frame;
pub mod loopback;
pub mod pool;

#[cfg(all(unix, feature = "sys"))]
pub mod sys;

#[cfg(test)]
mod tests;

pub use self::frame::{FrameShape, Prefix};
pub use self::loopback::Loopback;
pub use self::pool::{Buffer, Pool};

/// The largest body accepted for sending.
///
/// Larger packets are refused before the device is touched, real links hardly ever carry more
/// than 1500 bytes.
pub const MAX_PACKET_LEN: usize = 1600;

/// A duplex channel to the device, transferring whole frames.
pub trait Conduit {
    /// Read one frame into `buffer`, returning its length.
    ///
    /// A frame larger than the buffer may be cut short silently or reported through a flag in
    /// its prefix, depending on the platform.
    fn recv(&mut self, buffer: &mut [u8]) -> io::Result<usize>;

    /// Write one frame, returning how many bytes the device took.
    fn send(&mut self, frame: &[u8]) -> io::Result<usize>;
}

impl<C: Conduit + ?Sized> Conduit for &'_ mut C {
    fn recv(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        (**self).recv(buffer)
    }

    fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        (**self).send(frame)
    }
}

/// The layer of the packets on a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Packets are IP datagrams.
    Tun,
    /// Packets are Ethernet frames.
    Tap,
}

/// The static description of a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Config {
    /// The layer of packets.
    pub kind: Kind,
    /// How packets are framed.
    pub shape: FrameShape,
    /// The largest body accepted for sending.
    pub max_packet: usize,
    /// How many buffers the pool of a new interface keeps for reuse.
    pub pool_idle: usize,
}

impl Config {
    /// Set the kind of device.
    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the framing of the device.
    pub fn shape(mut self, shape: FrameShape) -> Self {
        self.shape = shape;
        self
    }

    /// Set the largest body accepted for sending.
    pub fn max_packet(mut self, max_packet: usize) -> Self {
        self.max_packet = max_packet;
        self
    }

    /// Set the number of idle buffers kept for reuse.
    pub fn pool_idle(mut self, pool_idle: usize) -> Self {
        self.pool_idle = pool_idle;
        self
    }

    /// The size of a buffer holding any frame up to the largest packet.
    pub fn buffer_size(&self) -> usize {
        self.max_packet + self.shape.prefix_len()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            kind: Kind::Tun,
            shape: FrameShape::Raw,
            max_packet: MAX_PACKET_LEN,
            pool_idle: pool::DEFAULT_MAX_IDLE,
        }
    }
}

/// Errors of packet io.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The device returned an empty frame.
    #[error("truncated device read")]
    ShortRead,

    /// The packet is too large to be sent.
    #[error("packet of {len} bytes exceeds the limit of {max} bytes")]
    JumboPacket {
        /// The length of the refused body.
        len: usize,
        /// The largest accepted body.
        max: usize,
    },

    /// The device accepted only part of a frame.
    #[error("short write of {written} out of {expected} bytes")]
    ShortWrite {
        /// Bytes taken by the device.
        written: usize,
        /// Length of the frame.
        expected: usize,
    },

    /// The frame is not a valid packet.
    #[error(transparent)]
    Wire(#[from] wire::Error),

    /// The device reported an error.
    #[error("device io error: {0}")]
    Io(#[from] io::Error),
}

/// Errors of receiving a packet.
///
/// A truncated packet is still handed out, for inspection or logging.
#[derive(Debug)]
pub enum RecvError<T> {
    /// The packet is shorter than its headers declare, or the kernel cut it short.
    Truncated(Packet<T>),
    /// No packet could be made from the frame.
    Other(Error),
}

impl<T> RecvError<T> {
    /// The truncated packet, if any.
    pub fn packet(&self) -> Option<&Packet<T>> {
        match self {
            RecvError::Truncated(packet) => Some(packet),
            RecvError::Other(_) => None,
        }
    }

    /// Take the truncated packet, if any.
    pub fn into_packet(self) -> Option<Packet<T>> {
        match self {
            RecvError::Truncated(packet) => Some(packet),
            RecvError::Other(_) => None,
        }
    }
}

impl<T> From<Error> for RecvError<T> {
    fn from(err: Error) -> Self {
        RecvError::Other(err)
    }
}

impl<T> From<wire::Error> for RecvError<T> {
    fn from(err: wire::Error) -> Self {
        RecvError::Other(Error::Wire(err))
    }
}

impl<T> From<io::Error> for RecvError<T> {
    fn from(err: io::Error) -> Self {
        RecvError::Other(Error::Io(err))
    }
}

impl<T> fmt::Display for RecvError<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecvError::Truncated(_) => write!(f, "{}", wire::Error::Truncated),
            RecvError::Other(err) => write!(f, "{}", err),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for RecvError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecvError::Truncated(_) => None,
            RecvError::Other(err) => Some(err),
        }
    }
}

/// A device with its framing and buffers.
///
/// Calls are synchronous, any blocking happens inside the conduit.
#[derive(Debug)]
pub struct Interface<C> {
    conduit: C,
    config: Config,
    pool: Pool,
}

impl<C: Conduit> Interface<C> {
    /// Wrap a conduit, with a new pool sized for the configuration.
    pub fn new(conduit: C, config: Config) -> Self {
        let pool = Pool::new(config.buffer_size(), config.pool_idle);
        Self::with_pool(conduit, config, pool)
    }

    /// Wrap a conduit, drawing buffers from an existing pool.
    ///
    /// The pool may be shared with other interfaces. If its buffers are smaller than
    /// `config.buffer_size()` then larger packets are refused for sending and read cut short.
    pub fn with_pool(conduit: C, config: Config, pool: Pool) -> Self {
        Interface { conduit, config, pool }
    }

    /// The configuration of the device.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The pool buffers are drawn from.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// A reference to the conduit.
    pub fn conduit(&self) -> &C {
        &self.conduit
    }

    /// A mutable reference to the conduit.
    pub fn conduit_mut(&mut self) -> &mut C {
        &mut self.conduit
    }

    /// Unwrap the conduit.
    pub fn into_inner(self) -> C {
        self.conduit
    }

    /// The largest body that can currently be sent.
    pub fn max_packet(&self) -> usize {
        let room = self.pool.buffer_size().saturating_sub(self.config.shape.prefix_len());
        match self.config.shape {
            FrameShape::Raw => self.config.max_packet,
            FrameShape::Prefixed(_) => self.config.max_packet.min(room),
        }
    }

    /// Receive one packet into a buffer of the pool.
    ///
    /// The buffer returns to the pool when the packet, or the error holding it, is dropped.
    pub fn recv(&mut self) -> Result<Packet<Buffer>, RecvError<Buffer>> {
        let mut buffer = self.pool.acquire();
        let len = self.conduit.recv(&mut buffer)?;
        let packet = self.config.shape.decode(self.config.kind, buffer, len)?;
        net_trace!("recv: {}", packet);
        Ok(packet)
    }

    /// Receive one packet into a buffer of the caller.
    pub fn recv_into<'a>(&mut self, buffer: &'a mut [u8])
        -> Result<Packet<&'a [u8]>, RecvError<&'a [u8]>>
    {
        let len = self.conduit.recv(buffer)?;
        let packet = self.config.shape.decode(self.config.kind, &*buffer, len)?;
        net_trace!("recv: {}", packet);
        Ok(packet)
    }

    /// Send one packet.
    ///
    /// Bodies larger than the limit are refused without writing anything. A write that the
    /// device takes only in part is reported and not retried.
    pub fn send<T: AsRef<[u8]>>(&mut self, packet: &Packet<T>) -> Result<(), Error> {
        let len = packet.body().len();
        let max = self.max_packet();
        if len > max {
            net_debug!("send: refusing packet of {} bytes", len);
            return Err(Error::JumboPacket { len, max });
        }

        let mut scratch = match self.config.shape {
            FrameShape::Raw => None,
            FrameShape::Prefixed(_) => Some(self.pool.acquire()),
        };

        let scratch = match scratch.as_mut() {
            Some(buffer) => &mut buffer[..],
            None => Default::default(),
        };

        let frame = self.config.shape.encode_into(packet, scratch);
        let expected = frame.len();
        let written = self.conduit.send(frame)?;
        if written != expected {
            net_debug!("send: device took {} of {} bytes", written, expected);
            return Err(Error::ShortWrite { written, expected });
        }

        net_trace!("send: {}", packet);
        Ok(())
    }
}
