//! Packet framing and IP header classification for tun and tap devices.
//!
//! ## Table of contents
//!
//! 1. [Design](#design)
//! 2. [The wire module](wire/index.html)
//!    1. [Byte views](wire/index.html#byte-views)
//!    1. [Classification](wire/index.html#classification)
//! 3. [The packet model](packet/index.html)
//! 4. [Network interfaces](nic/index.html)
//!    1. [Frame shapes](nic/enum.FrameShape.html)
//!    1. [The buffer pool](nic/pool/index.html)
//!    1. [Loopback](nic/struct.Loopback.html)
//!
//! ## Design
//!
//! A tun device hands IP datagrams to user space, a tap device Ethernet frames. Getting hold of
//! such a device is platform specific plumbing that this library leaves to the caller. It starts
//! where that ends, at a file descriptor or any other [`Conduit`] that reads and writes one frame
//! at a time.
//!
//! Each frame read is decoded into a [`Packet`]: the platform prefix is stripped, the protocol
//! determined, and the IP header consulted to cut off trailing bytes or to report that the packet
//! is incomplete. Questions about the packet (addresses, traffic class, transport protocol,
//! fragment status, control message type) are answered from its bytes each time they are asked.
//! The IPv6 extension header chain is followed for that without allocating.
//!
//! Receive buffers come from a [`Pool`] that is handed to the interface explicitly and may be
//! shared between threads.
//!
//! ```
//! use tunwire::nic::{Config, Interface, Loopback};
//!
//! let mut loopback = Loopback::new();
//! loopback.push_frame(vec![
//!     0x45, 0x00, 0x00, 0x1c, 0x00, 0x00, 0x00, 0x00,
//!     0x40, 0x01, 0x00, 0x00, 0x0a, 0x00, 0x00, 0x01,
//!     0x0a, 0x00, 0x00, 0x02, 0x08, 0x00, 0xf7, 0xff,
//!     0x00, 0x00, 0x00, 0x00,
//! ]);
//!
//! let mut nic = Interface::new(loopback, Config::default());
//! let packet = nic.recv().expect("valid packet");
//! assert_eq!(packet.to_string(), "10.0.0.1 -> 10.0.0.2");
//! assert_eq!(packet.icmp_type(), (1, 8, 0));
//! ```
//!
//! [`Conduit`]: nic/trait.Conduit.html
//! [`Packet`]: packet/struct.Packet.html
//! [`Pool`]: nic/pool/struct.Pool.html
#![warn(missing_docs)]
#![warn(unreachable_pub)]

#[macro_use] mod macros;
pub mod nic;
pub mod packet;
pub mod wire;
