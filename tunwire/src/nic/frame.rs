//! The framing of packets exchanged with a device.
//!
//! Depending on the platform and the flags a device was opened with, each read and write carries
//! either exactly one packet or one packet behind a small header. On Linux that header is
//! `struct tun_pi`: two bytes of flags in host byte order followed by the EtherType of the packet
//! in network byte order.
use byteorder::{ByteOrder, NativeEndian, NetworkEndian};

use crate::packet::Packet;
use crate::wire::{self, ethernet_frame, EthernetProtocol, IpVersion};
use crate::wire::ETHERNET_HEADER_LEN;
use super::{Error, Kind, RecvError};

/// The layout of a header preceding each packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Prefix {
    /// The total length of the header.
    pub len: usize,

    /// Offset of the 16-bit flags field, in host byte order.
    pub flags_offset: usize,

    /// Offset of the 16-bit EtherType, in network byte order.
    pub protocol_offset: usize,

    /// The flag set by the kernel when the packet did not fit the read buffer.
    pub truncated_flag: u16,
}

impl Prefix {
    /// The Linux packet information header, used unless a device is opened with `IFF_NO_PI`.
    pub const PACKET_INFO: Prefix = Prefix {
        len: 4,
        flags_offset: 0,
        protocol_offset: 2,
        // TUN_PKT_STRIP
        truncated_flag: 0x0001,
    };

    fn flags(&self, frame: &[u8]) -> u16 {
        NativeEndian::read_u16(&frame[self.flags_offset..self.flags_offset + 2])
    }

    fn protocol(&self, frame: &[u8]) -> EthernetProtocol {
        let raw = NetworkEndian::read_u16(&frame[self.protocol_offset..self.protocol_offset + 2]);
        EthernetProtocol::from(raw)
    }

    fn emit(&self, frame: &mut [u8], protocol: EthernetProtocol) {
        frame[..self.len].iter_mut().for_each(|byte| *byte = 0);
        NetworkEndian::write_u16(
            &mut frame[self.protocol_offset..self.protocol_offset + 2],
            protocol.into());
    }
}

/// How packets are framed on a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameShape {
    /// Every frame is exactly one packet.
    ///
    /// The protocol of a tun packet is then inferred from its IP version.
    Raw,

    /// Every frame starts with a header carrying flags and the protocol.
    Prefixed(Prefix),
}

/// What the header of a frame said about it.
struct Header {
    start: usize,
    protocol: Option<EthernetProtocol>,
    truncated: bool,
}

impl FrameShape {
    /// The number of bytes in front of each packet.
    pub fn prefix_len(&self) -> usize {
        match self {
            FrameShape::Raw => 0,
            FrameShape::Prefixed(prefix) => prefix.len,
        }
    }

    fn header(&self, frame: &[u8]) -> Result<Header, Error> {
        match self {
            FrameShape::Raw => Ok(Header {
                start: 0,
                protocol: None,
                truncated: false,
            }),
            FrameShape::Prefixed(prefix) => {
                if frame.len() <= prefix.len {
                    return Err(Error::ShortRead);
                }
                Ok(Header {
                    start: prefix.len,
                    protocol: Some(prefix.protocol(frame)),
                    truncated: prefix.flags(frame) & prefix.truncated_flag != 0,
                })
            },
        }
    }

    /// Turn the first `len` bytes of `buffer`, as read from a device, into a packet.
    ///
    /// The packet is validated against the lengths in its IP header and trimmed to the declared
    /// length. A packet that is shorter than declared, or that the kernel reported as cut short,
    /// is returned inside `RecvError::Truncated`. For a tun device anything but IPv4 and IPv6 is
    /// an error while a tap device also passes other frames, unvalidated.
    pub fn decode<T: AsRef<[u8]>>(&self, kind: Kind, buffer: T, len: usize)
        -> Result<Packet<T>, RecvError<T>>
    {
        let frame = buffer.as_ref();
        let len = len.min(frame.len());
        if len == 0 {
            return Err(Error::ShortRead.into());
        }

        let frame = &frame[..len];
        let header = self.header(frame)?;
        let body = &frame[header.start..];

        let (link_len, protocol, short) = match kind {
            Kind::Tun => {
                let protocol = match header.protocol {
                    Some(protocol) => protocol,
                    None => match IpVersion::of_packet(body)? {
                        IpVersion::Ipv4 => EthernetProtocol::Ipv4,
                        IpVersion::Ipv6 => EthernetProtocol::Ipv6,
                    },
                };
                (0, protocol, false)
            },
            Kind::Tap => match ethernet_frame::new_checked(body) {
                Ok(link) => (ETHERNET_HEADER_LEN, header.protocol.unwrap_or_else(|| link.ethertype()), false),
                Err(_) => (ETHERNET_HEADER_LEN, header.protocol.unwrap_or(EthernetProtocol::Unknown(0)), true),
            },
        };

        let mut packet = Packet::from_parts(buffer, header.start..len, link_len, protocol, header.truncated);
        if short {
            net_debug!("frame: {} byte frame lacks its link layer header", len);
            packet.set_truncated();
            return Err(RecvError::Truncated(packet));
        }

        if header.truncated {
            net_debug!("frame: kernel truncated {} packet", protocol);
            return Err(RecvError::Truncated(packet));
        }

        match packet.trim() {
            Ok(()) => Ok(packet),
            Err(wire::Error::NotIp) if kind == Kind::Tap => Ok(packet),
            Err(wire::Error::Truncated) => {
                net_debug!("frame: {} packet truncated at {} bytes", protocol, packet.body().len());
                Err(RecvError::Truncated(packet))
            },
            Err(err) => {
                net_debug!("frame: dropping {} frame, {}", protocol, err);
                Err(Error::Wire(err).into())
            },
        }
    }

    /// Prepare the frame to write for a packet.
    ///
    /// Without a prefix this is the body itself and `scratch` is untouched. Otherwise the header
    /// and the body are written into `scratch`, which must hold at least `prefix_len()` bytes
    /// more than the body.
    pub fn encode_into<'a, T: AsRef<[u8]>>(&self, packet: &'a Packet<T>, scratch: &'a mut [u8])
        -> &'a [u8]
    {
        match self {
            FrameShape::Raw => packet.body(),
            FrameShape::Prefixed(prefix) => {
                let body = packet.body();
                let len = prefix.len + body.len();
                let frame = &mut scratch[..len];
                prefix.emit(frame, packet.protocol());
                frame[prefix.len..].copy_from_slice(body);
                frame
            },
        }
    }
}

impl Default for FrameShape {
    fn default() -> Self {
        FrameShape::Raw
    }
}
