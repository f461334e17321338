use core::fmt;

use crate::wire::{Error, Result};
use super::{ipv4_packet, ipv6_packet};

/// Internet protocol version.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Version {
    /// Internet protocol version 4.
    Ipv4,
    /// Internet protocol version 6.
    Ipv6,
}

impl Version {
    /// Return the version of an IP packet stored in the provided buffer.
    ///
    /// Looks only at the first nibble. An empty buffer is `Err(Error::Truncated)`, any version
    /// other than 4 and 6 is `Err(Error::NotIp)`.
    pub fn of_packet(data: &[u8]) -> Result<Version> {
        match data.first().map(|byte| byte >> 4) {
            Some(4) => Ok(Version::Ipv4),
            Some(6) => Ok(Version::Ipv6),
            Some(_) => Err(Error::NotIp),
            None => Err(Error::Truncated),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Version::Ipv4 => write!(f, "IPv4"),
            Version::Ipv6 => write!(f, "IPv6"),
        }
    }
}

enum_with_unknown! {
    /// IP datagram encapsulated protocol.
    ///
    /// The IPv6 next header field shares this number space, extension headers included.
    pub doc enum Protocol(u8) {
        /// IPv6 hop-by-hop options
        HopByHop  = 0x00,
        /// Internet control message protocol
        Icmp      = 0x01,
        /// Internet group management protocol
        Igmp      = 0x02,
        /// Transmission control protocol
        Tcp       = 0x06,
        /// User datagram protocol
        Udp       = 0x11,
        /// IPv6 routing header
        Ipv6Route = 0x2b,
        /// IPv6 fragment header
        Ipv6Frag  = 0x2c,
        /// IP authentication header
        Ah        = 0x33,
        /// Internet control message protocol for IPv6
        Icmpv6    = 0x3a,
        /// IPv6 no next header
        Ipv6NoNxt = 0x3b,
        /// IPv6 destination options
        Ipv6Opts  = 0x3c,
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Protocol::HopByHop    => write!(f, "Hop-by-Hop"),
            Protocol::Icmp        => write!(f, "ICMP"),
            Protocol::Igmp        => write!(f, "IGMP"),
            Protocol::Tcp         => write!(f, "TCP"),
            Protocol::Udp         => write!(f, "UDP"),
            Protocol::Ipv6Route   => write!(f, "IPv6-Route"),
            Protocol::Ipv6Frag    => write!(f, "IPv6-Frag"),
            Protocol::Ah          => write!(f, "AH"),
            Protocol::Icmpv6      => write!(f, "ICMPv6"),
            Protocol::Ipv6NoNxt   => write!(f, "IPv6-NoNxt"),
            Protocol::Ipv6Opts    => write!(f, "IPv6-Opts"),
            Protocol::Unknown(id) => write!(f, "0x{:02x}", id)
        }
    }
}

/// Where the transport layer of a packet begins.
///
/// The result of classifying an IP header. It is recomputed from the packet bytes on every query
/// and never stored alongside the packet.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub struct Transport {
    /// The protocol of the payload following all IP (extension) headers.
    ///
    /// For an IPv6 chain ending in 'no next header' this is `Protocol::Ipv6NoNxt`.
    pub protocol: Protocol,

    /// Octet offset of the transport payload, from the start of the IP header.
    ///
    /// Equals the packet length when there is no transport payload at all.
    pub payload_offset: usize,

    /// Whether the packet is part of a fragmented datagram.
    ///
    /// Set when the fragment offset is nonzero or more fragments follow. For such packets the
    /// bytes at `payload_offset` need not be a transport header.
    pub fragment: bool,
}

impl Transport {
    /// Query whether the packet carries no transport payload.
    ///
    /// A fragment naming 'no next header' still carries payload of the datagram.
    pub fn is_empty(&self) -> bool {
        self.protocol == Protocol::Ipv6NoNxt && !self.fragment
    }

    /// Flatten into `(protocol, payload_offset, fragment)`.
    ///
    /// 'No next header' outside of a fragment is reported as protocol `0` at the end of the
    /// packet, every error as `(0, 0, false)`. Note that protocol `0` is then ambiguous with a hop-by-hop header.
    pub fn sentinel(result: Result<Transport>, packet_len: usize) -> (u8, usize, bool) {
        match result {
            Ok(transport) if transport.is_empty() => (0, packet_len, false),
            Ok(transport) => (transport.protocol.into(), transport.payload_offset, transport.fragment),
            Err(_) => (0, 0, false),
        }
    }
}

/// Determine the transport protocol of an IP packet.
///
/// Dispatches on the version nibble. The IPv4 header is read directly while for IPv6 the whole
/// extension header chain is walked.
pub fn transport(data: &[u8]) -> Result<Transport> {
    match Version::of_packet(data)? {
        Version::Ipv4 => ipv4_packet::new_checked_header(data)?.transport(),
        Version::Ipv6 => ipv6_packet::new_checked_header(data)?.transport(),
    }
}
