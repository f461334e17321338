//! The packet model.
//!
//! A [`Packet`] is one network layer packet read from or written to a device, together with the
//! protocol tag it travels under. For a tun device the body is the IP datagram, for a tap device
//! it is the whole Ethernet frame. All questions about the IP header are answered by reading the
//! body again on each call, nothing is cached.
//!
//! [`Packet`]: struct.Packet.html
use core::{fmt, ops};
use std::net::IpAddr;

use crate::wire::{self, ipv4_packet, ipv6_packet, ethernet_frame};
use crate::wire::{EthernetProtocol, Icmp, IpVersion, Transport};
use crate::wire::ETHERNET_HEADER_LEN;

/// A single packet with its protocol tag.
///
/// The packet owns or borrows its buffer `T` and refers to a range of it as the body. Packets
/// produced by a receive have been validated: the body was trimmed to the length declared in
/// the IP header, or the packet was reported as truncated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet<T> {
    buffer: T,
    body: ops::Range<usize>,
    link_len: usize,
    protocol: EthernetProtocol,
    truncated: bool,
}

impl<T: AsRef<[u8]>> Packet<T> {
    /// Wrap an IP datagram to be sent with an explicit protocol tag.
    ///
    /// The whole buffer is the body.
    pub fn new(buffer: T, protocol: EthernetProtocol) -> Self {
        let len = buffer.as_ref().len();
        Packet {
            buffer,
            body: 0..len,
            link_len: 0,
            protocol,
            truncated: false,
        }
    }

    /// Wrap an IP datagram, tagging it by its version nibble.
    pub fn from_ip(buffer: T) -> wire::Result<Self> {
        let protocol = match IpVersion::of_packet(buffer.as_ref())? {
            IpVersion::Ipv4 => EthernetProtocol::Ipv4,
            IpVersion::Ipv6 => EthernetProtocol::Ipv6,
        };
        Ok(Self::new(buffer, protocol))
    }

    /// Wrap an Ethernet frame, tagging it by its EtherType.
    pub fn from_frame(buffer: T) -> wire::Result<Self> {
        let protocol = ethernet_frame::new_checked(buffer.as_ref())?.ethertype();
        let mut packet = Self::new(buffer, protocol);
        packet.link_len = ETHERNET_HEADER_LEN;
        Ok(packet)
    }

    /// Assemble a received packet before validation.
    pub(crate) fn from_parts(
        buffer: T,
        body: ops::Range<usize>,
        link_len: usize,
        protocol: EthernetProtocol,
        truncated: bool,
    ) -> Self {
        Packet { buffer, body, link_len, protocol, truncated }
    }

    /// Enforce the length declared by the IP header.
    ///
    /// A body longer than declared is trimmed. A body shorter than declared, or shorter than the
    /// header, marks the packet truncated and is reported as `Error::Truncated`. So does an IPv4
    /// total length that does not cover its own header. Packets not tagged as IP are left
    /// untouched and reported as `Error::NotIp`.
    pub(crate) fn trim(&mut self) -> wire::Result<()> {
        let ip = self.ip_bytes();
        let declared = match self.protocol {
            EthernetProtocol::Ipv4 => ipv4_packet::new_checked(ip)
                .map(|packet| packet.declared_len()),
            EthernetProtocol::Ipv6 => ipv6_packet::new_checked(ip)
                .map(|packet| packet.declared_len()),
            _ => return Err(wire::Error::NotIp),
        };

        match declared {
            Ok(declared) => {
                self.body.end = self.body.start + self.link_len + declared;
                Ok(())
            },
            Err(_) => {
                self.truncated = true;
                Err(wire::Error::Truncated)
            },
        }
    }

    /// Mark the packet as cut short.
    pub(crate) fn set_truncated(&mut self) {
        self.truncated = true;
    }

    /// The complete body, including a link layer header if any.
    pub fn body(&self) -> &[u8] {
        &self.buffer.as_ref()[self.body.clone()]
    }

    /// The protocol tag of the body.
    pub fn protocol(&self) -> EthernetProtocol {
        self.protocol
    }

    /// Whether the packet is shorter than its headers declare.
    ///
    /// The accessors below still work on a truncated packet but may report empty fields.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// The length of the link layer header preceding the IP header.
    ///
    /// This is `0` for packets of a tun device.
    pub fn link_len(&self) -> usize {
        self.link_len
    }

    /// The Ethernet header of packets from a tap device.
    pub fn link_header(&self) -> Option<&ethernet_frame> {
        if self.link_len == 0 {
            return None;
        }
        ethernet_frame::new_checked(self.body()).ok()
    }

    /// The bytes of the IP header and its payload.
    ///
    /// Empty when the body is shorter than its link layer header.
    pub fn ip_bytes(&self) -> &[u8] {
        self.body().get(self.link_len..).unwrap_or(&[])
    }

    /// Unwrap the underlying buffer.
    pub fn into_inner(self) -> T {
        self.buffer
    }

    fn ipv4(&self) -> Option<&ipv4_packet> {
        match self.protocol {
            EthernetProtocol::Ipv4 => ipv4_packet::new_checked_header(self.ip_bytes()).ok(),
            _ => None,
        }
    }

    fn ipv6(&self) -> Option<&ipv6_packet> {
        match self.protocol {
            EthernetProtocol::Ipv6 => ipv6_packet::new_checked_header(self.ip_bytes()).ok(),
            _ => None,
        }
    }

    /// The source address octets, 4 for IPv4 and 16 for IPv6.
    ///
    /// Empty if the packet is not IP or shorter than the fixed header.
    pub fn src_addr_bytes(&self) -> &[u8] {
        if let Some(ipv4) = self.ipv4() {
            ipv4.src_addr_bytes()
        } else if let Some(ipv6) = self.ipv6() {
            ipv6.src_addr_bytes()
        } else {
            &[]
        }
    }

    /// The destination address octets, 4 for IPv4 and 16 for IPv6.
    ///
    /// Empty if the packet is not IP or shorter than the fixed header.
    pub fn dst_addr_bytes(&self) -> &[u8] {
        if let Some(ipv4) = self.ipv4() {
            ipv4.dst_addr_bytes()
        } else if let Some(ipv6) = self.ipv6() {
            ipv6.dst_addr_bytes()
        } else {
            &[]
        }
    }

    /// The source address.
    pub fn src_addr(&self) -> Option<IpAddr> {
        self.ipv4().map(|ipv4| IpAddr::V4(ipv4.src_addr()))
            .or_else(|| self.ipv6().map(|ipv6| IpAddr::V6(ipv6.src_addr())))
    }

    /// The destination address.
    pub fn dst_addr(&self) -> Option<IpAddr> {
        self.ipv4().map(|ipv4| IpAddr::V4(ipv4.dst_addr()))
            .or_else(|| self.ipv6().map(|ipv6| IpAddr::V6(ipv6.dst_addr())))
    }

    /// The Differentiated Services Code Point, `0` if there is no IP header.
    pub fn dscp(&self) -> u8 {
        if let Some(ipv4) = self.ipv4() {
            ipv4.dscp()
        } else if let Some(ipv6) = self.ipv6() {
            ipv6.dscp()
        } else {
            0
        }
    }

    /// Determine the transport protocol, its offset within the IP header and whether the packet
    /// is a fragment.
    pub fn effective_protocol(&self) -> wire::Result<Transport> {
        match self.protocol {
            EthernetProtocol::Ipv4 => ipv4_packet::new_checked_header(self.ip_bytes())?.transport(),
            EthernetProtocol::Ipv6 => ipv6_packet::new_checked_header(self.ip_bytes())?.transport(),
            _ => Err(wire::Error::NotIp),
        }
    }

    /// The classification as a plain `(protocol, payload_offset, fragment)` tuple.
    ///
    /// Failures are `(0, 0, false)` and 'no next header' is `(0, len, false)`, see
    /// [`Transport::sentinel`]. Prefer [`effective_protocol`] which keeps these apart.
    ///
    /// [`Transport::sentinel`]: ../wire/struct.Transport.html#method.sentinel
    /// [`effective_protocol`]: #method.effective_protocol
    pub fn ip_proto(&self) -> (u8, usize, bool) {
        Transport::sentinel(self.effective_protocol(), self.ip_bytes().len())
    }

    /// The control message carried by the packet, if it is an unfragmented ICMP packet.
    pub fn icmp(&self) -> Option<Icmp> {
        let transport = self.effective_protocol().ok()?;
        Icmp::classify(self.ip_bytes(), transport)
    }

    /// The control message as `(protocol, type, code)`, with `(0, 0, 0)` if there is none.
    pub fn icmp_type(&self) -> (u8, u8, u8) {
        Icmp::sentinel(self.icmp())
    }
}

impl<T: AsRef<[u8]>> fmt::Display for Packet<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.src_addr(), self.dst_addr()) {
            (Some(src), Some(dst)) => write!(f, "{} -> {}", src, dst)?,
            _ => write!(f, "{} packet of {} bytes", self.protocol, self.body.len())?,
        }
        match self.dscp() {
            0 => Ok(()),
            dscp => write!(f, ", DSCP {}", dscp),
        }
    }
}
