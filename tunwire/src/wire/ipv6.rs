use std::net::Ipv6Addr;
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result, Transport};
use super::ipv6ext;
use super::field::Field;

pub(crate) use super::IpProtocol as Protocol;

/// Length of the fixed IPv6 header.
pub const HEADER_LEN: usize = field::DST_ADDR.end;

byte_wrapper! {
    /// A byte sequence representing an IPv6 packet.
    #[derive(Debug, PartialEq, Eq)]
    pub struct ipv6([u8]);
}

mod field {
    use crate::wire::field::Field;
    // 4-bit version number, 8-bit traffic class, and the
    // 20-bit flow label.
    pub(crate) const VER_TC_FLOW: Field = 0..4;
    // 16-bit value representing the length of the payload.
    // Note: Options are included in this length.
    pub(crate) const LENGTH:      Field = 4..6;
    // 8-bit value identifying the type of header following this
    // one. Note: The same numbers are used in IPv4.
    pub(crate) const NXT_HDR:     usize = 6;
    // 8-bit value decremented by each node that forwards this
    // packet. The packet is discarded when the value is 0.
    pub(crate) const HOP_LIMIT:   usize = 7;
    // IPv6 address of the source node.
    pub(crate) const SRC_ADDR:    Field = 8..24;
    // IPv6 address of the destination node.
    pub(crate) const DST_ADDR:    Field = 24..40;
}

impl ipv6 {
    /// Imbue a raw octet buffer with IPv6 packet structure.
    pub fn new_unchecked(buffer: &[u8]) -> &ipv6 {
        Self::__from_macro_new_unchecked(buffer)
    }

    /// Imbue a mutable octet buffer with IPv6 packet structure.
    pub fn new_unchecked_mut(buffer: &mut [u8]) -> &mut ipv6 {
        Self::__from_macro_new_unchecked_mut(buffer)
    }

    /// Check that the fixed header is present.
    ///
    /// Extension headers are not inspected and the payload length is not compared against the
    /// buffer, see [`check_len`] for that.
    ///
    /// [`check_len`]: #method.check_len
    pub fn new_checked_header(data: &[u8]) -> Result<&ipv6> {
        if data.len() < HEADER_LEN {
            return Err(Error::Truncated);
        }
        Ok(Self::new_unchecked(data))
    }

    /// Shorthand for a combination of [new_unchecked] and [check_len].
    ///
    /// [new_unchecked]: #method.new_unchecked
    /// [check_len]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&ipv6> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// View the packet as a raw byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Ensure that the fixed header and the declared payload are present.
    pub fn check_len(&self) -> Result<()> {
        let len = self.0.len();
        if len < HEADER_LEN {
            Err(Error::Truncated)
        } else if len < self.declared_len() {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// The number of octets the header claims for the whole datagram.
    ///
    /// This is the fixed header plus the payload length field, extension headers being part of
    /// the payload.
    pub fn declared_len(&self) -> usize {
        HEADER_LEN + usize::from(self.payload_len())
    }

    /// Return the version field.
    #[inline]
    pub fn version(&self) -> u8 {
        self.0[field::VER_TC_FLOW.start] >> 4
    }

    /// Return the traffic class.
    #[inline]
    pub fn traffic_class(&self) -> u8 {
        let data = &self.0;
        ((data[0] & 0x0f) << 4) | (data[1] >> 4)
    }

    /// Return the Differential Services Code Point, the upper six bits of the traffic class.
    #[inline]
    pub fn dscp(&self) -> u8 {
        let data = &self.0;
        ((data[0] & 0x0f) << 2) | ((data[1] & 0xf0) >> 6)
    }

    /// Return the flow label field.
    #[inline]
    pub fn flow_label(&self) -> u32 {
        NetworkEndian::read_u24(&self.0[1..4]) & 0x000f_ffff
    }

    /// Return the payload length field.
    #[inline]
    pub fn payload_len(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::LENGTH])
    }

    /// Return the next header field.
    #[inline]
    pub fn next_header(&self) -> Protocol {
        Protocol::from(self.0[field::NXT_HDR])
    }

    /// Return the hop limit field.
    #[inline]
    pub fn hop_limit(&self) -> u8 {
        self.0[field::HOP_LIMIT]
    }

    /// Return the source address field, as octets 8 to 24.
    #[inline]
    pub fn src_addr_bytes(&self) -> &[u8] {
        &self.0[field::SRC_ADDR]
    }

    /// Return the destination address field, as octets 24 to 40.
    #[inline]
    pub fn dst_addr_bytes(&self) -> &[u8] {
        &self.0[field::DST_ADDR]
    }

    /// Return the source address field.
    pub fn src_addr(&self) -> Ipv6Addr {
        address(self.src_addr_bytes())
    }

    /// Return the destination address field.
    pub fn dst_addr(&self) -> Ipv6Addr {
        address(self.dst_addr_bytes())
    }

    /// Determine the transport protocol by walking the extension header chain.
    ///
    /// See [`ipv6ext::walk`] for the exact rules.
    ///
    /// [`ipv6ext::walk`]: ../ipv6ext/fn.walk.html
    pub fn transport(&self) -> Result<Transport> {
        ipv6ext::walk(&self.0, self.next_header(), HEADER_LEN)
    }

    /// Set the version field.
    #[inline]
    pub fn set_version(&mut self, value: u8) {
        let data = &mut self.0;
        data[0] = (data[0] & 0x0f) | ((value & 0x0f) << 4);
    }

    /// Set the traffic class field.
    #[inline]
    pub fn set_traffic_class(&mut self, value: u8) {
        let data = &mut self.0;
        data[0] = (data[0] & 0xf0) | ((value & 0xf0) >> 4);
        data[1] = (data[1] & 0x0f) | ((value & 0x0f) << 4);
    }

    /// Set the Differential Services Code Point, keeping the congestion bits.
    #[inline]
    pub fn set_dscp(&mut self, value: u8) {
        let data = &mut self.0;
        data[0] = (data[0] & 0xf0) | ((value >> 2) & 0x0f);
        data[1] = (data[1] & 0x3f) | ((value & 0x03) << 6);
    }

    /// Set the flow label field.
    #[inline]
    pub fn set_flow_label(&mut self, value: u32) {
        let data = &mut self.0;
        let raw = (u32::from(data[1] & 0xf0) << 16) | (value & 0x000f_ffff);
        NetworkEndian::write_u24(&mut data[1..4], raw);
    }

    /// Set the payload length field.
    #[inline]
    pub fn set_payload_len(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::LENGTH], value);
    }

    /// Set the next header field.
    #[inline]
    pub fn set_next_header(&mut self, value: Protocol) {
        self.0[field::NXT_HDR] = value.into();
    }

    /// Set the hop limit field.
    #[inline]
    pub fn set_hop_limit(&mut self, value: u8) {
        self.0[field::HOP_LIMIT] = value;
    }

    /// Set the source address field.
    #[inline]
    pub fn set_src_addr(&mut self, value: Ipv6Addr) {
        self.0[field::SRC_ADDR].copy_from_slice(&value.octets());
    }

    /// Set the destination address field.
    #[inline]
    pub fn set_dst_addr(&mut self, value: Ipv6Addr) {
        self.0[field::DST_ADDR].copy_from_slice(&value.octets());
    }

    /// Return the payload, including extension headers, as a byte slice.
    ///
    /// Clamped to the buffer, a packet checked only with `new_checked_header` may be shorter than
    /// its payload length.
    pub fn payload_slice(&self) -> &[u8] {
        let range = self.payload_range();
        &self.0[range]
    }

    /// Return the payload, including extension headers, as a mutable byte slice.
    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        let range = self.payload_range();
        &mut self.0[range]
    }

    fn payload_range(&self) -> Field {
        let len = self.0.len();
        let end = self.declared_len().min(len);
        HEADER_LEN.min(end)..end
    }
}

fn address(data: &[u8]) -> Ipv6Addr {
    let mut octets = [0; 16];
    octets.copy_from_slice(data);
    Ipv6Addr::from(octets)
}

#[cfg(test)]
mod test {
    use super::*;

    static REPR_PACKET_BYTES: [u8; 52] =
        [0x60, 0x00, 0x00, 0x00,
         0x00, 0x0c, 0x11, 0x40,
         0xfe, 0x80, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x01,
         0xff, 0x02, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x01,
         0x00, 0x01, 0x00, 0x02,
         0x00, 0x0c, 0x02, 0x4e,
         0xff, 0xff, 0xff, 0xff];

    const LINK_LOCAL: Ipv6Addr = Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1);
    const ALL_NODES: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 1);

    #[test]
    fn test_packet_deconstruction() {
        let packet = ipv6::new_checked(&REPR_PACKET_BYTES[..]).unwrap();
        assert_eq!(packet.version(), 6);
        assert_eq!(packet.traffic_class(), 0);
        assert_eq!(packet.flow_label(), 0);
        assert_eq!(packet.payload_len(), 0xc);
        assert_eq!(packet.next_header(), Protocol::Udp);
        assert_eq!(packet.hop_limit(), 0x40);
        assert_eq!(packet.src_addr(), LINK_LOCAL);
        assert_eq!(packet.dst_addr(), ALL_NODES);
        assert_eq!(packet.payload_slice(), &REPR_PACKET_BYTES[40..]);
    }

    #[test]
    fn test_packet_construction() {
        let mut bytes = [0xff; 52];
        let packet = ipv6::new_unchecked_mut(&mut bytes);
        packet.set_version(6);
        packet.set_traffic_class(0);
        packet.set_flow_label(0);
        packet.set_payload_len(0xc);
        packet.set_next_header(Protocol::Udp);
        packet.set_hop_limit(0x40);
        packet.set_src_addr(LINK_LOCAL);
        packet.set_dst_addr(ALL_NODES);
        packet.payload_mut_slice().copy_from_slice(&REPR_PACKET_BYTES[40..]);
        assert_eq!(&bytes[..], &REPR_PACKET_BYTES[..]);
    }

    #[test]
    fn test_flow_label_keeps_traffic_class() {
        let mut bytes = REPR_PACKET_BYTES;
        let packet = ipv6::new_unchecked_mut(&mut bytes);
        packet.set_traffic_class(0xb8);
        packet.set_flow_label(0xabcde);
        assert_eq!(packet.traffic_class(), 0xb8);
        assert_eq!(packet.flow_label(), 0xabcde);
        assert_eq!(packet.dscp(), 0xb8 >> 2);
    }

    #[test]
    fn dscp_roundtrip() {
        let mut bytes = REPR_PACKET_BYTES;
        for dscp in 0..64 {
            let packet = ipv6::new_unchecked_mut(&mut bytes);
            packet.set_flow_label(0xfffff);
            packet.set_dscp(dscp);
            assert_eq!(packet.dscp(), dscp);
            assert_eq!(packet.version(), 6);
            assert_eq!(packet.flow_label(), 0xfffff);
        }
    }

    #[test]
    fn test_truncated() {
        assert_eq!(ipv6::new_checked_header(&REPR_PACKET_BYTES[..39]), Err(Error::Truncated));
        assert_eq!(ipv6::new_checked(&REPR_PACKET_BYTES[..51]), Err(Error::Truncated));
        let packet = ipv6::new_checked_header(&REPR_PACKET_BYTES[..51]).unwrap();
        assert_eq!(packet.declared_len(), 52);
        assert_eq!(packet.payload_slice(), &REPR_PACKET_BYTES[40..51]);
    }

    #[test]
    fn test_transport_without_extensions() {
        let packet = ipv6::new_checked(&REPR_PACKET_BYTES[..]).unwrap();
        assert_eq!(packet.transport(), Ok(Transport {
            protocol: Protocol::Udp,
            payload_offset: 40,
            fragment: false,
        }));
    }
}
