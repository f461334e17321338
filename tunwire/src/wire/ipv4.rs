use std::net::Ipv4Addr;
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result, Transport};
use super::field::Field;

pub(crate) use super::IpProtocol as Protocol;

/// Length of an IPv4 header without options.
pub const HEADER_LEN: usize = field::DST_ADDR.end;

byte_wrapper! {
    /// A byte sequence representing an IPv4 packet.
    #[derive(Debug, PartialEq, Eq)]
    pub struct ipv4([u8]);
}

mod field {
    use crate::wire::field::Field;

    pub(crate) const VER_IHL:  usize = 0;
    pub(crate) const DSCP_ECN: usize = 1;
    pub(crate) const LENGTH:   Field = 2..4;
    pub(crate) const FLG_OFF:  Field = 6..8;
    pub(crate) const TTL:      usize = 8;
    pub(crate) const PROTOCOL: usize = 9;
    pub(crate) const SRC_ADDR: Field = 12..16;
    pub(crate) const DST_ADDR: Field = 16..20;
}

impl ipv4 {
    /// Imbue a raw octet buffer with IPv4 packet structure.
    pub fn new_unchecked(buffer: &[u8]) -> &ipv4 {
        Self::__from_macro_new_unchecked(buffer)
    }

    /// Imbue a mutable octet buffer with IPv4 packet structure.
    pub fn new_unchecked_mut(buffer: &mut [u8]) -> &mut ipv4 {
        Self::__from_macro_new_unchecked_mut(buffer)
    }

    /// Check that the fixed header is present.
    ///
    /// Afterwards all header field accessors are safe to call. The total length is not compared
    /// against the buffer, see [`check_len`] for that.
    ///
    /// [`check_len`]: #method.check_len
    pub fn new_checked_header(data: &[u8]) -> Result<&ipv4> {
        if data.len() < HEADER_LEN {
            return Err(Error::Truncated);
        }
        Ok(Self::new_unchecked(data))
    }

    /// Shorthand for a combination of [new_unchecked] and [check_len].
    ///
    /// [new_unchecked]: #method.new_unchecked
    /// [check_len]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&ipv4> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// View the packet as a raw byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Ensure that the whole declared packet is present.
    ///
    /// Returns `Err(Error::Truncated)` if the buffer is shorter than the header length or the
    /// total length field, and also when the total length does not even cover the header. Trailing
    /// bytes after the total length are fine.
    ///
    /// The result of this check is invalidated by calling [set_header_len] and [set_total_len].
    ///
    /// [set_header_len]: #method.set_header_len
    /// [set_total_len]: #method.set_total_len
    pub fn check_len(&self) -> Result<()> {
        let len = self.0.len();
        if len < HEADER_LEN {
            Err(Error::Truncated)
        } else if len < usize::from(self.header_len()) {
            Err(Error::Truncated)
        } else if u16::from(self.header_len()) > self.total_len() {
            Err(Error::Truncated)
        } else if len < self.declared_len() {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// The number of octets the header claims for the whole datagram.
    ///
    /// This is the total length field, header included.
    pub fn declared_len(&self) -> usize {
        self.total_len().into()
    }

    /// Return the version field.
    #[inline]
    pub fn version(&self) -> u8 {
        self.0[field::VER_IHL] >> 4
    }

    /// Return the header length, in octets.
    #[inline]
    pub fn header_len(&self) -> u8 {
        (self.0[field::VER_IHL] & 0x0f) * 4
    }

    /// Return the Differential Services Code Point field.
    pub fn dscp(&self) -> u8 {
        self.0[field::DSCP_ECN] >> 2
    }

    /// Return the total length field.
    #[inline]
    pub fn total_len(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::LENGTH])
    }

    /// Return the "more fragments" flag.
    #[inline]
    pub fn more_frags(&self) -> bool {
        NetworkEndian::read_u16(&self.0[field::FLG_OFF]) & 0x2000 != 0
    }

    /// Return the fragment offset, in octets.
    #[inline]
    pub fn frag_offset(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::FLG_OFF]) << 3
    }

    /// Query whether this packet is one piece of a fragmented datagram.
    ///
    /// True if more fragments follow or the fragment offset is nonzero.
    #[inline]
    pub fn is_fragment(&self) -> bool {
        NetworkEndian::read_u16(&self.0[field::FLG_OFF]) & 0x3fff != 0
    }

    /// Return the time to live field.
    #[inline]
    pub fn hop_limit(&self) -> u8 {
        self.0[field::TTL]
    }

    /// Return the protocol field.
    #[inline]
    pub fn protocol(&self) -> Protocol {
        Protocol::from(self.0[field::PROTOCOL])
    }

    /// Return the source address field, as octets 12 to 16.
    #[inline]
    pub fn src_addr_bytes(&self) -> &[u8] {
        &self.0[field::SRC_ADDR]
    }

    /// Return the destination address field, as octets 16 to 20.
    #[inline]
    pub fn dst_addr_bytes(&self) -> &[u8] {
        &self.0[field::DST_ADDR]
    }

    /// Return the source address field.
    pub fn src_addr(&self) -> Ipv4Addr {
        address(self.src_addr_bytes())
    }

    /// Return the destination address field.
    pub fn dst_addr(&self) -> Ipv4Addr {
        address(self.dst_addr_bytes())
    }

    /// Determine the transport protocol and where its header starts.
    ///
    /// IPv4 has no header chain, the protocol field is the transport protocol and the payload
    /// begins after the header length. The offset is not checked against the buffer.
    pub fn transport(&self) -> Result<Transport> {
        Ok(Transport {
            protocol: self.protocol(),
            payload_offset: self.header_len().into(),
            fragment: self.is_fragment(),
        })
    }

    /// Set the version field.
    #[inline]
    pub fn set_version(&mut self, value: u8) {
        self.0[field::VER_IHL] = (self.0[field::VER_IHL] & !0xf0) | (value << 4);
    }

    /// Set the header length, in octets.
    #[inline]
    pub fn set_header_len(&mut self, value: u8) {
        self.0[field::VER_IHL] = (self.0[field::VER_IHL] & !0x0f) | ((value / 4) & 0x0f);
    }

    /// Set the Differential Services Code Point field.
    pub fn set_dscp(&mut self, value: u8) {
        self.0[field::DSCP_ECN] = (self.0[field::DSCP_ECN] & !0xfc) | (value << 2)
    }

    /// Set the total length field.
    #[inline]
    pub fn set_total_len(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.0[field::LENGTH], value)
    }

    /// Set the "more fragments" flag.
    #[inline]
    pub fn set_more_frags(&mut self, value: bool) {
        let raw = NetworkEndian::read_u16(&self.0[field::FLG_OFF]);
        let raw = if value { raw | 0x2000 } else { raw & !0x2000 };
        NetworkEndian::write_u16(&mut self.0[field::FLG_OFF], raw);
    }

    /// Set the fragment offset, in octets.
    #[inline]
    pub fn set_frag_offset(&mut self, value: u16) {
        let raw = NetworkEndian::read_u16(&self.0[field::FLG_OFF]);
        let raw = (raw & 0xe000) | (value >> 3);
        NetworkEndian::write_u16(&mut self.0[field::FLG_OFF], raw);
    }

    /// Set the time to live field.
    #[inline]
    pub fn set_hop_limit(&mut self, value: u8) {
        self.0[field::TTL] = value
    }

    /// Set the protocol field.
    #[inline]
    pub fn set_protocol(&mut self, value: Protocol) {
        self.0[field::PROTOCOL] = value.into()
    }

    /// Set the source address field.
    #[inline]
    pub fn set_src_addr(&mut self, value: Ipv4Addr) {
        self.0[field::SRC_ADDR].copy_from_slice(&value.octets())
    }

    /// Set the destination address field.
    #[inline]
    pub fn set_dst_addr(&mut self, value: Ipv4Addr) {
        self.0[field::DST_ADDR].copy_from_slice(&value.octets())
    }

    /// Compute the range of the payload without accessing it.
    ///
    /// Only requires the packet to have a valid header, not a consistent length. The range is
    /// clamped to the buffer and empty when the total length does not cover the header.
    pub fn payload_range(&self) -> Field {
        let len = self.0.len();
        let header_end = usize::from(self.header_len()).min(len);
        let total_len = usize::from(self.total_len()).min(len);
        header_end..total_len.max(header_end)
    }

    /// Return the payload as a byte slice.
    pub fn payload_slice(&self) -> &[u8] {
        let range = self.payload_range();
        &self.0[range]
    }

    /// Return the payload as a mutable byte slice.
    pub fn payload_mut_slice(&mut self) -> &mut [u8] {
        let range = self.payload_range();
        &mut self.0[range]
    }
}

fn address(data: &[u8]) -> Ipv4Addr {
    let mut octets = [0; 4];
    octets.copy_from_slice(data);
    Ipv4Addr::from(octets)
}
