//! Walking the IPv6 extension header chain.
//!
//! Every extension header starts with the protocol of the header following it. How its length
//! is encoded differs: the generic option headers count units of 8 octets beyond the first 8, the
//! authentication header counts units of 4 octets beyond the first 8 and the fragment header has
//! a fixed size of 8 octets.
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result, Transport};
use super::IpProtocol as Protocol;

mod field {
    use crate::wire::field::Field;

    pub(crate) const NXT_HDR: usize = 0;
    pub(crate) const LENGTH:  usize = 1;
    // 13-bit fragment offset, two reserved bits and the M flag.
    pub(crate) const FR_OF_M: Field = 2..4;
}

/// The octets that must be present before a generic option header can be read.
const OPTIONS_MIN_LEN: usize = 4;

/// The fixed length of the fragment header, also the least of an authentication header.
const FIXED_LEN: usize = 8;

/// Mask of the fragment offset and the M flag, leaving out the reserved bits.
const FRAGMENT_MASK: u16 = 0xfff9;

/// Follow the extension header chain of an IPv6 packet.
///
/// `first` is the next header field of the fixed header and `start` the offset where the header
/// it names begins. Hop-by-hop, routing and destination option headers as well as authentication
/// headers are skipped. A fragment header ends the walk when it describes an actual fragment,
/// otherwise it is skipped as well. The walk also ends at the first protocol that is not an
/// extension header, including 'no next header'.
///
/// A header that does not fit into `data`, or that would place the payload beyond the end of
/// `data`, is reported as `Error::MalformedHeaderChain`.
pub fn walk(data: &[u8], first: Protocol, start: usize) -> Result<Transport> {
    let len = data.len();
    let mut next = first;
    let mut at = start;

    loop {
        match next {
            Protocol::HopByHop | Protocol::Ipv6Route | Protocol::Ipv6Opts => {
                let header = header(data, at, OPTIONS_MIN_LEN)?;
                next = Protocol::from(header[field::NXT_HDR]);
                at += FIXED_LEN + usize::from(header[field::LENGTH]) * 8;
            },
            Protocol::Ipv6Frag => {
                let header = header(data, at, FIXED_LEN)?;
                next = Protocol::from(header[field::NXT_HDR]);
                let fragment = NetworkEndian::read_u16(&header[field::FR_OF_M]) & FRAGMENT_MASK != 0;
                at += FIXED_LEN;
                if fragment {
                    return Ok(Transport { protocol: next, payload_offset: at, fragment: true });
                }
            },
            Protocol::Ah => {
                let header = header(data, at, FIXED_LEN)?;
                next = Protocol::from(header[field::NXT_HDR]);
                at += FIXED_LEN + usize::from(header[field::LENGTH]) * 4;
            },
            Protocol::Ipv6NoNxt => {
                if at > len {
                    return Err(Error::MalformedHeaderChain);
                }
                return Ok(Transport { protocol: Protocol::Ipv6NoNxt, payload_offset: len, fragment: false });
            },
            protocol => {
                if at > len {
                    return Err(Error::MalformedHeaderChain);
                }
                return Ok(Transport { protocol, payload_offset: at, fragment: false });
            },
        }
    }
}

/// The first `min` octets of the header at `at`, if present.
fn header(data: &[u8], at: usize, min: usize) -> Result<&[u8]> {
    at.checked_add(min)
        .and_then(|end| data.get(at..end))
        .ok_or(Error::MalformedHeaderChain)
}
