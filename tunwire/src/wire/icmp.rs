use core::fmt;

use super::{IpProtocol, Transport};

enum_with_unknown! {
    /// Internet protocol control message type.
    pub doc enum Icmpv4Message(u8) {
        /// Echo reply
        EchoReply      =  0,
        /// Destination unreachable
        DstUnreachable =  3,
        /// Message redirect
        Redirect       =  5,
        /// Echo request
        EchoRequest    =  8,
        /// Router advertisement
        RouterAdvert   =  9,
        /// Router solicitation
        RouterSolicit  = 10,
        /// Time exceeded
        TimeExceeded   = 11,
        /// Parameter problem
        ParamProblem   = 12,
        /// Timestamp
        Timestamp      = 13,
        /// Timestamp reply
        TimestampReply = 14,
        /// Extended Echo Request
        ExtendedEcho   = 42,
        /// Extended Echo Reply
        ExtendedReply  = 43,
    }
}

impl fmt::Display for Icmpv4Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Icmpv4Message::EchoReply      => write!(f, "echo reply"),
            Icmpv4Message::DstUnreachable => write!(f, "destination unreachable"),
            Icmpv4Message::Redirect       => write!(f, "message redirect"),
            Icmpv4Message::EchoRequest    => write!(f, "echo request"),
            Icmpv4Message::RouterAdvert   => write!(f, "router advertisement"),
            Icmpv4Message::RouterSolicit  => write!(f, "router solicitation"),
            Icmpv4Message::TimeExceeded   => write!(f, "time exceeded"),
            Icmpv4Message::ParamProblem   => write!(f, "parameter problem"),
            Icmpv4Message::Timestamp      => write!(f, "timestamp"),
            Icmpv4Message::TimestampReply => write!(f, "timestamp reply"),
            Icmpv4Message::ExtendedEcho   => write!(f, "extended echo request"),
            Icmpv4Message::ExtendedReply  => write!(f, "extended echo reply"),
            Icmpv4Message::Unknown(id)    => write!(f, "{}", id)
        }
    }
}

enum_with_unknown! {
    /// Internet protocol control message type for IPv6.
    pub doc enum Icmpv6Message(u8) {
        /// Destination unreachable
        DstUnreachable  = 0x01,
        /// Packet too big
        PktTooBig       = 0x02,
        /// Time exceeded
        TimeExceeded    = 0x03,
        /// Parameter problem
        ParamProblem    = 0x04,
        /// Echo request
        EchoRequest     = 0x80,
        /// Echo reply
        EchoReply       = 0x81,
        /// Multicast listener query
        MldQuery        = 0x82,
        /// Router solicitation
        RouterSolicit   = 0x85,
        /// Router advertisement
        RouterAdvert    = 0x86,
        /// Neighbor solicitation
        NeighborSolicit = 0x87,
        /// Neighbor advertisement
        NeighborAdvert  = 0x88,
        /// Redirect
        Redirect        = 0x89,
        /// Multicast listener report
        MldReport       = 0x8f,
    }
}

impl Icmpv6Message {
    /// Query whether the message is an error message.
    ///
    /// Error messages have the high bit of the type cleared.
    pub fn is_error(self) -> bool {
        u8::from(self) & 0x80 != 0x80
    }
}

impl fmt::Display for Icmpv6Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Icmpv6Message::DstUnreachable  => write!(f, "destination unreachable"),
            Icmpv6Message::PktTooBig       => write!(f, "packet too big"),
            Icmpv6Message::TimeExceeded    => write!(f, "time exceeded"),
            Icmpv6Message::ParamProblem    => write!(f, "parameter problem"),
            Icmpv6Message::EchoReply       => write!(f, "echo reply"),
            Icmpv6Message::EchoRequest     => write!(f, "echo request"),
            Icmpv6Message::MldQuery        => write!(f, "multicast listener query"),
            Icmpv6Message::RouterSolicit   => write!(f, "router solicitation"),
            Icmpv6Message::RouterAdvert    => write!(f, "router advertisement"),
            Icmpv6Message::NeighborSolicit => write!(f, "neighbor solicitation"),
            Icmpv6Message::NeighborAdvert  => write!(f, "neighbor advert"),
            Icmpv6Message::Redirect        => write!(f, "redirect"),
            Icmpv6Message::MldReport       => write!(f, "multicast listener report"),
            Icmpv6Message::Unknown(id)     => write!(f, "{}", id)
        }
    }
}

/// The message type of either control protocol.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum IcmpMessage {
    /// A message carried over IPv4.
    V4(Icmpv4Message),
    /// A message carried over IPv6.
    V6(Icmpv6Message),
}

impl IcmpMessage {
    /// The protocol number this message is carried with.
    pub fn protocol(self) -> IpProtocol {
        match self {
            IcmpMessage::V4(_) => IpProtocol::Icmp,
            IcmpMessage::V6(_) => IpProtocol::Icmpv6,
        }
    }
}

impl From<IcmpMessage> for u8 {
    fn from(message: IcmpMessage) -> u8 {
        match message {
            IcmpMessage::V4(message) => message.into(),
            IcmpMessage::V6(message) => message.into(),
        }
    }
}

impl fmt::Display for IcmpMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IcmpMessage::V4(message) => write!(f, "ICMP {}", message),
            IcmpMessage::V6(message) => write!(f, "ICMPv6 {}", message),
        }
    }
}

/// Type and code of a control message found in an IP packet.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub struct Icmp {
    /// The message type.
    pub message: IcmpMessage,
    /// The message code, whose meaning depends on the type.
    pub code: u8,
}

mod field {
    pub(crate) const TYPE: usize = 0;
    pub(crate) const CODE: usize = 1;
    // Type, code and checksum.
    pub(crate) const HEADER_MIN: usize = 4;
}

impl Icmp {
    /// Find the control message header of an IP packet.
    ///
    /// `ip` are the octets of the IP packet and `transport` its classification. Returns `None`
    /// for fragments, for transport protocols other than ICMP and ICMPv6 and when fewer than
    /// four octets follow the payload offset. A non-initial fragment does not contain the header
    /// and an initial fragment is not trusted to.
    pub fn classify(ip: &[u8], transport: Transport) -> Option<Icmp> {
        if transport.fragment {
            return None;
        }

        let at = transport.payload_offset;
        let header = ip.get(at..at.checked_add(field::HEADER_MIN)?)?;
        let message = match transport.protocol {
            IpProtocol::Icmp => IcmpMessage::V4(header[field::TYPE].into()),
            IpProtocol::Icmpv6 => IcmpMessage::V6(header[field::TYPE].into()),
            _ => return None,
        };

        Some(Icmp { message, code: header[field::CODE] })
    }

    /// The protocol number of the control protocol, `1` or `58`.
    pub fn protocol(&self) -> IpProtocol {
        self.message.protocol()
    }

    /// Flatten into `(protocol, type, code)`, with `(0, 0, 0)` for packets without a message.
    pub fn sentinel(icmp: Option<Icmp>) -> (u8, u8, u8) {
        match icmp {
            Some(icmp) => (icmp.protocol().into(), icmp.message.into(), icmp.code),
            None => (0, 0, 0),
        }
    }
}

impl fmt::Display for Icmp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static ECHO: [u8; 28] =
        [0x45, 0x00, 0x00, 0x1c,
         0x00, 0x01, 0x00, 0x00,
         0x40, 0x01, 0x00, 0x00,
         0x0a, 0x00, 0x00, 0x01,
         0x0a, 0x00, 0x00, 0x02,
         0x08, 0x00, 0xf7, 0xfe,
         0x00, 0x01, 0x00, 0x00];

    fn at(protocol: IpProtocol, payload_offset: usize) -> Transport {
        Transport { protocol, payload_offset, fragment: false }
    }

    #[test]
    fn echo_request() {
        let icmp = Icmp::classify(&ECHO, at(IpProtocol::Icmp, 20)).unwrap();
        assert_eq!(icmp.message, IcmpMessage::V4(Icmpv4Message::EchoRequest));
        assert_eq!(icmp.code, 0);
        assert_eq!(Icmp::sentinel(Some(icmp)), (1, 8, 0));
        assert_eq!(icmp.to_string(), "ICMP echo request (code 0)");
    }

    #[test]
    fn version_six() {
        let mut bytes = [0; 44];
        bytes[40] = 0x87;
        let icmp = Icmp::classify(&bytes, at(IpProtocol::Icmpv6, 40)).unwrap();
        assert_eq!(icmp.message, IcmpMessage::V6(Icmpv6Message::NeighborSolicit));
        assert_eq!(icmp.protocol(), IpProtocol::Icmpv6);
        assert_eq!(Icmp::sentinel(Some(icmp)), (58, 0x87, 0));
    }

    #[test]
    fn not_a_message() {
        assert_eq!(Icmp::classify(&ECHO, at(IpProtocol::Udp, 20)), None);
        assert_eq!(Icmp::classify(&ECHO[..23], at(IpProtocol::Icmp, 20)), None);
        assert_eq!(Icmp::classify(&ECHO, at(IpProtocol::Icmp, usize::MAX)), None);

        let fragment = Transport { fragment: true, ..at(IpProtocol::Icmp, 20) };
        assert_eq!(Icmp::classify(&ECHO, fragment), None);
        assert_eq!(Icmp::sentinel(None), (0, 0, 0));
    }

    #[test]
    fn error_messages() {
        assert!(Icmpv6Message::PktTooBig.is_error());
        assert!(!Icmpv6Message::EchoReply.is_error());
        assert_eq!(Icmpv6Message::from(0x8f), Icmpv6Message::MldReport);
    }
}
