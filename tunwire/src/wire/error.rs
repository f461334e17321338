/// The error type for parsing packet headers.
///
/// All variants are structural: they describe the bytes that were inspected and nothing can be
/// retried to make them go away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Error {
    /// The packet was shorter than the header or length it declares.
    ///
    /// The buffer may be shorter than the minimum header of its protocol, or shorter than the
    /// total length field of that header states.
    #[error("IP packet is truncated")]
    Truncated,

    /// The version nibble or protocol tag names neither IPv4 nor IPv6.
    #[error("packet is not IPv4 or IPv6")]
    NotIp,

    /// The IPv6 extension header chain ran past the end of the packet.
    ///
    /// Some extension header declared a length that points outside the received data, so the
    /// transport protocol could not be determined.
    #[error("IPv6 extension header chain is malformed")]
    MalformedHeaderChain,
}

/// The result type for header parsing.
pub type Result<T> = core::result::Result<T, Error>;
