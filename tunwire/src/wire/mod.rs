/*! Low-level packet access.

# Byte views

The `wire` module deals with the packet *representation*. It provides functions to extract fields
from sequences of octets, and to insert fields into sequences of octets. This happens in the
lowercase structures e.g. [`ethernet_frame`] or [`ipv4_packet`]. These are dynamically sized
wrappers around `[u8]`, borrowed from any buffer without copying.

[`ethernet_frame`]: struct.ethernet_frame.html
[`ipv4_packet`]: struct.ipv4_packet.html

The `packet::check_len()` method of each view guarantees that, if it returned `Ok(())`, then no
field accessor or setter method will panic. The `new_checked` constructors are a shorthand for
combining `new_unchecked` and `check_len`. When parsing untrusted input, it is *necessary* to use
one of the checked methods. When emitting output into a reused buffer it is *incorrect* to use
them since the length check may pass or fail based on the data of a previous packet.

# Classification

Above the views sit the questions asked of every packet: which [`IpVersion`] it has, which
transport protocol it carries and where that begins ([`transport`]), and which control message it
is if any ([`Icmp::classify`]). They read the packet on every call and keep no state.

[`IpVersion`]: enum.IpVersion.html
[`transport`]: fn.transport.html
[`Icmp::classify`]: struct.Icmp.html#method.classify

# Examples

To fill in an IP header in an octet buffer and classify it:

```rust
use std::net::Ipv4Addr;
use tunwire::wire::*;

let mut buffer = vec![0; 28];
{
    let packet = ipv4_packet::new_unchecked_mut(&mut buffer);
    packet.set_version(4);
    packet.set_header_len(20);
    packet.set_total_len(28);
    packet.set_hop_limit(64);
    packet.set_protocol(IpProtocol::Udp);
    packet.set_src_addr(Ipv4Addr::new(10, 0, 0, 1));
    packet.set_dst_addr(Ipv4Addr::new(10, 0, 0, 2));
}

let packet = ipv4_packet::new_checked(&buffer)
    .expect("truncated packet");
assert_eq!(packet.src_addr(), Ipv4Addr::new(10, 0, 0, 1));
assert_eq!(transport(&buffer), Ok(Transport {
    protocol: IpProtocol::Udp,
    payload_offset: 20,
    fragment: false,
}));
```
*/
// Copyright (C) 2016 whitequark@whitequark.org
// Copyright (C) 2019 Andreas Molzer <andreas.molzer@tum.de>
//
// in large parts from `smoltcp` originally distributed under 0-clause BSD
//
// Applies to files in this folder unless otherwise noted. These are:
// * `error.rs`
// * `ethernet.rs`
// * `icmp.rs`
// * `ip.rs`
// * `ipv4.rs`
// * `ipv6.rs`
// * `mod.rs` (this file)

mod field {
    pub(crate) type Field = ::core::ops::Range<usize>;
    pub(crate) type Rest  = ::core::ops::RangeFrom<usize>;
}

mod ethernet;
mod error;
pub(crate) mod ip;
mod ipv4;
mod ipv6;
pub mod ipv6ext;
mod icmp;

pub use self::ethernet::{
    ethernet as ethernet_frame,
    EtherType as EthernetProtocol,
    Address as EthernetAddress,
    HEADER_LEN as ETHERNET_HEADER_LEN};

pub use self::error::{
    Error,
    Result};

pub use self::ip::{
    Version as IpVersion,
    Protocol as IpProtocol,
    Transport,
    transport};

pub use self::ipv4::{
    ipv4 as ipv4_packet,
    HEADER_LEN as IPV4_HEADER_LEN};

pub use self::ipv6::{
    ipv6 as ipv6_packet,
    HEADER_LEN as IPV6_HEADER_LEN};

pub use self::icmp::{
    Icmp,
    IcmpMessage,
    Icmpv4Message,
    Icmpv6Message};
