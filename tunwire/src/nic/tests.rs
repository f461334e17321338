use std::net::{Ipv4Addr, Ipv6Addr};

use super::*;
use crate::wire::{ethernet_frame, ipv4_packet, ipv6_packet};
use crate::wire::{EthernetAddress, EthernetProtocol, IpProtocol};

fn ipv4(payload_len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; 20 + payload_len];
    let packet = ipv4_packet::new_unchecked_mut(&mut bytes);
    packet.set_version(4);
    packet.set_header_len(20);
    packet.set_total_len((20 + payload_len) as u16);
    packet.set_hop_limit(64);
    packet.set_protocol(IpProtocol::Udp);
    packet.set_src_addr(Ipv4Addr::new(10, 0, 0, 1));
    packet.set_dst_addr(Ipv4Addr::new(10, 0, 0, 2));
    bytes
}

fn ipv6(payload_len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; 40 + payload_len];
    let packet = ipv6_packet::new_unchecked_mut(&mut bytes);
    packet.set_version(6);
    packet.set_payload_len(payload_len as u16);
    packet.set_next_header(IpProtocol::Tcp);
    packet.set_hop_limit(64);
    packet.set_src_addr(Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 1));
    packet.set_dst_addr(Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 2));
    bytes
}

fn ethernet(ethertype: EthernetProtocol, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0u8; 14];
    let frame = ethernet_frame::new_unchecked_mut(&mut bytes);
    frame.set_dst_addr(EthernetAddress::BROADCAST);
    frame.set_src_addr(EthernetAddress([0x02, 0, 0, 0, 0, 1]));
    frame.set_ethertype(ethertype);
    bytes.extend_from_slice(payload);
    bytes
}

fn prefixed(flags: u16, protocol: u16, body: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&flags.to_ne_bytes());
    bytes.extend_from_slice(&protocol.to_be_bytes());
    bytes.extend_from_slice(body);
    bytes
}

fn tun(frames: &[Vec<u8>]) -> Interface<Loopback> {
    interface(Config::default(), frames)
}

fn interface(config: Config, frames: &[Vec<u8>]) -> Interface<Loopback> {
    let mut loopback = Loopback::new();
    for frame in frames {
        loopback.push_frame(frame.clone());
    }
    Interface::new(loopback, config)
}

#[test]
fn empty_read() {
    let mut nic = tun(&[vec![]]);
    assert!(matches!(nic.recv(), Err(RecvError::Other(Error::ShortRead))));
    // Nothing queued reads as empty as well.
    assert!(matches!(nic.recv(), Err(RecvError::Other(Error::ShortRead))));
}

#[test]
fn trailing_bytes_trimmed() {
    let mut frame = ipv4(8);
    frame.extend_from_slice(&[0xee; 10]);
    let mut nic = tun(&[frame.clone()]);

    let packet = nic.recv().unwrap();
    assert!(!packet.is_truncated());
    assert_eq!(packet.protocol(), EthernetProtocol::Ipv4);
    assert_eq!(packet.body(), &frame[..28]);
    assert_eq!(packet.to_string(), "10.0.0.1 -> 10.0.0.2");
}

#[test]
fn declared_longer_than_read() {
    let frame = ipv4(8);
    let mut nic = tun(&[frame[..24].to_vec()]);

    let packet = match nic.recv() {
        Err(RecvError::Truncated(packet)) => packet,
        other => panic!("expected a truncated packet, got {:?}", other.map(|packet| packet.body().to_vec())),
    };
    assert!(packet.is_truncated());
    assert_eq!(packet.body(), &frame[..24]);
    assert_eq!(packet.src_addr_bytes(), &[10, 0, 0, 1]);
}

#[test]
fn header_cut_short() {
    let frame = ipv6(20);
    let mut nic = tun(&[frame[..39].to_vec()]);
    let err = nic.recv().unwrap_err();
    let packet = err.packet().unwrap();
    assert_eq!(packet.protocol(), EthernetProtocol::Ipv6);
    assert_eq!(packet.body().len(), 39);
    assert_eq!(err.to_string(), "IP packet is truncated");
}

#[test]
fn ipv6_trimmed() {
    let mut frame = ipv6(20);
    frame.extend_from_slice(&[0; 4]);
    let mut nic = tun(&[frame]);
    let packet = nic.recv().unwrap();
    assert_eq!(packet.body().len(), 60);
    assert_eq!(packet.ip_proto(), (6, 40, false));
}

#[test]
fn not_ip() {
    let mut frame = ipv4(0);
    frame[0] = 0x55;
    let mut nic = tun(&[frame]);
    let err = nic.recv().unwrap_err();
    assert!(matches!(err, RecvError::Other(Error::Wire(wire::Error::NotIp))));
    assert!(err.packet().is_none());
}

#[test]
fn buffers_return() {
    let mut nic = tun(&[ipv4(0), ipv4(0)[..10].to_vec(), vec![]]);
    drop(nic.recv());
    assert_eq!(nic.pool().idle(), 1);
    drop(nic.recv());
    assert_eq!(nic.pool().idle(), 1);
    drop(nic.recv());
    assert_eq!(nic.pool().idle(), 1);
    assert_eq!(nic.pool().buffer_size(), MAX_PACKET_LEN);
}

#[test]
fn caller_buffer() {
    let frame = ipv4(4);
    let mut nic = tun(&[frame.clone()]);
    let mut buffer = [0; 64];
    let packet = nic.recv_into(&mut buffer).unwrap();
    assert_eq!(packet.body(), &frame[..]);
    assert_eq!(nic.pool().idle(), 0);
}

#[test]
fn jumbo_refused() {
    let mut nic = tun(&[]);
    let body = vec![0x45; MAX_PACKET_LEN + 1];
    let packet = Packet::new(&body[..], EthernetProtocol::Ipv4);
    assert!(matches!(
        nic.send(&packet),
        Err(Error::JumboPacket { len: 1601, max: 1600 })));
    assert_eq!(nic.conduit().writes(), 0);

    let body = vec![0x45; MAX_PACKET_LEN];
    let packet = Packet::new(&body[..], EthernetProtocol::Ipv4);
    assert!(nic.send(&packet).is_ok());
    assert_eq!(nic.conduit().writes(), 1);
}

#[test]
fn short_write() {
    let mut nic = tun(&[]);
    nic.conduit_mut().limit_writes(Some(10));
    let body = ipv4(8);
    let packet = Packet::from_ip(&body[..]).unwrap();
    assert!(matches!(
        nic.send(&packet),
        Err(Error::ShortWrite { written: 10, expected: 28 })));
    assert_eq!(nic.conduit().sent()[0], &body[..10]);
}

#[test]
fn raw_send() {
    let mut nic = tun(&[]);
    let body = ipv6(0);
    nic.send(&Packet::from_ip(&body[..]).unwrap()).unwrap();
    assert_eq!(nic.conduit().sent(), &[body]);
}

#[test]
fn packet_info_recv() {
    let config = Config::default().shape(FrameShape::Prefixed(Prefix::PACKET_INFO));
    let mut frame = prefixed(0, 0x0800, &ipv4(4));
    frame.extend_from_slice(&[0; 3]);
    let mut nic = interface(config, &[frame.clone()]);

    let packet = nic.recv().unwrap();
    assert_eq!(packet.protocol(), EthernetProtocol::Ipv4);
    assert_eq!(packet.body(), &frame[4..28]);
    assert_eq!(nic.pool().buffer_size(), MAX_PACKET_LEN + 4);
}

#[test]
fn packet_info_truncated_flag() {
    let config = Config::default().shape(FrameShape::Prefixed(Prefix::PACKET_INFO));
    let body = ipv4(4);
    let mut nic = interface(config, &[prefixed(0x0001, 0x0800, &body), vec![0, 0, 8]]);

    let packet = nic.recv().unwrap_err().into_packet().unwrap();
    assert!(packet.is_truncated());
    // The body is handed out as read.
    assert_eq!(packet.body(), &body[..]);

    // Not even the prefix.
    assert!(matches!(nic.recv(), Err(RecvError::Other(Error::ShortRead))));
}

#[test]
fn packet_info_tag_not_ip() {
    let config = Config::default().shape(FrameShape::Prefixed(Prefix::PACKET_INFO));
    let mut nic = interface(config, &[prefixed(0, 0x0806, &[0; 28])]);
    assert!(matches!(nic.recv(), Err(RecvError::Other(Error::Wire(wire::Error::NotIp)))));
}

#[test]
fn packet_info_send() {
    let config = Config::default().shape(FrameShape::Prefixed(Prefix::PACKET_INFO));
    let mut nic = interface(config, &[]);
    let body = ipv6(0);
    nic.send(&Packet::from_ip(&body[..]).unwrap()).unwrap();

    let sent = &nic.conduit().sent()[0];
    assert_eq!(sent[..4], [0, 0, 0x86, 0xdd]);
    assert_eq!(sent[4..], body[..]);
    // The scratch buffer went back.
    assert_eq!(nic.pool().idle(), 1);
}

#[test]
fn tap_frames() {
    let config = Config::default().kind(Kind::Tap);
    let mut ip = ethernet(EthernetProtocol::Ipv4, &ipv4(4));
    ip.extend_from_slice(&[0; 6]);
    let arp = ethernet(EthernetProtocol::Arp, &[0x00, 0x01, 0x08, 0x00]);
    let short_ip = ethernet(EthernetProtocol::Ipv4, &ipv4(4)[..20]);
    let mut nic = interface(config, &[ip.clone(), arp.clone(), short_ip, vec![0xff; 13]]);

    let packet = nic.recv().unwrap();
    assert_eq!(packet.body(), &ip[..14 + 24]);
    assert_eq!(packet.ip_bytes().len(), 24);
    assert_eq!(packet.ip_proto(), (17, 20, false));
    assert!(packet.link_header().unwrap().dst_addr().is_broadcast());

    let packet = nic.recv().unwrap();
    assert_eq!(packet.protocol(), EthernetProtocol::Arp);
    assert_eq!(packet.body(), &arp[..]);
    assert_eq!(packet.src_addr(), None);

    let packet = nic.recv().unwrap_err().into_packet().unwrap();
    assert_eq!(packet.body().len(), 34);

    let packet = nic.recv().unwrap_err().into_packet().unwrap();
    assert!(packet.is_truncated());
    assert!(packet.link_header().is_none());
}

#[test]
fn config_builder() {
    let config = Config::default()
        .kind(Kind::Tap)
        .max_packet(1514)
        .pool_idle(4);
    assert_eq!(config.buffer_size(), 1514);
    assert_eq!(config.shape, FrameShape::Raw);

    let pool = Pool::new(64, 1);
    let nic = Interface::with_pool(Loopback::new(), config.shape(FrameShape::Prefixed(Prefix::PACKET_INFO)), pool);
    assert_eq!(nic.max_packet(), 60);
}
