//! UDP broadcast transport.
//!
//! One frame per datagram, fire-and-forget. The socket is non-blocking so a
//! full send buffer surfaces as an error for that frame instead of stalling
//! the cycle.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use gdl90_core::Transport;

pub struct UdpBroadcast {
    socket: UdpSocket,
    dest: SocketAddr,
}

impl UdpBroadcast {
    /// Bind an ephemeral local port and target `dest:port`.
    pub fn bind(dest: IpAddr, port: u16) -> io::Result<Self> {
        let local: SocketAddr = match dest {
            IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local)?;
        socket.set_broadcast(true)?;
        socket.set_nonblocking(true)?;
        Ok(UdpBroadcast {
            socket,
            dest: SocketAddr::new(dest, port),
        })
    }

    pub fn dest(&self) -> SocketAddr {
        self.dest
    }
}

impl Transport for UdpBroadcast {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        let n = self.socket.send_to(frame, self.dest)?;
        if n != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short datagram: {n} of {} bytes", frame.len()),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
