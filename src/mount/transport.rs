/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Byte transports for mount controllers: TCP and UDP sockets always, serial
//! ports behind the `serial` feature, and a scripted transport for tests.
//!
//! Every read takes an explicit deadline; expiry surfaces as
//! [`MountError::TimedOut`] and leaves the stream in a state where the next
//! command's drain step resynchronizes the framing.

use crate::errors::{MountError, MountResult};
use bytes::BytesMut;
use log::debug;
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

/// Serial line settings. Mount protocols are all 8 data bits, no parity,
/// one stop bit; only the baud rate varies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self { baud: 9600 }
    }
}

pub enum Transport {
    Tcp(TcpStream),
    Udp(UdpSocket),
    #[cfg(feature = "serial")]
    Serial(Box<dyn serialport::SerialPort>),
    /// Scripted transport for protocol tests: reads are served from `rx`,
    /// writes accumulate in `tx`.
    #[cfg(test)]
    Mock {
        rx: std::collections::VecDeque<u8>,
        tx: Vec<u8>,
    },
}

impl Transport {
    /// Opens a TCP connection to `host:port` with a connect timeout.
    pub fn open_tcp(host: &str, port: u16, timeout_ms: u64) -> MountResult<Self> {
        let addrs: Vec<_> = (host, port)
            .to_socket_addrs()
            .map_err(|_| MountError::OpenFail)?
            .collect();
        for addr in addrs {
            if let Ok(stream) =
                TcpStream::connect_timeout(&addr, Duration::from_millis(timeout_ms))
            {
                stream.set_nodelay(true).ok();
                debug!("connected to {addr}");
                return Ok(Self::Tcp(stream));
            }
        }
        Err(MountError::OpenFail)
    }

    /// Opens a UDP socket "connected" to `host:port`.
    pub fn open_udp(host: &str, port: u16) -> MountResult<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|_| MountError::OpenFail)?;
        socket
            .connect((host, port))
            .map_err(|_| MountError::OpenFail)?;
        Ok(Self::Udp(socket))
    }

    /// Opens a serial port with the given settings.
    #[cfg(feature = "serial")]
    pub fn open_serial(path: &str, config: SerialConfig) -> MountResult<Self> {
        let port = serialport::new(path, config.baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(Duration::from_millis(50))
            .open()
            .map_err(|_| MountError::OpenFail)?;
        Ok(Self::Serial(port))
    }

    #[cfg(test)]
    pub(crate) fn mock(responses: &[u8]) -> Self {
        Self::Mock {
            rx: responses.iter().copied().collect(),
            tx: Vec::new(),
        }
    }

    /// Discards any unsolicited bytes waiting in the input buffer.
    pub fn drain(&mut self) -> MountResult<()> {
        let mut junk = [0_u8; 256];
        loop {
            match self.read_available(&mut junk)? {
                0 => return Ok(()),
                n => debug!("drained {n} unsolicited bytes"),
            }
        }
    }

    /// Non-blocking read of whatever is immediately available.
    fn read_available(&mut self, buf: &mut [u8]) -> MountResult<usize> {
        match self {
            Self::Tcp(stream) => {
                stream
                    .set_read_timeout(Some(Duration::from_millis(1)))
                    .map_err(|_| MountError::ReadFail)?;
                match stream.read(buf) {
                    Ok(0) => Err(MountError::ReadFail), // orderly shutdown
                    Ok(n) => Ok(n),
                    Err(e) if would_block(&e) => Ok(0),
                    Err(_) => Err(MountError::ReadFail),
                }
            }
            Self::Udp(socket) => {
                socket
                    .set_read_timeout(Some(Duration::from_millis(1)))
                    .map_err(|_| MountError::ReadFail)?;
                match socket.recv(buf) {
                    Ok(n) => Ok(n),
                    Err(e) if would_block(&e) => Ok(0),
                    Err(_) => Err(MountError::ReadFail),
                }
            }
            #[cfg(feature = "serial")]
            Self::Serial(port) => {
                let waiting = port.bytes_to_read().map_err(|_| MountError::ReadFail)?;
                if waiting == 0 {
                    return Ok(0);
                }
                let n = (waiting as usize).min(buf.len());
                port.read(&mut buf[..n]).map_err(|_| MountError::ReadFail)
            }
            #[cfg(test)]
            Self::Mock { .. } => Ok(0), // scripted replies are never drained
        }
    }

    /// Writes the whole buffer.
    pub fn write_all(&mut self, data: &[u8]) -> MountResult<()> {
        match self {
            Self::Tcp(stream) => stream.write_all(data).map_err(|_| MountError::WriteFail),
            Self::Udp(socket) => socket
                .send(data)
                .map_err(|_| MountError::WriteFail)
                .and_then(|n| {
                    if n == data.len() {
                        Ok(())
                    } else {
                        Err(MountError::WriteFail)
                    }
                }),
            #[cfg(feature = "serial")]
            Self::Serial(port) => port.write_all(data).map_err(|_| MountError::WriteFail),
            #[cfg(test)]
            Self::Mock { tx, .. } => {
                tx.extend_from_slice(data);
                Ok(())
            }
        }
    }

    /// Reads until a terminator byte arrives, `max_len` bytes accumulate, or
    /// the deadline passes. Returns the bytes read (terminator included).
    pub fn read_until(
        &mut self,
        term: Option<u8>,
        max_len: usize,
        timeout_ms: u64,
    ) -> MountResult<BytesMut> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut out = BytesMut::with_capacity(max_len.min(1024));
        let mut byte = [0_u8; 1];

        while out.len() < max_len {
            let now = Instant::now();
            if now >= deadline {
                return Err(MountError::TimedOut);
            }
            let remaining = deadline - now;

            let n = match self {
                Self::Tcp(stream) => {
                    stream
                        .set_read_timeout(Some(remaining))
                        .map_err(|_| MountError::ReadFail)?;
                    match stream.read(&mut byte) {
                        Ok(0) => return Err(MountError::ReadFail),
                        Ok(n) => n,
                        Err(e) if would_block(&e) => return Err(MountError::TimedOut),
                        Err(_) => return Err(MountError::ReadFail),
                    }
                }
                Self::Udp(socket) => {
                    socket
                        .set_read_timeout(Some(remaining))
                        .map_err(|_| MountError::ReadFail)?;
                    match socket.recv(&mut byte) {
                        Ok(n) => n,
                        Err(e) if would_block(&e) => return Err(MountError::TimedOut),
                        Err(_) => return Err(MountError::ReadFail),
                    }
                }
                #[cfg(feature = "serial")]
                Self::Serial(port) => match port.read(&mut byte) {
                    Ok(n) => n,
                    Err(e) if e.kind() == ErrorKind::TimedOut => continue,
                    Err(_) => return Err(MountError::ReadFail),
                },
                #[cfg(test)]
                Self::Mock { rx, .. } => match rx.pop_front() {
                    Some(b) => {
                        byte[0] = b;
                        1
                    }
                    None => return Err(MountError::TimedOut),
                },
            };

            if n == 0 {
                continue;
            }
            out.extend_from_slice(&byte);
            if let Some(t) = term {
                if byte[0] == t {
                    break;
                }
            }
        }

        Ok(out)
    }

    #[cfg(test)]
    pub(crate) fn written(&self) -> &[u8] {
        match self {
            Self::Mock { tx, .. } => tx,
            _ => &[],
        }
    }
}

fn would_block(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}
