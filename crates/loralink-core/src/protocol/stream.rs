//! Byte-channel abstraction
//!
//! The transport engine never touches hardware types directly; it drives a
//! [`ByteChannel`], which the production code backs with a serial port and
//! the tests back with an in-memory double.

use serialport::SerialPort;
use std::io::{self, Read, Write};

/// A full-duplex, non-blocking byte pipe.
pub trait ByteChannel {
    /// Write the whole buffer or fail.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Append every byte currently available for reading to `buf` and
    /// return how many were added. Never blocks waiting for data.
    fn read_available(&mut self, buf: &mut Vec<u8>) -> io::Result<usize>;

    /// Number of bytes waiting to be read.
    fn bytes_to_read(&mut self) -> io::Result<u32>;
}

/// Serial port wrapper implementing [`ByteChannel`]
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
    scratch: [u8; 256],
}

impl SerialChannel {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self {
            port,
            scratch: [0; 256],
        }
    }
}

impl ByteChannel for SerialChannel {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()
    }

    fn read_available(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        let mut added = 0;
        loop {
            let available = self
                .port
                .bytes_to_read()
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            if available == 0 {
                return Ok(added);
            }

            let want = (available as usize).min(self.scratch.len());
            match self.port.read(&mut self.scratch[..want]) {
                Ok(0) => return Ok(added),
                Ok(n) => {
                    buf.extend_from_slice(&self.scratch[..n]);
                    added += n;
                }
                Err(ref e)
                    if e.kind() == io::ErrorKind::TimedOut
                        || e.kind() == io::ErrorKind::WouldBlock =>
                {
                    return Ok(added);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn bytes_to_read(&mut self) -> io::Result<u32> {
        self.port
            .bytes_to_read()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}
