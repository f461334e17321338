#![allow(unsafe_code)]
// Copyright (C) 2016 whitequark@whitequark.org
// Copyright (C) 2019 Andreas Molzer <andreas.molzer@tum.de>
//
// in large parts from `smoltcp` originally distributed under 0-clause BSD
//! File descriptor based conduits.
//!
//! Opening a tun or tap device, naming it, assigning addresses and bringing it up are the
//! business of the platform layer. Once it has an open descriptor it hands that over here.
use std::io;
use std::os::unix::io::{AsRawFd, FromRawFd, IntoRawFd, RawFd};

use super::Conduit;

/// A device file descriptor used as a conduit.
///
/// The descriptor is closed when the conduit is dropped.
#[derive(Debug)]
pub struct FdConduit {
    lower: RawFd,
}

#[derive(Clone, Copy)]
struct FdResult(pub libc::c_int);

#[derive(Clone, Copy)]
struct IoLenResult(pub libc::ssize_t);

/// Trait for interpreting integer return values.
///
/// All calls used here signal failure with `-1` and leave the reason in `errno`.
trait LibcResult: Copy {
    fn is_fail(self) -> bool;

    fn errno(self) -> io::Result<()> {
        if self.is_fail() {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}

impl LibcResult for FdResult {
    fn is_fail(self) -> bool {
        self.0 == -1
    }
}

impl LibcResult for IoLenResult {
    fn is_fail(self) -> bool {
        self.0 == -1
    }
}

impl FdConduit {
    /// Switch the descriptor between blocking and non-blocking reads and writes.
    ///
    /// In non-blocking mode an idle device fails reads with `io::ErrorKind::WouldBlock`.
    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        let flags = unsafe { libc::fcntl(self.lower, libc::F_GETFL) };
        FdResult(flags).errno()?;

        let flags = if nonblocking {
            flags | libc::O_NONBLOCK
        } else {
            flags & !libc::O_NONBLOCK
        };

        let res = unsafe { libc::fcntl(self.lower, libc::F_SETFL, flags) };
        FdResult(res).errno()
    }
}

impl Conduit for FdConduit {
    fn recv(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let len = unsafe {
            libc::read(
                self.lower,
                buffer.as_mut_ptr() as *mut libc::c_void,
                buffer.len())
        };
        IoLenResult(len).errno()?;
        Ok(len as usize)
    }

    fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        let len = unsafe {
            libc::write(
                self.lower,
                frame.as_ptr() as *const libc::c_void,
                frame.len())
        };
        IoLenResult(len).errno()?;
        Ok(len as usize)
    }
}

impl FromRawFd for FdConduit {
    /// Take ownership of an open device descriptor.
    unsafe fn from_raw_fd(lower: RawFd) -> Self {
        FdConduit { lower }
    }
}

impl AsRawFd for FdConduit {
    fn as_raw_fd(&self) -> RawFd {
        self.lower
    }
}

impl IntoRawFd for FdConduit {
    fn into_raw_fd(self) -> RawFd {
        let lower = self.lower;
        core::mem::forget(self);
        lower
    }
}

impl Drop for FdConduit {
    fn drop(&mut self) {
        unsafe { libc::close(self.lower); }
    }
}
