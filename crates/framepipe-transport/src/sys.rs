//! Thin wrappers over the `AF_UNIX` / `SOCK_SEQPACKET` syscalls.
//!
//! Everything here returns `std::io::Result`; mapping to [`TransportError`]
//! happens in the pipe layer where the pipe name is known.
//!
//! [`TransportError`]: crate::TransportError

use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::time::{Duration, Instant};

use crate::name::PipeName;

#[cfg(target_os = "linux")]
const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(target_os = "linux"))]
const SEND_FLAGS: libc::c_int = 0;

// On Linux MSG_TRUNC makes recvmsg report the full datagram length even when
// the buffer was too small. Elsewhere only the returned msg_flags say so.
#[cfg(target_os = "linux")]
const RECV_FLAGS: libc::c_int = libc::MSG_TRUNC;
#[cfg(not(target_os = "linux"))]
const RECV_FLAGS: libc::c_int = 0;

/// Outcome of a wait on a pipe descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    Ready,
    Woken,
    TimedOut,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Interest {
    Read,
    Write,
}

fn check(rc: libc::c_int) -> io::Result<()> {
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Create a blocking, close-on-exec seqpacket socket.
pub(crate) fn seqpacket_socket() -> io::Result<OwnedFd> {
    // SAFETY: plain syscall with constant arguments; the result is checked below.
    let raw = unsafe { libc::socket(libc::AF_UNIX, libc::SOCK_SEQPACKET, 0) };
    if raw < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: `raw` is a freshly created descriptor that nothing else owns.
    let fd = unsafe { OwnedFd::from_raw_fd(raw) };
    set_cloexec(&fd)?;
    Ok(fd)
}

fn set_cloexec(fd: &OwnedFd) -> io::Result<()> {
    let raw = fd.as_raw_fd();
    // SAFETY: `raw` is an open descriptor owned by `fd`.
    let flags = unsafe { libc::fcntl(raw, libc::F_GETFD) };
    check(flags)?;
    // SAFETY: as above; only the FD_CLOEXEC bit is added.
    check(unsafe { libc::fcntl(raw, libc::F_SETFD, flags | libc::FD_CLOEXEC) })
}

pub(crate) fn set_nonblocking(fd: &OwnedFd) -> io::Result<()> {
    let raw = fd.as_raw_fd();
    // SAFETY: `raw` is an open descriptor owned by `fd`.
    let flags = unsafe { libc::fcntl(raw, libc::F_GETFL) };
    check(flags)?;
    // SAFETY: as above; only the O_NONBLOCK bit is added.
    check(unsafe { libc::fcntl(raw, libc::F_SETFL, flags | libc::O_NONBLOCK) })
}

fn empty_address() -> libc::sockaddr_un {
    // SAFETY: sockaddr_un is plain old data and all-zero is a valid value.
    let mut addr: libc::sockaddr_un = unsafe { std::mem::zeroed() };
    addr.sun_family = libc::AF_UNIX as libc::sa_family_t;
    addr
}

/// Longest address (including any trailing NUL) `sun_path` can hold.
pub(crate) fn max_address_len() -> usize {
    empty_address().sun_path.len()
}

/// Bytes of `sun_path` a name occupies. Path names need a trailing NUL.
pub(crate) fn address_len(name: &PipeName) -> usize {
    let len = name.address_bytes().len();
    if name.is_abstract() {
        len
    } else {
        len + 1
    }
}

fn socket_address(name: &PipeName) -> io::Result<(libc::sockaddr_un, libc::socklen_t)> {
    let mut addr = empty_address();
    let bytes = name.address_bytes();
    let used = address_len(name);
    if used > addr.sun_path.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "socket address too long",
        ));
    }
    for (dst, src) in addr.sun_path.iter_mut().zip(bytes.iter()) {
        *dst = *src as libc::c_char;
    }
    let len = std::mem::offset_of!(libc::sockaddr_un, sun_path) + used;
    Ok((addr, len as libc::socklen_t))
}

/// Bind `fd` to `name` and start listening with a backlog of one client.
pub(crate) fn bind_and_listen(fd: &OwnedFd, name: &PipeName) -> io::Result<()> {
    let (addr, len) = socket_address(name)?;
    // SAFETY: `addr` is a valid sockaddr_un and `len` covers its initialised prefix.
    check(unsafe {
        libc::bind(
            fd.as_raw_fd(),
            (&addr as *const libc::sockaddr_un).cast::<libc::sockaddr>(),
            len,
        )
    })?;
    // SAFETY: `fd` is a bound socket descriptor.
    check(unsafe { libc::listen(fd.as_raw_fd(), 1) })
}

pub(crate) fn connect(fd: &OwnedFd, name: &PipeName) -> io::Result<()> {
    let (addr, len) = socket_address(name)?;
    loop {
        // SAFETY: `addr` is a valid sockaddr_un and `len` covers its initialised prefix.
        let rc = unsafe {
            libc::connect(
                fd.as_raw_fd(),
                (&addr as *const libc::sockaddr_un).cast::<libc::sockaddr>(),
                len,
            )
        };
        match check(rc) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Accept one pending client; the returned descriptor is non-blocking.
pub(crate) fn accept(listener: &OwnedFd) -> io::Result<OwnedFd> {
    // SAFETY: `listener` is a listening socket; the peer address is not requested.
    let raw = unsafe {
        libc::accept(
            listener.as_raw_fd(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
        )
    };
    if raw < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: `raw` is a freshly accepted descriptor that nothing else owns.
    let fd = unsafe { OwnedFd::from_raw_fd(raw) };
    set_cloexec(&fd)?;
    set_nonblocking(&fd)?;
    Ok(fd)
}

pub(crate) fn send(fd: BorrowedFd<'_>, buf: &[u8]) -> io::Result<usize> {
    // SAFETY: `buf` is valid for reads of `buf.len()` bytes for the whole call.
    let rc = unsafe { libc::send(fd.as_raw_fd(), buf.as_ptr().cast(), buf.len(), SEND_FLAGS) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc as usize)
    }
}

/// Receive one datagram.
///
/// A datagram that did not fit reports a length greater than `buf.len()`:
/// the exact length on Linux, `buf.len() + 1` where the kernel does not say.
pub(crate) fn recv(fd: BorrowedFd<'_>, buf: &mut [u8]) -> io::Result<usize> {
    let mut iov = libc::iovec {
        iov_base: buf.as_mut_ptr().cast(),
        iov_len: buf.len(),
    };
    // SAFETY: msghdr is plain old data and all-zero is a valid value.
    let mut msg: libc::msghdr = unsafe { std::mem::zeroed() };
    msg.msg_iov = &mut iov;
    msg.msg_iovlen = 1;

    // SAFETY: `msg` points at one iovec covering `buf`, which is valid for
    // writes of `buf.len()` bytes for the whole call.
    let rc = unsafe { libc::recvmsg(fd.as_raw_fd(), &mut msg, RECV_FLAGS) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    let len = rc as usize;
    if msg.msg_flags & libc::MSG_TRUNC != 0 && len <= buf.len() {
        Ok(buf.len().saturating_add(1))
    } else {
        Ok(len)
    }
}

pub(crate) fn shutdown(fd: BorrowedFd<'_>) -> io::Result<()> {
    // SAFETY: `fd` is an open socket descriptor.
    match check(unsafe { libc::shutdown(fd.as_raw_fd(), libc::SHUT_RDWR) }) {
        Err(err) if err.raw_os_error() == Some(libc::ENOTCONN) => Ok(()),
        other => other,
    }
}

fn timeout_millis(deadline: Option<Instant>) -> libc::c_int {
    match deadline {
        None => -1,
        Some(deadline) => {
            let remaining = deadline.saturating_duration_since(Instant::now());
            // Round up so a sub-millisecond remainder does not spin.
            let millis = remaining.as_nanos().div_ceil(1_000_000);
            millis.min(libc::c_int::MAX as u128) as libc::c_int
        }
    }
}

/// Block until `fd` is ready for `interest`, `wake` is signalled, or the
/// timeout passes. A signalled wake wins over readiness.
pub(crate) fn wait(
    fd: BorrowedFd<'_>,
    interest: Interest,
    wake: BorrowedFd<'_>,
    timeout: Option<Duration>,
) -> io::Result<Readiness> {
    let deadline = timeout.map(|timeout| Instant::now() + timeout);
    let events = match interest {
        Interest::Read => libc::POLLIN,
        Interest::Write => libc::POLLOUT,
    };

    loop {
        let mut fds = [
            libc::pollfd {
                fd: fd.as_raw_fd(),
                events,
                revents: 0,
            },
            libc::pollfd {
                fd: wake.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            },
        ];

        // SAFETY: `fds` is a valid array of pollfd entries for the duration of the call.
        let rc = unsafe {
            libc::poll(
                fds.as_mut_ptr(),
                fds.len() as libc::nfds_t,
                timeout_millis(deadline),
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }

        if fds[1].revents != 0 {
            return Ok(Readiness::Woken);
        }
        if fds[0].revents != 0 {
            return Ok(Readiness::Ready);
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Ok(Readiness::TimedOut);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::os::fd::AsFd;
    use std::os::unix::net::UnixStream;

    use super::*;

    #[test]
    fn wait_times_out_without_activity() {
        let (a, _b) = UnixStream::pair().unwrap();
        let (wake_rx, _wake_tx) = UnixStream::pair().unwrap();

        let start = Instant::now();
        let ready = wait(
            a.as_fd(),
            Interest::Read,
            wake_rx.as_fd(),
            Some(Duration::from_millis(20)),
        )
        .unwrap();
        assert_eq!(ready, Readiness::TimedOut);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn wake_takes_priority_over_readiness() {
        use std::io::Write;

        let (a, mut b) = UnixStream::pair().unwrap();
        let (wake_rx, mut wake_tx) = UnixStream::pair().unwrap();
        b.write_all(b"x").unwrap();
        wake_tx.write_all(b"w").unwrap();

        let ready = wait(a.as_fd(), Interest::Read, wake_rx.as_fd(), None).unwrap();
        assert_eq!(ready, Readiness::Woken);
    }

    #[test]
    fn truncated_datagram_reports_longer_than_buffer() {
        use std::os::unix::net::UnixDatagram;

        let (a, b) = UnixDatagram::pair().unwrap();
        b.send(&[5u8; 33]).unwrap();
        b.send(&[6u8; 32]).unwrap();

        let mut buf = [0u8; 32];
        assert!(recv(a.as_fd(), &mut buf).unwrap() > 32);
        assert_eq!(recv(a.as_fd(), &mut buf).unwrap(), 32);
        assert!(buf.iter().all(|b| *b == 6));
    }

    #[test]
    fn address_len_fits_platform_limit() {
        assert!(address_len(&PipeName::new(u32::MAX)) <= max_address_len());
    }
}
