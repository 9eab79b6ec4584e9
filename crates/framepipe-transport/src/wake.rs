use std::io::{self, Write};
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

/// A one-shot wake-up for threads blocked in a pipe wait.
///
/// Closing a socket does not reliably interrupt a thread already parked in
/// `poll(2)` on it, so every wait also watches one of these. Once signalled
/// it stays readable forever; pipes are never reopened after close.
#[derive(Debug)]
pub struct WakeSignal {
    rx: UnixStream,
    tx: UnixStream,
    signalled: AtomicBool,
}

impl WakeSignal {
    pub fn new() -> io::Result<Self> {
        let (tx, rx) = UnixStream::pair()?;
        tx.set_nonblocking(true)?;
        rx.set_nonblocking(true)?;
        Ok(Self {
            rx,
            tx,
            signalled: AtomicBool::new(false),
        })
    }

    /// Wake every current and future waiter. Repeated calls are no-ops.
    pub fn signal(&self) {
        if self.signalled.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(err) = (&self.tx).write(&[1]) {
            // Only WouldBlock is plausible here and it means a byte is already queued.
            trace!(error = %err, "wake signal write failed");
        }
    }

    pub fn is_signalled(&self) -> bool {
        self.signalled.load(Ordering::SeqCst)
    }

    /// The descriptor waiters poll for readability.
    pub(crate) fn as_fd(&self) -> BorrowedFd<'_> {
        self.rx.as_fd()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::sys::{wait, Interest, Readiness};

    #[test]
    fn signal_is_sticky_and_idempotent() {
        let wake = WakeSignal::new().unwrap();
        assert!(!wake.is_signalled());
        wake.signal();
        wake.signal();
        assert!(wake.is_signalled());

        let (a, _b) = UnixStream::pair().unwrap();
        for _ in 0..2 {
            let ready = wait(
                a.as_fd(),
                Interest::Read,
                wake.as_fd(),
                Some(Duration::from_millis(50)),
            )
            .unwrap();
            assert_eq!(ready, Readiness::Woken);
        }
    }
}
