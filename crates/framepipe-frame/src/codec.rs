use std::fmt;

use bytes::{Buf, BufMut};

use crate::code::code_name;
use crate::error::{FrameError, Result};

/// Total size of every frame on the wire.
pub const MESSAGE_SIZE: usize = 32;

/// Size of the leading message code.
pub const CODE_SIZE: usize = 4;

/// Size of the payload region following the code.
pub const PAYLOAD_SIZE: usize = MESSAGE_SIZE - CODE_SIZE;

/// One fixed-size frame.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────────────────────────┐
/// │ Code (4B LE) │ Payload (28B, kind-specific, zeroed)  │
/// └──────────────┴──────────────────────────────────────┘
/// ```
///
/// There is no length prefix or separator; framing comes from the fixed
/// size and the message-preserving transport.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawMessage {
    bytes: [u8; MESSAGE_SIZE],
}

impl RawMessage {
    /// A zero-filled frame carrying `code`.
    pub fn new(code: u32) -> Self {
        let mut bytes = [0u8; MESSAGE_SIZE];
        (&mut bytes[..CODE_SIZE]).put_u32_le(code);
        Self { bytes }
    }

    /// Copy a received buffer into a frame.
    ///
    /// Fails unless `src` is exactly [`MESSAGE_SIZE`] bytes.
    pub fn from_bytes(src: &[u8]) -> Result<Self> {
        let bytes: [u8; MESSAGE_SIZE] = src.try_into().map_err(|_| FrameError::WrongSize {
            size: src.len(),
            expected: MESSAGE_SIZE,
        })?;
        Ok(Self { bytes })
    }

    pub fn code(&self) -> u32 {
        (&self.bytes[..CODE_SIZE]).get_u32_le()
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[CODE_SIZE..]
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[CODE_SIZE..]
    }

    pub fn as_bytes(&self) -> &[u8; MESSAGE_SIZE] {
        &self.bytes
    }

    pub fn into_bytes(self) -> [u8; MESSAGE_SIZE] {
        self.bytes
    }

    /// Check that the frame carries `expected`.
    pub fn expect_code(&self, expected: u32) -> Result<()> {
        let actual = self.code();
        if actual == expected {
            Ok(())
        } else {
            Err(FrameError::CodeMismatch { expected, actual })
        }
    }
}

impl AsRef<[u8]> for RawMessage {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for RawMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawMessage")
            .field("code", &format_args!("{:#x}", self.code()))
            .field("kind", &code_name(self.code()))
            .field("payload", &self.payload())
            .finish()
    }
}
