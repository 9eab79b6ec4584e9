/// Errors that can occur while decoding a message frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The buffer is not exactly one frame long.
    #[error("wrong frame size ({size} bytes, expected {expected})")]
    WrongSize { size: usize, expected: usize },

    /// The frame carries a code no known message kind uses.
    #[error("unknown message code {0:#x}")]
    UnknownCode(u32),

    /// The frame was decoded as a kind whose code it does not carry.
    #[error("message code {actual:#x} does not match expected {expected:#x}")]
    CodeMismatch { expected: u32, actual: u32 },
}

pub type Result<T> = std::result::Result<T, FrameError>;
