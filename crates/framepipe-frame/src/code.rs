//! Message codes.
//!
//! Codes below 0x30 are renderer control messages; 0x30 and up carry input
//! events.

/// The client committed a new buffer.
pub const BUFFER_COMMIT: u32 = 0x01;

/// The host finished presenting a frame.
pub const FRAME_COMPLETE: u32 = 0x02;

/// Target size and window style update.
pub const SET_SIZE_AND_STYLE: u32 = 0x03;

/// The host view was resized.
pub const RESIZE: u32 = 0x10;

/// The peer should shut down.
pub const QUIT: u32 = 0x11;

/// Mouse wheel / axis event.
pub const AXIS: u32 = 0x30;

/// Pointer motion or button event.
pub const POINTER: u32 = 0x31;

/// Touch event for a single touch point.
pub const TOUCH: u32 = 0x32;

/// Raw touch point without gesture processing.
pub const RAW_TOUCH: u32 = 0x33;

/// Keyboard event.
pub const KEYBOARD: u32 = 0x34;

/// First input-event code.
pub const INPUT_CODE_START: u32 = AXIS;

/// Every code with a known message kind, in ascending order.
pub const KNOWN_CODES: [u32; 10] = [
    BUFFER_COMMIT,
    FRAME_COMPLETE,
    SET_SIZE_AND_STYLE,
    RESIZE,
    QUIT,
    AXIS,
    POINTER,
    TOUCH,
    RAW_TOUCH,
    KEYBOARD,
];

/// Returns a human-readable name for a message code.
pub fn code_name(code: u32) -> &'static str {
    match code {
        BUFFER_COMMIT => "BUFFER_COMMIT",
        FRAME_COMPLETE => "FRAME_COMPLETE",
        SET_SIZE_AND_STYLE => "SET_SIZE_AND_STYLE",
        RESIZE => "RESIZE",
        QUIT => "QUIT",
        AXIS => "AXIS",
        POINTER => "POINTER",
        TOUCH => "TOUCH",
        RAW_TOUCH => "RAW_TOUCH",
        KEYBOARD => "KEYBOARD",
        _ => "UNKNOWN",
    }
}

/// Returns true if the code carries an input event.
pub fn is_input(code: u32) -> bool {
    (INPUT_CODE_START..=KEYBOARD).contains(&code)
}
