//! Typed message kinds.
//!
//! Each kind owns a code and a field layout inside the 28-byte payload.
//! Layouts are checked at compile time: a kind whose fields do not fit the
//! payload fails to build.

use bytes::{Buf, BufMut};

use crate::code;
use crate::codec::{RawMessage, PAYLOAD_SIZE};
use crate::error::Result;

/// A message kind with a fixed payload layout.
pub trait MessageKind: Sized {
    /// Code carried in the first four bytes of the frame.
    const CODE: u32;

    /// Payload offset of the first field.
    const OFFSET: usize = 0;

    /// Bytes the fields occupy, starting at `OFFSET`.
    const ENCODED_LEN: usize;

    /// Write the fields. `dst` has room for at least `ENCODED_LEN` bytes.
    fn encode_fields<B: BufMut>(&self, dst: &mut B);

    /// Read the fields. `src` holds at least `ENCODED_LEN` bytes.
    fn decode_fields<B: Buf>(src: &mut B) -> Self;

    /// Build a zero-padded frame carrying this message.
    fn construct(&self) -> RawMessage {
        let mut message = RawMessage::new(Self::CODE);
        let mut dst = &mut message.payload_mut()[Self::OFFSET..];
        self.encode_fields(&mut dst);
        message
    }

    /// Read this kind back out of a frame, checking the code first.
    fn cast(message: &RawMessage) -> Result<Self> {
        message.expect_code(Self::CODE)?;
        let mut src = &message.payload()[Self::OFFSET..];
        Ok(Self::decode_fields(&mut src))
    }
}

macro_rules! assert_fits {
    ($($kind:ty),+ $(,)?) => {
        $(
            const _: () = assert!(
                <$kind as MessageKind>::OFFSET + <$kind as MessageKind>::ENCODED_LEN <= PAYLOAD_SIZE,
                concat!(stringify!($kind), " does not fit the message payload"),
            );
        )+
    };
}

macro_rules! unit_kind {
    ($(#[$meta:meta])* $name:ident => $code:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        pub struct $name;

        impl MessageKind for $name {
            const CODE: u32 = $code;
            const ENCODED_LEN: usize = 0;

            fn encode_fields<B: BufMut>(&self, _dst: &mut B) {}

            fn decode_fields<B: Buf>(_src: &mut B) -> Self {
                $name
            }
        }
    };
}

unit_kind!(
    /// The client committed a new buffer.
    BufferCommit => code::BUFFER_COMMIT
);
unit_kind!(
    /// The host finished presenting a frame.
    FrameComplete => code::FRAME_COMPLETE
);
unit_kind!(
    /// The receiving side should shut down.
    Quit => code::QUIT
);

/// Requested surface size and window style.
///
/// The fields sit after a 16-byte reserved region, so `width` lands at
/// frame offset 20, `height` at 24 and `style` at 28.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SetSizeAndStyle {
    pub width: i32,
    pub height: i32,
    pub style: i32,
}

impl MessageKind for SetSizeAndStyle {
    const CODE: u32 = code::SET_SIZE_AND_STYLE;
    const OFFSET: usize = 16;
    const ENCODED_LEN: usize = 12;

    fn encode_fields<B: BufMut>(&self, dst: &mut B) {
        dst.put_i32_le(self.width);
        dst.put_i32_le(self.height);
        dst.put_i32_le(self.style);
    }

    fn decode_fields<B: Buf>(src: &mut B) -> Self {
        Self {
            width: src.get_i32_le(),
            height: src.get_i32_le(),
            style: src.get_i32_le(),
        }
    }
}

/// New host view size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Resize {
    pub width: i32,
    pub height: i32,
}

impl MessageKind for Resize {
    const CODE: u32 = code::RESIZE;
    const ENCODED_LEN: usize = 8;

    fn encode_fields<B: BufMut>(&self, dst: &mut B) {
        dst.put_i32_le(self.width);
        dst.put_i32_le(self.height);
    }

    fn decode_fields<B: Buf>(src: &mut B) -> Self {
        Self {
            width: src.get_i32_le(),
            height: src.get_i32_le(),
        }
    }
}

/// Scroll or other axis motion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AxisEvent {
    pub event_type: u32,
    pub time: u32,
    pub x: i32,
    pub y: i32,
    pub axis: u32,
    pub value: i32,
    pub modifiers: u32,
}

impl MessageKind for AxisEvent {
    const CODE: u32 = code::AXIS;
    const ENCODED_LEN: usize = 28;

    fn encode_fields<B: BufMut>(&self, dst: &mut B) {
        dst.put_u32_le(self.event_type);
        dst.put_u32_le(self.time);
        dst.put_i32_le(self.x);
        dst.put_i32_le(self.y);
        dst.put_u32_le(self.axis);
        dst.put_i32_le(self.value);
        dst.put_u32_le(self.modifiers);
    }

    fn decode_fields<B: Buf>(src: &mut B) -> Self {
        Self {
            event_type: src.get_u32_le(),
            time: src.get_u32_le(),
            x: src.get_i32_le(),
            y: src.get_i32_le(),
            axis: src.get_u32_le(),
            value: src.get_i32_le(),
            modifiers: src.get_u32_le(),
        }
    }
}

/// Pointer motion or button change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PointerEvent {
    pub event_type: u32,
    pub time: u32,
    pub x: i32,
    pub y: i32,
    pub button: u32,
    pub state: u32,
    pub modifiers: u32,
}

impl MessageKind for PointerEvent {
    const CODE: u32 = code::POINTER;
    const ENCODED_LEN: usize = 28;

    fn encode_fields<B: BufMut>(&self, dst: &mut B) {
        dst.put_u32_le(self.event_type);
        dst.put_u32_le(self.time);
        dst.put_i32_le(self.x);
        dst.put_i32_le(self.y);
        dst.put_u32_le(self.button);
        dst.put_u32_le(self.state);
        dst.put_u32_le(self.modifiers);
    }

    fn decode_fields<B: Buf>(src: &mut B) -> Self {
        Self {
            event_type: src.get_u32_le(),
            time: src.get_u32_le(),
            x: src.get_i32_le(),
            y: src.get_i32_le(),
            button: src.get_u32_le(),
            state: src.get_u32_le(),
            modifiers: src.get_u32_le(),
        }
    }
}

/// Fields shared by processed and raw touch events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TouchPoint {
    pub event_type: u32,
    pub time: u32,
    pub id: i32,
    pub x: i32,
    pub y: i32,
}

impl TouchPoint {
    const ENCODED_LEN: usize = 20;

    fn put<B: BufMut>(&self, dst: &mut B) {
        dst.put_u32_le(self.event_type);
        dst.put_u32_le(self.time);
        dst.put_i32_le(self.id);
        dst.put_i32_le(self.x);
        dst.put_i32_le(self.y);
    }

    fn get<B: Buf>(src: &mut B) -> Self {
        Self {
            event_type: src.get_u32_le(),
            time: src.get_u32_le(),
            id: src.get_i32_le(),
            x: src.get_i32_le(),
            y: src.get_i32_le(),
        }
    }
}

/// Touch event after gesture processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TouchEvent(pub TouchPoint);

/// Touch event straight from the digitizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RawTouchEvent(pub TouchPoint);

impl MessageKind for TouchEvent {
    const CODE: u32 = code::TOUCH;
    const ENCODED_LEN: usize = TouchPoint::ENCODED_LEN;

    fn encode_fields<B: BufMut>(&self, dst: &mut B) {
        self.0.put(dst);
    }

    fn decode_fields<B: Buf>(src: &mut B) -> Self {
        Self(TouchPoint::get(src))
    }
}

impl MessageKind for RawTouchEvent {
    const CODE: u32 = code::RAW_TOUCH;
    const ENCODED_LEN: usize = TouchPoint::ENCODED_LEN;

    fn encode_fields<B: BufMut>(&self, dst: &mut B) {
        self.0.put(dst);
    }

    fn decode_fields<B: Buf>(src: &mut B) -> Self {
        Self(TouchPoint::get(src))
    }
}

/// Key press or release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct KeyboardEvent {
    pub time: u32,
    pub key_code: u32,
    pub hardware_key_code: u32,
    pub pressed: bool,
    pub modifiers: u32,
}

impl MessageKind for KeyboardEvent {
    const CODE: u32 = code::KEYBOARD;
    const ENCODED_LEN: usize = 20;

    fn encode_fields<B: BufMut>(&self, dst: &mut B) {
        dst.put_u32_le(self.time);
        dst.put_u32_le(self.key_code);
        dst.put_u32_le(self.hardware_key_code);
        dst.put_u32_le(u32::from(self.pressed));
        dst.put_u32_le(self.modifiers);
    }

    fn decode_fields<B: Buf>(src: &mut B) -> Self {
        Self {
            time: src.get_u32_le(),
            key_code: src.get_u32_le(),
            hardware_key_code: src.get_u32_le(),
            pressed: src.get_u32_le() != 0,
            modifiers: src.get_u32_le(),
        }
    }
}

assert_fits!(
    BufferCommit,
    FrameComplete,
    Quit,
    SetSizeAndStyle,
    Resize,
    AxisEvent,
    PointerEvent,
    TouchEvent,
    RawTouchEvent,
    KeyboardEvent,
);
