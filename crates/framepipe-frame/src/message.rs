use crate::code;
use crate::codec::{RawMessage, MESSAGE_SIZE};
use crate::error::{FrameError, Result};
use crate::kinds::{
    AxisEvent, BufferCommit, FrameComplete, KeyboardEvent, MessageKind, PointerEvent, Quit,
    RawTouchEvent, Resize, SetSizeAndStyle, TouchEvent,
};

/// Any message with a known code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum Message {
    BufferCommit,
    FrameComplete,
    SetSizeAndStyle(SetSizeAndStyle),
    Resize(Resize),
    Quit,
    Axis(AxisEvent),
    Pointer(PointerEvent),
    Touch(TouchEvent),
    RawTouch(RawTouchEvent),
    Keyboard(KeyboardEvent),
}

impl Message {
    pub fn code(&self) -> u32 {
        match self {
            Message::BufferCommit => BufferCommit::CODE,
            Message::FrameComplete => FrameComplete::CODE,
            Message::SetSizeAndStyle(_) => SetSizeAndStyle::CODE,
            Message::Resize(_) => Resize::CODE,
            Message::Quit => Quit::CODE,
            Message::Axis(_) => AxisEvent::CODE,
            Message::Pointer(_) => PointerEvent::CODE,
            Message::Touch(_) => TouchEvent::CODE,
            Message::RawTouch(_) => RawTouchEvent::CODE,
            Message::Keyboard(_) => KeyboardEvent::CODE,
        }
    }

    pub fn name(&self) -> &'static str {
        code::code_name(self.code())
    }

    /// Encode into a zero-padded frame.
    pub fn encode(&self) -> RawMessage {
        match self {
            Message::BufferCommit => BufferCommit.construct(),
            Message::FrameComplete => FrameComplete.construct(),
            Message::SetSizeAndStyle(m) => m.construct(),
            Message::Resize(m) => m.construct(),
            Message::Quit => Quit.construct(),
            Message::Axis(m) => m.construct(),
            Message::Pointer(m) => m.construct(),
            Message::Touch(m) => m.construct(),
            Message::RawTouch(m) => m.construct(),
            Message::Keyboard(m) => m.construct(),
        }
    }

    /// Decode one received buffer.
    ///
    /// The buffer must be exactly [`MESSAGE_SIZE`] bytes and carry a known
    /// code.
    pub fn decode(src: &[u8]) -> Result<Self> {
        Self::from_raw(&RawMessage::from_bytes(src)?)
    }

    pub fn from_raw(raw: &RawMessage) -> Result<Self> {
        let message = match raw.code() {
            code::BUFFER_COMMIT => Message::BufferCommit,
            code::FRAME_COMPLETE => Message::FrameComplete,
            code::SET_SIZE_AND_STYLE => Message::SetSizeAndStyle(SetSizeAndStyle::cast(raw)?),
            code::RESIZE => Message::Resize(Resize::cast(raw)?),
            code::QUIT => Message::Quit,
            code::AXIS => Message::Axis(AxisEvent::cast(raw)?),
            code::POINTER => Message::Pointer(PointerEvent::cast(raw)?),
            code::TOUCH => Message::Touch(TouchEvent::cast(raw)?),
            code::RAW_TOUCH => Message::RawTouch(RawTouchEvent::cast(raw)?),
            code::KEYBOARD => Message::Keyboard(KeyboardEvent::cast(raw)?),
            other => return Err(FrameError::UnknownCode(other)),
        };
        Ok(message)
    }

    /// Encode straight to wire bytes.
    pub fn to_bytes(&self) -> [u8; MESSAGE_SIZE] {
        self.encode().into_bytes()
    }
}

impl From<SetSizeAndStyle> for Message {
    fn from(m: SetSizeAndStyle) -> Self {
        Message::SetSizeAndStyle(m)
    }
}

impl From<Resize> for Message {
    fn from(m: Resize) -> Self {
        Message::Resize(m)
    }
}

impl From<AxisEvent> for Message {
    fn from(m: AxisEvent) -> Self {
        Message::Axis(m)
    }
}

impl From<PointerEvent> for Message {
    fn from(m: PointerEvent) -> Self {
        Message::Pointer(m)
    }
}

impl From<TouchEvent> for Message {
    fn from(m: TouchEvent) -> Self {
        Message::Touch(m)
    }
}

impl From<RawTouchEvent> for Message {
    fn from(m: RawTouchEvent) -> Self {
        Message::RawTouch(m)
    }
}

impl From<KeyboardEvent> for Message {
    fn from(m: KeyboardEvent) -> Self {
        Message::Keyboard(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::TouchPoint;

    #[test]
    fn set_size_scenario_bytes() {
        let bytes = Message::from(SetSizeAndStyle {
            width: 800,
            height: 600,
            style: 0,
        })
        .to_bytes();

        let mut expected = [0u8; MESSAGE_SIZE];
        expected[0] = 0x03;
        expected[20..24].copy_from_slice(&800i32.to_le_bytes());
        expected[24..28].copy_from_slice(&600i32.to_le_bytes());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn decode_quit() {
        let mut bytes = [0u8; MESSAGE_SIZE];
        bytes[0] = 0x11;
        assert_eq!(Message::decode(&bytes), Ok(Message::Quit));
    }

    #[test]
    fn decode_rejects_wrong_size() {
        let bytes = Message::Quit.to_bytes();
        assert_eq!(
            Message::decode(&bytes[..31]),
            Err(FrameError::WrongSize {
                size: 31,
                expected: MESSAGE_SIZE
            })
        );

        let mut long = bytes.to_vec();
        long.push(0);
        assert!(matches!(
            Message::decode(&long),
            Err(FrameError::WrongSize { size: 33, .. })
        ));
    }

    #[test]
    fn decode_rejects_unknown_code() {
        let raw = RawMessage::new(0x7f);
        assert_eq!(
            Message::decode(raw.as_bytes()),
            Err(FrameError::UnknownCode(0x7f))
        );
    }

    #[test]
    fn every_variant_reports_a_known_code() {
        let messages = [
            Message::BufferCommit,
            Message::FrameComplete,
            Message::SetSizeAndStyle(SetSizeAndStyle::default()),
            Message::Resize(Resize::default()),
            Message::Quit,
            Message::Axis(AxisEvent::default()),
            Message::Pointer(PointerEvent::default()),
            Message::Touch(TouchEvent::default()),
            Message::RawTouch(RawTouchEvent::default()),
            Message::Keyboard(KeyboardEvent::default()),
        ];
        let codes: Vec<u32> = messages.iter().map(Message::code).collect();
        assert_eq!(codes, code::KNOWN_CODES);
        for message in messages {
            assert_eq!(message.encode().code(), message.code());
            assert_ne!(message.name(), "UNKNOWN");
        }
    }

    #[test]
    fn decoded_touch_keeps_fields() {
        let touch = Message::RawTouch(RawTouchEvent(TouchPoint {
            event_type: 3,
            time: 77,
            id: 2,
            x: -5,
            y: 12,
        }));
        assert_eq!(Message::decode(&touch.to_bytes()), Ok(touch));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_with_kind_tag() {
        let value = serde_json::to_value(Message::Resize(Resize {
            width: 3,
            height: 4,
        }))
        .unwrap();
        assert_eq!(value["kind"], "resize");
        assert_eq!(value["width"], 3);
    }
}
