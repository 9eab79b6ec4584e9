use framepipe_frame::{
    AxisEvent, KeyboardEvent, Message, PointerEvent, RawTouchEvent, TouchEvent, TouchPoint,
};

/// Anything that can carry frames to the other process.
///
/// Implemented by [`Host`](crate::Host) and [`Client`](crate::Client).
/// Sends are best effort and never fail the caller.
pub trait MessageSink {
    fn send_message(&self, message: &[u8]);

    fn send(&self, message: &Message) {
        self.send_message(message.encode().as_bytes());
    }
}

/// Forwards input events over a channel as typed messages.
///
/// Built explicitly around the channel it writes to, so several channels
/// can each have their own dispatcher.
#[derive(Clone, Copy)]
pub struct InputDispatcher<'a> {
    sink: &'a dyn MessageSink,
}

impl<'a> InputDispatcher<'a> {
    pub fn new(sink: &'a dyn MessageSink) -> Self {
        Self { sink }
    }

    pub fn pointer(&self, event: PointerEvent) {
        self.sink.send(&Message::Pointer(event));
    }

    pub fn axis(&self, event: AxisEvent) {
        self.sink.send(&Message::Axis(event));
    }

    pub fn touch(&self, point: TouchPoint) {
        self.sink.send(&Message::Touch(TouchEvent(point)));
    }

    pub fn raw_touch(&self, point: TouchPoint) {
        self.sink.send(&Message::RawTouch(RawTouchEvent(point)));
    }

    pub fn keyboard(&self, event: KeyboardEvent) {
        self.sink.send(&Message::Keyboard(event));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use framepipe_frame::{AXIS, KEYBOARD, MESSAGE_SIZE, POINTER, RAW_TOUCH, TOUCH};

    use super::*;

    #[derive(Default)]
    struct Recorder {
        frames: Mutex<Vec<Vec<u8>>>,
    }

    impl MessageSink for Recorder {
        fn send_message(&self, message: &[u8]) {
            self.frames.lock().unwrap().push(message.to_vec());
        }
    }

    impl Recorder {
        fn codes(&self) -> Vec<u32> {
            self.frames
                .lock()
                .unwrap()
                .iter()
                .map(|frame| {
                    assert_eq!(frame.len(), MESSAGE_SIZE);
                    u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]])
                })
                .collect()
        }
    }

    #[test]
    fn dispatcher_tags_each_event_kind() {
        let recorder = Recorder::default();
        let input = InputDispatcher::new(&recorder);
        let point = TouchPoint {
            event_type: 1,
            time: 2,
            id: 0,
            x: 3,
            y: 4,
        };

        input.pointer(PointerEvent::default());
        input.axis(AxisEvent::default());
        input.touch(point);
        input.raw_touch(point);
        input.keyboard(KeyboardEvent {
            pressed: true,
            ..Default::default()
        });

        assert_eq!(recorder.codes(), vec![POINTER, AXIS, TOUCH, RAW_TOUCH, KEYBOARD]);
    }

    #[test]
    fn dispatchers_are_independent() {
        let left = Recorder::default();
        let right = Recorder::default();
        InputDispatcher::new(&left).keyboard(KeyboardEvent::default());
        InputDispatcher::new(&right).axis(AxisEvent::default());
        InputDispatcher::new(&right).axis(AxisEvent::default());

        assert_eq!(left.codes(), vec![KEYBOARD]);
        assert_eq!(right.codes(), vec![AXIS, AXIS]);
    }

    #[test]
    fn sent_event_decodes_back() {
        let recorder = Recorder::default();
        let event = PointerEvent {
            event_type: 4,
            time: 99,
            x: 120,
            y: -3,
            button: 1,
            state: 0,
            modifiers: 2,
        };
        InputDispatcher::new(&recorder).pointer(event);

        let frames = recorder.frames.lock().unwrap();
        assert_eq!(Message::decode(&frames[0]).unwrap(), Message::Pointer(event));
    }
}
