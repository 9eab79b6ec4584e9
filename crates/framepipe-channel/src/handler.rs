use framepipe_frame::Message;
use tracing::debug;

/// Receives every well-sized frame that arrives on a channel.
///
/// Called on the channel's receiver thread, one frame at a time, in arrival
/// order. The slice is only valid for the duration of the call.
pub trait Handler: Send + Sync + 'static {
    fn handle_message(&self, message: &[u8]);
}

impl<F> Handler for F
where
    F: Fn(&[u8]) + Send + Sync + 'static,
{
    fn handle_message(&self, message: &[u8]) {
        self(message)
    }
}

/// Adapts a closure over typed [`Message`]s into a [`Handler`].
///
/// Frames with an unknown code are logged and skipped.
pub struct Decoded<F>(F);

/// Wrap `f` so it receives decoded messages.
pub fn decoded<F>(f: F) -> Decoded<F>
where
    F: Fn(Message) + Send + Sync + 'static,
{
    Decoded(f)
}

impl<F> Handler for Decoded<F>
where
    F: Fn(Message) + Send + Sync + 'static,
{
    fn handle_message(&self, message: &[u8]) {
        match Message::decode(message) {
            Ok(message) => (self.0)(message),
            Err(err) => debug!(error = %err, "unhandled message"),
        }
    }
}
