//! Per-viewer send loop

use super::hub::Subscription;
use futures::stream::{self, Stream};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// One outbound frame on a viewer's stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A serialized event message
    Message(Arc<str>),
    /// Nothing was published within the idle timeout
    KeepAlive,
}

impl Subscription {
    /// Wait up to `idle` for the next message.
    ///
    /// Yields a keep-alive frame on timeout and `None` once the channel is
    /// closed.
    pub async fn next_frame(&mut self, idle: Duration) -> Option<Frame> {
        match timeout(idle, self.recv()).await {
            Ok(Some(message)) => Some(Frame::Message(message)),
            Ok(None) => None,
            Err(_) => Some(Frame::KeepAlive),
        }
    }
}

/// Turn a subscription into an endless stream of frames.
///
/// The stream owns the subscription: dropping the stream (the connection
/// closed or a write failed) unregisters the viewer.
pub fn frame_stream(subscription: Subscription, idle: Duration) -> impl Stream<Item = Frame> {
    stream::unfold(subscription, move |mut subscription| async move {
        let frame = subscription.next_frame(idle).await?;
        Some((frame, subscription))
    })
}
