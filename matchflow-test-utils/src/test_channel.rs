// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use matchflow_core::{FlowError, StreamItem};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Creates an unbounded test channel, returning the sending half and the
/// receiving half as a stream of [`StreamItem`]s. The halves move
/// independently, so the stream can be handed straight to a source while
/// the test keeps pushing.
pub fn test_channel<T>() -> (TestSender<T>, UnboundedReceiverStream<StreamItem<T>>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        TestSender { sender },
        UnboundedReceiverStream::new(receiver),
    )
}

/// Sending half of a [`test_channel`]. Dropping it completes the stream.
pub struct TestSender<T> {
    sender: mpsc::UnboundedSender<StreamItem<T>>,
}

impl<T> TestSender<T> {
    /// Send a value through the channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the receiver has been dropped.
    pub fn send(&self, value: T) -> Result<(), mpsc::error::SendError<StreamItem<T>>> {
        self.sender.send(StreamItem::Value(value))
    }

    /// Send an in-band error through the channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the receiver has been dropped.
    pub fn send_error(
        &self,
        error: FlowError,
    ) -> Result<(), mpsc::error::SendError<StreamItem<T>>> {
        self.sender.send(StreamItem::Error(error))
    }

    /// Close the sender side of the channel, completing the stream.
    pub fn close(self) {
        drop(self);
    }
}

