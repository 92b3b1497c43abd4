//! Socket abstraction used by the channel manager.
//!
//! A transport turns a URL into a pair of text-frame halves. Production code
//! uses [`TungsteniteTransport`]; tests plug in an in-memory implementation.

use crate::error::{AppError, Result};
use futures_util::future::{self, BoxFuture};
use futures_util::stream::BoxStream;
use futures_util::{FutureExt, Sink, SinkExt, StreamExt};
use std::pin::Pin;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;

/// Inbound text frames. The stream ends when the peer closes.
pub type FrameStream = BoxStream<'static, Result<String>>;

/// Outbound text frames.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = AppError> + Send>>;

/// An open socket split into its two halves.
pub struct Connection {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Opens socket connections.
pub trait Transport: Send + Sync + 'static {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Connection>>;
}

/// WebSocket transport over tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteTransport;

impl Transport for TungsteniteTransport {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Connection>> {
        let url = url.to_string();
        async move {
            let (ws_stream, _) = connect_async(url.as_str()).await?;
            let (write, read) = ws_stream.split();

            let sink = write.with(|text: String| future::ready(Ok::<_, AppError>(Message::Text(text))));

            // Control frames are answered by tungstenite itself
            let stream = read.filter_map(|msg| {
                future::ready(match msg {
                    Ok(Message::Text(text)) => Some(Ok(text)),
                    Ok(Message::Binary(bytes)) => Some(Ok(String::from_utf8_lossy(&bytes).into_owned())),
                    Ok(Message::Close(frame)) => {
                        debug!("Close frame received: {:?}", frame);
                        None
                    }
                    Ok(_) => None,
                    Err(e) => Some(Err(AppError::from(e))),
                })
            });

            Ok(Connection {
                sink: Box::pin(sink),
                stream: stream.boxed(),
            })
        }
        .boxed()
    }
}
