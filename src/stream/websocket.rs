//! Serial console over a KubeVirt-style websocket subresource.

use async_trait::async_trait;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use super::{
    ConsoleClient, ConsoleOptions, ConsoleStream, ConsoleTarget, StreamError, NORMAL_CLOSURE,
};
use crate::console::CHUNK_SIZE;
use crate::pipe::{PipeReader, PipeWriter};

/// Websocket sub-protocol spoken by the console endpoint.
pub const CONSOLE_SUBPROTOCOL: &str = "plain.kubevirt.io";

/// Opens consoles through the cluster API server.
#[derive(Debug, Clone)]
pub struct WebSocketClient {
    server: Url,
    token: Option<String>,
}

impl WebSocketClient {
    pub fn new(server: Url, token: Option<String>) -> Self {
        Self { server, token }
    }

    /// The websocket URL of the console subresource of `target`.
    pub fn console_url(&self, target: &ConsoleTarget) -> Result<Url, StreamError> {
        let mut url = self.server.clone();
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(StreamError::InvalidRequest(format!(
                    "unsupported server scheme '{other}'"
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| StreamError::InvalidRequest("cannot set websocket scheme".to_string()))?;

        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!(
            "{base}/apis/subresources.kubevirt.io/v1/namespaces/{}/virtualmachineinstances/{}/console",
            target.namespace, target.name
        ));
        Ok(url)
    }
}

#[async_trait]
impl ConsoleClient for WebSocketClient {
    type Stream = WebSocketConsole;

    async fn open(
        &self,
        target: &ConsoleTarget,
        options: &ConsoleOptions,
    ) -> Result<Self::Stream, StreamError> {
        let url = self.console_url(target)?;
        let mut request = url.as_str().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert(
            "Sec-WebSocket-Protocol",
            HeaderValue::from_static(CONSOLE_SUBPROTOCOL),
        );
        if let Some(token) = &self.token {
            let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|err| StreamError::InvalidRequest(err.to_string()))?;
            headers.insert("Authorization", bearer);
        }

        tracing::debug!("Connecting to {}", url);
        let timeout = options.connection_timeout;
        let (socket, response) = tokio::time::timeout(timeout, connect_async(request))
            .await
            .map_err(|_| StreamError::Timeout { timeout })??;
        tracing::debug!("Console handshake finished with status {}", response.status());

        Ok(WebSocketConsole { socket })
    }
}

/// An open console websocket.
pub struct WebSocketConsole {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl ConsoleStream for WebSocketConsole {
    async fn run(self, source: &mut PipeReader, sink: &mut PipeWriter) -> Result<(), StreamError> {
        let (outgoing, incoming) = self.socket.split();

        tokio::select! {
            result = pump_input(source, outgoing) => result,
            result = pump_output(incoming, sink) => result,
        }
    }
}

/// Send local input to the console as binary frames.
async fn pump_input<S>(source: &mut PipeReader, mut outgoing: S) -> Result<(), StreamError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let count = source.read(&mut buf).await?;
        if count == 0 {
            tracing::debug!("Console input closed, sending close frame");
            outgoing.send(Message::Close(None)).await?;
            return Ok(());
        }
        outgoing.send(Message::binary(buf[..count].to_vec())).await?;
    }
}

/// Write console frames to the local sink until the console closes.
async fn pump_output<St>(mut incoming: St, sink: &mut PipeWriter) -> Result<(), StreamError>
where
    St: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(message) = incoming.next().await {
        match message? {
            Message::Binary(data) => sink.write_all(&data).await?,
            Message::Text(text) => sink.write_all(text.as_str().as_bytes()).await?,
            Message::Close(frame) => return close_result(frame),
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }
    Ok(())
}

fn close_result(frame: Option<CloseFrame>) -> Result<(), StreamError> {
    let Some(frame) = frame else {
        return Ok(());
    };
    let code = u16::from(frame.code);
    if code == NORMAL_CLOSURE {
        return Ok(());
    }
    let reason = frame.reason.as_str().to_string();
    tracing::warn!("Console closed with code {}: {}", code, reason);
    Err(StreamError::Closed {
        code,
        reason,
    })
}
