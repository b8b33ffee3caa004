//! Live WebSocket stream.
//!
//! One reader task per session view. It forwards text frames untouched
//! (decoding is the engine's job) and reports connection state changes.
//! There is no reconnect: a dropped stream leaves the view degraded.

use futures::StreamExt;
use reqwest::Url;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::session::SessionInput;

/// Close code upstream uses to refuse a viewer.
pub const CLOSE_FORBIDDEN: u16 = 4403;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid stream url: {0}")]
    InvalidUrl(String),

    #[error("unsupported api scheme {0:?}")]
    UnsupportedScheme(String),
}

/// Derive the stream URL from the API base: `http` becomes `ws`, `https`
/// becomes `wss`.
pub fn stream_url(
    api_base: &str,
    argument_id: &str,
    user_id: &str,
    audience_token: Option<&str>,
) -> Result<Url, StreamError> {
    let mut url = Url::parse(api_base).map_err(|e| StreamError::InvalidUrl(e.to_string()))?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => return Err(StreamError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|()| StreamError::UnsupportedScheme(scheme.to_string()))?;

    url.path_segments_mut()
        .map_err(|()| StreamError::InvalidUrl(api_base.to_string()))?
        .pop_if_empty()
        .extend(["v1", "arguments", argument_id, "stream"]);

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("userId", user_id);
        if let Some(token) = audience_token {
            query.append_pair("audienceToken", token);
        }
    }
    Ok(url)
}

/// What the reader does with one frame.
#[derive(Debug, PartialEq, Eq)]
enum FrameAction {
    Forward(String),
    Skip,
    Closed,
    Refused(String),
}

fn classify(message: Message) -> FrameAction {
    match message {
        Message::Text(text) => FrameAction::Forward(text.as_str().to_owned()),
        Message::Close(Some(frame)) if u16::from(frame.code) == CLOSE_FORBIDDEN => {
            FrameAction::Refused(format!("stream refused ({CLOSE_FORBIDDEN}): access denied"))
        }
        Message::Close(_) => FrameAction::Closed,
        _ => FrameAction::Skip,
    }
}

/// Connect and pump frames into `inputs` until the stream ends, the
/// receiver goes away, or `cancel` fires. Nothing is sent after
/// cancellation.
pub async fn run_stream(url: Url, inputs: mpsc::Sender<SessionInput>, cancel: CancellationToken) {
    let forward = |input: SessionInput| {
        let inputs = inputs.clone();
        let cancel = cancel.clone();
        async move {
            if cancel.is_cancelled() {
                return false;
            }
            inputs.send(input).await.is_ok()
        }
    };

    debug!(url = %url, "connecting live stream");
    let connected = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = connect_async(url.as_str()) => result,
    };
    let mut ws = match connected {
        Ok((ws, _)) => ws,
        Err(e) => {
            warn!(error = %e, "live stream connect failed");
            let _ = forward(SessionInput::TransportError(e.to_string())).await;
            return;
        }
    };
    info!("live stream connected");
    if !forward(SessionInput::Connected).await {
        return;
    }

    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let _ = ws.close(None).await;
                debug!("live stream cancelled");
                return;
            }
            frame = ws.next() => frame,
        };

        let input = match frame {
            None => SessionInput::StreamClosed,
            Some(Err(e)) => SessionInput::TransportError(e.to_string()),
            Some(Ok(message)) => match classify(message) {
                FrameAction::Forward(text) => SessionInput::Raw(text),
                FrameAction::Skip => continue,
                FrameAction::Closed => SessionInput::StreamClosed,
                FrameAction::Refused(reason) => SessionInput::TransportError(reason),
            },
        };

        let terminal = !matches!(input, SessionInput::Raw(_));
        if !forward(input).await || terminal {
            break;
        }
    }
}
