use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use tokio::task::JoinHandle;

use crate::api::models::{self, PendingResponse};

/// What the push subscription reports back to the main loop.
#[derive(Debug)]
pub enum PushEvent {
    Established,
    Message(PendingResponse),
    Lost,
}

/// Subscribe to the server's event stream and forward events to the GTK
/// main loop. The subscription is one-shot: the first error closes it for
/// good and the screen falls back to polling for the rest of the session.
pub fn spawn_push_stream(
    request: reqwest::RequestBuilder,
    tx: glib::Sender<PushEvent>,
) -> JoinHandle<()> {
    crate::utils::spawn_async(async move {
        let mut source = match EventSource::new(request) {
            Ok(source) => source,
            Err(err) => {
                log::warn!("could not open push channel: {err}");
                let _ = tx.send(PushEvent::Lost);
                return;
            }
        };

        while let Some(event) = source.next().await {
            match event {
                Ok(Event::Open) => {
                    if tx.send(PushEvent::Established).is_err() {
                        break;
                    }
                }
                Ok(Event::Message(msg)) => match models::parse_stream_event(&msg.data) {
                    Some(response) => {
                        if tx.send(PushEvent::Message(response)).is_err() {
                            break;
                        }
                    }
                    // Not the message shape: the server pings to keep the
                    // connection alive.
                    None => log::debug!("ignoring keep-alive event"),
                },
                Err(err) => {
                    log::info!("push channel lost, falling back to polling: {err}");
                    let _ = tx.send(PushEvent::Lost);
                    break;
                }
            }
        }
        source.close();
    })
}
