#[derive(Clone)]
struct AppState {
    inner: std::sync::Arc<Mutex<PortalInner>>,
    stream_tx: broadcast::Sender<StreamMessage>,
}

impl AppState {
    fn new(portal: PortalApi) -> Self {
        let (stream_tx, _) = broadcast::channel(1024);
        Self {
            inner: std::sync::Arc::new(Mutex::new(PortalInner {
                portal,
                emitted_event_count: 0,
            })),
            stream_tx,
        }
    }
}

#[derive(Debug)]
struct PortalInner {
    portal: PortalApi,
    emitted_event_count: usize,
}

/// Events appended since the last broadcast, plus a warning when the last
/// write-through failed.
fn collect_delta_messages(inner: &mut PortalInner) -> Vec<StreamMessage> {
    let mut messages = Vec::new();

    let events = inner.portal.events();
    for event in &events[inner.emitted_event_count..] {
        messages.push(StreamMessage::event_appended(event));
    }
    inner.emitted_event_count = events.len();

    if let Some(last_error) = inner.portal.last_persistence_error() {
        messages.push(StreamMessage::warning(
            inner.portal.case_id(),
            last_error.to_string(),
        ));
    }

    messages
}

fn broadcast_messages(state: &AppState, messages: Vec<StreamMessage>) {
    for message in messages {
        let _ = state.stream_tx.send(message);
    }
}
