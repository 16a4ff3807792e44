use crate::error::Error;

use std::collections::VecDeque;

use parking_lot::Mutex;

/// What flows between pipeline nodes.
pub(crate) enum Signal<T> {
    Value(T),

    /// The upstream is exhausted.
    Close,

    /// The upstream failed; nothing follows.
    Fail(Error),
}

/// Consumer installed on a node.
pub(crate) type Sink<T> = Box<dyn FnMut(Signal<T>) + Send + 'static>;

struct NodeState<T> {
    /// Signals received before a sink was attached.
    buffer: VecDeque<Signal<T>>,

    sink: Option<Sink<T>>,

    /// Set once `Close` or `Fail` went through.
    terminated: bool,

    /// The receiver at this node was made ready without a consumer.
    ready: bool,

    /// A buffered value was reported as stalled.
    stalled: bool,
}

/// Attachment point between two pipeline stages.
///
/// Signals are handed to the sink in arrival order, or buffered until a
/// sink is attached. Nothing passes a node after its terminal signal.
pub(crate) struct Node<T> {
    state: Mutex<NodeState<T>>,
}

impl<T: Send + 'static> Node<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(NodeState {
                buffer: VecDeque::new(),
                sink: None,
                terminated: false,
                ready: false,
                stalled: false,
            }),
        }
    }

    pub(crate) fn deliver(&self, signal: Signal<T>) {
        let mut state = self.state.lock();

        if state.terminated {
            tracing::warn!("signal delivered after pipeline termination was dropped");
            return;
        }

        if matches!(signal, Signal::Close | Signal::Fail(_)) {
            state.terminated = true;
        }

        if let Some(sink) = state.sink.as_mut() {
            sink(signal);
            return;
        }

        if state.ready && !state.stalled && matches!(signal, Signal::Value(_)) {
            state.stalled = true;
            tracing::warn!(
                "values reach a ready receiver with no consumer and stay buffered until one is attached"
            );
        }

        state.buffer.push_back(signal);
    }

    /// Records that the pipeline was made ready at this node.
    pub(crate) fn mark_ready(&self) {
        self.state.lock().ready = true;
    }

    /// Whether values were buffered here after the pipeline was made ready.
    #[cfg(test)]
    pub(crate) fn is_stalled(&self) -> bool {
        let state = self.state.lock();
        state.stalled && state.sink.is_none()
    }

    /// Installs the consumer and flushes buffered signals into it.
    pub(crate) fn attach(&self, mut sink: Sink<T>) {
        let mut state = self.state.lock();

        while let Some(signal) = state.buffer.pop_front() {
            sink(signal);
        }

        state.sink = Some(sink);
    }
}
