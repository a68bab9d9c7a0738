//! High-level audio context: owns the graph, its output sink and the clock.

use std::marker::PhantomData;

use crate::graph::AudioGraph;
use crate::node::{AudioNode, NodeId, BLOCK_SIZE};

/// A handle for sending messages to a node in the audio graph.
///
/// Handles are returned when you add a node to an [`AudioContext`] and provide
/// two capabilities:
/// 1. **Connections** - Pass handles (or their [`id`](Self::id)) to
///    [`AudioContext::connect`]
/// 2. **Messages** - Send parameter updates via [`Handle::send`]
///
/// # Message Delivery
///
/// Messages are buffered in a lock-free ring buffer and processed at the start
/// of each audio block. If the buffer is full, [`Handle::send`] returns `Err(msg)`
/// with the message that couldn't be sent.
pub struct Handle<M: Send + 'static> {
    pub(crate) node_id: NodeId,
    pub(crate) sender: rtrb::Producer<M>,
    pub(crate) _marker: PhantomData<M>,
}

impl<M: Send + 'static> Handle<M> {
    /// Send a message to the node.
    ///
    /// The message will be processed at the start of the next audio block.
    /// This is lock-free and safe to call from any thread.
    pub fn send(&mut self, msg: M) -> Result<(), M> {
        self.sender.push(msg).map_err(|rtrb::PushError::Full(m)| m)
    }

    /// Send a message, logging instead of failing when the queue is full.
    pub fn post(&mut self, msg: M) {
        if self.send(msg).is_err() {
            tracing::warn!(node = ?self.node_id, "message queue full, dropping message");
        }
    }

    /// The id of the node this handle controls.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.node_id
    }
}

/// The audio context - manages nodes, connections and block processing.
///
/// # Building the Graph
///
/// 1. Add nodes with [`add`](Self::add) - returns a [`Handle`] for connections and messages
/// 2. Connect nodes with [`connect`](Self::connect)
/// 3. Connect final node(s) to output with [`output`](Self::output)
///
/// ```
/// # use soundscape::AudioContext;
/// # use soundscape::nodes::{Oscillator, Gain, RtrbSink};
/// let (producer, _consumer) = rtrb::RingBuffer::new(8192);
/// let mut ctx = AudioContext::new(48000).with_output(RtrbSink::stereo(producer));
///
/// let tone = ctx.add(Oscillator::sine(440.0));
/// let gain = ctx.add(Gain::new(0.5));
///
/// ctx.connect(tone.id(), gain.id());
/// ctx.output(gain.id());
/// ctx.process();
/// ```
///
/// # Processing Audio
///
/// Call [`process`](Self::process) repeatedly to generate audio. Realtime hosts
/// pace this against the device; offline renderers call it as fast as they can.
pub struct AudioContext {
    graph: AudioGraph,
    /// Number of output channels
    channels: usize,
    /// The output sink node (e.g., CpalSink)
    sink_node: Option<NodeId>,
}

impl AudioContext {
    /// Create a new context with an explicit sample rate and no output sink.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            graph: AudioGraph::new(sample_rate),
            channels: 2,
            sink_node: None,
        }
    }

    /// Set the number of output channels (builder pattern).
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels.max(1);
        self
    }

    /// Add an output sink (builder pattern).
    pub fn with_output<S: AudioNode<Message = ()>>(mut self, sink: S) -> Self {
        let handle = self.graph.add(sink);
        self.sink_node = Some(handle.id());
        self.graph.set_terminal(handle.id());
        self
    }

    /// Get the output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.graph.sample_rate()
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Total frames rendered so far.
    pub fn frames_processed(&self) -> u64 {
        self.graph.frame()
    }

    /// The context clock in seconds: the time of the next frame to be rendered.
    pub fn current_time(&self) -> f64 {
        self.graph.frame() as f64 / self.sample_rate() as f64
    }

    /// Number of nodes currently in the graph, sink included.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Add a node to the audio graph.
    pub fn add<N: AudioNode>(&mut self, node: N) -> Handle<N::Message> {
        let handle = self.graph.add(node);

        Handle {
            node_id: handle.id(),
            sender: handle.sender,
            _marker: PhantomData,
        }
    }

    /// Connect two nodes together. Audio flows from `from` to `to`.
    ///
    /// Connecting a node that has already been removed is a no-op.
    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        if !self.graph.connect(from, to) {
            tracing::warn!(?from, ?to, "connect on a removed node ignored");
        }
    }

    /// Connect a node directly to the output sink.
    ///
    /// Without a configured sink this only logs; the node stays unreachable.
    pub fn output(&mut self, id: NodeId) {
        match self.sink_node {
            Some(sink) => self.connect(id, sink),
            None => tracing::warn!(node = ?id, "no output sink configured"),
        }
    }

    /// Remove a node, disconnecting all of its edges.
    ///
    /// Returns false if the node was already removed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        self.graph.remove(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.graph.contains(id)
    }

    /// Process one block of audio ([`BLOCK_SIZE`] frames).
    pub fn process(&mut self) {
        self.graph.process();
    }

    /// Process whole blocks until at least `seconds` more audio has been rendered.
    pub fn process_for(&mut self, seconds: f64) {
        let frames = (seconds.max(0.0) * self.sample_rate() as f64).ceil() as u64;
        let blocks = frames.div_ceil(BLOCK_SIZE as u64);
        for _ in 0..blocks {
            self.graph.process();
        }
    }
}
