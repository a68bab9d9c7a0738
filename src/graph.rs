//! Audio graph - owns nodes, edges and message queues

use std::marker::PhantomData;

use dasp_graph::{Buffer, Input, NodeData, Processor};
use hashbrown::HashMap;
use petgraph::graph::NodeIndex;
use rtrb::{Consumer, Producer, RingBuffer};

use crate::node::{AudioNode, NodeId, ProcessContext, BLOCK_SIZE};

/// Internal handle to send messages to a node in an AudioGraph
pub(crate) struct NodeHandle<M: Send + 'static> {
    pub(crate) id: NodeId,
    pub(crate) sender: Producer<M>,
    pub(crate) _marker: PhantomData<M>,
}

impl<M: Send + 'static> NodeHandle<M> {
    pub fn id(&self) -> NodeId {
        self.id
    }
}

// Type-erased wrapper so we can store heterogeneous nodes
trait ErasedNode: Send {
    fn process_erased(&mut self, ctx: &ProcessContext, inputs: &[Input], outputs: &mut [Buffer]);
}

struct NodeWrapper<N: AudioNode> {
    node: N,
    receiver: Consumer<N::Message>,
}

impl<N: AudioNode> ErasedNode for NodeWrapper<N> {
    fn process_erased(&mut self, ctx: &ProcessContext, inputs: &[Input], outputs: &mut [Buffer]) {
        // Split borrow to avoid conflict between receiver and node
        let receiver = &mut self.receiver;
        let node = &mut self.node;

        let messages = std::iter::from_fn(|| receiver.pop().ok());
        node.process(ctx, messages, inputs, outputs);
    }
}

// Adapter for dasp_graph
struct DaspAdapter {
    node: Box<dyn ErasedNode>,
    ctx: ProcessContext,
}

impl dasp_graph::Node for DaspAdapter {
    fn process(&mut self, inputs: &[Input], outputs: &mut [Buffer]) {
        self.node.process_erased(&self.ctx, inputs, outputs);
    }
}

type InnerGraph = petgraph::graph::Graph<NodeData<DaspAdapter>, ()>;

/// An audio processing graph at a fixed sample rate
pub(crate) struct AudioGraph {
    graph: InnerGraph,
    processor: Processor<InnerGraph>,
    ctx: ProcessContext,

    node_indices: HashMap<NodeId, NodeIndex>,
    next_node_id: u32,

    terminal: Option<NodeId>,
}

impl AudioGraph {
    /// Create a new graph with the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        Self {
            graph: InnerGraph::with_capacity(64, 64),
            processor: Processor::with_capacity(64),
            ctx: ProcessContext {
                sample_rate,
                buffer_size: BLOCK_SIZE,
                frame: 0,
            },
            node_indices: HashMap::new(),
            next_node_id: 0,
            terminal: None,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.ctx.sample_rate
    }

    /// Frame index of the next block to be processed
    pub fn frame(&self) -> u64 {
        self.ctx.frame
    }

    /// Add a node, returns a handle for sending messages
    pub fn add<N: AudioNode>(&mut self, node: N) -> NodeHandle<N::Message> {
        self.add_with_queue_size(node, 64)
    }

    /// Add a node with a custom message queue size
    pub fn add_with_queue_size<N: AudioNode>(&mut self, node: N, queue_size: usize) -> NodeHandle<N::Message> {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;

        let (producer, consumer) = RingBuffer::new(queue_size);

        let num_outputs = node.num_outputs();
        let wrapper = NodeWrapper { node, receiver: consumer };
        let adapter = DaspAdapter {
            node: Box::new(wrapper),
            ctx: self.ctx,
        };

        let node_data = match num_outputs {
            1 => NodeData::new1(adapter),
            2 => NodeData::new2(adapter),
            // 0 outputs = sink, but dasp_graph still needs a buffer for inputs
            _ => NodeData::new1(adapter),
        };

        let idx = self.graph.add_node(node_data);
        self.node_indices.insert(id, idx);

        NodeHandle {
            id,
            sender: producer,
            _marker: PhantomData,
        }
    }

    /// Connect output of `from` to input of `to`
    ///
    /// Returns false if either node no longer exists.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> bool {
        match (self.node_indices.get(&from), self.node_indices.get(&to)) {
            (Some(&from_idx), Some(&to_idx)) => {
                self.graph.add_edge(from_idx, to_idx, ());
                true
            }
            _ => false,
        }
    }

    /// Remove a node and every edge touching it.
    ///
    /// Returns false if the node was already gone.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(idx) = self.node_indices.remove(&id) else {
            return false;
        };

        // petgraph moves the last node into the freed slot
        let last = NodeIndex::new(self.graph.node_count() - 1);
        self.graph.remove_node(idx);

        if last != idx {
            if let Some(moved) = self.node_indices.values_mut().find(|i| **i == last) {
                *moved = idx;
            }
        }

        if self.terminal == Some(id) {
            self.terminal = None;
        }

        true
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node_indices.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Set which node to process to (typically a sink)
    pub fn set_terminal(&mut self, id: NodeId) {
        self.terminal = Some(id);
    }

    /// Process one block of audio through the graph
    pub fn process(&mut self) {
        let frame = self.ctx.frame;
        for data in self.graph.node_weights_mut() {
            data.node.ctx.frame = frame;
        }

        if let Some(&terminal) = self.terminal.as_ref().and_then(|id| self.node_indices.get(id)) {
            self.processor.process(&mut self.graph, terminal);
        }

        self.ctx.frame += BLOCK_SIZE as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(f32);

    impl AudioNode for Constant {
        type Message = ();

        fn process(
            &mut self,
            _ctx: &ProcessContext,
            _messages: impl Iterator<Item = ()>,
            _inputs: &[Input],
            outputs: &mut [Buffer],
        ) {
            for buf in outputs.iter_mut() {
                buf.iter_mut().for_each(|s| *s = self.0);
            }
        }
    }

    #[test]
    fn removing_a_node_keeps_other_ids_valid() {
        let mut graph = AudioGraph::new(48000);
        let a = graph.add(Constant(0.1)).id();
        let b = graph.add(Constant(0.2)).id();
        let c = graph.add(Constant(0.3)).id();

        assert!(graph.remove(a));
        assert!(!graph.remove(a));
        assert_eq!(graph.node_count(), 2);

        // c was moved into a's slot; connecting through its id must still work
        assert!(graph.connect(c, b));
        assert!(!graph.connect(a, b));
    }

    #[test]
    fn frame_advances_per_block() {
        let mut graph = AudioGraph::new(48000);
        let sink = graph.add(Constant(0.0)).id();
        graph.set_terminal(sink);

        graph.process();
        graph.process();
        assert_eq!(graph.frame(), 2 * BLOCK_SIZE as u64);
    }
}
