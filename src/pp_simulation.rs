// Reference discrete-event host
//
// A minimal engine for driving protocols. Nodes own named ports. A direct
// connection carries each outbound message to the remote port after a
// channel delay, via a time-ordered event queue. Protocols are woken once per
// delivered arrival on the port they are attached to.
//
// Single-threaded by construction. Events with equal timestamps are
// delivered in the order they were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, info};

use crate::pp_delay_model::DelayModel;
use crate::pp_error::PpError;
use crate::pp_interface::{Clock, DelayContext, Message, NodeProtocol, Port, SimTime};
use crate::pp_memory_port::MemPort;

pub type NodeId = usize;
pub type ProtocolId = usize;

// ============================================================================
// Channels and Connections
// ============================================================================

/// One-directional channel whose delay comes from a delay model
pub struct QuantumChannel {
    name: String,
    properties: DelayContext,
    delay_model: Rc<dyn DelayModel>,
}

impl QuantumChannel {
    /// Channel of `length` km
    pub fn new(name: &str, length: f64, delay_model: Rc<dyn DelayModel>) -> Self {
        Self::with_properties(name, DelayContext::with_length(length), delay_model)
    }

    pub fn with_properties(
        name: &str,
        properties: DelayContext,
        delay_model: Rc<dyn DelayModel>,
    ) -> Self {
        Self {
            name: name.to_string(),
            properties,
            delay_model,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &DelayContext {
        &self.properties
    }

    /// Delay for the next transmission [ns]
    pub fn compute_delay(&self) -> Result<SimTime, PpError> {
        let delay = self.delay_model.compute_delay(&self.properties)?;
        if !(delay.is_finite() && delay >= 0.0) {
            return Err(PpError::InvalidDelay {
                channel: self.name.clone(),
                delay,
            });
        }
        Ok(delay)
    }
}

/// Pair of channels joining two ports, one per direction
pub struct DirectConnection {
    name: String,
    a_to_b: QuantumChannel,
    b_to_a: QuantumChannel,
}

impl DirectConnection {
    pub fn new(name: &str, a_to_b: QuantumChannel, b_to_a: QuantumChannel) -> Self {
        Self {
            name: name.to_string(),
            a_to_b,
            b_to_a,
        }
    }

    /// Same length and delay model in both directions
    pub fn symmetric(name: &str, length: f64, delay_model: Rc<dyn DelayModel>) -> Self {
        Self::new(
            name,
            QuantumChannel::new(&format!("{}[a to b]", name), length, delay_model.clone()),
            QuantumChannel::new(&format!("{}[b to a]", name), length, delay_model),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Summary of one `run_*` call
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimStats {
    pub start_time: SimTime,
    pub end_time: SimTime,
    pub events_processed: usize,
    pub messages_sent: usize,
    pub messages_delivered: usize,
}

impl fmt::Display for SimStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulation summary")?;
        writeln!(
            f,
            "  time: {:.1} -> {:.1} ns",
            self.start_time, self.end_time
        )?;
        writeln!(f, "  events processed: {}", self.events_processed)?;
        write!(
            f,
            "  messages sent: {}, delivered: {}",
            self.messages_sent, self.messages_delivered
        )
    }
}

// ============================================================================
// Event Queue
// ============================================================================

struct SimClock {
    now: SimTime,
}

impl Clock for SimClock {
    fn now(&self) -> SimTime {
        self.now
    }
}

/// Arrival of a message at a port
struct ScheduledEvent<P> {
    time: SimTime,
    seq: u64,
    node: NodeId,
    port: String,
    message: Message<P>,
}

// Reversed so the max-heap pops the earliest (time, seq) first
impl<P> Ord for ScheduledEvent<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<P> PartialOrd for ScheduledEvent<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P> PartialEq for ScheduledEvent<P> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<P> Eq for ScheduledEvent<P> {}

struct EventQueue<P> {
    heap: BinaryHeap<ScheduledEvent<P>>,
    next_seq: u64,
}

impl<P> EventQueue<P> {
    fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    fn schedule(&mut self, time: SimTime, node: NodeId, port: &str, message: Message<P>) {
        self.heap.push(ScheduledEvent {
            time,
            seq: self.next_seq,
            node,
            port: port.to_string(),
            message,
        });
        self.next_seq += 1;
    }

    fn next_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|e| e.time)
    }

    fn pop(&mut self) -> Option<ScheduledEvent<P>> {
        self.heap.pop()
    }

    fn items(&self) -> usize {
        self.heap.iter().map(|e| e.message.len()).sum()
    }
}

// ============================================================================
// Simulation
// ============================================================================

struct SimNode<P> {
    name: String,
    ports: IndexMap<String, MemPort<P>>,
    /// Keyed by the sending port
    links: IndexMap<String, Link>,
}

/// Outbound side of a connection
struct Link {
    channel: QuantumChannel,
    to_node: NodeId,
    to_port: String,
}

struct ProtocolSlot<P> {
    node: NodeId,
    port: String,
    protocol: Box<dyn NodeProtocol<P>>,
}

#[derive(Default, Clone, Copy)]
struct Counters {
    events_processed: usize,
    messages_sent: usize,
    messages_delivered: usize,
}

pub struct Simulation<P> {
    clock: SimClock,
    queue: EventQueue<P>,
    nodes: Vec<SimNode<P>>,
    protocols: Vec<ProtocolSlot<P>>,
    counters: Counters,
}

impl<P> Default for Simulation<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Simulation<P> {
    pub fn new() -> Self {
        Self {
            clock: SimClock { now: 0.0 },
            queue: EventQueue::new(),
            nodes: Vec::new(),
            protocols: Vec::new(),
            counters: Counters::default(),
        }
    }

    pub fn now(&self) -> SimTime {
        self.clock.now
    }

    pub fn add_node(&mut self, name: &str, port_names: &[&str]) -> NodeId {
        let ports = port_names
            .iter()
            .map(|p| (p.to_string(), MemPort::new(p)))
            .collect();
        self.nodes.push(SimNode {
            name: name.to_string(),
            ports,
            links: IndexMap::new(),
        });
        self.nodes.len() - 1
    }

    pub fn node_name(&self, node: NodeId) -> Result<&str, PpError> {
        self.nodes
            .get(node)
            .map(|n| n.name.as_str())
            .ok_or(PpError::UnknownNode { node })
    }

    pub fn port(&self, node: NodeId, port: &str) -> Result<&MemPort<P>, PpError> {
        let n = self.nodes.get(node).ok_or(PpError::UnknownNode { node })?;
        n.ports.get(port).ok_or_else(|| PpError::UnknownPort {
            node: n.name.clone(),
            port: port.to_string(),
        })
    }

    fn check_port(&self, node: NodeId, port: &str) -> Result<(), PpError> {
        self.port(node, port).map(|_| ())
    }

    /// Join `port_a` on `node_a` with `port_b` on `node_b`
    pub fn connect(
        &mut self,
        node_a: NodeId,
        port_a: &str,
        node_b: NodeId,
        port_b: &str,
        connection: DirectConnection,
    ) -> Result<(), PpError> {
        self.check_port(node_a, port_a)?;
        self.check_port(node_b, port_b)?;

        debug!(
            "connecting {}.{} <-> {}.{} via {}",
            self.nodes[node_a].name, port_a, self.nodes[node_b].name, port_b, connection.name
        );

        self.nodes[node_a].links.insert(
            port_a.to_string(),
            Link {
                channel: connection.a_to_b,
                to_node: node_b,
                to_port: port_b.to_string(),
            },
        );
        self.nodes[node_b].links.insert(
            port_b.to_string(),
            Link {
                channel: connection.b_to_a,
                to_node: node_a,
                to_port: port_a.to_string(),
            },
        );
        Ok(())
    }

    /// Attach a protocol to a port; it stays idle until started
    pub fn add_protocol(
        &mut self,
        node: NodeId,
        port: &str,
        protocol: Box<dyn NodeProtocol<P>>,
    ) -> Result<ProtocolId, PpError> {
        self.check_port(node, port)?;
        self.protocols.push(ProtocolSlot {
            node,
            port: port.to_string(),
            protocol,
        });
        Ok(self.protocols.len() - 1)
    }

    pub fn start(&mut self, id: ProtocolId) -> Result<(), PpError> {
        let slot = self
            .protocols
            .get_mut(id)
            .ok_or(PpError::UnknownProtocol { protocol: id })?;
        let node = &mut self.nodes[slot.node];
        let port = node
            .ports
            .get_mut(&slot.port)
            .ok_or_else(|| PpError::UnknownPort {
                node: node.name.clone(),
                port: slot.port.clone(),
            })?;

        slot.protocol.start(port)?;
        // Input may have arrived while the protocol was idle
        if port.has_input() {
            slot.protocol.on_port_input(&self.clock, port)?;
        }

        let (node_id, port_name) = (slot.node, slot.port.clone());
        self.flush_port(node_id, &port_name)
    }

    pub fn start_all(&mut self) -> Result<(), PpError> {
        for id in 0..self.protocols.len() {
            self.start(id)?;
        }
        Ok(())
    }

    pub fn stop(&mut self, id: ProtocolId) -> Result<(), PpError> {
        let slot = self
            .protocols
            .get_mut(id)
            .ok_or(PpError::UnknownProtocol { protocol: id })?;
        slot.protocol.stop();
        Ok(())
    }

    pub fn is_running(&self, id: ProtocolId) -> Result<bool, PpError> {
        self.protocols
            .get(id)
            .map(|s| s.protocol.is_running())
            .ok_or(PpError::UnknownProtocol { protocol: id })
    }

    /// Inject an arrival of `item` at the current time
    pub fn tx_input(&mut self, node: NodeId, port: &str, item: P) -> Result<(), PpError> {
        self.tx_input_message(node, port, Message::single(item))
    }

    pub fn tx_input_message(
        &mut self,
        node: NodeId,
        port: &str,
        message: Message<P>,
    ) -> Result<(), PpError> {
        self.check_port(node, port)?;
        self.queue.schedule(self.clock.now, node, port, message);
        Ok(())
    }

    pub fn pending_events(&self) -> usize {
        self.queue.heap.len()
    }

    /// Items currently in transit or sitting in any port queue
    pub fn items_in_flight(&self) -> usize {
        let queued: usize = self
            .nodes
            .iter()
            .flat_map(|n| n.ports.values())
            .map(MemPort::queued_items)
            .sum();
        queued + self.queue.items()
    }

    /// Process every event up to `now + duration`, then advance the clock there
    ///
    /// # Errors
    /// `InvalidParameter` if `duration` is negative or not finite.
    pub fn run_for(&mut self, duration: SimTime) -> Result<SimStats, PpError> {
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(PpError::InvalidParameter {
                name: "duration",
                value: duration,
            });
        }
        let start = (self.clock.now, self.counters);
        let end = self.clock.now + duration;

        while let Some(time) = self.queue.next_time() {
            if time > end {
                break;
            }
            self.step()?;
        }
        if end > self.clock.now {
            self.clock.now = end;
        }

        Ok(self.finish(start))
    }

    /// Process events until the queue is empty
    ///
    /// A live game never empties the queue; bound those with `run_for`.
    pub fn run_until_idle(&mut self) -> Result<SimStats, PpError> {
        let start = (self.clock.now, self.counters);
        while self.queue.next_time().is_some() {
            self.step()?;
        }
        Ok(self.finish(start))
    }

    fn finish(&self, (start_time, before): (SimTime, Counters)) -> SimStats {
        let stats = SimStats {
            start_time,
            end_time: self.clock.now,
            events_processed: self.counters.events_processed - before.events_processed,
            messages_sent: self.counters.messages_sent - before.messages_sent,
            messages_delivered: self.counters.messages_delivered - before.messages_delivered,
        };
        info!(
            "ran {:.1} -> {:.1} ns: {} events",
            stats.start_time, stats.end_time, stats.events_processed
        );
        stats
    }

    fn step(&mut self) -> Result<(), PpError> {
        let Some(event) = self.queue.pop() else {
            return Ok(());
        };
        self.clock.now = event.time;
        self.counters.events_processed += 1;

        let node = &mut self.nodes[event.node];
        let port = node
            .ports
            .get_mut(&event.port)
            .ok_or_else(|| PpError::UnknownPort {
                node: node.name.clone(),
                port: event.port.clone(),
            })?;
        debug!(
            "{:.3}: {} item(s) arrive at {}.{}",
            event.time,
            event.message.len(),
            node.name,
            event.port
        );
        port.tx_input(event.message);
        self.counters.messages_delivered += 1;

        for slot in self
            .protocols
            .iter_mut()
            .filter(|s| s.node == event.node && s.port == event.port)
        {
            if let Some(port) = self.nodes[slot.node].ports.get_mut(&slot.port) {
                slot.protocol.on_port_input(&self.clock, port)?;
            }
        }

        // Protocols only write to the port they are attached to
        self.flush_port(event.node, &event.port)
    }

    /// Move outbound messages of one port onto its channel
    ///
    /// A message leaves the port only once its delay is known, so a failing
    /// channel leaves it queued.
    fn flush_port(&mut self, node_id: NodeId, port_name: &str) -> Result<(), PpError> {
        let node = &mut self.nodes[node_id];
        let Some(link) = node.links.get(port_name) else {
            return Ok(());
        };
        let Some(port) = node.ports.get_mut(port_name) else {
            return Ok(());
        };

        while !port.output_queue().is_empty() {
            let delay = link.channel.compute_delay()?;
            let Some(message) = port.rx_output() else {
                break;
            };
            debug!(
                "{:.3}: {} sends on {} (delay {:.3} ns)",
                self.clock.now,
                node.name,
                link.channel.name(),
                delay
            );
            self.queue
                .schedule(self.clock.now + delay, link.to_node, &link.to_port, message);
            self.counters.messages_sent += 1;
        }
        Ok(())
    }
}
