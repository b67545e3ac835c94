// In-memory port
//
// Two FIFO queues: inbound messages delivered by the host, outbound messages
// queued by the protocol until the host moves them onto a channel. A port
// that is not connected to anything keeps its outbound messages.

use std::collections::VecDeque;

use crate::pp_interface::{Message, Port};

pub struct MemPort<P> {
    name: String,
    input_queue: VecDeque<Message<P>>,
    output_queue: VecDeque<Message<P>>,
}

impl<P> MemPort<P> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            input_queue: VecDeque::new(),
            output_queue: VecDeque::new(),
        }
    }

    /// Deliver an inbound message (host side)
    pub fn tx_input(&mut self, message: Message<P>) {
        self.input_queue.push_back(message);
    }

    /// Take the oldest outbound message (host side)
    pub fn rx_output(&mut self) -> Option<Message<P>> {
        self.output_queue.pop_front()
    }

    pub fn input_queue(&self) -> &VecDeque<Message<P>> {
        &self.input_queue
    }

    pub fn output_queue(&self) -> &VecDeque<Message<P>> {
        &self.output_queue
    }

    /// Items currently sitting in either queue
    pub fn queued_items(&self) -> usize {
        self.input_queue
            .iter()
            .chain(self.output_queue.iter())
            .map(Message::len)
            .sum()
    }
}

impl<P> Port<P> for MemPort<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_input(&self) -> bool {
        !self.input_queue.is_empty()
    }

    fn rx_input(&mut self) -> Option<Message<P>> {
        self.input_queue.pop_front()
    }

    fn tx_output(&mut self, item: P) {
        self.output_queue.push_back(Message::single(item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut port: MemPort<u32> = MemPort::new("qubitIO");
        port.tx_input(Message::single(1));
        port.tx_input(Message::single(2));

        assert!(port.has_input());
        assert_eq!(port.rx_input(), Some(Message::single(1)));
        assert_eq!(port.rx_input(), Some(Message::single(2)));
        assert!(!port.has_input());
        assert_eq!(port.rx_input(), None);
    }

    #[test]
    fn test_output_queue() {
        let mut port: MemPort<u32> = MemPort::new("qubitIO");
        port.tx_output(7);
        port.tx_input(Message::new(vec![1, 2]));

        assert_eq!(port.name(), "qubitIO");
        assert_eq!(port.output_queue().len(), 1);
        assert_eq!(port.queued_items(), 3);
        assert_eq!(port.rx_output(), Some(Message::single(7)));
        assert!(port.output_queue().is_empty());
    }
}
