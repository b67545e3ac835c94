// PingPong protocol
//
// The same protocol runs on both players. Whoever holds the payload at start
// serves it; from then on each player waits for the payload to arrive on its
// port, measures it in its own basis, records what it saw and sends it back.

use log::{debug, warn};

use crate::pp_error::PpError;
use crate::pp_interface::{Basis, Clock, Measure, NodeProtocol, Observation, ObservationSink, Port};
use crate::pp_sinks::LogSink;

/// Position inside the running loop
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cycle {
    AwaitingArrival,
    Processing,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProtocolState {
    Idle,
    Running(Cycle),
    Stopped,
}

/// One player of the PingPong game
///
/// # Example
/// ```rust
/// use pp_rust::pp_interface::{Basis, NodeProtocol};
/// use pp_rust::pp_memory_port::MemPort;
/// use pp_rust::pp_protocol::PingPongProtocol;
/// use pp_rust::pp_qubit::{Qubit, QubitMeasurer};
/// use pp_rust::pp_random::RandomSource;
///
/// let measurer = QubitMeasurer::new(RandomSource::shared(0));
/// let mut ping = PingPongProtocol::new("Ping", Basis::Z, Some(Qubit::zero()), measurer);
/// let mut port = MemPort::new("qubitIO");
///
/// ping.start(&mut port)?;
/// assert!(ping.is_running());
/// assert_eq!(port.output_queue().len(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct PingPongProtocol<P, M: Measure<P>> {
    name: String,
    basis: Basis,
    qubit: Option<P>,
    measurer: M,
    sink: Box<dyn ObservationSink>,
    state: ProtocolState,
    cycles: u64,
}

impl<P, M: Measure<P>> PingPongProtocol<P, M> {
    /// Create a player whose observations go to the log
    pub fn new(name: &str, basis: Basis, qubit: Option<P>, measurer: M) -> Self {
        Self::new_with_sink(name, basis, qubit, measurer, Box::new(LogSink))
    }

    /// Create a player with a custom observation sink
    pub fn new_with_sink(
        name: &str,
        basis: Basis,
        qubit: Option<P>,
        measurer: M,
        sink: Box<dyn ObservationSink>,
    ) -> Self {
        Self {
            name: name.to_string(),
            basis,
            qubit,
            measurer,
            sink,
            state: ProtocolState::Idle,
            cycles: 0,
        }
    }

    pub fn basis(&self) -> Basis {
        self.basis
    }

    pub fn state(&self) -> ProtocolState {
        self.state
    }

    /// Payload still waiting to be served; empty once the game has started
    pub fn initial_payload(&self) -> Option<&P> {
        self.qubit.as_ref()
    }

    /// Number of completed receive-measure-send cycles
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    fn process(&mut self, clock: &dyn Clock, port: &mut dyn Port<P>) -> Result<(), PpError> {
        while let Some(message) = port.rx_input() {
            self.state = ProtocolState::Running(Cycle::Processing);

            let count = message.len();
            let mut items = message.items.into_iter();
            let mut payload = match (items.next(), items.next()) {
                (Some(payload), None) => payload,
                _ => {
                    warn!(
                        "{}: expected exactly one item on {}, got {}",
                        self.name,
                        port.name(),
                        count
                    );
                    self.state = ProtocolState::Stopped;
                    return Err(PpError::ProtocolViolation {
                        participant: self.name.clone(),
                        items: count,
                    });
                }
            };

            let measurement = self.measurer.measure(&mut payload, self.basis);
            let observation = Observation {
                time: clock.now(),
                participant: self.name.clone(),
                label: self.basis.label(measurement.outcome),
                probability: measurement.probability,
            };
            self.sink.record(&observation);

            port.tx_output(payload);
            self.cycles += 1;
            debug!("{}: cycle {} complete", self.name, self.cycles);

            self.state = ProtocolState::Running(Cycle::AwaitingArrival);
        }
        Ok(())
    }
}

impl<P, M: Measure<P>> NodeProtocol<P> for PingPongProtocol<P, M> {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, port: &mut dyn Port<P>) -> Result<(), PpError> {
        if self.is_running() {
            debug!("{}: already running", self.name);
            return Ok(());
        }

        if let Some(qubit) = self.qubit.take() {
            debug!("{}: serving on {}", self.name, port.name());
            port.tx_output(qubit);
        }
        self.state = ProtocolState::Running(Cycle::AwaitingArrival);
        Ok(())
    }

    fn on_port_input(&mut self, clock: &dyn Clock, port: &mut dyn Port<P>) -> Result<(), PpError> {
        if !self.is_running() {
            // Not listening; arrivals stay queued on the port
            return Ok(());
        }
        self.process(clock, port)
    }

    fn stop(&mut self) {
        self.state = ProtocolState::Stopped;
    }

    fn is_running(&self) -> bool {
        matches!(self.state, ProtocolState::Running(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pp_interface::{Message, SimTime};
    use crate::pp_memory_port::MemPort;
    use crate::pp_qubit::{Qubit, QubitMeasurer};
    use crate::pp_random::RandomSource;
    use crate::pp_sinks::RecordingSink;

    struct FixedClock(SimTime);

    impl Clock for FixedClock {
        fn now(&self) -> SimTime {
            self.0
        }
    }

    fn player(
        name: &str,
        basis: Basis,
        qubit: Option<Qubit>,
    ) -> (PingPongProtocol<Qubit, QubitMeasurer>, RecordingSink) {
        let sink = RecordingSink::new();
        let measurer = QubitMeasurer::new(RandomSource::shared(42));
        let protocol =
            PingPongProtocol::new_with_sink(name, basis, qubit, measurer, Box::new(sink.clone()));
        (protocol, sink)
    }

    #[test]
    fn test_constructor() {
        let (p1, _) = player("TestNode", Basis::Z, None);
        assert_eq!(p1.basis(), Basis::Z);
        assert!(p1.initial_payload().is_none());
        assert_eq!(p1.state(), ProtocolState::Idle);
        assert!(!p1.is_running());

        let (p2, _) = player("TestNode", Basis::Z, Some(Qubit::zero()));
        assert_eq!(p2.initial_payload(), Some(&Qubit::zero()));
        assert_eq!(p2.name(), "TestNode");
    }

    #[test]
    fn test_start_serves_once() {
        let (mut p, _) = player("TestNode", Basis::Z, Some(Qubit::zero()));
        let mut port = MemPort::new("qubitIO");

        p.start(&mut port).unwrap();
        assert!(p.is_running());
        assert_eq!(p.state(), ProtocolState::Running(Cycle::AwaitingArrival));
        assert_eq!(port.output_queue().len(), 1);
        assert!(p.initial_payload().is_none());

        // Starting again neither resends nor duplicates
        p.start(&mut port).unwrap();
        p.stop();
        p.start(&mut port).unwrap();
        assert_eq!(port.output_queue().len(), 1);
    }

    #[test]
    fn test_start_without_payload_sends_nothing() {
        let (mut p, _) = player("TestNode2", Basis::X, None);
        let mut port = MemPort::new("qubitIO");

        p.start(&mut port).unwrap();
        assert!(p.is_running());
        assert!(port.output_queue().is_empty());
    }

    #[test]
    fn test_running() {
        let (mut p, sink) = player("TestNode", Basis::Z, Some(Qubit::zero()));
        let mut port = MemPort::new("qubitIO");
        p.start(&mut port).unwrap();

        port.tx_input(Message::single(Qubit::zero()));
        p.on_port_input(&FixedClock(3.0), &mut port).unwrap();

        assert_eq!(
            sink.transcript(),
            "  3.0: TestNode measured |0> with probability 1.00\n"
        );
        assert_eq!(port.output_queue().len(), 2);
        assert!(!port.has_input());
        assert_eq!(p.cycles(), 1);
        assert!(p.is_running());
    }

    #[test]
    fn test_running_hadamard_basis() {
        let (mut p, sink) = player("TestNode2", Basis::X, None);
        let mut port = MemPort::new("qubitIO");
        p.start(&mut port).unwrap();

        port.tx_input(Message::single(Qubit::zero()));
        p.on_port_input(&FixedClock(0.0), &mut port).unwrap();

        let observations = sink.observations();
        assert_eq!(observations.len(), 1);
        assert!(observations[0].label == "|+>" || observations[0].label == "|->");
        assert!((observations[0].probability - 0.5).abs() < 1e-9);
        assert!(sink
            .transcript()
            .starts_with("  0.0: TestNode2 measured |"));
        assert!(sink.transcript().ends_with("> with probability 0.50\n"));
        assert_eq!(port.output_queue().len(), 1);
    }

    #[test]
    fn test_empty_message_is_violation() {
        let (mut p, sink) = player("Pong", Basis::X, None);
        let mut port: MemPort<Qubit> = MemPort::new("qubitIO");
        p.start(&mut port).unwrap();

        port.tx_input(Message::new(Vec::new()));
        assert_eq!(
            p.on_port_input(&FixedClock(1.0), &mut port),
            Err(PpError::ProtocolViolation {
                participant: "Pong".to_string(),
                items: 0
            })
        );
        assert_eq!(p.state(), ProtocolState::Stopped);
        assert!(sink.is_empty());
        assert!(port.output_queue().is_empty());
    }

    #[test]
    fn test_multiple_items_is_violation() {
        let (mut p, sink) = player("Pong", Basis::X, None);
        let mut port = MemPort::new("qubitIO");
        p.start(&mut port).unwrap();

        port.tx_input(Message::new(Qubit::create(2)));
        assert!(matches!(
            p.on_port_input(&FixedClock(1.0), &mut port),
            Err(PpError::ProtocolViolation { items: 2, .. })
        ));
        assert!(!p.is_running());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_stopped_leaves_arrivals_queued() {
        let (mut p, sink) = player("Ping", Basis::Z, None);
        let mut port = MemPort::new("qubitIO");

        // Before start nothing is consumed either
        port.tx_input(Message::single(Qubit::zero()));
        p.on_port_input(&FixedClock(0.0), &mut port).unwrap();
        assert!(port.has_input());

        p.start(&mut port).unwrap();
        p.stop();
        p.on_port_input(&FixedClock(1.0), &mut port).unwrap();

        assert!(port.has_input());
        assert!(sink.is_empty());
        assert_eq!(p.state(), ProtocolState::Stopped);
    }

    #[test]
    fn test_observation_is_write_once() {
        let (mut p, sink) = player("Pong", Basis::X, None);
        let mut port = MemPort::new("qubitIO");
        p.start(&mut port).unwrap();

        port.tx_input(Message::single(Qubit::zero()));
        p.on_port_input(&FixedClock(5.0), &mut port).unwrap();
        let first = sink.observations()[0].clone();

        // Bounce the same payload back a few times
        for t in [6.0, 7.0, 8.0] {
            let message = port.rx_output().unwrap();
            port.tx_input(message);
            p.on_port_input(&FixedClock(t), &mut port).unwrap();
        }

        assert_eq!(sink.len(), 4);
        assert_eq!(sink.observations()[0], first);
    }
}
