// Observation sinks
//
// Protocols hand every observation to a sink exactly once. Which sink is
// used decides whether observations are dropped, logged or kept for later
// inspection.

use std::cell::RefCell;
use std::rc::Rc;

use log::info;

use crate::pp_interface::{Observation, ObservationSink};

/// Drops everything
#[derive(Clone, Copy, Default)]
pub struct NoOpSink;

impl ObservationSink for NoOpSink {
    #[inline(always)]
    fn record(&mut self, _observation: &Observation) {}
}

/// Forwards observations to the `log` facade at info level
#[derive(Clone, Copy, Default)]
pub struct LogSink;

impl ObservationSink for LogSink {
    fn record(&mut self, observation: &Observation) {
        info!("{}", observation);
    }
}

/// Keeps observations in a buffer shared with the caller
///
/// Clones share one buffer, so a simulation driver can hand a clone to each
/// protocol and read the combined, time-ordered transcript afterwards.
#[derive(Clone, Default)]
pub struct RecordingSink {
    observations: Rc<RefCell<Vec<Observation>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observations(&self) -> Vec<Observation> {
        self.observations.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.observations.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.borrow().is_empty()
    }

    /// Observations rendered one per line
    pub fn transcript(&self) -> String {
        self.observations
            .borrow()
            .iter()
            .map(|o| format!("{}\n", o))
            .collect()
    }
}

impl ObservationSink for RecordingSink {
    fn record(&mut self, observation: &Observation) {
        self.observations.borrow_mut().push(observation.clone());
    }
}

/// Fans out to several sinks in order
pub struct TeeSink {
    sinks: Vec<Box<dyn ObservationSink>>,
}

impl TeeSink {
    pub fn new(sinks: Vec<Box<dyn ObservationSink>>) -> Self {
        Self { sinks }
    }
}

impl ObservationSink for TeeSink {
    fn record(&mut self, observation: &Observation) {
        for sink in &mut self.sinks {
            sink.record(observation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(time: f64, participant: &str) -> Observation {
        Observation {
            time,
            participant: participant.to_string(),
            label: "|0>",
            probability: 1.0,
        }
    }

    #[test]
    fn test_recording_sink_shares_buffer() {
        let sink = RecordingSink::new();
        let mut a = sink.clone();
        let mut b = sink.clone();

        a.record(&observation(0.0, "Ping"));
        b.record(&observation(1.0, "Pong"));

        assert_eq!(sink.len(), 2);
        assert_eq!(
            sink.transcript(),
            "  0.0: Ping measured |0> with probability 1.00\n  1.0: Pong measured |0> with probability 1.00\n"
        );
    }

    #[test]
    fn test_tee_sink() {
        let first = RecordingSink::new();
        let second = RecordingSink::new();
        let mut tee = TeeSink::new(vec![
            Box::new(first.clone()),
            Box::new(NoOpSink),
            Box::new(second.clone()),
        ]);

        tee.record(&observation(2.0, "Ping"));

        assert_eq!(first.observations(), second.observations());
        assert_eq!(first.len(), 1);
    }
}
