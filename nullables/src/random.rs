//! Nullable random: scripted slot draws.

use std::sync::{Arc, Mutex};

use avalanche_peers::SlotSource;

#[derive(Debug, Default)]
struct Script {
    outputs: Vec<u64>,
    index: usize,
}

/// A deterministic slot source for testing.
///
/// Returns pre-configured values in order, wrapping around, each reduced
/// modulo the requested bound. Clones share the script, so a test can keep a
/// handle after boxing the source into a processor.
#[derive(Clone, Debug, Default)]
pub struct NullRandom {
    script: Arc<Mutex<Script>>,
}

impl NullRandom {
    /// Create with a sequence of deterministic draws.
    pub fn new(outputs: Vec<u64>) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script { outputs, index: 0 })),
        }
    }

    /// Create with a single value that will be returned for every call.
    pub fn constant(value: u64) -> Self {
        Self::new(vec![value])
    }

    /// Replace the remaining script and restart from its first value.
    pub fn set_outputs(&self, outputs: Vec<u64>) {
        let mut script = self.script.lock().unwrap();
        script.outputs = outputs;
        script.index = 0;
    }

    /// Number of draws handed out so far.
    pub fn draws(&self) -> usize {
        self.script.lock().unwrap().index
    }
}

impl SlotSource for NullRandom {
    fn next_slot(&mut self, max: u64) -> u64 {
        let mut script = self.script.lock().unwrap();
        if script.outputs.is_empty() || max == 0 {
            script.index += 1;
            return 0;
        }
        let current = script.index % script.outputs.len();
        script.index += 1;
        script.outputs[current] % max
    }
}
