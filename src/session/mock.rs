// src/session/mock.rs

//! Scripted in-memory transport shared by the session and driver tests.

use std::collections::{HashMap, VecDeque};

use crate::common::hal_traits::I2cTransport;
use crate::common::util::{SystemUtilities, Utilities};
use crate::common::word::encode_words;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct MockBusError;

#[derive(Debug, Default)]
pub(crate) struct MockBus {
    /// Every write, as (address, bytes).
    pub writes: Vec<(u8, Vec<u8>)>,
    /// Every read, as (address, requested length).
    pub reads: Vec<(u8, usize)>,
    pub delays: Vec<u32>,
    read_queue: VecDeque<Result<Vec<u8>, MockBusError>>,
    fail_writes: usize,
    io_call_counts: HashMap<&'static str, u32>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the bytes returned by the next read.
    pub fn stage_read(&mut self, bytes: &[u8]) {
        self.read_queue.push_back(Ok(bytes.to_vec()));
    }

    /// Queues a response made of `words`, each followed by a correct checksum.
    pub fn stage_words(&mut self, words: &[u16]) {
        let bytes = encode_words(words);
        self.stage_read(&bytes);
    }

    pub fn stage_read_error(&mut self) {
        self.read_queue.push_back(Err(MockBusError));
    }

    /// Makes the next `count` writes fail.
    pub fn fail_next_writes(&mut self, count: usize) {
        self.fail_writes = count;
    }

    pub fn call_count(&self, name: &'static str) -> u32 {
        *self.io_call_counts.get(name).unwrap_or(&0)
    }

    /// Opcodes of all writes, in order.
    pub fn opcodes(&self) -> Vec<u16> {
        self.writes
            .iter()
            .filter(|(_, bytes)| bytes.len() >= 2)
            .map(|(_, bytes)| u16::from_be_bytes([bytes[0], bytes[1]]))
            .collect()
    }

    pub fn pending_reads(&self) -> usize {
        self.read_queue.len()
    }

    fn increment_call_count(&mut self, name: &'static str) {
        *self.io_call_counts.entry(name).or_insert(0) += 1;
    }
}

impl I2cTransport for MockBus {
    type Error = MockBusError;

    async fn write_bytes(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.increment_call_count("write");
        if self.fail_writes > 0 {
            self.fail_writes -= 1;
            return Err(MockBusError);
        }
        self.writes.push((address, bytes.to_vec()));
        Ok(())
    }

    async fn read_bytes(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.increment_call_count("read");
        self.reads.push((address, buffer.len()));
        let staged = self.read_queue.pop_front().ok_or(MockBusError)??;
        assert_eq!(staged.len(), buffer.len(), "staged response length differs from read length");
        buffer.copy_from_slice(&staged);
        Ok(())
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.increment_call_count("delay");
        self.delays.push(ms);
    }
}

/// The two words carrying `value` as a big-endian f32.
pub(crate) fn float_words(value: f32) -> [u16; 2] {
    let bits = value.to_bits();
    [(bits >> 16) as u16, bits as u16]
}

/// Fixed timestamp, real dew point and rounding.
pub(crate) struct FixedUtilities;

pub(crate) const FIXED_TIMESTAMP: &str = "2024-05-01T12:00:00Z";

impl Utilities for FixedUtilities {
    fn timestamp(&self) -> String {
        FIXED_TIMESTAMP.into()
    }

    fn dew_point(&self, temperature_c: f64, relative_humidity: f64) -> f64 {
        SystemUtilities.dew_point(temperature_c, relative_humidity)
    }

    fn round(&self, value: f64) -> f64 {
        SystemUtilities.round(value)
    }
}
