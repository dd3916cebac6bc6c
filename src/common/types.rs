// src/common/types.rs

use core::fmt;

/// One decoded quantity of a [`Reading`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FieldValue {
    pub name: &'static str,
    pub value: f64,
    pub unit: &'static str,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{}={}", self.name, self.value)
        } else {
            write!(f, "{}={} {}", self.name, self.value, self.unit)
        }
    }
}

/// The result of one successful measurement cycle.
///
/// Values keep the order of the family's field table, with derived values
/// (dew point) appended last.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Display name of the sensor that produced the reading.
    pub sensor: String,
    /// Acquisition time, as produced by [`Utilities::timestamp`](crate::common::util::Utilities::timestamp).
    pub timestamp: String,
    pub values: Vec<FieldValue>,
}

impl Reading {
    pub fn new(sensor: String, timestamp: String, values: Vec<FieldValue>) -> Self {
        Reading {
            sensor,
            timestamp,
            values,
        }
    }

    /// Looks up a value by field name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.field(name).map(|v| v.value)
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.values.iter().find(|v| v.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldValue> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn push(&mut self, value: FieldValue) {
        self.values.push(value);
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}:", self.timestamp, self.sensor)?;
        for value in &self.values {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}
