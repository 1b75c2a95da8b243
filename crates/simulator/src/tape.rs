use crate::whales::WhaleAlertSource;
use core_types::WhaleAlert;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// The rolling list of recent whale alerts, most recent first.
#[derive(Debug, Clone)]
pub struct WhaleTape {
    alerts: VecDeque<WhaleAlert>,
    capacity: usize,
}

impl WhaleTape {
    pub fn new(capacity: usize) -> Self {
        Self {
            alerts: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Fills the tape with up to `count` alerts drawn unconditionally from `source`.
    pub fn seed(&mut self, source: &mut dyn WhaleAlertSource, count: usize, reference_price: Decimal) {
        for _ in 0..count {
            match source.generate(reference_price) {
                Some(alert) => self.push(alert),
                None => break,
            }
        }
    }

    /// Puts `alert` at the front and drops the oldest entries beyond capacity.
    pub fn push(&mut self, alert: WhaleAlert) {
        self.alerts.push_front(alert);
        self.alerts.truncate(self.capacity);
    }

    /// Most-recent-first copy, in the order the battle calculator expects.
    pub fn to_vec(&self) -> Vec<WhaleAlert> {
        self.alerts.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&WhaleAlert> {
        self.alerts.front()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}
