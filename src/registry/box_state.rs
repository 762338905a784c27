//! Per-box live state.

use std::time::{Duration, Instant};

use crate::core::BoxAddress;
use crate::core::constants::{LQ_HIGH_THRESHOLD, LQ_KEEP_PAIR, LQ_KEEP_SINGLE, LQ_MID_THRESHOLD};
use crate::protocol::Button;

/// Connection status bits shown next to a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConnectionStatus(pub u8);

impl ConnectionStatus {
    /// Box has not reported recently.
    pub const NOT_CONNECTED: Self = Self(0x00);
    /// Box is reporting.
    pub const CONNECTED: Self = Self(0x01);
    /// Box has a button selected.
    pub const SELECTED: Self = Self(0x02);
    /// Selected and placed first.
    pub const SELECTED_1ST: Self = Self(0x02 | 0x04);
    /// Selected and placed second.
    pub const SELECTED_2ND: Self = Self(0x02 | 0x08);
    /// Selected and placed third.
    pub const SELECTED_3RD: Self = Self(0x02 | 0x10);

    /// Check if all bits of `other` are set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of both bit sets.
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// True for any status other than not-connected.
    pub fn is_connected(self) -> bool {
        self != Self::NOT_CONNECTED
    }

    /// True if the selected bit is set.
    pub fn is_selected(self) -> bool {
        self.contains(Self::SELECTED)
    }

    /// Highlight for a 1-based placing. Only the first three are highlighted.
    pub fn for_placing(placing: u32) -> Option<Self> {
        match placing {
            1 => Some(Self::SELECTED_1ST),
            2 => Some(Self::SELECTED_2ND),
            3 => Some(Self::SELECTED_3RD),
            _ => None,
        }
    }

    /// One-letter code: `N`, `C` or `S`.
    pub fn code(self) -> &'static str {
        if self == Self::NOT_CONNECTED {
            "N"
        } else if self.is_selected() {
            "S"
        } else {
            "C"
        }
    }
}

/// Coarse signal strength bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignalLevel {
    /// Box is not connected.
    Offline,
    /// Below the mid threshold.
    Low,
    /// Between the mid and high thresholds.
    Mid,
    /// At or above the high threshold.
    High,
}

/// Live state of one box.
#[derive(Debug, Clone)]
pub struct BoxState {
    address: BoxAddress,
    box_number: u32,
    button: Button,
    placing: u32,
    /// Smoothed link quality. Zero means no sample yet.
    link_quality: f64,
    last_seen: Option<Instant>,
    status: ConnectionStatus,
}

impl BoxState {
    /// Create state for a box that has not reported yet.
    pub fn new(address: BoxAddress, box_number: u32) -> Self {
        Self {
            address,
            box_number,
            button: Button::None,
            placing: 0,
            link_quality: 0.0,
            last_seen: None,
            status: ConnectionStatus::NOT_CONNECTED,
        }
    }

    /// Box address.
    pub fn address(&self) -> &BoxAddress {
        &self.address
    }

    /// Roster box number.
    pub fn box_number(&self) -> u32 {
        self.box_number
    }

    /// Current button.
    pub fn button(&self) -> Button {
        self.button
    }

    /// Set the current button.
    pub fn set_button(&mut self, button: Button) {
        self.button = button;
    }

    /// 1-based placing in this round, 0 when unplaced.
    pub fn placing(&self) -> u32 {
        self.placing
    }

    /// Set the placing.
    pub fn set_placing(&mut self, placing: u32) {
        self.placing = placing;
    }

    /// Clear button and placing.
    pub fn clear_states(&mut self) {
        self.button = Button::None;
        self.placing = 0;
    }

    /// Record that the box was heard from.
    pub fn touch(&mut self, now: Instant) {
        self.last_seen = Some(now);
    }

    /// When the box last reported.
    pub fn last_seen(&self) -> Option<Instant> {
        self.last_seen
    }

    /// Fold in one link quality sample.
    pub fn record_link_quality(&mut self, sample: u8) {
        self.blend(f64::from(sample), LQ_KEEP_SINGLE);
    }

    /// Fold in a pair of samples taken together.
    pub fn record_link_quality_pair(&mut self, first: u8, second: u8) {
        let avg = (f64::from(first) + f64::from(second)) / 2.0;
        self.blend(avg, LQ_KEEP_PAIR);
    }

    fn blend(&mut self, sample: f64, keep: f64) {
        if self.link_quality == 0.0 {
            self.link_quality = sample;
        } else {
            self.link_quality = keep * self.link_quality + (1.0 - keep) * sample;
        }
    }

    /// Smoothed link quality, unrounded.
    pub fn raw_link_quality(&self) -> f64 {
        self.link_quality
    }

    /// Smoothed link quality, rounded.
    pub fn link_quality(&self) -> u32 {
        self.link_quality.round() as u32
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Set the status, refined by the current button.
    ///
    /// A connected box with no button becomes plain connected. One with a
    /// button gains the selected bit if it does not have it yet.
    pub fn set_connect_status(&mut self, status: ConnectionStatus) -> ConnectionStatus {
        let refined = if !status.is_connected() {
            status
        } else if !self.button.is_pressed() {
            ConnectionStatus::CONNECTED
        } else if !status.is_selected() {
            ConnectionStatus::SELECTED
        } else {
            status
        };
        self.status = refined;
        refined
    }

    /// Recompute status from freshness, selection and placing.
    pub fn refresh_status(&mut self, now: Instant, timeout: Duration) -> ConnectionStatus {
        let fresh = self
            .last_seen
            .is_some_and(|seen| now.saturating_duration_since(seen) <= timeout);
        let base = if fresh {
            ConnectionStatus::CONNECTED
        } else {
            ConnectionStatus::NOT_CONNECTED
        };
        let status = self.set_connect_status(base);
        match ConnectionStatus::for_placing(self.placing) {
            Some(highlight) if status.is_selected() => {
                self.status = status.union(highlight);
                self.status
            }
            _ => status,
        }
    }

    /// Signal bucket for display.
    pub fn signal_level(&self) -> SignalLevel {
        let lq = self.link_quality();
        if !self.status.is_connected() {
            SignalLevel::Offline
        } else if lq < LQ_MID_THRESHOLD {
            SignalLevel::Low
        } else if lq < LQ_HIGH_THRESHOLD {
            SignalLevel::Mid
        } else {
            SignalLevel::High
        }
    }

    /// `[LLL:S]` with zero-padded link quality and status code.
    pub fn status_label(&self) -> String {
        format!("[{:03}:{}]", self.link_quality(), self.status.code())
    }
}
