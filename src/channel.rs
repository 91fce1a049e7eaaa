use std::time::Duration;

/// Fixed pull cadence once the push channel is gone.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Live,
    DegradedPolling,
}

/// Lifecycle of the response delivery path for one screen.
///
/// The push connection is tried once per mount. Losing it downgrades the
/// screen to fixed-interval polling for the rest of the session; there is
/// no edge back to `Live` and no reconnect attempt.
#[derive(Debug)]
pub struct DeliveryChannel {
    state: ChannelState,
}

impl DeliveryChannel {
    pub fn new() -> Self {
        Self {
            state: ChannelState::Connecting,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// The push connection reported open.
    pub fn on_established(&mut self) {
        if self.state == ChannelState::Connecting {
            self.state = ChannelState::Live;
        }
    }

    /// The push connection failed or dropped. Returns true only for the
    /// call that actually causes the downgrade, so the poll timer gets
    /// started exactly once.
    pub fn on_push_failure(&mut self) -> bool {
        if self.state == ChannelState::DegradedPolling {
            return false;
        }
        self.state = ChannelState::DegradedPolling;
        true
    }

    /// Whether push deliveries are still trusted. Late events from a
    /// connection we already wrote off are dropped.
    pub fn accepts_push(&self) -> bool {
        self.state != ChannelState::DegradedPolling
    }

    pub fn describe(&self) -> &'static str {
        match self.state {
            ChannelState::Connecting => "connecting…",
            ChannelState::Live => "live",
            ChannelState::DegradedPolling => "polling",
        }
    }
}

impl Default for DeliveryChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_into_live() {
        let mut channel = DeliveryChannel::new();
        assert_eq!(channel.state(), ChannelState::Connecting);
        channel.on_established();
        assert_eq!(channel.state(), ChannelState::Live);
        assert!(channel.accepts_push());
    }

    #[test]
    fn failed_connect_degrades_to_polling() {
        let mut channel = DeliveryChannel::new();
        assert!(channel.on_push_failure());
        assert_eq!(channel.state(), ChannelState::DegradedPolling);
    }

    #[test]
    fn downgrade_happens_exactly_once() {
        let mut channel = DeliveryChannel::new();
        channel.on_established();
        assert!(channel.on_push_failure());
        assert!(!channel.on_push_failure());
        assert!(!channel.on_push_failure());
    }

    #[test]
    fn no_way_back_to_live() {
        let mut channel = DeliveryChannel::new();
        channel.on_push_failure();
        channel.on_established();
        assert_eq!(channel.state(), ChannelState::DegradedPolling);
    }

    #[test]
    fn pushes_are_ignored_after_downgrade() {
        let mut channel = DeliveryChannel::new();
        channel.on_established();
        assert!(channel.accepts_push());
        channel.on_push_failure();
        assert!(!channel.accepts_push());
    }
}
