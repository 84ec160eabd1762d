//! Status LED policy.
//!
//! Short blink once per period while advertising, solid on while a
//! central is connected.

use crate::config::{LED_BLINK_ON_MS, LED_BLINK_PERIOD_MS};

/// Link state shown on the status LED.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    Advertising,
    Connected,
}

/// Decide whether the LED should be lit `elapsed_ms` after the current
/// link state was entered.
pub fn led_should_be_on(state: LinkState, elapsed_ms: u64) -> bool {
    match state {
        LinkState::Connected => true,
        LinkState::Advertising => elapsed_ms % LED_BLINK_PERIOD_MS < LED_BLINK_ON_MS,
    }
}

/// Time until the LED output has to change again, or `None` when it is
/// steady.
pub fn next_toggle_in_ms(state: LinkState, elapsed_ms: u64) -> Option<u64> {
    match state {
        LinkState::Connected => None,
        LinkState::Advertising => {
            let phase = elapsed_ms % LED_BLINK_PERIOD_MS;
            if phase < LED_BLINK_ON_MS {
                Some(LED_BLINK_ON_MS - phase)
            } else {
                Some(LED_BLINK_PERIOD_MS - phase)
            }
        }
    }
}
