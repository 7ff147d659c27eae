//! Direct PWM inputs.
//!
//! IN6, IN7 and IN8 let OUT6..OUT8 follow an external PWM signal regardless
//! of the output register. They are plain GPIO lines and never touch the
//! serial bus.

use std::ops::RangeInclusive;

use embedded_hal::digital::OutputPin;
use log::debug;

use crate::Error;

/// Channels that have a direct input.
pub const PWM_CHANNELS: RangeInclusive<u8> = 6..=8;

pub struct PwmInputs<P> {
    inputs: [P; 3],
}

impl<P: OutputPin> PwmInputs<P> {
    pub fn new(in6: P, in7: P, in8: P) -> Self {
        Self {
            inputs: [in6, in7, in8],
        }
    }

    /// Pass PWM through to `channel` (6, 7 or 8).
    pub fn enable(&mut self, channel: u8) -> Result<(), Error<P::Error>> {
        self.set(channel, true)
    }

    pub fn disable(&mut self, channel: u8) -> Result<(), Error<P::Error>> {
        self.set(channel, false)
    }

    pub fn set(&mut self, channel: u8, enabled: bool) -> Result<(), Error<P::Error>> {
        if !PWM_CHANNELS.contains(&channel) {
            return Err(Error::ChannelOutOfRange(channel));
        }
        debug!("IN{channel} {}", if enabled { "on" } else { "off" });
        let pin = &mut self.inputs[usize::from(channel - PWM_CHANNELS.start())];
        let result = if enabled {
            pin.set_high()
        } else {
            pin.set_low()
        };
        result.map_err(Error::Gpio)
    }

    pub fn release(self) -> [P; 3] {
        self.inputs
    }
}
