//! Channel-level operations on a [`ChipChain`].
//!
//! Every write follows the same pipeline: validate, compare against the
//! cached register, encode, transact, and only then update the cache. A write
//! that would not change the register never reaches the bus.

use log::{debug, trace, warn};

use crate::chain::ChipChain;
use crate::frame::{self, ChannelMask, Mode};
use crate::transport::Transport;
use crate::Error;

/// What a write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The register already held the requested mask; nothing was sent.
    Unchanged,
    /// One command word was sent. `faults` is the chip's diagnostic reply.
    Written { faults: ChannelMask },
}

impl Outcome {
    pub fn was_written(&self) -> bool {
        matches!(self, Outcome::Written { .. })
    }
}

impl<T: Transport> ChipChain<T> {
    /// Enable or disable overcurrent protection on `channel` (1..=8).
    pub fn set_protection(
        &mut self,
        chip: usize,
        channel: u8,
        enabled: bool,
    ) -> Result<Outcome, Error<T::Error>> {
        self.set_channel(chip, Mode::Protect, channel, enabled)
    }

    /// Enable or disable diagnostic reporting on `channel` (1..=8).
    pub fn set_diagnostics(
        &mut self,
        chip: usize,
        channel: u8,
        enabled: bool,
    ) -> Result<Outcome, Error<T::Error>> {
        self.set_channel(chip, Mode::Diag, channel, enabled)
    }

    /// Drive `channel` (1..=8) high or low.
    pub fn set_output(
        &mut self,
        chip: usize,
        channel: u8,
        enabled: bool,
    ) -> Result<Outcome, Error<T::Error>> {
        self.set_channel(chip, Mode::Output, channel, enabled)
    }

    /// Set or clear one channel of any register.
    pub fn set_channel(
        &mut self,
        chip: usize,
        mode: Mode,
        channel: u8,
        enabled: bool,
    ) -> Result<Outcome, Error<T::Error>> {
        let candidate = self.mask(chip, mode)?.with_channel(channel, enabled)?;
        self.write_register(chip, mode, candidate)
    }

    /// Replace a whole register in one transaction, whatever the number of
    /// channels that change.
    pub fn set_multiple_pins(
        &mut self,
        chip: usize,
        mode: Mode,
        mask: ChannelMask,
    ) -> Result<Outcome, Error<T::Error>> {
        self.write_register(chip, mode, mask)
    }

    fn write_register(
        &mut self,
        chip: usize,
        mode: Mode,
        mask: ChannelMask,
    ) -> Result<Outcome, Error<T::Error>> {
        let current = self.mask(chip, mode)?;
        if current == mask {
            trace!("Chip {chip} {mode} already {mask}, skipping");
            return Ok(Outcome::Unchanged);
        }

        let word = frame::encode(mode, mask);
        debug!("Chip {chip} {mode} {current} -> {mask} [{word}]");
        let reply = match self.transact(chip, word) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Chip {chip} {mode} write failed, keeping {current}");
                return Err(e);
            }
        };

        let faults = frame::decode_reply(reply);
        if faults != ChannelMask::NONE {
            debug!("Chip {chip} reported faults {faults}");
        }
        let cache = self.cache_mut()?;
        cache.set(chip, mode, mask)?;
        cache.record_faults(chip, faults)?;
        Ok(Outcome::Written { faults })
    }
}
