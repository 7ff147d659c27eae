//! Per-chip record of what the hardware currently holds.

use crate::error::UnknownChip;
use crate::frame::{ChannelMask, Mode};

/// Last-known register contents of one chip.
///
/// All masks start at zero, the chip's power-on default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChipState {
    pub protect: ChannelMask,
    pub diag: ChannelMask,
    pub output: ChannelMask,
    /// Fault bits decoded from the most recent reply.
    pub faults: ChannelMask,
}

impl ChipState {
    pub fn get(&self, mode: Mode) -> ChannelMask {
        match mode {
            Mode::Protect => self.protect,
            Mode::Diag => self.diag,
            Mode::Output => self.output,
        }
    }

    fn slot(&mut self, mode: Mode) -> &mut ChannelMask {
        match mode {
            Mode::Protect => &mut self.protect,
            Mode::Diag => &mut self.diag,
            Mode::Output => &mut self.output,
        }
    }
}

/// Cache of [`ChipState`] indexed by chain position.
///
/// Only written after a transaction has completed, so it can always be
/// trusted as the hardware's state.
#[derive(Debug, Clone, Default)]
pub struct StateCache {
    chips: Vec<ChipState>,
}

impl StateCache {
    pub fn new(chips: usize) -> Self {
        Self {
            chips: vec![ChipState::default(); chips],
        }
    }

    pub fn len(&self) -> usize {
        self.chips.len()
    }

    pub fn chip(&self, chip: usize) -> Result<&ChipState, UnknownChip> {
        self.chips.get(chip).ok_or(UnknownChip(chip))
    }

    pub fn get(&self, chip: usize, mode: Mode) -> Result<ChannelMask, UnknownChip> {
        self.chip(chip).map(|state| state.get(mode))
    }

    pub(crate) fn set(
        &mut self,
        chip: usize,
        mode: Mode,
        mask: ChannelMask,
    ) -> Result<(), UnknownChip> {
        *self.chip_mut(chip)?.slot(mode) = mask;
        Ok(())
    }

    pub fn faults(&self, chip: usize) -> Result<ChannelMask, UnknownChip> {
        self.chip(chip).map(|state| state.faults)
    }

    pub(crate) fn record_faults(
        &mut self,
        chip: usize,
        faults: ChannelMask,
    ) -> Result<(), UnknownChip> {
        self.chip_mut(chip)?.faults = faults;
        Ok(())
    }

    fn chip_mut(&mut self, chip: usize) -> Result<&mut ChipState, UnknownChip> {
        self.chips.get_mut(chip).ok_or(UnknownChip(chip))
    }
}
