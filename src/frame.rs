//! Command word framing.
//!
//! Every transaction shifts one 16-bit word into the chip. Logically the word
//! is laid out as
//!
//! ```text
//! [15:12] address (1010b) | [11:8] mode code | [7:0] channel mask
//! ```
//!
//! and the chip expects the least significant bit first. The bit reversal is
//! applied here, so a [`CommandWord`] can be shifted out MSB-first by any
//! ordinary SPI bus. The reply shifted in at the same time is reversed back
//! by [`decode_reply`].

use std::fmt;

use bit_field::BitField;

use crate::error::{FrameError, UnknownMode};

/// Fixed address field present in every command word.
pub const ADDRESS: u8 = 0b1010;

/// Number of output channels on one chip.
pub const CHANNELS: u8 = 8;

/// One of the three functional registers of the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Overcurrent protection enable.
    Protect,
    /// Diagnostic reporting enable.
    Diag,
    /// Output drive state.
    Output,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Protect, Mode::Diag, Mode::Output];

    /// 4-bit code placed in bits [11:8] of the command word.
    pub const fn code(self) -> u8 {
        match self {
            Mode::Protect => 0b0101,
            Mode::Diag => 0b0011,
            Mode::Output => 0b1100,
        }
    }

    /// Look up a mode by its 4-bit wire code.
    pub fn from_code(code: u8) -> Result<Self, FrameError> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.code() == code)
            .ok_or(FrameError::InvalidMode(code))
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Mode::Protect => "protect",
            Mode::Diag => "diag",
            Mode::Output => "output",
        }
    }
}

/// Integer mode selection: 1 = protect, 2 = diag, 3 = output.
impl TryFrom<u8> for Mode {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Mode::Protect),
            2 => Ok(Mode::Diag),
            3 => Ok(Mode::Output),
            other => Err(FrameError::InvalidMode(other)),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = UnknownMode;

    /// A mode name, case-insensitive, or its integer selector.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "protect" => Ok(Mode::Protect),
            "diag" => Ok(Mode::Diag),
            "output" => Ok(Mode::Output),
            other => other
                .parse::<u8>()
                .ok()
                .and_then(|value| Mode::try_from(value).ok())
                .ok_or_else(|| UnknownMode(s.to_owned())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of output channels; bit `i` is channel `i + 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChannelMask(pub u8);

impl ChannelMask {
    pub const NONE: ChannelMask = ChannelMask(0x00);
    pub const ALL: ChannelMask = ChannelMask(0xFF);

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Copy of this mask with `channel` (1-based) set or cleared.
    pub fn with_channel(mut self, channel: u8, enabled: bool) -> Result<Self, FrameError> {
        let bit = bit_index(channel)?;
        self.0.set_bit(bit, enabled);
        Ok(self)
    }

    /// Whether `channel` (1-based) is in the set.
    pub fn contains(self, channel: u8) -> Result<bool, FrameError> {
        Ok(self.0.get_bit(bit_index(channel)?))
    }

    /// Channel numbers in the set, ascending.
    pub fn channels(self) -> impl Iterator<Item = u8> {
        (1..=CHANNELS).filter(move |&channel| self.0.get_bit(usize::from(channel - 1)))
    }
}

impl From<u8> for ChannelMask {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<ChannelMask> for u8 {
    fn from(value: ChannelMask) -> Self {
        value.0
    }
}

impl fmt::Display for ChannelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08b}", self.0)
    }
}

fn bit_index(channel: u8) -> Result<usize, FrameError> {
    if (1..=CHANNELS).contains(&channel) {
        Ok(usize::from(channel - 1))
    } else {
        Err(FrameError::ChannelOutOfRange(channel))
    }
}

/// Command word in transmission order (already bit-reversed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandWord(u16);

impl CommandWord {
    /// Wrap a value exactly as it appears on the bus.
    pub fn from_wire(wire: u16) -> Self {
        Self(wire)
    }

    pub fn wire(self) -> u16 {
        self.0
    }

    /// The word before bit reversal, MSB = address bit 3.
    pub fn logical(self) -> u16 {
        self.0.reverse_bits()
    }

    /// Bytes to shift out MSB-first.
    pub fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for CommandWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let logical = self.logical();
        write!(
            f,
            "{:04b} {:04b} {:08b}",
            logical >> 12,
            (logical >> 8) & 0xF,
            logical & 0xFF
        )
    }
}

/// Word shifted in from the chip while a command word is shifted out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplyWord(pub u16);

impl ReplyWord {
    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }
}

/// Build the command word writing `mask` into the `mode` register.
pub fn encode(mode: Mode, mask: ChannelMask) -> CommandWord {
    let logical = u16::from(ADDRESS) << 12 | u16::from(mode.code()) << 8 | u16::from(mask.bits());
    CommandWord(logical.reverse_bits())
}

/// Fault bits carried in the low byte of a reply.
pub fn decode_reply(reply: ReplyWord) -> ChannelMask {
    ChannelMask(reply.0.reverse_bits() as u8)
}

/// Recover the mode and mask from a command word, checking both header fields.
pub fn decode_command(word: CommandWord) -> Result<(Mode, ChannelMask), FrameError> {
    let logical = word.logical();
    let address = (logical >> 12) as u8;
    if address != ADDRESS {
        return Err(FrameError::InvalidAddress(address));
    }
    let mode = Mode::from_code(((logical >> 8) & 0xF) as u8)?;
    Ok((mode, ChannelMask(logical as u8)))
}
