use std::fmt;

/// Driver error, generic over the transport's own error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error<E> {
    /// Channel number not in 1..=8 (or not PWM-capable for the PWM inputs).
    ChannelOutOfRange(u8),
    /// Mode code is not one of the three recognized values.
    InvalidMode(u8),
    /// Address nibble of a command word is not `1010b`.
    InvalidAddress(u8),
    /// Chip index outside the configured chain.
    UnknownChip(usize),
    /// An operation was attempted before `init` succeeded.
    NotInitialized,
    /// Bus initialization failed.
    Init(E),
    /// A transaction with `chip` did not complete. The cached state for that
    /// chip is unchanged. Also raised, naming the stuck chip, when a select
    /// line left asserted earlier still cannot be released.
    Transport { chip: usize, source: E },
    /// A PWM input pin could not be driven.
    Gpio(E),
}

impl<E> Error<E> {
    /// Index of the chip whose transaction failed, if this is a transport error.
    pub fn failed_chip(&self) -> Option<usize> {
        match self {
            Error::Transport { chip, .. } => Some(*chip),
            _ => None,
        }
    }
}

/// Invalid input to the frame codec or a channel mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    ChannelOutOfRange(u8),
    InvalidMode(u8),
    InvalidAddress(u8),
}

impl<E> From<FrameError> for Error<E> {
    fn from(value: FrameError) -> Self {
        match value {
            FrameError::ChannelOutOfRange(channel) => Self::ChannelOutOfRange(channel),
            FrameError::InvalidMode(code) => Self::InvalidMode(code),
            FrameError::InvalidAddress(address) => Self::InvalidAddress(address),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Error::<FrameError>::from(*self), f)
    }
}

impl std::error::Error for FrameError {}

/// Text that names none of the modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMode(pub String);

impl fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown mode {:?}, expected protect, diag, output, 1, 2 or 3",
            self.0
        )
    }
}

impl std::error::Error for UnknownMode {}

/// Chip index lookup failure raised by the state cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownChip(pub usize);

impl<E> From<UnknownChip> for Error<E> {
    fn from(value: UnknownChip) -> Self {
        Self::UnknownChip(value.0)
    }
}

impl<E: fmt::Display> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ChannelOutOfRange(channel) => write!(f, "channel {channel} out of range"),
            Error::InvalidMode(code) => write!(f, "invalid mode code {code:#06b}"),
            Error::InvalidAddress(address) => write!(f, "invalid address field {address:#06b}"),
            Error::UnknownChip(chip) => write!(f, "no chip at index {chip}"),
            Error::NotInitialized => f.write_str("bus not initialized"),
            Error::Init(source) => write!(f, "bus initialization failed: {source}"),
            Error::Transport { chip, source } => {
                write!(f, "transaction with chip {chip} failed: {source}")
            }
            Error::Gpio(source) => write!(f, "PWM input pin error: {source}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for Error<E> {}
