//! Driver core for the L9733 octal protected output driver.
//!
//! The chip is written with 16-bit command words over SPI. Each word selects
//! one of three registers ([`Mode`]): overcurrent protection enable,
//! diagnostic enable, or output state, and replaces its 8-bit channel mask.
//! While the word is shifted in, the chip shifts its fault bits out.
//!
//! [`ChipChain`] owns the bus and a cache of what each chip's registers
//! hold. Writes that would not change a register are never sent, and the
//! cache is only updated once a transaction has completed.
//!
//! ```no_run
//! use l9733::{ChannelMask, ChipChain, Error, Mode, Transport};
//!
//! fn configure<T: Transport>(transport: T) -> Result<(), Error<T::Error>> {
//!     let mut chain = ChipChain::new(transport);
//!     chain.init()?;
//!     chain.set_protection(0, 3, true)?;
//!     chain.set_output(0, 3, true)?;
//!     chain.broadcast(Mode::Diag, ChannelMask::ALL)?;
//!     Ok(())
//! }
//! ```

mod chain;
mod controller;
mod error;
pub mod frame;
pub mod pwm;
mod state;
mod transport;

#[cfg(test)]
mod fake;

pub use chain::{ChipChain, SharedChain};
pub use controller::Outcome;
pub use error::{Error, FrameError, UnknownChip, UnknownMode};
pub use frame::{ChannelMask, CommandWord, Mode, ReplyWord};
pub use pwm::PwmInputs;
pub use state::ChipState;
pub use transport::{
    ChipSelectPolarity, SpiTransport, SpiTransportError, Transport, TransportConfig,
};
