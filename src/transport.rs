use std::fmt;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use log::{debug, trace};

use crate::frame::{CommandWord, ReplyWord};

/// Raw bus access for a chain of chips.
///
/// Callers guarantee `init` runs once before any transfer and that every
/// `transfer_word` is bracketed by `select` and `deselect` of one chip.
pub trait Transport {
    type Error;

    /// Number of chip-select lines, i.e. chips on the bus.
    fn chips(&self) -> usize;

    fn init(&mut self) -> Result<(), Self::Error>;

    fn select(&mut self, chip: usize) -> Result<(), Self::Error>;

    fn deselect(&mut self, chip: usize) -> Result<(), Self::Error>;

    /// Shift `word` out and return what the selected chip shifted back.
    /// Blocks until the shift has physically completed.
    fn transfer_word(&mut self, word: CommandWord) -> Result<ReplyWord, Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn chips(&self) -> usize {
        T::chips(self)
    }

    fn init(&mut self) -> Result<(), Self::Error> {
        T::init(self)
    }

    fn select(&mut self, chip: usize) -> Result<(), Self::Error> {
        T::select(self, chip)
    }

    fn deselect(&mut self, chip: usize) -> Result<(), Self::Error> {
        T::deselect(self, chip)
    }

    fn transfer_word(&mut self, word: CommandWord) -> Result<ReplyWord, Self::Error> {
        T::transfer_word(self, word)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChipSelectPolarity {
    #[default]
    ActiveLow,
    ActiveHigh,
}

#[derive(Debug, Clone, Copy, Default, bon::Builder)]
pub struct TransportConfig {
    #[builder(default)]
    pub chip_select: ChipSelectPolarity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiTransportError<S, P> {
    Spi(S),
    ChipSelect(P),
    NoSuchLine(usize),
}

impl<S: fmt::Debug, P: fmt::Debug> fmt::Display for SpiTransportError<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpiTransportError::Spi(e) => write!(f, "SPI bus error: {e:?}"),
            SpiTransportError::ChipSelect(e) => write!(f, "chip-select pin error: {e:?}"),
            SpiTransportError::NoSuchLine(chip) => write!(f, "no chip-select line {chip}"),
        }
    }
}

impl<S: fmt::Debug, P: fmt::Debug> std::error::Error for SpiTransportError<S, P> {}

impl<S: embedded_hal::spi::Error, P: fmt::Debug> embedded_hal::spi::Error
    for SpiTransportError<S, P>
{
    fn kind(&self) -> embedded_hal::spi::ErrorKind {
        match self {
            SpiTransportError::Spi(e) => e.kind(),
            _ => embedded_hal::spi::ErrorKind::ChipSelectFault,
        }
    }
}

/// [`Transport`] over a shared SPI bus with one chip-select pin per chip.
///
/// The bus must shift MSB-first. Bit ordering for the chip is already handled
/// by the frame encoder.
pub struct SpiTransport<SPI, CS> {
    spi: SPI,
    chip_selects: Vec<CS>,
    config: TransportConfig,
}

impl<SPI, CS> SpiTransport<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    /// `chip_selects[i]` gates chip `i` of the chain.
    pub fn new(spi: SPI, chip_selects: Vec<CS>) -> Self {
        Self::with_config(spi, chip_selects, TransportConfig::default())
    }

    pub fn with_config(spi: SPI, chip_selects: Vec<CS>, config: TransportConfig) -> Self {
        Self {
            spi,
            chip_selects,
            config,
        }
    }

    /// Give back the bus and pins.
    pub fn release(self) -> (SPI, Vec<CS>) {
        (self.spi, self.chip_selects)
    }

    fn drive(
        &mut self,
        chip: usize,
        active: bool,
    ) -> Result<(), SpiTransportError<SPI::Error, CS::Error>> {
        let high = match self.config.chip_select {
            ChipSelectPolarity::ActiveLow => !active,
            ChipSelectPolarity::ActiveHigh => active,
        };
        let line = self
            .chip_selects
            .get_mut(chip)
            .ok_or(SpiTransportError::NoSuchLine(chip))?;
        let result = if high {
            line.set_high()
        } else {
            line.set_low()
        };
        result.map_err(SpiTransportError::ChipSelect)
    }
}

impl<SPI, CS> Transport for SpiTransport<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    type Error = SpiTransportError<SPI::Error, CS::Error>;

    fn chips(&self) -> usize {
        self.chip_selects.len()
    }

    fn init(&mut self) -> Result<(), Self::Error> {
        debug!("SPI init, {} chip-select lines", self.chip_selects.len());
        for chip in 0..self.chip_selects.len() {
            self.drive(chip, false)?;
        }
        Ok(())
    }

    fn select(&mut self, chip: usize) -> Result<(), Self::Error> {
        trace!("CS{chip} assert");
        self.drive(chip, true)
    }

    fn deselect(&mut self, chip: usize) -> Result<(), Self::Error> {
        trace!("CS{chip} release");
        self.drive(chip, false)
    }

    fn transfer_word(&mut self, word: CommandWord) -> Result<ReplyWord, Self::Error> {
        let write = word.to_be_bytes();
        let mut read = [0u8; 2];
        debug!("SPI Transfer w:{write:02X?}");

        self.spi
            .transfer(&mut read, &write)
            .map_err(SpiTransportError::Spi)?;
        // The shift must be complete before the caller releases chip select.
        self.spi.flush().map_err(SpiTransportError::Spi)?;

        Ok(ReplyWord::from_be_bytes(read))
    }
}
