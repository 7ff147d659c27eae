//! Chips sharing one bus.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};

use crate::controller::Outcome;
use crate::frame::{self, ChannelMask, CommandWord, Mode, ReplyWord};
use crate::state::{ChipState, StateCache};
use crate::transport::Transport;
use crate::Error;

/// A transaction whose select line has not been seen released.
#[derive(Debug, Clone, Copy)]
struct InFlight {
    chip: usize,
    /// Word completely shifted into the chip. The chip latches it when its
    /// select line is released.
    shifted: Option<CommandWord>,
}

/// Every chip on one bus, plus what each of them currently holds.
///
/// Chip `i` is the chip gated by the transport's chip-select line `i`, which
/// is also its position in the daisy chain. `&mut self` on every bus
/// operation guarantees one transaction at a time; use [`SharedChain`] to
/// share a chain between threads.
pub struct ChipChain<T: Transport> {
    transport: T,
    cache: Option<StateCache>,
    in_flight: Option<InFlight>,
}

impl<T: Transport> ChipChain<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            cache: None,
            in_flight: None,
        }
    }

    /// Initialize the bus and start tracking every chip at its power-on state.
    ///
    /// Calling this again after a successful init leaves the bus and the
    /// cached state alone.
    pub fn init(&mut self) -> Result<(), Error<T::Error>> {
        if self.cache.is_some() {
            warn!("Bus already initialized, keeping cached state");
            return Ok(());
        }
        self.transport.init().map_err(Error::Init)?;
        let chips = self.transport.chips();
        debug!("Bus initialized with {chips} chips");
        self.cache = Some(StateCache::new(chips));
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.cache.is_some()
    }

    /// Number of chips in the chain.
    pub fn chips(&self) -> Result<usize, Error<T::Error>> {
        Ok(self.cache()?.len())
    }

    pub fn state(&self, chip: usize) -> Result<ChipState, Error<T::Error>> {
        Ok(*self.cache()?.chip(chip)?)
    }

    /// Last mask successfully written to the `mode` register of `chip`.
    pub fn mask(&self, chip: usize, mode: Mode) -> Result<ChannelMask, Error<T::Error>> {
        Ok(self.cache()?.get(chip, mode)?)
    }

    /// Fault bits the chip reported during its most recent transaction.
    pub fn faults(&self, chip: usize) -> Result<ChannelMask, Error<T::Error>> {
        Ok(self.cache()?.faults(chip)?)
    }

    /// Write `mask` into the `mode` register of every chip, in chain order.
    ///
    /// Stops at the first failing chip. Chips before it keep their new state;
    /// the returned error names the failing chip.
    pub fn broadcast(
        &mut self,
        mode: Mode,
        mask: ChannelMask,
    ) -> Result<Vec<Outcome>, Error<T::Error>> {
        let chips = self.chips()?;
        (0..chips)
            .map(|chip| self.set_multiple_pins(chip, mode, mask))
            .collect()
    }

    /// Write `mask` into the `mode` register of one chip.
    pub fn targeted(
        &mut self,
        chip: usize,
        mode: Mode,
        mask: ChannelMask,
    ) -> Result<Outcome, Error<T::Error>> {
        self.set_multiple_pins(chip, mode, mask)
    }

    /// Chip whose select line may still be asserted after a failed or
    /// interrupted transaction.
    ///
    /// No other chip is selected until that line has been released. Every
    /// transaction retries the release first.
    pub fn stuck_chip(&self) -> Option<usize> {
        self.in_flight.map(|in_flight| in_flight.chip)
    }

    /// Release the select line left behind by [`ChipChain::stuck_chip`].
    ///
    /// A word that was completely shifted in before the failure is latched by
    /// the chip on release, and is recorded in the cache at that point.
    pub fn recover(&mut self) -> Result<(), Error<T::Error>> {
        let Some(InFlight { chip, .. }) = self.in_flight else {
            return Ok(());
        };
        warn!("Releasing chip {chip}, left selected by an earlier transaction");
        let latched = self
            .release_line()
            .map_err(|source| Error::Transport { chip, source })?;
        if let Some(word) = latched {
            let (mode, mask) = frame::decode_command(word)?;
            debug!("Chip {chip} latched {mode} {mask} on release");
            self.cache_mut()?.set(chip, mode, mask)?;
        }
        Ok(())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Give back the transport, dropping the cached state.
    pub fn release(self) -> T {
        self.transport
    }

    pub(crate) fn cache(&self) -> Result<&StateCache, Error<T::Error>> {
        self.cache.as_ref().ok_or(Error::NotInitialized)
    }

    pub(crate) fn cache_mut(&mut self) -> Result<&mut StateCache, Error<T::Error>> {
        self.cache.as_mut().ok_or(Error::NotInitialized)
    }

    /// One select / transfer / deselect sequence with `chip`.
    ///
    /// Any line left asserted by an earlier transaction is released first. If
    /// that fails, `chip` is not selected.
    pub(crate) fn transact(
        &mut self,
        chip: usize,
        word: CommandWord,
    ) -> Result<ReplyWord, Error<T::Error>> {
        self.recover()?;

        let fail = |source| Error::Transport { chip, source };
        // Set before the line is touched and cleared only once it is released,
        // so an error or a panic below leaves the line marked.
        self.in_flight = Some(InFlight {
            chip,
            shifted: None,
        });

        if let Err(source) = self.transport.select(chip) {
            let _ = self.release_line();
            return Err(fail(source));
        }
        let reply = match self.transport.transfer_word(word) {
            Ok(reply) => reply,
            Err(source) => {
                // The transfer error is the one reported. A line that stays
                // asserted is released by the next transaction.
                let _ = self.release_line();
                return Err(fail(source));
            }
        };
        self.in_flight = Some(InFlight {
            chip,
            shifted: Some(word),
        });
        self.release_line().map_err(fail)?;
        Ok(reply)
    }

    /// Release the line of the transaction in flight, returning the word the
    /// chip latched, if it had received a whole one.
    fn release_line(&mut self) -> Result<Option<CommandWord>, T::Error> {
        let Some(in_flight) = self.in_flight else {
            return Ok(None);
        };
        if let Err(source) = self.transport.deselect(in_flight.chip) {
            warn!("Chip {} select line could not be released", in_flight.chip);
            return Err(source);
        }
        self.in_flight = None;
        Ok(in_flight.shifted)
    }
}

/// A [`ChipChain`] behind one lock, for use from several threads.
///
/// The lock covers the whole chain: chips share clock and data lines, so no
/// two of them can be addressed at once.
pub struct SharedChain<T: Transport>(Arc<Mutex<ChipChain<T>>>);

impl<T: Transport> SharedChain<T> {
    pub fn new(chain: ChipChain<T>) -> Self {
        Self(Arc::new(Mutex::new(chain)))
    }

    /// Exclusive access to the chain for as long as the guard lives.
    ///
    /// A lock poisoned by a panicking holder is recovered. If the panic hit
    /// mid-transaction, that chip is still marked as selected and the next
    /// transaction releases it before anything else is selected.
    pub fn lock(&self) -> MutexGuard<'_, ChipChain<T>> {
        self.0.lock().unwrap_or_else(|poisoned| {
            warn!("Chain lock poisoned by a panicking holder, recovering");
            self.0.clear_poison();
            poisoned.into_inner()
        })
    }

    /// Run `f` with the chain locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut ChipChain<T>) -> R) -> R {
        f(&mut self.lock())
    }
}

impl<T: Transport> Clone for SharedChain<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}
