//! Recording transport for unit tests.

use std::fmt;

use crate::frame::{CommandWord, ReplyWord};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

impl fmt::Display for BusFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("bus fault")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Init,
    Select(usize),
    Transfer { chip: usize, word: CommandWord },
    Deselect(usize),
}

/// Records every bus operation and panics if two chips are ever selected at
/// the same time or a transfer happens with no chip selected.
///
/// A failed `deselect` leaves the line asserted, like a pin that could not
/// be driven.
#[derive(Debug, Default)]
pub struct FakeTransport {
    chips: usize,
    selected: Option<usize>,
    selects: usize,
    attempts: usize,
    pub events: Vec<Event>,
    /// Fail the n-th select attempt (0-based).
    pub fail_select: Option<usize>,
    /// Fail this many upcoming deselects.
    pub fail_deselects: usize,
    /// Fail the n-th transfer attempt (0-based).
    pub fail_transfer: Option<usize>,
    /// Panic inside the next transfer, with the chip still selected.
    pub panic_transfer: bool,
    pub fail_init: bool,
    /// Reply returned for every successful transfer.
    pub reply: ReplyWord,
}

impl FakeTransport {
    pub fn new(chips: usize) -> Self {
        Self {
            chips,
            ..Default::default()
        }
    }

    /// Completed transfers.
    pub fn transfers(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Transfer { .. }))
            .count()
    }

    pub fn words(&self) -> Vec<CommandWord> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Transfer { word, .. } => Some(*word),
                _ => None,
            })
            .collect()
    }

    /// Chip whose line is asserted right now.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }
}

impl Transport for FakeTransport {
    type Error = BusFault;

    fn chips(&self) -> usize {
        self.chips
    }

    fn init(&mut self) -> Result<(), Self::Error> {
        if self.fail_init {
            return Err(BusFault);
        }
        self.events.push(Event::Init);
        Ok(())
    }

    fn select(&mut self, chip: usize) -> Result<(), Self::Error> {
        assert!(chip < self.chips, "no chip-select line {chip}");
        let attempt = self.selects;
        self.selects += 1;
        if self.fail_select == Some(attempt) {
            return Err(BusFault);
        }
        assert_eq!(self.selected, None, "chip {chip} selected while another is");
        self.selected = Some(chip);
        self.events.push(Event::Select(chip));
        Ok(())
    }

    fn deselect(&mut self, chip: usize) -> Result<(), Self::Error> {
        if let Some(other) = self.selected.filter(|&other| other != chip) {
            panic!("released chip {chip} while chip {other} was selected");
        }
        if self.fail_deselects > 0 {
            self.fail_deselects -= 1;
            return Err(BusFault);
        }
        self.selected = None;
        self.events.push(Event::Deselect(chip));
        Ok(())
    }

    fn transfer_word(&mut self, word: CommandWord) -> Result<ReplyWord, Self::Error> {
        let chip = self.selected.expect("transfer with no chip selected");
        if std::mem::take(&mut self.panic_transfer) {
            panic!("transfer to chip {chip} interrupted");
        }
        let attempt = self.attempts;
        self.attempts += 1;
        if self.fail_transfer == Some(attempt) {
            return Err(BusFault);
        }
        self.events.push(Event::Transfer { chip, word });
        Ok(self.reply)
    }
}
