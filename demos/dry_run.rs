//! Drive a three-chip chain against a transport that only logs frames.
//!
//! RUST_LOG=debug cargo run --example dry-run

use std::convert::Infallible;

use l9733::{ChannelMask, ChipChain, CommandWord, Mode, ReplyWord, Transport};
use log::info;

struct DryRun {
    chips: usize,
}

impl Transport for DryRun {
    type Error = Infallible;

    fn chips(&self) -> usize {
        self.chips
    }

    fn init(&mut self) -> Result<(), Self::Error> {
        info!("init, {} chips", self.chips);
        Ok(())
    }

    fn select(&mut self, chip: usize) -> Result<(), Self::Error> {
        info!("CS{chip} low");
        Ok(())
    }

    fn deselect(&mut self, chip: usize) -> Result<(), Self::Error> {
        info!("CS{chip} high");
        Ok(())
    }

    fn transfer_word(&mut self, word: CommandWord) -> Result<ReplyWord, Self::Error> {
        info!("shift {:016b} ({word})", word.wire());
        Ok(ReplyWord::default())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_millis().init();

    let mut chain = ChipChain::new(DryRun { chips: 3 });
    chain.init()?;

    chain.broadcast(Mode::Protect, ChannelMask::ALL)?;
    chain.set_diagnostics(1, 2, true)?;
    chain.set_output(0, 5, true)?;
    // Already set, nothing is shifted.
    chain.set_output(0, 5, true)?;
    chain.targeted(2, Mode::Output, ChannelMask(0b1100_0011))?;

    for chip in 0..chain.chips()? {
        let state = chain.state(chip)?;
        println!(
            "chip {chip}: protect {} diag {} output {}",
            state.protect, state.diag, state.output
        );
    }
    Ok(())
}
