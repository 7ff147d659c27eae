use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};
use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
use l9733::frame::encode;
use l9733::{ChannelMask, ChipChain, Mode, Outcome, SpiTransport};

fn shift(mode: Mode, mask: u8, faults: u8) -> [SpiTransaction<u8>; 2] {
    let reply = u16::from(faults).reverse_bits().to_be_bytes();
    [
        SpiTransaction::transfer(
            encode(mode, ChannelMask(mask)).to_be_bytes().to_vec(),
            reply.to_vec(),
        ),
        SpiTransaction::flush(),
    ]
}

fn bracket(times: usize) -> Vec<PinTransaction> {
    let mut expectations = vec![PinTransaction::set(State::High)];
    for _ in 0..times {
        expectations.push(PinTransaction::set(State::Low));
        expectations.push(PinTransaction::set(State::High));
    }
    expectations
}

#[test]
fn single_chip_output_scenario() {
    let expectations: Vec<_> = [
        shift(Mode::Output, 0b0001_0000, 0),
        shift(Mode::Output, 0b1111_1111, 0),
    ]
    .into_iter()
    .flatten()
    .collect();
    let mut spi = SpiMock::new(&expectations);
    let mut cs = PinMock::new(&bracket(2));

    let mut chain = ChipChain::new(SpiTransport::new(spi.clone(), vec![cs.clone()]));
    chain.init().unwrap();
    assert_eq!(
        chain.mask(0, Mode::Output).unwrap(),
        ChannelMask(0b0000_0000)
    );

    assert!(chain.set_output(0, 5, true).unwrap().was_written());
    assert_eq!(
        chain.mask(0, Mode::Output).unwrap(),
        ChannelMask(0b0001_0000)
    );

    assert_eq!(chain.set_output(0, 5, true).unwrap(), Outcome::Unchanged);
    assert_eq!(
        chain.mask(0, Mode::Output).unwrap(),
        ChannelMask(0b0001_0000)
    );

    chain
        .set_multiple_pins(0, Mode::Output, ChannelMask(0b1111_1111))
        .unwrap();
    assert_eq!(
        chain.mask(0, Mode::Output).unwrap(),
        ChannelMask(0b1111_1111)
    );

    spi.done();
    cs.done();
}

#[test]
fn broadcast_over_two_chips_reports_faults() {
    let expectations: Vec<_> = [
        shift(Mode::Diag, 0xFF, 0b0000_0000),
        shift(Mode::Diag, 0xFF, 0b0100_0000),
    ]
    .into_iter()
    .flatten()
    .collect();
    let mut spi = SpiMock::new(&expectations);
    let mut cs0 = PinMock::new(&bracket(1));
    let mut cs1 = PinMock::new(&bracket(1));

    let mut chain = ChipChain::new(SpiTransport::new(
        spi.clone(),
        vec![cs0.clone(), cs1.clone()],
    ));
    chain.init().unwrap();

    let outcomes = chain.broadcast(Mode::Diag, ChannelMask::ALL).unwrap();
    assert_eq!(
        outcomes,
        vec![
            Outcome::Written {
                faults: ChannelMask::NONE
            },
            Outcome::Written {
                faults: ChannelMask(0b0100_0000)
            },
        ]
    );
    assert_eq!(chain.faults(1).unwrap(), ChannelMask(0b0100_0000));
    assert_eq!(
        chain.faults(1).unwrap().channels().collect::<Vec<_>>(),
        vec![7]
    );

    spi.done();
    cs0.done();
    cs1.done();
}

#[test]
fn targeted_leaves_other_select_lines_idle() {
    let expectations: Vec<_> = shift(Mode::Protect, 0b0000_0011, 0).into_iter().collect();
    let mut spi = SpiMock::new(&expectations);
    let mut cs0 = PinMock::new(&bracket(0));
    let mut cs1 = PinMock::new(&bracket(1));
    let mut cs2 = PinMock::new(&bracket(0));

    let mut chain = ChipChain::new(SpiTransport::new(
        spi.clone(),
        vec![cs0.clone(), cs1.clone(), cs2.clone()],
    ));
    chain.init().unwrap();
    chain
        .targeted(1, Mode::Protect, ChannelMask(0b0000_0011))
        .unwrap();

    assert_eq!(chain.mask(0, Mode::Protect).unwrap(), ChannelMask::NONE);
    assert_eq!(chain.mask(2, Mode::Protect).unwrap(), ChannelMask::NONE);

    spi.done();
    cs0.done();
    cs1.done();
    cs2.done();
}
