use l9733::frame::{decode_command, encode};
use l9733::{ChannelMask, Mode};

const USAGE: &str =
    "usage: l9733-frame <protect|diag|output|1|2|3> <mask, e.g. 0b00010000 or 0x10>";

fn parse_mask(s: &str) -> Option<ChannelMask> {
    let bits = if let Some(bin) = s.strip_prefix("0b") {
        u8::from_str_radix(&bin.replace('_', ""), 2).ok()
    } else if let Some(hex) = s.strip_prefix("0x") {
        u8::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    };
    bits.map(ChannelMask)
}

fn main() {
    let mut args = std::env::args().skip(1);
    let (Some(mode), Some(mask)) = (args.next(), args.next()) else {
        eprintln!("{USAGE}");
        std::process::exit(1)
    };

    let mode: Mode = match mode.parse() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            std::process::exit(1)
        }
    };
    let Some(mask) = parse_mask(&mask) else {
        eprintln!("invalid mask {mask:?}\n{USAGE}");
        std::process::exit(1)
    };

    let word = encode(mode, mask);
    println!("mode:     {mode} ({:04b})", mode.code());
    println!("channels: {:?}", mask.channels().collect::<Vec<_>>());
    println!("logical:  {word}");
    println!("wire:     {:016b} ({:#06X})", word.wire(), word.wire());
    println!("bytes:    {:02X?}", word.to_be_bytes());

    // Decoding the word back must give the same fields.
    match decode_command(word) {
        Ok((decoded_mode, decoded_mask)) if decoded_mode == mode && decoded_mask == mask => {}
        other => {
            eprintln!("Round trip mismatch: {other:?}");
            std::process::exit(2)
        }
    }
}
