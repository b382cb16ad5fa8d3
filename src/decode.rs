use crate::error::Result;
use crate::symbol::{Control, Symbol, Word};
use crate::{chain, DATA_MASK};
use std::io;

/// Decode a raw data-period symbol.
pub fn decode(symbol: u16) -> Result<u8> {
    Ok(Symbol::try_from(symbol)?.decode())
}

impl Symbol {
    /// Recover the pixel byte of a data-period symbol.
    ///
    /// Control symbols decode to garbage here, use [`Symbol::decode_paired`] when the
    /// period is not known to be a data period.
    #[inline(always)]
    pub fn decode(self) -> u8 {
        let mut word = self.value();
        if self.is_inverted() {
            word ^= DATA_MASK;
        }
        let data = chain(word, !self.uses_xor(), false);
        trace!("decode {self} -> {data:02X}");
        data
    }

    /// Decode with the data-enable side channel supplied by the receiver.
    ///
    /// Returns `None` when `data_enable` is low and the symbol is not a control code.
    pub fn decode_paired(self, data_enable: bool) -> Option<Word> {
        if data_enable {
            Some(Word::Data(self.decode()))
        } else {
            let control = Control::from_symbol(self);
            if control.is_none() {
                debug!("{self} is not a control symbol");
            }
            control.map(Word::Control)
        }
    }
}

/// Consumes big-endian 2-byte symbols and writes the decoded bytes.
pub struct DecodeWriter<W> {
    pending: Option<u8>,
    writer: W,
}

impl<W: io::Write> DecodeWriter<W> {
    pub fn new(writer: W) -> DecodeWriter<W> {
        DecodeWriter {
            pending: None,
            writer,
        }
    }

    #[inline(always)]
    pub fn update(&mut self, enc: u16) -> io::Result<()> {
        let symbol = Symbol::try_from(enc)?;
        self.writer.write_all(&[symbol.decode()])
    }

    pub fn finalize(mut self) -> io::Result<()> {
        if let Some(byte) = self.pending {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("dangling half symbol 0x{byte:02X}"),
            ));
        }
        self.writer.flush()
    }
}

impl<W: io::Write> io::Write for DecodeWriter<W> {
    /// Stops at the first bad symbol: `Err` when nothing was consumed, otherwise the
    /// count of bytes consumed before it.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut consumed = 0;
        if let Some(hi) = self.pending {
            let Some(&lo) = buf.first() else {
                return Ok(0);
            };
            self.update(u16::from_be_bytes([hi, lo]))?;
            self.pending = None;
            consumed = 1;
        }
        for bytes in buf[consumed..].chunks_exact(2) {
            if let Err(e) = self.update(u16::from_be_bytes([bytes[0], bytes[1]])) {
                return if consumed == 0 { Err(e) } else { Ok(consumed) };
            }
            consumed += 2;
        }
        if let [byte] = buf[consumed..] {
            trace!("hold half symbol 0x{byte:02X}");
            self.pending = Some(byte);
            consumed += 1;
        }
        Ok(consumed)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::{decode, DecodeWriter};
    use crate::{setup, Control, Encoder, Error, Symbol, Word};
    use std::io::{self, Write};

    /// (decoded bytes, symbol stream)
    const TEST_VECTOR: [(&str, &str); 4] = [
        (
            "00ff55aa0ff0817efe01",
            "010000ff0133023303fa0205017f008002ff0300",
        ),
        ("10101010eb", "01f001f001f001f0020c"),
        ("deadbeef", "021f0031023f02f0"),
        (
            "4420823cfde6f1c26b30f90e",
            "013c01e0017e024102fe000802fa01be028c011000fd01fa",
        ),
    ];

    #[test]
    fn test_decode_range() {
        setup();
        assert_eq!(decode(0x100), Ok(0x00));
        assert_eq!(decode(0x200), Ok(0xFF));
        assert!(matches!(
            decode(1024),
            Err(Error::OutOfRange {
                field: "symbol",
                value: 1024,
                ..
            })
        ));
    }

    #[test]
    fn test_decode_ignores_history() {
        setup();
        // the same byte encodes differently under different disparities
        let mut symbols = vec![];
        for cnt in [-8, 0, 8] {
            let symbol = Encoder::with_disparity(cnt).data(0x33);
            symbols.push(symbol);
            assert_eq!(symbol.decode(), 0x33);
        }
        assert_ne!(symbols[0], symbols[2]);
    }

    #[test]
    fn test_decode_paired() {
        setup();
        for control in Control::ALL {
            let symbol = control.symbol();
            assert_eq!(symbol.decode_paired(false), Some(Word::Control(control)));
        }
        let symbol = Symbol::try_from(0x100u16).unwrap();
        assert_eq!(symbol.decode_paired(true), Some(Word::Data(0x00)));
        assert_eq!(symbol.decode_paired(false), None);
    }

    #[test]
    fn test_decode_writer() {
        setup();
        for (expected, input) in TEST_VECTOR.into_iter() {
            let input = hex::decode(input).unwrap();
            let expected = hex::decode(expected).unwrap();
            let mut out = vec![];
            let mut writer = DecodeWriter::new(&mut out);
            // split at odd offsets so symbols straddle writes
            for chunk in input.chunks(3) {
                writer.write_all(chunk).unwrap();
            }
            writer.finalize().unwrap();
            assert_eq!(expected, out);
        }
    }

    #[test]
    fn test_decode_writer_errors() {
        setup();
        let mut out = vec![];
        let mut writer = DecodeWriter::new(&mut out);
        let err = writer.write_all(&[0x04, 0x00]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let mut writer = DecodeWriter::new(&mut out);
        writer.write_all(&[0x01, 0x00, 0x01]).unwrap();
        let err = writer.finalize().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(out, vec![0x00]);
    }

    #[test]
    fn test_decode_writer_partial() {
        setup();
        let mut out = vec![];
        let mut writer = DecodeWriter::new(&mut out);
        // the good symbol is consumed, the bad one is left for the next call
        assert_eq!(writer.write(&[0x01, 0x00, 0x04, 0x00]).unwrap(), 2);
        let err = writer.write(&[0x04, 0x00]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        // a held half symbol completes, then the bad symbol stops the write
        writer.write_all(&[0x02]).unwrap();
        assert_eq!(writer.write(&[0x00, 0x04, 0x00]).unwrap(), 1);
        writer.finalize().unwrap();
        assert_eq!(out, vec![0x00, 0xFF]);
    }
}
