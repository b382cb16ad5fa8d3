use crate::error::{Error, Result};
use crate::symbol::{Control, Symbol, Word};
use crate::{chain, imbalance, Grouped, DATA_BITS, DATA_MASK, INVERT_FLAG, XOR_FLAG};
use std::io;

/// Stateful TMDS encoder for a single channel.
///
/// Owns the running disparity of the stream. Independent streams need independent
/// encoders.
#[derive(Debug, Default)]
pub struct Encoder {
    cnt: i32,
}

/// Encodes every written byte as a data-period symbol, two big-endian bytes per symbol.
pub struct EncodeWriter<W> {
    encoder: Encoder,
    writer: W,
}

impl Encoder {
    pub fn new() -> Self {
        Encoder { cnt: 0 }
    }

    /// Resume a stream whose running disparity is already known.
    pub fn with_disparity(cnt: i32) -> Self {
        Encoder { cnt }
    }

    /// Current running disparity, ones minus zeros sent since the last control period.
    #[inline(always)]
    pub fn disparity(&self) -> i32 {
        self.cnt
    }

    /// Checked entry point taking raw values.
    ///
    /// `control` is ignored during a data period but must still be a valid selector.
    /// On error the running disparity is left untouched.
    pub fn encode(&mut self, data: i32, data_period: bool, control: i32) -> Result<Symbol> {
        Error::check("data", data as i64, DATA_MASK)?;
        let control = Control::try_from(control)?;
        let word = if data_period {
            Word::Data(data as u8)
        } else {
            Word::Control(control)
        };
        Ok(self.encode_word(word))
    }

    pub fn encode_word(&mut self, word: Word) -> Symbol {
        match word {
            Word::Data(data) => self.data(data),
            Word::Control(control) => self.control(control),
        }
    }

    /// Encode one pixel byte.
    #[inline(always)]
    pub fn data(&mut self, data: u8) -> Symbol {
        let q_m = minimize(data);
        let xor = q_m & XOR_FLAG != 0;
        // ones minus zeros of q_m[0:7]
        let diff = imbalance(q_m, DATA_BITS);
        trace!(
            "data {:02X} -> q_m {}, diff {diff}, cnt {}",
            data,
            Grouped::new(q_m, 9),
            self.cnt
        );

        let (symbol, delta) = if self.cnt == 0 || diff == 0 {
            trace!("balanced, send by operator");
            if xor {
                (q_m, diff)
            } else {
                (INVERT_FLAG | (!q_m & DATA_MASK), -diff)
            }
        } else if (self.cnt > 0 && diff > 0) || (self.cnt < 0 && diff < 0) {
            trace!("would worsen disparity, invert");
            (
                INVERT_FLAG | (q_m & XOR_FLAG) | (!q_m & DATA_MASK),
                2 * xor as i32 - diff,
            )
        } else {
            trace!("send as is");
            (q_m, diff - 2 * !xor as i32)
        };

        self.cnt += delta;
        let symbol = Symbol::from_bits(symbol);
        trace!("emit {symbol}, cnt {}", self.cnt);
        symbol
    }

    /// Encode one control period. Resets the running disparity.
    #[inline(always)]
    pub fn control(&mut self, control: Control) -> Symbol {
        if self.cnt != 0 {
            debug!("control period {control:?}, reset cnt {} -> 0", self.cnt);
        }
        self.cnt = 0;
        control.symbol()
    }
}

/// Transition minimization: the XOR or XNOR chain over `data`, with the operator
/// recorded in bit 8.
#[inline(always)]
fn minimize(data: u8) -> u16 {
    let ones = data.count_ones();
    let xnor = ones > 4 || (ones == 4 && data & 1 == 0);
    let q_m = chain(data as u16, xnor, true) as u16;
    if xnor {
        q_m
    } else {
        q_m | XOR_FLAG
    }
}

impl<W: io::Write> EncodeWriter<W> {
    pub fn new(writer: W) -> Self {
        EncodeWriter::with_encoder(Encoder::new(), writer)
    }

    pub fn with_encoder(encoder: Encoder, writer: W) -> Self {
        EncodeWriter { encoder, writer }
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// Encode and emit one byte. The running disparity only advances when the symbol
    /// reached the writer.
    #[inline(always)]
    pub fn update(&mut self, byte: u8) -> io::Result<()> {
        self.emit(Word::Data(byte))
    }

    /// Emit a control-period symbol between runs of data.
    pub fn blank(&mut self, control: Control) -> io::Result<()> {
        self.emit(Word::Control(control))
    }

    #[inline(always)]
    fn emit(&mut self, word: Word) -> io::Result<()> {
        let cnt = self.encoder.cnt;
        let symbol = self.encoder.encode_word(word);
        let result = self.writer.write_all(&symbol.value().to_be_bytes());
        if result.is_err() {
            trace!("write failed, roll cnt back to {cnt}");
            self.encoder.cnt = cnt;
        }
        result
    }

    pub fn finalize(mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl<W: io::Write> io::Write for EncodeWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for (i, byte) in buf.iter().enumerate() {
            if let Err(e) = self.update(*byte) {
                return if i == 0 { Err(e) } else { Ok(i) };
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
