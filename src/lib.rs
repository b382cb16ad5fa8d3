//! # TMDS Symbol Layout
//!
//! ```text
//!          9  8  7              0
//!          │  │  │              │
//!          ▼  ▼  ▼              ▼
//!          I  X  DDDD DDDD
//!          ▲  ▲  ▲
//!  INVERT──┘  │  └─ transmitted data (inverted when I is set)
//!             │
//!   XOR_FLAG──┘ 1 = XOR chain, 0 = XNOR chain
//! ```
//!
//! During a data period each byte goes through two stages.
//!
//! Transition minimization builds `q_m[0] = d[0]`, `q_m[n] = d[n] ^ q_m[n-1]`.
//! The chain is inverted (XNOR) when the byte has more than 4 ones, or exactly 4 ones
//! with bit 0 clear. Bit 8 records which operator was used.
//!
//! DC balancing then decides whether the 8 data bits are sent inverted, steering the
//! running disparity of the stream back toward zero. Bit 9 records the inversion.
//!
//! # Control Periods
//!
//! ```text
//!     C0  11 0101 0100
//!     C1  00 1010 1011
//!     C2  01 0101 0100
//!     C3  10 1010 1011
//! ```
//!
//! Emitting a control symbol resets the running disparity to zero.
//!
//! The decoder is stateless. It MUST know whether a symbol belongs to a data or a control
//! period, control symbols are not self-describing. See [`Symbol::decode_paired`].

#[macro_use]
extern crate log;

mod decode;
mod encode;
mod error;
pub mod fixture;
mod symbol;

pub use decode::{decode, DecodeWriter};
pub use encode::{EncodeWriter, Encoder};
pub use error::{Error, Result};
pub use symbol::{Control, Grouped, Symbol, Word};

/// how many bits a symbol carries
const SYMBOL_BITS: u32 = 10;
const DATA_BITS: u32 = 8;

const SYMBOL_MASK: u16 = (1 << SYMBOL_BITS) - 1;
const DATA_MASK: u16 = (1 << DATA_BITS) - 1;
/// bit 8, set when the XOR chain built the minimized word
const XOR_FLAG: u16 = 1 << 8;
/// bit 9, set when the data bits went out inverted
const INVERT_FLAG: u16 = 1 << 9;

/// Fixed symbols of the four control periods, indexed by the 2-bit selector.
const CONTROL_SYMBOLS: [u16; 4] = [0b1101010100, 0b0010101011, 0b0101010100, 0b1010101011];

#[inline(always)]
fn bit(word: u16, pos: u32) -> u16 {
    (word >> pos) & 1
}

/// ones minus zeros over the low `bits` of `word`
#[inline(always)]
fn imbalance(word: u16, bits: u32) -> i32 {
    let ones = (word & ((1 << bits) - 1)).count_ones() as i32;
    2 * ones - bits as i32
}

/// Runs the XOR (or XNOR) chain over `word`: `out[0] = word[0]`,
/// `out[n] = a[n] ^ b[n-1]` where the pair depends on the direction.
///
/// Encoding chains against its own output, decoding chains against the input.
#[inline(always)]
fn chain(word: u16, xnor: bool, against_output: bool) -> u8 {
    let mut out = bit(word, 0);
    for n in 1..DATA_BITS {
        let prev = if against_output {
            bit(out, n - 1)
        } else {
            bit(word, n - 1)
        };
        let mut b = bit(word, n) ^ prev;
        if xnor {
            b ^= 1;
        }
        out |= b << n;
    }
    out as u8
}

#[cfg(test)]
static INIT: std::sync::Once = std::sync::Once::new();

/// Setup function that is only run once, even if called multiple times.
///
/// Shared by every test module, the test binary has a single global logger.
#[cfg(test)]
pub(crate) fn setup() {
    INIT.call_once(|| {
        pretty_env_logger::init();
    });
}
