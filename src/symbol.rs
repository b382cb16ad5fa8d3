use crate::error::{Error, Result};
use crate::{imbalance, CONTROL_SYMBOLS, DATA_MASK, INVERT_FLAG, SYMBOL_BITS, SYMBOL_MASK, XOR_FLAG};
use std::fmt::{self, Debug, Display, Write};

/// A 10-bit TMDS symbol.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(u16);

/// Selector of one of the four control-period symbols.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Control {
    C0 = 0,
    C1 = 1,
    C2 = 2,
    C3 = 3,
}

/// One unit carried by a symbol: a pixel byte or a control selector.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Word {
    Data(u8),
    Control(Control),
}

/// Renders the low `bits` of a value in binary, grouped by nibble from the LSB.
///
/// ```
/// use tmds::Grouped;
/// assert_eq!(Grouped::new(0b1101010100, 10).to_string(), "11 0101 0100");
/// ```
#[derive(Copy, Clone)]
pub struct Grouped {
    value: u16,
    bits: u32,
}

impl Symbol {
    #[inline(always)]
    pub(crate) fn from_bits(value: u16) -> Self {
        debug_assert_eq!(value & !SYMBOL_MASK, 0);
        Symbol(value)
    }

    #[inline(always)]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Bit 9: the data bits went out inverted.
    #[inline(always)]
    pub const fn is_inverted(self) -> bool {
        self.0 & INVERT_FLAG != 0
    }

    /// Bit 8: the minimized word was built with XOR rather than XNOR.
    #[inline(always)]
    pub const fn uses_xor(self) -> bool {
        self.0 & XOR_FLAG != 0
    }

    /// Bits 7..0 as transmitted.
    #[inline(always)]
    pub const fn data_bits(self) -> u8 {
        (self.0 & DATA_MASK) as u8
    }

    /// Ones minus zeros over all ten bits.
    pub fn disparity(self) -> i32 {
        imbalance(self.0, SYMBOL_BITS)
    }
}

impl TryFrom<u16> for Symbol {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        Error::check("symbol", value as i64, SYMBOL_MASK)?;
        Ok(Symbol(value))
    }
}

impl TryFrom<i32> for Symbol {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        Error::check("symbol", value as i64, SYMBOL_MASK)?;
        Ok(Symbol(value as u16))
    }
}

impl From<Symbol> for u16 {
    fn from(symbol: Symbol) -> u16 {
        symbol.0
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Symbol")
            .field(&format_args!("{}", Grouped::new(self.0, SYMBOL_BITS)))
            .finish()
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&Grouped::new(self.0, SYMBOL_BITS), f)
    }
}

impl fmt::Binary for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&self.0, f)
    }
}

impl Control {
    pub const ALL: [Control; 4] = [Control::C0, Control::C1, Control::C2, Control::C3];

    #[inline(always)]
    pub fn symbol(self) -> Symbol {
        Symbol(CONTROL_SYMBOLS[self as usize])
    }

    /// Inverse of [`Control::symbol`].
    pub fn from_symbol(symbol: Symbol) -> Option<Control> {
        Control::ALL.into_iter().find(|c| c.symbol() == symbol)
    }
}

impl TryFrom<u8> for Control {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Control::try_from(value as i32)
    }
}

impl TryFrom<i32> for Control {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        Error::check("control", value as i64, 3)?;
        Ok(Control::ALL[value as usize])
    }
}

impl Grouped {
    pub fn new(value: u16, bits: u32) -> Self {
        Grouped { value, bits }
    }
}

impl Display for Grouped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = format!("{:0width$b}", self.value, width = self.bits as usize);
        let len = digits.len();
        for (i, c) in digits.chars().enumerate() {
            if i != 0 && (len - i) % 4 == 0 {
                f.write_char(' ')?;
            }
            f.write_char(c)?;
        }
        Ok(())
    }
}

impl Debug for Grouped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}
