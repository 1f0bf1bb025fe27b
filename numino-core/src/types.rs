//! The small value types shared across the grid model: colors and cell values.

use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An opaque symbol from a closed, caller-supplied palette (e.g. `"R"`, `"B"`, `"Y"`).
///
/// Stored inline for palettes of short codes (the common case); falls back to the
/// heap only for unusually long symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorCode(SmallVec<[u8; 8]>);

impl ColorCode {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(SmallVec::from_slice(s.as_ref().as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        // Constructed only from valid UTF-8 (`&str`), so this never fails.
        core::str::from_utf8(&self.0).expect("ColorCode always holds valid UTF-8")
    }
}

impl core::fmt::Display for ColorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ColorCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ColorCode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A cell's full value: the block-size number paired with its color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellValue<'a> {
    pub num: u32,
    pub col: &'a ColorCode,
}

/// An owned cell value, used where we need to store rather than borrow from a palette.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OwnedCellValue {
    pub num: u32,
    pub col: ColorCode,
}

impl OwnedCellValue {
    pub fn new(num: u32, col: ColorCode) -> Self {
        Self { num, col }
    }
}

/// A pre-revealed part (number and/or color) of a specific cell.
///
/// At least one of `num`/`col` must be present; `Puzzle::validate` rejects an
/// empty given.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Given {
    pub row: u16,
    pub col: u16,
    pub num: Option<u32>,
    pub color: Option<ColorCode>,
}

impl Given {
    pub fn new(row: u16, col: u16, num: Option<u32>, color: Option<ColorCode>) -> Self {
        Self {
            row,
            col,
            num,
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_code_roundtrips_through_str() {
        let c = ColorCode::new("R");
        assert_eq!(c.as_str(), "R");
        assert_eq!(c, ColorCode::from("R"));
    }

    #[test]
    fn color_code_handles_longer_symbols() {
        let c = ColorCode::new("cornflower");
        assert_eq!(c.as_str(), "cornflower");
    }
}
