//! Critical-bit descriptors.
//!
//! Every key is read as an infinite bit string: for each byte position `i`
//! there is first a *presence* bit (`1` while `i < key.len()`), then the eight
//! data bits of `key[i]` from most to least significant (all `0` once the
//! key has ended). Two distinct keys always differ somewhere in that string,
//! and comparing the strings bit by bit gives the same answer as comparing
//! the keys lexicographically, with a proper prefix sorting first.
//!
//! A [`CriticalBit`] names one position of that string. Positions that test a
//! presence bit are [`CriticalBit::ByLength`]; positions that test a data bit
//! are [`CriticalBit::ByBit`].

use std::cmp::Ordering;
use std::fmt;

/// The position of the first bit at which two keys differ.
///
/// `ByBit` stores its bit as an inverted mask: every bit is set except the
/// critical one, so the eight legal masks are `0x7F, 0xBF, 0xDF, 0xEF, 0xF7,
/// 0xFB, 0xFD, 0xFE` (most to least significant bit).
///
/// Descriptors are totally ordered by where they occur in the key's bit
/// string: by `byte_index`, then `ByLength` before any `ByBit` at the same
/// byte, then by ascending mask (a smaller mask is a higher-order bit).
///
/// # Examples
///
/// ```rust
/// use immutrie::persistent::CriticalBit;
///
/// let critical = CriticalBit::locate(&[0x01, 0x02, 0x02], &[0x01, 0x02, 0x03]);
/// assert_eq!(critical, Some(CriticalBit::ByBit { byte_index: 2, mask: 0xFE }));
///
/// let critical = CriticalBit::locate(&[0x01, 0x02], &[0x01, 0x02, 0x03]);
/// assert_eq!(critical, Some(CriticalBit::ByLength { byte_index: 2 }));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CriticalBit {
    /// Splits keys by length: keys no longer than `byte_index` go to child 0,
    /// strictly longer keys go to child 1.
    ByLength {
        /// Length of the shorter of the two keys that produced this split.
        byte_index: usize,
    },
    /// Splits keys by one data bit of the byte at `byte_index`.
    ByBit {
        /// Index of the byte holding the critical bit.
        byte_index: usize,
        /// All bits set except the critical one.
        mask: u8,
    },
}

impl CriticalBit {
    /// Finds the first position at which `new_key` and `existing_key` differ.
    ///
    /// Returns `None` when the keys are equal.
    #[must_use]
    pub fn locate(new_key: &[u8], existing_key: &[u8]) -> Option<Self> {
        let differing = new_key
            .iter()
            .zip(existing_key)
            .position(|(new_byte, existing_byte)| new_byte != existing_byte);

        match differing {
            Some(byte_index) => Some(Self::ByBit {
                byte_index,
                mask: critical_mask(new_key[byte_index] ^ existing_key[byte_index]),
            }),
            None if new_key.len() == existing_key.len() => None,
            None => Some(Self::ByLength {
                byte_index: new_key.len().min(existing_key.len()),
            }),
        }
    }

    /// Selects the child (`0` or `1`) that `key` belongs to at this position.
    ///
    /// Bytes past the end of `key` read as zero.
    #[inline]
    #[must_use]
    pub fn direction(self, key: &[u8]) -> usize {
        match self {
            Self::ByLength { byte_index } => usize::from(key.len() > byte_index),
            Self::ByBit { byte_index, mask } => {
                let byte = key.get(byte_index).copied().unwrap_or(0);
                // `mask | byte` is 0xFF exactly when the critical bit is set,
                // and only then does the increment carry into bit 8.
                usize::from((1 + u16::from(mask | byte)) >> 8)
            }
        }
    }

    /// Index of the byte this descriptor inspects.
    #[inline]
    #[must_use]
    pub const fn byte_index(self) -> usize {
        match self {
            Self::ByLength { byte_index } | Self::ByBit { byte_index, .. } => byte_index,
        }
    }

    /// Rank of this descriptor within its byte: `0` for the presence bit,
    /// the mask itself for data bits.
    const fn rank(self) -> u16 {
        match self {
            Self::ByLength { .. } => 0,
            Self::ByBit { mask, .. } => mask as u16,
        }
    }
}

impl Ord for CriticalBit {
    fn cmp(&self, other: &Self) -> Ordering {
        self.byte_index()
            .cmp(&other.byte_index())
            .then_with(|| self.rank().cmp(&other.rank()))
    }
}

impl PartialOrd for CriticalBit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CriticalBit {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByLength { byte_index } => write!(formatter, "[{byte_index}] len"),
            Self::ByBit { byte_index, mask } => write!(formatter, "[{byte_index}] {mask:#04x}"),
        }
    }
}

/// Turns the XOR of two differing bytes into a mask with a single zero bit at
/// the highest differing position.
#[inline]
const fn critical_mask(difference: u8) -> u8 {
    let mut smeared = difference;
    smeared |= smeared >> 1;
    smeared |= smeared >> 2;
    smeared |= smeared >> 4;
    // every bit at or below the highest set bit is now 1; keep only the top one
    !(smeared ^ (smeared >> 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0x01, 0xFE)]
    #[case(0x06, 0xFB)]
    #[case(0x82, 0x7F)]
    #[case(0x10, 0xEF)]
    #[case(0xFF, 0x7F)]
    #[case(0x3C, 0xDF)]
    fn test_critical_mask(#[case] difference: u8, #[case] expected: u8) {
        assert_eq!(critical_mask(difference), expected);
    }

    #[rstest]
    fn test_critical_mask_has_single_zero_bit() {
        for difference in 1..=u8::MAX {
            assert_eq!(critical_mask(difference).count_zeros(), 1, "{difference:#04x}");
        }
    }

    #[rstest]
    #[case(&[0x01, 0x02, 0x02], &[0x01, 0x02, 0x03], Some(CriticalBit::ByBit { byte_index: 2, mask: 0xFE }))]
    #[case(&[0x01, 0x04, 0x02], &[0x01, 0x02, 0x03], Some(CriticalBit::ByBit { byte_index: 1, mask: 0xFB }))]
    #[case(&[0x01, 0x80, 0x02], &[0x01, 0x02, 0x03], Some(CriticalBit::ByBit { byte_index: 1, mask: 0x7F }))]
    #[case(&[0x01, 0x02], &[0x01, 0x02, 0x03], Some(CriticalBit::ByLength { byte_index: 2 }))]
    #[case(&[0x01, 0x02, 0x03, 0x04], &[0x01, 0x02, 0x03], Some(CriticalBit::ByLength { byte_index: 3 }))]
    #[case(&[], &[0x00], Some(CriticalBit::ByLength { byte_index: 0 }))]
    #[case(&[0x01, 0x02], &[0x01, 0x02], None)]
    #[case(&[], &[], None)]
    fn test_locate(
        #[case] new_key: &[u8],
        #[case] existing_key: &[u8],
        #[case] expected: Option<CriticalBit>,
    ) {
        assert_eq!(CriticalBit::locate(new_key, existing_key), expected);
    }

    #[rstest]
    fn test_locate_is_symmetric() {
        let keys: [&[u8]; 6] = [&[], &[0x00], &[0x00, 0x00], &[0x01], &[0x80, 0x01], &[0xFF]];
        for left in keys {
            for right in keys {
                assert_eq!(CriticalBit::locate(left, right), CriticalBit::locate(right, left));
            }
        }
    }

    #[rstest]
    #[case(&[0x01, 0x02], 0)]
    #[case(&[0x01], 0)]
    #[case(&[], 0)]
    #[case(&[0x01, 0x02, 0x00], 1)]
    #[case(&[0x01, 0x02, 0x03, 0x04], 1)]
    fn test_direction_by_length(#[case] key: &[u8], #[case] expected: usize) {
        let critical = CriticalBit::ByLength { byte_index: 2 };
        assert_eq!(critical.direction(key), expected);
    }

    #[rstest]
    #[case(&[0x01, 0x02, 0x02], 0)]
    #[case(&[0x01, 0x02, 0x03], 1)]
    #[case(&[0x01, 0x02], 0)]
    #[case(&[0xFF, 0xFF, 0xFE], 0)]
    #[case(&[0x00, 0x00, 0x01], 1)]
    fn test_direction_by_bit(#[case] key: &[u8], #[case] expected: usize) {
        let critical = CriticalBit::ByBit { byte_index: 2, mask: 0xFE };
        assert_eq!(critical.direction(key), expected);
    }

    #[rstest]
    fn test_direction_separates_located_keys() {
        let keys: [&[u8]; 7] = [
            &[],
            &[0x00],
            &[0x00, 0x00],
            &[0x01],
            &[0x01, 0x00],
            &[0x80, 0x01],
            &[0xFF],
        ];
        for (position, smaller) in keys.iter().enumerate() {
            for larger in &keys[position + 1..] {
                let critical = CriticalBit::locate(smaller, larger).expect("distinct keys");
                assert_eq!(critical.direction(smaller), 0, "{smaller:?} < {larger:?}");
                assert_eq!(critical.direction(larger), 1, "{smaller:?} < {larger:?}");
            }
        }
    }

    #[rstest]
    fn test_order_within_byte() {
        let mut descriptors = vec![
            CriticalBit::ByBit { byte_index: 1, mask: 0xFE },
            CriticalBit::ByBit { byte_index: 0, mask: 0xFE },
            CriticalBit::ByBit { byte_index: 1, mask: 0x7F },
            CriticalBit::ByLength { byte_index: 1 },
            CriticalBit::ByLength { byte_index: 2 },
        ];
        descriptors.sort();
        assert_eq!(
            descriptors,
            vec![
                CriticalBit::ByBit { byte_index: 0, mask: 0xFE },
                CriticalBit::ByLength { byte_index: 1 },
                CriticalBit::ByBit { byte_index: 1, mask: 0x7F },
                CriticalBit::ByBit { byte_index: 1, mask: 0xFE },
                CriticalBit::ByLength { byte_index: 2 },
            ]
        );
    }

    #[rstest]
    fn test_display() {
        assert_eq!(CriticalBit::ByLength { byte_index: 4 }.to_string(), "[4] len");
        assert_eq!(
            CriticalBit::ByBit { byte_index: 2, mask: 0xFE }.to_string(),
            "[2] 0xfe"
        );
    }
}
