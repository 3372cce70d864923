//! Symbol model for raw noise-source samples.
//!
//! The input stream is a sequence of symbols, one byte each, holding
//! 1–8 significant bits. Validation happens once at construction; the
//! test batteries treat the sample as an immutable, already-legal
//! snapshot and never re-validate per test.

use crate::assessment::AssessmentError;

/// An ordered, immutable sequence of noise-source symbols.
#[derive(Clone)]
pub struct SampleSet {
    symbols: Vec<u8>,
    bits_per_symbol: u8,
}

impl SampleSet {
    /// Builds a sample set from a raw byte buffer.
    ///
    /// Fails with [`AssessmentError::InvalidInput`] if the buffer is
    /// empty or `bits_per_symbol` is outside `[1, 8]`. Symbols are
    /// masked to their significant low bits so every downstream test
    /// sees values within the legal alphabet.
    pub fn new(data: &[u8], bits_per_symbol: u8) -> Result<Self, AssessmentError> {
        if data.is_empty() {
            return Err(AssessmentError::InvalidInput(
                "data cannot be empty".to_string(),
            ));
        }
        if !(1..=8).contains(&bits_per_symbol) {
            return Err(AssessmentError::InvalidInput(format!(
                "bits_per_symbol must be in [1, 8], got {bits_per_symbol}"
            )));
        }

        let mask = if bits_per_symbol == 8 {
            0xFF
        } else {
            (1u8 << bits_per_symbol) - 1
        };
        let symbols = data.iter().map(|&b| b & mask).collect();

        Ok(Self {
            symbols,
            bits_per_symbol,
        })
    }

    /// Returns the symbol sequence.
    #[inline]
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// Returns the number of symbols.
    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true if the sample holds no symbols.
    ///
    /// Always false for a constructed `SampleSet`; present for API
    /// completeness.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Returns the significant bits per symbol.
    #[inline]
    pub fn bits_per_symbol(&self) -> u8 {
        self.bits_per_symbol
    }

    /// Returns the alphabet size implied by the bit width.
    #[inline]
    pub fn alphabet_size(&self) -> usize {
        1usize << self.bits_per_symbol
    }

    /// Returns true for one-bit symbols.
    #[inline]
    pub fn is_binary(&self) -> bool {
        self.bits_per_symbol == 1
    }

    /// Unpacks each symbol into its significant bits, most-significant
    /// bit first. The expansion has length `len() × bits_per_symbol`
    /// and is the input to the bit-oriented tests.
    pub fn bit_expansion(&self) -> Vec<u8> {
        let bits = self.bits_per_symbol as usize;
        let mut out = Vec::with_capacity(self.symbols.len() * bits);
        for &s in &self.symbols {
            for shift in (0..bits).rev() {
                out.push((s >> shift) & 1);
            }
        }
        out
    }

    /// Histogram of symbol occurrences over the full alphabet.
    pub fn counts(&self) -> Vec<u64> {
        let mut counts = vec![0u64; self.alphabet_size()];
        for &s in &self.symbols {
            counts[s as usize] += 1;
        }
        counts
    }

    /// Number of distinct symbol values actually observed.
    pub fn distinct(&self) -> usize {
        self.counts().iter().filter(|&&c| c > 0).count()
    }
}

impl std::fmt::Debug for SampleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleSet")
            .field("len", &self.symbols.len())
            .field("bits_per_symbol", &self.bits_per_symbol)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_data() {
        let err = SampleSet::new(&[], 8).unwrap_err();
        assert!(matches!(err, AssessmentError::InvalidInput(_)));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_rejects_out_of_range_bit_width() {
        for bits in [0u8, 9, 255] {
            let err = SampleSet::new(&[1, 2, 3], bits).unwrap_err();
            assert!(err.to_string().contains("bits_per_symbol"), "bits={bits}");
        }
    }

    #[test]
    fn test_masks_symbols_to_significant_bits() {
        let s = SampleSet::new(&[0xFF, 0x07, 0x05], 2).unwrap();
        assert_eq!(s.symbols(), &[3, 3, 1]);
        assert_eq!(s.alphabet_size(), 4);
    }

    #[test]
    fn test_bit_expansion_is_msb_first() {
        let s = SampleSet::new(&[0b101, 0b010], 3).unwrap();
        assert_eq!(s.bit_expansion(), vec![1, 0, 1, 0, 1, 0]);
        assert_eq!(s.bit_expansion().len(), s.len() * 3);
    }

    #[test]
    fn test_counts_and_distinct() {
        let s = SampleSet::new(&[1, 2, 2, 3, 3, 3], 4).unwrap();
        let counts = s.counts();
        assert_eq!(counts.len(), 16);
        assert_eq!(counts[1], 1);
        assert_eq!(counts[2], 2);
        assert_eq!(counts[3], 3);
        assert_eq!(s.distinct(), 3);
    }
}
