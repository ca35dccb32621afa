// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use symphonia_core::errors::{decode_error, limit_error, Result};
use symphonia_core::io::{
    vlc::{BitOrder, Codebook, CodebookBuilder, Entry32x32},
    ReadBitsRtl,
};

use crate::io::WriteBitsRtl;

/// The entropy coder interface the floor uses to code cascade values and post residuals.
pub trait FloorCodebook {
    /// The number of entries in the codebook. Only values below this count can be coded.
    fn entries(&self) -> u32;

    /// If true, `value` has a codeword and may be written.
    fn can_write(&self, value: u32) -> bool {
        value < self.entries()
    }

    /// Read one scalar value.
    fn read_scalar<B: ReadBitsRtl>(&self, bs: &mut B) -> Result<u32>;

    /// Write one scalar value.
    fn write_scalar<W: WriteBitsRtl>(&self, bs: &mut W, value: u32) -> Result<()>;
}

/// Get the codebook numbered `idx`.
#[inline(always)]
pub(crate) fn get_codebook<C>(codebooks: &[C], idx: u8) -> Result<&C> {
    match codebooks.get(usize::from(idx)) {
        Some(codebook) => Ok(codebook),
        None => decode_error("floor1: invalid codebook"),
    }
}

/// Assign canonical Vorbis codewords to a list of codeword lengths (section 3.2.1 of the Vorbis I
/// specification). A length of 0 marks an unused entry.
fn synthesize_codewords(code_lens: &[u8]) -> Result<Vec<u32>> {
    // next[n] is the next free codeword of length n. Wider than 32 bits so that level 32 can
    // saturate.
    let mut next = [0u64; 33];

    let mut codewords = Vec::with_capacity(code_lens.len());
    let mut num_used = 0;

    for &len in code_lens {
        if len == 0 {
            codewords.push(0);
            continue;
        }

        if len > 32 {
            return decode_error("floor1: codeword length exceeds 32 bits");
        }

        let len = usize::from(len);
        let mut codeword = next[len];

        if codeword >> len != 0 {
            return decode_error("floor1: codebook overspecified");
        }

        codewords.push(codeword as u32);
        num_used += 1;

        // Take the leaf: bump this level, carrying into the parent whenever a right sibling is
        // consumed.
        for n in (1..=len).rev() {
            if next[n] & 1 == 1 {
                if n == 1 {
                    next[1] += 1;
                }
                else {
                    next[n] = next[n - 1] << 1;
                }
                break;
            }
            next[n] += 1;
        }

        // Deeper levels may not keep the new leaf as a prefix.
        for n in len + 1..33 {
            if next[n] >> 1 == codeword {
                codeword = next[n];
                next[n] = next[n - 1] << 1;
            }
            else {
                break;
            }
        }
    }

    let is_complete = next.iter().enumerate().skip(1).all(|(n, &c)| c == 1 << n);

    // A codebook with a single used entry is incomplete but explicitly permitted.
    if !is_complete && num_used != 1 {
        return decode_error("floor1: codebook underspecified");
    }

    Ok(codewords)
}

/// A scalar Vorbis codebook.
pub struct VorbisCodebook {
    codebook: Codebook<Entry32x32>,
    code_words: Vec<u32>,
    code_lens: Vec<u8>,
}

impl VorbisCodebook {
    /// Instantiate a codebook from the codeword length of each entry. Entries with a length of 0
    /// are unused and cannot be coded.
    pub fn from_lengths(code_lens: &[u8]) -> Result<Self> {
        if code_lens.is_empty() {
            return decode_error("floor1: codebook has no entries");
        }

        let code_words = synthesize_codewords(code_lens)?;

        let values: Vec<u32> = (0..code_lens.len() as u32).collect();

        // Vorbis packs codewords most-significant bit first into a least-significant bit first
        // stream.
        let mut builder = CodebookBuilder::new_sparse(BitOrder::Reverse);

        builder.bits_per_read(8);

        let codebook = builder.make::<Entry32x32>(&code_words, code_lens, &values)?;

        Ok(VorbisCodebook { codebook, code_words, code_lens: code_lens.to_vec() })
    }
}

impl FloorCodebook for VorbisCodebook {
    #[inline(always)]
    fn entries(&self) -> u32 {
        self.code_lens.len() as u32
    }

    fn can_write(&self, value: u32) -> bool {
        self.code_lens.get(value as usize).is_some_and(|&len| len > 0)
    }

    #[inline(always)]
    fn read_scalar<B: ReadBitsRtl>(&self, bs: &mut B) -> Result<u32> {
        Ok(bs.read_codebook(&self.codebook)?.0)
    }

    fn write_scalar<W: WriteBitsRtl>(&self, bs: &mut W, value: u32) -> Result<()> {
        let len = match self.code_lens.get(value as usize) {
            Some(&len) if len > 0 => u32::from(len),
            _ => return limit_error("floor1: value has no codeword"),
        };

        let code_word = self.code_words[value as usize];

        bs.write_bits_leq32(code_word.reverse_bits() >> (32 - len), len);

        Ok(())
    }
}
