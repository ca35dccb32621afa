// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bit-level writing in the least-significant bit first order read back by
//! [`symphonia_core::io::BitReaderRtl`].

/// `WriteBitsRtl` writes bits in the same order `ReadBitsRtl` reads them: the first bit written
/// lands in the least-significant bit of the first byte.
pub trait WriteBitsRtl {
    /// Write the `bit_width` least-significant bits of `value`. `bit_width` may not exceed 32.
    fn write_bits_leq32(&mut self, value: u32, bit_width: u32);

    /// Write a single bit.
    #[inline(always)]
    fn write_bool(&mut self, bit: bool) {
        self.write_bits_leq32(u32::from(bit), 1);
    }
}

/// `BitWriterRtl` packs bits into a growable byte buffer.
#[derive(Default)]
pub struct BitWriterRtl {
    buf: Vec<u8>,
    bits: u64,
    n_bits_left: u32,
}

impl BitWriterRtl {
    pub fn new() -> Self {
        Default::default()
    }

    /// Get the total number of bits written so far.
    pub fn bits_written(&self) -> u64 {
        8 * self.buf.len() as u64 + u64::from(self.n_bits_left)
    }

    /// Flush any partial byte, zero padded, and return the packed bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.n_bits_left > 0 {
            self.buf.push(self.bits as u8);
        }
        self.buf
    }
}

impl WriteBitsRtl for BitWriterRtl {
    fn write_bits_leq32(&mut self, value: u32, bit_width: u32) {
        debug_assert!(bit_width <= 32);

        if bit_width == 0 {
            return;
        }

        let mask = u64::MAX >> (64 - bit_width);

        self.bits |= (u64::from(value) & mask) << self.n_bits_left;
        self.n_bits_left += bit_width;

        while self.n_bits_left >= 8 {
            self.buf.push(self.bits as u8);
            self.bits >>= 8;
            self.n_bits_left -= 8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BitWriterRtl, WriteBitsRtl};

    use symphonia_core::io::{BitReaderRtl, ReadBitsRtl};

    #[test]
    fn verify_bitwriterrtl_layout() {
        let mut bw = BitWriterRtl::new();

        bw.write_bool(true);
        bw.write_bits_leq32(0b101, 3);
        bw.write_bits_leq32(0xf, 4);
        bw.write_bits_leq32(0x1ff, 9);

        assert_eq!(bw.bits_written(), 17);
        assert_eq!(bw.finish(), vec![0b1111_1011, 0xff, 0x01]);
    }

    #[test]
    fn verify_bitwriterrtl_read_back() {
        let fields: &[(u32, u32)] =
            &[(1, 1), (0, 1), (0x1f, 5), (0xabcd, 16), (0xdead_beef, 32), (3, 2), (77, 7)];

        let mut bw = BitWriterRtl::new();

        for &(value, width) in fields {
            bw.write_bits_leq32(value, width);
        }

        let buf = bw.finish();
        let mut bs = BitReaderRtl::new(&buf);

        for &(value, width) in fields {
            assert_eq!(bs.read_bits_leq32(width).unwrap(), value);
        }
    }
}
