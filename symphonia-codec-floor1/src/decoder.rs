// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use log::{debug, warn};

use symphonia_core::errors::{Error, Result};
use symphonia_core::io::ReadBitsRtl;

use crate::codebook::{get_codebook, FloorCodebook};
use crate::common::ilog;
use crate::line::render_point;
use crate::lookup::Floor1Lookup;
use crate::residual::unwrap_residual;

macro_rules! io_try_or_ret {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            // An end-of-bitstream error is classified under ErrorKind::Other. This condition
            // should not be treated as an error, rather, it should return from the function
            // immediately without error.
            Err(ref e) if e.kind() == std::io::ErrorKind::Other => {
                debug!("floor1: end of bitstream, floor unused");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    };
}

macro_rules! try_or_ret {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            // An end-of-bitstream error is classified under ErrorKind::Other. This condition
            // should not be treated as an error, rather, it should return from the function
            // immediately without error.
            Err(Error::IoError(ref e)) if e.kind() == std::io::ErrorKind::Other => {
                debug!("floor1: end of bitstream, floor unused");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    };
}

/// A floor type 1 decoder.
///
/// The decoder keeps the posts of the last block read. Each thread decoding blocks needs its own
/// decoder, but all decoders of a floor may share one lookup.
#[derive(Clone, Debug)]
pub struct Floor1Decoder {
    lookup: Arc<Floor1Lookup>,
    is_unused: bool,
    floor_y: Vec<u32>,
    floor_final_y: Vec<i32>,
}

impl Floor1Decoder {
    pub fn new(lookup: Arc<Floor1Lookup>) -> Self {
        let num_posts = lookup.num_posts();

        Floor1Decoder {
            lookup,
            is_unused: true,
            floor_y: vec![0; num_posts],
            floor_final_y: vec![0; num_posts],
        }
    }

    pub fn lookup(&self) -> &Arc<Floor1Lookup> {
        &self.lookup
    }

    /// Read the posts of one block. If the stream ends before every post is read the floor is
    /// unused, and no error is returned.
    pub fn read_channel<B, C>(&mut self, bs: &mut B, codebooks: &[C]) -> Result<()>
    where
        B: ReadBitsRtl,
        C: FloorCodebook,
    {
        // Assume the floor is unused until it is decoded successfully.
        self.is_unused = true;

        // First bit marks if this floor is used. Exit early if it is not.
        let is_used = io_try_or_ret!(bs.read_bool());

        if !is_used {
            return Ok(());
        }

        let setup = self.lookup.setup();

        let range = self.lookup.quant_levels();

        // The number of bits required to represent range.
        let range_bits = ilog(range - 1);

        for floor_y in self.floor_y[..2].iter_mut() {
            let y = io_try_or_ret!(bs.read_bits_leq32(range_bits));

            if y >= range {
                warn!("floor1: end post {} out of range, clamped to {}", y, range - 1);
            }

            *floor_y = y.min(range - 1);
        }

        let mut offset = 2;

        for &class_idx in setup.partition_class_list() {
            // The class.
            let class = &setup.classes()[usize::from(class_idx)];

            let cdim = usize::from(class.dimensions);
            let cbits = class.subclass_bits;
            let csub = (1 << cbits) - 1;

            let mut cval = 0;

            if let Some(mainbook) = class.mainbook {
                let mainbook = get_codebook(codebooks, mainbook)?;
                cval = try_or_ret!(mainbook.read_scalar(bs));
            }

            for floor_y in self.floor_y[offset..offset + cdim].iter_mut() {
                let subclass_idx = cval & csub;

                cval >>= cbits;

                // A sub-class without a codebook codes 0.
                *floor_y = match class.subbooks[subclass_idx as usize] {
                    Some(subbook) => {
                        let subbook = get_codebook(codebooks, subbook)?;
                        try_or_ret!(subbook.read_scalar(bs))
                    }
                    None => 0,
                };
            }

            offset += cdim;
        }

        // If this point is reached then the floor is used.
        self.is_unused = false;

        Ok(())
    }

    /// If true, the last block read has no floor.
    pub fn is_unused(&self) -> bool {
        self.is_unused
    }

    /// Render the floor of the last block read into `floor` as linear magnitudes. An unused floor
    /// is silent.
    pub fn synthesis(&mut self, floor: &mut [f32]) {
        if self.is_unused {
            floor.fill(0.0);
            return;
        }

        self.synthesis_step1();
        self.lookup.render(&self.floor_final_y, floor);
    }

    /// Read and render the floor of one block. Returns false, with `floor` zeroed, if the floor
    /// is unused.
    pub fn decode<B, C>(&mut self, bs: &mut B, codebooks: &[C], floor: &mut [f32]) -> Result<bool>
    where
        B: ReadBitsRtl,
        C: FloorCodebook,
    {
        self.read_channel(bs, codebooks)?;
        self.synthesis(floor);
        Ok(!self.is_unused)
    }

    fn synthesis_step1(&mut self) {
        let x_list = self.lookup.setup().x_list();
        let range = self.lookup.quant_levels() as i32;

        self.floor_final_y[0] = self.floor_y[0] as i32;
        self.floor_final_y[1] = self.floor_y[1] as i32;

        for i in 2..x_list.len() {
            // Find the neighbours.
            let (low_neighbor_offset, high_neighbor_offset) = self.lookup.neighbors(i);

            let predicted = render_point(
                x_list[low_neighbor_offset],
                self.floor_final_y[low_neighbor_offset],
                x_list[high_neighbor_offset],
                self.floor_final_y[high_neighbor_offset],
                x_list[i],
            );

            let val = unwrap_residual(self.floor_y[i], predicted, range);

            // Only a corrupt residual leaves the range.
            self.floor_final_y[i] = (predicted + val).clamp(0, range - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebook::VorbisCodebook;
    use crate::io::{BitWriterRtl, WriteBitsRtl};
    use crate::setup::tests::class;
    use crate::setup::Floor1Setup;
    use crate::tables::inverse_db;

    use symphonia_core::io::BitReaderRtl;

    fn decoder(setup: Floor1Setup) -> Floor1Decoder {
        Floor1Decoder::new(Arc::new(Floor1Lookup::new(setup)))
    }

    fn one_post_setup(subbook: Option<u8>) -> Floor1Setup {
        Floor1Setup::new(vec![0], vec![class(1, 0, None, &[subbook])], 1, 6, &[32]).unwrap()
    }

    #[test]
    fn verify_decode_unused_floor() {
        let mut decoder = decoder(one_post_setup(None));
        let books: [VorbisCodebook; 0] = [];

        let mut floor = [1.0; 64];

        assert!(!decoder.decode(&mut BitReaderRtl::new(&[0]), &books, &mut floor).unwrap());
        assert!(decoder.is_unused());
        assert!(floor.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn verify_decode_posts() {
        let books = [VorbisCodebook::from_lengths(&[8; 256]).unwrap()];
        let mut decoder = decoder(one_post_setup(Some(0)));

        let mut bw = BitWriterRtl::new();
        bw.write_bool(true);
        bw.write_bits_leq32(100, 8);
        bw.write_bits_leq32(200, 8);
        books[0].write_scalar(&mut bw, 3).unwrap();
        let buf = bw.finish();

        let mut floor = [0.0; 80];

        assert!(decoder.decode(&mut BitReaderRtl::new(&buf), &books, &mut floor).unwrap());

        // Predicted at 150, and 3 unwraps to -2.
        assert_eq!(decoder.floor_final_y, [100, 200, 148]);
        assert_eq!(floor[0], inverse_db(100));
        assert_eq!(floor[32], inverse_db(148));
        assert!(floor[64..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn verify_decode_without_subbook() {
        // The post is never coded, so it lies on the line between the end posts.
        let books: [VorbisCodebook; 0] = [];
        let mut decoder = decoder(one_post_setup(None));

        let mut bw = BitWriterRtl::new();
        bw.write_bool(true);
        bw.write_bits_leq32(10, 8);
        bw.write_bits_leq32(74, 8);
        let buf = bw.finish();

        let mut floor = [0.0; 64];

        assert!(decoder.decode(&mut BitReaderRtl::new(&buf), &books, &mut floor).unwrap());
        assert_eq!(decoder.floor_final_y, [10, 74, 42]);

        for (x, &v) in floor.iter().enumerate() {
            assert_eq!(v, inverse_db(10 + x as i32));
        }
    }

    #[test]
    fn verify_decode_clamps_end_posts() {
        let setup = Floor1Setup::new(vec![], vec![], 3, 4, &[]).unwrap();
        let mut decoder = decoder(setup);
        let books: [VorbisCodebook; 0] = [];

        // Multiplier 3 codes 86 levels in 7 bits.
        let mut bw = BitWriterRtl::new();
        bw.write_bool(true);
        bw.write_bits_leq32(127, 7);
        bw.write_bits_leq32(85, 7);
        let buf = bw.finish();

        let mut floor = [0.0; 16];

        assert!(decoder.decode(&mut BitReaderRtl::new(&buf), &books, &mut floor).unwrap());
        assert!(floor.iter().all(|&x| x == 1.0));
    }

    #[test]
    fn verify_decode_truncated() {
        let books = [VorbisCodebook::from_lengths(&[8; 256]).unwrap()];
        let mut decoder = decoder(one_post_setup(Some(0)));

        // The residual is missing.
        let mut bw = BitWriterRtl::new();
        bw.write_bool(true);
        bw.write_bits_leq32(100, 8);
        bw.write_bits_leq32(200, 8);
        let buf = bw.finish();

        let mut floor = [1.0; 64];

        assert!(!decoder.decode(&mut BitReaderRtl::new(&buf), &books, &mut floor).unwrap());
        assert!(decoder.is_unused());
        assert!(floor.iter().all(|&x| x == 0.0));

        // Nothing at all.
        let mut floor = [1.0; 64];

        assert!(!decoder.decode(&mut BitReaderRtl::new(&[]), &books, &mut floor).unwrap());
        assert!(floor.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn verify_decode_missing_codebook() {
        let books = [VorbisCodebook::from_lengths(&[8; 256]).unwrap()];
        let mut decoder = decoder(one_post_setup(Some(1)));

        let mut bw = BitWriterRtl::new();
        bw.write_bool(true);
        bw.write_bits_leq32(100, 8);
        bw.write_bits_leq32(200, 8);
        bw.write_bits_leq32(0, 8);
        let buf = bw.finish();

        let mut floor = [0.0; 64];
        let err = decoder.decode(&mut BitReaderRtl::new(&buf), &books, &mut floor).unwrap_err();

        assert!(matches!(err, Error::DecodeError(_)));
    }
}
