// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use log::debug;

use symphonia_core::errors::{limit_error, Result};

use crate::codebook::{get_codebook, FloorCodebook};
use crate::common::ilog;
use crate::fit::{fit_curve, BreakpointValue, FitOptions};
use crate::io::WriteBitsRtl;
use crate::line::render_point;
use crate::lookup::Floor1Lookup;
use crate::residual::wrap_residual;
use crate::tables::magnitude_to_db_code;

/// A floor type 1 encoder.
///
/// The encoder holds no per-block state. A single encoder may encode any number of blocks, from
/// any number of threads.
#[derive(Clone, Debug)]
pub struct Floor1Encoder {
    lookup: Arc<Floor1Lookup>,
    options: FitOptions,
}

impl Floor1Encoder {
    pub fn new(lookup: Arc<Floor1Lookup>, options: FitOptions) -> Self {
        Floor1Encoder { lookup, options }
    }

    pub fn lookup(&self) -> &Arc<Floor1Lookup> {
        &self.lookup
    }

    pub fn options(&self) -> &FitOptions {
        &self.options
    }

    /// Encode the floor of one block.
    ///
    /// `spectrum` holds the linear magnitude of each bin of the block. It is fitted with a curve
    /// which is written to `bs`, and then overwritten with the curve exactly as a decoder will
    /// reconstruct it.
    ///
    /// Returns false if the block is silent. Only the unused flag is written in that case, and the
    /// spectrum is zeroed. If any value of the curve cannot be coded with `codebooks` an error is
    /// returned and nothing is written.
    pub fn encode<W, C>(&self, bs: &mut W, codebooks: &[C], spectrum: &mut [f32]) -> Result<bool>
    where
        W: WriteBitsRtl,
        C: FloorCodebook,
    {
        let codes: Vec<u16> = spectrum.iter().map(|&x| magnitude_to_db_code(x)).collect();

        let values = match fit_curve(&self.lookup, &self.options, &codes) {
            Some(values) => values,
            None => {
                debug!("floor1: silent block of {} bins", spectrum.len());

                bs.write_bool(false);
                spectrum.fill(0.0);

                return Ok(false);
            }
        };

        let (floor_final_y, residuals) = self.predict(&values);

        // Every codeword is resolved before the first bit is written.
        let codewords = self.plan(codebooks, &residuals)?;

        bs.write_bool(true);

        let range_bits = ilog(self.lookup.quant_levels() - 1);

        bs.write_bits_leq32(floor_final_y[0] as u32, range_bits);
        bs.write_bits_leq32(floor_final_y[1] as u32, range_bits);

        for (codebook, value) in codewords {
            codebook.write_scalar(bs, value)?;
        }

        self.lookup.render(&floor_final_y, spectrum);

        Ok(true)
    }

    /// Quantize the fitted posts, and predict each from its neighbours as a decoder will. Returns
    /// the final height and the coded residual of every post.
    fn predict(&self, values: &[BreakpointValue]) -> (Vec<i32>, Vec<u32>) {
        let x_list = self.lookup.setup().x_list();
        let multiplier = self.lookup.setup().multiplier();
        let range = self.lookup.quant_levels() as i32;

        let mut floor_final_y = vec![0; values.len()];
        let mut residuals = vec![0; values.len()];

        for (final_y, value) in floor_final_y.iter_mut().zip(values).take(2) {
            *final_y = quantize_height(value.height, multiplier, range);
        }

        for i in 2..values.len() {
            let (low_neighbor_offset, high_neighbor_offset) = self.lookup.neighbors(i);

            let predicted = render_point(
                x_list[low_neighbor_offset],
                floor_final_y[low_neighbor_offset],
                x_list[high_neighbor_offset],
                floor_final_y[high_neighbor_offset],
                x_list[i],
            );

            if values[i].is_set {
                let y = quantize_height(values[i].height, multiplier, range);

                residuals[i] = wrap_residual(y - predicted, predicted, range);
                floor_final_y[i] = y;
            }
            else {
                floor_final_y[i] = predicted;
            }
        }

        (floor_final_y, residuals)
    }

    /// Choose the sub-class of every residual and list, in stream order, the codebook and value of
    /// every codeword of the partitions.
    fn plan<'a, C: FloorCodebook>(
        &self,
        codebooks: &'a [C],
        residuals: &[u32],
    ) -> Result<Vec<(&'a C, u32)>> {
        let setup = self.lookup.setup();

        let mut codewords = Vec::with_capacity(residuals.len());

        let mut offset = 2;

        for &class_idx in setup.partition_class_list() {
            let class = &setup.classes()[usize::from(class_idx)];

            let cdim = usize::from(class.dimensions);
            let cbits = u32::from(class.subclass_bits);
            let csub = class.num_subclasses();

            let mut subbooks = [None; 8];

            for (subbook, &book) in subbooks.iter_mut().zip(&class.subbooks[..csub]) {
                *subbook = book.map(|idx| get_codebook(codebooks, idx)).transpose()?;
            }

            let mut cval = 0;
            let mut postings = Vec::with_capacity(cdim);

            for (k, &residual) in residuals[offset..offset + cdim].iter().enumerate() {
                // The first sub-class with room for the residual. A sub-class without a codebook
                // can only carry 0.
                let subclass = subbooks[..csub]
                    .iter()
                    .position(|book| residual < book.map_or(1, |book| book.entries()));

                let book = match subclass {
                    Some(subclass) => {
                        cval |= (subclass as u32) << (cbits * k as u32);
                        subbooks[subclass]
                    }
                    None => return limit_error("floor1: residual exceeds every sub-class codebook"),
                };

                if let Some(book) = book {
                    if !book.can_write(residual) {
                        return limit_error("floor1: residual has no codeword");
                    }
                    postings.push((book, residual));
                }
            }

            if let Some(mainbook) = class.mainbook {
                let mainbook = get_codebook(codebooks, mainbook)?;

                if !mainbook.can_write(cval) {
                    return limit_error("floor1: cascade value has no codeword");
                }

                codewords.push((mainbook, cval));
            }

            codewords.append(&mut postings);

            offset += cdim;
        }

        Ok(codewords)
    }
}

/// Quantize a height on the 1024 level dB scale to the post scale of the multiplier.
#[inline]
fn quantize_height(height: i32, multiplier: u8, range: i32) -> i32 {
    let y = match multiplier {
        1 => (height + 2) >> 2,
        2 => (height + 4) >> 3,
        3 => (height + 6) / 12,
        _ => (height + 8) >> 4,
    };
    y.clamp(0, range - 1)
}
