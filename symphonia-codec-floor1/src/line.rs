// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integer line geometry shared by curve fitting, encoding, and decoding. The encoder codes post
//! residuals relative to exactly these heights, so all arithmetic is integer.

use crate::tables::inverse_db;

/// As defined in section 9.2.6 of the Vorbis I specification.
///
/// Predict the height at `x` of the line from `(x0, y0)` to `(x1, y1)`. Requires `x0 <= x` and
/// `x0 < x1`.
#[inline(always)]
pub fn render_point(x0: u32, y0: i32, x1: u32, y1: i32, x: u32) -> i32 {
    let dy = y1 - y0;
    let adx = x1 - x0;
    let err = dy.unsigned_abs() * (x - x0);
    let off = err / adx;
    if dy < 0 {
        y0 - off as i32
    }
    else {
        y0 + off as i32
    }
}

/// An iterator over the heights of the line from `(x0, y0)` to `(x1, y1)`, one per integer `x`
/// in `x0..x1`, as defined in section 9.2.7 of the Vorbis I specification.
#[derive(Clone, Debug)]
pub struct LineSteps {
    y: i32,
    base: i32,
    sy: i32,
    ady: i32,
    adx: i32,
    err: i32,
    remaining: u32,
}

impl LineSteps {
    pub fn new(x0: u32, y0: i32, x1: u32, y1: i32) -> Self {
        let dy = y1 - y0;
        let adx = x1.saturating_sub(x0) as i32;

        let base = if adx > 0 { dy / adx } else { 0 };
        let sy = if dy < 0 { base - 1 } else { base + 1 };
        let ady = dy.abs() - base.abs() * adx;

        LineSteps { y: y0, base, sy, ady, adx, err: 0, remaining: adx as u32 }
    }

    /// The height the line has reached: the next height that will be yielded, or, once the
    /// iterator is exhausted, the height at `x1`.
    pub fn height(&self) -> i32 {
        self.y
    }
}

impl Iterator for LineSteps {
    type Item = i32;

    #[inline]
    fn next(&mut self) -> Option<i32> {
        if self.remaining == 0 {
            return None;
        }

        self.remaining -= 1;

        let y = self.y;

        self.err += self.ady;

        self.y += if self.err >= self.adx {
            self.err -= self.adx;
            self.sy
        }
        else {
            self.base
        };

        Some(y)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

impl ExactSizeIterator for LineSteps {}

/// Render the line from `(x0, y0)` to `(x1, y1)` on the 256 level dB scale into `v` as linear
/// magnitudes. Samples at or beyond `v.len()` are dropped.
#[inline]
pub fn render_line(x0: u32, y0: i32, x1: u32, y1: i32, v: &mut [f32]) {
    let x_begin = (x0 as usize).min(v.len());
    let x_end = (x1 as usize).min(v.len());

    if x_begin >= x_end {
        return;
    }

    for (v, y) in v[x_begin..x_end].iter_mut().zip(LineSteps::new(x0, y0, x1, y1)) {
        *v = inverse_db(y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::FLOOR1_INVERSE_DB_TABLE;

    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn verify_render_point() {
        assert_eq!(render_point(0, 0, 10, 100, 5), 50);
        assert_eq!(render_point(0, 100, 10, 0, 5), 50);
        assert_eq!(render_point(0, 0, 3, 10, 1), 3);
        assert_eq!(render_point(0, 10, 3, 0, 1), 7);
        assert_eq!(render_point(4, 7, 9, 7, 6), 7);
        assert_eq!(render_point(4, 7, 9, 30, 4), 7);
    }

    #[test]
    fn verify_line_steps_end_points() {
        let mut rng = SmallRng::seed_from_u64(0x11e5_7e95);

        for _ in 0..5000 {
            let x0 = rng.random_range(0..512);
            let x1 = x0 + rng.random_range(1..512);
            let y0 = rng.random_range(0..1024);
            let y1 = rng.random_range(0..1024);

            let mut steps = LineSteps::new(x0, y0, x1, y1);

            assert_eq!(steps.len(), (x1 - x0) as usize);
            assert_eq!(steps.next(), Some(y0));

            for _ in steps.by_ref() {}

            assert_eq!(steps.height(), y1);
        }
    }

    #[test]
    fn verify_line_steps_track_prediction() {
        // Stepping and point prediction agree at every position.
        let mut rng = SmallRng::seed_from_u64(0x5eed);

        for _ in 0..1000 {
            let x0 = rng.random_range(0..256);
            let x1 = x0 + rng.random_range(1..256);
            let y0 = rng.random_range(0..256);
            let y1 = rng.random_range(0..256);

            for (x, y) in (x0..x1).zip(LineSteps::new(x0, y0, x1, y1)) {
                let predicted = render_point(x0, y0, x1, y1, x);
                assert_eq!(y, predicted);
                assert!(y >= y0.min(y1) && y <= y0.max(y1));
            }
        }
    }

    #[test]
    fn verify_line_steps_flat_and_empty() {
        assert!(LineSteps::new(5, 9, 10, 9).all(|y| y == 9));
        assert_eq!(LineSteps::new(5, 9, 5, 20).count(), 0);
        assert_eq!(LineSteps::new(5, 9, 3, 20).count(), 0);
    }

    #[test]
    fn verify_render_line() {
        let mut v = [0.0f32; 8];

        render_line(2, 100, 6, 104, &mut v);

        assert_eq!(v[..2], [0.0, 0.0]);
        assert_eq!(v[2..6], FLOOR1_INVERSE_DB_TABLE[100..104]);
        assert_eq!(v[6..], [0.0, 0.0]);

        // Clipped to the output length.
        let mut v = [0.0f32; 4];

        render_line(1, 0, 10, 255, &mut v);

        assert_eq!(v[0], 0.0);
        assert_eq!(v[1], FLOOR1_INVERSE_DB_TABLE[0]);
    }
}
