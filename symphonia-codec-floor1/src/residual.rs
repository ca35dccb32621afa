// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Folding of signed post deviations into unsigned codes.
//!
//! A post's height is coded as its deviation from the predicted height. Within `headroom` of the
//! prediction, deviations interleave by sign (0, -1, +1, -2, +2, ...), and beyond it, where only
//! one sign is possible, they continue linearly. Codes therefore stay below `range`.

/// Fold the deviation `val` of a post predicted at `predicted` into a code. `predicted` must lie
/// in `0..range` and `predicted + val` in `0..range`.
#[inline]
pub fn wrap_residual(val: i32, predicted: i32, range: i32) -> u32 {
    let headroom = (range - predicted).min(predicted);

    let code = if val < 0 {
        if val < -headroom {
            headroom - val - 1
        }
        else {
            -1 - (val << 1)
        }
    }
    else if val >= headroom {
        val + headroom
    }
    else {
        val << 1
    };

    code as u32
}

/// Recover the deviation folded into `code` for a post predicted at `predicted`.
///
/// Section 7.2.4 of the Vorbis I specification.
#[inline]
pub fn unwrap_residual(code: u32, predicted: i32, range: i32) -> i32 {
    let highroom = range - predicted;
    let lowroom = predicted;
    let room = 2 * highroom.min(lowroom);

    // Corrupt streams may carry any code. Saturate instead of overflowing.
    let val = code.min(i32::MAX as u32) as i32;

    if val >= room {
        if highroom > lowroom {
            val - lowroom
        }
        else {
            highroom - 1 - val
        }
    }
    else if val & 1 == 1 {
        -((val + 1) >> 1)
    }
    else {
        val >> 1
    }
}
