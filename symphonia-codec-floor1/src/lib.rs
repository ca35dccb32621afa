// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
// The following lints are allowed in all Symphonia crates. Please see clippy.toml for their
// justification.
#![allow(clippy::comparison_chain)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::identity_op)]
#![allow(clippy::manual_range_contains)]
// Disable to better express the specification.
#![allow(clippy::collapsible_else_if)]

//! A Vorbis floor type 1 coder.
//!
//! A floor approximates the magnitude spectrum of a block with a piecewise-linear curve on a
//! decibel scale. The curve passes through a fixed set of posts. The position of each post is
//! part of the [`Floor1Setup`], the height of each post is coded per block.
//!
//! [`Floor1Encoder`] fits the curve to a spectrum and writes it, [`Floor1Decoder`] reads it back
//! and renders it. Both share a [`Floor1Lookup`] derived from the setup, and render bit-identical
//! curves.

mod codebook;
mod common;
mod decoder;
mod encoder;
mod fit;
mod io;
mod line;
mod lookup;
mod residual;
mod setup;
mod tables;


pub use codebook::{FloorCodebook, VorbisCodebook};
pub use common::{ilog, ilog2};
pub use decoder::Floor1Decoder;
pub use encoder::Floor1Encoder;
pub use fit::{
    fit_curve, fit_line, inspect_error, BreakpointValue, FitOptions, LineFitAccumulator,
};
pub use io::{BitWriterRtl, WriteBitsRtl};
pub use line::{render_line, render_point, LineSteps};
pub use lookup::Floor1Lookup;
pub use residual::{unwrap_residual, wrap_residual};
pub use setup::{
    Floor1Class, Floor1Setup, FLOOR1_MAX_CLASSES, FLOOR1_MAX_PARTITIONS, FLOOR1_MAX_POSTS,
};
pub use tables::{db_quantize, inverse_db, magnitude_to_db_code, FLOOR1_DB_LEVELS};
