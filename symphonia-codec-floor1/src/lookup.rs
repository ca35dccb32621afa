// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::line::render_line;
use crate::setup::Floor1Setup;

/// Read-only tables derived from a [`Floor1Setup`], shared by the encoder and decoder.
#[derive(Clone, Debug)]
pub struct Floor1Lookup {
    setup: Floor1Setup,
    /// Post positions in ascending order.
    sorted_index: Vec<u32>,
    /// Sort position to post.
    forward_index: Vec<usize>,
    /// Post to sort position.
    reverse_index: Vec<usize>,
    /// Low and high neighbour of each post among the posts declared before it.
    neighbors: Vec<(usize, usize)>,
    /// Quantization levels of a post height.
    quant_levels: u32,
}

impl Floor1Lookup {
    pub fn new(setup: Floor1Setup) -> Self {
        let x_list = setup.x_list();
        let num_posts = x_list.len();

        // Sorting is stable: posts sharing a position keep their declaration order.
        let mut forward_index: Vec<usize> = (0..num_posts).collect();
        forward_index.sort_by_key(|&i| x_list[i]);

        let mut reverse_index = vec![0; num_posts];

        for (sort_pos, &i) in forward_index.iter().enumerate() {
            reverse_index[i] = sort_pos;
        }

        let sorted_index = forward_index.iter().map(|&i| x_list[i]).collect();

        let neighbors = (0..num_posts)
            .map(|i| if i < 2 { (0, 1) } else { find_neighbors(x_list, i) })
            .collect();

        let quant_levels = get_range(setup.multiplier());

        Floor1Lookup { setup, sorted_index, forward_index, reverse_index, neighbors, quant_levels }
    }

    pub fn setup(&self) -> &Floor1Setup {
        &self.setup
    }

    pub fn num_posts(&self) -> usize {
        self.forward_index.len()
    }

    pub fn sorted_index(&self) -> &[u32] {
        &self.sorted_index
    }

    pub fn forward_index(&self) -> &[usize] {
        &self.forward_index
    }

    pub fn reverse_index(&self) -> &[usize] {
        &self.reverse_index
    }

    /// The low and high neighbours used to predict post `i`.
    #[inline(always)]
    pub fn neighbors(&self, i: usize) -> (usize, usize) {
        self.neighbors[i]
    }

    pub fn quant_levels(&self) -> u32 {
        self.quant_levels
    }

    /// Render the curve through every post at its final height (on the `quant_levels` scale) into
    /// `floor` as linear magnitudes. Everything past the last post is zeroed.
    pub fn render(&self, floor_final_y: &[i32], floor: &mut [f32]) {
        let x_list = self.setup.x_list();
        let multiplier = i32::from(self.setup.multiplier());

        let first = self.forward_index[0];

        let mut lx = x_list[first];
        let mut ly = floor_final_y[first] * multiplier;

        // Iterate in sort-order.
        for &i in &self.forward_index[1..] {
            let hx = x_list[i];

            // Of posts sharing a position, the first declared is drawn.
            if hx <= lx {
                continue;
            }

            let hy = floor_final_y[i] * multiplier;

            render_line(lx, ly, hx, hy, floor);

            lx = hx;
            ly = hy;
        }

        let end = (lx as usize).min(floor.len());

        floor[end..].fill(0.0);
    }
}

#[inline(always)]
fn get_range(multiplier: u8) -> u32 {
    match multiplier {
        1 => 256,
        2 => 128,
        3 => 86,
        _ => 64,
    }
}

/// Sections 9.2.4 and 9.2.5 of the Vorbis I specification. Find the posts declared before post
/// `x` that lie closest below and closest above it. Defaults to the end posts 0 and 1.
#[inline(always)]
fn find_neighbors(x_list: &[u32], x: usize) -> (usize, usize) {
    let bound = x_list[x];

    let mut low = (0, x_list[0]);
    let mut high = (1, x_list[1]);

    for (i, &xv) in x_list[..x].iter().enumerate() {
        if xv > low.1 && xv < bound {
            low = (i, xv);
        }
        if xv < high.1 && xv > bound {
            high = (i, xv);
        }
    }

    (low.0, high.0)
}
