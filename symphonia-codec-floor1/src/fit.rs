// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Piecewise-linear curve fitting on the 1024 level dB scale.
//!
//! The fit starts with a single least-squares line between the two end posts and greedily
//! refines it. Each post, in declaration order, may split the segment of the curve that currently
//! spans it when the straight line over that segment strays too far from the spectrum.

use hashbrown::HashSet;

use crate::line::LineSteps;
use crate::lookup::Floor1Lookup;
use crate::tables::FLOOR1_DB_LEVELS;

/// Encoder tuning parameters steering how closely the curve follows the spectrum. All errors are
/// on the 1024 level dB scale.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FitOptions {
    /// The furthest the curve may lie above a spectral line.
    pub max_over: i32,
    /// The furthest the curve may lie below a spectral line.
    pub max_under: i32,
    /// The greatest mean squared error of a segment.
    pub max_err: i32,
    /// Posts declared before this index are always set.
    pub search_start: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions { max_over: 60, max_under: 30, max_err: 500, search_start: 0 }
    }
}

/// The fitted height of a post.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BreakpointValue {
    /// Height on the 1024 level dB scale. Only meaningful if the post is set.
    pub height: i32,
    /// If false, the post is not coded and lies on the line between its neighbours.
    pub is_set: bool,
}

/// Least-squares sums over the non-zero dB codes of the bins in `x0..x1`.
#[derive(Copy, Clone, Debug, Default)]
pub struct LineFitAccumulator {
    x0: u32,
    x1: u32,
    xa: i64,
    ya: i64,
    x2a: i64,
    y2a: i64,
    xya: i64,
    n: i64,
}

impl LineFitAccumulator {
    /// Accumulate the codes of the bins in `x0..x1`. Bins past the end of `codes` are ignored.
    pub fn new(codes: &[u16], x0: u32, x1: u32) -> Self {
        let mut acc = LineFitAccumulator { x0, x1, ..Default::default() };

        let end = (x1 as usize).min(codes.len());
        let start = (x0 as usize).min(end);

        for (x, &code) in (start..end).zip(&codes[start..end]) {
            if code != 0 {
                let x = x as i64;
                let y = i64::from(code);

                acc.xa += x;
                acc.ya += y;
                acc.x2a += x * x;
                acc.y2a += y * y;
                acc.xya += x * y;
                acc.n += 1;
            }
        }

        acc
    }

    /// The number of non-zero codes accumulated.
    pub fn len(&self) -> i64 {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    fn add_point(&mut self, x: u32, y: i32) {
        let x = i64::from(x);
        let y = i64::from(y);

        self.xa += x;
        self.ya += y;
        self.x2a += x * x;
        self.y2a += y * y;
        self.xya += x * y;
        self.n += 1;
    }

    fn merge(&mut self, other: &LineFitAccumulator) {
        self.xa += other.xa;
        self.ya += other.ya;
        self.x2a += other.x2a;
        self.y2a += other.y2a;
        self.xya += other.xya;
        self.n += other.n;
    }
}

/// Fit a line over the bins from `x0` to `x1`, summarised by `fits`. Known heights at either end
/// may be given as hints, each counting as one more point.
///
/// Returns the heights of the line at `x0` and `x1`, and its mean squared error, or `None` if
/// there are too few points to fit a line.
pub fn fit_line(
    fits: &[LineFitAccumulator],
    x0: u32,
    x1: u32,
    hint0: Option<i32>,
    hint1: Option<i32>,
) -> Option<(i32, i32, i32)> {
    let mut acc = LineFitAccumulator { x0, x1, ..Default::default() };

    if let Some(y0) = hint0 {
        acc.add_point(x0, y0);
    }

    if let Some(y1) = hint1 {
        acc.add_point(x1, y1);
    }

    for fit in fits {
        acc.merge(fit);
    }

    if acc.n < 2 {
        return None;
    }

    let n = acc.n as f64;
    let x = acc.xa as f64;
    let y = acc.ya as f64;
    let x2 = acc.x2a as f64;
    let y2 = acc.y2a as f64;
    let xy = acc.xya as f64;

    let denom = n * x2 - x * x;

    if denom == 0.0 {
        return None;
    }

    let a = (y * x2 - xy * x) / denom;
    let b = (n * xy - x * y) / denom;

    let mse = (a * a * n + a * b * (2.0 * x) - a * (2.0 * y) + b * b * x2 - b * (2.0 * xy) + y2)
        / (n * n);

    let clamp = |v: f64| v.round_ties_even().clamp(0.0, f64::from(FLOOR1_DB_LEVELS - 1)) as i32;

    let mse = mse.round_ties_even().max(0.0).min(f64::from(i32::MAX)) as i32;

    Some((clamp(a + b * f64::from(x0)), clamp(a + b * f64::from(x1)), mse))
}

/// Check the straight line from `(x0, y0)` to `(x1, y1)` against the dB codes of the bins it
/// spans. Returns true if the line is out of bounds anywhere, or its mean squared error is too
/// large.
pub fn inspect_error(
    codes: &[u16],
    x0: u32,
    x1: u32,
    y0: i32,
    y1: i32,
    options: &FitOptions,
) -> bool {
    let end = (x1 as usize).min(codes.len());
    let start = (x0 as usize).min(end);

    let mut mse = 0i64;
    let mut n = 0i64;

    for (&code, y) in codes[start..end].iter().zip(LineSteps::new(x0, y0, x1, y1)) {
        let val = i32::from(code);

        if val == 0 {
            continue;
        }

        if y - options.max_over > val || y + options.max_under < val {
            return true;
        }

        mse += i64::from(y - val) * i64::from(y - val);
        n += 1;
    }

    n > 0 && mse / n > i64::from(options.max_err)
}

/// Least-squares sums of every segment between two sorted-adjacent posts.
struct SegmentFits<'a> {
    sorted_index: &'a [u32],
    fits: Vec<LineFitAccumulator>,
}

impl SegmentFits<'_> {
    /// Fit a line from the post in sort position `s0` to the post in sort position `s1`.
    fn fit(
        &self,
        s0: usize,
        s1: usize,
        hint0: Option<i32>,
        hint1: Option<i32>,
    ) -> Option<(i32, i32)> {
        let (y0, y1, _) = fit_line(
            &self.fits[s0..s1],
            self.sorted_index[s0],
            self.sorted_index[s1],
            hint0,
            hint1,
        )?;
        Some((y0, y1))
    }

    fn is_empty(&self, s0: usize, s1: usize) -> bool {
        self.fits[s0..s1].iter().all(|fit| fit.is_empty())
    }
}

/// Fit a curve through the posts of `lookup` to the dB codes of a spectrum, one per bin.
///
/// Returns `None` if every code is 0, that is, the block is silent.
pub fn fit_curve(
    lookup: &Floor1Lookup,
    options: &FitOptions,
    codes: &[u16],
) -> Option<Vec<BreakpointValue>> {
    let x_list = lookup.setup().x_list();
    let reverse_index = lookup.reverse_index();
    let num_posts = lookup.num_posts();

    let segments = SegmentFits {
        sorted_index: lookup.sorted_index(),
        fits: lookup
            .sorted_index()
            .windows(2)
            .map(|w| LineFitAccumulator::new(codes, w[0], w[1]))
            .collect(),
    };

    if segments.is_empty(0, num_posts - 1) {
        return None;
    }

    // Heights fitted from the low side (a) and the high side (b) of each post, by post.
    let mut fit_a: Vec<Option<i32>> = vec![None; num_posts];
    let mut fit_b: Vec<Option<i32>> = vec![None; num_posts];
    let mut is_set = vec![false; num_posts];

    // The current neighbours of each post, by sort position.
    let mut lo_neighbor = vec![0; num_posts];
    let mut hi_neighbor = vec![1; num_posts];

    // Neighbour pairs that were already searched.
    let mut memo = HashSet::new();

    let base = segments.fit(0, num_posts - 1, None, None);

    let (y0, y1) = match base {
        Some(fit) => fit,
        // A single non-zero code. Pin the end of the curve to silence.
        None => segments.fit(0, num_posts - 1, None, Some(0)).unwrap_or_default(),
    };

    fit_a[0] = Some(y0);
    fit_b[0] = Some(y0);
    fit_a[1] = Some(y1);
    fit_b[1] = Some(y1);
    is_set[0] = true;
    is_set[1] = true;

    let post_y = |a: &[Option<i32>], b: &[Option<i32>], i: usize| match (a[i], b[i]) {
        (Some(a), Some(b)) => Some((a + b) >> 1),
        (a, b) => a.or(b),
    };

    for i in (2..num_posts).filter(|_| base.is_some()) {
        let sort_pos = reverse_index[i];
        let ln = lo_neighbor[sort_pos];
        let hn = hi_neighbor[sort_pos];

        if !memo.insert((ln, hn)) {
            continue;
        }

        let lsort_pos = reverse_index[ln];
        let hsort_pos = reverse_index[hn];

        if segments.is_empty(lsort_pos, hsort_pos) {
            // Nothing to fit between the neighbours, so the heights facing each other are
            // unknown.
            fit_b[ln] = None;
            fit_a[hn] = None;
            continue;
        }

        let is_split = i < options.search_start
            || match (post_y(&fit_a, &fit_b, ln), post_y(&fit_a, &fit_b, hn)) {
                (Some(ly), Some(hy)) => {
                    inspect_error(codes, x_list[ln], x_list[hn], ly, hy, options)
                }
                _ => true,
            };

        if !is_split {
            continue;
        }

        let mut low = segments.fit(lsort_pos, sort_pos, None, None);
        let mut high = segments.fit(sort_pos, hsort_pos, None, None);

        if low.is_none() && high.is_none() {
            low = segments.fit(lsort_pos, sort_pos, fit_a[ln], None);
            high = segments.fit(sort_pos, hsort_pos, None, fit_b[hn]);
        }

        match (low, high) {
            (None, Some((hy0, _))) => {
                low = segments.fit(lsort_pos, sort_pos, fit_a[ln], Some(hy0));
            }
            (Some((_, ly1)), None) => {
                high = segments.fit(sort_pos, hsort_pos, Some(ly1), fit_b[hn]);
            }
            _ => (),
        }

        let (Some((ly0, ly1)), Some((hy0, hy1))) = (low, high)
        else {
            continue;
        };

        fit_b[ln] = Some(ly0);
        if ln == 0 {
            fit_a[ln] = Some(ly0);
        }
        fit_a[i] = Some(ly1);
        fit_b[i] = Some(hy0);
        fit_a[hn] = Some(hy1);
        if hn == 1 {
            fit_b[hn] = Some(hy1);
        }

        // Posts that spanned the split segment now span one of its halves.
        for hi in hi_neighbor[..sort_pos].iter_mut().rev() {
            if *hi != hn {
                break;
            }
            *hi = i;
        }

        for lo in lo_neighbor[sort_pos + 1..].iter_mut() {
            if *lo != ln {
                break;
            }
            *lo = i;
        }

        is_set[i] = true;
    }

    let values = (0..num_posts)
        .map(|i| match post_y(&fit_a, &fit_b, i) {
            Some(height) if is_set[i] => BreakpointValue { height, is_set: true },
            // The end posts are always coded.
            _ if i < 2 => BreakpointValue { height: 0, is_set: true },
            _ => BreakpointValue::default(),
        })
        .collect();

    Some(values)
}
