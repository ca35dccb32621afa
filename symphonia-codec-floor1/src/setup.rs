// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::debug;

use symphonia_core::errors::{decode_error, Result};
use symphonia_core::io::ReadBitsRtl;

use crate::common::ilog2;
use crate::io::WriteBitsRtl;

/// The maximum number of partitions (5-bit field).
pub const FLOOR1_MAX_PARTITIONS: usize = 31;

/// The maximum number of classes (4-bit class identifiers).
pub const FLOOR1_MAX_CLASSES: usize = 16;

/// The maximum number of posts, including the two implicit end posts.
pub const FLOOR1_MAX_POSTS: usize = 65;

/// A partition class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Floor1Class {
    /// Posts coded by each partition of this class, range limited to 1..=8.
    pub dimensions: u8,
    /// Number of sub-classes expressed as a power-of-2 exponent (2 ^ subclass_bits), range
    /// limited to 0..=3.
    pub subclass_bits: u8,
    /// Codebook of the cascade value. Present if, and only if, `subclass_bits > 0`.
    pub mainbook: Option<u8>,
    /// Codebook for each sub-class. `None` marks a sub-class without a codebook, whose posts are
    /// always coded as 0.
    pub subbooks: [Option<u8>; 8],
}

impl Floor1Class {
    /// Number of sub-classes.
    #[inline(always)]
    pub fn num_subclasses(&self) -> usize {
        1 << self.subclass_bits
    }

    fn validate(&self) -> Result<()> {
        if self.dimensions < 1 || self.dimensions > 8 {
            return decode_error("floor1: class dimensions out of range");
        }

        if self.subclass_bits > 3 {
            return decode_error("floor1: class subclass bits out of range");
        }

        if self.mainbook.is_some() != (self.subclass_bits > 0) {
            return decode_error("floor1: class mainbook does not match subclass bits");
        }

        if self.subbooks[self.num_subclasses()..].iter().any(|book| book.is_some()) {
            return decode_error("floor1: class has more subbooks than subclasses");
        }

        Ok(())
    }

    fn books(&self) -> impl Iterator<Item = u8> + '_ {
        self.mainbook.into_iter().chain(self.subbooks.iter().flatten().copied())
    }
}

/// The floor type 1 configuration carried in a codec setup header.
///
/// A setup is immutable once built. It may be shared between any number of blocks being coded
/// concurrently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Floor1Setup {
    /// Class (0..16) associated with each partition. The number of partitions is range limited to
    /// 0..=31.
    partition_class_list: Vec<u8>,
    /// Classes 0 through the largest class referenced by a partition.
    classes: Vec<Floor1Class>,
    /// Floor multiplier, range limited to 1..=4.
    multiplier: u8,
    /// Bit width of a post position, range limited to 0..=15.
    range_bits: u32,
    /// Post positions. The first two posts are the implicit end posts 0 and 2 ^ range_bits.
    x_list: Vec<u32>,
}

impl Floor1Setup {
    /// Build a setup from its parts. `posts` are the positions of the non-implicit posts in
    /// partition order.
    pub fn new(
        partition_class_list: Vec<u8>,
        classes: Vec<Floor1Class>,
        multiplier: u8,
        range_bits: u32,
        posts: &[u32],
    ) -> Result<Self> {
        if partition_class_list.len() > FLOOR1_MAX_PARTITIONS {
            return decode_error("floor1: too many partitions");
        }

        if multiplier < 1 || multiplier > 4 {
            return decode_error("floor1: multiplier out of range");
        }

        if range_bits > 15 {
            return decode_error("floor1: range bits out of range");
        }

        let num_classes = partition_class_list.iter().map(|&c| usize::from(c) + 1).max();

        if classes.len() != num_classes.unwrap_or(0) || classes.len() > FLOOR1_MAX_CLASSES {
            return decode_error("floor1: class list does not match partition classes");
        }

        for class in &classes {
            class.validate()?;
        }

        let num_posts: usize = partition_class_list
            .iter()
            .map(|&c| usize::from(classes[usize::from(c)].dimensions))
            .sum();

        if num_posts != posts.len() {
            return decode_error("floor1: post count does not match partition dimensions");
        }

        if num_posts + 2 > FLOOR1_MAX_POSTS {
            return decode_error("floor1: x_list too long");
        }

        if posts.iter().any(|&x| x >= 1 << range_bits) {
            return decode_error("floor1: post position out of range");
        }

        let mut x_list = Vec::with_capacity(num_posts + 2);

        x_list.push(0);
        x_list.push(1 << range_bits);
        x_list.extend_from_slice(posts);

        let setup = Floor1Setup { partition_class_list, classes, multiplier, range_bits, x_list };

        if setup.has_duplicate_posts() {
            debug!("floor1: duplicate post positions, first declared post wins");
        }

        Ok(setup)
    }

    /// Read a setup from a codec setup header. Every codebook the setup references must be less
    /// than `num_codebooks`.
    pub fn read<B: ReadBitsRtl>(bs: &mut B, num_codebooks: usize) -> Result<Self> {
        // The number of partitions. 5-bit value, 0..31 range.
        let num_partitions = bs.read_bits_leq32(5)? as usize;

        let mut partition_class_list = Vec::with_capacity(num_partitions);

        for _ in 0..num_partitions {
            partition_class_list.push(bs.read_bits_leq32(4)? as u8);
        }

        let num_classes =
            partition_class_list.iter().map(|&c| usize::from(c) + 1).max().unwrap_or(0);

        let mut classes = Vec::with_capacity(num_classes);

        for _ in 0..num_classes {
            let mut class = Floor1Class {
                dimensions: bs.read_bits_leq32(3)? as u8 + 1,
                subclass_bits: bs.read_bits_leq32(2)? as u8,
                ..Default::default()
            };

            if class.subclass_bits != 0 {
                let mainbook = bs.read_bits_leq32(8)? as u8;

                if usize::from(mainbook) >= num_codebooks {
                    return decode_error("floor1: invalid codebook for class");
                }

                class.mainbook = Some(mainbook);
            }

            let num_subclasses = class.num_subclasses();

            for book in class.subbooks[..num_subclasses].iter_mut() {
                // The codebook number is stored plus one, 0 indicates there is no codebook.
                *book = match bs.read_bits_leq32(8)? {
                    0 => None,
                    book if book as usize - 1 >= num_codebooks => {
                        return decode_error("floor1: invalid codebook for subclass");
                    }
                    book => Some((book - 1) as u8),
                };
            }

            classes.push(class);
        }

        let multiplier = bs.read_bits_leq32(2)? as u8 + 1;

        let range_bits = bs.read_bits_leq32(4)?;

        let mut posts = Vec::new();

        for &class_idx in &partition_class_list {
            let class = &classes[usize::from(class_idx)];

            // No more than 65 elements are allowed.
            if posts.len() + 2 + usize::from(class.dimensions) > FLOOR1_MAX_POSTS {
                return decode_error("floor1: x_list too long");
            }

            for _ in 0..class.dimensions {
                posts.push(bs.read_bits_leq32(range_bits)?);
            }
        }

        Floor1Setup::new(partition_class_list, classes, multiplier, range_bits, &posts)
    }

    /// Write the setup in the same layout [`Floor1Setup::read`] reads.
    pub fn write<W: WriteBitsRtl>(&self, bs: &mut W) {
        bs.write_bits_leq32(self.partition_class_list.len() as u32, 5);

        for &class_idx in &self.partition_class_list {
            bs.write_bits_leq32(u32::from(class_idx), 4);
        }

        for class in &self.classes {
            bs.write_bits_leq32(u32::from(class.dimensions) - 1, 3);
            bs.write_bits_leq32(u32::from(class.subclass_bits), 2);

            if let Some(mainbook) = class.mainbook {
                bs.write_bits_leq32(u32::from(mainbook), 8);
            }

            for book in &class.subbooks[..class.num_subclasses()] {
                bs.write_bits_leq32(book.map_or(0, |book| u32::from(book) + 1), 8);
            }
        }

        bs.write_bits_leq32(u32::from(self.multiplier) - 1, 2);

        let range_bits = ilog2(self.x_list[1]);

        bs.write_bits_leq32(range_bits, 4);

        for &x in &self.x_list[2..] {
            bs.write_bits_leq32(x, range_bits);
        }
    }

    /// Check that every codebook the setup references is less than `num_codebooks`.
    pub fn validate_codebooks(&self, num_codebooks: usize) -> Result<()> {
        for class in &self.classes {
            if class.books().any(|book| usize::from(book) >= num_codebooks) {
                return decode_error("floor1: invalid codebook");
            }
        }
        Ok(())
    }

    pub fn partition_class_list(&self) -> &[u8] {
        &self.partition_class_list
    }

    pub fn classes(&self) -> &[Floor1Class] {
        &self.classes
    }

    pub fn multiplier(&self) -> u8 {
        self.multiplier
    }

    pub fn range_bits(&self) -> u32 {
        self.range_bits
    }

    /// Post positions in declaration order, including the two end posts.
    pub fn x_list(&self) -> &[u32] {
        &self.x_list
    }

    /// The total number of posts, including the two end posts.
    pub fn num_posts(&self) -> usize {
        self.x_list.len()
    }

    fn has_duplicate_posts(&self) -> bool {
        let mut seen = hashbrown::HashSet::with_capacity(self.x_list.len());
        !self.x_list.iter().all(|x| seen.insert(*x))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::io::BitWriterRtl;

    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use symphonia_core::io::BitReaderRtl;

    pub(crate) fn class(
        dimensions: u8,
        subclass_bits: u8,
        mainbook: Option<u8>,
        subs: &[Option<u8>],
    ) -> Floor1Class {
        let mut subbooks = [None; 8];
        subbooks[..subs.len()].copy_from_slice(subs);
        Floor1Class { dimensions, subclass_bits, mainbook, subbooks }
    }

    pub(crate) fn example_setup() -> Floor1Setup {
        let classes = vec![
            class(3, 0, None, &[Some(1)]),
            class(4, 1, Some(0), &[None, Some(2)]),
            class(2, 2, Some(3), &[Some(1), None, Some(2), Some(4)]),
        ];

        Floor1Setup::new(
            vec![0, 1, 2, 1],
            classes,
            2,
            8,
            &[128, 32, 64, 16, 48, 80, 112, 8, 24, 200, 160, 56, 40],
        )
        .unwrap()
    }

    fn pack(setup: &Floor1Setup) -> Vec<u8> {
        let mut bw = BitWriterRtl::new();
        setup.write(&mut bw);
        bw.finish()
    }

    fn random_setup(rng: &mut SmallRng, num_codebooks: u8) -> Floor1Setup {
        let num_partitions = rng.random_range(0..=FLOOR1_MAX_PARTITIONS);
        let num_classes = rng.random_range(1..=FLOOR1_MAX_CLASSES);

        let mut partition_class_list: Vec<u8> =
            (0..num_partitions).map(|_| rng.random_range(0..num_classes as u8)).collect();

        // Keep the post count within bounds by dropping partitions.
        let mut classes = Vec::new();

        for _ in 0..num_classes {
            let subclass_bits = rng.random_range(0..=3u8);
            let mainbook =
                if subclass_bits > 0 { Some(rng.random_range(0..num_codebooks)) } else { None };

            let mut subbooks = [None; 8];
            for book in subbooks[..1 << subclass_bits].iter_mut() {
                *book = if rng.random_bool(0.2) {
                    None
                }
                else {
                    Some(rng.random_range(0..num_codebooks))
                };
            }

            classes.push(Floor1Class {
                dimensions: rng.random_range(1..=8),
                subclass_bits,
                mainbook,
                subbooks,
            });
        }

        loop {
            let num_posts: usize = partition_class_list
                .iter()
                .map(|&c| usize::from(classes[c as usize].dimensions))
                .sum();

            if num_posts + 2 <= FLOOR1_MAX_POSTS {
                break;
            }
            partition_class_list.pop();
        }

        let num_classes =
            partition_class_list.iter().map(|&c| usize::from(c) + 1).max().unwrap_or(0);
        classes.truncate(num_classes);

        let num_posts: usize =
            partition_class_list.iter().map(|&c| usize::from(classes[c as usize].dimensions)).sum();

        let range_bits = rng.random_range(1..=15);
        let posts: Vec<u32> =
            (0..num_posts).map(|_| rng.random_range(0..1 << range_bits)).collect();

        Floor1Setup::new(partition_class_list, classes, rng.random_range(1..=4), range_bits, &posts)
            .unwrap()
    }

    #[test]
    fn verify_setup_round_trip() {
        let setup = example_setup();

        assert_eq!(setup.num_posts(), 15);
        assert_eq!(setup.x_list()[..3], [0, 256, 128]);

        let buf = pack(&setup);
        let read = Floor1Setup::read(&mut BitReaderRtl::new(&buf), 5).unwrap();

        assert_eq!(read, setup);
    }

    #[test]
    fn verify_setup_random_round_trip() {
        let mut rng = SmallRng::seed_from_u64(0xf100_5e70);

        for _ in 0..500 {
            let setup = random_setup(&mut rng, 255);
            let buf = pack(&setup);
            let read = Floor1Setup::read(&mut BitReaderRtl::new(&buf), 256).unwrap();
            assert_eq!(read, setup);
        }
    }

    #[test]
    fn verify_setup_empty_round_trip() {
        let setup = Floor1Setup::new(vec![], vec![], 4, 6, &[]).unwrap();
        let buf = pack(&setup);
        let read = Floor1Setup::read(&mut BitReaderRtl::new(&buf), 0).unwrap();

        assert_eq!(read, setup);
        assert_eq!(read.x_list(), &[0, 64]);
    }

    #[test]
    fn verify_setup_rejects_invalid_codebooks() {
        let setup = example_setup();
        let buf = pack(&setup);

        // Every book index up-to 4 is referenced.
        for num_codebooks in 0..5 {
            assert!(Floor1Setup::read(&mut BitReaderRtl::new(&buf), num_codebooks).is_err());
        }

        assert!(setup.validate_codebooks(4).is_err());
        assert!(setup.validate_codebooks(5).is_ok());
    }

    #[test]
    fn verify_setup_rejects_out_of_range_posts() {
        let classes = vec![class(2, 0, None, &[Some(0)])];

        assert!(Floor1Setup::new(vec![0], classes.clone(), 1, 4, &[3, 16]).is_err());
        assert!(Floor1Setup::new(vec![0], classes.clone(), 1, 4, &[3, 15]).is_ok());
        assert!(Floor1Setup::new(vec![0], classes, 1, 4, &[3]).is_err());
    }

    #[test]
    fn verify_setup_rejects_malformed_classes() {
        // Mainbook without subclasses.
        assert!(Floor1Setup::new(vec![0], vec![class(1, 0, Some(0), &[])], 1, 4, &[1]).is_err());
        // Subclasses without a mainbook.
        assert!(Floor1Setup::new(vec![0], vec![class(1, 1, None, &[])], 1, 4, &[1]).is_err());
        // Subbook past the number of subclasses.
        assert!(
            Floor1Setup::new(vec![0], vec![class(1, 0, None, &[None, Some(0)])], 1, 4, &[1])
                .is_err()
        );
        // Class list longer than the partitions reference.
        let classes = vec![class(1, 0, None, &[]), class(1, 0, None, &[])];
        assert!(Floor1Setup::new(vec![0], classes, 1, 4, &[1]).is_err());
        // Multiplier.
        assert!(Floor1Setup::new(vec![], vec![], 5, 4, &[]).is_err());
    }

    #[test]
    fn verify_setup_rejects_too_many_posts() {
        let classes = vec![class(8, 0, None, &[])];

        // 9 partitions of 8 posts each is 72 + 2 posts.
        let posts: Vec<u32> = (0..72).collect();
        assert!(Floor1Setup::new(vec![0; 9], classes.clone(), 1, 7, &posts).is_err());

        // Hand pack the same header since the constructor refuses it.
        let mut bw = BitWriterRtl::new();
        bw.write_bits_leq32(9, 5);
        for _ in 0..9 {
            bw.write_bits_leq32(0, 4);
        }
        bw.write_bits_leq32(7, 3);
        bw.write_bits_leq32(0, 2);
        bw.write_bits_leq32(0, 8);
        bw.write_bits_leq32(0, 2);
        bw.write_bits_leq32(7, 4);
        for x in posts {
            bw.write_bits_leq32(x, 7);
        }
        let buf = bw.finish();

        assert!(Floor1Setup::read(&mut BitReaderRtl::new(&buf), 1).is_err());
    }

    #[test]
    fn verify_setup_truncated_header() {
        let buf = pack(&example_setup());

        for len in 0..buf.len() - 1 {
            assert!(Floor1Setup::read(&mut BitReaderRtl::new(&buf[..len]), 5).is_err());
        }
    }

    #[test]
    fn verify_setup_accepts_duplicate_posts() {
        let classes = vec![class(3, 0, None, &[])];
        let setup = Floor1Setup::new(vec![0], classes, 1, 5, &[7, 7, 0]).unwrap();

        assert!(setup.has_duplicate_posts());

        let buf = pack(&setup);
        assert_eq!(Floor1Setup::read(&mut BitReaderRtl::new(&buf), 0).unwrap(), setup);
    }
}
