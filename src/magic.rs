//! Magic-bitboard construction for sliding-piece attacks.
//!
//! No literal magic-constant table ships with the crate. Instead, at
//! `init()` time this module searches for valid per-square magic numbers by
//! trial: draw a sparse candidate (three `u64` draws ANDed together so the
//! product distributes high bits distinctly), then verify it maps every
//! occupancy subset of the square's relevant-occupancy mask either to an
//! unused table slot or to one already holding the identical attack set. A
//! collision between two different attack sets rejects the candidate and a
//! new one is drawn. The search is seeded by a fixed-seed PRNG so `init()`
//! rediscovers the same constants deterministically on every run.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::types::Bitboard;

/// Fixed seed for magic-number search, chosen for reproducibility across
/// runs (mirrors the fixed seed `Zobrist` uses for the same reason).
const MAGIC_SEED: u64 = 0x5EED_5EED_CAFE_BABE;

const ROOK_SHIFT_BITS: [u32; 64] = build_rook_bits();
const BISHOP_SHIFT_BITS: [u32; 64] = build_bishop_bits();

const fn build_rook_bits() -> [u32; 64] {
    // Classic rook relevant-occupancy bit counts per square.
    #[rustfmt::skip]
    let bits: [u32; 64] = [
        12, 11, 11, 11, 11, 11, 11, 12,
        11, 10, 10, 10, 10, 10, 10, 11,
        11, 10, 10, 10, 10, 10, 10, 11,
        11, 10, 10, 10, 10, 10, 10, 11,
        11, 10, 10, 10, 10, 10, 10, 11,
        11, 10, 10, 10, 10, 10, 10, 11,
        11, 10, 10, 10, 10, 10, 10, 11,
        12, 11, 11, 11, 11, 11, 11, 12,
    ];
    bits
}

const fn build_bishop_bits() -> [u32; 64] {
    #[rustfmt::skip]
    let bits: [u32; 64] = [
        6, 5, 5, 5, 5, 5, 5, 6,
        5, 5, 5, 5, 5, 5, 5, 5,
        5, 5, 7, 7, 7, 7, 5, 5,
        5, 5, 7, 9, 9, 7, 5, 5,
        5, 5, 7, 9, 9, 7, 5, 5,
        5, 5, 7, 7, 7, 7, 5, 5,
        5, 5, 5, 5, 5, 5, 5, 5,
        6, 5, 5, 5, 5, 5, 5, 6,
    ];
    bits
}

/// Full-length ray attack (used both to derive masks and as the reference
/// generator validated against during magic search). Stops at, and
/// includes, the first blocker encountered.
fn ray_attacks(square: usize, blockers: u64, deltas: &[(i32, i32)]) -> u64 {
    let rank = (square / 8) as i32;
    let file = (square % 8) as i32;
    let mut attacks = 0u64;
    for &(dr, df) in deltas {
        let mut r = rank + dr;
        let mut f = file + df;
        while (0..8).contains(&r) && (0..8).contains(&f) {
            let sq = (r * 8 + f) as usize;
            attacks |= 1u64 << sq;
            if blockers & (1u64 << sq) != 0 {
                break;
            }
            r += dr;
            f += df;
        }
    }
    attacks
}

pub(crate) fn rook_attacks_scan(square: usize, blockers: u64) -> u64 {
    ray_attacks(square, blockers, &[(1, 0), (-1, 0), (0, 1), (0, -1)])
}

pub(crate) fn bishop_attacks_scan(square: usize, blockers: u64) -> u64 {
    ray_attacks(square, blockers, &[(1, 1), (1, -1), (-1, 1), (-1, -1)])
}

/// Relevant-occupancy mask: the full ray, minus the board edge in each
/// direction (an edge square never needs to appear as a "blocker" because
/// the ray attack already terminates there regardless of occupancy).
fn relevant_mask(square: usize, deltas: &[(i32, i32)]) -> u64 {
    let rank = (square / 8) as i32;
    let file = (square % 8) as i32;
    let mut mask = 0u64;
    for &(dr, df) in deltas {
        let mut r = rank + dr;
        let mut f = file + df;
        while (1..7).contains(&r) && (1..7).contains(&f) {
            mask |= 1u64 << (r * 8 + f);
            r += dr;
            f += df;
        }
    }
    mask
}

fn rook_mask(square: usize) -> u64 {
    let rank = square / 8;
    let file = square % 8;
    let mut mask = 0u64;
    for r in 1..7 {
        if r != rank {
            mask |= 1u64 << (r * 8 + file);
        }
    }
    for f in 1..7 {
        if f != file {
            mask |= 1u64 << (rank * 8 + f);
        }
    }
    mask
}

fn bishop_mask(square: usize) -> u64 {
    relevant_mask(square, &[(1, 1), (1, -1), (-1, 1), (-1, -1)])
}

/// Enumerates every subset of `mask` via the standard carry-rippler trick.
fn subsets_of(mask: u64) -> Vec<u64> {
    let mut subsets = Vec::with_capacity(1usize << mask.count_ones());
    let mut subset = 0u64;
    loop {
        subsets.push(subset);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    subsets
}

/// Draws a sparse 64-bit candidate by ANDing three independent draws
/// together, biasing toward few set bits.
fn random_sparse_u64(rng: &mut StdRng) -> u64 {
    rng.next_u64() & rng.next_u64() & rng.next_u64()
}

fn find_magic(mask: u64, shift: u32, reference: &dyn Fn(u64) -> u64, rng: &mut StdRng) -> u64 {
    let occupancies = subsets_of(mask);
    let attacks: Vec<u64> = occupancies.iter().map(|&occ| reference(occ)).collect();
    let table_size = 1usize << (64 - shift);

    'search: loop {
        let magic = random_sparse_u64(rng);
        // A magic candidate with too few high bits set rarely distributes
        // well; the same rejection the reference trial-search uses.
        if ((mask.wrapping_mul(magic)) & 0xFF00_0000_0000_0000).count_ones() < 6 {
            continue;
        }
        let mut table = vec![u64::MAX; table_size];
        for (i, &occ) in occupancies.iter().enumerate() {
            let index = ((occ.wrapping_mul(magic)) >> shift) as usize;
            if table[index] == u64::MAX {
                table[index] = attacks[i];
            } else if table[index] != attacks[i] {
                continue 'search;
            }
        }
        return magic;
    }
}

/// A single square's magic-indexed sliding attack table.
pub struct MagicEntry {
    pub magic: u64,
    pub shift: u32,
    pub mask: u64,
    pub table: Vec<u64>,
}

impl MagicEntry {
    #[inline]
    #[must_use]
    pub fn attacks(&self, occupancy: Bitboard) -> Bitboard {
        let relevant = occupancy.0 & self.mask;
        let index = (relevant.wrapping_mul(self.magic)) >> self.shift;
        Bitboard(self.table[index as usize])
    }
}

/// Magic tables for both sliding piece families, one entry per square.
pub struct MagicTables {
    pub rook: Vec<MagicEntry>,
    pub bishop: Vec<MagicEntry>,
}

pub(crate) fn build() -> MagicTables {
    let mut rng = StdRng::seed_from_u64(MAGIC_SEED);
    let mut rook = Vec::with_capacity(64);
    let mut bishop = Vec::with_capacity(64);

    for sq in 0..64 {
        let mask = rook_mask(sq);
        let bits = ROOK_SHIFT_BITS[sq];
        let shift = 64 - bits;
        let magic = find_magic(mask, shift, &|occ| rook_attacks_scan(sq, occ), &mut rng);
        let occupancies = subsets_of(mask);
        let mut table = vec![0u64; 1usize << bits];
        for occ in occupancies {
            let index = ((occ.wrapping_mul(magic)) >> shift) as usize;
            table[index] = rook_attacks_scan(sq, occ);
        }
        rook.push(MagicEntry { magic, shift, mask, table });
    }

    for sq in 0..64 {
        let mask = bishop_mask(sq);
        let bits = BISHOP_SHIFT_BITS[sq];
        let shift = 64 - bits;
        let magic = find_magic(mask, shift, &|occ| bishop_attacks_scan(sq, occ), &mut rng);
        let occupancies = subsets_of(mask);
        let mut table = vec![0u64; 1usize << bits];
        for occ in occupancies {
            let index = ((occ.wrapping_mul(magic)) >> shift) as usize;
            table[index] = bishop_attacks_scan(sq, occ);
        }
        bishop.push(MagicEntry { magic, shift, mask, table });
    }

    MagicTables { rook, bishop }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_attacks_match_scan_for_random_occupancies() {
        let tables = build();
        for sq in [0usize, 27, 63, 35] {
            let mask = tables.rook[sq].mask;
            for occ in subsets_of(mask).into_iter().take(16) {
                let expected = rook_attacks_scan(sq, occ);
                let got = tables.rook[sq].attacks(Bitboard(occ));
                assert_eq!(got.0, expected, "square {sq} occ {occ:#x}");
            }
        }
    }

    #[test]
    fn bishop_attacks_match_scan_for_random_occupancies() {
        let tables = build();
        for sq in [0usize, 27, 63, 21] {
            let mask = tables.bishop[sq].mask;
            for occ in subsets_of(mask).into_iter().take(16) {
                let expected = bishop_attacks_scan(sq, occ);
                let got = tables.bishop[sq].attacks(Bitboard(occ));
                assert_eq!(got.0, expected, "square {sq} occ {occ:#x}");
            }
        }
    }

    #[test]
    fn subsets_of_enumerates_every_combination() {
        let mask = 0b1011u64;
        let subsets = subsets_of(mask);
        assert_eq!(subsets.len(), 1 << mask.count_ones());
    }
}
