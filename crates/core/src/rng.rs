//! RNG module - shared 7-bag piece sequence
//!
//! A room owns one append-only sequence of piece kinds. It grows by whole
//! shuffled bags (one of each I, O, T, S, Z, J, L) whenever a reader runs past
//! the end. Every player keeps a private cursor into the same sequence, so two
//! players at the same index always receive the same kind.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

use crate::types::PieceKind;

/// Size of one bag
pub const BAG_SIZE: usize = PieceKind::ALL.len();

/// Shared, append-only sequence of piece kinds built from shuffled bags
#[derive(Debug, Clone)]
pub struct PieceSequence {
    kinds: Vec<PieceKind>,
    rng: Pcg64Mcg,
}

impl PieceSequence {
    /// Create an empty sequence whose bags are shuffled from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            kinds: Vec::new(),
            rng: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Create an empty sequence seeded from the thread RNG.
    pub fn from_entropy() -> Self {
        Self::with_seed(rand::random())
    }

    /// Shuffle a fresh bag (Fisher-Yates) and append it.
    pub fn generate_new_bag(&mut self) {
        let mut bag = PieceKind::ALL;
        bag.shuffle(&mut self.rng);
        self.kinds.extend_from_slice(&bag);
    }

    /// Read the kind at `*cursor` and advance the cursor.
    ///
    /// A new bag is appended first when the cursor is at or past the end.
    pub fn piece_for_cursor(&mut self, cursor: &mut usize) -> PieceKind {
        while *cursor >= self.kinds.len() {
            self.generate_new_bag();
        }
        let kind = self.kinds[*cursor];
        *cursor += 1;
        kind
    }

    /// Append bags until at least `len` kinds exist.
    pub fn ensure_len(&mut self, len: usize) {
        while self.kinds.len() < len {
            self.generate_new_bag();
        }
    }

    /// Up to `n` kinds starting at `cursor`, without growing the sequence.
    pub fn peek(&self, cursor: usize, n: usize) -> &[PieceKind] {
        let start = cursor.min(self.kinds.len());
        let end = cursor.saturating_add(n).min(self.kinds.len());
        &self.kinds[start..end]
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Drop every generated kind, keeping the RNG stream.
    pub fn reset(&mut self) {
        self.kinds.clear();
    }
}

impl Default for PieceSequence {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_sequences_are_deterministic() {
        let mut a = PieceSequence::with_seed(12345);
        let mut b = PieceSequence::with_seed(12345);
        a.ensure_len(28);
        b.ensure_len(28);
        assert_eq!(a.peek(0, 28), b.peek(0, 28));
    }

    #[test]
    fn test_each_bag_is_a_permutation() {
        let mut seq = PieceSequence::with_seed(7);
        seq.ensure_len(BAG_SIZE * 3);
        for bag in seq.peek(0, BAG_SIZE * 3).chunks(BAG_SIZE) {
            for kind in PieceKind::ALL {
                assert!(bag.contains(&kind), "Missing piece: {:?}", kind);
            }
        }
    }

    #[test]
    fn test_draw_extends_lazily() {
        let mut seq = PieceSequence::with_seed(1);
        assert!(seq.is_empty());

        let mut cursor = 0;
        seq.piece_for_cursor(&mut cursor);
        assert_eq!(cursor, 1);
        assert_eq!(seq.len(), BAG_SIZE);

        cursor = BAG_SIZE;
        seq.piece_for_cursor(&mut cursor);
        assert_eq!(seq.len(), BAG_SIZE * 2);
    }

    #[test]
    fn test_cursors_share_the_sequence() {
        let mut seq = PieceSequence::with_seed(99);
        let mut fast = 0;
        let mut slow = 0;

        let fast_draws: Vec<PieceKind> = (0..10).map(|_| seq.piece_for_cursor(&mut fast)).collect();
        let slow_draws: Vec<PieceKind> = (0..10).map(|_| seq.piece_for_cursor(&mut slow)).collect();

        assert_eq!(fast_draws, slow_draws);
    }

    #[test]
    fn test_peek_is_clamped() {
        let mut seq = PieceSequence::with_seed(3);
        seq.ensure_len(1);
        assert_eq!(seq.peek(5, 3).len(), 2);
        assert!(seq.peek(50, 3).is_empty());
    }
}
