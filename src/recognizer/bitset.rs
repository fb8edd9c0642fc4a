use std::fmt::{self, Debug, Formatter};

type BitBlock = u64;

const BLOCK_NBITS: usize = std::mem::size_of::<BitBlock>() * 8;

/// Fixed-capacity set of small integers.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitSet {
    slice: Box<[BitBlock]>,
}

impl BitSet {
    pub fn new(num_bits: usize) -> Self {
        let len = (num_bits + BLOCK_NBITS - 1) / BLOCK_NBITS;
        Self {
            slice: vec![0; len].into_boxed_slice(),
        }
    }

    /// Returns whether the bit was newly set.
    pub fn insert(&mut self, bit: usize) -> bool {
        let block = &mut self.slice[bit / BLOCK_NBITS];
        let mask = 1 << (bit % BLOCK_NBITS);
        let fresh = *block & mask == 0;
        *block |= mask;
        fresh
    }

    pub fn iter(&self) -> Iter {
        Iter {
            slice: &*self.slice,
            bit: 0,
            index: 0,
        }
    }
}

pub struct Iter<'a> {
    slice: &'a [BitBlock],
    bit: usize,
    index: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.index < self.slice.len() {
            if self.bit < BLOCK_NBITS {
                let bit = (self.slice[self.index] & !((1 << self.bit) - 1))
                    .trailing_zeros() as usize;
                if bit < BLOCK_NBITS {
                    self.bit = bit + 1;
                    return Some(self.index * BLOCK_NBITS + bit);
                }
            }

            self.index += 1;
            self.bit = 0;
        }
        None
    }
}

impl Debug for BitSet {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::BitSet;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert() {
        let mut set = BitSet::new(15);

        assert!(set.insert(7));
        assert!(set.insert(3));
        assert!(!set.insert(7));
        assert!(set.insert(14));

        let vec = set.iter().collect::<Vec<_>>();

        assert_eq!(vec, vec![3, 7, 14]);
    }

    #[test]
    fn insert_across_blocks() {
        let mut set = BitSet::new(200);
        set.insert(0);
        set.insert(63);
        set.insert(64);
        set.insert(199);

        assert!(!set.insert(63));
        assert!(!set.insert(64));
        assert!(set.insert(65));
        assert!(!set.insert(65));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 63, 64, 65, 199]);
    }
}
