//! Fixed-width component sets.

use crate::ComponentId;
use std::fmt;

/// Number of component identifiers a [`Signature`] can represent.
pub const MAX_COMPONENTS: usize = 1024;

const WORD_BITS: usize = u64::BITS as usize;
const N_WORDS: usize = MAX_COMPONENTS / WORD_BITS;

/// A bit set over component identifiers.
///
/// Bit `i` is set iff the owner (an entity, archetype or query) implements component `i`.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Signature {
    words: [u64; N_WORDS],
}

impl Signature {
    pub const EMPTY: Self = Signature { words: [0; N_WORDS] };

    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Builds a signature from a list of component ids. Ids must be below [`MAX_COMPONENTS`].
    pub fn from_ids(ids: &[ComponentId]) -> Self {
        let mut sig = Self::EMPTY;
        for &id in ids {
            sig.insert(id);
        }
        sig
    }

    #[inline]
    fn locate(id: ComponentId) -> (usize, u64) {
        let index = id.index();
        debug_assert!(index < MAX_COMPONENTS);
        (index / WORD_BITS, 1u64 << (index % WORD_BITS))
    }

    /// Sets the bit of `id`.
    ///
    /// # Panics
    /// Panics if `id` is not below [`MAX_COMPONENTS`]. Stores validate ids before they
    /// reach a signature.
    #[inline]
    pub fn insert(&mut self, id: ComponentId) {
        let (word, bit) = Self::locate(id);
        self.words[word] |= bit;
    }

    /// Clears the bit of `id`.
    #[inline]
    pub fn remove(&mut self, id: ComponentId) {
        let (word, bit) = Self::locate(id);
        self.words[word] &= !bit;
    }

    /// Returns `true` if the bit of `id` is set.
    #[inline]
    pub fn has(&self, id: ComponentId) -> bool {
        let (word, bit) = Self::locate(id);
        self.words[word] & bit != 0
    }

    /// Adds every component of `with` to `self`.
    #[inline]
    pub fn union(&mut self, with: &Signature) {
        for (a, b) in self.words.iter_mut().zip(&with.words) {
            *a |= *b;
        }
    }

    /// Removes every component of `remove` from `self`.
    #[inline]
    pub fn subtract(&mut self, remove: &Signature) {
        for (a, b) in self.words.iter_mut().zip(&remove.words) {
            *a &= !*b;
        }
    }

    /// Returns `true` if `haystack` implements every component of `self`.
    #[inline]
    pub fn is_contained_in(&self, haystack: &Signature) -> bool {
        self.words
            .iter()
            .zip(&haystack.words)
            .all(|(needle, hay)| needle & hay == *needle)
    }

    /// Returns `true` if `self` implements every component of `needle`.
    #[inline]
    pub fn contains(&self, needle: &Signature) -> bool {
        needle.is_contained_in(self)
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Returns the number of components in the set.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns an iterator over the component ids in the set, in ascending order.
    pub fn iter(&self) -> SignatureIter<'_> {
        SignatureIter {
            words: &self.words,
            word_index: 0,
            current: self.words[0],
        }
    }

    pub(crate) fn words(&self) -> &[u64; N_WORDS] {
        &self.words
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|id| id.to_raw())).finish()
    }
}

impl FromIterator<ComponentId> for Signature {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        let mut sig = Self::EMPTY;
        for id in iter {
            sig.insert(id);
        }
        sig
    }
}

impl<'a> IntoIterator for &'a Signature {
    type Item = ComponentId;
    type IntoIter = SignatureIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the component ids of a [`Signature`].
#[derive(Clone)]
pub struct SignatureIter<'a> {
    words: &'a [u64; N_WORDS],
    word_index: usize,
    current: u64,
}

impl Iterator for SignatureIter<'_> {
    type Item = ComponentId;

    fn next(&mut self) -> Option<Self::Item> {
        while self.current == 0 {
            self.word_index += 1;
            if self.word_index == N_WORDS {
                return None;
            }
            self.current = self.words[self.word_index];
        }
        let bit = self.current.trailing_zeros() as usize;
        self.current &= self.current - 1;
        Some(ComponentId((self.word_index * WORD_BITS + bit) as u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn random_sig(rng: &mut impl Rng) -> Signature {
        (0..rng.gen_range(0..24))
            .map(|_| ComponentId(rng.gen_range(1..MAX_COMPONENTS as u16)))
            .collect()
    }

    #[test]
    fn algebra_laws() {
        let mut rng = rand::thread_rng();

        for _ in 0..500 {
            let a = random_sig(&mut rng);
            let b = random_sig(&mut rng);

            let mut a_or_b = a;
            a_or_b.union(&b);
            assert!(a.is_contained_in(&a_or_b));
            assert!(a_or_b.contains(&b));

            let mut a_minus_b = a;
            a_minus_b.subtract(&b);
            assert!(a_minus_b.is_contained_in(&a));
            assert!(a_minus_b.iter().all(|id| !b.has(id)));

            let mut a_or_a = a;
            a_or_a.union(&a);
            assert_eq!(a_or_a, a);
        }
    }

    #[test]
    fn contains_is_not_symmetric() {
        let small = Signature::from_ids(&[ComponentId(1), ComponentId(2)]);
        let large = Signature::from_ids(&[ComponentId(1), ComponentId(2), ComponentId(700)]);

        assert!(large.contains(&small));
        assert!(!small.contains(&large));
        assert!(small.contains(&Signature::EMPTY));
    }

    #[test]
    fn iterates_across_words() {
        let ids = [1u16, 63, 64, 65, 511, 1023].map(ComponentId);
        let sig = Signature::from_ids(&ids);

        assert_eq!(sig.count(), ids.len());
        assert_eq!(sig.iter().collect::<Vec<_>>(), ids.to_vec());

        let mut sig = sig;
        sig.remove(ComponentId(64));
        assert!(!sig.has(ComponentId(64)));
        assert!(sig.has(ComponentId(65)));
    }
}
