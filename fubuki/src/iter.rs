//! Iterating the values a generator produces.

use {
    crate::Generator,
    std::{iter::FusedIterator, ptr},
};

/// Iterator over the values of a generator.
///
/// The iterator resumes eagerly: creating it resumes the generator once,
/// and so does every advance. The value produced by the last resume is
/// cached, so [`get`](`Self::get`) is meaningful before the first
/// advance. When the routine returns, the iterator turns into the end
/// sentinel, which no longer refers to the generator.
///
/// Dropping the iterator before the end discards the cached value.
///
/// Two iterators are equal when they refer to the same generator.
/// Cached values do not take part, and two end sentinels are equal.
pub struct Iter<'g, 'a, T>
    where T: 'static
{
    generator: Option<&'g mut Generator<'a, T>>,
    current: Option<T>,
}

impl<'g, 'a, T> Iter<'g, 'a, T>
    where T: 'static
{
    /// Iterator positioned at the first value of `generator`.
    pub fn new(generator: &'g mut Generator<'a, T>) -> Self
    {
        let mut this = Self{generator: Some(generator), current: None};
        this.advance();
        this
    }

    /// The end sentinel.
    pub fn end() -> Self
    {
        Self{generator: None, current: None}
    }

    /// Whether this is the end sentinel.
    pub fn is_end(&self) -> bool
    {
        self.generator.is_none()
    }

    /// The value at the current position, or [`None`] at the end.
    pub fn get(&self) -> Option<&T>
    {
        self.current.as_ref()
    }

    /// Resume the generator and cache the value it produces.
    ///
    /// Does nothing at the end.
    pub fn advance(&mut self)
    {
        let Some(generator) = &mut self.generator
            else { return };

        self.current = generator.resume();

        if self.current.is_none() {
            self.generator = None;
        }
    }

    fn identity(&self) -> Option<*const Generator<'a, T>>
    {
        self.generator.as_deref().map(ptr::from_ref)
    }
}

impl<T> Iterator for Iter<'_, '_, T>
    where T: 'static
{
    type Item = T;

    fn next(&mut self) -> Option<T>
    {
        let value = self.current.take()?;
        self.advance();
        Some(value)
    }
}

impl<T> FusedIterator for Iter<'_, '_, T>
    where T: 'static
{
}

impl<T> PartialEq for Iter<'_, '_, T>
    where T: 'static
{
    fn eq(&self, other: &Self) -> bool
    {
        self.identity() == other.identity()
    }
}

impl<'g, 'a, T> IntoIterator for &'g mut Generator<'a, T>
    where T: 'static
{
    type Item = T;
    type IntoIter = Iter<'g, 'a, T>;

    fn into_iter(self) -> Iter<'g, 'a, T>
    {
        Iter::new(self)
    }
}

impl<'a, T> Generator<'a, T>
    where T: 'static
{
    /// Iterate the values this generator produces.
    ///
    /// The iterator resumes one value ahead of what it hands out.
    /// Stopping early, as with `break` or [`Iterator::take`], discards
    /// that value: it has left the routine, and a later
    /// [`resume`](`Self::resume`) continues after it.
    pub fn iter(&mut self) -> Iter<'_, 'a, T>
    {
        Iter::new(self)
    }
}

#[cfg(test)]
mod tests
{
    use {super::*, crate::{State, yield_}};

    #[test]
    fn iter_visits_yielded_values_in_order()
    {
        let mut generator = Generator::<String>::new(|| {
            for word in ["a", "b", "c"] {
                yield_(word.to_owned());
            }
        });

        let words: Vec<String> = generator.iter().collect();
        assert_eq!(words, ["a", "b", "c"]);
        assert!(generator.is_completed());
    }

    #[test]
    fn iter_resumes_eagerly()
    {
        let mut generator = Generator::<u8>::new(|| {
            yield_(1u8);
            yield_(2u8);
        });

        let mut iter = generator.iter();
        assert_eq!(iter.get(), Some(&1));
        assert_eq!(iter.get(), Some(&1));

        iter.advance();
        assert_eq!(iter.get(), Some(&2));
        assert!(!iter.is_end());

        iter.advance();
        assert_eq!(iter.get(), None);
        assert!(iter.is_end());
        assert!(iter == Iter::end());

        // Advancing the sentinel is harmless.
        iter.advance();
        assert!(iter.is_end());
    }

    #[test]
    fn iter_of_empty_generator_is_end()
    {
        let mut generator = Generator::<u8>::new(|| ());
        let iter = generator.iter();
        assert!(iter == Iter::end());
        drop(iter);
        assert_eq!(generator.state(), State::Completed);
    }

    #[test]
    fn iter_equality_ignores_cached_value()
    {
        let mut generator = Generator::<u8>::new(|| yield_(7u8));
        let iter = generator.iter();
        assert_eq!(iter.get(), Some(&7));
        assert!(iter != Iter::end());
        assert!(Iter::<u8>::end() == Iter::end());

        // Finish the routine before the generator is dropped.
        assert_eq!(iter.count(), 1);
    }

    #[test]
    fn stopping_early_discards_the_cached_value()
    {
        let mut generator = Generator::<u8>::new(|| {
            for i in 1 ..= 4u8 {
                yield_(i);
            }
        });

        let first: Vec<u8> = generator.iter().take(1).collect();
        assert_eq!(first, [1]);

        // 2 was cached by the iterator and dropped with it.
        assert_eq!(generator.resume(), Some(3));

        // Advancing past 4 runs the routine to completion.
        assert_eq!((&mut generator).into_iter().next(), Some(4));
        assert!(generator.is_completed());
        assert_eq!(generator.resume(), None);
    }

    #[test]
    fn for_loop_over_mutable_reference()
    {
        let mut generator = Generator::<u64>::new(|| {
            for i in 1 ..= 4u64 {
                yield_(i * i);
            }
        });

        let mut sum = 0;
        for square in &mut generator {
            sum += square;
        }
        assert_eq!(sum, 1 + 4 + 9 + 16);
    }
}
