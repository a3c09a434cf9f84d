/// A finite word over `char` symbols. Each symbol is consumed by exactly one step of a run, so
/// multi-character symbols are not supported.
///
/// Implemented for `str`, [`String`], `[char]` and `Vec<char>`, which means that all of
/// `"ab"`, `String::from("ab")` and `vec!['a', 'b']` can be used as input words.
pub trait FiniteWord {
    /// Type for an iterator over the symbols making up the word.
    type Symbols<'this>: Iterator<Item = char>
    where
        Self: 'this;

    /// Returns an iterator over the symbols of the word.
    fn symbols(&self) -> Self::Symbols<'_>;

    /// Gives the length of the word, i.e. the number of symbols. Note that for `str`, this is
    /// the number of `char`s and not the number of bytes.
    fn len(&self) -> usize {
        self.symbols().count()
    }

    /// Returns true if the word has no symbols.
    fn is_empty(&self) -> bool {
        self.symbols().next().is_none()
    }

    /// Collects the symbols into a [`String`].
    fn as_string(&self) -> String {
        self.symbols().collect()
    }

    /// Collects the symbols making up `self` into a vector.
    fn collect_vec(&self) -> Vec<char> {
        self.symbols().collect()
    }
}

impl FiniteWord for str {
    type Symbols<'this> = std::str::Chars<'this>;

    fn symbols(&self) -> Self::Symbols<'_> {
        self.chars()
    }
}

impl FiniteWord for String {
    type Symbols<'this> = std::str::Chars<'this>;

    fn symbols(&self) -> Self::Symbols<'_> {
        self.chars()
    }
}

impl FiniteWord for [char] {
    type Symbols<'this> = std::iter::Copied<std::slice::Iter<'this, char>>;

    fn symbols(&self) -> Self::Symbols<'_> {
        self.iter().copied()
    }

    fn len(&self) -> usize {
        <[char]>::len(self)
    }
}

impl FiniteWord for Vec<char> {
    type Symbols<'this> = std::iter::Copied<std::slice::Iter<'this, char>>;

    fn symbols(&self) -> Self::Symbols<'_> {
        self.iter().copied()
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl<W: FiniteWord + ?Sized> FiniteWord for &W {
    type Symbols<'this> = W::Symbols<'this> where Self: 'this;

    fn symbols(&self) -> Self::Symbols<'_> {
        W::symbols(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::FiniteWord;

    #[test]
    fn words_from_different_sources() {
        assert_eq!(FiniteWord::len("abc"), 3);
        assert_eq!(FiniteWord::len("äb"), 2);
        assert_eq!(vec!['a', 'b'].as_string(), "ab");
        assert!(FiniteWord::is_empty(""));
        assert_eq!((&"ab").collect_vec(), vec!['a', 'b']);
        assert_eq!(['a', 'c'][..].as_string(), "ac");
    }
}
