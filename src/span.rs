use miette::SourceSpan;

/// Position relative to start of source.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Idx(pub u32);

/// Holds a view into a source.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash, Debug)]
pub struct Span {
    start: Idx,
    len: u32,
}

impl Span {
    pub fn new(start: Idx, len: u32) -> Self {
        Span { start, len }
    }

    /// Span covering `part`, which must be a subslice of `src`.
    pub fn within(src: &str, part: &str) -> Self {
        let start = part.as_ptr() as usize - src.as_ptr() as usize;
        Span::new(Idx(start as u32), part.len() as u32)
    }

    pub fn as_range(&self) -> std::ops::Range<usize> {
        let start = self.start.0 as usize;
        start..start + self.len as usize
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::new((span.start.0 as usize).into(), span.len as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_subslice() {
        let src = "lw 0 1 five";
        let span = Span::within(src, &src[7..11]);
        assert_eq!(span.as_range(), 7..11);
        assert_eq!(&src[span.as_range()], "five");
    }
}
