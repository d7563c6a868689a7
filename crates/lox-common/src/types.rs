use std::ops::Range;

/// Byte offsets into the source text.
pub type Span = Range<usize>;

/// A value paired with the source it was produced from.
pub type Spanned<T> = (T, Span);
