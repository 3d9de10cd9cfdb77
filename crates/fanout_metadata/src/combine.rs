/// Merges two layers of configuration, with `self` taking precedence.
pub trait Combine: Sized {
    #[must_use]
    fn combine(mut self, other: Self) -> Self {
        self.combine_with(other);
        self
    }

    fn combine_with(&mut self, other: Self);
}

impl<T: Combine> Combine for Option<T> {
    fn combine_with(&mut self, other: Self) {
        match (self.as_mut(), other) {
            (Some(this), Some(other)) => this.combine_with(other),
            (None, Some(other)) => *self = Some(other),
            _ => {}
        }
    }
}

/// Leaf values: the higher-precedence layer wins outright.
macro_rules! impl_combine_leaf {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Combine for $ty {
                fn combine_with(&mut self, _other: Self) {}
            }
        )*
    };
}

impl_combine_leaf!(
    bool,
    usize,
    String,
    Vec<String>,
    fanout_logging::TerminalColor,
    crate::OutputFormat,
);
