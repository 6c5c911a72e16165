/// Scope functions for keeping interactor pipelines in one expression.
pub(crate) trait Chain: Sized {
    /// Hands the value to `f` and returns what it makes of it.
    #[inline]
    fn let_<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }

    /// Lets `f` inspect or adjust the value, then hands it back.
    #[inline]
    fn also_<F, R>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut Self) -> R,
    {
        f(&mut self);
        self
    }
}
impl<T> Chain for T {}

/// Request fields arrive as optional free text; blank counts as absent.
pub(crate) trait NonBlank {
    fn non_blank(&self) -> Option<&str>;
}
impl NonBlank for Option<String> {
    fn non_blank(&self) -> Option<&str> {
        self.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}
