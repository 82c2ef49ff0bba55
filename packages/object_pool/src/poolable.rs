use std::any::{Any, type_name};

/// A type whose instances can be recycled through an [`ObjectPool`][crate::ObjectPool].
///
/// The pool calls [`reset()`][Self::reset] on every released instance before caching it, so an
/// acquired instance is always in its freshly-reset state. Parameterless construction is
/// expressed through [`Default`], which the pool requires wherever it may need to create new
/// instances.
///
/// # Example
///
/// ```rust
/// use object_pool::Poolable;
///
/// #[derive(Default)]
/// struct Damage {
///     amount: u32,
///     source: Option<String>,
/// }
///
/// impl Poolable for Damage {
///     fn reset(&mut self) {
///         *self = Self::default();
///     }
/// }
/// ```
pub trait Poolable: Any + Send {
    /// Returns the instance to its default state, releasing anything it refers to.
    fn reset(&mut self);

    /// The name of the concrete type, used in diagnostics and statistics.
    fn type_name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Zero-argument constructor registered for a type, used to create instances when the type is
/// only known by its identity.
pub(crate) type Factory = fn() -> Box<dyn Poolable>;

pub(crate) fn construct<T>() -> Box<dyn Poolable>
where
    T: Poolable + Default,
{
    Box::new(T::default())
}
