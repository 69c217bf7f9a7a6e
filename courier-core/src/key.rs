//! # Type Identities
//!
//! Courier never inspects types at runtime. Every type that takes part in
//! dispatch describes itself as a [`TypeKey`]: a structured, value-equal term
//! built from a path and zero or more type arguments.
//!
//! Unresolved generic parameters are written as slots (`$0`, `$1`, ...). The
//! placeholder type [`Slot<N>`] describes itself as slot `N`, so an open
//! definition such as `Greeter<T>` is declared as `Greeter<Slot<0>>` and
//! described as `Greeter<$0>`. Substituting a binding into an open key yields
//! exactly the key the concrete instantiation describes itself with.
//!
//! # Example
//!
//! ```rust
//! use courier_core::{Described, Slot, TypeKey};
//!
//! struct Envelope<T>(T);
//!
//! impl<T: Described> Described for Envelope<T> {
//!     fn type_key() -> TypeKey {
//!         TypeKey::generic("app::Envelope", [T::type_key()])
//!     }
//! }
//!
//! let open = TypeKey::of::<Envelope<Slot<0>>>();
//! let closed = open.substitute(&[TypeKey::of::<u32>()]).unwrap();
//! assert_eq!(closed, TypeKey::of::<Envelope<u32>>());
//! ```

use std::{borrow::Cow, fmt, sync::Arc};

/// Structured identity of a type, possibly containing unresolved slots.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKey {
    /// An unresolved generic slot.
    Slot(usize),
    /// A named type applied to zero or more arguments.
    Named {
        /// Fully qualified path of the type definition.
        path: Cow<'static, str>,
        /// Type arguments, in declaration order.
        args: Arc<[TypeKey]>,
    },
}

impl TypeKey {
    /// A non-generic type.
    pub fn named(path: impl Into<Cow<'static, str>>) -> Self {
        Self::Named {
            path: path.into(),
            args: Vec::new().into(),
        }
    }

    /// A generic type applied to `args`.
    pub fn generic(
        path: impl Into<Cow<'static, str>>,
        args: impl IntoIterator<Item = TypeKey>,
    ) -> Self {
        Self::Named {
            path: path.into(),
            args: args.into_iter().collect(),
        }
    }

    /// The key a [`Described`] type reports for itself.
    pub fn of<T: Described>() -> Self {
        T::type_key()
    }

    /// Key for a marker capability, usually a trait object type such as
    /// `dyn Auditable`.
    pub fn of_trait<T: ?Sized + 'static>() -> Self {
        Self::named(std::any::type_name::<T>())
    }

    /// Path of the type definition; `None` for slots.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Slot(_) => None,
            Self::Named { path, .. } => Some(path),
        }
    }

    /// Type arguments; empty for slots and non-generic types.
    pub fn args(&self) -> &[TypeKey] {
        match self {
            Self::Slot(_) => &[],
            Self::Named { args, .. } => args,
        }
    }

    /// Returns `true` if this key is a bare slot.
    pub fn is_slot(&self) -> bool {
        matches!(self, Self::Slot(_))
    }

    /// Returns `true` if any slot appears in this key.
    pub fn is_open(&self) -> bool {
        match self {
            Self::Slot(_) => true,
            Self::Named { args, .. } => args.iter().any(Self::is_open),
        }
    }

    /// Number of slots this key is parameterized over (highest index + 1).
    pub fn slot_count(&self) -> usize {
        self.max_slot().map_or(0, |max| max + 1)
    }

    fn max_slot(&self) -> Option<usize> {
        match self {
            Self::Slot(index) => Some(*index),
            Self::Named { args, .. } => args.iter().filter_map(Self::max_slot).max(),
        }
    }

    /// Replaces every slot `$i` with `binding[i]`.
    ///
    /// Returns `None` if a slot index is outside the binding.
    pub fn substitute(&self, binding: &[TypeKey]) -> Option<TypeKey> {
        match self {
            Self::Slot(index) => binding.get(*index).cloned(),
            Self::Named { path, args } => {
                if !self.is_open() {
                    return Some(self.clone());
                }
                let args = args
                    .iter()
                    .map(|arg| arg.substitute(binding))
                    .collect::<Option<Arc<[TypeKey]>>>()?;
                Some(Self::Named {
                    path: path.clone(),
                    args,
                })
            }
        }
    }

    /// Matches this (possibly open) pattern against a closed key.
    ///
    /// On success returns one entry per slot of the pattern; slots that do not
    /// occur in the pattern stay `None`.
    pub fn unify(&self, concrete: &TypeKey) -> Option<Vec<Option<TypeKey>>> {
        let mut binding = vec![None; self.slot_count()];
        self.unify_into(concrete, &mut binding).then_some(binding)
    }

    fn unify_into(&self, concrete: &TypeKey, binding: &mut [Option<TypeKey>]) -> bool {
        match (self, concrete) {
            (Self::Slot(index), _) => match &binding[*index] {
                Some(bound) => bound == concrete,
                None => {
                    binding[*index] = Some(concrete.clone());
                    true
                }
            },
            (
                Self::Named { path, args },
                Self::Named {
                    path: other_path,
                    args: other_args,
                },
            ) => {
                path == other_path
                    && args.len() == other_args.len()
                    && args
                        .iter()
                        .zip(other_args.iter())
                        .all(|(pattern, arg)| pattern.unify_into(arg, binding))
            }
            (Self::Named { .. }, Self::Slot(_)) => false,
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slot(index) => write!(f, "${index}"),
            Self::Named { path, args } => {
                f.write_str(path)?;
                if let Some((first, rest)) = args.split_first() {
                    write!(f, "<{first}")?;
                    for arg in rest {
                        write!(f, ", {arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A type that can report its own [`TypeKey`].
///
/// Usually derived with `#[derive(Described)]`. Generic types describe
/// themselves in terms of their arguments' keys so that substitution into an
/// open key and the concrete instantiation agree.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Described`",
    label = "missing `Described` implementation",
    note = "Derive `Described` or implement `type_key` so Courier can index this type."
)]
pub trait Described: 'static {
    /// The identity of this type.
    fn type_key() -> TypeKey;
}

/// Placeholder describing generic slot `N` in open definitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Slot<const N: usize>;

impl<const N: usize> Described for Slot<N> {
    fn type_key() -> TypeKey {
        TypeKey::Slot(N)
    }
}

macro_rules! described_leaf {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Described for $ty {
                fn type_key() -> TypeKey {
                    TypeKey::named(std::any::type_name::<$ty>())
                }
            }
        )*
    };
}

described_leaf!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
    &'static str,
);

impl<T: Described> Described for Vec<T> {
    fn type_key() -> TypeKey {
        TypeKey::generic("alloc::vec::Vec", [T::type_key()])
    }
}

impl<T: Described> Described for Option<T> {
    fn type_key() -> TypeKey {
        TypeKey::generic("core::option::Option", [T::type_key()])
    }
}

impl<T: Described, E: Described> Described for Result<T, E> {
    fn type_key() -> TypeKey {
        TypeKey::generic("core::result::Result", [T::type_key(), E::type_key()])
    }
}

impl<T: Described> Described for Box<T> {
    fn type_key() -> TypeKey {
        TypeKey::generic("alloc::boxed::Box", [T::type_key()])
    }
}

impl<T: Described> Described for Arc<T> {
    fn type_key() -> TypeKey {
        TypeKey::generic("alloc::sync::Arc", [T::type_key()])
    }
}
