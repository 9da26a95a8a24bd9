//! Typed views over handles
//!
//! A view is a newtype around [`Handle`] whose object is known to be of one
//! of a fixed set of kinds. Views add no ownership logic of their own: they
//! dereference to the handle, clone and drop through it, and convert back
//! into it for free.

use std::ops::Deref;

use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::runtime::ObjectKind;

/// Common surface of every typed view.
pub trait View<'rt>: Deref<Target = Handle<'rt>> + Sized {
    /// Kinds a handle may have to be viewed as `Self`.
    const KINDS: &'static [ObjectKind];

    /// The underlying handle.
    fn as_handle(&self) -> &Handle<'rt>;

    /// Unwrap into the underlying handle, keeping its unit.
    fn into_handle(self) -> Handle<'rt>;

    /// Strict conversion: take over `handle` if its kind is one of
    /// [`View::KINDS`], otherwise release it and fail.
    fn from_exact(handle: Handle<'rt>) -> Result<Self>;
}

/// Check that the kind of `handle` is one of `kinds`.
pub(crate) fn check_kinds(handle: &Handle<'_>, kinds: &[ObjectKind]) -> Result<()> {
    let kind = handle.kind().ok_or(Error::Empty)?;
    if kinds.contains(&kind) {
        Ok(())
    } else {
        let expected: Vec<&str> = kinds.iter().map(|k| k.name()).collect();
        Err(Error::type_error(expected.join(" or "), kind.name()))
    }
}

/// Define a view type with the shared plumbing.
macro_rules! foreign_view {
    ($(#[$meta:meta])* $name:ident => [$($kind:ident),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, PartialOrd)]
        pub struct $name<'rt> {
            handle: $crate::handle::Handle<'rt>,
        }

        impl<'rt> $name<'rt> {
            /// Wrap a handle already known to be of the right kind.
            pub(crate) fn wrap(handle: $crate::handle::Handle<'rt>) -> Self {
                Self { handle }
            }

            /// Runtime of the view.
            #[allow(dead_code)]
            pub(crate) fn rt(&self) -> $crate::error::Result<&'rt $crate::runtime::Runtime> {
                self.handle.parts().map(|(rt, _)| rt)
            }

            /// Pointer of the view.
            #[allow(dead_code)]
            pub(crate) fn ptr(&self) -> $crate::error::Result<$crate::runtime::ObjPtr> {
                self.handle.parts().map(|(_, ptr)| ptr)
            }
        }

        impl<'rt> ::std::ops::Deref for $name<'rt> {
            type Target = $crate::handle::Handle<'rt>;

            fn deref(&self) -> &Self::Target {
                &self.handle
            }
        }

        impl<'rt> $crate::view::View<'rt> for $name<'rt> {
            const KINDS: &'static [$crate::runtime::ObjectKind] =
                &[$($crate::runtime::ObjectKind::$kind),+];

            fn as_handle(&self) -> &$crate::handle::Handle<'rt> {
                &self.handle
            }

            fn into_handle(self) -> $crate::handle::Handle<'rt> {
                self.handle
            }

            fn from_exact(handle: $crate::handle::Handle<'rt>) -> $crate::error::Result<Self> {
                $crate::view::check_kinds(&handle, Self::KINDS)?;
                Ok(Self::wrap(handle))
            }
        }

        impl<'rt> ::std::convert::TryFrom<$crate::handle::Handle<'rt>> for $name<'rt> {
            type Error = $crate::error::Error;

            fn try_from(handle: $crate::handle::Handle<'rt>) -> $crate::error::Result<Self> {
                <Self as $crate::view::View<'rt>>::from_exact(handle)
            }
        }

        impl<'rt> ::std::convert::From<$name<'rt>> for $crate::handle::Handle<'rt> {
            fn from(view: $name<'rt>) -> Self {
                view.handle
            }
        }

        impl<'rt> $crate::convert::ToForeign<'rt> for $name<'rt> {
            fn to_foreign(
                &self,
                rt: &'rt $crate::runtime::Runtime,
            ) -> $crate::error::Result<$crate::handle::Handle<'rt>> {
                $crate::convert::ToForeign::to_foreign(&self.handle, rt)
            }
        }

        impl<'rt> $crate::convert::IntoForeign<'rt> for $name<'rt> {
            fn into_foreign(
                self,
                rt: &'rt $crate::runtime::Runtime,
            ) -> $crate::error::Result<$crate::handle::Handle<'rt>> {
                $crate::convert::IntoForeign::into_foreign(self.handle, rt)
            }
        }

        impl ::std::fmt::Debug for $name<'_> {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self.handle.repr() {
                    Ok(repr) => write!(f, "{}({})", stringify!($name), repr),
                    Err(_) => write!(f, "{}(<empty>)", stringify!($name)),
                }
            }
        }
    };
}

pub(crate) use foreign_view;
