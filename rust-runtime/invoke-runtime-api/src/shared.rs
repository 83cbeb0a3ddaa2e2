/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Conversion traits for converting an unshared type into a shared type.
//!
//! The standard [`From`](std::convert::From)/[`Into`](std::convert::Into) traits can't be
//! used for this purpose due to the blanket implementation of `Into`.
//!
//! Configuration builders accept `impl IntoShared<SharedX>` so callers can hand over either
//! a bare implementation or an already-shared one; [`maybe_shared`] keeps the latter from
//! being wrapped twice.

use std::any::{Any, TypeId};

/// Like the `From` trait, but for converting to a shared type.
pub trait FromUnshared<Unshared> {
    /// Creates a shared type from an unshared type.
    fn from_unshared(value: Unshared) -> Self;
}

/// Like the `Into` trait, but for (efficiently) converting into a shared type.
///
/// If the type is already a shared type, it won't be nested in another shared type.
pub trait IntoShared<Shared> {
    /// Creates a shared type from an unshared type.
    fn into_shared(self) -> Shared;
}

impl<Unshared, Shared> IntoShared<Shared> for Unshared
where
    Shared: FromUnshared<Unshared>,
{
    fn into_shared(self) -> Shared {
        FromUnshared::from_unshared(self)
    }
}

/// Returns `value` as-is if it already is the `Shared` type, otherwise wraps it with `ctor`.
pub fn maybe_shared<Shared, MaybeShared, F>(value: MaybeShared, ctor: F) -> Shared
where
    Shared: 'static,
    MaybeShared: IntoShared<Shared> + 'static,
    F: FnOnce(MaybeShared) -> Shared,
{
    if TypeId::of::<MaybeShared>() != TypeId::of::<Shared>() {
        return ctor(value);
    }
    let mut slot = Some(value);
    (&mut slot as &mut dyn Any)
        .downcast_mut::<Option<Shared>>()
        .and_then(Option::take)
        .expect("type ids were compared above")
}

/// Implements `FromUnshared` for a shared type.
///
/// # Example
/// ```rust,no_run
/// use invoke_runtime_api::impl_shared_conversions;
/// use std::sync::Arc;
///
/// trait Sink {}
///
/// struct Stdout;
/// impl Sink for Stdout {}
///
/// struct SharedSink(Arc<dyn Sink>);
/// impl Sink for SharedSink {}
/// impl SharedSink {
///     fn new(sink: impl Sink + 'static) -> Self {
///         Self(Arc::new(sink))
///     }
/// }
/// impl_shared_conversions!(convert SharedSink from Sink using SharedSink::new);
/// ```
#[macro_export]
macro_rules! impl_shared_conversions {
    (convert $shared_type:ident from $unshared_trait:ident using $ctor:expr) => {
        impl<T> $crate::shared::FromUnshared<T> for $shared_type
        where
            T: $unshared_trait + 'static,
        {
            fn from_unshared(value: T) -> Self {
                $crate::shared::maybe_shared(value, $ctor)
            }
        }
    };
}
