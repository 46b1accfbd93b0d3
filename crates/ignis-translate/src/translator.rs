//! Structural translation walk
//!
//! Provides [`Translator`], which walks a source value and a destination value
//! in lockstep and accumulates a [`TranslationSet`], and the [`Translatable`]
//! trait that describes how a destination type is populated from a source type.
//!
//! Walk rules, per value:
//! 1. a custom translator registered for the source type replaces the walk
//! 2. `Option`: absent source leaves the destination alone and records nothing
//! 3. `Vec`: elements correspond by position, output length equals input length
//! 4. records (see [`structural!`](crate::structural)): each declared field is
//!    walked and re-rooted under its name
//! 5. leaves are cloned and record an identity entry

use std::any::type_name;
use std::collections::BTreeMap;

use crate::error::TranslateError;
use crate::path::{Domain, Path};
use crate::registry::CustomTranslators;
use crate::set::TranslationSet;

/// Destination type that can be populated from source type `S`
///
/// Implemented for leaves, `Option`, `Vec` and `BTreeMap<String, _>` here, and
/// for schema records with [`structural!`](crate::structural). The returned set
/// is rooted at the value itself; callers re-root it.
pub trait Translatable<S: 'static>: 'static {
    /// Populate `to` from `from`, returning provenance rooted at this value
    ///
    /// # Errors
    /// Propagates configuration errors from custom translators and merges
    fn translate_from(
        tr: &Translator,
        from: &S,
        to: &mut Self,
    ) -> Result<TranslationSet, TranslateError>;
}

/// Translation engine bound to a (source, destination) domain pair
#[derive(Debug, Clone)]
pub struct Translator {
    from_domain: Domain,
    to_domain: Domain,
    custom: CustomTranslators,
}

impl Translator {
    /// Create translator with no custom translators
    #[inline]
    #[must_use]
    pub fn new(from_domain: impl Into<Domain>, to_domain: impl Into<Domain>) -> Self {
        Self {
            from_domain: from_domain.into(),
            to_domain: to_domain.into(),
            custom: CustomTranslators::new(),
        }
    }

    /// Source domain
    #[inline]
    #[must_use]
    pub fn from_domain(&self) -> Domain {
        self.from_domain
    }

    /// Destination domain
    #[inline]
    #[must_use]
    pub fn to_domain(&self) -> Domain {
        self.to_domain
    }

    /// Registered custom translators
    #[inline]
    #[must_use]
    pub fn custom_translators(&self) -> &CustomTranslators {
        &self.custom
    }

    /// Register a custom translator for source type `F`
    ///
    /// # Errors
    /// Returns [`TranslateError::DuplicateTranslator`] if `F` already has one
    pub fn add_custom_translator<F, T, C>(&mut self, translator: C) -> Result<(), TranslateError>
    where
        F: 'static,
        T: 'static,
        C: Fn(&F) -> Result<(T, TranslationSet), TranslateError> + Send + Sync + 'static,
    {
        self.custom.register(translator)
    }

    /// Builder form of [`add_custom_translator`](Self::add_custom_translator)
    ///
    /// # Errors
    /// Returns [`TranslateError::DuplicateTranslator`] if `F` already has one
    pub fn with_custom_translator<F, T, C>(mut self, translator: C) -> Result<Self, TranslateError>
    where
        F: 'static,
        T: 'static,
        C: Fn(&F) -> Result<(T, TranslationSet), TranslateError> + Send + Sync + 'static,
    {
        self.custom.register(translator)?;
        Ok(self)
    }

    /// Empty set bound to this translator's domains
    #[inline]
    #[must_use]
    pub fn empty_set(&self) -> TranslationSet {
        TranslationSet::new(self.from_domain, self.to_domain)
    }

    /// Set holding only the root-to-root entry for the value being visited
    #[must_use]
    pub fn root_set(&self) -> TranslationSet {
        TranslationSet::rooted(self.from_domain, self.to_domain)
    }

    /// Translate `from` into `to`, returning provenance rooted at the pair
    ///
    /// # Errors
    /// - [`TranslateError::TranslatorTypeMismatch`] if the custom translator for
    ///   `S` produces something other than `D`
    /// - [`TranslateError::DomainMismatch`] if a custom translator returns a set
    ///   bound to other domains
    /// - [`TranslateError::Conflict`] if sub-translations claim the same path
    pub fn translate<S, D>(&self, from: &S, to: &mut D) -> Result<TranslationSet, TranslateError>
    where
        S: 'static,
        D: Translatable<S>,
    {
        if let Some(custom) = self.custom.get::<S, D>()? {
            tracing::debug!(
                from = type_name::<S>(),
                to = type_name::<D>(),
                "dispatching custom translator"
            );
            let (value, returned) = custom(from)?;
            let mut ts = self.empty_set();
            ts.merge(returned)?;
            if !ts.is_empty() && !ts.has_root() {
                ts.add_translation(Path::root(self.from_domain), Path::root(self.to_domain))?;
            }
            *to = value;
            return Ok(ts);
        }

        tracing::trace!(
            from = type_name::<S>(),
            to = type_name::<D>(),
            "structural translation"
        );
        D::translate_from(self, from, to)
    }
}

macro_rules! impl_leaf {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Translatable<$ty> for $ty {
                fn translate_from(
                    tr: &Translator,
                    from: &$ty,
                    to: &mut Self,
                ) -> Result<TranslationSet, TranslateError> {
                    to.clone_from(from);
                    Ok(tr.root_set())
                }
            }
        )*
    };
}

impl_leaf!(bool, char, String, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

impl<S, D> Translatable<Option<S>> for Option<D>
where
    S: 'static,
    D: Translatable<S> + Default,
{
    fn translate_from(
        tr: &Translator,
        from: &Option<S>,
        to: &mut Self,
    ) -> Result<TranslationSet, TranslateError> {
        let Some(inner) = from else {
            return Ok(tr.empty_set());
        };
        let mut value = to.take().unwrap_or_default();
        let ts = tr.translate(inner, &mut value)?;
        *to = Some(value);
        Ok(ts)
    }
}

impl<S, D> Translatable<Vec<S>> for Vec<D>
where
    S: 'static,
    D: Translatable<S> + Default,
{
    fn translate_from(
        tr: &Translator,
        from: &Vec<S>,
        to: &mut Self,
    ) -> Result<TranslationSet, TranslateError> {
        let mut ts = tr.root_set();
        let mut existing = std::mem::take(to).into_iter();
        let mut out = Vec::with_capacity(from.len());
        for (i, item) in from.iter().enumerate() {
            let mut value = existing.next().unwrap_or_default();
            let child = tr.translate(item, &mut value)?;
            ts.merge_p(i, &child)?;
            out.push(value);
        }
        *to = out;
        Ok(ts)
    }
}

impl<S, D> Translatable<BTreeMap<String, S>> for BTreeMap<String, D>
where
    S: 'static,
    D: Translatable<S> + Default,
{
    fn translate_from(
        tr: &Translator,
        from: &BTreeMap<String, S>,
        to: &mut Self,
    ) -> Result<TranslationSet, TranslateError> {
        let mut ts = tr.root_set();
        let mut existing = std::mem::take(to);
        for (key, item) in from {
            let mut value = existing.remove(key).unwrap_or_default();
            let child = tr.translate(item, &mut value)?;
            ts.merge_p(key, &child)?;
            to.insert(key.clone(), value);
        }
        Ok(ts)
    }
}

/// Implement [`Translatable`] for a record pair as a declarative field table
///
/// Fields are walked in the listed order. A bare field name uses the Rust
/// field name as the path segment on both sides; `field: "src" => "dst"`
/// names the segment per side (for schemas whose serialized keys differ).
/// Destination fields not listed are left untouched.
///
/// ```
/// use ignis_translate::{path, structural, Provenance, Translator};
///
/// #[derive(Default)]
/// struct In { name: String, mount_point: Option<String> }
/// #[derive(Default)]
/// struct Out { name: String, mount_point: Option<String> }
///
/// structural!(In => Out { name, mount_point: "mount_point" => "mountPoint" });
///
/// let tr = Translator::new("yaml", "json");
/// let src = In { name: "data".into(), mount_point: Some("/var".into()) };
/// let mut dst = Out::default();
/// let ts = tr.translate(&src, &mut dst).unwrap();
/// assert_eq!(dst.mount_point.as_deref(), Some("/var"));
/// assert_eq!(
///     ts.lookup(&path!("json", "mountPoint")),
///     Provenance::Exact(path!("yaml", "mount_point")),
/// );
/// ```
#[macro_export]
macro_rules! structural {
    ($from:ty => $to:ty { $($field:ident $(: $src:literal => $dst:literal)?),* $(,)? }) => {
        impl $crate::Translatable<$from> for $to {
            #[allow(unused_variables, unused_mut)]
            fn translate_from(
                tr: &$crate::Translator,
                from: &$from,
                to: &mut Self,
            ) -> ::core::result::Result<$crate::TranslationSet, $crate::TranslateError> {
                let mut ts = tr.root_set();
                $(
                    let (src_key, dst_key) = $crate::__field_keys!($field $(, $src, $dst)?);
                    let child = tr.translate(&from.$field, &mut to.$field)?;
                    ts.merge_with_prefix(src_key, dst_key, &child)?;
                )*
                Ok(ts)
            }
        }
    };
}

/// Implement [`Translatable`] for a pair that is only ever translated by a
/// custom translator
///
/// Walking the pair without its translator registered fails with
/// [`TranslateError::MissingTranslator`].
#[macro_export]
macro_rules! custom_only {
    ($from:ty => $to:ty) => {
        impl $crate::Translatable<$from> for $to {
            fn translate_from(
                _tr: &$crate::Translator,
                _from: &$from,
                _to: &mut Self,
            ) -> ::core::result::Result<$crate::TranslationSet, $crate::TranslateError> {
                Err($crate::TranslateError::MissingTranslator {
                    from: ::core::any::type_name::<$from>(),
                    to: ::core::any::type_name::<$to>(),
                })
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __field_keys {
    ($field:ident) => {
        (stringify!($field), stringify!($field))
    };
    ($field:ident, $src:literal, $dst:literal) => {
        ($src, $dst)
    };
}
