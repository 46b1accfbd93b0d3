//! Custom translator registry
//!
//! Provides [`CustomTranslators`], a map from a source value's static type to
//! an override that replaces the structural walk for values of that type.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::TranslateError;
use crate::set::TranslationSet;

/// Signature of a custom translator from `F` to `T`
///
/// The returned set is rooted at the translated value; the engine re-roots
/// it at the field being walked.
pub type OverrideFn<F, T> =
    dyn Fn(&F) -> Result<(T, TranslationSet), TranslateError> + Send + Sync;

#[derive(Clone)]
struct Registration {
    to_type: TypeId,
    from_name: &'static str,
    to_name: &'static str,
    /// Holds a `Box<OverrideFn<F, T>>` for the registered `F` and `T`
    func: Arc<dyn Any + Send + Sync>,
}

/// Registry of custom translators keyed by source type
///
/// At most one translator per source type. Registries are cheap to clone
/// (translators are shared behind `Arc`) and are `Send + Sync`.
#[derive(Clone, Default)]
pub struct CustomTranslators {
    by_source: HashMap<TypeId, Registration>,
}

impl CustomTranslators {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a translator for source type `F` producing `T`
    ///
    /// # Errors
    /// Returns [`TranslateError::DuplicateTranslator`] if `F` already has one
    pub fn register<F, T, C>(&mut self, translator: C) -> Result<(), TranslateError>
    where
        F: 'static,
        T: 'static,
        C: Fn(&F) -> Result<(T, TranslationSet), TranslateError> + Send + Sync + 'static,
    {
        let key = TypeId::of::<F>();
        if let Some(existing) = self.by_source.get(&key) {
            return Err(TranslateError::DuplicateTranslator {
                from: existing.from_name,
                existing: existing.to_name,
            });
        }

        let func: Box<OverrideFn<F, T>> = Box::new(translator);
        tracing::debug!(
            from = type_name::<F>(),
            to = type_name::<T>(),
            "registered custom translator"
        );
        self.by_source.insert(
            key,
            Registration {
                to_type: TypeId::of::<T>(),
                from_name: type_name::<F>(),
                to_name: type_name::<T>(),
                func: Arc::new(func),
            },
        );
        Ok(())
    }

    /// Translator registered for source type `F`, checked against destination `T`
    ///
    /// # Errors
    /// Returns [`TranslateError::TranslatorTypeMismatch`] if the translator for
    /// `F` was registered with a destination type other than `T`
    pub fn get<F: 'static, T: 'static>(&self) -> Result<Option<&OverrideFn<F, T>>, TranslateError> {
        let Some(registration) = self.by_source.get(&TypeId::of::<F>()) else {
            return Ok(None);
        };
        let mismatch = || TranslateError::TranslatorTypeMismatch {
            from: registration.from_name,
            registered: registration.to_name,
            expected: type_name::<T>(),
        };
        if registration.to_type != TypeId::of::<T>() {
            return Err(mismatch());
        }
        registration
            .func
            .downcast_ref::<Box<OverrideFn<F, T>>>()
            .map(|boxed| Some(boxed.as_ref()))
            .ok_or_else(mismatch)
    }

    /// Check if source type `F` has a translator
    #[inline]
    #[must_use]
    pub fn contains<F: 'static>(&self) -> bool {
        self.by_source.contains_key(&TypeId::of::<F>())
    }

    /// Number of registered translators
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }
}

impl fmt::Debug for CustomTranslators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.by_source.values().map(|r| (r.from_name, r.to_name)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Celsius(f64);

    #[derive(Debug, PartialEq)]
    struct Fahrenheit(f64);

    fn to_fahrenheit(c: &Celsius) -> Result<(Fahrenheit, TranslationSet), TranslateError> {
        Ok((
            Fahrenheit(c.0 * 9.0 / 5.0 + 32.0),
            TranslationSet::new("in", "out"),
        ))
    }

    #[test]
    fn registry_new_empty() {
        let registry = CustomTranslators::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn registry_register_and_get() {
        let mut registry = CustomTranslators::new();
        registry.register(to_fahrenheit).unwrap();
        assert!(registry.contains::<Celsius>());

        let translator = registry.get::<Celsius, Fahrenheit>().unwrap().unwrap();
        let (out, ts) = translator(&Celsius(100.0)).unwrap();
        assert_eq!(out, Fahrenheit(212.0));
        assert!(ts.is_empty());
    }

    #[test]
    fn registry_get_missing_is_none() {
        let registry = CustomTranslators::new();
        assert!(registry.get::<Celsius, Fahrenheit>().unwrap().is_none());
    }

    #[test]
    fn registry_rejects_duplicate_source_type() {
        let mut registry = CustomTranslators::new();
        registry.register(to_fahrenheit).unwrap();
        let err = registry
            .register(|c: &Celsius| Ok((c.0, TranslationSet::new("in", "out"))))
            .unwrap_err();
        assert!(matches!(err, TranslateError::DuplicateTranslator { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_detects_destination_mismatch() {
        let mut registry = CustomTranslators::new();
        registry.register(to_fahrenheit).unwrap();
        let err = registry.get::<Celsius, f64>().err().unwrap();
        assert!(matches!(err, TranslateError::TranslatorTypeMismatch { .. }));
    }

    #[test]
    fn registry_debug_names_types() {
        let mut registry = CustomTranslators::new();
        registry.register(to_fahrenheit).unwrap();
        let text = format!("{registry:?}");
        assert!(text.contains("Celsius"));
        assert!(text.contains("Fahrenheit"));
    }
}
