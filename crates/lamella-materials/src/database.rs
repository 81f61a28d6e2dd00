//! In-memory refractive index database.
//!
//! Maps material identifiers (`"Au"`, `"Ni"`, ...) to
//! [`MaterialProvider`]s and implements the [`MaterialOptics`] lookup used by
//! the solver. Lookups are exact, case-sensitive matches on the identifier.

use std::collections::BTreeMap;
use std::sync::Arc;

use num_complex::Complex64;

use crate::provider::{MaterialError, MaterialOptics, MaterialProvider};
use crate::tabulated::TabulatedMaterial;

/// A name → provider table.
#[derive(Clone, Default)]
pub struct MaterialDatabase {
    entries: BTreeMap<String, Arc<dyn MaterialProvider>>,
}

impl MaterialDatabase {
    /// An empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// A database holding the built-in soft x-ray tables (`Au`, `Ni`, `C`).
    /// A table that fails to build is logged and left out.
    pub fn builtin() -> Self {
        let tables = [
            ("Au", TabulatedMaterial::gold()),
            ("Ni", TabulatedMaterial::nickel()),
            ("C", TabulatedMaterial::carbon()),
        ];
        let mut db = Self::new();
        for (id, table) in tables {
            match table {
                Ok(material) => db.insert(id, material),
                Err(e) => log::error!("Built-in material {id} is unavailable: {e}"),
            }
        }
        db
    }

    /// Register (or replace) a provider under `id`.
    pub fn insert(&mut self, id: impl Into<String>, provider: impl MaterialProvider + 'static) {
        self.entries.insert(id.into(), Arc::new(provider));
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, id: impl Into<String>, provider: impl MaterialProvider + 'static) -> Self {
        self.insert(id, provider);
        self
    }

    /// The provider registered under `id`.
    pub fn get(&self, id: &str) -> Option<&dyn MaterialProvider> {
        self.entries.get(id).map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for MaterialDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialDatabase")
            .field("materials", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MaterialOptics for MaterialDatabase {
    fn lookup(&self, material: &str, wavelength_um: f64) -> Result<Complex64, MaterialError> {
        let provider = self
            .get(material)
            .ok_or_else(|| MaterialError::NotFound(material.to_string()))?;
        let index = provider.refractive_index(wavelength_um)?;
        log::trace!("{material} at {wavelength_um:.6} um: n = {:.6} + {:.6}i", index.re, index.im);
        Ok(index)
    }

    fn material_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
