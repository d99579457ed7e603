//! Template resource loading and caching
//!
//! The template, appearance font and field map are deployment artifacts,
//! byte-identical across calls. Providers are injected into the generator so
//! tests can substitute fakes and assert fetch counts.

use crate::fields::FieldMap;
use crate::{CardError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// The three byte resources a generation call depends on
#[derive(Debug, Clone)]
pub struct CardResources {
    pub template: Vec<u8>,
    pub font: Vec<u8>,
    pub field_map: FieldMap,
}

/// Source of card resources
pub trait ResourceProvider {
    fn load(&self) -> Result<Arc<CardResources>>;
}

impl<P: ResourceProvider + ?Sized> ResourceProvider for Arc<P> {
    fn load(&self) -> Result<Arc<CardResources>> {
        (**self).load()
    }
}

/// Loads resources from a directory: `template.pdf`, `card_font.ttf` and
/// `field_map.json`
#[derive(Debug, Clone)]
pub struct DirProvider {
    dir: PathBuf,
}

impl DirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read(&self, file: &str) -> Result<Vec<u8>> {
        std::fs::read(self.dir.join(file)).map_err(|e| {
            CardError::ResourceLoad(format!("{}: {e}", Path::new(file).display()))
        })
    }
}

impl ResourceProvider for DirProvider {
    fn load(&self) -> Result<Arc<CardResources>> {
        let field_map = FieldMap::from_json(&self.read("field_map.json")?)
            .map_err(|e| CardError::ResourceLoad(format!("field_map.json: {e}")))?;
        Ok(Arc::new(CardResources {
            template: self.read("template.pdf")?,
            font: self.read("card_font.ttf")?,
            field_map,
        }))
    }
}

/// Memoizing wrapper around another provider
///
/// Concurrent first calls may race and load twice; the duplicate work is
/// accepted instead of holding a lock across the load. A failed load leaves
/// the cache empty so a later call can retry.
pub struct CachedProvider<P> {
    inner: P,
    cache: RwLock<Option<Arc<CardResources>>>,
}

impl<P: ResourceProvider> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: RwLock::new(None),
        }
    }
}

impl<P: ResourceProvider> ResourceProvider for CachedProvider<P> {
    fn load(&self) -> Result<Arc<CardResources>> {
        {
            let cached = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(resources) = cached.as_ref() {
                return Ok(Arc::clone(resources));
            }
        }

        let resources = self.inner.load()?;

        let mut cached = self.cache.write().unwrap_or_else(|e| e.into_inner());
        // Another call may have won the race; keep the first result
        Ok(Arc::clone(
            cached.get_or_insert_with(|| Arc::clone(&resources)),
        ))
    }
}
