//! Per-factor model cache
//!
//! Loading a super-resolution model is expensive, so each factor is loaded
//! at most once and kept until the cache is reset or dropped. The cache is
//! an ordinary value owned by the caller rather than process-global state.

use std::collections::HashMap;
use std::sync::Arc;

use image::DynamicImage;

use super::model::{ModelLoader, SuperResolutionModel, UpscaleFactor};
use crate::error::Result;

/// Lazily populated cache of loaded models keyed by scale factor
pub struct UpscalerCache {
    loader: Box<dyn ModelLoader>,
    models: HashMap<UpscaleFactor, Arc<dyn SuperResolutionModel>>,
}

impl UpscalerCache {
    /// Create an empty cache that loads models through `loader`
    pub fn new(loader: impl ModelLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            models: HashMap::new(),
        }
    }

    /// Get the model for `factor`, loading it on first use
    pub fn get(&mut self, factor: UpscaleFactor) -> Result<Arc<dyn SuperResolutionModel>> {
        if let Some(model) = self.models.get(&factor) {
            return Ok(Arc::clone(model));
        }

        log::info!("Loading super-resolution model for {}", factor);
        let model = self.loader.load(factor)?;
        self.models.insert(factor, Arc::clone(&model));
        Ok(model)
    }

    /// Upscale `image` with the cached model for `factor`
    pub fn upsample(&mut self, factor: UpscaleFactor, image: &DynamicImage) -> Result<DynamicImage> {
        let model = self.get(factor)?;
        model.upsample(image)
    }

    /// Check whether a model for `factor` has been loaded
    pub fn is_loaded(&self, factor: UpscaleFactor) -> bool {
        self.models.contains_key(&factor)
    }

    /// Factors with a loaded model, in ascending order
    pub fn loaded_factors(&self) -> Vec<UpscaleFactor> {
        let mut factors: Vec<_> = self.models.keys().copied().collect();
        factors.sort();
        factors
    }

    /// Drop every loaded model
    pub fn reset(&mut self) {
        self.models.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::ResampleModel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        loads: Arc<AtomicUsize>,
    }

    impl ModelLoader for CountingLoader {
        fn load(&self, factor: UpscaleFactor) -> Result<Arc<dyn SuperResolutionModel>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(ResampleModel::new(factor)))
        }
    }

    fn counting_cache() -> (UpscalerCache, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = UpscalerCache::new(CountingLoader {
            loads: Arc::clone(&loads),
        });
        (cache, loads)
    }

    #[test]
    fn test_models_load_once_per_factor() {
        let (mut cache, loads) = counting_cache();

        cache.get(UpscaleFactor::X2).unwrap();
        cache.get(UpscaleFactor::X2).unwrap();
        cache.get(UpscaleFactor::X4).unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(cache.loaded_factors(), vec![UpscaleFactor::X2, UpscaleFactor::X4]);
        assert!(!cache.is_loaded(UpscaleFactor::X3));
    }

    #[test]
    fn test_reset_forces_reload() {
        let (mut cache, loads) = counting_cache();

        cache.get(UpscaleFactor::X3).unwrap();
        cache.reset();
        assert!(!cache.is_loaded(UpscaleFactor::X3));

        cache.get(UpscaleFactor::X3).unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }
}
