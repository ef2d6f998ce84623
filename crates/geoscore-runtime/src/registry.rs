//! Component Registry Module
//!
//! Maps `(module, class)` pairs from the manifest to factories producing
//! `Feature` and `FeatureEngineering` instances. Lookups fail with
//! `ModuleResolution` when no component was registered under the module and
//! with `ComponentNotFound` when the module lacks the class.

use crate::error::{Result, RuntimeError};
use crate::feature::{ConfiguredFeature, Feature};
use crate::feature_engineering::{FeatureEngineering, HomogeneityFeatureEngineering};
use crate::features::{
    BirthsFeature, Election21Feature, Election25Feature, MunicipalityFeature, PopulationFeature,
    RoadAccidentsFeature, UnemploymentFeature,
};
use geoscore_parser::{
    ComponentDescriptor, FeatureDescriptor, TransformDescriptor, DEFAULT_FEATURE_MODULE,
    DEFAULT_TRANSFORM_MODULE,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::{debug, error, info};

/// Builds a feature from its descriptor
pub type FeatureFactory = Box<dyn Fn(&ComponentDescriptor) -> Result<Box<dyn Feature>> + Send + Sync>;

/// Builds a transform from its descriptor
pub type TransformFactory =
    Box<dyn Fn(&TransformDescriptor) -> Result<Box<dyn FeatureEngineering>> + Send + Sync>;

/// Deserialize constructor parameters into `P`, reporting unknown or
/// ill-typed entries as `InvalidParams`
pub fn parse_params<P: DeserializeOwned>(component: &str, params: &serde_yaml::Mapping) -> Result<P> {
    serde_yaml::from_value(serde_yaml::Value::Mapping(params.clone())).map_err(|e| {
        RuntimeError::InvalidParams {
            component: component.to_string(),
            message: e.to_string(),
        }
    })
}

/// Two-level table: module path, then class name
struct ModuleTable<F> {
    modules: HashMap<String, HashMap<String, F>>,
}

impl<F> ModuleTable<F> {
    fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    fn insert(&mut self, module: &str, class: &str, factory: F) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(class.to_string(), factory);
    }

    fn lookup(&self, module: &str, class: &str) -> Result<&F> {
        let classes = self
            .modules
            .get(module)
            .ok_or_else(|| RuntimeError::ModuleResolution {
                module: module.to_string(),
            })?;
        classes
            .get(class)
            .ok_or_else(|| RuntimeError::ComponentNotFound {
                module: module.to_string(),
                class: class.to_string(),
            })
    }

    fn classes(&self, module: &str) -> Vec<&str> {
        let mut classes: Vec<&str> = self
            .modules
            .get(module)
            .map(|c| c.keys().map(String::as_str).collect())
            .unwrap_or_default();
        classes.sort_unstable();
        classes
    }
}

/// Registry of feature and transform factories
pub struct ComponentRegistry {
    features: ModuleTable<FeatureFactory>,
    transforms: ModuleTable<TransformFactory>,
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            features: ModuleTable::new(),
            transforms: ModuleTable::new(),
        }
    }

    /// Create a registry holding every built-in component
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register_feature::<MunicipalityFeature>(DEFAULT_FEATURE_MODULE, MunicipalityFeature::NAME);
        registry.register_feature::<BirthsFeature>(DEFAULT_FEATURE_MODULE, BirthsFeature::NAME);
        registry.register_feature::<PopulationFeature>(DEFAULT_FEATURE_MODULE, PopulationFeature::NAME);
        registry.register_feature::<UnemploymentFeature>(DEFAULT_FEATURE_MODULE, UnemploymentFeature::NAME);
        registry.register_feature::<RoadAccidentsFeature>(DEFAULT_FEATURE_MODULE, RoadAccidentsFeature::NAME);
        registry.register_feature::<Election21Feature>(DEFAULT_FEATURE_MODULE, Election21Feature::NAME);
        registry.register_feature::<Election25Feature>(DEFAULT_FEATURE_MODULE, Election25Feature::NAME);

        registry.register_transform_factory(
            DEFAULT_TRANSFORM_MODULE,
            HomogeneityFeatureEngineering::NAME,
            |descriptor| {
                let transform: Box<dyn FeatureEngineering> =
                    Box::new(HomogeneityFeatureEngineering::from_descriptor(descriptor)?);
                Ok(transform)
            },
        );

        registry
    }

    /// Register a feature type built by deserializing its parameters
    pub fn register_feature<T>(&mut self, module: &str, class: &str)
    where
        T: Feature + DeserializeOwned + 'static,
    {
        let component = class.to_string();
        self.register_feature_factory(module, class, move |descriptor| {
            let feature: Box<dyn Feature> = Box::new(parse_params::<T>(&component, &descriptor.params)?);
            Ok(feature)
        });
    }

    /// Register a feature factory
    pub fn register_feature_factory<F>(&mut self, module: &str, class: &str, factory: F)
    where
        F: Fn(&ComponentDescriptor) -> Result<Box<dyn Feature>> + Send + Sync + 'static,
    {
        debug!("Registering feature {}::{}", module, class);
        self.features.insert(module, class, Box::new(factory));
    }

    /// Register a transform factory
    pub fn register_transform_factory<F>(&mut self, module: &str, class: &str, factory: F)
    where
        F: Fn(&TransformDescriptor) -> Result<Box<dyn FeatureEngineering>> + Send + Sync + 'static,
    {
        debug!("Registering transform {}::{}", module, class);
        self.transforms.insert(module, class, Box::new(factory));
    }

    /// Feature classes registered under `module`, sorted
    pub fn feature_classes(&self, module: &str) -> Vec<&str> {
        self.features.classes(module)
    }

    /// Transform classes registered under `module`, sorted
    pub fn transform_classes(&self, module: &str) -> Vec<&str> {
        self.transforms.classes(module)
    }

    /// Instantiate a feature and its nested transforms
    pub fn resolve_feature(&self, descriptor: &FeatureDescriptor, join_key: &str) -> Result<ConfiguredFeature> {
        let module = descriptor.module_path();
        let class = descriptor.component.class_name.as_str();

        let result = self
            .features
            .lookup(module, class)
            .and_then(|factory| factory(&descriptor.component))
            .and_then(|feature| {
                let before = self.resolve_transforms(&descriptor.before_transforms)?;
                let after = self.resolve_transforms(&descriptor.after_transforms)?;
                Ok(ConfiguredFeature::new(descriptor.name(), feature, join_key)
                    .with_before_transforms(before)
                    .with_after_transforms(after))
            });

        match &result {
            Ok(_) => info!("Resolved feature '{}' as {}::{}", descriptor.name(), module, class),
            Err(e) => error!("Failed to resolve feature '{}': {}", descriptor.name(), e),
        }
        result
    }

    /// Instantiate a single transform
    pub fn resolve_transform(&self, descriptor: &TransformDescriptor) -> Result<Box<dyn FeatureEngineering>> {
        let module = descriptor.module_path();
        let class = descriptor.component.class_name.as_str();

        let result = self
            .transforms
            .lookup(module, class)
            .and_then(|factory| factory(descriptor));

        match &result {
            Ok(_) => info!("Resolved transform '{}' as {}::{}", descriptor.name(), module, class),
            Err(e) => error!("Failed to resolve transform '{}': {}", descriptor.name(), e),
        }
        result
    }

    fn resolve_transforms(&self, descriptors: &[TransformDescriptor]) -> Result<Vec<Box<dyn FeatureEngineering>>> {
        descriptors.iter().map(|d| self.resolve_transform(d)).collect()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
