//! Moving skin data between a scene and a [`SkinRecord`].

use super::{resolve_target, ResolveStrategy, SceneProvider};
use crate::config::{Config, MissingInfluencePolicy};
use crate::record::SkinRecord;
use crate::util::{short_name, Error, Result};

/// Group that placeholder influences are created under.
pub const MISSING_INFLUENCE_GROUP: &str = "missingJoints";

/// How [`restore_record`] maps a record onto the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreOptions {
    pub missing_influence: MissingInfluencePolicy,
    pub strategies: Vec<ResolveStrategy>,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            missing_influence: MissingInfluencePolicy::default(),
            strategies: ResolveStrategy::DEFAULT_ORDER.to_vec(),
        }
    }
}

impl From<&Config> for RestoreOptions {
    fn from(config: &Config) -> Self {
        Self {
            missing_influence: config.missing_influence,
            strategies: config.resolve_strategies.clone(),
        }
    }
}

/// Round to 1e-6 and drop the values that end up zero.
pub fn filter_secondary_weights(weights: &[f64]) -> Vec<f64> {
    weights
        .iter()
        .map(|w| (w * 1e6).round() / 1e6)
        .filter(|w| *w != 0.0)
        .collect()
}

/// Read the skin binding of `object` into a record.
///
/// The geometry id is the short name of `object`. Secondary weights go
/// through [`filter_secondary_weights`]; a negative skinning method is
/// stored as 0.
pub fn capture_record<S: SceneProvider + ?Sized>(scene: &S, object: &str) -> Result<SkinRecord> {
    if !scene.object_exists(object) {
        return Err(Error::ObjectNotFound(object.to_string()));
    }
    let deformer = scene.deformer_name(object)?;
    let influences = scene.influences(object)?;
    let dense = scene.dense_weights(object)?;

    let mut attributes = scene.scalar_attrs(object)?;
    attributes.skinning_method = attributes.skinning_method.max(0);

    let record = SkinRecord::from_dense(deformer, short_name(object), influences, &dense)?
        .with_secondary_weights(filter_secondary_weights(&scene.secondary_weights(object)?))
        .with_attributes(attributes);
    tracing::debug!(
        object,
        vertices = record.vertex_count(),
        influences = record.influences().len(),
        nonzero = record.weights().nonzero_count(),
        "skin captured"
    );
    Ok(record)
}

/// Bind and weight the scene object that `record.geometry()` resolves to.
///
/// Every check (target lookup, vertex count, influences, weight decoding)
/// runs before the scene is touched, so a failed restore applies nothing.
/// Returns the name of the new deformer.
pub fn restore_record<S: SceneProvider + ?Sized>(
    scene: &mut S,
    record: &SkinRecord,
    options: &RestoreOptions,
) -> Result<String> {
    let object = resolve_target(scene, record.geometry(), &options.strategies)?;
    restore_onto(scene, object, record, options)
}

/// Like [`restore_record`], onto an already resolved scene object.
pub fn restore_onto<S: SceneProvider + ?Sized>(
    scene: &mut S,
    object: String,
    record: &SkinRecord,
    options: &RestoreOptions,
) -> Result<String> {
    let actual = scene.vertex_count(&object)?;
    if actual != record.vertex_count() {
        tracing::warn!(object = %object, expected = record.vertex_count(), actual, "vertex count differs, skin not loaded");
        return Err(Error::VertexCountMismatch {
            object,
            expected: record.vertex_count(),
            actual,
        });
    }

    let missing: Vec<String> = record
        .influences()
        .iter()
        .filter(|i| !scene.influence_exists(i))
        .cloned()
        .collect();
    if !missing.is_empty() && options.missing_influence == MissingInfluencePolicy::Abort {
        return Err(Error::MissingInfluence(missing));
    }

    let dense = record.dense_weights()?;

    for influence in &missing {
        scene.create_influence(influence, MISSING_INFLUENCE_GROUP)?;
        tracing::warn!(influence = %influence, group = MISSING_INFLUENCE_GROUP, "created missing influence");
    }

    let deformer = scene.bind(&object, record.influences())?;
    scene.apply_dense_weights(&object, &dense)?;
    scene.apply_secondary_weights(&object, record.secondary_weights())?;
    scene.apply_scalar_attrs(&object, record.attributes())?;
    tracing::info!(object = %object, deformer = %deformer, "skin restored");
    Ok(deformer)
}
