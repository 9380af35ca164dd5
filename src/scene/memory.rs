//! JSON-backed in-memory scene.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::SceneProvider;
use crate::codec::DenseWeightMatrix;
use crate::record::SkinAttributes;
use crate::util::{Error, Result};

/// Skin deformer bound to one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinBinding {
    pub deformer: String,
    pub influences: Vec<String>,
    /// One row per vertex, one column per influence.
    pub weights: Vec<Vec<f64>>,
    #[serde(default)]
    pub secondary_weights: Vec<f64>,
    #[serde(default)]
    pub attributes: SkinAttributes,
}

/// A deformable object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub vertex_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin: Option<SkinBinding>,
}

/// Headless scene: objects, influences and skin bindings in plain maps.
///
/// ```json
/// {
///   "influences": { "hip": null, "knee": "hip" },
///   "objects": { "leg": { "vertex_count": 2, "skin": { ... } } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryScene {
    /// Influence name -> parent group.
    pub influences: BTreeMap<String, Option<String>>,
    pub objects: BTreeMap<String, SceneObject>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::from_io(e, path))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)? + "\n")?;
        Ok(())
    }

    pub fn add_object(&mut self, name: impl Into<String>, vertex_count: usize) {
        self.objects.insert(name.into(), SceneObject { vertex_count, skin: None });
    }

    pub fn add_influence(&mut self, name: impl Into<String>) {
        self.influences.insert(name.into(), None);
    }

    /// Bind `object` to `influences` with row-major `weights`, creating missing influences.
    pub fn set_skin(&mut self, object: &str, influences: &[&str], weights: Vec<Vec<f64>>) -> Result<()> {
        let names: Vec<String> = influences.iter().map(|s| s.to_string()).collect();
        for name in &names {
            self.influences.entry(name.clone()).or_insert(None);
        }
        let dense = DenseWeightMatrix::from_rows(&weights, names.len())?;
        self.bind(object, &names)?;
        self.apply_dense_weights(object, &dense)
    }

    pub fn skin(&self, object: &str) -> Option<&SkinBinding> {
        self.objects.get(object).and_then(|o| o.skin.as_ref())
    }

    fn object(&self, object: &str) -> Result<&SceneObject> {
        self.objects
            .get(object)
            .ok_or_else(|| Error::ObjectNotFound(object.to_string()))
    }

    fn binding(&self, object: &str) -> Result<&SkinBinding> {
        self.object(object)?
            .skin
            .as_ref()
            .ok_or_else(|| Error::ObjectNotFound(format!("skin deformer on {object}")))
    }

    fn binding_mut(&mut self, object: &str) -> Result<&mut SkinBinding> {
        self.objects
            .get_mut(object)
            .ok_or_else(|| Error::ObjectNotFound(object.to_string()))?
            .skin
            .as_mut()
            .ok_or_else(|| Error::ObjectNotFound(format!("skin deformer on {object}")))
    }
}

impl SceneProvider for MemoryScene {
    fn objects(&self) -> Vec<String> {
        self.objects.keys().cloned().collect()
    }

    fn object_exists(&self, object: &str) -> bool {
        self.objects.contains_key(object)
    }

    fn is_skinned(&self, object: &str) -> bool {
        self.skin(object).is_some()
    }

    fn vertex_count(&self, object: &str) -> Result<usize> {
        Ok(self.object(object)?.vertex_count)
    }

    fn deformer_name(&self, object: &str) -> Result<String> {
        Ok(self.binding(object)?.deformer.clone())
    }

    fn influences(&self, object: &str) -> Result<Vec<String>> {
        Ok(self.binding(object)?.influences.clone())
    }

    fn dense_weights(&self, object: &str) -> Result<DenseWeightMatrix> {
        let binding = self.binding(object)?;
        DenseWeightMatrix::from_rows(&binding.weights, binding.influences.len())
    }

    fn secondary_weights(&self, object: &str) -> Result<Vec<f64>> {
        Ok(self.binding(object)?.secondary_weights.clone())
    }

    fn scalar_attrs(&self, object: &str) -> Result<SkinAttributes> {
        Ok(self.binding(object)?.attributes)
    }

    fn influence_exists(&self, influence: &str) -> bool {
        self.influences.contains_key(influence)
    }

    fn create_influence(&mut self, influence: &str, group: &str) -> Result<()> {
        self.influences.insert(influence.to_string(), Some(group.to_string()));
        Ok(())
    }

    fn bind(&mut self, object: &str, influences: &[String]) -> Result<String> {
        if let Some(missing) = influences.iter().find(|i| !self.influences.contains_key(*i)) {
            return Err(Error::MissingInfluence(vec![missing.clone()]));
        }
        let entry = self
            .objects
            .get_mut(object)
            .ok_or_else(|| Error::ObjectNotFound(object.to_string()))?;
        let deformer = format!("{object}_skinCls");
        entry.skin = Some(SkinBinding {
            deformer: deformer.clone(),
            influences: influences.to_vec(),
            weights: vec![vec![0.0; influences.len()]; entry.vertex_count],
            secondary_weights: Vec::new(),
            attributes: SkinAttributes::default(),
        });
        Ok(deformer)
    }

    /// Rows that do not sum to exactly 1.0 are normalized, as a skin deformer
    /// with weight normalization would do.
    fn apply_dense_weights(&mut self, object: &str, weights: &DenseWeightMatrix) -> Result<()> {
        let vertex_count = self.vertex_count(object)?;
        let binding = self.binding_mut(object)?;
        if weights.vertex_count() != vertex_count || weights.influence_count() != binding.influences.len() {
            return Err(Error::malformed(format!(
                "weights are {}x{}, binding is {}x{}",
                weights.vertex_count(),
                weights.influence_count(),
                vertex_count,
                binding.influences.len()
            )));
        }
        binding.weights = weights
            .rows()
            .map(|row| {
                let sum: f64 = row.iter().sum();
                if sum == 0.0 || sum == 1.0 {
                    row.to_vec()
                } else {
                    row.iter().map(|w| w / sum).collect()
                }
            })
            .collect();
        Ok(())
    }

    fn apply_secondary_weights(&mut self, object: &str, weights: &[f64]) -> Result<()> {
        self.binding_mut(object)?.secondary_weights = weights.to_vec();
        Ok(())
    }

    fn apply_scalar_attrs(&mut self, object: &str, attrs: &SkinAttributes) -> Result<()> {
        self.binding_mut(object)?.attributes = *attrs;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_skin_and_query() {
        let mut scene = MemoryScene::new();
        scene.add_object("leg", 2);
        scene.set_skin("leg", &["hip", "knee"], vec![vec![1.0, 0.0], vec![0.5, 0.5]]).unwrap();

        assert!(scene.is_skinned("leg"));
        assert_eq!(scene.deformer_name("leg").unwrap(), "leg_skinCls");
        assert_eq!(scene.dense_weights("leg").unwrap().get(1, 1), Some(0.5));
        assert!(scene.influence_exists("knee"));
    }

    #[test]
    fn test_normalizes_on_apply() {
        let mut scene = MemoryScene::new();
        scene.add_object("leg", 1);
        scene.set_skin("leg", &["hip", "knee"], vec![vec![2.0, 2.0]]).unwrap();
        assert_eq!(scene.skin("leg").unwrap().weights, vec![vec![0.5, 0.5]]);
    }

    #[test]
    fn test_bind_requires_influences() {
        let mut scene = MemoryScene::new();
        scene.add_object("leg", 1);
        let err = scene.bind("leg", &["ghost".to_string()]).unwrap_err();
        assert!(matches!(err, Error::MissingInfluence(_)));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut scene = MemoryScene::new();
        scene.add_object("leg", 1);
        scene.add_object("prop", 8);
        scene.set_skin("leg", &["hip"], vec![vec![1.0]]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        scene.save(&path).unwrap();
        assert_eq!(MemoryScene::load(&path).unwrap(), scene);
    }
}
