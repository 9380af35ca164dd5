//! Resolving a stored geometry id to a scene object.

use serde::{Deserialize, Serialize};

use super::SceneProvider;
use crate::util::{short_name, strip_namespace, Error, Result};

/// One way of matching a stored geometry id against scene objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStrategy {
    /// The id names an object as-is.
    Exact,
    /// Last segment of a `|`-separated DAG path.
    ShortName,
    /// Namespaces ignored on both sides.
    StripNamespace,
}

impl ResolveStrategy {
    pub const DEFAULT_ORDER: [ResolveStrategy; 3] = [Self::Exact, Self::ShortName, Self::StripNamespace];

    /// Scene object matched by this strategy, if any.
    pub fn resolve<S: SceneProvider + ?Sized>(self, scene: &S, geometry: &str) -> Option<String> {
        match self {
            Self::Exact => scene.object_exists(geometry).then(|| geometry.to_string()),
            Self::ShortName => {
                let short = short_name(geometry);
                (short != geometry && scene.object_exists(short)).then(|| short.to_string())
            }
            Self::StripNamespace => {
                let bare = strip_namespace(geometry);
                let mut matches: Vec<String> = scene
                    .objects()
                    .into_iter()
                    .filter(|o| strip_namespace(o) == bare)
                    .collect();
                matches.sort();
                matches.into_iter().next()
            }
        }
    }
}

/// Try each strategy in order; the first match wins.
pub fn resolve_target<S: SceneProvider + ?Sized>(
    scene: &S,
    geometry: &str,
    strategies: &[ResolveStrategy],
) -> Result<String> {
    for &strategy in strategies {
        if let Some(object) = strategy.resolve(scene, geometry) {
            tracing::debug!(geometry, object = %object, ?strategy, "geometry resolved");
            return Ok(object);
        }
    }
    Err(Error::ObjectNotFound(geometry.to_string()))
}
