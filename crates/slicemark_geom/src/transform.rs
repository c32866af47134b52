//! Parent transform chains.
//!
//! Only linear (affine) transforms can be inverted here. A chain that contains a
//! non-linear transform (e.g. a displacement field) is not approximated: the
//! conversion falls back to identity and logs a warning. Callers that need
//! exact local coordinates under non-linear parents are not supported.

use glam::DMat4;
use serde::{Deserialize, Serialize};

use crate::error::GeomError;

/// Determinant below which a linear transform is treated as singular.
const SINGULAR_DETERMINANT: f64 = 1e-12;

/// A transform applied by a parent node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransformKind {
    /// Affine transform, parent-to-world direction
    Linear(DMat4),
    /// Any transform that cannot be represented as a matrix
    NonLinear { description: String },
}

impl TransformKind {
    pub fn is_linear(&self) -> bool {
        matches!(self, TransformKind::Linear(_))
    }
}

/// Compose a chain into a single local-to-world matrix.
///
/// `chain` is ordered from the node's immediate parent up to the root.
pub fn accumulate_to_world(chain: &[TransformKind]) -> Result<DMat4, GeomError> {
    chain.iter().try_fold(DMat4::IDENTITY, |acc, transform| match transform {
        TransformKind::Linear(matrix) => Ok(*matrix * acc),
        TransformKind::NonLinear { description } => Err(GeomError::NonLinearTransform {
            description: description.clone(),
        }),
    })
}

/// World-to-local matrix for a node under `chain`.
///
/// Returns identity for non-linear or singular chains.
pub fn world_to_local(chain: &[TransformKind]) -> DMat4 {
    match accumulate_to_world(chain) {
        Ok(to_world) => {
            let determinant = to_world.determinant();
            if determinant.abs() < SINGULAR_DETERMINANT {
                log::warn!(
                    "Parent transform is singular (det {:e}), using identity",
                    determinant
                );
                DMat4::IDENTITY
            } else {
                to_world.inverse()
            }
        }
        Err(e) => {
            log::warn!("{}; world-to-local conversion uses identity", e);
            DMat4::IDENTITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn test_empty_chain_is_identity() {
        assert_eq!(accumulate_to_world(&[]).unwrap(), DMat4::IDENTITY);
        assert_eq!(world_to_local(&[]), DMat4::IDENTITY);
    }

    #[test]
    fn test_chain_order_parent_first() {
        let parent = TransformKind::Linear(DMat4::from_scale(DVec3::splat(2.0)));
        let grandparent = TransformKind::Linear(DMat4::from_translation(DVec3::new(5.0, 0.0, 0.0)));
        let to_world = accumulate_to_world(&[parent, grandparent]).unwrap();
        // Scale by the parent first, then translate by the grandparent.
        assert_eq!(to_world.transform_point3(DVec3::X), DVec3::new(7.0, 0.0, 0.0));
    }

    #[test]
    fn test_world_to_local_inverts_chain() {
        let chain = [TransformKind::Linear(DMat4::from_translation(DVec3::new(1.0, 2.0, 3.0)))];
        let local = world_to_local(&chain).transform_point3(DVec3::new(1.0, 2.0, 3.0));
        assert!(local.length() < 1e-12);
    }

    #[test]
    fn test_non_linear_chain_falls_back_to_identity() {
        let chain = [
            TransformKind::Linear(DMat4::from_translation(DVec3::X)),
            TransformKind::NonLinear {
                description: "bspline".to_string(),
            },
        ];
        assert!(matches!(
            accumulate_to_world(&chain),
            Err(GeomError::NonLinearTransform { .. })
        ));
        assert_eq!(world_to_local(&chain), DMat4::IDENTITY);
    }

    #[test]
    fn test_singular_chain_falls_back_to_identity() {
        let chain = [TransformKind::Linear(DMat4::from_scale(DVec3::new(1.0, 0.0, 1.0)))];
        assert_eq!(world_to_local(&chain), DMat4::IDENTITY);
    }
}
