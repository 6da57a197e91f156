//! Rigid bodies of the host multibody engine, as seen by the force field.

use super::ids::{AtomId, BodyId, ClusterId};
use nalgebra::Point3;

/// An atom with its station in some containing frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtomPlacement {
    pub atom: AtomId,
    pub station: Point3<f64>,
}

/// A body is a reference to the internal top-level cluster representing
/// it, plus a flattened atom array rebuilt at realization for fast
/// body-by-body processing.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub cluster: ClusterId,
    /// Every atom attached to this body with its station in the body
    /// frame, sorted by atom id. Valid only after realization.
    pub all_atoms: Vec<AtomPlacement>,
}

impl Body {
    pub fn new(cluster: ClusterId) -> Self {
        Self {
            cluster,
            all_atoms: Vec::new(),
        }
    }

    /// Name of the internal cluster standing in for a host body.
    pub(crate) fn cluster_name_for(body: BodyId) -> String {
        format!("Body {}", body)
    }

    pub(crate) fn invalidate_topological_cache(&mut self) {
        self.all_atoms.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_cluster_names_embed_the_body_id() {
        assert_eq!(Body::cluster_name_for(BodyId(7)), "Body 7");
    }

    #[test]
    fn invalidate_drops_the_flattened_atoms() {
        let mut body = Body::new(ClusterId(2));
        body.all_atoms.push(AtomPlacement {
            atom: AtomId(0),
            station: Point3::origin(),
        });
        body.invalidate_topological_cache();
        assert!(body.all_atoms.is_empty());
    }
}
