//! State hashing for determinism verification.
//!
//! Two collider indices built by the same sequence of operations must produce
//! identical hashes. Floats are hashed by their bit patterns.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glam::{Quat, Vec3};

use crate::body::Body;
use crate::index::ColliderIndex;

/// Compute a deterministic hash of a collider index.
///
/// This hash includes:
/// - The next body ID to be assigned
/// - Every body's ID, kind, layer and shape, in ID order
#[must_use]
pub fn hash_index(index: &ColliderIndex) -> u64 {
    let mut hasher = DefaultHasher::new();

    index.next_id().hash(&mut hasher);
    index.len().hash(&mut hasher);

    for body in index.iter() {
        hash_body(body, &mut hasher);
    }

    hasher.finish()
}

fn hash_body<H: Hasher>(body: &Body, hasher: &mut H) {
    body.id.hash(hasher);
    body.kind.hash(hasher);
    body.layer.bits().hash(hasher);
    hash_vec3(body.shape.center, hasher);
    hash_vec3(body.shape.half_extents, hasher);
    hash_quat(body.shape.rotation, hasher);
}

fn hash_vec3<H: Hasher>(v: Vec3, hasher: &mut H) {
    v.x.to_bits().hash(hasher);
    v.y.to_bits().hash(hasher);
    v.z.to_bits().hash(hasher);
}

fn hash_quat<H: Hasher>(q: Quat, hasher: &mut H) {
    for c in q.to_array() {
        c.to_bits().hash(hasher);
    }
}
