use std::collections::VecDeque;

use cgmath::{InnerSpace, Point3};
use optrace_common::{Aabb, Ray};

use super::Propagation;
use crate::element::ElementId;
use crate::error::TraceError;
use crate::ray::RayId;
use crate::surface::{Surface, MIN_DISTANCE};

struct Candidate<'a> {
    id: ElementId,
    surface: &'a Surface,
    bounds: Aabb,
}

struct Hit<'a> {
    id: ElementId,
    surface: &'a Surface,
    local: Ray,
    point: Point3<f64>,
    distance: f64,
}

/// Expands rays breadth first, each one toward the nearest surface it hits,
/// until they are lost, absorbed, or `max_bounce` generations deep.
pub(super) fn trace(propagation: &mut Propagation) -> Result<(), TraceError> {
    let system = propagation.system;
    let max_bounce = propagation.params.max_bounce;

    let candidates: Vec<Candidate> = system
        .surfaces(true)
        .into_iter()
        .filter_map(|id| {
            let surface = system.get_element(id)?.as_surface()?;
            Some(Candidate {
                id,
                surface,
                bounds: surface.bounding_box().padded(MIN_DISTANCE * 10.0),
            })
        })
        .collect();

    let mut queue: VecDeque<(RayId, u32)> = VecDeque::new();
    for id in system.sources(true) {
        let Some(source) = system.get_element(id).and_then(|e| e.as_source()) else {
            continue;
        };
        for ray in propagation.emit_source(id, source, None)? {
            queue.push_back((ray, 0));
        }
    }

    let mut truncated = 0usize;
    while let Some((ray_id, depth)) = queue.pop_front() {
        if depth >= max_bounce {
            truncated += 1;
            continue;
        }

        match nearest_hit(propagation, &candidates, ray_id)? {
            Some(hit) => {
                log::trace!("Ray {} hits surface {} at {:.6}", ray_id, hit.id, hit.distance);
                if let Some(child) = propagation.process_hit(ray_id, hit.id, hit.surface, &hit.local, hit.point) {
                    queue.push_back((child, depth + 1));
                }
            }
            None => propagation.mark_lost(ray_id),
        }
    }

    if truncated > 0 {
        log::warn!("{} ray(s) stopped at the bounce limit of {}", truncated, max_bounce);
    }
    Ok(())
}

fn nearest_hit<'a>(
    propagation: &Propagation,
    candidates: &[Candidate<'a>],
    ray_id: RayId,
) -> Result<Option<Hit<'a>>, TraceError> {
    let max_distance = propagation.params.lost_ray_length;
    let mut best: Option<Hit<'a>> = None;

    for candidate in candidates {
        let local = propagation.ray_in(ray_id, candidate.id)?;
        if candidate.bounds.intersects_ray(&local).is_none() {
            continue;
        }
        let Some(point) = candidate.surface.intersect(propagation.params, &local) else {
            continue;
        };
        let distance = (point - local.origin).magnitude();
        if distance > max_distance || best.as_ref().is_some_and(|b| b.distance <= distance) {
            continue;
        }
        best = Some(Hit {
            id: candidate.id,
            surface: candidate.surface,
            local,
            point,
            distance,
        });
    }
    Ok(best)
}
