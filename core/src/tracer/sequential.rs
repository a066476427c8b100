use super::Propagation;
use crate::element::ElementKind;
use crate::error::TraceError;
use crate::ray::RayId;
use crate::sequence::{Sequence, SequenceEntry};
use crate::surface::Surface;

/// Pushes ray batches through the sequence: each surface consumes the whole
/// output of the previous stage, sources append their rays to the batch.
pub(super) fn trace(propagation: &mut Propagation) -> Result<(), TraceError> {
    let system = propagation.system;
    let params = propagation.params;
    let built;
    let sequence = match &params.sequence {
        Some(sequence) => sequence,
        None => {
            built = Sequence::from_system(system)?;
            &built
        }
    };

    let mut batch: Vec<RayId> = Vec::new();
    for (index, entry) in sequence.entries().iter().enumerate() {
        let element = system.element(entry.element)?;
        if !system.is_enabled_in_tree(entry.element) {
            log::debug!("Skipping disabled element {} in sequence", entry.element);
            continue;
        }

        match element.kind() {
            ElementKind::Source(source) => {
                let rays = propagation.emit_source(entry.element, source, Some((sequence, index)))?;
                batch.extend(rays);
            }
            ElementKind::Surface(surface) => {
                batch = process_stage(propagation, entry, surface, &batch)?;
            }
            ElementKind::Group(_) => {
                log::debug!("Group {} in sequence has no effect", entry.element);
            }
        }
    }
    Ok(())
}

/// Rays travelling against the direction of the entry never reach it and are lost.
fn process_stage(
    propagation: &mut Propagation,
    entry: &SequenceEntry,
    surface: &Surface,
    batch: &[RayId],
) -> Result<Vec<RayId>, TraceError> {
    let id = entry.element;
    let to_system = propagation.system.get_global_transform(id)?;
    let mut next = Vec::with_capacity(batch.len());
    for &ray_id in batch {
        let local = propagation.ray_in(ray_id, id)?;
        let heading_back = to_system.apply_vector(local.direction).z < 0.0;
        if heading_back != entry.reversed {
            log::trace!("Ray {} travels against sequence entry {}", ray_id, id);
            propagation.mark_lost(ray_id);
            continue;
        }
        match surface.intersect(propagation.params, &local) {
            Some(point) => {
                if let Some(child) = propagation.process_hit(ray_id, id, surface, &local, point) {
                    next.push(child);
                }
            }
            None => propagation.mark_lost(ray_id),
        }
    }
    log::trace!("Surface {} passed {} of {} rays", id, next.len(), batch.len());
    Ok(next)
}
