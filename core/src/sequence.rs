use serde::{Deserialize, Serialize};

use crate::element::ElementId;
use crate::error::TraceError;
use crate::System;

/// One step of a [`Sequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceEntry {
    pub element: ElementId,
    /// Light reaches the element travelling towards decreasing global Z.
    pub reversed: bool,
}

/// Ordered list of elements visited by sequential propagation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    entries: Vec<SequenceEntry>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a forward step.
    pub fn push(mut self, element: ElementId) -> Self {
        self.add(element, false);
        self
    }

    pub fn add(&mut self, element: ElementId, reversed: bool) {
        self.entries.push(SequenceEntry { element, reversed });
    }

    /// Derives a sequence from the enabled sources and surfaces of `system`.
    ///
    /// The walk starts at the lowest global Z and moves towards +Z. Every
    /// reflecting element turns it around: the elements after it are taken by
    /// decreasing Z and marked `reversed`, until the next reflecting element.
    /// Image surfaces close the sequence. Elements left behind the walk are
    /// not part of the sequence.
    pub fn from_system(system: &System) -> Result<Self, TraceError> {
        let mut pending = Vec::new();
        let mut images = Vec::new();
        for id in system.leaves(true) {
            let z = system.global_position(id)?.z;
            let is_image = system
                .get_element(id)
                .and_then(|e| e.as_surface())
                .is_some_and(|s| s.is_image());
            if is_image {
                images.push((z, id));
            } else {
                pending.push((z, id));
            }
        }

        let mut sequence = Self::new();
        let mut reversed = false;
        let mut cursor = f64::NEG_INFINITY;
        while let Some(index) = next_along(&pending, cursor, reversed) {
            let (z, id) = pending.remove(index);
            sequence.add(id, reversed);
            cursor = z;
            if system.get_element(id).is_some_and(|e| e.is_reflecting()) {
                reversed = !reversed;
            }
        }
        while let Some(index) = next_along(&images, cursor, reversed) {
            let (z, id) = images.remove(index);
            sequence.add(id, reversed);
            cursor = z;
        }

        let skipped = pending.len() + images.len();
        if skipped > 0 {
            log::debug!("{} element(s) out of reach of the sequence", skipped);
        }
        log::debug!("Built sequence of {} elements", sequence.len());
        Ok(sequence)
    }

    pub fn entries(&self) -> &[SequenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.entries.iter().any(|e| e.element == element)
    }

    /// Position of `element` in the sequence.
    pub fn position(&self, element: ElementId) -> Option<usize> {
        self.entries.iter().position(|e| e.element == element)
    }
}

/// Index of the closest candidate at or beyond `cursor` in the walking
/// direction. Ties go to the first candidate.
fn next_along(candidates: &[(f64, ElementId)], cursor: f64, reversed: bool) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &(z, _)) in candidates.iter().enumerate() {
        let ahead = if reversed { z <= cursor } else { z >= cursor };
        let closer = match best {
            None => true,
            Some((_, best_z)) => {
                if reversed {
                    z > best_z
                } else {
                    z < best_z
                }
            }
        };
        if ahead && closer {
            best = Some((index, z));
        }
    }
    best.map(|(index, _)| index)
}
