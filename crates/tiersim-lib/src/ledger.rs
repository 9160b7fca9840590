//! Cohort bookkeeping for a single simulation run.
//!
//! The ledger knows nothing about pricing or policies. Generations are kept
//! in ascending id order, which is also creation order, so every operation
//! here is deterministic.

use crate::data_structures::{Generation, GenerationId, StorageClass, TierBytes};

#[derive(Debug, Clone, Default)]
pub struct GenerationLedger {
    generations: Vec<Generation>,
    next_id: GenerationId,
}

impl GenerationLedger {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            next_id: 0,
        }
    }

    /// Appends this month's ingestion as Standard, class-age 0 generations:
    /// one for the eligible share and one for the pinned remainder. Empty
    /// parts are skipped. Returns the ids that were created.
    pub fn create(&mut self, month: u32, size: f64, eligible_fraction: f64) -> Vec<GenerationId> {
        let eligible_fraction = eligible_fraction.clamp(0.0, 1.0);
        let eligible_bytes = size * eligible_fraction;
        let pinned_bytes = size - eligible_bytes;

        let mut created = Vec::with_capacity(2);
        for (bytes, eligible) in [(eligible_bytes, true), (pinned_bytes, false)] {
            if bytes > 0.0 {
                let id = self.allocate_id();
                self.generations.push(Generation::new(id, month, bytes, eligible));
                created.push(id);
            }
        }
        created
    }

    /// One simulated month passes for every generation.
    pub fn advance_age(&mut self) {
        for generation in &mut self.generations {
            generation.tick();
        }
    }

    /// Splits `fraction` of a generation's bytes off into a new generation
    /// with identical state. Returns the new id, or `None` if the id is
    /// unknown or the split-off part would be empty.
    pub fn split(&mut self, id: GenerationId, fraction: f64) -> Option<GenerationId> {
        let fraction = fraction.clamp(0.0, 1.0);
        let index = self.position(id)?;

        let parent = &mut self.generations[index];
        let split_bytes = parent.bytes() * fraction;
        if split_bytes <= 0.0 {
            return None;
        }

        let mut child = parent.clone();
        parent.set_bytes(parent.bytes() - split_bytes);
        child.set_bytes(split_bytes);

        let child_id = self.allocate_id();
        child.set_id(child_id);
        self.generations.push(child);
        Some(child_id)
    }

    /// Folds every generation into the first earlier one `interchangeable`
    /// accepts. The survivor keeps the lowest id and the earliest creation
    /// month. Returns how many generations were absorbed.
    pub fn merge_where<F>(&mut self, interchangeable: F) -> usize
    where
        F: Fn(&Generation, &Generation) -> bool,
    {
        let before = self.generations.len();
        let mut merged: Vec<Generation> = Vec::with_capacity(before);

        for generation in self.generations.drain(..) {
            match merged
                .iter_mut()
                .find(|kept| interchangeable(kept, &generation))
            {
                Some(kept) => {
                    kept.add_bytes(generation.bytes());
                    if generation.created_month() < kept.created_month() {
                        kept.set_created_month(generation.created_month());
                    }
                }
                None => merged.push(generation),
            }
        }

        self.generations = merged;
        before - self.generations.len()
    }

    /// Removes generations smaller than `threshold_bytes` and returns their
    /// aggregate size. Each removed generation's bytes are folded into the
    /// largest surviving generation of the same class and eligibility; one
    /// without such a peer stays in the ledger, so no mass is lost.
    pub fn prune(&mut self, threshold_bytes: f64) -> f64 {
        if threshold_bytes <= 0.0 || self.generations.len() < 2 {
            return 0.0;
        }

        let (small, mut kept): (Vec<Generation>, Vec<Generation>) = self
            .generations
            .drain(..)
            .partition(|generation| generation.bytes() < threshold_bytes);

        let mut pruned = 0.0;
        let mut orphans = Vec::new();
        for generation in small {
            let peer = kept
                .iter_mut()
                .filter(|kept| {
                    kept.class() == generation.class()
                        && kept.is_eligible() == generation.is_eligible()
                })
                .max_by(|a, b| a.bytes().total_cmp(&b.bytes()));

            match peer {
                Some(peer) => {
                    peer.add_bytes(generation.bytes());
                    pruned += generation.bytes();
                }
                None => orphans.push(generation),
            }
        }

        kept.extend(orphans);
        kept.sort_by_key(|generation| generation.id());
        self.generations = kept;
        pruned
    }

    pub fn get(&self, id: GenerationId) -> Option<&Generation> {
        self.position(id).map(|index| &self.generations[index])
    }

    pub(crate) fn get_mut(&mut self, id: GenerationId) -> Option<&mut Generation> {
        self.position(id).map(move |index| &mut self.generations[index])
    }

    pub fn ids(&self) -> Vec<GenerationId> {
        self.generations.iter().map(|generation| generation.id()).collect()
    }

    pub fn generations(&self) -> &[Generation] {
        &self.generations
    }

    pub fn bytes_by_class(&self) -> TierBytes {
        let mut tiers = TierBytes::new();
        for generation in &self.generations {
            tiers[generation.class()] += generation.bytes();
        }
        tiers
    }

    pub fn eligible_bytes(&self) -> f64 {
        self.generations
            .iter()
            .filter(|generation| generation.is_eligible())
            .map(|generation| generation.bytes())
            .sum()
    }

    pub fn pinned_bytes(&self) -> f64 {
        self.generations
            .iter()
            .filter(|generation| !generation.is_eligible())
            .map(|generation| generation.bytes())
            .sum()
    }

    pub fn total_bytes(&self) -> f64 {
        self.generations.iter().map(|generation| generation.bytes()).sum()
    }

    pub fn bytes_in(&self, class: StorageClass) -> f64 {
        self.bytes_by_class()[class]
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    fn allocate_id(&mut self) -> GenerationId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn position(&self, id: GenerationId) -> Option<usize> {
        self.generations
            .binary_search_by_key(&id, |generation| generation.id())
            .ok()
    }
}
