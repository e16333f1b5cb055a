//! Sequencer - resolves "what plays next"
//!
//! Sequential order walks the catalog with wrap-around. Shuffled order walks
//! a [`ShuffleQueue`] that exists only while shuffle is on.

use crate::shuffle::ShuffleQueue;
use crate::types::PlaybackOrder;
use rand::Rng;
use reverie_catalog::{Catalog, Track, TrackId};
use std::sync::Arc;
use tracing::debug;

/// Next/previous resolution over a shared catalog
#[derive(Debug, Clone)]
pub struct Sequencer {
    catalog: Arc<Catalog>,
    shuffle: Option<ShuffleQueue>,
}

impl Sequencer {
    /// Sequencer in sequential order
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            shuffle: None,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn order(&self) -> PlaybackOrder {
        if self.shuffle.is_some() {
            PlaybackOrder::Shuffled
        } else {
            PlaybackOrder::Sequential
        }
    }

    pub fn shuffle_queue(&self) -> Option<&ShuffleQueue> {
        self.shuffle.as_ref()
    }

    /// Track that `next` would return, without moving anything
    pub fn peek_next(&self, current: Option<TrackId>) -> Option<&Track> {
        let id = self.resolve(current, Direction::Forward)?;
        self.catalog.get(id)
    }

    /// Track that `previous` would return, without moving anything
    pub fn peek_previous(&self, current: Option<TrackId>) -> Option<&Track> {
        let id = self.resolve(current, Direction::Backward)?;
        self.catalog.get(id)
    }

    /// Advance past `current`, moving the shuffle index onto the result
    pub fn next(&mut self, current: Option<TrackId>) -> Option<Track> {
        self.step(current, Direction::Forward)
    }

    /// Retreat before `current`, moving the shuffle index onto the result
    pub fn previous(&mut self, current: Option<TrackId>) -> Option<Track> {
        self.step(current, Direction::Backward)
    }

    /// Point the shuffle index at a directly selected track.
    ///
    /// No-op in sequential order, where position is derived from the
    /// current track alone.
    pub fn relocate(&mut self, id: TrackId) {
        if let Some(queue) = self.shuffle.as_mut() {
            queue.relocate(id);
        }
    }

    /// Build a fresh permutation.
    ///
    /// The index starts on `current` when it is in the catalog, otherwise 0.
    pub fn enable_shuffle<R: Rng + ?Sized>(&mut self, current: Option<TrackId>, rng: &mut R) {
        let mut queue = ShuffleQueue::generate(self.catalog.ids(), rng);
        if let Some(id) = current {
            queue.relocate(id);
        }
        debug!(tracks = queue.len(), index = queue.index(), "Shuffle enabled");
        self.shuffle = Some(queue);
    }

    /// Drop the permutation and return to catalog order
    pub fn disable_shuffle(&mut self) {
        if self.shuffle.take().is_some() {
            debug!("Shuffle disabled");
        }
    }

    /// Swap in a refetched catalog.
    ///
    /// A live permutation is regenerated so it covers exactly the new tracks.
    pub fn set_catalog<R: Rng + ?Sized>(
        &mut self,
        catalog: Arc<Catalog>,
        current: Option<TrackId>,
        rng: &mut R,
    ) {
        self.catalog = catalog;
        if self.shuffle.is_some() {
            self.enable_shuffle(current, rng);
        }
    }

    /// Tracks in the order next/previous walk them
    pub fn display_order(&self) -> Vec<&Track> {
        match &self.shuffle {
            Some(queue) => queue
                .order()
                .iter()
                .filter_map(|id| self.catalog.get(*id))
                .collect(),
            None => self.catalog.tracks().iter().collect(),
        }
    }

    fn step(&mut self, current: Option<TrackId>, direction: Direction) -> Option<Track> {
        let id = self.resolve(current, direction)?;
        if let Some(queue) = self.shuffle.as_mut() {
            queue.relocate(id);
        }
        self.catalog.get(id).cloned()
    }

    fn resolve(&self, current: Option<TrackId>, direction: Direction) -> Option<TrackId> {
        if self.catalog.is_empty() {
            return None;
        }

        match &self.shuffle {
            Some(queue) => match (current, direction) {
                (None, _) => queue.current(),
                (Some(_), Direction::Forward) => queue.peek_after(current),
                (Some(_), Direction::Backward) => queue.peek_before(current),
            },
            None => {
                let len = self.catalog.len();
                let index = match current.and_then(|id| self.catalog.position(id)) {
                    Some(i) => match direction {
                        Direction::Forward => (i + 1) % len,
                        Direction::Backward => (i + len - 1) % len,
                    },
                    None => 0,
                };
                self.catalog.at(index).map(|t| t.id)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn create_catalog(n: u64) -> Arc<Catalog> {
        let tracks = (1..=n)
            .map(|i| Track {
                id: TrackId::new(i),
                title: format!("Track {}", i),
                artist: "Artist".to_string(),
                duration_seconds: 180.0,
                source_locator: format!("/music/{}.mp3", i),
                cover_art: None,
            })
            .collect();
        Arc::new(Catalog::new(tracks).unwrap())
    }

    fn id(n: u64) -> Option<TrackId> {
        Some(TrackId::new(n))
    }

    #[test]
    fn sequential_wraps_both_ways() {
        let sequencer = Sequencer::new(create_catalog(3));

        assert_eq!(sequencer.peek_next(id(1)).unwrap().id, TrackId::new(2));
        assert_eq!(sequencer.peek_next(id(3)).unwrap().id, TrackId::new(1));
        assert_eq!(sequencer.peek_previous(id(1)).unwrap().id, TrackId::new(3));
        assert_eq!(sequencer.peek_previous(id(2)).unwrap().id, TrackId::new(1));
    }

    #[test]
    fn unknown_current_wraps_to_first() {
        let sequencer = Sequencer::new(create_catalog(3));

        assert_eq!(sequencer.peek_next(id(42)).unwrap().id, TrackId::new(1));
        assert_eq!(sequencer.peek_previous(id(42)).unwrap().id, TrackId::new(1));
        assert_eq!(sequencer.peek_next(None).unwrap().id, TrackId::new(1));
    }

    #[test]
    fn empty_catalog_has_nothing_to_play() {
        let mut sequencer = Sequencer::new(Arc::new(Catalog::empty()));
        assert!(sequencer.next(None).is_none());
        assert!(sequencer.previous(id(1)).is_none());

        sequencer.enable_shuffle(None, &mut StdRng::seed_from_u64(3));
        assert!(sequencer.next(None).is_none());
        assert!(sequencer.previous(None).is_none());
    }

    #[test]
    fn single_track_loops() {
        let mut sequencer = Sequencer::new(create_catalog(1));
        assert_eq!(sequencer.next(id(1)).unwrap().id, TrackId::new(1));
        assert_eq!(sequencer.previous(id(1)).unwrap().id, TrackId::new(1));

        sequencer.enable_shuffle(id(1), &mut StdRng::seed_from_u64(3));
        assert_eq!(sequencer.next(id(1)).unwrap().id, TrackId::new(1));
    }

    #[test]
    fn shuffle_starts_at_current_track() {
        let mut sequencer = Sequencer::new(create_catalog(10));
        sequencer.enable_shuffle(id(7), &mut StdRng::seed_from_u64(11));

        let queue = sequencer.shuffle_queue().unwrap();
        assert_eq!(queue.current(), Some(TrackId::new(7)));
        assert_eq!(sequencer.order(), PlaybackOrder::Shuffled);
    }

    #[test]
    fn shuffled_next_follows_permutation() {
        let mut sequencer = Sequencer::new(create_catalog(5));
        sequencer.enable_shuffle(None, &mut StdRng::seed_from_u64(5));
        let order: Vec<TrackId> = sequencer.shuffle_queue().unwrap().order().to_vec();

        let mut current = order[0];
        for expected in order.iter().skip(1).chain(order.iter().take(1)) {
            current = sequencer.next(Some(current)).unwrap().id;
            assert_eq!(current, *expected);
        }
    }

    #[test]
    fn relocate_keeps_shuffled_navigation_consistent() {
        let mut sequencer = Sequencer::new(create_catalog(6));
        sequencer.enable_shuffle(None, &mut StdRng::seed_from_u64(9));
        let order: Vec<TrackId> = sequencer.shuffle_queue().unwrap().order().to_vec();

        sequencer.relocate(order[3]);
        assert_eq!(sequencer.shuffle_queue().unwrap().index(), 3);
        assert_eq!(sequencer.peek_next(None).unwrap().id, order[3]);
        assert_eq!(sequencer.next(Some(order[3])).unwrap().id, order[4]);
        assert_eq!(sequencer.shuffle_queue().unwrap().index(), 4);
    }

    #[test]
    fn disable_restores_catalog_order() {
        let catalog = create_catalog(6);
        let mut sequencer = Sequencer::new(catalog.clone());
        sequencer.enable_shuffle(id(2), &mut StdRng::seed_from_u64(1));
        sequencer.disable_shuffle();

        let order: Vec<TrackId> = sequencer.display_order().iter().map(|t| t.id).collect();
        assert_eq!(order, catalog.ids());
        assert_eq!(sequencer.order(), PlaybackOrder::Sequential);
        assert_eq!(sequencer.peek_next(id(2)).unwrap().id, TrackId::new(3));
    }

    #[test]
    fn new_catalog_regenerates_permutation() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut sequencer = Sequencer::new(create_catalog(3));
        sequencer.enable_shuffle(None, &mut rng);

        sequencer.set_catalog(create_catalog(8), id(5), &mut rng);
        let queue = sequencer.shuffle_queue().unwrap();
        assert_eq!(queue.len(), 8);
        assert_eq!(queue.current(), Some(TrackId::new(5)));
        assert_eq!(sequencer.display_order().len(), 8);
    }
}
