use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use worldsync_common::EntityId;
use worldsync_kernel::World;

use crate::config::SyncConfig;
use crate::priority::{DefaultPriorityProvider, PriorityProvider};
use crate::task::{PlayerSynchronizationTask, SyncStats};
use crate::timer::TickTimer;
use crate::transport::MessageSink;
use crate::view::LocalView;

/// Number of ticks kept for timing statistics.
const TIMER_HISTORY: usize = 100;

/// Aggregate statistics for one synchronization tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub observers: usize,
    pub added: usize,
    pub removed: usize,
    /// Observers whose view hit its capacity ceiling.
    pub excessive: usize,
    pub elapsed: Duration,
    pub over_budget: bool,
}

impl std::fmt::Display for TickReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tick={} observers={} added={} removed={} excessive={} elapsed={:?}",
            self.tick, self.observers, self.added, self.removed, self.excessive, self.elapsed
        )?;
        if self.over_budget {
            write!(f, " (over budget)")?;
        }
        Ok(())
    }
}

/// A local view and the player registration it was built for.
#[derive(Debug)]
struct ObserverView {
    registration: u64,
    view: LocalView,
}

/// Runs view synchronization for every player once per tick.
///
/// A tick has three phases. Pre-sync adapts viewing distances and decides
/// region changes. Sync runs one [`PlayerSynchronizationTask`] per player in
/// parallel against a shared world. Post-sync records capacity pressure and
/// clears every mob's transient state.
pub struct ClientSynchronizer<P = DefaultPriorityProvider> {
    config: SyncConfig,
    priority: P,
    views: BTreeMap<EntityId, ObserverView>,
    timer: TickTimer,
}

impl ClientSynchronizer<DefaultPriorityProvider> {
    pub fn new(config: SyncConfig) -> Self {
        Self::with_priority_provider(config, DefaultPriorityProvider)
    }
}

impl<P: PriorityProvider> ClientSynchronizer<P> {
    pub fn with_priority_provider(config: SyncConfig, priority: P) -> Self {
        Self {
            priority,
            views: BTreeMap::new(),
            timer: TickTimer::new(TIMER_HISTORY, config.tick_budget()),
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The local view of `observer`, if it has been synchronized at least once.
    pub fn view(&self, observer: EntityId) -> Option<&LocalView> {
        self.views.get(&observer).map(|v| &v.view)
    }

    /// Timing of recent ticks.
    pub fn timer(&self) -> &TickTimer {
        &self.timer
    }

    /// Synchronize every active player and hand each message to `sink`.
    pub fn synchronize(&mut self, world: &mut World, sink: &impl MessageSink) -> TickReport {
        let _span = tracing::info_span!("client_sync", tick = world.tick()).entered();
        let start = Instant::now();

        self.prepare(world);
        let outcomes = self.sync_all(world, sink);
        self.finish(world, &outcomes);

        let elapsed = start.elapsed();
        let over_budget = self.timer.record(elapsed);
        if over_budget {
            tracing::warn!(
                ?elapsed,
                budget = ?self.timer.budget(),
                overruns = self.timer.overruns(),
                "synchronization overran tick budget"
            );
        }

        let report = TickReport {
            tick: world.tick(),
            observers: outcomes.len(),
            added: outcomes.iter().map(|(_, s)| s.added).sum(),
            removed: outcomes.iter().map(|(_, s)| s.removed).sum(),
            excessive: outcomes.iter().filter(|(_, s)| s.excessive).count(),
            elapsed,
            over_budget,
        };
        if report.excessive > 0 {
            tracing::warn!(
                excessive = report.excessive,
                observers = report.observers,
                "local views at capacity, mobs left waiting"
            );
        }
        tracing::trace!(%report, "client sync complete");
        report
    }

    fn prepare(&mut self, world: &mut World) {
        let default_distance = self.config.default_viewing_distance;
        for mob in world.mobs_mut().filter(|m| m.active) {
            let teleporting = mob.teleporting;
            let position = mob.position;
            let Some(player) = mob.as_player_mut() else {
                continue;
            };

            if teleporting {
                player.reset_viewing_distance(default_distance);
            } else if player.excessive_players() {
                player.decrement_viewing_distance();
            } else {
                player.increment_viewing_distance(default_distance);
            }
            player.reset_excessive_players();

            if teleporting || position.region_change_needed(&player.last_known_region) {
                player.region_changed = true;
                player.last_known_region = position;
            }
        }

        // A reused index belongs to a new client whose view starts empty.
        let players: BTreeMap<EntityId, u64> = world
            .active_mobs()
            .filter(|m| m.is_player())
            .map(|m| (m.id, m.registration()))
            .collect();
        self.views.retain(|id, v| players.get(id) == Some(&v.registration));
        for (id, registration) in players {
            self.views.entry(id).or_insert_with(|| ObserverView {
                registration,
                view: LocalView::new(),
            });
        }
    }

    fn sync_all(&mut self, world: &World, sink: &impl MessageSink) -> Vec<(EntityId, SyncStats)> {
        let config = &self.config;
        let priority = &self.priority;
        self.views
            .par_iter_mut()
            .filter_map(|(&id, observer)| {
                let task = PlayerSynchronizationTask::new(world, id, config, priority)?;
                let outcome = task.run(&mut observer.view);
                sink.send(id, outcome.message);
                Some((id, outcome.stats))
            })
            .collect()
    }

    fn finish(&self, world: &mut World, outcomes: &[(EntityId, SyncStats)]) {
        for (id, _) in outcomes.iter().filter(|(_, s)| s.excessive) {
            if let Some(player) = world.get_mut(*id).and_then(|m| m.as_player_mut()) {
                player.flag_excessive_players();
            }
        }
        for mob in world.mobs_mut() {
            mob.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::PlayerSynchronizationMessage;
    use crate::segment::{SegmentType, SynchronizationSegment};
    use crate::transport::ChannelSink;
    use std::sync::Mutex;
    use worldsync_common::{Direction, Position};
    use worldsync_kernel::{BlockKind, Npc, Player};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(EntityId, PlayerSynchronizationMessage)>>);

    impl MessageSink for Recorder {
        fn send(&self, observer: EntityId, message: PlayerSynchronizationMessage) {
            self.0.lock().unwrap().push((observer, message));
        }
    }

    impl Recorder {
        fn take(&self, observer: EntityId) -> PlayerSynchronizationMessage {
            let mut messages = self.0.lock().unwrap();
            let pos = messages.iter().position(|(id, _)| *id == observer).unwrap();
            messages.remove(pos).1
        }
    }

    fn crowd(world: &mut World, count: usize, origin: Position) -> Vec<EntityId> {
        (0..count)
            .map(|i| {
                let pos = Position::new(origin.x() + (i % 7) as i32, origin.y() + (i / 7) as i32);
                world
                    .spawn_player(Player::new(format!("p{i}")), pos)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn every_player_gets_one_message() {
        let mut world = World::new();
        let ids = crowd(&mut world, 6, Position::new(3200, 3200));
        world.spawn_npc(Npc { type_id: 1 }, Position::new(3201, 3201)).unwrap();

        let mut sync = ClientSynchronizer::new(SyncConfig::default());
        let (sink, rx) = ChannelSink::new();
        let report = sync.synchronize(&mut world, &sink);

        assert_eq!(report.observers, 6);
        assert_eq!(rx.len(), 6);
        // everyone sees the five others plus the npc
        assert_eq!(report.added, 6 * 6);
        for id in ids {
            assert_eq!(sync.view(id).unwrap().len(), 6);
        }
    }

    #[test]
    fn first_tick_teleports_then_settles() {
        let mut world = World::new();
        let ids = crowd(&mut world, 2, Position::new(3200, 3200));
        let mut sync = ClientSynchronizer::new(SyncConfig::default());
        let sink = Recorder::default();

        sync.synchronize(&mut world, &sink);
        let first = sink.take(ids[0]);
        assert_eq!(first.segment.segment_type(), SegmentType::Teleport);
        assert!(first.region_changed);

        world.step();
        world.get_mut(ids[0]).unwrap().walk_one(Direction::East);
        sync.synchronize(&mut world, &sink);
        let second = sink.take(ids[0]);
        assert_eq!(second.segment.segment_type(), SegmentType::Walk);
        assert!(!second.region_changed);
        assert_eq!(second.local_mobs, 1);
        assert_eq!(second.segments.len(), 1);
        assert_eq!(second.segments[0].segment_type(), SegmentType::NoMovement);
    }

    #[test]
    fn post_phase_resets_transient_state() {
        let mut world = World::new();
        let ids = crowd(&mut world, 1, Position::new(3200, 3200));
        world
            .get_mut(ids[0])
            .unwrap()
            .add_block(worldsync_kernel::SynchronizationBlock::ForceChat("x".into()));

        let mut sync = ClientSynchronizer::new(SyncConfig::default());
        sync.synchronize(&mut world, &Recorder::default());

        let mob = world.get(ids[0]).unwrap();
        assert!(!mob.teleporting);
        assert!(mob.block_set().is_empty());
        assert!(!mob.as_player().unwrap().region_changed);
    }

    #[test]
    fn walking_off_the_map_changes_region() {
        let mut world = World::new();
        let ids = crowd(&mut world, 1, Position::new(3222, 3222));
        let mut sync = ClientSynchronizer::new(SyncConfig::default());
        let sink = Recorder::default();
        sync.synchronize(&mut world, &sink);
        sink.take(ids[0]);

        world.get_mut(ids[0]).unwrap().position = Position::new(3256, 3222);
        sync.synchronize(&mut world, &sink);
        let message = sink.take(ids[0]);
        assert!(message.region_changed);
        assert_eq!(message.last_known_region, Position::new(3256, 3222));
        assert_eq!(message.segment.segment_type(), SegmentType::Teleport);
    }

    #[test]
    fn crowding_shrinks_viewing_distance_and_relief_restores_it() {
        let mut world = World::new();
        let ids = crowd(&mut world, 8, Position::new(3200, 3200));
        let config = SyncConfig {
            max_local_mobs: 3,
            ..SyncConfig::default()
        };
        let mut sync = ClientSynchronizer::new(config);
        let sink = Recorder::default();

        let report = sync.synchronize(&mut world, &sink);
        assert_eq!(report.excessive, 8);
        assert!(world.get(ids[0]).unwrap().as_player().unwrap().excessive_players());

        sync.synchronize(&mut world, &sink);
        let distance = world
            .get(ids[0])
            .unwrap()
            .as_player()
            .unwrap()
            .viewing_distance();
        assert_eq!(distance, 14);

        for id in &ids[1..] {
            world.despawn(*id);
        }
        // one more shrink for the last crowded tick, then one tile back per tick
        for _ in 0..3 {
            sync.synchronize(&mut world, &sink);
        }
        let distance = world
            .get(ids[0])
            .unwrap()
            .as_player()
            .unwrap()
            .viewing_distance();
        assert_eq!(distance, 15);
    }

    #[test]
    fn departed_players_lose_their_view() {
        let mut world = World::new();
        let ids = crowd(&mut world, 3, Position::new(3200, 3200));
        let mut sync = ClientSynchronizer::new(SyncConfig::default());
        sync.synchronize(&mut world, &Recorder::default());
        assert!(sync.view(ids[2]).is_some());

        world.deactivate(ids[2]).unwrap();
        let report = sync.synchronize(&mut world, &Recorder::default());
        assert!(sync.view(ids[2]).is_none());
        assert_eq!(report.observers, 2);
        assert_eq!(report.removed, 2);
    }

    #[test]
    fn timer_records_each_tick() {
        let mut world = World::new();
        crowd(&mut world, 2, Position::new(0, 0));
        let mut sync = ClientSynchronizer::new(SyncConfig::default());
        for _ in 0..3 {
            let report = sync.synchronize(&mut world, &Recorder::default());
            assert!(!report.over_budget);
        }
        assert_eq!(sync.timer().count(), 3);
        assert_eq!(sync.timer().overruns(), 0);
        assert_eq!(sync.timer().budget(), Duration::from_millis(600));
    }

    #[test]
    fn reused_index_starts_with_an_empty_view() {
        let mut world = World::new();
        let ids = crowd(&mut world, 2, Position::new(3200, 3200));
        let mut sync = ClientSynchronizer::new(SyncConfig::default());
        let sink = Recorder::default();
        for _ in 0..2 {
            sync.synchronize(&mut world, &sink);
            world.step();
        }
        assert_eq!(sync.view(ids[0]).unwrap().len(), 1);

        world.despawn(ids[0]);
        let newcomer = world
            .spawn_player(Player::new("newcomer"), Position::new(3201, 3200))
            .unwrap();
        assert_eq!(newcomer, ids[0]);

        let sink = Recorder::default();
        sync.synchronize(&mut world, &sink);

        let fresh = sink.take(newcomer);
        assert_eq!(fresh.local_mobs, 0);
        assert_eq!(fresh.segments.len(), 1);
        match &fresh.segments[0] {
            SynchronizationSegment::AddMob { id, blocks, .. } => {
                assert_eq!(*id, ids[1]);
                assert!(blocks.contains(BlockKind::Appearance));
            }
            other => panic!("expected an addition, got {other:?}"),
        }
        assert_eq!(sync.view(newcomer).unwrap().as_slice(), &[ids[1]]);

        // the old occupant of the index leaves the other view; the newcomer
        // is only admitted once it has stopped teleporting
        let neighbour = sink.take(ids[1]);
        let types: Vec<SegmentType> = neighbour
            .segments
            .iter()
            .map(|s| s.segment_type())
            .collect();
        assert_eq!(types, vec![SegmentType::RemoveMob]);
    }
}
