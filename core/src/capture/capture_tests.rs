//! Tests for the passive capture hook

use std::time::Duration;

use halo_types::{DispelType, EngineTuning, GroupKind, RoleSlot};

use super::{CaptureOutcome, capture_all, capture_frame};
use crate::access::InstanceId;
use crate::engine::AuraEngine;
use crate::host::{ForeignEvent, ForeignFrameId, RefreshRequest, SurfaceId};
use crate::sim::{Sim, SimChild, SimFrame, SimSurface, SimWorld};
use crate::state::AuraStateCache;

fn ids(values: &[u64]) -> Vec<InstanceId> {
    values.iter().copied().map(InstanceId).collect()
}

fn sorted<'a>(set: impl IntoIterator<Item = &'a InstanceId>) -> Vec<InstanceId> {
    let mut v: Vec<_> = set.into_iter().copied().collect();
    v.sort();
    v
}

fn world() -> SimWorld {
    let mut world = SimWorld::default();
    world.add_unit(RoleSlot::Player, "Player-1");
    world.add_unit(RoleSlot::Party(1), "Player-2");
    world.add_unit(RoleSlot::Party(2), "Player-3");
    world
}

// ─────────────────────────────────────────────────────────────────────────────
// Single frame
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_capture_classifies_shown_children() {
    let world = world();
    let mut sim = Sim::new();
    let mut frame = SimFrame::new(10, RoleSlot::Party(2), GroupKind::Party);
    frame.buffs = vec![SimChild::shown(1), SimChild::hidden(2), SimChild::shown(3)];
    frame.debuffs = vec![SimChild::shown(4)];
    frame.dispel_debuffs = vec![
        SimChild::shown(5).with_attribute("Curse").with_field("Magic"),
        SimChild::shown(6).with_field("Poison"),
        SimChild::hidden(7).with_attribute("Disease"),
    ];
    frame.defensive = vec![SimChild::shown(8)];
    sim.foreign.add(frame);

    let mut cache = AuraStateCache::new();
    let outcome = capture_frame(&sim.foreign, &world, &mut cache, ForeignFrameId(10), Duration::from_secs(3));
    assert_eq!(outcome, CaptureOutcome::Captured(RoleSlot::Party(2)));

    let entry = cache.get(RoleSlot::Party(2)).unwrap();
    assert_eq!(sorted(&entry.buffs), ids(&[1, 3]));
    assert_eq!(sorted(&entry.debuffs), ids(&[4, 5, 6]));
    assert_eq!(sorted(&entry.dispellable), ids(&[5, 6]));
    assert_eq!(sorted(&entry.defensives), ids(&[8]));
    assert_eq!(entry.dispel_type_by_instance.get(&InstanceId(5)), Some(&DispelType::Curse));
    assert_eq!(entry.dispel_type_by_instance.get(&InstanceId(6)), Some(&DispelType::Poison));
    assert!(!entry.has_dispel_type(DispelType::Disease));
    assert_eq!(entry.updated_at, Duration::from_secs(3));
}

#[test]
fn test_unreadable_instance_ids_are_skipped() {
    let world = world();
    let mut sim = Sim::new();
    let mut frame = SimFrame::new(10, RoleSlot::Player, GroupKind::Party);
    let mut secret = SimChild::shown(11);
    secret.secret = true;
    let mut missing = SimChild::shown(0);
    missing.instance_id = None;
    frame.buffs = vec![secret, missing, SimChild::shown(0), SimChild::shown(12)];
    sim.foreign.add(frame);

    let mut cache = AuraStateCache::new();
    capture_frame(&sim.foreign, &world, &mut cache, ForeignFrameId(10), Duration::ZERO);

    assert_eq!(sorted(&cache.get(RoleSlot::Player).unwrap().buffs), ids(&[12]));
}

#[test]
fn test_frame_level_flags_merge_into_types() {
    let world = world();
    let mut sim = Sim::new();
    let mut frame = SimFrame::new(10, RoleSlot::Party(1), GroupKind::Party);
    frame.dispel_flags = vec!["Magic".into(), "bogus".into()];
    sim.foreign.add(frame);

    let mut cache = AuraStateCache::new();
    capture_frame(&sim.foreign, &world, &mut cache, ForeignFrameId(10), Duration::ZERO);

    let entry = cache.get(RoleSlot::Party(1)).unwrap();
    assert!(entry.has_dispel_type(DispelType::Magic));
    assert_eq!(entry.dispel_types.len(), 1);
    assert!(entry.dispellable.is_empty());
}

#[test]
fn test_recapture_drops_stale_members() {
    let world = world();
    let mut sim = Sim::new();
    let mut frame = SimFrame::new(10, RoleSlot::Party(1), GroupKind::Party);
    frame.buffs = vec![SimChild::shown(1), SimChild::shown(2)];
    frame.dispel_debuffs = vec![SimChild::shown(3).with_attribute("Magic")];
    sim.foreign.add(frame);

    let mut cache = AuraStateCache::new();
    capture_frame(&sim.foreign, &world, &mut cache, ForeignFrameId(10), Duration::from_secs(1));

    let frame = sim.foreign.frame_mut(10).unwrap();
    frame.buffs = vec![SimChild::shown(2)];
    frame.dispel_debuffs.clear();
    capture_frame(&sim.foreign, &world, &mut cache, ForeignFrameId(10), Duration::from_secs(2));

    let entry = cache.get(RoleSlot::Party(1)).unwrap();
    assert_eq!(sorted(&entry.buffs), ids(&[2]));
    assert!(entry.debuffs.is_empty());
    assert!(entry.dispel_type_by_instance.is_empty());
    assert!(!entry.has_dispel_type(DispelType::Magic));
}

#[test]
fn test_missing_unit_leaves_cache_untouched() {
    let mut world = world();
    let mut sim = Sim::new();
    let mut frame = SimFrame::new(10, RoleSlot::Party(1), GroupKind::Party);
    frame.buffs = vec![SimChild::shown(1)];
    sim.foreign.add(frame);

    let mut cache = AuraStateCache::new();
    capture_frame(&sim.foreign, &world, &mut cache, ForeignFrameId(10), Duration::from_secs(1));
    let before = cache.get(RoleSlot::Party(1)).cloned();

    world.remove_unit(RoleSlot::Party(1));
    sim.foreign.frame_mut(10).unwrap().buffs.clear();
    let outcome = capture_frame(&sim.foreign, &world, &mut cache, ForeignFrameId(10), Duration::from_secs(2));

    assert_eq!(outcome, CaptureOutcome::Missing(RoleSlot::Party(1)));
    assert_eq!(cache.get(RoleSlot::Party(1)).cloned(), before);
}

#[test]
fn test_missing_unit_never_creates_entry() {
    let world = SimWorld::default();
    let mut sim = Sim::new();
    sim.foreign.add(SimFrame::new(10, RoleSlot::Party(3), GroupKind::Party));

    let mut cache = AuraStateCache::new();
    let outcome = capture_frame(&sim.foreign, &world, &mut cache, ForeignFrameId(10), Duration::ZERO);

    assert_eq!(outcome, CaptureOutcome::Missing(RoleSlot::Party(3)));
    assert!(cache.is_empty());
}

#[test]
fn test_unbound_frame_is_unresolved() {
    let world = world();
    let mut sim = Sim::new();
    let mut frame = SimFrame::new(10, RoleSlot::Player, GroupKind::Party);
    frame.unit = Some("target".to_string());
    sim.foreign.add(frame);
    sim.foreign.add(SimFrame::container(11, GroupKind::Party));

    let mut cache = AuraStateCache::new();
    for id in [10, 11, 99] {
        let outcome = capture_frame(&sim.foreign, &world, &mut cache, ForeignFrameId(id), Duration::ZERO);
        assert_eq!(outcome, CaptureOutcome::Unresolved);
    }
    assert!(cache.is_empty());
}

#[test]
fn test_faulting_frame_keeps_previous_entry() {
    let world = world();
    let mut sim = Sim::new();
    let mut frame = SimFrame::new(10, RoleSlot::Party(2), GroupKind::Party);
    frame.buffs = vec![SimChild::shown(1)];
    sim.foreign.add(frame);

    let mut cache = AuraStateCache::new();
    capture_frame(&sim.foreign, &world, &mut cache, ForeignFrameId(10), Duration::from_secs(1));

    sim.foreign.frame_mut(10).unwrap().faulty = true;
    let outcome = capture_frame(&sim.foreign, &world, &mut cache, ForeignFrameId(10), Duration::from_secs(2));

    assert_eq!(outcome, CaptureOutcome::Faulted(RoleSlot::Party(2)));
    let entry = cache.get(RoleSlot::Party(2)).unwrap();
    assert_eq!(sorted(&entry.buffs), ids(&[1]));
    assert_eq!(entry.updated_at, Duration::from_secs(1));
}

// ─────────────────────────────────────────────────────────────────────────────
// Full scan
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_capture_all_walks_primary_then_raid_pool() {
    let mut world = world();
    world.add_unit(RoleSlot::Raid(6), "Player-9");
    let mut sim = Sim::new();
    sim.foreign.add(SimFrame::new(30, RoleSlot::Raid(6), GroupKind::Raid));
    sim.foreign.add(SimFrame::new(20, RoleSlot::Raid(12), GroupKind::Raid));
    sim.foreign.add(SimFrame::new(1, RoleSlot::Player, GroupKind::Party));
    sim.foreign.add(SimFrame::new(2, RoleSlot::Party(1), GroupKind::Party));
    let mut broken = SimFrame::new(3, RoleSlot::Party(2), GroupKind::Party);
    broken.faulty = true;
    sim.foreign.add(broken);
    sim.foreign.add(SimFrame::container(40, GroupKind::Raid));

    let mut cache = AuraStateCache::new();
    let mut order = Vec::new();
    let report = capture_all(&sim.foreign, &world, &mut cache, Duration::ZERO, |slot| order.push(slot));

    assert_eq!(order, vec![RoleSlot::Player, RoleSlot::Party(1), RoleSlot::Raid(6)]);
    assert_eq!(report.visited, 5);
    assert_eq!(report.captured, 3);
    assert_eq!(report.faulted, 1);
    assert_eq!(report.missing, 1);
    assert_eq!(report.unresolved, 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine hooks
// ─────────────────────────────────────────────────────────────────────────────

fn hooked_sim() -> Sim {
    let mut sim = Sim::new();
    sim.world = world();
    let mut frame = SimFrame::new(10, RoleSlot::Party(1), GroupKind::Party);
    frame.buffs = vec![SimChild::shown(1)];
    sim.foreign.add(frame);
    sim.render.add(SimSurface::new(5, RoleSlot::Party(1), GroupKind::Party));
    sim
}

#[test]
fn test_refresh_hook_captures_and_notifies() {
    let mut sim = hooked_sim();
    let mut engine = AuraEngine::new(EngineTuning::default(), &sim.host());

    let outcome = engine.on_foreign_aura_refresh(&mut sim.host(), ForeignFrameId(10));

    assert!(outcome.is_captured());
    assert!(engine.cache.get(RoleSlot::Party(1)).is_some());
    assert_eq!(
        sim.render.refreshes_for(RoleSlot::Party(1)),
        vec![(SurfaceId(5), RefreshRequest::AURAS)]
    );
}

#[test]
fn test_refresh_hook_without_notification() {
    let mut sim = hooked_sim();
    let tuning = EngineTuning {
        notify_on_capture: false,
        ..EngineTuning::default()
    };
    let mut engine = AuraEngine::new(tuning, &sim.host());

    engine.on_foreign_aura_refresh(&mut sim.host(), ForeignFrameId(10));

    assert!(engine.cache.get(RoleSlot::Party(1)).is_some());
    assert!(sim.render.refreshes.is_empty());
}

#[test]
fn test_unit_event_hook_only_recaptures_on_aura_events() {
    let mut sim = hooked_sim();
    let mut engine = AuraEngine::new(EngineTuning::default(), &sim.host());

    for event in [ForeignEvent::UnitHealth, ForeignEvent::UnitName, ForeignEvent::Other] {
        assert_eq!(engine.on_foreign_unit_event(&mut sim.host(), ForeignFrameId(10), event), None);
    }
    assert!(engine.cache.is_empty());

    let outcome = engine.on_foreign_unit_event(&mut sim.host(), ForeignFrameId(10), ForeignEvent::UnitAura);
    assert_eq!(outcome, Some(CaptureOutcome::Captured(RoleSlot::Party(1))));
}
