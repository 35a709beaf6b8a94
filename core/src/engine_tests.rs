//! End-to-end tests for the engine's consumer API

use std::time::Duration;

use halo_types::{DispelType, EngineTuning, GroupKind, RoleSlot, TrackerProfile};

use crate::access::InstanceId;
use crate::context::{MemoryProfileStore, ProfileStore};
use crate::dispatch::GameEvent;
use crate::engine::AuraEngine;
use crate::host::{ForeignFrameId, SurfaceId};
use crate::sim::{Sim, SimAura, SimChild, SimFrame, SimSurface};
use crate::state::AuraKind;

const PARTY2: RoleSlot = RoleSlot::Party(2);
const SURFACE: SurfaceId = SurfaceId(3);

/// Party of three with the local player as a shaman
fn sim() -> Sim {
    let mut sim = Sim::new();
    sim.world.class = Some("SHAMAN".into());
    sim.world.add_unit(RoleSlot::Player, "Player-1");
    sim.world.add_unit(RoleSlot::Party(1), "Player-2");
    sim.world.add_unit(PARTY2, "Player-3");
    sim.render.add(SimSurface::new(1, RoleSlot::Player, GroupKind::Party));
    sim.render.add(SimSurface::new(3, PARTY2, GroupKind::Party));
    sim
}

fn capture_party2(sim: &mut Sim, engine: &mut AuraEngine, frame: SimFrame) {
    sim.foreign.add(frame);
    engine.on_foreign_aura_refresh(&mut sim.host(), ForeignFrameId(20));
}

fn cursed_frame() -> SimFrame {
    let mut frame = SimFrame::new(20, PARTY2, GroupKind::Party);
    frame.debuffs = vec![SimChild::shown(77)];
    frame.dispel_debuffs = vec![SimChild::shown(77).with_attribute("Curse")];
    frame
}

fn sorted(set: impl IntoIterator<Item = InstanceId>) -> Vec<InstanceId> {
    let mut v: Vec<_> = set.into_iter().collect();
    v.sort();
    v
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispel type
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_party_member_curse_is_dispellable() {
    let mut sim = sim();
    let mut engine = AuraEngine::new(EngineTuning::default(), &sim.host());
    capture_party2(&mut sim, &mut engine, cursed_frame());

    let entry = engine.cache().get(PARTY2).unwrap();
    assert_eq!(sorted(entry.debuffs.iter().copied()), vec![InstanceId(77)]);
    assert_eq!(engine.dispellable_type(PARTY2), Some(DispelType::Curse));
    assert_eq!(sim.render.overlay(SURFACE), Some(DispelType::Curse));
}

#[test]
fn test_class_that_cannot_remove_curses_sees_nothing() {
    let mut sim = sim();
    sim.world.class = Some("PRIEST".into());
    let mut engine = AuraEngine::new(EngineTuning::default(), &sim.host());
    capture_party2(&mut sim, &mut engine, cursed_frame());

    assert_eq!(engine.dispellable_type(PARTY2), None);
    assert_eq!(engine.dispellable_type(RoleSlot::Raid(1)), None);
}

// ─────────────────────────────────────────────────────────────────────────────
// Approved sets
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_approved_set_rechecks_secrecy_every_call() {
    let mut sim = sim();
    sim.auras.add(PARTY2, SimAura::buff(5, 50, "Fortitude"));
    sim.auras.add(PARTY2, SimAura::buff(6, 60, "Intellect"));
    let mut engine = AuraEngine::new(EngineTuning::default(), &sim.host());
    let mut frame = SimFrame::new(20, PARTY2, GroupKind::Party);
    frame.buffs = vec![SimChild::shown(5), SimChild::shown(6)];
    capture_party2(&mut sim, &mut engine, frame);

    let before = engine.approved_aura_set(&sim.host(), PARTY2, AuraKind::Buffs).unwrap();
    assert_eq!(sorted(before), vec![InstanceId(5), InstanceId(6)]);

    // Instance 6 turns secret without any new capture
    sim.auras.units.get_mut(&PARTY2).unwrap()[1].secret = true;
    let after = engine.approved_aura_set(&sim.host(), PARTY2, AuraKind::Buffs).unwrap();
    assert_eq!(sorted(after), vec![InstanceId(5)]);

    let payloads = engine.approved_buff_payloads(&sim.host(), PARTY2).unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[&InstanceId(5)].name.as_deref(), Some("Fortitude"));
}

#[test]
fn test_uncaptured_slot_has_no_sets() {
    let mut sim = sim();
    let engine = AuraEngine::new(EngineTuning::default(), &sim.host());

    assert_eq!(engine.approved_aura_set(&sim.host(), PARTY2, AuraKind::Debuffs), None);
    assert_eq!(engine.approved_buff_payloads(&sim.host(), PARTY2), None);
}

#[test]
fn test_empty_capture_yields_empty_sets() {
    let mut sim = sim();
    let mut engine = AuraEngine::new(EngineTuning::default(), &sim.host());
    capture_party2(&mut sim, &mut engine, cursed_frame());

    sim.foreign.frame_mut(20).unwrap().debuffs.clear();
    sim.foreign.frame_mut(20).unwrap().dispel_debuffs.clear();
    engine.on_foreign_aura_refresh(&mut sim.host(), ForeignFrameId(20));

    for kind in AuraKind::ALL {
        let set = engine.approved_aura_set(&sim.host(), PARTY2, kind).unwrap();
        assert!(set.is_empty(), "{kind:?} kept stale ids");
    }
    assert_eq!(engine.dispellable_type(PARTY2), None);
}

// ─────────────────────────────────────────────────────────────────────────────
// Indicators
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_missing_unit_or_preview_clears_indicators() {
    let mut sim = sim();
    sim.auras.add(PARTY2, SimAura::own_buff(8, 80, "Riptide"));
    let mut engine = AuraEngine::new(EngineTuning::default(), &sim.host());
    capture_party2(&mut sim, &mut engine, cursed_frame());
    assert_eq!(sim.render.shown_trackers(SURFACE).len(), 1);

    let overlay = engine.refresh_indicators(&mut sim.host(), SURFACE, PARTY2, true, true);
    assert_eq!(overlay, None);
    assert!(sim.render.shown_trackers(SURFACE).is_empty());
    assert_eq!(sim.render.overlay(SURFACE), None);

    let overlay = engine.refresh_indicators(&mut sim.host(), SURFACE, PARTY2, true, false);
    assert_eq!(overlay, Some(DispelType::Curse));

    let overlay = engine.refresh_indicators(&mut sim.host(), SURFACE, PARTY2, false, false);
    assert_eq!(overlay, None);
    assert!(sim.render.shown_trackers(SURFACE).is_empty());
}

#[test]
fn test_preview_mode_applies_to_dispatch() {
    let mut sim = sim();
    sim.auras.add(PARTY2, SimAura::own_buff(8, 80, "Riptide"));
    let mut engine = AuraEngine::new(EngineTuning::default(), &sim.host());
    engine.set_preview(true);

    capture_party2(&mut sim, &mut engine, cursed_frame());

    assert!(sim.render.shown_trackers(SURFACE).is_empty());
    assert_eq!(sim.render.overlay(SURFACE), None);
}

#[test]
fn test_disabled_profile_keeps_overlay() {
    let mut sim = sim();
    sim.auras.add(PARTY2, SimAura::own_buff(8, 80, "Riptide"));
    let mut engine = AuraEngine::new(EngineTuning::default(), &sim.host());
    let profile = TrackerProfile {
        enabled: false,
        ..TrackerProfile::default()
    };
    engine.set_profile(&sim.host(), profile);

    capture_party2(&mut sim, &mut engine, cursed_frame());

    assert!(sim.render.shown_trackers(SURFACE).is_empty());
    assert_eq!(sim.render.overlay(SURFACE), Some(DispelType::Curse));
}

#[test]
fn test_allow_list_longer_than_cap_shows_at_most_four() {
    let mut sim = sim();
    let names: Vec<String> = (1..=6).map(|n| format!("Spell {n}")).collect();
    for (n, name) in names.iter().enumerate() {
        let n = n as u64 + 1;
        sim.auras.add(PARTY2, SimAura::own_buff(n, 100 + n, name));
        sim.world.icons.insert(name.clone(), 1000 + n);
    }
    let mut engine = AuraEngine::new(EngineTuning::default(), &sim.host());
    engine.set_profile(
        &sim.host(),
        TrackerProfile {
            allowed_spells: names,
            ..TrackerProfile::default()
        },
    );

    for _ in 0..3 {
        engine.dispatch(&mut sim.host(), GameEvent::AuraChanged { slot: PARTY2 });
    }

    let shown = sim.render.shown_trackers(SURFACE);
    assert_eq!(shown.len(), 4);
    assert_eq!(shown[0].icon, Some(1001));
    assert!(sim.render.peak_trackers[&SURFACE] <= 4);
}

// ─────────────────────────────────────────────────────────────────────────────
// Freshness, profile, lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_cache_freshness_tracks_clock() {
    let mut sim = sim();
    let mut engine = AuraEngine::new(EngineTuning::default(), &sim.host());
    sim.advance_ms(1000);
    capture_party2(&mut sim, &mut engine, cursed_frame());

    let max_age = Duration::from_millis(500);
    assert!(engine.is_cache_fresh(&sim.host(), PARTY2, max_age));
    sim.advance_ms(600);
    assert!(!engine.is_cache_fresh(&sim.host(), PARTY2, max_age));
    assert!(!engine.is_cache_fresh(&sim.host(), RoleSlot::Player, max_age));
}

#[test]
fn test_ensure_profile_writes_defaults_once() {
    let mut sim = sim();
    let mut engine = AuraEngine::new(EngineTuning::default(), &sim.host());
    let mut store = MemoryProfileStore::default();

    engine.ensure_profile(&sim.host(), &mut store).unwrap();
    engine.ensure_profile(&sim.host(), &mut store).unwrap();

    assert_eq!(store.saves, 1);
    assert_eq!(store.load().unwrap(), Some(TrackerProfile::default()));
    assert_eq!(engine.profile(), &TrackerProfile::default());
}

#[test]
fn test_ensure_profile_keeps_saved_profile() {
    let mut sim = sim();
    let mut engine = AuraEngine::new(EngineTuning::default(), &sim.host());
    let saved = TrackerProfile {
        allowed_spells: vec!["Riptide".into()],
        ..TrackerProfile::default()
    };
    let mut store = MemoryProfileStore {
        profile: Some(saved.clone()),
        saves: 0,
    };

    engine.ensure_profile(&sim.host(), &mut store).unwrap();

    assert_eq!(store.saves, 0);
    assert_eq!(engine.profile(), &saved);
}

#[test]
fn test_icon_cache_waits_for_restricted_mode_to_end() {
    let mut sim = sim();
    sim.world.icons.insert("Riptide".into(), 252);
    sim.set_restricted(true);
    let mut engine = AuraEngine::new(EngineTuning::default(), &sim.host());
    engine.set_profile(
        &sim.host(),
        TrackerProfile {
            allowed_spells: vec!["Riptide".into()],
            ..TrackerProfile::default()
        },
    );
    assert!(engine.renderer.icons().is_stale());
    assert_eq!(sim.world.icon_lookups.get(), 0);

    sim.set_restricted(false);
    engine.dispatch(&mut sim.host(), GameEvent::RestrictedModeLeft);

    assert_eq!(engine.renderer.icons().get("Riptide"), Some(252));
}

#[test]
fn test_reset_tears_everything_down() {
    let mut sim = sim();
    sim.foreign.add(cursed_frame());
    let mut engine = AuraEngine::new(EngineTuning::default(), &sim.host());
    engine.dispatch(&mut sim.host(), GameEvent::WorldEntered);
    engine.set_suppressed(&mut sim.host(), GroupKind::Raid, true);
    assert!(engine.status().cached_slots > 0);
    assert!(engine.status().pending_timers > 0);

    engine.reset(&mut sim.host());

    let status = engine.status();
    assert_eq!(status.cached_slots, 0);
    assert_eq!(status.mapped_slots, 0);
    assert_eq!(status.pending_timers, 0);
    assert_eq!(status.gated_tasks, 0);
    assert_eq!(status.last_scan, None);
    assert!(!status.suppression.hide_raid_frames);

    // Work scheduled before the reset never runs
    let reads = sim.foreign.child_reads.get();
    sim.advance_ms(2000);
    engine.tick(&mut sim.host());
    assert_eq!(sim.foreign.child_reads.get(), reads);
}

#[test]
fn test_status_serializes_to_json() {
    let mut sim = sim();
    let mut engine = AuraEngine::new(EngineTuning::default(), &sim.host());
    engine.bootstrap(&mut sim.host(), "test");

    let json = serde_json::to_value(engine.status()).unwrap();
    assert_eq!(json["player_class"], "SHAMAN");
    assert_eq!(json["generation"], 1);
    assert_eq!(json["last_scan"]["visited"], 0);
}
