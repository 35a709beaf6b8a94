//! Tests for tracker rendering and the dispel overlay

use halo_types::{DispelType, RoleSlot, TrackerProfile};

use super::{IconCache, IndicatorRenderer, dispel_overlay, dispellable_by};
use crate::access::{InstanceId, SafeAccess};
use crate::host::SurfaceId;
use crate::sim::{SimAura, SimAuras, SimRender, SimWorld};
use crate::state::AuraStateEntry;

const SURFACE: SurfaceId = SurfaceId(1);
const UNIT: RoleSlot = RoleSlot::Party(1);

fn access(auras: &SimAuras) -> SafeAccess<'_> {
    SafeAccess::new(auras, auras.caps, 80)
}

fn own_buffs(count: u64) -> SimAuras {
    let mut auras = SimAuras::default();
    for n in 1..=count {
        auras.add(UNIT, SimAura::own_buff(100 + n, 1000 + n, &format!("Spell {n}")));
    }
    auras
}

fn shown_ids(render: &SimRender) -> Vec<Option<InstanceId>> {
    render
        .shown_trackers(SURFACE)
        .into_iter()
        .map(|icon| icon.instance_id)
        .collect()
}

fn allow(names: &[&str]) -> TrackerProfile {
    TrackerProfile {
        allowed_spells: names.iter().map(|s| s.to_string()).collect(),
        ..TrackerProfile::default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unfiltered scan
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unfiltered_scan_stops_at_cap() {
    let auras = own_buffs(7);
    let mut render = SimRender::default();
    let mut renderer = IndicatorRenderer::new(4);

    let shown = renderer.render(&access(&auras), &mut render, SURFACE, UNIT, &TrackerProfile::default());

    assert_eq!(shown, 4);
    assert_eq!(
        shown_ids(&render),
        (101..=104).map(|n| Some(InstanceId(n))).collect::<Vec<_>>()
    );
}

#[test]
fn test_unfiltered_scan_skips_secret_and_foreign_buffs() {
    let mut auras = SimAuras::default();
    auras.add(UNIT, SimAura::buff(1, 10, "Someone Else's"));
    auras.add(UNIT, SimAura::own_buff(2, 20, "Hidden").secret());
    auras.add(UNIT, SimAura::own_buff(3, 30, "Visible"));
    let mut render = SimRender::default();
    let mut renderer = IndicatorRenderer::new(4);

    renderer.render(&access(&auras), &mut render, SURFACE, UNIT, &TrackerProfile::default());

    assert_eq!(shown_ids(&render), vec![Some(InstanceId(3))]);
    assert_eq!(render.shown_trackers(SURFACE)[0].spell_name.as_deref(), Some("Visible"));
}

#[test]
fn test_fewer_trackers_hide_leftover_elements() {
    let mut auras = own_buffs(3);
    let mut render = SimRender::default();
    let mut renderer = IndicatorRenderer::new(4);
    let profile = TrackerProfile::default();

    renderer.render(&access(&auras), &mut render, SURFACE, UNIT, &profile);
    assert_eq!(render.shown_trackers(SURFACE).len(), 3);

    auras.clear_unit(UNIT);
    auras.add(UNIT, SimAura::own_buff(200, 2000, "Only"));
    renderer.render(&access(&auras), &mut render, SURFACE, UNIT, &profile);

    assert_eq!(shown_ids(&render), vec![Some(InstanceId(200))]);
    assert_eq!(renderer.shown_count(SURFACE), 1);
}

#[test]
fn test_clear_hides_every_element() {
    let auras = own_buffs(2);
    let mut render = SimRender::default();
    let mut renderer = IndicatorRenderer::new(4);

    renderer.render(&access(&auras), &mut render, SURFACE, UNIT, &TrackerProfile::default());
    renderer.clear(&mut render, SURFACE);

    assert!(render.shown_trackers(SURFACE).is_empty());
    assert_eq!(renderer.shown_count(SURFACE), 0);
}

#[test]
fn test_tracker_size_is_clamped() {
    let auras = own_buffs(1);
    let mut render = SimRender::default();
    let mut renderer = IndicatorRenderer::new(4);
    let profile = TrackerProfile {
        size: 2.0,
        ..TrackerProfile::default()
    };

    renderer.render(&access(&auras), &mut render, SURFACE, UNIT, &profile);

    assert_eq!(render.shown_trackers(SURFACE)[0].size, halo_types::TRACKER_SIZE_MIN);
}

// ─────────────────────────────────────────────────────────────────────────────
// Name-filtered mode
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_filtered_mode_follows_allow_list_order() {
    let auras = own_buffs(3);
    let mut world = SimWorld::default();
    world.icons.insert("Spell 3".to_string(), 333);
    let mut render = SimRender::default();
    let mut renderer = IndicatorRenderer::new(4);
    let profile = allow(&["Spell 3", "Missing", "Spell 1"]);
    assert!(renderer.icons_mut().rebuild(&world, profile.spell_names()));

    renderer.render(&access(&auras), &mut render, SURFACE, UNIT, &profile);

    let icons = render.shown_trackers(SURFACE);
    assert_eq!(icons.len(), 2);
    assert_eq!(icons[0].spell_name.as_deref(), Some("Spell 3"));
    assert_eq!(icons[0].icon, Some(333));
    assert_eq!(icons[0].instance_id, Some(InstanceId(103)));
    assert_eq!(icons[1].spell_name.as_deref(), Some("Spell 1"));
    assert_eq!(icons[1].icon, None);
}

#[test]
fn test_long_allow_list_never_exceeds_cap() {
    let auras = own_buffs(8);
    let mut render = SimRender::default();
    let mut renderer = IndicatorRenderer::new(4);
    let names: Vec<String> = (1..=8).map(|n| format!("Spell {n}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let profile = allow(&refs);

    for _ in 0..3 {
        renderer.render(&access(&auras), &mut render, SURFACE, UNIT, &profile);
    }

    assert_eq!(render.shown_trackers(SURFACE).len(), 4);
    assert_eq!(render.peak_trackers.get(&SURFACE).copied(), Some(4));
}

#[test]
fn test_icon_cache_refuses_restricted_rebuild() {
    let mut world = SimWorld::default();
    world.icons.insert("Renew".to_string(), 135953);
    world.restricted = true;

    let mut cache = IconCache::default();
    assert!(!cache.rebuild(&world, ["Renew"]));
    assert!(cache.is_stale());
    assert_eq!(world.icon_lookups.get(), 0);

    world.restricted = false;
    assert!(cache.rebuild(&world, ["Renew"]));
    assert!(!cache.is_stale());
    assert_eq!(cache.get(" renew "), Some(135953));
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispel overlay
// ─────────────────────────────────────────────────────────────────────────────

fn cursed_entry() -> AuraStateEntry {
    let mut entry = AuraStateEntry::default();
    entry.debuffs.insert(InstanceId(77));
    entry.dispellable.insert(InstanceId(77));
    entry.dispel_type_by_instance.insert(InstanceId(77), DispelType::Curse);
    entry
}

#[test]
fn test_overlay_picks_removable_curse() {
    assert_eq!(dispel_overlay(Some(&cursed_entry()), Some("SHAMAN")), Some(DispelType::Curse));
    assert_eq!(dispel_overlay(Some(&cursed_entry()), Some("PRIEST")), None);
}

#[test]
fn test_overlay_follows_priority_order() {
    let mut entry = cursed_entry();
    entry.dispel_types.insert(DispelType::Disease);
    entry.dispel_types.insert(DispelType::Magic);

    assert_eq!(dispel_overlay(Some(&entry), Some("DRUID")), Some(DispelType::Magic));
    assert_eq!(dispel_overlay(Some(&entry), Some("MAGE")), Some(DispelType::Curse));
    assert_eq!(dispel_overlay(Some(&entry), Some("WARRIOR")), None);
}

#[test]
fn test_unknown_class_removes_everything() {
    assert_eq!(dispellable_by(None), &DispelType::PRIORITY);
    assert_eq!(dispellable_by(Some("BARD")), &DispelType::PRIORITY);
    assert_eq!(dispellable_by(Some("paladin")), &[DispelType::Magic, DispelType::Poison, DispelType::Disease]);
    assert_eq!(dispel_overlay(Some(&cursed_entry()), None), Some(DispelType::Curse));
}

#[test]
fn test_overlay_needs_an_entry() {
    assert_eq!(dispel_overlay(None, Some("SHAMAN")), None);
    assert_eq!(dispel_overlay(Some(&AuraStateEntry::default()), None), None);
}
