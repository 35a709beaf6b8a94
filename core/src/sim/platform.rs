use std::cell::Cell;
use std::time::Duration;

use halo_types::{DispelType, RoleSlot};
use hashbrown::{HashMap, HashSet};
use serde::Deserialize;

use crate::access::{AuraApi, AuraFilter, Capabilities, Fault, InstanceId, RawAura, RawValue};
use crate::host::{Clock, EntityId, WorldApi};

fn default_true() -> bool {
    true
}

#[derive(Debug, Default)]
pub struct SimClock {
    now: Cell<Duration>,
}

impl SimClock {
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, at: Duration) {
        self.now.set(at);
    }
}

impl Clock for SimClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// One aura on a simulated unit
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimAura {
    pub instance_id: u64,
    #[serde(default)]
    pub spell_id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon: u64,
    #[serde(default)]
    pub dispel: Option<DispelType>,
    #[serde(default = "default_true")]
    pub helpful: bool,
    #[serde(default)]
    pub from_player: bool,
    /// Every field of the aura is restricted
    #[serde(default)]
    pub secret: bool,
}

impl SimAura {
    pub fn buff(instance_id: u64, spell_id: u64, name: &str) -> Self {
        Self {
            instance_id,
            spell_id,
            name: name.to_string(),
            icon: spell_id,
            dispel: None,
            helpful: true,
            from_player: false,
            secret: false,
        }
    }

    pub fn own_buff(instance_id: u64, spell_id: u64, name: &str) -> Self {
        Self {
            from_player: true,
            ..Self::buff(instance_id, spell_id, name)
        }
    }

    pub fn debuff(instance_id: u64, spell_id: u64, name: &str, dispel: Option<DispelType>) -> Self {
        Self {
            helpful: false,
            dispel,
            ..Self::buff(instance_id, spell_id, name)
        }
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    fn matches(&self, filter: AuraFilter) -> bool {
        match filter {
            AuraFilter::Helpful => self.helpful,
            AuraFilter::Harmful => !self.helpful,
            AuraFilter::HelpfulPlayer => self.helpful && self.from_player,
            AuraFilter::HarmfulDispellable => !self.helpful && self.dispel.is_some(),
        }
    }

    fn to_raw(&self) -> RawAura {
        if self.secret {
            return RawAura {
                instance_id: RawValue::Secret,
                spell_id: RawValue::Secret,
                name: RawValue::Secret,
                icon: RawValue::Secret,
                dispel_name: RawValue::Secret,
                stacks: RawValue::Secret,
                duration: RawValue::Secret,
                expiration: RawValue::Secret,
                from_player: RawValue::Secret,
            };
        }
        RawAura {
            instance_id: self.instance_id.into(),
            spell_id: self.spell_id.into(),
            name: RawValue::Text(self.name.clone()),
            icon: self.icon.into(),
            dispel_name: self
                .dispel
                .map(|d| RawValue::from(d.as_str()))
                .unwrap_or_default(),
            stacks: RawValue::Number(1.0),
            duration: RawValue::Number(0.0),
            expiration: RawValue::Number(0.0),
            from_player: RawValue::Bool(self.from_player),
        }
    }
}

/// Restricted aura reads over a per-unit aura list
#[derive(Debug)]
pub struct SimAuras {
    pub caps: Capabilities,
    pub units: HashMap<RoleSlot, Vec<SimAura>>,
    /// Every read against these units faults
    pub faulty_units: HashSet<RoleSlot>,
    pub reads: Cell<usize>,
}

impl Default for SimAuras {
    fn default() -> Self {
        Self {
            caps: Capabilities::full(),
            units: HashMap::new(),
            faulty_units: HashSet::new(),
            reads: Cell::new(0),
        }
    }
}

impl SimAuras {
    pub fn add(&mut self, slot: RoleSlot, aura: SimAura) {
        self.units.entry(slot).or_default().push(aura);
    }

    pub fn clear_unit(&mut self, slot: RoleSlot) {
        self.units.remove(&slot);
    }

    fn guard(&self, unit: RoleSlot) -> Result<(), Fault> {
        self.reads.set(self.reads.get() + 1);
        if self.faulty_units.contains(&unit) {
            return Err(Fault::Platform(format!("{unit} is unreadable")));
        }
        Ok(())
    }

    fn nth(&self, unit: RoleSlot, index: u32, filter: AuraFilter) -> Option<&SimAura> {
        let position = usize::try_from(index).ok()?.checked_sub(1)?;
        self.units
            .get(&unit)?
            .iter()
            .filter(|a| a.matches(filter))
            .nth(position)
    }

    fn find(&self, unit: RoleSlot, instance: InstanceId) -> Option<&SimAura> {
        self.units
            .get(&unit)?
            .iter()
            .find(|a| a.instance_id == instance.0)
    }
}

impl AuraApi for SimAuras {
    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn aura_by_index(
        &self,
        unit: RoleSlot,
        index: u32,
        filter: AuraFilter,
    ) -> Result<Option<RawAura>, Fault> {
        self.guard(unit)?;
        Ok(self.nth(unit, index, filter).map(SimAura::to_raw))
    }

    fn aura_by_instance(
        &self,
        unit: RoleSlot,
        instance: InstanceId,
    ) -> Result<Option<RawAura>, Fault> {
        self.guard(unit)?;
        Ok(self.find(unit, instance).map(SimAura::to_raw))
    }

    fn is_index_secret(&self, unit: RoleSlot, index: u32, filter: AuraFilter) -> Result<bool, Fault> {
        if !self.caps.index_secrecy {
            return Err(Fault::Unsupported);
        }
        self.guard(unit)?;
        Ok(self.nth(unit, index, filter).is_some_and(|a| a.secret))
    }

    fn is_instance_secret(&self, unit: RoleSlot, instance: InstanceId) -> Result<bool, Fault> {
        if !self.caps.instance_secrecy {
            return Err(Fault::Unsupported);
        }
        self.guard(unit)?;
        Ok(self.find(unit, instance).is_some_and(|a| a.secret))
    }

    fn player_aura_by_spell_id(&self, spell_id: u64) -> Result<Option<RawAura>, Fault> {
        if !self.caps.spell_lookup {
            return Err(Fault::Unsupported);
        }
        self.guard(RoleSlot::Player)?;
        Ok(self
            .units
            .get(&RoleSlot::Player)
            .and_then(|auras| {
                auras
                    .iter()
                    .find(|a| a.matches(AuraFilter::HelpfulPlayer) && a.spell_id == spell_id)
            })
            .map(SimAura::to_raw))
    }

    fn player_aura_by_name(&self, unit: RoleSlot, name: &str) -> Result<Option<RawAura>, Fault> {
        if !self.caps.name_lookup {
            return Err(Fault::Unsupported);
        }
        self.guard(unit)?;
        Ok(self
            .units
            .get(&unit)
            .and_then(|auras| {
                auras
                    .iter()
                    .find(|a| a.matches(AuraFilter::HelpfulPlayer) && a.name.eq_ignore_ascii_case(name))
            })
            .map(SimAura::to_raw))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimUnit {
    pub identity: Option<String>,
    #[serde(default = "default_true")]
    pub exists: bool,
}

#[derive(Debug, Default)]
pub struct SimWorld {
    pub units: HashMap<RoleSlot, SimUnit>,
    pub class: Option<String>,
    pub restricted: bool,
    pub icons: HashMap<String, u64>,
    pub icon_lookups: Cell<usize>,
}

impl SimWorld {
    pub fn add_unit(&mut self, slot: RoleSlot, identity: &str) {
        self.units.insert(
            slot,
            SimUnit {
                identity: Some(identity.to_string()),
                exists: true,
            },
        );
    }

    pub fn remove_unit(&mut self, slot: RoleSlot) {
        self.units.remove(&slot);
    }
}

impl WorldApi for SimWorld {
    fn unit_exists(&self, slot: RoleSlot) -> bool {
        self.units.get(&slot).is_some_and(|u| u.exists)
    }

    fn identity(&self, slot: RoleSlot) -> Option<EntityId> {
        self.units
            .get(&slot)
            .filter(|u| u.exists)
            .and_then(|u| u.identity.clone())
            .map(EntityId)
    }

    fn player_class(&self) -> Option<String> {
        self.class.clone()
    }

    fn in_restricted_mode(&self) -> bool {
        self.restricted
    }

    fn spell_icon(&self, name: &str) -> Option<u64> {
        self.icon_lookups.set(self.icon_lookups.get() + 1);
        self.icons.get(name).copied()
    }
}
