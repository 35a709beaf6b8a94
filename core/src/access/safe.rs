use halo_types::RoleSlot;

use super::{
    AuraApi, AuraFilter, AuraPayload, Capabilities, Fault, InstanceId, RawAura, RawValue,
    coerce_positive_int,
};

/// Outcome of probing one aura index
#[derive(Debug, Clone, PartialEq)]
pub enum SlotRead {
    /// Readable, non-secret aura
    Present(AuraPayload),
    /// Something is there but it is secret, faulted or failed the double check
    Withheld,
    /// No aura at this index
    Empty,
}

/// Fail-closed view over an [`AuraApi`]
///
/// Cheap to construct; build one per engine call from the capabilities
/// recorded at wiring time.
#[derive(Clone, Copy)]
pub struct SafeAccess<'a> {
    api: &'a dyn AuraApi,
    caps: Capabilities,
    scan_limit: u32,
}

impl<'a> SafeAccess<'a> {
    pub fn new(api: &'a dyn AuraApi, caps: Capabilities, scan_limit: u32) -> Self {
        Self {
            api,
            caps,
            scan_limit,
        }
    }

    pub fn scan_limit(&self) -> u32 {
        self.scan_limit
    }

    /// True unless the platform positively confirms the index is readable
    pub fn is_index_secret(&self, unit: RoleSlot, index: u32, filter: AuraFilter) -> bool {
        if index == 0 {
            return true;
        }
        if !self.caps.restricted_values {
            return false;
        }
        if !self.caps.index_secrecy {
            return true;
        }
        resolve_secrecy(self.api.is_index_secret(unit, index, filter), "index", unit)
    }

    /// True unless the platform positively confirms the instance is readable
    pub fn is_instance_secret(&self, unit: RoleSlot, instance: InstanceId) -> bool {
        if instance.0 == 0 {
            return true;
        }
        if !self.caps.restricted_values {
            return false;
        }
        if !self.caps.instance_secrecy {
            return true;
        }
        resolve_secrecy(self.api.is_instance_secret(unit, instance), "instance", unit)
    }

    pub fn read_by_index(&self, unit: RoleSlot, index: u32, filter: AuraFilter) -> Option<AuraPayload> {
        match self.inspect_index(unit, index, filter) {
            SlotRead::Present(payload) => Some(payload),
            SlotRead::Withheld | SlotRead::Empty => None,
        }
    }

    /// Like [`SafeAccess::read_by_index`], but tells "nothing there" apart from
    /// "not allowed to look"
    pub fn inspect_index(&self, unit: RoleSlot, index: u32, filter: AuraFilter) -> SlotRead {
        if self.is_index_secret(unit, index, filter) {
            return SlotRead::Withheld;
        }
        match self.api.aura_by_index(unit, index, filter) {
            Ok(Some(raw)) => match self.verify(unit, &raw) {
                Some(payload) => SlotRead::Present(payload),
                None => SlotRead::Withheld,
            },
            Ok(None) => SlotRead::Empty,
            Err(fault) => {
                tracing::trace!(target: "halo::access", %unit, index, %fault, "index read faulted");
                SlotRead::Withheld
            }
        }
    }

    pub fn read_by_instance(&self, unit: RoleSlot, instance: InstanceId) -> Option<AuraPayload> {
        if self.is_instance_secret(unit, instance) {
            return None;
        }
        match self.api.aura_by_instance(unit, instance) {
            Ok(Some(raw)) => {
                let payload = self.verify(unit, &raw)?;
                (payload.instance_id == instance).then_some(payload)
            }
            Ok(None) => None,
            Err(fault) => {
                tracing::trace!(target: "halo::access", %unit, %instance, %fault, "instance read faulted");
                None
            }
        }
    }

    /// Find one of the player's own auras by spell id.
    ///
    /// The second value reports whether a secret or faulting slot may have
    /// hidden a match, which is different from "definitely not found".
    pub fn read_own_aura_by_spell_id(&self, spell_id: &RawValue) -> (Option<AuraPayload>, bool) {
        let Some(spell_id) = coerce_positive_int(spell_id) else {
            return (None, false);
        };

        if self.caps.spell_lookup {
            match self.api.player_aura_by_spell_id(spell_id) {
                Ok(Some(raw)) => {
                    return match self.verify(RoleSlot::Player, &raw) {
                        Some(payload) => (Some(payload), false),
                        None => (None, true),
                    };
                }
                Ok(None) => return (None, false),
                Err(Fault::Unsupported) => {}
                Err(fault) => {
                    tracing::trace!(target: "halo::access", spell_id, %fault, "spell lookup faulted");
                    return (None, true);
                }
            }
        }

        let mut hidden = false;
        for index in 1..=self.scan_limit {
            match self.inspect_index(RoleSlot::Player, index, AuraFilter::HelpfulPlayer) {
                SlotRead::Present(payload) if payload.spell_id == Some(spell_id) => {
                    return (Some(payload), false);
                }
                SlotRead::Present(_) => {}
                SlotRead::Withheld => hidden = true,
                SlotRead::Empty => break,
            }
        }
        (None, hidden)
    }

    /// Player-sourced existence check by spell name
    pub fn read_player_aura_by_name(&self, unit: RoleSlot, name: &str) -> Option<AuraPayload> {
        if !self.caps.name_lookup || name.trim().is_empty() {
            return None;
        }
        match self.api.player_aura_by_name(unit, name) {
            Ok(Some(raw)) => self.verify(unit, &raw),
            Ok(None) => None,
            Err(fault) => {
                tracing::trace!(target: "halo::access", %unit, name, %fault, "name lookup faulted");
                None
            }
        }
    }

    /// Coerce a raw record and re-check the secrecy of the instance it names
    fn verify(&self, unit: RoleSlot, raw: &RawAura) -> Option<AuraPayload> {
        let payload = AuraPayload::from_raw(raw)?;
        if self.is_instance_secret(unit, payload.instance_id) {
            return None;
        }
        Some(payload)
    }
}

fn resolve_secrecy(result: Result<bool, Fault>, what: &str, unit: RoleSlot) -> bool {
    match result {
        Ok(secret) => secret,
        Err(fault) => {
            tracing::trace!(target: "halo::access", %unit, what, %fault, "secrecy check faulted");
            true
        }
    }
}
