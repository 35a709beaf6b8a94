use std::cell::Cell;

use halo_types::{GroupKind, RoleSlot};
use serde::Deserialize;

use crate::access::{Fault, RawValue};
use crate::host::{ChildList, ForeignChild, ForeignEvent, ForeignFrameId, ForeignUi};

fn default_true() -> bool {
    true
}

fn default_one() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimChild {
    pub instance_id: Option<u64>,
    #[serde(default)]
    pub secret: bool,
    #[serde(default = "default_true")]
    pub shown: bool,
    #[serde(default)]
    pub dispel_attribute: Option<String>,
    #[serde(default)]
    pub dispel_field: Option<String>,
}

impl SimChild {
    pub fn shown(instance_id: u64) -> Self {
        Self {
            instance_id: Some(instance_id),
            secret: false,
            shown: true,
            dispel_attribute: None,
            dispel_field: None,
        }
    }

    pub fn hidden(instance_id: u64) -> Self {
        Self {
            shown: false,
            ..Self::shown(instance_id)
        }
    }

    pub fn with_attribute(mut self, tag: &str) -> Self {
        self.dispel_attribute = Some(tag.to_string());
        self
    }

    pub fn with_field(mut self, tag: &str) -> Self {
        self.dispel_field = Some(tag.to_string());
        self
    }

    fn to_foreign(&self) -> ForeignChild {
        let text = |tag: &Option<String>| {
            tag.as_deref()
                .map(RawValue::from)
                .unwrap_or_default()
        };
        ForeignChild {
            instance_id: match (self.secret, self.instance_id) {
                (true, _) => RawValue::Secret,
                (false, Some(id)) => id.into(),
                (false, None) => RawValue::Nil,
            },
            shown: self.shown,
            dispel_attribute: text(&self.dispel_attribute),
            dispel_field: text(&self.dispel_field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimFrame {
    pub id: u32,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub kind: GroupKind,
    /// Raid sub-group, ignored for party frames
    #[serde(default = "default_group")]
    pub group: u8,
    #[serde(default)]
    pub container: bool,
    #[serde(default = "default_true")]
    pub shown: bool,
    #[serde(default = "default_one")]
    pub alpha: f32,
    #[serde(default)]
    pub buffs: Vec<SimChild>,
    #[serde(default)]
    pub debuffs: Vec<SimChild>,
    #[serde(default)]
    pub dispel_debuffs: Vec<SimChild>,
    #[serde(default)]
    pub defensive: Vec<SimChild>,
    #[serde(default)]
    pub dispel_flags: Vec<String>,
    /// Child list reads fault
    #[serde(default)]
    pub faulty: bool,

    #[serde(skip, default = "default_one")]
    pub scale: f32,
    #[serde(skip, default = "default_true")]
    pub mouse: bool,
    #[serde(skip, default = "default_true")]
    pub highlight: bool,
    /// `None` while fully registered
    #[serde(skip)]
    pub events: Option<Vec<ForeignEvent>>,
    #[serde(skip)]
    pub reinitialized: usize,
}

fn default_group() -> u8 {
    1
}

impl SimFrame {
    pub fn new(id: u32, unit: RoleSlot, kind: GroupKind) -> Self {
        Self {
            id,
            unit: Some(unit.token()),
            kind,
            group: unit.raid_group().unwrap_or(1),
            container: false,
            shown: true,
            alpha: 1.0,
            buffs: Vec::new(),
            debuffs: Vec::new(),
            dispel_debuffs: Vec::new(),
            defensive: Vec::new(),
            dispel_flags: Vec::new(),
            faulty: false,
            scale: 1.0,
            mouse: true,
            highlight: true,
            events: None,
            reinitialized: 0,
        }
    }

    pub fn container(id: u32, kind: GroupKind) -> Self {
        Self {
            unit: None,
            container: true,
            ..Self::new(id, RoleSlot::Player, kind)
        }
    }
}

#[derive(Debug, Default)]
pub struct SimForeign {
    pub frames: Vec<SimFrame>,
    /// Mirrors the world flag; scale and mouse writes are refused while set
    pub restricted: bool,
    pub child_reads: Cell<usize>,
}

impl SimForeign {
    pub fn add(&mut self, frame: SimFrame) {
        self.frames.push(frame);
    }

    pub fn frame(&self, id: u32) -> Option<&SimFrame> {
        self.frames.iter().find(|f| f.id == id)
    }

    pub fn frame_mut(&mut self, id: u32) -> Option<&mut SimFrame> {
        self.frames.iter_mut().find(|f| f.id == id)
    }

    fn get(&self, frame: ForeignFrameId) -> Result<&SimFrame, Fault> {
        self.frame(frame.0)
            .ok_or_else(|| Fault::Platform(format!("no such frame {frame}")))
    }

    fn ids(&self, pred: impl Fn(&SimFrame) -> bool) -> Vec<ForeignFrameId> {
        let mut ids: Vec<_> = self
            .frames
            .iter()
            .filter(|f| pred(f))
            .map(|f| ForeignFrameId(f.id))
            .collect();
        ids.sort();
        ids
    }

    fn blocked(&self) -> Result<(), Fault> {
        if self.restricted {
            Err(Fault::Platform("blocked during restricted mode".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ForeignUi for SimForeign {
    fn primary_pool(&self) -> Vec<ForeignFrameId> {
        self.ids(|f| !f.container && f.kind == GroupKind::Party)
    }

    fn raid_pool(&self) -> Vec<Vec<ForeignFrameId>> {
        let max_group = self
            .frames
            .iter()
            .filter(|f| !f.container && f.kind == GroupKind::Raid)
            .map(|f| f.group)
            .max()
            .unwrap_or(0);
        (1..=max_group)
            .map(|group| self.ids(|f| !f.container && f.kind == GroupKind::Raid && f.group == group))
            .collect()
    }

    fn containers(&self, kind: GroupKind) -> Vec<ForeignFrameId> {
        self.ids(|f| f.container && f.kind == kind)
    }

    fn frame_unit(&self, frame: ForeignFrameId) -> Option<String> {
        self.frame(frame.0).and_then(|f| f.unit.clone())
    }

    fn is_shown(&self, frame: ForeignFrameId) -> bool {
        self.frame(frame.0).is_some_and(|f| f.shown)
    }

    fn alpha(&self, frame: ForeignFrameId) -> f32 {
        self.frame(frame.0).map_or(0.0, |f| f.alpha)
    }

    fn children(&self, frame: ForeignFrameId, list: ChildList) -> Result<Vec<ForeignChild>, Fault> {
        self.child_reads.set(self.child_reads.get() + 1);
        let f = self.get(frame)?;
        if f.faulty {
            return Err(Fault::Platform(format!("{frame} child list unreadable")));
        }
        let children = match list {
            ChildList::Buffs => &f.buffs,
            ChildList::Debuffs => &f.debuffs,
            ChildList::DispelDebuffs => &f.dispel_debuffs,
            ChildList::Defensive => &f.defensive,
        };
        Ok(children.iter().map(SimChild::to_foreign).collect())
    }

    fn frame_dispel_flags(&self, frame: ForeignFrameId) -> Result<Vec<RawValue>, Fault> {
        let f = self.get(frame)?;
        Ok(f.dispel_flags.iter().map(|s| RawValue::from(s.as_str())).collect())
    }

    fn set_alpha(&mut self, frame: ForeignFrameId, alpha: f32) {
        if let Some(f) = self.frame_mut(frame.0) {
            f.alpha = alpha;
        }
    }

    fn set_scale(&mut self, frame: ForeignFrameId, scale: f32) -> Result<(), Fault> {
        self.blocked()?;
        if let Some(f) = self.frame_mut(frame.0) {
            f.scale = scale;
        }
        Ok(())
    }

    fn set_mouse_enabled(&mut self, frame: ForeignFrameId, enabled: bool) -> Result<(), Fault> {
        self.blocked()?;
        if let Some(f) = self.frame_mut(frame.0) {
            f.mouse = enabled;
        }
        Ok(())
    }

    fn set_selection_highlight(&mut self, frame: ForeignFrameId, visible: bool) {
        if let Some(f) = self.frame_mut(frame.0) {
            f.highlight = visible;
        }
    }

    fn strip_events(&mut self, frame: ForeignFrameId, keep: &[ForeignEvent]) {
        if let Some(f) = self.frame_mut(frame.0) {
            f.events = Some(keep.to_vec());
        }
    }

    fn reinitialize(&mut self, frame: ForeignFrameId) -> Result<(), Fault> {
        let f = self
            .frame_mut(frame.0)
            .ok_or_else(|| Fault::Platform(format!("no such frame {frame}")))?;
        f.events = None;
        f.reinitialized += 1;
        Ok(())
    }
}
