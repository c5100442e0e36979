use alloc::vec::Vec;

use super::widget::WidgetId;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeypadId(usize);

#[derive(Default)]
struct Group {
    members: Vec<WidgetId>,
    focused: Option<usize>,
}

#[derive(Default)]
pub struct FocusGroups {
    groups: Vec<Option<Group>>,
    default: Option<GroupId>,
    keypads: Vec<Option<GroupId>>,
}

impl FocusGroups {
    pub fn new() -> Self {
        Self::default()
    }

    fn group(&self, id: GroupId) -> Result<&Group> {
        self.groups
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(Error::UnknownGroup)
    }

    fn group_mut(&mut self, id: GroupId) -> Result<&mut Group> {
        self.groups
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(Error::UnknownGroup)
    }

    pub fn create(&mut self) -> GroupId {
        self.groups.push(Some(Group::default()));
        GroupId(self.groups.len() - 1)
    }

    /// Deletes a group. Keypads bound to it become unbound and it stops
    /// being the default.
    pub fn delete(&mut self, id: GroupId) -> Result<()> {
        self.group(id)?;
        self.groups[id.0] = None;
        for binding in self.keypads.iter_mut() {
            if *binding == Some(id) {
                *binding = None;
            }
        }
        if self.default == Some(id) {
            self.default = None;
        }
        Ok(())
    }

    pub fn exists(&self, id: GroupId) -> bool {
        self.group(id).is_ok()
    }

    pub fn live_count(&self) -> usize {
        self.groups.iter().filter(|g| g.is_some()).count()
    }

    pub fn default_group(&self) -> Option<GroupId> {
        self.default
    }

    pub fn set_default(&mut self, id: Option<GroupId>) -> Result<()> {
        if let Some(id) = id {
            self.group(id)?;
        }
        self.default = id;
        Ok(())
    }

    /// Adds a member; the first member of a group takes focus.
    pub fn add(&mut self, id: GroupId, widget: WidgetId) -> Result<()> {
        let group = self.group_mut(id)?;
        if group.members.contains(&widget) {
            return Ok(());
        }
        group.members.push(widget);
        if group.focused.is_none() {
            group.focused = Some(0);
        }
        Ok(())
    }

    /// Drops a deleted widget from every group.
    pub fn forget(&mut self, widget: WidgetId) {
        for group in self.groups.iter_mut().flatten() {
            let Some(pos) = group.members.iter().position(|&w| w == widget) else {
                continue;
            };
            group.members.remove(pos);
            group.focused = match group.focused {
                _ if group.members.is_empty() => None,
                Some(f) if f > pos || f == group.members.len() => Some(f - 1),
                other => other,
            };
        }
    }

    pub fn members(&self, id: GroupId) -> Result<&[WidgetId]> {
        Ok(&self.group(id)?.members)
    }

    pub fn focused(&self, id: GroupId) -> Option<WidgetId> {
        let group = self.group(id).ok()?;
        group.focused.and_then(|i| group.members.get(i).copied())
    }

    pub fn focus(&mut self, id: GroupId, widget: WidgetId) -> Result<()> {
        let group = self.group_mut(id)?;
        let pos = group
            .members
            .iter()
            .position(|&w| w == widget)
            .ok_or(Error::UnknownWidget)?;
        group.focused = Some(pos);
        Ok(())
    }

    /// Moves focus forward (wrapping) among members accepted by `eligible`.
    pub fn focus_next(&mut self, id: GroupId, eligible: impl Fn(WidgetId) -> bool) -> Option<WidgetId> {
        self.step(id, 1, eligible)
    }

    pub fn focus_prev(&mut self, id: GroupId, eligible: impl Fn(WidgetId) -> bool) -> Option<WidgetId> {
        self.step(id, -1, eligible)
    }

    fn step(&mut self, id: GroupId, dir: isize, eligible: impl Fn(WidgetId) -> bool) -> Option<WidgetId> {
        let group = self.group_mut(id).ok()?;
        let len = group.members.len() as isize;
        if len == 0 {
            return None;
        }
        let start = group.focused.unwrap_or(0) as isize;
        for offset in 1..=len {
            let index = (start + dir * offset).rem_euclid(len) as usize;
            if eligible(group.members[index]) {
                group.focused = Some(index);
                return Some(group.members[index]);
            }
        }
        None
    }

    pub fn register_keypad(&mut self) -> KeypadId {
        self.keypads.push(self.default);
        KeypadId(self.keypads.len() - 1)
    }

    pub fn keypads(&self) -> impl Iterator<Item = KeypadId> + '_ {
        (0..self.keypads.len()).map(KeypadId)
    }

    pub fn keypad_group(&self, keypad: KeypadId) -> Option<GroupId> {
        self.keypads.get(keypad.0).copied().flatten()
    }

    pub fn bind_keypad(&mut self, keypad: KeypadId, id: Option<GroupId>) -> Result<()> {
        if let Some(id) = id {
            self.group(id)?;
        }
        if let Some(binding) = self.keypads.get_mut(keypad.0) {
            *binding = id;
        }
        Ok(())
    }

    pub fn bind_all_keypads(&mut self, id: Option<GroupId>) -> Result<()> {
        if let Some(id) = id {
            self.group(id)?;
        }
        for binding in self.keypads.iter_mut() {
            *binding = id;
        }
        Ok(())
    }
}
