// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Category activation state and the named category hierarchy.
//!
//! Every shape carries a 16-bit category. [`CategoryState`] packs one bit per
//! category: bit `c % 8` of byte `c / 8` is set when category `c` is
//! **inactive**, so a fresh state shows everything.

use std::collections::BTreeMap;
use std::fmt;

use vantage_proto::CategoryNameMessage;

/// Number of addressable categories.
pub const CATEGORY_COUNT: usize = 1 << 16;

const STATE_BYTES: usize = CATEGORY_COUNT / 8;

/// One activation bit per category; all active by default.
#[derive(Clone, PartialEq, Eq)]
pub struct CategoryState {
    inactive: Box<[u8; STATE_BYTES]>,
}

impl Default for CategoryState {
    fn default() -> Self {
        Self {
            inactive: Box::new([0u8; STATE_BYTES]),
        }
    }
}

impl fmt::Debug for CategoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryState")
            .field("inactive", &self.inactive_count())
            .finish()
    }
}

#[inline]
const fn slot(category: u16) -> (usize, u8) {
    ((category >> 3) as usize, 1 << (category & 7))
}

impl CategoryState {
    /// All categories active.
    pub fn new() -> Self {
        Self::default()
    }

    /// True unless `category` has been deactivated.
    #[inline]
    pub fn is_active(&self, category: u16) -> bool {
        let (byte, bit) = slot(category);
        self.inactive[byte] & bit == 0
    }

    /// Set the activation state of one category.
    pub fn set_active(&mut self, category: u16, active: bool) {
        let (byte, bit) = slot(category);
        if active {
            self.inactive[byte] &= !bit;
        } else {
            self.inactive[byte] |= bit;
        }
    }

    /// Reactivate every category.
    pub fn reset(&mut self) {
        self.inactive.fill(0);
    }

    /// Number of inactive categories.
    pub fn inactive_count(&self) -> usize {
        self.inactive.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Packed inactive bits.
    pub fn as_bytes(&self) -> &[u8] {
        &self.inactive[..]
    }
}

/// A named category as announced by the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInfo {
    /// Category id.
    pub id: u16,
    /// Parent id; zero is the root.
    pub parent: u16,
    /// Display name.
    pub name: String,
    /// State the category starts in.
    pub default_active: bool,
}

impl From<&CategoryNameMessage> for CategoryInfo {
    fn from(msg: &CategoryNameMessage) -> Self {
        Self {
            id: msg.category_id,
            parent: msg.parent_id,
            name: msg.name.clone(),
            default_active: msg.default_active,
        }
    }
}

/// Named categories plus the activation state they drive.
///
/// Changing a category's state applies the same state to every registered
/// descendant.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    infos: BTreeMap<u16, CategoryInfo>,
    state: CategoryState,
}

impl CategoryTree {
    /// Empty tree, everything active.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or rename a category and apply its default state.
    pub fn define(&mut self, info: CategoryInfo) {
        self.state.set_active(info.id, info.default_active);
        self.infos.insert(info.id, info);
    }

    /// Registered category by id.
    pub fn get(&self, id: u16) -> Option<&CategoryInfo> {
        self.infos.get(&id)
    }

    /// Registered categories in id order.
    pub fn iter(&self) -> impl Iterator<Item = &CategoryInfo> {
        self.infos.values()
    }

    /// Number of registered categories.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Set `id` and its registered descendants to `active`.
    ///
    /// Returns every category whose bit was written, `id` first.
    pub fn set_active(&mut self, id: u16, active: bool) -> Vec<u16> {
        let mut touched = vec![id];
        let mut next = 0;
        while next < touched.len() {
            let parent = touched[next];
            next += 1;
            for info in self.infos.values() {
                if info.parent == parent && info.id != parent && !touched.contains(&info.id) {
                    touched.push(info.id);
                }
            }
        }
        for &category in &touched {
            self.state.set_active(category, active);
        }
        touched
    }

    /// True unless `id` is inactive.
    pub fn is_active(&self, id: u16) -> bool {
        self.state.is_active(id)
    }

    /// Activation bits for renderers.
    pub const fn state(&self) -> &CategoryState {
        &self.state
    }

    /// Forget all names and reactivate everything.
    pub fn reset(&mut self) {
        self.infos.clear();
        self.state.reset();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn info(id: u16, parent: u16) -> CategoryInfo {
        CategoryInfo {
            id,
            parent,
            name: format!("cat{id}"),
            default_active: true,
        }
    }

    #[test]
    fn fresh_state_is_all_active() {
        let state = CategoryState::new();
        assert!(state.is_active(0));
        assert!(state.is_active(u16::MAX));
        assert_eq!(state.inactive_count(), 0);
        assert_eq!(state.as_bytes().len(), 8192);
    }

    #[test]
    fn bits_pack_low_first() {
        let mut state = CategoryState::new();
        state.set_active(9, false);
        assert_eq!(state.as_bytes()[1], 0b10);
        state.set_active(u16::MAX, false);
        assert_eq!(state.as_bytes()[8191], 0x80);
        state.set_active(9, true);
        assert_eq!(state.as_bytes()[1], 0);
        state.reset();
        assert!(state.is_active(u16::MAX));
    }

    #[test]
    fn deactivation_cascades_to_children() {
        let mut tree = CategoryTree::new();
        tree.define(info(1, 0));
        tree.define(info(2, 1));
        tree.define(info(3, 2));
        tree.define(info(4, 0));

        let touched = tree.set_active(1, false);
        assert_eq!(touched, vec![1, 2, 3]);
        assert!(!tree.is_active(3));
        assert!(tree.is_active(4));

        tree.set_active(2, true);
        assert!(tree.is_active(2));
        assert!(tree.is_active(3));
        assert!(!tree.is_active(1));
    }

    #[test]
    fn cycles_terminate() {
        let mut tree = CategoryTree::new();
        tree.define(info(5, 6));
        tree.define(info(6, 5));
        tree.define(info(7, 7));
        let mut touched = tree.set_active(5, false);
        touched.sort_unstable();
        assert_eq!(touched, vec![5, 6]);
        assert_eq!(tree.set_active(7, false), vec![7]);
    }

    #[test]
    fn define_applies_default_state() {
        let mut tree = CategoryTree::new();
        tree.define(CategoryInfo {
            default_active: false,
            ..info(12, 0)
        });
        assert!(!tree.is_active(12));
        assert_eq!(tree.get(12).unwrap().name, "cat12");
        tree.reset();
        assert!(tree.is_empty());
        assert!(tree.is_active(12));
    }
}
