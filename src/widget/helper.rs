//! Ownership of every widget a display manager creates in its view.

use std::collections::BTreeMap;
use std::rc::Rc;

use glam::DVec3;

use super::{Representation, Widget, WidgetHook, WidgetId, WidgetRole, WidgetStyle};
use crate::constants::SEED_GLYPH_SCALE_FACTOR;
use crate::model::NodeId;

/// The widgets of one node in one view. Every slot is optional.
#[derive(Debug, Default)]
pub struct WidgetSet {
    pub primary: Option<Widget>,
    pub marker: Option<Widget>,
    pub over: Option<Widget>,
    pub under: Option<Widget>,
}

impl WidgetSet {
    fn slot(&mut self, role: WidgetRole) -> Option<&mut Option<Widget>> {
        match role {
            WidgetRole::Primary => Some(&mut self.primary),
            WidgetRole::IntersectionMarker => Some(&mut self.marker),
            WidgetRole::OverProjection => Some(&mut self.over),
            WidgetRole::UnderProjection => Some(&mut self.under),
            WidgetRole::Seed => None,
        }
    }

    pub fn get(&self, role: WidgetRole) -> Option<&Widget> {
        match role {
            WidgetRole::Primary => self.primary.as_ref(),
            WidgetRole::IntersectionMarker => self.marker.as_ref(),
            WidgetRole::OverProjection => self.over.as_ref(),
            WidgetRole::UnderProjection => self.under.as_ref(),
            WidgetRole::Seed => None,
        }
    }

    fn drain(&mut self) -> Vec<Widget> {
        [
            self.primary.take(),
            self.marker.take(),
            self.over.take(),
            self.under.take(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn is_empty(&self) -> bool {
        self.primary.is_none() && self.marker.is_none() && self.over.is_none() && self.under.is_none()
    }
}

/// Creation/release counters, used by diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HelperStats {
    pub created: usize,
    pub released: usize,
}

impl HelperStats {
    pub fn live(&self) -> usize {
        self.created - self.released
    }
}

/// Maps each node to its widgets in one view.
///
/// At most one widget per (node, role) exists. Lookups of an absent node
/// return `None`; removal of an absent node is a no-op.
pub struct WidgetLifecycleHelper {
    view_id: String,
    widgets: BTreeMap<NodeId, WidgetSet>,
    seed: Option<Widget>,
    hook: Option<Rc<dyn WidgetHook>>,
    next_id: u64,
    stats: HelperStats,
}

impl WidgetLifecycleHelper {
    pub fn new(view_id: impl Into<String>) -> Self {
        Self {
            view_id: view_id.into(),
            widgets: BTreeMap::new(),
            seed: None,
            hook: None,
            next_id: 1,
            stats: HelperStats::default(),
        }
    }

    pub fn view_id(&self) -> &str {
        &self.view_id
    }

    pub fn set_hook(&mut self, hook: Option<Rc<dyn WidgetHook>>) {
        self.hook = hook;
    }

    fn make_widget(
        &mut self,
        node: Option<NodeId>,
        role: WidgetRole,
        representation: Representation,
    ) -> Widget {
        let id = WidgetId(self.next_id);
        self.next_id += 1;
        self.stats.created += 1;
        Widget::new(id, node, role, representation, self.hook.clone())
    }

    fn release(&mut self, mut widget: Widget) {
        widget.set_enabled(false);
        self.stats.released += 1;
        if let Some(hook) = &self.hook {
            hook.widget_removed(&self.view_id, &widget);
        }
        log::trace!(
            "Released {:?} widget {:?} in {}",
            widget.role(),
            widget.id(),
            self.view_id
        );
    }

    /// Return the node's widget for `role`, creating it if needed.
    ///
    /// An existing widget of the requested representation is returned as is.
    /// One of a stale representation is released and replaced. The flag is
    /// true when a new widget was created.
    pub fn create_or_get(
        &mut self,
        node: NodeId,
        role: WidgetRole,
        representation: Representation,
    ) -> Option<(&mut Widget, bool)> {
        if role == WidgetRole::Seed {
            log::error!("Seed widgets are not bound to a node; use set_seed");
            return None;
        }

        let stale = match self.widgets.entry(node).or_default().slot(role) {
            Some(slot) if slot.as_ref().is_some_and(|w| w.representation() != representation) => {
                slot.take()
            }
            _ => None,
        };
        if let Some(widget) = stale {
            log::debug!(
                "🔁 Replacing {:?} widget of {} ({:?} -> {:?})",
                role,
                node,
                widget.representation(),
                representation
            );
            self.release(widget);
        }

        let needs_widget = self
            .widgets
            .get(&node)
            .and_then(|set| set.get(role))
            .is_none();
        let fresh = if needs_widget {
            Some(self.make_widget(Some(node), role, representation))
        } else {
            None
        };
        let created = fresh.is_some();
        if let (Some(widget), Some(hook)) = (fresh.as_ref(), self.hook.as_ref()) {
            hook.widget_created(&self.view_id, widget);
        }

        let slot = self.widgets.get_mut(&node)?.slot(role)?;
        if let Some(widget) = fresh {
            *slot = Some(widget);
        }
        slot.as_mut().map(|widget| (widget, created))
    }

    pub fn get(&self, node: NodeId, role: WidgetRole) -> Option<&Widget> {
        self.widgets.get(&node)?.get(role)
    }

    pub fn get_mut(&mut self, node: NodeId, role: WidgetRole) -> Option<&mut Widget> {
        self.widgets.get_mut(&node)?.slot(role)?.as_mut()
    }

    pub fn widget_set(&self, node: NodeId) -> Option<&WidgetSet> {
        self.widgets.get(&node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.widgets.get(&node).is_some_and(|set| !set.is_empty())
    }

    /// Release one role of a node. Returns true if a widget was released.
    pub fn remove_role(&mut self, node: NodeId, role: WidgetRole) -> bool {
        let widget = self
            .widgets
            .get_mut(&node)
            .and_then(|set| set.slot(role))
            .and_then(Option::take);
        match widget {
            Some(widget) => {
                self.release(widget);
                true
            }
            None => false,
        }
    }

    /// Release every widget of one node. Returns the number released.
    pub fn remove_one(&mut self, node: NodeId) -> usize {
        let Some(mut set) = self.widgets.remove(&node) else {
            return 0;
        };
        let widgets = set.drain();
        let count = widgets.len();
        for widget in widgets {
            self.release(widget);
        }
        count
    }

    /// Release every widget, including the seed. Returns the number released.
    pub fn remove_all(&mut self) -> usize {
        let nodes: Vec<NodeId> = self.widgets.keys().copied().collect();
        let mut count: usize = nodes.into_iter().map(|node| self.remove_one(node)).sum();
        if self.clear_seed() {
            count += 1;
        }
        count
    }

    /// Input processing follows the lock flag. Returns true if it was written.
    pub fn update_locked(&mut self, node: NodeId, locked: bool) -> bool {
        match self.get_mut(node, WidgetRole::Primary) {
            Some(widget) if widget.process_events() == locked => widget.set_process_events(!locked),
            _ => false,
        }
    }

    /// Enable the primary widget iff `visible`. Returns true if it was written.
    ///
    /// A handle that becomes visible again gets its interaction completed so
    /// state left over from an earlier drag is not rendered.
    pub fn update_visible(&mut self, node: NodeId, visible: bool) -> bool {
        let Some(widget) = self.get_mut(node, WidgetRole::Primary) else {
            return false;
        };
        if widget.is_enabled() == visible {
            return false;
        }
        widget.set_enabled(visible);
        if visible && widget.representation().is_seed_style() {
            widget.complete_interaction();
        }
        true
    }

    /// Show an in-progress placement marker at `points`.
    pub fn set_seed(&mut self, points: Vec<DVec3>, representation: Representation, epsilon: f64) {
        let mut seed = match self.seed.take() {
            Some(seed) if seed.representation() == representation => seed,
            stale => {
                if let Some(stale) = stale {
                    self.release(stale);
                }
                let seed = self.make_widget(None, WidgetRole::Seed, representation);
                if let Some(hook) = &self.hook {
                    hook.widget_created(&self.view_id, &seed);
                }
                seed
            }
        };
        seed.set_world_points(points, epsilon);
        seed.set_style(WidgetStyle {
            glyph_scale: WidgetStyle::default().glyph_scale * SEED_GLYPH_SCALE_FACTOR,
            ..WidgetStyle::default()
        });
        seed.set_enabled(true);
        self.seed = Some(seed);
    }

    pub fn seed(&self) -> Option<&Widget> {
        self.seed.as_ref()
    }

    /// Drop the seed marker. Returns true if there was one.
    pub fn clear_seed(&mut self) -> bool {
        match self.seed.take() {
            Some(seed) => {
                self.release(seed);
                true
            }
            None => false,
        }
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.widgets
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of live widgets, seed included.
    pub fn len(&self) -> usize {
        self.stats.live()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> HelperStats {
        self.stats
    }
}

impl std::fmt::Debug for WidgetLifecycleHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetLifecycleHelper")
            .field("view_id", &self.view_id)
            .field("nodes", &self.widgets.len())
            .field("stats", &self.stats)
            .finish()
    }
}
