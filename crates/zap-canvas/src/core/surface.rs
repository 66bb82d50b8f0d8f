//! The entity registry and render loop.
//!
//! A [`Surface`] owns one generational arena per entity kind, hands out
//! identifiers on attach, keeps draw order, runs the frame loop and owns the
//! shared tween engine. Pointer dispatch, focus, drag and resize live in
//! [`interaction`](super::interaction) as a second `impl Surface` block.
//!
//! Callbacks (control events, component and hook lifecycles, tween
//! completions) receive `&mut Surface`. Each one is taken out of its slot for
//! the duration of the call and put back afterwards if its entity survived,
//! and every loop over a collection runs over a snapshot of ids, so callbacks
//! may attach or detach anything, including themselves.

use glam::DVec2;

use super::arena::Arena;
use super::interaction::Interaction;
use crate::animation::tween::{TweenId, TweenSpec, TweenState};
use crate::api::app::SurfaceConfig;
use crate::api::types::{
    ComponentId, ControlId, DrawableId, EntityId, EntityKind, GroupId, PointerHookId,
    RenderHookId,
};
use crate::components::component::Composite;
use crate::components::control::{Control, ControlEvent};
use crate::components::drawable::Drawable;
use crate::components::group::{Group, Membership};
use crate::components::hooks::{PointerHook, RenderHook};
use crate::renderer::traits::RenderTarget;

/// Anything that can be attached to a surface.
pub enum Entity {
    Drawable(Drawable),
    Control(Control),
    Group(Group),
    Component(Composite),
    RenderHook(Box<dyn RenderHook>),
    PointerHook(Box<dyn PointerHook>),
}

impl From<Drawable> for Entity {
    fn from(drawable: Drawable) -> Self {
        Entity::Drawable(drawable)
    }
}

impl From<Control> for Entity {
    fn from(control: Control) -> Self {
        Entity::Control(control)
    }
}

impl From<Group> for Entity {
    fn from(group: Group) -> Self {
        Entity::Group(group)
    }
}

impl From<Composite> for Entity {
    fn from(component: Composite) -> Self {
        Entity::Component(component)
    }
}

/// Borrowed view of an attached entity, returned by [`Surface::get`].
#[derive(Debug)]
pub enum EntityRef<'a> {
    Drawable(&'a Drawable),
    Control(&'a Control),
    Group(&'a Group),
    Component(&'a Composite),
    RenderHook(RenderHookId),
    PointerHook(PointerHookId),
}

/// What one call to [`Surface::render`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Drawables drawn, sticky ones included.
    pub drawn: usize,
    /// Visible non-sticky drawables rejected by the viewport test.
    pub culled: usize,
}

pub struct Surface {
    config: SurfaceConfig,
    pub(crate) size: DVec2,
    pub(crate) drawables: Arena<Drawable>,
    pub(crate) controls: Arena<Control>,
    pub(crate) groups: Arena<Group>,
    pub(crate) components: Arena<Composite>,
    render_hooks: Arena<Option<Box<dyn RenderHook>>>,
    pointer_hooks: Arena<Option<Box<dyn PointerHook>>>,
    draw_order: Vec<DrawableId>,
    hit_order: Vec<ControlId>,
    order_dirty: bool,
    next_index: u64,
    pub(crate) interaction: Interaction,
    pub(crate) tweens: TweenState,
    no_refresh: bool,
    render_pending: bool,
    frames: u64,
    /// Last host timestamp seen by `advance`.
    pub(crate) clock: Option<f64>,
}

impl Surface {
    pub fn new(config: SurfaceConfig) -> Self {
        Self {
            size: DVec2::new(config.width, config.height),
            config,
            drawables: Arena::new(),
            controls: Arena::new(),
            groups: Arena::new(),
            components: Arena::new(),
            render_hooks: Arena::new(),
            pointer_hooks: Arena::new(),
            draw_order: Vec::new(),
            hit_order: Vec::new(),
            order_dirty: false,
            next_index: 0,
            interaction: Interaction::default(),
            tweens: TweenState::new(),
            no_refresh: false,
            render_pending: false,
            frames: 0,
            clock: None,
        }
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Surface size in pixels.
    pub fn size(&self) -> DVec2 {
        self.size
    }

    /// Number of frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tweens(&self) -> &TweenState {
        &self.tweens
    }

    pub fn tweens_mut(&mut self) -> &mut TweenState {
        &mut self.tweens
    }

    // -- Attach --

    /// Attach any entity and return its identifier.
    pub fn attach(&mut self, entity: impl Into<Entity>) -> EntityId {
        match entity.into() {
            Entity::Drawable(d) => self.attach_drawable(d).into(),
            Entity::Control(c) => self.attach_control(c).into(),
            Entity::Group(g) => self.attach_group(g).into(),
            Entity::Component(c) => self.attach_component(c).into(),
            Entity::RenderHook(h) => self.attach_render_hook(h).into(),
            Entity::PointerHook(h) => self.attach_pointer_hook(h).into(),
        }
    }

    pub fn attach_drawable(&mut self, mut drawable: Drawable) -> DrawableId {
        drawable.draw_index = self.bump_index();
        drawable.group = None;
        drawable.control = None;
        drawable.hover = false;
        let id = DrawableId(self.drawables.insert(drawable));
        if let Some(d) = self.drawables.get_mut(id.key()) {
            d.id = Some(id);
        }
        self.order_dirty = true;
        log::debug!("attached {:?}", id);
        self.refresh();
        id
    }

    /// Attach a control. A drawable given through
    /// [`Control::with_drawable`] is bound right away.
    pub fn attach_control(&mut self, mut control: Control) -> ControlId {
        let pending = control.drawable.take();
        control.group = None;
        let id = ControlId(self.controls.insert(control));
        if let Some(c) = self.controls.get_mut(id.key()) {
            c.id = Some(id);
        }
        if let Some(drawable) = pending {
            self.bind(id, drawable);
        }
        self.order_dirty = true;
        log::debug!("attached {:?}", id);
        self.fire(id, ControlEvent::Attach);
        self.refresh();
        id
    }

    pub fn attach_group(&mut self, group: Group) -> GroupId {
        let id = GroupId(self.groups.insert(group));
        if let Some(g) = self.groups.get_mut(id.key()) {
            g.id = Some(id);
        }
        log::debug!("attached {:?}", id);
        id
    }

    /// Attach a component and run its `on_attach`.
    pub fn attach_component(&mut self, component: Composite) -> ComponentId {
        let id = ComponentId(self.components.insert(component));
        if let Some(c) = self.components.get_mut(id.key()) {
            c.id = Some(id);
        }
        log::debug!("attached {:?}", id);
        let behavior = self
            .components
            .get_mut(id.key())
            .and_then(|c| c.behavior.take());
        if let Some(mut behavior) = behavior {
            behavior.on_attach(self, id);
            if let Some(c) = self.components.get_mut(id.key()) {
                c.behavior.get_or_insert(behavior);
            }
        }
        self.refresh();
        id
    }

    pub fn attach_render_hook(&mut self, hook: Box<dyn RenderHook>) -> RenderHookId {
        let id = RenderHookId(self.render_hooks.insert(Some(hook)));
        log::debug!("attached {:?}", id);
        if let Some(mut hook) = self.render_hooks.get_mut(id.key()).and_then(Option::take) {
            hook.on_attach(self, id);
            self.restore_render_hook(id, hook);
        }
        self.refresh();
        id
    }

    pub fn attach_pointer_hook(&mut self, hook: Box<dyn PointerHook>) -> PointerHookId {
        let id = PointerHookId(self.pointer_hooks.insert(Some(hook)));
        log::debug!("attached {:?}", id);
        if let Some(mut hook) = self.pointer_hooks.get_mut(id.key()).and_then(Option::take) {
            hook.on_attach(self, id);
            self.restore_pointer_hook(id, hook);
        }
        id
    }

    // -- Lookup --

    /// Category-routed lookup. Unknown and stale ids resolve to `None`.
    pub fn get(&self, id: EntityId) -> Option<EntityRef<'_>> {
        match id.kind {
            EntityKind::Drawable => self.drawables.get(id.key).map(EntityRef::Drawable),
            EntityKind::Control => self.controls.get(id.key).map(EntityRef::Control),
            EntityKind::Group => self.groups.get(id.key).map(EntityRef::Group),
            EntityKind::Component => self.components.get(id.key).map(EntityRef::Component),
            EntityKind::RenderHook => self
                .render_hooks
                .contains(id.key)
                .then_some(EntityRef::RenderHook(RenderHookId(id.key))),
            EntityKind::PointerHook => self
                .pointer_hooks
                .contains(id.key)
                .then_some(EntityRef::PointerHook(PointerHookId(id.key))),
        }
    }

    pub fn contains(&self, id: impl Into<EntityId>) -> bool {
        self.get(id.into()).is_some()
    }

    pub fn drawable(&self, id: DrawableId) -> Option<&Drawable> {
        self.drawables.get(id.key())
    }

    pub fn drawable_mut(&mut self, id: DrawableId) -> Option<&mut Drawable> {
        self.drawables.get_mut(id.key())
    }

    pub fn control(&self, id: ControlId) -> Option<&Control> {
        self.controls.get(id.key())
    }

    pub fn control_mut(&mut self, id: ControlId) -> Option<&mut Control> {
        self.controls.get_mut(id.key())
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.key())
    }

    /// Membership changes go through [`group_add`](Self::group_add) and
    /// [`group_remove`](Self::group_remove).
    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(id.key())
    }

    pub fn component(&self, id: ComponentId) -> Option<&Composite> {
        self.components.get(id.key())
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Composite> {
        self.components.get_mut(id.key())
    }

    /// Number of live entities of `kind`.
    pub fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Drawable => self.drawables.len(),
            EntityKind::Control => self.controls.len(),
            EntityKind::Group => self.groups.len(),
            EntityKind::Component => self.components.len(),
            EntityKind::RenderHook => self.render_hooks.len(),
            EntityKind::PointerHook => self.pointer_hooks.len(),
        }
    }

    // -- Detach --

    /// Detach every listed entity. Unknown, stale and non-removable ids are
    /// skipped silently. Returns how many entities were actually removed.
    pub fn detach<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<EntityId>,
    {
        let mut removed = 0;
        for id in ids {
            let id = id.into();
            let done = match id.kind {
                EntityKind::Drawable => self.detach_drawable(DrawableId(id.key)).is_some(),
                EntityKind::Control => self.detach_control(ControlId(id.key)).is_some(),
                EntityKind::Group => self.detach_group(GroupId(id.key)).is_some(),
                EntityKind::Component => self.detach_component(ComponentId(id.key)).is_some(),
                EntityKind::RenderHook => self.detach_render_hook(RenderHookId(id.key)),
                EntityKind::PointerHook => self.detach_pointer_hook(PointerHookId(id.key)),
            };
            if done {
                removed += 1;
            }
        }
        removed
    }

    /// Detach a drawable and hand it back with its identifier cleared.
    /// Tweens targeting it are dropped; a bound control stays attached,
    /// unbound.
    pub fn detach_drawable(&mut self, id: DrawableId) -> Option<Drawable> {
        let (group, control) = {
            let d = self.drawables.get(id.key())?;
            (d.group, d.control)
        };
        if let Some(group) = group.and_then(|g| self.groups.get_mut(g.key())) {
            group.remove(id.into());
        }
        if let Some(c) = control.and_then(|c| self.controls.get_mut(c.key())) {
            c.drawable = None;
        }
        self.forget_child(id.into());
        self.tweens.remove_target(id);
        let mut drawable = self.drawables.remove(id.key())?;
        self.draw_order.retain(|d| *d != id);
        drawable.id = None;
        drawable.group = None;
        drawable.control = None;
        drawable.hover = false;
        log::debug!("detached {:?}", id);
        self.refresh();
        Some(drawable)
    }

    /// Detach a control and hand it back with its identifier cleared.
    /// Non-removable controls stay attached and yield `None`.
    pub fn detach_control(&mut self, id: ControlId) -> Option<Control> {
        let group = {
            let c = self.controls.get(id.key())?;
            if !c.removable {
                log::debug!("{:?} is not removable", id);
                return None;
            }
            c.group
        };
        if let Some(group) = group.and_then(|g| self.groups.get_mut(g.key())) {
            group.remove(id.into());
        }
        if let Some(c) = self.controls.get_mut(id.key()) {
            c.group = None;
        }
        self.fire(id, ControlEvent::Detach);

        // The detach callback may have removed the control itself.
        let mut control = self.controls.remove(id.key())?;
        self.interaction.forget(id);
        if let Some(d) = control.drawable.and_then(|d| self.drawables.get_mut(d.key())) {
            d.control = None;
            d.hover = false;
        }
        self.forget_child(id.into());
        self.hit_order.retain(|c| *c != id);
        control.id = None;
        control.group = None;
        control.drawable = None;
        log::debug!("detached {:?}", id);
        self.refresh();
        Some(control)
    }

    /// Detach a group and clear every member's back-reference to it.
    /// The members themselves stay attached.
    pub fn detach_group(&mut self, id: GroupId) -> Option<Group> {
        let mut group = self.groups.remove(id.key())?;
        for member in group.take_members() {
            self.set_member_group(member, None);
        }
        group.id = None;
        log::debug!("detached {:?}", id);
        Some(group)
    }

    /// Run the component's `on_detach`, then detach every adopted child that
    /// is still attached.
    pub fn detach_component(&mut self, id: ComponentId) -> Option<Composite> {
        let behavior = self.components.get_mut(id.key())?.behavior.take();
        if let Some(mut behavior) = behavior {
            behavior.on_detach(self, id);
            if let Some(c) = self.components.get_mut(id.key()) {
                c.behavior.get_or_insert(behavior);
            }
        }
        let children = self.components.get(id.key())?.children.clone();
        self.detach(children);

        let mut component = self.components.remove(id.key())?;
        if let Some(group) = component.group.and_then(|g| self.groups.get_mut(g.key())) {
            group.remove(id.into());
        }
        self.forget_child(id.into());
        component.id = None;
        component.group = None;
        component.children.clear();
        log::debug!("detached {:?}", id);
        self.refresh();
        Some(component)
    }

    /// A hook that detaches itself from inside one of its own callbacks is
    /// dropped without `on_detach`.
    pub fn detach_render_hook(&mut self, id: RenderHookId) -> bool {
        let Some(slot) = self.render_hooks.get_mut(id.key()) else {
            return false;
        };
        if let Some(mut hook) = slot.take() {
            hook.on_detach(self, id);
        }
        let removed = self.render_hooks.remove(id.key()).is_some();
        if removed {
            log::debug!("detached {:?}", id);
            self.refresh();
        }
        removed
    }

    pub fn detach_pointer_hook(&mut self, id: PointerHookId) -> bool {
        let Some(slot) = self.pointer_hooks.get_mut(id.key()) else {
            return false;
        };
        if let Some(mut hook) = slot.take() {
            hook.on_detach(self, id);
        }
        let removed = self.pointer_hooks.remove(id.key()).is_some();
        if removed {
            log::debug!("detached {:?}", id);
        }
        removed
    }

    /// Drop `child` from whichever component adopted it.
    fn forget_child(&mut self, child: EntityId) {
        for (_, component) in self.components.iter_mut() {
            component.children.retain(|c| *c != child);
        }
    }

    // -- Binding --

    /// Bind `control` to `drawable`. Fails soft (returns false) when either
    /// is missing or the drawable already belongs to another control.
    pub fn bind(&mut self, control: ControlId, drawable: DrawableId) -> bool {
        let (Some(c), Some(d)) = (
            self.controls.get(control.key()),
            self.drawables.get(drawable.key()),
        ) else {
            return false;
        };
        if let Some(other) = d.control {
            if other != control {
                log::warn!("{:?} is already bound to {:?}", drawable, other);
                return false;
            }
        }
        if let Some(previous) = c.drawable.filter(|p| *p != drawable) {
            if let Some(p) = self.drawables.get_mut(previous.key()) {
                p.control = None;
                p.hover = false;
            }
        }
        if let Some(c) = self.controls.get_mut(control.key()) {
            c.drawable = Some(drawable);
        }
        if let Some(d) = self.drawables.get_mut(drawable.key()) {
            if d.control != Some(control) {
                d.hover = false;
            }
            d.control = Some(control);
        }
        self.order_dirty = true;
        true
    }

    // -- Groups --

    /// Add `member` to `group`, leaving any group it was in before.
    /// Only drawables, controls and components can join a group.
    pub fn group_add(
        &mut self,
        group: GroupId,
        member: impl Into<EntityId>,
        membership: Membership,
    ) -> bool {
        let member = member.into();
        if !self.groups.contains(group.key()) {
            return false;
        }
        let Some(previous) = self.member_group(member) else {
            return false;
        };
        if let Some(previous) = previous.filter(|p| *p != group) {
            if let Some(g) = self.groups.get_mut(previous.key()) {
                g.remove(member);
            }
        }
        if let Some(g) = self.groups.get_mut(group.key()) {
            g.insert(member, membership);
        }
        self.set_member_group(member, Some(group))
    }

    pub fn group_remove(&mut self, group: GroupId, member: impl Into<EntityId>) -> bool {
        let member = member.into();
        let removed = self
            .groups
            .get_mut(group.key())
            .map(|g| g.remove(member))
            .unwrap_or(false);
        if removed {
            self.set_member_group(member, None);
        }
        removed
    }

    /// `Some(group)` for a live member kind, `None` for anything that cannot
    /// be a member.
    fn member_group(&self, member: EntityId) -> Option<Option<GroupId>> {
        match member.kind {
            EntityKind::Drawable => self.drawables.get(member.key).map(|d| d.group),
            EntityKind::Control => self.controls.get(member.key).map(|c| c.group),
            EntityKind::Component => self.components.get(member.key).map(|c| c.group),
            _ => None,
        }
    }

    fn set_member_group(&mut self, member: EntityId, group: Option<GroupId>) -> bool {
        let slot = match member.kind {
            EntityKind::Drawable => self.drawables.get_mut(member.key).map(|d| &mut d.group),
            EntityKind::Control => self.controls.get_mut(member.key).map(|c| &mut c.group),
            EntityKind::Component => self.components.get_mut(member.key).map(|c| &mut c.group),
            _ => None,
        };
        match slot {
            Some(slot) => {
                *slot = group;
                true
            }
            None => false,
        }
    }

    /// Group of a drawable, directly or through its bound control.
    pub(crate) fn drawable_group(&self, id: DrawableId) -> Option<GroupId> {
        let d = self.drawables.get(id.key())?;
        d.group.or_else(|| {
            d.control
                .and_then(|c| self.controls.get(c.key()))
                .and_then(|c| c.group)
        })
    }

    /// Drawables behind a list of members: drawables themselves, the
    /// drawable bound to a control, the drawable children of a component.
    pub(crate) fn member_drawables(&self, members: &[EntityId]) -> Vec<DrawableId> {
        let mut out: Vec<DrawableId> = Vec::new();
        let mut push = |id: DrawableId| {
            if !out.contains(&id) {
                out.push(id);
            }
        };
        for member in members {
            match member.kind {
                EntityKind::Drawable => {
                    if self.drawables.contains(member.key) {
                        push(DrawableId(member.key));
                    }
                }
                EntityKind::Control => {
                    if let Some(d) = self.controls.get(member.key).and_then(|c| c.drawable) {
                        push(d);
                    }
                }
                EntityKind::Component => {
                    if let Some(c) = self.components.get(member.key) {
                        for child in &c.children {
                            if child.kind == EntityKind::Drawable
                                && self.drawables.contains(child.key)
                            {
                                push(DrawableId(child.key));
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// Every drawable reachable from a group's members, grouped first.
    pub fn group_drawables(&self, group: GroupId) -> Vec<DrawableId> {
        match self.groups.get(group.key()) {
            Some(g) => self.member_drawables(&g.members().collect::<Vec<_>>()),
            None => Vec::new(),
        }
    }

    // -- Components --

    /// Record `child` as created by `component`. A sticky component makes
    /// its drawable children sticky, including drawables of adopted controls.
    pub fn adopt(&mut self, component: ComponentId, child: impl Into<EntityId>) -> bool {
        let child = child.into();
        if self.get(child).is_none() || EntityId::from(component) == child {
            return false;
        }
        let Some(c) = self.components.get_mut(component.key()) else {
            return false;
        };
        if !c.children.contains(&child) {
            c.children.push(child);
        }
        if c.sticky {
            for drawable in self.member_drawables(&[child]) {
                if let Some(d) = self.drawables.get_mut(drawable.key()) {
                    d.sticky = true;
                }
            }
        }
        true
    }

    /// Move a component and every drawable it adopted, directly or through
    /// an adopted control.
    pub fn move_component(&mut self, id: ComponentId, delta: DVec2) -> bool {
        let Some(c) = self.components.get_mut(id.key()) else {
            return false;
        };
        c.position += delta;
        let children = c.children.clone();
        for drawable in self.member_drawables(&children) {
            if let Some(d) = self.drawables.get_mut(drawable.key()) {
                d.transform.translate(delta);
            }
        }
        self.refresh();
        true
    }

    // -- Ordering --

    fn bump_index(&mut self) -> u64 {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    /// Re-sort draw and hit order if anything changed since the last sort.
    /// Hit order is the draw order of each control's drawable, reversed.
    pub(crate) fn sort_if_dirty(&mut self) {
        if !self.order_dirty {
            return;
        }
        let mut draws: Vec<(u64, DrawableId)> = self
            .drawables
            .iter()
            .map(|(key, d)| (d.draw_index, DrawableId(key)))
            .collect();
        draws.sort_by_key(|(index, _)| *index);
        self.draw_order = draws.into_iter().map(|(_, id)| id).collect();

        let mut hits: Vec<(Option<u64>, ControlId)> = self
            .controls
            .iter()
            .map(|(key, c)| {
                let index = c
                    .drawable
                    .and_then(|d| self.drawables.get(d.key()))
                    .map(|d| d.draw_index);
                (index, ControlId(key))
            })
            .collect();
        // Unbound controls (None) sort last.
        hits.sort_by(|a, b| b.0.cmp(&a.0));
        self.hit_order = hits.into_iter().map(|(_, id)| id).collect();
        self.order_dirty = false;
        log::trace!(
            "resorted {} drawables, {} controls",
            self.draw_order.len(),
            self.hit_order.len()
        );
    }

    /// Drawables in draw order, bottom first.
    pub fn draw_order(&mut self) -> &[DrawableId] {
        self.sort_if_dirty();
        &self.draw_order
    }

    /// Controls in hit-test order, topmost first.
    pub fn hit_order(&mut self) -> &[ControlId] {
        self.sort_if_dirty();
        &self.hit_order
    }

    /// Raise a drawable, and every drawable of its group, to the top of draw
    /// order. The drawable itself ends up topmost.
    pub fn to_front(&mut self, id: DrawableId) {
        if !self.drawables.contains(id.key()) {
            return;
        }
        let mut lift: Vec<DrawableId> = match self.drawable_group(id) {
            Some(group) => self.group_drawables(group),
            None => Vec::new(),
        };
        lift.retain(|d| *d != id);
        lift.push(id);
        for drawable in lift {
            let index = self.bump_index();
            if let Some(d) = self.drawables.get_mut(drawable.key()) {
                d.draw_index = index;
            }
        }
        self.order_dirty = true;
        self.refresh();
    }

    /// Other drawables whose center lies within an axis-aligned box of
    /// half-size `radius` around this one's center.
    pub fn near(&self, id: DrawableId, radius: f64) -> Vec<DrawableId> {
        let Some(center) = self.drawables.get(id.key()).map(Drawable::position) else {
            return Vec::new();
        };
        self.drawables
            .iter()
            .map(|(key, d)| (DrawableId(key), d.position()))
            .filter(|(other, p)| {
                *other != id && (p.x - center.x).abs() <= radius && (p.y - center.y).abs() <= radius
            })
            .map(|(other, _)| other)
            .collect()
    }

    // -- Render loop --

    /// Ask for one render on the next frame, unless refresh is suppressed.
    pub fn refresh(&mut self) {
        if !self.no_refresh {
            self.render_pending = true;
        }
    }

    pub fn set_no_refresh(&mut self, no_refresh: bool) {
        self.no_refresh = no_refresh;
    }

    pub fn needs_render(&self) -> bool {
        self.render_pending
    }

    /// Run `f` with refresh suppressed, then refresh once.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Surface) -> R) -> R {
        let previous = self.no_refresh;
        self.no_refresh = true;
        let result = f(self);
        self.no_refresh = previous;
        self.refresh();
        result
    }

    /// Whether the host should schedule another frame.
    pub fn wants_frame(&self) -> bool {
        self.render_pending || self.tweens.is_running() || self.interaction.has_timers()
    }

    /// One host frame: fire due timers, tick animations, render if needed.
    /// Returns whether another frame is wanted.
    pub fn frame<T: RenderTarget>(&mut self, now: f64, target: &mut T) -> bool {
        self.advance(now);
        if self.tweens.is_running() {
            self.tick_tweens(now);
        }
        if self.render_pending {
            self.render(target);
        }
        self.wants_frame()
    }

    /// Advance the tween stack and run due completion callbacks.
    pub fn tick_tweens(&mut self, now: f64) {
        let outcome = self.tweens.tick(now, &mut self.drawables);
        if outcome.advanced > 0 {
            self.refresh();
        }
        for (id, mut callback) in outcome.completed {
            callback(self);
            self.tweens.restore_complete(id, callback);
        }
    }

    /// Start one tween per target. Visible group members of each target join
    /// in unless the tween is solo; `on_complete` is wired to the first target
    /// only. Returns one handle per started tween.
    pub fn animate(&mut self, spec: TweenSpec) -> Vec<TweenId> {
        let TweenSpec {
            targets,
            duration,
            effect,
            smuggler,
            looping,
            solo,
            mut on_complete,
        } = spec;

        let mut expanded: Vec<DrawableId> = Vec::new();
        for target in targets {
            if !self.drawables.contains(target.key()) || expanded.contains(&target) {
                continue;
            }
            expanded.push(target);
            if solo {
                continue;
            }
            let Some(group) = self.drawable_group(target) else {
                continue;
            };
            for member in self.group_drawables(group) {
                let visible = self.drawables.get(member.key()).is_some_and(|d| d.visible);
                if visible && !expanded.contains(&member) {
                    expanded.push(member);
                }
            }
        }

        expanded
            .into_iter()
            .map(|target| {
                self.tweens.push(
                    target,
                    duration,
                    effect.clone(),
                    smuggler.clone(),
                    looping,
                    on_complete.take(),
                    self.clock,
                )
            })
            .collect()
    }

    /// Draw one frame into `target`: pre-draw hooks, visible non-sticky
    /// drawables inside the viewport, sticky drawables, post-draw hooks,
    /// then present.
    pub fn render<T: RenderTarget>(&mut self, target: &mut T) -> FrameStats {
        self.sort_if_dirty();
        self.render_pending = false;
        target.begin_frame(self.size.x, self.size.y);

        for key in self.render_hooks.keys() {
            let id = RenderHookId(key);
            if let Some(mut hook) = self.render_hooks.get_mut(key).and_then(Option::take) {
                hook.before_draw(self, target);
                self.restore_render_hook(id, hook);
            }
        }

        let mut stats = FrameStats::default();
        let mut sticky = Vec::new();
        for id in self.draw_order.clone() {
            let Some(d) = self.drawables.get(id.key()) else {
                continue;
            };
            if !d.visible {
                continue;
            }
            if d.sticky {
                sticky.push(id);
            } else if d.in_viewport(self.size) {
                d.draw(target);
                stats.drawn += 1;
            } else {
                stats.culled += 1;
            }
        }
        for id in sticky {
            if let Some(d) = self.drawables.get(id.key()) {
                d.draw(target);
                stats.drawn += 1;
            }
        }

        for key in self.render_hooks.keys() {
            let id = RenderHookId(key);
            if let Some(mut hook) = self.render_hooks.get_mut(key).and_then(Option::take) {
                hook.after_draw(self, target);
                self.restore_render_hook(id, hook);
            }
        }

        target.present();
        self.frames += 1;
        log::trace!(
            "frame {}: drew {}, culled {}",
            self.frames,
            stats.drawn,
            stats.culled
        );
        stats
    }

    // -- Callback plumbing --

    /// Run the control's callback for `event`, if any.
    pub(crate) fn fire(&mut self, id: ControlId, event: ControlEvent) {
        let callback = self
            .controls
            .get_mut(id.key())
            .and_then(|c| c.handlers.take(event));
        if let Some(mut callback) = callback {
            log::trace!("{:?} -> {:?}", event, id);
            callback(self, id);
            if let Some(c) = self.controls.get_mut(id.key()) {
                c.handlers.restore(event, callback);
            }
        }
    }

    fn restore_render_hook(&mut self, id: RenderHookId, hook: Box<dyn RenderHook>) {
        if let Some(slot) = self.render_hooks.get_mut(id.key()) {
            slot.get_or_insert(hook);
        }
    }

    fn restore_pointer_hook(&mut self, id: PointerHookId, hook: Box<dyn PointerHook>) {
        if let Some(slot) = self.pointer_hooks.get_mut(id.key()) {
            slot.get_or_insert(hook);
        }
    }

    /// Run `f` on every pointer hook, in attach order.
    pub(crate) fn each_pointer_hook(
        &mut self,
        mut f: impl FnMut(&mut dyn PointerHook, &mut Surface),
    ) {
        for key in self.pointer_hooks.keys() {
            let id = PointerHookId(key);
            if let Some(mut hook) = self.pointer_hooks.get_mut(key).and_then(Option::take) {
                f(hook.as_mut(), self);
                self.restore_pointer_hook(id, hook);
            }
        }
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(SurfaceConfig::default())
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("size", &self.size)
            .field("drawables", &self.drawables.len())
            .field("controls", &self.controls.len())
            .field("groups", &self.groups.len())
            .field("components", &self.components.len())
            .field("tweens", &self.tweens.len())
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

/// Records draw calls instead of rasterizing. Test support.
#[cfg(test)]
pub(crate) mod recording {
    use lyon::path::Path;

    use crate::core::transform::Transform;
    use crate::renderer::traits::{DrawContext, RenderTarget, Style};

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Begin,
        Fill(Transform),
        Stroke(Transform),
        Present,
    }

    #[derive(Debug, Default)]
    pub struct RecordingTarget {
        pub calls: Vec<Call>,
        transform: Transform,
    }

    impl RecordingTarget {
        pub fn fills(&self) -> Vec<Transform> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Fill(t) => Some(*t),
                    _ => None,
                })
                .collect()
        }
    }

    impl DrawContext for RecordingTarget {
        fn save(&mut self) {}
        fn restore(&mut self) {}
        fn set_transform(&mut self, transform: &Transform) {
            self.transform = *transform;
        }
        fn set_style(&mut self, _style: &Style) {}
        fn fill(&mut self, _path: &Path) {
            self.calls.push(Call::Fill(self.transform));
        }
        fn stroke(&mut self, _path: &Path) {
            self.calls.push(Call::Stroke(self.transform));
        }
    }

    impl RenderTarget for RecordingTarget {
        fn backend(&self) -> &'static str {
            "recording"
        }
        fn begin_frame(&mut self, _width: f64, _height: f64) {
            self.calls.push(Call::Begin);
        }
        fn present(&mut self) {
            self.calls.push(Call::Present);
        }
    }
}
