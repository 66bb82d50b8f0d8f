// animation/tween.rs
//
// Tween engine: one shared stack of active animations per surface.
// Each entry targets one drawable by id; time is normalized against the
// entry's own start so effects only ever see t in [0, 1].
//
// Usage:
//   surface.animate(TweenSpec::fade_in(id).duration_ms(500.0));
//   surface.frame(now, &mut target);  // ticks every entry, then renders

use glam::DVec2;

use super::easing::Easing;
use super::effects::{Effect, Frame, Smuggler};
use crate::api::types::DrawableId;
use crate::components::drawable::Drawable;
use crate::core::arena::Arena;
use crate::core::surface::Surface;

/// Default animation length in ms.
pub const DEFAULT_DURATION_MS: f64 = 1000.0;

/// Handle to a tween for later reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TweenId(pub u32);

/// Runs with the surface once a cycle reaches t = 1.
pub type CompleteCallback = Box<dyn FnMut(&mut Surface)>;

/// Description of an animation, handed to [`Surface::animate`].
///
/// Several targets animate independently and in parallel; `on_complete`
/// fires for the first one only. A target that belongs to a group fans out
/// to every visible member unless `solo` is set.
pub struct TweenSpec {
    pub(crate) targets: Vec<DrawableId>,
    pub(crate) duration: f64,
    pub(crate) effect: Effect,
    pub(crate) smuggler: Smuggler,
    pub(crate) looping: bool,
    pub(crate) solo: bool,
    pub(crate) on_complete: Option<CompleteCallback>,
}

impl TweenSpec {
    pub fn new(target: DrawableId, effect: Effect) -> Self {
        Self::many(vec![target], effect)
    }

    pub fn many(targets: Vec<DrawableId>, effect: Effect) -> Self {
        Self {
            targets,
            duration: DEFAULT_DURATION_MS,
            effect,
            smuggler: Smuggler::default(),
            looping: false,
            solo: false,
            on_complete: None,
        }
    }

    /// Fade in from transparent.
    pub fn fade_in(target: DrawableId) -> Self {
        Self::new(target, Effect::FadeIn)
    }

    /// Fade out to transparent.
    pub fn fade_out(target: DrawableId) -> Self {
        Self::new(target, Effect::FadeOut)
    }

    /// Rotate by `degrees` from the current angle. Negative sweeps run
    /// counter-clockwise.
    pub fn rotate_by(target: DrawableId, degrees: f64) -> Self {
        let mut spec = Self::new(target, Effect::Rotate);
        spec.smuggler.angle = degrees.abs();
        spec.smuggler.clockwise = degrees >= 0.0;
        spec
    }

    /// Travel `distance` pixels along `heading` degrees.
    pub fn move_by(target: DrawableId, heading: f64, distance: f64) -> Self {
        let mut spec = Self::new(target, Effect::Move);
        spec.smuggler.angle = heading;
        spec.smuggler.distance = distance;
        spec
    }

    /// Scale from the current scale to `scale`.
    pub fn scale_to(target: DrawableId, scale: DVec2) -> Self {
        let mut spec = Self::new(target, Effect::Scale);
        spec.smuggler.to_scale = scale;
        spec
    }

    // -- Builder methods --

    pub fn duration_ms(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.smuggler.easing = easing;
        self
    }

    /// Replace the whole parameter bag.
    pub fn smuggler(mut self, smuggler: Smuggler) -> Self {
        self.smuggler = smuggler;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Animate only the listed targets, not their group members.
    pub fn solo(mut self, solo: bool) -> Self {
        self.solo = solo;
        self
    }

    pub fn on_complete(mut self, f: impl FnMut(&mut Surface) + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

/// A single entry on the stack.
pub struct Tween {
    id: TweenId,
    target: DrawableId,
    duration: f64,
    effect: Effect,
    smuggler: Smuggler,
    looping: bool,
    /// Host time of the current cycle's start; set on the first tick when
    /// the surface had no clock yet.
    start: Option<f64>,
    t: f64,
    on_complete: Option<CompleteCallback>,
}

impl Tween {
    pub fn id(&self) -> TweenId {
        self.id
    }

    pub fn target(&self) -> DrawableId {
        self.target
    }

    /// Normalized progress [0, 1] as of the last tick.
    pub fn progress(&self) -> f64 {
        self.t
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn smuggler(&self) -> &Smuggler {
        &self.smuggler
    }
}

impl std::fmt::Debug for Tween {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tween")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("duration", &self.duration)
            .field("effect", &self.effect)
            .field("looping", &self.looping)
            .field("t", &self.t)
            .finish_non_exhaustive()
    }
}

/// Result of one [`TweenState::tick`].
#[derive(Default)]
pub struct TickOutcome {
    /// Entries whose effect ran this tick.
    pub advanced: usize,
    /// Completion callbacks due, taken out of their entries.
    pub completed: Vec<(TweenId, CompleteCallback)>,
}

/// Manages all active tweens.
#[derive(Debug, Default)]
pub struct TweenState {
    stack: Vec<Tween>,
    next_id: u32,
    /// Scheduler state: started by the first push, stopped when the stack
    /// drains.
    running: bool,
}

impl TweenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put one entry on the stack and start the scheduler.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn push(
        &mut self,
        target: DrawableId,
        duration: f64,
        effect: Effect,
        smuggler: Smuggler,
        looping: bool,
        on_complete: Option<CompleteCallback>,
        now: Option<f64>,
    ) -> TweenId {
        let id = TweenId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.stack.push(Tween {
            id,
            target,
            duration,
            effect,
            smuggler,
            looping,
            start: now,
            t: 0.0,
            on_complete,
        });
        if !self.running {
            log::trace!("tween scheduler started");
        }
        self.running = true;
        id
    }

    /// Remove a tween by handle.
    pub fn remove(&mut self, id: TweenId) -> bool {
        let before = self.stack.len();
        self.stack.retain(|tween| tween.id != id);
        self.settle();
        self.stack.len() != before
    }

    /// Remove all tweens animating `target`.
    pub fn remove_target(&mut self, target: DrawableId) -> usize {
        let before = self.stack.len();
        self.stack.retain(|tween| tween.target != target);
        self.settle();
        before - self.stack.len()
    }

    pub fn get(&self, id: TweenId) -> Option<&Tween> {
        self.stack.iter().find(|tween| tween.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tween> {
        self.stack.iter()
    }

    /// Number of active tweens.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Whether the scheduler wants ticks.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.settle();
    }

    fn settle(&mut self) {
        if self.stack.is_empty() && self.running {
            log::trace!("tween scheduler stopped");
            self.running = false;
        }
    }

    /// Advance every entry to `now` and apply its effect.
    ///
    /// Entries whose target is gone are dropped. Finished entries are
    /// removed unless looping, in which case they restart at `now`.
    pub fn tick(&mut self, now: f64, drawables: &mut Arena<Drawable>) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let mut index = 0;
        while index < self.stack.len() {
            let tween = &mut self.stack[index];
            let Some(drawable) = drawables.get_mut(tween.target.key()) else {
                log::trace!("dropping tween {:?}: target is gone", tween.id);
                self.stack.remove(index);
                continue;
            };

            let start = *tween.start.get_or_insert(now);
            tween.t = if tween.duration > 0.0 {
                ((now - start) / tween.duration).clamp(0.0, 1.0)
            } else {
                1.0
            };
            tween.effect.apply(&mut Frame {
                t: tween.t,
                drawable,
                smuggler: &mut tween.smuggler,
            });
            outcome.advanced += 1;

            if tween.t < 1.0 {
                index += 1;
                continue;
            }
            if let Some(callback) = tween.on_complete.take() {
                outcome.completed.push((tween.id, callback));
            }
            if tween.looping {
                tween.t = 0.0;
                tween.start = Some(now);
                index += 1;
            } else {
                self.stack.remove(index);
            }
        }
        self.settle();
        outcome
    }

    /// Hand a completion callback back to a looping entry that is still live.
    pub(crate) fn restore_complete(&mut self, id: TweenId, callback: CompleteCallback) {
        if let Some(tween) = self.stack.iter_mut().find(|tween| tween.id == id) {
            if tween.on_complete.is_none() {
                tween.on_complete = Some(callback);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::drawable::DrawableConfig;

    fn setup() -> (Arena<Drawable>, DrawableId) {
        let mut drawables = Arena::new();
        let key = drawables.insert(Drawable::rect(DrawableConfig::default()));
        (drawables, DrawableId(key))
    }

    #[test]
    fn fade_in_halfway_and_done() {
        let (mut drawables, id) = setup();
        let mut tweens = TweenState::new();
        tweens.push(id, 1000.0, Effect::FadeIn, Smuggler::default(), false, None, Some(0.0));
        assert!(tweens.is_running());

        tweens.tick(500.0, &mut drawables);
        assert_eq!(drawables.get(id.key()).unwrap().style.alpha, 0.5);

        let outcome = tweens.tick(1000.0, &mut drawables);
        assert_eq!(outcome.advanced, 1);
        assert_eq!(drawables.get(id.key()).unwrap().style.alpha, 1.0);
        assert!(tweens.is_empty());
        assert!(!tweens.is_running());
    }

    #[test]
    fn first_tick_starts_clock_when_unknown() {
        let (mut drawables, id) = setup();
        let mut tweens = TweenState::new();
        let tid = tweens.push(id, 100.0, Effect::FadeOut, Smuggler::default(), false, None, None);
        tweens.tick(5000.0, &mut drawables);
        assert_eq!(tweens.get(tid).unwrap().progress(), 0.0);
        tweens.tick(5050.0, &mut drawables);
        assert_eq!(tweens.get(tid).unwrap().progress(), 0.5);
    }

    #[test]
    fn progress_is_monotonic_and_clamped() {
        let (mut drawables, id) = setup();
        let mut tweens = TweenState::new();
        let tid = tweens.push(
            id,
            300.0,
            Effect::FadeIn,
            Smuggler::default(),
            true,
            None,
            Some(0.0),
        );
        let mut last = 0.0;
        for now in [0.0, 50.0, 120.0, 299.0] {
            tweens.tick(now, &mut drawables);
            let t = tweens.get(tid).unwrap().progress();
            assert!(t >= last && t <= 1.0);
            last = t;
        }
    }

    #[test]
    fn looping_restarts_and_keeps_entry() {
        let (mut drawables, id) = setup();
        let mut tweens = TweenState::new();
        let tid = tweens.push(
            id,
            100.0,
            Effect::FadeIn,
            Smuggler::default(),
            true,
            Some(Box::new(|_: &mut Surface| {})),
            Some(0.0),
        );
        let outcome = tweens.tick(150.0, &mut drawables);
        assert_eq!(outcome.completed.len(), 1);
        assert_eq!(tweens.len(), 1);
        assert_eq!(tweens.get(tid).unwrap().progress(), 0.0);

        for (id, callback) in outcome.completed {
            tweens.restore_complete(id, callback);
        }
        tweens.tick(200.0, &mut drawables);
        assert_eq!(tweens.get(tid).unwrap().progress(), 0.5);
        let outcome = tweens.tick(250.0, &mut drawables);
        assert_eq!(outcome.completed.len(), 1);
    }

    #[test]
    fn zero_duration_completes_at_once() {
        let (mut drawables, id) = setup();
        let mut tweens = TweenState::new();
        tweens.push(id, 0.0, Effect::FadeOut, Smuggler::default(), false, None, Some(0.0));
        tweens.tick(0.0, &mut drawables);
        assert!(tweens.is_empty());
        assert_eq!(drawables.get(id.key()).unwrap().style.alpha, 0.0);
    }

    #[test]
    fn missing_target_is_dropped() {
        let (mut drawables, id) = setup();
        let mut tweens = TweenState::new();
        tweens.push(id, 100.0, Effect::FadeIn, Smuggler::default(), false, None, Some(0.0));
        drawables.remove(id.key());
        let outcome = tweens.tick(10.0, &mut drawables);
        assert_eq!(outcome.advanced, 0);
        assert!(!tweens.is_running());
    }

    #[test]
    fn remove_by_handle_and_target() {
        let (_, id) = setup();
        let mut tweens = TweenState::new();
        let a = tweens.push(id, 100.0, Effect::FadeIn, Smuggler::default(), false, None, None);
        tweens.push(id, 100.0, Effect::Rotate, Smuggler::default(), false, None, None);
        assert!(tweens.remove(a));
        assert!(!tweens.remove(a));
        assert_eq!(tweens.remove_target(id), 1);
        assert!(!tweens.is_running());
    }

    #[test]
    fn rotate_by_sign_sets_direction() {
        let (_, id) = setup();
        let spec = TweenSpec::rotate_by(id, -45.0);
        assert_eq!(spec.smuggler.angle, 45.0);
        assert!(!spec.smuggler.clockwise);
        assert_eq!(spec.duration, DEFAULT_DURATION_MS);
    }
}
