use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use zap_canvas::*;

type Log = Rc<RefCell<Vec<(ControlEvent, ControlId)>>>;

fn square(x: f64, y: f64) -> Drawable {
    Drawable::rect(DrawableConfig {
        x,
        y,
        width: 50.0,
        height: 50.0,
        ..DrawableConfig::default()
    })
}

fn record(control: Control, events: &[ControlEvent], log: &Log) -> Control {
    events.iter().fold(control, |control, &event| {
        let log = log.clone();
        control.on(event, move |_, id| log.borrow_mut().push((event, id)))
    })
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn pointer_crossing_fires_inside_then_outside() {
    let log: Log = Rc::default();
    let mut s = Surface::default();
    let d = s.attach_drawable(square(100.0, 100.0));
    let c = s.attach_control(record(
        Control::default().with_drawable(d),
        &[ControlEvent::Inside, ControlEvent::Outside],
        &log,
    ));

    s.dispatch(InputEvent::PointerMove { x: 110.0, y: 110.0 }, 0.0);
    s.dispatch(InputEvent::PointerMove { x: 112.0, y: 111.0 }, 5.0);
    s.dispatch(InputEvent::PointerMove { x: 500.0, y: 500.0 }, 10.0);
    s.dispatch(InputEvent::PointerMove { x: 510.0, y: 500.0 }, 15.0);

    assert_eq!(
        *log.borrow(),
        vec![(ControlEvent::Inside, c), (ControlEvent::Outside, c)]
    );
}

#[test]
fn linear_fade_samples_and_completes() {
    let mut s = Surface::default();
    let mut target = VectorTarget::new();
    let d = s.attach_drawable(square(100.0, 100.0));
    s.frame(0.0, &mut target);

    let ids = s.animate(TweenSpec::fade_in(d).easing(Easing::Linear));
    assert_eq!(ids.len(), 1);

    s.frame(500.0, &mut target);
    assert!(approx(s.drawable(d).unwrap().style.alpha, 0.5));
    assert_eq!(s.tweens().len(), 1);

    s.frame(1000.0, &mut target);
    assert!(s.tweens().is_empty());
    assert!(!s.tweens().is_running());
    assert_eq!(s.drawable(d).unwrap().style.alpha, 1.0);
    // the completing tick is painted
    assert!(!s.needs_render());
    assert!(!s.wants_frame());
}

#[test]
fn rotate_there_and_back_is_identity() {
    let mut t = Transform::IDENTITY;
    t.rotate(Angle::Degrees(90.0)).rotate(Angle::Degrees(-90.0));
    assert!(approx(t.angle(), 0.0));
    assert!(approx(t.scale().x, 1.0));
    assert!(approx(t.scale().y, 1.0));
}

#[test]
fn rotation_decomposition_round_trips() {
    for degrees in [0.0, 15.0, 90.0, 180.0, 271.5, 359.0] {
        for (sx, sy) in [(1.0, 1.0), (2.0, 0.5), (3.0, 3.0)] {
            let mut t = Transform::IDENTITY;
            t.stretch(sx, sy).rotate(Angle::Degrees(degrees));
            assert!(approx(t.angle(), degrees), "angle {} -> {}", degrees, t.angle());
            assert!(approx(t.scale().x, sx));
            assert!(approx(t.scale().y, sy));
        }
    }
    let mut t = Transform::IDENTITY;
    t.rotate(Angle::Degrees(0.0)).rotate(Angle::Degrees(0.0));
    assert_eq!(t, Transform::IDENTITY);
}

#[test]
fn live_identifiers_are_unique() {
    let mut s = Surface::default();
    let mut live: Vec<EntityId> = Vec::new();
    for i in 0..20 {
        live.push(s.attach_drawable(square(i as f64, 0.0)).into());
        live.push(s.attach_control(Control::default()).into());
        live.push(s.attach_group(Group::default()).into());
    }
    // free some slots, then reuse them
    let gone: Vec<EntityId> = live.iter().copied().step_by(3).collect();
    assert_eq!(s.detach(gone.iter().copied()), gone.len());
    live.retain(|id| !gone.contains(id));
    for _ in 0..10 {
        live.push(s.attach_drawable(square(0.0, 0.0)).into());
    }

    let unique: HashSet<EntityId> = live.iter().copied().collect();
    assert_eq!(unique.len(), live.len());
    for id in &gone {
        assert!(s.get(*id).is_none(), "stale {:?} resolved", id);
    }
    for id in &live {
        assert!(s.contains(*id));
    }
}

#[test]
fn detach_twice_is_a_no_op() {
    let mut s = Surface::default();
    let d = s.attach_drawable(square(0.0, 0.0));
    let c = s.attach_control(Control::default().with_drawable(d));
    let g = s.attach_group(Group::default());
    s.group_add(g, c, Membership::Enrolled);

    let ids: [EntityId; 3] = [d.into(), c.into(), g.into()];
    assert_eq!(s.detach(ids), 3);
    let counts: Vec<usize> = [EntityKind::Drawable, EntityKind::Control, EntityKind::Group]
        .iter()
        .map(|k| s.count(*k))
        .collect();
    assert_eq!(s.detach(ids), 0);
    assert_eq!(s.detach_drawable(d).map(|_| ()), None);
    let after: Vec<usize> = [EntityKind::Drawable, EntityKind::Control, EntityKind::Group]
        .iter()
        .map(|k| s.count(*k))
        .collect();
    assert_eq!(counts, after);
}

#[test]
fn non_removable_control_survives_detach() {
    let mut s = Surface::default();
    let c = s.attach_control(Control::new(ControlConfig {
        removable: false,
        ..ControlConfig::default()
    }));
    assert_eq!(s.detach([c]), 0);
    assert!(s.contains(c));
}

#[test]
fn at_most_one_drag_at_a_time() {
    let mut s = Surface::default();
    let a = s.attach_drawable(square(100.0, 100.0));
    let b = s.attach_drawable(square(300.0, 100.0));
    let ca = s.attach_control(Control::default().with_drawable(a));
    let cb = s.attach_control(Control::default().with_drawable(b));
    let dragging = |s: &Surface| [ca, cb].iter().filter(|c| s.is_dragging(**c)).count();

    let steps: Vec<(InputEvent, f64)> = vec![
        (InputEvent::PointerMove { x: 100.0, y: 100.0 }, 0.0),
        (
            InputEvent::PointerDown {
                x: 100.0,
                y: 100.0,
                button: MouseButton::Left,
            },
            10.0,
        ),
        (InputEvent::PointerMove { x: 120.0, y: 100.0 }, 200.0),
        (InputEvent::PointerMove { x: 300.0, y: 100.0 }, 220.0),
        (
            InputEvent::PointerDown {
                x: 300.0,
                y: 100.0,
                button: MouseButton::Left,
            },
            230.0,
        ),
        (InputEvent::PointerMove { x: 320.0, y: 120.0 }, 500.0),
        (
            InputEvent::PointerUp {
                x: 320.0,
                y: 120.0,
                button: MouseButton::Left,
            },
            510.0,
        ),
    ];
    let mut saw_drag = false;
    for (event, now) in steps {
        s.advance(now);
        s.dispatch(event, now);
        assert!(dragging(&s) <= 1);
        saw_drag |= dragging(&s) == 1;
    }
    assert!(saw_drag);
    assert_eq!(dragging(&s), 0);
    assert_eq!(s.focus(), Some(ca));
    // the drag interval was cancelled on release
    assert!(!s.frame(1000.0, &mut VectorTarget::new()));
}

#[test]
fn focus_changes_pair_lost_then_gained() {
    let log: Log = Rc::default();
    let mut s = Surface::default();
    let controls: Vec<ControlId> = (0..4)
        .map(|_| {
            s.attach_control(record(
                Control::default(),
                &[ControlEvent::Focus, ControlEvent::LostFocus],
                &log,
            ))
        })
        .collect();

    let sequence = [0, 1, 1, 3, 2, 0];
    let mut previous: Option<ControlId> = None;
    for &i in &sequence {
        log.borrow_mut().clear();
        let next = controls[i];
        s.set_focus(next);
        let expected = match previous {
            Some(p) if p == next => vec![],
            Some(p) => vec![(ControlEvent::LostFocus, p), (ControlEvent::Focus, next)],
            None => vec![(ControlEvent::Focus, next)],
        };
        assert_eq!(*log.borrow(), expected);
        assert_eq!(s.focus(), Some(next));
        previous = Some(next);
    }
    s.remove_focus();
    assert_eq!(s.focus(), None);
}

#[test]
fn group_back_references_follow_membership() {
    let mut s = Surface::default();
    let d = s.attach_drawable(square(0.0, 0.0));
    let c = s.attach_control(Control::default().with_drawable(d));
    let g = s.attach_group(Group::new(GroupConfig { name: "hand".into() }));
    let h = s.attach_group(Group::default());

    assert!(s.group_add(g, d, Membership::Grouped));
    assert!(s.group_add(g, c, Membership::Enrolled));
    assert_eq!(s.drawable(d).unwrap().group(), Some(g));
    assert_eq!(s.control(c).unwrap().group(), Some(g));

    // moving to another group leaves the first one
    assert!(s.group_add(h, d, Membership::Enrolled));
    assert_eq!(s.drawable(d).unwrap().group(), Some(h));
    assert_eq!(s.group(g).unwrap().membership(d.into()), None);

    s.detach([g, h]);
    assert_eq!(s.drawable(d).unwrap().group(), None);
    assert_eq!(s.control(c).unwrap().group(), None);
}

#[test]
fn tween_progress_is_normalized_and_monotonic() {
    let mut s = Surface::default();
    let d = s.attach_drawable(square(0.0, 0.0));
    s.advance(0.0);
    let id = s.animate(TweenSpec::move_by(d, 0.0, 100.0).duration_ms(200.0))[0];

    s.tick_tweens(0.0);
    assert_eq!(s.tweens().get(id).unwrap().progress(), 0.0);

    let mut last = 0.0;
    for now in [10.0, 50.0, 50.0, 120.0, 199.0] {
        s.tick_tweens(now);
        let t = s.tweens().get(id).unwrap().progress();
        assert!((0.0..=1.0).contains(&t));
        assert!(t >= last);
        last = t;
    }
    s.tick_tweens(5000.0);
    assert!(s.tweens().get(id).is_none());
    assert!(approx(s.drawable(d).unwrap().position().x, 100.0));
}

#[test]
fn looping_tween_restarts_and_calls_back_each_cycle() {
    let mut s = Surface::default();
    let d = s.attach_drawable(square(0.0, 0.0));
    let cycles = Rc::new(RefCell::new(0));
    let counter = cycles.clone();
    s.advance(0.0);
    let id = s.animate(
        TweenSpec::rotate_by(d, 90.0)
            .duration_ms(100.0)
            .looping(true)
            .on_complete(move |_| *counter.borrow_mut() += 1),
    )[0];
    s.tick_tweens(100.0);
    s.tick_tweens(150.0);
    s.tick_tweens(200.0);
    assert_eq!(*cycles.borrow(), 2);
    assert!(s.tweens().get(id).is_some());
    assert!(s.tweens_mut().remove(id));
    assert!(!s.tweens().is_running());
}

#[test]
fn group_animation_fans_out_to_visible_members() {
    let mut s = Surface::default();
    let a = s.attach_drawable(square(0.0, 0.0));
    let b = s.attach_drawable(square(100.0, 0.0));
    let mut hidden = square(200.0, 0.0);
    hidden.visible = false;
    let c = s.attach_drawable(hidden);
    let g = s.attach_group(Group::default());
    for d in [a, b, c] {
        s.group_add(g, d, Membership::Enrolled);
    }
    s.advance(0.0);
    assert_eq!(s.animate(TweenSpec::fade_out(a)).len(), 2);
    assert_eq!(s.animate(TweenSpec::fade_out(a).solo(true)).len(), 1);
}

struct Sweeper {
    victims: Vec<ControlId>,
}

impl PointerHook for Sweeper {
    fn on_move(&mut self, surface: &mut Surface, _event: PointerEvent) {
        surface.detach(self.victims.drain(..));
    }
}

#[test]
fn callbacks_may_detach_while_the_surface_iterates() {
    let mut s = Surface::default();
    let a = s.attach_drawable(square(100.0, 100.0));
    let b = s.attach_drawable(square(100.0, 100.0));
    let ca = s.attach_control(Control::default().with_drawable(a));
    // entering b detaches a's control mid-dispatch
    let cb = s.attach_control(
        Control::default()
            .with_drawable(b)
            .on(ControlEvent::Inside, move |surface, _| {
                surface.detach([ca]);
            })
            .on(ControlEvent::LeftClick, |surface, me| {
                surface.detach([me]);
            }),
    );
    s.attach_pointer_hook(Box::new(Sweeper { victims: vec![cb] }));

    s.pointer_move(DVec2::new(100.0, 100.0));
    assert!(!s.contains(ca));
    assert!(!s.contains(cb));
    assert_eq!(s.count(EntityKind::Control), 0);
    // drawables outlive their controls
    assert_eq!(s.count(EntityKind::Drawable), 2);
}

#[test]
fn batch_coalesces_refreshes() {
    let mut s = Surface::default();
    let mut target = VectorTarget::new();
    s.frame(0.0, &mut target);
    let before = s.frames();
    s.batch(|s| {
        for i in 0..50 {
            s.attach_drawable(square(i as f64 * 10.0, 50.0));
        }
    });
    s.frame(16.0, &mut target);
    s.frame(32.0, &mut target);
    assert_eq!(s.frames(), before + 1);
    assert!(target.vertex_count() > 0);
}

#[test]
fn json_bags_build_a_working_scene() {
    let mut s = Surface::default();
    let id = s
        .attach_from_json(
            r#"{"kind": "control", "movable": false,
                "drawable": {"shape": "ellipse", "x": 200, "y": 200, "width": 40, "height": 40}}"#,
        )
        .unwrap();
    let control = ControlId::try_from(id).unwrap();
    assert_eq!(s.pick(DVec2::new(200.0, 200.0)), Some(control));
    // ellipse corners are outside the path
    assert_eq!(s.pick(DVec2::new(218.0, 218.0)), None);
}
