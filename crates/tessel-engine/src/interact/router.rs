use crate::coords::{Rect, Vec2};
use crate::input::InputEvent;
use crate::scene::DrawList;

/// Opaque identity of a focusable piece of logic.
///
/// Widgets keep their id across frames; focus follows the id, not the
/// callback registered for it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LogicId(u64);

impl LogicId {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Cross-frame interaction state: pointer position and keyboard focus.
#[derive(Debug, Default)]
pub struct Router {
    pointer: Vec2,
    focused: Option<LogicId>,
    next_id: u64,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out an id no earlier call returned.
    pub fn allocate_id(&mut self) -> LogicId {
        self.next_id += 1;
        LogicId(self.next_id)
    }

    /// Starts a frame over `events`.
    ///
    /// The current pointer and every pointer move in `events` become the
    /// frame's interaction points.
    pub fn begin_frame<'f, S>(&'f mut self, events: Vec<InputEvent>) -> RouterFrame<'f, S> {
        let mut points = vec![self.pointer];
        points.extend(events.iter().filter_map(|ev| match ev {
            InputEvent::PointerMoved(p) => Some(*p),
            _ => None,
        }));

        RouterFrame { router: self, events, points, logics: Vec::new() }
    }

    #[inline]
    pub fn focused(&self) -> Option<LogicId> {
        self.focused
    }

    /// Moves focus without notifying the previous holder.
    #[inline]
    pub fn set_focus(&mut self, id: Option<LogicId>) {
        self.focused = id;
    }

    #[inline]
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    #[inline]
    pub fn hovered(&self, bbox: Rect) -> bool {
        bbox.contains(self.pointer)
    }
}

type Callback<'f, S> = Box<dyn FnMut(&mut S, &InputEvent) -> bool + 'f>;

struct Logic<'f, S> {
    bbox: Rect,
    id: Option<LogicId>,
    callback: Callback<'f, S>,
}

/// One frame of event routing.
///
/// Widgets register logic while they draw; [`RouterFrame::dispatch`] then
/// offers the frame's events to it. `S` is the state callbacks mutate,
/// passed in at dispatch time.
pub struct RouterFrame<'f, S> {
    router: &'f mut Router,
    events: Vec<InputEvent>,
    points: Vec<Vec2>,
    logics: Vec<Logic<'f, S>>,
}

impl<'f, S> RouterFrame<'f, S> {
    /// Registers `callback` for events inside `bbox`.
    ///
    /// Skipped unless `id` holds focus or `bbox` contains one of this frame's
    /// interaction points. A callback returning `true` claims the event.
    pub fn logic<F>(&mut self, bbox: Rect, id: Option<LogicId>, callback: F)
    where
        F: FnMut(&mut S, &InputEvent) -> bool + 'f,
    {
        let focused = id.is_some() && id == self.router.focused;
        if !focused && !self.points.iter().any(|p| bbox.contains(*p)) {
            return;
        }
        self.logics.push(Logic { bbox, id, callback: Box::new(callback) });
    }

    /// [`logic`](Self::logic) over the box of the last draw call in `list`.
    ///
    /// # Panics
    /// If nothing was drawn into `list` this frame.
    pub fn logic_last<F>(&mut self, list: &DrawList, id: Option<LogicId>, callback: F)
    where
        F: FnMut(&mut S, &InputEvent) -> bool + 'f,
    {
        self.logic(list.last_bounding_box(), id, callback);
    }

    /// Number of callbacks that survived culling.
    #[inline]
    pub fn logic_count(&self) -> usize {
        self.logics.len()
    }

    #[inline]
    pub fn focused(&self) -> Option<LogicId> {
        self.router.focused
    }

    #[inline]
    pub fn is_focused(&self, id: LogicId) -> bool {
        self.router.focused == Some(id)
    }

    /// Pointer position at the start of the frame.
    #[inline]
    pub fn pointer(&self) -> Vec2 {
        self.router.pointer
    }

    #[inline]
    pub fn hovered(&self, bbox: Rect) -> bool {
        self.router.hovered(bbox)
    }

    /// Offers every event to the registered logic and returns those nobody claimed.
    ///
    /// Callbacks are scanned newest first, so the last drawn widget under the
    /// pointer wins. Escape always passes through.
    pub fn dispatch(self, state: &mut S) -> Vec<InputEvent> {
        let RouterFrame { router, events, mut logics, .. } = self;
        let mut unclaimed = Vec::new();

        for ev in events {
            if ev.is_escape() {
                unclaimed.push(ev);
                continue;
            }

            let claimed = match ev {
                InputEvent::Defocus => {
                    let had_focus = router.focused.is_some();
                    refocus(&mut router.focused, &mut logics, None, state);
                    had_focus
                }
                _ => dispatch_one(router, &mut logics, &ev, state),
            };

            if !claimed {
                unclaimed.push(ev);
            }
        }

        unclaimed
    }
}

fn dispatch_one<S>(router: &mut Router, logics: &mut [Logic<'_, S>], ev: &InputEvent, state: &mut S) -> bool {
    if let InputEvent::PointerMoved(p) = ev {
        router.pointer = *p;
    }

    let press = ev.is_press();
    let focused = router.focused;

    if !press && focused.is_some() {
        for logic in logics.iter_mut().rev().filter(|l| l.id == focused) {
            if (logic.callback)(state, ev) {
                return true;
            }
        }
    }

    for i in (0..logics.len()).rev() {
        if !logics[i].bbox.contains(router.pointer) {
            continue;
        }
        if press {
            let id = logics[i].id;
            refocus(&mut router.focused, logics, id, state);
        } else if focused.is_some() && logics[i].id == focused {
            continue;
        }
        if (logics[i].callback)(state, ev) {
            return true;
        }
    }

    if press {
        refocus(&mut router.focused, logics, None, state);
    }
    false
}

/// Moves focus to `next`, sending `Defocus` to the previous holder's first logic.
fn refocus<S>(focused: &mut Option<LogicId>, logics: &mut [Logic<'_, S>], next: Option<LogicId>, state: &mut S) {
    if *focused == next {
        return;
    }
    let prev = std::mem::replace(focused, next);
    log::trace!("router: focus {prev:?} -> {next:?}");

    if prev.is_none() {
        return;
    }
    if let Some(logic) = logics.iter_mut().find(|l| l.id == prev) {
        (logic.callback)(state, &InputEvent::Defocus);
    }
}
