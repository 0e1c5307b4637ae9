//! Single-choice currency picker with an open/closed dropdown
//!
//! A selector starts `Closed`. While `Open` it holds a subscription in a
//! [`PointerListeners`] registry so that a pointer press anywhere outside
//! the widget dismisses it. The subscription is taken on entering `Open`
//! and released on every exit from it, including unmount.

use std::collections::BTreeMap;
use tracing::debug;

use super::marker::{Marker, marker_for};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WidgetId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Registry of widgets currently interested in outside pointer presses.
#[derive(Debug, Default)]
pub struct PointerListeners {
    next_id: u64,
    active: BTreeMap<ListenerId, WidgetId>,
}

impl PointerListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, widget: WidgetId) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.active.insert(id, widget);
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.active.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Subscribed widgets that a press on `hit` lands outside of. `None`
    /// means the press hit no widget at all.
    pub fn outside_of(&self, hit: Option<WidgetId>) -> Vec<WidgetId> {
        self.active
            .values()
            .copied()
            .filter(|widget| Some(*widget) != hit)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    Closed,
    Open {
        listener: ListenerId,
        /// Keyboard highlight, an index into the candidates.
        highlighted: Option<usize>,
    },
}

/// One row of an open dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorOption<'a> {
    pub code: &'a str,
    pub marker: Marker,
    pub selected: bool,
    pub highlighted: bool,
}

#[derive(Debug)]
pub struct SelectorWidget {
    id: WidgetId,
    candidates: Vec<String>,
    selected: String,
    state: SelectorState,
}

impl SelectorWidget {
    pub fn new(id: WidgetId, selected: &str) -> Self {
        SelectorWidget {
            id,
            candidates: Vec::new(),
            selected: selected.to_string(),
            state: SelectorState::Closed,
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, SelectorState::Open { .. })
    }

    /// Marker paired with the selected code.
    pub fn marker(&self) -> Marker {
        marker_for(&self.selected)
    }

    pub fn set_candidates(&mut self, candidates: Vec<String>) {
        self.candidates = candidates;
        if let SelectorState::Open { highlighted, .. } = &mut self.state {
            *highlighted = self.candidates.iter().position(|c| *c == self.selected);
        }
    }

    /// Replaces the selection without firing a change, e.g. after a swap.
    pub fn set_selected(&mut self, code: &str) {
        self.selected = code.to_string();
    }

    pub fn toggle(&mut self, listeners: &mut PointerListeners) {
        match self.state {
            SelectorState::Closed => self.open(listeners),
            SelectorState::Open { .. } => self.close(listeners),
        }
    }

    /// Commits `code` from an open dropdown. `on_change` runs before the
    /// dropdown closes. Returns false, with no effect, when the widget is
    /// closed or `code` is not a candidate.
    pub fn select<F>(&mut self, code: &str, listeners: &mut PointerListeners, on_change: F) -> bool
    where
        F: FnOnce(&str),
    {
        if !self.is_open() || !self.candidates.iter().any(|c| c == code) {
            return false;
        }
        on_change(code);
        self.selected = code.to_string();
        self.close(listeners);
        true
    }

    pub fn dismiss(&mut self, listeners: &mut PointerListeners) -> bool {
        if !self.is_open() {
            return false;
        }
        debug!(widget = ?self.id, "Selector dismissed");
        self.close(listeners);
        true
    }

    /// Reacts to a pointer press that landed on `hit`.
    pub fn on_pointer_down(
        &mut self,
        hit: Option<WidgetId>,
        listeners: &mut PointerListeners,
    ) -> bool {
        if hit == Some(self.id) {
            return false;
        }
        self.dismiss(listeners)
    }

    pub fn highlight_next(&mut self) {
        self.move_highlight(1);
    }

    pub fn highlight_prev(&mut self) {
        self.move_highlight(-1);
    }

    pub fn highlighted(&self) -> Option<&str> {
        match self.state {
            SelectorState::Open {
                highlighted: Some(index),
                ..
            } => self.candidates.get(index).map(String::as_str),
            _ => None,
        }
    }

    pub fn commit_highlighted<F>(&mut self, listeners: &mut PointerListeners, on_change: F) -> bool
    where
        F: FnOnce(&str),
    {
        match self.highlighted().map(str::to_string) {
            Some(code) => self.select(&code, listeners, on_change),
            None => false,
        }
    }

    pub fn options(&self) -> impl Iterator<Item = SelectorOption<'_>> {
        let highlighted = self.highlighted();
        self.candidates.iter().map(move |code| SelectorOption {
            code,
            marker: marker_for(code),
            selected: *code == self.selected,
            highlighted: highlighted == Some(code.as_str()),
        })
    }

    /// Tears the widget down, releasing any outside-press subscription.
    pub fn unmount(mut self, listeners: &mut PointerListeners) {
        self.close(listeners);
    }

    fn open(&mut self, listeners: &mut PointerListeners) {
        let listener = listeners.subscribe(self.id);
        let highlighted = self.candidates.iter().position(|c| *c == self.selected);
        self.state = SelectorState::Open {
            listener,
            highlighted,
        };
        debug!(widget = ?self.id, "Selector opened");
    }

    fn close(&mut self, listeners: &mut PointerListeners) {
        if let SelectorState::Open { listener, .. } = self.state {
            listeners.unsubscribe(listener);
        }
        self.state = SelectorState::Closed;
    }

    fn move_highlight(&mut self, step: isize) {
        let len = self.candidates.len();
        if let SelectorState::Open { highlighted, .. } = &mut self.state {
            if len == 0 {
                return;
            }
            let next = match *highlighted {
                Some(index) => (index as isize + step).rem_euclid(len as isize) as usize,
                None if step >= 0 => 0,
                None => len - 1,
            };
            *highlighted = Some(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(id: u32) -> SelectorWidget {
        let mut w = SelectorWidget::new(WidgetId(id), "BRL");
        w.set_candidates(vec!["BRL".into(), "EUR".into(), "USD".into()]);
        w
    }

    #[test]
    fn test_toggle_opens_and_closes() {
        let mut listeners = PointerListeners::new();
        let mut w = widget(1);
        assert_eq!(w.state(), SelectorState::Closed);

        w.toggle(&mut listeners);
        assert!(w.is_open());
        assert_eq!(listeners.len(), 1);

        w.toggle(&mut listeners);
        assert!(!w.is_open());
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_select_fires_change_once_and_closes() {
        let mut listeners = PointerListeners::new();
        let mut w = widget(1);
        w.toggle(&mut listeners);

        let mut changes = Vec::new();
        assert!(w.select("EUR", &mut listeners, |c| changes.push(c.to_string())));
        assert_eq!(changes, vec!["EUR"]);
        assert_eq!(w.selected(), "EUR");
        assert_eq!(w.state(), SelectorState::Closed);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_select_ignored_when_closed_or_unknown() {
        let mut listeners = PointerListeners::new();
        let mut w = widget(1);
        let mut fired = false;
        assert!(!w.select("EUR", &mut listeners, |_| fired = true));

        w.toggle(&mut listeners);
        assert!(!w.select("JPY", &mut listeners, |_| fired = true));
        assert!(!fired);
        assert!(w.is_open());
        assert_eq!(w.selected(), "BRL");
    }

    #[test]
    fn test_outside_press_dismisses() {
        let mut listeners = PointerListeners::new();
        let mut w = widget(1);
        w.toggle(&mut listeners);

        assert!(!w.on_pointer_down(Some(WidgetId(1)), &mut listeners));
        assert!(w.is_open());

        assert!(w.on_pointer_down(None, &mut listeners));
        assert!(!w.is_open());
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_instances_are_independent() {
        let mut listeners = PointerListeners::new();
        let mut a = widget(1);
        let mut b = widget(2);
        a.toggle(&mut listeners);
        b.toggle(&mut listeners);
        assert!(a.is_open() && b.is_open());

        // A press on `a` lies outside `b` only
        let outside = listeners.outside_of(Some(WidgetId(1)));
        assert_eq!(outside, vec![WidgetId(2)]);
        for id in outside {
            if id == b.id() {
                assert!(b.on_pointer_down(Some(WidgetId(1)), &mut listeners));
            }
        }
        assert!(a.is_open());
        assert!(!b.is_open());
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn test_keyboard_highlight_wraps_and_commits() {
        let mut listeners = PointerListeners::new();
        let mut w = widget(1);
        w.toggle(&mut listeners);
        assert_eq!(w.highlighted(), Some("BRL"));

        w.highlight_prev();
        assert_eq!(w.highlighted(), Some("USD"));
        w.highlight_next();
        w.highlight_next();
        assert_eq!(w.highlighted(), Some("EUR"));

        let mut changed = None;
        assert!(w.commit_highlighted(&mut listeners, |c| changed = Some(c.to_string())));
        assert_eq!(changed.as_deref(), Some("EUR"));
        assert!(!w.is_open());
    }

    #[test]
    fn test_highlight_without_selected_candidate() {
        let mut listeners = PointerListeners::new();
        let mut w = SelectorWidget::new(WidgetId(1), "XAU");
        w.set_candidates(vec!["BRL".into(), "EUR".into()]);
        w.toggle(&mut listeners);
        assert_eq!(w.highlighted(), None);
        w.highlight_next();
        assert_eq!(w.highlighted(), Some("BRL"));
    }

    #[test]
    fn test_options_mark_selected_and_unknown_codes() {
        let mut w = SelectorWidget::new(WidgetId(1), "EUR");
        w.set_candidates(vec!["EUR".into(), "XAU".into()]);
        let options: Vec<_> = w.options().collect();
        assert!(options[0].selected);
        assert_eq!(options[0].marker, Marker::Flag("EU"));
        assert_eq!(options[1].marker, Marker::Placeholder);
        assert_eq!(w.marker(), Marker::Flag("EU"));
    }

    #[test]
    fn test_unmount_releases_subscription() {
        let mut listeners = PointerListeners::new();
        let mut w = widget(1);
        w.toggle(&mut listeners);
        w.unmount(&mut listeners);
        assert!(listeners.is_empty());
    }
}
