//! Converter widget state driven by discrete events
//!
//! All mutable state lives in [`App`] and is only changed by
//! [`App::handle`] and the refresh methods, one event at a time. Before an
//! event is applied, open selectors whose area the event falls outside of
//! are dismissed, the same way a pointer press precedes a click.

use anyhow::Result as AnyResult;
use tracing::debug;

use crate::core::amount::format_rate;
use crate::core::config::AppConfig;
use crate::core::convert::ConverterForm;
use crate::core::currency::RateSnapshot;
use crate::core::error::Result;
use crate::core::rates::{RateStatus, RateStore, RefreshTicket};
use crate::core::selector::{PointerListeners, SelectorWidget, WidgetId};

pub const FROM_SELECTOR: WidgetId = WidgetId(1);
pub const TO_SELECTOR: WidgetId = WidgetId(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    From,
    To,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    EditAmount(String),
    ToggleSelector(Side),
    Pick(Side, String),
    HighlightNext(Side),
    HighlightPrev(Side),
    CommitHighlight(Side),
    Swap,
    Convert,
    Clear,
    /// A press that landed on no control.
    Background,
}

impl Event {
    /// Widget the event is aimed at, if it is one of the selectors.
    fn hit(&self) -> Option<WidgetId> {
        match self {
            Event::ToggleSelector(side)
            | Event::Pick(side, _)
            | Event::HighlightNext(side)
            | Event::HighlightPrev(side)
            | Event::CommitHighlight(side) => Some(side.widget()),
            _ => None,
        }
    }
}

impl Side {
    pub fn widget(&self) -> WidgetId {
        match self {
            Side::From => FROM_SELECTOR,
            Side::To => TO_SELECTOR,
        }
    }
}

pub struct App {
    rates: RateStore,
    form: ConverterForm,
    from: SelectorWidget,
    to: SelectorWidget,
    listeners: PointerListeners,
}

impl App {
    pub fn new(config: &AppConfig) -> Self {
        let defaults = &config.defaults;
        App {
            rates: RateStore::new(&config.base_currency),
            form: ConverterForm::new(&defaults.amount, &defaults.from, &defaults.to, config.locale),
            from: SelectorWidget::new(FROM_SELECTOR, &defaults.from),
            to: SelectorWidget::new(TO_SELECTOR, &defaults.to),
            listeners: PointerListeners::new(),
        }
    }

    pub fn rates(&self) -> &RateStore {
        &self.rates
    }

    pub fn form(&self) -> &ConverterForm {
        &self.form
    }

    pub fn selector(&self, side: Side) -> &SelectorWidget {
        match side {
            Side::From => &self.from,
            Side::To => &self.to,
        }
    }

    /// Side of an open selector, preferring `From` when both are open.
    pub fn open_selector(&self) -> Option<Side> {
        if self.from.is_open() {
            Some(Side::From)
        } else if self.to.is_open() {
            Some(Side::To)
        } else {
            None
        }
    }

    pub fn handle(&mut self, event: Event) -> Result<()> {
        debug!(?event, "Handling event");
        self.dispatch_pointer(event.hit());

        match event {
            Event::EditAmount(amount) => self.form.set_amount(&amount),
            Event::ToggleSelector(side) => {
                let (selector, listeners) = self.parts(side);
                selector.toggle(listeners);
            }
            Event::Pick(Side::From, code) => {
                self.from
                    .select(&code, &mut self.listeners, |c| self.form.set_from(c));
            }
            Event::Pick(Side::To, code) => {
                self.to
                    .select(&code, &mut self.listeners, |c| self.form.set_to(c));
            }
            Event::HighlightNext(side) => self.parts(side).0.highlight_next(),
            Event::HighlightPrev(side) => self.parts(side).0.highlight_prev(),
            Event::CommitHighlight(Side::From) => {
                self.from
                    .commit_highlighted(&mut self.listeners, |c| self.form.set_from(c));
            }
            Event::CommitHighlight(Side::To) => {
                self.to
                    .commit_highlighted(&mut self.listeners, |c| self.form.set_to(c));
            }
            Event::Swap => {
                self.form.swap();
                self.from.set_selected(self.form.from());
                self.to.set_selected(self.form.to());
            }
            Event::Convert => {
                self.form.convert(&self.rates)?;
            }
            Event::Clear => self.form.clear(),
            Event::Background => {}
        }
        Ok(())
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.rates.begin_refresh()
    }

    /// Applies a finished fetch and repopulates both selectors on success.
    pub fn finish_refresh(
        &mut self,
        ticket: RefreshTicket,
        fetched: AnyResult<RateSnapshot>,
    ) -> Result<bool> {
        let applied = self.rates.finish_refresh(ticket, fetched)?;
        if applied {
            let codes = self.rates.list_codes();
            self.from.set_candidates(codes.clone());
            self.to.set_candidates(codes);
        }
        Ok(applied)
    }

    /// Pair rate headline, e.g. `1 BRL = 0.1800 EUR`.
    pub fn rate_line(&self) -> String {
        match (self.form.pair_rate(&self.rates), self.rates.status()) {
            (Some(rate), _) => format!(
                "1 {} = {} {}",
                self.form.from(),
                format_rate(rate),
                self.form.to()
            ),
            (None, RateStatus::Idle | RateStatus::Loading) => "Loading...".to_string(),
            (None, _) => "Rate unavailable".to_string(),
        }
    }

    pub fn display_value(&self) -> String {
        self.form.display_value(&self.rates)
    }

    /// Releases every outside-press subscription held by the selectors.
    pub fn teardown(self) {
        let App {
            from,
            to,
            mut listeners,
            ..
        } = self;
        from.unmount(&mut listeners);
        to.unmount(&mut listeners);
        debug!(remaining = listeners.len(), "App torn down");
    }

    fn parts(&mut self, side: Side) -> (&mut SelectorWidget, &mut PointerListeners) {
        match side {
            Side::From => (&mut self.from, &mut self.listeners),
            Side::To => (&mut self.to, &mut self.listeners),
        }
    }

    fn dispatch_pointer(&mut self, hit: Option<WidgetId>) {
        for widget in self.listeners.outside_of(hit) {
            if widget == self.from.id() {
                self.from.on_pointer_down(hit, &mut self.listeners);
            } else if widget == self.to.id() {
                self.to.on_pointer_down(hit, &mut self.listeners);
            }
        }
    }
}
