//! Line-driven front end for the converter widget
//!
//! Each input line is one user interaction. The startup rate fetch runs on
//! a background task; its result is applied when it arrives, or dropped if
//! the session has ended or a newer refresh superseded it.

use anyhow::{Result, anyhow};
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::oneshot;
use tracing::debug;

use super::ui;
use crate::app::{App, Event, Side};
use crate::core::currency::{CurrencyRateProvider, RateSnapshot};
use crate::core::rates::{RateStatus, RefreshTicket};
use crate::core::selector::SelectorWidget;

const HELP: &str = "\
Commands:
  amount <value>   edit the amount (comma or period as decimal separator)
  from | to        open or close a currency selector
  pick <CODE>      choose a currency in the open selector
  next | prev      move the highlight in the open selector
  enter            choose the highlighted currency
  swap             exchange the two currencies
  convert          compute the converted amount
  clear            reset the amount to zero
  refresh          reload exchange rates
  help             show this help
  quit             leave";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Amount(String),
    Toggle(Side),
    Pick(String),
    Next,
    Prev,
    Enter,
    Swap,
    Convert,
    Clear,
    Refresh,
    Help,
    Quit,
    /// Empty line, a press on nothing in particular.
    Nothing,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        let command = match (word.to_ascii_lowercase().as_str(), rest) {
            ("", _) => Command::Nothing,
            ("amount" | "a", value) => Command::Amount(value.to_string()),
            ("from", "") => Command::Toggle(Side::From),
            ("to", "") => Command::Toggle(Side::To),
            ("pick" | "p", code) if !code.is_empty() => Command::Pick(code.to_string()),
            ("next" | "n", "") => Command::Next,
            ("prev" | "previous", "") => Command::Prev,
            ("enter" | "select", "") => Command::Enter,
            ("swap" | "s", "") => Command::Swap,
            ("convert" | "c", "") => Command::Convert,
            ("clear", "") => Command::Clear,
            ("refresh" | "r", "") => Command::Refresh,
            ("help" | "?", "") => Command::Help,
            ("quit" | "exit" | "q", "") => Command::Quit,
            _ => return Err(anyhow!("Unknown command: {line}. Type 'help' for commands")),
        };
        Ok(command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

type Fetched = std::result::Result<Result<RateSnapshot>, oneshot::error::RecvError>;

struct Inflight {
    ticket: RefreshTicket,
    rx: oneshot::Receiver<Result<RateSnapshot>>,
}

pub struct Session<W: Write> {
    app: App,
    provider: Arc<dyn CurrencyRateProvider>,
    inflight: Option<Inflight>,
    out: W,
}

impl<W: Write> Session<W> {
    pub fn new(app: App, provider: Arc<dyn CurrencyRateProvider>, out: W) -> Self {
        Session {
            app,
            provider,
            inflight: None,
            out,
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn is_fetching(&self) -> bool {
        self.inflight.is_some()
    }

    /// Starts a background fetch. A fetch already in flight is abandoned and
    /// its result discarded.
    pub fn start_refresh(&mut self) {
        let ticket = self.app.begin_refresh();
        let (tx, rx) = oneshot::channel();
        let provider = Arc::clone(&self.provider);
        let base = self.app.rates().base().to_string();

        tokio::spawn(async move {
            let fetched = provider.fetch_rates(&base).await;
            if tx.send(fetched).is_err() {
                debug!("Session gone, discarding fetched rates");
            }
        });
        self.inflight = Some(Inflight { ticket, rx });
    }

    /// Resolves when the in-flight fetch finishes; never resolves if there
    /// is none.
    async fn next_fetched(&mut self) -> (RefreshTicket, Fetched) {
        match self.inflight.as_mut() {
            Some(inflight) => (inflight.ticket, (&mut inflight.rx).await),
            None => std::future::pending().await,
        }
    }

    fn apply_fetched(&mut self, ticket: RefreshTicket, fetched: Fetched) -> Result<()> {
        self.inflight = None;
        let fetched = fetched.unwrap_or_else(|_| Err(anyhow!("Rate fetch task ended early")));
        if let Err(e) = self.app.finish_refresh(ticket, fetched) {
            writeln!(self.out, "{}", ui::notice(&e.to_string()))?;
        }
        self.render()
    }

    /// Waits for the in-flight fetch, if any, and applies it.
    pub async fn wait_for_rates(&mut self) -> Result<()> {
        if self.inflight.is_none() {
            return Ok(());
        }
        let (ticket, fetched) = self.next_fetched().await;
        self.apply_fetched(ticket, fetched)
    }

    pub fn apply_line(&mut self, line: &str) -> Result<Flow> {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                writeln!(self.out, "{}", ui::notice(&e.to_string()))?;
                return Ok(Flow::Continue);
            }
        };

        let event = match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => {
                writeln!(self.out, "{HELP}")?;
                return Ok(Flow::Continue);
            }
            Command::Refresh => {
                self.app.handle(Event::Background)?;
                self.start_refresh();
                self.render()?;
                return Ok(Flow::Continue);
            }
            Command::Amount(value) => Some(Event::EditAmount(value)),
            Command::Toggle(side) => Some(Event::ToggleSelector(side)),
            Command::Pick(code) => self
                .app
                .open_selector()
                .map(|side| Event::Pick(side, code.to_ascii_uppercase())),
            Command::Next => self.app.open_selector().map(Event::HighlightNext),
            Command::Prev => self.app.open_selector().map(Event::HighlightPrev),
            Command::Enter => self.app.open_selector().map(Event::CommitHighlight),
            Command::Swap => Some(Event::Swap),
            Command::Convert => Some(Event::Convert),
            Command::Clear => Some(Event::Clear),
            Command::Nothing => Some(Event::Background),
        };

        match event {
            Some(event) => {
                if let Err(e) = self.app.handle(event) {
                    writeln!(self.out, "{}", ui::notice(&e.to_string()))?;
                }
            }
            None => writeln!(
                self.out,
                "{}",
                ui::notice("No selector is open. Use 'from' or 'to' first")
            )?,
        }
        self.render()?;
        Ok(Flow::Continue)
    }

    pub fn render(&mut self) -> Result<()> {
        writeln!(self.out, "{}", render(&self.app))?;
        self.out.flush()?;
        Ok(())
    }

    /// Ends the session. A fetch still in flight is discarded.
    pub fn finish(self) -> W {
        if self.inflight.is_some() {
            debug!("Session ending with a rate fetch in flight");
        }
        self.app.teardown();
        self.out
    }
}

/// Runs the session until `quit` or end of input, starting the initial
/// rate fetch unless one was already requested.
pub async fn run<R, W>(session: &mut Session<W>, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    if session.app().rates().status() == &RateStatus::Idle {
        session.start_refresh();
    }
    session.render()?;

    loop {
        tokio::select! {
            (ticket, fetched) = session.next_fetched() => {
                session.apply_fetched(ticket, fetched)?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if session.apply_line(&line)? == Flow::Quit {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn selector_button(selector: &SelectorWidget) -> String {
    let arrow = if selector.is_open() { "\u{25B4}" } else { "\u{25BE}" };
    format!(
        "[{} {} {}]",
        selector.marker(),
        ui::style_text(selector.selected(), ui::StyleType::Label),
        arrow
    )
}

fn selector_dropdown(selector: &SelectorWidget, output: &mut String) {
    if !selector.is_open() {
        return;
    }
    if selector.candidates().is_empty() {
        output.push_str(&format!(
            "\n    {}",
            ui::style_text("(no currencies loaded)", ui::StyleType::Subtle)
        ));
        return;
    }
    for option in selector.options() {
        let cursor = if option.highlighted { ">" } else { " " };
        let check = if option.selected { " *" } else { "" };
        output.push_str(&format!(
            "\n  {cursor} {} {}{check}",
            option.marker, option.code
        ));
    }
}

/// Text rendering of the whole widget.
pub fn render(app: &App) -> String {
    let from = app.selector(Side::From);
    let to = app.selector(Side::To);
    let rate_line = app.rate_line();
    let rate_style = match app.rates().status() {
        RateStatus::Loaded if app.form().pair_rate(app.rates()).is_some() => ui::StyleType::Value,
        RateStatus::Idle | RateStatus::Loading => ui::StyleType::Subtle,
        _ => ui::StyleType::Error,
    };

    let mut output = format!(
        "\n{}\n{}",
        ui::style_text("Exchange rate", ui::StyleType::Title),
        ui::style_text(&rate_line, rate_style)
    );

    output.push_str(&format!(
        "\nAmount:     {:<20} {}",
        app.form().amount(),
        selector_button(from)
    ));
    selector_dropdown(from, &mut output);

    output.push_str(&format!(
        "\nConverted:  {:<20} {}",
        app.display_value(),
        selector_button(to)
    ));
    selector_dropdown(to, &mut output);

    if let Some(updated_at) = app.rates().updated_at() {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!("Rates as of {}", updated_at.format("%Y-%m-%d %H:%M UTC")),
                ui::StyleType::Subtle
            )
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AppConfig;
    use crate::core::rates::RateTable;
    use async_trait::async_trait;

    struct StaticProvider;

    #[async_trait]
    impl CurrencyRateProvider for StaticProvider {
        async fn fetch_rates(&self, base: &str) -> Result<RateSnapshot> {
            Ok(RateSnapshot {
                base: base.to_string(),
                table: RateTable::try_from([("USD", 1.0), ("BRL", 5.0), ("EUR", 0.9)])?,
                updated_at: None,
            })
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl CurrencyRateProvider for FailingProvider {
        async fn fetch_rates(&self, _base: &str) -> Result<RateSnapshot> {
            Err(anyhow!("HTTP error: 503 Service Unavailable for base: USD"))
        }
    }

    fn session(provider: Arc<dyn CurrencyRateProvider>) -> Session<Vec<u8>> {
        Session::new(App::new(&AppConfig::default()), provider, Vec::new())
    }

    fn output(session: Session<Vec<u8>>) -> String {
        String::from_utf8(session.finish()).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "amount 1.234,5".parse::<Command>().unwrap(),
            Command::Amount("1.234,5".into())
        );
        assert_eq!("amount".parse::<Command>().unwrap(), Command::Amount("".into()));
        assert_eq!("FROM".parse::<Command>().unwrap(), Command::Toggle(Side::From));
        assert_eq!(" to ".parse::<Command>().unwrap(), Command::Toggle(Side::To));
        assert_eq!("pick eur".parse::<Command>().unwrap(), Command::Pick("eur".into()));
        assert_eq!("".parse::<Command>().unwrap(), Command::Nothing);
        assert_eq!("q".parse::<Command>().unwrap(), Command::Quit);
        assert!("pick".parse::<Command>().is_err());
        assert!("swap now".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn test_session_converts_after_rates_arrive() -> Result<()> {
        let mut session = session(Arc::new(StaticProvider));
        session.start_refresh();
        assert!(session.is_fetching());
        session.wait_for_rates().await?;
        assert!(!session.is_fetching());

        assert_eq!(session.apply_line("convert")?, Flow::Continue);
        assert_eq!(session.app().form().result(), Some("180,00"));

        session.apply_line("to")?;
        session.apply_line("pick usd")?;
        assert_eq!(session.app().form().to(), "USD");

        session.apply_line("swap")?;
        assert_eq!(session.app().rate_line(), "1 USD = 5.0000 BRL");
        assert_eq!(session.apply_line("quit")?, Flow::Quit);

        let text = output(session);
        assert!(text.contains("1 BRL = 0.1800 EUR"));
        assert!(text.contains("180,00"));
        Ok(())
    }

    #[tokio::test]
    async fn test_session_reports_errors_and_continues() -> Result<()> {
        let mut session = session(Arc::new(FailingProvider));
        session.start_refresh();
        session.wait_for_rates().await?;
        assert_eq!(session.app().rate_line(), "Rate unavailable");

        session.apply_line("convert")?;
        session.apply_line("amount 1.234,56")?;
        session.apply_line("convert")?;
        session.apply_line("pick EUR")?;
        session.apply_line("bogus")?;

        let text = output(session);
        assert!(text.contains("Failed to load exchange rates: HTTP error: 503"));
        assert!(text.contains("Rate unavailable for BRL -> EUR"));
        assert!(text.contains("Invalid amount: \"1.234,56\""));
        assert!(text.contains("No selector is open"));
        assert!(text.contains("Unknown command: bogus"));
        Ok(())
    }

    #[tokio::test]
    async fn test_keyboard_navigation() -> Result<()> {
        let mut session = session(Arc::new(StaticProvider));
        session.start_refresh();
        session.wait_for_rates().await?;

        session.apply_line("from")?;
        session.apply_line("next")?;
        session.apply_line("next")?;
        session.apply_line("enter")?;
        assert_eq!(session.app().form().from(), "USD");
        assert_eq!(session.app().open_selector(), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_line_dismisses_selector() -> Result<()> {
        let mut session = session(Arc::new(StaticProvider));
        session.start_refresh();
        session.wait_for_rates().await?;

        session.apply_line("to")?;
        assert_eq!(session.app().open_selector(), Some(Side::To));
        session.apply_line("")?;
        assert_eq!(session.app().open_selector(), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_supersedes_inflight_fetch() -> Result<()> {
        let mut session = session(Arc::new(StaticProvider));
        session.start_refresh();
        session.apply_line("refresh")?;
        session.wait_for_rates().await?;
        assert!(!session.is_fetching());
        assert_eq!(session.app().rates().status(), &RateStatus::Loaded);
        Ok(())
    }

    #[tokio::test]
    async fn test_run_ends_at_end_of_input() -> Result<()> {
        let mut session = session(Arc::new(StaticProvider));
        let input = tokio::io::BufReader::new("amount 10\nquit\n".as_bytes());
        run(&mut session, input).await?;
        assert_eq!(session.app().form().amount(), "10");
        let text = output(session);
        assert!(text.contains("Exchange rate"));
        Ok(())
    }

    #[test]
    fn test_render_open_selector() {
        let mut app = App::new(&AppConfig::default());
        let ticket = app.begin_refresh();
        app.finish_refresh(
            ticket,
            Ok(RateSnapshot {
                base: "USD".to_string(),
                table: RateTable::try_from([("USD", 1.0), ("BRL", 5.0), ("XAU", 0.0004)])
                    .unwrap(),
                updated_at: None,
            }),
        )
        .unwrap();
        app.handle(Event::ToggleSelector(Side::From)).unwrap();

        let text = render(&app);
        assert!(text.contains("> \u{1F1E7}\u{1F1F7} BRL *"));
        assert!(text.contains("\u{1F310} XAU"));
        assert!(text.contains("Rate unavailable"));
    }
}
