// src/cli/state.rs
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::widgets::TableState;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cli::api::Client;
use crate::cli::events::Update;
use crate::cli::input::LineEdit;
use crate::cli::util::{fmt_money, parse_money};
use crate::dashboard::DashboardView;

pub const MONTHS: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

/// Sent as `type_invest` when no goal exists yet.
pub const OTHER_INVEST: &str = "lainnya";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateGoalReq {
    pub title: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRecordReq {
    pub bulan: String,
    pub tahun: i64,
    pub income: String,
    pub outcome: String,
    pub emergency_outcome: String,
    pub emergency_outcome_reason: String,
    pub type_invest: Option<String>,
    pub total: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOutcomeReq {
    pub title: String,
    pub price: String,
    pub quantity: i64,
    /// Dot grouped, the way it is shown.
    pub total: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Goal(CreateGoalReq),
    Record(CreateRecordReq),
    Outcome(CreateOutcomeReq),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Goals,
    Records,
    Outcomes,
    Help,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Dashboard, Tab::Goals, Tab::Records, Tab::Outcomes, Tab::Help];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Goals => "Goals",
            Tab::Records => "Records",
            Tab::Outcomes => "Outcomes",
            Tab::Help => "Help",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    fn shifted(self, delta: isize) -> Tab {
        let n = Self::ALL.len() as isize;
        Self::ALL[(self.index() as isize + delta).rem_euclid(n) as usize]
    }
}

// ============= Forms =============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Goal,
    Record,
    Outcome,
}

#[derive(Debug, Clone)]
pub enum Input {
    Text(LineEdit),
    Choice { options: Vec<String>, sel: usize },
}

#[derive(Debug, Clone)]
pub struct Field {
    pub label: &'static str,
    pub input: Input,
    /// Shown with thousands grouping.
    pub money: bool,
}

impl Field {
    fn text(label: &'static str) -> Self {
        Self { label, input: Input::Text(LineEdit::default()), money: false }
    }

    fn number(label: &'static str, initial: &str) -> Self {
        let mut edit = LineEdit::numeric();
        edit.set(initial);
        Self { label, input: Input::Text(edit), money: false }
    }

    fn money(label: &'static str, initial: &str) -> Self {
        Self { money: true, ..Self::number(label, initial) }
    }

    fn choice(label: &'static str, options: Vec<String>, sel: usize) -> Self {
        let sel = sel.min(options.len().saturating_sub(1));
        Self { label, input: Input::Choice { options, sel }, money: false }
    }

    pub fn value(&self) -> String {
        match &self.input {
            Input::Text(edit) => edit.value.trim().to_string(),
            Input::Choice { options, sel } => options.get(*sel).cloned().unwrap_or_default(),
        }
    }

    pub fn display(&self) -> String {
        match &self.input {
            Input::Text(edit) if self.money => super::util::group_digits(&edit.value),
            Input::Text(edit) => edit.value.clone(),
            Input::Choice { .. } => format!("< {} >", self.value()),
        }
    }

    fn amount(&self) -> Decimal {
        parse_money(&self.value()).unwrap_or(Decimal::ZERO)
    }
}

pub enum FormAction {
    None,
    Submit,
    Cancel,
}

mod goal_field {
    pub const TITLE: usize = 0;
    pub const TARGET: usize = 1;
}

mod record_field {
    pub const BULAN: usize = 0;
    pub const TAHUN: usize = 1;
    pub const INCOME: usize = 2;
    pub const OUTCOME: usize = 3;
    pub const EMERGENCY: usize = 4;
    pub const REASON: usize = 5;
    pub const INVEST: usize = 6;
}

mod outcome_field {
    pub const TITLE: usize = 0;
    pub const PRICE: usize = 1;
    pub const QTY: usize = 2;
}

#[derive(Debug, Clone)]
pub struct Form {
    pub kind: FormKind,
    pub fields: Vec<Field>,
    pub focus: usize,
    pub error: Option<String>,
}

impl Form {
    pub fn goal() -> Self {
        Self::with(FormKind::Goal, vec![Field::text("Title"), Field::money("Target", "")])
    }

    /// The outcome field starts at the current spending total and the
    /// investment choice lists the existing goals.
    pub fn record(view: Option<&DashboardView>, month0: usize, year: i32) -> Self {
        let mut goals: Vec<String> = view
            .map(|v| v.goals.iter().map(|g| g.title.clone()).collect())
            .unwrap_or_default();
        if goals.is_empty() {
            goals.push(OTHER_INVEST.to_string());
        }
        let total_outcome = view.map_or(Decimal::ZERO, |v| v.total_outcome);
        let months = MONTHS.iter().map(|m| m.to_string()).collect();

        Self::with(
            FormKind::Record,
            vec![
                Field::choice("Month", months, month0),
                Field::number("Year", &year.to_string()),
                Field::money("Income", ""),
                Field::money("Outcome", &total_outcome.max(Decimal::ZERO).round_dp(0).to_string()),
                Field::money("Emergency", ""),
                Field::text("Emergency reason"),
                Field::choice("Invest to", goals, 0),
            ],
        )
    }

    pub fn outcome() -> Self {
        Self::with(
            FormKind::Outcome,
            vec![Field::text("Title"), Field::money("Price", ""), Field::number("Quantity", "1")],
        )
    }

    fn with(kind: FormKind, fields: Vec<Field>) -> Self {
        Self { kind, fields, focus: 0, error: None }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            FormKind::Goal => "New Goal",
            FormKind::Record => "New Record",
            FormKind::Outcome => "New Outcome",
        }
    }

    fn field(&self, i: usize) -> &Field {
        &self.fields[i]
    }

    /// Live total shown under the fields: savings left for a record,
    /// price times quantity for an outcome.
    pub fn derived_total(&self) -> Option<Decimal> {
        use record_field as r;
        match self.kind {
            FormKind::Goal => None,
            FormKind::Record => Some(
                self.field(r::INCOME).amount()
                    - self.field(r::OUTCOME).amount()
                    - self.field(r::EMERGENCY).amount(),
            ),
            FormKind::Outcome => Some(
                self.field(outcome_field::PRICE).amount() * self.field(outcome_field::QTY).amount(),
            ),
        }
    }

    pub fn handle_key(&mut self, k: KeyEvent) -> FormAction {
        let n = self.fields.len();
        match k.code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Enter => return FormAction::Submit,
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % n,
            KeyCode::BackTab | KeyCode::Up => self.focus = (self.focus + n - 1) % n,
            code => match &mut self.fields[self.focus].input {
                Input::Choice { options, sel } => {
                    let len = options.len().max(1);
                    match code {
                        KeyCode::Left => *sel = (*sel + len - 1) % len,
                        KeyCode::Right | KeyCode::Char(' ') => *sel = (*sel + 1) % len,
                        _ => {}
                    }
                }
                Input::Text(edit) => match code {
                    KeyCode::Char(c) => edit.push(c),
                    KeyCode::Backspace => edit.backspace(),
                    KeyCode::Delete => edit.delete(),
                    KeyCode::Left => edit.left(),
                    KeyCode::Right => edit.right(),
                    _ => {}
                },
            },
        }
        FormAction::None
    }

    /// Builds the request body, or the message to show next to the form.
    pub fn request(&self) -> Result<Request, String> {
        match self.kind {
            FormKind::Goal => {
                use goal_field as g;
                let title = self.required(g::TITLE)?;
                let target = self.required(g::TARGET)?;
                Ok(Request::Goal(CreateGoalReq { title, target }))
            }
            FormKind::Record => {
                use record_field as r;
                let bulan = self.required(r::BULAN)?;
                let tahun = self
                    .required(r::TAHUN)?
                    .parse::<i64>()
                    .map_err(|_| "Year must be a number".to_string())?;
                let total = self.derived_total().unwrap_or(Decimal::ZERO);
                Ok(Request::Record(CreateRecordReq {
                    bulan,
                    tahun,
                    income: self.amount_or_zero(r::INCOME),
                    outcome: self.amount_or_zero(r::OUTCOME),
                    emergency_outcome: self.amount_or_zero(r::EMERGENCY),
                    emergency_outcome_reason: self.field(r::REASON).value(),
                    type_invest: Some(self.field(r::INVEST).value()).filter(|s| !s.is_empty()),
                    total: total.to_string(),
                }))
            }
            FormKind::Outcome => {
                use outcome_field as o;
                let title = self.required(o::TITLE)?;
                let price = self.required(o::PRICE)?;
                let quantity = self
                    .required(o::QTY)?
                    .parse::<i64>()
                    .map_err(|_| "Quantity must be a whole number".to_string())?;
                let total = self.derived_total().unwrap_or(Decimal::ZERO);
                Ok(Request::Outcome(CreateOutcomeReq {
                    title,
                    price,
                    quantity,
                    total: fmt_money(&total),
                }))
            }
        }
    }

    fn required(&self, i: usize) -> Result<String, String> {
        let field = self.field(i);
        let value = field.value();
        if value.is_empty() {
            Err(format!("{} is required", field.label))
        } else {
            Ok(value)
        }
    }

    fn amount_or_zero(&self, i: usize) -> String {
        let value = self.field(i).value();
        if value.is_empty() { "0".into() } else { value }
    }
}

// ============= App =============

pub struct App {
    pub api: Client,
    pub tab: Tab,
    pub view: Option<DashboardView>,
    pub goals_sel: TableState,
    pub records_sel: TableState,
    pub outcomes_sel: TableState,
    pub form: Option<Form>,
    pub status: String,
    /// Realtime stream is connected; mutations arrive through it.
    pub live: bool,
    pub quit: bool,
}

impl App {
    pub fn new(api: Client) -> Self {
        Self {
            api,
            tab: Tab::Dashboard,
            view: None,
            goals_sel: TableState::default(),
            records_sel: TableState::default(),
            outcomes_sel: TableState::default(),
            form: None,
            status: "Connecting… | ? for help | q to quit".into(),
            live: false,
            quit: false,
        }
    }

    pub fn apply_update(&mut self, update: Update) {
        match update {
            Update::Connected => {
                self.live = true;
                self.status = "Live".into();
            }
            Update::Disconnected(reason) => {
                self.live = false;
                self.status = format!("Offline ({reason}), retrying…");
            }
            Update::View(view) => self.apply_view(*view),
        }
    }

    /// Replaces the whole view and keeps each selection inside its table.
    pub fn apply_view(&mut self, view: DashboardView) {
        clamp(&mut self.goals_sel, view.goals.len());
        clamp(&mut self.records_sel, view.records.len());
        clamp(&mut self.outcomes_sel, view.outcomes.len());
        self.view = Some(view);
    }

    pub async fn refresh(&mut self) {
        match self.api.dashboard().await {
            Ok(view) => {
                self.apply_view(view);
                self.status = if self.live { "Live".into() } else { "Refreshed".into() };
            }
            Err(e) => self.status = format!("Refresh failed: {e}"),
        }
    }

    pub async fn handle_key(&mut self, k: KeyEvent) -> anyhow::Result<()> {
        if k.kind != KeyEventKind::Press {
            return Ok(());
        }

        if let Some(form) = self.form.as_mut() {
            match form.handle_key(k) {
                FormAction::None => {}
                FormAction::Cancel => self.form = None,
                FormAction::Submit => self.submit().await,
            }
            return Ok(());
        }

        match k.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Tab | KeyCode::Right => self.tab = self.tab.shifted(1),
            KeyCode::BackTab | KeyCode::Left => self.tab = self.tab.shifted(-1),
            KeyCode::Char(c @ '1'..='5') => self.tab = Tab::ALL[(c as u8 - b'1') as usize],
            KeyCode::Char('?') => self.tab = Tab::Help,
            KeyCode::Char('r') => self.refresh().await,
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Char('n') => self.open_form(),
            KeyCode::Char('x') | KeyCode::Delete => self.delete_selected().await,
            _ => {}
        }
        Ok(())
    }

    fn open_form(&mut self) {
        use chrono::Datelike;
        let now = chrono::Local::now();
        self.form = match self.tab {
            Tab::Goals | Tab::Dashboard => Some(Form::goal()),
            Tab::Records => Some(Form::record(self.view.as_ref(), now.month0() as usize, now.year())),
            Tab::Outcomes => Some(Form::outcome()),
            Tab::Help => None,
        };
    }

    async fn submit(&mut self) {
        let Some(form) = self.form.as_mut() else { return };
        let req = match form.request() {
            Ok(req) => req,
            Err(msg) => {
                form.error = Some(msg);
                return;
            }
        };

        let result = match &req {
            Request::Goal(r) => self.api.create_goal(r).await.map(|g| format!("Goal \"{}\" created", g.title)),
            Request::Record(r) => self
                .api
                .create_record(r)
                .await
                .map(|rec| format!("Record {} {} created", rec.bulan, rec.tahun)),
            Request::Outcome(r) => self
                .api
                .create_outcome(r)
                .await
                .map(|o| format!("Outcome \"{}\" created", o.title)),
        };

        match result {
            Ok(msg) => {
                self.form = None;
                self.status = msg;
                if !self.live {
                    self.refresh().await;
                }
            }
            Err(e) => {
                if let Some(form) = self.form.as_mut() {
                    form.error = Some(format!("Save failed: {e}"));
                }
            }
        }
    }

    fn selected_id(&self) -> Option<(Tab, i64)> {
        let view = self.view.as_ref()?;
        match self.tab {
            Tab::Goals => view.goals.get(self.goals_sel.selected()?).map(|g| (Tab::Goals, g.id)),
            Tab::Records => view.records.get(self.records_sel.selected()?).map(|r| (Tab::Records, r.id)),
            Tab::Outcomes => view
                .outcomes
                .get(self.outcomes_sel.selected()?)
                .map(|o| (Tab::Outcomes, o.id)),
            Tab::Dashboard | Tab::Help => None,
        }
    }

    async fn delete_selected(&mut self) {
        let Some((tab, id)) = self.selected_id() else { return };
        let result = match tab {
            Tab::Goals => self.api.delete_goal(id).await.map(|_| "Goal deleted"),
            Tab::Records => self.api.delete_record(id).await.map(|_| "Record deleted"),
            Tab::Outcomes => self.api.delete_outcome(id).await.map(|_| "Outcome deleted"),
            Tab::Dashboard | Tab::Help => return,
        };
        match result {
            Ok(msg) => {
                self.status = msg.into();
                if !self.live {
                    self.refresh().await;
                }
            }
            Err(e) => self.status = format!("Delete failed: {e}"),
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let Some(view) = self.view.as_ref() else { return };
        let (sel, n) = match self.tab {
            Tab::Goals => (&mut self.goals_sel, view.goals.len()),
            Tab::Records => (&mut self.records_sel, view.records.len()),
            Tab::Outcomes => (&mut self.outcomes_sel, view.outcomes.len()),
            Tab::Dashboard | Tab::Help => return,
        };
        if n == 0 {
            sel.select(None);
            return;
        }
        let cur = sel.selected().unwrap_or(0) as isize;
        sel.select(Some((cur + delta).rem_euclid(n as isize) as usize));
    }
}

fn clamp(sel: &mut TableState, len: usize) {
    match (len, sel.selected()) {
        (0, _) => sel.select(None),
        (n, Some(i)) if i >= n => sel.select(Some(n - 1)),
        (_, None) => sel.select(Some(0)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Goal, Outcome};
    use chrono::Utc;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(form: &mut Form, s: &str) {
        for c in s.chars() {
            form.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn goal(id: i64, title: &str) -> Goal {
        Goal { id, title: title.into(), target: "5000000".into(), created_at: Utc::now() }
    }

    fn outcome(id: i64) -> Outcome {
        Outcome {
            id,
            title: "Kopi".into(),
            price: "25000".into(),
            qty: 2.0,
            total: "50.000".into(),
            created_at: Utc::now(),
        }
    }

    fn view(goals: Vec<Goal>, outcomes: Vec<Outcome>) -> DashboardView {
        crate::dashboard::compute(goals, outcomes, vec![])
    }

    #[test]
    fn outcome_form_multiplies_and_groups_total() {
        let mut form = Form::outcome();
        type_text(&mut form, "Kopi");
        form.handle_key(key(KeyCode::Tab));
        type_text(&mut form, "25000");
        form.handle_key(key(KeyCode::Tab));
        form.handle_key(key(KeyCode::Backspace));
        type_text(&mut form, "3");

        assert_eq!(form.derived_total(), Some(Decimal::from(75_000)));
        assert_eq!(
            form.request(),
            Ok(Request::Outcome(CreateOutcomeReq {
                title: "Kopi".into(),
                price: "25000".into(),
                quantity: 3,
                total: "75.000".into(),
            }))
        );
    }

    #[test]
    fn record_form_prefills_outcome_and_computes_savings() {
        let v = view(vec![goal(1, "Emergency Fund"), goal(2, "Liburan")], vec![outcome(1)]);
        let mut form = Form::record(Some(&v), 9, 2025);

        assert_eq!(form.fields[record_field::BULAN].value(), "Oktober");
        assert_eq!(form.fields[record_field::OUTCOME].value(), "50000");

        form.focus = record_field::INCOME;
        type_text(&mut form, "1000000");
        form.focus = record_field::EMERGENCY;
        type_text(&mut form, "150000");
        form.focus = record_field::INVEST;
        form.handle_key(key(KeyCode::Right));

        let Ok(Request::Record(req)) = form.request() else {
            panic!("expected a record request");
        };
        assert_eq!(req.tahun, 2025);
        assert_eq!(req.income, "1000000");
        assert_eq!(req.outcome, "50000");
        assert_eq!(req.emergency_outcome, "150000");
        assert_eq!(req.total, "800000");
        assert_eq!(req.type_invest.as_deref(), Some("Liburan"));
    }

    #[test]
    fn record_form_without_goals_invests_to_other() {
        let form = Form::record(None, 0, 2024);
        let Ok(Request::Record(req)) = form.request() else {
            panic!("expected a record request");
        };
        assert_eq!(req.type_invest.as_deref(), Some(OTHER_INVEST));
        assert_eq!(req.income, "0");
        assert_eq!(req.total, "0");
    }

    #[test]
    fn missing_fields_are_reported_by_label() {
        let mut form = Form::goal();
        assert_eq!(form.request(), Err("Title is required".into()));
        type_text(&mut form, "Rumah");
        assert_eq!(form.request(), Err("Target is required".into()));
        form.handle_key(key(KeyCode::Up));
        type_text(&mut form, "1.000.000");
        assert_eq!(
            form.request(),
            Ok(Request::Goal(CreateGoalReq { title: "Rumah".into(), target: "1000000".into() }))
        );
    }

    #[test]
    fn new_view_clamps_selection() {
        let mut app = App::new(Client::new("http://127.0.0.1:9").unwrap());
        app.apply_view(view(vec![goal(1, "a"), goal(2, "b"), goal(3, "c")], vec![]));
        assert_eq!(app.goals_sel.selected(), Some(0));
        app.goals_sel.select(Some(2));

        app.apply_view(view(vec![goal(1, "a")], vec![]));
        assert_eq!(app.goals_sel.selected(), Some(0));

        app.apply_view(view(vec![], vec![]));
        assert_eq!(app.goals_sel.selected(), None);
    }

    #[tokio::test]
    async fn navigation_and_forms_stay_local() {
        let mut app = App::new(Client::new("http://127.0.0.1:9").unwrap());
        app.apply_update(Update::Connected);
        assert!(app.live);

        app.handle_key(key(KeyCode::Char('3'))).await.unwrap();
        assert_eq!(app.tab, Tab::Records);
        app.handle_key(key(KeyCode::Tab)).await.unwrap();
        assert_eq!(app.tab, Tab::Outcomes);

        app.handle_key(key(KeyCode::Char('n'))).await.unwrap();
        assert_eq!(app.form.as_ref().map(|f| f.kind), Some(FormKind::Outcome));
        // 'q' is text while a form is open
        app.handle_key(key(KeyCode::Char('q'))).await.unwrap();
        assert!(!app.quit);
        app.handle_key(key(KeyCode::Esc)).await.unwrap();
        assert!(app.form.is_none());

        app.handle_key(key(KeyCode::Char('q'))).await.unwrap();
        assert!(app.quit);
    }
}
