use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

use crate::cli::state::{App, Form, Tab};
use crate::cli::util::{fmt_money, parse_money, progress_ratio};
use crate::dashboard::amount::parse_plain;
use crate::dashboard::DashboardView;

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.size();

    // top tabs | main content | bottom status bar
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10), Constraint::Length(1)])
        .split(size);

    let titles = Tab::ALL
        .into_iter()
        .enumerate()
        .map(|(i, t)| Line::from(Span::raw(format!("{} {}", i + 1, t.title()))))
        .collect::<Vec<_>>();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .block(Block::default().borders(Borders::ALL).title("Finance Dashboard"))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(tabs, root[0]);

    match app.tab {
        Tab::Help => draw_help(f, root[1]),
        _ if app.view.is_none() => {
            let p = Paragraph::new("Waiting for the server… (r to retry)")
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(p, root[1]);
        }
        Tab::Dashboard => {
            if let Some(view) = &app.view {
                draw_dashboard(f, root[1], view);
            }
        }
        Tab::Goals => draw_goals(f, root[1], app),
        Tab::Records => draw_records(f, root[1], app),
        Tab::Outcomes => draw_outcomes(f, root[1], app),
    }

    draw_status(f, root[2], app);

    if let Some(form) = &app.form {
        let area = center_rect(root[1], 60, form.fields.len() as u16 + 7);
        f.render_widget(Clear, area);
        draw_form(f, area, form);
    }
}

// Dashboard Page

fn draw_dashboard(f: &mut Frame, area: Rect, view: &DashboardView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let summary = Paragraph::new(format!(
        "Total outcome: {}    Goals: {}    Records: {}",
        fmt_money(&view.total_outcome),
        view.goals.len(),
        view.records.len()
    ))
    .block(Block::default().borders(Borders::ALL).title("Summary"));
    f.render_widget(summary, chunks[0]);

    let block = Block::default().borders(Borders::ALL).title("Savings per goal");
    let inner = block.inner(chunks[1]);
    f.render_widget(block, chunks[1]);

    if view.rekap_invest.is_empty() {
        f.render_widget(Paragraph::new("No goals yet. Add one on the Goals tab (n)."), inner);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            view.rekap_invest
                .iter()
                .map(|_| Constraint::Length(2))
                .chain(std::iter::once(Constraint::Min(0)))
                .collect::<Vec<_>>(),
        )
        .split(inner);

    for (rekap, row) in view.rekap_invest.iter().zip(rows.iter()) {
        let collected = parse_plain(&rekap.total_terkumpul).unwrap_or_default();
        let target = parse_money(&rekap.target).unwrap_or_default();
        let ratio = progress_ratio(&rekap.total_terkumpul, &rekap.target);
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(ratio)
            .label(format!(
                "{}  {} / {}  ({:.0}%)",
                rekap.type_invest,
                fmt_money(&collected),
                fmt_money(&target),
                ratio * 100.0
            ));
        f.render_widget(gauge, Rect { height: 1, ..*row });
    }
}

// Table Pages

fn draw_goals(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(view) = app.view.as_ref() else { return };
    let body: Vec<Row> = view
        .goals
        .iter()
        .map(|g| {
            Row::new(vec![
                Cell::from(g.id.to_string()),
                Cell::from(g.title.clone()),
                Cell::from(money_cell(&g.target)),
                Cell::from(g.created_at.format("%Y-%m-%d").to_string()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Percentage(50),
        Constraint::Length(16),
        Constraint::Length(12),
    ];
    let table = Table::new(body, widths)
        .header(header(&["ID", "Title", "Target", "Created"]))
        .block(titled("Goals  (Up/Down, n=new, x=delete)"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(table, area, &mut app.goals_sel);
}

fn draw_records(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(view) = app.view.as_ref() else { return };
    let body: Vec<Row> = view
        .records
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(format!("{} {}", r.bulan, r.tahun)),
                Cell::from(money_cell(&r.income)),
                Cell::from(money_cell(&r.outcome)),
                Cell::from(money_cell(&r.emergency_outcome)),
                Cell::from(r.type_invest.clone().unwrap_or_else(|| "-".into())),
                Cell::from(money_cell(&r.total)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(16),
        Constraint::Length(13),
        Constraint::Length(13),
        Constraint::Length(13),
        Constraint::Min(12),
        Constraint::Length(13),
    ];
    let table = Table::new(body, widths)
        .header(header(&["Period", "Income", "Outcome", "Emergency", "Invest to", "Saved"]))
        .block(titled("Records  (Up/Down, n=new, x=delete)"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(table, area, &mut app.records_sel);
}

fn draw_outcomes(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(view) = app.view.as_ref() else { return };
    let body: Vec<Row> = view
        .outcomes
        .iter()
        .map(|o| {
            Row::new(vec![
                Cell::from(o.title.clone()),
                Cell::from(money_cell(&o.price)),
                Cell::from(o.qty.to_string()),
                Cell::from(o.total.clone()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(45),
        Constraint::Length(14),
        Constraint::Length(6),
        Constraint::Length(16),
    ];
    let table = Table::new(body, widths)
        .header(header(&["Title", "Price", "Qty", "Total"]))
        .block(titled(&format!(
            "Outcomes  total {}  (Up/Down, n=new, x=delete)",
            fmt_money(&view.total_outcome)
        )))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(table, area, &mut app.outcomes_sel);
}

fn draw_form(f: &mut Frame, area: Rect, form: &Form) {
    let mut lines: Vec<Line> = form
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let text = format!("{:<17}: {}", field.label, field.display());
            if i == form.focus {
                Line::styled(text, Style::default().add_modifier(Modifier::REVERSED))
            } else {
                Line::raw(text)
            }
        })
        .collect();

    if let Some(total) = form.derived_total() {
        lines.push(Line::raw(format!("{:<17}: {}", "Total", fmt_money(&total))));
    }
    lines.push(Line::raw(""));
    lines.push(Line::raw("Tab/↑↓: field | ←/→: choose | Enter: save | Esc: cancel"));
    if let Some(err) = &form.error {
        lines.push(Line::styled(err.clone(), Style::default().fg(Color::Red)));
    }

    let p = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(form.title()))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let marker = if app.live {
        Span::styled("● ", Style::default().fg(Color::Green))
    } else {
        Span::styled("● ", Style::default().fg(Color::Red))
    };
    f.render_widget(Paragraph::new(Line::from(vec![marker, Span::raw(app.status.clone())])), area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help_text = [
        "Global Keys:",
        "  q          : Quit",
        "  1-5 / Tab  : Switch tabs",
        "  ?          : This help",
        "  r          : Reload the dashboard from the server",
        "",
        "Goals / Records / Outcomes:",
        "  Up/Down    : Navigate list",
        "  n          : New entry",
        "  x/Del      : Delete selected entry",
        "",
        "Forms:",
        "  Tab/Up/Down: Move between fields",
        "  Left/Right : Change month or goal",
        "  Enter      : Save",
        "  Esc        : Cancel",
        "",
        "Updates from other clients appear as soon as the server sends them.",
    ]
    .join("\n");

    let p = Paragraph::new(help_text).block(titled("Help & Keybindings"));
    f.render_widget(p, area);
}

fn header(cols: &[&'static str]) -> Row<'static> {
    Row::new(cols.to_vec()).style(Style::default().add_modifier(Modifier::BOLD))
}

fn titled(title: &str) -> Block<'static> {
    Block::default().borders(Borders::ALL).title(title.to_string())
}

/// Stored amounts are plain numbers; anything else is shown as typed.
fn money_cell(raw: &str) -> String {
    parse_plain(raw).map_or_else(|| raw.to_string(), |d| fmt_money(&d))
}

fn center_rect(rect: Rect, w: u16, h: u16) -> Rect {
    let x = rect.x + rect.width.saturating_sub(w) / 2;
    let y = rect.y + rect.height.saturating_sub(h) / 2;
    Rect { x, y, width: w.min(rect.width), height: h.min(rect.height) }
}
