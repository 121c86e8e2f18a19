use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, Widget},
};

use crate::domain::TableConfig;
use crate::model::Model;
use crate::page::Control;
use crate::sort::SortDirection;
use crate::store::Stripe;

const COLUMN_WIDTH_MARGIN: usize = 2;
const SORT_MARKER_WIDTH: usize = 2;

#[derive(Debug)]
pub struct TableUI {
    config: TableConfig,
    name: String,
}

struct TableView<'a> {
    ui: &'a TableUI,
    model: &'a Model,
}

impl TableUI {
    pub fn new(config: &TableConfig, name: impl Into<String>) -> Self {
        Self {
            config: config.clone(),
            name: name.into(),
        }
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        frame.render_widget(TableView { ui: self, model }, frame.area());
    }

    fn column_widths(&self, model: &Model) -> Vec<Constraint> {
        model
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let cells = model
                    .displayed()
                    .filter_map(|e| e.row.cells.get(idx))
                    .map(|c| c.text.chars().count())
                    .max()
                    .unwrap_or(0);
                let title = column.title.chars().count() + SORT_MARKER_WIDTH;
                let width = title.max(cells) + COLUMN_WIDTH_MARGIN;
                Constraint::Length(width.min(self.config.max_column_width) as u16)
            })
            .collect()
    }
}

fn sort_marker(direction: Option<SortDirection>) -> &'static str {
    match direction {
        Some(SortDirection::Asc) => " ▲",
        Some(SortDirection::Desc) => " ▼",
        None => "",
    }
}

fn control_span(control: &Control) -> Span<'static> {
    let label = format!(" {} ", control.label());
    match control {
        Control::Page { active: true, .. } => label.black().on_yellow(),
        Control::Prev { disabled: true, .. } | Control::Next { disabled: true, .. } => label.dark_gray(),
        Control::Ellipsis => label.dark_gray(),
        _ => label.into(),
    }
}

impl TableView<'_> {
    fn header(&self) -> Row<'static> {
        let header_sort = &self.model.snapshot().header_sort;
        let cells: Vec<Cell> = self
            .model
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let marker = sort_marker(header_sort.get(idx).copied().flatten());
                Cell::from(format!("{}{}", column.title, marker))
            })
            .collect();
        Row::new(cells).style(Style::new().bold().fg(Color::Yellow))
    }

    fn rows(&self) -> Vec<Row<'static>> {
        self.model
            .displayed()
            .map(|entry| {
                let cells: Vec<Cell> = entry.row.cells.iter().map(|c| Cell::from(c.text.clone())).collect();
                let style = match entry.row.stripe {
                    Some(Stripe::Even) => Style::new().bg(Color::DarkGray),
                    _ => Style::new(),
                };
                Row::new(cells).style(style)
            })
            .collect()
    }

    fn pagination_line(&self) -> Line<'static> {
        let options = self.model.options();
        if !options.pagination {
            return Line::default();
        }
        let document = self.model.document();
        let mut spans: Vec<Span> = Vec::new();
        if let Some(info) = options.pagination_info.as_deref().and_then(|s| document.text(s)) {
            spans.push(Span::from(format!("{info}  ")));
        }
        if let Some(controls) = options.pagination_controls.as_deref().and_then(|s| document.controls(s)) {
            spans.extend(controls.iter().map(control_span));
        }
        Line::from(spans)
    }

    fn status_line(&self) -> Line<'static> {
        if let Some(input) = self.model.search_line() {
            return Line::from(vec!["/".blue().bold(), Span::from(input.input.clone())]);
        }
        let query = self.model.search_query();
        if query.is_empty() {
            Line::from(format!("{} of {} records", self.model.visible_data().len(), self.model.entries().len()))
        } else {
            Line::from(vec![
                "search: ".blue(),
                Span::from(query.to_string()),
                Span::from(format!("  ({} matches)", self.model.visible_data().len())),
            ])
        }
    }

    fn render_popup(&self, message: &str, area: Rect, buf: &mut Buffer) {
        let width = message.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4;
        let height = message.lines().count() as u16 + 2;
        let [area] = Layout::horizontal([Constraint::Length(width)]).flex(Flex::Center).areas(area);
        let [area] = Layout::vertical([Constraint::Length(height)]).flex(Flex::Center).areas(area);
        Clear.render(area, buf);
        Paragraph::new(message.to_string())
            .block(Block::bordered().title(" Help ").border_set(border::THICK))
            .render(area, buf);
    }
}

impl Widget for TableView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = Line::from(format!(" {} ", self.ui.name).bold());
        let instructions = Line::from(vec![
            " Pages ".into(),
            "<Left/Right>".blue().bold(),
            " Sort ".into(),
            "<1-9>".blue().bold(),
            " Search ".into(),
            "</>".blue().bold(),
            " Help ".into(),
            "<?>".blue().bold(),
            " Quit ".into(),
            "<Q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);
        let inner = block.inner(area);
        block.render(area, buf);

        let [table_area, pagination_area, status_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        Table::new(self.rows(), self.ui.column_widths(self.model))
            .header(self.header())
            .column_spacing(1)
            .render(table_area, buf);
        if self.model.no_results_visible() {
            // Spans all columns, below the header.
            let [_, placeholder] =
                Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(table_area);
            Line::from(self.model.no_results_text().italic()).render(placeholder, buf);
        }
        self.pagination_line().render(pagination_area, buf);
        self.status_line().render(status_area, buf);

        if let Some(message) = self.model.popup() {
            self.render_popup(message, area, buf);
        }
    }
}
