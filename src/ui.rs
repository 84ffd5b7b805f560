use ratatui::{
    Frame,
    buffer::Buffer,
    layout::Rect,
    style::Stylize,
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Paragraph, Widget},
};

use crate::domain::RtabConfig;
use crate::model::{Model, UiData};

pub const STATUSLINE_HEIGHT: usize = 1;
pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 1;
pub const BORDER_WIDTH: usize = 2;

#[derive(Debug)]
pub struct TableUI {}

impl TableUI {
    pub fn new(_config: &RtabConfig) -> Self {
        Self {}
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        frame.render_widget(
            TableScreen {
                data: model.get_uidata(),
            },
            frame.area(),
        );
    }
}

struct TableScreen<'a> {
    data: &'a UiData,
}

impl Widget for TableScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let data = self.data;

        let title = Line::from(format!(" rtab [{}] ", data.name).bold());
        let instructions = Line::from(vec![
            " Scroll ".into(),
            "<hjkl>".blue().bold(),
            " Breakpoint ".into(),
            "<b>".blue().bold(),
            " Reset ".into(),
            "<r>".blue().bold(),
            " Quit ".into(),
            "<q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);

        let mut lines: Vec<Line<'_>> = Vec::new();

        // Header row. With hide_header the row stays empty but the column
        // slots keep their width.
        if data.hide_header {
            lines.push(Line::from(""));
        } else {
            let cells: Vec<Span<'_>> = data
                .columns
                .iter()
                .map(|c| Span::from(fit(&c.name, c.width)).bold().underlined())
                .collect();
            lines.push(Line::from(join_cells(cells)));
        }

        let visible_rows = data.columns.iter().map(|c| c.data.len()).max().unwrap_or(0);
        for ridx in 0..visible_rows {
            let cells: Vec<Span<'_>> = data
                .columns
                .iter()
                .map(|c| {
                    let cell = c.data.get(ridx).map(|s| s.as_str()).unwrap_or("");
                    Span::from(fit(cell, c.width))
                })
                .collect();
            lines.push(Line::from(join_cells(cells)));
        }

        // Pad up to the status line, then append it
        while lines.len() < data.layout.table_height + TABLE_HEADER_HEIGHT {
            lines.push(Line::from(""));
        }
        lines.push(status_line(data));

        Paragraph::new(Text::from(lines)).block(block).render(area, buf);
    }
}

fn status_line(data: &UiData) -> Line<'_> {
    let rows = if data.nrows == 0 {
        "no rows".to_string()
    } else {
        let last = std::cmp::min(data.first_row + data.layout.table_height, data.nrows);
        format!("rows {}-{}/{}", data.first_row + 1, last, data.nrows)
    };
    let breakpoint = if data.overridden {
        format!("{}*", data.breakpoint)
    } else {
        data.breakpoint.to_string()
    };
    Line::from(vec![
        Span::from(format!(
            " {} | {} | {} | {} ",
            data.table_type,
            breakpoint,
            data.source.as_str(),
            rows
        ))
        .bold(),
        Span::from(data.status_message.as_str()).yellow(),
    ])
}

// Pad or truncate a cell to its column width, leaving one spacer column
fn fit(s: &str, width: usize) -> String {
    let mut out: String = s.chars().take(width).collect();
    while out.chars().count() < width + 1 {
        out.push(' ');
    }
    out
}

fn join_cells(cells: Vec<Span<'_>>) -> Vec<Span<'static>> {
    cells
        .into_iter()
        .map(|s| Span::styled(s.content.into_owned(), s.style))
        .collect()
}
