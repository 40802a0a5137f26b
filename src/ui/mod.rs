use ratatui::prelude::*;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;

use crate::config::CELL_W;
use crate::game::{Cell, Field, VisibilityState};

pub fn draw_field(frame: &mut Frame, field: &Field, message: Option<&str>) {
    let area = frame.size();
    let grid_rect = Rect {
        x: area.x,
        y: area.y,
        width: (field.cols() * CELL_W) as u16,
        height: field.rows() as u16,
    }
    .intersection(area);

    let lines: Vec<Line> = (0..field.rows()).map(|row| grid_line(field, row)).collect();
    frame.render_widget(Paragraph::new(lines), grid_rect);

    // The spare row under the grid shows how many bombs are still unflagged.
    if area.height as usize > field.rows() {
        let status_rect = Rect {
            x: area.x,
            y: area.y + field.rows() as u16,
            width: area.width,
            height: 1,
        };
        frame.render_widget(Paragraph::new(status_line(field)), status_rect);
    }

    if let Some(message) = message {
        draw_message(frame, field, grid_rect, message);
    }
}

fn grid_line(field: &Field, row: usize) -> Line<'static> {
    let text: String = (0..field.cols())
        .flat_map(|col| {
            let glyph = glyph(field, row, col);
            if field.at_cursor(row, col) {
                ['[', glyph, ']']
            } else {
                [' ', glyph, ' ']
            }
        })
        .collect();
    Line::raw(text)
}

pub fn glyph(field: &Field, row: usize, col: usize) -> char {
    match field.state(row, col) {
        VisibilityState::Closed => '.',
        VisibilityState::Flagged => '%',
        VisibilityState::Opened => match field.cell(row, col) {
            Cell::Bomb => '@',
            Cell::Empty => match field.count_bombs(row, col) {
                0 => ' ',
                n => char::from_digit(n as u32, 10).unwrap_or('?'),
            },
        },
    }
}

fn status_line(field: &Field) -> String {
    let bombs = if field.is_generated() {
        field.bomb_total()
    } else {
        field.bomb_target()
    };
    format!("bombs left: {}", bombs.saturating_sub(field.flag_count()))
}

/// Message in reverse video, centred horizontally on the grid's middle row.
fn draw_message(frame: &mut Frame, field: &Field, grid_rect: Rect, message: &str) {
    let max = field.cols() * CELL_W;
    let text: String = message.chars().take(max).collect();
    let len = text.chars().count();
    let offset = (max / 2).saturating_sub(len / 2);
    let row = field.rows() - field.rows() / 2 - 1;

    let rect = Rect {
        x: grid_rect.x + offset as u16,
        y: grid_rect.y + row as u16,
        width: len as u16,
        height: 1,
    }
    .intersection(grid_rect);
    let paragraph = Paragraph::new(Line::styled(
        text,
        Style::default().add_modifier(Modifier::REVERSED),
    ));
    frame.render_widget(paragraph, rect);
}
