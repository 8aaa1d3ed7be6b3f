use handmate::{
    classifier::GestureLabel,
    engine::{Color as Side, Piece, PieceKind},
    projection::VisualProjection,
    square::Square,
};
use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const SQUARE_WIDTH: u16 = 3;
// rank label column plus borders
const BOARD_WIDTH: u16 = SQUARE_WIDTH * 8 + 2 + 2;
const BOARD_HEIGHT: u16 = 8 + 1 + 2;

const LIGHT_SQUARE: Color = Color::Rgb(240, 217, 181);
const DARK_SQUARE: Color = Color::Rgb(181, 136, 99);
const SELECTED_SQUARE: Color = Color::Rgb(246, 246, 105);
const TARGET_SQUARE: Color = Color::Rgb(130, 151, 105);

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([Constraint::Length(BOARD_WIDTH), Constraint::Min(20)])
            .split(area);

        let board_area = Rect {
            height: chunks[0].height.min(BOARD_HEIGHT),
            ..chunks[0]
        };
        Paragraph::new(board_lines(&self.pipeline.projection()))
            .block(Block::default().borders(Borders::ALL).title(" handmate "))
            .render(board_area, buf);

        Paragraph::new(panel_lines(self))
            .block(Block::default().borders(Borders::ALL).title(format!(
                " {} ",
                mode_name(self.state)
            )))
            .wrap(Wrap { trim: true })
            .render(chunks[1], buf);
    }
}

fn mode_name(state: AppState) -> &'static str {
    match state {
        AppState::Play => "Play",
        AppState::Record => "Record",
    }
}

fn glyph(piece: Piece) -> char {
    // filled glyphs for both sides, colour tells them apart
    match piece.kind {
        PieceKind::King => '♚',
        PieceKind::Queen => '♛',
        PieceKind::Rook => '♜',
        PieceKind::Bishop => '♝',
        PieceKind::Knight => '♞',
        PieceKind::Pawn => '♟',
    }
}

fn square_style(view: &VisualProjection, square: Square) -> Style {
    let bg = if view.selected == Some(square) {
        SELECTED_SQUARE
    } else if view.is_highlighted(square) {
        TARGET_SQUARE
    } else if square.is_light() {
        LIGHT_SQUARE
    } else {
        DARK_SQUARE
    };
    let style = Style::default().bg(bg);
    match view.piece_at(square).map(|p| p.color) {
        Some(Side::White) => style.fg(Color::White).add_modifier(Modifier::BOLD),
        Some(Side::Black) => style.fg(Color::Black),
        None => style.fg(Color::DarkGray),
    }
}

fn board_lines(view: &VisualProjection) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = (1..=8u8)
        .rev()
        .map(|rank| {
            let mut spans = vec![Span::raw(format!("{rank} "))];
            spans.extend((0..8u8).filter_map(|file| Square::new(file, rank)).map(|sq| {
                let mark = match view.piece_at(sq) {
                    Some(piece) => glyph(piece),
                    None if view.is_highlighted(sq) => '·',
                    None => ' ',
                };
                Span::styled(format!(" {mark} "), square_style(view, sq))
            }));
            Line::from(spans)
        })
        .collect();

    let files = ('a'..='h').map(|c| format!(" {c} ")).join("");
    lines.push(Line::from(format!("  {files}")));
    lines
}

fn panel_lines(app: &App) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);
    let italic = Style::default().add_modifier(Modifier::ITALIC);

    let status = app.pipeline.status();
    let status_style = if status.is_over() {
        bold.fg(Color::Red)
    } else if status.in_check {
        bold.fg(Color::Yellow)
    } else {
        bold
    };

    let mut lines = vec![
        Line::from(Span::styled(app.pipeline.status_text(), status_style)),
        Line::from(Span::styled(
            app.pipeline.gesture_text(),
            Style::default().fg(Color::Magenta),
        )),
    ];

    let view = app.pipeline.projection();
    if let Some(selected) = view.selected {
        let targets = view.highlighted.iter().join(" ");
        lines.push(Line::from(vec![
            Span::styled(format!("{selected}"), Style::default().fg(Color::Green)),
            Span::raw(" -> "),
            Span::raw(targets),
        ]));
    }
    lines.push(Line::default());

    if app.state == AppState::Record {
        let recorder = app.pipeline.recorder();
        match (
            recorder.session().active_label.as_deref(),
            recorder.remaining(app.now()),
        ) {
            (Some(label), Some(left)) => lines.push(Line::from(Span::styled(
                format!("● REC {label} {:.1}s left", left.as_secs_f32()),
                bold.fg(Color::Red),
            ))),
            _ => lines.push(Line::from(Span::styled("not recording", dim))),
        }
        for label in GestureLabel::ALL {
            let frames = recorder.buffer(label.as_str()).len();
            lines.push(Line::from(format!("{:<7}{frames:>5} frames", label.as_str())));
        }
        lines.push(Line::default());
    }

    if let Some(notice) = &app.notice {
        lines.push(Line::from(Span::styled(notice.clone(), italic)));
    }
    if app.stream_ended {
        lines.push(Line::from(Span::styled(
            "landmark stream ended",
            italic.fg(Color::Yellow),
        )));
    }

    let help = match app.state {
        AppState::Play => "(n)ew game  (tab) record  (q)uit",
        AppState::Record => "(1)select (2)grab (3)place (4)none  (e)xport  (x)clear  (tab) play  (q)uit",
    };
    lines.push(Line::from(Span::styled(help, dim)));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use handmate::engine::{RulesEngine, StandardChess};
    use handmate::interaction::InteractionState;
    use handmate::projection::project;

    fn text(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn board_has_ranks_top_down_and_file_labels() {
        let view = project(&InteractionState::Idle, &StandardChess::new());
        let rows = text(&board_lines(&view));

        assert_eq!(rows.len(), 9);
        assert!(rows[0].starts_with("8 "));
        assert!(rows[7].starts_with("1 "));
        assert_eq!(rows[8], "   a  b  c  d  e  f  g  h ");
        assert!(rows[1].contains('♟'));
        assert!(rows[3].chars().skip(2).all(|c| c == ' '));
    }

    #[test]
    fn selection_marks_empty_targets() {
        let engine = StandardChess::new();
        let from: Square = "g1".parse().unwrap();
        let state = InteractionState::Selected {
            square: from,
            legal_moves: engine.legal_moves_from(from),
        };
        let view = project(&state, &engine);
        let rows = text(&board_lines(&view));

        // rank 3 holds f3 and h3
        assert_eq!(rows[5].matches('·').count(), 2);
        assert_eq!(square_style(&view, from).bg, Some(SELECTED_SQUARE));
    }
}
