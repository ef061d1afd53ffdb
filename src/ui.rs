use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use morse_learn::{
    morse,
    session::{Outcome, Phase},
};

use crate::{App, InputMode};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const WORD_GAP: &str = "   ";

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = &self.session;

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);
        let underlined_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::UNDERLINED);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // progress lights
                Constraint::Length(1), // status
                Constraint::Min(1),
                Constraint::Length(1), // word conveyor
                Constraint::Length(1),
                Constraint::Length(2), // hint
                Constraint::Min(1),
                Constraint::Length(1), // input line
            ])
            .split(area);

        // progress lights, one per course letter
        let lights = session
            .course()
            .sorted_letters()
            .into_iter()
            .map(|letter| {
                let level = (session.scores().brightness(letter) * 255.0) as u8;
                let mut style = Style::default().fg(Color::Rgb(level, level, level));
                if session.pool().contains(letter) {
                    style = style.add_modifier(Modifier::BOLD);
                }
                Span::styled(letter.to_string(), style)
            })
            .interleave_shortest(std::iter::repeat(Span::raw(" ")))
            .collect::<Vec<Span>>();
        Paragraph::new(Line::from(lights))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let played = self.playtime.total_ms() / 1000;
        let status = format!(
            "{}% learned · pool {} · streak {}/{} · played {}:{:02}",
            session.progress_percent(),
            session.pool().letters().iter().join(""),
            session.consecutive_correct(),
            session.settings().consecutive_correct,
            played / 60,
            played % 60,
        );
        Paragraph::new(Span::styled(status, dim_bold_style))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        if session.phase() == Phase::OutOfWords {
            Paragraph::new(Span::styled(
                "No words left for these letters - press esc to quit",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[3], buf);
            return;
        }

        // the current word with its cursor, followed by as many queued words as fit
        let max_width = chunks[3].width as usize;
        let mut spans: Vec<Span> = Vec::new();
        let mut used = 0;
        for (idx, word) in session.queue().iter().enumerate() {
            let text = word.text();
            let needed = text.width() + if idx > 0 { WORD_GAP.width() } else { 0 };
            if idx > 0 && used + needed > max_width {
                break;
            }
            used += needed;

            if idx > 0 {
                spans.push(Span::raw(WORD_GAP));
                spans.push(Span::styled(text, dim_bold_style));
                continue;
            }

            let cursor = word.current_letter_index();
            for (i, letter) in word.letters().iter().enumerate() {
                let style = match (i.cmp(&cursor), self.feedback) {
                    (std::cmp::Ordering::Less, _) => green_bold_style,
                    (std::cmp::Ordering::Equal, Some((Outcome::Incorrect, _))) => {
                        red_bold_style.add_modifier(Modifier::UNDERLINED)
                    }
                    (std::cmp::Ordering::Equal, _) => underlined_bold_style,
                    (std::cmp::Ordering::Greater, _) => bold_style,
                };
                spans.push(Span::styled(letter.to_string(), style));
            }
        }
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        let mut hint_lines: Vec<Line> = Vec::new();
        if let (true, Some(hint)) = (self.config.visual_hints, self.hint) {
            let mut parts: Vec<String> = Vec::new();
            if hint.level.shows_morse() {
                if let Some(code) = morse::encode(hint.letter) {
                    parts.push(code.replace('.', "·").replace('-', "−"));
                }
            }
            if hint.level.shows_mnemonic() {
                if let Some(word) = morse::mnemonic(hint.letter) {
                    parts.push(word.to_string());
                }
            }
            if self.config.speech_hints {
                parts.push(format!("\"{}\"", session.course().letter_name(hint.letter)));
            }
            if !parts.is_empty() {
                hint_lines.push(Line::from(Span::styled(
                    format!("{}  {}", hint.letter, parts.join("  ")),
                    Style::default().fg(Color::Cyan).patch(bold_style),
                )));
            }
        }
        if let Some(letter) = self.newest_letter {
            hint_lines.push(Line::from(Span::styled(
                format!("new letter: {letter}"),
                Style::default().fg(Color::Magenta).patch(italic_style),
            )));
        }
        Paragraph::new(hint_lines)
            .alignment(Alignment::Center)
            .render(chunks[5], buf);

        let input = match self.mode {
            InputMode::Letters => "letters · (tab) morse keying · (esc)ape".to_string(),
            InputMode::Morse => format!(
                "morse [{}] · (.)dot (-)dash (space)send · (tab) letters · (esc)ape",
                self.keyer.pending()
            ),
        };
        Paragraph::new(Span::styled(input, italic_style))
            .alignment(Alignment::Center)
            .render(chunks[7], buf);
    }
}
