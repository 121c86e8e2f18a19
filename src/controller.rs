use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};

use crate::domain::{Message, TableConfig, VTError};
use crate::model::Model;
use crate::view::Action;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TableConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, VTError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            if model.raw_keyevents() {
                return Ok(Some(Message::RawKey(key)));
            }
            return Ok(self.handle_key(key, model));
        }
        Ok(None)
    }

    pub fn handle_key(&self, key: event::KeyEvent, model: &Model) -> Option<Message> {
        let per_page = model.view().page.per_page();
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Char('/'), _) => Some(Message::EnterSearch),
            (KeyCode::Char('c'), _) => Some(Message::Table(Action::ClearFilters)),
            (KeyCode::Left, _) | (KeyCode::PageUp, _) => Some(Message::Table(Action::PrevPage)),
            (KeyCode::Right, _) | (KeyCode::PageDown, _) => Some(Message::Table(Action::NextPage)),
            (KeyCode::Home, _) => Some(Message::Table(Action::FirstPage)),
            (KeyCode::End, _) => Some(Message::Table(Action::LastPage)),
            (KeyCode::Char('+'), _) => Some(Message::Table(Action::SetPageSize(per_page + 5))),
            (KeyCode::Char('-'), _) => {
                Some(Message::Table(Action::SetPageSize(per_page.saturating_sub(5).max(1))))
            }
            (KeyCode::Char(c @ '1'..='9'), _) => c
                .to_digit(10)
                .map(|d| Message::Table(Action::ToggleSort(d as usize - 1))),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
