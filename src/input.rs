use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::direction::Direction::{self, *};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Turn(Direction),
    Restart,
    Quit,
    None,
}

pub fn key_action(ev: &KeyEvent) -> KeyAction {
    if is_ctrl_c(ev) {
        return KeyAction::Quit;
    }

    match ev.code {
        KeyCode::Up => KeyAction::Turn(Up),
        KeyCode::Left => KeyAction::Turn(Left),
        KeyCode::Down => KeyAction::Turn(Down),
        KeyCode::Right => KeyAction::Turn(Right),
        KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Restart,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
        _ => KeyAction::None,
    }
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL })
}
