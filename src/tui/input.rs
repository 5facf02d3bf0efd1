//! Keyboard and mouse bindings.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

/// What an input event asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Toggle,
    Requeue,
    Retrieve,
    Redraw,
    Move(isize),
    Page(isize),
    Home,
    End,
    Click(u16),
    Resize { rows: u16, cols: u16 },
}

pub fn action_for(event: &Event) -> Option<Action> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => key_action(key),
        Event::Mouse(mouse) => mouse_action(mouse),
        Event::Resize(cols, rows) => Some(Action::Resize {
            rows: *rows,
            cols: *cols,
        }),
        _ => None,
    }
}

fn key_action(key: &KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    let action = match key.code {
        KeyCode::Char('q' | 'Q') => Action::Quit,
        KeyCode::Char(' ') => Action::Toggle,
        KeyCode::Char('x') => Action::Requeue,
        KeyCode::Enter => Action::Retrieve,
        KeyCode::Char('r' | 'R') => Action::Redraw,
        KeyCode::Up | KeyCode::Char('k') => Action::Move(-1),
        KeyCode::Down | KeyCode::Char('j') => Action::Move(1),
        KeyCode::PageUp => Action::Page(-1),
        KeyCode::PageDown => Action::Page(1),
        KeyCode::Home => Action::Home,
        KeyCode::End => Action::End,
        _ => return None,
    };
    Some(action)
}

fn mouse_action(mouse: &MouseEvent) -> Option<Action> {
    match mouse.kind {
        MouseEventKind::ScrollUp => Some(Action::Move(-1)),
        MouseEventKind::ScrollDown => Some(Action::Move(1)),
        MouseEventKind::Down(MouseButton::Left) => Some(Action::Click(mouse.row)),
        _ => None,
    }
}

/// Answer to a yes/no alert: `Some(true)` for `y`, `Some(false)` for any
/// other key, `None` for events that are not key presses.
pub fn confirmation(event: &Event) -> Option<bool> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            Some(matches!(key.code, KeyCode::Char('y' | 'Y')))
        }
        _ => None,
    }
}
