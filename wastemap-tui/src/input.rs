use std::time::Instant;

use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use wastemap_core::{Category, ControlCommand, MapEvent, PanDirection};

use crate::app::App;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Action {
    None,
    Quit,
    /// Fetch a fresh snapshot from the source.
    Reload,
    Map(MapEvent),
    NextBin,
    NextRoute,
    ClearSelection,
}

/// Translate a key press without touching any state.
pub(crate) fn action_for_key(key: KeyEvent) -> Action {
    use KeyCode::{BackTab, Char, Esc, Tab};

    // Global quit shortcuts
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    if let Some(command) = control_for_key(key.code) {
        return Action::Map(command.into());
    }

    match key.code {
        Char('q') => Action::Quit,
        Char('r') => Action::Reload,
        Char('f') => Action::Map(MapEvent::CycleCategory),
        Char(digit @ '0'..='9') => digit
            .to_digit(10)
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| Category::ALL_FILTERS.get(index))
            .map_or(Action::None, |category| {
                Action::Map(MapEvent::SetCategory(*category))
            }),
        Tab => Action::NextBin,
        BackTab => Action::NextRoute,
        Esc => Action::ClearSelection,
        _ => Action::None,
    }
}

fn control_for_key(code: KeyCode) -> Option<ControlCommand> {
    let command = match code {
        KeyCode::Char('+' | '=') => ControlCommand::ZoomIn,
        KeyCode::Char('-' | '_') => ControlCommand::ZoomOut,
        KeyCode::Up => ControlCommand::Pan(PanDirection::Up),
        KeyCode::Down => ControlCommand::Pan(PanDirection::Down),
        KeyCode::Left => ControlCommand::Pan(PanDirection::Left),
        KeyCode::Right => ControlCommand::Pan(PanDirection::Right),
        KeyCode::Char('m') => ControlCommand::CycleMapMode,
        KeyCode::Char('g') => ControlCommand::LocateMe,
        KeyCode::Char('l') => ControlCommand::ToggleLegend,
        _ => return None,
    };
    Some(command)
}

/// Apply a key press to the app. Returns what the event loop still has to do.
pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App, now: Instant) -> Action {
    let action = action_for_key(key);
    match action {
        Action::Map(event) => app.dispatch(event, now),
        Action::NextBin => app.cycle_bin(),
        Action::NextRoute => app.cycle_route(),
        Action::ClearSelection => app.clear_selection(),
        Action::None | Action::Quit | Action::Reload => return action,
    }
    Action::None
}

pub(crate) fn handle_mouse_event(mouse: MouseEvent, app: &mut App, now: Instant) {
    let (column, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::ScrollUp if app.coordinates_at(column, row).is_some() => {
            app.dispatch(ControlCommand::ZoomIn.into(), now);
        }
        MouseEventKind::ScrollDown if app.coordinates_at(column, row).is_some() => {
            app.dispatch(ControlCommand::ZoomOut.into(), now);
        }
        MouseEventKind::Down(MouseButton::Left) => app.mouse_down(column, row),
        MouseEventKind::Drag(MouseButton::Left) => app.mouse_drag(column, row, now),
        MouseEventKind::Up(MouseButton::Left) => {
            app.mouse_up(column, row);
        }
        _ => {}
    }
}
