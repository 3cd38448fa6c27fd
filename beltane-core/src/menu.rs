//! Menu navigation over the flat item table.
//!
//! The navigator owns only view state: which page, which highlight within
//! the enabled subset, whether an item is selected for value editing, and
//! the inactivity deadline. All state mutation goes out as [`Action`]s for
//! the dispatcher.

use beltane_types::menu::{parent_heading, visible_items, Heading, MenuBinding, MenuItem};
use beltane_types::{Action, Direction, SequencerState};

use crate::hal::MenuView;

/// Navigation edges produced by the debounced buttons while the menu is
/// open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuInput {
    Enter,
    Up,
    Down,
    Back,
}

#[derive(Debug)]
pub struct MenuNavigator {
    open: bool,
    heading: Heading,
    /// Index within the enabled subset of the current page.
    highlight: usize,
    /// Value-edit mode on the highlighted (selectable) item.
    selected: bool,
    /// Absolute inactivity deadline; past it the menu closes itself.
    deadline: u64,
    timeout_ms: u64,
}

impl MenuNavigator {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            open: false,
            heading: Heading::Top,
            highlight: 0,
            selected: false,
            deadline: 0,
            timeout_ms,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self, now: u64) {
        self.open = true;
        self.heading = Heading::Top;
        self.highlight = 0;
        self.selected = false;
        self.deadline = now + self.timeout_ms;
    }

    /// Closing is equivalent to BACK-to-top followed by menu-off.
    pub fn close(&mut self) {
        self.open = false;
        self.heading = Heading::Top;
        self.highlight = 0;
        self.selected = false;
    }

    /// Auto-close on inactivity. Returns true if the menu closed.
    pub fn poll_timeout(&mut self, now: u64) -> bool {
        if self.open && now >= self.deadline {
            self.close();
            return true;
        }
        false
    }

    fn highlighted(&self, state: &SequencerState) -> Option<&'static MenuItem> {
        visible_items(self.heading, state).nth(self.highlight)
    }

    /// Re-fit the highlight after a dispatch changed the enabled subset.
    pub fn clamp_highlight(&mut self, state: &SequencerState) {
        let count = visible_items(self.heading, state).count();
        if count == 0 {
            self.highlight = 0;
            self.selected = false;
        } else if self.highlight >= count {
            self.highlight = count - 1;
        }
    }

    /// Feed one navigation edge. Returns the action to dispatch, if any.
    pub fn handle(
        &mut self,
        input: MenuInput,
        state: &SequencerState,
        now: u64,
    ) -> Option<Action> {
        if !self.open {
            return None;
        }
        self.deadline = now + self.timeout_ms;

        match input {
            MenuInput::Enter => {
                let item = self.highlighted(state)?;
                if item.selectable {
                    self.selected = !self.selected;
                    return None;
                }
                let action = match item.binding {
                    Some(MenuBinding::Fire(action)) => Some(action),
                    _ => None,
                };
                if item.child_heading != item.heading {
                    self.heading = item.child_heading;
                    self.highlight = 0;
                }
                action
            }
            MenuInput::Up | MenuInput::Down => {
                let direction = match input {
                    MenuInput::Up => Direction::Up,
                    _ => Direction::Down,
                };
                if self.selected {
                    let item = self.highlighted(state)?;
                    return match item.binding {
                        Some(MenuBinding::Adjust(kind)) => Some(kind.action(direction)),
                        _ => None,
                    };
                }
                let count = visible_items(self.heading, state).count();
                if count == 0 {
                    return None;
                }
                // Clamped move, no wraparound.
                self.highlight = match direction {
                    Direction::Up => self.highlight.saturating_sub(1),
                    Direction::Down => (self.highlight + 1).min(count - 1),
                };
                None
            }
            MenuInput::Back => {
                if self.selected {
                    self.selected = false;
                    return None;
                }
                match parent_heading(self.heading) {
                    Some(parent) => {
                        self.heading = parent;
                        self.highlight = 0;
                    }
                    None => self.close(),
                }
                None
            }
        }
    }

    pub fn view(&self, state: &SequencerState) -> Option<MenuView> {
        if !self.open {
            return None;
        }
        Some(MenuView {
            labels: visible_items(self.heading, state).map(|i| i.label).collect(),
            highlight: self.highlight,
            selected: self.selected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beltane_types::{EditAction, Layout, TransportAction};

    fn open_nav() -> (MenuNavigator, SequencerState) {
        let mut nav = MenuNavigator::new(10_000);
        nav.open(0);
        (nav, SequencerState::new(Layout::Dual))
    }

    #[test]
    fn highlight_stays_in_bounds_without_wrap() {
        let (mut nav, state) = open_nav();
        let count = visible_items(Heading::Top, &state).count();

        for _ in 0..10 {
            nav.handle(MenuInput::Up, &state, 0);
        }
        assert_eq!(nav.highlight, 0);

        for _ in 0..20 {
            nav.handle(MenuInput::Down, &state, 0);
        }
        assert_eq!(nav.highlight, count - 1);
    }

    #[test]
    fn enter_descends_and_fires() {
        let (mut nav, state) = open_nav();
        // "track a" is the first top item and selects + descends.
        let action = nav.handle(MenuInput::Enter, &state, 0);
        assert_eq!(
            action,
            Some(Action::Edit(EditAction::SelectTrack(
                beltane_types::TrackId::A
            )))
        );
        assert_eq!(nav.heading, Heading::Track);
        assert_eq!(nav.highlight, 0);
    }

    #[test]
    fn selectable_item_toggles_and_adjusts() {
        let (mut nav, state) = open_nav();
        nav.handle(MenuInput::Enter, &state, 0); // into Track page

        // Move to "tempo" (index 4 of the Track page).
        for _ in 0..4 {
            nav.handle(MenuInput::Down, &state, 0);
        }
        assert!(nav.handle(MenuInput::Enter, &state, 0).is_none());
        assert!(nav.selected);

        let action = nav.handle(MenuInput::Up, &state, 0);
        assert_eq!(
            action,
            Some(Action::Edit(EditAction::AdjustTempo(Direction::Up)))
        );
        // Highlight never moved while selected.
        assert_eq!(nav.highlight, 4);

        assert!(nav.handle(MenuInput::Back, &state, 0).is_none());
        assert!(!nav.selected);
    }

    #[test]
    fn enter_on_non_selectable_never_selects() {
        let (mut nav, state) = open_nav();
        nav.handle(MenuInput::Enter, &state, 0); // Track page, "play/pause"
        let action = nav.handle(MenuInput::Enter, &state, 0);
        assert_eq!(
            action,
            Some(Action::Transport(TransportAction::TogglePlay))
        );
        assert!(!nav.selected);
    }

    #[test]
    fn back_ascends_then_closes() {
        let (mut nav, state) = open_nav();
        nav.handle(MenuInput::Enter, &state, 0); // Track
        assert_eq!(nav.heading, Heading::Track);

        nav.handle(MenuInput::Back, &state, 0);
        assert_eq!(nav.heading, Heading::Top);
        assert!(nav.is_open());

        nav.handle(MenuInput::Back, &state, 0);
        assert!(!nav.is_open());
    }

    #[test]
    fn inactivity_closes_the_menu() {
        let (mut nav, state) = open_nav();
        nav.handle(MenuInput::Down, &state, 1000);

        assert!(!nav.poll_timeout(10_999));
        assert!(nav.is_open());
        assert!(nav.poll_timeout(11_000));
        assert!(!nav.is_open());
    }

    #[test]
    fn clamp_highlight_after_enabled_set_shrinks() {
        let (mut nav, mut state) = open_nav();
        nav.handle(MenuInput::Enter, &state, 0); // Track page
        let count = visible_items(Heading::Track, &state).count();
        for _ in 0..count {
            nav.handle(MenuInput::Down, &state, 0);
        }
        assert_eq!(nav.highlight, count - 1);

        // Enabling external clock hides tempo and beats.
        state.selected_track_mut().clock_in = true;
        nav.clamp_highlight(&state);
        let new_count = visible_items(Heading::Track, &state).count();
        assert_eq!(nav.highlight, new_count - 1);
    }
}
