//! The flat menu item table.
//!
//! Items are tagged with the heading (page) they live on and the heading
//! ENTER descends into. The table is a compile-time constant; visibility is
//! a filter computed on demand from the current state, never cached.

use serde::{Deserialize, Serialize};

use crate::action::{Action, AdjustKind, EditAction, RecordAction, TransportAction};
use crate::state::SequencerState;
use crate::step::Layout;
use crate::TrackId;

/// Menu page tag. `Top` is the entry page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heading {
    Top,
    Track,
    Record,
}

/// What an item does when activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuBinding {
    /// Dispatched immediately on ENTER.
    Fire(Action),
    /// Dispatched with a direction while the item is selected.
    Adjust(AdjustKind),
}

/// One row of the flat menu table.
#[derive(Debug, Clone, Copy)]
pub struct MenuItem {
    pub label: &'static str,
    /// Page this item appears on.
    pub heading: Heading,
    /// Page ENTER descends into; equal to `heading` for leaves.
    pub child_heading: Heading,
    pub binding: Option<MenuBinding>,
    /// ENTER toggles value-edit mode instead of firing.
    pub selectable: bool,
}

impl MenuItem {
    const fn page(label: &'static str, heading: Heading, child: Heading) -> Self {
        Self {
            label,
            heading,
            child_heading: child,
            binding: None,
            selectable: false,
        }
    }

    const fn fire(label: &'static str, heading: Heading, action: Action) -> Self {
        Self {
            label,
            heading,
            child_heading: heading,
            binding: Some(MenuBinding::Fire(action)),
            selectable: false,
        }
    }

    const fn adjust(label: &'static str, heading: Heading, kind: AdjustKind) -> Self {
        Self {
            label,
            heading,
            child_heading: heading,
            binding: Some(MenuBinding::Adjust(kind)),
            selectable: true,
        }
    }

    const fn fire_into(
        label: &'static str,
        heading: Heading,
        child: Heading,
        action: Action,
    ) -> Self {
        Self {
            label,
            heading,
            child_heading: child,
            binding: Some(MenuBinding::Fire(action)),
            selectable: false,
        }
    }
}

/// The whole menu, flat. Page membership and enablement are filters over
/// this table.
pub const MENU: &[MenuItem] = &[
    // Top page
    MenuItem::fire_into(
        "track a",
        Heading::Top,
        Heading::Track,
        Action::Edit(EditAction::SelectTrack(TrackId::A)),
    ),
    MenuItem::fire_into(
        "track b",
        Heading::Top,
        Heading::Track,
        Action::Edit(EditAction::SelectTrack(TrackId::B)),
    ),
    MenuItem::fire("manual play", Heading::Top, Action::EnterManualPlay),
    // Track page
    MenuItem::fire(
        "play/pause",
        Heading::Track,
        Action::Transport(TransportAction::TogglePlay),
    ),
    MenuItem::fire("stop", Heading::Track, Action::Transport(TransportAction::Stop)),
    MenuItem::fire(
        "step fwd",
        Heading::Track,
        Action::Transport(TransportAction::StepForward),
    ),
    MenuItem::fire(
        "step back",
        Heading::Track,
        Action::Transport(TransportAction::StepBackward),
    ),
    MenuItem::adjust("tempo", Heading::Track, AdjustKind::Tempo),
    MenuItem::adjust("beats", Heading::Track, AdjustKind::Beats),
    MenuItem::adjust("steps", Heading::Track, AdjustKind::StepCount),
    MenuItem::adjust("gate", Heading::Track, AdjustKind::Gate),
    MenuItem::fire(
        "ext clock",
        Heading::Track,
        Action::Edit(EditAction::ToggleClockIn),
    ),
    MenuItem::page("record", Heading::Track, Heading::Record),
    // Record page
    MenuItem::fire(
        "rec sequence",
        Heading::Record,
        Action::Record(RecordAction::StartSequence),
    ),
    MenuItem::fire(
        "rec rhythm",
        Heading::Record,
        Action::Record(RecordAction::StartRhythm),
    ),
    MenuItem::fire(
        "rec both",
        Heading::Record,
        Action::Record(RecordAction::StartBoth),
    ),
    MenuItem::fire("finish", Heading::Record, Action::Record(RecordAction::Finish)),
    MenuItem::fire(
        "reset seq",
        Heading::Record,
        Action::Edit(EditAction::ResetSequence),
    ),
    MenuItem::fire(
        "reset rhythm",
        Heading::Record,
        Action::Edit(EditAction::ResetRhythm),
    ),
];

/// Computed enablement — the only gate on visibility. Never stored.
pub fn item_enabled(item: &MenuItem, state: &SequencerState) -> bool {
    // While recording, only the finish entry stays live.
    if state.mode.is_recording() {
        return matches!(
            item.binding,
            Some(MenuBinding::Fire(Action::Record(RecordAction::Finish)))
        );
    }

    let clocked = state.selected_track().clock_in;
    match item.binding {
        Some(MenuBinding::Fire(Action::Record(RecordAction::Finish))) => false,
        Some(MenuBinding::Fire(Action::Edit(EditAction::SelectTrack(TrackId::B)))) => {
            state.layout == Layout::Dual
        }
        // External clock owns the advance timing; tempo, beats and rhythm
        // recording have no effect while it is enabled.
        Some(MenuBinding::Adjust(AdjustKind::Tempo))
        | Some(MenuBinding::Adjust(AdjustKind::Beats))
        | Some(MenuBinding::Fire(Action::Record(RecordAction::StartRhythm)))
        | Some(MenuBinding::Fire(Action::Record(RecordAction::StartBoth)))
        | Some(MenuBinding::Fire(Action::Edit(EditAction::ResetRhythm))) => !clocked,
        _ => true,
    }
}

/// Items visible on a heading: same page, currently enabled.
pub fn visible_items<'a>(
    heading: Heading,
    state: &'a SequencerState,
) -> impl Iterator<Item = &'static MenuItem> + 'a {
    MENU.iter()
        .filter(move |item| item.heading == heading && item_enabled(item, state))
}

/// Parent heading of a page: the heading of the item that descends into it.
pub fn parent_heading(heading: Heading) -> Option<Heading> {
    MENU.iter()
        .find(|item| item.child_heading == heading && item.heading != heading)
        .map(|item| item.heading)
}
