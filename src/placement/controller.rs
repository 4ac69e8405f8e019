use crate::geometry::{ImagePoint, ImageVector, TextBox};

use super::hit::is_inside;

/// Interaction mode of the placement controller.
///
/// Placement and dragging are variants of one enum, so both can never be active together.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PlacementMode {
    #[default]
    Idle,
    AwaitingClickPlacement,
    Dragging {
        /// Pointer position at press time minus the anchor, kept for the whole drag.
        offset: ImageVector,
    },
}

/// Pointer and command input, already mapped into image space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementEvent {
    RequestPlacement,
    CancelPlacement,
    PointerClick(ImagePoint),
    PointerDown(ImagePoint),
    PointerMove(ImagePoint),
    PointerUp,
    PointerLeave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// Nothing changed.
    Ignored,
    /// Mode changed, anchor untouched.
    ModeChanged,
    /// Anchor was written; the caller must re-render.
    AnchorMoved,
}

impl PlacementOutcome {
    pub const fn anchor_moved(self) -> bool {
        matches!(self, Self::AnchorMoved)
    }
}

#[derive(Debug, Default)]
pub struct PlacementController {
    mode: PlacementMode,
}

impl PlacementController {
    pub const fn new() -> Self {
        Self {
            mode: PlacementMode::Idle,
        }
    }

    pub fn mode(&self) -> PlacementMode {
        self.mode
    }

    pub fn is_awaiting_click(&self) -> bool {
        matches!(self.mode, PlacementMode::AwaitingClickPlacement)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.mode, PlacementMode::Dragging { .. })
    }

    pub fn drag_offset(&self) -> Option<ImageVector> {
        match self.mode {
            PlacementMode::Dragging { offset } => Some(offset),
            _ => None,
        }
    }

    /// Applies one event to the controller and, where the transition says so, to `anchor`.
    ///
    /// `text_box` is only evaluated for a press while idle; it must measure the current preview
    /// text with the current configuration.
    pub fn handle(
        &mut self,
        event: PlacementEvent,
        anchor: &mut ImagePoint,
        text_box: impl FnOnce() -> TextBox,
    ) -> PlacementOutcome {
        use PlacementEvent::*;
        let from = self.mode;
        let outcome = match (from, event) {
            (PlacementMode::AwaitingClickPlacement, RequestPlacement) => PlacementOutcome::Ignored,
            (_, RequestPlacement) => {
                if self.is_dragging() {
                    tracing::debug!("placement requested mid-drag; cancelling drag");
                }
                self.mode = PlacementMode::AwaitingClickPlacement;
                PlacementOutcome::ModeChanged
            }
            (PlacementMode::AwaitingClickPlacement, CancelPlacement) => {
                self.mode = PlacementMode::Idle;
                PlacementOutcome::ModeChanged
            }
            (PlacementMode::AwaitingClickPlacement, PointerClick(position)) => {
                *anchor = position;
                self.mode = PlacementMode::Idle;
                PlacementOutcome::AnchorMoved
            }
            (PlacementMode::Idle, PointerDown(position)) => {
                if is_inside(position, text_box()) {
                    self.mode = PlacementMode::Dragging {
                        offset: position.offset_from(*anchor),
                    };
                    PlacementOutcome::ModeChanged
                } else {
                    PlacementOutcome::Ignored
                }
            }
            (PlacementMode::Dragging { offset }, PointerMove(position)) => {
                *anchor = position.translated_back(offset);
                PlacementOutcome::AnchorMoved
            }
            (PlacementMode::Dragging { .. }, PointerUp | PointerLeave) => {
                self.mode = PlacementMode::Idle;
                PlacementOutcome::ModeChanged
            }
            _ => PlacementOutcome::Ignored,
        };

        if outcome != PlacementOutcome::Ignored {
            tracing::debug!(from = ?from, to = ?self.mode, event = ?event, "placement transition");
        }
        outcome
    }
}

impl std::fmt::Display for PlacementController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mode {
            PlacementMode::Idle => f.write_str("PlacementMode::Idle"),
            PlacementMode::AwaitingClickPlacement => {
                f.write_str("PlacementMode::AwaitingClickPlacement")
            }
            PlacementMode::Dragging { .. } => f.write_str("PlacementMode::Dragging"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Box for "John Doe" centred on (400, 300): 180 wide, 48 tall.
    fn box_around(anchor: ImagePoint) -> TextBox {
        TextBox::new(anchor.x - 90.0, anchor.y, 180.0, 48.0)
    }

    fn unreachable_box() -> TextBox {
        panic!("text box must not be measured for this transition")
    }

    #[test]
    fn click_placement_sets_anchor_exactly_and_returns_to_idle() {
        let mut controller = PlacementController::new();
        let mut anchor = ImagePoint::new(50.0, 50.0);

        let outcome = controller.handle(PlacementEvent::RequestPlacement, &mut anchor, unreachable_box);
        assert_eq!(outcome, PlacementOutcome::ModeChanged);
        assert!(controller.is_awaiting_click());

        let outcome = controller.handle(
            PlacementEvent::PointerClick(ImagePoint::new(120.0, 80.0)),
            &mut anchor,
            unreachable_box,
        );
        assert!(outcome.anchor_moved());
        assert_eq!(anchor, ImagePoint::new(120.0, 80.0));
        assert_eq!(controller.mode(), PlacementMode::Idle);
    }

    #[test]
    fn click_while_idle_is_ignored() {
        let mut controller = PlacementController::new();
        let mut anchor = ImagePoint::new(50.0, 50.0);
        let outcome = controller.handle(
            PlacementEvent::PointerClick(ImagePoint::new(1.0, 2.0)),
            &mut anchor,
            unreachable_box,
        );
        assert_eq!(outcome, PlacementOutcome::Ignored);
        assert_eq!(anchor, ImagePoint::new(50.0, 50.0));
    }

    #[test]
    fn drag_keeps_press_offset_while_tracking_pointer() {
        let mut controller = PlacementController::new();
        let mut anchor = ImagePoint::new(400.0, 300.0);
        let current = anchor;

        let outcome = controller.handle(
            PlacementEvent::PointerDown(ImagePoint::new(420.0, 310.0)),
            &mut anchor,
            || box_around(current),
        );
        assert_eq!(outcome, PlacementOutcome::ModeChanged);
        assert_eq!(controller.drag_offset(), Some(ImageVector::new(20.0, 10.0)));

        let outcome = controller.handle(
            PlacementEvent::PointerMove(ImagePoint::new(450.0, 340.0)),
            &mut anchor,
            unreachable_box,
        );
        assert!(outcome.anchor_moved());
        assert_eq!(anchor, ImagePoint::new(430.0, 330.0));

        controller.handle(PlacementEvent::PointerUp, &mut anchor, unreachable_box);
        assert_eq!(controller.mode(), PlacementMode::Idle);
        assert_eq!(anchor, ImagePoint::new(430.0, 330.0));
    }

    #[test]
    fn press_outside_text_box_stays_idle() {
        let mut controller = PlacementController::new();
        let mut anchor = ImagePoint::new(400.0, 300.0);
        let current = anchor;
        let outcome = controller.handle(
            PlacementEvent::PointerDown(ImagePoint::new(10.0, 10.0)),
            &mut anchor,
            || box_around(current),
        );
        assert_eq!(outcome, PlacementOutcome::Ignored);
        assert_eq!(controller.mode(), PlacementMode::Idle);

        let outcome = controller.handle(
            PlacementEvent::PointerMove(ImagePoint::new(20.0, 20.0)),
            &mut anchor,
            unreachable_box,
        );
        assert_eq!(outcome, PlacementOutcome::Ignored);
        assert_eq!(anchor, ImagePoint::new(400.0, 300.0));
    }

    #[test]
    fn pointer_leave_ends_drag() {
        let mut controller = PlacementController::new();
        let mut anchor = ImagePoint::new(400.0, 300.0);
        let current = anchor;
        controller.handle(
            PlacementEvent::PointerDown(ImagePoint::new(400.0, 320.0)),
            &mut anchor,
            || box_around(current),
        );
        assert!(controller.is_dragging());
        controller.handle(PlacementEvent::PointerLeave, &mut anchor, unreachable_box);
        assert_eq!(controller.mode(), PlacementMode::Idle);
    }

    #[test]
    fn requesting_placement_mid_drag_cancels_the_drag() {
        let mut controller = PlacementController::new();
        let mut anchor = ImagePoint::new(400.0, 300.0);
        let current = anchor;
        controller.handle(
            PlacementEvent::PointerDown(ImagePoint::new(400.0, 300.0)),
            &mut anchor,
            || box_around(current),
        );
        assert!(controller.is_dragging());

        controller.handle(PlacementEvent::RequestPlacement, &mut anchor, unreachable_box);
        assert!(controller.is_awaiting_click());
        assert!(!controller.is_dragging());
        assert_eq!(controller.drag_offset(), None);

        let outcome = controller.handle(
            PlacementEvent::PointerMove(ImagePoint::new(0.0, 0.0)),
            &mut anchor,
            unreachable_box,
        );
        assert_eq!(outcome, PlacementOutcome::Ignored);
        assert_eq!(anchor, ImagePoint::new(400.0, 300.0));
    }

    #[test]
    fn press_while_awaiting_click_does_not_start_drag() {
        let mut controller = PlacementController::new();
        let mut anchor = ImagePoint::new(400.0, 300.0);
        controller.handle(PlacementEvent::RequestPlacement, &mut anchor, unreachable_box);
        let outcome = controller.handle(
            PlacementEvent::PointerDown(ImagePoint::new(400.0, 300.0)),
            &mut anchor,
            unreachable_box,
        );
        assert_eq!(outcome, PlacementOutcome::Ignored);
        assert!(controller.is_awaiting_click());
    }

    #[test]
    fn cancel_placement_returns_to_idle_without_moving_anchor() {
        let mut controller = PlacementController::new();
        let mut anchor = ImagePoint::new(5.0, 6.0);
        controller.handle(PlacementEvent::RequestPlacement, &mut anchor, unreachable_box);
        let outcome = controller.handle(PlacementEvent::CancelPlacement, &mut anchor, unreachable_box);
        assert_eq!(outcome, PlacementOutcome::ModeChanged);
        assert_eq!(controller.mode(), PlacementMode::Idle);
        assert_eq!(anchor, ImagePoint::new(5.0, 6.0));
        assert_eq!(controller.to_string(), "PlacementMode::Idle");
    }
}
