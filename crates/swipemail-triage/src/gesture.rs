//! Card gesture state machine
//!
//! Interprets horizontal drags and button presses on the top card. Rendering
//! is up to the caller; [`CardPose`] gives the values a renderer needs for a
//! given offset.

/// Horizontal offset (in points) a release must pass to commit.
pub const SWIPE_THRESHOLD: f64 = 100.0;

/// Offset a committed card flies out to.
const FLY_OUT_OFFSET: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Right,
    Left,
}

impl SwipeDirection {
    pub fn action(self) -> DraftAction {
        match self {
            SwipeDirection::Right => DraftAction::Send,
            SwipeDirection::Left => DraftAction::Flag,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftAction {
    Send,
    Flag,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    Dragging { offset: f64 },
    Committed(SwipeDirection),
    /// Springing back to centre after a release below the threshold
    Returning,
}

#[derive(Debug, Clone)]
pub struct CardGesture {
    state: GestureState,
}

impl Default for CardGesture {
    fn default() -> Self {
        Self::new()
    }
}

impl CardGesture {
    pub fn new() -> Self {
        Self {
            state: GestureState::Idle,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Start a drag. Refused while `disabled` or once the card is committed.
    pub fn begin_drag(&mut self, disabled: bool) -> bool {
        if disabled {
            return false;
        }
        match self.state {
            GestureState::Idle | GestureState::Returning => {
                self.state = GestureState::Dragging { offset: 0.0 };
                true
            }
            _ => false,
        }
    }

    pub fn drag_to(&mut self, offset: f64) {
        if let GestureState::Dragging { .. } = self.state {
            self.state = GestureState::Dragging { offset };
        }
    }

    /// End a drag. Returns the committed direction, if the offset passed the
    /// threshold; otherwise the card returns to centre.
    pub fn release(&mut self) -> Option<SwipeDirection> {
        let GestureState::Dragging { offset } = self.state else {
            return None;
        };

        let committed = if offset > SWIPE_THRESHOLD {
            Some(SwipeDirection::Right)
        } else if offset < -SWIPE_THRESHOLD {
            Some(SwipeDirection::Left)
        } else {
            None
        };

        self.state = match committed {
            Some(direction) => GestureState::Committed(direction),
            None => GestureState::Returning,
        };
        committed
    }

    /// Commit directly from a button press. A card still springing back
    /// from a short drag can be pressed.
    pub fn press(&mut self, direction: SwipeDirection, disabled: bool) -> bool {
        if disabled {
            return false;
        }
        match self.state {
            GestureState::Idle | GestureState::Returning => {
                self.state = GestureState::Committed(direction);
                true
            }
            _ => false,
        }
    }

    /// The return animation finished.
    pub fn settle(&mut self) {
        if self.state == GestureState::Returning {
            self.state = GestureState::Idle;
        }
    }

    /// Back to a fresh card.
    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
    }

    /// Current horizontal offset of the card.
    pub fn offset(&self) -> f64 {
        match self.state {
            GestureState::Dragging { offset } => offset,
            GestureState::Committed(SwipeDirection::Right) => FLY_OUT_OFFSET,
            GestureState::Committed(SwipeDirection::Left) => -FLY_OUT_OFFSET,
            GestureState::Idle | GestureState::Returning => 0.0,
        }
    }

    pub fn pose(&self) -> CardPose {
        CardPose::at(self.offset())
    }
}

/// Render values for a card at a horizontal offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardPose {
    pub offset: f64,
    pub rotation_deg: f64,
    pub opacity: f64,
    /// Opacity of the "send" badge
    pub send_indicator: f64,
    /// Opacity of the "flag" badge
    pub flag_indicator: f64,
}

impl CardPose {
    pub fn at(offset: f64) -> Self {
        Self {
            offset,
            rotation_deg: interpolate(offset, &[-200.0, 200.0], &[-25.0, 25.0]),
            opacity: interpolate(
                offset,
                &[-200.0, -100.0, 0.0, 100.0, 200.0],
                &[0.5, 1.0, 1.0, 1.0, 0.5],
            ),
            send_indicator: interpolate(offset, &[0.0, SWIPE_THRESHOLD], &[0.0, 1.0]),
            flag_indicator: interpolate(offset, &[-SWIPE_THRESHOLD, 0.0], &[1.0, 0.0]),
        }
    }
}

/// Clamped piecewise-linear map of `x` from `input` stops to `output` stops.
///
/// `input` must be ascending and the same length as `output`.
pub fn interpolate(x: f64, input: &[f64], output: &[f64]) -> f64 {
    debug_assert_eq!(input.len(), output.len());
    let (Some(&first), Some(&last)) = (input.first(), input.last()) else {
        return 0.0;
    };

    if x <= first {
        return output[0];
    }
    if x >= last {
        return output[output.len() - 1];
    }

    for i in 1..input.len() {
        if x <= input[i] {
            let (x0, x1) = (input[i - 1], input[i]);
            let (y0, y1) = (output[i - 1], output[i]);
            if x1 == x0 {
                return y1;
            }
            return y0 + (x - x0) / (x1 - x0) * (y1 - y0);
        }
    }
    output[output.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(offset: f64) -> (CardGesture, Option<SwipeDirection>) {
        let mut g = CardGesture::new();
        assert!(g.begin_drag(false));
        g.drag_to(offset);
        let committed = g.release();
        (g, committed)
    }

    #[test]
    fn release_past_threshold_commits() {
        let (g, dir) = drag(150.0);
        assert_eq!(dir, Some(SwipeDirection::Right));
        assert_eq!(g.state(), GestureState::Committed(SwipeDirection::Right));

        let (_, dir) = drag(-101.0);
        assert_eq!(dir, Some(SwipeDirection::Left));
    }

    #[test]
    fn threshold_itself_returns_to_centre() {
        for offset in [100.0, -100.0, 0.0, 42.0] {
            let (mut g, dir) = drag(offset);
            assert_eq!(dir, None, "offset {}", offset);
            assert_eq!(g.state(), GestureState::Returning);
            g.settle();
            assert_eq!(g.state(), GestureState::Idle);
        }
    }

    #[test]
    fn disabled_card_cannot_be_dragged_or_pressed() {
        let mut g = CardGesture::new();
        assert!(!g.begin_drag(true));
        assert!(!g.press(SwipeDirection::Right, true));
        assert_eq!(g.state(), GestureState::Idle);
        assert_eq!(g.release(), None);
    }

    #[test]
    fn press_commits_unless_dragging_or_committed() {
        let mut g = CardGesture::new();
        assert!(g.press(SwipeDirection::Left, false));
        assert_eq!(g.state(), GestureState::Committed(SwipeDirection::Left));
        assert!(!g.press(SwipeDirection::Right, false));
        assert!(!g.begin_drag(false));

        g.reset();
        assert!(g.begin_drag(false));
        assert!(!g.press(SwipeDirection::Right, false));
    }

    #[test]
    fn press_interrupts_spring_back() {
        let (mut g, dir) = drag(40.0);
        assert_eq!(dir, None);
        assert_eq!(g.state(), GestureState::Returning);
        assert!(g.press(SwipeDirection::Right, false));
        assert_eq!(g.state(), GestureState::Committed(SwipeDirection::Right));

        let (mut g, _) = drag(-40.0);
        assert!(!g.press(SwipeDirection::Left, true));
        assert_eq!(g.state(), GestureState::Returning);
    }

    #[test]
    fn direction_maps_to_action() {
        assert_eq!(SwipeDirection::Right.action(), DraftAction::Send);
        assert_eq!(SwipeDirection::Left.action(), DraftAction::Flag);
    }

    #[test]
    fn pose_mappings() {
        let centre = CardPose::at(0.0);
        assert_eq!(centre.rotation_deg, 0.0);
        assert_eq!(centre.opacity, 1.0);
        assert_eq!(centre.send_indicator, 0.0);
        assert_eq!(centre.flag_indicator, 0.0);

        let right = CardPose::at(100.0);
        assert_eq!(right.rotation_deg, 12.5);
        assert_eq!(right.opacity, 1.0);
        assert_eq!(right.send_indicator, 1.0);

        let far_left = CardPose::at(-400.0);
        assert_eq!(far_left.rotation_deg, -25.0);
        assert_eq!(far_left.opacity, 0.5);
        assert_eq!(far_left.flag_indicator, 1.0);

        assert_eq!(CardPose::at(-50.0).flag_indicator, 0.5);
        assert_eq!(CardPose::at(150.0).opacity, 0.75);
    }

    #[test]
    fn committed_card_is_off_screen() {
        let (g, _) = drag(120.0);
        assert_eq!(g.offset(), 500.0);
        assert_eq!(g.pose().opacity, 0.5);
    }
}
