use crate::hal::{DigitalIo, Pin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonPress {
    Raise,
    Lower,
    Wake,
}

/// Raw level sampling, once per loop iteration. There is no debounce: a held button
/// reports a press on every call, which is what makes the setpoint auto-repeat.
#[derive(Debug, Default, Clone, Copy)]
pub struct ButtonSampler;

impl ButtonSampler {
    /// Raise wins over lower, lower over wake; at most one press per sample.
    pub fn sample<I: DigitalIo>(&self, io: &mut I) -> Option<ButtonPress> {
        if io.is_asserted(Pin::ButtonUp) {
            Some(ButtonPress::Raise)
        } else if io.is_asserted(Pin::ButtonDown) {
            Some(ButtonPress::Lower)
        } else if io.is_asserted(Pin::ButtonWake) {
            Some(ButtonPress::Wake)
        } else {
            None
        }
    }
}
