/// Outcome of offering a key event to a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the caller to do
  Handled,
  /// Consumed, with an event for the caller
  Event(T),
  /// Not consumed, try the next handler
  NotHandled,
}
