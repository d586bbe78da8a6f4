use gloo::events::EventListener;
use gloo_timers::callback::Timeout;
use std::cell::RefCell;
use std::rc::Rc;

/// Runs `callback` once the window has stopped resizing for `delay_ms`.
///
/// Dragging a window edge fires dozens of resize events per second; only
/// the last one in a burst re-renders the chart.
///
/// Returns `None` when there is no window (outside a browser). The listener
/// is removed when the returned value is dropped, so keep it alive for the
/// lifetime of the component.
///
/// ```rust,ignore
/// use_effect_with(data, move |data| {
///     let listener = create_debounced_resize_listener(move || redraw(), 150);
///     move || drop(listener)
/// });
/// ```
pub fn create_debounced_resize_listener<F>(callback: F, delay_ms: u32) -> Option<EventListener>
where
    F: Fn() + 'static,
{
    let window = web_sys::window()?;
    let pending: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));
    let callback = Rc::new(callback);

    Some(EventListener::new(&window, "resize", move |_| {
        // Dropping the previous timeout cancels it.
        let cb = callback.clone();
        pending
            .borrow_mut()
            .replace(Timeout::new(delay_ms, move || cb()));
    }))
}
