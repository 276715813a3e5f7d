//! Explicit completion signal, e.g. "loading screen finished".

type Listener = Box<dyn FnOnce()>;

/// Fires its listeners once. Listeners added after completion run at once.
#[derive(Default)]
pub struct Completion {
    done: bool,
    listeners: Vec<Listener>,
}

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn on_complete(&mut self, listener: impl FnOnce() + 'static) {
        if self.done {
            listener();
        } else {
            self.listeners.push(Box::new(listener));
        }
    }

    /// Mark complete and run pending listeners in registration order.
    pub fn complete(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        for l in self.listeners.drain(..) {
            l();
        }
    }
}
