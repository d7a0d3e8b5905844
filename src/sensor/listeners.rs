use heapless::Vec;

use super::touch::TouchContact;

/// Maximum registered touch listeners.
pub const MAX_LISTENERS: usize = 4;

/// Receives every successfully decoded touch report.
pub trait TouchListener {
    /// Called with the active contacts of the new report, in slot order.
    fn on_touch(&self, contacts: &[TouchContact]);
}

impl<F: Fn(&[TouchContact])> TouchListener for F {
    fn on_touch(&self, contacts: &[TouchContact]) {
        self(contacts)
    }
}

/// Handle returned by [`add_touch_listener`](crate::DisplaxTouch::add_touch_listener).
///
/// Ids increase with every registration and are never reused.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ListenerId(u32);

/// All [`MAX_LISTENERS`] slots are taken.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistryFullError;

pub(crate) struct ListenerRegistry<'a> {
    entries: Vec<(ListenerId, &'a dyn TouchListener), MAX_LISTENERS>,
    next_id: u32,
}

impl<'a> ListenerRegistry<'a> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    pub fn add(&mut self, listener: &'a dyn TouchListener) -> Result<ListenerId, RegistryFullError> {
        let id = ListenerId(self.next_id);
        self.entries
            .push((id, listener))
            .map_err(|_| RegistryFullError)?;
        self.next_id = self.next_id.wrapping_add(1);
        Ok(id)
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        match self.entries.iter().position(|(i, _)| *i == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn notify(&self, contacts: &[TouchContact]) {
        for (_, listener) in &self.entries {
            listener.on_touch(contacts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::vec::Vec;

    #[test]
    fn ids_increase_and_capacity_is_enforced() {
        let noop = |_: &[TouchContact]| {};
        let mut reg = ListenerRegistry::new();

        let ids: Vec<ListenerId> = (0..MAX_LISTENERS).map(|_| reg.add(&noop).unwrap()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(reg.add(&noop), Err(RegistryFullError));
        assert_eq!(reg.len(), MAX_LISTENERS);
    }

    #[test]
    fn removal_keeps_order_and_ids_are_not_reused() {
        let calls = RefCell::new(Vec::new());
        let a = |_: &[TouchContact]| calls.borrow_mut().push('a');
        let b = |_: &[TouchContact]| calls.borrow_mut().push('b');
        let c = |_: &[TouchContact]| calls.borrow_mut().push('c');

        let mut reg = ListenerRegistry::new();
        let ia = reg.add(&a).unwrap();
        let ib = reg.add(&b).unwrap();
        let ic = reg.add(&c).unwrap();

        assert!(reg.remove(ib));
        assert!(!reg.remove(ib));
        reg.notify(&[]);
        assert_eq!(*calls.borrow(), ['a', 'c']);

        let id = reg.add(&b).unwrap();
        assert!(id > ic && id != ia && id != ib);
        calls.borrow_mut().clear();
        reg.notify(&[]);
        assert_eq!(*calls.borrow(), ['a', 'c', 'b']);
    }
}
