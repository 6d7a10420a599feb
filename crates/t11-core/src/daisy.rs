//! Vectored interrupt daisy chain.
//!
//! The board builds a [`DaisyChain`] in priority order for the duration of a
//! single acknowledge cycle. The device closest to the CPU that has a request
//! pending wins and supplies its vector; devices further down the chain are
//! not consulted.

/// A device wired into the vectored interrupt chain.
pub trait DaisyDevice {
    /// Returns `true` while the device is requesting service.
    fn interrupt_pending(&self) -> bool;

    /// Acknowledge cycle: returns the vector and drops the request.
    ///
    /// `None` (or vector 0) means the device withdrew its request.
    fn acknowledge(&mut self) -> Option<u16>;
}

/// Ordered, borrowed view of the chain for one acknowledge.
pub struct DaisyChain<'a> {
    devices: Vec<&'a mut dyn DaisyDevice>,
}

impl<'a> DaisyChain<'a> {
    /// Builds a chain; index 0 is the highest priority.
    #[must_use]
    pub fn new(devices: Vec<&'a mut dyn DaisyDevice>) -> Self {
        Self { devices }
    }

    /// A chain with nothing on it.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    /// Number of devices wired on the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` when nothing is wired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Returns `true` if any device is requesting service.
    #[must_use]
    pub fn any_pending(&self) -> bool {
        self.devices.iter().any(|device| device.interrupt_pending())
    }

    /// Runs an acknowledge cycle and returns the winning device's vector.
    pub fn acknowledge(&mut self) -> Option<u16> {
        let device = self
            .devices
            .iter_mut()
            .find(|device| device.interrupt_pending())?;
        device.acknowledge().filter(|&vector| vector != 0)
    }
}

impl std::fmt::Debug for DaisyChain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaisyChain")
            .field("devices", &self.devices.len())
            .finish()
    }
}

/// Minimal chain device holding one fixed vector and a request flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingVector {
    vector: u16,
    pending: bool,
    acknowledged: u32,
}

impl PendingVector {
    /// Creates an idle device answering with `vector`.
    #[must_use]
    pub const fn new(vector: u16) -> Self {
        Self {
            vector,
            pending: false,
            acknowledged: 0,
        }
    }

    /// Raises the request.
    pub const fn raise(&mut self) {
        self.pending = true;
    }

    /// Drops the request without an acknowledge.
    pub const fn withdraw(&mut self) {
        self.pending = false;
    }

    /// Number of acknowledge cycles this device has answered.
    #[must_use]
    pub const fn acknowledged(&self) -> u32 {
        self.acknowledged
    }
}

impl DaisyDevice for PendingVector {
    fn interrupt_pending(&self) -> bool {
        self.pending
    }

    fn acknowledge(&mut self) -> Option<u16> {
        self.pending = false;
        self.acknowledged = self.acknowledged.saturating_add(1);
        Some(self.vector)
    }
}

#[cfg(test)]
mod tests {
    use super::{DaisyChain, DaisyDevice, PendingVector};

    #[test]
    fn empty_chain_never_answers() {
        let mut chain = DaisyChain::empty();
        assert!(chain.is_empty());
        assert!(!chain.any_pending());
        assert_eq!(chain.acknowledge(), None);
    }

    #[test]
    fn first_pending_device_wins_and_later_ones_are_not_consulted() {
        let mut first = PendingVector::new(0o300);
        let mut second = PendingVector::new(0o310);
        let mut third = PendingVector::new(0o320);
        second.raise();
        third.raise();

        let vector = DaisyChain::new(vec![&mut first, &mut second, &mut third]).acknowledge();

        assert_eq!(vector, Some(0o310));
        assert_eq!(first.acknowledged(), 0);
        assert_eq!(second.acknowledged(), 1);
        assert!(!second.interrupt_pending());
        assert_eq!(third.acknowledged(), 0);
        assert!(third.interrupt_pending());
    }

    #[test]
    fn idle_device_between_two_requests_is_skipped() {
        let mut first = PendingVector::new(0o300);
        let mut second = PendingVector::new(0o310);
        let mut third = PendingVector::new(0o320);
        first.raise();
        third.raise();

        let vector = DaisyChain::new(vec![&mut first, &mut second, &mut third]).acknowledge();

        assert_eq!(vector, Some(0o300));
        assert!(!first.interrupt_pending());
        assert_eq!(second.acknowledged(), 0);
        assert!(third.interrupt_pending());
        assert_eq!(third.acknowledged(), 0);
    }

    #[test]
    fn zero_vector_is_a_withdrawn_request() {
        let mut dead = PendingVector::new(0);
        dead.raise();
        assert_eq!(DaisyChain::new(vec![&mut dead]).acknowledge(), None);
        assert!(!dead.interrupt_pending());
    }
}
