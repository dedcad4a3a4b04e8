use std::fmt;

/// Lifecycle state of the composite container.
///
/// States advance strictly in declaration order; there is no skipping and
/// no re-entry once a state has been passed. `Disposed` is the only state
/// reachable from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompositeState {
    /// Accepting plugin registrations
    Registered,
    /// Type catalogs populated, modules instantiated
    Scanned,
    /// All modules initialized
    Initialized,
    /// All modules configured
    Configured,
    /// Service registry assembled
    ServicesRegistered,
    /// All modules started
    Started,
    /// All modules running
    Running,
    /// Modules stopped (cleanly or after a startup failure)
    Stopped,
    /// Container resources released
    Disposed,
}

impl CompositeState {
    /// The state that follows this one in the ordinary lifecycle, if any.
    pub fn next(self) -> Option<CompositeState> {
        match self {
            CompositeState::Registered => Some(CompositeState::Scanned),
            CompositeState::Scanned => Some(CompositeState::Initialized),
            CompositeState::Initialized => Some(CompositeState::Configured),
            CompositeState::Configured => Some(CompositeState::ServicesRegistered),
            CompositeState::ServicesRegistered => Some(CompositeState::Started),
            CompositeState::Started => Some(CompositeState::Running),
            CompositeState::Running => Some(CompositeState::Stopped),
            CompositeState::Stopped => Some(CompositeState::Disposed),
            CompositeState::Disposed => None,
        }
    }

    /// Whether advancing to `next` respects the strict ordering.
    pub(crate) fn can_advance_to(self, next: CompositeState) -> bool {
        self.next() == Some(next) || next == CompositeState::Disposed
    }
}

impl fmt::Display for CompositeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompositeState::Registered => "registered",
            CompositeState::Scanned => "scanned",
            CompositeState::Initialized => "initialized",
            CompositeState::Configured => "configured",
            CompositeState::ServicesRegistered => "services-registered",
            CompositeState::Started => "started",
            CompositeState::Running => "running",
            CompositeState::Stopped => "stopped",
            CompositeState::Disposed => "disposed",
        };
        write!(f, "{}", name)
    }
}
