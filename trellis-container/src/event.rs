//! Container lifecycle event system
//!
//! Every observable container signal is a [`ContainerEvent`], identified by a
//! stable wire name (`component:registered`, `initialized`, ...). The
//! [`EventEmitter`] delivers events synchronously, keyed by name, to
//! listeners in subscription order, before the emitting operation returns to
//! its caller. Listeners registered statically via
//! [`lifecycle_listener!`](crate::lifecycle_listener) receive every event.

use crate::component::ComponentInstance;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use trellis_core::CoreError;

/// Events emitted by the container and the discovery pipeline
///
/// # Examples
///
/// ```rust
/// use trellis_container::ContainerEvent;
///
/// fn describe(event: &ContainerEvent) -> String {
///     match event {
///         ContainerEvent::ComponentRegistered { name } => format!("registered {name}"),
///         ContainerEvent::Initialized => "container up".to_string(),
///         other => other.name().to_string(),
///     }
/// }
/// ```
#[derive(Clone)]
pub enum ContainerEvent {
    /// A component definition was registered
    ComponentRegistered {
        /// The component name
        name: String,
    },
    /// A component instance was constructed
    ComponentResolved {
        /// The component name
        name: String,
        /// The constructed instance
        instance: ComponentInstance,
    },
    /// A manifest was registered
    ManifestRegistered {
        /// The manifest type
        manifest_type: String,
    },
    /// The container finished initializing
    Initialized,
    /// The container finished shutting down
    Shutdown,
    /// A component's shutdown hook failed; the failure was contained
    ShutdownError {
        /// The failing component
        name: String,
        /// The contained error
        error: Arc<CoreError>,
    },
    /// A discovery entry failed to load; the failure was contained
    DiscoveryError {
        /// The failing entry path
        entry: String,
        /// The contained error
        error: Arc<CoreError>,
    },
    /// A discovery run finished
    DiscoveryCompleted {
        /// The manifest type that was discovered
        manifest_type: String,
        /// Number of components discovered
        count: usize,
    },
}

impl ContainerEvent {
    /// Wire name of [`ContainerEvent::ComponentRegistered`]
    pub const COMPONENT_REGISTERED: &'static str = "component:registered";
    /// Wire name of [`ContainerEvent::ComponentResolved`]
    pub const COMPONENT_RESOLVED: &'static str = "component:resolved";
    /// Wire name of [`ContainerEvent::ManifestRegistered`]
    pub const MANIFEST_REGISTERED: &'static str = "manifest:registered";
    /// Wire name of [`ContainerEvent::Initialized`]
    pub const INITIALIZED: &'static str = "initialized";
    /// Wire name of [`ContainerEvent::Shutdown`]
    pub const SHUTDOWN: &'static str = "shutdown";
    /// Wire name of [`ContainerEvent::ShutdownError`]
    pub const SHUTDOWN_ERROR: &'static str = "shutdown:error";
    /// Wire name of [`ContainerEvent::DiscoveryError`]
    pub const DISCOVERY_ERROR: &'static str = "discovery:error";
    /// Wire name of [`ContainerEvent::DiscoveryCompleted`]
    pub const DISCOVERY_COMPLETED: &'static str = "discovery:completed";

    /// The event's wire name, used as the subscription key
    pub fn name(&self) -> &'static str {
        match self {
            ContainerEvent::ComponentRegistered { .. } => Self::COMPONENT_REGISTERED,
            ContainerEvent::ComponentResolved { .. } => Self::COMPONENT_RESOLVED,
            ContainerEvent::ManifestRegistered { .. } => Self::MANIFEST_REGISTERED,
            ContainerEvent::Initialized => Self::INITIALIZED,
            ContainerEvent::Shutdown => Self::SHUTDOWN,
            ContainerEvent::ShutdownError { .. } => Self::SHUTDOWN_ERROR,
            ContainerEvent::DiscoveryError { .. } => Self::DISCOVERY_ERROR,
            ContainerEvent::DiscoveryCompleted { .. } => Self::DISCOVERY_COMPLETED,
        }
    }
}

impl fmt::Debug for ContainerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerEvent::ComponentRegistered { name } => f
                .debug_struct("ComponentRegistered")
                .field("name", name)
                .finish(),
            ContainerEvent::ComponentResolved { name, .. } => f
                .debug_struct("ComponentResolved")
                .field("name", name)
                .finish_non_exhaustive(),
            ContainerEvent::ManifestRegistered { manifest_type } => f
                .debug_struct("ManifestRegistered")
                .field("manifest_type", manifest_type)
                .finish(),
            ContainerEvent::Initialized => write!(f, "Initialized"),
            ContainerEvent::Shutdown => write!(f, "Shutdown"),
            ContainerEvent::ShutdownError { name, error } => f
                .debug_struct("ShutdownError")
                .field("name", name)
                .field("error", &error.code())
                .finish(),
            ContainerEvent::DiscoveryError { entry, error } => f
                .debug_struct("DiscoveryError")
                .field("entry", entry)
                .field("error", &error.code())
                .finish(),
            ContainerEvent::DiscoveryCompleted {
                manifest_type,
                count,
            } => f
                .debug_struct("DiscoveryCompleted")
                .field("manifest_type", manifest_type)
                .field("count", count)
                .finish(),
        }
    }
}

/// A dynamically subscribed event listener
pub type EventListener = Arc<dyn Fn(&ContainerEvent) + Send + Sync>;

/// Static definition of a lifecycle event listener
///
/// Registered with the [`lifecycle_listener!`](crate::lifecycle_listener)
/// macro and collected when an [`EventEmitter`] is created. Static listeners
/// receive every event regardless of name.
pub struct LifecycleListenerDefinition {
    /// Unique name identifying this listener
    pub name: &'static str,
    /// Function to call when events occur
    pub handler: fn(&ContainerEvent),
}

inventory::collect!(LifecycleListenerDefinition);

/// Publisher for container lifecycle events
///
/// Listeners subscribe per event name via [`on`](Self::on); delivery is
/// synchronous and in subscription order. Statically registered listeners
/// are discovered through the inventory system at construction and invoked
/// after the name-keyed listeners.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use trellis_container::{ContainerEvent, EventEmitter};
///
/// let emitter = EventEmitter::new();
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = seen.clone();
/// emitter.on(ContainerEvent::INITIALIZED, move |_| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// emitter.emit(&ContainerEvent::Initialized);
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
pub struct EventEmitter {
    listeners: DashMap<&'static str, Vec<EventListener>>,
    static_listeners: Vec<&'static LifecycleListenerDefinition>,
}

impl EventEmitter {
    /// Creates an emitter and collects statically registered listeners
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
            static_listeners: inventory::iter::<LifecycleListenerDefinition>().collect(),
        }
    }

    /// Subscribes a listener to the event with the given wire name
    ///
    /// Use the associated name constants on [`ContainerEvent`]; subscribing
    /// to an unknown name is allowed and simply never fires.
    pub fn on<F>(&self, event: &'static str, listener: F)
    where
        F: Fn(&ContainerEvent) + Send + Sync + 'static,
    {
        self.listeners
            .entry(event)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Number of dynamic listeners subscribed to an event name
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, |l| l.value().len())
    }

    /// Delivers an event to its subscribers, then to static listeners
    ///
    /// Delivery is synchronous: every listener has run by the time this
    /// method returns.
    pub fn emit(&self, event: &ContainerEvent) {
        // snapshot so no map guard is held while listeners run
        let subscribed = self.listeners.get(event.name()).map(|l| l.value().clone());
        if let Some(subscribed) = subscribed {
            for listener in subscribed {
                listener(event);
            }
        }
        for definition in &self.static_listeners {
            (definition.handler)(event);
        }
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static PROBE_HITS: AtomicUsize = AtomicUsize::new(0);

    fn probe_handler(event: &ContainerEvent) {
        if let ContainerEvent::ComponentRegistered { name } = event
            && name == "static-listener-probe"
        {
            PROBE_HITS.fetch_add(1, Ordering::SeqCst);
        }
    }

    crate::lifecycle_listener!("probe", probe_handler);

    #[test]
    fn test_event_names() {
        assert_eq!(
            ContainerEvent::ComponentRegistered {
                name: "db".to_string()
            }
            .name(),
            "component:registered"
        );
        assert_eq!(ContainerEvent::Initialized.name(), "initialized");
        assert_eq!(ContainerEvent::Shutdown.name(), "shutdown");
        assert_eq!(
            ContainerEvent::DiscoveryCompleted {
                manifest_type: "plugin".to_string(),
                count: 0
            }
            .name(),
            "discovery:completed"
        );
    }

    #[test]
    fn test_listeners_fire_in_subscription_order() {
        let emitter = EventEmitter::new();
        let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        let first = seen.clone();
        emitter.on(ContainerEvent::SHUTDOWN, move |_| first.lock().push("first"));
        let second = seen.clone();
        emitter.on(ContainerEvent::SHUTDOWN, move |_| second.lock().push("second"));

        emitter.emit(&ContainerEvent::Shutdown);
        assert_eq!(*seen.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_delivery_is_keyed_by_name() {
        let emitter = EventEmitter::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        emitter.on(ContainerEvent::INITIALIZED, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        emitter.emit(&ContainerEvent::Shutdown);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        emitter.emit(&ContainerEvent::Initialized);
        emitter.emit(&ContainerEvent::Initialized);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listener_count() {
        let emitter = EventEmitter::new();
        assert_eq!(emitter.listener_count(ContainerEvent::SHUTDOWN), 0);
        emitter.on(ContainerEvent::SHUTDOWN, |_| {});
        emitter.on(ContainerEvent::SHUTDOWN, |_| {});
        assert_eq!(emitter.listener_count(ContainerEvent::SHUTDOWN), 2);
        assert_eq!(emitter.listener_count(ContainerEvent::INITIALIZED), 0);
    }

    #[test]
    fn test_static_listener_receives_events() {
        let emitter = EventEmitter::new();
        let before = PROBE_HITS.load(Ordering::SeqCst);
        emitter.emit(&ContainerEvent::ComponentRegistered {
            name: "static-listener-probe".to_string(),
        });
        assert_eq!(PROBE_HITS.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn test_emit_with_no_listeners_is_a_noop() {
        let emitter = EventEmitter::new();
        emitter.emit(&ContainerEvent::ManifestRegistered {
            manifest_type: "plugin".to_string(),
        });
    }
}
