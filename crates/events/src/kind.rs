use coffeeclub_core::ObjectId;

use crate::filter::EventFilter;

/// Closed set of event types the indexer tracks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    CafeCreated,
    CoffeeOrderCreated,
    CoffeeOrderUpdated,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::CafeCreated,
        EventKind::CoffeeOrderCreated,
        EventKind::CoffeeOrderUpdated,
    ];

    /// Move struct name of the event.
    pub fn struct_name(&self) -> &'static str {
        match self {
            EventKind::CafeCreated => "CafeCreated",
            EventKind::CoffeeOrderCreated => "CoffeeOrderCreated",
            EventKind::CoffeeOrderUpdated => "CoffeeOrderUpdated",
        }
    }
}

/// Maps between [`EventKind`] and fully qualified Move event types for one
/// deployed package.
///
/// Matching is exact on `<package>::<module>::<Name>`; the package address is
/// normalized on both sides so short and long address forms agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTypeResolver {
    package_id: ObjectId,
    module: String,
}

impl EventTypeResolver {
    pub fn new(package_id: ObjectId, module: impl Into<String>) -> Self {
        Self {
            package_id,
            module: module.into(),
        }
    }

    pub fn package_id(&self) -> &ObjectId {
        &self.package_id
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Fully qualified type string for `kind`.
    pub fn event_type(&self, kind: EventKind) -> String {
        format!("{}::{}::{}", self.package_id, self.module, kind.struct_name())
    }

    /// Node query filter selecting exactly `kind`.
    pub fn filter(&self, kind: EventKind) -> EventFilter {
        EventFilter::MoveEventType(self.event_type(kind))
    }

    /// `<package>::<module>`, the stable name of the whole module stream.
    pub fn module_path(&self) -> String {
        format!("{}::{}", self.package_id, self.module)
    }

    /// Node query filter selecting every event type defined in the module,
    /// in one ascending stream.
    pub fn module_filter(&self) -> EventFilter {
        EventFilter::MoveEventModule {
            package: self.package_id.to_string(),
            module: self.module.clone(),
        }
    }

    /// Resolve a delivered event type back to a tracked kind.
    ///
    /// Returns `None` for anything outside this package/module, including
    /// types that merely contain a tracked name as a substring.
    pub fn resolve(&self, event_type: &str) -> Option<EventKind> {
        let mut parts = event_type.splitn(3, "::");
        let (Some(package), Some(module), Some(name)) = (parts.next(), parts.next(), parts.next())
        else {
            return None;
        };

        if module != self.module {
            return None;
        }
        match ObjectId::parse(package) {
            Ok(p) if p == self.package_id => {}
            _ => return None,
        }

        EventKind::ALL.into_iter().find(|k| k.struct_name() == name)
    }
}
