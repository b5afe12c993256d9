//! Applications known to the discovery collaborator, keyed by bundle path

use std::collections::HashMap;

use super::data::{Application, Icon};

/// Discovered applications in discovery order.
///
/// The layout stores only paths; this is where they turn back into named,
/// iconned applications.
#[derive(Debug, Clone, Default)]
pub struct AppCatalog {
    apps: HashMap<String, Application>,
    order: Vec<String>,
}

impl AppCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (path, display name, icon) triples
    pub fn from_discovered<I, P, N>(discovered: I) -> Self
    where
        I: IntoIterator<Item = (P, N, Icon)>,
        P: Into<String>,
        N: Into<String>,
    {
        discovered
            .into_iter()
            .map(|(path, name, icon)| Application::new(path, name, icon))
            .collect()
    }

    /// Add or refresh an application; a known path keeps its position
    pub fn insert(&mut self, app: Application) {
        if !self.apps.contains_key(&app.path) {
            self.order.push(app.path.clone());
        }
        self.apps.insert(app.path.clone(), app);
    }

    pub fn get(&self, path: &str) -> Option<&Application> {
        self.apps.get(path)
    }

    /// The catalog entry for `path`, or an unresolved application
    pub fn resolve(&self, path: &str) -> Application {
        self.apps
            .get(path)
            .cloned()
            .unwrap_or_else(|| Application::unresolved(path))
    }

    /// Applications in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &Application> {
        self.order.iter().filter_map(|path| self.apps.get(path))
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

impl FromIterator<Application> for AppCatalog {
    fn from_iter<T: IntoIterator<Item = Application>>(iter: T) -> Self {
        let mut catalog = AppCatalog::new();
        for app in iter {
            catalog.insert(app);
        }
        catalog
    }
}
