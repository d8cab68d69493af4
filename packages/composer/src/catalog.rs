use crate::ordering::order_by_modules;
use crate::path::ViewIdentity;
use crate::view::ViewRecord;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A base view and its extensions in application order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeJob {
    pub base: ViewRecord,
    pub extensions: Vec<ViewRecord>,
}

impl ComposeJob {
    pub fn identity(&self) -> ViewIdentity {
        self.base.identity()
    }
}

/// Views compete and extend only within the same identity and group set
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ViewKey {
    identity: ViewIdentity,
    groups: BTreeSet<String>,
}

impl ViewKey {
    fn of(view: &ViewRecord) -> Self {
        Self {
            identity: view.identity(),
            groups: view.groups.clone(),
        }
    }
}

/// Every known view, keyed by identity and groups
#[derive(Debug, Default)]
pub struct ViewCatalog {
    bases: BTreeMap<ViewKey, ViewRecord>,
    extensions: BTreeMap<ViewKey, Vec<ViewRecord>>,
}

impl ViewCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a view; among base views with the same identity and groups the
    /// highest priority wins, the first one on ties
    pub fn insert(&mut self, view: ViewRecord) {
        let key = ViewKey::of(&view);
        if view.extension {
            self.extensions.entry(key).or_default().push(view);
            return;
        }

        match self.bases.get(&key) {
            Some(existing) if existing.priority >= view.priority => {
                debug!(view = %key.identity, dropped = %view.label(), "Keeping higher priority base view");
            }
            _ => {
                self.bases.insert(key, view);
            }
        }
    }

    /// Selected base views with this identity, one per group set
    pub fn bases_of(&self, identity: &ViewIdentity) -> Vec<&ViewRecord> {
        self.bases
            .iter()
            .filter(|(key, _)| &key.identity == identity)
            .map(|(_, view)| view)
            .collect()
    }

    /// Extensions that apply to `base`: same identity, model and groups
    pub fn extensions_for(&self, base: &ViewRecord) -> Vec<&ViewRecord> {
        self.extensions
            .get(&ViewKey::of(base))
            .map(|views| views.iter().filter(|v| v.model == base.model).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Whether any base or extension view is called `name`
    pub fn has_view(&self, name: &str) -> bool {
        self.bases
            .keys()
            .chain(self.extensions.keys())
            .any(|key| key.identity.name == name)
    }

    /// Identities that have extensions but no base view with the same groups
    pub fn orphans(&self) -> Vec<&ViewIdentity> {
        let mut orphans: Vec<_> = self
            .extensions
            .keys()
            .filter(|key| !self.bases.contains_key(*key))
            .map(|key| &key.identity)
            .collect();
        orphans.dedup();
        orphans
    }

    /// One job per base view that has matching extensions, ordered by
    /// identity then groups
    pub fn jobs<S: AsRef<str>>(&self, resolution: &[S]) -> Vec<ComposeJob> {
        self.bases
            .values()
            .filter_map(|base| {
                let extensions: Vec<ViewRecord> =
                    self.extensions_for(base).into_iter().cloned().collect();
                if extensions.is_empty() {
                    return None;
                }
                Some(ComposeJob {
                    base: base.clone(),
                    extensions: order_by_modules(extensions, resolution),
                })
            })
            .collect()
    }
}

impl Extend<ViewRecord> for ViewCatalog {
    fn extend<T: IntoIterator<Item = ViewRecord>>(&mut self, iter: T) {
        for view in iter {
            self.insert(view);
        }
    }
}

impl FromIterator<ViewRecord> for ViewCatalog {
    fn from_iter<T: IntoIterator<Item = ViewRecord>>(iter: T) -> Self {
        let mut catalog = Self::new();
        catalog.extend(iter);
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(name: &str, id: &str) -> ViewRecord {
        ViewRecord::new(name, "form", "<object-views/>").with_xml_id(id)
    }

    fn ids<'a>(views: impl IntoIterator<Item = &'a ViewRecord>) -> Vec<&'a str> {
        views.into_iter().filter_map(|v| v.xml_id.as_deref()).collect()
    }

    #[test]
    fn test_highest_priority_base_wins() {
        let catalog: ViewCatalog = vec![
            view("a", "low").with_priority(10),
            view("a", "high").with_priority(30),
            view("a", "tie").with_priority(30),
        ]
        .into_iter()
        .collect();
        let bases = catalog.bases_of(&ViewIdentity::new("a", "form"));
        assert_eq!(ids(bases), vec!["high"]);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_jobs_and_orphans() {
        let catalog: ViewCatalog = vec![
            view("a", "a-base"),
            view("b", "b-base"),
            view("a", "a-sale").with_module("sale").as_extension(),
            view("a", "a-base-ext").with_module("base").as_extension(),
            view("c", "c-ext").as_extension(),
        ]
        .into_iter()
        .collect();

        let jobs = catalog.jobs(&["base", "sale"]);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].identity(), ViewIdentity::new("a", "form"));
        assert_eq!(ids(&jobs[0].extensions), vec!["a-base-ext", "a-sale"]);

        assert_eq!(catalog.orphans(), vec![&ViewIdentity::new("c", "form")]);
        let b = catalog.bases_of(&ViewIdentity::new("b", "form"))[0];
        assert!(catalog.extensions_for(b).is_empty());
        assert!(catalog.has_view("c"));
        assert!(!catalog.has_view("d"));
    }

    #[test]
    fn test_groups_select_one_base_each() {
        let catalog: ViewCatalog = vec![
            view("a", "all").with_priority(10),
            view("a", "admin-low").with_groups("admins").with_priority(5),
            view("a", "admin-high").with_groups("admins").with_priority(15),
            view("a", "all-ext").as_extension(),
            view("a", "admin-ext").with_groups("admins").as_extension(),
            view("a", "staff-ext").with_groups("admins,staff").as_extension(),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            ids(catalog.bases_of(&ViewIdentity::new("a", "form"))),
            vec!["all", "admin-high"]
        );

        let jobs = catalog.jobs::<&str>(&[]);
        let summary: Vec<_> = jobs
            .iter()
            .map(|job| (job.base.xml_id.as_deref().unwrap_or_default(), ids(&job.extensions)))
            .collect();
        assert_eq!(
            summary,
            vec![("all", vec!["all-ext"]), ("admin-high", vec!["admin-ext"])]
        );
        assert_eq!(catalog.orphans(), vec![&ViewIdentity::new("a", "form")]);
    }

    #[test]
    fn test_extensions_must_share_the_model() {
        let base = view("a", "base").with_model("com.example.User");
        let catalog: ViewCatalog = vec![
            base.clone(),
            view("a", "same").with_model("com.example.User").as_extension(),
            view("a", "other").with_model("com.example.Partner").as_extension(),
            view("a", "none").as_extension(),
        ]
        .into_iter()
        .collect();

        assert_eq!(ids(catalog.extensions_for(&base)), vec!["same"]);
        assert_eq!(ids(&catalog.jobs::<&str>(&[])[0].extensions), vec!["same"]);
    }
}
