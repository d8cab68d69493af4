use crate::view::ViewRecord;
use std::cmp::Reverse;

/// Order extensions for application
///
/// Extensions are grouped by module. Groups follow `resolution` (module
/// dependency order); modules missing from it come last, in the order they
/// were first seen. Inside a group the highest priority goes first, ties are
/// broken by `xml_id`.
pub fn order_by_modules<S: AsRef<str>>(extensions: Vec<ViewRecord>, resolution: &[S]) -> Vec<ViewRecord> {
    let mut groups: Vec<(String, Vec<ViewRecord>)> = Vec::new();
    for view in extensions {
        let module = view.module.clone().unwrap_or_default();
        match groups.iter_mut().find(|(name, _)| *name == module) {
            Some((_, views)) => views.push(view),
            None => groups.push((module, vec![view])),
        }
    }

    for (_, views) in &mut groups {
        views.sort_by(|a, b| {
            (Reverse(a.priority), &a.xml_id).cmp(&(Reverse(b.priority), &b.xml_id))
        });
    }

    let mut ordered = Vec::new();
    for module in resolution {
        if let Some(index) = groups.iter().position(|(name, _)| name == module.as_ref()) {
            let (_, views) = groups.remove(index);
            ordered.extend(views);
        }
    }
    for (_, views) in groups {
        ordered.extend(views);
    }
    ordered
}
