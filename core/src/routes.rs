//! Route conflict detection.
//!
//! Path dispatchers match on the shape of a path first and bind wildcard
//! values by position. Two routes whose keys (see [`route_key`]) are
//! prefix-related overlap at dispatch time, so they must agree on the name
//! of every wildcard they share; otherwise the generated accessors cannot
//! name the bound values unambiguously.
//!
//! # Examples
//!
//! ```
//! use api_design_core::*;
//!
//! let mut design = Design::new("api");
//! design.resources.push(
//!     Resource::new("widgets", "/widgets")
//!         .with_action(Action::new("show").with_route(Route::new("GET", "/:id")))
//!         .with_action(Action::new("items").with_route(Route::new("GET", "/:widgetId/items"))),
//! );
//!
//! let conflicts = find_route_conflicts(&design);
//! assert_eq!(conflicts.len(), 1);
//! assert_eq!(conflicts[0].wildcards[0].route.name, "widgetId");
//! assert_eq!(conflicts[0].wildcards[0].other.name, "id");
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::design::{Action, Design, Resource, Route};
use crate::path::{extract_wildcards, is_absolute, route_key};

/// Where a wildcard of a route's full path is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WildcardSource {
    /// The route's own path.
    Route,
    /// The owning resource's path, including parent resources.
    Resource,
    /// The API base path.
    Api,
}

/// A wildcard of a route, with the definition it originates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Wildcard {
    /// Wildcard name without the leading `:` or `*`.
    pub name: String,
    /// Kind of definition that declares it.
    pub source: WildcardSource,
    /// Diagnostic location of the declaring definition.
    pub origin: String,
}

impl fmt::Display for Wildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} from {}", self.name, self.origin)
    }
}

/// Shape key and wildcards of one route.
#[derive(Debug, Clone)]
pub struct RouteInfo<'a> {
    pub key: String,
    pub full_path: String,
    pub resource: &'a Resource,
    pub action: &'a Action,
    pub route: &'a Route,
    pub wildcards: Vec<Wildcard>,
}

impl<'a> RouteInfo<'a> {
    /// Computes the key and wildcard origins of `route`.
    pub fn new(
        design: &Design,
        resource: &'a Resource,
        action: &'a Action,
        route: &'a Route,
    ) -> Self {
        let full_path = design.route_full_path(resource, route);
        let own = extract_wildcards(&route.path);

        let wildcards = extract_wildcards(&full_path)
            .into_iter()
            .map(|name| {
                let (source, origin) = if own.contains(&name) {
                    (WildcardSource::Route, resource.route_context(action, route))
                } else {
                    inherited_origin(design, resource, &name)
                };
                Wildcard {
                    name,
                    source,
                    origin,
                }
            })
            .collect();

        Self {
            key: route_key(&full_path),
            full_path,
            resource,
            action,
            route,
            wildcards,
        }
    }

    /// Returns the wildcards of `other` whose name differs from the wildcard
    /// of `self` at the same position, as `(self, other)` pairs.
    pub fn different_wildcards(&self, other: &RouteInfo<'_>) -> Vec<WildcardConflict> {
        other
            .wildcards
            .iter()
            .enumerate()
            .filter_map(|(i, theirs)| {
                let ours = self.wildcards.get(i)?;
                (ours.name != theirs.name).then(|| WildcardConflict {
                    route: ours.clone(),
                    other: theirs.clone(),
                })
            })
            .collect()
    }
}

/// Locates the definition declaring a wildcard that a route inherits: the
/// resource's base path, then each parent's canonical route and base path,
/// then the API base path.
fn inherited_origin<'d>(
    design: &'d Design,
    resource: &'d Resource,
    name: &str,
) -> (WildcardSource, String) {
    let mut seen: HashSet<&'d str> = HashSet::new();
    let mut current = resource;
    loop {
        if declares(&current.base_path, name) {
            return (WildcardSource::Resource, current.context());
        }
        if is_absolute(&current.base_path) || !seen.insert(current.name.as_str()) {
            break;
        }
        let Some(parent) = current
            .parent_name
            .as_deref()
            .and_then(|parent_name| design.find_resource(parent_name))
        else {
            break;
        };
        if let Some((canonical, route)) = parent
            .canonical_action()
            .and_then(|ca| ca.routes.first().map(|route| (ca, route)))
        {
            if declares(&route.path, name) {
                return (WildcardSource::Route, parent.route_context(canonical, route));
            }
        }
        current = parent;
    }
    if declares(&design.base_path, name) {
        (WildcardSource::Api, design.context())
    } else {
        (WildcardSource::Resource, resource.context())
    }
}

fn declares(path: &str, name: &str) -> bool {
    extract_wildcards(path).iter().any(|w| w == name)
}

/// Two wildcards bound at the same position under different names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WildcardConflict {
    /// Wildcard of the reported route.
    pub route: Wildcard,
    /// Wildcard at the same position in the route it conflicts with.
    pub other: Wildcard,
}

impl fmt::Display for WildcardConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} and {}", self.route, self.other)
    }
}

/// A route whose key extends (or equals) the key of another route while
/// naming shared wildcards differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteConflict {
    /// Diagnostic location of the action owning the conflicting route.
    pub context: String,
    /// Full path of the reported route.
    pub route: String,
    /// Full path of the route whose key it extends or equals.
    pub other_route: String,
    /// Resource owning `other_route`.
    pub other_resource: String,
    /// Action owning `other_route`.
    pub other_action: String,
    /// Wildcards named differently at the same position.
    pub wildcards: Vec<WildcardConflict>,
}

impl fmt::Display for RouteConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let wildcards: Vec<String> = self.wildcards.iter().map(ToString::to_string).collect();
        write!(
            f,
            "route {:?} conflicts with route {:?} of {} action {}. Make sure wildcards at the same positions have the same name. Conflicting wildcards are {}.",
            self.route,
            self.other_route,
            self.other_resource,
            self.other_action,
            wildcards.join(", ")
        )
    }
}

/// Collects the key and wildcards of every route of the design.
pub fn route_infos(design: &Design) -> Vec<RouteInfo<'_>> {
    design
        .routes()
        .map(|(resource, action, route)| RouteInfo::new(design, resource, action, route))
        .collect()
}

/// Finds every pair of prefix-related routes that disagree on wildcard names.
///
/// Each unordered pair is examined once. The route with the longer key is
/// reported against the one whose key it extends; for identical keys the
/// later declaration is reported against the earlier one. Identical keys
/// with identical wildcard names are aliases and not conflicts.
pub fn find_route_conflicts(design: &Design) -> Vec<RouteConflict> {
    let infos = route_infos(design);
    let mut conflicts = Vec::new();

    for (i, first) in infos.iter().enumerate() {
        for second in &infos[i + 1..] {
            let (route, other) = if second.key.starts_with(&first.key) {
                (second, first)
            } else if first.key.starts_with(&second.key) {
                (first, second)
            } else {
                continue;
            };

            let wildcards = route.different_wildcards(other);
            if wildcards.is_empty() {
                continue;
            }
            debug!(
                route = %route.full_path,
                other = %other.full_path,
                count = wildcards.len(),
                "Route wildcard conflict"
            );
            conflicts.push(RouteConflict {
                context: route.resource.action_context(route.action),
                route: route.full_path.clone(),
                other_route: other.full_path.clone(),
                other_resource: other.resource.name.clone(),
                other_action: other.action.name.clone(),
                wildcards,
            });
        }
    }

    conflicts
}

/// A wildcard name reused by a route and its resource's path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateWildcard {
    /// Diagnostic location of the action owning the route.
    pub context: String,
    pub wildcard: String,
    /// Full path of the owning resource.
    pub resource_path: String,
    /// Path of the route as declared.
    pub route_path: String,
}

/// Finds wildcards that an action route redeclares from its resource path.
pub fn find_duplicate_wildcards(design: &Design) -> Vec<DuplicateWildcard> {
    let mut duplicates = Vec::new();
    for (resource, action, route) in design.routes() {
        let resource_path = design.resource_full_path(resource);
        let inherited = extract_wildcards(&resource_path);
        for wildcard in extract_wildcards(&route.path) {
            if inherited.contains(&wildcard) {
                duplicates.push(DuplicateWildcard {
                    context: resource.action_context(action),
                    wildcard,
                    resource_path: resource_path.clone(),
                    route_path: route.path.clone(),
                });
            }
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design_with(routes: &[(&str, &str, &str)]) -> Design {
        let mut design = Design::new("api");
        for (resource, action, path) in routes {
            let action = Action::new(action).with_route(Route::new("GET", path));
            match design.resources.iter_mut().find(|r| r.name == *resource) {
                Some(existing) => existing.actions.push(Action {
                    parent: Some(resource.to_string()),
                    ..action
                }),
                None => design
                    .resources
                    .push(Resource::new(resource, "/").with_action(action)),
            }
        }
        design
    }

    #[test]
    fn test_same_names_do_not_conflict() {
        let design = design_with(&[
            ("widgets", "show", "/widgets/:id"),
            ("widgets", "items", "/widgets/:id/items"),
        ]);
        assert!(find_route_conflicts(&design).is_empty());
    }

    #[test]
    fn test_prefix_with_different_name_conflicts_once() {
        let design = design_with(&[
            ("widgets", "show", "/widgets/:id"),
            ("items", "list", "/widgets/:widgetId/items"),
        ]);
        let conflicts = find_route_conflicts(&design);
        assert_eq!(conflicts.len(), 1);

        let conflict = &conflicts[0];
        assert_eq!(conflict.route, "/widgets/:widgetId/items");
        assert_eq!(conflict.other_route, "/widgets/:id");
        assert_eq!(conflict.other_resource, "widgets");
        assert_eq!(conflict.other_action, "show");
        assert_eq!(conflict.context, "action \"list\" of resource \"items\"");
        assert_eq!(conflict.wildcards.len(), 1);
        assert_eq!(conflict.wildcards[0].route.source, WildcardSource::Route);
        assert_eq!(conflict.wildcards[0].other.source, WildcardSource::Route);

        let message = conflict.to_string();
        assert!(message.contains("\"widgetId\" from route GET"));
        assert!(message.contains("\"id\" from route GET"));
    }

    #[test]
    fn test_unrelated_keys_never_conflict() {
        let design = design_with(&[
            ("widgets", "show", "/widgets/:id"),
            ("gadgets", "show", "/gadgets/:gadgetId"),
        ]);
        assert!(find_route_conflicts(&design).is_empty());
    }

    #[test]
    fn test_identical_aliases_are_not_conflicts() {
        let design = design_with(&[
            ("widgets", "show", "/widgets/:id"),
            ("widgets", "get", "/widgets/:id"),
        ]);
        assert!(find_route_conflicts(&design).is_empty());
    }

    #[test]
    fn test_identical_keys_reported_on_later_route() {
        let design = design_with(&[
            ("widgets", "show", "/widgets/:id"),
            ("widgets", "get", "/widgets/:name"),
        ]);
        let conflicts = find_route_conflicts(&design);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].route, "/widgets/:name");
        assert_eq!(conflicts[0].other_action, "show");
    }

    #[test]
    fn test_wildcard_origin_attribution() {
        let mut design = Design::new("api").with_base_path("/orgs/:org");
        design.resources.push(
            Resource::new("widgets", "/widgets/:widget")
                .with_action(Action::new("show").with_route(Route::new("GET", "/parts/:part"))),
        );
        let infos = route_infos(&design);
        let sources: Vec<_> = infos[0]
            .wildcards
            .iter()
            .map(|w| (w.name.as_str(), w.source))
            .collect();
        assert_eq!(
            sources,
            vec![
                ("org", WildcardSource::Api),
                ("widget", WildcardSource::Resource),
                ("part", WildcardSource::Route),
            ]
        );
        assert_eq!(infos[0].key, "/orgs/*/widgets/*/parts/*");
    }

    #[test]
    fn test_wildcard_from_parent_canonical_route() {
        let mut design = Design::new("api");
        design.resources.push(
            Resource::new("accounts", "/accounts")
                .with_canonical_action("show")
                .with_action(Action::new("show").with_route(Route::new("GET", "/:accountID"))),
        );
        design.resources.push(
            Resource::new("bottles", "/bottles")
                .with_parent("accounts")
                .with_action(Action::new("list").with_route(Route::new("GET", ""))),
        );

        let infos = route_infos(&design);
        let list = infos
            .iter()
            .find(|info| info.action.name == "list")
            .unwrap();
        assert_eq!(list.full_path, "/accounts/:accountID/bottles");
        assert_eq!(list.wildcards.len(), 1);
        assert_eq!(list.wildcards[0].source, WildcardSource::Route);
        assert_eq!(
            list.wildcards[0].origin,
            "route GET \"/:accountID\" of action \"show\" of resource \"accounts\""
        );
    }

    #[test]
    fn test_wildcard_from_parent_base_path() {
        let mut design = Design::new("api");
        design.resources.push(
            Resource::new("orgs", "/orgs/:org")
                .with_canonical_action("show")
                .with_action(Action::new("show").with_route(Route::new("GET", ""))),
        );
        design.resources.push(
            Resource::new("teams", "/teams")
                .with_parent("orgs")
                .with_action(Action::new("list").with_route(Route::new("GET", ""))),
        );

        let infos = route_infos(&design);
        let list = infos
            .iter()
            .find(|info| info.action.name == "list")
            .unwrap();
        assert_eq!(list.wildcards[0].source, WildcardSource::Resource);
        assert_eq!(list.wildcards[0].origin, "resource \"orgs\"");
    }

    #[test]
    fn test_duplicate_wildcard_between_resource_and_route() {
        let mut design = Design::new("api");
        design.resources.push(
            Resource::new("widgets", "/widgets/:id")
                .with_action(Action::new("show").with_route(Route::new("GET", "/:id"))),
        );
        let duplicates = find_duplicate_wildcards(&design);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].wildcard, "id");
        assert_eq!(duplicates[0].resource_path, "/widgets/:id");
    }
}
