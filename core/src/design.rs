//! API description graph.
//!
//! A [`Design`] is the root of one API description. It owns the arenas that
//! hold every attribute, user type and media type, plus the resources (with
//! their actions and routes), shared responses and encodings. Everything
//! that can be referenced from several places is stored once in an arena and
//! referred to by handle.
//!
//! The builder methods here are the thin authoring surface; richer DSLs hand
//! over a finished graph, either in memory or through
//! [`Design::from_json`] / [`Design::load`].
//!
//! # Example
//!
//! ```
//! use api_design_core::*;
//!
//! let mut design = Design::new("cellar").with_base_path("/api");
//! let id = design.add_attribute(Attribute::primitive(Primitive::Integer));
//! let params = design.add_attribute(Attribute::object([("id", id)]));
//!
//! design.resources.push(
//!     Resource::new("bottles", "/bottles").with_action(
//!         Action::new("show")
//!             .with_route(Route::new("GET", "/:id"))
//!             .with_params(params)
//!             .with_response(Response::new("ok", 200)),
//!     ),
//! );
//!
//! let bottles = design.find_resource("bottles").unwrap();
//! let route = &bottles.actions[0].routes[0];
//! assert_eq!(design.route_full_path(bottles, route), "/api/bottles/:id");
//! assert!(validate_design(&design).is_ok());
//! ```

use std::collections::{BTreeMap, HashSet};
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::error::Result;
use crate::path::join_paths;
use crate::types::{Attribute, AttributeId, DataType, Kind, MediaTypeId, Object, UserTypeId};

/// Name of the view every non-collection media type must define.
pub const DEFAULT_VIEW: &str = "default";

/// View used by links that do not name one.
pub const LINK_VIEW: &str = "link";

/// Contact information of the API owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
}

/// License of the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub name: Option<String>,
    pub url: Option<String>,
}

/// Pointer to external documentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Docs {
    pub description: Option<String>,
    pub url: Option<String>,
}

impl Docs {
    /// Creates a docs entry pointing at `url`.
    pub fn url(url: &str) -> Self {
        Self {
            description: None,
            url: Some(url.to_string()),
        }
    }
}

/// Response template: a status code with an optional body description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub name: String,
    /// HTTP status code; `0` means unset.
    pub status: u16,
    /// Identifier of the media type rendered in the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Explicit body attribute, when not described by a media type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<AttributeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<AttributeId>,
}

impl Response {
    /// Creates a response with the given name and status code.
    pub fn new(name: &str, status: u16) -> Self {
        Self {
            name: name.to_string(),
            status,
            ..Default::default()
        }
    }

    /// Sets the media type identifier rendered in the body.
    pub fn with_media_type(mut self, identifier: &str) -> Self {
        self.media_type = Some(identifier.to_string());
        self
    }

    /// Sets an explicit body attribute.
    pub fn with_body(mut self, body: AttributeId) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the headers attribute.
    pub fn with_headers(mut self, headers: AttributeId) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Returns the diagnostic location of this response.
    pub fn context(&self) -> String {
        format!("response {:?}", self.name)
    }
}

/// HTTP verb and path of an action endpoint.
///
/// The path is relative to the owning resource's full path unless it starts
/// with `//`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub verb: String,
    pub path: String,
    /// Name of the owning action.
    pub parent: Option<String>,
}

impl Route {
    /// Creates a route; the parent is set when it is added to an action.
    pub fn new(verb: &str, path: &str) -> Self {
        Self {
            verb: verb.to_string(),
            path: path.to_string(),
            parent: None,
        }
    }
}

/// An operation of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub description: Option<String>,
    /// Name of the owning resource.
    pub parent: Option<String>,
    pub routes: Vec<Route>,
    /// Object attribute holding path and query parameters.
    pub params: Option<AttributeId>,
    pub payload: Option<AttributeId>,
    pub responses: BTreeMap<String, Response>,
    pub docs: Option<Docs>,
}

impl Action {
    /// Creates an action; the parent is set when it is added to a resource.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds a route and points it back at this action.
    pub fn with_route(mut self, mut route: Route) -> Self {
        route.parent.get_or_insert_with(|| self.name.clone());
        self.routes.push(route);
        self
    }

    /// Sets the params attribute.
    pub fn with_params(mut self, params: AttributeId) -> Self {
        self.params = Some(params);
        self
    }

    /// Sets the payload attribute.
    pub fn with_payload(mut self, payload: AttributeId) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Adds a response, keyed by its name.
    pub fn with_response(mut self, response: Response) -> Self {
        self.responses.insert(response.name.clone(), response);
        self
    }

    /// Sets the documentation pointer.
    pub fn with_docs(mut self, docs: Docs) -> Self {
        self.docs = Some(docs);
        self
    }
}

/// A named collection of actions sharing a base path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub description: Option<String>,
    pub base_path: String,
    /// Name of the parent resource, resolved during validation.
    pub parent_name: Option<String>,
    /// Name of the action identifying a single instance of the resource.
    pub canonical_action_name: Option<String>,
    /// Object attribute describing the base path wildcards.
    pub base_params: Option<AttributeId>,
    /// Parameters shared by every action.
    pub params: Option<AttributeId>,
    pub actions: Vec<Action>,
    pub responses: BTreeMap<String, Response>,
}

impl Resource {
    /// Creates a resource with the given name and base path.
    pub fn new(name: &str, base_path: &str) -> Self {
        Self {
            name: name.to_string(),
            base_path: base_path.to_string(),
            ..Default::default()
        }
    }

    /// Adds an action and points it back at this resource.
    pub fn with_action(mut self, mut action: Action) -> Self {
        action.parent.get_or_insert_with(|| self.name.clone());
        self.actions.push(action);
        self
    }

    /// Sets the parent resource name.
    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent_name = Some(parent.to_string());
        self
    }

    /// Sets the canonical action name.
    pub fn with_canonical_action(mut self, action: &str) -> Self {
        self.canonical_action_name = Some(action.to_string());
        self
    }

    /// Sets the base params attribute.
    pub fn with_base_params(mut self, params: AttributeId) -> Self {
        self.base_params = Some(params);
        self
    }

    /// Finds an action by name.
    pub fn find_action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Returns the canonical action, if one is named and exists.
    pub fn canonical_action(&self) -> Option<&Action> {
        self.canonical_action_name
            .as_deref()
            .and_then(|name| self.find_action(name))
    }

    /// Returns the diagnostic location of this resource.
    pub fn context(&self) -> String {
        format!("resource {:?}", self.name)
    }

    /// Returns the diagnostic location of one of its actions.
    pub fn action_context(&self, action: &Action) -> String {
        format!("action {:?} of {}", action.name, self.context())
    }

    /// Returns the diagnostic location of one of its routes.
    pub fn route_context(&self, action: &Action, route: &Route) -> String {
        format!(
            "route {} {:?} of {}",
            route.verb,
            route.path,
            self.action_context(action)
        )
    }
}

/// A reusable attribute with an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserType {
    pub type_name: String,
    pub attribute: AttributeId,
}

impl UserType {
    /// Returns the diagnostic location of this type.
    pub fn context(&self) -> String {
        format!("type {:?}", self.type_name)
    }
}

/// Named projection of a media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    /// Object listing the fields rendered by the view.
    pub attribute: AttributeId,
}

/// Reference from a media type field to another media type rendered with
/// a given view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Name of the field of the owning media type.
    pub name: String,
    pub view: String,
}

impl Link {
    /// Creates a link rendered with the `"link"` view.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            view: LINK_VIEW.to_string(),
        }
    }

    /// Overrides the view.
    pub fn with_view(mut self, view: &str) -> Self {
        self.view = view.to_string();
        self
    }
}

/// A named type describing response bodies, with views and links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaType {
    pub type_name: String,
    /// MIME identifier, e.g. `application/vnd.bottle+json`.
    pub identifier: String,
    pub attribute: AttributeId,
    pub views: BTreeMap<String, View>,
    pub links: Vec<Link>,
}

impl MediaType {
    /// Adds a view, keyed by its name.
    pub fn add_view(&mut self, name: &str, attribute: AttributeId) {
        self.views.insert(
            name.to_string(),
            View {
                name: name.to_string(),
                attribute,
            },
        );
    }

    /// Adds a link.
    pub fn add_link(&mut self, link: Link) {
        self.links.push(link);
    }

    /// Returns the diagnostic location of this media type.
    pub fn context(&self) -> String {
        format!("media type {:?}", self.identifier)
    }
}

/// Encoder or decoder declaration for a set of MIME types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoding {
    pub mime_types: Vec<String>,
    /// Package implementing the encoder; built-in encoders are used when unset.
    pub package_path: Option<String>,
    /// Name of the factory function within the package.
    pub function: Option<String>,
}

impl Encoding {
    /// Creates a declaration for the given MIME types.
    pub fn new<I, S>(mime_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mime_types: mime_types.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Sets the implementing package.
    pub fn with_package(mut self, package: &str) -> Self {
        self.package_path = Some(package.to_string());
        self
    }

    /// Returns the diagnostic location of this declaration.
    pub fn context(&self) -> String {
        format!("encoding(s) for {}", self.mime_types.join(", "))
    }
}

/// Reference to either kind of named type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedTypeRef {
    User(UserTypeId),
    Media(MediaTypeId),
}

/// Root of an API description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Design {
    pub name: String,
    pub base_path: String,
    /// Object attribute describing wildcards of the API base path.
    pub base_params: Option<AttributeId>,
    pub contact: Option<Contact>,
    pub license: Option<License>,
    pub docs: Option<Docs>,
    pub resources: Vec<Resource>,
    /// Response templates shared by every resource.
    pub responses: BTreeMap<String, Response>,
    pub consumes: Vec<Encoding>,
    pub produces: Vec<Encoding>,
    attributes: SlotMap<AttributeId, Attribute>,
    user_types: SlotMap<UserTypeId, UserType>,
    media_types: SlotMap<MediaTypeId, MediaType>,
}

impl Design {
    /// Creates an empty design rooted at `/`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base_path: "/".to_string(),
            ..Default::default()
        }
    }

    /// Sets the API base path.
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = base_path.to_string();
        self
    }

    /// Parses a design from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the design as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads a design file; `.yaml`/`.yml` files are read as YAML, anything
    /// else as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::DesignError::Io) if the file cannot be read and
    /// [`Json`](crate::DesignError::Json) or [`Yaml`](crate::DesignError::Yaml)
    /// if it cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );
        if is_yaml {
            Ok(serde_yaml::from_reader(reader)?)
        } else {
            Ok(serde_json::from_reader(reader)?)
        }
    }

    /// Returns the diagnostic location of the API itself.
    pub fn context(&self) -> String {
        format!("API {:?}", self.name)
    }

    /// Stores an attribute and returns its handle.
    pub fn add_attribute(&mut self, attribute: Attribute) -> AttributeId {
        self.attributes.insert(attribute)
    }

    pub fn attribute(&self, id: AttributeId) -> Option<&Attribute> {
        self.attributes.get(id)
    }

    pub fn attribute_mut(&mut self, id: AttributeId) -> Option<&mut Attribute> {
        self.attributes.get_mut(id)
    }

    /// Number of attributes stored in the design.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Registers a user type backed by `attribute`.
    pub fn add_user_type(&mut self, type_name: &str, attribute: AttributeId) -> UserTypeId {
        self.user_types.insert(UserType {
            type_name: type_name.to_string(),
            attribute,
        })
    }

    pub fn user_type(&self, id: UserTypeId) -> Option<&UserType> {
        self.user_types.get(id)
    }

    /// Iterates over every user type.
    pub fn user_types(&self) -> impl Iterator<Item = (UserTypeId, &UserType)> {
        self.user_types.iter()
    }

    /// Finds a user type by name.
    pub fn find_user_type(&self, type_name: &str) -> Option<UserTypeId> {
        self.user_types
            .iter()
            .find(|(_, t)| t.type_name == type_name)
            .map(|(id, _)| id)
    }

    /// Registers a media type backed by `attribute`, without views or links.
    pub fn add_media_type(
        &mut self,
        identifier: &str,
        type_name: &str,
        attribute: AttributeId,
    ) -> MediaTypeId {
        self.media_types.insert(MediaType {
            type_name: type_name.to_string(),
            identifier: identifier.to_string(),
            attribute,
            views: BTreeMap::new(),
            links: Vec::new(),
        })
    }

    pub fn media_type(&self, id: MediaTypeId) -> Option<&MediaType> {
        self.media_types.get(id)
    }

    pub fn media_type_mut(&mut self, id: MediaTypeId) -> Option<&mut MediaType> {
        self.media_types.get_mut(id)
    }

    /// Iterates over every media type.
    pub fn media_types(&self) -> impl Iterator<Item = (MediaTypeId, &MediaType)> {
        self.media_types.iter()
    }

    /// Finds a media type by identifier.
    pub fn find_media_type(&self, identifier: &str) -> Option<MediaTypeId> {
        self.media_types
            .iter()
            .find(|(_, mt)| mt.identifier == identifier)
            .map(|(id, _)| id)
    }

    /// Returns the name and backing attribute of a named type.
    pub fn named_type(&self, named: NamedTypeRef) -> Option<(&str, AttributeId)> {
        match named {
            NamedTypeRef::User(id) => self
                .user_type(id)
                .map(|t| (t.type_name.as_str(), t.attribute)),
            NamedTypeRef::Media(id) => self
                .media_type(id)
                .map(|t| (t.type_name.as_str(), t.attribute)),
        }
    }

    /// Finds a resource by name.
    pub fn find_resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Returns the resource path including the API or parent resource path.
    ///
    /// Child resources are mounted under the first route of their parent's
    /// canonical action. A parent chain that loops back on itself stops at
    /// the first repeated resource.
    pub fn resource_full_path(&self, resource: &Resource) -> String {
        let mut seen = HashSet::new();
        self.resource_full_path_guarded(resource, &mut seen)
    }

    fn resource_full_path_guarded<'a>(
        &'a self,
        resource: &'a Resource,
        seen: &mut HashSet<&'a str>,
    ) -> String {
        if crate::path::is_absolute(&resource.base_path) {
            return join_paths("/", &resource.base_path);
        }
        seen.insert(resource.name.as_str());
        let base = match resource.parent_name.as_deref() {
            Some(parent_name) => {
                match self.find_resource(parent_name) {
                    Some(parent) if !seen.contains(parent.name.as_str()) => parent
                        .canonical_action()
                        .and_then(|ca| ca.routes.first())
                        .map(|route| {
                            let parent_path = self.resource_full_path_guarded(parent, seen);
                            join_paths(&parent_path, &route.path)
                        })
                        .unwrap_or_default(),
                    _ => String::new(),
                }
            }
            None => self.base_path.clone(),
        };
        join_paths(&base, &resource.base_path)
    }

    /// Returns the full path of `route`, which belongs to `resource`.
    pub fn route_full_path(&self, resource: &Resource, route: &Route) -> String {
        if crate::path::is_absolute(&route.path) {
            return join_paths("/", &route.path);
        }
        join_paths(&self.resource_full_path(resource), &route.path)
    }

    /// Follows named types until a structural attribute is reached.
    ///
    /// Returns `None` for dangling handles, untyped named types and named
    /// types that only alias each other in a loop.
    pub fn resolve(&self, id: AttributeId) -> Option<&Attribute> {
        let mut seen = HashSet::new();
        let mut current = id;
        loop {
            if !seen.insert(current) {
                return None;
            }
            let attribute = self.attribute(current)?;
            current = match attribute.data_type.as_ref()? {
                DataType::UserType(t) => self.user_type(*t)?.attribute,
                DataType::MediaType(t) => self.media_type(*t)?.attribute,
                _ => return Some(attribute),
            };
        }
    }

    /// Returns the structural kind of an attribute, unwrapping named types.
    pub fn kind_of(&self, id: AttributeId) -> Option<Kind> {
        let attribute = self.resolve(id)?;
        Some(match attribute.data_type.as_ref()? {
            DataType::Primitive(p) => p.kind(),
            DataType::Object(_) => Kind::Object,
            DataType::Array(_) => Kind::Array,
            DataType::Map { .. } => Kind::Map,
            DataType::UserType(_) | DataType::MediaType(_) => return None,
        })
    }

    /// Returns the object fields of an attribute, unwrapping named types.
    pub fn object_of(&self, id: AttributeId) -> Option<&Object> {
        match self.resolve(id)?.data_type.as_ref()? {
            DataType::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns the element handle of an array attribute, unwrapping named types.
    pub fn array_elem_of(&self, id: AttributeId) -> Option<AttributeId> {
        match self.resolve(id)?.data_type.as_ref()? {
            DataType::Array(elem) => Some(*elem),
            _ => None,
        }
    }

    /// Returns the key and element handles of a map attribute, unwrapping
    /// named types.
    pub fn map_of(&self, id: AttributeId) -> Option<(AttributeId, AttributeId)> {
        match self.resolve(id)?.data_type.as_ref()? {
            DataType::Map { key, elem } => Some((*key, *elem)),
            _ => None,
        }
    }

    /// Returns the name of the named type an attribute refers to, if any.
    pub fn named_type_name(&self, id: AttributeId) -> Option<&str> {
        self.named_ref(id)
            .and_then(|named| self.named_type(named))
            .map(|(name, _)| name)
    }

    /// Returns the named type an attribute refers to, if any.
    pub fn named_ref(&self, id: AttributeId) -> Option<NamedTypeRef> {
        match self.attribute(id)?.data_type.as_ref()? {
            DataType::UserType(t) => Some(NamedTypeRef::User(*t)),
            DataType::MediaType(t) => Some(NamedTypeRef::Media(*t)),
            _ => None,
        }
    }

    /// Returns a short human-readable type name used in diagnostics.
    pub fn type_name(&self, id: AttributeId) -> String {
        if let Some(name) = self.named_type_name(id) {
            return name.to_string();
        }
        match self.kind_of(id) {
            Some(kind) => kind.to_string(),
            None => "<nil>".to_string(),
        }
    }

    /// Returns the required field names of an attribute, including those
    /// declared on the named type it refers to.
    pub fn all_required(&self, id: AttributeId) -> Vec<String> {
        let Some(attribute) = self.attribute(id) else {
            return Vec::new();
        };
        let mut required: Vec<String> = attribute.required().to_vec();
        if let Some(underlying) = self.resolve(id) {
            for name in underlying.required() {
                if !required.contains(name) {
                    required.push(name.clone());
                }
            }
        }
        required
    }

    /// Iterates over every `(resource, action, route)` triple.
    pub fn routes(&self) -> impl Iterator<Item = (&Resource, &Action, &Route)> {
        self.resources.iter().flat_map(|resource| {
            resource.actions.iter().flat_map(move |action| {
                action
                    .routes
                    .iter()
                    .map(move |route| (resource, action, route))
            })
        })
    }
}
