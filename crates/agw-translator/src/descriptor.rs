//! The service descriptor model.
//!
//! A passive typed record decoded from the service-config JSON. Unknown
//! fields are ignored; multi-word fields accept both the snake_case and
//! camelCase wire spellings. Behavior is limited to accessors and the
//! selector index.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use agw_core::{ConfigError, ConfigResult};

/// Source-file type carrying the proto file-descriptor set.
const FILE_DESCRIPTOR_SET_PROTO: &str = "FILE_DESCRIPTOR_SET_PROTO";

/// The authoritative service configuration document.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ServiceDescriptor {
    /// Service id, e.g. `bookstore.endpoints.project123.cloud.goog`.
    #[serde(default)]
    pub name: String,
    /// Producer project id.
    #[serde(default, alias = "producerProjectId")]
    pub producer_project_id: String,
    /// The APIs this service exposes.
    #[serde(default)]
    pub apis: Vec<Api>,
    /// HTTP bindings.
    #[serde(default)]
    pub http: HttpRules,
    /// Authentication providers and rules.
    #[serde(default)]
    pub authentication: Authentication,
    /// Backend routing rules.
    #[serde(default)]
    pub backend: Backend,
    /// Service-control binding.
    #[serde(default)]
    pub control: Control,
    /// Endpoint-level flags.
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    /// Logging configuration, passed through to service control.
    #[serde(default)]
    pub logging: Option<Value>,
    /// Log descriptors, passed through to service control.
    #[serde(default)]
    pub logs: Option<Value>,
    /// Source files attached to the config.
    #[serde(default, alias = "sourceInfo")]
    pub source_info: SourceInfo,
}

/// An API with its method list.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Api {
    /// Fully-qualified API name.
    #[serde(default)]
    pub name: String,
    /// Short method names.
    #[serde(default)]
    pub methods: Vec<Method>,
}

/// A method of an API.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Method {
    /// Short method name.
    #[serde(default)]
    pub name: String,
}

/// The `http` section.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct HttpRules {
    /// HTTP rules, one binding per selector.
    #[serde(default)]
    pub rules: Vec<HttpRule>,
}

/// One HTTP rule: a selector bound to exactly one verb/template pair.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct HttpRule {
    /// Fully-qualified `api.method` selector.
    #[serde(default)]
    pub selector: String,
    #[serde(default)]
    get: Option<String>,
    #[serde(default)]
    put: Option<String>,
    #[serde(default)]
    post: Option<String>,
    #[serde(default)]
    delete: Option<String>,
    #[serde(default)]
    patch: Option<String>,
    /// Request body field mapping.
    #[serde(default)]
    pub body: Option<String>,
}

/// A resolved HTTP binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpBinding {
    /// Upper-case HTTP verb.
    pub verb: String,
    /// URI template as written in the descriptor.
    pub template: String,
}

impl HttpRule {
    /// The verb/template binding of this rule, if any verb is set.
    #[must_use]
    pub fn binding(&self) -> Option<HttpBinding> {
        let (verb, template) = if let Some(t) = &self.get {
            ("GET", t)
        } else if let Some(t) = &self.put {
            ("PUT", t)
        } else if let Some(t) = &self.post {
            ("POST", t)
        } else if let Some(t) = &self.delete {
            ("DELETE", t)
        } else if let Some(t) = &self.patch {
            ("PATCH", t)
        } else {
            return None;
        };
        Some(HttpBinding {
            verb: verb.to_string(),
            template: template.clone(),
        })
    }
}

/// The `authentication` section.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Authentication {
    /// Declared providers.
    #[serde(default)]
    pub providers: Vec<AuthProvider>,
    /// Per-selector requirement rules.
    #[serde(default)]
    pub rules: Vec<AuthRule>,
}

/// A JWT authentication provider.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AuthProvider {
    /// Provider id referenced by rules.
    #[serde(default)]
    pub id: String,
    /// Token issuer.
    #[serde(default)]
    pub issuer: String,
    /// Where to fetch the provider's JWKS.
    #[serde(default, alias = "jwksUri")]
    pub jwks_uri: String,
    /// Comma-separated accepted audiences.
    #[serde(default)]
    pub audiences: String,
    /// JWKS document inlined at translation time; never on the wire.
    #[serde(skip)]
    pub jwks: Option<String>,
}

/// Split a comma-separated audience list, trimming whitespace.
pub(crate) fn split_audiences(audiences: &str) -> Vec<String> {
    audiences
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

impl AuthProvider {
    /// The provider's accepted audiences as a list.
    #[must_use]
    pub fn audience_list(&self) -> Vec<String> {
        split_audiences(&self.audiences)
    }
}

/// A per-selector authentication rule.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AuthRule {
    /// Fully-qualified `api.method` selector.
    #[serde(default)]
    pub selector: String,
    /// Alternative requirements; any one satisfies the rule.
    #[serde(default)]
    pub requirements: Vec<AuthRequirement>,
}

/// One requirement of an authentication rule.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AuthRequirement {
    /// Referenced provider id.
    #[serde(default, alias = "providerId")]
    pub provider_id: String,
    /// Comma-separated audience override.
    #[serde(default)]
    pub audiences: String,
}

impl AuthRequirement {
    /// The requirement's audiences as a list.
    #[must_use]
    pub fn audience_list(&self) -> Vec<String> {
        split_audiences(&self.audiences)
    }
}

/// The `backend` section.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Backend {
    /// Backend routing rules.
    #[serde(default)]
    pub rules: Vec<BackendRule>,
}

/// Path translation strategies for dynamic routing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum PathTranslation {
    /// Route to the rule address verbatim; path variables travel as
    /// extracted bindings.
    #[serde(rename = "CONSTANT_ADDRESS")]
    ConstantAddress,
    /// Append the request path to the rule address.
    #[serde(rename = "APPEND_PATH_TO_ADDRESS")]
    AppendPathToAddress,
    /// Unset or unrecognized.
    #[default]
    #[serde(other)]
    Unspecified,
}

/// A backend routing rule.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BackendRule {
    /// Fully-qualified `api.method` selector.
    #[serde(default)]
    pub selector: String,
    /// Target address, `https://host[:port]/...`.
    #[serde(default)]
    pub address: String,
    /// How the request path maps onto the address.
    #[serde(default, alias = "pathTranslation")]
    pub path_translation: PathTranslation,
    /// Audience of the identity token minted for this backend.
    #[serde(default, alias = "jwtAudience")]
    pub jwt_audience: String,
}

/// The `control` section.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Control {
    /// Service-control endpoint; empty disables service control.
    #[serde(default)]
    pub environment: String,
}

/// One endpoint-level flag record.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Endpoint {
    /// Endpoint name; flags apply when it equals the service name.
    #[serde(default)]
    pub name: String,
    /// Whether the endpoint serves CORS preflights.
    #[serde(default, alias = "allowCors")]
    pub allow_cors: bool,
}

/// The `sourceInfo` section.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SourceInfo {
    /// Attached source files.
    #[serde(default, alias = "sourceFiles")]
    pub source_files: Vec<SourceFile>,
}

/// One attached source file.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SourceFile {
    /// File path inside the config.
    #[serde(default, alias = "filePath")]
    pub file_path: String,
    /// Base64 file contents.
    #[serde(default, alias = "fileContents")]
    pub file_contents: String,
    /// File type tag.
    #[serde(default, alias = "fileType")]
    pub file_type: String,
}

/// One selector's resolved view: owning API, short method name, and the
/// HTTP binding when one exists.
#[derive(Clone, Debug)]
pub struct MethodEntry {
    /// Fully-qualified API name (everything before the last dot of the
    /// selector).
    pub api: String,
    /// Short method name.
    pub method: String,
    /// HTTP binding, if the selector has one.
    pub binding: Option<HttpBinding>,
}

impl MethodEntry {
    /// The gRPC wire path for this method.
    #[must_use]
    pub fn grpc_path(&self) -> String {
        format!("/{}/{}", self.api, self.method)
    }
}

/// Split a selector into `(api, method)` at the last dot.
pub(crate) fn split_selector(selector: &str) -> (String, String) {
    match selector.rsplit_once('.') {
        Some((api, method)) => (api.to_string(), method.to_string()),
        None => (String::new(), selector.to_string()),
    }
}

impl ServiceDescriptor {
    /// Decode a descriptor from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedDescriptor`] when the document does
    /// not parse.
    pub fn from_json(body: &str) -> ConfigResult<Self> {
        serde_json::from_str(body).map_err(ConfigError::malformed)
    }

    /// Name of the backend cluster: the first API's name.
    #[must_use]
    pub fn backend_cluster_name(&self) -> Option<&str> {
        self.apis.first().map(|api| api.name.as_str())
    }

    /// Endpoint-level `allow_cors`, taken from the endpoint whose name
    /// equals the service name.
    #[must_use]
    pub fn allow_cors(&self) -> bool {
        self.endpoints
            .iter()
            .any(|e| e.name == self.name && e.allow_cors)
    }

    /// Base64 proto file-descriptor set, when one is attached.
    #[must_use]
    pub fn proto_descriptor(&self) -> Option<&str> {
        self.source_info
            .source_files
            .iter()
            .find(|f| f.file_type == FILE_DESCRIPTOR_SET_PROTO && !f.file_contents.is_empty())
            .map(|f| f.file_contents.as_str())
    }

    /// The HTTP binding of a selector, if any.
    #[must_use]
    pub fn http_binding(&self, selector: &str) -> Option<HttpBinding> {
        self.http
            .rules
            .iter()
            .find(|r| r.selector == selector)
            .and_then(HttpRule::binding)
    }

    /// The selector index: every method declared under `apis[]` united
    /// with every `http.rules` selector, keyed by selector. `BTreeMap`
    /// iteration order makes downstream emission deterministic.
    #[must_use]
    pub fn method_index(&self) -> BTreeMap<String, MethodEntry> {
        let mut index = BTreeMap::new();
        for api in &self.apis {
            for method in &api.methods {
                let selector = format!("{}.{}", api.name, method.name);
                index.insert(
                    selector,
                    MethodEntry {
                        api: api.name.clone(),
                        method: method.name.clone(),
                        binding: None,
                    },
                );
            }
        }
        for rule in &self.http.rules {
            let Some(binding) = rule.binding() else {
                continue;
            };
            let entry = index.entry(rule.selector.clone()).or_insert_with(|| {
                let (api, method) = split_selector(&rule.selector);
                MethodEntry {
                    api,
                    method,
                    binding: None,
                }
            });
            entry.binding = Some(binding);
        }
        index
    }
}
