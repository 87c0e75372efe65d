//! Declarative endpoint table and the generic dispatcher that runs it.
//!
//! # Design
//! Each block is one row: a name, a method, a path template, and the names
//! of inputs that belong in the query string even on write methods. A
//! single `Endpoint::invoke` turns block inputs into a request, so the
//! call sequence exists once instead of once per block.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::params::filter_defined;
use crate::transport::Transport;
use crate::types::{Params, RequestOptions};

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// One LaunchDarkly REST operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub name: &'static str,
    pub summary: &'static str,
    pub method: HttpMethod,
    /// Path template with `{placeholder}` segments.
    pub path: &'static str,
    /// Inputs sent as query parameters on methods that also carry a body.
    pub query: &'static [&'static str],
}

impl Endpoint {
    /// Placeholder names in the order they appear in the template.
    pub fn path_params(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut rest = self.path;
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            names.push(&rest[start + 1..start + len]);
            rest = &rest[start + len + 1..];
        }
        names
    }

    /// Substitute every placeholder with the percent-encoded input of the
    /// same name.
    pub fn render_path(&self, inputs: &Params) -> Result<String, ApiError> {
        let mut path = self.path.to_string();
        for name in self.path_params() {
            let segment = match inputs.get(name) {
                Some(Some(value)) => segment_text(name, value)?,
                _ => {
                    return Err(ApiError::Configuration(format!(
                        "{}: missing required path parameter `{name}`",
                        self.name
                    )))
                }
            };
            let encoded = utf8_percent_encode(&segment, SEGMENT).to_string();
            path = path.replace(&format!("{{{name}}}"), &encoded);
        }
        Ok(path)
    }

    /// Route the inputs not consumed by the path to the query string or the
    /// JSON body. Absent inputs are dropped, explicit nulls are kept.
    pub fn request_options(&self, inputs: &Params) -> RequestOptions {
        let path_params = self.path_params();
        let mut options = RequestOptions::new(self.method);
        let mut body = serde_json::Map::new();

        for (name, value) in filter_defined(inputs) {
            if path_params.contains(&name.as_str()) {
                continue;
            }
            if !self.method.has_body() || self.query.contains(&name.as_str()) {
                options.query.insert(name, Some(value));
            } else {
                body.insert(name, value);
            }
        }

        if !body.is_empty() {
            options.body = Some(Value::Object(body));
        }
        options
    }

    /// Run this endpoint with `inputs` and return the response JSON.
    pub fn invoke<T: Transport + ?Sized>(
        &self,
        client: &ApiClient,
        transport: &T,
        inputs: &Params,
    ) -> Result<Value, ApiError> {
        let path = self.render_path(inputs)?;
        let options = self.request_options(inputs);
        tracing::debug!(endpoint = self.name, "invoking block");
        client.execute(transport, &path, &options)
    }
}

fn segment_text(name: &str, value: &Value) -> Result<String, ApiError> {
    match value {
        // `.` and `..` would be collapsed as dot-segments and address another resource.
        Value::String(s) if s == "." || s == ".." => Err(ApiError::Configuration(format!(
            "path parameter `{name}` cannot be `{s}`"
        ))),
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(ApiError::Configuration(format!(
            "path parameter `{name}` must be a non-empty string or number"
        ))),
    }
}

macro_rules! endpoint {
    ($name:literal, $method:ident, $path:literal, $summary:literal) => {
        endpoint!($name, $method, $path, $summary, [])
    };
    ($name:literal, $method:ident, $path:literal, $summary:literal, [$($q:literal),*]) => {
        Endpoint {
            name: $name,
            summary: $summary,
            method: HttpMethod::$method,
            path: $path,
            query: &[$($q),*],
        }
    };
}

static ENDPOINTS: &[Endpoint] = &[
    // projects
    endpoint!("listProjects", Get, "/api/v2/projects", "List projects"),
    endpoint!("getProject", Get, "/api/v2/projects/{projectKey}", "Get a project"),
    endpoint!("createProject", Post, "/api/v2/projects", "Create a project"),
    endpoint!(
        "patchProject",
        Patch,
        "/api/v2/projects/{projectKey}",
        "Update a project with a JSON patch"
    ),
    endpoint!("deleteProject", Delete, "/api/v2/projects/{projectKey}", "Delete a project"),
    // environments
    endpoint!(
        "listEnvironments",
        Get,
        "/api/v2/projects/{projectKey}/environments",
        "List environments in a project"
    ),
    endpoint!(
        "getEnvironment",
        Get,
        "/api/v2/projects/{projectKey}/environments/{environmentKey}",
        "Get an environment"
    ),
    endpoint!(
        "createEnvironment",
        Post,
        "/api/v2/projects/{projectKey}/environments",
        "Create an environment"
    ),
    endpoint!(
        "deleteEnvironment",
        Delete,
        "/api/v2/projects/{projectKey}/environments/{environmentKey}",
        "Delete an environment"
    ),
    // flags
    endpoint!(
        "listFeatureFlags",
        Get,
        "/api/v2/flags/{projectKey}",
        "List feature flags in a project"
    ),
    endpoint!(
        "getFeatureFlag",
        Get,
        "/api/v2/flags/{projectKey}/{featureFlagKey}",
        "Get a feature flag"
    ),
    endpoint!(
        "createFeatureFlag",
        Post,
        "/api/v2/flags/{projectKey}",
        "Create a feature flag",
        ["clone"]
    ),
    endpoint!(
        "patchFeatureFlag",
        Patch,
        "/api/v2/flags/{projectKey}/{featureFlagKey}",
        "Update a feature flag",
        ["ignoreConflicts", "dryRun"]
    ),
    endpoint!(
        "copyFeatureFlag",
        Post,
        "/api/v2/flags/{projectKey}/{featureFlagKey}/copy",
        "Copy flag settings between environments"
    ),
    endpoint!(
        "deleteFeatureFlag",
        Delete,
        "/api/v2/flags/{projectKey}/{featureFlagKey}",
        "Delete a feature flag"
    ),
    endpoint!(
        "getFeatureFlagStatus",
        Get,
        "/api/v2/flag-statuses/{projectKey}/{environmentKey}/{featureFlagKey}",
        "Get a flag's status in one environment"
    ),
    endpoint!(
        "listFeatureFlagStatuses",
        Get,
        "/api/v2/flag-statuses/{projectKey}/{environmentKey}",
        "List flag statuses in one environment"
    ),
    // segments
    endpoint!(
        "listSegments",
        Get,
        "/api/v2/segments/{projectKey}/{environmentKey}",
        "List segments"
    ),
    endpoint!(
        "getSegment",
        Get,
        "/api/v2/segments/{projectKey}/{environmentKey}/{segmentKey}",
        "Get a segment"
    ),
    endpoint!(
        "createSegment",
        Post,
        "/api/v2/segments/{projectKey}/{environmentKey}",
        "Create a segment"
    ),
    endpoint!(
        "patchSegment",
        Patch,
        "/api/v2/segments/{projectKey}/{environmentKey}/{segmentKey}",
        "Update a segment"
    ),
    endpoint!(
        "deleteSegment",
        Delete,
        "/api/v2/segments/{projectKey}/{environmentKey}/{segmentKey}",
        "Delete a segment"
    ),
    // members
    endpoint!("listMembers", Get, "/api/v2/members", "List account members"),
    endpoint!("getMember", Get, "/api/v2/members/{id}", "Get an account member"),
    endpoint!("deleteMember", Delete, "/api/v2/members/{id}", "Delete an account member"),
    // audit log
    endpoint!("listAuditLogEntries", Get, "/api/v2/auditlog", "List audit log entries"),
    endpoint!("getAuditLogEntry", Get, "/api/v2/auditlog/{id}", "Get an audit log entry"),
    // metrics
    endpoint!("listMetrics", Get, "/api/v2/metrics/{projectKey}", "List metrics in a project"),
    endpoint!("getMetric", Get, "/api/v2/metrics/{projectKey}/{metricKey}", "Get a metric"),
    endpoint!(
        "deleteMetric",
        Delete,
        "/api/v2/metrics/{projectKey}/{metricKey}",
        "Delete a metric"
    ),
    // webhooks
    endpoint!("listWebhooks", Get, "/api/v2/webhooks", "List webhooks"),
    endpoint!("getWebhook", Get, "/api/v2/webhooks/{id}", "Get a webhook"),
    endpoint!("createWebhook", Post, "/api/v2/webhooks", "Create a webhook"),
    endpoint!("deleteWebhook", Delete, "/api/v2/webhooks/{id}", "Delete a webhook"),
];

/// Every endpoint in the catalog.
pub fn all() -> &'static [Endpoint] {
    ENDPOINTS
}

/// Look up an endpoint by block name.
pub fn find(name: &str) -> Option<&'static Endpoint> {
    ENDPOINTS.iter().find(|e| e.name == name)
}
