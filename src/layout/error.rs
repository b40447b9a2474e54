use thiserror::Error;

/// Configuration errors raised while laying out a diagram.
///
/// Every variant points at an inconsistency between the diagram declaration,
/// the template catalog and the router options. Search exhaustion is not an
/// error; it yields a fallback route instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouteError {
    #[error("connection {connection}: unknown component '{component}'")]
    UnknownComponent { connection: String, component: String },
    #[error("connection {connection}: component '{component}' has no port '{port}'")]
    UnknownPort {
        connection: String,
        component: String,
        port: String,
    },
    #[error("instance '{instance}' references unknown template '{template}'")]
    UnknownTemplate { instance: String, template: String },
    #[error("template '{template}' is malformed: {reason}")]
    MalformedTemplate { template: String, reason: String },
    #[error("instance '{instance}' has a degenerate placement")]
    DegeneratePlacement { instance: String },
    #[error("duplicate route key '{key}'")]
    DuplicateRoute { key: String },
    #[error("polyline '{id}' needs at least two finite points")]
    InvalidPolyline { id: String },
    #[error("invalid router options: {reason}")]
    InvalidRouterOptions { reason: String },
}
