#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("node is not an element")]
    NotAnElement,

    #[error("<{0}> cannot host a shadow root")]
    InvalidShadowHost(String),

    #[error("element already hosts a shadow root")]
    ShadowRootExists,

    #[error("invalid shadow root mode {0:?}")]
    InvalidMode(String),

    #[error("template has no content")]
    MissingContent,

    #[error("node cannot be inserted at this position")]
    HierarchyRequest,

    #[error("reference node is not a child of this node")]
    NotFound,

    #[error("javascript error: {0}")]
    Js(String),
}
