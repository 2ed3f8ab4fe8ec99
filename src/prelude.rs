pub use crate::AsNode;
pub use crate::Dom;
pub use crate::Observer;

pub use crate::config::{Detection, InjectorConfig};
pub use crate::detect::MarkerDetection;
pub use crate::injector::ShadowRootInjector;
pub use crate::materialize::Injection;
pub use crate::registry::TemplateRegistry;

pub use crate::ShadowRootMode;
pub use crate::TagName;
