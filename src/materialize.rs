use crate::definition::TemplateDefinition;
use crate::error::Error;
use crate::registry::TemplateRegistry;
use crate::Dom;

///
/// What happened to a host element handed to [inject].
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Injection {
    /// A shadow root was attached and populated.
    Materialized,
    /// The element already had a shadow root, nothing was done.
    AlreadyHosting,
    /// No template is registered for the element's tag name.
    Unregistered,
    /// Attaching or populating failed, e.g. the element cannot host a shadow root.
    Failed,
}

///
/// Attach a shadow root to `host` and fill it with a copy of the template content.
///
/// The content is copied before anything is attached, so a host never ends
/// up with an empty shadow root because its template could not be cloned.
/// Declarative attributes of the template (mode, focus delegation, clonable,
/// serializable) reach the new shadow root through the definition's options,
/// which makes the result equivalent to parsing the template as a
/// declarative shadow root.
///
pub fn materialize<D: Dom>(
    definition: &TemplateDefinition<D>,
    host: &D::Element,
) -> Result<D::ShadowRoot, Error> {
    let content = definition.instantiate()?;
    let shadow_root = D::attach_shadow(host, definition.options())?;
    D::append_fragment(&shadow_root, content)?;

    Ok(shadow_root)
}

///
/// Materialize the registered template for `host`, at most once.
///
/// Never fails: every problem degrades to "no injection for this element".
///
pub fn inject<D: Dom>(registry: &TemplateRegistry<D>, host: &D::Element) -> Injection {
    if D::has_shadow_root(host) {
        return Injection::AlreadyHosting;
    }

    let tag_name = D::tag_name(host);

    // Looked up again here, the definition may be gone since the caller checked
    let definition = match registry.lookup(&tag_name) {
        Some(definition) => definition,
        None => return Injection::Unregistered,
    };

    match materialize(&definition, host) {
        Ok(_) => {
            tracing::debug!(%tag_name, mode = %definition.mode(), "materialized shadow root");
            Injection::Materialized
        }
        Err(Error::ShadowRootExists) => Injection::AlreadyHosting,
        Err(error) => {
            tracing::warn!(%tag_name, %error, "failed to materialize shadow root");
            Injection::Failed
        }
    }
}

#[cfg(all(test, feature = "server"))]
mod tests {
    use super::*;
    use crate::config::InjectorConfig;
    use crate::server::{Node, RcNode, ServerDom};
    use crate::ShadowRootMode;

    fn registry_with(tag_name: &str, mode: &str) -> TemplateRegistry<ServerDom> {
        let template = Node::create_element("template");
        template.set_attribute("sr-tagname", tag_name);
        template.set_attribute("sr-mode", mode);
        let p = Node::create_element("p");
        p.append_child(Node::create_text("hi".into())).unwrap();
        template.template_content().unwrap().append_child(p).unwrap();

        let registry = TemplateRegistry::new();
        registry
            .register_marker(&template, &InjectorConfig::default())
            .unwrap();
        registry
    }

    fn shadow_html(host: &RcNode) -> String {
        host.shadow_root().unwrap().to_string()
    }

    #[test]
    fn materializes_with_declared_mode() {
        let registry = registry_with("x-box", "closed");
        let host = Node::create_element("x-box");

        assert_eq!(inject(&registry, &host), Injection::Materialized);

        let shadow_root = host.shadow_root().unwrap();
        assert_eq!(shadow_root.shadow_root_mode(), Some(ShadowRootMode::Closed));
        assert_eq!(shadow_html(&host), "<p>hi</p>");
    }

    #[test]
    fn repeated_injection_does_not_duplicate_content() {
        let registry = registry_with("x-box", "open");
        let host = Node::create_element("x-box");

        assert_eq!(inject(&registry, &host), Injection::Materialized);
        assert_eq!(inject(&registry, &host), Injection::AlreadyHosting);
        assert_eq!(inject(&registry, &host), Injection::AlreadyHosting);

        assert_eq!(shadow_html(&host), "<p>hi</p>");
    }

    #[test]
    fn unregistered_and_incapable_hosts_are_no_ops() {
        let registry = registry_with("x-box", "open");

        let other = Node::create_element("y-box");
        assert_eq!(inject(&registry, &other), Injection::Unregistered);
        assert!(other.shadow_root().is_none());

        // <input> may never host a shadow root
        let registry = registry_with("input", "open");
        let input = Node::create_element("input");
        assert_eq!(inject(&registry, &input), Injection::Failed);
        assert!(input.shadow_root().is_none());
    }

    #[test]
    fn materialize_rejects_existing_shadow_root() {
        let registry = registry_with("x-box", "open");
        let definition = registry.lookup("x-box").unwrap();
        let host = Node::create_element("x-box");

        materialize(&definition, &host).unwrap();
        assert!(matches!(
            materialize(&definition, &host),
            Err(Error::ShadowRootExists)
        ));
        assert_eq!(shadow_html(&host), "<p>hi</p>");
    }
}
