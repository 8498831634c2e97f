use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use serde_json::Value;
use tracing::info;

use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::features::{FeatureHandlers, FeatureToggles};
use crate::middleware::{assemble_chain, Handler, Middleware, OperationContext};
use crate::router::{translate_path, Router};
use crate::security::SecurityProvider;
use crate::spec::{
    build_operations, derive_base_paths, extract_security_schemes, load_document,
    load_document_value,
};

enum DocSource {
    Inline(Value),
    Path(String),
}

/// Configuration intake and initialization for the adapter.
///
/// Collects the API document, the handler and consumer tables, security
/// providers, feature toggles, and any additional steps, then `build()` walks
/// every discovered operation, assembles its middleware chain, and registers
/// one route per base path on the returned [`Router`].
pub struct RouterBuilder {
    source: Option<DocSource>,
    base_paths: Vec<String>,
    consumers: Vec<(String, Arc<dyn Middleware>)>,
    handlers: HashMap<String, Arc<dyn Handler>>,
    providers: HashMap<String, Arc<dyn SecurityProvider>>,
    additional: Vec<Arc<dyn Middleware>>,
    toggles: FeatureToggles,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            source: None,
            base_paths: Vec::new(),
            consumers: Vec::new(),
            handlers: HashMap::new(),
            providers: HashMap::new(),
            additional: Vec::new(),
            toggles: FeatureToggles::default(),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Supply the API document inline.
    pub fn api_doc(mut self, doc: Value) -> Self {
        self.source = Some(DocSource::Inline(doc));
        self
    }

    /// Load the API document from a YAML or JSON file at build time.
    pub fn api_path(mut self, path: impl Into<String>) -> Self {
        self.source = Some(DocSource::Path(path.into()));
        self
    }

    /// Mount the API under a base path. May be called repeatedly; when never
    /// called, base paths are derived from the document's `servers` entries.
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_paths.push(base_path.into());
        self
    }

    /// Register a body-consumer step for a media type. An operation's chain
    /// includes the step when the operation declares that media type in its
    /// request body content; table order is preserved.
    pub fn consumer(
        mut self,
        media_type: impl Into<String>,
        step: impl Middleware + 'static,
    ) -> Self {
        self.consumers.push((media_type.into(), Arc::new(step)));
        self
    }

    /// Register the operation handler for an operation identifier.
    pub fn operation(mut self, operation_id: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.handlers.insert(operation_id.into(), Arc::new(handler));
        self
    }

    /// Register a security provider under a scheme name from the document's
    /// `components.securitySchemes`.
    pub fn security_provider(
        mut self,
        scheme_name: impl Into<String>,
        provider: impl SecurityProvider + 'static,
    ) -> Self {
        self.providers.insert(scheme_name.into(), Arc::new(provider));
        self
    }

    /// Append an externally supplied step, inserted verbatim into every
    /// operation's chain between request validation and security.
    pub fn additional_step(mut self, step: impl Middleware + 'static) -> Self {
        self.additional.push(Arc::new(step));
        self
    }

    /// Override the default feature toggles (all enabled).
    pub fn toggles(mut self, toggles: FeatureToggles) -> Self {
        self.toggles = toggles;
        self
    }

    /// Inject the diagnostics collaborator that receives response-validation
    /// failure reports. Defaults to structured `tracing` logging.
    pub fn diagnostics(mut self, diagnostics: impl Diagnostics + 'static) -> Self {
        self.diagnostics = Arc::new(diagnostics);
        self
    }

    /// Initialize: parse the document, discover operations, assemble chains,
    /// register routes.
    ///
    /// # Errors
    ///
    /// Fails when the document does not parse, an operation lacks an
    /// identifier or a registered handler, or a declared schema does not
    /// compile. Nothing is registered partially; the error names the culprit.
    pub fn build(self) -> anyhow::Result<Router> {
        let (spec, doc_value) = match &self.source {
            Some(DocSource::Inline(v)) => load_document_value(v.clone())?,
            Some(DocSource::Path(p)) => load_document(p)?,
            None => bail!("no API document configured; call api_doc() or api_path()"),
        };

        let operations = build_operations(&spec)?;
        let schemes = extract_security_schemes(&spec);
        let base_paths = if self.base_paths.is_empty() {
            derive_base_paths(&spec)
        } else {
            self.base_paths.clone()
        };
        let document = Arc::new(doc_value);

        let mut router = Router::new();
        for op in operations {
            let handler = self.handlers.get(&op.operation_id).cloned().ok_or_else(|| {
                anyhow!(
                    "no handler registered for operation `{}` ({} {})",
                    op.operation_id,
                    op.method,
                    op.path
                )
            })?;
            let features =
                FeatureHandlers::build(&op, &schemes, &self.providers, self.toggles)?;

            let octx = OperationContext {
                document: document.clone(),
                operation_doc: Arc::new(op.operation_doc),
                path: op.path,
                method: op.method,
                base_paths: base_paths.clone(),
                operation_id: op.operation_id,
                consumes: op.consumes,
                allows_features: op.allows_features,
                features,
                additional: self.additional.clone(),
                handler,
            };
            let steps = assemble_chain(&octx, &self.consumers, &self.diagnostics);

            for base_path in &octx.base_paths {
                router.register(
                    octx.method.clone(),
                    translate_path(base_path, &octx.path),
                    steps.clone(),
                    octx.handler.clone(),
                    octx.operation_id.clone(),
                );
            }
        }

        info!(routes = router.routes().len(), "Routing table initialized");
        Ok(router)
    }
}
