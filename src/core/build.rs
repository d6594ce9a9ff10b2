use crate::core::context::BuildContext;
use crate::core::{emitter, templates};
use crate::domain::model::BuildArtifacts;
use crate::domain::ports::{OutputLayout, ScriptSink};
use crate::utils::error::Result;

/// Runs the generation pass over a fully declared context and hands the
/// artifacts to a sink. Declaration must be finished before this runs.
pub struct BuildEngine<S: ScriptSink> {
    context: BuildContext,
    sink: S,
}

impl<S: ScriptSink> BuildEngine<S> {
    pub fn new(context: BuildContext, sink: S) -> Self {
        Self { context, sink }
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    pub fn generate(&self) -> Result<BuildArtifacts> {
        tracing::info!("Generating boot commands for {} port(s)", self.context.ports().len());
        let startup_script = emitter::emit_script(&self.context);

        tracing::info!("Rendering {} template binding(s)", self.context.bindings().len());
        let substitutions = templates::render_substitutions(self.context.bindings());

        let manifest = self.context.modules().link_manifest()?;
        tracing::info!(
            "Link order: {:?} (external: {:?})",
            manifest.modules,
            manifest.external
        );

        Ok(BuildArtifacts {
            startup_script,
            substitutions,
            manifest,
        })
    }

    /// Generates everything first, then writes. A failed generation writes nothing.
    pub fn run(&self, layout: &impl OutputLayout) -> Result<Vec<String>> {
        let artifacts = self.generate()?;
        let manifest_json = serde_json::to_string_pretty(&artifacts.manifest)?;

        let mut written = Vec::new();
        written.push(
            self.sink
                .write_file(layout.startup_script(), artifacts.startup_script.as_bytes())?,
        );
        if !artifacts.substitutions.is_empty() {
            written.push(
                self.sink
                    .write_file(layout.substitutions(), artifacts.substitutions.as_bytes())?,
            );
        }
        written.push(self.sink.write_file(layout.manifest(), manifest_json.as_bytes())?);

        for path in &written {
            tracing::info!("Wrote {}", path);
        }
        Ok(written)
    }
}
