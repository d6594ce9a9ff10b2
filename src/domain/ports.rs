use crate::utils::error::Result;

/// Destination for generated artifacts.
pub trait ScriptSink {
    fn write_file(&self, path: &str, data: &[u8]) -> Result<String>;
}

/// Output file names for one build.
pub trait OutputLayout {
    fn startup_script(&self) -> &str;
    fn substitutions(&self) -> &str;
    fn manifest(&self) -> &str;
}
