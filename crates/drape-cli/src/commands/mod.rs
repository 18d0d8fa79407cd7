// crates/drape-cli/src/commands/mod.rs
//
// Command module declarations and the shared command context.

pub mod catalog;
pub mod event;
pub mod mask;
pub mod recommend;
pub mod status;

use drape_store::DataLayout;

use crate::output::OutputFormat;

/// Global options every command sees.
#[derive(Debug, Clone)]
pub struct Context {
    /// Daemon RPC endpoint, e.g. `http://localhost:50051`.
    pub rpc: String,
    /// Data directory with `~` expanded.
    pub data_dir: String,
    pub format: OutputFormat,
}

impl Context {
    pub fn new(rpc: &str, data_dir: &str, format: OutputFormat) -> Self {
        Self {
            rpc: rpc.to_string(),
            data_dir: expand_tilde(data_dir),
            format,
        }
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_dir)
    }
}

/// Expand `~` at the start of a path to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_expands_data_dir() {
        let ctx = Context::new("http://localhost:50051", "/srv/drape", OutputFormat::Table);
        assert_eq!(ctx.layout().root(), std::path::Path::new("/srv/drape"));
        if let Some(home) = dirs::home_dir() {
            let ctx = Context::new("http://localhost:50051", "~/d", OutputFormat::Json);
            assert_eq!(ctx.data_dir, format!("{}/d", home.display()));
        }
    }
}
