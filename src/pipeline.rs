//! Template pipeline - one template in, one document out
//!
//! A run is all-or-nothing: the template executes against a fresh context,
//! and the sink sees bytes only after the template returned `Ok` and the
//! whole document rendered.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::document::Document;
use crate::error::Result;
use crate::hashing::sha256_hex;
use crate::reference::Category;
use crate::registry::{RunConfig, RunContext};

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static DOCUMENTS_WRITTEN: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_documents_written() -> u32 {
    DOCUMENTS_WRITTEN.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_documents_written() {
    DOCUMENTS_WRITTEN.store(0, Ordering::SeqCst);
}

/// Run `template` and return the rendered document text.
pub fn render_to_string<F>(config: RunConfig, template: F) -> Result<String>
where
    F: FnOnce(&mut RunContext) -> Result<()>,
{
    let mut ctx = RunContext::with_config(config);
    template(&mut ctx)?;

    let text = Document::from_context(&ctx).to_json_string()?;
    tracing::debug!(
        "Rendered {} resources, {} data sources",
        ctx.len(Category::Resource),
        ctx.len(Category::DataSource)
    );
    Ok(text)
}

/// Run `template` and write the document to `sink`. Returns the SHA-256
/// digest of the bytes written.
pub fn render_with_config<F, W>(config: RunConfig, template: F, sink: &mut W) -> Result<String>
where
    F: FnOnce(&mut RunContext) -> Result<()>,
    W: Write + ?Sized,
{
    let text = render_to_string(config, template)?;

    sink.write_all(text.as_bytes())?;
    sink.flush()?;

    #[cfg(feature = "test-hooks")]
    DOCUMENTS_WRITTEN.fetch_add(1, Ordering::SeqCst);

    let digest = sha256_hex(text.as_bytes());
    tracing::info!("Wrote document, digest {}", digest);
    Ok(digest)
}

/// Run `template` with the default configuration and write the document to `sink`.
pub fn render<F, W>(template: F, sink: &mut W) -> Result<String>
where
    F: FnOnce(&mut RunContext) -> Result<()>,
    W: Write + ?Sized,
{
    render_with_config(RunConfig::default(), template, sink)
}

/// Like [`render_with_config`], but the file is only created once the
/// document rendered.
pub fn render_to_path<F>(config: RunConfig, template: F, path: &Path) -> Result<String>
where
    F: FnOnce(&mut RunContext) -> Result<()>,
{
    let text = render_to_string(config, template)?;

    fs::write(path, &text)?;

    #[cfg(feature = "test-hooks")]
    DOCUMENTS_WRITTEN.fetch_add(1, Ordering::SeqCst);

    let digest = sha256_hex(text.as_bytes());
    tracing::info!("Wrote {}, digest {}", path.display(), digest);
    Ok(digest)
}
