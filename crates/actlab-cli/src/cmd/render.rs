use actlab_core::{io, markdown};
use anyhow::Context;
use std::path::Path;

pub fn run(file: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read '{}'", file.display()))?;
    let html = markdown::to_html(&text);
    match output {
        Some(out) => {
            io::atomic_write(out, html.as_bytes())
                .with_context(|| format!("cannot write '{}'", out.display()))?;
            println!("wrote {}", out.display());
        }
        None => print!("{html}"),
    }
    Ok(())
}
