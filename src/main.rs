use std::{io, sync::LazyLock};

use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};
use notation::{Document, NotationCache, Result};
use polygraph::{Catalog, CatalogHandle};
use rustyline::DefaultEditor;
use sequence_view::{LabelInfo, Reducer};
use tracing_subscriber::EnvFilter;

static CATALOG: LazyLock<CatalogHandle> = LazyLock::new(CatalogHandle::default);
static CACHE: LazyLock<NotationCache> = LazyLock::new(NotationCache::new);

fn main() {
    // NOTE: Logs go to `stderr`, and are filtered with `RUST_LOG`, like `RUST_LOG=notation=trace`
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut rl = DefaultEditor::new().unwrap();
    while let Ok(notation) = rl.readline("Notation: ") {
        rl.add_history_entry(&notation).unwrap();
        match notation_info(&notation) {
            Ok(info) => print!("{info}"),
            Err(diagnostic) => render_error(*diagnostic),
        }
    }
}

fn notation_info(notation: &str) -> Result<String> {
    let mut document = CACHE.set_notation(notation, &CATALOG)?;
    let catalog = CATALOG.snapshot();

    let mut buf = String::new();
    buf.push_str(&views(&document, &catalog));
    let encoded = document.encode(&catalog)?;
    buf.push_str(&format!("Encoded: {encoded}\n\n"));
    Ok(buf)
}

fn views(document: &Document, catalog: &dyn Catalog) -> String {
    let (graph, manager) = (document.graph(), document.manager());
    let mut buf = String::new();
    for (polymer, view) in Reducer::new(catalog).reduce_document(graph, manager) {
        let marker = manager.polymer(polymer).map_or("?", |entry| entry.marker());
        let Some(view) = view else {
            buf.push_str(&format!("{marker}: (no view)\n"));
            continue;
        };

        buf.push_str(&format!("{marker}: {}\n", view.sequence()));
        for node in view.nodes() {
            buf.push_str(&format!("  {:<4}{}\n", node.text(), describe(node.label())));
        }
    }
    buf
}

fn describe(label: &LabelInfo) -> String {
    let mut parts = Vec::new();
    if let Some(number) = label.position_number {
        parts.push(format!("#{number}"));
    }
    if let Some(terminal) = label.terminal_label {
        parts.push(terminal.to_string());
    }
    if let Some(linker) = &label.left_linker {
        parts.push(format!("{linker}-"));
    }
    if let Some(linker) = &label.right_linker {
        parts.push(format!("-{linker}"));
    }
    if let Some(linker) = &label.combined_linker {
        parts.push(linker.clone());
    }
    if label.flipped {
        parts.push("flipped".to_owned());
    }
    parts.join(" ")
}

fn render_error(diagnostic: impl Into<Box<dyn Diagnostic + 'static>>) {
    let mut buf = String::new();
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode())
        .render_report(&mut buf, diagnostic.into().as_ref())
        .unwrap();
    println!("{buf}");
}
