use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};

pub fn render_miette(diagnostic: impl Diagnostic) -> String {
    let mut out = String::new();
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
        .with_width(80)
        .render_report(&mut out, &diagnostic)
        .unwrap();
    out
}
