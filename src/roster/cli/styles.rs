use console::Style;
use once_cell::sync::Lazy;

pub struct Styles {
    pub index: Style,
    pub title: Style,
    pub detail: Style,
    pub time: Style,
    pub heading: Style,
    pub positive: Style,
    pub critical: Style,
    pub neutral: Style,
    pub warning: Style,
}

pub static STYLES: Lazy<Styles> = Lazy::new(|| Styles {
    index: Style::new().yellow(),
    title: Style::new().bold(),
    detail: Style::new().dim(),
    time: Style::new().color256(246).italic(),
    heading: Style::new().bold().underlined(),
    positive: Style::new().green(),
    critical: Style::new().red(),
    neutral: Style::new().cyan(),
    warning: Style::new().yellow().bold(),
});
