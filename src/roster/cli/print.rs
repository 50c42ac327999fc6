use super::styles::STYLES;
use chrono::{DateTime, Utc};
use roster::accounts::Account;
use roster::activity::Activity;
use roster::fields::FilterOption;
use roster::list::RecordCounter;
use roster::query::{ChipTone, FilterChip, Token};
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 16;
const DETAIL_WIDTH: usize = 28;

/// How a record is laid out on one terminal line.
pub(super) trait RowDisplay {
    fn primary(&self) -> String;
    fn detail(&self) -> String;
    fn when(&self) -> Option<DateTime<Utc>>;
    /// Short markers such as `admin` printed after the primary text.
    fn markers(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

impl RowDisplay for Account {
    fn primary(&self) -> String {
        self.name.clone()
    }

    fn detail(&self) -> String {
        if self.label.is_empty() {
            self.email.clone()
        } else {
            format!("{} ({})", self.email, self.label)
        }
    }

    fn when(&self) -> Option<DateTime<Utc>> {
        self.last_active
    }

    fn markers(&self) -> Vec<&'static str> {
        let mut markers = Vec::new();
        if self.admin {
            markers.push("admin");
        }
        if self.disabled {
            markers.push("disabled");
        }
        markers
    }
}

impl RowDisplay for Activity {
    fn primary(&self) -> String {
        self.title()
    }

    fn detail(&self) -> String {
        self.ip.clone()
    }

    fn when(&self) -> Option<DateTime<Utc>> {
        self.time
    }
}

pub(super) fn print_rows<T: RowDisplay>(rows: &[&T]) {
    for (i, row) in rows.iter().enumerate() {
        let idx = format!("{:>4}. ", i + 1);
        let markers = row.markers();
        let marker_text = if markers.is_empty() {
            String::new()
        } else {
            format!(" [{}]", markers.join(", "))
        };

        let fixed = idx.width() + DETAIL_WIDTH + TIME_WIDTH + 2;
        let available = LINE_WIDTH.saturating_sub(fixed);
        let primary = truncate_to_width(&format!("{}{}", row.primary(), marker_text), available);
        let padding = available.saturating_sub(primary.width());
        let detail = truncate_to_width(&row.detail(), DETAIL_WIDTH);
        let detail_padding = DETAIL_WIDTH.saturating_sub(detail.width());

        println!(
            "{}{}{} {}{} {}",
            STYLES.index.apply_to(idx),
            STYLES.title.apply_to(primary),
            " ".repeat(padding),
            STYLES.detail.apply_to(detail),
            " ".repeat(detail_padding),
            STYLES.time.apply_to(format_time_ago(row.when())),
        );
    }
}

pub(super) fn print_chips(chips: &[FilterChip]) {
    if chips.is_empty() {
        return;
    }
    let rendered: Vec<String> = chips
        .iter()
        .map(|chip| {
            let style = match chip.tone {
                ChipTone::Positive => &STYLES.positive,
                ChipTone::Critical => &STYLES.critical,
                ChipTone::Neutral => &STYLES.neutral,
            };
            format!("[{}]", style.apply_to(chip))
        })
        .collect();
    println!("Filters: {}", rendered.join(" "));
}

pub(super) fn print_counter(counter: RecordCounter) {
    println!("{}", STYLES.detail.apply_to(counter));
}

pub(super) fn print_not_found() {
    println!("No matching records.");
}

pub(super) fn print_warning(message: &str) {
    eprintln!("{} {}", STYLES.warning.apply_to("warning:"), message);
}

pub(super) fn print_filter_options(options: &[FilterOption]) {
    println!("{}", STYLES.heading.apply_to("Fields"));
    for option in options {
        let mut classes = Vec::new();
        if option.bool {
            classes.push("bool");
        }
        if option.string {
            classes.push("string");
        }
        if option.date {
            classes.push("date");
        }
        println!(
            "  {:<20} {:<24} {}",
            option.key,
            option.name,
            STYLES.detail.apply_to(classes.join("|"))
        );
        if let Some(description) = option.description {
            println!("  {:<20} {}", "", STYLES.detail.apply_to(description));
        }
    }
}

pub(super) fn print_capabilities(capabilities: &[(&'static str, bool)]) {
    if capabilities.is_empty() {
        return;
    }
    println!();
    println!("{}", STYLES.heading.apply_to("Integrations"));
    for (name, enabled) in capabilities {
        let state = if *enabled {
            STYLES.positive.apply_to("enabled")
        } else {
            STYLES.critical.apply_to("disabled")
        };
        println!("  {:<20} {}", name, state);
    }
}

pub(super) fn print_tokens(tokens: &[Token]) {
    println!("{}", STYLES.heading.apply_to("Tokens"));
    for token in tokens {
        let span = format!("{}..{}", token.span.start, token.span.end);
        println!("  {:<10} {}", STYLES.detail.apply_to(span), token.text);
    }
}

pub(super) fn print_terms(terms: &[String]) {
    println!("{}", STYLES.heading.apply_to("Terms"));
    for term in terms {
        println!("  {}", term);
    }
}

pub(super) fn print_predicates(predicates: &[(FilterChip, bool)]) {
    println!("{}", STYLES.heading.apply_to("Filters"));
    for (chip, local_only) in predicates {
        let scope = if *local_only { "local only" } else { "server" };
        println!(
            "  {:<30} {}",
            chip.to_string(),
            STYLES.detail.apply_to(format!("({}, {})", chip.field, scope))
        );
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(timestamp: Option<DateTime<Utc>>) -> String {
    let Some(timestamp) = timestamp else {
        return format!("{:>width$}", "never", width = TIME_WIDTH);
    };
    let duration = Utc::now().signed_duration_since(timestamp);
    let time_str = match duration.to_std() {
        Ok(elapsed) => Formatter::new().convert(elapsed),
        Err(_) => "in the future".to_string(),
    };
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}
