use std::fmt;

/// How an element lookup is expressed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    /// Element whose own text, whitespace-normalised, equals `label` exactly.
    #[must_use]
    pub fn visible_text(label: &str) -> Self {
        Self::XPath(format!(
            "//*[normalize-space(text())={}]",
            xpath_literal(label)
        ))
    }

    /// Element with ARIA `role` whose accessible text or `aria-label` equals `label`.
    #[must_use]
    pub fn role(role: &str, label: &str) -> Self {
        let label = xpath_literal(label);
        Self::XPath(format!(
            "//*[@role={}][normalize-space(.)={label} or @aria-label={label}]",
            xpath_literal(role)
        ))
    }

    /// WebDriver `using` strategy name.
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Css(_) => "css selector",
            Self::XPath(_) => "xpath",
        }
    }

    #[must_use]
    pub fn expression(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) => s,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
        }
    }
}

/// Quote `value` as an XPath 1.0 string literal.
///
/// XPath has no escape syntax, so a value containing both quote kinds is
/// assembled with `concat()`.
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}
