use crate::parser::{Arguments, DirectiveKind};
use clap::ValueEnum;
use eyre::Result;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(method|policy|user|aux)\}").expect("Invalid placeholder regex"));

/// Host-syntax templates that directives compile to.
///
/// Templates may use `{method}`, `{policy}`, `{user}` and `{aux}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Dialect {
    /// Resolves the enforcer; inserted once at the top of a rewritten template
    pub preamble: String,
    /// Conditional-open for a directive with only a policy expression
    pub open_simple: String,
    /// Conditional-open for a directive with auxiliary arguments
    pub open_complex: String,
    /// Conditional-close for any end marker
    pub close: String,
    /// Expression producing the authenticated user
    pub user: String,
    /// Joins auxiliary arguments inside `{aux}`
    pub aux_separator: String,
}

impl Dialect {
    /// PHP output for the Blade template engine
    pub fn blade() -> Self {
        Self {
            preamble: r#"<?php $enforcer = \App::make("policies"); ?>"#.to_string(),
            open_simple: "<?php if ($enforcer->{method}({policy}, {user}) === true): ?>".to_string(),
            open_complex: "<?php if ($enforcer->{method}({policy}, {user}, [{aux}]) === true) : ?>".to_string(),
            close: "<?php endif; ?>".to_string(),
            user: r"\Auth::user()".to_string(),
            aux_separator: ",".to_string(),
        }
    }

    /// Host-language-neutral pseudo syntax
    pub fn neutral() -> Self {
        Self {
            preamble: "LET enforcer = lookup(\"policies\")\n".to_string(),
            open_simple: "IF enforcer.{method}({policy}, {user}) == true THEN".to_string(),
            open_complex: "IF enforcer.{method}({policy}, {user}, [{aux}]) == true THEN".to_string(),
            close: "END IF".to_string(),
            user: "currentUser()".to_string(),
            aux_separator: ", ".to_string(),
        }
    }

    /// Check that every template carries the placeholders it needs
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("open-simple", &self.open_simple, &["method", "policy", "user"][..]),
            ("open-complex", &self.open_complex, &["method", "policy", "user", "aux"][..]),
        ];

        for (field, template, placeholders) in required {
            for placeholder in placeholders {
                if !template.contains(&format!("{{{placeholder}}}")) {
                    return Err(eyre::eyre!(
                        "Dialect template '{}' must contain {{{}}}",
                        field,
                        placeholder
                    ));
                }
            }
        }

        if self.close.trim().is_empty() {
            return Err(eyre::eyre!("Dialect template 'close' must not be empty"));
        }

        Ok(())
    }

    /// Render the conditional-open for a directive
    pub fn render_open(&self, kind: DirectiveKind, arguments: &Arguments<'_>) -> String {
        let (template, aux) = match arguments {
            Arguments::Simple { .. } => (&self.open_simple, String::new()),
            Arguments::Complex { aux, .. } => (&self.open_complex, aux.join(&self.aux_separator)),
        };

        // Single pass, so placeholder text inside an expression is never re-expanded
        PLACEHOLDER
            .replace_all(template, |captures: &Captures| match &captures[1] {
                "method" => kind.name(),
                "policy" => arguments.policy(),
                "user" => self.user.as_str(),
                _ => aux.as_str(),
            })
            .into_owned()
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Preset::default().dialect()
    }
}

/// Built-in dialects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// PHP for the Blade engine
    #[default]
    Blade,
    /// Host-language-neutral pseudo syntax
    Neutral,
}

impl Preset {
    pub fn dialect(self) -> Dialect {
        match self {
            Preset::Blade => Dialect::blade(),
            Preset::Neutral => Dialect::neutral(),
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Preset::Blade => write!(f, "blade"),
            Preset::Neutral => write!(f, "neutral"),
        }
    }
}

/// Per-template overrides applied on top of a preset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DialectOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_simple: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_complex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux_separator: Option<String>,
}

impl DialectOverrides {
    /// Set a field by its config name (e.g. `open-simple`)
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> Result<()> {
        let slot = match field {
            "preamble" => &mut self.preamble,
            "open-simple" => &mut self.open_simple,
            "open-complex" => &mut self.open_complex,
            "close" => &mut self.close,
            "user" => &mut self.user,
            "aux-separator" => &mut self.aux_separator,
            _ => return Err(eyre::eyre!("Unknown dialect field '{}'", field)),
        };
        *slot = Some(value.into());
        Ok(())
    }

    /// Fill unset fields from a base
    pub fn merge_with_base(self, base: Self) -> Self {
        Self {
            preamble: self.preamble.or(base.preamble),
            open_simple: self.open_simple.or(base.open_simple),
            open_complex: self.open_complex.or(base.open_complex),
            close: self.close.or(base.close),
            user: self.user.or(base.user),
            aux_separator: self.aux_separator.or(base.aux_separator),
        }
    }

    /// Apply the set fields to a dialect
    pub fn apply(&self, dialect: &mut Dialect) {
        let fields = [
            (&self.preamble, &mut dialect.preamble),
            (&self.open_simple, &mut dialect.open_simple),
            (&self.open_complex, &mut dialect.open_complex),
            (&self.close, &mut dialect.close),
            (&self.user, &mut dialect.user),
            (&self.aux_separator, &mut dialect.aux_separator),
        ];

        for (value, target) in fields {
            if let Some(value) = value {
                target.clone_from(value);
            }
        }
    }
}
