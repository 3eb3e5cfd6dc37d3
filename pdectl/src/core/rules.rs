//! Import rewrite rules and their pure application to source text.
//!
//! A rule matches an import statement *prefix*: the `from`/`import` keyword at
//! the start of a line (after indentation) followed by a module path at a word
//! boundary. `from core.utils.comparison import x` matches the `core.utils`
//! rule, `from core.utilsx import y` and `# from core.utils` do not. `import`
//! rules apply to every name of a comma-separated list (`import os, core.utils`).

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

/// Keyword that opens the import statement a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKeyword {
    From,
    Import,
}

impl ImportKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportKeyword::From => "from",
            ImportKeyword::Import => "import",
        }
    }
}

/// One textual substitution: `<keyword> <from>` becomes `<keyword> <to>`.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub keyword: ImportKeyword,
    pub from: String,
    pub to: String,
    regex: Regex,
}

impl RewriteRule {
    pub fn new(keyword: ImportKeyword, from: &str, to: &str) -> Result<Self, regex::Error> {
        let pattern = match keyword {
            ImportKeyword::From => format!(r"(?m)^([ \t]*from[ \t]+){}\b", regex::escape(from)),
            // Whole name list up to a trailing comment; names are matched in `rewrite_names`.
            ImportKeyword::Import => r"(?m)^([ \t]*import[ \t]+)([^#\r\n]*)".to_string(),
        };
        Ok(Self {
            keyword,
            from: from.to_string(),
            to: to.to_string(),
            regex: Regex::new(&pattern)?,
        })
    }

    /// True if any line of `text` starts with an import this rule rewrites.
    pub fn is_match(&self, text: &str) -> bool {
        match self.keyword {
            ImportKeyword::From => self.regex.is_match(text),
            ImportKeyword::Import => self
                .regex
                .captures_iter(text)
                .any(|caps| self.rewrite_names(&caps[2]).1 > 0),
        }
    }

    fn apply<'t>(&self, text: &'t str) -> (Cow<'t, str>, usize) {
        let mut count = 0;
        let rewritten = match self.keyword {
            ImportKeyword::From => self.regex.replace_all(text, |caps: &Captures<'_>| {
                count += 1;
                format!("{}{}", &caps[1], self.to)
            }),
            ImportKeyword::Import => self.regex.replace_all(text, |caps: &Captures<'_>| {
                let (names, replaced) = self.rewrite_names(&caps[2]);
                count += replaced;
                format!("{}{names}", &caps[1])
            }),
        };
        if count == 0 {
            return (Cow::Borrowed(text), 0);
        }
        (Cow::Owned(rewritten.into_owned()), count)
    }

    /// Rewrite each name of `import a, b as c, ...` that starts with `from`.
    fn rewrite_names(&self, names: &str) -> (String, usize) {
        let mut replaced = 0;
        let rewritten: Vec<String> = names
            .split(',')
            .map(|item| {
                let name = item.trim_start();
                let indent = &item[..item.len() - name.len()];
                match name.strip_prefix(self.from.as_str()) {
                    Some(rest) if !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_') => {
                        replaced += 1;
                        format!("{indent}{}{rest}", self.to)
                    }
                    _ => item.to_string(),
                }
            })
            .collect();
        (rewritten.join(","), replaced)
    }
}

/// Ordered list of rules; each rule sees the output of the previous one.
#[derive(Debug, Clone)]
pub struct RuleSet {
    name: &'static str,
    rules: Vec<RewriteRule>,
}

/// Result of applying a [`RuleSet`] to a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub replacements: usize,
}

impl Rewrite {
    pub fn changed(&self) -> bool {
        self.replacements > 0
    }
}

static UTILS_RELOCATION: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::build("utils-relocation", &utils_relocation_table())
        .expect("built-in utils relocation rules are valid")
});

static PACKAGE_MIGRATION: LazyLock<RuleSet> = LazyLock::new(|| {
    let mut table = utils_relocation_table();
    table.extend([
        (ImportKeyword::From, "frontend", "interfaces.streamlit"),
        (ImportKeyword::From, "backend", "core"),
        (ImportKeyword::From, "layout", "interfaces.streamlit.layout"),
        (ImportKeyword::From, "components", "interfaces.streamlit.components"),
        (ImportKeyword::From, "styles", "interfaces.streamlit.styles"),
        (ImportKeyword::From, "state", "interfaces.streamlit.state"),
        (ImportKeyword::From, "controllers", "interfaces.streamlit.controllers"),
        (ImportKeyword::From, "services", "interfaces.streamlit.services"),
        (ImportKeyword::From, "views", "interfaces.streamlit.views"),
        (ImportKeyword::From, "equations", "core.equations"),
        (ImportKeyword::From, "solvers", "core.solvers"),
        (ImportKeyword::From, "utils", "core.solvers"),
    ]);
    RuleSet::build("package-migration", &table).expect("built-in migration rules are valid")
});

fn utils_relocation_table() -> Vec<(ImportKeyword, &'static str, &'static str)> {
    vec![
        (ImportKeyword::From, "core.utils", "core.solvers"),
        (ImportKeyword::Import, "core.utils", "core.solvers"),
        (ImportKeyword::From, "backend.utils", "core.solvers"),
        (ImportKeyword::Import, "backend.utils", "core.solvers"),
    ]
}

impl RuleSet {
    fn build(
        name: &'static str,
        table: &[(ImportKeyword, &str, &str)],
    ) -> Result<Self, regex::Error> {
        let rules = table
            .iter()
            .map(|(keyword, from, to)| RewriteRule::new(*keyword, from, to))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { name, rules })
    }

    /// The four rules moving `core.utils` / `backend.utils` to `core.solvers`.
    pub fn utils_relocation() -> &'static RuleSet {
        &UTILS_RELOCATION
    }

    /// The full package relocation table (`frontend` -> `interfaces.streamlit`,
    /// `backend` -> `core`, bare sub-package imports, ...), utils relocation first.
    pub fn package_migration() -> &'static RuleSet {
        &PACKAGE_MIGRATION
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Apply every rule in order.
    pub fn apply(&self, text: &str) -> Rewrite {
        let mut current = Cow::Borrowed(text);
        let mut replacements = 0;
        for rule in &self.rules {
            let (next, count) = rule.apply(&current);
            if count > 0 {
                replacements += count;
                current = Cow::Owned(next.into_owned());
            }
        }
        Rewrite {
            text: current.into_owned(),
            replacements,
        }
    }

    /// 1-based line numbers of lines still matched by any rule.
    pub fn stale_lines(&self, text: &str) -> Vec<usize> {
        text.lines()
            .enumerate()
            .filter(|(_, line)| self.rules.iter().any(|rule| rule.is_match(line)))
            .map(|(idx, _)| idx + 1)
            .collect()
    }
}
