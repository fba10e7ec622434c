//! Content abstraction engine.
//!
//! Replaces concrete, potentially sensitive references (paths, URLs, e-mail
//! addresses, credentials, IPs, UUIDs) with semantic placeholders and scores
//! how much had to be replaced.
//!
//! Rules run in a fixed order, most specific first, so a credential whose
//! value is a URL is tagged as a credential and not as a URL. Placeholders
//! never match any rule, which makes processing idempotent.

use crate::models::config::OutputConfig;
use crate::Result;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Category of sensitive content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    PrivateKey,
    Token,
    Credential,
    DatabaseConnection,
    Url,
    Email,
    Uuid,
    IpAddress,
    UserHome,
    SystemConfig,
    FilePath,
    RelativePath,
    Custom,
}

impl PatternCategory {
    /// Safety-score penalty per match.
    pub fn default_weight(self) -> f64 {
        match self {
            PatternCategory::PrivateKey | PatternCategory::Token | PatternCategory::Credential => {
                0.25
            }
            PatternCategory::DatabaseConnection => 0.20,
            PatternCategory::Email => 0.15,
            PatternCategory::IpAddress => 0.10,
            PatternCategory::UserHome | PatternCategory::SystemConfig => 0.08,
            PatternCategory::Url | PatternCategory::FilePath | PatternCategory::RelativePath => {
                0.05
            }
            PatternCategory::Uuid => 0.03,
            PatternCategory::Custom => 0.10,
        }
    }
}

impl fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatternCategory::PrivateKey => "private_key",
            PatternCategory::Token => "token",
            PatternCategory::Credential => "credential",
            PatternCategory::DatabaseConnection => "database_connection",
            PatternCategory::Url => "url",
            PatternCategory::Email => "email",
            PatternCategory::Uuid => "uuid",
            PatternCategory::IpAddress => "ip_address",
            PatternCategory::UserHome => "user_home",
            PatternCategory::SystemConfig => "system_config",
            PatternCategory::FilePath => "file_path",
            PatternCategory::RelativePath => "relative_path",
            PatternCategory::Custom => "custom",
        };
        write!(f, "{}", name)
    }
}

/// Characters that may precede a path. Captured as `${1}` and kept.
const PATH_PREFIX: &str = r#"(?m)(^|[\s"'(=,:\[])"#;

/// Built-in rule definitions: name, category, pattern, replacement, digit guard.
///
/// Order matters: earlier rules win on overlapping text.
fn standard_rule_specs() -> Vec<(&'static str, PatternCategory, String, &'static str, bool)> {
    vec![
        (
            "private_key_block",
            PatternCategory::PrivateKey,
            r"(?s)-----BEGIN [A-Z ]*PRIVATE KEY-----.*?-----END [A-Z ]*PRIVATE KEY-----"
                .to_string(),
            "<private_key>",
            false,
        ),
        (
            "aws_access_key_id",
            PatternCategory::Token,
            r"\b(?:AKIA|ASIA)[0-9A-Z]{16}\b".to_string(),
            "<access_key_id>",
            false,
        ),
        (
            "known_token",
            PatternCategory::Token,
            concat!(
                r"\b(?:gh[pousr]_[A-Za-z0-9_]{36,}|github_pat_[A-Za-z0-9_]{22,}",
                r"|xox[baprs]-[A-Za-z0-9-]{10,}|sk-(?:ant-)?[A-Za-z0-9_-]{20,}",
                r"|eyJ[A-Za-z0-9_-]+\.eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+)"
            )
            .to_string(),
            "<token>",
            false,
        ),
        (
            "bearer_token",
            PatternCategory::Token,
            r"(?i)\b(bearer\s+)[A-Za-z0-9_\-.=+/]{8,}".to_string(),
            "${1}<token>",
            false,
        ),
        (
            "credential_assignment",
            PatternCategory::Credential,
            concat!(
                r"(?i)\b((?:[a-z0-9]+[_.-])*(?:api[_-]?key|apikey|access[_-]?token|auth[_-]?token",
                r"|refresh[_-]?token|token|client[_-]?secret|secret[_-]?access[_-]?key|secret[_-]?key",
                r"|secret|password|passwd|pwd|private[_-]?key|access[_-]?key[_-]?id|access[_-]?key))",
                r#"(["']?\s*[=:]\s*["']?)([^\s"',;<>{}\[\]]+)"#
            )
            .to_string(),
            "${1}${2}<credential>",
            false,
        ),
        (
            "database_connection",
            PatternCategory::DatabaseConnection,
            r#"(?i)\b(?:postgres(?:ql)?|mysql|mariadb|mongodb(?:\+srv)?|rediss?|amqps?|mssql|sqlserver)://[^\s"'<>]+"#
                .to_string(),
            "<database_connection>",
            false,
        ),
        (
            "url",
            PatternCategory::Url,
            r#"(?i)\b(?:https?|ftps?|sftp|wss?)://[^\s"'<>]+"#.to_string(),
            "<url>",
            false,
        ),
        (
            "email",
            PatternCategory::Email,
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b".to_string(),
            "<email>",
            false,
        ),
        (
            "uuid",
            PatternCategory::Uuid,
            r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b"
                .to_string(),
            "<uuid>",
            false,
        ),
        (
            "ipv4",
            PatternCategory::IpAddress,
            r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b"
                .to_string(),
            "<ip_address>",
            false,
        ),
        (
            "ipv6",
            PatternCategory::IpAddress,
            r"(?i)\b(?:[0-9a-f]{1,4}:){7}[0-9a-f]{1,4}\b|\b(?:[0-9a-f]{1,4}:){1,6}(?::[0-9a-f]{1,4}){1,6}\b"
                .to_string(),
            "<ip_address>",
            true,
        ),
        (
            // `::1`, `fe80::`, `2001:db8::`. Bare `::` has no digit and is left alone.
            "ipv6_compressed",
            PatternCategory::IpAddress,
            r#"(?im)(^|[\s"'(=,\[])(::(?:[0-9a-f]{1,4}:){0,6}[0-9a-f]{1,4}\b|(?:[0-9a-f]{1,4}:){1,7}:\B)"#
                .to_string(),
            "${1}<ip_address>",
            true,
        ),
        (
            // Directory segments may contain spaces; the last segment ends at whitespace.
            "windows_path",
            PatternCategory::FilePath,
            r#"\b[A-Za-z]:\\(?:[^\\\s"'<>|*?]+(?: [^\\\s"'<>|*?]+)*\\)*[^\\\s"'<>|*?]*"#.to_string(),
            "<file_path>",
            false,
        ),
        (
            "user_home",
            PatternCategory::UserHome,
            format!(r#"{}((?:/home/|/Users/|/root/|~/)[^\s"'<>)\],;]*)"#, PATH_PREFIX),
            "${1}<user_home>",
            false,
        ),
        (
            "system_config",
            PatternCategory::SystemConfig,
            format!(r#"{}(/etc/[^\s"'<>)\],;]*)"#, PATH_PREFIX),
            "${1}<system_config>",
            false,
        ),
        (
            "absolute_path",
            PatternCategory::FilePath,
            format!(r"{}(/[\w.\-]+(?:/[\w.\-]*)*)", PATH_PREFIX),
            "${1}<file_path>",
            false,
        ),
        (
            "relative_traversal",
            PatternCategory::RelativePath,
            format!(r"{}((?:\.\.?/)+[\w.\-/]*)", PATH_PREFIX),
            "${1}<relative_path>",
            false,
        ),
        (
            "relative_file_path",
            PatternCategory::FilePath,
            format!(r"{}([\w\-]+(?:/[\w.\-]+)+\.[A-Za-z0-9]{{1,8}})\b", PATH_PREFIX),
            "${1}<file_path>",
            false,
        ),
    ]
}

/// A single substitution rule.
#[derive(Debug, Clone)]
pub struct AbstractionRule {
    name: String,
    category: PatternCategory,
    regex: Regex,
    replacement: String,
    weight: f64,
    requires_digit: bool,
}

impl AbstractionRule {
    /// Compile a rule. `replacement` may reference capture groups (`${1}`).
    pub fn new(
        name: &str,
        category: PatternCategory,
        pattern: &str,
        replacement: &str,
    ) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            name: name.to_string(),
            category,
            regex: Regex::new(pattern)?,
            replacement: replacement.to_string(),
            weight: category.default_weight(),
            requires_digit: false,
        })
    }

    /// Override the score penalty.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight.max(0.0);
        self
    }

    /// Only count matches that contain an ASCII digit.
    pub fn requiring_digit(mut self) -> Self {
        self.requires_digit = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> PatternCategory {
        self.category
    }

    /// Apply the rule, returning the new text and the number of substitutions.
    fn apply(&self, text: &str) -> (String, usize) {
        let mut count = 0;
        let replaced = self.regex.replace_all(text, |caps: &Captures<'_>| {
            let matched = caps.get(0).map_or("", |m| m.as_str());
            if self.requires_digit && !matched.bytes().any(|b| b.is_ascii_digit()) {
                return matched.to_string();
            }

            let mut expanded = String::new();
            caps.expand(&self.replacement, &mut expanded);
            if expanded != matched {
                count += 1;
            }
            expanded
        });
        (replaced.into_owned(), count)
    }
}

/// Ordered set of rules handed to the engine.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    rules: Vec<AbstractionRule>,
}

impl PatternTable {
    /// An empty table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in rules.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for (name, category, pattern, replacement, requires_digit) in standard_rule_specs() {
            match AbstractionRule::new(name, category, &pattern, replacement) {
                Ok(rule) if requires_digit => table.push(rule.requiring_digit()),
                Ok(rule) => table.push(rule),
                Err(e) => tracing::warn!("Skipping abstraction rule {}: {}", name, e),
            }
        }
        table
    }

    /// Append a rule after the existing ones.
    pub fn push(&mut self, rule: AbstractionRule) {
        self.rules.push(rule);
    }

    /// Append a user-defined rule.
    pub fn add_custom(
        &mut self,
        name: &str,
        pattern: &str,
        placeholder: &str,
        weight: f64,
    ) -> Result<()> {
        let rule = AbstractionRule::new(name, PatternCategory::Custom, pattern, placeholder)
            .map_err(|e| crate::Error::Config(format!("pattern '{}': {}", name, e)))?
            .with_weight(weight);
        self.push(rule);
        Ok(())
    }

    pub fn rules(&self) -> &[AbstractionRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Result of abstracting a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbstractionResult {
    /// Text after substitution.
    pub content: String,
    /// 1.0 means nothing sensitive was found.
    pub safety_score: f64,
    pub has_changes: bool,
    /// Total substitutions.
    pub mappings: usize,
    /// Substitutions per category.
    pub categories: BTreeMap<PatternCategory, usize>,
}

impl AbstractionResult {
    fn unchanged(content: String) -> Self {
        Self {
            content,
            safety_score: 1.0,
            has_changes: false,
            mappings: 0,
            categories: BTreeMap::new(),
        }
    }

    /// Whether the score meets the threshold.
    pub fn is_safe(&self, threshold: f64) -> bool {
        self.safety_score >= threshold
    }
}

/// Pattern-based content abstraction.
///
/// Holds no mutable state, so one engine can be shared across threads.
#[derive(Debug, Clone)]
pub struct AbstractionEngine {
    table: PatternTable,
}

impl AbstractionEngine {
    /// Create an engine over the given table.
    pub fn new(table: PatternTable) -> Self {
        Self { table }
    }

    /// Built-in rules plus the custom rules from the output config.
    ///
    /// Invalid custom patterns are skipped with a warning.
    pub fn from_config(config: &OutputConfig) -> Self {
        let mut table = PatternTable::standard();
        for custom in &config.custom_patterns {
            if let Err(e) =
                table.add_custom(&custom.name, &custom.pattern, &custom.placeholder, custom.weight)
            {
                tracing::warn!("Skipping custom pattern: {}", e);
            }
        }
        Self::new(table)
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Abstract `text`.
    pub fn process(&self, text: &str) -> AbstractionResult {
        if text.is_empty() {
            return AbstractionResult::unchanged(String::new());
        }

        let mut content = text.to_string();
        let mut penalty = 0.0;
        let mut mappings = 0;
        let mut categories = BTreeMap::new();

        for rule in self.table.rules() {
            let (next, count) = rule.apply(&content);
            if count > 0 {
                penalty += rule.weight * count as f64;
                mappings += count;
                *categories.entry(rule.category).or_insert(0) += count;
                tracing::trace!("Rule {} replaced {} match(es)", rule.name, count);
            }
            content = next;
        }

        AbstractionResult {
            has_changes: content != text,
            content,
            safety_score: (1.0 - penalty).clamp(0.0, 1.0),
            mappings,
            categories,
        }
    }

    /// Abstract optional text; `None` behaves like empty input.
    pub fn process_opt(&self, text: Option<&str>) -> AbstractionResult {
        self.process(text.unwrap_or_default())
    }
}

impl Default for AbstractionEngine {
    fn default() -> Self {
        Self::new(PatternTable::standard())
    }
}
