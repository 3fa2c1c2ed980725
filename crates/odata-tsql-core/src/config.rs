//! Compiler configuration.

use serde::{Deserialize, Serialize};

/// Options shared by every serializer taking part in one compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Prefix of generated parameter names (`p` gives `@p0`, `@p1`, ...).
    pub parameter_prefix: String,
    /// User name written into audit columns.
    pub user_name: Option<String>,
    /// Serialized current principal, used for audit columns when no user name is configured.
    pub current_principal: Option<String>,
    /// Reserved column holding the concrete type name of a row (used by `isof`).
    pub type_discriminator: String,
    /// Staging table used by graph projection (`@name` for a table variable, `#name` for a temp table).
    pub staging_table: String,
    /// Separator placed between key values when a composite key is compressed into one string.
    pub path_separator: String,
    /// Place each statement clause on its own line.
    pub pretty: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            parameter_prefix: String::from("p"),
            user_name: None,
            current_principal: None,
            type_discriminator: String::from("__type"),
            staging_table: String::from("@paths"),
            path_separator: String::from("|"),
            pretty: false,
        }
    }
}

impl CompilerOptions {
    /// Loads options from a JSON document; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns the name written into audit columns, if any.
    #[must_use]
    pub fn audit_user(&self) -> Option<&str> {
        self.user_name
            .as_deref()
            .or(self.current_principal.as_deref())
    }

    /// Returns the clause separator.
    #[must_use]
    pub const fn clause_separator(&self) -> &'static str {
        if self.pretty {
            "\n"
        } else {
            " "
        }
    }
}
