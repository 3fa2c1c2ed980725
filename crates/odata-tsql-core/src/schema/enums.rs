//! Enum metadata and its process-wide cache.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

/// Facts about an enum type needed to render comparisons against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    /// Type name as written in filters.
    pub name: String,
    /// Bitmask enum: members combine with bitwise OR.
    pub flags: bool,
    /// Width of the underlying integer (8, 16, 32 or 64).
    pub underlying_bits: u32,
    /// Member name to numeric value.
    pub members: BTreeMap<String, i64>,
}

impl EnumType {
    /// Creates an enum type with no members.
    #[must_use]
    pub fn new(name: impl Into<String>, underlying_bits: u32) -> Self {
        Self {
            name: name.into(),
            flags: false,
            underlying_bits,
            members: BTreeMap::new(),
        }
    }

    /// Marks the type as a bitmask.
    #[must_use]
    pub const fn flags(mut self) -> Self {
        self.flags = true;
        self
    }

    /// Adds a member.
    #[must_use]
    pub fn member(mut self, name: impl Into<String>, value: i64) -> Self {
        self.members.insert(name.into(), value);
        self
    }

    /// Resolves literal text to its numeric value.
    ///
    /// Accepts a number, a member name, or comma-separated member names
    /// (OR-ed together). Member lookup falls back to a case-insensitive match.
    #[must_use]
    pub fn value_of(&self, text: &str) -> Option<i64> {
        let text = text.trim();
        if let Ok(n) = text.parse::<i64>() {
            return Some(n);
        }
        text.split(',').try_fold(0_i64, |acc, member| {
            let member = member.trim();
            let value = self.members.get(member).copied().or_else(|| {
                self.members
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(member))
                    .map(|(_, v)| *v)
            })?;
            Some(acc | value)
        })
    }
}

/// Looks up enum metadata by type name.
pub trait EnumResolver: Send + Sync {
    /// Returns the enum type, or `None` if the name is not an enum.
    fn resolve(&self, type_name: &str) -> Option<EnumType>;
}

/// An [`EnumResolver`] over a fixed set of types.
#[derive(Debug, Clone, Default)]
pub struct StaticEnumResolver {
    types: HashMap<String, EnumType>,
}

impl StaticEnumResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type under its name.
    #[must_use]
    pub fn with_type(mut self, enum_type: EnumType) -> Self {
        self.types.insert(enum_type.name.clone(), enum_type);
        self
    }
}

impl EnumResolver for StaticEnumResolver {
    fn resolve(&self, type_name: &str) -> Option<EnumType> {
        self.types.get(type_name).cloned()
    }
}

/// Read-mostly cache in front of an [`EnumResolver`].
///
/// Safe to share between concurrently running compilations; lookups take a
/// read lock and only a miss takes the write lock. Misses are cached too.
pub struct EnumMetadataCache {
    resolver: Box<dyn EnumResolver>,
    entries: RwLock<HashMap<String, Option<Arc<EnumType>>>>,
}

impl EnumMetadataCache {
    /// Wraps a resolver.
    #[must_use]
    pub fn new(resolver: impl EnumResolver + 'static) -> Self {
        Self {
            resolver: Box::new(resolver),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the metadata for `type_name`, resolving it on first use.
    #[must_use]
    pub fn lookup(&self, type_name: &str) -> Option<Arc<EnumType>> {
        if let Some(cached) = self.entries.read().get(type_name) {
            return cached.clone();
        }
        let resolved = self.resolver.resolve(type_name).map(Arc::new);
        tracing::debug!(type_name, found = resolved.is_some(), "resolved enum metadata");
        self.entries
            .write()
            .entry(String::from(type_name))
            .or_insert(resolved)
            .clone()
    }

    /// Number of cached names, hits and misses alike.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been looked up yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for EnumMetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnumMetadataCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
