//! Member resolution: merging `[transformer]` defaults with `[members]` overrides.

use crate::types::ProjectConfig;

/// The invocation settings in effect for one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMember {
    /// The member's full name.
    pub name: String,
    /// The `[members]` key that matched, if any.
    pub matched_prefix: Option<String>,
    /// Maximum number of concurrent instances a single caller may request.
    pub max_degree_of_parallelism: u32,
    /// Supported recursion depth.
    pub max_recursion_depth: u32,
}

impl ResolvedMember {
    /// Total number of hardware instances of this member a caller may need:
    /// one pool of `max_degree_of_parallelism` per recursion level.
    pub fn max_invocation_instance_count(&self) -> u32 {
        (self.max_recursion_depth + 1) * self.max_degree_of_parallelism
    }
}

/// Resolves the invocation settings for `member_name`.
///
/// The longest `[members]` key that is a prefix of the name wins; fields it
/// leaves unset, or every field when nothing matches, come from `[transformer]`.
pub fn resolve_member(config: &ProjectConfig, member_name: &str) -> ResolvedMember {
    let matched = config
        .members
        .iter()
        .filter(|(prefix, _)| member_name.starts_with(prefix.as_str()))
        .max_by_key(|(prefix, _)| prefix.len());

    let defaults = &config.transformer;
    let (matched_prefix, degree, depth) = match matched {
        Some((prefix, member)) => (
            Some(prefix.clone()),
            member.max_degree_of_parallelism,
            member.max_recursion_depth,
        ),
        None => (None, None, None),
    };

    ResolvedMember {
        name: member_name.to_string(),
        matched_prefix,
        max_degree_of_parallelism: degree.unwrap_or(defaults.default_max_degree_of_parallelism),
        max_recursion_depth: depth.unwrap_or(defaults.default_max_recursion_depth),
    }
}
