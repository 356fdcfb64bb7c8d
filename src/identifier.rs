//! Module identifier handling.
//!
//! Raw webpack identifiers carry a loader chain prefix
//! (`<loader>!<loader>!/path/to/module.js`) and, for concatenated
//! modules, a per-build hash suffix (`/path/to/module.js a1b2c3`).
//! Stripping both yields a key that is stable across builds, which is
//! what the comparison engine joins on.

/// Drops the loader chain from an identifier, keeping everything after
/// the last `!`.
pub fn strip_loader(identifier: &str) -> &str {
    match identifier.rfind('!') {
        Some(index) => &identifier[index + 1..],
        None => identifier,
    }
}

/// Strips trailing ` <hash>` concatenation hashes, if present.
///
/// Webpack appends a lowercase base-36 hash after a space to identifiers
/// of scope-hoisted modules; the hash changes every build. Stripping
/// runs to a fixpoint so the result is idempotent even for pathological
/// identifiers whose remaining tail still looks like a hash.
fn strip_hash(identifier: &str) -> &str {
    let mut current = identifier;
    while let Some((prefix, suffix)) = current.rsplit_once(' ') {
        let is_hash = !suffix.is_empty()
            && suffix
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
        if !is_hash {
            break;
        }
        current = prefix;
    }
    current
}

/// Normalizes an identifier so that it carries over time, removing the
/// hash from the end of concatenated module identifiers.
///
/// Idempotent: normalizing an already-normalized identifier is a no-op.
/// This is the primary join key for cross-snapshot comparison.
pub fn normalize_identifier(identifier: &str) -> String {
    strip_hash(identifier).to_string()
}

/// Display variant of [`normalize_identifier`]: also strips the loader
/// chain so labels read as plain file paths.
pub fn human_readable_identifier(identifier: &str) -> String {
    strip_hash(strip_loader(identifier)).to_string()
}

/// Extracts the owning npm package name from an identifier, or `None`
/// if the module is not under a `node_modules` directory.
///
/// Nested `node_modules` resolve to the innermost package, since a
/// dependency may vendor its own dependencies. Scoped packages keep
/// their `@scope/name` form.
pub fn node_module_from_identifier(identifier: &str) -> Option<String> {
    let parts: Vec<&str> = strip_loader(identifier).split(['/', '\\']).collect();
    for i in (0..parts.len()).rev() {
        if parts[i] != "node_modules" {
            continue;
        }
        let name = *parts.get(i + 1)?;
        if name.starts_with('@') {
            let sub = *parts.get(i + 2)?;
            return Some(format!("{name}/{sub}"));
        }
        return Some(name.to_string());
    }
    None
}

/// Coarse classification of a module from its identifier shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleKind {
    Javascript,
    Style,
    External,
    NodeModule,
}

/// Classifies a module by identifier. Check order matters: a CSS file
/// inside `node_modules` is still a stylesheet, and webpack externals
/// never have a real path.
pub fn identify_module_kind(identifier: &str) -> ModuleKind {
    if identifier.contains("style-loader") || identifier.contains("css-loader") {
        return ModuleKind::Style;
    }
    if identifier.starts_with("external ") {
        return ModuleKind::External;
    }
    if identifier.contains("node_modules") {
        return ModuleKind::NodeModule;
    }
    ModuleKind::Javascript
}

/// Bitfield of import styles observed on a module's inbound reasons.
///
/// A module can be imported as an ES module in one place and required as
/// CommonJS in another; both bits end up set ("mixed").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportType(u8);

impl ImportType {
    pub const UNKNOWN: Self = Self(0);
    pub const ES_MODULE: Self = Self(1 << 0);
    pub const COMMON_JS: Self = Self(1 << 1);

    /// Classifies one reason's type tag (e.g. `harmony side effect
    /// evaluation`, `cjs require`).
    pub fn from_reason_kind(kind: &str) -> Self {
        if kind.contains("cjs") {
            Self::COMMON_JS
        } else if kind.contains("harmony") {
            Self::ES_MODULE
        } else {
            Self::UNKNOWN
        }
    }

    pub fn is_es_module(self) -> bool {
        self.0 & Self::ES_MODULE.0 != 0
    }

    pub fn is_common_js(self) -> bool {
        self.0 & Self::COMMON_JS.0 != 0
    }

    pub fn is_mixed(self) -> bool {
        self.is_es_module() && self.is_common_js()
    }

    /// Pure-ESM imports are the tree-shaking-friendly case.
    pub fn is_tree_shakable(self) -> bool {
        self.is_es_module() && !self.is_common_js()
    }

    pub fn label(self) -> &'static str {
        if self.is_mixed() {
            "mixed"
        } else if self.is_es_module() {
            "es-module"
        } else if self.is_common_js() {
            "commonjs"
        } else {
            "unknown"
        }
    }
}

impl std::ops::BitOr for ImportType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ImportType {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
