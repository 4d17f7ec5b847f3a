/// Dependency declarations embedded in scripts
///
/// Two forms are recognized, and both keep source order:
///
/// ```swift
/// //SWIFTRUN package "https://github.com/johnno1962/Popen" from="2.1.7"
/// //SWIFTRUN local "../Shared" product="SharedKit"
/// import DLKit // .package(url: "https://github.com/johnno1962/DLKit", .upToNextMajor(from: "3.4.8"))
/// ```
///
/// `//SWIFTRUN` lines are KDL documents. The trailing comment on an import
/// line is copied into the manifest verbatim.
use kdl::{KdlDocument, KdlNode};
use std::path::{Path, PathBuf};

use crate::error::SynthesisError;

pub const DIRECTIVE_PREFIX: &str = "//SWIFTRUN";

/// One package dependency for the generated manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Package clause, e.g. `.package(url: "...", from: "1.0.0")`
    pub package: String,
    /// Product the script's target depends on
    pub product: String,
}

/// Extract every declaration from `source`, in order of appearance
///
/// `path` is used for error locations and to resolve `local` directives.
pub fn parse_dependencies(source: &str, path: &Path) -> Result<Vec<Dependency>, SynthesisError> {
    let script_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut dependencies = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let trimmed = line.trim();

        if let Some(directive) = directive_body(trimmed) {
            let directive_error = |message: String| SynthesisError::Directive {
                path: path.to_path_buf(),
                line: index + 1,
                message,
            };

            let doc: KdlDocument = directive
                .trim()
                .parse()
                .map_err(|e| directive_error(format!("Invalid KDL syntax: {}", e)))?;

            for node in doc.nodes() {
                let dependency = parse_kdl_node(node, script_dir).map_err(&directive_error)?;
                dependencies.push(dependency);
            }
        } else if let Some(dependency) = import_comment_dependency(trimmed) {
            dependencies.push(dependency);
        }
    }

    Ok(dependencies)
}

/// Text after `//SWIFTRUN`, which must be followed by whitespace or end the line
fn directive_body(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(DIRECTIVE_PREFIX)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest),
        Some(_) => None,
    }
}

/// Parse a single KDL node into a dependency
fn parse_kdl_node(node: &KdlNode, script_dir: &Path) -> Result<Dependency, String> {
    match node.name().value() {
        "package" => {
            let url = get_positional_string(node, 0)
                .ok_or_else(|| "package requires a URL argument".to_string())?;

            let requirements: Vec<String> = [
                ("from", "from: \"{}\""),
                ("exact", ".exact(\"{}\")"),
                ("branch", ".branch(\"{}\")"),
                ("revision", ".revision(\"{}\")"),
                ("up-to-next-minor", ".upToNextMinor(from: \"{}\")"),
            ]
            .iter()
            .filter_map(|(key, template)| {
                node.get(*key)
                    .and_then(|e| e.as_string())
                    .map(|value| template.replace("{}", value))
            })
            .collect();

            let requirement = match requirements.as_slice() {
                [single] => single,
                [] => {
                    return Err(
                        "package requires a version requirement: from, exact, branch, revision or up-to-next-minor"
                            .to_string(),
                    )
                }
                _ => return Err("package takes exactly one version requirement".to_string()),
            };

            let product = node
                .get("product")
                .and_then(|e| e.as_string())
                .map(str::to_string)
                .unwrap_or_else(|| product_from_location(&url));

            Ok(Dependency {
                package: format!(".package(url: \"{}\", {})", url, requirement),
                product,
            })
        }

        "local" => {
            let raw = get_positional_string(node, 0)
                .ok_or_else(|| "local requires a path argument".to_string())?;

            let path = PathBuf::from(&raw);
            let path = if path.is_absolute() {
                path
            } else {
                script_dir.join(path)
            };

            let product = node
                .get("product")
                .and_then(|e| e.as_string())
                .map(str::to_string)
                .unwrap_or_else(|| product_from_location(&raw));

            Ok(Dependency {
                package: format!(".package(path: \"{}\")", path.display()),
                product,
            })
        }

        other => Err(format!("Unknown directive: {}", other)),
    }
}

/// Get positional string argument from KDL node
fn get_positional_string(node: &KdlNode, index: usize) -> Option<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none()) // Only positional args
        .nth(index)
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

/// Last path segment without `.git`
fn product_from_location(location: &str) -> String {
    let last = location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(location);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

/// Dependency declared in a trailing comment of an import statement
fn import_comment_dependency(line: &str) -> Option<Dependency> {
    let statement = strip_attributes(line);
    let rest = statement.strip_prefix("import")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let (_, comment) = rest.split_once("//")?;
    let clause = comment.trim();
    let product = quoted_symbol(clause)?;

    Some(Dependency {
        package: clause.to_string(),
        product: product.to_string(),
    })
}

/// Skip leading attributes such as `@testable` or `@_exported`
fn strip_attributes(line: &str) -> &str {
    let mut rest = line.trim_start();
    while rest.starts_with('@') {
        rest = match rest.split_once(char::is_whitespace) {
            Some((_, tail)) => tail.trim_start(),
            None => return "",
        };
    }
    rest
}

/// Word immediately preceding the first closing quote of a `.package(` clause
///
/// `.package(url: "https://github.com/org/DLKit", from: "1.0.0")` gives `DLKit`.
fn quoted_symbol(clause: &str) -> Option<&str> {
    let args = clause.strip_prefix(".package(")?;
    let bytes = args.as_bytes();
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';

    // At least one character precedes the symbol
    for i in 2..bytes.len() {
        if bytes[i] == b'"' && is_word(bytes[i - 1]) {
            let mut start = i - 1;
            while start > 1 && is_word(bytes[start - 1]) {
                start -= 1;
            }
            return Some(&args[start..i]);
        }
    }
    None
}
