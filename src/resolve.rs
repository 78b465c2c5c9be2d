use std::path::{Component, Path, PathBuf};

/// Turn an import specifier into the key used to compare it against configured
/// instance paths. Relative specifiers become absolute paths under `base_dir`,
/// anything else is returned as written.
pub fn resolve_specifier(specifier: &str, base_dir: &Path) -> String {
    if !specifier.starts_with('.') {
        return specifier.to_string();
    }
    normalize(&base_dir.join(specifier))
        .to_string_lossy()
        .into_owned()
}

/// Lexical normalization only, the filesystem is never consulted.
fn normalize(path: &Path) -> PathBuf {
    let mut result: Vec<Component<'_>> = vec![];
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => {
                result = vec![Component::Prefix(prefix)];
            }
            Component::RootDir => {
                result.push(Component::RootDir);
            }
            Component::CurDir => {}
            Component::ParentDir => match result.last() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => result.push(Component::ParentDir),
            },
            Component::Normal(segment) => {
                result.push(Component::Normal(segment));
            }
        }
    }
    PathBuf::from_iter(result)
}
