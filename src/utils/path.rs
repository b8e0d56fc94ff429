use std::env;
use std::path::{Component, Path, PathBuf};

/// Resolve a user-supplied path string to an absolute, lexically clean path.
///
/// Expands a leading `~`, makes relative paths absolute against the current
/// directory, and resolves `.`/`..` components without touching the
/// filesystem. Symlinks are left alone and no existence check is performed.
pub fn normalize(path: &str) -> PathBuf {
    let expanded = expand_home(path);

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(expanded),
            // No current directory, keep the input relative.
            Err(_) => expanded,
        }
    };

    clean(&absolute)
}

/// Expand a leading `~` or `~/` to the user's home directory.
///
/// `~user` forms and missing home directories are passed through unchanged.
fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    PathBuf::from(path)
}

/// Lexically resolve `.` and `..` components.
fn clean(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                result.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                // `/..` stays `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                // keep leading `..` of a path we could not make absolute
                _ => result.push(component),
            },
        }
    }

    result
}
