// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Store helper functions:
/// on-disk JSON mapping, file-name-safe id encoding, and atomic writes confined to the root.
#[derive(Debug, Serialize)]
struct CheckpointJsonRef<'a> {
    id: &'a str,
    elements: &'a [Element],
}

#[derive(Debug, Deserialize)]
struct CheckpointJson {
    elements: Vec<Element>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreMetaJson {
    version: u32,
    #[serde(default)]
    views: Vec<StoredViewJson>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredViewJson {
    view_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    skin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_checkpoint_id: Option<String>,
    created_at: u64,
    updated_at: u64,
}

fn store_meta_to_json(meta: &StoreMeta) -> StoreMetaJson {
    let views = meta
        .views
        .iter()
        .map(|view| StoredViewJson {
            view_id: view.view_id.to_string(),
            title: view.meta.title.clone(),
            description: view.meta.description.clone(),
            skin: view.meta.skin.clone(),
            last_checkpoint_id: view.last_checkpoint_id.as_ref().map(ToString::to_string),
            created_at: view.created_at,
            updated_at: view.updated_at,
        })
        .collect();

    StoreMetaJson { version: STORE_META_VERSION, views }
}

fn store_meta_from_json(meta_json: StoreMetaJson) -> Result<StoreMeta, StoreError> {
    let views = meta_json
        .views
        .into_iter()
        .map(|view| {
            let view_id = ViewId::new(view.view_id.clone()).map_err(|source| {
                StoreError::InvalidId { field: "views[].view_id", value: view.view_id, source }
            })?;
            let last_checkpoint_id = view
                .last_checkpoint_id
                .map(|value| {
                    CheckpointId::new(value.clone()).map_err(|source| StoreError::InvalidId {
                        field: "views[].last_checkpoint_id",
                        value,
                        source,
                    })
                })
                .transpose()?;
            Ok(StoredView {
                view_id,
                meta: ViewMeta {
                    title: view.title,
                    description: view.description,
                    skin: view.skin,
                },
                last_checkpoint_id,
                created_at: view.created_at,
                updated_at: view.updated_at,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    Ok(StoreMeta { views })
}

const RESERVED_FILE_STEMS: [&str; 4] = ["CON", "PRN", "AUX", "NUL"];

/// Maps an id onto a file stem that is safe on every platform.
///
/// Ids that are already safe pass through; anything else becomes `~` followed by the hex of its
/// bytes, so the mapping stays injective.
fn checkpoint_file_stem(id: &str) -> String {
    if is_portable_file_stem(id) {
        return id.to_owned();
    }
    let mut out = String::with_capacity(1 + id.len() * 2);
    out.push('~');
    for byte in id.bytes() {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn is_portable_file_stem(stem: &str) -> bool {
    if stem.starts_with(['~', '.']) || stem.ends_with([' ', '.']) {
        return false;
    }
    let base = stem.split('.').next().unwrap_or(stem).to_ascii_uppercase();
    let numbered_device = ["COM", "LPT"].iter().any(|prefix| {
        base.strip_prefix(prefix)
            .is_some_and(|digit| digit.len() == 1 && matches!(digit.as_bytes()[0], b'1'..=b'9'))
    });
    if numbered_device || RESERVED_FILE_STEMS.contains(&base.as_str()) {
        return false;
    }
    !stem.chars().any(|ch| ch.is_control() || "<>:\"/\\|?*".contains(ch))
}

/// Creates `dir` when missing; an existing symlink or non-directory is refused.
fn ensure_real_dir(dir: &Path) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io { path: dir.to_path_buf(), source };
    match fs::symlink_metadata(dir) {
        Ok(md) if md.file_type().is_symlink() => {
            Err(StoreError::SymlinkRefused { path: dir.to_path_buf() })
        }
        Ok(md) if md.is_dir() => Ok(()),
        Ok(_) => Err(io_err(io::Error::new(io::ErrorKind::AlreadyExists, "expected directory"))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => fs::create_dir(dir).map_err(io_err),
        Err(source) => Err(io_err(source)),
    }
}

/// Writes `contents` to `path` (a direct child of `root` or of one of its subdirectories) via a
/// temp file and rename.
fn write_atomic(
    root: &Path,
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    fs::create_dir_all(root)
        .map_err(|source| StoreError::Io { path: root.to_path_buf(), source })?;

    let (Some(dir), Some(file_name)) = (path.parent(), path.file_name()) else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no parent directory"),
        });
    };
    if dir != root {
        ensure_real_dir(dir)?;
    }
    if fs::symlink_metadata(path).is_ok_and(|md| md.file_type().is_symlink()) {
        return Err(StoreError::SymlinkRefused { path: path.to_path_buf() });
    }

    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let tmp_path = dir.join(format!(".livecanvas.tmp.{}.{nanos}", file_name.to_string_lossy()));
    let tmp_err = |source| StoreError::Io { path: tmp_path.clone(), source };

    let mut file =
        fs::OpenOptions::new().write(true).create_new(true).open(&tmp_path).map_err(tmp_err)?;
    file.write_all(contents).map_err(tmp_err)?;
    if durability == WriteDurability::Durable {
        file.sync_all().map_err(tmp_err)?;
    }
    drop(file);

    if let Err(source) = replace_file(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io { path: path.to_path_buf(), source });
    }

    #[cfg(unix)]
    {
        if durability == WriteDurability::Durable {
            fs::File::open(dir)
                .and_then(|handle| handle.sync_all())
                .map_err(|source| StoreError::Io { path: dir.to_path_buf(), source })?;
        }
    }

    Ok(())
}

fn replace_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(err)
            if cfg!(windows)
                && matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
        {
            let _ = fs::remove_file(to);
            fs::rename(from, to)
        }
        result => result,
    }
}
