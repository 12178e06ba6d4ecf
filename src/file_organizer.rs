/// Moving files into their destination folders.
///
/// This module computes where a file should go under a destination root,
/// picks a collision-free name, and either performs the move or describes the
/// move it would have made.
use crate::file_category::Category;
use crate::scanner::FileEntry;
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while moving a single file.
///
/// These never abort a batch; they end up as [`MoveOutcome::Failed`].
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The source path has no file name component.
    #[error("{} has no file name", path.display())]
    MissingFileName { path: PathBuf },
    /// Failed to create a destination directory.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to move a file to its destination.
    #[error("Failed to move {} to {}: {source}", file.display(), destination.display())]
    FileMoveFailure {
        file: PathBuf,
        destination: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for single-file operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Where a file lands relative to the destination root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// `destination_root / category / basename`
    Category(Category),
    /// `destination_root / basename`
    Flat,
}

impl Placement {
    /// The subfolder under the destination root, if any.
    pub fn subdir(&self) -> Option<&'static str> {
        match self {
            Placement::Category(category) => Some(category.dir_name()),
            Placement::Flat => None,
        }
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            Placement::Category(category) => Some(*category),
            Placement::Flat => None,
        }
    }
}

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// The file was relocated.
    Moved,
    /// Dry run: the file would have been relocated.
    Simulated,
    /// The file already sits in its target folder and was left alone.
    AlreadyInPlace,
    /// The move failed; the file stays where it was.
    Failed { reason: String },
}

/// The record of one processed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveResult {
    pub source: PathBuf,
    /// The final (possibly suffixed) destination, or the intended one on failure.
    pub destination: PathBuf,
    pub category: Option<Category>,
    #[serde(flatten)]
    pub outcome: MoveOutcome,
}

impl MoveResult {
    /// True unless the move failed.
    pub fn succeeded(&self) -> bool {
        !matches!(self.outcome, MoveOutcome::Failed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            MoveOutcome::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Moves files into a destination tree without ever overwriting.
///
/// The organizer remembers every destination it hands out, so two incoming
/// files with the same name get distinct suffixes even in a dry run, where
/// nothing is written to disk.
#[derive(Debug, Default)]
pub struct FileOrganizer {
    claimed: HashSet<PathBuf>,
}

impl FileOrganizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves (or simulates moving) `entry` under `destination_root`.
    ///
    /// The target folder is created, parents included, unless `dry_run` is
    /// set. When a file with the same name already exists there, a numeric
    /// suffix is inserted before the extension (`name_1.ext`, `name_2.ext`, ...).
    /// Failures are reported in the returned [`MoveResult`], never raised.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use tidyup::file_category::Category;
    /// use tidyup::file_organizer::{FileOrganizer, Placement};
    /// use tidyup::scanner::FileEntry;
    ///
    /// let mut organizer = FileOrganizer::new();
    /// let result = organizer.move_file(
    ///     &FileEntry::new("/home/user/Downloads/photo.jpg"),
    ///     Path::new("/home/user/Sorted"),
    ///     Placement::Category(Category::Photos),
    ///     false,
    /// );
    /// println!("{} -> {}", result.source.display(), result.destination.display());
    /// ```
    pub fn move_file(
        &mut self,
        entry: &FileEntry,
        destination_root: &Path,
        placement: Placement,
        dry_run: bool,
    ) -> MoveResult {
        let target_dir = match placement.subdir() {
            Some(subdir) => destination_root.join(subdir),
            None => destination_root.to_path_buf(),
        };

        let result = self.place(entry.path(), &target_dir, dry_run);
        let (destination, outcome) = match result {
            Ok(done) => done,
            Err(e) => {
                tracing::warn!(file = %entry.path().display(), error = %e, "Move failed");
                let intended = match entry.path().file_name() {
                    Some(name) => target_dir.join(name),
                    None => target_dir,
                };
                (
                    intended,
                    MoveOutcome::Failed {
                        reason: e.to_string(),
                    },
                )
            }
        };

        MoveResult {
            source: entry.path().to_path_buf(),
            destination,
            category: placement.category(),
            outcome,
        }
    }

    fn place(
        &mut self,
        source: &Path,
        target_dir: &Path,
        dry_run: bool,
    ) -> OrganizeResult<(PathBuf, MoveOutcome)> {
        let file_name = source
            .file_name()
            .ok_or_else(|| OrganizeError::MissingFileName {
                path: source.to_path_buf(),
            })?;

        if is_same_dir(source.parent(), target_dir) {
            tracing::debug!(file = %source.display(), "Already in place");
            return Ok((source.to_path_buf(), MoveOutcome::AlreadyInPlace));
        }

        if !dry_run {
            fs::create_dir_all(target_dir).map_err(|e| {
                OrganizeError::DirectoryCreationFailed {
                    path: target_dir.to_path_buf(),
                    source: e,
                }
            })?;
        }

        let destination = self.free_destination(target_dir, Path::new(file_name));

        if dry_run {
            tracing::info!(
                "[SIMULATED] {} → {}",
                file_name.to_string_lossy(),
                destination.display()
            );
            self.claimed.insert(destination.clone());
            return Ok((destination, MoveOutcome::Simulated));
        }

        relocate(source, &destination).map_err(|e| OrganizeError::FileMoveFailure {
            file: source.to_path_buf(),
            destination: destination.clone(),
            source: e,
        })?;
        tracing::info!(src = %source.display(), dest = %destination.display(), "Moved file");
        self.claimed.insert(destination.clone());

        Ok((destination, MoveOutcome::Moved))
    }

    /// First name in `dir` that is neither on disk nor already handed out.
    fn free_destination(&self, dir: &Path, file_name: &Path) -> PathBuf {
        let candidate = dir.join(file_name);
        if !self.is_taken(&candidate) {
            return candidate;
        }

        let stem = file_name.file_stem().unwrap_or_default();
        let extension = file_name.extension();

        let mut count = 1u64;
        loop {
            let mut name = OsString::from(stem);
            name.push(format!("_{}", count));
            if let Some(ext) = extension {
                name.push(".");
                name.push(ext);
            }
            let candidate = dir.join(name);
            if !self.is_taken(&candidate) {
                return candidate;
            }
            count += 1;
        }
    }

    fn is_taken(&self, path: &Path) -> bool {
        // symlink_metadata so a dangling link still counts as occupied
        self.claimed.contains(path) || fs::symlink_metadata(path).is_ok()
    }
}

fn is_same_dir(parent: Option<&Path>, target_dir: &Path) -> bool {
    let Some(parent) = parent else {
        return false;
    };
    if parent == target_dir {
        return true;
    }
    match (fs::canonicalize(parent), fs::canonicalize(target_dir)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Renames `source` to `destination`, copying across filesystems when needed.
fn relocate(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(error = %e, "Rename crossed devices, copying instead");
            copy_then_remove(source, destination)
        }
        Err(e) => Err(e),
    }
}

fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    let mut reader = File::open(source)?;
    // create_new refuses to clobber anything that appeared since the name was picked
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)?;

    if let Err(e) = io::copy(&mut reader, &mut writer).and_then(|_| writer.sync_all()) {
        drop(writer);
        let _ = fs::remove_file(destination);
        return Err(e);
    }
    if let Ok(metadata) = reader.metadata() {
        let _ = fs::set_permissions(destination, metadata.permissions());
    }

    if let Err(e) = fs::remove_file(source) {
        let _ = fs::remove_file(destination);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("source");
        let destination = temp_dir.path().join("destination");
        fs::create_dir(&source).expect("Failed to create source directory");
        (temp_dir, source, destination)
    }

    #[test]
    fn test_move_creates_category_directory() {
        let (_temp_dir, source, destination) = setup();
        let file_path = source.join("photo.jpg");
        fs::write(&file_path, "jpg").unwrap();

        let mut organizer = FileOrganizer::new();
        let result = organizer.move_file(
            &FileEntry::new(file_path.clone()),
            &destination,
            Placement::Category(Category::Photos),
            false,
        );

        assert_eq!(result.outcome, MoveOutcome::Moved);
        assert!(result.succeeded());
        assert_eq!(result.destination, destination.join("Fotos").join("photo.jpg"));
        assert_eq!(result.category, Some(Category::Photos));
        assert!(!file_path.exists());
        assert!(result.destination.exists());
    }

    #[test]
    fn test_flat_placement_uses_destination_root() {
        let (_temp_dir, source, destination) = setup();
        let file_path = source.join("notes.txt");
        fs::write(&file_path, "notes").unwrap();

        let mut organizer = FileOrganizer::new();
        let result =
            organizer.move_file(&FileEntry::new(file_path), &destination, Placement::Flat, false);

        assert_eq!(result.destination, destination.join("notes.txt"));
        assert_eq!(result.category, None);
        assert!(destination.join("notes.txt").exists());
    }

    #[test]
    fn test_collision_appends_suffix_and_keeps_original() {
        let (_temp_dir, source, destination) = setup();
        fs::create_dir_all(destination.join("Fotos")).unwrap();
        fs::write(destination.join("Fotos").join("photo.jpg"), "original").unwrap();
        fs::write(destination.join("Fotos").join("photo_1.jpg"), "second").unwrap();
        let file_path = source.join("photo.jpg");
        fs::write(&file_path, "incoming").unwrap();

        let mut organizer = FileOrganizer::new();
        let result = organizer.move_file(
            &FileEntry::new(file_path),
            &destination,
            Placement::Category(Category::Photos),
            false,
        );

        assert_eq!(result.destination, destination.join("Fotos").join("photo_2.jpg"));
        assert_eq!(
            fs::read_to_string(destination.join("Fotos").join("photo.jpg")).unwrap(),
            "original"
        );
        assert_eq!(fs::read_to_string(&result.destination).unwrap(), "incoming");
    }

    #[test]
    fn test_collision_without_extension() {
        let (_temp_dir, source, destination) = setup();
        fs::create_dir_all(&destination).unwrap();
        fs::write(destination.join("README"), "old").unwrap();
        let file_path = source.join("README");
        fs::write(&file_path, "new").unwrap();

        let mut organizer = FileOrganizer::new();
        let result =
            organizer.move_file(&FileEntry::new(file_path), &destination, Placement::Flat, false);

        assert_eq!(result.destination, destination.join("README_1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_collision_suffix_keeps_raw_name_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (_temp_dir, source, destination) = setup();
        let name = OsStr::from_bytes(b"caf\xff.bin");
        fs::create_dir_all(&destination).unwrap();
        fs::write(destination.join(name), "old").unwrap();
        let file_path = source.join(name);
        fs::write(&file_path, "new").unwrap();

        let mut organizer = FileOrganizer::new();
        let result =
            organizer.move_file(&FileEntry::new(file_path), &destination, Placement::Flat, false);

        let expected = destination.join(OsStr::from_bytes(b"caf\xff_1.bin"));
        assert_eq!(result.outcome, MoveOutcome::Moved);
        assert_eq!(result.destination, expected);
        assert_eq!(fs::read_to_string(&expected).unwrap(), "new");
        assert_eq!(fs::read_to_string(destination.join(name)).unwrap(), "old");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_moved_not_its_target() {
        let (_temp_dir, source, destination) = setup();
        let target = source.join("real.txt");
        fs::write(&target, "r").unwrap();
        let link = source.join("link.txt");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let mut organizer = FileOrganizer::new();
        let result =
            organizer.move_file(&FileEntry::new(&link), &destination, Placement::Flat, false);

        assert_eq!(result.outcome, MoveOutcome::Moved);
        let moved = destination.join("link.txt");
        assert!(fs::symlink_metadata(&moved).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&moved).unwrap(), target);
        assert!(target.exists());
        assert!(fs::symlink_metadata(&link).is_err());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let (_temp_dir, source, destination) = setup();
        let file_path = source.join("archive.zip");
        fs::write(&file_path, "zip").unwrap();

        let mut organizer = FileOrganizer::new();
        let result = organizer.move_file(
            &FileEntry::new(file_path.clone()),
            &destination,
            Placement::Category(Category::Archives),
            true,
        );

        assert_eq!(result.outcome, MoveOutcome::Simulated);
        assert_eq!(
            result.destination,
            destination.join("Comprimidos").join("archive.zip")
        );
        assert!(file_path.exists());
        assert!(!destination.exists());
    }

    #[test]
    fn test_dry_run_reserves_names_within_batch() {
        let (_temp_dir, source, destination) = setup();
        fs::create_dir(source.join("a")).unwrap();
        fs::create_dir(source.join("b")).unwrap();
        fs::write(source.join("a").join("song.mp3"), "a").unwrap();
        fs::write(source.join("b").join("song.mp3"), "b").unwrap();

        let mut organizer = FileOrganizer::new();
        let placement = Placement::Category(Category::Music);
        let first = organizer.move_file(
            &FileEntry::new(source.join("a").join("song.mp3")),
            &destination,
            placement,
            true,
        );
        let second = organizer.move_file(
            &FileEntry::new(source.join("b").join("song.mp3")),
            &destination,
            placement,
            true,
        );

        assert_eq!(first.destination, destination.join("Música").join("song.mp3"));
        assert_eq!(second.destination, destination.join("Música").join("song_1.mp3"));
    }

    #[test]
    fn test_missing_source_is_reported_not_raised() {
        let (_temp_dir, source, destination) = setup();

        let mut organizer = FileOrganizer::new();
        let result = organizer.move_file(
            &FileEntry::new(source.join("vanished.pdf")),
            &destination,
            Placement::Category(Category::Documents),
            false,
        );

        assert!(!result.succeeded());
        assert!(result.error().is_some());
        assert_eq!(
            result.destination,
            destination.join("Documentos").join("vanished.pdf")
        );
    }

    #[test]
    fn test_file_already_in_place_is_left_alone() {
        let (_temp_dir, _source, destination) = setup();
        fs::create_dir_all(destination.join("Textos")).unwrap();
        let file_path = destination.join("Textos").join("notes.txt");
        fs::write(&file_path, "notes").unwrap();

        let mut organizer = FileOrganizer::new();
        let result = organizer.move_file(
            &FileEntry::new(file_path.clone()),
            &destination,
            Placement::Category(Category::Texts),
            false,
        );

        assert_eq!(result.outcome, MoveOutcome::AlreadyInPlace);
        assert_eq!(result.destination, file_path);
        assert!(!destination.join("Textos").join("notes_1.txt").exists());
    }

    #[test]
    fn test_copy_then_remove_refuses_existing_destination() {
        let (_temp_dir, source, destination) = setup();
        fs::create_dir_all(&destination).unwrap();
        let src = source.join("a.txt");
        let dst = destination.join("a.txt");
        fs::write(&src, "new").unwrap();
        fs::write(&dst, "old").unwrap();

        assert!(copy_then_remove(&src, &dst).is_err());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "old");
        assert!(src.exists());
    }

    #[test]
    fn test_copy_then_remove_moves_contents() {
        let (_temp_dir, source, destination) = setup();
        fs::create_dir_all(&destination).unwrap();
        let src = source.join("a.txt");
        let dst = destination.join("a.txt");
        fs::write(&src, "payload").unwrap();

        copy_then_remove(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "payload");
    }
}
