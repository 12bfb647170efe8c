//! Game directory layout
//!
//! A v2 game keeps one directory file per resource kind (`LOGDIR`, ...)
//! and volumes named `VOL.n`. A v3 game has a single `<PREFIX>DIR` and
//! volumes named `<PREFIX>VOL.n`.

use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};

use agi_resource::fs::write_atomically;
use agi_resource::{
    Charset, Directory, DirectoryBundle, DirectoryEntry, HeaderFormat, Placement, ResourceKind,
    Volume, VolumeOptions, VolumeResource, WriteOutcome,
};

/// Settings taken from the global command-line flags
#[derive(Debug, Clone, Copy)]
pub struct GameOptions {
    pub charset: Charset,
    pub volume: VolumeOptions,
}

impl GameOptions {
    pub fn new(charset: &str, v3: bool, signature: &str) -> Result<Self> {
        let charset = Charset::for_label(charset)
            .with_context(|| format!("Unsupported charset: {charset}"))?;
        let volume = if v3 {
            VolumeOptions::v3()
        } else {
            VolumeOptions::v2()
        };
        Ok(Self {
            charset,
            volume: volume.with_signature(parse_signature(signature)?),
        })
    }

    pub fn is_v3(&self) -> bool {
        self.volume.format == HeaderFormat::V3
    }
}

fn parse_signature(text: &str) -> Result<[u8; 2]> {
    let value = u16::from_str_radix(text.trim_start_matches("0x"), 16)
        .ok()
        .filter(|_| text.trim_start_matches("0x").len() == 4)
        .with_context(|| format!("Signature must be four hex digits, got '{text}'"))?;
    Ok(value.to_be_bytes())
}

/// An opened game: its directories and where its files live
#[derive(Debug)]
pub struct Game {
    root: PathBuf,
    options: GameOptions,
    prefix: Option<String>,
    directories: DirectoryBundle,
}

impl Game {
    pub fn open(root: &Path, options: &GameOptions) -> Result<Self> {
        if !root.is_dir() {
            bail!("Game directory not found: {}", root.display());
        }

        if options.is_v3() {
            let prefix = find_v3_prefix(root)?;
            let path = root.join(format!("{prefix}DIR"));
            let data = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let directories = DirectoryBundle::decode_v3(&data)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            log::info!("Opened v3 game '{prefix}' in {}", root.display());
            return Ok(Self {
                root: root.to_path_buf(),
                options: *options,
                prefix: Some(prefix),
                directories,
            });
        }

        let mut directories = DirectoryBundle::default();
        for kind in ResourceKind::ALL {
            let path = root.join(kind.dir_file_name());
            if !path.is_file() {
                log::warn!("{} is missing, treating it as empty", path.display());
                continue;
            }
            let data = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            *directories.get_mut(kind) = Directory::decode(&data)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
        }
        log::info!("Opened v2 game in {}", root.display());
        Ok(Self {
            root: root.to_path_buf(),
            options: *options,
            prefix: None,
            directories,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn charset(&self) -> &Charset {
        &self.options.charset
    }

    pub fn directory(&self, kind: ResourceKind) -> &Directory {
        self.directories.get(kind)
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn volume_path(&self, number: u8) -> PathBuf {
        match &self.prefix {
            Some(prefix) => self.root.join(format!("{prefix}VOL.{number}")),
            None => self.root.join(format!("VOL.{number}")),
        }
    }

    /// Volume files referenced by any directory, with their lengths
    pub fn volume_lengths(&self) -> Result<Vec<usize>> {
        let highest = ResourceKind::ALL
            .iter()
            .flat_map(|kind| self.directory(*kind).iter_present())
            .map(|(_, volume, _)| volume)
            .max();
        let Some(highest) = highest else {
            return Ok(Vec::new());
        };

        (0..=highest)
            .map(|number| {
                let path = self.volume_path(number);
                match std::fs::metadata(&path) {
                    Ok(meta) => Ok(usize::try_from(meta.len()).unwrap_or(usize::MAX)),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
                    Err(e) => Err(e).with_context(|| format!("Failed to stat {}", path.display())),
                }
            })
            .collect()
    }

    pub fn load_volume(&self, number: u8) -> Result<Volume> {
        let path = self.volume_path(number);
        let data =
            std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Volume::new(number, data, self.options.volume))
    }

    /// Read the block of resource `number`, or `None` if the directory has no entry
    pub fn read_resource(&self, kind: ResourceKind, number: usize) -> Result<Option<VolumeResource>> {
        let Some((volume, offset)) = self.directory(kind).get(number).location() else {
            return Ok(None);
        };
        let resource = self
            .load_volume(volume)?
            .read_resource(offset as usize)
            .with_context(|| format!("Failed to read {kind} {number}"))?;
        Ok(Some(resource))
    }

    /// Store new payloads for several resources of one kind, keeping
    /// their volumes and compression.
    ///
    /// Every block is placed in memory first; volumes and the directory
    /// are only replaced (atomically, file by file) once all of them fit.
    /// Outcomes come back in input order.
    pub fn write_payloads(
        &mut self,
        kind: ResourceKind,
        payloads: Vec<(usize, Vec<u8>)>,
    ) -> Result<Vec<WriteOutcome>> {
        let mut directories = self.directories.clone();
        let mut volumes: BTreeMap<u8, Volume> = BTreeMap::new();
        let mut relocated = false;
        let mut outcomes = Vec::with_capacity(payloads.len());

        for (number, payload) in payloads {
            let Some((volume_number, offset)) = directories.get(kind).get(number).location()
            else {
                bail!("{kind} {number} is not in the directory");
            };
            let volume = match volumes.entry(volume_number) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(self.load_volume(volume_number)?),
            };

            let resource = volume
                .read_resource(offset as usize)
                .with_context(|| format!("Failed to read {kind} {number}"))?
                .with_payload(payload)
                .with_context(|| format!("Failed to rebuild {kind} {number}"))?;
            let outcome = volume
                .write_resource(offset as usize, &resource, Placement::Auto)
                .with_context(|| format!("Failed to store {kind} {number}"))?;

            if outcome.is_relocated() {
                log::info!(
                    "{kind} {number} moved to {:#x} in volume {volume_number}",
                    outcome.offset()
                );
                let entry: DirectoryEntry = outcome.directory_entry(volume_number)?;
                directories.get_mut(kind).set(number, entry);
                relocated = true;
            }
            outcomes.push(outcome);
        }

        let directory_file = if relocated {
            Some(self.directory_file(kind, &directories)?)
        } else {
            None
        };

        for (number, volume) in &volumes {
            let path = self.volume_path(*number);
            write_atomically(&path, volume.data())
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        if let Some((path, data)) = directory_file {
            write_atomically(&path, &data)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::debug!("Updated {}", path.display());
            self.directories = directories;
        }
        Ok(outcomes)
    }

    /// Path and encoded bytes of the directory file holding `kind`
    fn directory_file(
        &self,
        kind: ResourceKind,
        directories: &DirectoryBundle,
    ) -> Result<(PathBuf, Vec<u8>)> {
        Ok(match &self.prefix {
            Some(prefix) => (
                self.root.join(format!("{prefix}DIR")),
                directories.encode_v3()?,
            ),
            None => (
                self.root.join(kind.dir_file_name()),
                directories.get(kind).encode()?,
            ),
        })
    }
}

/// Find `<PREFIX>` of the combined directory `<PREFIX>DIR`
fn find_v3_prefix(root: &Path) -> Result<String> {
    let mut prefixes = Vec::new();
    for entry in std::fs::read_dir(root)
        .with_context(|| format!("Failed to list {}", root.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_v2_directory = ResourceKind::ALL
            .iter()
            .any(|kind| kind.dir_file_name().eq_ignore_ascii_case(&name));
        let split = name.len().saturating_sub(3);
        if let (Some(prefix), Some(suffix)) = (name.get(..split), name.get(split..))
            && suffix.eq_ignore_ascii_case("DIR")
            && !prefix.is_empty()
            && !is_v2_directory
        {
            prefixes.push(prefix.to_string());
        }
    }

    match prefixes.as_slice() {
        [prefix] => Ok(prefix.clone()),
        [] => bail!("No combined <PREFIX>DIR file in {}", root.display()),
        _ => bail!(
            "Several combined directories in {}: {}",
            root.display(),
            prefixes.join(", ")
        ),
    }
}
