// Copyright (C) 2017 Hove and/or its affiliates.
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by the
// Free Software Foundation, version 3.

// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.

// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>

//! Provides an easy way to access the files of a feed stored in a directory
//! or in a flat zip archive
use crate::Result;
use anyhow::{anyhow, Context};
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{Read, Seek},
    path::{Path, PathBuf},
};

/// Gives access to the raw content of the files of a feed
pub trait FileHandler {
    /// Return the content of a file if it exists, and the path it has been
    /// looked for at
    fn read_file_if_exists(&mut self, name: &str) -> Result<(Option<Vec<u8>>, PathBuf)>;

    /// Return the content of a file or an error if it does not exist
    fn read_file(&mut self, name: &str) -> Result<(Vec<u8>, PathBuf)> {
        let (content, path) = self.read_file_if_exists(name)?;
        Ok((
            content.ok_or_else(|| anyhow!("file {:?} not found", path))?,
            path,
        ))
    }

    /// Allows to have nicer error messages
    fn source_name(&self) -> String;
}

/// PathFileHandler is used to read files from a directory
pub struct PathFileHandler<P: AsRef<Path>> {
    base_path: P,
}

impl<P: AsRef<Path>> PathFileHandler<P> {
    /// Constructs a new PathFileHandler
    pub fn new(path: P) -> Self {
        PathFileHandler { base_path: path }
    }
}

impl<P: AsRef<Path>> FileHandler for PathFileHandler<P> {
    fn read_file_if_exists(&mut self, name: &str) -> Result<(Option<Vec<u8>>, PathBuf)> {
        let f = self.base_path.as_ref().join(name);
        if f.exists() {
            let content = fs::read(&f).with_context(|| format!("Error reading {:?}", &f))?;
            Ok((Some(content), f))
        } else {
            Ok((None, f))
        }
    }

    fn source_name(&self) -> String {
        self.base_path.as_ref().to_string_lossy().into_owned()
    }
}

/// ZipHandler is a wrapper around a ZipArchive
/// It provides a way to access the archive's file by their names
///
/// Unlike ZipArchive, it gives access to a file by its name not regarding its path in the ZipArchive
/// It thus cannot be correct if there are 2 files with the same name in the archive,
/// but for transport data if will make it possible to handle a zip with a sub directory
pub struct ZipHandler<R: Seek + Read> {
    archive: zip::ZipArchive<R>,
    archive_path: PathBuf,
    index_by_name: BTreeMap<String, usize>,
}

impl ZipHandler<File> {
    /// Opens the zip archive at the given path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Error reading {:?}", path))?;
        ZipHandler::new(file, path)
            .with_context(|| format!("impossible to read zipped gtfs {:?}", path))
    }
}

impl<R> ZipHandler<R>
where
    R: Seek + Read,
{
    /// Constructs a new ZipHandler from any seekable reader
    pub fn new<P: AsRef<Path>>(r: R, path: P) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(r)?;
        Ok(ZipHandler {
            index_by_name: Self::files_by_name(&mut archive),
            archive,
            archive_path: path.as_ref().to_path_buf(),
        })
    }

    fn files_by_name(archive: &mut zip::ZipArchive<R>) -> BTreeMap<String, usize> {
        (0..archive.len())
            .filter_map(|i| {
                let file = archive.by_index(i).ok()?;
                // we get the name of the file, not regarding its path in the ZipArchive
                let real_name = Path::new(file.name()).file_name()?;
                let real_name: String = real_name.to_str()?.into();
                Some((real_name, i))
            })
            .collect()
    }
}

impl<R> FileHandler for ZipHandler<R>
where
    R: Seek + Read,
{
    fn read_file_if_exists(&mut self, name: &str) -> Result<(Option<Vec<u8>>, PathBuf)> {
        let p = self.archive_path.join(name);
        match self.index_by_name.get(name) {
            None => Ok((None, p)),
            Some(i) => {
                let mut file = self.archive.by_index(*i)?;
                let mut content = Vec::new();
                file.read_to_end(&mut content)
                    .with_context(|| format!("Error reading {:?}", p))?;
                Ok((Some(content), p))
            }
        }
    }

    fn source_name(&self) -> String {
        self.archive_path.to_string_lossy().into_owned()
    }
}
