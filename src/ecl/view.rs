//! Restricted views over a keyword file.
//!
//! A view is a contiguous range of entries with the same lookup API as the
//! whole file. Restart files are cut into report steps at `SEQNUM`, and
//! every local grid refinement occupies an `LGR` ... `ENDLGR` block inside
//! a step. Views borrow the file, so narrowing a view never changes what
//! other views see.

use std::io::{Read, Seek};
use std::ops::Range;

use log::trace;

use super::reader::ArrayFile;
use super::types::elements::ArrayElement;
use super::types::error::{EclError, Result};
use super::types::models::{ArrayEntry, ArrayType};

/// First array of every report step in a unified restart file.
pub const SEQNUM_KW: &str = "SEQNUM";
/// Opens a local grid block; its first value is the grid name.
pub const LGR_KW: &str = "LGR";
/// Closes a local grid block.
pub const ENDLGR_KW: &str = "ENDLGR";

/// A contiguous range of entries of an [`ArrayFile`].
#[derive(Debug)]
pub struct ArrayView<'a, R> {
    file: &'a ArrayFile<R>,
    start: usize,
    end: usize,
}

impl<R> Clone for ArrayView<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for ArrayView<'_, R> {}

/// One local grid block of a view.
#[derive(Debug)]
pub struct LgrBlock<'a, R> {
    pub name: String,
    pub view: ArrayView<'a, R>,
}

impl<'a, R> ArrayView<'a, R> {
    pub(crate) fn new(file: &'a ArrayFile<R>, start: usize, end: usize) -> Self {
        Self { file, start, end }
    }

    pub fn file(&self) -> &'a ArrayFile<R> {
        self.file
    }

    /// Entry indices of the underlying file covered by this view.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn entries(&self) -> &'a [ArrayEntry] {
        &self.file.entries()[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// View-relative index of the first array named `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries().iter().position(|e| e.name == name)
    }

    fn nth_index_of(&self, name: &str, occurrence: usize) -> Option<usize> {
        self.entries()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.name == name)
            .nth(occurrence)
            .map(|(index, _)| index)
    }

    pub fn has_key(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn count(&self, name: &str) -> usize {
        self.entries().iter().filter(|e| e.name == name).count()
    }

    pub fn list(&self) -> Vec<(String, ArrayType, usize)> {
        self.entries().iter().map(|e| (e.name.clone(), e.array_type, e.count)).collect()
    }

    /// Narrows to the view-relative range `start..end`.
    pub fn sub_view(&self, start: usize, end: usize) -> Result<Self> {
        if start > end || end > self.len() {
            return Err(EclError::IndexOutOfRange { index: end, len: self.len() });
        }
        Ok(Self::new(self.file, self.start + start, self.start + end))
    }

    /// Splits the view at every array named `name`.
    ///
    /// Each part starts at one occurrence and runs to the next. Entries before
    /// the first occurrence are not part of any split.
    pub fn split_at_key(&self, name: &str) -> Vec<Self> {
        let starts: Vec<usize> = self
            .entries()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.name == name)
            .map(|(index, _)| index)
            .collect();
        starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = starts.get(i + 1).copied().unwrap_or(self.len());
                Self::new(self.file, self.start + start, self.start + end)
            })
            .collect()
    }

    /// The part of the view before the first local grid block.
    pub fn global(&self) -> Self {
        let end = self.index_of(LGR_KW).unwrap_or(self.len());
        Self::new(self.file, self.start, self.start + end)
    }
}

impl<'a, R: Read + Seek> ArrayView<'a, R> {
    /// Type-checked access to the view-relative entry `index`.
    pub fn get_at<T: ArrayElement>(&self, index: usize) -> Result<&'a [T]> {
        if index >= self.len() {
            return Err(EclError::IndexOutOfRange { index, len: self.len() });
        }
        self.file.get_at(self.start + index)
    }

    /// The first array named `name` inside the view.
    pub fn get<T: ArrayElement>(&self, name: &str) -> Result<&'a [T]> {
        let index = self.index_of(name).ok_or_else(|| EclError::MissingArray(name.to_string()))?;
        self.get_at(index)
    }

    /// Like [`get`](Self::get) but `None` when the array is absent.
    pub fn get_opt<T: ArrayElement>(&self, name: &str) -> Result<Option<&'a [T]>> {
        match self.index_of(name) {
            Some(index) => self.get_at(index).map(Some),
            None => Ok(None),
        }
    }

    pub fn get_nth<T: ArrayElement>(&self, name: &str, occurrence: usize) -> Result<&'a [T]> {
        let index = self
            .nth_index_of(name, occurrence)
            .ok_or_else(|| EclError::MissingArray(format!("{} (occurrence {})", name, occurrence)))?;
        self.get_at(index)
    }

    /// Every `LGR` ... `ENDLGR` block of the view, in file order.
    ///
    /// A block without a closing `ENDLGR` runs to the end of the view.
    pub fn lgr_blocks(&self) -> Result<Vec<LgrBlock<'a, R>>> {
        let mut blocks = Vec::new();
        let entries = self.entries();
        let mut index = 0;
        while index < entries.len() {
            if entries[index].name != LGR_KW {
                index += 1;
                continue;
            }
            let name = self
                .get_at::<String>(index)?
                .first()
                .cloned()
                .ok_or_else(|| EclError::InvalidFormat("LGR array without a grid name".to_string()))?;
            let end = entries[index + 1..]
                .iter()
                .position(|e| e.name == ENDLGR_KW || e.name == LGR_KW)
                .map_or(entries.len(), |p| {
                    let at = index + 1 + p;
                    if entries[at].name == ENDLGR_KW { at + 1 } else { at }
                });
            trace!("LGR block {} spans entries {}..{}", name, self.start + index, self.start + end);
            blocks.push(LgrBlock { name, view: Self::new(self.file, self.start + index, self.start + end) });
            index = end;
        }
        Ok(blocks)
    }

    /// The block of local grid `name`, if the view has one.
    pub fn lgr(&self, name: &str) -> Result<Option<Self>> {
        Ok(self.lgr_blocks()?.into_iter().find(|b| b.name == name).map(|b| b.view))
    }
}
